use serde::{Deserialize, Deserializer, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use super::feed::FeedScalar;
use super::zip::zfill_zip;

/// Sentinel used when a provider name or state cannot be resolved.
pub const UNKNOWN: &str = "Unknown";

/// A single source row after reference lookups and sentinel substitution.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RawRecord {
    pub provider_name: String,
    pub city: String,
    pub state: String,
    pub zip: String,
}

impl RawRecord {
    pub fn new(
        provider_name: impl Into<String>,
        city: impl Into<String>,
        state: impl Into<String>,
        zip: impl Into<String>,
    ) -> Self {
        Self {
            provider_name: provider_name.into(),
            city: city.into(),
            state: state.into(),
            zip: zip.into(),
        }
    }
}

/// A locality served by a provider and the ZIP codes inside it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceArea {
    pub city: String,
    pub state: String,
    #[serde(default, deserialize_with = "zip_list")]
    pub zip_codes: Vec<String>,
}

impl ServiceArea {
    /// Builds an area whose ZIP list is sorted and free of duplicates and blanks.
    pub fn new<I, Z>(city: impl Into<String>, state: impl Into<String>, zip_codes: I) -> Self
    where
        I: IntoIterator<Item = Z>,
        Z: Into<String>,
    {
        let zip_codes: BTreeSet<String> = zip_codes
            .into_iter()
            .map(Into::into)
            .filter(|zip| !zip.is_empty())
            .collect();

        Self {
            city: city.into(),
            state: state.into(),
            zip_codes: zip_codes.into_iter().collect(),
        }
    }

    pub fn key(&self) -> (&str, &str) {
        (&self.city, &self.state)
    }

    pub fn contains_zip(&self, zip: &str) -> bool {
        self.zip_codes.binary_search_by(|probe| probe.as_str().cmp(zip)).is_ok()
    }

    /// Unions `zip_codes` into this area, returning how many were new.
    pub(crate) fn absorb_zips<I>(&mut self, zip_codes: I) -> usize
    where
        I: IntoIterator<Item = String>,
    {
        let mut merged: BTreeSet<String> = self.zip_codes.drain(..).collect();
        let before = merged.len();
        merged.extend(zip_codes.into_iter().filter(|zip| !zip.is_empty()));
        let added = merged.len() - before;
        self.zip_codes = merged.into_iter().collect();
        added
    }
}

pub(crate) type AreaFingerprint = BTreeMap<(String, String), BTreeSet<String>>;

/// A utility company and the localities it serves.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Provider {
    #[serde(alias = "provider")]
    pub name: String,
    #[serde(default)]
    pub service_areas: Vec<ServiceArea>,
}

impl Provider {
    pub fn new(name: impl Into<String>, service_areas: Vec<ServiceArea>) -> Self {
        Self {
            name: name.into(),
            service_areas,
        }
    }

    /// Restores the provider invariants on data that did not come through the
    /// grouping stage: one area per (city, state), zero-padded ZIPs, sorted
    /// and unique ZIP lists, areas ordered by (city, state).
    pub fn canonicalize(self) -> Self {
        let mut areas: BTreeMap<(String, String), BTreeSet<String>> = BTreeMap::new();
        for area in self.service_areas {
            let zips = areas.entry((area.city, area.state)).or_default();
            zips.extend(
                area.zip_codes
                    .iter()
                    .map(|zip| zfill_zip(zip))
                    .filter(|zip| !zip.is_empty()),
            );
        }

        Self {
            name: self.name,
            service_areas: areas
                .into_iter()
                .map(|((city, state), zips)| ServiceArea::new(city, state, zips))
                .collect(),
        }
    }

    pub fn service_area(&self, city: &str, state: &str) -> Option<&ServiceArea> {
        self.service_areas
            .iter()
            .find(|area| area.key() == (city, state))
    }

    pub fn zip_count(&self) -> usize {
        self.service_areas
            .iter()
            .map(|area| area.zip_codes.len())
            .sum()
    }

    /// Structural identity: same name and the same set of service areas,
    /// regardless of the order areas or ZIPs were stored in.
    pub fn is_identical_to(&self, other: &Provider) -> bool {
        self.name == other.name && self.area_fingerprint() == other.area_fingerprint()
    }

    pub(crate) fn area_fingerprint(&self) -> AreaFingerprint {
        let mut fingerprint = AreaFingerprint::new();
        for area in &self.service_areas {
            fingerprint
                .entry((area.city.clone(), area.state.clone()))
                .or_default()
                .extend(area.zip_codes.iter().cloned());
        }
        fingerprint
    }
}

/// The persisted dataset: providers in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProviderCollection {
    providers: Vec<Provider>,
}

impl ProviderCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Provider> {
        self.providers.iter()
    }

    pub fn as_slice(&self) -> &[Provider] {
        &self.providers
    }

    /// First provider carrying `name`; matching is case-sensitive.
    pub fn find(&self, name: &str) -> Option<&Provider> {
        self.providers.iter().find(|provider| provider.name == name)
    }

    pub fn push(&mut self, provider: Provider) {
        self.providers.push(provider);
    }

    pub(crate) fn get_mut(&mut self, index: usize) -> Option<&mut Provider> {
        self.providers.get_mut(index)
    }

    /// Canonicalizes every provider so documents written by older tools
    /// compare and merge like freshly built ones.
    pub fn canonicalize(self) -> Self {
        Self {
            providers: self
                .providers
                .into_iter()
                .map(Provider::canonicalize)
                .collect(),
        }
    }
}

impl From<Vec<Provider>> for ProviderCollection {
    fn from(providers: Vec<Provider>) -> Self {
        Self { providers }
    }
}

impl<'a> IntoIterator for &'a ProviderCollection {
    type Item = &'a Provider;
    type IntoIter = std::slice::Iter<'a, Provider>;

    fn into_iter(self) -> Self::IntoIter {
        self.providers.iter()
    }
}

// Older documents hold ZIPs as bare numbers, sometimes float-rendered.
// Nulls are dropped.
fn zip_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let values = Vec::<FeedScalar>::deserialize(deserializer)?;
    Ok(values.into_iter().filter_map(FeedScalar::into_zip).collect())
}
