use super::domain::{AreaFingerprint, Provider, ProviderCollection};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// How incoming providers are reconciled with the persisted collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MergePolicy {
    /// Skip a provider only when an identical one (name and every service
    /// area) is already present; anything else is appended as a new entry.
    #[default]
    Exact,
    /// Fold a provider into the existing entry with the same name, uniting
    /// service areas by (city, state) and their ZIP lists.
    UnionByName,
}

impl MergePolicy {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Exact => "exact",
            Self::UnionByName => "union",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "exact" => Some(Self::Exact),
            "union" | "union_by_name" | "union-by-name" => Some(Self::UnionByName),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MergeReport {
    pub appended: usize,
    pub updated: usize,
    pub skipped: usize,
}

impl MergeReport {
    pub fn changed(&self) -> bool {
        self.appended > 0 || self.updated > 0
    }
}

/// Merges `incoming` into `existing` using the whole-structure rule.
pub fn merge<I>(existing: &mut ProviderCollection, incoming: I) -> MergeReport
where
    I: IntoIterator<Item = Provider>,
{
    merge_with_policy(existing, incoming, MergePolicy::Exact)
}

pub fn merge_with_policy<I>(
    existing: &mut ProviderCollection,
    incoming: I,
    policy: MergePolicy,
) -> MergeReport
where
    I: IntoIterator<Item = Provider>,
{
    match policy {
        MergePolicy::Exact => merge_exact(existing, incoming),
        MergePolicy::UnionByName => merge_union(existing, incoming),
    }
}

fn merge_exact<I>(existing: &mut ProviderCollection, incoming: I) -> MergeReport
where
    I: IntoIterator<Item = Provider>,
{
    let mut known: HashSet<(String, AreaFingerprint)> = existing
        .iter()
        .map(|provider| (provider.name.clone(), provider.area_fingerprint()))
        .collect();
    let mut report = MergeReport::default();

    for provider in incoming {
        let fingerprint = (provider.name.clone(), provider.area_fingerprint());
        if known.insert(fingerprint) {
            debug!(provider = %provider.name, "appending provider");
            existing.push(provider);
            report.appended += 1;
        } else {
            debug!(provider = %provider.name, "identical provider already present");
            report.skipped += 1;
        }
    }

    report
}

fn merge_union<I>(existing: &mut ProviderCollection, incoming: I) -> MergeReport
where
    I: IntoIterator<Item = Provider>,
{
    let mut index: HashMap<String, usize> = HashMap::new();
    for (position, provider) in existing.iter().enumerate() {
        index.entry(provider.name.clone()).or_insert(position);
    }
    let mut report = MergeReport::default();

    for provider in incoming {
        let target = index.get(&provider.name).copied();

        match target.and_then(|position| existing.get_mut(position)) {
            Some(current) => {
                if absorb_provider(current, provider) {
                    debug!(provider = %current.name, "extended existing provider");
                    report.updated += 1;
                } else {
                    report.skipped += 1;
                }
            }
            None => {
                index.insert(provider.name.clone(), existing.len());
                debug!(provider = %provider.name, "appending provider");
                existing.push(provider);
                report.appended += 1;
            }
        }
    }

    report
}

// Returns whether `current` gained any area or ZIP code.
fn absorb_provider(current: &mut Provider, incoming: Provider) -> bool {
    let mut changed = false;

    for area in incoming.service_areas {
        let slot = current
            .service_areas
            .iter_mut()
            .find(|existing| existing.key() == area.key());
        match slot {
            Some(existing) => {
                changed |= existing.absorb_zips(area.zip_codes) > 0;
            }
            None => {
                current.service_areas.push(area);
                changed = true;
            }
        }
    }

    if changed {
        current
            .service_areas
            .sort_by(|left, right| left.key().cmp(&right.key()));
    }
    changed
}
