use super::domain::{Provider, RawRecord, ServiceArea};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ServiceAreaKey {
    pub provider_name: String,
    pub city: String,
    pub state: String,
}

impl ServiceAreaKey {
    pub fn new(
        provider_name: impl Into<String>,
        city: impl Into<String>,
        state: impl Into<String>,
    ) -> Self {
        Self {
            provider_name: provider_name.into(),
            city: city.into(),
            state: state.into(),
        }
    }
}

/// ZIP sets accumulated per (provider, city, state).
///
/// The key to ZIP-set mapping depends only on which records were inserted,
/// never on their order. Provider first-seen order is tracked separately so
/// that [`build_providers`] can reproduce the source ordering.
#[derive(Debug, Clone, Default)]
pub struct GroupedServiceAreas {
    provider_order: Vec<String>,
    seen: HashSet<String>,
    areas: BTreeMap<ServiceAreaKey, BTreeSet<String>>,
}

impl GroupedServiceAreas {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, record: RawRecord) {
        let RawRecord {
            provider_name,
            city,
            state,
            zip,
        } = record;

        self.note_provider(&provider_name);
        let zips = self
            .areas
            .entry(ServiceAreaKey {
                provider_name,
                city,
                state,
            })
            .or_default();
        if !zip.is_empty() {
            zips.insert(zip);
        }
    }

    /// Folds another grouping into this one; `self`'s providers keep their
    /// position ahead of any first seen in `other`.
    #[cfg(test)]
    fn absorb(&mut self, other: GroupedServiceAreas) {
        for name in &other.provider_order {
            self.note_provider(name);
        }
        for (key, zips) in other.areas {
            self.areas.entry(key).or_default().extend(zips);
        }
    }

    pub fn areas(&self) -> &BTreeMap<ServiceAreaKey, BTreeSet<String>> {
        &self.areas
    }

    pub fn zip_codes(&self, key: &ServiceAreaKey) -> Option<&BTreeSet<String>> {
        self.areas.get(key)
    }

    pub fn provider_names(&self) -> &[String] {
        &self.provider_order
    }

    pub fn len(&self) -> usize {
        self.areas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.areas.is_empty()
    }

    fn note_provider(&mut self, name: &str) {
        if self.seen.insert(name.to_string()) {
            self.provider_order.push(name.to_string());
        }
    }
}

impl Extend<RawRecord> for GroupedServiceAreas {
    fn extend<I: IntoIterator<Item = RawRecord>>(&mut self, records: I) {
        for record in records {
            self.insert(record);
        }
    }
}

impl FromIterator<RawRecord> for GroupedServiceAreas {
    fn from_iter<I: IntoIterator<Item = RawRecord>>(records: I) -> Self {
        let mut grouped = Self::new();
        grouped.extend(records);
        grouped
    }
}

pub fn group_into_service_areas<I>(records: I) -> GroupedServiceAreas
where
    I: IntoIterator<Item = RawRecord>,
{
    records.into_iter().collect()
}

/// One provider per distinct name, in first-seen order, each with one
/// service area per (city, state) ordered by city then state.
pub fn build_providers(grouped: GroupedServiceAreas) -> Vec<Provider> {
    let GroupedServiceAreas {
        provider_order,
        areas,
        ..
    } = grouped;

    let mut by_provider: HashMap<String, Vec<ServiceArea>> =
        HashMap::with_capacity(provider_order.len());
    for (key, zips) in areas {
        by_provider
            .entry(key.provider_name)
            .or_default()
            .push(ServiceArea::new(key.city, key.state, zips));
    }

    provider_order
        .into_iter()
        .filter_map(|name| {
            let service_areas = by_provider.remove(&name)?;
            Some(Provider::new(name, service_areas))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Vec<RawRecord> {
        vec![
            RawRecord::new("Zephyr Electric", "Albany", "New York", "12207"),
            RawRecord::new("Acme Power", "Springfield", "Illinois", "62704"),
            RawRecord::new("Acme Power", "Springfield", "Illinois", "62701"),
            RawRecord::new("Acme Power", "Decatur", "Illinois", "62521"),
            RawRecord::new("Zephyr Electric", "Albany", "New York", "12207"),
            RawRecord::new("Acme Power", "Springfield", "Illinois", "62704"),
        ]
    }

    #[test]
    fn records_with_same_key_share_one_zip_set() {
        let grouped = group_into_service_areas(sample());
        assert_eq!(grouped.len(), 3);
        let zips = grouped
            .zip_codes(&ServiceAreaKey::new("Acme Power", "Springfield", "Illinois"))
            .expect("group present");
        assert_eq!(zips.iter().collect::<Vec<_>>(), vec!["62701", "62704"]);
    }

    #[test]
    fn grouping_is_independent_of_insertion_order() {
        let forward = group_into_service_areas(sample());
        let reversed = group_into_service_areas(sample().into_iter().rev());
        assert_eq!(forward.areas(), reversed.areas());

        let mut rotated = sample();
        rotated.rotate_left(2);
        assert_eq!(forward.areas(), group_into_service_areas(rotated).areas());
    }

    #[test]
    fn absorbing_partial_groupings_is_associative() {
        let records = sample();
        let (head, tail) = records.split_at(2);
        let (middle, last) = tail.split_at(2);
        let part = |slice: &[RawRecord]| group_into_service_areas(slice.to_vec());

        let mut left = part(head);
        left.absorb(part(middle));
        left.absorb(part(last));

        let mut right_tail = part(middle);
        right_tail.absorb(part(last));
        let mut right = part(head);
        right.absorb(right_tail);

        assert_eq!(left.areas(), right.areas());
        assert_eq!(left.areas(), group_into_service_areas(records).areas());
    }

    #[test]
    fn build_keeps_first_seen_provider_order_and_sorted_areas() {
        let providers = build_providers(group_into_service_areas(sample()));
        let names: Vec<_> = providers.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["Zephyr Electric", "Acme Power"]);

        let acme = &providers[1];
        let cities: Vec<_> = acme.service_areas.iter().map(|a| a.city.as_str()).collect();
        assert_eq!(cities, vec!["Decatur", "Springfield"]);
        assert_eq!(acme.service_areas[1].zip_codes, vec!["62701", "62704"]);
    }

    #[test]
    fn blank_zip_keeps_area_without_adding_empty_code() {
        let providers = build_providers(group_into_service_areas(vec![RawRecord::new(
            "Acme Power",
            "Springfield",
            "Illinois",
            "",
        )]));
        assert_eq!(providers.len(), 1);
        assert!(providers[0].service_areas[0].zip_codes.is_empty());
    }

    #[test]
    fn six_digit_zip_is_kept_beside_padded_one() {
        let providers = build_providers(group_into_service_areas(vec![
            RawRecord::new("Acme Power", "Springfield", "Illinois", "62701"),
            RawRecord::new("Acme Power", "Springfield", "Illinois", "627010"),
        ]));
        assert_eq!(providers.len(), 1);
        assert_eq!(providers[0].service_areas.len(), 1);
        assert_eq!(
            providers[0].service_areas[0].zip_codes,
            vec!["62701", "627010"]
        );
    }
}
