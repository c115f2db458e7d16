use super::{CityLookup, SourceError};
use crate::providers::zfill_zip;
use std::collections::HashMap;
use std::io::Read;
use std::path::Path;
use tracing::{debug, info};

const ZIP_HEADERS: &[&str] = &["zip", "zip code", "zip_code", "zipcode"];
const CITY_HEADERS: &[&str] = &["city", "primary_city"];

/// ZIP to city reference data, keyed by zero-padded ZIP.
#[derive(Debug, Clone, Default)]
pub struct ZipCityReference {
    cities: HashMap<String, String>,
}

impl ZipCityReference {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, SourceError> {
        let path = path.as_ref();
        let file = std::fs::File::open(path).map_err(|source| SourceError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let reference = Self::from_reader(file)?;
        info!(path = %path.display(), entries = reference.len(), "loaded ZIP reference data");
        Ok(reference)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self, SourceError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);
        let headers = csv_reader.headers()?.clone();
        let zip_index =
            find_column(&headers, ZIP_HEADERS).ok_or(SourceError::ReferenceColumn("zip"))?;
        let city_index =
            find_column(&headers, CITY_HEADERS).ok_or(SourceError::ReferenceColumn("city"))?;

        let mut cities = HashMap::new();
        for record in csv_reader.records() {
            let record = record?;
            let zip = record.get(zip_index).map(zfill_zip).unwrap_or_default();
            let city = record.get(city_index).unwrap_or_default();
            if zip.is_empty() || city.is_empty() {
                debug!(line = ?record.position().map(|p| p.line()), "skipping incomplete reference row");
                continue;
            }
            // First entry wins when a ZIP spans several places.
            cities.entry(zip).or_insert_with(|| city.to_string());
        }

        Ok(Self { cities })
    }

    pub fn len(&self) -> usize {
        self.cities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cities.is_empty()
    }
}

impl CityLookup for ZipCityReference {
    fn city_for_zip(&self, zip: &str) -> Option<String> {
        self.cities.get(&zfill_zip(zip)).cloned()
    }
}

impl<Z: Into<String>, C: Into<String>> FromIterator<(Z, C)> for ZipCityReference {
    fn from_iter<I: IntoIterator<Item = (Z, C)>>(pairs: I) -> Self {
        let cities = pairs
            .into_iter()
            .map(|(zip, city)| {
                let zip: String = zip.into();
                (zfill_zip(&zip), city.into())
            })
            .collect();
        Self { cities }
    }
}

pub(super) fn find_column(headers: &csv::StringRecord, candidates: &[&str]) -> Option<usize> {
    headers.iter().position(|header| {
        let header = header.trim_start_matches('\u{feff}').trim();
        candidates
            .iter()
            .any(|candidate| header.eq_ignore_ascii_case(candidate))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn loads_reference_with_padded_keys() {
        let data = "Zip,City\n7601,Hackensack\n62701,Springfield\n62701,Capital City\n,Nowhere\n";
        let reference = ZipCityReference::from_reader(Cursor::new(data)).expect("loads");

        assert_eq!(reference.len(), 2);
        assert_eq!(reference.city_for_zip("07601").as_deref(), Some("Hackensack"));
        assert_eq!(reference.city_for_zip("7601").as_deref(), Some("Hackensack"));
        assert_eq!(reference.city_for_zip("62701").as_deref(), Some("Springfield"));
        assert_eq!(reference.city_for_zip("99999"), None);
    }

    #[test]
    fn missing_city_column_is_rejected() {
        let error = ZipCityReference::from_reader(Cursor::new("zip,county\n62701,Sangamon\n"))
            .expect_err("city column required");
        assert!(matches!(error, SourceError::ReferenceColumn("city")));
    }

    #[test]
    fn builds_from_pairs() {
        let reference: ZipCityReference = [("501", "Holtsville")].into_iter().collect();
        assert_eq!(reference.city_for_zip("00501").as_deref(), Some("Holtsville"));
    }
}
