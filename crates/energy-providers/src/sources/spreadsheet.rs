use super::{CityLookup, SourceError, StateLookup, UsStateTable, ZipCityReference};
use crate::providers::{zfill_zip, ProviderBatch, RecordSource, ResolvedRow};
use serde::{Deserialize, Deserializer};
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

pub const UTILITY_NAME: &str = "Utility Name";
pub const ZIP_CODE: &str = "Zip Code";
pub const CITY: &str = "city";
pub const STATE_FULL: &str = "state_full";
pub const STATE_ABBREVIATION: &str = "State";

/// Which optional enrichment columns a spreadsheet export carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpreadsheetColumns {
    pub city: bool,
    pub state_full: bool,
    pub state_abbreviation: bool,
}

impl SpreadsheetColumns {
    fn inspect(headers: &csv::StringRecord) -> Result<Self, SourceError> {
        let has = |name: &str| headers.iter().any(|header| header == name);

        let mut missing = Vec::new();
        for required in [UTILITY_NAME, ZIP_CODE] {
            if !has(required) {
                missing.push(required.to_string());
            }
        }

        let columns = Self {
            city: has(CITY),
            state_full: has(STATE_FULL),
            state_abbreviation: has(STATE_ABBREVIATION),
        };
        if !columns.state_full && !columns.state_abbreviation {
            missing.push(format!("{STATE_FULL} or {STATE_ABBREVIATION}"));
        }

        if missing.is_empty() {
            Ok(columns)
        } else {
            Err(SourceError::MissingColumns(missing))
        }
    }
}

/// Reads a utility-map spreadsheet export (CSV) into resolved rows, filling
/// in city and full state name from reference data where the export lacks
/// them.
pub struct SpreadsheetReader<'a> {
    states: &'a dyn StateLookup,
    cities: Option<&'a dyn CityLookup>,
}

impl<'a> SpreadsheetReader<'a> {
    pub fn new(states: &'a dyn StateLookup) -> Self {
        Self {
            states,
            cities: None,
        }
    }

    pub fn with_cities(mut self, cities: Option<&'a dyn CityLookup>) -> Self {
        self.cities = cities;
        self
    }

    pub fn read_path<P: AsRef<Path>>(&self, path: P) -> Result<Vec<ResolvedRow>, SourceError> {
        let path = path.as_ref();
        let file = std::fs::File::open(path).map_err(|source| SourceError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        self.read(file)
    }

    pub fn read<R: Read>(&self, reader: R) -> Result<Vec<ResolvedRow>, SourceError> {
        // Short rows are padded below so their absent cells surface as
        // missing fields rather than failing the whole export.
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(reader);
        let headers = csv_reader.headers()?.clone();
        let columns = SpreadsheetColumns::inspect(&headers)?;
        debug!(?columns, "spreadsheet columns detected");

        let mut rows = Vec::new();
        for record in csv_reader.records() {
            let mut record = record?;
            let line = record.position().map(|position| position.line()).unwrap_or_default();
            if record.len() != headers.len() {
                debug!(line, fields = record.len(), "row width differs from header");
                record.truncate(headers.len());
                while record.len() < headers.len() {
                    record.push_field("");
                }
            }
            let row: UtilityRow = record.deserialize(Some(&headers))?;
            rows.push(self.resolve(line, row));
        }

        Ok(rows)
    }

    fn resolve(&self, line: u64, row: UtilityRow) -> ResolvedRow {
        let city = row.city.or_else(|| {
            let zip = zfill_zip(row.zip_code.as_deref()?);
            let city = self.cities?.city_for_zip(&zip);
            if city.is_none() {
                debug!(line, zip = %zip, "no reference city for ZIP");
            }
            city
        });

        let state = row.state_full.or_else(|| {
            let abbreviation = row.state.as_deref()?;
            let name = self.states.full_name(abbreviation);
            if name.is_none() {
                warn!(line, abbreviation, "unrecognized state abbreviation");
            }
            name
        });

        ResolvedRow {
            line,
            provider_name: row.utility_name,
            city,
            state,
            zip: row.zip_code,
        }
    }
}

/// A spreadsheet export on disk plus the reference data used to enrich it.
#[derive(Debug, Clone)]
pub struct SpreadsheetSource {
    path: PathBuf,
    states: UsStateTable,
    cities: Option<ZipCityReference>,
}

impl SpreadsheetSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            states: UsStateTable::new(),
            cities: None,
        }
    }

    pub fn with_city_reference(mut self, reference: ZipCityReference) -> Self {
        self.cities = Some(reference);
        self
    }
}

impl RecordSource for SpreadsheetSource {
    fn describe(&self) -> String {
        self.path.display().to_string()
    }

    fn load(&self) -> Result<ProviderBatch, SourceError> {
        let cities = self.cities.as_ref().map(|cities| cities as &dyn CityLookup);
        let rows = SpreadsheetReader::new(&self.states)
            .with_cities(cities)
            .read_path(&self.path)?;
        info!(path = %self.path.display(), rows = rows.len(), "read spreadsheet export");
        Ok(ProviderBatch::Rows(rows))
    }
}

#[derive(Debug, Deserialize)]
struct UtilityRow {
    #[serde(
        rename = "Utility Name",
        default,
        deserialize_with = "empty_string_as_none"
    )]
    utility_name: Option<String>,
    #[serde(rename = "Zip Code", default, deserialize_with = "empty_string_as_none")]
    zip_code: Option<String>,
    #[serde(rename = "city", default, deserialize_with = "empty_string_as_none")]
    city: Option<String>,
    #[serde(rename = "state_full", default, deserialize_with = "empty_string_as_none")]
    state_full: Option<String>,
    #[serde(rename = "State", default, deserialize_with = "empty_string_as_none")]
    state: Option<String>,
}

fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    Ok(opt.filter(|value| !value.trim().is_empty()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn reference() -> ZipCityReference {
        [("07601", "Hackensack"), ("62701", "Springfield")]
            .into_iter()
            .collect()
    }

    #[test]
    fn enriched_export_is_read_as_is() {
        let data = "Utility Name,city,state_full,Zip Code\n\
Acme Power,Springfield,Illinois,62701\n";
        let rows = SpreadsheetReader::new(&UsStateTable)
            .read(Cursor::new(data))
            .expect("reads");

        assert_eq!(
            rows,
            vec![ResolvedRow {
                line: 2,
                provider_name: Some("Acme Power".to_string()),
                city: Some("Springfield".to_string()),
                state: Some("Illinois".to_string()),
                zip: Some("62701".to_string()),
            }]
        );
    }

    #[test]
    fn raw_export_is_enriched_from_reference_data() {
        let data = "Utility Name,State,Zip Code\nAcme Power,NJ,7601\n";
        let cities = reference();
        let rows = SpreadsheetReader::new(&UsStateTable)
            .with_cities(Some(&cities))
            .read(Cursor::new(data))
            .expect("reads");

        assert_eq!(rows[0].city.as_deref(), Some("Hackensack"));
        assert_eq!(rows[0].state.as_deref(), Some("New Jersey"));
        assert_eq!(rows[0].zip.as_deref(), Some("7601"));
    }

    #[test]
    fn unresolvable_fields_stay_empty() {
        let data = "Utility Name,State,Zip Code\n,ZZ,99999\nAcme Power,IL,\n";
        let cities = reference();
        let rows = SpreadsheetReader::new(&UsStateTable)
            .with_cities(Some(&cities))
            .read(Cursor::new(data))
            .expect("reads");

        assert_eq!(rows.len(), 2);
        assert!(rows[0].provider_name.is_none());
        assert!(rows[0].city.is_none());
        assert!(rows[0].state.is_none());
        assert!(rows[1].zip.is_none());
        assert!(rows[1].city.is_none());
    }

    #[test]
    fn short_rows_are_kept_with_missing_cells() {
        let data = "Utility Name,city,state_full,Zip Code\n\
Acme Power,Springfield,Illinois,62701\n\
Beta Gas,Decatur,Illinois\n\
Gamma Electric\n";
        let rows = SpreadsheetReader::new(&UsStateTable)
            .read(Cursor::new(data))
            .expect("short rows do not abort the read");

        assert_eq!(rows.len(), 3);
        assert_eq!(rows[1].provider_name.as_deref(), Some("Beta Gas"));
        assert_eq!(rows[1].city.as_deref(), Some("Decatur"));
        assert!(rows[1].zip.is_none());
        assert_eq!(rows[2].line, 4);
        assert!(rows[2].state.is_none());
    }

    #[test]
    fn missing_required_columns_are_listed() {
        let error = SpreadsheetReader::new(&UsStateTable)
            .read(Cursor::new("Name,city\nAcme Power,Springfield\n"))
            .expect_err("columns missing");

        match error {
            SourceError::MissingColumns(columns) => assert_eq!(
                columns,
                vec![
                    "Utility Name".to_string(),
                    "Zip Code".to_string(),
                    "state_full or State".to_string()
                ]
            ),
            other => panic!("expected missing columns, got {other:?}"),
        }
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let error = SpreadsheetSource::new("./does-not-exist.csv")
            .load()
            .expect_err("expected io error");
        assert!(matches!(error, SourceError::Io { .. }));
    }
}
