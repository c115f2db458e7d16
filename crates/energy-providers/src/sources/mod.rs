//! Collaborators that supply rows to the provider pipeline: the spreadsheet
//! reader, reference lookups used to enrich its rows, and the API list used
//! by the HTTP feed.

mod apis;
mod reference;
mod spreadsheet;
mod states;

use std::io;
use std::path::PathBuf;

pub use apis::{load_api_list, ApiEndpoint};
pub use reference::ZipCityReference;
pub use spreadsheet::{SpreadsheetColumns, SpreadsheetReader, SpreadsheetSource};
pub use states::UsStateTable;

/// Resolves a city name from a zero-padded ZIP code.
pub trait CityLookup {
    fn city_for_zip(&self, zip: &str) -> Option<String>;
}

/// Resolves a full state name from a postal abbreviation.
pub trait StateLookup {
    fn full_name(&self, abbreviation: &str) -> Option<String>;
}

#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("failed to read {}: {source}", .path.display())]
    Io { path: PathBuf, source: io::Error },
    #[error("invalid tabular data: {0}")]
    Csv(#[from] csv::Error),
    #[error("spreadsheet is missing required columns: {}", .0.join(", "))]
    MissingColumns(Vec<String>),
    #[error("ZIP reference data has no {0} column")]
    ReferenceColumn(&'static str),
    #[error("API list {} is not valid JSON: {source}", .path.display())]
    ApiList {
        path: PathBuf,
        source: serde_json::Error,
    },
}
