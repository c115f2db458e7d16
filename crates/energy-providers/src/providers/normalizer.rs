use super::domain::{Provider, RawRecord, ServiceArea, UNKNOWN};
use super::feed::FeedProvider;
use super::zip::zfill_zip;
use serde::Serialize;
use std::fmt;
use tracing::warn;

/// A source row after reference lookups, before sentinel substitution.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedRow {
    /// Line in the source document, for diagnostics.
    pub line: u64,
    pub provider_name: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingField {
    ProviderName,
    City,
    State,
    Zip,
}

impl MissingField {
    pub const fn label(self) -> &'static str {
        match self {
            Self::ProviderName => "provider name",
            Self::City => "city",
            Self::State => "state",
            Self::Zip => "zip code",
        }
    }

    /// Value substituted when the field is absent.
    pub const fn sentinel(self) -> &'static str {
        match self {
            Self::ProviderName | Self::State => UNKNOWN,
            Self::City | Self::Zip => "",
        }
    }
}

impl fmt::Display for MissingField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A recovered field-level problem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FieldIssue {
    /// Source line for spreadsheet rows; 1-based entry position for feeds.
    pub line: u64,
    pub field: MissingField,
}

#[derive(Debug, Clone, Default)]
pub struct NormalizedBatch {
    pub records: Vec<RawRecord>,
    pub issues: Vec<FieldIssue>,
}

#[derive(Debug, Clone, Default)]
pub struct NormalizedFeed {
    pub providers: Vec<Provider>,
    pub issues: Vec<FieldIssue>,
}

/// Coerces one row into a [`RawRecord`], substituting sentinels for missing
/// fields and recording each substitution in `issues`.
pub fn normalize_row(row: ResolvedRow, issues: &mut Vec<FieldIssue>) -> RawRecord {
    let line = row.line;
    let mut take =
        |value: Option<String>, field: MissingField| fill(value, field, line, issues);

    let provider_name = take(row.provider_name, MissingField::ProviderName);
    let city = take(row.city, MissingField::City);
    let state = take(row.state, MissingField::State);
    let zip = take(row.zip.map(|raw| zfill_zip(&raw)), MissingField::Zip);

    RawRecord {
        provider_name,
        city,
        state,
        zip,
    }
}

pub fn normalize_rows<I>(rows: I) -> NormalizedBatch
where
    I: IntoIterator<Item = ResolvedRow>,
{
    let mut batch = NormalizedBatch::default();
    for row in rows {
        let record = normalize_row(row, &mut batch.issues);
        batch.records.push(record);
    }
    batch
}

/// Repairs one feed entry into a canonical [`Provider`]. Missing names and
/// states become `Unknown`, missing cities become empty, and unreadable ZIPs
/// are dropped; each substitution is recorded against `position`.
pub fn normalize_feed_provider(
    position: u64,
    entry: FeedProvider,
    issues: &mut Vec<FieldIssue>,
) -> Provider {
    let name = fill(entry.name, MissingField::ProviderName, position, issues);
    let service_areas = entry
        .service_areas
        .into_iter()
        .map(|area| {
            let city = fill(area.city, MissingField::City, position, issues);
            let state = fill(area.state, MissingField::State, position, issues);
            let zip_codes: Vec<String> = area
                .zip_codes
                .into_iter()
                .map(|zip| {
                    let zip = zip.map(|raw| zfill_zip(&raw));
                    fill(zip, MissingField::Zip, position, issues)
                })
                .collect();
            ServiceArea::new(city, state, zip_codes)
        })
        .collect();

    Provider::new(name, service_areas).canonicalize()
}

pub fn normalize_feed<I>(entries: I) -> NormalizedFeed
where
    I: IntoIterator<Item = FeedProvider>,
{
    let mut feed = NormalizedFeed::default();
    for (position, entry) in (1u64..).zip(entries) {
        let provider = normalize_feed_provider(position, entry, &mut feed.issues);
        feed.providers.push(provider);
    }
    feed
}

fn fill(
    value: Option<String>,
    field: MissingField,
    line: u64,
    issues: &mut Vec<FieldIssue>,
) -> String {
    match value.map(|raw| clean_text(&raw)).filter(|v| !v.is_empty()) {
        Some(value) => value,
        None => {
            warn!(line, field = field.label(), "missing field replaced with sentinel");
            issues.push(FieldIssue { line, field });
            field.sentinel().to_string()
        }
    }
}

// Removes byte-order marks and zero-width spaces and collapses runs of
// whitespace. Case is preserved because matching is case-sensitive.
fn clean_text(value: &str) -> String {
    let cleaned = value.replace(['\u{feff}', '\u{200b}'], "");
    cleaned.split_whitespace().collect::<Vec<_>>().join(" ")
}
