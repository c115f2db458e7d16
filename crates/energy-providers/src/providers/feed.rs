use serde::de::IgnoredAny;
use serde::{Deserialize, Deserializer};
use tracing::warn;

/// One provider entry as published by an API feed.
///
/// Every field is optional: an incomplete entry is repaired with sentinels
/// during normalization instead of rejecting the rest of the payload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct FeedProvider {
    #[serde(default, alias = "provider", deserialize_with = "scalar_text")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient_list")]
    pub service_areas: Vec<FeedServiceArea>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct FeedServiceArea {
    #[serde(default, deserialize_with = "scalar_text")]
    pub city: Option<String>,
    #[serde(default, deserialize_with = "scalar_text")]
    pub state: Option<String>,
    /// `None` marks an entry that could not be read as a ZIP (null, fractional).
    #[serde(default, deserialize_with = "zip_entries")]
    pub zip_codes: Vec<Option<String>>,
}

impl FeedProvider {
    pub fn new(name: impl Into<String>, service_areas: Vec<FeedServiceArea>) -> Self {
        Self {
            name: Some(name.into()),
            service_areas,
        }
    }
}

impl FeedServiceArea {
    pub fn new<I, Z>(city: impl Into<String>, state: impl Into<String>, zip_codes: I) -> Self
    where
        I: IntoIterator<Item = Z>,
        Z: Into<String>,
    {
        Self {
            city: Some(city.into()),
            state: Some(state.into()),
            zip_codes: zip_codes.into_iter().map(|zip| Some(zip.into())).collect(),
        }
    }
}

/// Decodes a feed body. Only a body that is not a JSON array fails; entries
/// that are not objects are dropped with a warning.
pub fn decode_feed(body: &str) -> Result<Vec<FeedProvider>, serde_json::Error> {
    if body.trim().is_empty() {
        return Ok(Vec::new());
    }
    let entries: Vec<Lenient<FeedProvider>> = serde_json::from_str(body)?;
    Ok(keep_readable(entries, "provider"))
}

/// A JSON scalar where a string is expected. Feeds mix strings, integers and
/// spreadsheet-style floats (`7601.0`) for the same field.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum FeedScalar {
    Text(String),
    Integer(u64),
    Float(f64),
    Other(IgnoredAny),
}

impl FeedScalar {
    fn into_text(self) -> Option<String> {
        match self {
            Self::Text(text) => Some(text),
            Self::Integer(number) => Some(number.to_string()),
            Self::Float(number) => Some(number.to_string()),
            Self::Other(_) => None,
        }
    }

    pub(crate) fn into_zip(self) -> Option<String> {
        match self {
            Self::Text(text) => Some(text),
            Self::Integer(number) => Some(number.to_string()),
            Self::Float(number) => whole_number(number).map(|number| number.to_string()),
            Self::Other(_) => None,
        }
    }
}

fn whole_number(value: f64) -> Option<u64> {
    (value.is_finite() && value >= 0.0 && value.fract() == 0.0 && value < u64::MAX as f64)
        .then_some(value as u64)
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Lenient<T> {
    Value(T),
    Unreadable(IgnoredAny),
}

fn keep_readable<T>(entries: Vec<Lenient<T>>, kind: &'static str) -> Vec<T> {
    let mut kept = Vec::with_capacity(entries.len());
    for (index, entry) in entries.into_iter().enumerate() {
        match entry {
            Lenient::Value(value) => kept.push(value),
            Lenient::Unreadable(_) => warn!(index, kind, "dropping unreadable feed entry"),
        }
    }
    kept
}

fn scalar_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(FeedScalar::deserialize(deserializer)?.into_text())
}

fn lenient_list<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    match Lenient::<Vec<Lenient<T>>>::deserialize(deserializer)? {
        Lenient::Value(entries) => Ok(keep_readable(entries, "service area")),
        Lenient::Unreadable(_) => Ok(Vec::new()),
    }
}

fn zip_entries<'de, D>(deserializer: D) -> Result<Vec<Option<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    match Lenient::<Vec<FeedScalar>>::deserialize(deserializer)? {
        Lenient::Value(values) => Ok(values.into_iter().map(FeedScalar::into_zip).collect()),
        Lenient::Unreadable(_) => Ok(Vec::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn incomplete_entries_decode_alongside_complete_ones() {
        let body = r#"[
            {"service_areas": [{"city": "Boise", "state": "Idaho", "zip_codes": [83702]}]},
            {"name": "Grid West", "service_areas": [{"state": "Oregon", "zip_codes": ["97201"]}]}
        ]"#;
        let feed = decode_feed(body).expect("decodes");

        assert_eq!(feed.len(), 2);
        assert_eq!(feed[0].name, None);
        assert_eq!(feed[0].service_areas[0].zip_codes, vec![Some("83702".to_string())]);
        assert_eq!(feed[1].name.as_deref(), Some("Grid West"));
        assert_eq!(feed[1].service_areas[0].city, None);
    }

    #[test]
    fn zips_accept_numbers_floats_and_nulls() {
        let body = r#"[{"provider": "Acme Power", "service_areas": [
            {"city": "Hackensack", "state": "New Jersey", "zip_codes": ["07601", 7602, 7603.0, null, 7604.5]}
        ]}]"#;
        let feed = decode_feed(body).expect("decodes");

        assert_eq!(feed[0].name.as_deref(), Some("Acme Power"));
        assert_eq!(
            feed[0].service_areas[0].zip_codes,
            vec![
                Some("07601".to_string()),
                Some("7602".to_string()),
                Some("7603".to_string()),
                None,
                None
            ]
        );
    }

    #[test]
    fn unreadable_entries_are_dropped() {
        let body = r#"[
            "not a provider",
            {"name": null, "service_areas": "none"},
            {"name": "Grid West", "service_areas": [42, {"city": "Boise", "state": "Idaho", "zip_codes": "83702"}]}
        ]"#;
        let feed = decode_feed(body).expect("decodes");

        assert_eq!(feed.len(), 2);
        assert_eq!(feed[0], FeedProvider::default());
        assert_eq!(feed[1].service_areas.len(), 1);
        assert!(feed[1].service_areas[0].zip_codes.is_empty());
    }

    #[test]
    fn non_array_body_is_rejected() {
        assert!(decode_feed(r#"{"error": "rate limited"}"#).is_err());
        assert!(decode_feed("  ").expect("empty ok").is_empty());
    }
}
