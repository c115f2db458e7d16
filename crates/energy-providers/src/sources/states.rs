use super::StateLookup;
use std::collections::HashMap;
use std::sync::OnceLock;

static STATE_NAME_MAP: OnceLock<HashMap<String, &'static str>> = OnceLock::new();

/// USPS abbreviations for the states, DC and the inhabited territories.
#[derive(Debug, Clone, Copy, Default)]
pub struct UsStateTable;

impl UsStateTable {
    pub fn new() -> Self {
        Self
    }

    pub fn lookup(&self, value: &str) -> Option<&'static str> {
        state_name_map().get(&normalize_key(value)).copied()
    }
}

impl StateLookup for UsStateTable {
    fn full_name(&self, abbreviation: &str) -> Option<String> {
        self.lookup(abbreviation).map(str::to_string)
    }
}

fn normalize_key(value: &str) -> String {
    value
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .trim_end_matches('.')
        .to_ascii_uppercase()
}

fn state_name_map() -> &'static HashMap<String, &'static str> {
    STATE_NAME_MAP.get_or_init(|| {
        const ABBREVIATION_TO_NAME: &[(&str, &str)] = &[
            ("AL", "Alabama"),
            ("AK", "Alaska"),
            ("AZ", "Arizona"),
            ("AR", "Arkansas"),
            ("CA", "California"),
            ("CO", "Colorado"),
            ("CT", "Connecticut"),
            ("DE", "Delaware"),
            ("FL", "Florida"),
            ("GA", "Georgia"),
            ("HI", "Hawaii"),
            ("ID", "Idaho"),
            ("IL", "Illinois"),
            ("IN", "Indiana"),
            ("IA", "Iowa"),
            ("KS", "Kansas"),
            ("KY", "Kentucky"),
            ("LA", "Louisiana"),
            ("ME", "Maine"),
            ("MD", "Maryland"),
            ("MA", "Massachusetts"),
            ("MI", "Michigan"),
            ("MN", "Minnesota"),
            ("MS", "Mississippi"),
            ("MO", "Missouri"),
            ("MT", "Montana"),
            ("NE", "Nebraska"),
            ("NV", "Nevada"),
            ("NH", "New Hampshire"),
            ("NJ", "New Jersey"),
            ("NM", "New Mexico"),
            ("NY", "New York"),
            ("NC", "North Carolina"),
            ("ND", "North Dakota"),
            ("OH", "Ohio"),
            ("OK", "Oklahoma"),
            ("OR", "Oregon"),
            ("PA", "Pennsylvania"),
            ("RI", "Rhode Island"),
            ("SC", "South Carolina"),
            ("SD", "South Dakota"),
            ("TN", "Tennessee"),
            ("TX", "Texas"),
            ("UT", "Utah"),
            ("VT", "Vermont"),
            ("VA", "Virginia"),
            ("WA", "Washington"),
            ("WV", "West Virginia"),
            ("WI", "Wisconsin"),
            ("WY", "Wyoming"),
            // District and territories
            ("DC", "District of Columbia"),
            ("AS", "American Samoa"),
            ("GU", "Guam"),
            ("MP", "Northern Mariana Islands"),
            ("PR", "Puerto Rico"),
            ("VI", "U.S. Virgin Islands"),
        ];

        let mut map = HashMap::with_capacity(ABBREVIATION_TO_NAME.len() * 2);
        for (abbreviation, name) in ABBREVIATION_TO_NAME {
            map.insert(normalize_key(abbreviation), *name);
            // Rows that already carry the full name pass through unchanged.
            map.insert(normalize_key(name), *name);
        }
        map
    })
}
