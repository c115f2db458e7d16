use super::SourceError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// One entry of the API list: a label for logs and the URL returning a JSON
/// array of providers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiEndpoint {
    pub name: String,
    pub url: String,
}

pub fn load_api_list<P: AsRef<Path>>(path: P) -> Result<Vec<ApiEndpoint>, SourceError> {
    let path = path.as_ref();
    let contents = std::fs::read_to_string(path).map_err(|source| SourceError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&contents).map_err(|source| SourceError::ApiList {
        path: path.to_path_buf(),
        source,
    })
}
