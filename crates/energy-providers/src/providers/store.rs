use super::domain::ProviderCollection;
use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Storage abstraction so the pipeline can be exercised without touching disk.
pub trait ProviderStore {
    /// Loads the persisted collection; an absent document is an empty collection.
    fn load(&self) -> Result<ProviderCollection, StoreError>;
    fn save(&self, collection: &ProviderCollection) -> Result<(), StoreError>;
    fn describe(&self) -> String;
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("failed to access provider collection {}: {source}", .path.display())]
    Io { path: PathBuf, source: io::Error },
    #[error("provider collection {} is not valid JSON: {source}", .path.display())]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// The on-disk JSON document: an array of providers, 4-space indented.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: io::Error) -> StoreError {
        StoreError::Io {
            path: self.path.clone(),
            source,
        }
    }

    fn temp_path(&self) -> PathBuf {
        let file_name = self
            .path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "energyproviders.json".to_string());
        self.path
            .with_file_name(format!(".{file_name}.tmp-{}", std::process::id()))
    }
}

impl ProviderStore for JsonFileStore {
    fn load(&self) -> Result<ProviderCollection, StoreError> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                info!(path = %self.path.display(), "no existing provider collection, starting empty");
                return Ok(ProviderCollection::new());
            }
            Err(err) => return Err(self.io_error(err)),
        };

        if contents.trim().is_empty() {
            warn!(path = %self.path.display(), "provider collection is empty, starting fresh");
            return Ok(ProviderCollection::new());
        }

        serde_json::from_str(&contents).map_err(|source| StoreError::Json {
            path: self.path.clone(),
            source,
        })
    }

    fn save(&self, collection: &ProviderCollection) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|err| self.io_error(err))?;
            }
        }

        let mut buffer: Vec<u8> = Vec::new();
        let mut serializer =
            serde_json::Serializer::with_formatter(&mut buffer, PrettyFormatter::with_indent(b"    "));
        collection
            .serialize(&mut serializer)
            .map_err(|source| StoreError::Json {
                path: self.path.clone(),
                source,
            })?;

        let temp = self.temp_path();
        let written = write_synced(&temp, &buffer).and_then(|()| fs::rename(&temp, &self.path));
        if let Err(err) = written {
            let _ = fs::remove_file(&temp);
            return Err(self.io_error(err));
        }

        info!(
            path = %self.path.display(),
            providers = collection.len(),
            "provider collection written"
        );
        Ok(())
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

fn write_synced(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let mut file = fs::File::create(path)?;
    file.write_all(bytes)?;
    file.sync_all()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::domain::{Provider, ServiceArea};

    fn sample() -> ProviderCollection {
        ProviderCollection::from(vec![Provider::new(
            "Acme Power",
            vec![ServiceArea::new("Hackensack", "New Jersey", ["07601"])],
        )])
    }

    #[test]
    fn missing_file_loads_as_empty_collection() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = JsonFileStore::new(dir.path().join("energyproviders.json"));
        let collection = store.load().expect("absent file is not an error");
        assert!(collection.is_empty());
    }

    #[test]
    fn save_creates_parent_directories_and_indents_four_spaces() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("out").join("energyproviders.json");
        let store = JsonFileStore::new(&path);

        store.save(&sample()).expect("save succeeds");

        let text = fs::read_to_string(&path).expect("file written");
        assert!(text.starts_with("[\n    {\n        \"name\": \"Acme Power\""));
        assert_eq!(store.load().expect("reload"), sample());

        let leftovers: Vec<_> = fs::read_dir(path.parent().expect("parent"))
            .expect("read dir")
            .filter_map(Result::ok)
            .filter(|entry| entry.file_name().to_string_lossy().contains(".tmp-"))
            .collect();
        assert!(leftovers.is_empty());
    }

    #[test]
    fn invalid_json_is_reported_with_path() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("energyproviders.json");
        fs::write(&path, "{ not json").expect("seed file");

        let error = JsonFileStore::new(&path).load().expect_err("invalid json");
        match error {
            StoreError::Json { path: reported, .. } => assert_eq!(reported, path),
            other => panic!("expected json error, got {other:?}"),
        }
    }
}
