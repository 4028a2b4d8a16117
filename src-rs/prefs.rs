use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::error::StorageError;

pub const PREF_API_KEY: &str = "apiKey";
pub const PREF_STYLES: &str = "styles";

/// Last-used form values that survive between runs.
pub trait PreferenceStore {
    /// Never fails: any lookup problem yields `default`.
    fn get(&self, key: &str, default: &str) -> String;

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError>;
}

/// Preferences kept as a single JSON object on disk.
#[derive(Debug, Clone)]
pub struct JsonFilePreferences {
    path: PathBuf,
}

impl JsonFilePreferences {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<Map<String, Value>, StorageError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Map::new()),
            Err(source) => {
                return Err(StorageError::Read {
                    path: self.path.clone(),
                    source,
                })
            }
        };
        // A corrupt file is replaced on the next write.
        match serde_json::from_str::<Value>(&raw) {
            Ok(Value::Object(map)) => Ok(map),
            _ => Ok(Map::new()),
        }
    }
}

impl PreferenceStore for JsonFilePreferences {
    fn get(&self, key: &str, default: &str) -> String {
        match self.load() {
            Ok(map) => map
                .get(key)
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_else(|| default.to_string()),
            Err(err) => {
                warn!(key, error = %err, "preference lookup failed, using default");
                default.to_string()
            }
        }
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut map = self.load()?;
        map.insert(key.to_string(), Value::String(value.to_string()));
        let raw = serde_json::to_string_pretty(&Value::Object(map))?;

        let write_error = |source| StorageError::Write {
            path: self.path.clone(),
            source,
        };
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(write_error)?;
            }
        }
        fs::write(&self.path, raw).map_err(write_error)?;
        debug!(key, path = %self.path.display(), "saved preference");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn missing_file_returns_default() {
        let dir = tempdir().unwrap();
        let prefs = JsonFilePreferences::new(dir.path().join("prefs.json"));
        assert_eq!(prefs.get(PREF_API_KEY, "fallback"), "fallback");
    }

    #[test]
    fn set_creates_parent_dirs_and_round_trips() {
        let dir = tempdir().unwrap();
        let mut prefs = JsonFilePreferences::new(dir.path().join("a").join("b").join("prefs.json"));
        prefs.set(PREF_API_KEY, "KEY").unwrap();
        prefs.set(PREF_STYLES, "[]").unwrap();
        assert_eq!(prefs.get(PREF_API_KEY, ""), "KEY");
        assert_eq!(prefs.get(PREF_STYLES, ""), "[]");
        prefs.set(PREF_API_KEY, "NEW").unwrap();
        assert_eq!(prefs.get(PREF_API_KEY, ""), "NEW");
        assert_eq!(prefs.get(PREF_STYLES, ""), "[]");
    }

    #[test]
    fn corrupt_file_reads_as_defaults_and_is_replaced() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("prefs.json");
        fs::write(&path, "{not json").unwrap();
        let mut prefs = JsonFilePreferences::new(&path);
        assert_eq!(prefs.get(PREF_STYLES, "none"), "none");
        prefs.set(PREF_STYLES, "x").unwrap();
        assert_eq!(prefs.get(PREF_STYLES, ""), "x");
    }

    #[test]
    fn non_string_value_reads_as_default() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("prefs.json");
        fs::write(&path, r#"{"apiKey": 42}"#).unwrap();
        let prefs = JsonFilePreferences::new(&path);
        assert_eq!(prefs.get(PREF_API_KEY, "d"), "d");
    }

    #[test]
    fn unreadable_file_returns_default_and_keeps_path() {
        let dir = tempdir().unwrap();
        let prefs = JsonFilePreferences::new(dir.path());
        assert_eq!(prefs.path(), dir.path());
        assert_eq!(prefs.get(PREF_API_KEY, "fallback"), "fallback");
    }

    #[test]
    fn set_fails_when_path_is_a_directory() {
        let dir = tempdir().unwrap();
        let mut prefs = JsonFilePreferences::new(dir.path());
        assert!(prefs.set(PREF_API_KEY, "KEY").is_err());
    }
}
