//! Keyed JSON persistence for small records.
//!
//! Each key maps to `<dir>/<key>.json`. Writes go through
//! [`write_text_atomic`](crate::atomic_io::write_text_atomic) so an interrupted
//! or overlapping run never leaves a truncated file behind.

use std::path::PathBuf;

use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

use crate::atomic_io::write_text_atomic;

/// Result type for state store operations.
pub type StateStoreResult<T> = Result<T, StateStoreError>;

/// Errors returned by [`StateStore`].
#[derive(Debug, Error)]
pub enum StateStoreError {
    #[error("invalid state key '{0}'")]
    InvalidKey(String),
    #[error("failed to read {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write {path}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to decode {path}")]
    Decode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to encode record for key '{key}'")]
    Encode {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Outcome of [`StateStore::load`]: a missing key is not an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Loaded<T> {
    Found(T),
    Absent,
}

/// File-backed store of JSON records keyed by name.
#[derive(Debug, Clone)]
pub struct StateStore {
    dir: PathBuf,
}

impl StateStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Path of the file backing `key`.
    pub fn path_for(&self, key: &str) -> StateStoreResult<PathBuf> {
        validate_key(key)?;
        Ok(self.dir.join(format!("{key}.json")))
    }

    /// Serializes `record` under `key`, replacing any previous value.
    pub fn save<T: Serialize>(&self, key: &str, record: &T) -> StateStoreResult<()> {
        let path = self.path_for(key)?;
        tracing::info!(path = %path.display(), "storing state");
        let encoded =
            serde_json::to_string_pretty(record).map_err(|source| StateStoreError::Encode {
                key: key.to_string(),
                source,
            })?;
        write_text_atomic(&path, &format!("{encoded}\n"))
            .map_err(|source| StateStoreError::Write { path, source })
    }

    /// Reads the record stored under `key`.
    ///
    /// Returns [`Loaded::Absent`] when nothing was ever written. Content that
    /// does not decode as `T` is reported as [`StateStoreError::Decode`].
    pub fn load<T: DeserializeOwned>(&self, key: &str) -> StateStoreResult<Loaded<T>> {
        let path = self.path_for(key)?;
        tracing::info!(path = %path.display(), "loading state");
        let raw = match std::fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "no stored state");
                return Ok(Loaded::Absent);
            }
            Err(source) => return Err(StateStoreError::Read { path, source }),
        };
        serde_json::from_str::<T>(&raw)
            .map(Loaded::Found)
            .map_err(|source| StateStoreError::Decode { path, source })
    }

    /// Like [`load`](Self::load), but treats absent and undecodable records
    /// as `T::default()`. Read failures still propagate.
    pub fn load_or_default<T: DeserializeOwned + Default>(&self, key: &str) -> StateStoreResult<T> {
        match self.load::<T>(key) {
            Ok(Loaded::Found(value)) => Ok(value),
            Ok(Loaded::Absent) => Ok(T::default()),
            Err(StateStoreError::Decode { path, source }) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %source,
                    "stored state has an unexpected shape, resetting to default"
                );
                Ok(T::default())
            }
            Err(error) => Err(error),
        }
    }
}

fn validate_key(key: &str) -> StateStoreResult<()> {
    let trimmed = key.trim();
    if trimmed.is_empty()
        || trimmed != key
        || key.contains(['/', '\\'])
        || key == "."
        || key == ".."
    {
        return Err(StateStoreError::InvalidKey(key.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;
    use tempfile::tempdir;

    use super::*;

    #[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
    struct Sample {
        name: String,
        count: u32,
    }

    #[test]
    fn load_of_never_written_key_is_absent() {
        let temp = tempdir().expect("tempdir");
        let store = StateStore::new(temp.path());
        let loaded = store.load::<Sample>("missing").expect("load should not fail");
        assert_eq!(loaded, Loaded::Absent);
    }

    #[test]
    fn save_then_load_returns_equivalent_record() {
        let temp = tempdir().expect("tempdir");
        let store = StateStore::new(temp.path());
        let sample = Sample {
            name: "weekly".to_string(),
            count: 3,
        };
        store.save("sample", &sample).expect("save");
        assert_eq!(
            store.load::<Sample>("sample").expect("load"),
            Loaded::Found(sample)
        );
    }

    #[test]
    fn save_overwrites_previous_value() {
        let temp = tempdir().expect("tempdir");
        let store = StateStore::new(temp.path());
        store.save("counter", &1_i64).expect("first save");
        store.save("counter", &2_i64).expect("second save");
        assert_eq!(
            store.load::<i64>("counter").expect("load"),
            Loaded::Found(2)
        );
    }

    #[test]
    fn wrong_shape_is_a_decode_error_and_defaults_via_load_or_default() {
        let temp = tempdir().expect("tempdir");
        let store = StateStore::new(temp.path());
        store.save("sample", &"not a record").expect("save");

        let error = store.load::<Sample>("sample").expect_err("shape mismatch");
        assert!(matches!(error, StateStoreError::Decode { .. }));
        assert_eq!(
            store.load_or_default::<Sample>("sample").expect("fallback"),
            Sample::default()
        );
    }

    #[test]
    fn corrupt_file_defaults_via_load_or_default() {
        let temp = tempdir().expect("tempdir");
        let store = StateStore::new(temp.path());
        std::fs::write(temp.path().join("cursor.json"), "{{{ not json").expect("write");
        assert_eq!(store.load_or_default::<i64>("cursor").expect("fallback"), 0);
    }

    #[test]
    fn keys_with_path_separators_are_rejected() {
        let store = StateStore::new("/tmp");
        for key in ["", "../escape", "a/b", " padded", ".."] {
            assert!(
                matches!(store.path_for(key), Err(StateStoreError::InvalidKey(_))),
                "key {key:?} should be rejected"
            );
        }
    }
}
