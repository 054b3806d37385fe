//! Storage shared between the app process and the widget process.
//!
//! A bucket is a directory named after the app-group id; every key is one file
//! inside it. Writes go through a temporary file and a rename, so a reader in
//! the other process sees either the previous value or the new one.

use chrono::Utc;
use std::{
    fs, io,
    path::{Path, PathBuf},
};
use tracing::{debug, info, warn};

use crate::{
    Config,
    error::StoreError,
    model::{SharedWeatherSnapshot, WeatherRecord},
};

/// Key-value bucket scoped to an app-group id.
#[derive(Debug, Clone)]
pub struct SharedBucket {
    dir: PathBuf,
}

impl SharedBucket {
    /// Open the bucket for writing, creating its directory if needed.
    pub fn create(root: &Path, group_id: &str) -> Result<Self, StoreError> {
        let dir = root.join(group_id);
        fs::create_dir_all(&dir).map_err(|source| StoreError::BucketUnavailable {
            path: dir.clone(),
            source,
        })?;
        Ok(Self { dir })
    }

    /// Open an existing bucket. Readers never create one.
    pub fn open(root: &Path, group_id: &str) -> Result<Self, StoreError> {
        let dir = root.join(group_id);
        match fs::metadata(&dir) {
            Ok(meta) if meta.is_dir() => Ok(Self { dir }),
            Ok(_) => Err(StoreError::BucketUnavailable {
                path: dir,
                source: io::Error::other("not a directory"),
            }),
            Err(source) => Err(StoreError::BucketUnavailable { path: dir, source }),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn key_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }

    /// Read the value stored under `key`; `Ok(None)` when absent.
    pub fn data(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        let path = self.key_path(key);
        match fs::read(&path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(StoreError::Io { path, source }),
        }
    }

    /// Replace the value stored under `key`.
    pub fn set(&self, key: &str, bytes: &[u8]) -> Result<(), StoreError> {
        let path = self.key_path(key);
        let tmp = self.dir.join(format!(".{key}.json.tmp"));

        fs::write(&tmp, bytes).map_err(|source| StoreError::Io {
            path: tmp.clone(),
            source,
        })?;
        fs::rename(&tmp, &path).map_err(|source| StoreError::Io {
            path: path.clone(),
            source,
        })
    }

    pub fn remove(&self, key: &str) -> Result<bool, StoreError> {
        let path = self.key_path(key);
        match fs::remove_file(&path) {
            Ok(()) => Ok(true),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(source) => Err(StoreError::Io { path, source }),
        }
    }
}

/// Reads and writes the latest weather snapshot under a fixed key.
#[derive(Debug, Clone)]
pub struct WeatherStore {
    root: PathBuf,
    group_id: String,
    key: String,
}

impl WeatherStore {
    pub fn new(root: impl Into<PathBuf>, group_id: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            group_id: group_id.into(),
            key: key.into(),
        }
    }

    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        Ok(Self::new(
            config.store_root()?,
            config.app_group_id.clone(),
            config.store_key.clone(),
        ))
    }

    /// Location of the stored snapshot file.
    pub fn path(&self) -> PathBuf {
        self.root.join(&self.group_id).join(format!("{}.json", self.key))
    }

    /// Serialize `record` and overwrite the stored snapshot.
    pub fn save(&self, record: &WeatherRecord) -> Result<SharedWeatherSnapshot, StoreError> {
        let snapshot = SharedWeatherSnapshot {
            written_at: Utc::now(),
            record: record.clone(),
        };
        let bytes = serde_json::to_vec(&snapshot).map_err(StoreError::Serialize)?;

        SharedBucket::create(&self.root, &self.group_id)?.set(&self.key, &bytes)?;
        Ok(snapshot)
    }

    /// Read the stored snapshot. `Ok(None)` when nothing was written yet.
    pub fn try_load(&self) -> Result<Option<SharedWeatherSnapshot>, StoreError> {
        let Some(bucket) = self.existing_bucket()? else {
            return Ok(None);
        };
        let Some(bytes) = bucket.data(&self.key)? else {
            return Ok(None);
        };
        serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(StoreError::Deserialize)
    }

    /// Widget read path: every failure collapses into "no data".
    pub fn load(&self) -> Option<SharedWeatherSnapshot> {
        match self.try_load() {
            Ok(Some(snapshot)) => {
                debug!(city = %snapshot.record.name, "loaded weather from shared store");
                Some(snapshot)
            }
            Ok(None) => {
                info!(key = %self.key, "no weather saved in shared store");
                None
            }
            Err(err) => {
                warn!(error = %err, "could not read weather from shared store");
                None
            }
        }
    }

    pub fn clear(&self) -> Result<bool, StoreError> {
        match self.existing_bucket()? {
            Some(bucket) => bucket.remove(&self.key),
            None => Ok(false),
        }
    }

    /// The bucket, or `None` if the app has never written to it.
    fn existing_bucket(&self) -> Result<Option<SharedBucket>, StoreError> {
        match SharedBucket::open(&self.root, &self.group_id) {
            Ok(bucket) => Ok(Some(bucket)),
            Err(StoreError::BucketUnavailable { source, .. })
                if source.kind() == io::ErrorKind::NotFound =>
            {
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }
}
