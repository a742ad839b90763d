//! Durable blobs for the fitted scaler and ensemble.

use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::error::ArtifactError;

pub const MODEL_KEY: &str = "ride_sharing_model.json";
pub const SCALER_KEY: &str = "scaler.json";

/// Bumped whenever the encoded layout of either artifact changes.
pub const FORMAT_VERSION: u32 = 1;

/// Opaque keyed blob storage.
pub trait ArtifactStore: Send + Sync {
    /// `Ok(None)` when nothing was ever written under `key`.
    fn read(&self, key: &str) -> Result<Option<Vec<u8>>, ArtifactError>;
    fn write(&self, key: &str, bytes: &[u8]) -> Result<(), ArtifactError>;
}

/// One file per key inside a directory.
#[derive(Debug, Clone)]
pub struct FsArtifactStore {
    dir: PathBuf,
}

impl FsArtifactStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl ArtifactStore for FsArtifactStore {
    fn read(&self, key: &str) -> Result<Option<Vec<u8>>, ArtifactError> {
        match fs::read(self.dir.join(key)) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn write(&self, key: &str, bytes: &[u8]) -> Result<(), ArtifactError> {
        fs::create_dir_all(&self.dir)?;
        // write-then-rename so a crash never leaves a truncated blob
        let tmp = self.dir.join(format!(".{key}.tmp"));
        fs::write(&tmp, bytes)?;
        fs::rename(&tmp, self.dir.join(key))?;
        Ok(())
    }
}

/// Process-local store, for tests and ephemeral deployments.
#[derive(Debug, Default)]
pub struct MemoryArtifactStore {
    blobs: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryArtifactStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.blobs.lock().contains_key(key)
    }
}

impl ArtifactStore for MemoryArtifactStore {
    fn read(&self, key: &str) -> Result<Option<Vec<u8>>, ArtifactError> {
        Ok(self.blobs.lock().get(key).cloned())
    }

    fn write(&self, key: &str, bytes: &[u8]) -> Result<(), ArtifactError> {
        self.blobs.lock().insert(key.to_string(), bytes.to_vec());
        Ok(())
    }
}

/// Envelope written around each artifact. `fit_id` ties the scaler and the
/// ensemble of one training pass together.
#[derive(Debug, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub format_version: u32,
    pub fit_id: u64,
    pub payload: T,
}

pub fn encode<T: Serialize>(fit_id: u64, payload: &T) -> Result<Vec<u8>, ArtifactError> {
    let envelope = Envelope {
        format_version: FORMAT_VERSION,
        fit_id,
        payload,
    };
    Ok(serde_json::to_vec(&envelope)?)
}

pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<Envelope<T>, ArtifactError> {
    let envelope: Envelope<T> = serde_json::from_slice(bytes)?;
    if envelope.format_version != FORMAT_VERSION {
        return Err(ArtifactError::Incompatible(format!(
            "format version {} (expected {})",
            envelope.format_version, FORMAT_VERSION
        )));
    }
    Ok(envelope)
}
