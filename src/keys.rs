//! Key pair files for the operator binary.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::error::StorageError;
use crate::models::{KeyPair, KeyPairId, NewKeyPair};
use crate::store::KeyPairStore;

/// Errors reading or writing a key file.
#[derive(Debug, thiserror::Error)]
pub enum KeyFileError {
    #[error("Key file I/O failed: {0}")]
    Io(#[from] io::Error),

    #[error("Key file is malformed: {0}")]
    Format(#[from] bincode::Error),
}

/// Write a key pair to `path`, replacing any existing file.
pub fn save_key_pair(key_pair: &KeyPair, path: &Path) -> Result<(), KeyFileError> {
    let bytes = bincode::serialize(key_pair)?;
    fs::write(path, bytes)?;
    tracing::debug!(key_pair_id = key_pair.id, path = %path.display(), "wrote key file");
    Ok(())
}

/// Read a key pair written by [`save_key_pair`].
pub fn load_key_pair(path: &Path) -> Result<KeyPair, KeyFileError> {
    let bytes = fs::read(path)?;
    Ok(bincode::deserialize(&bytes)?)
}

/// Single-file key store holding the latest key pair.
///
/// Saving replaces the file with a key pair whose id is one above the one it replaces.
#[derive(Debug, Clone)]
pub struct KeyFile {
    path: PathBuf,
}

impl KeyFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl KeyPairStore for KeyFile {
    fn latest_key_pair(&self) -> Result<KeyPair, StorageError> {
        match load_key_pair(&self.path) {
            Ok(key_pair) => Ok(key_pair),
            Err(KeyFileError::Io(e)) if e.kind() == io::ErrorKind::NotFound => {
                Err(StorageError::NotFound("key pair"))
            }
            Err(e) => Err(StorageError::Backend(e.to_string())),
        }
    }

    fn save_key_pair(&self, key_pair: NewKeyPair) -> Result<KeyPairId, StorageError> {
        let id = match self.latest_key_pair() {
            Ok(previous) => previous.id + 1,
            Err(StorageError::NotFound(_)) => 1,
            Err(e) => return Err(e),
        };

        save_key_pair(&key_pair.with_id(id), &self.path)
            .map_err(|e| StorageError::Backend(e.to_string()))?;
        Ok(id)
    }
}
