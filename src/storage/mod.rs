//! All things related to the device storage of note collections and the credential record

use std::future::Future;

use thiserror::Error;

pub use file::File;
pub use memory::Memory;

use crate::config::StorageConfig;

mod file;
mod memory;

/// Key of the active note collection
pub const ACTIVE_NOTES_KEY: &str = "notes.json";

/// Key of the archived note collection
pub const ARCHIVED_NOTES_KEY: &str = "archive.json";

/// Key of the single user credential record
pub const CREDENTIAL_KEY: &str = "user.json";

/// Setup the storage
///
/// # Errors
///
/// Will return `Err` when the document directory of the file storage cannot be created
pub async fn setup(config: &StorageConfig) -> Result<Backend> {
    match config {
        StorageConfig::Memory => Ok(Backend::Memory(Memory::new())),
        StorageConfig::Directory(root) => Ok(Backend::File(File::new(root).await?)),
    }
}

/// Storage errors
#[derive(Debug, Error)]
pub enum Error {
    /// Nothing is stored under the key
    #[error("Nothing stored under `{0}`")]
    NotFound(String),

    /// Reading or writing the key failed
    #[error("Storage error on `{key}`: {source}")]
    Io {
        key: String,
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    pub(crate) fn io<K: ToString>(key: K, source: std::io::Error) -> Self {
        Self::Io {
            key: key.to_string(),
            source,
        }
    }
}

/// Result type for all storage interactions
pub type Result<T> = core::result::Result<T, Error>;

/// Minimal device storage: whole values stored under a key
pub trait Storage: Clone + Send + Sync + 'static {
    /// Is anything stored under the key?
    fn exists(&self, key: &str) -> impl Future<Output = Result<bool>> + Send;

    /// Read the full value of the key
    ///
    /// Fails with [`Error::NotFound`] when nothing is stored
    fn read(&self, key: &str) -> impl Future<Output = Result<Vec<u8>>> + Send;

    /// Replace the full value of the key
    fn write(&self, key: &str, bytes: &[u8]) -> impl Future<Output = Result<()>> + Send;

    /// Remove the key, a missing key is not an error
    fn remove(&self, key: &str) -> impl Future<Output = Result<()>> + Send;

    /// Write multiple keys as one unit
    ///
    /// When one of the writes fails, the keys written so far are put back to what they were
    /// before and the error of the failed write is returned
    fn write_all(&self, entries: &[(&str, Vec<u8>)]) -> impl Future<Output = Result<()>> + Send {
        async move {
            let mut previous = Vec::with_capacity(entries.len());
            for (key, _) in entries {
                match self.read(key).await {
                    Ok(bytes) => previous.push(Some(bytes)),
                    Err(Error::NotFound(_)) => previous.push(None),
                    Err(err) => return Err(err),
                }
            }

            for (index, (key, bytes)) in entries.iter().enumerate() {
                if let Err(err) = self.write(key, bytes).await {
                    tracing::warn!("Writing `{key}` failed, rolling back {index} earlier write(s)");

                    for ((key, _), before) in entries.iter().zip(&previous).take(index) {
                        let restored = match before {
                            Some(bytes) => self.write(key, bytes).await,
                            None => self.remove(key).await,
                        };

                        if let Err(rollback_err) = restored {
                            tracing::error!("Could not roll back `{key}`: {rollback_err}");
                        }
                    }

                    return Err(err);
                }
            }

            Ok(())
        }
    }
}

/// Storage backend picked by configuration
#[derive(Clone, Debug)]
pub enum Backend {
    Memory(Memory),
    File(File),
}

impl Storage for Backend {
    async fn exists(&self, key: &str) -> Result<bool> {
        match self {
            Backend::Memory(memory) => memory.exists(key).await,
            Backend::File(file) => file.exists(key).await,
        }
    }

    async fn read(&self, key: &str) -> Result<Vec<u8>> {
        match self {
            Backend::Memory(memory) => memory.read(key).await,
            Backend::File(file) => file.read(key).await,
        }
    }

    async fn write(&self, key: &str, bytes: &[u8]) -> Result<()> {
        match self {
            Backend::Memory(memory) => memory.write(key, bytes).await,
            Backend::File(file) => file.write(key, bytes).await,
        }
    }

    async fn remove(&self, key: &str) -> Result<()> {
        match self {
            Backend::Memory(memory) => memory.remove(key).await,
            Backend::File(file) => file.remove(key).await,
        }
    }
}
