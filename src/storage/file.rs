//! File storage
//!
//! Every key is a JSON file in the document directory

use std::io::ErrorKind;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;

use tokio::fs;
use uuid::Uuid;

use super::Error;
use super::Result;
use super::Storage;

/// Storage backed by files in a single directory
#[derive(Clone, Debug)]
pub struct File {
    /// The document directory
    root: Arc<PathBuf>,
}

impl File {
    /// Create a file storage, the directory is created when missing
    ///
    /// # Errors
    ///
    /// Will return `Err` when the directory cannot be created
    pub async fn new<P: AsRef<Path>>(root: P) -> Result<Self> {
        let root = root.as_ref().to_path_buf();

        fs::create_dir_all(&root)
            .await
            .map_err(|err| Error::io(root.display(), err))?;

        Ok(Self {
            root: Arc::new(root),
        })
    }

    fn path(&self, key: &str) -> PathBuf {
        self.root.join(key)
    }
}

impl Storage for File {
    async fn exists(&self, key: &str) -> Result<bool> {
        fs::try_exists(self.path(key))
            .await
            .map_err(|err| Error::io(key, err))
    }

    async fn read(&self, key: &str) -> Result<Vec<u8>> {
        match fs::read(self.path(key)).await {
            Ok(bytes) => Ok(bytes),
            Err(err) if err.kind() == ErrorKind::NotFound => Err(Error::NotFound(key.to_string())),
            Err(err) => Err(Error::io(key, err)),
        }
    }

    async fn write(&self, key: &str, bytes: &[u8]) -> Result<()> {
        let path = self.path(key);
        // same directory, so the rename stays on one filesystem
        let tmp_path = self.path(&format!(".{key}.{}.tmp", Uuid::new_v4()));

        fs::write(&tmp_path, bytes)
            .await
            .map_err(|err| Error::io(key, err))?;

        if let Err(err) = fs::rename(&tmp_path, &path).await {
            if let Err(remove_err) = fs::remove_file(&tmp_path).await {
                tracing::error!(
                    "Could not remove temporary file {}: {remove_err}",
                    tmp_path.display()
                );
            }

            return Err(Error::io(key, err));
        }

        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        match fs::remove_file(self.path(key)).await {
            Err(err) if err.kind() != ErrorKind::NotFound => Err(Error::io(key, err)),
            _ => Ok(()),
        }
    }
}
