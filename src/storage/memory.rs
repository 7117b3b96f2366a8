//! Memory storage
//!
//! Will be destroyed on system shutdown

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex;

use super::Error;
use super::Result;
use super::Storage;

/// An in-memory storage
///
/// Clones share the same values
#[derive(Clone, Debug, Default)]
pub struct Memory {
    /// All values in storage, by key
    values: Arc<Mutex<HashMap<String, Vec<u8>>>>,
}

impl Memory {
    /// Create a new empty Memory storage
    pub fn new() -> Self {
        Self::default()
    }
}

impl Storage for Memory {
    async fn exists(&self, key: &str) -> Result<bool> {
        Ok(self.values.lock().await.contains_key(key))
    }

    async fn read(&self, key: &str) -> Result<Vec<u8>> {
        self.values
            .lock()
            .await
            .get(key)
            .cloned()
            .ok_or_else(|| Error::NotFound(key.to_string()))
    }

    async fn write(&self, key: &str, bytes: &[u8]) -> Result<()> {
        self.values
            .lock()
            .await
            .insert(key.to_string(), bytes.to_vec());

        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        self.values.lock().await.remove(key);

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_read_write() {
        let memory = Memory::new();

        assert!(!memory.exists("a").await.unwrap());
        assert!(matches!(memory.read("a").await, Err(Error::NotFound(key)) if key == "a"));

        memory.write("a", b"value").await.unwrap();
        assert!(memory.exists("a").await.unwrap());
        assert_eq!(b"value".to_vec(), memory.read("a").await.unwrap());

        // clones share the values
        let clone = memory.clone();
        clone.remove("a").await.unwrap();
        assert!(!memory.exists("a").await.unwrap());

        // removing twice is fine
        clone.remove("a").await.unwrap();
    }
}
