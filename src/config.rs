//! Configuration from the environment

use std::path::PathBuf;

use thiserror::Error;

use crate::note_store::ContentPolicy;
use crate::note_store::LockedContentMode;
use crate::utils::env_var;

/// Configuration errors
#[derive(Debug, Error)]
pub enum Error {
    /// An ENV var holds a value that is not one of the expected choices
    #[error("Invalid value `{value}` for `{var}`, expected one of: {expected}")]
    InvalidValue {
        var: &'static str,
        value: String,
        expected: &'static str,
    },

    /// File storage is asked for without a directory
    #[error("`NOTEKEEP_STORAGE=file` needs `NOTEKEEP_DIR` to be set")]
    MissingDirectory,
}

/// Where the collections are stored
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StorageConfig {
    /// In memory, gone when the process ends
    Memory,

    /// JSON files in the given document directory
    Directory(PathBuf),
}

/// Application configuration
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    /// Storage backend
    pub storage: StorageConfig,

    /// Is note content allowed to be empty?
    pub content_policy: ContentPolicy,

    /// Is the content of locked notes written to storage?
    pub locked_content: LockedContentMode,

    /// Username of the initial credential record
    pub initial_username: Option<String>,

    /// Password of the initial credential record
    pub initial_password: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            storage: StorageConfig::Memory,
            content_policy: ContentPolicy::Required,
            locked_content: LockedContentMode::Persist,
            initial_username: None,
            initial_password: None,
        }
    }
}

impl Config {
    /// Read the configuration from the environment
    ///
    /// # Errors
    ///
    /// Will return `Err` when an ENV var holds an unknown value
    pub fn from_env() -> Result<Self, Error> {
        Self::from_lookup(env_var)
    }

    /// Read the configuration through the given lookup of ENV var values
    ///
    /// # Errors
    ///
    /// Will return `Err` when a var holds an unknown value
    pub fn from_lookup<F>(lookup: F) -> Result<Self, Error>
    where
        F: Fn(&'static str) -> Option<String>,
    {
        let directory = lookup("NOTEKEEP_DIR").map(PathBuf::from);

        let storage = match lookup("NOTEKEEP_STORAGE").as_deref() {
            None => directory.map_or(StorageConfig::Memory, StorageConfig::Directory),
            Some("memory") => StorageConfig::Memory,
            Some("file") => StorageConfig::Directory(directory.ok_or(Error::MissingDirectory)?),
            Some(other) => return Err(invalid("NOTEKEEP_STORAGE", other, "memory, file")),
        };

        let content_policy = match lookup("NOTEKEEP_CONTENT_POLICY").as_deref() {
            None | Some("required") => ContentPolicy::Required,
            Some("optional") => ContentPolicy::Optional,
            Some(other) => {
                return Err(invalid(
                    "NOTEKEEP_CONTENT_POLICY",
                    other,
                    "required, optional",
                ));
            }
        };

        let locked_content = match lookup("NOTEKEEP_LOCKED_CONTENT").as_deref() {
            None | Some("persist") => LockedContentMode::Persist,
            Some("conceal") => LockedContentMode::Conceal,
            Some(other) => {
                return Err(invalid(
                    "NOTEKEEP_LOCKED_CONTENT",
                    other,
                    "persist, conceal",
                ));
            }
        };

        Ok(Self {
            storage,
            content_policy,
            locked_content,
            initial_username: lookup("INITIAL_USERNAME"),
            initial_password: lookup("INITIAL_PASSWORD"),
        })
    }
}

fn invalid(var: &'static str, value: &str, expected: &'static str) -> Error {
    Error::InvalidValue {
        var,
        value: value.to_string(),
        expected,
    }
}
