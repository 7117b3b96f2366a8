//! The single user credential record

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

use crate::lock_gate::MIN_PASSWORD_LEN;
use crate::password::generate;
use crate::password::hash;
use crate::password::verify;
use crate::storage;
use crate::storage::CREDENTIAL_KEY;
use crate::storage::Storage;
use crate::utils::is_blank;

/// Credential errors
#[derive(Debug, Error)]
pub enum Error {
    /// Missing username, weak or unconfirmed password
    #[error("{0}")]
    Validation(&'static str),

    /// A credential record already exists
    #[error("An account already exists")]
    AlreadyRegistered,

    /// Unknown username or wrong password
    #[error("Invalid username or password")]
    InvalidCredentials,

    /// The stored record could not be parsed
    #[error("Stored account is unreadable: {0}")]
    StorageCorrupt(#[source] serde_json::Error),

    /// The record could not be serialized
    #[error("Account could not be serialized: {0}")]
    Encode(#[source] serde_json::Error),

    /// The password could not be hashed
    #[error("Password could not be hashed: {0}")]
    Hash(String),

    /// Reading or writing storage failed
    #[error(transparent)]
    Storage(#[from] storage::Error),
}

/// Result type for all credential interactions
pub type Result<T> = core::result::Result<T, Error>;

/// The stored credential record
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    /// The username
    pub username: String,

    /// Hash of the password, older app revisions stored plaintext
    pub password: String,
}

/// Access to the credential record
#[derive(Clone, Debug)]
pub struct CredentialStore<S: Storage> {
    storage: S,
}

impl<S: Storage> CredentialStore<S> {
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    /// The stored credential, if any
    ///
    /// # Errors
    ///
    /// Will return `Err` when storage cannot be read or parsed
    pub async fn find(&self) -> Result<Option<Credential>> {
        let bytes = match self.storage.read(CREDENTIAL_KEY).await {
            Ok(bytes) => bytes,
            Err(storage::Error::NotFound(_)) => return Ok(None),
            Err(err) => return Err(err.into()),
        };

        serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(Error::StorageCorrupt)
    }

    /// Create the credential record
    ///
    /// # Errors
    ///
    /// Will return `Err` when:
    /// - The username is empty
    /// - The password is empty, shorter than 6 characters or not confirmed
    /// - A record already exists
    /// - Storage fails
    pub async fn register(
        &self,
        username: &str,
        password: &str,
        confirmation: &str,
    ) -> Result<Credential> {
        if is_blank(username) || password.is_empty() {
            return Err(Error::Validation("Please enter a username and password"));
        }

        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(Error::Validation("Password must be at least 6 characters"));
        }

        if password != confirmation {
            return Err(Error::Validation("Passwords do not match"));
        }

        if self.storage.exists(CREDENTIAL_KEY).await? {
            return Err(Error::AlreadyRegistered);
        }

        self.store(username.trim(), password).await
    }

    /// Check a login attempt against the record
    ///
    /// # Errors
    ///
    /// Will return `Err` when there is no record, the username or password is wrong, or the
    /// record cannot be read
    pub async fn login(&self, username: &str, password: &str) -> Result<Credential> {
        let credential = self.find().await?.ok_or(Error::InvalidCredentials)?;

        if credential.username == username.trim() && verify(&credential.password, password) {
            tracing::debug!("User {} logged in", credential.username);

            Ok(credential)
        } else {
            Err(Error::InvalidCredentials)
        }
    }

    /// Make sure a credential record exists
    ///
    /// Missing username or password are generated and logged
    ///
    /// # Errors
    ///
    /// Will return `Err` when storage fails
    pub async fn ensure_initial_user(
        &self,
        username: Option<&str>,
        password: Option<&str>,
    ) -> Result<()> {
        if self.find().await?.is_some() {
            return Ok(());
        }

        let username = username.map_or_else(
            || {
                let initial_username = generate();
                tracing::info!(
                    "`INITIAL_USERNAME` not set, generating new username: {initial_username}"
                );
                initial_username
            },
            str::to_string,
        );

        let password = password.map_or_else(
            || {
                let initial_password = generate();
                tracing::info!(
                    "`INITIAL_PASSWORD` not set, generating new password: {initial_password}"
                );
                initial_password
            },
            str::to_string,
        );

        self.store(&username, &password).await?;

        Ok(())
    }

    async fn store(&self, username: &str, password: &str) -> Result<Credential> {
        let credential = Credential {
            username: username.to_string(),
            password: hash(password).map_err(|err| Error::Hash(err.to_string()))?,
        };

        let bytes = serde_json::to_vec(&credential).map_err(Error::Encode)?;
        self.storage.write(CREDENTIAL_KEY, &bytes).await?;

        tracing::debug!("Stored credential for {}", credential.username);

        Ok(credential)
    }
}
