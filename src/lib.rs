#![forbid(unsafe_code)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

//! Notekeep, local note storage with archiving and per-note password locks
//!
//! [`NoteStore`] owns the active and archived note collections, [`LockGate`] decides whether a
//! locked note may be shown. The two never call each other; the [`App`] context wires them
//! together for a presentation layer.

use anyhow::Result;
use tracing_subscriber::prelude::*;

pub use config::Config;
pub use config::StorageConfig;
pub use credentials::Credential;
pub use credentials::CredentialStore;
pub use lock_gate::LockGate;
pub use lock_gate::LockState;
pub use lock_gate::Session;
pub use lock_gate::UnlockIntent;
pub use note_store::ContentPolicy;
pub use note_store::LockedContentMode;
pub use note_store::NoteStore;
pub use note_store::NoteStoreOptions;
pub use notes::ImagePatch;
pub use notes::LockPatch;
pub use notes::Note;
pub use notes::NoteDraft;
pub use notes::NoteId;
pub use notes::NotePatch;
pub use storage::Backend;
pub use storage::Storage;

pub mod config;
pub mod credentials;
pub mod lock_gate;
pub mod note_store;
pub mod notes;
pub mod password;
pub mod storage;
#[cfg(test)]
mod tests;
mod utils;

const DEFAULT_RUST_LOG: &str = "notekeep=debug";

/// The top-level application context
///
/// Owns the stores and the session of unlocked notes. Dropping it (an app restart) forgets
/// every unlocked note.
#[derive(Debug)]
pub struct App<S: Storage> {
    /// The note collections
    pub notes: NoteStore<S>,

    /// The single credential record
    pub credentials: CredentialStore<S>,

    /// The lock protocol
    pub lock_gate: LockGate,

    /// Notes opened in this session
    pub session: Session,
}

impl<S: Storage> App<S> {
    /// Create the app on top of an existing storage
    ///
    /// When an initial username is configured, the credential record is created if missing
    ///
    /// # Errors
    ///
    /// Will return `Err` when the credential record cannot be read or written
    pub async fn with_storage(storage: S, config: &Config) -> Result<Self> {
        let credentials = CredentialStore::new(storage.clone());

        if config.initial_username.is_some() {
            credentials
                .ensure_initial_user(
                    config.initial_username.as_deref(),
                    config.initial_password.as_deref(),
                )
                .await?;
        }

        let options = NoteStoreOptions {
            content_policy: config.content_policy,
            locked_content: config.locked_content,
        };

        Ok(Self {
            notes: NoteStore::new(storage, options),
            credentials,
            lock_gate: LockGate::new(),
            session: Session::new(),
        })
    }

    /// Log in with the stored credential, starting a fresh session
    ///
    /// # Errors
    ///
    /// Will return `Err` when the username or password is wrong
    pub async fn login(&mut self, username: &str, password: &str) -> Result<Credential> {
        let credential = self.credentials.login(username, password).await?;

        self.session.clear();

        Ok(credential)
    }

    /// End the session, every locked note is sealed again
    pub fn logout(&mut self) {
        self.session.clear();
    }

    /// Lock a note with a new password and persist the lock
    ///
    /// # Errors
    ///
    /// Will return `Err` when the note does not exist, the password is rejected or storage fails
    pub async fn lock_note(
        &mut self,
        id: &NoteId,
        password: &str,
        confirmation: &str,
    ) -> Result<Note> {
        let note = self.find_note(id).await?;

        let patch = self
            .lock_gate
            .set_lock(&mut self.session, &note, password, confirmation)?;

        Ok(self.notes.update(id, patch).await?)
    }

    /// Open a locked note for the rest of the session
    ///
    /// # Errors
    ///
    /// Will return `Err` when the note does not exist or the password is wrong
    pub async fn open_note(&mut self, id: &NoteId, attempt: &str) -> Result<Note> {
        let note = self.find_note(id).await?;

        self.lock_gate
            .unlock_for_session(&mut self.session, &note, attempt)?;

        Ok(note)
    }

    /// Remove the lock of a note for good and persist it
    ///
    /// # Errors
    ///
    /// Will return `Err` when the note does not exist, the password is wrong or storage fails
    pub async fn unlock_note(&mut self, id: &NoteId, attempt: &str) -> Result<Note> {
        let note = self.find_note(id).await?;

        let patch = self
            .lock_gate
            .remove_lock(&mut self.session, &note, attempt)?;

        Ok(self.notes.update(id, patch).await?)
    }

    async fn find_note(&self, id: &NoteId) -> Result<Note> {
        self.notes
            .find(id)
            .await?
            .ok_or_else(|| note_store::Error::NotFound(id.clone()).into())
    }
}

/// Create and setup the app with its dependencies
///
/// # Errors
///
/// Will return `Err` if any of its dependencies fail to load:
/// - Storage directory
/// - Initial user setup
pub async fn setup_app(config: &Config) -> Result<App<Backend>> {
    let storage = storage::setup(&config.storage).await?;

    tracing::debug!("Using storage {:?}", config.storage);

    App::with_storage(storage, config).await
}

/// Load a `.env` file, if there is one
pub fn setup_environment() {
    dotenvy::dotenv().ok();
}

/// Install the tracing subscriber, filtered by `RUST_LOG`
pub fn setup_tracing() {
    use tracing_subscriber::EnvFilter;
    use tracing_subscriber::fmt;
    use tracing_subscriber::registry;

    let result = registry()
        .with(EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| DEFAULT_RUST_LOG.into()),
        ))
        .with(fmt::layer())
        .try_init();

    if let Err(err) = result {
        tracing::debug!("Tracing was already set up: {err}");
    }
}
