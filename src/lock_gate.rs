//! Per-note password locks and the session of unlocked notes
//!
//! A locked note is either sealed (content hidden until the password is given) or open for the
//! rest of the [`Session`]. Opening a note never changes its stored lock, only
//! [`LockGate::remove_lock`] produces a patch that does.

use std::collections::HashSet;

use thiserror::Error;

use crate::notes::LockPatch;
use crate::notes::Note;
use crate::notes::NoteId;
use crate::notes::NotePatch;
use crate::password;

/// Minimal length of a note password, in characters
pub const MIN_PASSWORD_LEN: usize = 6;

/// Shown instead of the content of a sealed note
pub const REDACTED: &str = "🔒";

/// Lock gate errors
#[derive(Debug, Error)]
pub enum Error {
    /// The new password is missing, not confirmed or too short
    #[error("{0}")]
    Validation(&'static str),

    /// The attempt does not match the password of the note
    #[error("Wrong password, try again")]
    WrongPassword,

    /// The note has no lock to open or remove
    #[error("Note is not locked")]
    NotLocked,

    /// The note already has a lock
    #[error("Note is already locked")]
    AlreadyLocked,

    /// The password could not be hashed
    #[error("Password could not be hashed: {0}")]
    Hash(String),
}

/// Result type for all lock gate interactions
pub type Result<T> = core::result::Result<T, Error>;

/// Lock state of a note within a session
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LockState {
    /// No lock, content always visible
    Unlocked,

    /// Locked and not yet opened in this session
    Sealed,

    /// Locked, but opened earlier in this session
    Open,
}

/// What a successful challenge is for
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UnlockIntent {
    /// Open the note for the rest of the session, the lock stays
    Session,

    /// Remove the lock for good
    Permanent,
}

/// Notes opened since the application started
///
/// Created empty, never persisted. Owned by the application context and handed to the lock
/// gate by reference.
#[derive(Debug, Default)]
pub struct Session {
    unlocked: HashSet<NoteId>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Has the note been opened in this session?
    pub fn is_unlocked(&self, id: &NoteId) -> bool {
        self.unlocked.contains(id)
    }

    /// Seal the note again
    pub fn forget(&mut self, id: &NoteId) {
        self.unlocked.remove(id);
    }

    /// Seal every note again, as on logout or restart
    pub fn clear(&mut self) {
        self.unlocked.clear();
    }

    pub fn len(&self) -> usize {
        self.unlocked.len()
    }

    pub fn is_empty(&self) -> bool {
        self.unlocked.is_empty()
    }

    fn open(&mut self, id: &NoteId) {
        self.unlocked.insert(id.clone());
    }
}

/// The lock/unlock protocol of notes
///
/// Produces [`NotePatch`]es, persisting them is up to the caller
#[derive(Clone, Copy, Debug)]
pub struct LockGate {
    min_password_len: usize,
}

impl Default for LockGate {
    fn default() -> Self {
        Self {
            min_password_len: MIN_PASSWORD_LEN,
        }
    }
}

impl LockGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lock state of the note in the session
    ///
    /// A note flagged as locked without a stored password has nothing to check against and is
    /// treated as unlocked
    pub fn state(&self, session: &Session, note: &Note) -> LockState {
        if note.lock_password().is_none() {
            if note.is_locked() {
                tracing::warn!("Note {} is locked without a password", note.id);
            }

            LockState::Unlocked
        } else if session.is_unlocked(&note.id) {
            LockState::Open
        } else {
            LockState::Sealed
        }
    }

    /// Must the password be given before showing or editing the note?
    pub fn requires_challenge(&self, session: &Session, note: &Note) -> bool {
        self.state(session, note) == LockState::Sealed
    }

    /// Content of the note, if it may be shown
    pub fn visible_content<'a>(&self, session: &Session, note: &'a Note) -> Option<&'a str> {
        match self.state(session, note) {
            LockState::Sealed => None,
            LockState::Unlocked | LockState::Open => Some(&note.content),
        }
    }

    /// Content of the note, or a placeholder when sealed
    pub fn display_content<'a>(&self, session: &Session, note: &'a Note) -> &'a str {
        self.visible_content(session, note).unwrap_or(REDACTED)
    }

    /// Lock a note with a password
    ///
    /// The returned patch holds a salted hash of the password. The note is sealed in the
    /// session, even if it was opened before.
    ///
    /// # Errors
    ///
    /// Will return `Err` when:
    /// - The note is already locked
    /// - The password or confirmation is empty, they differ, or the password is too short
    /// - Hashing fails
    pub fn set_lock(
        &self,
        session: &mut Session,
        note: &Note,
        password: &str,
        confirmation: &str,
    ) -> Result<NotePatch> {
        if note.lock_password().is_some() {
            return Err(Error::AlreadyLocked);
        }

        if password.is_empty() || confirmation.is_empty() {
            return Err(Error::Validation("Please enter the password twice"));
        }

        if password != confirmation {
            return Err(Error::Validation("Passwords do not match"));
        }

        if password.chars().count() < self.min_password_len {
            return Err(Error::Validation("Password must be at least 6 characters"));
        }

        let hashed_password =
            password::hash(password).map_err(|err| Error::Hash(err.to_string()))?;

        session.forget(&note.id);

        tracing::debug!("Locking note {}", note.id);

        Ok(NotePatch::default().lock(LockPatch::Lock {
            password: hashed_password,
        }))
    }

    /// Check the password of a locked note
    ///
    /// On success the note is open for the rest of the session. The returned patch is empty for
    /// [`UnlockIntent::Session`] and clears the lock for [`UnlockIntent::Permanent`]. A failed
    /// attempt changes nothing and may be retried.
    ///
    /// # Errors
    ///
    /// Will return `Err` when the note is not locked, or the attempt is wrong
    pub fn challenge(
        &self,
        session: &mut Session,
        note: &Note,
        attempt: &str,
        intent: UnlockIntent,
    ) -> Result<NotePatch> {
        let stored = note.lock_password().ok_or(Error::NotLocked)?;

        if !password::verify(stored, attempt) {
            tracing::debug!("Wrong password for note {}", note.id);

            return Err(Error::WrongPassword);
        }

        session.open(&note.id);

        Ok(match intent {
            UnlockIntent::Session => NotePatch::default(),
            UnlockIntent::Permanent => NotePatch::default().lock(LockPatch::Clear),
        })
    }

    /// Open a locked note for the rest of the session, the stored lock stays
    ///
    /// # Errors
    ///
    /// Will return `Err` when the note is not locked, or the attempt is wrong
    pub fn unlock_for_session(
        &self,
        session: &mut Session,
        note: &Note,
        attempt: &str,
    ) -> Result<()> {
        self.challenge(session, note, attempt, UnlockIntent::Session)
            .map(|_| ())
    }

    /// Remove the lock of a note, returning the patch that clears it
    ///
    /// # Errors
    ///
    /// Will return `Err` when the note is not locked, or the attempt is wrong
    pub fn remove_lock(
        &self,
        session: &mut Session,
        note: &Note,
        attempt: &str,
    ) -> Result<NotePatch> {
        self.challenge(session, note, attempt, UnlockIntent::Permanent)
    }
}
