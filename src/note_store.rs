//! The note collections: the active notes and the archive
//!
//! Every note lives in exactly one of the two collections. Each collection is stored in full
//! under its own key, and every mutation re-reads, changes and rewrites the collections it
//! touches before returning.

use std::sync::Arc;

use thiserror::Error;
use tokio::sync::Mutex;

use crate::notes::LockPatch;
use crate::notes::Note;
use crate::notes::NoteDraft;
use crate::notes::NoteId;
use crate::notes::NotePatch;
use crate::storage;
use crate::storage::ACTIVE_NOTES_KEY;
use crate::storage::ARCHIVED_NOTES_KEY;
use crate::storage::Storage;
use crate::utils::is_blank;

/// Note store errors
#[derive(Debug, Error)]
pub enum Error {
    /// A required field is missing or empty
    #[error("{0}")]
    Validation(&'static str),

    /// No note with the ID in the expected collection
    #[error("Note not found")]
    NotFound(NoteId),

    /// A stored collection could not be parsed
    #[error("Stored notes in `{key}` are unreadable: {source}")]
    StorageCorrupt {
        key: &'static str,
        #[source]
        source: serde_json::Error,
    },

    /// A collection could not be serialized
    #[error("Notes could not be serialized: {0}")]
    Encode(#[source] serde_json::Error),

    /// Reading or writing storage failed
    #[error(transparent)]
    Storage(#[from] storage::Error),
}

/// Result type for all note store interactions
pub type Result<T> = core::result::Result<T, Error>;

/// Is empty note content accepted?
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ContentPolicy {
    /// Content must not be empty
    #[default]
    Required,

    /// Content may be empty
    Optional,
}

/// What is written to storage for locked notes
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LockedContentMode {
    /// Full content is stored, the lock only gates display
    #[default]
    Persist,

    /// Content and image of locked notes are never written, they cannot be recovered
    Conceal,
}

/// Options of the note store
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct NoteStoreOptions {
    pub content_policy: ContentPolicy,
    pub locked_content: LockedContentMode,
}

/// One of the two note collections
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Collection {
    Active,
    Archived,
}

impl Collection {
    fn key(self) -> &'static str {
        match self {
            Collection::Active => ACTIVE_NOTES_KEY,
            Collection::Archived => ARCHIVED_NOTES_KEY,
        }
    }

    fn is_archived(self) -> bool {
        self == Collection::Archived
    }
}

/// Single source of truth of the active and archived notes
///
/// Clones share the same queue, so operations of all clones run one after the other
#[derive(Clone, Debug)]
pub struct NoteStore<S: Storage> {
    storage: S,
    options: NoteStoreOptions,

    /// Single writer queue covering both collections
    queue: Arc<Mutex<()>>,
}

impl<S: Storage> NoteStore<S> {
    pub fn new(storage: S, options: NoteStoreOptions) -> Self {
        Self {
            storage,
            options,
            queue: Arc::new(Mutex::new(())),
        }
    }

    /// All active notes in stored order
    ///
    /// Missing or unreadable storage results in no notes, see
    /// [`try_load_active`](Self::try_load_active) to tell the difference
    pub async fn load_active(&self) -> Vec<Note> {
        self.try_load_active().await.unwrap_or_else(|err| {
            tracing::warn!("Loading active notes failed, showing none: {err}");
            Vec::new()
        })
    }

    /// All archived notes in stored order
    ///
    /// Missing or unreadable storage results in no notes, see
    /// [`try_load_archived`](Self::try_load_archived) to tell the difference
    pub async fn load_archived(&self) -> Vec<Note> {
        self.try_load_archived().await.unwrap_or_else(|err| {
            tracing::warn!("Loading archived notes failed, showing none: {err}");
            Vec::new()
        })
    }

    /// All active notes, failing on unreadable storage
    ///
    /// # Errors
    ///
    /// Will return `Err` when storage cannot be read or parsed
    pub async fn try_load_active(&self) -> Result<Vec<Note>> {
        let _queue = self.queue.lock().await;

        self.read(Collection::Active).await
    }

    /// All archived notes, failing on unreadable storage
    ///
    /// # Errors
    ///
    /// Will return `Err` when storage cannot be read or parsed
    pub async fn try_load_archived(&self) -> Result<Vec<Note>> {
        let _queue = self.queue.lock().await;

        self.read(Collection::Archived).await
    }

    /// Find a note in either collection
    ///
    /// # Errors
    ///
    /// Will return `Err` when storage cannot be read or parsed
    pub async fn find(&self, id: &NoteId) -> Result<Option<Note>> {
        let _queue = self.queue.lock().await;

        for collection in [Collection::Active, Collection::Archived] {
            let notes = self.read(collection).await?;

            if let Some(note) = notes.into_iter().find(|note| &note.id == id) {
                return Ok(Some(note));
            }
        }

        Ok(None)
    }

    /// Active notes with the query in their title or content, ignoring case
    ///
    /// Locked notes only match on their title. An empty query matches everything.
    pub async fn search(&self, query: &str) -> Vec<Note> {
        let query = query.trim().to_lowercase();

        let mut notes = self.load_active().await;
        if query.is_empty() {
            return notes;
        }

        notes.retain(|note| {
            note.title.to_lowercase().contains(&query)
                || (!note.is_locked() && note.content.to_lowercase().contains(&query))
        });

        notes
    }

    /// Create a note at the end of the active collection
    ///
    /// # Errors
    ///
    /// Will return `Err` when:
    /// - The title is empty, or the content is empty while it is required
    /// - Storage cannot be read, parsed or written
    pub async fn insert(&self, draft: NoteDraft) -> Result<Note> {
        if is_blank(&draft.title) {
            return Err(Error::Validation("Please enter a title"));
        }

        self.validate_content(&draft.content)?;

        let _queue = self.queue.lock().await;

        let mut notes = self.read(Collection::Active).await?;
        let index = notes.len();
        notes.push(Note::from_draft(draft));

        self.write(Collection::Active, &mut notes).await?;

        let note = notes.swap_remove(index);
        tracing::debug!("Inserted note {}", note.id);

        Ok(note)
    }

    /// Update a note in whichever collection holds it
    ///
    /// # Errors
    ///
    /// Will return `Err` when:
    /// - The patch sets an empty title, empty required content, or a lock without password
    /// - No note with the ID exists
    /// - Storage cannot be read, parsed or written
    pub async fn update(&self, id: &NoteId, patch: NotePatch) -> Result<Note> {
        self.validate_patch(&patch)?;

        let _queue = self.queue.lock().await;

        for collection in [Collection::Active, Collection::Archived] {
            let mut notes = self.read(collection).await?;

            let Some(index) = position(&notes, id) else {
                continue;
            };

            notes[index].apply(patch);

            self.write(collection, &mut notes).await?;

            tracing::debug!("Updated note {id}");

            return Ok(notes.swap_remove(index));
        }

        Err(Error::NotFound(id.clone()))
    }

    /// Permanently remove a note from whichever collection holds it
    ///
    /// Removing an unknown ID does nothing
    ///
    /// # Errors
    ///
    /// Will return `Err` when storage cannot be read, parsed or written
    pub async fn remove(&self, id: &NoteId) -> Result<()> {
        let _queue = self.queue.lock().await;

        for collection in [Collection::Active, Collection::Archived] {
            let mut notes = self.read(collection).await?;

            let Some(index) = position(&notes, id) else {
                continue;
            };

            notes.remove(index);

            self.write(collection, &mut notes).await?;

            tracing::debug!("Removed note {id}");

            return Ok(());
        }

        tracing::debug!("Note {id} already removed");

        Ok(())
    }

    /// Move a note from the active collection to the end of the archive
    ///
    /// # Errors
    ///
    /// Will return `Err` when:
    /// - The note is not in the active collection
    /// - Storage cannot be read, parsed or written, in which case neither collection changed
    pub async fn archive(&self, id: &NoteId) -> Result<Note> {
        let note = self.move_note(id, Collection::Active, Collection::Archived).await?;

        tracing::debug!("Archived note {id}");

        Ok(note)
    }

    /// Move a note from the archive to the end of the active collection
    ///
    /// # Errors
    ///
    /// Will return `Err` when:
    /// - The note is not in the archive
    /// - Storage cannot be read, parsed or written, in which case neither collection changed
    pub async fn unarchive(&self, id: &NoteId) -> Result<Note> {
        let note = self.move_note(id, Collection::Archived, Collection::Active).await?;

        tracing::debug!("Unarchived note {id}");

        Ok(note)
    }

    /// Remove every active note, the archive is untouched
    ///
    /// # Errors
    ///
    /// Will return `Err` when storage cannot be written
    pub async fn clear_active(&self) -> Result<()> {
        let _queue = self.queue.lock().await;

        self.write(Collection::Active, &mut []).await?;

        tracing::debug!("Cleared all active notes");

        Ok(())
    }

    async fn move_note(&self, id: &NoteId, from: Collection, to: Collection) -> Result<Note> {
        let _queue = self.queue.lock().await;

        let mut source = self.read(from).await?;
        let mut target = self.read(to).await?;

        let index = position(&source, id).ok_or_else(|| Error::NotFound(id.clone()))?;

        let mut note = source.remove(index);
        note.archived = to.is_archived();

        target.retain(|existing| &existing.id != id);
        let target_index = target.len();
        target.push(note);

        self.conceal(&mut source);
        self.conceal(&mut target);

        let source_bytes = encode(&source)?;
        let target_bytes = encode(&target)?;

        self.storage
            .write_all(&[(from.key(), source_bytes), (to.key(), target_bytes)])
            .await?;

        Ok(target.swap_remove(target_index))
    }

    fn validate_content(&self, content: &str) -> Result<()> {
        if self.options.content_policy == ContentPolicy::Required && is_blank(content) {
            return Err(Error::Validation("Please enter some content"));
        }

        Ok(())
    }

    fn validate_patch(&self, patch: &NotePatch) -> Result<()> {
        if patch.title.as_deref().is_some_and(is_blank) {
            return Err(Error::Validation("Please enter a title"));
        }

        if let Some(content) = &patch.content {
            self.validate_content(content)?;
        }

        if let Some(LockPatch::Lock { password }) = &patch.lock {
            if password.is_empty() {
                return Err(Error::Validation("A locked note needs a password"));
            }
        }

        Ok(())
    }

    /// Read a full collection, a missing or empty value is an empty collection
    async fn read(&self, collection: Collection) -> Result<Vec<Note>> {
        let key = collection.key();

        let bytes = match self.storage.read(key).await {
            Ok(bytes) => bytes,
            Err(storage::Error::NotFound(_)) => return Ok(Vec::new()),
            Err(err) => return Err(err.into()),
        };

        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Vec::new());
        }

        let mut notes: Vec<Note> = serde_json::from_slice(&bytes)
            .map_err(|source| Error::StorageCorrupt { key, source })?;

        // the collection a note is stored in decides its flag
        for note in &mut notes {
            note.archived = collection.is_archived();
        }

        Ok(notes)
    }

    /// Write a full collection, locked notes are concealed first when configured
    async fn write(&self, collection: Collection, notes: &mut [Note]) -> Result<()> {
        self.conceal(notes);

        let bytes = encode(notes)?;

        self.storage.write(collection.key(), &bytes).await?;

        Ok(())
    }

    fn conceal(&self, notes: &mut [Note]) {
        if self.options.locked_content == LockedContentMode::Persist {
            return;
        }

        for note in notes.iter_mut().filter(|note| note.is_locked()) {
            note.content.clear();
            note.image_reference = None;
        }
    }
}

fn position(notes: &[Note], id: &NoteId) -> Option<usize> {
    notes.iter().position(|note| &note.id == id)
}

fn encode(notes: &[Note]) -> Result<Vec<u8>> {
    serde_json::to_vec_pretty(notes).map_err(Error::Encode)
}
