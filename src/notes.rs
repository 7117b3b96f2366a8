//! The note entity and the values used to create and change it

use std::fmt;

use chrono::DateTime;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;
use uuid::Uuid;

/// Opaque identifier of a note
///
/// New notes get a UUID v4, but any string is accepted when loading so collections written by
/// older app revisions (which used timestamps) keep working.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NoteId(String);

impl NoteId {
    /// Generate a fresh, never used, ID
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NoteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NoteId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for NoteId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// A user-authored note
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    /// Note ID, stable for the lifetime of the note
    pub id: NoteId,

    /// Display title, never empty
    pub title: String,

    /// Body of the note
    #[serde(default)]
    pub content: String,

    /// Creation date, never modified
    pub created_at: DateTime<Utc>,

    /// Last updated at
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,

    /// Reference to a bundled image asset
    #[serde(
        default,
        rename = "image",
        alias = "imageUri",
        skip_serializing_if = "Option::is_none"
    )]
    pub image_reference: Option<String>,

    /// Lives in the archive collection
    #[serde(default)]
    pub archived: bool,

    /// Password protected
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locked: Option<bool>,

    /// Password hash (or legacy plaintext) of a locked note
    ///
    /// Only meaningful while `locked` is `Some(true)`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

impl Note {
    /// Create a new, active and unlocked, note from a draft
    pub fn from_draft(draft: NoteDraft) -> Self {
        Self {
            id: NoteId::generate(),
            title: draft.title,
            content: draft.content,
            created_at: Utc::now(),
            updated_at: None,
            image_reference: draft.image_reference,
            archived: false,
            locked: None,
            password: None,
        }
    }

    /// Is the note password protected?
    pub fn is_locked(&self) -> bool {
        self.locked == Some(true)
    }

    /// The stored password of a locked note
    ///
    /// A residual password on an unlocked note is ignored
    pub fn lock_password(&self) -> Option<&str> {
        if self.is_locked() {
            self.password.as_deref().filter(|password| !password.is_empty())
        } else {
            None
        }
    }

    /// Apply all fields of a patch and stamp `updated_at`
    ///
    /// Validation is the job of the caller
    pub fn apply(&mut self, patch: NotePatch) {
        if let Some(title) = patch.title {
            self.title = title;
        }

        if let Some(content) = patch.content {
            self.content = content;
        }

        match patch.image {
            Some(ImagePatch::Attach(reference)) => self.image_reference = Some(reference),
            Some(ImagePatch::Remove) => self.image_reference = None,
            None => {}
        }

        match patch.lock {
            Some(LockPatch::Lock { password }) => {
                self.locked = Some(true);
                self.password = Some(password);
            }
            Some(LockPatch::Clear) => {
                self.locked = Some(false);
                self.password = None;
            }
            None => {}
        }

        self.updated_at = Some(Utc::now());
    }
}

/// Values to create a note
#[derive(Clone, Debug, Default)]
pub struct NoteDraft {
    /// Title of the note
    pub title: String,

    /// Content of the note
    pub content: String,

    /// Optional image reference
    pub image_reference: Option<String>,
}

impl NoteDraft {
    pub fn new<T, C>(title: T, content: C) -> Self
    where
        T: Into<String>,
        C: Into<String>,
    {
        Self {
            title: title.into(),
            content: content.into(),
            image_reference: None,
        }
    }

    #[must_use]
    pub fn with_image<R: Into<String>>(mut self, reference: R) -> Self {
        self.image_reference = Some(reference.into());
        self
    }
}

/// Change of the image reference
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ImagePatch {
    Attach(String),
    Remove,
}

/// Change of the lock fields
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LockPatch {
    /// Lock the note with the given stored password (normally a hash)
    Lock { password: String },

    /// Remove the lock and the stored password
    Clear,
}

/// Values to update a note, `None` fields are left untouched
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NotePatch {
    /// New title
    pub title: Option<String>,

    /// New content
    pub content: Option<String>,

    /// Attach or remove an image
    pub image: Option<ImagePatch>,

    /// Lock or unlock
    pub lock: Option<LockPatch>,
}

impl NotePatch {
    #[must_use]
    pub fn title<T: Into<String>>(mut self, title: T) -> Self {
        self.title = Some(title.into());
        self
    }

    #[must_use]
    pub fn content<C: Into<String>>(mut self, content: C) -> Self {
        self.content = Some(content.into());
        self
    }

    #[must_use]
    pub fn attach_image<R: Into<String>>(mut self, reference: R) -> Self {
        self.image = Some(ImagePatch::Attach(reference.into()));
        self
    }

    #[must_use]
    pub fn remove_image(mut self) -> Self {
        self.image = Some(ImagePatch::Remove);
        self
    }

    #[must_use]
    pub fn lock(mut self, lock: LockPatch) -> Self {
        self.lock = Some(lock);
        self
    }

    /// Does the patch change anything at all?
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.content.is_none()
            && self.image.is_none()
            && self.lock.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_legacy_note_deserializes() {
        let json = r#"{
            "id": "1712345678901",
            "title": "Groceries",
            "content": "milk",
            "imageUri": "cat.png",
            "createdAt": "2024-04-05T10:00:00.000Z"
        }"#;

        let note: Note = serde_json::from_str(json).unwrap();

        assert_eq!("1712345678901", note.id.as_str());
        assert_eq!(Some("cat.png".to_string()), note.image_reference);
        assert!(!note.archived);
        assert!(!note.is_locked());
        assert_eq!(None, note.updated_at);
    }

    #[test]
    fn test_optional_fields_are_omitted() {
        let note = Note::from_draft(NoteDraft::new("Title", "Content"));

        let value = serde_json::to_value(&note).unwrap();
        let object = value.as_object().unwrap();

        assert!(object.contains_key("createdAt"));
        assert!(object.contains_key("archived"));
        assert!(!object.contains_key("updatedAt"));
        assert!(!object.contains_key("image"));
        assert!(!object.contains_key("locked"));
        assert!(!object.contains_key("password"));
    }

    #[test]
    fn test_residual_password_is_ignored_when_unlocked() {
        let mut note = Note::from_draft(NoteDraft::new("Title", "Content"));
        note.locked = Some(false);
        note.password = Some("leftover".to_string());

        assert_eq!(None, note.lock_password());

        note.locked = Some(true);
        assert_eq!(Some("leftover"), note.lock_password());
    }

    #[test]
    fn test_apply_patch() {
        let mut note = Note::from_draft(NoteDraft::new("Title", "Content").with_image("a.png"));
        let created_at = note.created_at;

        note.apply(
            NotePatch::default()
                .title("New title")
                .remove_image()
                .lock(LockPatch::Lock {
                    password: "hash".to_string(),
                }),
        );

        assert_eq!("New title", note.title);
        assert_eq!("Content", note.content);
        assert_eq!(None, note.image_reference);
        assert!(note.is_locked());
        assert_eq!(created_at, note.created_at);
        assert!(note.updated_at.is_some());

        note.apply(NotePatch::default().lock(LockPatch::Clear));
        assert!(!note.is_locked());
        assert_eq!(None, note.password);
    }
}
