use crate::LockGate;
use crate::LockPatch;
use crate::LockState;
use crate::Note;
use crate::NoteDraft;
use crate::NotePatch;
use crate::Session;
use crate::UnlockIntent;
use crate::lock_gate::Error;
use crate::lock_gate::REDACTED;
use crate::password;
use crate::tests::helper;

fn unlocked_note() -> Note {
    Note::from_draft(NoteDraft::new("Diary", "dear diary"))
}

fn locked_note(gate: &LockGate, session: &mut Session, password: &str) -> Note {
    let mut note = unlocked_note();

    let patch = gate.set_lock(session, &note, password, password).unwrap();
    note.apply(patch);

    note
}

#[test]
fn test_set_lock_validation() {
    let gate = LockGate::new();
    let mut session = Session::new();
    let note = unlocked_note();

    let err = gate.set_lock(&mut session, &note, "abc12", "abc12").unwrap_err();
    assert!(matches!(err, Error::Validation(_)));
    assert_eq!("Password must be at least 6 characters", err.to_string());

    let err = gate.set_lock(&mut session, &note, "abcdef", "abcdeg").unwrap_err();
    assert!(matches!(err, Error::Validation(_)));
    assert_eq!("Passwords do not match", err.to_string());

    let err = gate.set_lock(&mut session, &note, "abcdef", "").unwrap_err();
    assert!(matches!(err, Error::Validation(_)));
    assert_eq!("Please enter the password twice", err.to_string());

    let err = gate.set_lock(&mut session, &note, "", "").unwrap_err();
    assert!(matches!(err, Error::Validation(_)));

    // six characters, not six bytes
    gate.set_lock(&mut session, &note, "ghichú", "ghichú").unwrap();
}

#[test]
fn test_set_lock_patch_holds_hash() {
    let gate = LockGate::new();
    let mut session = Session::new();
    let note = unlocked_note();

    let patch = gate.set_lock(&mut session, &note, "abcdef", "abcdef").unwrap();

    let Some(LockPatch::Lock { password: stored }) = patch.lock.clone() else {
        panic!("expected a lock patch");
    };
    assert_ne!("abcdef", stored);
    assert!(password::is_hash(&stored));
    assert!(password::verify(&stored, "abcdef"));

    assert_eq!(None, patch.title);
    assert_eq!(None, patch.content);
}

#[test]
fn test_lock_then_challenge() {
    let gate = LockGate::new();
    let mut session = Session::new();

    let note = unlocked_note();
    assert_eq!(LockState::Unlocked, gate.state(&session, &note));

    let note = locked_note(&gate, &mut session, "abcdef");
    assert!(note.is_locked());
    assert_eq!(LockState::Sealed, gate.state(&session, &note));
    assert!(gate.requires_challenge(&session, &note));
    assert_eq!(None, gate.visible_content(&session, &note));
    assert_eq!(REDACTED, gate.display_content(&session, &note));

    let err = gate
        .unlock_for_session(&mut session, &note, "wrong1")
        .unwrap_err();
    assert!(matches!(err, Error::WrongPassword));
    assert_eq!("Wrong password, try again", err.to_string());
    assert_eq!(LockState::Sealed, gate.state(&session, &note));
    assert!(session.is_empty());

    // retries are unlimited
    gate.unlock_for_session(&mut session, &note, "wrong2")
        .unwrap_err();
    gate.unlock_for_session(&mut session, &note, "abcdef")
        .unwrap();

    assert_eq!(LockState::Open, gate.state(&session, &note));
    assert!(!gate.requires_challenge(&session, &note));
    assert_eq!(Some("dear diary"), gate.visible_content(&session, &note));
    assert_eq!("dear diary", gate.display_content(&session, &note));

    // the stored lock is untouched
    assert!(note.is_locked());
}

#[test]
fn test_challenge_is_case_sensitive_and_exact() {
    let gate = LockGate::new();
    let mut session = Session::new();
    let note = locked_note(&gate, &mut session, "abcdef");

    for attempt in ["ABCDEF", " abcdef", "abcdef ", "abcde", ""] {
        let err = gate
            .challenge(&mut session, &note, attempt, UnlockIntent::Session)
            .unwrap_err();
        assert!(matches!(err, Error::WrongPassword), "{attempt:?} was accepted");
    }
}

#[test]
fn test_session_restart_seals_again() {
    let gate = LockGate::new();
    let mut session = Session::new();
    let note = locked_note(&gate, &mut session, "abcdef");

    gate.unlock_for_session(&mut session, &note, "abcdef")
        .unwrap();
    assert_eq!(LockState::Open, gate.state(&session, &note));
    assert_eq!(1, session.len());

    // within the session no second challenge is needed
    assert!(!gate.requires_challenge(&session, &note));

    let session = Session::new();
    assert_eq!(LockState::Sealed, gate.state(&session, &note));

    let mut session = session;
    gate.unlock_for_session(&mut session, &note, "abcdef")
        .unwrap();
    session.clear();
    assert_eq!(LockState::Sealed, gate.state(&session, &note));
}

#[test]
fn test_remove_lock() {
    let gate = LockGate::new();
    let mut session = Session::new();
    let mut note = locked_note(&gate, &mut session, "abcdef");

    let err = gate.remove_lock(&mut session, &note, "nope!!").unwrap_err();
    assert!(matches!(err, Error::WrongPassword));
    assert!(note.is_locked());

    let patch = gate.remove_lock(&mut session, &note, "abcdef").unwrap();
    assert_eq!(NotePatch::default().lock(LockPatch::Clear), patch);

    note.apply(patch);
    assert!(!note.is_locked());
    assert_eq!(None, note.password);
    assert_eq!(LockState::Unlocked, gate.state(&session, &note));
}

#[test]
fn test_session_intent_returns_empty_patch() {
    let gate = LockGate::new();
    let mut session = Session::new();
    let note = locked_note(&gate, &mut session, "abcdef");

    let patch = gate
        .challenge(&mut session, &note, "abcdef", UnlockIntent::Session)
        .unwrap();
    assert!(patch.is_empty());
}

#[test]
fn test_not_locked_and_already_locked() {
    let gate = LockGate::new();
    let mut session = Session::new();

    let note = unlocked_note();
    let err = gate
        .unlock_for_session(&mut session, &note, "abcdef")
        .unwrap_err();
    assert!(matches!(err, Error::NotLocked));

    let err = gate.remove_lock(&mut session, &note, "abcdef").unwrap_err();
    assert!(matches!(err, Error::NotLocked));

    let note = locked_note(&gate, &mut session, "abcdef");
    let err = gate
        .set_lock(&mut session, &note, "123456", "123456")
        .unwrap_err();
    assert!(matches!(err, Error::AlreadyLocked));
}

#[test]
fn test_relocking_seals_an_open_note() {
    let gate = LockGate::new();
    let mut session = Session::new();
    let mut note = locked_note(&gate, &mut session, "abcdef");

    let patch = gate.remove_lock(&mut session, &note, "abcdef").unwrap();
    note.apply(patch);
    assert!(session.is_unlocked(&note.id));

    let patch = gate
        .set_lock(&mut session, &note, "fedcba", "fedcba")
        .unwrap();
    note.apply(patch);

    assert!(!session.is_unlocked(&note.id));
    assert_eq!(LockState::Sealed, gate.state(&session, &note));
    gate.unlock_for_session(&mut session, &note, "abcdef")
        .unwrap_err();
    gate.unlock_for_session(&mut session, &note, "fedcba")
        .unwrap();
}

#[test]
fn test_legacy_plaintext_password() {
    let gate = LockGate::new();
    let mut session = Session::new();

    let mut note = unlocked_note();
    note.locked = Some(true);
    note.password = Some("123456".to_string());

    assert_eq!(LockState::Sealed, gate.state(&session, &note));

    gate.unlock_for_session(&mut session, &note, "12345")
        .unwrap_err();
    gate.unlock_for_session(&mut session, &note, "123456")
        .unwrap();
    assert_eq!(LockState::Open, gate.state(&session, &note));
}

#[test]
fn test_legacy_plaintext_password_with_dollar_sign() {
    let gate = LockGate::new();
    let mut session = Session::new();

    let mut note = unlocked_note();
    note.locked = Some(true);
    note.password = Some("$ecret1".to_string());

    gate.unlock_for_session(&mut session, &note, "secret1")
        .unwrap_err();
    gate.unlock_for_session(&mut session, &note, "$ecret1")
        .unwrap();
    assert_eq!(LockState::Open, gate.state(&session, &note));
}

#[test]
fn test_locked_without_password_is_unlocked() {
    let gate = LockGate::new();
    let session = Session::new();

    let mut note = unlocked_note();
    note.locked = Some(true);

    assert_eq!(LockState::Unlocked, gate.state(&session, &note));

    // a residual password on an unlocked note does not gate anything
    let mut note = unlocked_note();
    note.locked = Some(false);
    note.password = Some("abcdef".to_string());

    assert_eq!(LockState::Unlocked, gate.state(&session, &note));
}

#[tokio::test]
async fn test_lock_persisted_through_store() {
    let gate = LockGate::new();
    let mut session = Session::new();
    let (store, _) = helper::setup_store();

    let note = helper::insert(&store, "Diary", "dear diary").await;

    let patch = gate
        .set_lock(&mut session, &note, "abcdef", "abcdef")
        .unwrap();
    store.update(&note.id, patch).await.unwrap();

    let stored = store.find(&note.id).await.unwrap().unwrap();
    assert_eq!(LockState::Sealed, gate.state(&session, &stored));

    gate.unlock_for_session(&mut session, &stored, "abcdef")
        .unwrap();

    // opening for the session leaves the stored lock as is
    let stored = store.find(&note.id).await.unwrap().unwrap();
    assert!(stored.is_locked());
    assert_eq!(LockState::Open, gate.state(&session, &stored));

    let patch = gate.remove_lock(&mut session, &stored, "abcdef").unwrap();
    store.update(&note.id, patch).await.unwrap();

    let stored = store.find(&note.id).await.unwrap().unwrap();
    assert!(!stored.is_locked());
    assert_eq!(None, stored.password);
}
