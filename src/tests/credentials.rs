use crate::CredentialStore;
use crate::credentials::Error;
use crate::password;
use crate::storage::CREDENTIAL_KEY;
use crate::storage::Memory;
use crate::storage::Storage;

#[tokio::test]
async fn test_register_then_login() {
    let credentials = CredentialStore::new(Memory::new());

    assert_eq!(None, credentials.find().await.unwrap());

    let credential = credentials
        .register("binh", "verysecret", "verysecret")
        .await
        .unwrap();
    assert_eq!("binh", credential.username);
    assert!(password::is_hash(&credential.password));

    let logged_in = credentials.login("binh", "verysecret").await.unwrap();
    assert_eq!(credential, logged_in);

    let err = credentials.login("binh", "Verysecret").await.unwrap_err();
    assert!(matches!(err, Error::InvalidCredentials));

    let err = credentials.login("someone", "verysecret").await.unwrap_err();
    assert!(matches!(err, Error::InvalidCredentials));
}

#[tokio::test]
async fn test_register_validation() {
    let credentials = CredentialStore::new(Memory::new());

    let err = credentials.register(" ", "verysecret", "verysecret").await.unwrap_err();
    assert!(matches!(err, Error::Validation(_)));

    let err = credentials.register("binh", "12345", "12345").await.unwrap_err();
    assert_eq!("Password must be at least 6 characters", err.to_string());

    let err = credentials.register("binh", "123456", "654321").await.unwrap_err();
    assert_eq!("Passwords do not match", err.to_string());

    assert_eq!(None, credentials.find().await.unwrap());
}

#[tokio::test]
async fn test_register_only_once() {
    let credentials = CredentialStore::new(Memory::new());

    credentials.register("binh", "123456", "123456").await.unwrap();

    let err = credentials
        .register("other", "abcdef", "abcdef")
        .await
        .unwrap_err();
    assert!(matches!(err, Error::AlreadyRegistered));

    credentials.login("binh", "123456").await.unwrap();
}

#[tokio::test]
async fn test_login_without_account() {
    let credentials = CredentialStore::new(Memory::new());

    let err = credentials.login("binh", "123456").await.unwrap_err();
    assert!(matches!(err, Error::InvalidCredentials));
    assert_eq!("Invalid username or password", err.to_string());
}

#[tokio::test]
async fn test_legacy_plaintext_record() {
    let storage = Memory::new();
    storage
        .write(CREDENTIAL_KEY, br#"{ "username": "binh", "password": "123456" }"#)
        .await
        .unwrap();

    let credentials = CredentialStore::new(storage);

    credentials.login("binh", "123456").await.unwrap();
    credentials.login("binh", "1234567").await.unwrap_err();
}

#[tokio::test]
async fn test_legacy_plaintext_record_with_dollar_sign() {
    let storage = Memory::new();
    storage
        .write(CREDENTIAL_KEY, br#"{ "username": "binh", "password": "$argon2id" }"#)
        .await
        .unwrap();

    let credentials = CredentialStore::new(storage);

    credentials.login("binh", "$argon2id").await.unwrap();
    let err = credentials.login("binh", "argon2id").await.unwrap_err();
    assert!(matches!(err, Error::InvalidCredentials));
}

#[tokio::test]
async fn test_ensure_initial_user() {
    let credentials = CredentialStore::new(Memory::new());

    credentials
        .ensure_initial_user(Some("admin"), Some("verysecret"))
        .await
        .unwrap();
    credentials.login("admin", "verysecret").await.unwrap();

    // an existing record is left alone
    credentials
        .ensure_initial_user(Some("other"), Some("othersecret"))
        .await
        .unwrap();
    credentials.login("admin", "verysecret").await.unwrap();

    let credentials = CredentialStore::new(Memory::new());
    credentials.ensure_initial_user(None, None).await.unwrap();

    let credential = credentials.find().await.unwrap().unwrap();
    assert!(!credential.username.is_empty());
}

#[tokio::test]
async fn test_corrupt_record() {
    let storage = Memory::new();
    storage.write(CREDENTIAL_KEY, b"garbage").await.unwrap();

    let credentials = CredentialStore::new(storage);

    let err = credentials.find().await.unwrap_err();
    assert!(matches!(err, Error::StorageCorrupt(_)));
}
