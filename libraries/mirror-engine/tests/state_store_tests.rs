//! SQLite state store: schema bootstrap, roundtrips, upsert semantics.

use mirror_engine::{SqliteStateStore, StateStore};
use pretty_assertions::assert_eq;
use tempfile::TempDir;

async fn store_in(dir: &TempDir) -> SqliteStateStore {
    let url = format!("sqlite://{}/state.db?mode=rwc", dir.path().display());
    SqliteStateStore::connect(&url).await.expect("connect")
}

#[tokio::test]
async fn record_roundtrip() {
    let dir = tempfile::tempdir().unwrap();
    let store = store_in(&dir).await;

    assert!(store.get_record("prod").await.unwrap().is_none());

    store.put_record("prod", "a:T1|b:T2").await.unwrap();
    let record = store.get_record("prod").await.unwrap().expect("record");
    assert_eq!(record.fingerprint, "a:T1|b:T2");
}

#[tokio::test]
async fn put_record_overwrites_the_previous_fingerprint() {
    let dir = tempfile::tempdir().unwrap();
    let store = store_in(&dir).await;

    store.put_record("prod", "a:T1").await.unwrap();
    store.put_record("prod", "a:T2").await.unwrap();

    let record = store.get_record("prod").await.unwrap().expect("record");
    assert_eq!(record.fingerprint, "a:T2");
}

#[tokio::test]
async fn targets_are_isolated() {
    let dir = tempfile::tempdir().unwrap();
    let store = store_in(&dir).await;

    store.put_record("prod", "a:T1").await.unwrap();
    store.put_record("staging", "b:T2").await.unwrap();

    assert_eq!(
        store
            .get_record("prod")
            .await
            .unwrap()
            .unwrap()
            .fingerprint,
        "a:T1"
    );
    assert_eq!(
        store
            .get_record("staging")
            .await
            .unwrap()
            .unwrap()
            .fingerprint,
        "b:T2"
    );
}

#[tokio::test]
async fn target_config_roundtrip_and_upsert() {
    let dir = tempfile::tempdir().unwrap();
    let store = store_in(&dir).await;

    assert!(store.get_target_config("prod").await.unwrap().is_none());

    store
        .put_target_config("prod", "https://drive.google.com/drive/folders/abc123")
        .await
        .unwrap();
    let config = store
        .get_target_config("prod")
        .await
        .unwrap()
        .expect("config");
    assert_eq!(
        config.remote_folder,
        "https://drive.google.com/drive/folders/abc123"
    );

    store
        .put_target_config("prod", "https://drive.google.com/drive/folders/def456")
        .await
        .unwrap();
    let config = store
        .get_target_config("prod")
        .await
        .unwrap()
        .expect("config");
    assert_eq!(
        config.remote_folder,
        "https://drive.google.com/drive/folders/def456"
    );
}

#[tokio::test]
async fn state_survives_a_reconnect() {
    let dir = tempfile::tempdir().unwrap();

    {
        let store = store_in(&dir).await;
        store.put_record("prod", "a:T1").await.unwrap();
    }

    let store = store_in(&dir).await;
    let record = store.get_record("prod").await.unwrap().expect("record");
    assert_eq!(record.fingerprint, "a:T1");
}
