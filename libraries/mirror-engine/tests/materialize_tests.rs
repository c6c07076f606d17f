//! Fetch pipeline: mirroring a remote tree onto the local filesystem.

mod common;

use common::{doc, file, folder, FakeRemote};
use mirror_engine::{materialize, SyncError, TransferLimiter};
use mirror_remote::RemoteStore;
use pretty_assertions::assert_eq;
use std::sync::Arc;

async fn mirror_to(
    remote: Arc<FakeRemote>,
    dest: &std::path::Path,
) -> Result<(), SyncError> {
    let remote: Arc<dyn RemoteStore> = remote;
    materialize(remote, TransferLimiter::new(4), "root", dest).await
}

#[tokio::test]
async fn mirrors_files_folders_and_exports() {
    let remote = Arc::new(
        FakeRemote::new()
            .with_folder(
                "root",
                vec![
                    file("a", "a.txt", 5, "T1"),
                    folder("sub", "assets"),
                    doc("n", "notes", "T2"),
                ],
            )
            .with_folder("sub", vec![file("img", "logo.png", 4, "T3")])
            .with_content("a", b"hello")
            .with_content("n", b"<p>exported document body</p>")
            .with_content("img", &[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]),
    );

    let dest = tempfile::tempdir().unwrap();
    mirror_to(remote.clone(), dest.path()).await.expect("mirror");

    // Ordinary file, remote name verbatim.
    assert_eq!(std::fs::read(dest.path().join("a.txt")).unwrap(), b"hello");
    // Exported virtual document: remote name plus the rule's extension.
    assert_eq!(
        std::fs::read(dest.path().join("notes.html")).unwrap(),
        b"<p>exported document body</p>"
    );
    // Sub-folder named after the remote folder, binary content untouched.
    assert_eq!(
        std::fs::read(dest.path().join("assets/logo.png")).unwrap(),
        [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]
    );

    assert_eq!(remote.download_calls.load(std::sync::atomic::Ordering::SeqCst), 2);
    assert_eq!(remote.export_calls.load(std::sync::atomic::Ordering::SeqCst), 1);
}

#[tokio::test]
async fn creates_destination_directory_before_writing() {
    let remote = Arc::new(
        FakeRemote::new()
            .with_folder("root", vec![file("a", "a.txt", 1, "T1")])
            .with_content("a", b"x"),
    );

    let dest = tempfile::tempdir().unwrap();
    let nested = dest.path().join("does/not/exist/yet");
    mirror_to(remote, &nested).await.expect("mirror");

    assert_eq!(std::fs::read(nested.join("a.txt")).unwrap(), b"x");
}

#[tokio::test]
async fn legacy_encoded_html_is_normalized_on_the_way_to_disk() {
    let source = format!(
        "<html><head><meta charset=\"Shift_JIS\"></head><body>{}</body></html>",
        "古いページの本文です。文字コードは昔のままでした。".repeat(20)
    );
    let (sjis, _, _) = encoding_rs::SHIFT_JIS.encode(&source);

    let remote = Arc::new(
        FakeRemote::new()
            .with_folder("root", vec![file("page", "legacy.html", sjis.len() as u64, "T1")])
            .with_content("page", &sjis),
    );

    let dest = tempfile::tempdir().unwrap();
    mirror_to(remote, dest.path()).await.expect("mirror");

    let written = std::fs::read(dest.path().join("legacy.html")).unwrap();
    let text = String::from_utf8(written).expect("canonical UTF-8 on disk");
    assert!(text.contains("charset=\"utf-8\""));
    assert!(text.contains("古いページの本文です。"));
}

#[tokio::test]
async fn undecodable_text_asset_is_written_raw_and_does_not_abort() {
    // Detected as Shift_JIS with high confidence, but the trailing lone lead
    // byte makes the decode fail. Normalization must degrade to the raw
    // bytes instead of failing the run.
    let source = format!(
        "<html><body>{}</body></html>",
        "壊れかけた古いページの本文です。".repeat(20)
    );
    let (sjis, _, _) = encoding_rs::SHIFT_JIS.encode(&source);
    let mut raw = sjis.into_owned();
    raw.push(0x85);

    let remote = Arc::new(
        FakeRemote::new()
            .with_folder(
                "root",
                vec![
                    file("bad", "broken.html", raw.len() as u64, "T1"),
                    file("ok", "ok.txt", 4, "T2"),
                ],
            )
            .with_content("bad", &raw)
            .with_content("ok", b"fine"),
    );

    let dest = tempfile::tempdir().unwrap();
    mirror_to(remote, dest.path()).await.expect("mirror");

    // The broken file arrives byte-for-byte; the rest of the tree is intact.
    assert_eq!(std::fs::read(dest.path().join("broken.html")).unwrap(), raw);
    assert_eq!(std::fs::read(dest.path().join("ok.txt")).unwrap(), b"fine");
}

#[tokio::test]
async fn utf8_text_assets_are_written_byte_for_byte() {
    let body = format!("/* utf-8 stylesheet {} */", "日本語コメント".repeat(30));
    let remote = Arc::new(
        FakeRemote::new()
            .with_folder("root", vec![file("css", "site.css", body.len() as u64, "T1")])
            .with_content("css", body.as_bytes()),
    );

    let dest = tempfile::tempdir().unwrap();
    mirror_to(remote, dest.path()).await.expect("mirror");

    assert_eq!(
        std::fs::read(dest.path().join("site.css")).unwrap(),
        body.as_bytes()
    );
}

#[tokio::test]
async fn a_single_failed_transfer_aborts_the_call() {
    let remote = Arc::new(
        FakeRemote::new()
            .with_folder(
                "root",
                vec![file("ok", "ok.txt", 1, "T1"), file("missing", "gone.txt", 1, "T2")],
            )
            .with_content("ok", b"fine"),
    );

    let dest = tempfile::tempdir().unwrap();
    let err = mirror_to(remote, dest.path()).await.unwrap_err();

    match err {
        SyncError::Fetch(remote_err) => {
            assert!(remote_err.to_string().contains("missing"));
        }
        other => panic!("expected fetch error, got {other}"),
    }
}

#[tokio::test]
async fn unreachable_subfolder_aborts_the_call() {
    let remote = Arc::new(
        FakeRemote::new()
            .with_folder("root", vec![folder("locked", "locked")])
            .with_folder("locked", vec![])
            .deny("locked"),
    );

    let dest = tempfile::tempdir().unwrap();
    let err = mirror_to(remote, dest.path()).await.unwrap_err();
    assert!(matches!(err, SyncError::Access { .. }));
}
