mod support;

use chrono::Duration;
use keeper_cloud::{ClientError, RecordService};
use keeper_types::{
    BlobRecord, CardSecret, LoginSecret, Record, RecordKind, TextSecret, now_millis,
};
use pretty_assertions::assert_eq;
use support::{client_config, Device, TestServer};
use tempfile::TempDir;
use wiremock::matchers::{method, path, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ── Accounts ──

#[tokio::test]
async fn register_then_duplicate_register() {
    let server = TestServer::start().await;
    let device = Device::new(&server.url);
    let session = device.service.register("alice", "secret123").await.unwrap();
    assert_eq!(session.owner(), "alice");
    assert!(session.vault().root().starts_with(device.dir.path()));

    let other = Device::new(&server.url);
    let err = other.service.register("alice", "secret123").await.unwrap_err();
    assert!(matches!(err, ClientError::UserExists));
}

#[tokio::test]
async fn wrong_password_is_rejected() {
    let server = TestServer::start().await;
    let device = Device::new(&server.url);
    device.service.register("alice", "secret123").await.unwrap();

    let err = device.service.login("alice", "secret124").await.unwrap_err();
    assert!(matches!(err, ClientError::InvalidCredentials));
}

#[tokio::test]
async fn logout_drops_remote_session() {
    let server = TestServer::start().await;
    let device = Device::new(&server.url);
    let session = device.service.register("alice", "secret123").await.unwrap();
    device.service.logout(session).await;

    assert!(!device.service.api().is_authenticated().await);
    let err = device
        .service
        .api()
        .download_all::<TextSecret>()
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::AuthRequired));
}

// ── Put ──

#[tokio::test]
async fn put_then_duplicate_put() {
    let server = TestServer::start().await;
    let device = Device::new(&server.url);
    let session = device.service.register("alice", "secret123").await.unwrap();

    let rec = LoginSecret::new("email", "a", "b");
    let stored = device
        .service
        .put_record(&session, rec.clone(), false)
        .await
        .unwrap();
    assert_eq!(stored.meta.id, 1);

    let err = device
        .service
        .put_record(&session, rec, false)
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::AlreadyExists(ref k) if k == "email"));
}

#[tokio::test]
async fn remote_rejected_put_is_undone_locally() {
    let server = TestServer::start().await;
    let laptop = Device::new(&server.url);
    let laptop_session = laptop.service.register("alice", "secret123").await.unwrap();
    let phone = Device::new(&server.url);
    let (phone_session, _) = phone.service.login("alice", "secret123").await.unwrap();

    laptop
        .service
        .put_record(&laptop_session, TextSecret::new("x", "from-laptop"), false)
        .await
        .unwrap();

    let err = phone
        .service
        .put_record(&phone_session, TextSecret::new("x", "from-phone"), false)
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::AlreadyExists(ref k) if k == "x"));
    assert!(phone.service.text_secrets(&phone_session).await.unwrap().is_empty());

    // The rejected version must not win on the next reconciliation.
    let report = phone.service.reconcile_all(&phone_session).await;
    let texts = report.kind(RecordKind::TextSecret).unwrap();
    assert_eq!(texts.pushed, 0);
    assert_eq!(texts.stats.adopted, 1);
    assert_eq!(
        phone.service.text_secrets(&phone_session).await.unwrap()[0].text,
        "from-laptop"
    );

    laptop.service.reconcile_all(&laptop_session).await;
    assert_eq!(
        laptop.service.text_secrets(&laptop_session).await.unwrap()[0].text,
        "from-laptop"
    );
}

#[tokio::test]
async fn put_with_overwrite_replaces_everywhere() {
    let server = TestServer::start().await;
    let device = Device::new(&server.url);
    let session = device.service.register("alice", "secret123").await.unwrap();

    device
        .service
        .put_record(&session, TextSecret::new("note", "v1"), false)
        .await
        .unwrap();
    device
        .service
        .put_record(&session, TextSecret::new("note", "v2"), true)
        .await
        .unwrap();

    let local = device.service.text_secrets(&session).await.unwrap();
    assert_eq!(local.len(), 1);
    assert_eq!(local[0].text, "v2");

    let remote = device.service.api().download_all::<TextSecret>().await.unwrap();
    assert_eq!(session.open(remote[0].clone()).unwrap().text, "v2");
}

#[tokio::test]
async fn secrets_are_ciphertext_at_rest_and_on_the_wire() {
    let server = TestServer::start().await;
    let device = Device::new(&server.url);
    let session = device.service.register("alice", "secret123").await.unwrap();

    let card = CardSecret::new("4111111111111111", "ALICE SMITH", "01/30", "987");
    device.service.put_record(&session, card, false).await.unwrap();

    let raw = std::fs::read_to_string(session.vault().root().join("credit_cards.json")).unwrap();
    assert!(raw.contains("4111111111111111"));
    assert!(!raw.contains("ALICE SMITH"));
    assert!(!raw.contains("\"987\""));

    let remote = device.service.api().download_all::<CardSecret>().await.unwrap();
    assert_ne!(remote[0].holder, "ALICE SMITH");
    assert_ne!(remote[0].cvv, "987");

    let shown = device.service.card_secrets(&session).await.unwrap();
    assert_eq!(shown[0].holder, "ALICE SMITH");
    assert_eq!(shown[0].cvv, "987");
}

#[tokio::test]
async fn tampered_local_record_is_decode_failure() {
    let server = TestServer::start().await;
    let device = Device::new(&server.url);
    let session = device.service.register("alice", "secret123").await.unwrap();
    device
        .service
        .put_record(&session, TextSecret::new("note", "hello"), false)
        .await
        .unwrap();

    let mut records = session.vault().load_collection::<TextSecret>().unwrap();
    records[0].text = "Zm9yZ2VkIGNpcGhlcnRleHQgdGhhdCBpcyBsb25nIGVub3VnaA==".into();
    session.vault().save_collection(&records).unwrap();

    let err = device.service.text_secrets(&session).await.unwrap_err();
    assert!(matches!(err, ClientError::Decode(_)));
}

// ── Reconciliation ──

#[tokio::test]
async fn login_on_second_device_pulls_records() {
    let server = TestServer::start().await;
    let laptop = Device::new(&server.url);
    let session = laptop.service.register("alice", "secret123").await.unwrap();
    laptop
        .service
        .put_record(&session, LoginSecret::new("github", "alice", "hunter2"), false)
        .await
        .unwrap();
    laptop
        .service
        .put_record(&session, TextSecret::new("note", "remember"), false)
        .await
        .unwrap();

    let phone = Device::new(&server.url);
    let (phone_session, report) = phone.service.login("alice", "secret123").await.unwrap();
    assert!(report.is_clean());
    assert_eq!(report.kinds.len(), 4);
    assert_eq!(report.kind(RecordKind::LoginSecret).unwrap().stats.adopted, 1);
    assert_eq!(report.kind(RecordKind::TextSecret).unwrap().stats.adopted, 1);

    let logins = phone.service.login_secrets(&phone_session).await.unwrap();
    assert_eq!(logins[0].secret_password, "hunter2");
    let texts = phone.service.text_secrets(&phone_session).await.unwrap();
    assert_eq!(texts[0].text, "remember");
}

#[tokio::test]
async fn newer_remote_replaces_local_on_reconcile() {
    let server = TestServer::start().await;
    let laptop = Device::new(&server.url);
    let laptop_session = laptop.service.register("alice", "secret123").await.unwrap();
    laptop
        .service
        .put_record(&laptop_session, TextSecret::new("x", "A"), false)
        .await
        .unwrap();

    let phone = Device::new(&server.url);
    let (phone_session, _) = phone.service.login("alice", "secret123").await.unwrap();
    tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    phone
        .service
        .put_record(&phone_session, TextSecret::new("x", "B"), true)
        .await
        .unwrap();

    let report = laptop.service.reconcile_all(&laptop_session).await;
    let texts = report.kind(RecordKind::TextSecret).unwrap();
    assert_eq!(texts.stats.replaced, 1);
    assert_eq!(texts.pushed, 0);

    let local = laptop.service.text_secrets(&laptop_session).await.unwrap();
    assert_eq!(local.len(), 1);
    assert_eq!(local[0].text, "B");
}

#[tokio::test]
async fn newer_local_is_pushed_on_reconcile() {
    let server = TestServer::start().await;
    let laptop = Device::new(&server.url);
    let session = laptop.service.register("alice", "secret123").await.unwrap();
    laptop
        .service
        .put_record(&session, TextSecret::new("x", "B"), false)
        .await
        .unwrap();

    // Edit made while offline: newer locally, never uploaded.
    let mut edited = TextSecret::new("x", "A");
    edited.meta.updated_at = now_millis() + Duration::seconds(10);
    edited.meta.overwrite = true;
    session
        .vault()
        .upsert_one(session.seal(edited).unwrap())
        .unwrap();

    let report = laptop.service.reconcile_all(&session).await;
    let texts = report.kind(RecordKind::TextSecret).unwrap();
    assert_eq!(texts.stats.pushed, 1);
    assert_eq!(texts.pushed, 1);

    let remote = laptop.service.api().download_all::<TextSecret>().await.unwrap();
    assert_eq!(session.open(remote[0].clone()).unwrap().text, "A");

    let again = laptop.service.reconcile_all(&session).await;
    assert_eq!(again.kind(RecordKind::TextSecret).unwrap().stats.pushed, 0);
}

#[tokio::test]
async fn local_only_records_reach_remote() {
    let server = TestServer::start().await;
    let laptop = Device::new(&server.url);
    let session = laptop.service.register("alice", "secret123").await.unwrap();

    let mut card = CardSecret::new("4111", "A", "01/30", "123");
    card.meta.updated_at = now_millis();
    session
        .vault()
        .upsert_one(session.seal(card).unwrap())
        .unwrap();

    let report = laptop.service.reconcile_all(&session).await;
    assert_eq!(report.kind(RecordKind::CardSecret).unwrap().pushed, 1);

    let remote = laptop.service.api().download_all::<CardSecret>().await.unwrap();
    assert_eq!(remote[0].unique_key(), "4111");
}

// ── Blobs ──

#[tokio::test]
async fn blob_upload_and_fetch() {
    let server = TestServer::start().await;
    let device = Device::new(&server.url);
    let session = device.service.register("alice", "secret123").await.unwrap();

    let bytes: Vec<u8> = (0..=255u8).cycle().take(4096).collect();
    let stored = device
        .service
        .put_blob(&session, "firmware.bin", &bytes, false)
        .await
        .unwrap();
    assert_eq!(stored.content, None);

    let listed = device.service.blob_list(&session).await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].content, None);

    let fetched = device.service.fetch_blob(&session, "firmware.bin").await.unwrap();
    assert_eq!(fetched, bytes);

    let err = device.service.fetch_blob(&session, "missing").await.unwrap_err();
    assert!(matches!(err, ClientError::Empty));
}

#[tokio::test]
async fn blob_metadata_syncs_but_content_is_not_pushed() {
    let server = TestServer::start().await;
    let laptop = Device::new(&server.url);
    let session = laptop.service.register("alice", "secret123").await.unwrap();
    laptop
        .service
        .put_blob(&session, "photo.jpg", b"jpeg bytes", false)
        .await
        .unwrap();

    let mut local_only = BlobRecord::new("draft.txt", None);
    local_only.meta.updated_at = now_millis();
    session.vault().upsert_one(local_only).unwrap();

    let report = laptop.service.reconcile_all(&session).await;
    let blobs = report.kind(RecordKind::Blob).unwrap();
    assert_eq!(blobs.deferred, 1);
    assert_eq!(blobs.pushed, 0);

    let remote = laptop.service.api().download_all::<BlobRecord>().await.unwrap();
    assert_eq!(remote.len(), 1);

    let phone = Device::new(&server.url);
    let (phone_session, _) = phone.service.login("alice", "secret123").await.unwrap();
    let listed = phone.service.blob_list(&phone_session).await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].description, "photo.jpg");
    assert_eq!(
        phone.service.fetch_blob(&phone_session, "photo.jpg").await.unwrap(),
        b"jpeg bytes"
    );
}

// ── Offline ──

#[tokio::test]
async fn offline_reconcile_keeps_local_data() {
    let server = TestServer::start().await;
    let device = Device::new(&server.url);
    let session = device.service.register("alice", "secret123").await.unwrap();
    device
        .service
        .put_record(&session, TextSecret::new("note", "kept"), false)
        .await
        .unwrap();

    server.stop().await;

    let report = device.service.reconcile_all(&session).await;
    assert!(report.offline);
    assert!(report.kinds.iter().all(|k| k.error.is_some()));

    let local = device.service.text_secrets(&session).await.unwrap();
    assert_eq!(local[0].text, "kept");

    let err = device
        .service
        .put_record(&session, TextSecret::new("later", "queued"), false)
        .await
        .unwrap_err();
    assert!(err.is_offline(), "expected offline error, got {err:?}");
    assert_eq!(device.service.text_secrets(&session).await.unwrap().len(), 2);
}

#[tokio::test]
async fn offline_blob_upload_records_nothing() {
    let server = TestServer::start().await;
    let device = Device::new(&server.url);
    let session = device.service.register("alice", "secret123").await.unwrap();
    server.stop().await;

    let err = device
        .service
        .put_blob(&session, "photo", b"bytes", false)
        .await
        .unwrap_err();
    assert!(err.is_offline(), "expected offline error, got {err:?}");
    assert!(device.service.blob_list(&session).await.unwrap().is_empty());
}

#[tokio::test]
async fn login_succeeds_when_reconcile_cannot_reach_remote() {
    let remote = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/user/login"))
        .respond_with(
            ResponseTemplate::new(200).insert_header("set-cookie", "session.id=tok; Path=/"),
        )
        .mount(&remote)
        .await;
    Mock::given(method("GET"))
        .and(path_regex("^/api/user/download/"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!([]))
                .set_delay(std::time::Duration::from_secs(3)),
        )
        .mount(&remote)
        .await;

    let dir = TempDir::new().unwrap();
    let mut config = client_config(&remote.uri(), dir.path());
    config.request_timeout_secs = 1;
    let service = RecordService::new(config).unwrap();

    let (session, report) = service.login("alice", "secret123").await.unwrap();
    assert!(report.offline);
    assert_eq!(report.kinds.len(), 4);
    assert!(report.kinds.iter().all(|k| k.error.is_some()));
    assert_eq!(session.owner(), "alice");
    assert!(service.text_secrets(&session).await.unwrap().is_empty());
}
