use keeper_cloud::{ClientConfig, ClientError, KeeperApiClient};
use keeper_types::{BlobRecord, LoginSecret, TextSecret};
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn setup(server: &MockServer) -> KeeperApiClient {
    KeeperApiClient::new(&ClientConfig::new(server.uri(), "/tmp/unused")).unwrap()
}

fn session_response() -> ResponseTemplate {
    ResponseTemplate::new(200).insert_header(
        "set-cookie",
        "session.id=tok123; Path=/; HttpOnly; SameSite=Strict",
    )
}

fn conflict(status: &str) -> ResponseTemplate {
    ResponseTemplate::new(409).set_body_json(serde_json::json!({
        "status": status,
        "code": 409,
        "message": "conflict"
    }))
}

async fn logged_in(server: &MockServer) -> KeeperApiClient {
    Mock::given(method("POST"))
        .and(path("/api/user/login"))
        .respond_with(session_response())
        .mount(server)
        .await;
    let client = setup(server);
    client.login("alice", "secret123").await.unwrap();
    client
}

// --- Auth ---

#[tokio::test]
async fn not_authenticated_initially() {
    let server = MockServer::start().await;
    let client = setup(&server);
    assert!(!client.is_authenticated().await);
    assert_eq!(client.login_name().await, None);
}

#[tokio::test]
async fn login_captures_session() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/user/login"))
        .and(body_partial_json(serde_json::json!({ "login": "alice" })))
        .respond_with(session_response())
        .expect(1)
        .mount(&server)
        .await;

    let client = setup(&server);
    client.login("alice", "secret123").await.unwrap();
    assert!(client.is_authenticated().await);
    assert_eq!(client.login_name().await.as_deref(), Some("alice"));
}

#[tokio::test]
async fn login_bad_credentials() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/user/login"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let client = setup(&server);
    let err = client.login("alice", "nope").await.unwrap_err();
    assert!(matches!(err, ClientError::InvalidCredentials));
    assert!(!client.is_authenticated().await);
}

#[tokio::test]
async fn register_existing_user() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/user/register"))
        .respond_with(conflict("user_exists"))
        .mount(&server)
        .await;

    let err = setup(&server).register("alice", "x").await.unwrap_err();
    assert!(matches!(err, ClientError::UserExists));
}

#[tokio::test]
async fn missing_cookie_is_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/user/register"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let err = setup(&server).register("alice", "x").await.unwrap_err();
    assert!(matches!(err, ClientError::Api(_)));
}

#[tokio::test]
async fn logout_clears_session() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/user/logout"))
        .and(header("cookie", "session.id=tok123"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;
    let client = logged_in(&server).await;

    client.logout().await;
    assert!(!client.is_authenticated().await);
}

// --- Records ---

#[tokio::test]
async fn upload_without_session_never_hits_network() {
    let server = MockServer::start().await;
    let client = setup(&server);
    let err = client
        .upload(&TextSecret::new("n", "t"))
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::AuthRequired));
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn upload_replays_cookie() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/user/upload/logopass"))
        .and(header("cookie", "session.id=tok123"))
        .and(body_partial_json(serde_json::json!({ "description": "email" })))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;
    let client = logged_in(&server).await;

    client
        .upload(&LoginSecret::new("email", "a", "b"))
        .await
        .unwrap();
}

#[tokio::test]
async fn upload_conflicts_map_by_status() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/user/upload/text"))
        .and(body_partial_json(serde_json::json!({ "description": "dup" })))
        .respond_with(conflict("already_exists"))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/user/upload/text"))
        .and(body_partial_json(serde_json::json!({ "description": "stale" })))
        .respond_with(conflict("old_data"))
        .mount(&server)
        .await;
    let client = logged_in(&server).await;

    let dup = client.upload(&TextSecret::new("dup", "t")).await.unwrap_err();
    assert!(matches!(dup, ClientError::AlreadyExists(ref k) if k == "dup"));

    let stale = client.upload(&TextSecret::new("stale", "t")).await.unwrap_err();
    assert!(matches!(stale, ClientError::OldData));
}

#[tokio::test]
async fn download_empty_is_empty() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/user/download/credit-cards"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    let client = logged_in(&server).await;

    let err = client
        .download_all::<keeper_types::CardSecret>()
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::Empty));
}

#[tokio::test]
async fn download_parses_records() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/user/download/texts"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            { "id": 4, "updated_at": "2024-05-01T12:00:00Z", "description": "n", "data": "ct" }
        ])))
        .mount(&server)
        .await;
    let client = logged_in(&server).await;

    let records = client.download_all::<TextSecret>().await.unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].meta.id, 4);
    assert_eq!(records[0].text, "ct");
}

#[tokio::test]
async fn download_garbage_is_decode_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/user/download/binary-list"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;
    let client = logged_in(&server).await;

    let err = client.download_all::<BlobRecord>().await.unwrap_err();
    assert!(matches!(err, ClientError::Decode(_)));
}

#[tokio::test]
async fn expired_session_is_auth_required() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/user/download/texts"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;
    let client = logged_in(&server).await;

    let err = client.download_all::<TextSecret>().await.unwrap_err();
    assert!(matches!(err, ClientError::AuthRequired));
}

#[tokio::test]
async fn fetch_blob_posts_selector() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/user/download/binary"))
        .and(body_partial_json(serde_json::json!({ "description": "photo" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "id": 1, "updated_at": "2024-05-01T12:00:00Z", "description": "photo", "binary": "AAAA"
        })))
        .mount(&server)
        .await;
    let client = logged_in(&server).await;

    let blob = client.fetch_blob("photo").await.unwrap();
    assert_eq!(blob.content.as_deref(), Some("AAAA"));
}

// --- Connectivity ---

#[tokio::test]
async fn unreachable_server_is_offline() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client =
        KeeperApiClient::new(&ClientConfig::new(format!("http://{addr}"), "/tmp/unused")).unwrap();
    let err = client.login("alice", "secret123").await.unwrap_err();
    assert!(err.is_offline(), "expected offline error, got {err:?}");
}
