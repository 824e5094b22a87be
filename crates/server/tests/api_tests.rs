use std::sync::Arc;

use async_trait::async_trait;
use axum::Router;
use axum::body::{Body, Bytes};
use axum::http::{self, Request, StatusCode, header};
use axum::response::Response;
use tower::ServiceExt;

use dropgate_gateway::{Gateway, GatewayBuilder, MediaLibrary};
use dropgate_server::api::AppState;
use dropgate_server::delivery::NotFoundPage;
use dropgate_state::{KeyKind, StateError, StateKey, StateStore, StoredValue};
use dropgate_state_memory::MemoryStateStore;

const GUIDE: &[u8] = b"%PDF-1.7 test guide";

// -- Failing store --------------------------------------------------------

struct FailingStore;

#[async_trait]
impl StateStore for FailingStore {
    async fn get(&self, _key: &StateKey) -> Result<Option<StoredValue>, StateError> {
        Err(StateError::Backend("down".into()))
    }

    async fn put(&self, _key: &StateKey, _value: &StoredValue) -> Result<(), StateError> {
        Err(StateError::Backend("down".into()))
    }

    async fn raise_expiry(&self, _key: &StateKey, _expires_at: i64) -> Result<bool, StateError> {
        Err(StateError::Backend("down".into()))
    }

    async fn compare_and_delete(
        &self,
        _key: &StateKey,
        _expected: &StoredValue,
    ) -> Result<bool, StateError> {
        Err(StateError::Backend("down".into()))
    }

    async fn scan(&self, _kind: &KeyKind) -> Result<Vec<(String, StoredValue)>, StateError> {
        Err(StateError::Backend("down".into()))
    }

    async fn purge_expired(&self, _kind: &KeyKind, _now: i64) -> Result<u64, StateError> {
        Err(StateError::Backend("down".into()))
    }
}

// -- Helpers --------------------------------------------------------------

struct TestApp {
    app: Router,
    gateway: Arc<Gateway>,
    _media: tempfile::TempDir,
    _site: tempfile::TempDir,
}

fn build_test_app_with_store(store: Arc<dyn StateStore>) -> TestApp {
    let media = tempfile::tempdir().unwrap();
    std::fs::create_dir_all(media.path().join("ebooks")).unwrap();
    std::fs::write(media.path().join("ebooks/guide.pdf"), GUIDE).unwrap();
    std::fs::write(media.path().join("photos.zip"), b"PK zip").unwrap();

    let site = tempfile::tempdir().unwrap();
    std::fs::create_dir_all(site.path().join("about")).unwrap();
    std::fs::write(site.path().join("about/page"), "<h1>About us</h1>").unwrap();

    let library = MediaLibrary::new(media.path())
        .entry("42", "ebooks/guide.pdf")
        .entry("9", "photos.zip");
    let gateway = Arc::new(
        GatewayBuilder::new()
            .state(store)
            .resolver(Arc::new(library))
            .build()
            .expect("gateway should build"),
    );

    let state = AppState {
        gateway: Arc::clone(&gateway),
        not_found: NotFoundPage::new("<h1>Nothing here</h1>"),
        site_root: Some(site.path().to_path_buf()),
    };

    TestApp {
        app: dropgate_server::api::router(state),
        gateway,
        _media: media,
        _site: site,
    }
}

fn build_test_app() -> TestApp {
    build_test_app_with_store(Arc::new(MemoryStateStore::new()))
}

async fn send(app: &Router, request: Request<Body>) -> Response {
    app.clone().oneshot(request).await.unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn form(body: &str) -> Request<Body> {
    Request::builder()
        .method(http::Method::POST)
        .uri("/v1/submissions")
        .header(
            http::header::CONTENT_TYPE,
            "application/x-www-form-urlencoded",
        )
        .body(Body::from(body.to_owned()))
        .unwrap()
}

fn json(body: &serde_json::Value) -> Request<Body> {
    Request::builder()
        .method(http::Method::POST)
        .uri("/v1/submissions")
        .header(http::header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn body_bytes(response: Response) -> Bytes {
    axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
}

async fn submit(app: &Router, body: &str) {
    let response = send(app, form(body)).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
}

// -- Tests ----------------------------------------------------------------

#[tokio::test]
async fn health_returns_200() {
    let t = build_test_app();
    let response = send(&t.app, get("/health")).await;

    assert_eq!(response.status(), StatusCode::OK);
    let json: serde_json::Value = serde_json::from_slice(&body_bytes(response).await).unwrap();
    assert_eq!(json["status"], "ok");
    assert!(json["metrics"].is_object());
}

#[tokio::test]
async fn metrics_returns_200() {
    let t = build_test_app();
    let response = send(&t.app, get("/metrics")).await;

    assert_eq!(response.status(), StatusCode::OK);
    let json: serde_json::Value = serde_json::from_slice(&body_bytes(response).await).unwrap();
    assert_eq!(json["redemptions"], 0);
    assert_eq!(json["submissions_accepted"], 0);
}

#[tokio::test]
async fn openapi_document_is_served() {
    let t = build_test_app();
    let response = send(&t.app, get("/api-doc/openapi.json")).await;

    assert_eq!(response.status(), StatusCode::OK);
    let json: serde_json::Value = serde_json::from_slice(&body_bytes(response).await).unwrap();
    assert!(json["paths"]["/v1/submissions"]["post"].is_object());
    assert!(json["paths"]["/health"]["get"].is_object());
}

#[tokio::test]
async fn submitted_token_downloads_exactly_once() {
    let t = build_test_app();
    submit(
        &t.app,
        "download_token=abc123&download_resource=42&email=someone%40example.com",
    )
    .await;

    let response = send(&t.app, get("/download/abc123")).await;
    assert_eq!(response.status(), StatusCode::OK);
    let h = response.headers();
    assert_eq!(h["content-description"], "File Transfer");
    assert_eq!(h[header::CONTENT_TYPE], "application/octet-stream");
    assert_eq!(
        h[header::CONTENT_DISPOSITION],
        "attachment; filename=\"guide.pdf\""
    );
    assert_eq!(h[header::CONTENT_LENGTH], GUIDE.len().to_string().as_str());
    assert_eq!(h[header::CACHE_CONTROL], "must-revalidate");
    assert_eq!(&body_bytes(response).await[..], GUIDE);

    let again = send(&t.app, get("/download/abc123")).await;
    assert_eq!(again.status(), StatusCode::NOT_FOUND);
    let h = again.headers();
    assert_eq!(h[header::CACHE_CONTROL], "no-cache, must-revalidate, max-age=0");
    assert_eq!(h[header::EXPIRES], "Wed, 11 Jan 1984 05:00:00 GMT");
    assert_eq!(h[header::PRAGMA], "no-cache");
    assert_eq!(&body_bytes(again).await[..], b"<h1>Nothing here</h1>");

    let snap = t.gateway.metrics().snapshot();
    assert_eq!(snap.submissions_accepted, 1);
    assert_eq!(snap.redemptions, 1);
    assert_eq!(snap.rejections, 1);
}

#[tokio::test]
async fn zero_lifetime_token_is_not_found() {
    let t = build_test_app();
    let response = send(
        &t.app,
        json(&serde_json::json!({
            "download_token": "xyz",
            "download_resource": 9,
            "download_path": "/files",
            "download_lifetime": 0
        })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    tokio::time::sleep(std::time::Duration::from_millis(1100)).await;
    let response = send(&t.app, get("/files/xyz")).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(&body_bytes(response).await[..], b"<h1>Nothing here</h1>");
}

#[tokio::test]
async fn unclaimed_paths_reach_the_site() {
    let t = build_test_app();
    submit(&t.app, "download_token=abc123&download_resource=42").await;

    let response = send(&t.app, get("/about/page")).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(&body_bytes(response).await[..], b"<h1>About us</h1>");

    let missing = send(&t.app, get("/about/missing")).await;
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);
    assert_eq!(t.gateway.metrics().snapshot().rejections, 0);
}

#[tokio::test]
async fn query_string_is_ignored() {
    let t = build_test_app();
    submit(&t.app, "download_token=q1&download_resource=42").await;

    let response = send(&t.app, get("/download/q1?utm_source=mail&next=/x/y")).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn prefix_mismatch_is_not_found_and_keeps_the_token() {
    let t = build_test_app();
    submit(
        &t.app,
        "download_token=tok&download_resource=42&download_path=%2Fassets%2Fe-books",
    )
    .await;
    submit(&t.app, "download_token=other&download_resource=9").await;

    let wrong = send(&t.app, get("/download/tok")).await;
    assert_eq!(wrong.status(), StatusCode::NOT_FOUND);

    let right = send(&t.app, get("/assets/e-books/tok")).await;
    assert_eq!(right.status(), StatusCode::OK);
}

#[tokio::test]
async fn head_request_consumes_the_token() {
    let t = build_test_app();
    submit(&t.app, "download_token=h1&download_resource=9").await;

    let head = Request::builder()
        .method(http::Method::HEAD)
        .uri("/download/h1")
        .body(Body::empty())
        .unwrap();
    let response = send(&t.app, head).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_LENGTH], "6");

    let response = send(&t.app, get("/download/h1")).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn other_methods_on_claimed_path_get_not_found_and_keep_the_token() {
    let t = build_test_app();
    submit(&t.app, "download_token=p1&download_resource=42").await;

    for method in [http::Method::POST, http::Method::PUT, http::Method::DELETE] {
        let request = Request::builder()
            .method(method.clone())
            .uri("/download/p1")
            .body(Body::empty())
            .unwrap();
        let response = send(&t.app, request).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND, "{method}");
        let h = response.headers();
        assert_eq!(h[header::CACHE_CONTROL], "no-cache, must-revalidate, max-age=0");
        assert_eq!(h[header::EXPIRES], "Wed, 11 Jan 1984 05:00:00 GMT");
        assert_eq!(h[header::PRAGMA], "no-cache");
        assert_eq!(&body_bytes(response).await[..], b"<h1>Nothing here</h1>");
    }
    assert_eq!(t.gateway.metrics().snapshot().rejections, 0);

    let response = send(&t.app, get("/download/p1")).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(&body_bytes(response).await[..], GUIDE);

    let again = send(&t.app, get("/download/p1")).await;
    assert_eq!(again.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn other_methods_on_unclaimed_paths_reach_the_router() {
    let t = build_test_app();
    let request = Request::builder()
        .method(http::Method::POST)
        .uri("/about/page")
        .body(Body::empty())
        .unwrap();
    let response = send(&t.app, request).await;
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn malformed_submission_is_accepted_silently() {
    let t = build_test_app();
    submit(&t.app, "download_resource=42&name=anonymous").await;
    submit(&t.app, "download_token=a%2Fb&download_resource=42").await;

    let snap = t.gateway.metrics().snapshot();
    assert_eq!(snap.submissions_accepted, 0);
    assert_eq!(snap.submissions_ignored, 2);

    let response = send(&t.app, get("/download/a")).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(t.gateway.metrics().snapshot().rejections, 0);
}

#[tokio::test]
async fn unknown_token_on_claimed_path_is_not_found() {
    let t = build_test_app();
    submit(&t.app, "download_token=real&download_resource=42").await;

    let response = send(&t.app, get("/download/guess")).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(t.gateway.metrics().snapshot().rejections, 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_requests_deliver_once() {
    let t = build_test_app();
    submit(&t.app, "download_token=race&download_resource=42").await;

    let mut handles = Vec::new();
    for _ in 0..16 {
        let app = t.app.clone();
        handles.push(tokio::spawn(async move {
            app.oneshot(get("/download/race")).await.unwrap().status()
        }));
    }

    let mut ok = 0;
    for h in handles {
        match h.await.unwrap() {
            StatusCode::OK => ok += 1,
            status => assert_eq!(status, StatusCode::NOT_FOUND),
        }
    }
    assert_eq!(ok, 1);
}

#[tokio::test]
async fn store_failure_on_submission_returns_500() {
    let t = build_test_app_with_store(Arc::new(FailingStore));
    let response = send(
        &t.app,
        form("download_token=abc&download_resource=42"),
    )
    .await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let json: serde_json::Value = serde_json::from_slice(&body_bytes(response).await).unwrap();
    assert!(json["error"].as_str().unwrap().contains("down"));
}

#[tokio::test]
async fn store_failure_on_lookup_falls_through() {
    let t = build_test_app_with_store(Arc::new(FailingStore));

    let response = send(&t.app, get("/about/page")).await;
    assert_eq!(response.status(), StatusCode::OK);

    let health = send(&t.app, get("/health")).await;
    assert_eq!(health.status(), StatusCode::OK);
}
