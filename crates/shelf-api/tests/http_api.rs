//! HTTP API 통합 테스트.
//!
//! 인메모리 상태로 라우터를 만들고 `oneshot`으로 요청을 보냅니다.

use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    response::Response,
    Router,
};
use serde_json::{json, Value};
use shelf_api::auth::{AuthConfig, HashingCost};
use shelf_api::routes::create_api_router;
use shelf_api::state::AppState;
use shelf_api::storage::LocalCoverStorage;
use shelf_core::{CoverStorage, StorageError};
use tower::ServiceExt;

const BOUNDARY: &str = "shelf-test-boundary";

/// 항상 실패하는 표지 저장소.
struct BrokenStorage;

#[async_trait]
impl CoverStorage for BrokenStorage {
    async fn write(&self, _file_name: &str, _bytes: &[u8]) -> Result<(), StorageError> {
        Err(StorageError::Io(std::io::Error::new(
            std::io::ErrorKind::PermissionDenied,
            "read-only file system",
        )))
    }
}

fn auth_config() -> AuthConfig {
    AuthConfig::new(
        "http-test-signing-secret",
        chrono::Duration::hours(999),
        HashingCost::new(8, 1, 1),
    )
}

fn app_with(covers: Arc<dyn CoverStorage>) -> Router {
    let state = AppState::in_memory(&auth_config(), covers).unwrap();
    create_api_router().with_state(Arc::new(state))
}

async fn json_body(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn authed(method: &str, uri: &str, token: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap()
}

/// multipart 본문을 직접 구성합니다. `cover`는 (파일명, 바이트).
fn multipart(
    method: &str,
    uri: &str,
    token: &str,
    fields: &[(&str, &str)],
    cover: Option<(&str, &[u8])>,
) -> Request<Body> {
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
    }
    if let Some((file_name, bytes)) = cover {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"cover\"; filename=\"{file_name}\"\r\nContent-Type: image/png\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}

async fn signup(app: &Router, username: &str) -> String {
    let response = app
        .clone()
        .oneshot(post_json(
            "/api/v1/auth/signup",
            json!({"name": "Reader", "username": username, "password": "pw123"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    json_body(response).await["token"]
        .as_str()
        .unwrap()
        .to_string()
}

const DUNE: &[(&str, &str)] = &[
    ("title", "Dune"),
    ("author", "Frank Herbert"),
    ("date", "2024-03-09"),
    ("collection", "read"),
    ("rating", "5"),
];

#[tokio::test]
async fn signup_login_and_me() {
    let tmp = tempfile::tempdir().unwrap();
    let app = app_with(Arc::new(LocalCoverStorage::new(tmp.path())));

    let response = app
        .clone()
        .oneshot(post_json(
            "/api/v1/auth/signup",
            json!({"name": "Alice", "username": "alice", "password": "pw123"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = json_body(response).await;
    assert_eq!(body["user"]["username"], "alice");
    assert_eq!(body["user"]["name"], "Alice");
    assert!(body["user"].get("password_hash").is_none());

    // 중복 가입
    let response = app
        .clone()
        .oneshot(post_json(
            "/api/v1/auth/signup",
            json!({"name": "Alice", "username": "alice", "password": "other"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(json_body(response).await["code"], "DUPLICATE_HANDLE");

    // 틀린 비밀번호
    let response = app
        .clone()
        .oneshot(post_json(
            "/api/v1/auth/login",
            json!({"username": "alice", "password": "wrong"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(json_body(response).await["code"], "INVALID_CREDENTIAL");

    // 로그인 후 /me
    let response = app
        .clone()
        .oneshot(post_json(
            "/api/v1/auth/login",
            json!({"username": "alice", "password": "pw123"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let token = json_body(response).await["token"]
        .as_str()
        .unwrap()
        .to_string();

    let response = app
        .clone()
        .oneshot(authed("GET", "/api/v1/auth/me", &token))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["username"], "alice");
}

#[tokio::test]
async fn me_requires_valid_token() {
    let tmp = tempfile::tempdir().unwrap();
    let app = app_with(Arc::new(LocalCoverStorage::new(tmp.path())));

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/v1/auth/me")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(json_body(response).await["code"], "MISSING_TOKEN");

    let response = app
        .oneshot(authed("GET", "/api/v1/auth/me", "not-a-token"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(json_body(response).await["code"], "INVALID_TOKEN");
}

#[tokio::test]
async fn book_crud_with_cover() {
    let tmp = tempfile::tempdir().unwrap();
    let app = app_with(Arc::new(LocalCoverStorage::new(tmp.path())));
    let token = signup(&app, "alice").await;

    // 생성 (표지 포함)
    let response = app
        .clone()
        .oneshot(multipart(
            "POST",
            "/api/v1/books",
            &token,
            DUNE,
            Some(("my cover.png", b"\x89PNG fake")),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = json_body(response).await;
    assert_eq!(body["cover"]["status"], "stored");
    assert_eq!(body["warnings"].as_array().unwrap().len(), 0);
    assert_eq!(body["book"]["title"], "Dune");
    assert_eq!(body["book"]["collection"], "read");
    assert_eq!(body["book"]["rating"], 5);
    assert_eq!(body["book"]["read_on"], "2024-03-09");

    let cover = body["book"]["cover"].as_str().unwrap().to_string();
    assert!(cover.ends_with("_my_cover.png"));
    assert!(tmp.path().join(&cover).exists());
    let id = body["book"]["id"].as_str().unwrap().to_string();

    // 목록
    let response = app
        .clone()
        .oneshot(authed("GET", "/api/v1/books", &token))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["total"], 1);

    // 필터링된 목록
    let response = app
        .clone()
        .oneshot(authed("GET", "/api/v1/books?collection=reading", &token))
        .await
        .unwrap();
    assert_eq!(json_body(response).await["total"], 0);

    // 수정 (표지 없음 → 기존 표지 유지)
    let response = app
        .clone()
        .oneshot(multipart(
            "PUT",
            &format!("/api/v1/books/{id}"),
            &token,
            &[
                ("title", "Dune Messiah"),
                ("author", "Frank Herbert"),
                ("date", "2024-04-01T10:00:00Z"),
                ("collection", "reading"),
            ],
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["cover"]["status"], "unchanged");
    assert_eq!(body["book"]["title"], "Dune Messiah");
    assert_eq!(body["book"]["cover"], cover.as_str());
    assert_eq!(body["book"]["read_on"], "2024-04-01");
    assert!(body["book"]["rating"].is_null());

    // 조회
    let response = app
        .clone()
        .oneshot(authed("GET", &format!("/api/v1/books/{id}"), &token))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["collection"], "reading");

    // 삭제
    let response = app
        .clone()
        .oneshot(authed("DELETE", &format!("/api/v1/books/{id}"), &token))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["deleted"], true);

    let response = app
        .oneshot(authed("GET", &format!("/api/v1/books/{id}"), &token))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn books_are_scoped_to_their_owner() {
    let tmp = tempfile::tempdir().unwrap();
    let app = app_with(Arc::new(LocalCoverStorage::new(tmp.path())));
    let alice = signup(&app, "alice").await;
    let bob = signup(&app, "bob").await;

    let response = app
        .clone()
        .oneshot(multipart("POST", "/api/v1/books", &alice, DUNE, None))
        .await
        .unwrap();
    let id = json_body(response).await["book"]["id"]
        .as_str()
        .unwrap()
        .to_string();

    let response = app
        .clone()
        .oneshot(authed("GET", "/api/v1/books", &bob))
        .await
        .unwrap();
    assert_eq!(json_body(response).await["total"], 0);

    let response = app
        .clone()
        .oneshot(authed("GET", &format!("/api/v1/books/{id}"), &bob))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = json_body(response).await;
    assert_eq!(body["code"], "BOOK_NOT_FOUND");
    assert_eq!(body["message"], "Selected book does not belong to you");

    let response = app
        .clone()
        .oneshot(multipart(
            "PUT",
            &format!("/api/v1/books/{id}"),
            &bob,
            DUNE,
            Some(("evil.png", b"data")),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    // 소유하지 않은 도서의 수정 요청은 파일을 쓰지 않는다
    assert_eq!(std::fs::read_dir(tmp.path()).map(|d| d.count()).unwrap_or(0), 0);

    let response = app
        .clone()
        .oneshot(authed("DELETE", &format!("/api/v1/books/{id}"), &bob))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app
        .oneshot(authed("GET", &format!("/api/v1/books/{id}"), &alice))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn failed_cover_write_still_saves_book() {
    let app = app_with(Arc::new(BrokenStorage));
    let token = signup(&app, "alice").await;

    let response = app
        .clone()
        .oneshot(multipart(
            "POST",
            "/api/v1/books",
            &token,
            DUNE,
            Some(("cover.png", b"bytes")),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let body = json_body(response).await;
    assert_eq!(body["cover"]["status"], "failed");
    assert!(body["cover"]["reason"].as_str().unwrap().contains("read-only"));
    assert_eq!(body["warnings"].as_array().unwrap().len(), 1);
    assert!(body["book"]["cover"].is_null());

    let response = app
        .oneshot(authed("GET", "/api/v1/books", &token))
        .await
        .unwrap();
    assert_eq!(json_body(response).await["total"], 1);
}

#[tokio::test]
async fn invalid_book_form_is_rejected() {
    let tmp = tempfile::tempdir().unwrap();
    let app = app_with(Arc::new(LocalCoverStorage::new(tmp.path())));
    let token = signup(&app, "alice").await;

    let cases: [&[(&str, &str)]; 4] = [
        // 날짜 누락
        &[("title", "T"), ("author", "A"), ("collection", "read")],
        // 알 수 없는 컬렉션
        &[("title", "T"), ("author", "A"), ("date", "2024-01-01"), ("collection", "shelved")],
        // 평점 범위 초과
        &[
            ("title", "T"),
            ("author", "A"),
            ("date", "2024-01-01"),
            ("collection", "read"),
            ("rating", "9"),
        ],
        // 빈 제목
        &[("title", ""), ("author", "A"), ("date", "2024-01-01"), ("collection", "read")],
    ];

    for fields in cases {
        let response = app
            .clone()
            .oneshot(multipart("POST", "/api/v1/books", &token, fields, None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(response).await["code"], "VALIDATION_ERROR");
    }
}

#[tokio::test]
async fn health_reports_memory_store() {
    let tmp = tempfile::tempdir().unwrap();
    let app = app_with(Arc::new(LocalCoverStorage::new(tmp.path())));

    let response = app
        .oneshot(
            Request::builder()
                .uri("/health/ready")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}
