//! 인증 API 라우트.
//!
//! # 엔드포인트
//!
//! - `POST /api/v1/auth/signup` - 계정 생성 및 세션 발급
//! - `POST /api/v1/auth/login` - 로그인 및 세션 발급
//! - `GET /api/v1/auth/me` - 현재 세션의 계정 조회

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Deserializer, Serialize};
use shelf_core::AccountView;
use std::sync::Arc;
use tracing::debug;
use utoipa::ToSchema;
use validator::Validate;

use crate::auth::{AuthAccount, AuthSession, CredentialError};
use crate::error::{api_error, ApiErrorResponse, ApiResult};
use crate::state::AppState;

// ================================================================================================
// Request/Response Types
// ================================================================================================

/// 평문 비밀번호를 곧바로 `SecretString`으로 감쌉니다.
fn deserialize_secret<'de, D>(deserializer: D) -> Result<SecretString, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    Ok(SecretString::new(raw.into()))
}

/// 가입 요청
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct SignupRequest {
    /// 표시 이름
    #[validate(length(min = 1, max = 100, message = "name must be 1-100 characters"))]
    pub name: String,
    /// 로그인 핸들 (대소문자 구분)
    #[validate(length(min = 3, max = 64, message = "username must be 3-64 characters"))]
    pub username: String,
    /// 비밀번호
    #[serde(deserialize_with = "deserialize_secret")]
    #[schema(value_type = String, format = Password)]
    pub password: SecretString,
}

/// 로그인 요청
#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub username: String,
    #[serde(deserialize_with = "deserialize_secret")]
    #[schema(value_type = String, format = Password)]
    pub password: SecretString,
}

/// 가입/로그인 응답
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AuthResponse {
    /// HS256 세션 토큰 (`Authorization: Bearer <token>`)
    pub token: String,
    /// 토큰 만료 시각
    pub expires_at: DateTime<Utc>,
    /// 계정 정보
    pub user: AccountView,
}

impl From<AuthSession> for AuthResponse {
    fn from(session: AuthSession) -> Self {
        Self {
            token: session.session.token,
            expires_at: session.session.expires_at,
            user: session.account.view(),
        }
    }
}

// ================================================================================================
// Error mapping
// ================================================================================================

impl From<CredentialError> for (StatusCode, Json<ApiErrorResponse>) {
    fn from(err: CredentialError) -> Self {
        let (status, code) = match &err {
            CredentialError::DuplicateHandle(_) => (StatusCode::CONFLICT, "DUPLICATE_HANDLE"),
            CredentialError::NotFound(_) => (StatusCode::NOT_FOUND, "ACCOUNT_NOT_FOUND"),
            CredentialError::InvalidCredential => (StatusCode::UNAUTHORIZED, "INVALID_CREDENTIAL"),
            CredentialError::InvalidToken => (StatusCode::UNAUTHORIZED, "INVALID_TOKEN"),
            CredentialError::Store(_) => (StatusCode::INTERNAL_SERVER_ERROR, "STORE_ERROR"),
            CredentialError::Hashing(_) | CredentialError::Issuance(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR")
            }
        };

        if status.is_server_error() {
            tracing::error!(error = %err, "Credential service failure");
        }

        api_error(status, code, err.to_string())
    }
}

fn require_password(password: &SecretString) -> ApiResult<()> {
    if password.expose_secret().is_empty() {
        return Err(api_error(
            StatusCode::BAD_REQUEST,
            "VALIDATION_ERROR",
            "password is required",
        ));
    }
    Ok(())
}

// ================================================================================================
// Handlers
// ================================================================================================

/// POST /api/v1/auth/signup - 계정 생성
#[utoipa::path(
    post,
    path = "/api/v1/auth/signup",
    request_body = SignupRequest,
    responses(
        (status = 201, description = "계정 생성 및 세션 발급", body = AuthResponse),
        (status = 400, description = "입력 검증 실패", body = ApiErrorResponse),
        (status = 409, description = "이미 사용 중인 사용자 이름", body = ApiErrorResponse)
    ),
    tag = "auth"
)]
pub async fn signup(
    State(state): State<Arc<AppState>>,
    Json(request): Json<SignupRequest>,
) -> ApiResult<(StatusCode, Json<AuthResponse>)> {
    request.validate().map_err(|e| {
        (
            StatusCode::BAD_REQUEST,
            Json(ApiErrorResponse::from_validation(&e)),
        )
    })?;
    require_password(&request.password)?;

    debug!(username = %request.username, "Signup requested");

    let session = state
        .credentials
        .signup(&request.username, &request.name, &request.password)
        .await?;

    Ok((StatusCode::CREATED, Json(session.into())))
}

/// POST /api/v1/auth/login - 로그인
#[utoipa::path(
    post,
    path = "/api/v1/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "세션 발급", body = AuthResponse),
        (status = 401, description = "비밀번호 불일치", body = ApiErrorResponse),
        (status = 404, description = "존재하지 않는 사용자 이름", body = ApiErrorResponse)
    ),
    tag = "auth"
)]
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(request): Json<LoginRequest>,
) -> ApiResult<Json<AuthResponse>> {
    require_password(&request.password)?;

    let session = state
        .credentials
        .login(&request.username, &request.password)
        .await?;

    Ok(Json(session.into()))
}

/// GET /api/v1/auth/me - 현재 계정 조회
#[utoipa::path(
    get,
    path = "/api/v1/auth/me",
    responses(
        (status = 200, description = "현재 계정", body = AccountView),
        (status = 401, description = "인증 실패", body = ApiErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "auth"
)]
pub async fn me(
    State(state): State<Arc<AppState>>,
    AuthAccount(account): AuthAccount,
) -> ApiResult<Json<AccountView>> {
    let account = state.credentials.current_account(account).await?;
    Ok(Json(account.view()))
}

/// 인증 라우터 생성.
pub fn auth_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/signup", post(signup))
        .route("/login", post(login))
        .route("/me", get(me))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::create_test_state;
    use axum::{body::Body, http::Request};
    use tower::ServiceExt;

    fn app() -> Router {
        Router::new()
            .nest("/api/v1/auth", auth_router())
            .with_state(Arc::new(create_test_state()))
    }

    fn json_request(uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn error_body(response: axum::response::Response) -> ApiErrorResponse {
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    #[tokio::test]
    async fn test_signup_validation() {
        let response = app()
            .oneshot(json_request(
                "/api/v1/auth/signup",
                serde_json::json!({"name": "Al", "username": "al", "password": "pw"}),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(error_body(response).await.code, "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_empty_password_rejected() {
        let response = app()
            .oneshot(json_request(
                "/api/v1/auth/login",
                serde_json::json!({"username": "alice", "password": ""}),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_login_unknown_user() {
        let response = app()
            .oneshot(json_request(
                "/api/v1/auth/login",
                serde_json::json!({"username": "nobody", "password": "pw"}),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(error_body(response).await.code, "ACCOUNT_NOT_FOUND");
    }

    #[test]
    fn test_error_mapping() {
        let cases = [
            (CredentialError::DuplicateHandle("a".into()), StatusCode::CONFLICT),
            (CredentialError::NotFound("a".into()), StatusCode::NOT_FOUND),
            (CredentialError::InvalidCredential, StatusCode::UNAUTHORIZED),
            (CredentialError::InvalidToken, StatusCode::UNAUTHORIZED),
            (CredentialError::Hashing("x".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (err, expected) in cases {
            let (status, _) = <(StatusCode, Json<ApiErrorResponse>)>::from(err);
            assert_eq!(status, expected);
        }
    }

    #[test]
    fn test_request_debug_hides_password() {
        let request: LoginRequest =
            serde_json::from_str(r#"{"username":"alice","password":"hunter2"}"#).unwrap();
        assert!(!format!("{:?}", request).contains("hunter2"));
    }
}
