//! Axum용 세션 인증 추출기.

use std::sync::Arc;

use axum::{
    extract::{FromRef, FromRequestParts},
    http::{header::AUTHORIZATION, request::Parts, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use shelf_core::AccountId;

use crate::error::ApiErrorResponse;
use crate::metrics::record_auth_event;
use crate::state::AppState;

/// 인증된 계정 추출기.
///
/// `Authorization: Bearer <token>` 헤더의 세션 토큰을 검증합니다.
///
/// # 사용 예시
///
/// ```rust,ignore
/// async fn protected_handler(AuthAccount(account): AuthAccount) -> String {
///     format!("Authenticated account: {}", account)
/// }
/// ```
#[derive(Debug, Clone, Copy)]
pub struct AuthAccount(pub AccountId);

/// 인증 거절 사유.
#[derive(Debug, thiserror::Error)]
pub enum AuthRejection {
    #[error("인증 토큰이 필요합니다")]
    MissingToken,
    #[error("잘못된 Authorization 헤더 형식")]
    InvalidAuthHeader,
    #[error("유효하지 않거나 만료된 토큰")]
    InvalidToken,
}

impl AuthRejection {
    fn code(&self) -> &'static str {
        match self {
            AuthRejection::MissingToken => "MISSING_TOKEN",
            AuthRejection::InvalidAuthHeader => "INVALID_AUTH_HEADER",
            AuthRejection::InvalidToken => "INVALID_TOKEN",
        }
    }
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        let body = Json(ApiErrorResponse::new(self.code(), self.to_string()));
        (StatusCode::UNAUTHORIZED, body).into_response()
    }
}

impl<S> FromRequestParts<S> for AuthAccount
where
    Arc<AppState>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(AUTHORIZATION)
            .ok_or(AuthRejection::MissingToken)?
            .to_str()
            .map_err(|_| AuthRejection::InvalidAuthHeader)?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or(AuthRejection::InvalidAuthHeader)?;

        let app = Arc::<AppState>::from_ref(state);
        let account = app.credentials.verify_session(token).map_err(|_| {
            record_auth_event("verify", "invalid_token");
            AuthRejection::InvalidToken
        })?;

        Ok(AuthAccount(account))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::create_test_state;
    use axum::{body::Body, http::Request, routing::get, Router};
    use tower::ServiceExt;

    async fn whoami(AuthAccount(account): AuthAccount) -> String {
        account.to_string()
    }

    fn app(state: Arc<AppState>) -> Router {
        Router::new().route("/whoami", get(whoami)).with_state(state)
    }

    async fn error_code(response: Response) -> String {
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let error: ApiErrorResponse = serde_json::from_slice(&body).unwrap();
        error.code
    }

    #[tokio::test]
    async fn test_missing_header() {
        let response = app(Arc::new(create_test_state()))
            .oneshot(Request::builder().uri("/whoami").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(error_code(response).await, "MISSING_TOKEN");
    }

    #[tokio::test]
    async fn test_non_bearer_header() {
        let response = app(Arc::new(create_test_state()))
            .oneshot(
                Request::builder()
                    .uri("/whoami")
                    .header(AUTHORIZATION, "Basic YWxpY2U6cHc=")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(error_code(response).await, "INVALID_AUTH_HEADER");
    }

    #[tokio::test]
    async fn test_valid_token() {
        let state = Arc::new(create_test_state());
        let account = shelf_core::Account {
            id: AccountId::new(),
            handle: "alice".to_string(),
            display_name: "Alice".to_string(),
            password_hash: String::new(),
            created_at: chrono::Utc::now(),
        };
        let session = state.credentials.issue_session(&account).unwrap();

        let response = app(state)
            .oneshot(
                Request::builder()
                    .uri("/whoami")
                    .header(AUTHORIZATION, format!("Bearer {}", session.token))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(body, account.id.to_string().as_bytes());
    }

    #[test]
    fn test_rejections_are_unauthorized() {
        for rejection in [
            AuthRejection::MissingToken,
            AuthRejection::InvalidAuthHeader,
            AuthRejection::InvalidToken,
        ] {
            assert_eq!(rejection.into_response().status(), StatusCode::UNAUTHORIZED);
        }
    }
}
