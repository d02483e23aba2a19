//! REST API 라우트.
//!
//! 인증, 도서, 헬스 체크 엔드포인트를 하나의 라우터로 묶습니다.

pub mod auth;
pub mod books;
pub mod health;

pub use auth::{auth_router, AuthResponse, LoginRequest, SignupRequest};
pub use books::{books_router, BookListResponse, DeleteBookResponse, ListQuery, SavedBookResponse};
pub use health::{health_router, ComponentHealth, ComponentStatus, HealthResponse};

use axum::Router;
use std::sync::Arc;

use crate::state::AppState;

pub fn create_api_router() -> Router<Arc<AppState>> {
    Router::new()
        // 헬스 체크 엔드포인트
        .nest("/health", health_router())
        // API v1 엔드포인트
        .nest("/api/v1/auth", auth_router())
        .nest("/api/v1/books", books_router())
}
