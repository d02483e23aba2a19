//! Bookshelf REST API 서버.
//!
//! 계정 가입/로그인과 세션 토큰 발급, 계정별 도서 CRUD 및 표지 업로드를
//! 제공합니다.
//!
//! # 모듈
//!
//! - [`auth`]: 비밀번호 해싱, JWT 세션, 자격 증명 서비스, 인증 추출기
//! - [`services`]: 도서 서비스
//! - [`repository`]: PostgreSQL / 인메모리 저장소 어댑터
//! - [`storage`]: 로컬 파일 시스템 표지 저장소
//! - [`routes`]: REST 엔드포인트
//! - [`openapi`]: OpenAPI 문서와 Swagger UI

pub mod auth;
pub mod error;
pub mod metrics;
pub mod middleware;
pub mod openapi;
pub mod repository;
pub mod routes;
pub mod services;
pub mod state;
pub mod storage;

pub use auth::{
    AuthAccount, AuthConfig, AuthSession, CredentialError, CredentialService, HashingCost,
    SessionKeys,
};
pub use error::{ApiErrorResponse, ApiResult};
pub use metrics::setup_metrics_recorder;
pub use middleware::{metrics_layer, MetricsLabels};
pub use routes::*;
pub use services::{BookError, BookInput, BookService};
pub use state::AppState;
pub use storage::LocalCoverStorage;

#[cfg(any(test, feature = "test-utils"))]
pub use state::create_test_state;
