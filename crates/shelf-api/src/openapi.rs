//! OpenAPI 문서화 설정.
//!
//! utoipa를 사용하여 REST API의 OpenAPI 3.0 스펙을 생성합니다.
//! Swagger UI는 `/swagger-ui` 경로에서 사용 가능합니다.
//!
//! 새로운 엔드포인트를 추가할 때:
//!
//! 1. 응답/요청 타입에 `#[derive(ToSchema)]` 추가
//! 2. 핸들러에 `#[utoipa::path(...)]` 어노테이션 추가
//! 3. 이 파일의 `components(schemas(...))` 및 `paths(...)` 섹션에 추가

use axum::Router;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};
use utoipa_swagger_ui::SwaggerUi;

use shelf_core::{AccountId, AccountView, Book, BookId, Collection, CoverOutcome, Rating};

use crate::error::ApiErrorResponse;
use crate::routes::{
    books::BookForm, AuthResponse, BookListResponse, ComponentHealth, ComponentStatus,
    DeleteBookResponse, HealthResponse, LoginRequest, SavedBookResponse, SignupRequest,
};

// ==================== 보안 스킴 ====================

/// `bearer_auth` HTTP Bearer(JWT) 스킴을 등록합니다.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

// ==================== OpenAPI 문서 정의 ====================

/// Bookshelf API 문서.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Bookshelf API",
        description = r#"
# Bookshelf REST API

개인 서재 관리를 위한 REST API입니다.

## 인증

`/api/v1/auth/signup` 또는 `/api/v1/auth/login`으로 발급받은 토큰을
`Authorization: Bearer <token>` 헤더에 포함하세요.

## 표지 업로드

도서 생성/수정은 `multipart/form-data`를 받습니다. 표지 저장이 실패해도
도서는 저장되며 응답의 `cover.status`가 `failed`가 됩니다.
"#,
        license(name = "MIT", url = "https://opensource.org/licenses/MIT")
    ),
    servers(
        (url = "http://localhost:4000", description = "로컬 개발 서버"),
    ),
    tags(
        (name = "health", description = "헬스 체크 - 서버 상태 확인"),
        (name = "auth", description = "인증 - 가입, 로그인, 세션"),
        (name = "books", description = "도서 - 서재 CRUD 및 표지 업로드")
    ),
    modifiers(&SecurityAddon),
    // ==================== 스키마 등록 ====================
    components(
        schemas(
            // ===== Health =====
            HealthResponse,
            ComponentHealth,
            ComponentStatus,

            // ===== Common =====
            ApiErrorResponse,

            // ===== Auth =====
            SignupRequest,
            LoginRequest,
            AuthResponse,
            AccountView,
            AccountId,

            // ===== Books =====
            Book,
            BookId,
            Collection,
            Rating,
            CoverOutcome,
            BookForm,
            BookListResponse,
            SavedBookResponse,
            DeleteBookResponse,
        )
    ),
    // ==================== 경로 등록 ====================
    paths(
        // ===== Health =====
        crate::routes::health::health_check,
        crate::routes::health::health_ready,

        // ===== Auth =====
        crate::routes::auth::signup,
        crate::routes::auth::login,
        crate::routes::auth::me,

        // ===== Books =====
        crate::routes::books::list_books,
        crate::routes::books::get_book,
        crate::routes::books::add_book,
        crate::routes::books::modify_book,
        crate::routes::books::delete_book,
    )
)]
pub struct ApiDoc;

// ==================== Swagger UI 라우터 ====================

/// Swagger UI 라우터 생성.
///
/// 다음 경로에 문서 UI를 마운트합니다:
/// - `/swagger-ui` - Swagger UI 대화형 문서
/// - `/api-docs/openapi.json` - OpenAPI JSON 스펙
pub fn swagger_ui_router<S>() -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    SwaggerUi::new("/swagger-ui")
        .url("/api-docs/openapi.json", ApiDoc::openapi())
        .into()
}

// ==================== 테스트 ====================
