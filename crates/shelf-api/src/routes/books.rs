//! 도서 API 라우트
//!
//! 인증된 계정의 도서 목록을 관리합니다. 생성/수정은 표지 업로드를 위해
//! `multipart/form-data`를 받습니다.
//!
//! # 엔드포인트
//!
//! - `GET /api/v1/books` - 도서 목록 (`?collection=` 필터)
//! - `POST /api/v1/books` - 도서 추가
//! - `GET /api/v1/books/{id}` - 도서 조회
//! - `PUT /api/v1/books/{id}` - 도서 수정
//! - `DELETE /api/v1/books/{id}` - 도서 삭제

use axum::{
    extract::{
        multipart::{Field, MultipartError},
        Multipart, Path, Query, State,
    },
    http::StatusCode,
    routing::get,
    Json, Router,
};
use chrono::{DateTime, NaiveDate};
use serde::{Deserialize, Serialize};
use shelf_core::{Book, BookId, Collection, CoverOutcome, CoverUpload, Saved};
use std::sync::Arc;
use tracing::{debug, warn};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::auth::AuthAccount;
use crate::error::{api_error, ApiErrorResponse, ApiResult};
use crate::services::{BookError, BookInput};
use crate::state::AppState;

// ================================================================================================
// Request/Response Types
// ================================================================================================

/// 목록 조회 쿼리
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListQuery {
    /// 컬렉션 필터 (`want-to-read` | `reading` | `read`)
    pub collection: Option<Collection>,
}

/// 도서 목록 응답
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct BookListResponse {
    pub books: Vec<Book>,
    pub total: usize,
}

/// 도서 저장 응답.
///
/// 표지 저장이 실패해도 도서는 저장되며, 이 경우 `cover.status`가 `failed`이고
/// `warnings`에 사유가 담깁니다.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SavedBookResponse {
    pub book: Book,
    pub cover: CoverOutcome,
    pub warnings: Vec<String>,
}

impl From<Saved<Book>> for SavedBookResponse {
    fn from(saved: Saved<Book>) -> Self {
        let warnings = saved.warnings();
        Self {
            book: saved.record,
            cover: saved.cover,
            warnings,
        }
    }
}

/// 삭제 응답
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DeleteBookResponse {
    pub id: BookId,
    pub deleted: bool,
}

/// 도서 폼 (`multipart/form-data`). OpenAPI 문서용.
#[derive(Debug, ToSchema)]
#[allow(dead_code)]
pub struct BookForm {
    title: String,
    author: String,
    /// `YYYY-MM-DD` 또는 RFC 3339 날짜
    date: String,
    collection: Collection,
    rating: Option<u8>,
    /// 표지 이미지 (선택)
    #[schema(value_type = Option<String>, format = Binary)]
    cover: Option<Vec<u8>>,
}

// ================================================================================================
// Error mapping
// ================================================================================================

impl From<BookError> for (StatusCode, Json<ApiErrorResponse>) {
    fn from(err: BookError) -> Self {
        match err {
            BookError::NotOwned => api_error(
                StatusCode::NOT_FOUND,
                "BOOK_NOT_FOUND",
                BookError::NotOwned.to_string(),
            ),
            BookError::Validation(errors) => (
                StatusCode::BAD_REQUEST,
                Json(ApiErrorResponse::from_validation(&errors)),
            ),
            BookError::Store(e) => {
                tracing::error!(error = %e, "Book store failure");
                api_error(StatusCode::INTERNAL_SERVER_ERROR, "STORE_ERROR", e.to_string())
            }
            BookError::Attachment(e) => {
                api_error(StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", e.to_string())
            }
        }
    }
}

fn invalid_field(message: impl Into<String>) -> (StatusCode, Json<ApiErrorResponse>) {
    api_error(StatusCode::BAD_REQUEST, "VALIDATION_ERROR", message)
}

// ================================================================================================
// Multipart form parsing
// ================================================================================================

/// 날짜 필드를 파싱합니다. `YYYY-MM-DD` 또는 RFC 3339 타임스탬프의 날짜 부분.
fn parse_read_on(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(raw).ok().map(|dt| dt.date_naive()))
}

fn parse_rating(raw: &str) -> Result<Option<u8>, (StatusCode, Json<ApiErrorResponse>)> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    raw.parse::<u8>()
        .map(Some)
        .map_err(|_| invalid_field("rating must be between 1 and 5"))
}

/// multipart 에러를 상태 코드에 맞게 변환합니다. 본문 크기 초과는 413.
fn multipart_error(e: MultipartError) -> (StatusCode, Json<ApiErrorResponse>) {
    let status = e.status();
    if status == StatusCode::PAYLOAD_TOO_LARGE {
        api_error(status, "PAYLOAD_TOO_LARGE", e.body_text())
    } else {
        api_error(StatusCode::BAD_REQUEST, "INVALID_MULTIPART", e.body_text())
    }
}

async fn field_text(field: Field<'_>) -> ApiResult<String> {
    field.text().await.map_err(multipart_error)
}

/// multipart 본문에서 도서 입력과 선택적 표지를 읽습니다.
///
/// 파일이 비어 있는 `cover` 파트는 표지 없음으로 취급합니다. 알 수 없는 필드는 무시합니다.
async fn read_book_form(mut multipart: Multipart) -> ApiResult<(BookInput, Option<CoverUpload>)> {
    let mut title = None;
    let mut author = None;
    let mut date = None;
    let mut collection = None;
    let mut rating = None;
    let mut cover = None;

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "title" => title = Some(field_text(field).await?),
            "author" => author = Some(field_text(field).await?),
            "date" => date = Some(field_text(field).await?),
            "collection" => collection = Some(field_text(field).await?),
            "rating" => rating = parse_rating(&field_text(field).await?)?,
            "cover" => {
                let original_name = field.file_name().unwrap_or_default().to_string();
                let content_type = field.content_type().map(str::to_string);
                let bytes = field.bytes().await.map_err(multipart_error)?;

                if bytes.is_empty() {
                    continue;
                }
                cover = Some(CoverUpload {
                    original_name,
                    content_type,
                    bytes: bytes.to_vec(),
                });
            }
            other => debug!(field = %other, "Ignoring unknown form field"),
        }
    }

    let date = date.ok_or_else(|| invalid_field("date is required"))?;
    let read_on = parse_read_on(&date)
        .ok_or_else(|| invalid_field(format!("invalid date: {}", date.trim())))?;
    let collection = collection
        .ok_or_else(|| invalid_field("collection is required"))?
        .parse::<Collection>()
        .map_err(invalid_field)?;

    let input = BookInput {
        title: title.unwrap_or_default(),
        author: author.unwrap_or_default(),
        read_on,
        collection,
        rating,
    };

    Ok((input, cover))
}

// ================================================================================================
// Handlers
// ================================================================================================

/// GET /api/v1/books - 도서 목록
#[utoipa::path(
    get,
    path = "/api/v1/books",
    params(ListQuery),
    responses(
        (status = 200, description = "도서 목록 (생성 순)", body = BookListResponse),
        (status = 401, description = "인증 실패", body = ApiErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "books"
)]
pub async fn list_books(
    State(state): State<Arc<AppState>>,
    AuthAccount(account): AuthAccount,
    Query(query): Query<ListQuery>,
) -> ApiResult<Json<BookListResponse>> {
    let books = state.books.list_books(account, query.collection).await?;
    let total = books.len();
    Ok(Json(BookListResponse { books, total }))
}

/// GET /api/v1/books/{id} - 도서 조회
#[utoipa::path(
    get,
    path = "/api/v1/books/{id}",
    params(("id" = Uuid, Path, description = "도서 ID")),
    responses(
        (status = 200, description = "도서", body = Book),
        (status = 404, description = "없거나 다른 계정의 도서", body = ApiErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "books"
)]
pub async fn get_book(
    State(state): State<Arc<AppState>>,
    AuthAccount(account): AuthAccount,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Book>> {
    let book = state.books.get_book(account, BookId(id)).await?;
    Ok(Json(book))
}

/// POST /api/v1/books - 도서 추가
#[utoipa::path(
    post,
    path = "/api/v1/books",
    request_body(content = BookForm, content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "도서 저장 (표지 결과 포함)", body = SavedBookResponse),
        (status = 400, description = "입력 검증 실패", body = ApiErrorResponse),
        (status = 413, description = "업로드 크기 초과", body = ApiErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "books"
)]
pub async fn add_book(
    State(state): State<Arc<AppState>>,
    AuthAccount(account): AuthAccount,
    multipart: Multipart,
) -> ApiResult<(StatusCode, Json<SavedBookResponse>)> {
    let (input, cover) = read_book_form(multipart).await?;
    let saved = state.books.add_book(account, input, cover).await?;

    if !saved.is_complete() {
        warn!(account_id = %account, book_id = %saved.record.id, "Book saved without cover");
    }

    Ok((StatusCode::CREATED, Json(saved.into())))
}

/// PUT /api/v1/books/{id} - 도서 수정
#[utoipa::path(
    put,
    path = "/api/v1/books/{id}",
    params(("id" = Uuid, Path, description = "도서 ID")),
    request_body(content = BookForm, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "도서 수정 (표지 결과 포함)", body = SavedBookResponse),
        (status = 400, description = "입력 검증 실패", body = ApiErrorResponse),
        (status = 413, description = "업로드 크기 초과", body = ApiErrorResponse),
        (status = 404, description = "없거나 다른 계정의 도서", body = ApiErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "books"
)]
pub async fn modify_book(
    State(state): State<Arc<AppState>>,
    AuthAccount(account): AuthAccount,
    Path(id): Path<Uuid>,
    multipart: Multipart,
) -> ApiResult<Json<SavedBookResponse>> {
    let (input, cover) = read_book_form(multipart).await?;
    let saved = state
        .books
        .modify_book(account, BookId(id), input, cover)
        .await?;

    Ok(Json(saved.into()))
}

/// DELETE /api/v1/books/{id} - 도서 삭제
#[utoipa::path(
    delete,
    path = "/api/v1/books/{id}",
    params(("id" = Uuid, Path, description = "도서 ID")),
    responses(
        (status = 200, description = "삭제됨", body = DeleteBookResponse),
        (status = 404, description = "없거나 다른 계정의 도서", body = ApiErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "books"
)]
pub async fn delete_book(
    State(state): State<Arc<AppState>>,
    AuthAccount(account): AuthAccount,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<DeleteBookResponse>> {
    let id = BookId(id);
    state.books.delete_book(account, id).await?;
    Ok(Json(DeleteBookResponse { id, deleted: true }))
}

/// 도서 라우터 생성.
pub fn books_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list_books).post(add_book))
        .route("/{id}", get(get_book).put(modify_book).delete(delete_book))
}
