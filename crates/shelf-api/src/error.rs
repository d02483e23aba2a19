//! 통합 API 에러 응답 타입.
//!
//! 모든 엔드포인트는 같은 형식의 에러 본문을 반환합니다.
//! 서비스 계층 에러(`CredentialError`, `BookError`)는 `From` 구현을 통해
//! `(StatusCode, Json<ApiErrorResponse>)`로 변환되므로 핸들러에서 `?`를 그대로 쓸 수 있습니다.

use axum::{http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;
use validator::ValidationErrors;

/// 통합 API 에러 응답.
///
/// # 예시
///
/// ```json
/// {
///   "code": "DUPLICATE_HANDLE",
///   "message": "Username already exists, choose a new one: alice",
///   "timestamp": 1738300800
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ApiErrorResponse {
    /// 에러 코드 (예: "INVALID_TOKEN", "BOOK_NOT_FOUND")
    pub code: String,
    /// 사람이 읽을 수 있는 에러 메시지
    pub message: String,
    /// 추가 에러 상세 정보 (선택적)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
    /// 에러 발생 타임스탬프 (Unix timestamp, 선택적)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,
}

impl ApiErrorResponse {
    /// 기본 에러 생성 (타임스탬프 포함).
    ///
    /// ```
    /// use shelf_api::error::ApiErrorResponse;
    ///
    /// let error = ApiErrorResponse::new("BOOK_NOT_FOUND", "Selected book does not belong to you");
    /// assert_eq!(error.code(), "BOOK_NOT_FOUND");
    /// ```
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
            timestamp: Some(chrono::Utc::now().timestamp()),
        }
    }

    /// 상세 정보 포함 에러 생성.
    pub fn with_details(
        code: impl Into<String>,
        message: impl Into<String>,
        details: Value,
    ) -> Self {
        Self {
            details: Some(details),
            ..Self::new(code, message)
        }
    }

    /// validator 검증 실패를 `VALIDATION_ERROR`로 변환합니다.
    ///
    /// 필드별 메시지는 `details`에 담깁니다.
    pub fn from_validation(errors: &ValidationErrors) -> Self {
        let mut fields = serde_json::Map::new();
        let mut messages = Vec::new();

        for (field, errs) in errors.field_errors() {
            let field_messages: Vec<String> = errs
                .iter()
                .map(|e| {
                    e.message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| format!("{}: 유효하지 않은 값", field))
                })
                .collect();
            messages.extend(field_messages.iter().cloned());
            fields.insert(field.to_string(), Value::from(field_messages));
        }

        messages.sort();
        Self::with_details("VALIDATION_ERROR", messages.join("; "), Value::Object(fields))
    }

    /// 에러 코드 반환.
    pub fn code(&self) -> &str {
        &self.code
    }

    /// 에러 메시지 반환.
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl std::fmt::Display for ApiErrorResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl std::error::Error for ApiErrorResponse {}

/// 상태 코드와 에러 본문을 묶어 핸들러 에러로 만듭니다.
pub fn api_error(
    status: StatusCode,
    code: &str,
    message: impl Into<String>,
) -> (StatusCode, Json<ApiErrorResponse>) {
    (status, Json(ApiErrorResponse::new(code, message)))
}

/// API 핸들러 Result 타입 별칭.
///
/// # Example
///
/// ```ignore
/// async fn get_book(
///     AuthAccount(account): AuthAccount,
///     Path(id): Path<BookId>,
///     State(state): State<Arc<AppState>>,
/// ) -> ApiResult<Json<Book>> {
///     let book = state.books.get_book(account, id).await?;
///     Ok(Json(book))
/// }
/// ```
pub type ApiResult<T> = Result<T, (StatusCode, Json<ApiErrorResponse>)>;
