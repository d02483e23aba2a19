//! 표지 이미지 첨부.
//!
//! 도서 기록과 표지 파일 저장은 별개의 작업입니다. 파일 쓰기가 실패해도
//! 기록은 저장되며, 그 결과는 [`CoverOutcome`]으로 호출자에게 전달됩니다.

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::StorageError;

/// 저장 파일 이름 최대 길이 (타임스탬프 접두사 제외).
const MAX_NAME_LEN: usize = 128;

/// 표지 파일 저장소.
#[async_trait]
pub trait CoverStorage: Send + Sync {
    /// `file_name`으로 바이트를 저장합니다. 같은 이름이 있으면 덮어씁니다.
    async fn write(&self, file_name: &str, bytes: &[u8]) -> Result<(), StorageError>;
}

/// 업로드된 표지 파일.
#[derive(Clone)]
pub struct CoverUpload {
    /// 클라이언트가 보낸 원본 파일 이름
    pub original_name: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl fmt::Debug for CoverUpload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CoverUpload")
            .field("original_name", &self.original_name)
            .field("content_type", &self.content_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}

impl CoverUpload {
    /// `<unix-millis>_<정리된 원본 이름>` 형식의 저장 이름.
    pub fn stored_name(&self, unix_millis: i64) -> String {
        format!("{}_{}", unix_millis, sanitize_file_name(&self.original_name))
    }
}

/// 클라이언트 파일 이름을 저장 가능한 이름으로 정리합니다.
///
/// 마지막 경로 요소만 남기고 `[A-Za-z0-9._-]` 이외의 문자는 `_`로 바꿉니다.
/// 비어 있거나 점으로만 이루어진 이름은 `cover`가 됩니다.
pub fn sanitize_file_name(name: &str) -> String {
    let last = name.rsplit(['/', '\\']).next().unwrap_or_default();

    let cleaned: String = last
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .take(MAX_NAME_LEN)
        .collect();

    if cleaned.chars().all(|c| c == '.') {
        "cover".to_string()
    } else {
        cleaned
    }
}

// =============================================================================
// 저장 결과
// =============================================================================

/// 표지 첨부 결과.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa-support", derive(utoipa::ToSchema))]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CoverOutcome {
    /// 업로드 없음. 기존 표지 유지
    Unchanged,
    /// 저장 성공
    Stored { file_name: String },
    /// 저장 실패. 기록은 표지 없이(또는 기존 표지로) 저장됨
    Failed { file_name: String, reason: String },
}

impl CoverOutcome {
    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }
}

/// 첨부 실패를 에러로 취급할 때 사용하는 타입.
#[derive(Debug, Clone, Error)]
#[error("표지 파일 저장 실패 ({file_name}): {reason}")]
pub struct AttachmentError {
    pub file_name: String,
    pub reason: String,
}

/// 기록 저장 결과와 첨부 결과.
#[derive(Debug, Clone)]
pub struct Saved<T> {
    pub record: T,
    pub cover: CoverOutcome,
}

impl<T> Saved<T> {
    pub fn new(record: T, cover: CoverOutcome) -> Self {
        Self { record, cover }
    }

    /// 첨부까지 모두 성공(또는 첨부 없음)했는지.
    pub fn is_complete(&self) -> bool {
        !self.cover.is_failed()
    }

    /// 사용자에게 보여줄 경고 메시지.
    pub fn warnings(&self) -> Vec<String> {
        match &self.cover {
            CoverOutcome::Failed { file_name, reason } => vec![format!(
                "Book was saved, but the cover image '{}' could not be stored: {}",
                file_name, reason
            )],
            _ => Vec::new(),
        }
    }

    /// 첨부 실패를 에러로 바꿉니다. 기록 자체는 이미 저장된 상태입니다.
    pub fn into_strict(self) -> Result<T, AttachmentError> {
        match self.cover {
            CoverOutcome::Failed { file_name, reason } => {
                Err(AttachmentError { file_name, reason })
            }
            _ => Ok(self.record),
        }
    }
}
