//! 레코드 저장소 추상화.
//!
//! 계정과 도서 기록을 영속화하는 포트를 정의합니다.
//! PostgreSQL 구현과 인메모리 구현은 API 크레이트에 있습니다.

use async_trait::async_trait;

use super::{Account, AccountId, Book, BookChanges, BookId, Collection, NewAccount, NewBook};
use crate::error::StoreResult;

// =============================================================================
// AccountStore Trait
// =============================================================================

/// 계정 저장소.
///
/// 핸들 유일성은 저장소가 보장합니다. 같은 핸들로 두 번 생성하면
/// 두 번째 호출은 `StoreError::Conflict`를 반환해야 합니다.
#[async_trait]
pub trait AccountStore: Send + Sync {
    /// 핸들로 계정을 조회합니다 (대소문자 구분).
    async fn find_by_handle(&self, handle: &str) -> StoreResult<Option<Account>>;

    /// ID로 계정을 조회합니다.
    async fn find_by_id(&self, id: AccountId) -> StoreResult<Option<Account>>;

    /// 계정을 생성합니다.
    ///
    /// # Errors
    ///
    /// 핸들이 이미 존재하면 `StoreError::Conflict`.
    async fn create(&self, account: NewAccount) -> StoreResult<Account>;
}

// =============================================================================
// BookStore Trait
// =============================================================================

/// 도서 저장소.
///
/// 모든 조회/수정은 소유 계정으로 범위가 제한됩니다. 다른 계정의 도서는
/// 존재하지 않는 것과 동일하게 취급합니다.
#[async_trait]
pub trait BookStore: Send + Sync {
    /// 계정의 도서 목록 (생성 시각 오름차순).
    async fn list(
        &self,
        account: AccountId,
        collection: Option<Collection>,
    ) -> StoreResult<Vec<Book>>;

    async fn find(&self, account: AccountId, id: BookId) -> StoreResult<Option<Book>>;

    async fn create(&self, book: NewBook) -> StoreResult<Book>;

    /// 도서를 수정합니다. 소유한 도서가 아니면 `None`.
    async fn update(
        &self,
        account: AccountId,
        id: BookId,
        changes: BookChanges,
    ) -> StoreResult<Option<Book>>;

    /// 도서를 삭제합니다. 삭제된 행이 있으면 `true`.
    async fn delete(&self, account: AccountId, id: BookId) -> StoreResult<bool>;
}
