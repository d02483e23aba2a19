//! 도서 서비스.
//!
//! 모든 연산은 인증된 계정으로 범위가 제한됩니다. 다른 계정의 도서는
//! 없는 도서와 구분하지 않고 `BookError::NotOwned`로 거절합니다.

use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use shelf_core::{
    AccountId, AttachmentError, Book, BookChanges, BookId, BookStore, Collection, CoverOutcome,
    CoverStorage, CoverUpload, NewBook, Rating, Saved, StoreError,
};
use tracing::{debug, info, warn};
use validator::{Validate, ValidationErrors};

use crate::metrics::record_cover_upload;

/// 도서 서비스 에러.
#[derive(Debug, thiserror::Error)]
pub enum BookError {
    /// 없는 도서이거나 다른 계정의 도서
    #[error("Selected book does not belong to you")]
    NotOwned,

    #[error("유효하지 않은 입력: {0}")]
    Validation(#[from] ValidationErrors),

    #[error(transparent)]
    Store(#[from] StoreError),

    /// 표지 저장 실패를 에러로 취급한 경우 (`Saved::into_strict`)
    #[error(transparent)]
    Attachment(#[from] AttachmentError),
}

/// 도서 생성/수정 입력.
#[derive(Debug, Clone, Validate)]
pub struct BookInput {
    #[validate(length(min = 1, max = 255, message = "title must be 1-255 characters"))]
    pub title: String,
    #[validate(length(min = 1, max = 255, message = "author must be 1-255 characters"))]
    pub author: String,
    pub read_on: NaiveDate,
    pub collection: Collection,
    #[validate(range(min = 1, max = 5, message = "rating must be between 1 and 5"))]
    pub rating: Option<u8>,
}

impl BookInput {
    /// 검증 후 평점을 도메인 타입으로 변환합니다.
    fn validated(self) -> Result<ValidBook, BookError> {
        self.validate()?;
        let rating = self.rating.map(Rating::try_from).transpose().map_err(|_| {
            let mut errors = ValidationErrors::new();
            errors.add("rating", validator::ValidationError::new("range"));
            BookError::Validation(errors)
        })?;

        Ok(ValidBook {
            title: self.title,
            author: self.author,
            read_on: self.read_on,
            collection: self.collection,
            rating,
        })
    }
}

struct ValidBook {
    title: String,
    author: String,
    read_on: NaiveDate,
    collection: Collection,
    rating: Option<Rating>,
}

/// 도서 서비스.
#[derive(Clone)]
pub struct BookService {
    books: Arc<dyn BookStore>,
    covers: Arc<dyn CoverStorage>,
}

impl BookService {
    pub fn new(books: Arc<dyn BookStore>, covers: Arc<dyn CoverStorage>) -> Self {
        Self { books, covers }
    }

    /// 계정의 도서 목록 (생성 순).
    pub async fn list_books(
        &self,
        account: AccountId,
        collection: Option<Collection>,
    ) -> Result<Vec<Book>, BookError> {
        let books = self.books.list(account, collection).await?;
        debug!(account_id = %account, ?collection, count = books.len(), "Books listed");
        Ok(books)
    }

    pub async fn get_book(&self, account: AccountId, id: BookId) -> Result<Book, BookError> {
        self.books
            .find(account, id)
            .await?
            .ok_or(BookError::NotOwned)
    }

    /// 도서를 추가합니다.
    ///
    /// 표지 저장이 실패해도 기록은 표지 없이 저장되고, 실패는 결과에 담깁니다.
    pub async fn add_book(
        &self,
        account: AccountId,
        input: BookInput,
        cover: Option<CoverUpload>,
    ) -> Result<Saved<Book>, BookError> {
        let input = input.validated()?;
        let (cover_name, outcome) = self.store_cover(account, cover).await;

        let book = self
            .books
            .create(NewBook {
                account_id: account,
                title: input.title,
                author: input.author,
                read_on: input.read_on,
                collection: input.collection,
                rating: input.rating,
                cover: cover_name,
            })
            .await?;

        info!(account_id = %account, book_id = %book.id, "Book added");
        Ok(Saved::new(book, outcome))
    }

    /// 도서를 수정합니다.
    ///
    /// 새 표지가 없거나 저장에 실패하면 기존 표지를 유지합니다.
    pub async fn modify_book(
        &self,
        account: AccountId,
        id: BookId,
        input: BookInput,
        cover: Option<CoverUpload>,
    ) -> Result<Saved<Book>, BookError> {
        let input = input.validated()?;

        // 소유하지 않은 도서라면 파일을 쓰기 전에 거절
        if self.books.find(account, id).await?.is_none() {
            return Err(BookError::NotOwned);
        }

        let (cover_name, outcome) = self.store_cover(account, cover).await;

        let book = self
            .books
            .update(
                account,
                id,
                BookChanges {
                    title: input.title,
                    author: input.author,
                    read_on: input.read_on,
                    collection: input.collection,
                    rating: input.rating,
                    cover: cover_name,
                },
            )
            .await?
            .ok_or(BookError::NotOwned)?;

        info!(account_id = %account, book_id = %book.id, "Book modified");
        Ok(Saved::new(book, outcome))
    }

    pub async fn delete_book(&self, account: AccountId, id: BookId) -> Result<(), BookError> {
        if !self.books.delete(account, id).await? {
            return Err(BookError::NotOwned);
        }
        info!(account_id = %account, book_id = %id, "Book deleted");
        Ok(())
    }

    async fn store_cover(
        &self,
        account: AccountId,
        upload: Option<CoverUpload>,
    ) -> (Option<String>, CoverOutcome) {
        let Some(upload) = upload else {
            return (None, CoverOutcome::Unchanged);
        };

        let file_name = upload.stored_name(Utc::now().timestamp_millis());

        match self.covers.write(&file_name, &upload.bytes).await {
            Ok(()) => {
                record_cover_upload("stored");
                debug!(account_id = %account, file_name = %file_name, bytes = upload.bytes.len(), "Cover stored");
                (Some(file_name.clone()), CoverOutcome::Stored { file_name })
            }
            Err(e) => {
                record_cover_upload("failed");
                warn!(account_id = %account, file_name = %file_name, error = %e, "Cover write failed, saving book without it");
                (
                    None,
                    CoverOutcome::Failed {
                        file_name,
                        reason: e.to_string(),
                    },
                )
            }
        }
    }
}
