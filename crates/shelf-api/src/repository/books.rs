//! 도서 Repository (PostgreSQL).

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use shelf_core::{
    AccountId, Book, BookChanges, BookId, BookStore, Collection, NewBook, Rating, StoreError,
    StoreResult,
};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use super::map_sqlx_error;

const BOOK_COLUMNS: &str =
    "id, account_id, title, author, read_on, collection, rating, cover, created_at, updated_at";

#[derive(Debug, FromRow)]
struct BookRow {
    id: Uuid,
    account_id: Uuid,
    title: String,
    author: String,
    read_on: NaiveDate,
    collection: String,
    #[sqlx(default)]
    rating: Option<i16>,
    #[sqlx(default)]
    cover: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<BookRow> for Book {
    type Error = StoreError;

    fn try_from(row: BookRow) -> Result<Self, Self::Error> {
        let collection: Collection = row.collection.parse().map_err(StoreError::Database)?;
        let rating = row
            .rating
            .map(|r| {
                u8::try_from(r)
                    .map_err(|e| e.to_string())
                    .and_then(Rating::try_from)
            })
            .transpose()
            .map_err(StoreError::Database)?;

        Ok(Book {
            id: BookId(row.id),
            account_id: AccountId(row.account_id),
            title: row.title,
            author: row.author,
            read_on: row.read_on,
            collection,
            rating,
            cover: row.cover,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

fn rating_column(rating: Option<Rating>) -> Option<i16> {
    rating.map(|r| i16::from(r.value()))
}

/// 도서 Repository.
#[derive(Clone)]
pub struct PgBookRepository {
    pool: PgPool,
}

impl PgBookRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BookStore for PgBookRepository {
    async fn list(
        &self,
        account: AccountId,
        collection: Option<Collection>,
    ) -> StoreResult<Vec<Book>> {
        let rows = sqlx::query_as::<_, BookRow>(&format!(
            r#"
            SELECT {BOOK_COLUMNS}
            FROM books
            WHERE account_id = $1
              AND ($2::text IS NULL OR collection = $2)
            ORDER BY created_at, id
            "#
        ))
        .bind(account.0)
        .bind(collection.map(|c| c.as_str()))
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        rows.into_iter().map(Book::try_from).collect()
    }

    async fn find(&self, account: AccountId, id: BookId) -> StoreResult<Option<Book>> {
        let row = sqlx::query_as::<_, BookRow>(&format!(
            r#"
            SELECT {BOOK_COLUMNS}
            FROM books
            WHERE id = $1 AND account_id = $2
            "#
        ))
        .bind(id.0)
        .bind(account.0)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        row.map(Book::try_from).transpose()
    }

    async fn create(&self, book: NewBook) -> StoreResult<Book> {
        let row = sqlx::query_as::<_, BookRow>(&format!(
            r#"
            INSERT INTO books (id, account_id, title, author, read_on, collection, rating, cover)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {BOOK_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(book.account_id.0)
        .bind(&book.title)
        .bind(&book.author)
        .bind(book.read_on)
        .bind(book.collection.as_str())
        .bind(rating_column(book.rating))
        .bind(&book.cover)
        .fetch_one(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Book::try_from(row)
    }

    async fn update(
        &self,
        account: AccountId,
        id: BookId,
        changes: BookChanges,
    ) -> StoreResult<Option<Book>> {
        // cover가 NULL이면 기존 값을 유지
        let row = sqlx::query_as::<_, BookRow>(&format!(
            r#"
            UPDATE books
            SET title = $3,
                author = $4,
                read_on = $5,
                collection = $6,
                rating = $7,
                cover = COALESCE($8, cover),
                updated_at = NOW()
            WHERE id = $1 AND account_id = $2
            RETURNING {BOOK_COLUMNS}
            "#
        ))
        .bind(id.0)
        .bind(account.0)
        .bind(&changes.title)
        .bind(&changes.author)
        .bind(changes.read_on)
        .bind(changes.collection.as_str())
        .bind(rating_column(changes.rating))
        .bind(&changes.cover)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        row.map(Book::try_from).transpose()
    }

    async fn delete(&self, account: AccountId, id: BookId) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM books WHERE id = $1 AND account_id = $2")
            .bind(id.0)
            .bind(account.0)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        Ok(result.rows_affected() > 0)
    }
}
