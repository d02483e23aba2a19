//! 계정 Repository (PostgreSQL).

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use shelf_core::{Account, AccountId, AccountStore, NewAccount, StoreResult};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use super::map_sqlx_error;

#[derive(Debug, FromRow)]
struct AccountRow {
    id: Uuid,
    handle: String,
    display_name: String,
    password_hash: String,
    created_at: DateTime<Utc>,
}

impl From<AccountRow> for Account {
    fn from(row: AccountRow) -> Self {
        Account {
            id: AccountId(row.id),
            handle: row.handle,
            display_name: row.display_name,
            password_hash: row.password_hash,
            created_at: row.created_at,
        }
    }
}

/// 계정 Repository.
#[derive(Clone)]
pub struct PgAccountRepository {
    pool: PgPool,
}

impl PgAccountRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AccountStore for PgAccountRepository {
    async fn find_by_handle(&self, handle: &str) -> StoreResult<Option<Account>> {
        let row = sqlx::query_as::<_, AccountRow>(
            r#"
            SELECT id, handle, display_name, password_hash, created_at
            FROM accounts
            WHERE handle = $1
            "#,
        )
        .bind(handle)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.map(Account::from))
    }

    async fn find_by_id(&self, id: AccountId) -> StoreResult<Option<Account>> {
        let row = sqlx::query_as::<_, AccountRow>(
            r#"
            SELECT id, handle, display_name, password_hash, created_at
            FROM accounts
            WHERE id = $1
            "#,
        )
        .bind(id.0)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.map(Account::from))
    }

    async fn create(&self, account: NewAccount) -> StoreResult<Account> {
        let row = sqlx::query_as::<_, AccountRow>(
            r#"
            INSERT INTO accounts (id, handle, display_name, password_hash)
            VALUES ($1, $2, $3, $4)
            RETURNING id, handle, display_name, password_hash, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&account.handle)
        .bind(&account.display_name)
        .bind(&account.password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.into())
    }
}
