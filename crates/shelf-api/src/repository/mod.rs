//! 레코드 저장소 구현.
//!
//! - [`PgAccountRepository`], [`PgBookRepository`]: PostgreSQL (sqlx)
//! - [`InMemoryStore`]: `DATABASE_URL`이 없을 때와 테스트에서 사용

pub mod accounts;
pub mod books;
pub mod memory;

pub use accounts::PgAccountRepository;
pub use books::PgBookRepository;
pub use memory::InMemoryStore;

use shelf_core::StoreError;

/// sqlx 에러를 저장소 에러로 변환합니다.
pub(crate) fn map_sqlx_error(e: sqlx::Error) -> StoreError {
    if let Some(db_err) = e.as_database_error() {
        if db_err.is_unique_violation() {
            return StoreError::Conflict(db_err.message().to_string());
        }
    }

    match e {
        sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
            StoreError::Unavailable(e.to_string())
        }
        other => StoreError::Database(other.to_string()),
    }
}

/// 데이터베이스 마이그레이션을 실행합니다.
pub async fn run_migrations(pool: &sqlx::PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}
