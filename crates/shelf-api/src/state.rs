//! 모든 핸들러에서 공유되는 애플리케이션 상태.
//!
//! AppState는 `Arc`로 감싸 요청 간에 공유됩니다. 서비스는 내부에 저장소 포트를
//! `Arc<dyn ...>`로 들고 있으므로 저장소 구현과 무관하게 동작합니다.

use std::sync::Arc;

use shelf_core::{AccountStore, BookStore, CoverStorage};

use crate::auth::{AuthConfig, CredentialError, CredentialService};
use crate::repository::{InMemoryStore, PgAccountRepository, PgBookRepository};
use crate::services::BookService;

/// 애플리케이션 공유 상태.
#[derive(Clone)]
pub struct AppState {
    /// 자격 증명 및 세션 서비스
    pub credentials: CredentialService,

    /// 도서 서비스
    pub books: BookService,

    /// 데이터베이스 연결 풀 (PostgreSQL). 인메모리 모드에서는 None
    pub db_pool: Option<sqlx::PgPool>,

    /// 저장소 종류 ("postgres" | "memory")
    pub store_kind: &'static str,

    /// 서버 시작 시간 (업타임 계산용)
    pub started_at: chrono::DateTime<chrono::Utc>,

    /// API 버전
    pub version: String,
}

impl AppState {
    /// 서비스와 저장소 종류로 상태를 생성합니다.
    pub fn new(credentials: CredentialService, books: BookService, store_kind: &'static str) -> Self {
        Self {
            credentials,
            books,
            db_pool: None,
            store_kind,
            started_at: chrono::Utc::now(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    /// 저장소 포트들로 서비스를 조립합니다.
    pub fn from_stores(
        accounts: Arc<dyn AccountStore>,
        books: Arc<dyn BookStore>,
        covers: Arc<dyn CoverStorage>,
        auth: &AuthConfig,
        store_kind: &'static str,
    ) -> Result<Self, CredentialError> {
        let credentials = CredentialService::new(accounts, auth)?;
        Ok(Self::new(credentials, BookService::new(books, covers), store_kind))
    }

    /// 인메모리 저장소를 사용하는 상태.
    pub fn in_memory(
        auth: &AuthConfig,
        covers: Arc<dyn CoverStorage>,
    ) -> Result<Self, CredentialError> {
        let store = Arc::new(InMemoryStore::new());
        Self::from_stores(store.clone(), store, covers, auth, "memory")
    }

    /// PostgreSQL 저장소를 사용하는 상태.
    pub fn postgres(
        pool: sqlx::PgPool,
        auth: &AuthConfig,
        covers: Arc<dyn CoverStorage>,
    ) -> Result<Self, CredentialError> {
        let state = Self::from_stores(
            Arc::new(PgAccountRepository::new(pool.clone())),
            Arc::new(PgBookRepository::new(pool.clone())),
            covers,
            auth,
            "postgres",
        )?;
        Ok(state.with_db_pool(pool))
    }

    /// 데이터베이스 연결 설정.
    pub fn with_db_pool(mut self, pool: sqlx::PgPool) -> Self {
        self.db_pool = Some(pool);
        self
    }

    /// 서버 업타임 (초).
    pub fn uptime_secs(&self) -> i64 {
        chrono::Utc::now()
            .signed_duration_since(self.started_at)
            .num_seconds()
    }

    /// 데이터베이스 연결 상태 확인.
    pub async fn is_db_healthy(&self) -> bool {
        if let Some(pool) = &self.db_pool {
            sqlx::query("SELECT 1").fetch_one(pool).await.is_ok()
        } else {
            false
        }
    }
}

/// 테스트용 AppState 생성.
///
/// 인메모리 저장소, 임시 디렉토리 표지 저장소, 낮은 해시 비용을 사용합니다.
#[cfg(any(test, feature = "test-utils"))]
pub fn create_test_state() -> AppState {
    use crate::auth::HashingCost;
    use crate::storage::LocalCoverStorage;

    let auth = AuthConfig::new(
        "test-secret-key-for-session-tokens",
        chrono::Duration::hours(999),
        HashingCost::new(8, 1, 1),
    );
    let covers = LocalCoverStorage::new(std::env::temp_dir().join("shelf-api-test-uploads"));

    AppState::in_memory(&auth, Arc::new(covers)).expect("Failed to create test state")
}
