//! 설정 관리.
//!
//! 기본값 → `config/default.toml`(선택) → 환경 변수 순서로 설정을 합성합니다.
//! 환경 변수는 `SHELF` 접두사와 `__` 구분자를 사용합니다 (예: `SHELF__SERVER__PORT`).
//! 서명 키(`APP_SECRET`)와 `DATABASE_URL`은 관례적인 이름으로도 읽습니다.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::ConfigError;

/// 애플리케이션 설정.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// 서버 설정
    pub server: ServerConfig,
    /// 데이터베이스 설정
    pub database: DatabaseConfig,
    /// 로깅 설정
    pub logging: LoggingConfig,
    /// 인증 설정
    pub auth: AuthSettings,
    /// 표지 파일 저장 설정
    pub storage: StorageConfig,
}

/// 서버 설정.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// 바인딩할 호스트
    pub host: String,
    /// 리스닝할 포트
    pub port: u16,
    /// 요청 타임아웃 (초)
    pub request_timeout_secs: u64,
    /// 허용 CORS origin 목록 (쉼표 구분). 없으면 모든 origin 허용
    pub cors_origins: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 4000,
            request_timeout_secs: 30,
            cors_origins: None,
        }
    }
}

impl ServerConfig {
    /// `host:port` 형식의 바인딩 주소.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// 파싱된 CORS origin 목록. 빈 항목은 제외합니다.
    pub fn cors_origin_list(&self) -> Vec<String> {
        self.cors_origins
            .as_deref()
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect()
    }
}

/// 데이터베이스 설정.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// PostgreSQL 연결 URL. 없으면 인메모리 저장소를 사용합니다
    pub url: Option<String>,
    /// 최대 연결 수
    pub max_connections: u32,
    /// 연결 획득 타임아웃 (초)
    pub acquire_timeout_secs: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: None,
            max_connections: 10,
            acquire_timeout_secs: 10,
        }
    }
}

/// 로깅 설정.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// 로그 레벨 필터
    pub level: String,
    /// 로그 형식 (pretty, json, compact)
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "shelf_api=info,shelf_core=info,tower_http=info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

/// 인증 설정 (검증 전 원본 값).
///
/// 서명 키 존재 여부는 여기서 검사하지 않습니다. API 크레이트의 `AuthConfig`가
/// 이 값을 검증하며, 키가 없으면 시작이 중단됩니다.
#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct AuthSettings {
    /// 세션 토큰 서명 키
    pub app_secret: Option<String>,
    /// 세션 토큰 유효 기간 (시간)
    pub token_ttl_hours: i64,
    /// Argon2 메모리 비용 (KiB)
    pub hash_memory_kib: u32,
    /// Argon2 반복 횟수
    pub hash_iterations: u32,
    /// Argon2 병렬도
    pub hash_parallelism: u32,
}

impl std::fmt::Debug for AuthSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthSettings")
            .field("app_secret", &self.app_secret.as_ref().map(|_| "[REDACTED]"))
            .field("token_ttl_hours", &self.token_ttl_hours)
            .field("hash_memory_kib", &self.hash_memory_kib)
            .field("hash_iterations", &self.hash_iterations)
            .field("hash_parallelism", &self.hash_parallelism)
            .finish()
    }
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self {
            app_secret: None,
            token_ttl_hours: 999,
            hash_memory_kib: 19 * 1024,
            hash_iterations: 2,
            hash_parallelism: 1,
        }
    }
}

/// 표지 파일 저장 설정.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// 업로드 파일을 저장할 디렉토리
    pub upload_dir: PathBuf,
    /// 업로드 파일을 제공할 URL 경로
    pub public_path: String,
    /// 최대 업로드 크기 (바이트)
    pub max_upload_bytes: usize,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            upload_dir: PathBuf::from("public/uploads"),
            public_path: "/uploads".to_string(),
            max_upload_bytes: 10 * 1024 * 1024,
        }
    }
}

impl AppConfig {
    /// 파일과 환경 변수에서 설정을 로드합니다.
    ///
    /// 파일이 없어도 에러가 아닙니다. `APP_SECRET`, `DATABASE_URL`, `CORS_ORIGINS`가
    /// 설정되어 있으면 접두사 환경 변수보다 우선합니다.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let builder = config::Config::builder()
            .add_source(config::File::from(path.as_ref()).required(false))
            .add_source(
                config::Environment::with_prefix("SHELF")
                    .separator("__")
                    .try_parsing(true),
            )
            .set_override_option("auth.app_secret", std::env::var("APP_SECRET").ok())?
            .set_override_option("database.url", std::env::var("DATABASE_URL").ok())?
            .set_override_option("server.cors_origins", std::env::var("CORS_ORIGINS").ok())?;

        let config = builder.build()?;
        Ok(config.try_deserialize()?)
    }

    /// 기본 경로에서 설정을 로드합니다.
    pub fn load_default() -> Result<Self, ConfigError> {
        Self::load("config/default.toml")
    }
}
