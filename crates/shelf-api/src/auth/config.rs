//! 검증된 인증 설정.

use chrono::Duration;
use secrecy::{ExposeSecret, SecretString};
use shelf_core::{AuthSettings, ConfigError};

/// Argon2 비용 파라미터.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HashingCost {
    /// 메모리 비용 (KiB)
    pub memory_kib: u32,
    /// 반복 횟수
    pub iterations: u32,
    /// 병렬도
    pub parallelism: u32,
}

impl HashingCost {
    /// 운영 설정에서 허용하는 최소 메모리 비용 (KiB)
    pub const MIN_MEMORY_KIB: u32 = 19 * 1024;
    /// 운영 설정에서 허용하는 최소 반복 횟수
    pub const MIN_ITERATIONS: u32 = 2;

    pub fn new(memory_kib: u32, iterations: u32, parallelism: u32) -> Self {
        Self {
            memory_kib,
            iterations,
            parallelism,
        }
    }
}

impl Default for HashingCost {
    fn default() -> Self {
        Self::new(
            argon2::Params::DEFAULT_M_COST,
            argon2::Params::DEFAULT_T_COST,
            argon2::Params::DEFAULT_P_COST,
        )
    }
}

/// 세션 발급/검증과 비밀번호 해싱에 필요한 설정.
///
/// 서명 키는 프로세스 시작 시 한 번 읽고 이후 변경하지 않습니다.
#[derive(Debug)]
pub struct AuthConfig {
    secret: SecretString,
    /// 세션 토큰 유효 기간
    pub token_ttl: Duration,
    /// 해시 비용
    pub hashing: HashingCost,
}

impl AuthConfig {
    pub fn new(secret: impl Into<String>, token_ttl: Duration, hashing: HashingCost) -> Self {
        let secret: String = secret.into();
        Self {
            secret: SecretString::new(secret.into()),
            token_ttl,
            hashing,
        }
    }

    /// 원본 설정 값을 검증합니다.
    ///
    /// # Errors
    ///
    /// - 서명 키가 없거나 공백이면 `ConfigError::MissingSecret`
    /// - 유효 기간이 0 이하이면 `ConfigError::Invalid`
    /// - 해시 비용이 최소값(m=19456 KiB, t=2, p=1)보다 낮으면 `ConfigError::Invalid`
    pub fn from_settings(settings: &AuthSettings) -> Result<Self, ConfigError> {
        // 공백만 있는 키는 없는 것으로 보지만, 키 자체는 설정된 그대로 사용
        let secret = settings
            .app_secret
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .ok_or(ConfigError::MissingSecret)?;

        if settings.token_ttl_hours <= 0 {
            return Err(ConfigError::Invalid(format!(
                "auth.token_ttl_hours must be positive, got {}",
                settings.token_ttl_hours
            )));
        }

        let hashing = HashingCost::new(
            settings.hash_memory_kib,
            settings.hash_iterations,
            settings.hash_parallelism,
        );
        if hashing.memory_kib < HashingCost::MIN_MEMORY_KIB
            || hashing.iterations < HashingCost::MIN_ITERATIONS
            || hashing.parallelism == 0
        {
            return Err(ConfigError::Invalid(format!(
                "auth hashing cost too low (m={} KiB, t={}, p={}); minimum is m={} KiB, t={}, p=1",
                hashing.memory_kib,
                hashing.iterations,
                hashing.parallelism,
                HashingCost::MIN_MEMORY_KIB,
                HashingCost::MIN_ITERATIONS,
            )));
        }

        Ok(Self::new(
            secret,
            Duration::hours(settings.token_ttl_hours),
            hashing,
        ))
    }

    pub(crate) fn secret_bytes(&self) -> &[u8] {
        self.secret.expose_secret().as_bytes()
    }
}
