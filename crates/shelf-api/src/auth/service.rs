//! 자격 증명 및 세션 서비스.
//!
//! 계정 등록, 비밀번호 인증, 세션 발급/검증을 담당합니다.
//! 평문 비밀번호는 `SecretString`으로만 전달되며 저장하거나 로그에 남기지 않습니다.

use std::sync::Arc;

use secrecy::{ExposeSecret, SecretString};
use shelf_core::{Account, AccountId, AccountStore, NewAccount, StoreError};
use tracing::{debug, info, warn};

use super::{
    AuthConfig, CredentialHasher, JwtError, PasswordError, SessionKeys, SessionToken,
};
use crate::metrics::record_auth_event;

/// 계정이 없을 때 검증에 사용하는 더미 비밀번호.
const DUMMY_PASSWORD: &str = "shelf-timing-equalization";

/// 인증 서비스 에러.
///
/// `Hashing`, `Issuance`, `Store`를 제외한 변형은 재시도해도 결과가 같은 최종 거절입니다.
#[derive(Debug, thiserror::Error)]
pub enum CredentialError {
    #[error("Username already exists, choose a new one: {0}")]
    DuplicateHandle(String),

    #[error("Username not found: {0}")]
    NotFound(String),

    #[error("Invalid password")]
    InvalidCredential,

    #[error("Invalid or expired session token")]
    InvalidToken,

    #[error("비밀번호 해싱 실패: {0}")]
    Hashing(String),

    #[error("세션 토큰 발급 실패: {0}")]
    Issuance(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<PasswordError> for CredentialError {
    fn from(e: PasswordError) -> Self {
        CredentialError::Hashing(e.to_string())
    }
}

/// 가입/로그인 결과.
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub session: SessionToken,
    pub account: Account,
}

/// 자격 증명 및 세션 서비스.
#[derive(Clone)]
pub struct CredentialService {
    accounts: Arc<dyn AccountStore>,
    hasher: CredentialHasher,
    keys: Arc<SessionKeys>,
    dummy_hash: Arc<str>,
}

impl CredentialService {
    /// 서비스를 생성합니다.
    ///
    /// 계정이 없는 경우의 검증 시간을 맞추기 위한 더미 해시를 여기서 한 번 계산합니다.
    pub fn new(accounts: Arc<dyn AccountStore>, config: &AuthConfig) -> Result<Self, CredentialError> {
        let hasher = CredentialHasher::new(config.hashing)?;
        let dummy_hash = hasher.hash(DUMMY_PASSWORD)?;

        Ok(Self {
            accounts,
            hasher,
            keys: Arc::new(SessionKeys::new(config)),
            dummy_hash: dummy_hash.into(),
        })
    }

    // ==================== 핵심 연산 ====================

    /// 새 계정을 등록합니다.
    ///
    /// # Errors
    ///
    /// 같은 핸들이 이미 있으면 `DuplicateHandle`.
    pub async fn register(
        &self,
        handle: &str,
        display_name: &str,
        secret: &SecretString,
    ) -> Result<Account, CredentialError> {
        if self.accounts.find_by_handle(handle).await?.is_some() {
            debug!(handle, "Registration rejected: handle taken");
            return Err(CredentialError::DuplicateHandle(handle.to_string()));
        }

        let password_hash = self.hash_blocking(secret).await?;

        let account = self
            .accounts
            .create(NewAccount {
                handle: handle.to_string(),
                display_name: display_name.to_string(),
                password_hash,
            })
            .await
            .map_err(|e| match e {
                // 조회와 생성 사이에 다른 요청이 같은 핸들을 선점한 경우
                StoreError::Conflict(_) => CredentialError::DuplicateHandle(handle.to_string()),
                other => CredentialError::Store(other),
            })?;

        info!(account_id = %account.id, handle = %account.handle, "Account registered");
        Ok(account)
    }

    /// 핸들과 비밀번호로 계정을 인증합니다.
    ///
    /// # Errors
    ///
    /// - 계정이 없으면 `NotFound`
    /// - 비밀번호가 틀리면 `InvalidCredential`
    pub async fn authenticate(
        &self,
        handle: &str,
        secret: &SecretString,
    ) -> Result<Account, CredentialError> {
        let Some(account) = self.accounts.find_by_handle(handle).await? else {
            // 존재 여부에 따른 응답 시간 차이를 줄이기 위해 더미 해시를 검증
            let _ = self.verify_blocking(secret, self.dummy_hash.clone()).await;
            debug!(handle, "Authentication failed: unknown handle");
            return Err(CredentialError::NotFound(handle.to_string()));
        };

        if !self
            .verify_blocking(secret, account.password_hash.as_str().into())
            .await?
        {
            warn!(account_id = %account.id, "Authentication failed: wrong password");
            return Err(CredentialError::InvalidCredential);
        }

        debug!(account_id = %account.id, "Account authenticated");
        Ok(account)
    }

    /// 계정에 대한 세션 토큰을 발급합니다.
    pub fn issue_session(&self, account: &Account) -> Result<SessionToken, CredentialError> {
        self.keys.issue(account.id).map_err(|e| {
            warn!(account_id = %account.id, error = %e, "Session issuance failed");
            CredentialError::Issuance(e.to_string())
        })
    }

    /// 세션 토큰을 검증하고 계정 ID를 반환합니다.
    ///
    /// # Errors
    ///
    /// 서명 불일치, 형식 오류, 만료 모두 `InvalidToken`.
    pub fn verify_session(&self, token: &str) -> Result<AccountId, CredentialError> {
        match self.keys.verify(token) {
            Ok(claims) => Ok(claims.sub),
            Err(JwtError::Expired) => {
                debug!("Session token expired");
                Err(CredentialError::InvalidToken)
            }
            Err(e) => {
                debug!(error = %e, "Session token rejected");
                Err(CredentialError::InvalidToken)
            }
        }
    }

    // ==================== 편의 연산 ====================

    /// 등록 후 세션 발급.
    pub async fn signup(
        &self,
        handle: &str,
        display_name: &str,
        secret: &SecretString,
    ) -> Result<AuthSession, CredentialError> {
        let result: Result<AuthSession, CredentialError> = async {
            let account = self.register(handle, display_name, secret).await?;
            let session = self.issue_session(&account)?;
            Ok(AuthSession { session, account })
        }
        .await;

        record_auth_event("signup", outcome_label(&result));
        result
    }

    /// 인증 후 세션 발급.
    pub async fn login(
        &self,
        handle: &str,
        secret: &SecretString,
    ) -> Result<AuthSession, CredentialError> {
        let result: Result<AuthSession, CredentialError> = async {
            let account = self.authenticate(handle, secret).await?;
            let session = self.issue_session(&account)?;
            Ok(AuthSession { session, account })
        }
        .await;

        record_auth_event("login", outcome_label(&result));
        result
    }

    /// 세션의 계정을 조회합니다.
    pub async fn current_account(&self, id: AccountId) -> Result<Account, CredentialError> {
        self.accounts
            .find_by_id(id)
            .await?
            .ok_or_else(|| CredentialError::NotFound(id.to_string()))
    }

    // ==================== 해싱 (blocking pool) ====================

    async fn hash_blocking(&self, secret: &SecretString) -> Result<String, CredentialError> {
        let hasher = self.hasher.clone();
        let secret = SecretString::new(secret.expose_secret().into());

        tokio::task::spawn_blocking(move || hasher.hash(secret.expose_secret()))
            .await
            .map_err(|e| CredentialError::Hashing(e.to_string()))?
            .map_err(CredentialError::from)
    }

    async fn verify_blocking(
        &self,
        secret: &SecretString,
        hash: Arc<str>,
    ) -> Result<bool, CredentialError> {
        let hasher = self.hasher.clone();
        let secret = SecretString::new(secret.expose_secret().into());

        tokio::task::spawn_blocking(move || hasher.verify(secret.expose_secret(), &hash))
            .await
            .map_err(|e| CredentialError::Hashing(e.to_string()))?
            .map_err(CredentialError::from)
    }
}

fn outcome_label<T>(result: &Result<T, CredentialError>) -> &'static str {
    match result {
        Ok(_) => "success",
        Err(CredentialError::DuplicateHandle(_)) => "duplicate_handle",
        Err(CredentialError::NotFound(_)) => "not_found",
        Err(CredentialError::InvalidCredential) => "invalid_credential",
        Err(CredentialError::InvalidToken) => "invalid_token",
        Err(
            CredentialError::Hashing(_)
            | CredentialError::Issuance(_)
            | CredentialError::Store(_),
        ) => "error",
    }
}
