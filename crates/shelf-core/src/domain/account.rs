//! 계정 도메인 모델.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 계정 식별자.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa-support", derive(utoipa::ToSchema))]
#[serde(transparent)]
pub struct AccountId(pub Uuid);

impl AccountId {
    /// 새 식별자를 생성합니다.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for AccountId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for AccountId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

impl From<Uuid> for AccountId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

/// 저장된 계정.
///
/// `handle`은 대소문자를 구분하며 전체 계정 중 유일합니다.
/// 비밀번호는 PHC 형식 해시로만 보관합니다.
#[derive(Clone, PartialEq, Eq)]
pub struct Account {
    pub id: AccountId,
    /// 로그인 핸들 (username)
    pub handle: String,
    /// 표시 이름
    pub display_name: String,
    /// Argon2id PHC 해시
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

impl fmt::Debug for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Account")
            .field("id", &self.id)
            .field("handle", &self.handle)
            .field("display_name", &self.display_name)
            .field("password_hash", &"[REDACTED]")
            .field("created_at", &self.created_at)
            .finish()
    }
}

impl Account {
    /// 외부에 노출 가능한 공개 정보.
    pub fn view(&self) -> AccountView {
        AccountView {
            user_id: self.id,
            username: self.handle.clone(),
            name: self.display_name.clone(),
        }
    }
}

/// 계정의 공개 투영. 해시는 포함하지 않습니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa-support", derive(utoipa::ToSchema))]
pub struct AccountView {
    pub user_id: AccountId,
    pub username: String,
    pub name: String,
}

/// 계정 생성 요청 (저장소 입력).
#[derive(Clone)]
pub struct NewAccount {
    pub handle: String,
    pub display_name: String,
    pub password_hash: String,
}

impl fmt::Debug for NewAccount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NewAccount")
            .field("handle", &self.handle)
            .field("display_name", &self.display_name)
            .finish_non_exhaustive()
    }
}
