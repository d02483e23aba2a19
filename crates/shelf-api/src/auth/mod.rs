//! 인증.
//!
//! 비밀번호 기반 자격 증명과 HS256 세션 토큰을 제공합니다.
//!
//! # 구성 요소
//!
//! - [`AuthConfig`]: 서명 키, 토큰 유효 기간, 해시 비용
//! - [`CredentialService`]: 등록 / 인증 / 세션 발급 / 세션 검증
//! - [`AuthAccount`]: 보호된 핸들러용 추출기

mod config;
mod jwt;
mod middleware;
mod password;
mod service;

pub use config::{AuthConfig, HashingCost};
pub use jwt::{JwtError, SessionClaims, SessionKeys, SessionToken};
pub use middleware::{AuthAccount, AuthRejection};
pub use password::{CredentialHasher, PasswordError};
pub use service::{AuthSession, CredentialError, CredentialService};
