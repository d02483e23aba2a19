//! # Shelf Core
//!
//! 도서 관리 서비스의 핵심 도메인 모델과 저장소 포트를 제공합니다.
//!
//! 이 크레이트는 API 서버와 저장소 구현체가 공유하는 기본 타입을 담습니다:
//! - 계정 및 도서 도메인 모델
//! - 레코드 저장소 / 표지 저장소 trait
//! - 첨부 파일 저장 결과 타입
//! - 설정 관리
//! - 로깅 인프라

pub mod config;
pub mod domain;
pub mod error;
pub mod logging;

pub use self::config::*;
pub use domain::*;
pub use error::*;
pub use logging::*;
