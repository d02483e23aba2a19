//! 도서 관리 서비스의 공통 에러 타입.
//!
//! 설정, 레코드 저장소, 파일 저장소 계층에서 발생하는 에러를 정의합니다.
//! 인증/도서 서비스 에러는 API 크레이트에서 이 타입들을 감싸서 사용합니다.

use thiserror::Error;

/// 설정 에러.
///
/// 모두 시작 시점에만 발생하며, 발생하면 서버는 요청을 받지 않고 종료해야 합니다.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 세션 토큰 서명 키 누락
    #[error("세션 서명 키가 설정되지 않았습니다 (APP_SECRET)")]
    MissingSecret,

    /// 설정 소스 로드/역직렬화 실패
    #[error("설정 로드 실패: {0}")]
    Load(#[from] config::ConfigError),

    /// 값은 있으나 사용할 수 없는 설정
    #[error("잘못된 설정: {0}")]
    Invalid(String),
}

/// 레코드 저장소 에러.
#[derive(Debug, Error)]
pub enum StoreError {
    /// 유일성 제약 위반 (예: 중복 핸들)
    #[error("중복 레코드: {0}")]
    Conflict(String),

    /// 쿼리 실행 또는 행 변환 실패
    #[error("데이터베이스 에러: {0}")]
    Database(String),

    /// 저장소에 연결할 수 없음
    #[error("저장소 사용 불가: {0}")]
    Unavailable(String),
}

impl StoreError {
    /// 재시도 가능한 에러인지 확인합니다.
    pub fn is_retryable(&self) -> bool {
        matches!(self, StoreError::Unavailable(_))
    }
}

/// 저장소 작업 Result 타입.
pub type StoreResult<T> = Result<T, StoreError>;

/// 표지 파일 저장 에러.
#[derive(Debug, Error)]
pub enum StorageError {
    /// 파일 시스템 에러
    #[error("파일 쓰기 실패: {0}")]
    Io(#[from] std::io::Error),

    /// 사용할 수 없는 파일 이름
    #[error("잘못된 파일 이름: {0}")]
    InvalidName(String),
}
