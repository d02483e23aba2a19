//! 도메인 서비스 모듈.
//!
//! 라우트 핸들러와 저장소 사이에서 소유권 확인, 입력 검증, 첨부 처리를 담당합니다.

pub mod books;

pub use books::{BookError, BookInput, BookService};
