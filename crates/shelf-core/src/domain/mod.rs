//! 도서 관리 서비스의 도메인 모델.

mod account;
mod book;
mod cover;
mod store;

pub use account::*;
pub use book::*;
pub use cover::*;
pub use store::*;
