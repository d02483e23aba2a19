//! 도서 도메인 모델.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::AccountId;

/// 도서 식별자.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa-support", derive(utoipa::ToSchema))]
#[serde(transparent)]
pub struct BookId(pub Uuid);

impl BookId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for BookId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for BookId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for BookId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

// ==================== 컬렉션 ====================

/// 도서가 속한 컬렉션.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa-support", derive(utoipa::ToSchema))]
#[serde(rename_all = "kebab-case")]
pub enum Collection {
    /// 읽고 싶은 책
    WantToRead,
    /// 읽는 중
    Reading,
    /// 다 읽은 책
    Read,
}

impl Collection {
    pub const ALL: [Collection; 3] = [Self::WantToRead, Self::Reading, Self::Read];

    /// 와이어/DB 표현.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::WantToRead => "want-to-read",
            Self::Reading => "reading",
            Self::Read => "read",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Collection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "want-to-read" => Ok(Self::WantToRead),
            "reading" => Ok(Self::Reading),
            "read" => Ok(Self::Read),
            other => Err(format!("Unknown collection: {}", other)),
        }
    }
}

// ==================== 평점 ====================

/// 1~5 사이의 평점.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa-support", derive(utoipa::ToSchema))]
#[serde(try_from = "u8", into = "u8")]
pub struct Rating(u8);

impl Rating {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 5;

    pub fn value(&self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for Rating {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        if (Self::MIN..=Self::MAX).contains(&value) {
            Ok(Self(value))
        } else {
            Err(format!(
                "Rating must be between {} and {}, got {}",
                Self::MIN,
                Self::MAX,
                value
            ))
        }
    }
}

impl From<Rating> for u8 {
    fn from(rating: Rating) -> Self {
        rating.0
    }
}

// ==================== 도서 ====================

/// 계정에 속한 도서 기록.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa-support", derive(utoipa::ToSchema))]
pub struct Book {
    pub id: BookId,
    pub account_id: AccountId,
    pub title: String,
    pub author: String,
    /// 읽은(또는 읽기 시작한) 날짜
    pub read_on: NaiveDate,
    pub collection: Collection,
    pub rating: Option<Rating>,
    /// 저장된 표지 파일 이름
    pub cover: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// 도서 생성 입력 (저장소 입력).
#[derive(Debug, Clone)]
pub struct NewBook {
    pub account_id: AccountId,
    pub title: String,
    pub author: String,
    pub read_on: NaiveDate,
    pub collection: Collection,
    pub rating: Option<Rating>,
    pub cover: Option<String>,
}

/// 도서 수정 입력.
///
/// `cover`가 `None`이면 기존 표지를 유지합니다.
#[derive(Debug, Clone)]
pub struct BookChanges {
    pub title: String,
    pub author: String,
    pub read_on: NaiveDate,
    pub collection: Collection,
    pub rating: Option<Rating>,
    pub cover: Option<String>,
}

impl Book {
    /// 변경 사항을 적용합니다.
    pub fn apply(&mut self, changes: BookChanges, now: DateTime<Utc>) {
        self.title = changes.title;
        self.author = changes.author;
        self.read_on = changes.read_on;
        self.collection = changes.collection;
        self.rating = changes.rating;
        if let Some(cover) = changes.cover {
            self.cover = Some(cover);
        }
        self.updated_at = now;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_book() -> Book {
        let now = Utc::now();
        Book {
            id: BookId::new(),
            account_id: AccountId::new(),
            title: "Dune".to_string(),
            author: "Frank Herbert".to_string(),
            read_on: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            collection: Collection::Reading,
            rating: None,
            cover: Some("1_dune.png".to_string()),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_collection_wire_format() {
        for collection in Collection::ALL {
            let json = serde_json::to_string(&collection).unwrap();
            assert_eq!(json, format!("\"{}\"", collection.as_str()));
            assert_eq!(collection.as_str().parse::<Collection>().unwrap(), collection);
        }
        assert!("finished".parse::<Collection>().is_err());
    }

    #[test]
    fn test_rating_bounds() {
        assert!(Rating::try_from(0).is_err());
        assert_eq!(Rating::try_from(1).unwrap().value(), 1);
        assert_eq!(Rating::try_from(5).unwrap().value(), 5);
        assert!(Rating::try_from(6).is_err());

        assert!(serde_json::from_str::<Rating>("9").is_err());
        assert_eq!(serde_json::from_str::<Rating>("4").unwrap().value(), 4);
    }

    #[test]
    fn test_apply_keeps_cover_when_absent() {
        let mut book = sample_book();
        let later = book.updated_at + chrono::Duration::seconds(5);
        book.apply(
            BookChanges {
                title: "Dune Messiah".to_string(),
                author: "Frank Herbert".to_string(),
                read_on: book.read_on,
                collection: Collection::Read,
                rating: Some(Rating::try_from(4).unwrap()),
                cover: None,
            },
            later,
        );

        assert_eq!(book.title, "Dune Messiah");
        assert_eq!(book.collection, Collection::Read);
        assert_eq!(book.cover.as_deref(), Some("1_dune.png"));
        assert_eq!(book.updated_at, later);
    }
}
