//! 인메모리 저장소.
//!
//! 프로세스가 종료되면 데이터가 사라집니다. 데이터베이스 없이 서버를 띄울 때와
//! 테스트에서 사용합니다.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use shelf_core::{
    Account, AccountId, AccountStore, Book, BookChanges, BookId, BookStore, Collection,
    NewAccount, NewBook, StoreError, StoreResult,
};
use tokio::sync::RwLock;

/// 계정과 도서를 메모리에 보관하는 저장소.
///
/// 도서는 삽입 순서대로 보관하므로 목록은 생성 순으로 반환됩니다.
#[derive(Default)]
pub struct InMemoryStore {
    accounts: RwLock<HashMap<AccountId, Account>>,
    books: RwLock<Vec<Book>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AccountStore for InMemoryStore {
    async fn find_by_handle(&self, handle: &str) -> StoreResult<Option<Account>> {
        let accounts = self.accounts.read().await;
        Ok(accounts.values().find(|a| a.handle == handle).cloned())
    }

    async fn find_by_id(&self, id: AccountId) -> StoreResult<Option<Account>> {
        Ok(self.accounts.read().await.get(&id).cloned())
    }

    async fn create(&self, account: NewAccount) -> StoreResult<Account> {
        // 확인과 삽입을 같은 쓰기 잠금 안에서 수행
        let mut accounts = self.accounts.write().await;

        if accounts.values().any(|a| a.handle == account.handle) {
            return Err(StoreError::Conflict(format!(
                "handle '{}' already exists",
                account.handle
            )));
        }

        let created = Account {
            id: AccountId::new(),
            handle: account.handle,
            display_name: account.display_name,
            password_hash: account.password_hash,
            created_at: Utc::now(),
        };
        accounts.insert(created.id, created.clone());
        Ok(created)
    }
}

#[async_trait]
impl BookStore for InMemoryStore {
    async fn list(
        &self,
        account: AccountId,
        collection: Option<Collection>,
    ) -> StoreResult<Vec<Book>> {
        let books = self.books.read().await;
        Ok(books
            .iter()
            .filter(|b| b.account_id == account)
            .filter(|b| collection.map_or(true, |c| b.collection == c))
            .cloned()
            .collect())
    }

    async fn find(&self, account: AccountId, id: BookId) -> StoreResult<Option<Book>> {
        let books = self.books.read().await;
        Ok(books
            .iter()
            .find(|b| b.id == id && b.account_id == account)
            .cloned())
    }

    async fn create(&self, book: NewBook) -> StoreResult<Book> {
        let now = Utc::now();
        let created = Book {
            id: BookId::new(),
            account_id: book.account_id,
            title: book.title,
            author: book.author,
            read_on: book.read_on,
            collection: book.collection,
            rating: book.rating,
            cover: book.cover,
            created_at: now,
            updated_at: now,
        };
        self.books.write().await.push(created.clone());
        Ok(created)
    }

    async fn update(
        &self,
        account: AccountId,
        id: BookId,
        changes: BookChanges,
    ) -> StoreResult<Option<Book>> {
        let mut books = self.books.write().await;
        let Some(book) = books
            .iter_mut()
            .find(|b| b.id == id && b.account_id == account)
        else {
            return Ok(None);
        };

        book.apply(changes, Utc::now());
        Ok(Some(book.clone()))
    }

    async fn delete(&self, account: AccountId, id: BookId) -> StoreResult<bool> {
        let mut books = self.books.write().await;
        let before = books.len();
        books.retain(|b| !(b.id == id && b.account_id == account));
        Ok(books.len() < before)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn new_account(handle: &str) -> NewAccount {
        NewAccount {
            handle: handle.to_string(),
            display_name: handle.to_uppercase(),
            password_hash: "$argon2id$stub".to_string(),
        }
    }

    fn new_book(account: AccountId, title: &str, collection: Collection) -> NewBook {
        NewBook {
            account_id: account,
            title: title.to_string(),
            author: "Anonymous".to_string(),
            read_on: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            collection,
            rating: None,
            cover: None,
        }
    }

    #[tokio::test]
    async fn test_duplicate_handle_conflicts() {
        let store = InMemoryStore::new();
        let alice = AccountStore::create(&store, new_account("alice")).await.unwrap();

        let err = AccountStore::create(&store, new_account("alice"))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));

        let found = store.find_by_handle("alice").await.unwrap().unwrap();
        assert_eq!(found.id, alice.id);
        assert!(store.find_by_handle("ALICE").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_concurrent_creates_admit_one() {
        let store = std::sync::Arc::new(InMemoryStore::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let store = store.clone();
                tokio::spawn(async move { AccountStore::create(&*store, new_account("dup")).await })
            })
            .collect();

        let mut ok = 0;
        for handle in handles {
            if handle.await.unwrap().is_ok() {
                ok += 1;
            }
        }
        assert_eq!(ok, 1);
    }

    #[tokio::test]
    async fn test_book_crud_scoped() {
        let store = InMemoryStore::new();
        let owner = AccountId::new();
        let other = AccountId::new();

        let first = BookStore::create(&store, new_book(owner, "A", Collection::Reading))
            .await
            .unwrap();
        BookStore::create(&store, new_book(owner, "B", Collection::Read))
            .await
            .unwrap();

        let titles: Vec<_> = store
            .list(owner, None)
            .await
            .unwrap()
            .into_iter()
            .map(|b| b.title)
            .collect();
        assert_eq!(titles, vec!["A", "B"]);
        assert_eq!(
            store.list(owner, Some(Collection::Read)).await.unwrap().len(),
            1
        );
        assert!(store.list(other, None).await.unwrap().is_empty());

        assert!(store.find(other, first.id).await.unwrap().is_none());
        assert!(!store.delete(other, first.id).await.unwrap());
        assert!(store.delete(owner, first.id).await.unwrap());
        assert!(store.find(owner, first.id).await.unwrap().is_none());
    }
}
