//! Wishlist membership
//!
//! A wishlist is a set of book references. Adding a present book or removing
//! an absent one changes nothing and reports `false`.

use std::sync::Arc;

use crate::domain::policy::ensure_can_modify_wishlist;
use crate::domain::{BookRepository, DomainError, PageRequest, Paginated, WishListRepository};
use crate::models::{Book, WishList};

#[derive(Clone)]
pub struct WishlistService {
    wishlists: Arc<dyn WishListRepository>,
    books: Arc<dyn BookRepository>,
}

impl WishlistService {
    pub fn new(wishlists: Arc<dyn WishListRepository>, books: Arc<dyn BookRepository>) -> Self {
        Self { wishlists, books }
    }

    /// Insert the book unless it is already a member
    pub async fn add_book(&self, wishlist: &WishList, book: &Book) -> Result<bool, DomainError> {
        if self.wishlists.contains(wishlist.id, book.id).await? {
            return Ok(false);
        }
        self.wishlists.insert_book(wishlist.id, book.id).await
    }

    /// Remove the book if it is a member
    pub async fn remove_book(&self, wishlist: &WishList, book: &Book) -> Result<bool, DomainError> {
        if !self.wishlists.contains(wishlist.id, book.id).await? {
            return Ok(false);
        }
        self.wishlists.remove_book(wishlist.id, book.id).await
    }

    /// The actor's own wishlist
    pub async fn own(&self, actor_id: i32) -> Result<WishList, DomainError> {
        let wishlist = self
            .wishlists
            .find_by_account(actor_id)
            .await?
            .ok_or(DomainError::NotFound)?;
        ensure_can_modify_wishlist(actor_id, &wishlist)?;
        Ok(wishlist)
    }

    async fn active_book(&self, book_id: i32) -> Result<Book, DomainError> {
        self.books
            .find_active(book_id)
            .await?
            .ok_or(DomainError::NotFound)
    }

    pub async fn add_to_own(&self, actor_id: i32, book_id: i32) -> Result<bool, DomainError> {
        let book = self.active_book(book_id).await?;
        let wishlist = self.own(actor_id).await?;

        let added = self.add_book(&wishlist, &book).await?;
        if added {
            tracing::info!("Account {} wishlisted book {}", actor_id, book.id);
        } else {
            tracing::debug!("Book {} already in wishlist of account {}", book.id, actor_id);
        }
        Ok(added)
    }

    pub async fn remove_from_own(&self, actor_id: i32, book_id: i32) -> Result<bool, DomainError> {
        let book = self.active_book(book_id).await?;
        let wishlist = self.own(actor_id).await?;

        let removed = self.remove_book(&wishlist, &book).await?;
        if removed {
            tracing::info!("Account {} removed book {} from wishlist", actor_id, book.id);
        }
        Ok(removed)
    }

    /// Non-deleted member books, ordered by title
    pub async fn list_own(
        &self,
        actor_id: i32,
        page: PageRequest,
    ) -> Result<Paginated<Book>, DomainError> {
        let wishlist = self.own(actor_id).await?;
        self.wishlists.books(wishlist.id, page).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{AccountRepository, NewAccount, NewBook};
    use crate::infrastructure::db::init_db;
    use crate::infrastructure::{
        SeaOrmAccountRepository, SeaOrmBookRepository, SeaOrmWishListRepository,
    };

    struct Fixture {
        service: WishlistService,
        books: Arc<dyn BookRepository>,
        wishlists: Arc<dyn WishListRepository>,
        reader: i32,
        seller: i32,
    }

    async fn setup() -> Fixture {
        let db = init_db("sqlite::memory:").await.expect("Failed to init DB");
        let accounts = SeaOrmAccountRepository::new(db.clone());
        let wishlists: Arc<dyn WishListRepository> =
            Arc::new(SeaOrmWishListRepository::new(db.clone()));
        let books: Arc<dyn BookRepository> = Arc::new(SeaOrmBookRepository::new(db));

        let mut ids = Vec::new();
        for name in ["reader", "seller"] {
            let account = accounts
                .create(NewAccount {
                    username: name.to_string(),
                    password_hash: "hash".to_string(),
                    email: None,
                    first_name: String::new(),
                    last_name: String::new(),
                })
                .await
                .unwrap();
            wishlists.create_for_account(account.id).await.unwrap();
            ids.push(account.id);
        }

        Fixture {
            service: WishlistService::new(wishlists.clone(), books.clone()),
            books,
            wishlists,
            reader: ids[0],
            seller: ids[1],
        }
    }

    async fn listed(f: &Fixture, title: &str) -> Book {
        f.books
            .create(NewBook {
                account_id: f.seller,
                title: title.to_string(),
                details: None,
                price: 10.0,
            })
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn add_is_idempotent() {
        let f = setup().await;
        let book = listed(&f, "Dune").await;
        let wishlist = f.service.own(f.reader).await.unwrap();

        assert!(f.service.add_book(&wishlist, &book).await.unwrap());
        assert!(!f.service.add_book(&wishlist, &book).await.unwrap());
        assert_eq!(f.wishlists.count_members(wishlist.id).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn remove_is_idempotent() {
        let f = setup().await;
        let book = listed(&f, "Dune").await;
        let wishlist = f.service.own(f.reader).await.unwrap();

        assert!(!f.service.remove_book(&wishlist, &book).await.unwrap());
        f.service.add_book(&wishlist, &book).await.unwrap();
        assert!(f.service.remove_book(&wishlist, &book).await.unwrap());
        assert!(!f.service.remove_book(&wishlist, &book).await.unwrap());
        assert_eq!(f.wishlists.count_members(wishlist.id).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn wishlists_are_independent() {
        let f = setup().await;
        let book = listed(&f, "Dune").await;

        assert!(f.service.add_to_own(f.reader, book.id).await.unwrap());
        assert!(f.service.add_to_own(f.seller, book.id).await.unwrap());

        let reader_list = f.service.own(f.reader).await.unwrap();
        let seller_list = f.service.own(f.seller).await.unwrap();
        assert_ne!(reader_list.id, seller_list.id);
        assert_eq!(f.wishlists.count_members(reader_list.id).await.unwrap(), 1);
        assert_eq!(f.wishlists.count_members(seller_list.id).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn listing_is_title_ordered_and_hides_deleted() {
        let f = setup().await;
        let zen = listed(&f, "Zen").await;
        let alpha = listed(&f, "Alpha").await;
        let gone = listed(&f, "Middle").await;

        for book in [&zen, &alpha, &gone] {
            f.service.add_to_own(f.reader, book.id).await.unwrap();
        }
        f.books.soft_delete(gone.id).await.unwrap();

        let page = f.service.list_own(f.reader, PageRequest::default()).await.unwrap();
        let titles: Vec<&str> = page.results.iter().map(|b| b.title.as_str()).collect();
        assert_eq!(titles, vec!["Alpha", "Zen"]);
        assert_eq!(page.count, 2);

        // The membership row itself survives
        let wishlist = f.service.own(f.reader).await.unwrap();
        assert_eq!(f.wishlists.count_members(wishlist.id).await.unwrap(), 3);
    }

    #[tokio::test]
    async fn deleted_or_missing_books_are_not_found() {
        let f = setup().await;
        let book = listed(&f, "Dune").await;
        f.books.soft_delete(book.id).await.unwrap();

        assert!(matches!(
            f.service.add_to_own(f.reader, book.id).await,
            Err(DomainError::NotFound)
        ));
        assert!(matches!(
            f.service.remove_from_own(f.reader, book.id).await,
            Err(DomainError::NotFound)
        ));
        assert!(matches!(
            f.service.add_to_own(f.reader, 9999).await,
            Err(DomainError::NotFound)
        ));
    }
}
