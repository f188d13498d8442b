//! Repository trait definitions
//!
//! These traits define the contract for data access.
//! Implementations live in the infrastructure layer.

use async_trait::async_trait;

use super::{BookFilter, DomainError, PageRequest, Paginated};
use crate::models::{Account, Book, BookStatus, Image, WishList};

/// Input for registering an account; the password is already hashed
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub username: String,
    pub password_hash: String,
    pub email: Option<String>,
    pub first_name: String,
    pub last_name: String,
}

/// Partial account update; `None` leaves a column untouched
#[derive(Debug, Clone, Default)]
pub struct AccountChanges {
    pub username: Option<String>,
    pub password_hash: Option<String>,
    pub email: Option<Option<String>>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub image: Option<Option<String>>,
}

/// Account together with its password hash, for credential checks only
#[derive(Debug, Clone)]
pub struct StoredCredentials {
    pub account: Account,
    pub password_hash: String,
}

pub const USERNAME_TAKEN: &str = "A user with that username already exists.";

/// Repository trait for Account entity
#[async_trait]
pub trait AccountRepository: Send + Sync {
    /// Create a new account. A username already in use fails validation on
    /// `username` with [`USERNAME_TAKEN`].
    async fn create(&self, input: NewAccount) -> Result<Account, DomainError>;

    /// Find an account by ID
    async fn find_by_id(&self, id: i32) -> Result<Option<Account>, DomainError>;

    /// Find an account and its password hash by username
    async fn find_credentials(&self, username: &str)
    -> Result<Option<StoredCredentials>, DomainError>;

    /// Whether another account (other than `except`) already uses the username
    async fn username_taken(&self, username: &str, except: Option<i32>)
    -> Result<bool, DomainError>;

    /// Apply a partial update; a taken username fails like [`create`](Self::create)
    async fn update(&self, id: i32, changes: AccountChanges) -> Result<Account, DomainError>;

    /// Delete an account; books, images and the wishlist go with it
    async fn delete(&self, id: i32) -> Result<(), DomainError>;

    /// Total number of accounts
    async fn count(&self) -> Result<u64, DomainError>;
}

/// Input for listing a book
#[derive(Debug, Clone)]
pub struct NewBook {
    pub account_id: i32,
    pub title: String,
    pub details: Option<String>,
    pub price: f64,
}

/// Partial book update; `None` leaves a column untouched
#[derive(Debug, Clone, Default)]
pub struct BookChanges {
    pub title: Option<String>,
    pub details: Option<Option<String>>,
    pub price: Option<f64>,
    pub status: Option<BookStatus>,
}

impl BookChanges {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.details.is_none() && self.price.is_none() && self.status.is_none()
    }
}

/// Repository trait for Book entity
#[async_trait]
pub trait BookRepository: Send + Sync {
    /// Find non-deleted books matching the filter, one page at a time
    async fn find_all(
        &self,
        filter: BookFilter,
        page: PageRequest,
    ) -> Result<Paginated<Book>, DomainError>;

    /// Find a non-deleted book by ID
    async fn find_active(&self, id: i32) -> Result<Option<Book>, DomainError>;

    /// Find a book by ID, soft-deleted or not
    async fn find_by_id(&self, id: i32) -> Result<Option<Book>, DomainError>;

    /// Create a new book (status available, not deleted)
    async fn create(&self, input: NewBook) -> Result<Book, DomainError>;

    /// Apply a partial update and bump `updated_at`
    async fn update(&self, id: i32, changes: BookChanges) -> Result<Book, DomainError>;

    /// Persist a new status, touching no other column
    async fn set_status(&self, id: i32, status: BookStatus) -> Result<Book, DomainError>;

    /// Flag the book as deleted, touching no other column
    async fn soft_delete(&self, id: i32) -> Result<Book, DomainError>;

    /// Number of stored book rows, soft-deleted ones included
    async fn count_all(&self) -> Result<u64, DomainError>;
}

/// Input for attaching an image to a book
#[derive(Debug, Clone)]
pub struct NewImage {
    pub book_id: i32,
    pub path: String,
    pub is_cover: bool,
}

/// Repository trait for Image entity
#[async_trait]
pub trait ImageRepository: Send + Sync {
    async fn create(&self, input: NewImage) -> Result<Image, DomainError>;

    async fn find_by_id(&self, id: i32) -> Result<Option<Image>, DomainError>;

    async fn find_by_book(&self, book_id: i32) -> Result<Vec<Image>, DomainError>;

    /// Every image attached to any book of the account, deleted books included
    async fn find_by_account(&self, account_id: i32) -> Result<Vec<Image>, DomainError>;

    /// Drop the cover flag from every image of the book except `keep`
    async fn clear_cover(&self, book_id: i32, keep: i32) -> Result<(), DomainError>;

    async fn delete(&self, id: i32) -> Result<(), DomainError>;

    async fn count(&self) -> Result<u64, DomainError>;
}

/// Repository trait for WishList entity and its book membership
#[async_trait]
pub trait WishListRepository: Send + Sync {
    /// Create the (single) wishlist of an account
    async fn create_for_account(&self, account_id: i32) -> Result<WishList, DomainError>;

    async fn find_by_account(&self, account_id: i32) -> Result<Option<WishList>, DomainError>;

    /// Membership check by primary key
    async fn contains(&self, wishlist_id: i32, book_id: i32) -> Result<bool, DomainError>;

    /// Insert a membership row; false if it was already there
    async fn insert_book(&self, wishlist_id: i32, book_id: i32) -> Result<bool, DomainError>;

    /// Delete a membership row; false if there was none
    async fn remove_book(&self, wishlist_id: i32, book_id: i32) -> Result<bool, DomainError>;

    /// Non-deleted member books ordered by title
    async fn books(
        &self,
        wishlist_id: i32,
        page: PageRequest,
    ) -> Result<Paginated<Book>, DomainError>;

    /// Raw membership row count, soft-deleted books included
    async fn count_members(&self, wishlist_id: i32) -> Result<u64, DomainError>;

    async fn count(&self) -> Result<u64, DomainError>;
}

/// File storage for uploaded images
#[async_trait]
pub trait MediaStorage: Send + Sync {
    /// Store `bytes` under `folder` and return the path relative to the media root
    async fn save(&self, folder: &str, extension: &str, bytes: &[u8])
    -> Result<String, DomainError>;

    /// Remove a stored file; missing files are not an error
    async fn remove(&self, path: &str) -> Result<(), DomainError>;
}
