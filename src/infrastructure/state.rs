//! Application state containing repositories and shared resources

use sea_orm::DatabaseConnection;
use std::sync::Arc;

use crate::domain::{
    AccountRepository, BookRepository, ImageRepository, MediaStorage, WishListRepository,
};
use crate::infrastructure::auth::TokenService;
use crate::infrastructure::{
    SeaOrmAccountRepository, SeaOrmBookRepository, SeaOrmImageRepository,
    SeaOrmWishListRepository,
};
use crate::services::{AccountService, BookService, WishlistService};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub account_repo: Arc<dyn AccountRepository>,
    pub book_repo: Arc<dyn BookRepository>,
    pub image_repo: Arc<dyn ImageRepository>,
    pub wishlist_repo: Arc<dyn WishListRepository>,
    pub media: Arc<dyn MediaStorage>,
    pub tokens: TokenService,
}

impl AppState {
    /// Create a new AppState with all repositories initialized
    pub fn new(db: DatabaseConnection, tokens: TokenService, media: Arc<dyn MediaStorage>) -> Self {
        Self {
            account_repo: Arc::new(SeaOrmAccountRepository::new(db.clone())),
            book_repo: Arc::new(SeaOrmBookRepository::new(db.clone())),
            image_repo: Arc::new(SeaOrmImageRepository::new(db.clone())),
            wishlist_repo: Arc::new(SeaOrmWishListRepository::new(db)),
            media,
            tokens,
        }
    }

    pub fn accounts(&self) -> AccountService {
        AccountService::new(
            self.account_repo.clone(),
            self.wishlist_repo.clone(),
            self.image_repo.clone(),
            self.media.clone(),
        )
    }

    pub fn books(&self) -> BookService {
        BookService::new(
            self.book_repo.clone(),
            self.image_repo.clone(),
            self.media.clone(),
        )
    }

    pub fn wishlists(&self) -> WishlistService {
        WishlistService::new(self.wishlist_repo.clone(), self.book_repo.clone())
    }
}
