//! Repository implementations using SeaORM

pub mod account_repository;
pub mod book_repository;
pub mod image_repository;
pub mod wishlist_repository;

pub use account_repository::SeaOrmAccountRepository;
pub use book_repository::SeaOrmBookRepository;
pub use image_repository::SeaOrmImageRepository;
pub use wishlist_repository::SeaOrmWishListRepository;
