//! Services Layer
//!
//! Business rules on top of the repository traits: validation, the ownership
//! policy, the book lifecycle and wishlist membership.

pub mod account_service;
pub mod book_service;
pub mod uploads;
pub mod wishlist_service;

pub use account_service::{AccountService, AccountUpdate, RegisterInput};
pub use book_service::{BookInput, BookService};
pub use wishlist_service::WishlistService;
