//! Ownership policy
//!
//! Reads are public; every mutation of a book (or of a wishlist) is reserved
//! to the account that owns it.

use super::DomainError;
use crate::models::{Book, WishList};

/// True iff `actor_id` owns the book.
pub fn can_modify(actor_id: i32, book: &Book) -> bool {
    book.account == actor_id
}

/// True iff `actor_id` owns the wishlist.
pub fn can_modify_wishlist(actor_id: i32, wishlist: &WishList) -> bool {
    wishlist.account == actor_id
}

/// Fail with `PermissionDenied` unless the actor owns the book.
///
/// `action` only shapes the message ("edit", "delete", ...).
pub fn ensure_can_modify(actor_id: i32, book: &Book, action: &str) -> Result<(), DomainError> {
    if can_modify(actor_id, book) {
        Ok(())
    } else {
        tracing::warn!(
            "Account {} tried to {} book {} owned by {}",
            actor_id,
            action,
            book.id,
            book.account
        );
        Err(DomainError::PermissionDenied(format!(
            "You don't have permission to {} this book!",
            action
        )))
    }
}

pub fn ensure_can_modify_wishlist(actor_id: i32, wishlist: &WishList) -> Result<(), DomainError> {
    if can_modify_wishlist(actor_id, wishlist) {
        Ok(())
    } else {
        Err(DomainError::PermissionDenied(
            "You don't have permission to change this wishlist!".to_string(),
        ))
    }
}
