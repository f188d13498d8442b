//! Command dispatch
//!
//! Handlers only translate HTTP into a [`Command`]. Each command has an
//! `(Operation, Resource)` key; [`AUTH_TABLE`] says which keys need a
//! signed-in account and [`dispatch`] routes the command to its service call.

use serde_json::json;

use super::response::Reply;
use crate::domain::{BookChanges, BookFilter, DomainError, PageRequest};
use crate::infrastructure::AppState;
use crate::infrastructure::auth::CurrentAccount;
use crate::models::BookStatus;
use crate::services::{AccountUpdate, BookInput, RegisterInput};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Obtain,
    Refresh,
    Register,
    Retrieve,
    List,
    ListOwn,
    Create,
    Update,
    Delete,
    SetImage,
    MarkSold,
    MarkReserved,
    MarkAvailable,
    AddBook,
    RemoveBook,
    Check,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    Token,
    Account,
    Book,
    BookImage,
    Wishlist,
    Health,
}

pub type CommandKey = (Operation, Resource);

/// Whether each command key needs an authenticated caller.
/// Keys missing from the table are treated as protected.
pub const AUTH_TABLE: &[(CommandKey, bool)] = &[
    ((Operation::Obtain, Resource::Token), false),
    ((Operation::Refresh, Resource::Token), false),
    ((Operation::Register, Resource::Account), false),
    ((Operation::Retrieve, Resource::Account), true),
    ((Operation::Update, Resource::Account), true),
    ((Operation::Delete, Resource::Account), true),
    ((Operation::SetImage, Resource::Account), true),
    ((Operation::List, Resource::Wishlist), true),
    ((Operation::AddBook, Resource::Wishlist), true),
    ((Operation::RemoveBook, Resource::Wishlist), true),
    ((Operation::List, Resource::Book), false),
    ((Operation::ListOwn, Resource::Book), true),
    ((Operation::Retrieve, Resource::Book), false),
    ((Operation::Create, Resource::Book), true),
    ((Operation::Update, Resource::Book), true),
    ((Operation::Delete, Resource::Book), true),
    ((Operation::MarkSold, Resource::Book), true),
    ((Operation::MarkReserved, Resource::Book), true),
    ((Operation::MarkAvailable, Resource::Book), true),
    ((Operation::Create, Resource::BookImage), true),
    ((Operation::Delete, Resource::BookImage), true),
    ((Operation::Check, Resource::Health), false),
];

pub fn requires_auth(key: CommandKey) -> bool {
    AUTH_TABLE
        .iter()
        .find(|(k, _)| *k == key)
        .map(|(_, needs_auth)| *needs_auth)
        .unwrap_or(true)
}

#[derive(Debug)]
pub enum Command {
    ObtainToken { username: String, password: String },
    RefreshToken { refresh: String },
    Register(RegisterInput),
    GetOwnAccount,
    UpdateOwnAccount(AccountUpdate),
    DeleteOwnAccount,
    SetAccountImage { bytes: Vec<u8> },
    ListWishlist { page: PageRequest },
    AddToWishlist { book_id: i32 },
    RemoveFromWishlist { book_id: i32 },
    ListBooks { filter: BookFilter, page: PageRequest },
    ListOwnBooks { filter: BookFilter, page: PageRequest },
    GetBook { id: i32 },
    CreateBook(BookInput),
    UpdateBook { id: i32, changes: BookChanges },
    SoftDeleteBook { id: i32 },
    SetBookStatus { id: i32, status: BookStatus },
    AddBookImage { book_id: i32, bytes: Vec<u8>, is_cover: bool },
    RemoveBookImage { book_id: i32, image_id: i32 },
    Health,
}

impl Command {
    pub fn key(&self) -> CommandKey {
        match self {
            Command::ObtainToken { .. } => (Operation::Obtain, Resource::Token),
            Command::RefreshToken { .. } => (Operation::Refresh, Resource::Token),
            Command::Register(_) => (Operation::Register, Resource::Account),
            Command::GetOwnAccount => (Operation::Retrieve, Resource::Account),
            Command::UpdateOwnAccount(_) => (Operation::Update, Resource::Account),
            Command::DeleteOwnAccount => (Operation::Delete, Resource::Account),
            Command::SetAccountImage { .. } => (Operation::SetImage, Resource::Account),
            Command::ListWishlist { .. } => (Operation::List, Resource::Wishlist),
            Command::AddToWishlist { .. } => (Operation::AddBook, Resource::Wishlist),
            Command::RemoveFromWishlist { .. } => (Operation::RemoveBook, Resource::Wishlist),
            Command::ListBooks { .. } => (Operation::List, Resource::Book),
            Command::ListOwnBooks { .. } => (Operation::ListOwn, Resource::Book),
            Command::GetBook { .. } => (Operation::Retrieve, Resource::Book),
            Command::CreateBook(_) => (Operation::Create, Resource::Book),
            Command::UpdateBook { .. } => (Operation::Update, Resource::Book),
            Command::SoftDeleteBook { .. } => (Operation::Delete, Resource::Book),
            Command::SetBookStatus { status, .. } => match status {
                BookStatus::Sold => (Operation::MarkSold, Resource::Book),
                BookStatus::Reserved => (Operation::MarkReserved, Resource::Book),
                BookStatus::Available => (Operation::MarkAvailable, Resource::Book),
            },
            Command::AddBookImage { .. } => (Operation::Create, Resource::BookImage),
            Command::RemoveBookImage { .. } => (Operation::Delete, Resource::BookImage),
            Command::Health => (Operation::Check, Resource::Health),
        }
    }
}

/// Caller identity as extracted from the request; an error means no usable token
pub type Caller = Result<CurrentAccount, DomainError>;

pub fn not_provided() -> DomainError {
    DomainError::Unauthenticated("Authentication credentials were not provided.".to_string())
}

fn signed_in(actor: Option<&CurrentAccount>) -> Result<i32, DomainError> {
    actor.map(|a| a.id).ok_or_else(not_provided)
}

/// Check the caller against the auth table before any body is parsed.
///
/// Protected keys need a valid token; public keys ignore a bad one.
pub fn admit(key: CommandKey, caller: Caller) -> Result<Option<CurrentAccount>, DomainError> {
    if requires_auth(key) {
        match caller {
            Ok(account) => Ok(Some(account)),
            Err(e) => {
                tracing::warn!("Rejected {:?} on {:?}: {}", key.0, key.1, e);
                Err(e)
            }
        }
    } else {
        Ok(caller.ok())
    }
}

/// Same check as [`admit`], handing the caller back for a later [`dispatch`]
pub fn guard(key: CommandKey, caller: Caller) -> Result<Caller, DomainError> {
    admit(key, caller).map(|actor| actor.ok_or_else(not_provided))
}

/// Run a command on behalf of the caller
pub async fn dispatch(
    state: &AppState,
    caller: Caller,
    command: Command,
) -> Result<Reply, DomainError> {
    let actor = admit(command.key(), caller)?;
    let actor = actor.as_ref();

    match command {
        Command::ObtainToken { username, password } => {
            let account = state.accounts().authenticate(&username, &password).await?;
            let pair = state.tokens.issue_pair(account.id, &account.username)?;
            tracing::info!("Issued tokens for account {}", account.id);
            Reply::ok("Token obtained.").with_data(&pair)
        }
        Command::RefreshToken { refresh } => {
            let access = state.tokens.refresh(&refresh)?;
            Reply::ok("Token refreshed.").with_data(&json!({ "access": access }))
        }
        Command::Register(input) => {
            let account = state.accounts().register(input).await?;
            Reply::created("Account registered.").with_data(&account)
        }
        Command::GetOwnAccount => {
            let account = state.accounts().get(signed_in(actor)?).await?;
            Reply::ok("Account details.").with_data(&account)
        }
        Command::UpdateOwnAccount(update) => {
            let account = state.accounts().update(signed_in(actor)?, update).await?;
            Reply::ok("Account updated.").with_data(&account)
        }
        Command::DeleteOwnAccount => {
            state.accounts().delete(signed_in(actor)?).await?;
            Ok(Reply::ok("Account deleted."))
        }
        Command::SetAccountImage { bytes } => {
            let account = state.accounts().set_image(signed_in(actor)?, &bytes).await?;
            Reply::ok("Profile image updated.").with_data(&account)
        }
        Command::ListWishlist { page } => {
            let books = state.wishlists().list_own(signed_in(actor)?, page).await?;
            Reply::ok("Wishlist books.").with_data(&books)
        }
        Command::AddToWishlist { book_id } => {
            if state.wishlists().add_to_own(signed_in(actor)?, book_id).await? {
                Ok(Reply::created("Book added to wishlist!"))
            } else {
                Err(DomainError::Conflict("Book is already in wishlist.".to_string()))
            }
        }
        Command::RemoveFromWishlist { book_id } => {
            if state.wishlists().remove_from_own(signed_in(actor)?, book_id).await? {
                Ok(Reply::ok("Book removed from wishlist."))
            } else {
                Err(DomainError::Conflict("Book is not in wishlist.".to_string()))
            }
        }
        Command::ListBooks { filter, page } => {
            let books = state.books().list(filter, page).await?;
            Reply::ok("Books.").with_data(&books)
        }
        Command::ListOwnBooks { filter, page } => {
            let books = state.books().list_own(signed_in(actor)?, filter, page).await?;
            Reply::ok("Your books.").with_data(&books)
        }
        Command::GetBook { id } => {
            let book = state.books().get(id).await?;
            Reply::ok("Book details.").with_data(&book)
        }
        Command::CreateBook(input) => {
            let book = state.books().create(signed_in(actor)?, input).await?;
            Reply::created("Book created.").with_data(&book)
        }
        Command::UpdateBook { id, changes } => {
            let book = state.books().update(signed_in(actor)?, id, changes).await?;
            Reply::ok("Book updated.").with_data(&book)
        }
        Command::SoftDeleteBook { id } => {
            state.books().soft_delete(signed_in(actor)?, id).await?;
            Ok(Reply::ok("Book deleted."))
        }
        Command::SetBookStatus { id, status } => {
            let book = state.books().set_status(signed_in(actor)?, id, status).await?;
            Reply::ok(format!("Book marked as {}.", status)).with_data(&book)
        }
        Command::AddBookImage {
            book_id,
            bytes,
            is_cover,
        } => {
            let image = state
                .books()
                .add_image(signed_in(actor)?, book_id, &bytes, is_cover)
                .await?;
            Reply::created("Image uploaded.").with_data(&image)
        }
        Command::RemoveBookImage { book_id, image_id } => {
            state
                .books()
                .remove_image(signed_in(actor)?, book_id, image_id)
                .await?;
            Ok(Reply::ok("Image removed."))
        }
        Command::Health => Reply::ok("ok").with_data(&json!({
            "status": "ok",
            "service": "bookmarket",
            "version": env!("CARGO_PKG_VERSION"),
        })),
    }
}
