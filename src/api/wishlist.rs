//! Wishlist handlers; the wishlist is always the caller's own

use axum::extract::{Path, Query, State, rejection::PathRejection};
use serde::Deserialize;
use utoipa::IntoParams;

use super::commands::{Caller, Command, Operation, Resource, dispatch, guard};
use super::path_ids;
use super::response::Reply;
use crate::domain::{DomainError, PageRequest};
use crate::infrastructure::AppState;

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PageParams {
    pub page: Option<String>,
    pub page_size: Option<String>,
}

#[utoipa::path(
    get,
    path = "/api/accounts/my-wish-list",
    params(PageParams),
    responses(
        (status = 200, description = "Non-deleted wishlist books ordered by title"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Invalid page")
    ),
    security(("bearer" = []))
)]
pub async fn list_wishlist(
    State(state): State<AppState>,
    caller: Caller,
    Query(params): Query<PageParams>,
) -> Result<Reply, DomainError> {
    let caller = guard((Operation::List, Resource::Wishlist), caller)?;
    let page = PageRequest::parse(params.page.as_deref(), params.page_size.as_deref())?;
    dispatch(&state, caller, Command::ListWishlist { page }).await
}

#[utoipa::path(
    post,
    path = "/api/accounts/{book_id}/wishlist-add-book",
    params(("book_id" = i32, Path, description = "Book id")),
    responses(
        (status = 201, description = "Book added to wishlist"),
        (status = 400, description = "Book already in wishlist"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Book not found")
    ),
    security(("bearer" = []))
)]
pub async fn add_book(
    State(state): State<AppState>,
    caller: Caller,
    path: Result<Path<i32>, PathRejection>,
) -> Result<Reply, DomainError> {
    let book_id = path_ids(path)?;
    dispatch(&state, caller, Command::AddToWishlist { book_id }).await
}

#[utoipa::path(
    delete,
    path = "/api/accounts/{book_id}/wishlist-remove-book",
    params(("book_id" = i32, Path, description = "Book id")),
    responses(
        (status = 200, description = "Book removed from wishlist"),
        (status = 400, description = "Book not in wishlist"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Book not found")
    ),
    security(("bearer" = []))
)]
pub async fn remove_book(
    State(state): State<AppState>,
    caller: Caller,
    path: Result<Path<i32>, PathRejection>,
) -> Result<Reply, DomainError> {
    let book_id = path_ids(path)?;
    dispatch(&state, caller, Command::RemoveFromWishlist { book_id }).await
}
