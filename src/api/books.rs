//! Book handlers: listings, detail, owner mutations and images

use axum::{
    Json,
    extract::{
        Multipart, Path, Query, State,
        rejection::{JsonRejection, PathRejection},
    },
};
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};

use super::commands::{Caller, Command, Operation, Resource, dispatch, guard};
use super::response::Reply;
use super::{Number, double_option, json_body, path_ids, read_upload, truthy};
use crate::domain::{
    BookChanges, BookFilter, DomainError, FieldErrors, OWN_ORDERING, OrderField,
    PUBLIC_ORDERING, PageRequest, parse_ordering, parse_status_filter,
};
use crate::infrastructure::AppState;
use crate::models::BookStatus;
use crate::services::BookInput;

/// Query string of the public listing
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct BookListParams {
    /// available, sold or reserved
    pub status: Option<String>,
    /// Owner account id
    pub account: Option<String>,
    /// Whitespace separated terms matched against title and details
    pub search: Option<String>,
    /// e.g. `price` or `-created_at`
    pub ordering: Option<String>,
    pub page: Option<String>,
    pub page_size: Option<String>,
}

fn list_query(
    params: BookListParams,
    allowed: &[OrderField],
) -> Result<(BookFilter, PageRequest), DomainError> {
    let page = PageRequest::parse(params.page.as_deref(), params.page_size.as_deref())?;
    let status = parse_status_filter(params.status.as_deref())?;

    let account = match params.account.as_deref().map(str::trim).filter(|a| !a.is_empty()) {
        None => None,
        Some(raw) => Some(raw.parse::<i32>().map_err(|_| {
            DomainError::validation(
                "account",
                "Select a valid choice. That choice is not one of the available choices.",
            )
        })?),
    };

    let filter = BookFilter {
        status,
        account,
        search: params.search,
        ordering: parse_ordering(params.ordering.as_deref(), allowed),
    };
    Ok((filter, page))
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateBookRequest {
    pub title: Option<String>,
    pub details: Option<String>,
    #[schema(value_type = Option<f64>)]
    pub price: Option<Number>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateBookRequest {
    pub title: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub details: Option<Option<String>>,
    #[schema(value_type = Option<f64>)]
    pub price: Option<Number>,
    #[schema(value_type = Option<BookStatus>)]
    pub status: Option<String>,
}

#[utoipa::path(
    get,
    path = "/api/books",
    params(BookListParams),
    responses(
        (status = 200, description = "One page of non-deleted books"),
        (status = 400, description = "Invalid filter"),
        (status = 404, description = "Invalid page")
    )
)]
pub async fn list_books(
    State(state): State<AppState>,
    caller: Caller,
    Query(params): Query<BookListParams>,
) -> Result<Reply, DomainError> {
    let (filter, page) = list_query(params, PUBLIC_ORDERING)?;
    dispatch(&state, caller, Command::ListBooks { filter, page }).await
}

/// The caller's own books; `account` is ignored and `title` ordering is allowed
#[utoipa::path(
    get,
    path = "/api/books/mine",
    params(BookListParams),
    responses(
        (status = 200, description = "One page of the caller's books"),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer" = []))
)]
pub async fn list_my_books(
    State(state): State<AppState>,
    caller: Caller,
    Query(params): Query<BookListParams>,
) -> Result<Reply, DomainError> {
    let caller = guard((Operation::ListOwn, Resource::Book), caller)?;
    let (filter, page) = list_query(
        BookListParams {
            account: None,
            ..params
        },
        OWN_ORDERING,
    )?;
    dispatch(&state, caller, Command::ListOwnBooks { filter, page }).await
}

#[utoipa::path(
    get,
    path = "/api/books/{id}",
    params(("id" = i32, Path, description = "Book id")),
    responses(
        (status = 200, description = "Book details", body = crate::models::Book),
        (status = 404, description = "Book not found")
    )
)]
pub async fn get_book(
    State(state): State<AppState>,
    caller: Caller,
    path: Result<Path<i32>, PathRejection>,
) -> Result<Reply, DomainError> {
    let id = path_ids(path)?;
    dispatch(&state, caller, Command::GetBook { id }).await
}

#[utoipa::path(
    post,
    path = "/api/books",
    request_body = CreateBookRequest,
    responses(
        (status = 201, description = "Book created", body = crate::models::Book),
        (status = 400, description = "Invalid data"),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer" = []))
)]
pub async fn create_book(
    State(state): State<AppState>,
    caller: Caller,
    body: Result<Json<CreateBookRequest>, JsonRejection>,
) -> Result<Reply, DomainError> {
    let caller = guard((Operation::Create, Resource::Book), caller)?;
    let req = json_body(body)?;

    let mut errors = FieldErrors::new();
    let price = match req.price {
        Some(price) => price.parse("price", &mut errors),
        None => {
            errors.add("price", "This field is required.");
            None
        }
    };
    errors.into_result()?;

    let input = BookInput {
        title: req.title,
        details: req.details,
        price,
    };
    dispatch(&state, caller, Command::CreateBook(input)).await
}

/// PUT and PATCH both apply only the fields present in the body
#[utoipa::path(
    put,
    path = "/api/books/{id}",
    params(("id" = i32, Path, description = "Book id")),
    request_body = UpdateBookRequest,
    responses(
        (status = 200, description = "Book updated", body = crate::models::Book),
        (status = 400, description = "Invalid data"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Permission denied"),
        (status = 404, description = "Book not found")
    ),
    security(("bearer" = []))
)]
pub async fn update_book(
    State(state): State<AppState>,
    caller: Caller,
    path: Result<Path<i32>, PathRejection>,
    body: Result<Json<UpdateBookRequest>, JsonRejection>,
) -> Result<Reply, DomainError> {
    let caller = guard((Operation::Update, Resource::Book), caller)?;
    let id = path_ids(path)?;
    let req = json_body(body)?;

    let mut errors = FieldErrors::new();
    let price = req.price.and_then(|p| p.parse("price", &mut errors));
    let status = match req.status.as_deref() {
        None => None,
        Some(raw) => match raw.parse::<BookStatus>() {
            Ok(status) => Some(status),
            Err(msg) => {
                errors.add("status", msg);
                None
            }
        },
    };
    errors.into_result()?;

    let changes = BookChanges {
        title: req.title,
        details: req.details,
        price,
        status,
    };
    dispatch(&state, caller, Command::UpdateBook { id, changes }).await
}

/// Soft delete: the book disappears from every listing
#[utoipa::path(
    delete,
    path = "/api/books/{id}",
    params(("id" = i32, Path, description = "Book id")),
    responses(
        (status = 200, description = "Book deleted"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Permission denied"),
        (status = 404, description = "Book not found")
    ),
    security(("bearer" = []))
)]
pub async fn delete_book(
    State(state): State<AppState>,
    caller: Caller,
    path: Result<Path<i32>, PathRejection>,
) -> Result<Reply, DomainError> {
    let id = path_ids(path)?;
    dispatch(&state, caller, Command::SoftDeleteBook { id }).await
}

async fn set_status(
    state: AppState,
    caller: Caller,
    path: Result<Path<i32>, PathRejection>,
    status: BookStatus,
) -> Result<Reply, DomainError> {
    let id = path_ids(path)?;
    dispatch(&state, caller, Command::SetBookStatus { id, status }).await
}

#[utoipa::path(
    patch,
    path = "/api/books/{id}/mark-sold",
    params(("id" = i32, Path, description = "Book id")),
    responses(
        (status = 200, description = "Book marked as sold", body = crate::models::Book),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Permission denied"),
        (status = 404, description = "Book not found")
    ),
    security(("bearer" = []))
)]
pub async fn mark_sold(
    State(state): State<AppState>,
    caller: Caller,
    path: Result<Path<i32>, PathRejection>,
) -> Result<Reply, DomainError> {
    set_status(state, caller, path, BookStatus::Sold).await
}

#[utoipa::path(
    patch,
    path = "/api/books/{id}/mark-reserved",
    params(("id" = i32, Path, description = "Book id")),
    responses(
        (status = 200, description = "Book marked as reserved", body = crate::models::Book),
        (status = 403, description = "Permission denied"),
        (status = 404, description = "Book not found")
    ),
    security(("bearer" = []))
)]
pub async fn mark_reserved(
    State(state): State<AppState>,
    caller: Caller,
    path: Result<Path<i32>, PathRejection>,
) -> Result<Reply, DomainError> {
    set_status(state, caller, path, BookStatus::Reserved).await
}

#[utoipa::path(
    patch,
    path = "/api/books/{id}/mark-available",
    params(("id" = i32, Path, description = "Book id")),
    responses(
        (status = 200, description = "Book marked as available", body = crate::models::Book),
        (status = 403, description = "Permission denied"),
        (status = 404, description = "Book not found")
    ),
    security(("bearer" = []))
)]
pub async fn mark_available(
    State(state): State<AppState>,
    caller: Caller,
    path: Result<Path<i32>, PathRejection>,
) -> Result<Reply, DomainError> {
    set_status(state, caller, path, BookStatus::Available).await
}

/// Attach a picture (multipart fields `image` and optional `is_cover`)
#[utoipa::path(
    post,
    path = "/api/books/{id}/images",
    params(("id" = i32, Path, description = "Book id")),
    responses(
        (status = 201, description = "Image stored", body = crate::models::Image),
        (status = 400, description = "Not an image"),
        (status = 403, description = "Permission denied"),
        (status = 404, description = "Book not found")
    ),
    security(("bearer" = []))
)]
pub async fn upload_image(
    State(state): State<AppState>,
    caller: Caller,
    path: Result<Path<i32>, PathRejection>,
    multipart: Multipart,
) -> Result<Reply, DomainError> {
    let caller = guard((Operation::Create, Resource::BookImage), caller)?;
    let book_id = path_ids(path)?;

    let upload = read_upload(multipart, "image").await?;
    let is_cover = truthy(upload.text("is_cover"));
    let (bytes, _) = upload.require_file()?;

    let command = Command::AddBookImage {
        book_id,
        bytes,
        is_cover,
    };
    dispatch(&state, caller, command).await
}

#[utoipa::path(
    delete,
    path = "/api/books/{id}/images/{image_id}",
    params(
        ("id" = i32, Path, description = "Book id"),
        ("image_id" = i32, Path, description = "Image id")
    ),
    responses(
        (status = 200, description = "Image removed"),
        (status = 403, description = "Permission denied"),
        (status = 404, description = "Book or image not found")
    ),
    security(("bearer" = []))
)]
pub async fn delete_image(
    State(state): State<AppState>,
    caller: Caller,
    path: Result<Path<(i32, i32)>, PathRejection>,
) -> Result<Reply, DomainError> {
    let (book_id, image_id) = path_ids(path)?;
    dispatch(&state, caller, Command::RemoveBookImage { book_id, image_id }).await
}
