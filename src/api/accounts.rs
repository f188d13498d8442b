//! Account handlers: registration and the caller's own profile

use axum::{
    Json,
    extract::{Multipart, State, rejection::JsonRejection},
};
use serde::Deserialize;
use utoipa::ToSchema;

use super::commands::{Caller, Command, Operation, Resource, dispatch, guard};
use super::response::Reply;
use super::{double_option, json_body, read_upload};
use crate::domain::DomainError;
use crate::infrastructure::AppState;
use crate::services::{AccountUpdate, RegisterInput};

#[derive(Debug, Deserialize, ToSchema)]
pub struct RegisterRequest {
    pub username: Option<String>,
    pub password: Option<String>,
    pub password2: Option<String>,
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateAccountRequest {
    pub username: Option<String>,
    pub password: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub email: Option<Option<String>>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

#[utoipa::path(
    post,
    path = "/api/accounts/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created", body = crate::models::Account),
        (status = 400, description = "Invalid data")
    )
)]
pub async fn register(
    State(state): State<AppState>,
    caller: Caller,
    body: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<Reply, DomainError> {
    let req = json_body(body)?;
    let input = RegisterInput {
        username: req.username.unwrap_or_default(),
        password: req.password.unwrap_or_default(),
        password2: req.password2,
        email: req.email,
        first_name: req.first_name,
        last_name: req.last_name,
    };
    dispatch(&state, caller, Command::Register(input)).await
}

#[utoipa::path(
    get,
    path = "/api/accounts/me",
    responses(
        (status = 200, description = "Current account", body = crate::models::Account),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer" = []))
)]
pub async fn get_me(State(state): State<AppState>, caller: Caller) -> Result<Reply, DomainError> {
    dispatch(&state, caller, Command::GetOwnAccount).await
}

#[utoipa::path(
    put,
    path = "/api/accounts/me",
    request_body = UpdateAccountRequest,
    responses(
        (status = 200, description = "Account updated", body = crate::models::Account),
        (status = 400, description = "Invalid data"),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer" = []))
)]
pub async fn update_me(
    State(state): State<AppState>,
    caller: Caller,
    body: Result<Json<UpdateAccountRequest>, JsonRejection>,
) -> Result<Reply, DomainError> {
    let caller = guard((Operation::Update, Resource::Account), caller)?;
    let req = json_body(body)?;
    let update = AccountUpdate {
        username: req.username,
        password: req.password,
        email: req.email,
        first_name: req.first_name,
        last_name: req.last_name,
    };
    dispatch(&state, caller, Command::UpdateOwnAccount(update)).await
}

/// Delete the caller's account along with its books and wishlist
#[utoipa::path(
    delete,
    path = "/api/accounts/me",
    responses(
        (status = 200, description = "Account deleted"),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer" = []))
)]
pub async fn delete_me(State(state): State<AppState>, caller: Caller) -> Result<Reply, DomainError> {
    dispatch(&state, caller, Command::DeleteOwnAccount).await
}

/// Replace the profile picture (multipart field `image`)
#[utoipa::path(
    put,
    path = "/api/accounts/me/image",
    responses(
        (status = 200, description = "Profile image stored", body = crate::models::Account),
        (status = 400, description = "Not an image"),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer" = []))
)]
pub async fn upload_image(
    State(state): State<AppState>,
    caller: Caller,
    multipart: Multipart,
) -> Result<Reply, DomainError> {
    let caller = guard((Operation::SetImage, Resource::Account), caller)?;
    let (bytes, _) = read_upload(multipart, "image").await?.require_file()?;
    dispatch(&state, caller, Command::SetAccountImage { bytes }).await
}
