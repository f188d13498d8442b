use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
};
use serde::Deserialize;
use utoipa::ToSchema;

use super::commands::{Caller, Command, dispatch, not_provided};
use super::json_body;
use super::response::Reply;
use crate::domain::{DomainError, FieldErrors};
use crate::infrastructure::AppState;

#[derive(Debug, Deserialize, ToSchema)]
pub struct TokenRequest {
    pub username: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct RefreshRequest {
    pub refresh: Option<String>,
}

fn required(value: Option<String>, field: &str, errors: &mut FieldErrors) -> String {
    match value.filter(|v| !v.is_empty()) {
        Some(v) => v,
        None => {
            errors.add(field, "This field is required.");
            String::new()
        }
    }
}

/// Token endpoints run without a caller
fn anonymous() -> Caller {
    Err(not_provided())
}

/// Exchange username and password for an access/refresh token pair
#[utoipa::path(
    post,
    path = "/api/token",
    request_body = TokenRequest,
    responses(
        (status = 200, description = "Token pair issued", body = crate::infrastructure::auth::TokenPair),
        (status = 400, description = "Missing fields"),
        (status = 401, description = "Bad credentials")
    )
)]
pub async fn obtain_token(
    State(state): State<AppState>,
    body: Result<Json<TokenRequest>, JsonRejection>,
) -> Result<Reply, DomainError> {
    let req = json_body(body)?;

    let mut errors = FieldErrors::new();
    let username = required(req.username, "username", &mut errors);
    let password = required(req.password, "password", &mut errors);
    errors.into_result()?;

    dispatch(&state, anonymous(), Command::ObtainToken { username, password }).await
}

/// Exchange a refresh token for a new access token
#[utoipa::path(
    post,
    path = "/api/token/refresh",
    request_body = RefreshRequest,
    responses(
        (status = 200, description = "New access token"),
        (status = 401, description = "Refresh token invalid or expired")
    )
)]
pub async fn refresh_token(
    State(state): State<AppState>,
    body: Result<Json<RefreshRequest>, JsonRejection>,
) -> Result<Reply, DomainError> {
    let req = json_body(body)?;

    let mut errors = FieldErrors::new();
    let refresh = required(req.refresh, "refresh", &mut errors);
    errors.into_result()?;

    dispatch(&state, anonymous(), Command::RefreshToken { refresh }).await
}
