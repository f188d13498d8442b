use axum::extract::State;

use super::commands::{Caller, Command, dispatch};
use super::response::Reply;
use crate::domain::DomainError;
use crate::infrastructure::AppState;

#[utoipa::path(
    get,
    path = "/api/health",
    responses(
        (status = 200, description = "Service is healthy")
    )
)]
pub async fn health_check(
    State(state): State<AppState>,
    caller: Caller,
) -> Result<Reply, DomainError> {
    dispatch(&state, caller, Command::Health).await
}
