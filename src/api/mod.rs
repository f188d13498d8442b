pub mod accounts;
pub mod auth;
pub mod books;
pub mod commands;
pub mod health;
pub mod response;
pub mod wishlist;

use axum::{
    Json, Router,
    extract::{
        DefaultBodyLimit, Multipart, Path,
        rejection::{JsonRejection, PathRejection},
    },
    routing::{delete, get, patch, post, put},
};
use serde::{Deserialize, Deserializer};

use crate::domain::{DomainError, FieldErrors};
use crate::infrastructure::AppState;

/// Largest accepted request body (image uploads)
pub const MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;

pub fn api_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(health::health_check))
        // Auth
        .route("/token", post(auth::obtain_token))
        .route("/token/refresh", post(auth::refresh_token))
        // Accounts
        .route("/accounts/register", post(accounts::register))
        .route(
            "/accounts/me",
            get(accounts::get_me)
                .put(accounts::update_me)
                .patch(accounts::update_me)
                .delete(accounts::delete_me),
        )
        .route("/accounts/me/image", put(accounts::upload_image))
        // Wishlist
        .route("/accounts/my-wish-list", get(wishlist::list_wishlist))
        .route(
            "/accounts/:book_id/wishlist-add-book",
            post(wishlist::add_book),
        )
        .route(
            "/accounts/:book_id/wishlist-remove-book",
            delete(wishlist::remove_book),
        )
        // Books
        .route("/books", get(books::list_books).post(books::create_book))
        .route("/books/mine", get(books::list_my_books))
        .route(
            "/books/:id",
            get(books::get_book)
                .put(books::update_book)
                .patch(books::update_book)
                .delete(books::delete_book),
        )
        .route("/books/:id/mark-sold", patch(books::mark_sold))
        .route("/books/:id/mark-reserved", patch(books::mark_reserved))
        .route("/books/:id/mark-available", patch(books::mark_available))
        .route("/books/:id/images", post(books::upload_image))
        .route(
            "/books/:id/images/:image_id",
            delete(books::delete_image),
        )
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .with_state(state)
}

/// Unwrap a JSON body, reporting malformed input in the validation envelope
pub(crate) fn json_body<T>(body: Result<Json<T>, JsonRejection>) -> Result<T, DomainError> {
    body.map(|Json(value)| value)
        .map_err(|e| DomainError::validation("non_field_errors", e.body_text()))
}

/// Unwrap path ids; anything that isn't an id can't exist
pub(crate) fn path_ids<T>(path: Result<Path<T>, PathRejection>) -> Result<T, DomainError> {
    path.map(|Path(ids)| ids).map_err(|_| DomainError::NotFound)
}

/// Distinguish an absent field (`None`) from an explicit `null` (`Some(None)`)
pub(crate) fn double_option<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// A number sent either as JSON number or as numeric string
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Number {
    Float(f64),
    Text(String),
}

impl Number {
    pub(crate) fn parse(self, field: &str, errors: &mut FieldErrors) -> Option<f64> {
        let value = match self {
            Number::Float(v) => Some(v),
            Number::Text(s) => s.trim().parse::<f64>().ok(),
        };
        if value.is_none() {
            errors.add(field, "A valid number is required.");
        }
        value
    }
}

/// Uploaded file plus the text fields sent alongside it
pub(crate) struct Upload {
    pub bytes: Option<Vec<u8>>,
    pub fields: Vec<(String, String)>,
}

impl Upload {
    pub(crate) fn text(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub(crate) fn require_file(self) -> Result<(Vec<u8>, Vec<(String, String)>), DomainError> {
        match self.bytes {
            Some(bytes) => Ok((bytes, self.fields)),
            None => Err(DomainError::validation(
                "image",
                "No file was submitted.",
            )),
        }
    }
}

/// Read a multipart form; the file is expected in `file_field`
pub(crate) async fn read_upload(
    mut multipart: Multipart,
    file_field: &str,
) -> Result<Upload, DomainError> {
    let mut upload = Upload {
        bytes: None,
        fields: Vec::new(),
    };

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => return Err(DomainError::validation("non_field_errors", e.body_text())),
        };

        let name = field.name().unwrap_or_default().to_string();
        if name == file_field {
            let bytes = field
                .bytes()
                .await
                .map_err(|e| DomainError::validation(file_field, e.body_text()))?;
            upload.bytes = Some(bytes.to_vec());
        } else {
            let value = field
                .text()
                .await
                .map_err(|e| DomainError::validation(&name, e.body_text()))?;
            upload.fields.push((name, value));
        }
    }

    Ok(upload)
}

/// Form-style boolean: true/1/on/yes
pub(crate) fn truthy(value: Option<&str>) -> bool {
    matches!(
        value.map(|v| v.trim().to_ascii_lowercase()).as_deref(),
        Some("true" | "1" | "on" | "yes")
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Deserialize)]
    struct Patch {
        #[serde(default, deserialize_with = "double_option")]
        details: Option<Option<String>>,
    }

    #[test]
    fn double_option_tells_null_from_absent() {
        let absent: Patch = serde_json::from_str("{}").unwrap();
        assert_eq!(absent.details, None);

        let null: Patch = serde_json::from_str(r#"{"details": null}"#).unwrap();
        assert_eq!(null.details, Some(None));

        let set: Patch = serde_json::from_str(r#"{"details": "x"}"#).unwrap();
        assert_eq!(set.details, Some(Some("x".to_string())));
    }

    #[test]
    fn numbers_accept_strings() {
        let mut errors = FieldErrors::new();
        assert_eq!(Number::Text("12.5".into()).parse("price", &mut errors), Some(12.5));
        assert_eq!(Number::Float(3.0).parse("price", &mut errors), Some(3.0));
        assert!(errors.is_empty());

        assert_eq!(Number::Text("cheap".into()).parse("price", &mut errors), None);
        assert!(errors.contains("price"));
    }

    #[test]
    fn form_booleans() {
        assert!(truthy(Some("true")));
        assert!(truthy(Some("1")));
        assert!(!truthy(Some("false")));
        assert!(!truthy(None));
    }
}
