use crate::api;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

#[derive(OpenApi)]
#[openapi(
    paths(
        api::health::health_check,
        api::auth::obtain_token,
        api::auth::refresh_token,
        api::accounts::register,
        api::accounts::get_me,
        api::accounts::update_me,
        api::accounts::delete_me,
        api::accounts::upload_image,
        api::wishlist::list_wishlist,
        api::wishlist::add_book,
        api::wishlist::remove_book,
        api::books::list_books,
        api::books::list_my_books,
        api::books::get_book,
        api::books::create_book,
        api::books::update_book,
        api::books::delete_book,
        api::books::mark_sold,
        api::books::mark_reserved,
        api::books::mark_available,
        api::books::upload_image,
        api::books::delete_image,
    ),
    components(
        schemas(
            crate::models::Account,
            crate::models::Book,
            crate::models::BookStatus,
            crate::models::Image,
            crate::infrastructure::auth::TokenPair,
            api::auth::TokenRequest,
            api::auth::RefreshRequest,
            api::accounts::RegisterRequest,
            api::accounts::UpdateAccountRequest,
            api::books::CreateBookRequest,
            api::books::UpdateBookRequest,
        )
    ),
    modifiers(&BearerAuth),
    tags(
        (name = "bookmarket", description = "Book marketplace API")
    )
)]
pub struct ApiDoc;

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}
