mod common;

use axum::http::{Method, StatusCode};
use bookmarket::domain::{AccountRepository, BookRepository, ImageRepository, WishListRepository};
use serde_json::json;

use common::{PASSWORD, PNG_BYTES, setup};

#[tokio::test]
async fn test_register_creates_account_and_wishlist() {
    let app = setup().await;

    let (status, body) = app
        .request(
            Method::POST,
            "/api/accounts/register",
            None,
            Some(json!({
                "username": "reader",
                "password": PASSWORD,
                "password2": PASSWORD,
                "email": "reader@example.com",
                "first_name": "Ada",
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["username"], "reader");
    assert_eq!(body["data"]["first_name"], "Ada");
    assert!(body["data"].get("password_hash").is_none());

    let id = body["data"]["id"].as_i64().unwrap() as i32;
    assert!(app.state.wishlist_repo.find_by_account(id).await.unwrap().is_some());
}

#[tokio::test]
async fn test_register_validation() {
    let app = setup().await;
    app.signup("reader").await;

    let (status, body) = app
        .request(
            Method::POST,
            "/api/accounts/register",
            None,
            Some(json!({"username": "reader", "password": PASSWORD})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["errors"]["username"][0],
        "A user with that username already exists."
    );

    let (status, body) = app
        .request(
            Method::POST,
            "/api/accounts/register",
            None,
            Some(json!({"username": "other", "password": PASSWORD, "password2": "nope12345"})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["errors"]["password2"].is_array());

    let (status, _) = app
        .request(Method::POST, "/api/accounts/register", None, Some(json!("garbage")))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    assert_eq!(app.state.account_repo.count().await.unwrap(), 1);
}

#[tokio::test]
async fn test_token_flow() {
    let app = setup().await;
    app.signup("reader").await;

    let (status, body) = app
        .request(
            Method::POST,
            "/api/token",
            None,
            Some(json!({"username": "reader", "password": "wrong-password"})),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(
        body["message"],
        "No active account found with the given credentials"
    );

    let (status, body) = app
        .request(
            Method::POST,
            "/api/token",
            None,
            Some(json!({"username": "reader", "password": PASSWORD})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let access = body["data"]["access"].as_str().unwrap().to_string();
    let refresh = body["data"]["refresh"].as_str().unwrap().to_string();

    // A refresh token is not an access token
    let (status, _) = app
        .request(Method::GET, "/api/accounts/me", Some(&refresh), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = app
        .request(
            Method::POST,
            "/api/token/refresh",
            None,
            Some(json!({"refresh": refresh})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let renewed = body["data"]["access"].as_str().unwrap().to_string();

    for token in [access, renewed] {
        let (status, body) = app
            .request(Method::GET, "/api/accounts/me", Some(&token), None)
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["username"], "reader");
    }

    let (status, _) = app
        .request(
            Method::POST,
            "/api/token/refresh",
            None,
            Some(json!({"refresh": "garbage"})),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_me_requires_auth() {
    let app = setup().await;

    let (status, body) = app.request(Method::GET, "/api/accounts/me", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["success"], false);

    let (status, _) = app
        .request(Method::GET, "/api/accounts/me", Some("forged.token.value"), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_update_own_account() {
    let app = setup().await;
    let (_, token) = app.signup("reader").await;
    app.signup("taken").await;

    let (status, body) = app
        .request(
            Method::PATCH,
            "/api/accounts/me",
            Some(&token),
            Some(json!({"username": "taken"})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["errors"]["username"].is_array());

    let (status, body) = app
        .request(
            Method::PUT,
            "/api/accounts/me",
            Some(&token),
            Some(json!({"first_name": "Ada", "email": "ada@example.com"})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["first_name"], "Ada");
    assert_eq!(body["data"]["email"], "ada@example.com");
    assert_eq!(body["data"]["username"], "reader");
}

#[tokio::test]
async fn test_profile_image_upload() {
    let app = setup().await;
    let (_, token) = app.signup("reader").await;

    let (status, body) = app
        .upload(Method::PUT, "/api/accounts/me/image", &token, PNG_BYTES, &[])
        .await;
    assert_eq!(status, StatusCode::OK, "body: {}", body);
    let path = body["data"]["image"].as_str().unwrap();
    assert!(path.starts_with("accounts/"));
    assert!(app.media.path().join(path).exists());

    let (status, _) = app
        .upload(Method::PUT, "/api/accounts/me/image", &token, b"text", &[])
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_delete_account_cascades() {
    let app = setup().await;
    let (_, seller) = app.signup("seller").await;
    let (reader_id, reader) = app.signup("reader").await;

    let book = app.create_book(&seller, "Dune", 12.0).await;
    app.upload(
        Method::POST,
        &format!("/api/books/{}/images", book),
        &seller,
        PNG_BYTES,
        &[("is_cover", "true")],
    )
    .await;
    app.request(
        Method::POST,
        &format!("/api/accounts/{}/wishlist-add-book", book),
        Some(&reader),
        None,
    )
    .await;

    let (status, _) = app
        .request(Method::DELETE, "/api/accounts/me", Some(&seller), None)
        .await;
    assert_eq!(status, StatusCode::OK);

    assert_eq!(app.state.account_repo.count().await.unwrap(), 1);
    assert_eq!(app.state.book_repo.count_all().await.unwrap(), 0);
    assert_eq!(app.state.image_repo.count().await.unwrap(), 0);
    assert_eq!(app.state.wishlist_repo.count().await.unwrap(), 1);

    let reader_list = app
        .state
        .wishlist_repo
        .find_by_account(reader_id as i32)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(
        app.state.wishlist_repo.count_members(reader_list.id).await.unwrap(),
        0
    );

    // The token outlives the account but no longer authenticates
    let (status, _) = app
        .request(Method::GET, "/api/accounts/me", Some(&seller), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_token_of_deleted_account_is_rejected() {
    let app = setup().await;
    let (_, seller) = app.signup("seller").await;
    let (_, reader) = app.signup("reader").await;
    let other_book = app.create_book(&reader, "Emma", 8.0).await;

    let (status, _) = app
        .request(Method::DELETE, "/api/accounts/me", Some(&seller), None)
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = app
        .request(
            Method::POST,
            "/api/books",
            Some(&seller),
            Some(json!({"title": "Ghost", "price": 10.0})),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED, "{}", body);
    assert_eq!(body["success"], false);

    let (status, _) = app
        .upload(
            Method::POST,
            &format!("/api/books/{}/images", other_book),
            &seller,
            PNG_BYTES,
            &[],
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app
        .request(
            Method::POST,
            &format!("/api/accounts/{}/wishlist-add-book", other_book),
            Some(&seller),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    assert_eq!(app.state.book_repo.count_all().await.unwrap(), 1);
    assert_eq!(app.state.image_repo.count().await.unwrap(), 0);
}

#[tokio::test]
async fn test_health() {
    let app = setup().await;
    let (status, body) = app.request(Method::GET, "/api/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "ok");
}
