mod common;

use axum::http::{Method, StatusCode};
use bookmarket::domain::{BookRepository, WishListRepository};

use common::{ids, setup};

fn add_uri(book: i64) -> String {
    format!("/api/accounts/{}/wishlist-add-book", book)
}

fn remove_uri(book: i64) -> String {
    format!("/api/accounts/{}/wishlist-remove-book", book)
}

#[tokio::test]
async fn test_book_wishlist_lifecycle() {
    let app = setup().await;
    let (account_id, token) = app.signup("reader").await;

    // Wishlist exists and starts empty
    let (status, body) = app
        .request(Method::GET, "/api/accounts/my-wish-list", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["count"], 0);

    let book = app.create_book(&token, "Test book", 30000.0).await;

    let (status, body) = app.request(Method::POST, &add_uri(book), Some(&token), None).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["success"], true);
    assert_eq!(body["message"], "Book added to wishlist!");

    let (status, body) = app.request(Method::POST, &add_uri(book), Some(&token), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "Book is already in wishlist.");

    let (_, body) = app
        .request(Method::GET, "/api/accounts/my-wish-list", Some(&token), None)
        .await;
    assert_eq!(ids(&body), vec![book]);

    let (status, body) = app
        .request(
            Method::PATCH,
            &format!("/api/books/{}/mark-sold", book),
            Some(&token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "sold");

    let (status, _) = app
        .request(Method::DELETE, &format!("/api/books/{}", book), Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::OK);

    let (_, listing) = app.request(Method::GET, "/api/books", None, None).await;
    assert!(ids(&listing).is_empty());
    let (_, wishlist) = app
        .request(Method::GET, "/api/accounts/my-wish-list", Some(&token), None)
        .await;
    assert!(ids(&wishlist).is_empty());

    assert_eq!(app.state.book_repo.count_all().await.unwrap(), 1);
    let stored = app
        .state
        .wishlist_repo
        .find_by_account(account_id as i32)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(app.state.wishlist_repo.count_members(stored.id).await.unwrap(), 1);
}

#[tokio::test]
async fn test_remove_from_wishlist() {
    let app = setup().await;
    let (_, seller) = app.signup("seller").await;
    let (_, reader) = app.signup("reader").await;
    let book = app.create_book(&seller, "Dune", 12.0).await;

    let (status, body) = app.request(Method::DELETE, &remove_uri(book), Some(&reader), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Book is not in wishlist.");

    app.request(Method::POST, &add_uri(book), Some(&reader), None).await;

    let (status, body) = app.request(Method::DELETE, &remove_uri(book), Some(&reader), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["message"], "Book removed from wishlist.");

    let (status, _) = app.request(Method::DELETE, &remove_uri(book), Some(&reader), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_wishlists_are_per_account() {
    let app = setup().await;
    let (_, seller) = app.signup("seller").await;
    let (_, reader) = app.signup("reader").await;
    let book = app.create_book(&seller, "Dune", 12.0).await;

    let (status, _) = app.request(Method::POST, &add_uri(book), Some(&reader), None).await;
    assert_eq!(status, StatusCode::CREATED);

    let (_, seller_list) = app
        .request(Method::GET, "/api/accounts/my-wish-list", Some(&seller), None)
        .await;
    assert!(ids(&seller_list).is_empty());

    // The seller's own add is independent of the reader's
    let (status, _) = app.request(Method::POST, &add_uri(book), Some(&seller), None).await;
    assert_eq!(status, StatusCode::CREATED);
}

#[tokio::test]
async fn test_wishlist_rejects_missing_and_deleted_books() {
    let app = setup().await;
    let (_, token) = app.signup("reader").await;
    let book = app.create_book(&token, "Dune", 12.0).await;
    app.request(Method::DELETE, &format!("/api/books/{}", book), Some(&token), None)
        .await;

    let (status, _) = app.request(Method::POST, &add_uri(book), Some(&token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = app.request(Method::DELETE, &remove_uri(book), Some(&token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = app.request(Method::POST, &add_uri(9999), Some(&token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_wishlist_requires_auth() {
    let app = setup().await;
    let (_, token) = app.signup("reader").await;
    let book = app.create_book(&token, "Dune", 12.0).await;

    let (status, _) = app
        .request(Method::GET, "/api/accounts/my-wish-list", None, None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let (status, _) = app.request(Method::POST, &add_uri(book), None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let (status, _) = app.request(Method::DELETE, &remove_uri(book), None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_wishlist_is_title_ordered() {
    let app = setup().await;
    let (_, token) = app.signup("reader").await;
    let zen = app.create_book(&token, "Zen", 1.0).await;
    let alpha = app.create_book(&token, "Alpha", 1.0).await;
    for book in [zen, alpha] {
        app.request(Method::POST, &add_uri(book), Some(&token), None).await;
    }

    let (_, body) = app
        .request(Method::GET, "/api/accounts/my-wish-list", Some(&token), None)
        .await;
    assert_eq!(ids(&body), vec![alpha, zen]);
}
