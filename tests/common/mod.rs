#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode, header},
};
use bookmarket::config::Config;
use bookmarket::db;
use bookmarket::infrastructure::auth::TokenService;
use bookmarket::infrastructure::{AppState, LocalMediaStorage};
use bookmarket::server;
use serde_json::{Value, json};
use tower::util::ServiceExt; // for `oneshot`

pub const PASSWORD: &str = "testpassword123";
pub const PNG_BYTES: &[u8] = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR";

pub struct TestApp {
    pub state: AppState,
    pub router: Router,
    pub media: tempfile::TempDir,
}

// Helper to create a test app backed by an in-memory database
pub async fn setup() -> TestApp {
    let db = db::init_db("sqlite::memory:")
        .await
        .expect("Failed to init DB");
    let media = tempfile::tempdir().expect("Failed to create media dir");

    let config = Config {
        database_url: "sqlite::memory:".to_string(),
        port: 0,
        cors_allowed_origins: Vec::new(),
        media_root: media.path().to_path_buf(),
        jwt_secret: Some("test-secret".to_string()),
        access_token_ttl_minutes: 5,
        refresh_token_ttl_hours: 1,
    };
    let tokens = TokenService::new(
        "test-secret",
        chrono::Duration::minutes(5),
        chrono::Duration::hours(1),
    );

    let state = AppState::new(
        db,
        tokens,
        Arc::new(LocalMediaStorage::new(media.path())),
    );
    let router = server::build_router(state.clone(), &config);

    TestApp {
        state,
        router,
        media,
    }
}

impl TestApp {
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let req = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        self.send(req).await
    }

    pub async fn send(&self, req: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(req).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, body)
    }

    /// Register an account and return (account id, access token)
    pub async fn signup(&self, username: &str) -> (i64, String) {
        let (status, body) = self
            .request(
                Method::POST,
                "/api/accounts/register",
                None,
                Some(json!({
                    "username": username,
                    "password": PASSWORD,
                    "password2": PASSWORD,
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "register failed: {}", body);
        let id = body["data"]["id"].as_i64().unwrap();

        let (status, body) = self
            .request(
                Method::POST,
                "/api/token",
                None,
                Some(json!({"username": username, "password": PASSWORD})),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "login failed: {}", body);
        let access = body["data"]["access"].as_str().unwrap().to_string();

        (id, access)
    }

    /// List a book and return its id
    pub async fn create_book(&self, token: &str, title: &str, price: f64) -> i64 {
        let (status, body) = self
            .request(
                Method::POST,
                "/api/books",
                Some(token),
                Some(json!({"title": title, "details": "Good condition", "price": price})),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "create failed: {}", body);
        body["data"]["id"].as_i64().unwrap()
    }

    /// Multipart upload with a single file field plus text fields
    pub async fn upload(
        &self,
        method: Method,
        uri: &str,
        token: &str,
        bytes: &[u8],
        fields: &[(&str, &str)],
    ) -> (StatusCode, Value) {
        let boundary = "XBOUNDARYX";
        let mut body: Vec<u8> = Vec::new();
        for (name, value) in fields {
            body.extend_from_slice(
                format!(
                    "--{}\r\nContent-Disposition: form-data; name=\"{}\"\r\n\r\n{}\r\n",
                    boundary, name, value
                )
                .as_bytes(),
            );
        }
        body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"image\"; filename=\"upload.png\"\r\nContent-Type: application/octet-stream\r\n\r\n",
                boundary
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(format!("\r\n--{}--\r\n", boundary).as_bytes());

        let req = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::AUTHORIZATION, format!("Bearer {}", token))
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={}", boundary),
            )
            .body(Body::from(body))
            .unwrap();
        self.send(req).await
    }
}

pub fn ids(page: &Value) -> Vec<i64> {
    page["data"]["results"]
        .as_array()
        .map(|books| books.iter().filter_map(|b| b["id"].as_i64()).collect())
        .unwrap_or_default()
}
