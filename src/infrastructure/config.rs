use std::env;
use std::path::PathBuf;

const DEV_JWT_SECRET: &str = "dev-secret-change-me";

#[derive(Clone, Debug)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    pub cors_allowed_origins: Vec<String>,
    pub media_root: PathBuf,
    pub jwt_secret: Option<String>,
    pub access_token_ttl_minutes: i64,
    pub refresh_token_ttl_hours: i64,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| "sqlite://bookmarket.db?mode=rwc".to_string()),
            port: env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(8000),
            cors_allowed_origins: env::var("CORS_ALLOWED_ORIGINS")
                .ok()
                .map(|s| {
                    s.split(',')
                        .map(|s| s.trim().to_string())
                        .filter(|s| !s.is_empty())
                        .collect()
                })
                .unwrap_or_default(),
            media_root: env::var("MEDIA_ROOT")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("media")),
            jwt_secret: env::var("JWT_SECRET").ok().filter(|s| !s.is_empty()),
            access_token_ttl_minutes: env::var("ACCESS_TOKEN_TTL_MINUTES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(60),
            refresh_token_ttl_hours: env::var("REFRESH_TOKEN_TTL_HOURS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(24 * 7),
        }
    }

    /// Signing secret for tokens. Debug builds fall back to a fixed dev
    /// secret; release builds require `JWT_SECRET`.
    pub fn resolved_jwt_secret(&self) -> Option<String> {
        self.jwt_secret.clone().or_else(|| {
            if cfg!(debug_assertions) {
                tracing::warn!("JWT_SECRET not set, using the development secret");
                Some(DEV_JWT_SECRET.to_string())
            } else {
                None
            }
        })
    }
}
