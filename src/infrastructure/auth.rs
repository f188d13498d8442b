use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header, request::Parts},
};

use crate::domain::{AccountRepository, DomainError};
use crate::infrastructure::AppState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    Access,
    Refresh,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // account id
    pub username: String,
    pub token_type: TokenType,
    pub exp: usize,
}

impl Claims {
    pub fn account_id(&self) -> Option<i32> {
        self.sub.parse().ok()
    }
}

#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct TokenPair {
    pub access: String,
    pub refresh: String,
}

pub fn hash_password(password: &str) -> Result<String, String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let password_hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| e.to_string())?
        .to_string();
    Ok(password_hash)
}

pub fn verify_password(password: &str, password_hash: &str) -> Result<bool, String> {
    let parsed_hash = PasswordHash::new(password_hash).map_err(|e| e.to_string())?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

/// Issues and checks HS256 bearer tokens
#[derive(Clone)]
pub struct TokenService {
    secret: String,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl TokenService {
    pub fn new(secret: impl Into<String>, access_ttl: Duration, refresh_ttl: Duration) -> Self {
        Self {
            secret: secret.into(),
            access_ttl,
            refresh_ttl,
        }
    }

    fn issue(
        &self,
        account_id: i32,
        username: &str,
        token_type: TokenType,
    ) -> Result<String, DomainError> {
        let ttl = match token_type {
            TokenType::Access => self.access_ttl,
            TokenType::Refresh => self.refresh_ttl,
        };
        let expiration = Utc::now()
            .checked_add_signed(ttl)
            .ok_or_else(|| DomainError::Internal("Token expiry out of range".to_string()))?
            .timestamp();

        let claims = Claims {
            sub: account_id.to_string(),
            username: username.to_owned(),
            token_type,
            exp: expiration as usize,
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
        .map_err(|e| DomainError::Internal(e.to_string()))
    }

    pub fn issue_pair(&self, account_id: i32, username: &str) -> Result<TokenPair, DomainError> {
        Ok(TokenPair {
            access: self.issue(account_id, username, TokenType::Access)?,
            refresh: self.issue(account_id, username, TokenType::Refresh)?,
        })
    }

    pub fn decode(&self, token: &str) -> Result<Claims, DomainError> {
        decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &Validation::default(),
        )
        .map(|data| data.claims)
        .map_err(|_| DomainError::Unauthenticated("Token is invalid or expired".to_string()))
    }

    /// Exchange a refresh token for a fresh access token
    pub fn refresh(&self, refresh_token: &str) -> Result<String, DomainError> {
        let claims = self.decode(refresh_token)?;
        if claims.token_type != TokenType::Refresh {
            return Err(DomainError::Unauthenticated(
                "Token has wrong type".to_string(),
            ));
        }
        let account_id = claims
            .account_id()
            .ok_or_else(|| DomainError::Unauthenticated("Token is invalid or expired".to_string()))?;
        self.issue(account_id, &claims.username, TokenType::Access)
    }
}

/// The account a request acts as, taken from a bearer access token.
///
/// The account must still exist. Handlers take it as `Result<CurrentAccount, DomainError>`
/// so public commands can ignore a bad token.
#[derive(Debug, Clone)]
pub struct CurrentAccount {
    pub id: i32,
    pub username: String,
}

#[async_trait]
impl FromRequestParts<AppState> for CurrentAccount {
    type Rejection = DomainError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .ok_or_else(|| {
                DomainError::Unauthenticated(
                    "Authentication credentials were not provided.".to_string(),
                )
            })?;

        let token = auth_header.strip_prefix("Bearer ").ok_or_else(|| {
            DomainError::Unauthenticated("Invalid Authorization header format".to_string())
        })?;

        let claims = state.tokens.decode(token)?;
        if claims.token_type != TokenType::Access {
            return Err(DomainError::Unauthenticated(
                "Token has wrong type".to_string(),
            ));
        }

        let id = claims
            .account_id()
            .ok_or_else(|| DomainError::Unauthenticated("Token is invalid or expired".to_string()))?;

        // Tokens outlive deleted accounts
        let account = state.account_repo.find_by_id(id).await?.ok_or_else(|| {
            tracing::warn!("Token presented for deleted account {}", id);
            DomainError::Unauthenticated("User not found".to_string())
        })?;

        Ok(CurrentAccount {
            id: account.id,
            username: account.username,
        })
    }
}
