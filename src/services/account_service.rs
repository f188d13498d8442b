//! Account Service - registration, credentials and own profile

use std::sync::Arc;

use crate::domain::{
    AccountChanges, AccountRepository, DomainError, FieldErrors, ImageRepository, MediaStorage,
    NewAccount, USERNAME_TAKEN, WishListRepository,
};
use crate::infrastructure::auth::{hash_password, verify_password};
use crate::models::Account;
use crate::services::uploads::image_extension;

pub const USERNAME_MAX_LEN: usize = 150;
pub const PASSWORD_MIN_LEN: usize = 8;

const ACCOUNT_IMAGE_FOLDER: &str = "accounts";
const BAD_CREDENTIALS: &str = "No active account found with the given credentials";

#[derive(Debug, Clone, Default)]
pub struct RegisterInput {
    pub username: String,
    pub password: String,
    /// Confirmation; checked only when present
    pub password2: Option<String>,
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

/// Own-profile update; `None` leaves a field untouched
#[derive(Debug, Clone, Default)]
pub struct AccountUpdate {
    pub username: Option<String>,
    pub password: Option<String>,
    pub email: Option<Option<String>>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

fn validate_username(username: &str, errors: &mut FieldErrors) {
    if username.is_empty() {
        errors.add("username", "This field may not be blank.");
    } else if username.chars().count() > USERNAME_MAX_LEN {
        errors.add(
            "username",
            "Ensure this field has no more than 150 characters.",
        );
    } else if !username
        .chars()
        .all(|c| c.is_alphanumeric() || "@.+-_".contains(c))
    {
        errors.add(
            "username",
            "Enter a valid username. This value may contain only letters, numbers, and @/./+/-/_ characters.",
        );
    }
}

fn validate_password(password: &str, errors: &mut FieldErrors) {
    if password.chars().count() < PASSWORD_MIN_LEN {
        errors.add(
            "password",
            "This password is too short. It must contain at least 8 characters.",
        );
    }
}

/// Blank emails are stored as NULL
fn normalize_email(email: Option<String>, errors: &mut FieldErrors) -> Option<String> {
    let email = email.map(|e| e.trim().to_string()).filter(|e| !e.is_empty())?;
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && domain.contains('.') => Some(email),
        _ => {
            errors.add("email", "Enter a valid email address.");
            None
        }
    }
}

fn hashed(password: &str) -> Result<String, DomainError> {
    hash_password(password).map_err(DomainError::Internal)
}

#[derive(Clone)]
pub struct AccountService {
    accounts: Arc<dyn AccountRepository>,
    wishlists: Arc<dyn WishListRepository>,
    images: Arc<dyn ImageRepository>,
    media: Arc<dyn MediaStorage>,
}

impl AccountService {
    pub fn new(
        accounts: Arc<dyn AccountRepository>,
        wishlists: Arc<dyn WishListRepository>,
        images: Arc<dyn ImageRepository>,
        media: Arc<dyn MediaStorage>,
    ) -> Self {
        Self {
            accounts,
            wishlists,
            images,
            media,
        }
    }

    /// Create an account together with its (empty) wishlist
    pub async fn register(&self, input: RegisterInput) -> Result<Account, DomainError> {
        let mut errors = FieldErrors::new();
        let username = input.username.trim().to_string();

        validate_username(&username, &mut errors);
        validate_password(&input.password, &mut errors);
        if let Some(confirmation) = &input.password2
            && confirmation != &input.password
        {
            errors.add("password2", "Password fields didn't match.");
        }
        let email = normalize_email(input.email, &mut errors);

        if !errors.contains("username") && self.accounts.username_taken(&username, None).await? {
            errors.add("username", USERNAME_TAKEN);
        }
        errors.into_result()?;

        let account = self
            .accounts
            .create(NewAccount {
                username,
                password_hash: hashed(&input.password)?,
                email,
                first_name: input.first_name.unwrap_or_default(),
                last_name: input.last_name.unwrap_or_default(),
            })
            .await?;

        if let Err(e) = self.wishlists.create_for_account(account.id).await {
            tracing::error!("Failed to create wishlist for account {}: {}", account.id, e);
            if let Err(cleanup) = self.accounts.delete(account.id).await {
                tracing::error!("Failed to roll back account {}: {}", account.id, cleanup);
            }
            return Err(e);
        }

        tracing::info!("Registered account {} ({})", account.id, account.username);
        Ok(account)
    }

    /// Check a username/password pair
    pub async fn authenticate(&self, username: &str, password: &str) -> Result<Account, DomainError> {
        let Some(stored) = self.accounts.find_credentials(username).await? else {
            tracing::warn!("Login attempt for unknown username {}", username);
            return Err(DomainError::Unauthenticated(BAD_CREDENTIALS.to_string()));
        };

        let valid = verify_password(password, &stored.password_hash).map_err(DomainError::Internal)?;
        if !valid {
            tracing::warn!("Wrong password for account {}", stored.account.id);
            return Err(DomainError::Unauthenticated(BAD_CREDENTIALS.to_string()));
        }

        Ok(stored.account)
    }

    pub async fn get(&self, id: i32) -> Result<Account, DomainError> {
        self.accounts
            .find_by_id(id)
            .await?
            .ok_or(DomainError::NotFound)
    }

    pub async fn update(&self, id: i32, update: AccountUpdate) -> Result<Account, DomainError> {
        let mut errors = FieldErrors::new();

        let username = update.username.map(|u| u.trim().to_string());
        if let Some(username) = &username {
            validate_username(username, &mut errors);
            if !errors.contains("username")
                && self.accounts.username_taken(username, Some(id)).await?
            {
                errors.add("username", USERNAME_TAKEN);
            }
        }
        if let Some(password) = &update.password {
            validate_password(password, &mut errors);
        }
        let email = update.email.map(|e| normalize_email(e, &mut errors));
        errors.into_result()?;

        let password_hash = match &update.password {
            Some(password) => Some(hashed(password)?),
            None => None,
        };

        let account = self
            .accounts
            .update(
                id,
                AccountChanges {
                    username,
                    password_hash,
                    email,
                    first_name: update.first_name,
                    last_name: update.last_name,
                    image: None,
                },
            )
            .await?;

        tracing::info!("Account {} updated its profile", id);
        Ok(account)
    }

    /// Delete the account; its books, images and wishlist go with it.
    ///
    /// Stored files are removed once the rows are gone. A file that can't be
    /// removed is logged and left behind.
    pub async fn delete(&self, id: i32) -> Result<(), DomainError> {
        let account = self.get(id).await?;

        let mut paths: Vec<String> = self
            .images
            .find_by_account(id)
            .await?
            .into_iter()
            .filter_map(|img| img.image)
            .collect();
        paths.extend(account.image);

        self.accounts.delete(id).await?;
        tracing::info!("Deleted account {} ({})", id, account.username);

        for path in paths {
            if let Err(e) = self.media.remove(&path).await {
                tracing::warn!("Failed to remove file {} of deleted account {}: {}", path, id, e);
            }
        }
        Ok(())
    }

    /// Replace the profile picture
    pub async fn set_image(&self, id: i32, bytes: &[u8]) -> Result<Account, DomainError> {
        let existing = self.get(id).await?;
        let extension = image_extension(bytes)?;
        let path = self.media.save(ACCOUNT_IMAGE_FOLDER, extension, bytes).await?;

        let changes = AccountChanges {
            image: Some(Some(path.clone())),
            ..Default::default()
        };
        let account = match self.accounts.update(id, changes).await {
            Ok(account) => account,
            Err(e) => {
                if let Err(cleanup) = self.media.remove(&path).await {
                    tracing::warn!("Failed to remove orphaned upload {}: {}", path, cleanup);
                }
                return Err(e);
            }
        };

        if let Some(old) = existing.image
            && let Err(e) = self.media.remove(&old).await
        {
            tracing::warn!("Failed to remove old profile image {}: {}", old, e);
        }

        Ok(account)
    }
}
