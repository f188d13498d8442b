//! SeaORM implementation of AccountRepository

use async_trait::async_trait;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, Set, SqlErr,
};

use crate::domain::{
    AccountChanges, AccountRepository, DomainError, NewAccount, StoredCredentials, USERNAME_TAKEN,
};
use crate::models::Account;
use crate::models::account::{ActiveModel, Column, Entity as AccountEntity};

/// SeaORM-based implementation of AccountRepository
pub struct SeaOrmAccountRepository {
    db: DatabaseConnection,
}

impl SeaOrmAccountRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

/// The only unique column besides the key is the username
fn username_conflict(err: DbErr) -> DomainError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(detail)) => {
            tracing::warn!("Username collision on write: {}", detail);
            DomainError::validation("username", USERNAME_TAKEN)
        }
        _ => err.into(),
    }
}

#[async_trait]
impl AccountRepository for SeaOrmAccountRepository {
    async fn create(&self, input: NewAccount) -> Result<Account, DomainError> {
        let account = ActiveModel {
            username: Set(input.username),
            password_hash: Set(input.password_hash),
            email: Set(input.email),
            first_name: Set(input.first_name),
            last_name: Set(input.last_name),
            image: Set(None),
            date_joined: Set(chrono::Utc::now().to_rfc3339()),
            ..Default::default()
        };

        let result = account.insert(&self.db).await.map_err(username_conflict)?;
        Ok(Account::from(result))
    }

    async fn find_by_id(&self, id: i32) -> Result<Option<Account>, DomainError> {
        let model = AccountEntity::find_by_id(id).one(&self.db).await?;
        Ok(model.map(Account::from))
    }

    async fn find_credentials(
        &self,
        username: &str,
    ) -> Result<Option<StoredCredentials>, DomainError> {
        let model = AccountEntity::find()
            .filter(Column::Username.eq(username))
            .one(&self.db)
            .await?;

        Ok(model.map(|m| StoredCredentials {
            password_hash: m.password_hash.clone(),
            account: Account::from(m),
        }))
    }

    async fn username_taken(
        &self,
        username: &str,
        except: Option<i32>,
    ) -> Result<bool, DomainError> {
        let mut query = AccountEntity::find().filter(Column::Username.eq(username));
        if let Some(id) = except {
            query = query.filter(Column::Id.ne(id));
        }
        Ok(query.count(&self.db).await? > 0)
    }

    async fn update(&self, id: i32, changes: AccountChanges) -> Result<Account, DomainError> {
        let existing = AccountEntity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or(DomainError::NotFound)?;

        let mut active: ActiveModel = existing.into();
        if let Some(username) = changes.username {
            active.username = Set(username);
        }
        if let Some(password_hash) = changes.password_hash {
            active.password_hash = Set(password_hash);
        }
        if let Some(email) = changes.email {
            active.email = Set(email);
        }
        if let Some(first_name) = changes.first_name {
            active.first_name = Set(first_name);
        }
        if let Some(last_name) = changes.last_name {
            active.last_name = Set(last_name);
        }
        if let Some(image) = changes.image {
            active.image = Set(image);
        }

        let result = active.update(&self.db).await.map_err(username_conflict)?;
        Ok(Account::from(result))
    }

    async fn delete(&self, id: i32) -> Result<(), DomainError> {
        let result = AccountEntity::delete_by_id(id).exec(&self.db).await?;

        if result.rows_affected == 0 {
            return Err(DomainError::NotFound);
        }

        Ok(())
    }

    async fn count(&self) -> Result<u64, DomainError> {
        Ok(AccountEntity::find().count(&self.db).await?)
    }
}
