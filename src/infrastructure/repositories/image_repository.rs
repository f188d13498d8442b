//! SeaORM implementation of ImageRepository

use async_trait::async_trait;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, JoinType, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, RelationTrait, Set, sea_query::Expr,
};

use crate::domain::{DomainError, ImageRepository, NewImage};
use crate::models::Image;
use crate::models::book;
use crate::models::image::{ActiveModel, Column, Entity as ImageEntity, Relation};

/// SeaORM-based implementation of ImageRepository
pub struct SeaOrmImageRepository {
    db: DatabaseConnection,
}

impl SeaOrmImageRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ImageRepository for SeaOrmImageRepository {
    async fn create(&self, input: NewImage) -> Result<Image, DomainError> {
        let new_image = ActiveModel {
            image: Set(Some(input.path)),
            is_cover: Set(input.is_cover),
            book_id: Set(input.book_id),
            created_at: Set(chrono::Utc::now().to_rfc3339()),
            ..Default::default()
        };

        let result = new_image.insert(&self.db).await?;
        Ok(Image::from(result))
    }

    async fn find_by_id(&self, id: i32) -> Result<Option<Image>, DomainError> {
        let model = ImageEntity::find_by_id(id).one(&self.db).await?;
        Ok(model.map(Image::from))
    }

    async fn find_by_book(&self, book_id: i32) -> Result<Vec<Image>, DomainError> {
        let models = ImageEntity::find()
            .filter(Column::BookId.eq(book_id))
            .order_by_asc(Column::Id)
            .all(&self.db)
            .await?;
        Ok(models.into_iter().map(Image::from).collect())
    }

    async fn find_by_account(&self, account_id: i32) -> Result<Vec<Image>, DomainError> {
        let models = ImageEntity::find()
            .join(JoinType::InnerJoin, Relation::Book.def())
            .filter(book::Column::AccountId.eq(account_id))
            .order_by_asc(Column::Id)
            .all(&self.db)
            .await?;
        Ok(models.into_iter().map(Image::from).collect())
    }

    async fn clear_cover(&self, book_id: i32, keep: i32) -> Result<(), DomainError> {
        ImageEntity::update_many()
            .col_expr(Column::IsCover, Expr::value(false))
            .filter(Column::BookId.eq(book_id))
            .filter(Column::Id.ne(keep))
            .exec(&self.db)
            .await?;
        Ok(())
    }

    async fn delete(&self, id: i32) -> Result<(), DomainError> {
        let result = ImageEntity::delete_by_id(id).exec(&self.db).await?;

        if result.rows_affected == 0 {
            return Err(DomainError::NotFound);
        }

        Ok(())
    }

    async fn count(&self) -> Result<u64, DomainError> {
        Ok(ImageEntity::find().count(&self.db).await?)
    }
}
