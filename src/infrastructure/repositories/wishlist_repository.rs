//! SeaORM implementation of WishListRepository

use async_trait::async_trait;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, JoinType, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, RelationTrait, Set, sea_query::OnConflict,
};

use crate::domain::{DomainError, PageRequest, Paginated, WishListRepository};
use crate::models::WishList;
use crate::models::book::{self, Entity as BookEntity};
use crate::models::wishlist::{ActiveModel, Column, Entity as WishListEntity};
use crate::models::wishlist_book::{self, Entity as WishListBookEntity};

use super::book_repository::with_images;

/// SeaORM-based implementation of WishListRepository
pub struct SeaOrmWishListRepository {
    db: DatabaseConnection,
}

impl SeaOrmWishListRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl WishListRepository for SeaOrmWishListRepository {
    async fn create_for_account(&self, account_id: i32) -> Result<WishList, DomainError> {
        let wishlist = ActiveModel {
            account_id: Set(account_id),
            created_at: Set(chrono::Utc::now().to_rfc3339()),
            ..Default::default()
        };

        let result = wishlist.insert(&self.db).await?;
        Ok(WishList::from(result))
    }

    async fn find_by_account(&self, account_id: i32) -> Result<Option<WishList>, DomainError> {
        let model = WishListEntity::find()
            .filter(Column::AccountId.eq(account_id))
            .one(&self.db)
            .await?;
        Ok(model.map(WishList::from))
    }

    async fn contains(&self, wishlist_id: i32, book_id: i32) -> Result<bool, DomainError> {
        let existing = WishListBookEntity::find_by_id((wishlist_id, book_id))
            .one(&self.db)
            .await?;
        Ok(existing.is_some())
    }

    async fn insert_book(&self, wishlist_id: i32, book_id: i32) -> Result<bool, DomainError> {
        let entry = wishlist_book::ActiveModel {
            wishlist_id: Set(wishlist_id),
            book_id: Set(book_id),
            added_at: Set(chrono::Utc::now().to_rfc3339()),
        };

        // A concurrent insert of the same pair loses quietly on the primary key
        let inserted = WishListBookEntity::insert(entry)
            .on_conflict(
                OnConflict::columns([
                    wishlist_book::Column::WishlistId,
                    wishlist_book::Column::BookId,
                ])
                .do_nothing()
                .to_owned(),
            )
            .exec_without_returning(&self.db)
            .await?;

        Ok(inserted > 0)
    }

    async fn remove_book(&self, wishlist_id: i32, book_id: i32) -> Result<bool, DomainError> {
        let result = WishListBookEntity::delete_many()
            .filter(wishlist_book::Column::WishlistId.eq(wishlist_id))
            .filter(wishlist_book::Column::BookId.eq(book_id))
            .exec(&self.db)
            .await?;

        Ok(result.rows_affected > 0)
    }

    async fn books(
        &self,
        wishlist_id: i32,
        page: PageRequest,
    ) -> Result<Paginated<book::Book>, DomainError> {
        let query = BookEntity::find()
            .join(JoinType::InnerJoin, book::Relation::WishListBooks.def())
            .filter(wishlist_book::Column::WishlistId.eq(wishlist_id))
            .filter(book::Column::IsDeleted.eq(false))
            .order_by_asc(book::Column::Title)
            .order_by_asc(book::Column::Id);

        let paginator = query.paginate(&self.db, page.page_size);
        let total = paginator.num_items().await?;
        page.ensure_within(total)?;
        let models = paginator.fetch_page(page.page - 1).await?;

        let books = with_images(&self.db, models).await?;
        Ok(Paginated::new(books, total, page))
    }

    async fn count_members(&self, wishlist_id: i32) -> Result<u64, DomainError> {
        Ok(WishListBookEntity::find()
            .filter(wishlist_book::Column::WishlistId.eq(wishlist_id))
            .count(&self.db)
            .await?)
    }

    async fn count(&self) -> Result<u64, DomainError> {
        Ok(WishListEntity::find().count(&self.db).await?)
    }
}
