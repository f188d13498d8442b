//! SeaORM implementation of BookRepository

use async_trait::async_trait;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, Select, Set, Unchanged,
    sea_query::{Expr, LikeExpr},
};
use std::collections::HashMap;

use crate::domain::{
    BookChanges, BookFilter, BookRepository, DomainError, NewBook, OrderField, PageRequest,
    Paginated,
};
use crate::models::book::{ActiveModel, Column, Entity as BookEntity, Model};
use crate::models::image::{self, Entity as ImageEntity};
use crate::models::{Book, BookStatus, Image};

/// SeaORM-based implementation of BookRepository
pub struct SeaOrmBookRepository {
    db: DatabaseConnection,
}

impl SeaOrmBookRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

fn column_for(field: OrderField) -> Column {
    match field {
        OrderField::Title => Column::Title,
        OrderField::Price => Column::Price,
        OrderField::CreatedAt => Column::CreatedAt,
    }
}

/// Text a search term is matched against. Lowercased in Rust, since SQLite's
/// `LIKE` only folds ASCII.
fn search_text(title: &str, details: Option<&str>) -> String {
    format!("{}\n{}", title, details.unwrap_or_default()).to_lowercase()
}

/// `LIKE` pattern matching `term` literally anywhere in the text
fn contains_pattern(term: &str) -> LikeExpr {
    let mut escaped = String::with_capacity(term.len());
    for c in term.to_lowercase().chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    LikeExpr::new(format!("%{}%", escaped)).escape('\\')
}

/// Listing query: never includes soft-deleted rows
fn filtered_query(filter: &BookFilter) -> Select<BookEntity> {
    let mut query = BookEntity::find().filter(Column::IsDeleted.eq(false));

    if let Some(status) = filter.status {
        query = query.filter(Column::Status.eq(status.as_str()));
    }

    if let Some(account) = filter.account {
        query = query.filter(Column::AccountId.eq(account));
    }

    // Every term must appear in the title or the details
    for term in filter.search_terms() {
        query = query.filter(Expr::col(Column::SearchText).like(contains_pattern(term)));
    }

    if filter.ordering.is_empty() {
        // Newest first
        query = query
            .order_by_desc(Column::CreatedAt)
            .order_by_desc(Column::Id);
    } else {
        for ordering in &filter.ordering {
            let column = column_for(ordering.field);
            query = if ordering.descending {
                query.order_by_desc(column)
            } else {
                query.order_by_asc(column)
            };
        }
        query = query.order_by_asc(Column::Id);
    }

    query
}

/// Convert book rows to DTOs with their images, in one extra query
pub(crate) async fn with_images(
    db: &DatabaseConnection,
    models: Vec<Model>,
) -> Result<Vec<Book>, DbErr> {
    if models.is_empty() {
        return Ok(Vec::new());
    }

    let ids: Vec<i32> = models.iter().map(|m| m.id).collect();
    let images = ImageEntity::find()
        .filter(image::Column::BookId.is_in(ids))
        .order_by_asc(image::Column::Id)
        .all(db)
        .await?;

    let mut by_book: HashMap<i32, Vec<Image>> = HashMap::new();
    for img in images {
        by_book.entry(img.book_id).or_default().push(Image::from(img));
    }

    Ok(models
        .into_iter()
        .map(|model| {
            let images = by_book.remove(&model.id).unwrap_or_default();
            let mut book = Book::from(model);
            book.images = images;
            book
        })
        .collect())
}

impl SeaOrmBookRepository {
    async fn one_with_images(&self, model: Model) -> Result<Book, DomainError> {
        let mut books = with_images(&self.db, vec![model]).await?;
        books
            .pop()
            .ok_or_else(|| DomainError::Internal("Book vanished while loading images".to_string()))
    }
}

#[async_trait]
impl BookRepository for SeaOrmBookRepository {
    async fn find_all(
        &self,
        filter: BookFilter,
        page: PageRequest,
    ) -> Result<Paginated<Book>, DomainError> {
        let query = filtered_query(&filter);

        let paginator = query.paginate(&self.db, page.page_size);
        let total = paginator.num_items().await?;
        page.ensure_within(total)?;
        let models = paginator.fetch_page(page.page - 1).await?;

        let books = with_images(&self.db, models).await?;
        Ok(Paginated::new(books, total, page))
    }

    async fn find_active(&self, id: i32) -> Result<Option<Book>, DomainError> {
        let model = BookEntity::find_by_id(id)
            .filter(Column::IsDeleted.eq(false))
            .one(&self.db)
            .await?;

        match model {
            Some(model) => Ok(Some(self.one_with_images(model).await?)),
            None => Ok(None),
        }
    }

    async fn find_by_id(&self, id: i32) -> Result<Option<Book>, DomainError> {
        match BookEntity::find_by_id(id).one(&self.db).await? {
            Some(model) => Ok(Some(self.one_with_images(model).await?)),
            None => Ok(None),
        }
    }

    async fn create(&self, input: NewBook) -> Result<Book, DomainError> {
        let now = chrono::Utc::now().to_rfc3339();

        let new_book = ActiveModel {
            search_text: Set(search_text(&input.title, input.details.as_deref())),
            title: Set(input.title),
            details: Set(input.details),
            price: Set(input.price),
            status: Set(BookStatus::Available.as_str().to_string()),
            is_deleted: Set(false),
            account_id: Set(input.account_id),
            created_at: Set(now.clone()),
            updated_at: Set(now),
            ..Default::default()
        };

        let result = new_book.insert(&self.db).await?;
        Ok(Book::from(result))
    }

    async fn update(&self, id: i32, changes: BookChanges) -> Result<Book, DomainError> {
        let existing = BookEntity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or(DomainError::NotFound)?;

        let title = changes.title.unwrap_or_else(|| existing.title.clone());
        let details = changes.details.unwrap_or_else(|| existing.details.clone());

        let mut active: ActiveModel = existing.into();
        active.search_text = Set(search_text(&title, details.as_deref()));
        active.title = Set(title);
        active.details = Set(details);
        if let Some(price) = changes.price {
            active.price = Set(price);
        }
        if let Some(status) = changes.status {
            active.status = Set(status.as_str().to_string());
        }
        active.updated_at = Set(chrono::Utc::now().to_rfc3339());

        let result = active.update(&self.db).await?;
        self.one_with_images(result).await
    }

    async fn set_status(&self, id: i32, status: BookStatus) -> Result<Book, DomainError> {
        // Only the status column is written
        let active = ActiveModel {
            id: Unchanged(id),
            status: Set(status.as_str().to_string()),
            ..Default::default()
        };

        let result = active.update(&self.db).await?;
        self.one_with_images(result).await
    }

    async fn soft_delete(&self, id: i32) -> Result<Book, DomainError> {
        let active = ActiveModel {
            id: Unchanged(id),
            is_deleted: Set(true),
            ..Default::default()
        };

        let result = active.update(&self.db).await?;
        Ok(Book::from(result))
    }

    async fn count_all(&self) -> Result<u64, DomainError> {
        Ok(BookEntity::find().count(&self.db).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{AccountRepository, NewAccount};
    use crate::infrastructure::SeaOrmAccountRepository;
    use crate::infrastructure::db::init_db;

    async fn repo_with(titles: &[(&str, Option<&str>)]) -> (SeaOrmBookRepository, Vec<i32>) {
        let db = init_db("sqlite::memory:").await.expect("Failed to init DB");
        let owner = SeaOrmAccountRepository::new(db.clone())
            .create(NewAccount {
                username: "owner".to_string(),
                password_hash: "hash".to_string(),
                email: None,
                first_name: String::new(),
                last_name: String::new(),
            })
            .await
            .unwrap();

        let repo = SeaOrmBookRepository::new(db);
        let mut ids = Vec::new();
        for (title, details) in titles {
            let book = repo
                .create(NewBook {
                    title: title.to_string(),
                    details: details.map(str::to_string),
                    price: 10.0,
                    account_id: owner.id,
                })
                .await
                .unwrap();
            ids.push(book.id);
        }
        (repo, ids)
    }

    async fn search(repo: &SeaOrmBookRepository, terms: &str) -> Vec<i32> {
        let filter = BookFilter {
            search: Some(terms.to_string()),
            ordering: vec![crate::domain::Ordering {
                field: OrderField::Title,
                descending: false,
            }],
            ..Default::default()
        };
        repo.find_all(filter, PageRequest::default())
            .await
            .unwrap()
            .results
            .into_iter()
            .map(|b| b.id)
            .collect()
    }

    #[test]
    fn search_text_folds_unicode_case() {
        assert_eq!(search_text("Дюна", Some("ÉTÉ")), "дюна\nété");
        assert_eq!(search_text("Dune", None), "dune\n");
    }

    #[tokio::test]
    async fn wildcards_in_terms_match_literally() {
        let (repo, ids) = repo_with(&[
            ("abcXd", None),
            ("c_d notes", None),
            ("50% off", None),
            ("500 offers", None),
            ("Back\\slash", None),
        ])
        .await;

        assert_eq!(search(&repo, "c_d").await, vec![ids[1]]);
        assert_eq!(search(&repo, "50%").await, vec![ids[2]]);
        assert_eq!(search(&repo, "k\\s").await, vec![ids[4]]);
        assert_eq!(search(&repo, "%").await, vec![ids[2]]);
    }

    #[tokio::test]
    async fn search_ignores_case_beyond_ascii() {
        let (repo, ids) = repo_with(&[("Дюна", Some("Épopée")), ("Dune", None)]).await;

        assert_eq!(search(&repo, "дюна").await, vec![ids[0]]);
        assert_eq!(search(&repo, "ДЮНА").await, vec![ids[0]]);
        assert_eq!(search(&repo, "ÉPOPÉE").await, vec![ids[0]]);
        assert_eq!(search(&repo, "dUNE").await, vec![ids[1]]);
    }

    #[tokio::test]
    async fn update_refreshes_search_text() {
        let (repo, ids) = repo_with(&[("Dune", Some("Paperback"))]).await;

        repo.update(
            ids[0],
            BookChanges {
                title: Some("Emma".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        assert!(search(&repo, "dune").await.is_empty());
        assert_eq!(search(&repo, "emma paperback").await, vec![ids[0]]);
    }
}
