//! Book Service - listing lifecycle without HTTP layer
//!
//! Creation and update validation, status changes, soft-delete and image
//! attachment. Every mutation goes through the ownership policy first.

use std::sync::Arc;

use crate::domain::policy::ensure_can_modify;
use crate::domain::{
    BookChanges, BookFilter, BookRepository, DomainError, FieldErrors, ImageRepository,
    MediaStorage, NewBook, NewImage, PageRequest, Paginated,
};
use crate::models::{Book, BookStatus, Image};
use crate::services::uploads::image_extension;

pub const MIN_PRICE: f64 = 0.0;
pub const MAX_PRICE: f64 = 1_000_000.0;
pub const TITLE_MAX_LEN: usize = 255;

const BOOK_IMAGE_FOLDER: &str = "books";

/// Field values for creating a book (all required except details)
#[derive(Debug, Clone, Default)]
pub struct BookInput {
    pub title: Option<String>,
    pub details: Option<String>,
    pub price: Option<f64>,
}

pub fn validate_price(price: f64, errors: &mut FieldErrors) {
    if !price.is_finite() {
        errors.add("price", "A valid number is required.");
    } else if price < MIN_PRICE {
        errors.add("price", "Ensure this value is greater than or equal to 0.");
    } else if price > MAX_PRICE {
        errors.add(
            "price",
            "Ensure this value is less than or equal to 1000000.",
        );
    }
}

pub fn validate_title(title: &str, errors: &mut FieldErrors) {
    if title.trim().is_empty() {
        errors.add("title", "This field may not be blank.");
    } else if title.chars().count() > TITLE_MAX_LEN {
        errors.add(
            "title",
            "Ensure this field has no more than 255 characters.",
        );
    }
}

/// Blank details are stored as NULL
fn normalize_details(details: Option<String>) -> Option<String> {
    details.filter(|d| !d.trim().is_empty())
}

#[derive(Clone)]
pub struct BookService {
    books: Arc<dyn BookRepository>,
    images: Arc<dyn ImageRepository>,
    media: Arc<dyn MediaStorage>,
}

impl BookService {
    pub fn new(
        books: Arc<dyn BookRepository>,
        images: Arc<dyn ImageRepository>,
        media: Arc<dyn MediaStorage>,
    ) -> Self {
        Self {
            books,
            images,
            media,
        }
    }

    /// Public listing of every non-deleted book
    pub async fn list(
        &self,
        filter: BookFilter,
        page: PageRequest,
    ) -> Result<Paginated<Book>, DomainError> {
        tracing::debug!(
            "List books - status={:?}, account={:?}, search={:?}",
            filter.status,
            filter.account,
            filter.search
        );
        self.books.find_all(filter, page).await
    }

    /// The actor's own non-deleted books
    pub async fn list_own(
        &self,
        actor_id: i32,
        filter: BookFilter,
        page: PageRequest,
    ) -> Result<Paginated<Book>, DomainError> {
        let filter = BookFilter {
            account: Some(actor_id),
            ..filter
        };
        self.books.find_all(filter, page).await
    }

    pub async fn get(&self, id: i32) -> Result<Book, DomainError> {
        self.books
            .find_active(id)
            .await?
            .ok_or(DomainError::NotFound)
    }

    pub async fn create(&self, actor_id: i32, input: BookInput) -> Result<Book, DomainError> {
        let mut errors = FieldErrors::new();

        match input.title.as_deref() {
            Some(title) => validate_title(title, &mut errors),
            None => errors.add("title", "This field is required."),
        }
        match input.price {
            Some(price) => validate_price(price, &mut errors),
            None => errors.add("price", "This field is required."),
        }
        errors.into_result()?;

        let book = self
            .books
            .create(NewBook {
                account_id: actor_id,
                title: input.title.unwrap_or_default().trim().to_string(),
                details: normalize_details(input.details),
                price: input.price.unwrap_or_default(),
            })
            .await?;

        tracing::info!("Account {} listed book {} ({})", actor_id, book.id, book.title);
        Ok(book)
    }

    /// Load a non-deleted book and check the actor owns it.
    ///
    /// Missing and soft-deleted books are NotFound for everyone, so a stranger
    /// learns nothing more than the public detail view would tell them.
    async fn owned_book(&self, actor_id: i32, id: i32, action: &str) -> Result<Book, DomainError> {
        let book = self.get(id).await?;
        ensure_can_modify(actor_id, &book, action)?;
        Ok(book)
    }

    pub async fn update(
        &self,
        actor_id: i32,
        id: i32,
        changes: BookChanges,
    ) -> Result<Book, DomainError> {
        let book = self.owned_book(actor_id, id, "edit").await?;

        let mut errors = FieldErrors::new();
        if let Some(title) = &changes.title {
            validate_title(title, &mut errors);
        }
        if let Some(price) = changes.price {
            validate_price(price, &mut errors);
        }
        errors.into_result()?;

        if changes.is_empty() {
            return Ok(book);
        }

        let changes = BookChanges {
            title: changes.title.map(|t| t.trim().to_string()),
            details: changes.details.map(normalize_details),
            ..changes
        };

        let updated = self.books.update(book.id, changes).await?;
        tracing::info!("Account {} updated book {}", actor_id, updated.id);
        Ok(updated)
    }

    /// Any status may follow any other; only ownership is checked
    pub async fn set_status(
        &self,
        actor_id: i32,
        id: i32,
        status: BookStatus,
    ) -> Result<Book, DomainError> {
        let book = self.owned_book(actor_id, id, "change").await?;
        let updated = self.books.set_status(book.id, status).await?;
        tracing::info!(
            "Book {} status {} -> {}",
            updated.id,
            book.status,
            updated.status
        );
        Ok(updated)
    }

    pub async fn mark_sold(&self, actor_id: i32, id: i32) -> Result<Book, DomainError> {
        self.set_status(actor_id, id, BookStatus::Sold).await
    }

    pub async fn mark_reserved(&self, actor_id: i32, id: i32) -> Result<Book, DomainError> {
        self.set_status(actor_id, id, BookStatus::Reserved).await
    }

    pub async fn mark_available(&self, actor_id: i32, id: i32) -> Result<Book, DomainError> {
        self.set_status(actor_id, id, BookStatus::Available).await
    }

    /// Hide the book from every listing; the row and its images stay
    pub async fn soft_delete(&self, actor_id: i32, id: i32) -> Result<Book, DomainError> {
        let book = self.owned_book(actor_id, id, "delete").await?;
        let deleted = self.books.soft_delete(book.id).await?;
        tracing::info!("Account {} soft-deleted book {}", actor_id, deleted.id);
        Ok(deleted)
    }

    /// Store an uploaded picture and attach it to the book.
    ///
    /// A new cover replaces the previous one; a book has at most one cover.
    pub async fn add_image(
        &self,
        actor_id: i32,
        book_id: i32,
        bytes: &[u8],
        is_cover: bool,
    ) -> Result<Image, DomainError> {
        let book = self.owned_book(actor_id, book_id, "edit").await?;
        let extension = image_extension(bytes)?;

        let path = self.media.save(BOOK_IMAGE_FOLDER, extension, bytes).await?;

        let image = match self
            .images
            .create(NewImage {
                book_id: book.id,
                path: path.clone(),
                is_cover,
            })
            .await
        {
            Ok(image) => image,
            Err(e) => {
                // Don't leave an orphaned file behind
                if let Err(cleanup) = self.media.remove(&path).await {
                    tracing::warn!("Failed to remove orphaned upload {}: {}", path, cleanup);
                }
                return Err(e);
            }
        };

        // Only once the new cover is stored
        if is_cover {
            self.images.clear_cover(book.id, image.id).await?;
        }

        tracing::info!("Attached image {} to book {}", image.id, book.id);
        Ok(image)
    }

    pub async fn remove_image(
        &self,
        actor_id: i32,
        book_id: i32,
        image_id: i32,
    ) -> Result<(), DomainError> {
        let book = self.owned_book(actor_id, book_id, "edit").await?;

        let image = self
            .images
            .find_by_id(image_id)
            .await?
            .filter(|img| img.book == book.id)
            .ok_or(DomainError::NotFound)?;

        self.images.delete(image.id).await?;

        if let Some(path) = image.image
            && let Err(e) = self.media.remove(&path).await
        {
            tracing::warn!("Failed to remove image file {}: {}", path, e);
        }

        Ok(())
    }
}
