//! List query types shared by the book and wishlist listings

use serde::Serialize;

use super::DomainError;
use crate::models::BookStatus;

pub const DEFAULT_PAGE_SIZE: u64 = 12;
pub const MAX_PAGE_SIZE: u64 = 100;

/// 1-based page selection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u64,
    pub page_size: u64,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl PageRequest {
    /// Parse raw query values.
    ///
    /// A missing, zero or malformed `page_size` falls back to the default and
    /// larger values are capped. A malformed or zero `page` is an invalid page.
    pub fn parse(page: Option<&str>, page_size: Option<&str>) -> Result<Self, DomainError> {
        let page = match page.map(str::trim).filter(|p| !p.is_empty()) {
            None => 1,
            Some(raw) => match raw.parse::<u64>() {
                Ok(p) if p >= 1 => p,
                _ => return Err(DomainError::NotFound),
            },
        };

        let page_size = page_size
            .and_then(|raw| raw.trim().parse::<u64>().ok())
            .filter(|size| *size > 0)
            .map(|size| size.min(MAX_PAGE_SIZE))
            .unwrap_or(DEFAULT_PAGE_SIZE);

        Ok(Self { page, page_size })
    }

    pub fn offset(&self) -> u64 {
        (self.page - 1) * self.page_size
    }

    pub fn num_pages(&self, total: u64) -> u64 {
        total.div_ceil(self.page_size).max(1)
    }

    /// Page 1 always exists, even for an empty listing.
    pub fn ensure_within(&self, total: u64) -> Result<(), DomainError> {
        if self.page > self.num_pages(total) {
            Err(DomainError::NotFound)
        } else {
            Ok(())
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Paginated<T> {
    pub count: u64,
    pub page: u64,
    pub page_size: u64,
    pub num_pages: u64,
    pub results: Vec<T>,
}

impl<T> Paginated<T> {
    pub fn new(results: Vec<T>, total: u64, request: PageRequest) -> Self {
        Self {
            count: total,
            page: request.page,
            page_size: request.page_size,
            num_pages: request.num_pages(total),
            results,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderField {
    Title,
    Price,
    CreatedAt,
}

impl OrderField {
    fn from_name(name: &str) -> Option<Self> {
        match name {
            "title" => Some(OrderField::Title),
            "price" => Some(OrderField::Price),
            "created_at" => Some(OrderField::CreatedAt),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ordering {
    pub field: OrderField,
    pub descending: bool,
}

/// Fields the public listing may be ordered by
pub const PUBLIC_ORDERING: &[OrderField] = &[OrderField::Price, OrderField::CreatedAt];
/// Fields the owner's own listing may be ordered by
pub const OWN_ORDERING: &[OrderField] = &[OrderField::Title, OrderField::Price, OrderField::CreatedAt];

/// Parse `price,-created_at` style ordering, dropping fields not in `allowed`.
pub fn parse_ordering(raw: Option<&str>, allowed: &[OrderField]) -> Vec<Ordering> {
    let Some(raw) = raw else {
        return Vec::new();
    };

    raw.split(',')
        .map(str::trim)
        .filter(|term| !term.is_empty())
        .filter_map(|term| {
            let (descending, name) = match term.strip_prefix('-') {
                Some(rest) => (true, rest),
                None => (false, term),
            };
            OrderField::from_name(name)
                .filter(|field| allowed.contains(field))
                .map(|field| Ordering { field, descending })
        })
        .collect()
}

/// Parse a `status` query value; empty means no filter.
pub fn parse_status_filter(raw: Option<&str>) -> Result<Option<BookStatus>, DomainError> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(None),
        Some(value) => value
            .parse::<BookStatus>()
            .map(Some)
            .map_err(|msg| DomainError::validation("status", format!("Select a valid choice. {}", msg))),
    }
}

/// Filter criteria for book listings. Soft-deleted books are always excluded.
#[derive(Debug, Default, Clone)]
pub struct BookFilter {
    pub status: Option<BookStatus>,
    pub account: Option<i32>,
    pub search: Option<String>,
    pub ordering: Vec<Ordering>,
}

impl BookFilter {
    /// Whitespace separated search terms; each must match title or details.
    pub fn search_terms(&self) -> Vec<&str> {
        self.search
            .as_deref()
            .map(|s| s.split_whitespace().collect())
            .unwrap_or_default()
    }
}
