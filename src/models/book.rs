use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::image::Image;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "books")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub title: String,
    pub details: Option<String>,
    /// Lowercased title and details, matched by search
    pub search_text: String,
    pub price: f64,
    #[sea_orm(default_value = "available")]
    pub status: String, // 'available', 'sold', 'reserved'
    pub is_deleted: bool,
    pub account_id: i32,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::account::Entity",
        from = "Column::AccountId",
        to = "super::account::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Account,
    #[sea_orm(has_many = "super::image::Entity")]
    Images,
    #[sea_orm(has_many = "super::wishlist_book::Entity")]
    WishListBooks,
}

impl Related<super::account::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Account.def()
    }
}

impl Related<super::image::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Images.def()
    }
}

impl Related<super::wishlist::Entity> for Entity {
    fn to() -> RelationDef {
        super::wishlist_book::Relation::WishList.def()
    }

    fn via() -> Option<RelationDef> {
        Some(super::wishlist_book::Relation::Book.def().rev())
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// Sale status of a listing. Every transition between the three is allowed.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema,
)]
#[serde(rename_all = "lowercase")]
pub enum BookStatus {
    #[default]
    Available,
    Sold,
    Reserved,
}

impl BookStatus {
    pub const ALL: [BookStatus; 3] = [BookStatus::Available, BookStatus::Sold, BookStatus::Reserved];

    pub fn as_str(&self) -> &'static str {
        match self {
            BookStatus::Available => "available",
            BookStatus::Sold => "sold",
            BookStatus::Reserved => "reserved",
        }
    }
}

impl fmt::Display for BookStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BookStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "available" => Ok(BookStatus::Available),
            "sold" => Ok(BookStatus::Sold),
            "reserved" => Ok(BookStatus::Reserved),
            other => Err(format!("\"{}\" is not a valid choice.", other)),
        }
    }
}

// DTO for API responses
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct Book {
    pub id: i32,
    pub title: String,
    pub details: Option<String>,
    pub price: f64,
    pub status: BookStatus,
    pub is_deleted: bool,
    /// Owning account id
    pub account: i32,
    pub images: Vec<Image>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Model> for Book {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            title: model.title,
            details: model.details,
            price: model.price,
            status: model.status.parse().unwrap_or_default(),
            is_deleted: model.is_deleted,
            account: model.account_id,
            images: Vec::new(),
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_parses_known_values() {
        for status in BookStatus::ALL {
            assert_eq!(status.as_str().parse::<BookStatus>(), Ok(status));
        }
        assert!("lost".parse::<BookStatus>().is_err());
    }

    #[test]
    fn status_serializes_lowercase() {
        let json = serde_json::to_string(&BookStatus::Reserved).unwrap();
        assert_eq!(json, "\"reserved\"");
    }
}
