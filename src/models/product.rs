use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::error::FinderError;

// ---------------------------------------------------------------------------
// ListingCondition: Condition choices for locally saved listings
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListingCondition {
    New,
    Used,
    Refurbished,
    OpenBox,
}

impl ListingCondition {
    pub const ALL: [ListingCondition; 4] = [
        ListingCondition::New,
        ListingCondition::Used,
        ListingCondition::Refurbished,
        ListingCondition::OpenBox,
    ];

    /// Stored value.
    pub fn as_str(&self) -> &'static str {
        match self {
            ListingCondition::New => "new",
            ListingCondition::Used => "used",
            ListingCondition::Refurbished => "refurbished",
            ListingCondition::OpenBox => "open_box",
        }
    }

    /// Human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            ListingCondition::New => "New",
            ListingCondition::Used => "Used",
            ListingCondition::Refurbished => "Refurbished",
            ListingCondition::OpenBox => "Open Box",
        }
    }
}

impl FromStr for ListingCondition {
    type Err = FinderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ListingCondition::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| FinderError::InvalidArgument(format!("Unknown condition: {}", s)))
    }
}

impl fmt::Display for ListingCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ---------------------------------------------------------------------------
// ListingProduct: Demo listing saved locally, never sent to the marketplace
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ListingProduct {
    pub id: i64,
    pub title: String,
    pub price: Decimal,
    pub quantity: u32,
    pub condition: ListingCondition,
    pub category_id: String,
    pub image_path: Option<PathBuf>,
    pub created_at: String,
}

impl fmt::Display for ListingProduct {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (${})", self.title, self.price)
    }
}

/// Input for [`crate::ResaleFinder::add_product`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewListingProduct {
    pub title: String,
    pub price: Decimal,
    pub quantity: u32,
    pub condition: ListingCondition,
    pub category_id: String,
    pub image_path: Option<PathBuf>,
}

impl NewListingProduct {
    /// A single-quantity listing without an image.
    pub fn new(
        title: impl Into<String>,
        price: Decimal,
        condition: ListingCondition,
        category_id: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            price,
            quantity: 1,
            condition,
            category_id: category_id.into(),
            image_path: None,
        }
    }

    pub fn quantity(mut self, quantity: u32) -> Self {
        self.quantity = quantity;
        self
    }

    pub fn image_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.image_path = Some(path.into());
        self
    }
}
