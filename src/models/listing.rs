use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Listing: One marketplace result (remote or demo)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Listing {
    pub title: String,
    pub description: String,
    pub price: Decimal,
    pub currency: String,
    pub seller: String,
    pub item_url: String,
    pub image_url: String,
    pub condition: String,
}

impl Listing {
    /// `true` when the free-text condition mentions "new" in any case
    /// ("New", "Like New", "Brand new", ...).
    pub fn is_new(&self) -> bool {
        condition_is_new(&self.condition)
    }
}

pub(crate) fn condition_is_new(condition: &str) -> bool {
    condition.to_lowercase().contains("new")
}

// ---------------------------------------------------------------------------
// SearchResult: A listing persisted against a product image
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct SearchResult {
    pub id: i64,
    pub product_image_id: i64,
    #[serde(flatten)]
    pub listing: Listing,
    pub searched_at: String,
}

impl SearchResult {
    pub fn is_new(&self) -> bool {
        self.listing.is_new()
    }
}

impl fmt::Display for SearchResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let short: String = self.listing.title.chars().take(50).collect();
        write!(f, "{} - ${}", short, self.listing.price)
    }
}
