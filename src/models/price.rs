use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// PriceSuggestion: Aggregated resale price band for one observation set
// ---------------------------------------------------------------------------

/// Summary statistics over the prices of comparable listings.
///
/// All monetary fields carry two decimal places. An empty observation set
/// produces zeros everywhere and `total_listings == 0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct PriceSuggestion {
    pub min_price: Decimal,
    pub max_price: Decimal,
    pub average_price: Decimal,
    pub median_price: Decimal,
    pub suggested_price: Decimal,
    pub total_listings: usize,
}

impl PriceSuggestion {
    /// The suggestion for an empty observation set.
    pub fn empty() -> Self {
        let zero = Decimal::new(0, 2);
        Self {
            min_price: zero,
            max_price: zero,
            average_price: zero,
            median_price: zero,
            suggested_price: zero,
            total_listings: 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.total_listings == 0
    }
}

impl Default for PriceSuggestion {
    fn default() -> Self {
        Self::empty()
    }
}

impl fmt::Display for PriceSuggestion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Suggestion: ${}", self.suggested_price)
    }
}

// ---------------------------------------------------------------------------
// StoredSuggestion: Persisted suggestion attached to a product image
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct StoredSuggestion {
    pub id: i64,
    pub product_image_id: i64,
    #[serde(flatten)]
    pub suggestion: PriceSuggestion,
    pub created_at: String,
}

impl fmt::Display for StoredSuggestion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.suggestion.fmt(f)
    }
}
