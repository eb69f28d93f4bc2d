use serde::{Deserialize, Serialize};

use super::image::ProductImage;
use super::listing::{Listing, SearchResult};
use super::price::{PriceSuggestion, StoredSuggestion};

// ---------------------------------------------------------------------------
// SearchResults: Everything stored for one product image
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResults {
    pub image: ProductImage,
    /// Ordered by ascending price.
    pub results: Vec<SearchResult>,
    pub suggestion: Option<StoredSuggestion>,
}

impl SearchResults {
    pub fn new_items(&self) -> Vec<&SearchResult> {
        self.results.iter().filter(|r| r.is_new()).collect()
    }

    pub fn used_items(&self) -> Vec<&SearchResult> {
        self.results.iter().filter(|r| !r.is_new()).collect()
    }
}

// ---------------------------------------------------------------------------
// SearchResponse: Stateless keyword lookup, nothing persisted
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResponse {
    pub results: Vec<Listing>,
    pub suggestion: PriceSuggestion,
}
