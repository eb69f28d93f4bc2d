//! Resale price finder.
//!
//! Identifies a product from a photo (or typed keywords), pulls comparable
//! fixed-price listings from the eBay Browse API, and suggests a resale
//! price from the observed prices. Identification events, their listings
//! and suggestions are persisted in DuckDB.
//!
//! Both remote services are optional: without credentials the marketplace
//! client produces demo listings and the recognizer derives keywords from
//! the image file name.
//!
//! # Quick start
//!
//! ```no_run
//! use resale_finder::ResaleFinder;
//!
//! let finder = ResaleFinder::builder().build().unwrap();
//!
//! let id = finder.manual_search("Mobil 1 Synthetic Oil 5W-30").unwrap();
//! let results = finder.results(id).unwrap();
//! if let Some(s) = results.suggestion {
//!     println!("list it at ${}", s.suggestion.suggested_price);
//! }
//! ```
//!
//! The price engine is usable on its own:
//!
//! ```
//! use resale_finder::calculate_suggestion;
//! use rust_decimal_macros::dec;
//!
//! let s = calculate_suggestion(&[dec!(10), dec!(20), dec!(30)]);
//! assert_eq!(s.suggested_price, dec!(19.00));
//! ```

#[cfg(feature = "async")]
pub mod async_client;
pub mod config;
pub mod error;
pub mod marketplace;
pub mod models;
pub mod pricing;
pub mod recognition;
pub mod store;
pub mod validation;

#[cfg(feature = "async")]
pub use async_client::AsyncResaleFinder;
pub use config::Settings;
pub use error::{FinderError, Result};
pub use marketplace::MarketplaceClient;
pub use pricing::{calculate_suggestion, suggest_for_listings};
pub use recognition::{ImageRecognizer, Recognition};
pub use store::Store;

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::info;

use models::{
    Listing, ListingProduct, NewListingProduct, ProductImage, SearchResponse, SearchResults,
};

// ---------------------------------------------------------------------------
// ResaleFinderBuilder
// ---------------------------------------------------------------------------

/// Builder for configuring and constructing a [`ResaleFinder`].
///
/// Use [`ResaleFinder::builder()`] to obtain one.
pub struct ResaleFinderBuilder {
    settings: Settings,
    database_path: Option<PathBuf>,
    timeout: Duration,
    demo_seed: Option<u64>,
}

impl Default for ResaleFinderBuilder {
    fn default() -> Self {
        Self {
            settings: Settings::default(),
            database_path: None,
            timeout: Duration::from_secs(30),
            demo_seed: None,
        }
    }
}

impl ResaleFinderBuilder {
    /// Replace the service settings (credentials, endpoints).
    ///
    /// A `database_path` inside the settings is used unless
    /// [`database_path`](Self::database_path) is also called.
    pub fn settings(mut self, settings: Settings) -> Self {
        self.settings = settings;
        self
    }

    /// Persist records to a DuckDB file instead of memory.
    pub fn database_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.database_path = Some(path.as_ref().to_path_buf());
        self
    }

    /// HTTP timeout for marketplace and vision requests. Defaults to 30 seconds.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Seed the demo listing generator so fallback data is reproducible.
    pub fn demo_seed(mut self, seed: u64) -> Self {
        self.demo_seed = Some(seed);
        self
    }

    /// Open the store and construct the service clients.
    ///
    /// No network traffic happens here.
    pub fn build(self) -> Result<ResaleFinder> {
        let db_path = self.database_path.or_else(|| self.settings.database_path.clone());
        let store = Store::open(db_path.as_deref())?;
        let marketplace =
            MarketplaceClient::new(&self.settings, self.timeout)?.with_demo_seed(self.demo_seed);
        let recognizer = ImageRecognizer::new(&self.settings, self.timeout)?;
        Ok(ResaleFinder {
            store,
            marketplace,
            recognizer,
        })
    }
}

// ---------------------------------------------------------------------------
// ResaleFinder
// ---------------------------------------------------------------------------

/// Main entry point: identification, marketplace search, persistence and
/// price suggestion.
pub struct ResaleFinder {
    store: Store,
    marketplace: MarketplaceClient,
    recognizer: ImageRecognizer,
}

impl ResaleFinder {
    pub fn builder() -> ResaleFinderBuilder {
        ResaleFinderBuilder::default()
    }

    // -- Identification events ---------------------------------------------

    /// Identify the product in an uploaded image and search for it.
    ///
    /// Returns the id of the new image record. The record is only created
    /// once recognition succeeded, together with its results.
    pub fn upload_image<P: AsRef<Path>>(&self, image_path: P) -> Result<i64> {
        let path = image_path.as_ref();
        validation::validate_image(path)?;

        let recognition = self.recognizer.recognize_product(path)?;
        let listings = self.fetch_listings(recognition.search_keywords());

        let id = self.store.in_transaction(|store| {
            let id = store.create_image(Some(path), &recognition.primary)?;
            store.update_image_labels(id, &recognition.primary, &recognition.labels)?;
            persist_search(store, id, &listings, false)?;
            Ok(id)
        })?;

        info!("Image uploaded! Detected: \"{}\"", recognition.primary);
        Ok(id)
    }

    /// Search for typed keywords, recording them as an identification event.
    pub fn manual_search(&self, keywords: &str) -> Result<i64> {
        let keywords = validation::validate_keywords(keywords)?;
        let listings = self.fetch_listings(&keywords);

        let id = self.store.in_transaction(|store| {
            let id = store.create_image(None, &keywords)?;
            persist_search(store, id, &listings, false)?;
            Ok(id)
        })?;

        info!("Search completed for: \"{}\"", keywords);
        Ok(id)
    }

    /// Everything stored for an image.
    pub fn results(&self, id: i64) -> Result<SearchResults> {
        let image = self.require_image(id)?;
        let results = self.store.results_for_image(id)?;
        let suggestion = self.store.suggestion_for_image(id)?;
        Ok(SearchResults {
            image,
            results,
            suggestion,
        })
    }

    /// Discard an image's results and suggestion and search again with its
    /// detected label.
    pub fn refresh_search(&self, id: i64) -> Result<()> {
        let image = self.require_image(id)?;
        let keywords = if image.detected_label.is_empty() {
            config::FALLBACK_KEYWORD
        } else {
            image.detected_label.as_str()
        };
        let listings = self.fetch_listings(keywords);
        self.store
            .in_transaction(|store| persist_search(store, id, &listings, true))?;
        info!("Search refreshed for image {}", id);
        Ok(())
    }

    /// The most recent identification events, newest first.
    pub fn recent_searches(&self) -> Result<Vec<ProductImage>> {
        self.store.recent_images(config::RECENT_LIMIT)
    }

    /// Delete an image with its results and suggestion.
    pub fn delete_image(&self, id: i64) -> Result<()> {
        if !self.store.delete_image(id)? {
            return Err(FinderError::NotFound(format!("Image {}", id)));
        }
        Ok(())
    }

    /// Stateless lookup: listings and a suggestion, nothing persisted.
    pub fn search(&self, keywords: &str) -> Result<SearchResponse> {
        let keywords = keywords.trim();
        if keywords.is_empty() {
            return Err(FinderError::InvalidArgument("Keywords required".to_string()));
        }
        let results = self
            .marketplace
            .search_products(keywords, config::DEFAULT_SEARCH_LIMIT);
        let suggestion = suggest_for_listings(&results);
        Ok(SearchResponse {
            results,
            suggestion,
        })
    }

    // -- Locally saved listings --------------------------------------------

    /// Save a demo listing locally. Nothing is sent to the marketplace.
    pub fn add_product(&self, product: &NewListingProduct) -> Result<ListingProduct> {
        validation::validate_product(product)?;
        let id = self.store.insert_product(product)?;
        info!("Demo listing saved locally (no eBay API call)");
        self.product(id)
    }

    pub fn product(&self, id: i64) -> Result<ListingProduct> {
        self.store
            .product(id)?
            .ok_or_else(|| FinderError::NotFound(format!("Listing product {}", id)))
    }

    pub fn products(&self) -> Result<Vec<ListingProduct>> {
        self.store.products()
    }

    pub fn recent_products(&self) -> Result<Vec<ListingProduct>> {
        self.store.recent_products(config::RECENT_LIMIT)
    }

    // -- Accessors ----------------------------------------------------------

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn marketplace(&self) -> &MarketplaceClient {
        &self.marketplace
    }

    pub fn recognizer(&self) -> &ImageRecognizer {
        &self.recognizer
    }

    // -- Internals ----------------------------------------------------------

    fn require_image(&self, id: i64) -> Result<ProductImage> {
        self.store
            .image(id)?
            .ok_or_else(|| FinderError::NotFound(format!("Image {}", id)))
    }

    fn fetch_listings(&self, keywords: &str) -> Vec<Listing> {
        self.marketplace
            .search_products(keywords, config::DEFAULT_SEARCH_LIMIT)
    }
}

/// Persist listings and their suggestion for an image. Runs inside the
/// caller's transaction. With `replace`, previous results and suggestion are
/// dropped first.
fn persist_search(store: &Store, id: i64, listings: &[Listing], replace: bool) -> Result<()> {
    if replace {
        store.clear_results(id)?;
        store.delete_suggestion(id)?;
    }
    for listing in listings {
        store.insert_result(id, listing)?;
    }
    if !listings.is_empty() {
        store.insert_suggestion(id, &suggest_for_listings(listings))?;
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Display
// ---------------------------------------------------------------------------

impl fmt::Display for ResaleFinder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let db = self
            .store
            .path()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| ":memory:".to_string());
        write!(
            f,
            "ResaleFinder(database={}, marketplace_auth={}, vision={})",
            db,
            self.marketplace.has_credentials(),
            self.recognizer.is_enabled()
        )
    }
}
