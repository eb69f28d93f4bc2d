//! eBay Browse API client with a randomized demo fallback.
//!
//! Listings come from the Browse API when an OAuth application token can be
//! obtained. Missing credentials, a failed token request, or a failed search
//! all degrade to locally generated demo listings so callers always get a
//! usable price sample.

use std::cell::RefCell;
use std::str::FromStr;
use std::time::Duration;

use rand::prelude::*;
use rand::rngs::StdRng;
use reqwest::blocking::Client;
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer};
use tracing::{debug, info, warn};

use crate::config::{self, Settings};
use crate::error::Result;
use crate::models::Listing;
use crate::pricing::to_money;

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ItemSearchResponse {
    #[serde(default, deserialize_with = "null_as_empty")]
    item_summaries: Vec<ItemSummary>,
}

// Every field may be absent or `null` in real responses.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ItemSummary {
    title: Option<String>,
    short_description: Option<String>,
    price: Option<ItemPrice>,
    seller: Option<ItemSeller>,
    item_web_url: Option<String>,
    image: Option<ItemImage>,
    condition: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ItemPrice {
    value: Option<String>,
    currency: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ItemSeller {
    username: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ItemImage {
    image_url: Option<String>,
}

fn null_as_empty<'de, D>(deserializer: D) -> std::result::Result<Vec<ItemSummary>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<ItemSummary>>::deserialize(deserializer)?.unwrap_or_default())
}

// ---------------------------------------------------------------------------
// MarketplaceClient
// ---------------------------------------------------------------------------

/// Searches the marketplace for comparable fixed-price listings.
pub struct MarketplaceClient {
    http: Client,
    app_id: String,
    cert_id: String,
    token_url: String,
    browse_url: String,
    access_token: RefCell<Option<String>>,
    demo_seed: Option<u64>,
}

impl MarketplaceClient {
    /// Create a client from settings. No network traffic happens until the
    /// first search.
    pub fn new(settings: &Settings, timeout: Duration) -> Result<Self> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            app_id: settings.ebay_app_id.clone(),
            cert_id: settings.ebay_cert_id.clone(),
            token_url: settings.oauth_token_url.clone(),
            browse_url: settings.browse_api_url.trim_end_matches('/').to_string(),
            access_token: RefCell::new(None),
            demo_seed: None,
        })
    }

    /// Make demo listings reproducible.
    pub fn with_demo_seed(mut self, seed: Option<u64>) -> Self {
        self.demo_seed = seed;
        self
    }

    /// Whether both halves of the application keyset are configured.
    pub fn has_credentials(&self) -> bool {
        !self.app_id.is_empty() && !self.cert_id.is_empty()
    }

    /// Return the cached OAuth application token, requesting one if needed.
    ///
    /// Returns `None` when credentials are missing or the token endpoint
    /// cannot be reached. Failures are not cached, so the next call retries.
    pub fn access_token(&self) -> Option<String> {
        if let Some(token) = self.access_token.borrow().as_ref() {
            return Some(token.clone());
        }
        if !self.has_credentials() {
            return None;
        }

        match self.request_token() {
            Ok(Some(token)) => {
                debug!("Obtained marketplace access token");
                *self.access_token.borrow_mut() = Some(token.clone());
                Some(token)
            }
            Ok(None) => {
                warn!("Token response carried no access_token");
                None
            }
            Err(e) => {
                warn!("Failed to obtain marketplace access token: {}", e);
                None
            }
        }
    }

    fn request_token(&self) -> Result<Option<String>> {
        let resp = self
            .http
            .post(&self.token_url)
            .basic_auth(&self.app_id, Some(&self.cert_id))
            .form(&[
                ("grant_type", "client_credentials"),
                ("scope", config::OAUTH_SCOPE),
            ])
            .send()?
            .error_for_status()?;
        let body: TokenResponse = resp.json()?;
        Ok(body.access_token.filter(|t| !t.is_empty()))
    }

    /// Search for fixed-price listings matching `keywords`.
    ///
    /// `limit` is capped at 200. Never fails: any remote problem yields
    /// demo listings instead.
    pub fn search_products(&self, keywords: &str, limit: usize) -> Vec<Listing> {
        let Some(token) = self.access_token() else {
            info!("No marketplace token; using demo listings for '{}'", keywords);
            return self.demo_results(keywords);
        };

        match self.fetch_listings(&token, keywords, limit) {
            Ok(listings) => {
                info!("Marketplace returned {} listings for '{}'", listings.len(), keywords);
                listings
            }
            Err(e) => {
                warn!("Marketplace search failed for '{}': {} -- using demo listings", keywords, e);
                self.demo_results(keywords)
            }
        }
    }

    fn fetch_listings(&self, token: &str, keywords: &str, limit: usize) -> Result<Vec<Listing>> {
        let url = format!("{}/item_summary/search", self.browse_url);
        let limit = limit.min(config::MAX_SEARCH_LIMIT).to_string();

        let resp = self
            .http
            .get(&url)
            .bearer_auth(token)
            .header("X-EBAY-C-MARKETPLACE-ID", config::MARKETPLACE_ID)
            .header("Content-Type", "application/json")
            .query(&[
                ("q", keywords),
                ("limit", limit.as_str()),
                ("filter", config::FIXED_PRICE_FILTER),
            ])
            .send()?
            .error_for_status()?;

        let body: ItemSearchResponse = resp.json()?;
        Ok(parse_items(body.item_summaries))
    }

    /// Generate demo listings priced around a keyword-dependent base price.
    ///
    /// Returns [`config::DEMO_LISTING_COUNT`] listings sorted by ascending
    /// price.
    pub fn demo_results(&self, keywords: &str) -> Vec<Listing> {
        let mut rng = match self.demo_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        demo_listings(keywords, &mut rng)
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn parse_items(items: Vec<ItemSummary>) -> Vec<Listing> {
    let mut listings = Vec::with_capacity(items.len());
    for item in items {
        let title = item.title.unwrap_or_default();
        let price_info = item.price.unwrap_or_default();
        let raw_price = price_info.value.unwrap_or_else(|| "0".to_string());
        let price = match Decimal::from_str(raw_price.trim()) {
            Ok(p) => p,
            Err(e) => {
                warn!("Skipping listing '{}' with unparsable price '{}': {}", title, raw_price, e);
                continue;
            }
        };

        listings.push(Listing {
            title,
            description: item.short_description.unwrap_or_default(),
            price,
            currency: price_info
                .currency
                .unwrap_or_else(|| config::DEFAULT_CURRENCY.to_string()),
            seller: item.seller.and_then(|s| s.username).unwrap_or_default(),
            item_url: item.item_web_url.unwrap_or_default(),
            image_url: item.image.and_then(|i| i.image_url).unwrap_or_default(),
            condition: item.condition.unwrap_or_default(),
        });
    }
    listings
}

/// Base price for demo data: the first table keyword contained in the
/// lowercased search string, else the default.
pub fn demo_base_price(keywords: &str) -> f64 {
    let lower = keywords.to_lowercase();
    config::demo_base_prices()
        .into_iter()
        .find(|(key, _)| lower.contains(key))
        .map(|(_, price)| price)
        .unwrap_or(config::DEMO_DEFAULT_BASE_PRICE)
}

fn demo_listings<R: Rng>(keywords: &str, rng: &mut R) -> Vec<Listing> {
    let base_price = demo_base_price(keywords);
    let (low, high) = config::DEMO_PRICE_VARIATION;

    let mut results: Vec<Listing> = (1..=config::DEMO_LISTING_COUNT)
        .map(|i| {
            let variation: f64 = rng.gen_range(low..=high);
            let price = Decimal::from_f64(base_price * variation)
                .map(to_money)
                .unwrap_or(Decimal::ZERO);
            let tag = config::DEMO_TITLE_TAGS.choose(rng).copied().unwrap_or("");
            let seller = config::DEMO_SELLERS.choose(rng).copied().unwrap_or("");
            let condition = config::DEMO_CONDITIONS.choose(rng).copied().unwrap_or("New");

            Listing {
                title: format!("{} - {} - Listing {}", keywords, tag, i),
                description: format!("{} demo listing with standard features.", keywords),
                price,
                currency: config::DEFAULT_CURRENCY.to_string(),
                seller: seller.to_string(),
                item_url: format!("https://www.ebay.com/itm/demo{}", i),
                image_url: String::new(),
                condition: condition.to_string(),
            }
        })
        .collect();

    results.sort_by_key(|l| l.price);
    results
}
