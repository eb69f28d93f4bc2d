use std::env;
use std::path::PathBuf;

pub const OAUTH_TOKEN_URL: &str = "https://api.ebay.com/identity/v1/oauth2/token";
pub const BROWSE_API_URL: &str = "https://api.ebay.com/buy/browse/v1";
pub const VISION_API_URL: &str = "https://vision.googleapis.com/v1/images:annotate";

pub const OAUTH_SCOPE: &str = "https://api.ebay.com/oauth/api_scope";
pub const MARKETPLACE_ID: &str = "EBAY_US";
pub const FIXED_PRICE_FILTER: &str = "buyingOptions:{FIXED_PRICE}";

pub const DEFAULT_SEARCH_LIMIT: usize = 50;
pub const MAX_SEARCH_LIMIT: usize = 200;
pub const DEFAULT_CURRENCY: &str = "USD";

pub const LABEL_MAX_RESULTS: u32 = 7;
pub const WEB_MAX_RESULTS: u32 = 3;
pub const FALLBACK_KEYWORD: &str = "product";

pub const MAX_UPLOAD_BYTES: u64 = 10 * 1024 * 1024;
pub const ALLOWED_IMAGE_EXTENSIONS: [&str; 5] = [".jpg", ".jpeg", ".png", ".gif", ".webp"];
pub const MAX_KEYWORDS_LEN: usize = 200;
pub const MAX_LABEL_LEN: usize = 255;
pub const MAX_TITLE_LEN: usize = 500;
pub const MAX_PRODUCT_TITLE_LEN: usize = 200;
pub const MAX_CATEGORY_ID_LEN: usize = 32;
pub const MAX_PRICE_DIGITS: u32 = 10;

pub const RECENT_LIMIT: usize = 5;

// ---------------------------------------------------------------------------
// Demo data
// ---------------------------------------------------------------------------

pub const DEMO_LISTING_COUNT: usize = 12;
pub const DEMO_DEFAULT_BASE_PRICE: f64 = 29.99;
pub const DEMO_PRICE_VARIATION: (f64, f64) = (0.7, 1.4);

/// Keyword -> base price table. Order matters: the first keyword found in
/// the search string wins.
pub fn demo_base_prices() -> Vec<(&'static str, f64)> {
    vec![
        ("oil", 25.99),
        ("bottle", 15.99),
        ("motor", 35.99),
        ("synthetic", 45.99),
        ("mobil", 39.99),
        ("castrol", 37.99),
    ]
}

pub const DEMO_SELLERS: [&str; 12] = [
    "auto_parts_direct",
    "motor_supplies_usa",
    "oilchange_pro",
    "carcare_warehouse",
    "best_auto_deals",
    "performance_fluids",
    "discount_auto_store",
    "prime_automotive",
    "value_auto_parts",
    "super_car_supplies",
    "mechanic_depot",
    "garage_essentials",
];

pub const DEMO_TITLE_TAGS: [&str; 4] = ["Brand New", "Premium", "Best Seller", "Top Rated"];

// "New" appears three times so demo draws lean towards new stock.
pub const DEMO_CONDITIONS: [&str; 5] = ["New", "New", "New", "Like New", "Used"];

// ---------------------------------------------------------------------------
// Settings
// ---------------------------------------------------------------------------

/// Runtime settings for the remote services and the record store.
///
/// Credentials left empty switch the corresponding client into its local
/// fallback mode (demo listings, filename keywords).
#[derive(Debug, Clone)]
pub struct Settings {
    pub ebay_app_id: String,
    pub ebay_cert_id: String,
    pub vision_api_key: String,
    pub oauth_token_url: String,
    pub browse_api_url: String,
    pub vision_api_url: String,
    /// `None` keeps the store in memory.
    pub database_path: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            ebay_app_id: String::new(),
            ebay_cert_id: String::new(),
            vision_api_key: String::new(),
            oauth_token_url: OAUTH_TOKEN_URL.to_string(),
            browse_api_url: BROWSE_API_URL.to_string(),
            vision_api_url: VISION_API_URL.to_string(),
            database_path: None,
        }
    }
}

impl Settings {
    /// Load settings from environment variables, keeping defaults for
    /// anything unset.
    pub fn from_env() -> Self {
        let mut settings = Self::default();

        if let Ok(app_id) = env::var("EBAY_APP_ID") {
            settings.ebay_app_id = app_id;
        }
        if let Ok(cert_id) = env::var("EBAY_CERT_ID") {
            settings.ebay_cert_id = cert_id;
        }
        if let Ok(key) = env::var("GOOGLE_VISION_API_KEY") {
            settings.vision_api_key = key;
        }
        if let Ok(path) = env::var("RESALE_FINDER_DB") {
            if !path.trim().is_empty() {
                settings.database_path = Some(PathBuf::from(path));
            }
        }

        settings
    }

    pub fn has_marketplace_credentials(&self) -> bool {
        !self.ebay_app_id.is_empty() && !self.ebay_cert_id.is_empty()
    }

    pub fn has_vision_credentials(&self) -> bool {
        !self.vision_api_key.is_empty()
    }
}

pub fn default_database_path() -> PathBuf {
    if let Some(data) = dirs::data_dir() {
        data.join("resale-finder").join("finder.duckdb")
    } else {
        PathBuf::from(".resale-finder").join("finder.duckdb")
    }
}
