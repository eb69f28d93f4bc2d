//! Input checks applied before anything is persisted or sent to a remote
//! service.

use std::fs;
use std::path::Path;

use rust_decimal::Decimal;

use crate::config;
use crate::error::{FinderError, Result};
use crate::models::NewListingProduct;

/// Check an uploaded image file for size and extension.
pub fn validate_image(path: &Path) -> Result<()> {
    let metadata = fs::metadata(path).map_err(|e| {
        FinderError::InvalidUpload(format!("Cannot read image {}: {}", path.display(), e))
    })?;
    if !metadata.is_file() {
        return Err(FinderError::InvalidUpload(format!(
            "Not a file: {}",
            path.display()
        )));
    }
    if metadata.len() > config::MAX_UPLOAD_BYTES {
        return Err(FinderError::InvalidUpload(
            "Image file too large (max 10MB)".to_string(),
        ));
    }

    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| format!(".{}", e.to_lowercase()));
    let allowed = ext
        .as_deref()
        .map(|e| config::ALLOWED_IMAGE_EXTENSIONS.contains(&e))
        .unwrap_or(false);
    if !allowed {
        return Err(FinderError::InvalidUpload(format!(
            "Unsupported file type. Allowed: {}",
            config::ALLOWED_IMAGE_EXTENSIONS.join(", ")
        )));
    }

    Ok(())
}

/// Normalize search keywords, returning the trimmed string.
pub fn validate_keywords(keywords: &str) -> Result<String> {
    let trimmed = keywords.trim();
    if trimmed.is_empty() {
        return Err(FinderError::InvalidArgument(
            "Please enter valid search keywords.".to_string(),
        ));
    }
    if trimmed.chars().count() > config::MAX_KEYWORDS_LEN {
        return Err(FinderError::InvalidArgument(format!(
            "Keywords must be at most {} characters",
            config::MAX_KEYWORDS_LEN
        )));
    }
    Ok(trimmed.to_string())
}

/// Check a locally saved listing before it is stored.
pub fn validate_product(product: &NewListingProduct) -> Result<()> {
    let title = product.title.trim();
    if title.is_empty() || title.chars().count() > config::MAX_PRODUCT_TITLE_LEN {
        return Err(FinderError::InvalidArgument(format!(
            "Title must be 1-{} characters",
            config::MAX_PRODUCT_TITLE_LEN
        )));
    }

    let category = product.category_id.trim();
    if category.is_empty() || category.chars().count() > config::MAX_CATEGORY_ID_LEN {
        return Err(FinderError::InvalidArgument(format!(
            "Category id must be 1-{} characters",
            config::MAX_CATEGORY_ID_LEN
        )));
    }

    validate_price(product.price)?;

    if let Some(ref path) = product.image_path {
        validate_image(path)?;
    }

    Ok(())
}

/// Prices must fit a `DECIMAL(10,2)` column and be non-negative.
pub fn validate_price(price: Decimal) -> Result<()> {
    if price.is_sign_negative() && !price.is_zero() {
        return Err(FinderError::InvalidArgument(
            "Price must not be negative".to_string(),
        ));
    }
    let normalized = price.normalize();
    if normalized.scale() > 2 {
        return Err(FinderError::InvalidArgument(
            "Price may have at most 2 decimal places".to_string(),
        ));
    }
    let whole_digits = config::MAX_PRICE_DIGITS - 2;
    if price.trunc().abs() >= Decimal::from(10u64.pow(whole_digits)) {
        return Err(FinderError::InvalidArgument(format!(
            "Price may have at most {} digits",
            config::MAX_PRICE_DIGITS
        )));
    }
    Ok(())
}
