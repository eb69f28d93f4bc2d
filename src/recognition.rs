//! Product identification from an uploaded photo.
//!
//! Uses the Google Cloud Vision `images:annotate` REST endpoint (label and
//! web detection) when an API key is configured. Without a key, or when the
//! service reports an error, keywords are derived from the file name.

use std::fs;
use std::path::Path;
use std::time::Duration;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, warn};

use crate::config::{self, Settings};
use crate::error::Result;

// ---------------------------------------------------------------------------
// Recognition
// ---------------------------------------------------------------------------

/// Outcome of identifying a product image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recognition {
    /// Best single description of the product.
    pub primary: String,
    /// All candidate labels, `primary` first.
    pub labels: Vec<String>,
    /// Vision's best-guess web entity, when one was returned.
    pub web_label: Option<String>,
}

impl Recognition {
    fn fallback(image_path: &Path) -> Self {
        let primary = fallback_keywords(image_path);
        Self {
            labels: vec![primary.clone()],
            primary,
            web_label: None,
        }
    }

    /// Keywords to search the marketplace with: the web label when present,
    /// otherwise the primary label.
    pub fn search_keywords(&self) -> &str {
        self.web_label.as_deref().unwrap_or(&self.primary)
    }
}

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Deserialize)]
struct AnnotateResponse {
    #[serde(default)]
    responses: Vec<AnnotateImageResponse>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AnnotateImageResponse {
    #[serde(default)]
    label_annotations: Vec<LabelAnnotation>,
    web_detection: Option<WebDetection>,
    error: Option<StatusMessage>,
}

#[derive(Debug, Deserialize)]
struct LabelAnnotation {
    description: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WebDetection {
    #[serde(default)]
    best_guess_labels: Vec<BestGuessLabel>,
}

#[derive(Debug, Deserialize)]
struct BestGuessLabel {
    label: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct StatusMessage {
    message: Option<String>,
}

// ---------------------------------------------------------------------------
// ImageRecognizer
// ---------------------------------------------------------------------------

pub struct ImageRecognizer {
    http: Client,
    api_key: String,
    endpoint: String,
}

impl ImageRecognizer {
    pub fn new(settings: &Settings, timeout: Duration) -> Result<Self> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            api_key: settings.vision_api_key.clone(),
            endpoint: settings.vision_api_url.clone(),
        })
    }

    /// Whether remote labeling is configured.
    pub fn is_enabled(&self) -> bool {
        !self.api_key.is_empty()
    }

    /// Identify the product in the image at `image_path`.
    ///
    /// Only reading the file can fail; remote errors fall back to
    /// filename-derived keywords.
    pub fn recognize_product(&self, image_path: &Path) -> Result<Recognition> {
        if !self.is_enabled() {
            return Ok(Recognition::fallback(image_path));
        }

        let content = fs::read(image_path)?;

        let response = match self.annotate(&content) {
            Ok(r) => r,
            Err(e) => {
                warn!("Vision request failed for {}: {}", image_path.display(), e);
                return Ok(Recognition::fallback(image_path));
            }
        };

        if let Some(message) = response
            .error
            .as_ref()
            .and_then(|e| e.message.as_deref())
            .filter(|m| !m.is_empty())
        {
            warn!("Vision reported an error for {}: {}", image_path.display(), message);
            return Ok(Recognition::fallback(image_path));
        }

        let recognition = build_recognition(response);
        debug!(
            "Recognized {} as '{}' ({} labels)",
            image_path.display(),
            recognition.primary,
            recognition.labels.len()
        );
        Ok(recognition)
    }

    fn annotate(&self, content: &[u8]) -> Result<AnnotateImageResponse> {
        let body = json!({
            "requests": [{
                "image": { "content": STANDARD.encode(content) },
                "features": [
                    { "type": "LABEL_DETECTION", "maxResults": config::LABEL_MAX_RESULTS },
                    { "type": "WEB_DETECTION", "maxResults": config::WEB_MAX_RESULTS },
                ],
            }]
        });

        let resp = self
            .http
            .post(&self.endpoint)
            .query(&[("key", self.api_key.as_str())])
            .json(&body)
            .send()?
            .error_for_status()?;

        let parsed: AnnotateResponse = resp.json()?;
        Ok(parsed.responses.into_iter().next().unwrap_or_default())
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn build_recognition(response: AnnotateImageResponse) -> Recognition {
    let mut labels: Vec<String> = response
        .label_annotations
        .into_iter()
        .filter_map(|l| l.description)
        .filter(|d| !d.is_empty())
        .collect();

    let web_label = response
        .web_detection
        .and_then(|w| w.best_guess_labels.into_iter().next())
        .and_then(|b| b.label)
        .filter(|l| !l.is_empty());

    let primary = web_label
        .clone()
        .or_else(|| labels.first().cloned())
        .unwrap_or_else(|| config::FALLBACK_KEYWORD.to_string());

    if !labels.contains(&primary) {
        labels.insert(0, primary.clone());
    }

    Recognition {
        primary,
        labels,
        web_label,
    }
}

/// Turn `mobil_1-synthetic.jpg` into `mobil 1 synthetic`.
pub fn fallback_keywords(image_path: &Path) -> String {
    let stem = image_path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("");
    let keywords = stem.replace(['_', '-'], " ");
    let keywords = keywords.trim();
    if keywords.is_empty() {
        config::FALLBACK_KEYWORD.to_string()
    } else {
        keywords.to_string()
    }
}
