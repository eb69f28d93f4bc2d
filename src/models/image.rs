use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

// ---------------------------------------------------------------------------
// ProductImage: One identification event (uploaded photo or typed keywords)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ProductImage {
    pub id: i64,
    /// Location of the uploaded photo; `None` for keyword searches.
    pub image_path: Option<PathBuf>,
    pub uploaded_at: String,
    pub detected_label: String,
    pub detected_labels: Vec<String>,
}

impl fmt::Display for ProductImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = if self.detected_label.is_empty() {
            "Unknown"
        } else {
            &self.detected_label
        };
        write!(f, "Image {} - {}", self.id, label)
    }
}

/// Labels are persisted as a single `", "`-joined string.
pub(crate) fn join_labels(labels: &[String]) -> String {
    labels.join(", ")
}

pub(crate) fn split_labels(raw: &str) -> Vec<String> {
    if raw.trim().is_empty() {
        return Vec::new();
    }
    raw.split(", ").map(|s| s.to_string()).collect()
}
