//! Async wrapper around [`ResaleFinder`] for use in async runtimes (Tokio, etc.).
//!
//! Runs every operation on the blocking thread pool via
//! [`tokio::task::spawn_blocking`]: the marketplace and vision clients use
//! blocking HTTP and DuckDB calls are synchronous.
//!
//! # Example
//!
//! ```no_run
//! use resale_finder::AsyncResaleFinder;
//!
//! #[tokio::main]
//! async fn main() {
//!     let finder = AsyncResaleFinder::builder().build().await.unwrap();
//!
//!     let id = finder.manual_search("castrol edge 5w-30").await.unwrap();
//!     let results = finder.results(id).await.unwrap();
//!     println!("{} listings", results.results.len());
//! }
//! ```

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::config::Settings;
use crate::error::{FinderError, Result};
use crate::models::{SearchResponse, SearchResults};
use crate::ResaleFinder;

// ---------------------------------------------------------------------------
// AsyncResaleFinderBuilder
// ---------------------------------------------------------------------------

/// Builder for configuring and constructing an [`AsyncResaleFinder`].
pub struct AsyncResaleFinderBuilder {
    settings: Settings,
    database_path: Option<PathBuf>,
    timeout: Duration,
    demo_seed: Option<u64>,
}

impl Default for AsyncResaleFinderBuilder {
    fn default() -> Self {
        Self {
            settings: Settings::default(),
            database_path: None,
            timeout: Duration::from_secs(30),
            demo_seed: None,
        }
    }
}

impl AsyncResaleFinderBuilder {
    pub fn settings(mut self, settings: Settings) -> Self {
        self.settings = settings;
        self
    }

    pub fn database_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.database_path = Some(path.as_ref().to_path_buf());
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn demo_seed(mut self, seed: u64) -> Self {
        self.demo_seed = Some(seed);
        self
    }

    /// Build the finder on the blocking pool so opening the database never
    /// stalls the event loop.
    pub async fn build(self) -> Result<AsyncResaleFinder> {
        tokio::task::spawn_blocking(move || {
            let mut builder = ResaleFinder::builder()
                .settings(self.settings)
                .timeout(self.timeout);
            if let Some(path) = self.database_path {
                builder = builder.database_path(path);
            }
            if let Some(seed) = self.demo_seed {
                builder = builder.demo_seed(seed);
            }
            let finder = builder.build()?;
            Ok(AsyncResaleFinder {
                inner: Arc::new(Mutex::new(finder)),
            })
        })
        .await
        .map_err(|e| FinderError::InvalidArgument(format!("Task join error: {e}")))?
    }
}

// ---------------------------------------------------------------------------
// AsyncResaleFinder
// ---------------------------------------------------------------------------

/// Async wrapper around [`ResaleFinder`].
///
/// The finder is kept behind a [`Mutex`] since its marketplace client caches
/// the OAuth token in a `RefCell`.
#[derive(Clone)]
pub struct AsyncResaleFinder {
    inner: Arc<Mutex<ResaleFinder>>,
}

impl AsyncResaleFinder {
    pub fn builder() -> AsyncResaleFinderBuilder {
        AsyncResaleFinderBuilder::default()
    }

    /// Run a sync operation on the blocking thread pool.
    pub async fn run<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&ResaleFinder) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let finder = self.inner.clone();
        tokio::task::spawn_blocking(move || {
            let guard = finder
                .lock()
                .map_err(|_| FinderError::InvalidArgument("Finder lock poisoned".into()))?;
            f(&guard)
        })
        .await
        .map_err(|e| FinderError::InvalidArgument(format!("Task join error: {e}")))?
    }

    pub async fn upload_image<P: AsRef<Path>>(&self, image_path: P) -> Result<i64> {
        let path = image_path.as_ref().to_path_buf();
        self.run(move |f| f.upload_image(&path)).await
    }

    pub async fn manual_search(&self, keywords: &str) -> Result<i64> {
        let keywords = keywords.to_string();
        self.run(move |f| f.manual_search(&keywords)).await
    }

    pub async fn results(&self, id: i64) -> Result<SearchResults> {
        self.run(move |f| f.results(id)).await
    }

    pub async fn refresh_search(&self, id: i64) -> Result<()> {
        self.run(move |f| f.refresh_search(id)).await
    }

    pub async fn search(&self, keywords: &str) -> Result<SearchResponse> {
        let keywords = keywords.to_string();
        self.run(move |f| f.search(&keywords)).await
    }
}
