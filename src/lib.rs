//! gitpost-rs: a blog backend that serves Markdown posts from a GitHub repository
//!
//! Posts are fetched through the GitHub contents API, parsed into
//! [`content::Post`]s, and cached in an in-memory [`store::ContentStore`]
//! that serves listing, tag, and full-text search queries. A refresh
//! rebuilds the whole cache and swaps it in atomically.

pub mod commands;
pub mod config;
pub mod content;
pub mod error;
pub mod helpers;
pub mod refresh;
pub mod server;
pub mod source;
pub mod store;

use anyhow::Result;
use std::sync::Arc;

use crate::content::Post;
use crate::error::RefreshError;
use crate::refresh::{RefreshReport, Refresher};
use crate::source::{GithubSource, RemoteSource};
use crate::store::ContentStore;

/// The main application: configuration, cache and the refresher feeding it
#[derive(Clone)]
pub struct Site {
    /// Site configuration
    pub config: config::SiteConfig,
    /// Live post cache
    pub store: Arc<ContentStore>,
    refresher: Arc<Refresher>,
}

impl Site {
    /// Create a site reading from the configured GitHub repository
    pub fn new(config: config::SiteConfig) -> Result<Self> {
        config.validate()?;
        let source = GithubSource::new(&config.repository)?;
        Ok(Self::with_source(config, Arc::new(source)))
    }

    /// Create a site reading from an arbitrary source
    pub fn with_source(config: config::SiteConfig, source: Arc<dyn RemoteSource>) -> Self {
        let store = Arc::new(ContentStore::new());
        let refresher = Refresher::new(
            source,
            Arc::clone(&store),
            config.repository.path.clone(),
            &config.content,
        );

        Self {
            config,
            store,
            refresher: Arc::new(refresher),
        }
    }

    /// Rebuild the cache from the repository
    pub async fn refresh(&self) -> std::result::Result<RefreshReport, RefreshError> {
        self.refresher.refresh().await
    }

    /// All posts, newest first
    pub fn posts(&self) -> Vec<Arc<Post>> {
        self.store.all()
    }

    /// Search posts
    pub fn search(&self, query: &str) -> Vec<Arc<Post>> {
        self.store.search(query)
    }
}
