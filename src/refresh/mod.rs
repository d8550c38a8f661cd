//! Refresh orchestration
//!
//! A refresh lists the content directory, fetches and parses every
//! markdown file, and swaps the resulting snapshot into the store. Any
//! failure abandons the whole attempt and leaves the live snapshot alone.

use futures::stream::{self, StreamExt, TryStreamExt};
use std::collections::HashSet;
use std::sync::Arc;

use crate::config::ContentConfig;
use crate::content::DocumentParser;
use crate::error::RefreshError;
use crate::source::{FileDescriptor, RemoteSource};
use crate::store::{ContentStore, Snapshot};

/// Repository housekeeping files that are never posts
const IGNORED_FILES: [&str; 3] = [".gitignore", "README.md", "LICENSE.md"];

/// Outcome of a successful refresh
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RefreshReport {
    /// Entries returned by the listing
    pub listed: usize,
    /// Entries skipped before fetching (directories, non-markdown, ignored)
    pub skipped: usize,
    /// Parsed posts left out for being unpublished or slug-less
    pub excluded: usize,
    /// Posts that replaced an earlier post with the same slug
    pub overwritten: usize,
    /// Posts in the new snapshot
    pub loaded: usize,
}

/// Rebuilds the store's snapshot from a remote source
pub struct Refresher {
    source: Arc<dyn RemoteSource>,
    parser: DocumentParser,
    store: Arc<ContentStore>,
    path: String,
    ignored: HashSet<String>,
    concurrency: usize,
}

impl Refresher {
    pub fn new(
        source: Arc<dyn RemoteSource>,
        store: Arc<ContentStore>,
        path: impl Into<String>,
        config: &ContentConfig,
    ) -> Self {
        let ignored = IGNORED_FILES
            .iter()
            .map(|name| name.to_string())
            .chain(config.ignore.iter().cloned())
            .collect();

        Self {
            source,
            parser: DocumentParser::new(config.date_format.clone()),
            store,
            path: path.into(),
            ignored,
            concurrency: config.fetch_concurrency.max(1),
        }
    }

    /// Whether a listing entry should be fetched as a post
    fn wants(&self, entry: &FileDescriptor) -> bool {
        if !entry.is_file() {
            tracing::debug!("Skipping non-file entry: {} ({:?})", entry.name, entry.kind);
            return false;
        }
        if !is_markdown_file(&entry.name) {
            tracing::debug!("Skipping non-markdown file: {}", entry.name);
            return false;
        }
        if self.ignored.contains(&entry.name) {
            tracing::debug!("Skipping ignored file: {}", entry.name);
            return false;
        }
        true
    }

    /// Rebuild the snapshot and swap it in
    ///
    /// Fetches overlap up to the configured concurrency but are consumed in
    /// listing order, so later files win slug collisions.
    pub async fn refresh(&self) -> Result<RefreshReport, RefreshError> {
        let entries = self
            .source
            .list_files(&self.path)
            .await
            .map_err(|source| RefreshError::List {
                path: self.path.clone(),
                source,
            })?;

        tracing::info!("Found {} files in repository", entries.len());

        let mut report = RefreshReport {
            listed: entries.len(),
            ..Default::default()
        };

        let wanted: Vec<FileDescriptor> = entries.into_iter().filter(|e| self.wants(e)).collect();
        report.skipped = report.listed - wanted.len();

        let documents: Vec<(String, String)> = stream::iter(wanted)
            .map(|entry| async move {
                tracing::debug!("Fetching markdown file: {}", entry.path);
                match self.source.fetch_file_content(&entry.path).await {
                    Ok(content) => Ok((entry.name, content)),
                    Err(source) => Err(RefreshError::Fetch {
                        name: entry.name,
                        source,
                    }),
                }
            })
            .buffered(self.concurrency)
            .try_collect()
            .await?;

        let mut snapshot = Snapshot::new();
        for (name, content) in documents {
            let post = self
                .parser
                .parse(&content)
                .map_err(|source| RefreshError::Parse {
                    name: name.clone(),
                    source,
                })?;

            if post.slug.is_empty() {
                tracing::warn!("Post '{}' in {} has an empty slug, skipping", post.title, name);
                report.excluded += 1;
                continue;
            }
            if !post.published {
                tracing::info!("Skipping unpublished post: {}", post.slug);
                report.excluded += 1;
                continue;
            }

            if let Some(previous) = snapshot.insert(post) {
                tracing::warn!(
                    "Slug '{}' is used more than once; {} replaces an earlier post",
                    previous.slug,
                    name
                );
                report.overwritten += 1;
            }
        }

        report.loaded = snapshot.len();
        self.store.replace(snapshot);

        tracing::info!(
            "Refreshed content: {} posts loaded, {} excluded, {} skipped",
            report.loaded,
            report.excluded,
            report.skipped
        );

        Ok(report)
    }
}

/// Check if a file name has a markdown extension
pub(crate) fn is_markdown_file(name: &str) -> bool {
    let lower = name.to_ascii_lowercase();
    lower.ends_with(".md") || lower.ends_with(".markdown")
}
