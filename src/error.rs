//! Error types for the content pipeline

use thiserror::Error;

/// Failures talking to the remote content repository
#[derive(Error, Debug)]
pub enum SourceError {
    #[error("Network error requesting {url}: {source}")]
    Network {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Upstream returned status {status} for {url}")]
    Upstream { url: String, status: u16 },

    #[error("Failed to decode response from {url}: {message}")]
    Decode { url: String, message: String },

    #[error("Invalid source configuration: {0}")]
    Config(String),
}

impl SourceError {
    /// HTTP status for upstream failures
    pub fn status(&self) -> Option<u16> {
        match self {
            SourceError::Upstream { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Failures turning a raw document into a post
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("Invalid front-matter: {0}")]
    FrontMatter(#[from] serde_yaml::Error),

    #[error("Invalid date in front-matter: {0:?}")]
    InvalidDate(String),
}

/// A refresh attempt that was abandoned; the previous snapshot stays live
#[derive(Error, Debug)]
pub enum RefreshError {
    #[error("Failed to list content at {path:?}: {source}")]
    List {
        path: String,
        #[source]
        source: SourceError,
    },

    #[error("Failed to fetch {name}: {source}")]
    Fetch {
        name: String,
        #[source]
        source: SourceError,
    },

    #[error("Failed to parse {name}: {source}")]
    Parse {
        name: String,
        #[source]
        source: ParseError,
    },
}

impl RefreshError {
    /// Name of the offending file, if the failure was per-file
    pub fn file_name(&self) -> Option<&str> {
        match self {
            RefreshError::List { .. } => None,
            RefreshError::Fetch { name, .. } | RefreshError::Parse { name, .. } => Some(name),
        }
    }
}
