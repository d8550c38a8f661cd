//! Remote content sources
//!
//! A source lists the files of a content repository and hands back raw
//! file contents. Sources are stateless and never retry; the refresh
//! orchestrator decides what a failure means.

mod github;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::SourceError;

pub use github::GithubSource;

/// Kind of a repository entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileKind {
    File,
    Dir,
    /// Symlinks, submodules and anything newer
    #[serde(other)]
    Other,
}

/// One entry of a directory listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileDescriptor {
    pub name: String,
    pub path: String,
    #[serde(rename = "type")]
    pub kind: FileKind,
}

impl FileDescriptor {
    /// Convenience constructor for a regular file
    pub fn file(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            kind: FileKind::File,
        }
    }

    /// Convenience constructor for a directory
    pub fn dir(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            kind: FileKind::Dir,
        }
    }

    pub fn is_file(&self) -> bool {
        self.kind == FileKind::File
    }
}

/// A remote repository of markdown documents
#[async_trait]
pub trait RemoteSource: Send + Sync {
    /// List the entries at `path` ("" is the repository root)
    async fn list_files(&self, path: &str) -> Result<Vec<FileDescriptor>, SourceError>;

    /// Fetch the decoded text of the file at `path`
    async fn fetch_file_content(&self, path: &str) -> Result<String, SourceError>;
}
