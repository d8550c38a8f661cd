//! Shared fixtures for integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use gitpost_rs::config::SiteConfig;
use gitpost_rs::error::SourceError;
use gitpost_rs::source::{FileDescriptor, RemoteSource};
use gitpost_rs::Site;

/// In-memory repository with switchable failures
#[derive(Default)]
pub struct MemorySource {
    state: Mutex<MemoryState>,
}

#[derive(Default)]
struct MemoryState {
    entries: Vec<FileDescriptor>,
    files: HashMap<String, String>,
    fail_listing: bool,
    fail_fetch: Option<String>,
}

impl MemorySource {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Add a file at the repository root
    pub fn put(&self, name: &str, content: &str) {
        let mut state = self.state.lock().unwrap();
        state.files.insert(name.to_string(), content.to_string());
        if !state.entries.iter().any(|e| e.name == name) {
            state.entries.push(FileDescriptor::file(name, name));
        }
    }

    /// Add a directory entry
    pub fn put_dir(&self, name: &str) {
        let mut state = self.state.lock().unwrap();
        state.entries.push(FileDescriptor::dir(name, name));
    }

    pub fn clear(&self) {
        let mut state = self.state.lock().unwrap();
        state.entries.clear();
        state.files.clear();
    }

    pub fn fail_listing(&self, fail: bool) {
        self.state.lock().unwrap().fail_listing = fail;
    }

    pub fn fail_fetch(&self, path: Option<&str>) {
        self.state.lock().unwrap().fail_fetch = path.map(String::from);
    }
}

#[async_trait]
impl RemoteSource for MemorySource {
    async fn list_files(&self, _path: &str) -> Result<Vec<FileDescriptor>, SourceError> {
        let state = self.state.lock().unwrap();
        if state.fail_listing {
            return Err(SourceError::Upstream {
                url: "memory://".to_string(),
                status: 503,
            });
        }
        Ok(state.entries.clone())
    }

    async fn fetch_file_content(&self, path: &str) -> Result<String, SourceError> {
        let state = self.state.lock().unwrap();
        if state.fail_fetch.as_deref() == Some(path) {
            return Err(SourceError::Upstream {
                url: format!("memory://{}", path),
                status: 500,
            });
        }
        state.files.get(path).cloned().ok_or(SourceError::Upstream {
            url: format!("memory://{}", path),
            status: 404,
        })
    }
}

/// A published post document
pub fn post_doc(slug: &str, title: &str, date: &str, tags: &[&str], body: &str) -> String {
    format!(
        concat!(
            "---\nid: {slug}\ntitle: {title}\ndate: {date}\nslug: {slug}\n",
            "summary: About {title}\ntags: [{tags}]\npublished: true\n---\n{body}\n",
        ),
        slug = slug,
        title = title,
        date = date,
        tags = tags.join(", "),
        body = body,
    )
}

pub fn test_config() -> SiteConfig {
    let mut config = SiteConfig::default();
    config.repository.owner = "acme".to_string();
    config.repository.name = "blog".to_string();
    config
}

pub fn site_with(source: Arc<MemorySource>) -> Site {
    Site::with_source(test_config(), source)
}
