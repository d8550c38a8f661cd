//! Post model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A parsed blog post, immutable once built
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    /// Stable external identifier from the front-matter
    pub id: String,

    /// URL-friendly name, unique within a snapshot
    pub slug: String,

    /// Post title
    pub title: String,

    /// Post author
    pub author: String,

    /// Short description shown in listings
    pub summary: String,

    /// Publication date
    pub date: DateTime<Utc>,

    /// Publication date formatted for display
    pub display_date: String,

    /// Post tags, in front-matter order
    pub tags: Vec<String>,

    /// Whether the post is published
    pub published: bool,

    /// Rendered and sanitized HTML content
    pub content: String,

    /// Raw markdown body, kept for search
    #[serde(skip_serializing, default)]
    pub raw_content: String,
}

impl Post {
    /// Whether this post may enter a snapshot
    pub fn is_servable(&self) -> bool {
        self.published && !self.slug.is_empty()
    }

    /// Lower-cased text that search queries are matched against
    pub fn search_text(&self) -> String {
        let tags = self.tags.join(" ");
        [
            self.title.as_str(),
            self.summary.as_str(),
            self.raw_content.as_str(),
            tags.as_str(),
        ]
        .join(" ")
        .to_lowercase()
    }

    /// Whether every term occurs somewhere in the searchable text
    ///
    /// Terms must already be lower-cased.
    pub fn matches_all(&self, terms: &[String]) -> bool {
        let text = self.search_text();
        terms.iter().all(|term| text.contains(term.as_str()))
    }

    /// Whether the post carries exactly this tag
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }
}
