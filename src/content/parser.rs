//! Turns raw repository documents into posts

use crate::error::ParseError;
use crate::helpers::format_date;

use super::{FrontMatter, MarkdownRenderer, Post};

/// Parses a front-matter + markdown document into a [`Post`]
pub struct DocumentParser {
    renderer: MarkdownRenderer,
    date_format: String,
}

impl DocumentParser {
    /// Create a parser formatting display dates with a Moment.js style pattern
    pub fn new(date_format: impl Into<String>) -> Self {
        Self {
            renderer: MarkdownRenderer::new(),
            date_format: date_format.into(),
        }
    }

    /// Parse a single document
    ///
    /// Unpublished or slug-less posts are returned as-is; filtering them out
    /// is up to the caller.
    pub fn parse(&self, raw: &str) -> Result<Post, ParseError> {
        let (fm, body) = FrontMatter::parse(raw)?;
        let date = fm.parse_date()?;

        Ok(Post {
            id: fm.id,
            slug: fm.slug,
            title: fm.title,
            author: fm.author,
            summary: fm.summary,
            date,
            display_date: format_date(&date, &self.date_format),
            tags: fm.tags,
            published: fm.published,
            content: self.renderer.render(body),
            raw_content: body.to_string(),
        })
    }
}

impl Default for DocumentParser {
    fn default() -> Self {
        Self::new(crate::config::ContentConfig::default().date_format)
    }
}
