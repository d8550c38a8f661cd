//! Content module - front-matter, markdown rendering and the post model

mod frontmatter;
mod markdown;
mod parser;
mod post;

pub use frontmatter::{split_document, FrontMatter};
pub use markdown::MarkdownRenderer;
pub use parser::DocumentParser;
pub use post::Post;
