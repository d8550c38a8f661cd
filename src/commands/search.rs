//! Search cached content from the command line

use anyhow::Result;
use std::fmt::Write;

use crate::Site;

/// Print posts matching `query`
pub fn run(site: &Site, query: &str) -> Result<()> {
    print!("{}", render(site, query)?);
    Ok(())
}

/// Format posts matching `query`, newest first
pub fn render(site: &Site, query: &str) -> Result<String> {
    let results = site.search(query);
    let mut out = String::new();

    writeln!(out, "Found {} posts matching {:?}:", results.len(), query)?;
    for post in results {
        writeln!(out, "  {} - {} [{}]", post.display_date, post.title, post.slug)?;
        if !post.summary.is_empty() {
            writeln!(out, "      {}", post.summary)?;
        }
    }

    Ok(out)
}
