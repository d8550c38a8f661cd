//! Markdown rendering and HTML sanitization

use lazy_static::lazy_static;
use pulldown_cmark::{
    html, CodeBlockKind, CowStr, Event, LinkType, Options, Parser, Tag, TagEnd, TextMergeStream,
};
use regex::{Captures, Regex};

lazy_static! {
    /// Code block classes that survive sanitization
    static ref LANGUAGE_CLASS: Regex = Regex::new(r"^language-[A-Za-z0-9]+$").unwrap();
    /// Bare URLs in prose, linked like GitHub does
    static ref BARE_URL: Regex = Regex::new(r#"\bhttps?://[^\s<>"']+"#).unwrap();
    /// Inline HTML opening or closing an anchor written by the author
    static ref RAW_ANCHOR_OPEN: Regex = Regex::new(r"(?i)^<a(\s|>)").unwrap();
    static ref RAW_ANCHOR_CLOSE: Regex = Regex::new(r"(?i)^</a\s*>").unwrap();
    /// An opening anchor as serialized by the sanitizer: every value is double-quoted
    static ref ANCHOR_TAG: Regex =
        Regex::new(r#"<a((?:\s+[^\s"'=<>/]+(?:="[^"]*")?)*)\s*>"#).unwrap();
    static ref HREF_ATTR: Regex = Regex::new(r#"\shref="([^"]*)""#).unwrap();
}

/// Markdown renderer producing HTML that is safe to show to visitors
pub struct MarkdownRenderer {
    sanitizer: ammonia::Builder<'static>,
}

impl MarkdownRenderer {
    /// Create a new markdown renderer
    pub fn new() -> Self {
        let mut sanitizer = ammonia::Builder::default();
        sanitizer
            .add_tag_attributes("code", &["class"])
            // Task list items; every input becomes a read-only checkbox
            .add_tags(&["input"])
            .add_tag_attributes("input", &["checked"])
            .set_tag_attribute_value("input", "type", "checkbox")
            .set_tag_attribute_value("input", "disabled", "")
            .attribute_filter(|element, attribute, value| match (element, attribute) {
                ("code", "class") => LANGUAGE_CLASS.is_match(value).then(|| value.into()),
                _ => Some(value.into()),
            });

        Self { sanitizer }
    }

    /// Render markdown to sanitized HTML
    ///
    /// Every fully-qualified link opens in a new browsing context, whether
    /// it came from Markdown, an autolinked URL or raw HTML.
    pub fn render(&self, markdown: &str) -> String {
        let unsafe_html = self.render_unsanitized(markdown);
        let clean = self.sanitizer.clean(&unsafe_html).to_string();
        open_external_links(&clean)
    }

    /// Render markdown to HTML without the allow-list pass
    fn render_unsanitized(&self, markdown: &str) -> String {
        let options = Options::ENABLE_TABLES
            | Options::ENABLE_FOOTNOTES
            | Options::ENABLE_STRIKETHROUGH
            | Options::ENABLE_TASKLISTS
            | Options::ENABLE_GFM;
        let parser = TextMergeStream::new(Parser::new_ext(markdown, options));

        let mut events: Vec<Event> = Vec::new();
        let mut in_code_block = false;
        // Text inside these is never autolinked
        let mut link_depth = 0usize;
        let mut image_depth = 0usize;
        let mut raw_anchor_depth = 0usize;

        for event in parser {
            match event {
                Event::Start(Tag::CodeBlock(kind)) => {
                    in_code_block = true;
                    let kind = match kind {
                        CodeBlockKind::Fenced(info) => {
                            CodeBlockKind::Fenced(CowStr::from(fence_language(&info)))
                        }
                        CodeBlockKind::Indented => CodeBlockKind::Indented,
                    };
                    events.push(Event::Start(Tag::CodeBlock(kind)));
                }
                Event::End(TagEnd::CodeBlock) => {
                    in_code_block = false;
                    events.push(event);
                }
                Event::Start(Tag::Link { .. }) => {
                    link_depth += 1;
                    events.push(event);
                }
                Event::End(TagEnd::Link) => {
                    link_depth = link_depth.saturating_sub(1);
                    events.push(event);
                }
                Event::Start(Tag::Image { .. }) => {
                    image_depth += 1;
                    events.push(event);
                }
                Event::End(TagEnd::Image) => {
                    image_depth = image_depth.saturating_sub(1);
                    events.push(event);
                }
                Event::InlineHtml(ref raw) => {
                    if RAW_ANCHOR_OPEN.is_match(raw) {
                        raw_anchor_depth += 1;
                    } else if RAW_ANCHOR_CLOSE.is_match(raw) {
                        raw_anchor_depth = raw_anchor_depth.saturating_sub(1);
                    }
                    events.push(event);
                }
                Event::Text(text)
                    if !in_code_block
                        && link_depth == 0
                        && image_depth == 0
                        && raw_anchor_depth == 0 =>
                {
                    autolink(&text, &mut events);
                }
                _ => events.push(event),
            }
        }

        let mut html_output = String::new();
        html::push_html(&mut html_output, events.into_iter());
        html_output
    }
}

impl Default for MarkdownRenderer {
    fn default() -> Self {
        Self::new()
    }
}

/// Reduce a fence info string like `rust,ignore` to a bare language name
fn fence_language(info: &str) -> String {
    let lang = info
        .split(|c: char| c.is_whitespace() || c == ',' || c == '{')
        .next()
        .unwrap_or("");
    if !lang.is_empty() && lang.chars().all(|c| c.is_ascii_alphanumeric()) {
        lang.to_string()
    } else {
        String::new()
    }
}

/// Links that leave the site
fn is_fully_qualified(url: &str) -> bool {
    let lower = url.trim_start().to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://") || lower.starts_with("//")
}

/// Add `target="_blank"` to every sanitized anchor with a fully-qualified href
fn open_external_links(html: &str) -> String {
    ANCHOR_TAG
        .replace_all(html, |caps: &Captures| {
            let attrs = &caps[1];
            let external = HREF_ATTR
                .captures(attrs)
                .map_or(false, |href| is_fully_qualified(&href[1]));
            if external {
                format!(r#"<a{} target="_blank">"#, attrs)
            } else {
                caps[0].to_string()
            }
        })
        .into_owned()
}

/// Split prose around bare URLs, turning each URL into a link
fn autolink<'a>(text: &str, events: &mut Vec<Event<'a>>) {
    let mut last = 0;

    for m in BARE_URL.find_iter(text) {
        let url = m
            .as_str()
            .trim_end_matches(['.', ',', ':', ';', '!', '?', ')', ']', '\'']);
        let end = m.start() + url.len();

        if m.start() > last {
            events.push(Event::Text(CowStr::from(text[last..m.start()].to_string())));
        }
        events.push(Event::Start(Tag::Link {
            link_type: LinkType::Autolink,
            dest_url: CowStr::from(url.to_string()),
            title: CowStr::from(""),
            id: CowStr::from(""),
        }));
        events.push(Event::Text(CowStr::from(url.to_string())));
        events.push(Event::End(TagEnd::Link));
        last = end;
    }

    if last < text.len() {
        events.push(Event::Text(CowStr::from(text[last..].to_string())));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_basic_markdown() {
        let renderer = MarkdownRenderer::new();
        let html = renderer.render("# Hello World\n\nThis is a test.");
        assert!(html.contains("<h1>Hello World</h1>"));
        assert!(html.contains("<p>This is a test.</p>"));
    }

    #[test]
    fn test_render_gfm_extensions() {
        let renderer = MarkdownRenderer::new();
        let html = renderer.render("| a | b |\n|---|---|\n| 1 | 2 |\n\n~~gone~~");
        assert!(html.contains("<table>"));
        assert!(html.contains("<td>1</td>"));
        assert!(html.contains("<del>gone</del>"));
    }

    #[test]
    fn test_code_block_keeps_language_class() {
        let renderer = MarkdownRenderer::new();
        let html = renderer.render("```rust\nfn main() {}\n```");
        assert!(html.contains(r#"<code class="language-rust">"#));

        let html = renderer.render("```rust,ignore\nfn main() {}\n```");
        assert!(html.contains(r#"<code class="language-rust">"#));
    }

    #[test]
    fn test_code_block_drops_unsafe_language_class() {
        let renderer = MarkdownRenderer::new();
        let html = renderer.render("```c++\nint x;\n```");
        assert!(!html.contains("class="));
        assert!(html.contains("int x;"));
    }

    #[test]
    fn test_raw_class_attributes_are_stripped() {
        let renderer = MarkdownRenderer::new();
        let html = renderer.render(r#"<code class="evil language-x">x</code>"#);
        assert!(!html.contains("evil"));
    }

    #[test]
    fn test_scripts_are_stripped() {
        let renderer = MarkdownRenderer::new();
        let html =
            renderer.render("hello <script>alert('x')</script> <img src=x onerror=alert(1)>");
        assert!(!html.contains("<script"));
        assert!(!html.contains("onerror"));
        assert!(html.contains("hello"));
    }

    #[test]
    fn test_external_links_open_in_new_tab() {
        let renderer = MarkdownRenderer::new();
        let html = renderer.render("[Rust](https://www.rust-lang.org \"Home\")");
        assert!(html.contains(r#"href="https://www.rust-lang.org""#));
        assert!(html.contains(r#"target="_blank""#));
        assert!(html.contains("noopener"));
        assert!(html.contains(">Rust</a>"));
    }

    #[test]
    fn test_raw_html_external_links_open_in_new_tab() {
        let renderer = MarkdownRenderer::new();
        let html = renderer.render(r#"See <a href="https://example.com">ext</a> now"#);
        assert!(html.contains(r#"href="https://example.com""#));
        assert!(html.contains(r#"target="_blank""#));
        assert!(html.contains(">ext</a> now"));

        let html = renderer.render(r#"<p><a href="//cdn.example.com/x" title="a > b">cdn</a></p>"#);
        assert!(html.contains(r#"target="_blank""#));

        let html = renderer.render(r#"Go <a href="/local">home</a>"#);
        assert!(html.contains(r#"href="/local""#));
        assert!(!html.contains("_blank"));
    }

    #[test]
    fn test_raw_html_anchor_text_is_not_autolinked() {
        let renderer = MarkdownRenderer::new();
        let html = renderer.render(r#"<a href="https://example.com">https://example.com</a>"#);
        assert_eq!(html.matches("<a ").count(), 1);
        assert_eq!(html.matches("</a>").count(), 1);
    }

    #[test]
    fn test_image_alt_text_is_not_autolinked() {
        let renderer = MarkdownRenderer::new();
        let html = renderer.render("![alt https://x.io](/img.png)");
        assert!(html.contains(r#"alt="alt https://x.io""#));
        assert!(html.contains(r#"src="/img.png""#));
        assert!(!html.contains("&lt;a"));
        assert!(!html.contains("<a "));
    }

    #[test]
    fn test_task_list_checkboxes_survive() {
        let renderer = MarkdownRenderer::new();
        let html = renderer.render("- [x] done\n- [ ] todo");
        assert_eq!(html.matches("<input").count(), 2);
        assert_eq!(html.matches(r#"type="checkbox""#).count(), 2);
        assert_eq!(html.matches(r#"disabled="""#).count(), 2);
        assert_eq!(html.matches(r#"checked="""#).count(), 1);
        assert!(html.contains("done"));
    }

    #[test]
    fn test_raw_inputs_become_disabled_checkboxes() {
        let renderer = MarkdownRenderer::new();
        let html = renderer.render(r#"<input type="text" value="secret" onfocus="x()">"#);
        assert!(!html.contains("text"));
        assert!(!html.contains("secret"));
        assert!(!html.contains("onfocus"));
    }

    #[test]
    fn test_relative_links_stay_in_tab() {
        let renderer = MarkdownRenderer::new();
        let html = renderer.render("[About](/about) and [top](#top)");
        assert!(html.contains(r#"href="/about""#));
        assert!(!html.contains("_blank"));
    }

    #[test]
    fn test_raw_target_values_are_filtered() {
        let renderer = MarkdownRenderer::new();
        let html = renderer.render(r#"<a href="/x" target="_top">x</a>"#);
        assert!(!html.contains("_top"));
    }

    #[test]
    fn test_bare_urls_are_autolinked() {
        let renderer = MarkdownRenderer::new();
        let html = renderer.render("See https://example.com/a_b. Thanks");
        assert!(html.contains(r#"href="https://example.com/a_b""#));
        assert!(html.contains(r#"target="_blank""#));
        assert!(html.contains("</a>. Thanks"));
    }

    #[test]
    fn test_urls_in_code_are_not_linked() {
        let renderer = MarkdownRenderer::new();
        let html = renderer.render("```\ncurl https://example.com\n```");
        assert!(!html.contains("<a "));
    }

    #[test]
    fn test_fence_language() {
        assert_eq!(fence_language("rust"), "rust");
        assert_eq!(fence_language("python {.numberLines}"), "python");
        assert_eq!(fence_language("objective-c"), "");
        assert_eq!(fence_language(""), "");
    }
}
