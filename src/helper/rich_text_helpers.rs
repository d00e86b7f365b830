use crate::config::SiteSettings;
use crate::helper::media_helpers::{media_alt, resolve_media_url};
use crate::helper::sanitization_helpers::{escape_attribute, escape_text, sanitize_inline_html, strip_all_html};
use crate::models::rich_text::{
    parse_document, Node, FORMAT_BOLD, FORMAT_CODE, FORMAT_ITALIC, FORMAT_UNDERLINE,
};
use serde_json::Value;

/// Renders CMS rich text to HTML.
///
/// Text nodes are emitted as raw markup unless `sanitize_text` is on, so the
/// output must only ever be fed content from the site's own CMS.
pub struct RichTextRenderer<R> {
    resolve_media: R,
    sanitize_text: bool,
}

impl<R> RichTextRenderer<R>
where
    R: Fn(&Value) -> String,
{
    pub fn new(resolve_media: R) -> Self {
        RichTextRenderer {
            resolve_media,
            sanitize_text: false,
        }
    }

    pub fn sanitize_text(mut self, sanitize: bool) -> Self {
        self.sanitize_text = sanitize;
        self
    }

    /// Never fails: absent documents render as an empty string and
    /// unrecognised nodes fall back to a plain block.
    pub fn render(&self, content: Option<&Value>) -> String {
        let nodes = match parse_document(content) {
            Some(nodes) => nodes,
            None => return String::new(),
        };

        let mut out = String::from(r#"<div class="rich-text-content">"#);
        for node in &nodes {
            self.render_node(node, &mut out);
        }
        out.push_str("</div>");
        out
    }

    fn render_children(&self, children: &[Node], out: &mut String) {
        for child in children {
            self.render_node(child, out);
        }
    }

    fn wrap(&self, open: &str, close: &str, children: &[Node], out: &mut String) {
        out.push_str(open);
        self.render_children(children, out);
        out.push_str(close);
    }

    fn render_node(&self, node: &Node, out: &mut String) {
        match node {
            Node::Text { text, format } => {
                let mut html = if self.sanitize_text {
                    sanitize_inline_html(text)
                } else {
                    text.clone()
                };
                if format & FORMAT_BOLD != 0 {
                    html = format!("<strong>{}</strong>", html);
                }
                if format & FORMAT_ITALIC != 0 {
                    html = format!("<em>{}</em>", html);
                }
                if format & FORMAT_UNDERLINE != 0 {
                    html = format!("<u>{}</u>", html);
                }
                if format & FORMAT_CODE != 0 {
                    html = format!("<code>{}</code>", html);
                }
                out.push_str(&html);
            }
            Node::LineBreak => out.push_str("<br>"),
            Node::Heading { level, children } => {
                let open = format!(r#"<h{0} class="rt-h{0}">"#, level);
                let close = format!("</h{}>", level);
                self.wrap(&open, &close, children, out);
            }
            Node::Paragraph { children } => {
                let is_empty = children.is_empty() || (children.len() == 1 && children[0].is_line_break());
                if is_empty {
                    out.push_str("<br>");
                } else {
                    self.wrap(r#"<p class="rt-paragraph">"#, "</p>", children, out);
                }
            }
            Node::List { ordered: true, children } => {
                self.wrap(r#"<ol class="rt-list rt-list-ordered">"#, "</ol>", children, out)
            }
            Node::List { ordered: false, children } => {
                self.wrap(r#"<ul class="rt-list">"#, "</ul>", children, out)
            }
            Node::ListItem { children } => self.wrap("<li>", "</li>", children, out),
            Node::Link { url, new_tab, children } => {
                let target = if *new_tab { "_blank" } else { "_self" };
                let open = format!(
                    r#"<a href="{}" target="{}" rel="noopener noreferrer" class="rt-link">"#,
                    escape_attribute(url),
                    target
                );
                self.wrap(&open, "</a>", children, out);
            }
            Node::Upload { value, caption } => {
                out.push_str(r#"<figure class="rt-upload">"#);
                let src = (self.resolve_media)(value);
                if !src.is_empty() {
                    out.push_str(&format!(
                        r#"<img src="{}" alt="{}" loading="lazy">"#,
                        escape_attribute(&src),
                        escape_attribute(&media_alt(value))
                    ));
                }
                if let Some(caption) = caption {
                    out.push_str(&format!("<figcaption>{}</figcaption>", escape_text(caption)));
                }
                out.push_str("</figure>");
            }
            Node::Quote { children } => {
                self.wrap(r#"<blockquote class="rt-quote">"#, "</blockquote>", children, out)
            }
            Node::Unknown { children } => self.wrap(r#"<div class="rt-block">"#, "</div>", children, out),
        }
    }
}

/// Renders with media resolved against the configured CMS origin.
pub fn render_rich_text(content: &Value, settings: &SiteSettings) -> String {
    let origin = settings.payload_url.as_str();
    RichTextRenderer::new(|value: &Value| resolve_media_url(value, origin))
        .sanitize_text(settings.sanitize_rich_text)
        .render(Some(content))
}

/// Plain-text preview of a rich-text document, cut at `max_chars`.
pub fn plain_text_excerpt(content: &Value, max_chars: usize) -> String {
    fn collect(node: &Node, parts: &mut Vec<String>) {
        match node {
            Node::Text { text, .. } => parts.push(strip_all_html(text)),
            Node::LineBreak | Node::Upload { .. } => {}
            Node::Heading { children, .. }
            | Node::Paragraph { children }
            | Node::List { children, .. }
            | Node::ListItem { children }
            | Node::Link { children, .. }
            | Node::Quote { children }
            | Node::Unknown { children } => {
                for child in children {
                    collect(child, parts);
                }
            }
        }
    }

    let mut parts = Vec::new();
    for node in parse_document(Some(content)).unwrap_or_default() {
        collect(&node, &mut parts);
    }
    let text = parts
        .iter()
        .map(|part| part.trim())
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ");

    if text.chars().count() <= max_chars {
        text
    } else {
        let cut: String = text.chars().take(max_chars).collect();
        format!("{}...", cut.trim_end())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn render(content: Value) -> String {
        RichTextRenderer::new(|value: &Value| resolve_media_url(value, "http://api.example.com"))
            .render(Some(&content))
    }

    fn doc(children: Value) -> Value {
        json!({"root": {"children": children}})
    }

    fn text(text: &str, format: u64) -> Value {
        json!({"type": "text", "text": text, "format": format})
    }

    #[test]
    fn malformed_documents_render_without_panicking() {
        let renderer = RichTextRenderer::new(|_: &Value| String::new());
        assert_eq!(renderer.render(None), "");
        assert_eq!(renderer.render(Some(&json!({}))), "");
        assert_eq!(renderer.render(Some(&json!({"root": null}))), "");
        assert_eq!(renderer.render(Some(&json!("just a string"))), "");
        assert_eq!(renderer.render(Some(&json!({"root": {"children": 3}}))), "");

        let odd = doc(json!([
            {"type": "mystery"},
            {"type": "paragraph"},
            {"type": "heading"},
            {"type": "link"},
            {"type": "upload"},
            {"type": "text"},
            {"children": [null]},
            [1, 2, 3],
            42
        ]));
        let html = renderer.render(Some(&odd));
        assert!(html.starts_with(r#"<div class="rich-text-content">"#));
        assert!(html.ends_with("</div>"));
    }

    #[test]
    fn format_bits_wrap_text() {
        let cases = [
            (0, "dose"),
            (1, "<strong>dose</strong>"),
            (2, "<em>dose</em>"),
            (3, "<em><strong>dose</strong></em>"),
            (8, "<u>dose</u>"),
            (16, "<code>dose</code>"),
        ];
        for (format, expected) in cases {
            let html = render(doc(json!([text("dose", format)])));
            assert_eq!(html, format!(r#"<div class="rich-text-content">{}</div>"#, expected));
        }
    }

    #[test]
    fn text_is_injected_raw_unless_sanitized() {
        let content = doc(json!([text("<span class=\"x\">a</span><script>x()</script>", 0)]));
        let raw = render(content.clone());
        assert!(raw.contains("<script>x()</script>"));

        let cleaned = RichTextRenderer::new(|_: &Value| String::new())
            .sanitize_text(true)
            .render(Some(&content));
        assert!(!cleaned.contains("<script>"));
    }

    #[test]
    fn empty_paragraphs_collapse_to_a_line_break() {
        let empty = render(doc(json!([{"type": "paragraph", "children": []}])));
        let only_break = render(doc(json!([{"type": "paragraph", "children": [{"type": "linebreak"}]}])));
        assert_eq!(empty, only_break);
        assert_eq!(empty, r#"<div class="rich-text-content"><br></div>"#);
    }

    #[test]
    fn paragraphs_with_text_render_as_p() {
        let html = render(doc(json!([{"type": "paragraph", "children": [text("Hello", 0)]}])));
        assert!(html.contains(r#"<p class="rt-paragraph">Hello</p>"#));
    }

    #[test]
    fn heading_tags_map_to_levels() {
        for level in 1..=5 {
            let html = render(doc(json!([
                {"type": "heading", "tag": format!("h{}", level), "children": [text("T", 0)]}
            ])));
            assert!(html.contains(&format!("<h{0} class=\"rt-h{0}\">T</h{0}>", level)));
        }
        for tag in [json!("h6"), json!(null)] {
            let html = render(doc(json!([{"type": "heading", "tag": tag, "children": [text("T", 0)]}])));
            assert!(html.contains(r#"<h2 class="rt-h2">T</h2>"#));
        }
    }

    #[test]
    fn links_open_new_tab_only_when_asked() {
        let new_tab = render(doc(json!([
            {"type": "link", "fields": {"url": "https://iriyo.example/a?b=1&c=2", "newTab": true}, "children": [text("go", 0)]}
        ])));
        assert!(new_tab.contains(r#"href="https://iriyo.example/a?b=1&amp;c=2""#));
        assert!(new_tab.contains(r#"target="_blank""#));

        for fields in [json!({"url": "/about", "newTab": false}), json!({"url": "/about"})] {
            let html = render(doc(json!([{"type": "link", "fields": fields, "children": []}])));
            assert!(html.contains(r#"href="/about""#));
            assert!(html.contains(r#"target="_self""#));
        }
    }

    #[test]
    fn uploads_render_image_and_caption() {
        let html = render(doc(json!([{
            "type": "upload",
            "value": {"url": "/media/x.png", "alt": "Lab"},
            "fields": {"caption": "Our lab"}
        }])));
        assert!(html.contains(r#"<img src="http://api.example.com/media/x.png" alt="Lab" loading="lazy">"#));
        assert!(html.contains("<figcaption>Our lab</figcaption>"));
    }

    #[test]
    fn unresolved_uploads_skip_the_image() {
        let html = render(doc(json!([{"type": "upload", "value": "64f1c0ffee"}])));
        assert!(!html.contains("<img"));
        assert!(html.contains(r#"<figure class="rt-upload"></figure>"#));
    }

    #[test]
    fn lists_quotes_and_unknown_nodes() {
        let html = render(doc(json!([
            {"type": "ul", "children": [{"type": "li", "children": [text("one", 0)]}]},
            {"type": "ol", "children": [{"type": "li", "children": [text("two", 0)]}]},
            {"type": "quote", "children": [text("wise", 0)]},
            {"type": "callout", "children": [text("note", 0)]}
        ])));
        assert!(html.contains(r#"<ul class="rt-list"><li>one</li></ul>"#));
        assert!(html.contains(r#"<ol class="rt-list rt-list-ordered"><li>two</li></ol>"#));
        assert!(html.contains(r#"<blockquote class="rt-quote">wise</blockquote>"#));
        assert!(html.contains(r#"<div class="rt-block">note</div>"#));
    }

    #[test]
    fn excerpt_joins_text_and_truncates() {
        let content = doc(json!([
            {"type": "heading", "tag": "h2", "children": [text("Launch", 1)]},
            {"type": "paragraph", "children": [text("A new <b>formulation</b> is available", 0)]}
        ]));
        assert_eq!(plain_text_excerpt(&content, 200), "Launch A new formulation is available");
        assert_eq!(plain_text_excerpt(&content, 8), "Launch A...");
        assert_eq!(plain_text_excerpt(&json!(null), 10), "");
    }

    #[test]
    fn excerpt_is_plain_text() {
        let content = doc(json!([{"type": "paragraph", "children": [text("R&D update: <i>a</i> < b", 0)]}]));
        assert_eq!(plain_text_excerpt(&content, 200), "R&D update: a < b");
    }
}
