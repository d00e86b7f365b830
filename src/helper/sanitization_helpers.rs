use std::borrow::Cow;
use std::collections::HashSet;

/// Escapes text placed between tags.
pub fn escape_text(input: &str) -> Cow<'_, str> {
    html_escape::encode_text(input)
}

/// Escapes a value placed inside a double-quoted attribute.
pub fn escape_attribute(input: &str) -> Cow<'_, str> {
    html_escape::encode_double_quoted_attribute(input)
}

/// Cleans inline markup coming from the CMS: formatting tags survive,
/// scripts and event handlers do not.
pub fn sanitize_inline_html(input: &str) -> String {
    ammonia::clean(input)
}

/// Strips all HTML tags from input (for excerpts and summaries). The result
/// is plain text, not markup: entities are decoded so the template escapes once.
pub fn strip_all_html(input: &str) -> String {
    let cleaned = ammonia::Builder::new().tags(HashSet::new()).clean(input).to_string();
    html_escape::decode_html_entities(&cleaned).into_owned()
}
