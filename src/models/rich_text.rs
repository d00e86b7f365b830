//! Typed view of the CMS rich-text tree (`{ root: { children: [...] } }`).
//!
//! Conversion from JSON is total: every shape of input maps to some [`Node`],
//! with [`Node::Unknown`] catching anything outside the known vocabulary.

use serde_json::Value;

pub const FORMAT_BOLD: u64 = 1;
pub const FORMAT_ITALIC: u64 = 1 << 1;
pub const FORMAT_UNDERLINE: u64 = 1 << 3;
pub const FORMAT_CODE: u64 = 1 << 4;

/// Nodes nested deeper than this are dropped during conversion.
pub const MAX_RENDER_DEPTH: usize = 64;

#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Text { text: String, format: u64 },
    LineBreak,
    Heading { level: u8, children: Vec<Node> },
    Paragraph { children: Vec<Node> },
    List { ordered: bool, children: Vec<Node> },
    ListItem { children: Vec<Node> },
    Link { url: String, new_tab: bool, children: Vec<Node> },
    Upload { value: Value, caption: Option<String> },
    Quote { children: Vec<Node> },
    Unknown { children: Vec<Node> },
}

/// JavaScript-style truthiness, which is what the CMS editor's flags rely on.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map_or(false, |f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn str_field<'a>(value: &'a Value, key: &str) -> Option<&'a str> {
    value.get(key).and_then(Value::as_str)
}

fn heading_level(tag: Option<&str>) -> u8 {
    match tag {
        Some("h1") => 1,
        Some("h2") => 2,
        Some("h3") => 3,
        Some("h4") => 4,
        Some("h5") => 5,
        _ => 2,
    }
}

impl Node {
    pub fn from_value(value: &Value) -> Node {
        Node::from_value_at(value, 0)
    }

    fn from_value_at(value: &Value, depth: usize) -> Node {
        if !is_truthy(value) {
            return Node::LineBreak;
        }

        let node_type = str_field(value, "type").unwrap_or_default();
        match node_type {
            "text" => Node::Text {
                text: str_field(value, "text").unwrap_or_default().to_string(),
                format: value.get("format").and_then(Value::as_u64).unwrap_or(0),
            },
            "linebreak" => Node::LineBreak,
            "heading" => Node::Heading {
                level: heading_level(str_field(value, "tag")),
                children: children_of(value, depth),
            },
            // Older editor versions emitted the tag as the node type.
            "h1" | "h2" | "h3" => Node::Heading {
                level: heading_level(Some(node_type)),
                children: children_of(value, depth),
            },
            "paragraph" => Node::Paragraph { children: children_of(value, depth) },
            "ul" | "ol" => Node::List {
                ordered: node_type == "ol",
                children: children_of(value, depth),
            },
            "list" => Node::List {
                ordered: str_field(value, "tag") == Some("ol")
                    || str_field(value, "listType") == Some("number"),
                children: children_of(value, depth),
            },
            "li" | "listitem" => Node::ListItem { children: children_of(value, depth) },
            "link" => {
                let fields = value.get("fields").unwrap_or(&Value::Null);
                Node::Link {
                    url: str_field(fields, "url").unwrap_or_default().to_string(),
                    new_tab: fields.get("newTab").map_or(false, is_truthy),
                    children: children_of(value, depth),
                }
            }
            "upload" => {
                let caption = value
                    .get("fields")
                    .and_then(|fields| str_field(fields, "caption"))
                    .filter(|c| !c.is_empty())
                    .map(str::to_string);
                Node::Upload {
                    value: value.get("value").cloned().unwrap_or(Value::Null),
                    caption,
                }
            }
            "quote" => Node::Quote { children: children_of(value, depth) },
            _ => Node::Unknown { children: children_of(value, depth) },
        }
    }

    pub fn is_line_break(&self) -> bool {
        matches!(self, Node::LineBreak)
    }
}

fn children_of(value: &Value, depth: usize) -> Vec<Node> {
    if depth + 1 >= MAX_RENDER_DEPTH {
        return Vec::new();
    }
    match value.get("children") {
        Some(Value::Array(items)) => items.iter().map(|child| Node::from_value_at(child, depth + 1)).collect(),
        _ => Vec::new(),
    }
}

/// Returns the top-level nodes, or `None` when the document has no
/// `root.children` array.
pub fn parse_document(content: Option<&Value>) -> Option<Vec<Node>> {
    let children = content?.get("root")?.get("children")?.as_array()?;
    Some(children.iter().map(|child| Node::from_value_at(child, 0)).collect())
}
