use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// CMS ids arrive as strings or numbers depending on the database adapter.
fn deserialize_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum StringOrNumber {
        String(String),
        Number(serde_json::Number),
    }

    match Option::<StringOrNumber>::deserialize(deserializer)? {
        Some(StringOrNumber::String(s)) => Ok(s),
        Some(StringOrNumber::Number(n)) => Ok(n.to_string()),
        None => Ok(String::new()),
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Notification {
    pub message: String,
    pub r#type: String, // 'success' or 'error'
    #[serde(default)]
    pub dismiss_after_secs: Option<u64>,
}

/// The `{docs, totalDocs, ...}` wrapper around collection queries.
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct CollectionEnvelope<T> {
    #[serde(default = "Vec::new")]
    pub docs: Vec<T>,
    #[serde(default)]
    pub total_docs: Option<u64>,
    #[serde(default)]
    pub limit: Option<u64>,
    #[serde(default)]
    pub page: Option<u64>,
    #[serde(default)]
    pub total_pages: Option<u64>,
    #[serde(default)]
    pub has_next_page: Option<bool>,
    #[serde(default)]
    pub has_prev_page: Option<bool>,
}

impl<T> CollectionEnvelope<T> {
    pub fn empty() -> Self {
        CollectionEnvelope {
            docs: Vec::new(),
            total_docs: None,
            limit: None,
            page: None,
            total_pages: None,
            has_next_page: None,
            has_prev_page: None,
        }
    }
}

impl CollectionEnvelope<Value> {
    /// Decodes raw documents into `T`, dropping (and logging) the ones that don't fit.
    pub fn decode_docs<T: serde::de::DeserializeOwned>(self, collection: &str) -> CollectionEnvelope<T> {
        let docs = self
            .docs
            .into_iter()
            .filter_map(|doc| match serde_json::from_value::<T>(doc) {
                Ok(decoded) => Some(decoded),
                Err(e) => {
                    log::warn!("Skipping malformed document in '{}': {}", collection, e);
                    None
                }
            })
            .collect();

        CollectionEnvelope {
            docs,
            total_docs: self.total_docs,
            limit: self.limit,
            page: self.page,
            total_pages: self.total_pages,
            has_next_page: self.has_next_page,
            has_prev_page: self.has_prev_page,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    #[serde(default, deserialize_with = "deserialize_id")]
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub image: Value,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct Author {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub image: Value,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    #[serde(default, deserialize_with = "deserialize_id")]
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub excerpt: Option<String>,
    /// Rich-text document.
    #[serde(default)]
    pub content: Value,
    #[serde(default)]
    pub image: Value,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub author: Option<Author>,
    /// Populated relation `{title}` or a bare id.
    #[serde(default)]
    pub category: Value,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct Career {
    #[serde(default, deserialize_with = "deserialize_id")]
    pub id: String,
    #[serde(default)]
    pub position: Option<String>,
    #[serde(default)]
    pub department: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default, rename = "type")]
    pub employment_type: Option<String>,
    /// Rich-text document.
    #[serde(default)]
    pub description: Value,
    #[serde(default)]
    pub is_open: Option<bool>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct PageView {
    #[serde(default, deserialize_with = "deserialize_id")]
    pub id: String,
    #[serde(default)]
    pub page: Option<String>,
    #[serde(default)]
    pub timestamp: Option<String>,
}

/// Body of `POST /api/page-views`.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct PageViewRecord {
    pub page: String,
    pub timestamp: String,
}

#[derive(Debug, Serialize, Clone, Copy, PartialEq)]
pub struct OfficeLocation {
    pub name: &'static str,
    pub lat: f64,
    pub lng: f64,
}

pub const OFFICE_LOCATIONS: [OfficeLocation; 5] = [
    OfficeLocation { name: "Pune", lat: 18.5204, lng: 73.8567 },
    OfficeLocation { name: "Nagpur", lat: 21.1458, lng: 79.0882 },
    OfficeLocation { name: "Bhandara", lat: 21.1777, lng: 79.657 },
    OfficeLocation { name: "Gondia", lat: 21.4624, lng: 80.221 },
    OfficeLocation { name: "Chandrapur", lat: 19.9615, lng: 79.2961 },
];

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ContactSubmission {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub company: String,
    pub subject: String,
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CareerApplication {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub position: String,
    /// Resume bytes, base64 without a data-URL prefix.
    pub base64: String,
    pub filename: String,
    #[serde(rename = "type")]
    pub mime_type: String,
}

/// What gets posted to the automation endpoint. Serializes as one flat
/// object carrying a `source` discriminator.
#[derive(Debug, Serialize, Clone, PartialEq)]
#[serde(tag = "source")]
pub enum FormPayload {
    #[serde(rename = "Contact Us")]
    Contact(ContactSubmission),
    #[serde(rename = "Career Application")]
    CareerApplication(CareerApplication),
}

pub mod remote_operations;
pub mod rich_text;
