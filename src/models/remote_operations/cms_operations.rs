use crate::models::{CollectionEnvelope, PageViewRecord};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::Value;
use thiserror::Error;
use url::{form_urlencoded, Url};

#[derive(Error, Debug)]
pub enum CmsError {
    #[error("CMS request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("CMS answered {status} for '{collection}'")]
    Status { collection: String, status: u16 },
    #[error("CMS response could not be decoded: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("Invalid CMS URL: {0}")]
    Url(#[from] url::ParseError),
}

/// Read access to the headless CMS plus the page-view write.
#[async_trait]
pub trait ContentSource: Send + Sync {
    /// `GET {base}/api/{collection}?{params}`.
    async fn fetch_collection(&self, collection: &str, params: &Value) -> Result<CollectionEnvelope<Value>, CmsError>;

    /// `GET {base}/api/{collection}/{id}`; `Ok(None)` when the CMS answers 404.
    async fn fetch_document(&self, collection: &str, id: &str) -> Result<Option<Value>, CmsError>;

    /// `POST {base}/api/page-views`.
    async fn record_page_view(&self, record: &PageViewRecord) -> Result<(), CmsError>;
}

/// Serializes nested parameters the way the CMS query parser expects them:
/// `{"where":{"isOpen":{"equals":true}}}` becomes `where[isOpen][equals]=true`.
pub fn serialize_query(params: &Value) -> String {
    let mut serializer = form_urlencoded::Serializer::new(String::new());
    if let Value::Object(map) = params {
        for (key, value) in map {
            append_query_pairs(&mut serializer, key, value);
        }
    }
    serializer.finish()
}

fn append_query_pairs(serializer: &mut form_urlencoded::Serializer<'_, String>, key: &str, value: &Value) {
    match value {
        Value::Null => {}
        Value::Bool(b) => {
            serializer.append_pair(key, if *b { "true" } else { "false" });
        }
        Value::Number(n) => {
            serializer.append_pair(key, &n.to_string());
        }
        Value::String(s) => {
            serializer.append_pair(key, s);
        }
        Value::Array(items) => {
            for (index, item) in items.iter().enumerate() {
                append_query_pairs(serializer, &format!("{}[{}]", key, index), item);
            }
        }
        Value::Object(map) => {
            for (child_key, child) in map {
                append_query_pairs(serializer, &format!("{}[{}]", key, child_key), child);
            }
        }
    }
}

/// HTTP client for the Payload CMS REST API.
pub struct PayloadClient {
    http: reqwest::Client,
    base_url: Url,
}

impl PayloadClient {
    pub fn new(base_url: &str) -> Result<Self, CmsError> {
        Ok(PayloadClient {
            http: reqwest::Client::new(),
            base_url: Url::parse(base_url)?,
        })
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, CmsError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| CmsError::Url(url::ParseError::RelativeUrlWithCannotBeABaseBase))?
            .pop_if_empty()
            .push("api")
            .extend(segments);
        Ok(url)
    }

    async fn read_json(response: reqwest::Response, collection: &str) -> Result<Value, CmsError> {
        let status = response.status();
        if !status.is_success() {
            return Err(CmsError::Status {
                collection: collection.to_string(),
                status: status.as_u16(),
            });
        }
        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }
}

#[async_trait]
impl ContentSource for PayloadClient {
    async fn fetch_collection(&self, collection: &str, params: &Value) -> Result<CollectionEnvelope<Value>, CmsError> {
        let mut url = self.endpoint(&[collection])?;
        let query = serialize_query(params);
        if !query.is_empty() {
            url.set_query(Some(&query));
        }
        log::debug!("Fetching CMS collection '{}' from {}", collection, url);

        let response = self.http.get(url).send().await?;
        let json = Self::read_json(response, collection).await?;
        Ok(serde_json::from_value(json)?)
    }

    async fn fetch_document(&self, collection: &str, id: &str) -> Result<Option<Value>, CmsError> {
        let url = self.endpoint(&[collection, id])?;
        log::debug!("Fetching CMS document {}", url);

        let response = self.http.get(url).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        Ok(Some(Self::read_json(response, collection).await?))
    }

    async fn record_page_view(&self, record: &PageViewRecord) -> Result<(), CmsError> {
        let url = self.endpoint(&["page-views"])?;
        let response = self.http.post(url).json(record).send().await?;
        if !response.status().is_success() {
            return Err(CmsError::Status {
                collection: "page-views".to_string(),
                status: response.status().as_u16(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn nested_where_clauses_use_bracket_keys() {
        let query = serialize_query(&json!({
            "where": {"isOpen": {"equals": true}},
            "sort": "-createdAt",
            "limit": 10
        }));
        assert_eq!(
            query,
            "limit=10&sort=-createdAt&where%5BisOpen%5D%5Bequals%5D=true"
        );
    }

    #[test]
    fn arrays_are_indexed_and_nulls_skipped() {
        let query = serialize_query(&json!({"ids": ["a", "b"], "draft": null}));
        assert_eq!(query, "ids%5B0%5D=a&ids%5B1%5D=b");
    }

    #[test]
    fn non_object_params_serialize_to_nothing() {
        assert_eq!(serialize_query(&json!(null)), "");
        assert_eq!(serialize_query(&json!([1, 2])), "");
    }

    #[test]
    fn endpoints_are_built_under_api() {
        let client = PayloadClient::new("http://cms.example.com/").unwrap();
        let url = client.endpoint(&["careers", "7"]).unwrap();
        assert_eq!(url.as_str(), "http://cms.example.com/api/careers/7");
    }

    #[test]
    fn document_ids_are_percent_encoded() {
        let client = PayloadClient::new("http://cms.example.com").unwrap();
        let url = client.endpoint(&["posts", "a/b"]).unwrap();
        assert_eq!(url.as_str(), "http://cms.example.com/api/posts/a%2Fb");
    }
}
