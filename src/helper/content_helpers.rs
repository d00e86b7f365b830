use crate::models::remote_operations::cms_operations::{CmsError, ContentSource};
use crate::models::CollectionEnvelope;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};

/// A collection name plus the parameters sent with it.
#[derive(Debug, Clone, PartialEq)]
pub struct CollectionQuery {
    pub collection: &'static str,
    pub params: Value,
}

impl CollectionQuery {
    pub fn new(collection: &'static str) -> Self {
        CollectionQuery {
            collection,
            params: json!({}),
        }
    }

    pub fn with_params(mut self, params: Value) -> Self {
        self.params = params;
        self
    }

    pub fn products() -> Self {
        CollectionQuery::new("products")
    }

    /// Newest first.
    pub fn news() -> Self {
        CollectionQuery::new("posts").with_params(json!({"sort": "-createdAt"}))
    }

    pub fn open_careers() -> Self {
        CollectionQuery::new("careers").with_params(json!({"where": {"isOpen": {"equals": true}}}))
    }

    pub fn page_views() -> Self {
        CollectionQuery::new("page-views").with_params(json!({"limit": 10000}))
    }
}

/// `{data, loading, error}` for one collection load.
#[derive(Debug, Serialize)]
pub struct ContentState<T> {
    pub data: Vec<T>,
    pub total_docs: Option<u64>,
    pub loading: bool,
    pub error: Option<String>,
}

impl<T> ContentState<T> {
    pub fn pending() -> Self {
        ContentState::pending_with(Vec::new())
    }

    /// Starts a load while keeping whatever was shown before.
    pub fn pending_with(previous: Vec<T>) -> Self {
        ContentState {
            data: previous,
            total_docs: None,
            loading: true,
            error: None,
        }
    }

    /// On failure the previous data stays in place and the error is recorded.
    pub fn settle(mut self, collection: &str, result: Result<CollectionEnvelope<T>, CmsError>) -> Self {
        match result {
            Ok(envelope) => {
                self.total_docs = envelope.total_docs;
                self.data = envelope.docs;
                self.error = None;
            }
            Err(e) => {
                log::error!("Failed to fetch CMS collection '{}': {}", collection, e);
                self.error = Some(e.to_string());
            }
        }
        self.loading = false;
        self
    }
}

/// Loads a collection once. No cache, no retry.
pub async fn load_collection<T: DeserializeOwned>(source: &dyn ContentSource, query: &CollectionQuery) -> ContentState<T> {
    let state = ContentState::pending();
    let result = source
        .fetch_collection(query.collection, &query.params)
        .await
        .map(|envelope| envelope.decode_docs::<T>(query.collection));
    state.settle(query.collection, result)
}

/// Loads a single document. Anything other than a decodable document counts
/// as not found.
pub async fn load_document<T: DeserializeOwned>(source: &dyn ContentSource, collection: &str, id: &str) -> Option<T> {
    match source.fetch_document(collection, id).await {
        Ok(Some(value)) => match serde_json::from_value::<T>(value) {
            Ok(document) => Some(document),
            Err(e) => {
                log::warn!("Document '{}' in '{}' has an unexpected shape: {}", id, collection, e);
                None
            }
        },
        Ok(None) => {
            log::debug!("Document '{}' not found in '{}'", id, collection);
            None
        }
        Err(e) => {
            log::error!("Failed to fetch '{}' from '{}': {}", id, collection, e);
            None
        }
    }
}
