use crate::models::FormPayload;
use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use thiserror::Error;
use url::Url;

#[derive(Error, Debug)]
pub enum SubmissionError {
    #[error("Automation endpoint unreachable: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("Form payload could not be encoded: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("Invalid automation endpoint: {0}")]
    Url(#[from] url::ParseError),
}

/// Result of handing a form to the automation endpoint.
///
/// The endpoint's answer is opaque, so `Sent` only means the request went out
/// and something came back. It says nothing about the spreadsheet row.
#[derive(Debug)]
pub enum DispatchOutcome {
    Sent,
    Failed(SubmissionError),
}

impl DispatchOutcome {
    pub fn is_sent(&self) -> bool {
        matches!(self, DispatchOutcome::Sent)
    }
}

#[async_trait]
pub trait SubmissionSink: Send + Sync {
    async fn submit(&self, payload: &FormPayload) -> DispatchOutcome;
}

pub struct AutomationClient {
    http: reqwest::Client,
    endpoint: Url,
}

impl AutomationClient {
    pub fn new(endpoint: &str) -> Result<Self, SubmissionError> {
        Ok(AutomationClient {
            http: reqwest::Client::new(),
            endpoint: Url::parse(endpoint)?,
        })
    }
}

#[async_trait]
impl SubmissionSink for AutomationClient {
    async fn submit(&self, payload: &FormPayload) -> DispatchOutcome {
        let body = match serde_json::to_vec(payload) {
            Ok(body) => body,
            Err(e) => return DispatchOutcome::Failed(e.into()),
        };

        match self
            .http
            .post(self.endpoint.clone())
            .header(CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await
        {
            Ok(response) => {
                // Not inspected: the script answers with a redirect page either way.
                log::debug!("Automation endpoint answered {}", response.status());
                DispatchOutcome::Sent
            }
            Err(e) => {
                log::error!("Failed to dispatch form submission: {}", e);
                DispatchOutcome::Failed(e.into())
            }
        }
    }
}
