#![allow(dead_code)]

use actix_session::{storage::CookieSessionStore, SessionMiddleware};
use actix_web::body::MessageBody;
use actix_web::cookie::{Cookie, Key};
use actix_web::dev::{ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::{test, web, App};
use async_trait::async_trait;
use iriyo_site::config::SiteSettings;
use iriyo_site::middleware::SplashGate;
use iriyo_site::models::remote_operations::automation_operations::{
    DispatchOutcome, SubmissionError, SubmissionSink,
};
use iriyo_site::models::remote_operations::cms_operations::{CmsError, ContentSource};
use iriyo_site::models::{CollectionEnvelope, FormPayload, PageViewRecord};
use iriyo_site::{routes, AppState};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tera::Tera;

pub const SESSION_COOKIE: &str = "id";

/// In-memory CMS. Collections and documents are canned JSON.
#[derive(Default)]
pub struct FakeContent {
    pub collections: HashMap<String, Value>,
    pub documents: HashMap<(String, String), Value>,
    pub fail: bool,
    pub requests: Mutex<Vec<(String, Value)>>,
    pub page_views: Mutex<Vec<PageViewRecord>>,
}

impl FakeContent {
    pub fn with_collection(mut self, collection: &str, envelope: Value) -> Self {
        self.collections.insert(collection.to_string(), envelope);
        self
    }

    pub fn with_document(mut self, collection: &str, id: &str, document: Value) -> Self {
        self.documents.insert((collection.to_string(), id.to_string()), document);
        self
    }

    pub fn failing() -> Self {
        FakeContent {
            fail: true,
            ..Default::default()
        }
    }

    pub fn recorded_views(&self) -> Vec<PageViewRecord> {
        self.page_views.lock().unwrap().clone()
    }

    pub fn params_for(&self, collection: &str) -> Option<Value> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .find(|(name, _)| name == collection)
            .map(|(_, params)| params.clone())
    }

    fn unavailable(collection: &str) -> CmsError {
        CmsError::Status {
            collection: collection.to_string(),
            status: 503,
        }
    }
}

#[async_trait]
impl ContentSource for FakeContent {
    async fn fetch_collection(&self, collection: &str, params: &Value) -> Result<CollectionEnvelope<Value>, CmsError> {
        self.requests
            .lock()
            .unwrap()
            .push((collection.to_string(), params.clone()));
        if self.fail {
            return Err(FakeContent::unavailable(collection));
        }
        match self.collections.get(collection) {
            Some(envelope) => Ok(serde_json::from_value(envelope.clone())?),
            None => Ok(CollectionEnvelope::empty()),
        }
    }

    async fn fetch_document(&self, collection: &str, id: &str) -> Result<Option<Value>, CmsError> {
        if self.fail {
            return Err(FakeContent::unavailable(collection));
        }
        Ok(self.documents.get(&(collection.to_string(), id.to_string())).cloned())
    }

    async fn record_page_view(&self, record: &PageViewRecord) -> Result<(), CmsError> {
        if self.fail {
            return Err(FakeContent::unavailable("page-views"));
        }
        self.page_views.lock().unwrap().push(record.clone());
        Ok(())
    }
}

/// Remembers every payload handed to it.
#[derive(Default)]
pub struct RecordingSink {
    pub fail: bool,
    pub calls: Mutex<Vec<FormPayload>>,
}

impl RecordingSink {
    pub fn failing() -> Self {
        RecordingSink {
            fail: true,
            ..Default::default()
        }
    }

    pub fn payloads(&self) -> Vec<Value> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(|payload| serde_json::to_value(payload).unwrap())
            .collect()
    }
}

#[async_trait]
impl SubmissionSink for RecordingSink {
    async fn submit(&self, payload: &FormPayload) -> DispatchOutcome {
        self.calls.lock().unwrap().push(payload.clone());
        if self.fail {
            DispatchOutcome::Failed(SubmissionError::Url(url::ParseError::EmptyHost))
        } else {
            DispatchOutcome::Sent
        }
    }
}

pub fn app_state(content: Arc<FakeContent>, sink: Arc<RecordingSink>) -> web::Data<AppState> {
    web::Data::new(AppState {
        content,
        sink,
        settings: SiteSettings {
            payload_url: "http://cms.test".to_string(),
            contact_ack_seconds: 5,
            max_resume_bytes: 1024,
            sanitize_rich_text: false,
        },
    })
}

pub fn templates() -> Tera {
    Tera::new(concat!(env!("CARGO_MANIFEST_DIR"), "/templates/**/*.html")).expect("templates should parse")
}

/// The site as `main` assembles it, minus CORS, static files and access logs.
pub fn test_app(
    state: web::Data<AppState>,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse<impl MessageBody>,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    let session = SessionMiddleware::builder(CookieSessionStore::default(), Key::from(&[7u8; 64][..]))
        .cookie_secure(false)
        .build();

    App::new()
        .wrap(SplashGate)
        .wrap(session)
        .app_data(web::Data::new(templates()))
        .app_data(state)
        .configure(routes::configure_site)
        .default_service(web::to(routes::public::not_found))
}

pub fn splash_complete(next: &str) -> test::TestRequest {
    test::TestRequest::post()
        .uri("/splash/complete")
        .insert_header(("content-type", "application/x-www-form-urlencoded"))
        .set_payload(format!("next={}", next))
}

/// Session cookie set by the response, or `previous` when the session did not change.
pub fn session_cookie<B>(resp: &ServiceResponse<B>, previous: Option<Cookie<'static>>) -> Cookie<'static> {
    resp.response()
        .cookies()
        .find(|cookie| cookie.name() == SESSION_COOKIE)
        .map(|cookie| cookie.into_owned())
        .or(previous)
        .expect("response should carry a session cookie")
}

pub fn location<B>(resp: &ServiceResponse<B>) -> String {
    resp.headers()
        .get("location")
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

pub const BOUNDARY: &str = "----iriyo-test-boundary";

/// Hand-built `multipart/form-data` body. `file` is `(filename, content type, bytes)`.
pub fn multipart_body(fields: &[(&str, &str)], file: Option<(&str, &str, &[u8])>) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{}\"\r\n\r\n{}\r\n",
                BOUNDARY, name, value
            )
            .as_bytes(),
        );
    }
    if let Some((filename, content_type, bytes)) = file {
        body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"resume\"; filename=\"{}\"\r\nContent-Type: {}\r\n\r\n",
                BOUNDARY, filename, content_type
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
    body
}

pub fn multipart_content_type() -> String {
    format!("multipart/form-data; boundary={}", BOUNDARY)
}
