use std::sync::Arc;

use crate::config::SiteSettings;
use crate::models::remote_operations::automation_operations::SubmissionSink;
use crate::models::remote_operations::cms_operations::ContentSource;

/// Shared, read-only state handed to every handler.
pub struct AppState {
    pub content: Arc<dyn ContentSource>,
    pub sink: Arc<dyn SubmissionSink>,
    pub settings: SiteSettings,
}

pub mod config;
pub mod helper;
pub mod middleware;
pub mod models;
pub mod routes;
