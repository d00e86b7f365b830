pub mod analytics_helpers;
pub mod content_helpers;
pub mod form_helpers;
pub mod media_helpers;
pub mod page_helpers;
pub mod report_helpers;
pub mod rich_text_helpers;
pub mod sanitization_helpers;
pub mod session_helpers;
pub mod splash_helpers;
