use serde::Deserialize;
use std::env;
use std::path::Path;
use url::Url;
use config; // Explicitly import the config crate

pub const DEFAULT_PAYLOAD_URL: &str = "http://localhost:3000";
pub const DEFAULT_CONTACT_ACK_SECONDS: u64 = 5;
pub const DEFAULT_MAX_RESUME_BYTES: u64 = 5 * 1024 * 1024;

#[derive(Debug, Deserialize, Clone)]
pub struct WebConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub web: WebConfig,
    // Everything below is populated from the .env file
    pub payload_url: String,
    pub automation_endpoint: String,
    pub static_path: String,
    pub allowed_origins: String,
    pub log_level: String,
    pub session_secret_key: String,
    pub use_secure_cookies: bool,
    pub contact_ack_seconds: u64,
    pub max_resume_bytes: u64,
    pub rich_text_sanitize: bool,
}

/// The subset of configuration that page handlers read at request time.
#[derive(Debug, Clone)]
pub struct SiteSettings {
    /// Origin of the CMS; relative media paths are resolved against it.
    pub payload_url: String,
    pub contact_ack_seconds: u64,
    pub max_resume_bytes: usize,
    pub sanitize_rich_text: bool,
}

impl Default for SiteSettings {
    fn default() -> Self {
        SiteSettings {
            payload_url: DEFAULT_PAYLOAD_URL.to_string(),
            contact_ack_seconds: DEFAULT_CONTACT_ACK_SECONDS,
            max_resume_bytes: DEFAULT_MAX_RESUME_BYTES as usize,
            sanitize_rich_text: false,
        }
    }
}

fn fatal(message: String) -> config::ConfigError {
    config::ConfigError::Message(format!("FATAL: {}", message))
}

/// Parses an optional variable, falling back to `default` when unset or unparseable.
fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    match env::var(key) {
        Ok(raw) => raw.trim().parse::<T>().unwrap_or_else(|_| {
            log::warn!("Ignoring unparseable value for '{}': '{}'", key, raw);
            default
        }),
        Err(_) => default,
    }
}

/// Accepts only absolute http(s) URLs.
fn validate_http_url(key: &str, value: &str) -> Result<(), config::ConfigError> {
    match Url::parse(value) {
        Ok(url) if url.scheme() == "http" || url.scheme() == "https" => Ok(()),
        Ok(url) => Err(fatal(format!(
            "'{}' must use http or https, found scheme '{}'.",
            key,
            url.scheme()
        ))),
        Err(e) => Err(fatal(format!("'{}' is not a valid URL ('{}'): {}", key, value, e))),
    }
}

impl Config {
    pub fn from_env(env_path: &Path) -> Result<Self, config::ConfigError> {
        dotenvy::from_path(env_path).map_err(|e| {
            fatal(format!(
                "Failed to load .env file from '{}'. Error: {}",
                env_path.display(),
                e
            ))
        })?;

        // The CMS origin falls back to the local development server.
        let payload_url = env::var("PAYLOAD_URL")
            .map(|s| s.trim().trim_end_matches('/').to_string())
            .unwrap_or_else(|_| DEFAULT_PAYLOAD_URL.to_string());
        validate_http_url("PAYLOAD_URL", &payload_url)?;

        let automation_endpoint = env::var("AUTOMATION_ENDPOINT").map_err(|_| {
            fatal("Environment variable 'AUTOMATION_ENDPOINT' is not set in your .env file.".to_string())
        })?;
        validate_http_url("AUTOMATION_ENDPOINT", &automation_endpoint)?;

        let session_secret_key = env::var("SESSION_SECRET_KEY").map_err(|_| {
            fatal("Environment variable 'SESSION_SECRET_KEY' is not set in your .env file.".to_string())
        })?;

        // 128 hex characters decode to the 64 bytes a cookie key needs.
        if session_secret_key.len() != 128 || !session_secret_key.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(fatal(
                "'SESSION_SECRET_KEY' must be 128 hexadecimal characters long (64 bytes).".to_string(),
            ));
        }

        let static_path = env::var("STATIC_PATH").unwrap_or_else(|_| "./static".to_string());
        let allowed_origins = env::var("ALLOWED_ORIGINS").unwrap_or_default();
        let log_level = env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
        let use_secure_cookies = env_or("USE_SECURE_COOKIES", false);
        let contact_ack_seconds = env_or("CONTACT_ACK_SECONDS", DEFAULT_CONTACT_ACK_SECONDS);
        let max_resume_bytes = env_or("MAX_RESUME_BYTES", DEFAULT_MAX_RESUME_BYTES);
        let rich_text_sanitize = env_or("RICH_TEXT_SANITIZE", false);

        if max_resume_bytes == 0 {
            return Err(fatal("'MAX_RESUME_BYTES' must be greater than zero.".to_string()));
        }

        let builder = config::Config::builder()
            // Host and port come from the TOML file.
            .add_source(config::File::new("config/default.toml", config::FileFormat::Toml))
            .set_override("payload_url", payload_url)?
            .set_override("automation_endpoint", automation_endpoint)?
            .set_override("static_path", static_path)?
            .set_override("allowed_origins", allowed_origins)?
            .set_override("log_level", log_level)?
            .set_override("session_secret_key", session_secret_key)?
            .set_override("use_secure_cookies", use_secure_cookies)?
            .set_override("contact_ack_seconds", contact_ack_seconds as i64)?
            .set_override("max_resume_bytes", max_resume_bytes as i64)?
            .set_override("rich_text_sanitize", rich_text_sanitize)?
            .build()?;

        builder.try_deserialize()
    }

    pub fn site_settings(&self) -> SiteSettings {
        SiteSettings {
            payload_url: self.payload_url.clone(),
            contact_ack_seconds: self.contact_ack_seconds,
            max_resume_bytes: self.max_resume_bytes as usize,
            sanitize_rich_text: self.rich_text_sanitize,
        }
    }
}
