use actix_session::Session;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Mutex;
use thiserror::Error;

/// Every flag key is stored under this prefix.
pub const FLAG_NAMESPACE: &str = "iriyo";

#[derive(Error, Debug)]
pub enum SessionStoreError {
    #[error("Could not store flag '{key}': {message}")]
    Insert { key: String, message: String },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredFlag {
    value: String,
    expires_at: Option<DateTime<Utc>>,
}

impl StoredFlag {
    fn live_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.map_or(true, |expires_at| now < expires_at)
    }
}

fn namespaced(key: &str) -> String {
    format!("{}:{}", FLAG_NAMESPACE, key)
}

/// Small key-value store for per-visitor flags (splash seen, visit logged).
pub trait FlagStore {
    fn get_at(&self, key: &str, now: DateTime<Utc>) -> Option<String>;

    fn set(&self, key: &str, value: &str, expires_at: Option<DateTime<Utc>>) -> Result<(), SessionStoreError>;

    fn get(&self, key: &str) -> Option<String> {
        self.get_at(key, Utc::now())
    }

    fn has_at(&self, key: &str, now: DateTime<Utc>) -> bool {
        self.get_at(key, now).is_some()
    }

    fn has(&self, key: &str) -> bool {
        self.has_at(key, Utc::now())
    }
}

/// Flags kept in the visitor's signed session cookie.
pub struct SessionFlagStore<'a> {
    session: &'a Session,
}

impl<'a> SessionFlagStore<'a> {
    pub fn new(session: &'a Session) -> Self {
        SessionFlagStore { session }
    }
}

impl FlagStore for SessionFlagStore<'_> {
    fn get_at(&self, key: &str, now: DateTime<Utc>) -> Option<String> {
        let full_key = namespaced(key);
        let flag = match self.session.get::<StoredFlag>(&full_key) {
            Ok(flag) => flag?,
            Err(e) => {
                log::warn!("Discarding unreadable session flag '{}': {}", full_key, e);
                self.session.remove(&full_key);
                return None;
            }
        };
        if flag.live_at(now) {
            Some(flag.value)
        } else {
            self.session.remove(&full_key);
            None
        }
    }

    fn set(&self, key: &str, value: &str, expires_at: Option<DateTime<Utc>>) -> Result<(), SessionStoreError> {
        let full_key = namespaced(key);
        let flag = StoredFlag {
            value: value.to_string(),
            expires_at,
        };
        self.session
            .insert(full_key.clone(), flag)
            .map_err(|e| SessionStoreError::Insert {
                key: full_key,
                message: e.to_string(),
            })
    }
}

/// In-process store, used where no HTTP session exists.
#[derive(Default)]
pub struct MemoryFlagStore {
    entries: Mutex<HashMap<String, StoredFlag>>,
}

impl MemoryFlagStore {
    pub fn new() -> Self {
        MemoryFlagStore::default()
    }
}

impl FlagStore for MemoryFlagStore {
    fn get_at(&self, key: &str, now: DateTime<Utc>) -> Option<String> {
        let mut entries = self.entries.lock().unwrap_or_else(|poisoned| {
            log::error!("MemoryFlagStore mutex was poisoned! Recovering lock.");
            poisoned.into_inner()
        });
        let full_key = namespaced(key);
        match entries.get(&full_key) {
            Some(flag) if flag.live_at(now) => Some(flag.value.clone()),
            Some(_) => {
                entries.remove(&full_key);
                None
            }
            None => None,
        }
    }

    fn set(&self, key: &str, value: &str, expires_at: Option<DateTime<Utc>>) -> Result<(), SessionStoreError> {
        let mut entries = self.entries.lock().unwrap_or_else(|poisoned| {
            log::error!("MemoryFlagStore mutex was poisoned! Recovering lock.");
            poisoned.into_inner()
        });
        entries.insert(
            namespaced(key),
            StoredFlag {
                value: value.to_string(),
                expires_at,
            },
        );
        Ok(())
    }
}
