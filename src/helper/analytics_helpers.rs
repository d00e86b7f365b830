use crate::helper::session_helpers::FlagStore;
use crate::models::remote_operations::cms_operations::ContentSource;
use crate::models::PageViewRecord;
use chrono::{DateTime, NaiveDate, SecondsFormat, TimeZone, Utc};
use futures_util::future;
use serde::{Deserialize, Serialize};
use std::future::Future;

/// Session flag holding the pages already counted today.
pub const VISIT_LOG_KEY: &str = "visited";

/// Upper bound on the summed length of remembered paths. The oldest entries
/// fall off first, keeping the session cookie well under its size limit.
pub const MAX_VISIT_LOG_BYTES: usize = 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BeaconOutcome {
    /// Already counted today in this session.
    Skipped,
    Sent,
    Failed,
}

/// Pages counted for one calendar day (UTC).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisitLog {
    pub date: NaiveDate,
    pub pages: Vec<String>,
}

impl VisitLog {
    fn for_day(date: NaiveDate) -> Self {
        VisitLog { date, pages: Vec::new() }
    }

    /// Today's log. Anything stored for an earlier day, or unreadable, starts over.
    pub fn load(store: &dyn FlagStore, now: DateTime<Utc>) -> Self {
        let today = now.date_naive();
        store
            .get_at(VISIT_LOG_KEY, now)
            .and_then(|raw| match serde_json::from_str::<VisitLog>(&raw) {
                Ok(log) => Some(log),
                Err(e) => {
                    log::warn!("Discarding unreadable visit log: {}", e);
                    None
                }
            })
            .filter(|log| log.date == today)
            .unwrap_or_else(|| VisitLog::for_day(today))
    }

    pub fn contains(&self, path: &str) -> bool {
        self.pages.iter().any(|page| page == path)
    }

    pub fn record(&mut self, path: &str) {
        self.pages.retain(|page| page != path);
        self.pages.push(path.to_string());
        let mut total: usize = self.pages.iter().map(String::len).sum();
        while total > MAX_VISIT_LOG_BYTES && !self.pages.is_empty() {
            total -= self.pages.remove(0).len();
        }
    }

    fn save(&self, store: &dyn FlagStore, now: DateTime<Utc>) {
        let raw = match serde_json::to_string(self) {
            Ok(raw) => raw,
            Err(e) => {
                log::warn!("Could not encode the visit log: {}", e);
                return;
            }
        };
        if let Err(e) = store.set(VISIT_LOG_KEY, &raw, next_midnight(now)) {
            log::warn!("Page view sent but the visit log was not stored: {}", e);
        }
    }
}

fn next_midnight(now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    let tomorrow = now.date_naive().succ_opt()?.and_hms_opt(0, 0, 0)?;
    Some(Utc.from_utc_datetime(&tomorrow))
}

/// Records one page view per page per day per session. The page is only
/// remembered once the beacon went out, so a failed send is retried on the
/// next render.
pub async fn log_visit(store: &dyn FlagStore, source: &dyn ContentSource, path: &str, now: DateTime<Utc>) -> BeaconOutcome {
    if VisitLog::load(store, now).contains(path) {
        return BeaconOutcome::Skipped;
    }

    let record = PageViewRecord {
        page: path.to_string(),
        timestamp: now.to_rfc3339_opts(SecondsFormat::Millis, true),
    };

    match source.record_page_view(&record).await {
        Ok(()) => {
            // Reloaded so a log written while the beacon was in flight is kept.
            let mut visits = VisitLog::load(store, now);
            visits.record(path);
            visits.save(store, now);
            BeaconOutcome::Sent
        }
        Err(e) => {
            log::error!("Analytics Error for '{}': {}", path, e);
            BeaconOutcome::Failed
        }
    }
}

/// Runs the visit beacon and `load` side by side; neither waits for the other.
pub async fn log_visit_alongside<F: Future>(
    store: &dyn FlagStore,
    source: &dyn ContentSource,
    path: &str,
    now: DateTime<Utc>,
    load: F,
) -> (BeaconOutcome, F::Output) {
    future::join(log_visit(store, source, path, now), load).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::helper::session_helpers::MemoryFlagStore;
    use crate::models::remote_operations::cms_operations::CmsError;
    use crate::models::CollectionEnvelope;
    use async_trait::async_trait;
    use chrono::Duration;
    use serde_json::Value;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Mutex;
    use std::task::Poll;

    #[derive(Default)]
    struct BeaconSource {
        offline: bool,
        recorded: Mutex<Vec<PageViewRecord>>,
    }

    #[async_trait]
    impl ContentSource for BeaconSource {
        async fn fetch_collection(&self, _collection: &str, _params: &Value) -> Result<CollectionEnvelope<Value>, CmsError> {
            Ok(CollectionEnvelope::empty())
        }

        async fn fetch_document(&self, _collection: &str, _id: &str) -> Result<Option<Value>, CmsError> {
            Ok(None)
        }

        async fn record_page_view(&self, record: &PageViewRecord) -> Result<(), CmsError> {
            if self.offline {
                return Err(CmsError::Status { collection: "page-views".into(), status: 502 });
            }
            self.recorded.lock().unwrap().push(record.clone());
            Ok(())
        }
    }

    fn noon() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 5, 4, 12, 0, 0).unwrap()
    }

    #[actix_web::test]
    async fn one_beacon_per_page_per_day() {
        let store = MemoryFlagStore::new();
        let source = BeaconSource::default();

        assert_eq!(log_visit(&store, &source, "/news", noon()).await, BeaconOutcome::Sent);
        assert_eq!(log_visit(&store, &source, "/news", noon()).await, BeaconOutcome::Skipped);
        assert_eq!(log_visit(&store, &source, "/careers", noon()).await, BeaconOutcome::Sent);
        assert_eq!(
            log_visit(&store, &source, "/news", noon() + Duration::days(1)).await,
            BeaconOutcome::Sent
        );

        let recorded = source.recorded.lock().unwrap();
        assert_eq!(recorded.len(), 3);
        assert_eq!(recorded[0].page, "/news");
        assert_eq!(recorded[0].timestamp, "2026-05-04T12:00:00.000Z");
    }

    #[actix_web::test]
    async fn failed_beacons_are_retried() {
        let store = MemoryFlagStore::new();
        let offline = BeaconSource { offline: true, ..Default::default() };
        assert_eq!(log_visit(&store, &offline, "/", noon()).await, BeaconOutcome::Failed);

        let online = BeaconSource::default();
        assert_eq!(log_visit(&store, &online, "/", noon()).await, BeaconOutcome::Sent);
    }

    #[test]
    fn flags_expire_at_the_next_midnight() {
        let expiry = next_midnight(noon()).unwrap();
        assert_eq!(expiry, Utc.with_ymd_and_hms(2026, 5, 5, 0, 0, 0).unwrap());
    }

    #[actix_web::test]
    async fn visit_log_stays_bounded_and_resets_daily() {
        let store = MemoryFlagStore::new();
        let source = BeaconSource::default();

        for id in 0..200 {
            let path = format!("/products/{:024}", id);
            assert_eq!(log_visit(&store, &source, &path, noon()).await, BeaconOutcome::Sent);
        }
        let today = VisitLog::load(&store, noon());
        let bytes: usize = today.pages.iter().map(String::len).sum();
        assert!(bytes <= MAX_VISIT_LOG_BYTES);
        assert!(today.contains(&format!("/products/{:024}", 199)));
        assert!(!today.contains(&format!("/products/{:024}", 0)));
        assert_eq!(
            log_visit(&store, &source, &format!("/products/{:024}", 199), noon()).await,
            BeaconOutcome::Skipped
        );

        let tomorrow = VisitLog::load(&store, noon() + Duration::days(1));
        assert!(tomorrow.pages.is_empty());
        assert_eq!(tomorrow.date, noon().date_naive().succ_opt().unwrap());
    }

    #[test]
    fn unreadable_visit_logs_start_over() {
        let store = MemoryFlagStore::new();
        store.set(VISIT_LOG_KEY, "not json", None).unwrap();
        assert!(VisitLog::load(&store, noon()).pages.is_empty());
    }

    /// The page-view POST only finishes once the collection fetch has begun.
    #[derive(Default)]
    struct OverlapSource {
        fetch_started: AtomicBool,
        overlapped: AtomicBool,
    }

    #[async_trait]
    impl ContentSource for OverlapSource {
        async fn fetch_collection(&self, _collection: &str, _params: &Value) -> Result<CollectionEnvelope<Value>, CmsError> {
            self.fetch_started.store(true, Ordering::SeqCst);
            Ok(CollectionEnvelope::empty())
        }

        async fn fetch_document(&self, _collection: &str, _id: &str) -> Result<Option<Value>, CmsError> {
            Ok(None)
        }

        async fn record_page_view(&self, _record: &PageViewRecord) -> Result<(), CmsError> {
            let mut polls = 0;
            future::poll_fn(|cx| {
                if self.fetch_started.load(Ordering::SeqCst) || polls >= 16 {
                    Poll::Ready(())
                } else {
                    polls += 1;
                    cx.waker().wake_by_ref();
                    Poll::Pending
                }
            })
            .await;
            self.overlapped
                .store(self.fetch_started.load(Ordering::SeqCst), Ordering::SeqCst);
            Ok(())
        }
    }

    #[actix_web::test]
    async fn beacon_does_not_hold_up_the_content_fetch() {
        let store = MemoryFlagStore::new();
        let source = OverlapSource::default();

        let (outcome, loaded) = log_visit_alongside(
            &store,
            &source,
            "/news",
            noon(),
            source.fetch_collection("posts", &Value::Null),
        )
        .await;

        assert_eq!(outcome, BeaconOutcome::Sent);
        assert!(loaded.is_ok());
        assert!(source.overlapped.load(Ordering::SeqCst));
    }
}
