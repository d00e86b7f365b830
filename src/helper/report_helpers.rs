use crate::helper::content_helpers::ContentState;
use crate::models::PageView;
use chrono::{DateTime, Datelike, Utc};
use serde::Serialize;

pub const MONTHS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct MonthBucket {
    pub name: &'static str,
    pub visitors: u64,
    /// Bar height relative to the busiest month, 0..=100.
    pub height_percent: u32,
}

#[derive(Debug, Serialize)]
pub struct VisitReport {
    pub year: i32,
    pub total_visits: u64,
    pub peak: u64,
    pub months: Vec<MonthBucket>,
    pub error: Option<String>,
}

/// Counts visits per month of `year`. Records from other years and
/// unparseable timestamps are ignored.
pub fn monthly_visits(views: &[PageView], year: i32) -> Vec<MonthBucket> {
    let mut counts = [0u64; 12];
    for view in views {
        let parsed = view
            .timestamp
            .as_deref()
            .and_then(|ts| DateTime::parse_from_rfc3339(ts).ok())
            .map(|ts| ts.with_timezone(&Utc));
        match parsed {
            Some(ts) if ts.year() == year => counts[ts.month0() as usize] += 1,
            Some(_) => {}
            None => log::debug!("Skipping page view '{}' with unreadable timestamp", view.id),
        }
    }

    let peak = counts.iter().copied().max().unwrap_or(0);
    MONTHS
        .iter()
        .zip(counts.iter())
        .map(|(&name, &visitors)| MonthBucket {
            name,
            visitors,
            height_percent: if peak == 0 { 0 } else { ((visitors * 100) / peak) as u32 },
        })
        .collect()
}

pub fn build_report(state: ContentState<PageView>, now: DateTime<Utc>) -> VisitReport {
    let year = now.year();
    let months = monthly_visits(&state.data, year);
    VisitReport {
        year,
        total_visits: state.total_docs.unwrap_or(state.data.len() as u64),
        peak: months.iter().map(|m| m.visitors).max().unwrap_or(0),
        months,
        error: state.error,
    }
}
