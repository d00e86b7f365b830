use crate::helper::session_helpers::{FlagStore, SessionStoreError};

pub const SPLASH_SHOWN_KEY: &str = "splashShown";

/// Path prefixes that are never held behind the splash video.
const UNGATED_PREFIXES: [&str; 5] = ["/static", "/media", "/api", "/splash", "/favicon"];

/// Intro video gate. `Complete` is terminal for the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SplashState {
    Showing,
    Complete,
}

impl SplashState {
    pub fn current(store: &dyn FlagStore) -> Self {
        if store.has(SPLASH_SHOWN_KEY) {
            SplashState::Complete
        } else {
            SplashState::Showing
        }
    }

    /// The video finished (or the visitor tapped through).
    pub fn on_video_end(self, store: &dyn FlagStore) -> Result<Self, SessionStoreError> {
        if self == SplashState::Showing {
            store.set(SPLASH_SHOWN_KEY, "true", None)?;
        }
        Ok(SplashState::Complete)
    }

    pub fn allows_routes(self) -> bool {
        self == SplashState::Complete
    }
}

/// Whether a request path belongs to the page tree behind the splash.
pub fn is_gated_path(path: &str) -> bool {
    !UNGATED_PREFIXES.iter().any(|prefix| path.starts_with(prefix))
}

/// Only same-site paths are accepted as a post-splash destination.
pub fn safe_return_path(next: Option<&str>) -> String {
    match next.map(str::trim) {
        Some(path) if path.starts_with('/') && !path.starts_with("//") && !path.contains('\\') => path.to_string(),
        _ => "/".to_string(),
    }
}
