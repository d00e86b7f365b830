use crate::helper::analytics_helpers;
use crate::helper::session_helpers::SessionFlagStore;
use crate::models::{Notification, OFFICE_LOCATIONS};
use crate::AppState;
use actix_session::Session;
use actix_web::http::StatusCode;
use actix_web::HttpResponse;
use chrono::{Datelike, Utc};
use futures_util::future;
use serde::Serialize;
use std::future::Future;
use tera::{Context, Tera};

#[derive(Serialize, Clone, Copy)]
pub struct NavItem {
    pub label: &'static str,
    pub path: &'static str,
}

pub const NAV_ITEMS: [NavItem; 5] = [
    NavItem { label: "Home", path: "/" },
    NavItem { label: "About Us", path: "/about" },
    NavItem { label: "Products", path: "/products" },
    NavItem { label: "Research", path: "/news" },
    NavItem { label: "Careers", path: "/careers" },
];

/// Nav entry to highlight for a request path.
pub fn active_section(path: &str) -> &'static str {
    NAV_ITEMS
        .iter()
        .rev()
        .find(|item| item.path != "/" && path.starts_with(item.path))
        .map_or("/", |item| item.path)
}

/// Context every page template expects: navigation, footer data, office map.
pub fn base_context(path: &str) -> Context {
    let mut ctx = Context::new();
    ctx.insert("nav_items", &NAV_ITEMS);
    ctx.insert("current_path", path);
    ctx.insert("active_section", active_section(path));
    ctx.insert("year", &Utc::now().year());
    ctx.insert("offices", &OFFICE_LOCATIONS);
    ctx.insert(
        "offices_json",
        &serde_json::to_string(&OFFICE_LOCATIONS).unwrap_or_else(|_| "[]".to_string()),
    );
    ctx
}

pub fn set_notification(session: &Session, notification: &Notification) {
    if let Err(e) = session.insert("notification", notification) {
        log::error!("Could not store notification in session: {}", e);
    }
}

pub fn take_notification(session: &Session) -> Option<Notification> {
    match session.get::<Notification>("notification") {
        Ok(Some(notification)) => {
            session.remove("notification");
            Some(notification)
        }
        Ok(None) => None,
        Err(e) => {
            log::warn!("Dropping unreadable notification: {}", e);
            session.remove("notification");
            None
        }
    }
}

/// Prepares a page render: logs the visit beacon and pops any flash message.
pub async fn page_shell(session: &Session, state: &AppState, path: &str) -> Context {
    page_shell_loading(session, state, path, future::ready(())).await.0
}

/// Like `page_shell`, with the page's content loaded while the beacon is out.
pub async fn page_shell_loading<F: Future>(
    session: &Session,
    state: &AppState,
    path: &str,
    load: F,
) -> (Context, F::Output) {
    let store = SessionFlagStore::new(session);
    let (outcome, loaded) =
        analytics_helpers::log_visit_alongside(&store, state.content.as_ref(), path, Utc::now(), load).await;
    log::debug!("Visit beacon for '{}': {:?}", path, outcome);

    let mut ctx = base_context(path);
    ctx.insert("notification", &take_notification(session));
    (ctx, loaded)
}

pub fn render(tera: &Tera, template: &str, ctx: &Context) -> HttpResponse {
    render_with_status(tera, template, ctx, StatusCode::OK)
}

pub fn render_with_status(tera: &Tera, template: &str, ctx: &Context, status: StatusCode) -> HttpResponse {
    match tera.render(template, ctx) {
        Ok(rendered) => HttpResponse::build(status)
            .content_type("text/html; charset=utf-8")
            .body(rendered),
        Err(err) => {
            log::error!("Template rendering error in '{}': {:?}", template, err);
            HttpResponse::InternalServerError().body("Error rendering page.")
        }
    }
}

/// Terminal "not found" page with a link back to the listing.
pub fn render_not_found(tera: &Tera, path: &str, message: &str, back_href: &str, back_label: &str) -> HttpResponse {
    let mut ctx = base_context(path);
    ctx.insert("notification", &None::<Notification>);
    ctx.insert("message", message);
    ctx.insert("back_href", back_href);
    ctx.insert("back_label", back_label);
    render_with_status(tera, "not_found.html", &ctx, StatusCode::NOT_FOUND)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nested_paths_highlight_their_section() {
        assert_eq!(active_section("/"), "/");
        assert_eq!(active_section("/products/12"), "/products");
        assert_eq!(active_section("/news"), "/news");
        assert_eq!(active_section("/report"), "/");
    }

    #[test]
    fn base_context_carries_offices_as_json() {
        let ctx = base_context("/about");
        let json = ctx.get("offices_json").and_then(|v| v.as_str()).unwrap().to_string();
        assert!(json.contains("\"Pune\""));
        assert_eq!(ctx.get("current_path").and_then(|v| v.as_str()), Some("/about"));
    }
}
