use actix_web::web;

pub mod forms;
pub mod public;
pub mod splash;

/// Every route of the site. Static files and the default service are
/// registered by the caller.
pub fn configure_site(cfg: &mut web::ServiceConfig) {
    cfg.configure(public::config_api)
        .configure(splash::config_splash)
        .configure(forms::config_forms)
        .configure(public::config_pages);
}
