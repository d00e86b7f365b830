use crate::helper::form_helpers::parse_form;
use crate::helper::session_helpers::SessionFlagStore;
use crate::helper::splash_helpers::{safe_return_path, SplashState};
use actix_session::Session;
use actix_web::{web, HttpResponse, Responder};

pub fn config_splash(cfg: &mut web::ServiceConfig) {
    cfg.route("/splash/complete", web::post().to(complete_splash));
}

/// Posted by the splash page when the video ends or the visitor taps through.
async fn complete_splash(session: Session, body: web::Bytes) -> impl Responder {
    let fields = match parse_form(&body) {
        Ok(fields) => fields,
        Err(response) => return response,
    };

    let store = SessionFlagStore::new(&session);
    if let Err(e) = SplashState::current(&store).on_video_end(&store) {
        // Without the flag the gate answers the next page with the splash again.
        log::error!("Could not persist splash completion: {}", e);
    }

    let next = safe_return_path(fields.get("next").map(String::as_str));
    HttpResponse::SeeOther().append_header(("location", next)).finish()
}
