use crate::helper::content_helpers;
use crate::helper::form_helpers::{self, FormError, CONTACT_REQUIRED};
use crate::helper::page_helpers::set_notification;
use crate::models::{Career, FormPayload, Notification};
use crate::routes::public::{self, ApplicationFormView, ContactFormView};
use crate::AppState;
use actix_multipart::Multipart;
use actix_session::Session;
use actix_web::http::StatusCode;
use actix_web::{web, HttpRequest, HttpResponse, Responder};
use std::collections::HashMap;
use tera::Tera;

const CONTACT_FAILED_MESSAGE: &str = "Something went wrong. Please check your connection and try again.";
const APPLICATION_FAILED_MESSAGE: &str =
    "We couldn't submit your application. Please check your internet connection and try again.";
const CONTACT_SENT_MESSAGE: &str = "Thank you for reaching out! We'll get back to you shortly.";

pub fn config_forms(cfg: &mut web::ServiceConfig) {
    cfg.route("/contact", web::post().to(submit_contact))
        .route("/careers/{id}/apply", web::post().to(submit_application));
}

async fn submit_contact(
    session: Session,
    state: web::Data<AppState>,
    tera: web::Data<Tera>,
    body: web::Bytes,
) -> impl Responder {
    let fields = match form_helpers::parse_form(&body) {
        Ok(fields) => fields,
        Err(response) => return response,
    };

    let errors = form_helpers::missing_required(&fields, &CONTACT_REQUIRED);
    if !errors.is_empty() {
        let form = ContactFormView {
            values: &fields,
            errors: &errors,
            banner: None,
        };
        return public::render_home(&session, &state, &tera, form, StatusCode::UNPROCESSABLE_ENTITY).await;
    }

    let payload = FormPayload::Contact(form_helpers::contact_from_fields(&fields));
    let outcome = state.sink.submit(&payload).await;
    if outcome.is_sent() {
        log::info!("Contact form relayed to the automation endpoint.");
        set_notification(
            &session,
            &Notification {
                message: CONTACT_SENT_MESSAGE.to_string(),
                r#type: "success".to_string(),
                dismiss_after_secs: Some(state.settings.contact_ack_seconds),
            },
        );
        return HttpResponse::SeeOther().append_header(("location", "/#contact")).finish();
    }

    let form = ContactFormView {
        values: &fields,
        errors: &[],
        banner: Some(CONTACT_FAILED_MESSAGE),
    };
    public::render_home(&session, &state, &tera, form, StatusCode::BAD_GATEWAY).await
}

async fn submit_application(
    req: HttpRequest,
    path: web::Path<String>,
    payload: Multipart,
    session: Session,
    state: web::Data<AppState>,
    tera: web::Data<Tera>,
) -> impl Responder {
    let id = path.into_inner();
    let career = match content_helpers::load_document::<Career>(state.content.as_ref(), "careers", &id).await {
        Some(career) => career,
        None => return public::career_not_found(&tera, req.path()),
    };

    let form = match form_helpers::read_application_form(payload, state.settings.max_resume_bytes).await {
        Ok(form) => form,
        Err(rejected) => {
            log::warn!("Rejected career application upload for '{}': {}", id, rejected.error);
            let status = match rejected.error {
                FormError::ResumeTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
                _ => StatusCode::BAD_REQUEST,
            };
            let errors = [rejected.error.to_string()];
            let view = ApplicationFormView {
                values: &rejected.fields,
                errors: &errors,
                banner: None,
                submitted: false,
            };
            return public::render_career(&session, &state, &tera, &career, view, status).await;
        }
    };

    let errors = form.validate();
    let application = match form.to_application(career.position.as_deref().unwrap_or_default()) {
        Some(application) if errors.is_empty() => application,
        _ => {
            let view = ApplicationFormView {
                values: &form.fields,
                errors: &errors,
                banner: None,
                submitted: false,
            };
            return public::render_career(&session, &state, &tera, &career, view, StatusCode::UNPROCESSABLE_ENTITY)
                .await;
        }
    };

    let outcome = state.sink.submit(&FormPayload::CareerApplication(application)).await;
    if outcome.is_sent() {
        log::info!("Career application for '{}' relayed to the automation endpoint.", id);
        let empty = HashMap::new();
        let view = ApplicationFormView {
            values: &empty,
            errors: &[],
            banner: None,
            submitted: true,
        };
        return public::render_career(&session, &state, &tera, &career, view, StatusCode::OK).await;
    }

    let view = ApplicationFormView {
        values: &form.fields,
        errors: &[],
        banner: Some(APPLICATION_FAILED_MESSAGE),
        submitted: false,
    };
    public::render_career(&session, &state, &tera, &career, view, StatusCode::BAD_GATEWAY).await
}
