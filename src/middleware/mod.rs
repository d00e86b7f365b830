use actix_web::{
    body::EitherBody,
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    http::Method,
    web, Error, HttpResponse,
};
use actix_session::SessionExt;
use futures_util::future::{ok, LocalBoxFuture, Ready};
use tera::{Context, Tera};

use crate::helper::session_helpers::SessionFlagStore;
use crate::helper::splash_helpers::{is_gated_path, SplashState};

/// Holds page requests behind the intro video until the visitor's session
/// has seen it once. Must be wrapped inside the session middleware.
pub struct SplashGate;

impl<S, B> Transform<S, ServiceRequest> for SplashGate
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = SplashGateMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ok(SplashGateMiddleware { service })
    }
}

pub struct SplashGateMiddleware<S> {
    service: S,
}

fn splash_response(req: &ServiceRequest) -> HttpResponse {
    let tera = match req.app_data::<web::Data<Tera>>() {
        Some(tera) => tera,
        None => {
            log::error!("Tera is not registered; cannot render the splash page.");
            return HttpResponse::InternalServerError().body("Template engine unavailable.");
        }
    };

    let mut ctx = Context::new();
    let next = match req.query_string() {
        "" => req.path().to_string(),
        query => format!("{}?{}", req.path(), query),
    };
    ctx.insert("next_path", &next);

    match tera.render("splash.html", &ctx) {
        Ok(rendered) => HttpResponse::Ok()
            .content_type("text/html; charset=utf-8")
            .insert_header(("Cache-Control", "no-store"))
            .body(rendered),
        Err(err) => {
            log::error!("Template rendering error in 'splash.html': {:?}", err);
            HttpResponse::InternalServerError().body("Error rendering page.")
        }
    }
}

impl<S, B> Service<ServiceRequest> for SplashGateMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let gated = req.method() == Method::GET && is_gated_path(req.path());
        let state = if gated {
            let session = req.get_session();
            SplashState::current(&SessionFlagStore::new(&session))
        } else {
            SplashState::Complete
        };

        if state.allows_routes() {
            let fut = self.service.call(req);
            Box::pin(async move {
                let res = fut.await?;
                Ok(res.map_into_left_body())
            })
        } else {
            let response = splash_response(&req).map_into_right_body();
            Box::pin(async move {
                let (http_req, _payload) = req.into_parts();
                Ok(ServiceResponse::new(http_req, response))
            })
        }
    }
}
