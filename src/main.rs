use actix_cors::Cors;
use actix_session::{storage::CookieSessionStore, SessionMiddleware};
use actix_web::{
    cookie::Key,
    middleware::{DefaultHeaders, Logger},
    web, App, HttpServer,
};
use clap::Parser;
use iriyo_site::{
    config::Config,
    middleware::SplashGate,
    models::remote_operations::{automation_operations::AutomationClient, cms_operations::PayloadClient},
    routes, AppState,
};
use std::convert::TryFrom;
use std::path::PathBuf;
use std::sync::Arc;
use tera::Tera;

#[derive(Parser, Debug)]
#[command(name = "iriyo_server", author, version, about = "Starts the Iriyo Pharma website.")]
struct Cli {
    /// Path to the .env configuration file.
    #[arg(long, required = true, value_name = "FILE")]
    env_file: PathBuf,
}

fn build_cors(allowed_origins: &str) -> Cors {
    let cors = if allowed_origins.trim() == "*" {
        Cors::default().allow_any_origin()
    } else {
        allowed_origins
            .split(',')
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .fold(Cors::default(), |cors, origin| cors.allowed_origin(origin))
    };
    cors.allowed_methods(vec!["GET", "POST"])
        .allowed_headers(vec![actix_web::http::header::ACCEPT, actix_web::http::header::CONTENT_TYPE])
        .max_age(3600)
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    let cli = Cli::parse();

    let config = Config::from_env(&cli.env_file).expect("FATAL: Failed to load or parse configuration.");

    env_logger::init_from_env(env_logger::Env::new().default_filter_or(&config.log_level));

    let tera = Tera::new("templates/**/*.html").expect("Tera initialization failed");

    let content = PayloadClient::new(&config.payload_url).expect("FATAL: PAYLOAD_URL could not be parsed.");
    let sink = AutomationClient::new(&config.automation_endpoint)
        .expect("FATAL: AUTOMATION_ENDPOINT could not be parsed.");

    let app_state = web::Data::new(AppState {
        content: Arc::new(content),
        sink: Arc::new(sink),
        settings: config.site_settings(),
    });

    let session_key_bytes = hex::decode(&config.session_secret_key)
        .expect("FATAL: SESSION_SECRET_KEY in .env is not a valid hex string.");
    let session_key = Key::try_from(session_key_bytes.as_slice())
        .expect("FATAL: The decoded SESSION_SECRET_KEY is not long enough (minimum 64 bytes required).");

    let server_address = format!("{}:{}", config.web.host, config.web.port);
    log::info!("Server starting at http://{}", server_address);
    log::info!("Reading content from {}", config.payload_url);

    HttpServer::new(move || {
        let session_mw = SessionMiddleware::builder(CookieSessionStore::default(), session_key.clone())
            .cookie_secure(config.use_secure_cookies)
            .cookie_http_only(true)
            .cookie_same_site(actix_web::cookie::SameSite::Lax)
            .build();

        App::new()
            // The gate reads the session, so the session middleware wraps it.
            .wrap(SplashGate)
            .wrap(session_mw)
            .wrap(build_cors(&config.allowed_origins))
            .wrap(Logger::default())
            .wrap(
                DefaultHeaders::new()
                    .add(("X-Content-Type-Options", "nosniff"))
                    .add(("X-Frame-Options", "DENY"))
                    .add(("X-XSS-Protection", "1; mode=block")),
            )
            .app_data(web::Data::new(tera.clone()))
            .app_data(app_state.clone())
            .service(actix_files::Files::new("/static", &config.static_path))
            .configure(routes::configure_site)
            .default_service(web::to(routes::public::not_found))
    })
    .bind(server_address)?
    .run()
    .await
}
