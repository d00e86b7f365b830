use crate::helper::content_helpers::{self, CollectionQuery, ContentState};
use crate::helper::media_helpers::{media_alt, resolve_media_url};
use crate::helper::page_helpers;
use crate::helper::report_helpers;
use crate::helper::rich_text_helpers::{plain_text_excerpt, render_rich_text};
use crate::config::SiteSettings;
use crate::models::{Career, Notification, PageView, Post, Product};
use crate::AppState;
use actix_session::Session;
use actix_web::http::StatusCode;
use actix_web::{web, HttpRequest, HttpResponse, Responder};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use tera::{Context, Tera};

const EXCERPT_CHARS: usize = 160;

pub fn config_api(cfg: &mut web::ServiceConfig) {
    cfg.service(web::scope("/api").route("/is_server_active", web::get().to(is_server_active)));
}

pub fn config_pages(cfg: &mut web::ServiceConfig) {
    cfg.route("/", web::get().to(show_home))
        .route("/about", web::get().to(show_about))
        .route("/products", web::get().to(show_products))
        .route("/products/{id}", web::get().to(show_product_details))
        .route("/news", web::get().to(show_news))
        .route("/news/{id}", web::get().to(show_news_details))
        .route("/careers", web::get().to(show_careers))
        .route("/careers/{id}", web::get().to(show_career_details))
        .route("/report", web::get().to(show_report));
}

async fn is_server_active() -> impl Responder {
    HttpResponse::Ok().body("active")
}

// --- View models ---

#[derive(Serialize)]
struct ProductView {
    id: String,
    title: String,
    category: Option<String>,
    description: String,
    image_url: String,
    image_alt: String,
}

impl ProductView {
    fn from_product(product: Product, settings: &SiteSettings) -> Self {
        let title = product.title.unwrap_or_default();
        let image_alt = match media_alt(&product.image) {
            alt if alt.is_empty() => title.clone(),
            alt => alt,
        };
        ProductView {
            image_url: resolve_media_url(&product.image, &settings.payload_url),
            image_alt,
            id: product.id,
            title,
            category: product.category.filter(|c| !c.trim().is_empty()),
            description: product.description.unwrap_or_default(),
        }
    }
}

#[derive(Serialize)]
struct PostView {
    id: String,
    title: String,
    excerpt: String,
    category: String,
    date: String,
    long_date: String,
    image_url: String,
    author_name: String,
    author_image_url: String,
    content_html: String,
}

/// `category` is a populated `{title}` relation, or a bare id when the
/// CMS was queried at depth 0.
fn category_title(category: &Value) -> String {
    category
        .get("title")
        .and_then(Value::as_str)
        .filter(|title| !title.trim().is_empty())
        .unwrap_or("Update")
        .to_string()
}

fn parse_timestamp(raw: Option<&str>) -> Option<DateTime<Utc>> {
    raw.and_then(|ts| DateTime::parse_from_rfc3339(ts).ok())
        .map(|ts| ts.with_timezone(&Utc))
}

impl PostView {
    fn from_post(post: Post, settings: &SiteSettings, with_content: bool) -> Self {
        let created = parse_timestamp(post.created_at.as_deref());
        let excerpt = match post.excerpt.filter(|e| !e.trim().is_empty()) {
            Some(excerpt) => excerpt,
            None => plain_text_excerpt(&post.content, EXCERPT_CHARS),
        };
        let (author_name, author_image_url) = match &post.author {
            Some(author) => (
                author.name.clone().unwrap_or_else(|| "Editorial Team".to_string()),
                resolve_media_url(&author.image, &settings.payload_url),
            ),
            None => ("Editorial Team".to_string(), String::new()),
        };
        PostView {
            title: post.title.unwrap_or_default(),
            excerpt,
            category: category_title(&post.category),
            date: created.map(|ts| ts.format("%d %b %Y").to_string()).unwrap_or_default(),
            long_date: created.map(|ts| ts.format("%B %-d, %Y").to_string()).unwrap_or_default(),
            image_url: resolve_media_url(&post.image, &settings.payload_url),
            author_name,
            author_image_url,
            content_html: if with_content {
                render_rich_text(&post.content, settings)
            } else {
                String::new()
            },
            id: post.id,
        }
    }
}

#[derive(Serialize)]
struct CareerView {
    id: String,
    position: String,
    department: String,
    location: String,
    employment_type: String,
    description_html: String,
}

impl CareerView {
    fn from_career(career: &Career, settings: &SiteSettings, with_description: bool) -> Self {
        CareerView {
            id: career.id.clone(),
            position: career.position.clone().unwrap_or_default(),
            department: career.department.clone().unwrap_or_default(),
            location: career.location.clone().unwrap_or_default(),
            employment_type: career.employment_type.clone().unwrap_or_else(|| "Full-time".to_string()),
            description_html: if with_description {
                render_rich_text(&career.description, settings)
            } else {
                String::new()
            },
        }
    }
}

fn insert_load_state<T>(ctx: &mut Context, state: &ContentState<T>) {
    ctx.insert("loading", &state.loading);
    ctx.insert("fetch_error", &state.error);
}

// --- Home / contact ---

/// State of the contact form embedded in the home page.
pub(crate) struct ContactFormView<'a> {
    pub values: &'a HashMap<String, String>,
    pub errors: &'a [String],
    pub banner: Option<&'a str>,
}

pub(crate) async fn render_home(
    session: &Session,
    state: &AppState,
    tera: &Tera,
    form: ContactFormView<'_>,
    status: StatusCode,
) -> HttpResponse {
    let mut ctx = page_helpers::page_shell(session, state, "/").await;
    ctx.insert("form", form.values);
    ctx.insert("form_errors", form.errors);
    ctx.insert("form_banner", &form.banner);
    page_helpers::render_with_status(tera, "home.html", &ctx, status)
}

async fn show_home(session: Session, state: web::Data<AppState>, tera: web::Data<Tera>) -> impl Responder {
    let empty = HashMap::new();
    let form = ContactFormView {
        values: &empty,
        errors: &[],
        banner: None,
    };
    render_home(&session, &state, &tera, form, StatusCode::OK).await
}

async fn show_about(session: Session, state: web::Data<AppState>, tera: web::Data<Tera>) -> impl Responder {
    let ctx = page_helpers::page_shell(&session, &state, "/about").await;
    page_helpers::render(&tera, "about.html", &ctx)
}

// --- Products ---

async fn show_products(session: Session, state: web::Data<AppState>, tera: web::Data<Tera>) -> impl Responder {
    let query = CollectionQuery::products();
    let (mut ctx, loaded): (Context, ContentState<Product>) = page_helpers::page_shell_loading(
        &session,
        &state,
        "/products",
        content_helpers::load_collection(state.content.as_ref(), &query),
    )
    .await;
    insert_load_state(&mut ctx, &loaded);

    let products: Vec<ProductView> = loaded
        .data
        .into_iter()
        .map(|product| ProductView::from_product(product, &state.settings))
        .collect();
    ctx.insert("products", &products);
    page_helpers::render(&tera, "products.html", &ctx)
}

async fn show_product_details(
    req: HttpRequest,
    path: web::Path<String>,
    session: Session,
    state: web::Data<AppState>,
    tera: web::Data<Tera>,
) -> impl Responder {
    let id = path.into_inner();
    let product = match content_helpers::load_document::<Product>(state.content.as_ref(), "products", &id).await {
        Some(product) => product,
        None => {
            return page_helpers::render_not_found(&tera, req.path(), "Product not found.", "/products", "Back to Products")
        }
    };

    let mut ctx = page_helpers::page_shell(&session, &state, req.path()).await;
    ctx.insert("product", &ProductView::from_product(product, &state.settings));
    page_helpers::render(&tera, "product_details.html", &ctx)
}

// --- News ---

async fn show_news(session: Session, state: web::Data<AppState>, tera: web::Data<Tera>) -> impl Responder {
    let query = CollectionQuery::news();
    let (mut ctx, loaded): (Context, ContentState<Post>) = page_helpers::page_shell_loading(
        &session,
        &state,
        "/news",
        content_helpers::load_collection(state.content.as_ref(), &query),
    )
    .await;
    insert_load_state(&mut ctx, &loaded);

    let posts: Vec<PostView> = loaded
        .data
        .into_iter()
        .map(|post| PostView::from_post(post, &state.settings, false))
        .collect();
    ctx.insert("posts", &posts);
    page_helpers::render(&tera, "news.html", &ctx)
}

async fn show_news_details(
    req: HttpRequest,
    path: web::Path<String>,
    session: Session,
    state: web::Data<AppState>,
    tera: web::Data<Tera>,
) -> impl Responder {
    let id = path.into_inner();
    let post = match content_helpers::load_document::<Post>(state.content.as_ref(), "posts", &id).await {
        Some(post) => post,
        None => return page_helpers::render_not_found(&tera, req.path(), "Article Not Found", "/news", "Back to News"),
    };

    let mut ctx = page_helpers::page_shell(&session, &state, req.path()).await;
    ctx.insert("post", &PostView::from_post(post, &state.settings, true));
    page_helpers::render(&tera, "news_details.html", &ctx)
}

// --- Careers ---

async fn show_careers(session: Session, state: web::Data<AppState>, tera: web::Data<Tera>) -> impl Responder {
    let query = CollectionQuery::open_careers();
    let (mut ctx, loaded): (Context, ContentState<Career>) = page_helpers::page_shell_loading(
        &session,
        &state,
        "/careers",
        content_helpers::load_collection(state.content.as_ref(), &query),
    )
    .await;
    insert_load_state(&mut ctx, &loaded);

    let careers: Vec<CareerView> = loaded
        .data
        .iter()
        .map(|career| CareerView::from_career(career, &state.settings, false))
        .collect();
    ctx.insert("careers", &careers);
    page_helpers::render(&tera, "careers.html", &ctx)
}

/// State of the application form on a career details page.
pub(crate) struct ApplicationFormView<'a> {
    pub values: &'a HashMap<String, String>,
    pub errors: &'a [String],
    pub banner: Option<&'a str>,
    pub submitted: bool,
}

pub(crate) async fn render_career(
    session: &Session,
    state: &AppState,
    tera: &Tera,
    career: &Career,
    form: ApplicationFormView<'_>,
    status: StatusCode,
) -> HttpResponse {
    let path = format!("/careers/{}", career.id);
    let mut ctx = page_helpers::page_shell(session, state, &path).await;
    ctx.insert("career", &CareerView::from_career(career, &state.settings, true));
    ctx.insert("form", form.values);
    ctx.insert("form_errors", form.errors);
    ctx.insert("form_banner", &form.banner);
    ctx.insert("submitted", &form.submitted);
    ctx.insert("max_resume_kb", &(state.settings.max_resume_bytes / 1024));
    page_helpers::render_with_status(tera, "career_details.html", &ctx, status)
}

pub(crate) fn career_not_found(tera: &Tera, path: &str) -> HttpResponse {
    page_helpers::render_not_found(tera, path, "Position not found.", "/careers", "Back to Careers")
}

async fn show_career_details(
    req: HttpRequest,
    path: web::Path<String>,
    session: Session,
    state: web::Data<AppState>,
    tera: web::Data<Tera>,
) -> impl Responder {
    let id = path.into_inner();
    let career = match content_helpers::load_document::<Career>(state.content.as_ref(), "careers", &id).await {
        Some(career) => career,
        None => return career_not_found(&tera, req.path()),
    };

    let empty = HashMap::new();
    let form = ApplicationFormView {
        values: &empty,
        errors: &[],
        banner: None,
        submitted: false,
    };
    render_career(&session, &state, &tera, &career, form, StatusCode::OK).await
}

// --- Report ---

async fn show_report(session: Session, state: web::Data<AppState>, tera: web::Data<Tera>) -> impl Responder {
    let query = CollectionQuery::page_views();
    let (mut ctx, loaded): (Context, ContentState<PageView>) = page_helpers::page_shell_loading(
        &session,
        &state,
        "/report",
        content_helpers::load_collection(state.content.as_ref(), &query),
    )
    .await;
    let report = report_helpers::build_report(loaded, Utc::now());
    ctx.insert("report", &report);
    page_helpers::render(&tera, "report.html", &ctx)
}

/// Fallback for unknown routes.
pub async fn not_found(req: HttpRequest, tera: web::Data<Tera>) -> impl Responder {
    let mut ctx = page_helpers::base_context(req.path());
    ctx.insert("notification", &None::<Notification>);
    ctx.insert("message", "Page not found.");
    ctx.insert("back_href", "/");
    ctx.insert("back_label", "Back to Home");
    page_helpers::render_with_status(&tera, "not_found.html", &ctx, StatusCode::NOT_FOUND)
}
