//! HTTP surface. Every `/api/*` route except health expects
//! `Authorization: Bearer <token>`.

use std::sync::Arc;

use actix_multipart::Multipart;
use actix_web::dev::Payload;
use actix_web::http::{header, StatusCode};
use actix_web::error::BlockingError;
use actix_web::{get, post, web, FromRequest, HttpRequest, HttpResponse, Responder, ResponseError};
use chrono::Local;
use futures::future::{ready, Ready};
use futures::TryStreamExt;
use log::{error, info, warn};
use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;

use crate::auth::{bearer_token, AuthService, StaticTokenAuth, User};
use crate::catalog::{self, BUSINESS_CATEGORIES, CITIES, PROFESSIONS};
use crate::config::{Config, ExportConfig};
use crate::error::HarvestError;
use crate::export::{self, CsvLayout};
use crate::harvest::LeadService;
use crate::lead::Lead;
use crate::lead_import;
use crate::leads::{SortDirection, SortKey};
use crate::source::SearchRequest;
use crate::store::{LeadCursor, LeadQuery};

const MAX_IMPORT_BYTES: usize = 10 * 1024 * 1024;

pub struct AppState {
    pub service: LeadService,
    pub auth: Arc<dyn AuthService>,
    pub export: ExportConfig,
}

impl AppState {
    pub fn new(service: LeadService, auth: Arc<dyn AuthService>, export: ExportConfig) -> Self {
        AppState { service, auth, export }
    }

    pub fn from_config(config: &Config) -> Result<Self, HarvestError> {
        let auth: Arc<dyn AuthService> = Arc::new(StaticTokenAuth::from_config(&config.auth));
        info!("Using auth service '{}'", auth.name());
        Ok(Self::new(LeadService::from_config(config)?, auth, config.export.clone()))
    }
}

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Authentication required")]
    Unauthorized,

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{message}")]
    Internal { message: String, details: String },
}

impl ApiError {
    fn internal(message: &str, details: impl std::fmt::Display) -> Self {
        let details = details.to_string();
        error!("{}: {}", message, details);
        ApiError::Internal {
            message: message.to_string(),
            details,
        }
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let body = match self {
            ApiError::Internal { message, details } => json!({ "error": message, "details": details }),
            other => json!({ "error": other.to_string() }),
        };
        HttpResponse::build(self.status_code()).json(body)
    }
}

impl From<BlockingError> for ApiError {
    fn from(e: BlockingError) -> Self {
        ApiError::internal("Background task failed", e)
    }
}

/// The user behind the request's bearer token.
pub struct AuthenticatedUser(pub User);

impl AuthenticatedUser {
    fn authenticate(req: &HttpRequest) -> Result<Self, ApiError> {
        let state = req
            .app_data::<web::Data<AppState>>()
            .ok_or_else(|| ApiError::internal("Server misconfigured", "application state missing"))?;
        let token = req
            .headers()
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(bearer_token)
            .ok_or(ApiError::Unauthorized)?;
        match state.auth.authenticate(token) {
            Some(user) => Ok(AuthenticatedUser(user)),
            None => {
                warn!("Rejected request to {} with unknown token", req.path());
                Err(ApiError::Unauthorized)
            }
        }
    }
}

impl FromRequest for AuthenticatedUser {
    type Error = ApiError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(Self::authenticate(req))
    }
}

/// Query string shared by the list, export and print endpoints.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeadListParams {
    pub page: Option<usize>,
    pub page_size: Option<usize>,
    pub sort_by: Option<String>,
    pub direction: Option<String>,
    pub specialty: Option<String>,
    pub search_query: Option<String>,
    pub filter: Option<String>,
    /// Keyset pagination: sort value and id of the last row seen.
    pub cursor_value: Option<String>,
    pub cursor_id: Option<String>,
}

fn non_blank(value: &Option<String>) -> Option<String> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty()).map(str::to_string)
}

impl LeadListParams {
    pub fn to_query(&self, export: &ExportConfig) -> Result<LeadQuery, ApiError> {
        let sort = match non_blank(&self.sort_by) {
            Some(raw) => raw.parse::<SortKey>().map_err(ApiError::BadRequest)?,
            None => SortKey::default(),
        };
        let direction = match non_blank(&self.direction) {
            Some(raw) => raw.parse::<SortDirection>().map_err(ApiError::BadRequest)?,
            None => SortDirection::default(),
        };
        let after = match (&self.cursor_value, &self.cursor_id) {
            (Some(sort_value), Some(id)) => Some(LeadCursor {
                sort_value: sort_value.clone(),
                id: id.clone(),
            }),
            (None, None) => None,
            _ => return Err(ApiError::BadRequest("cursorValue and cursorId go together".to_string())),
        };
        Ok(LeadQuery {
            sort,
            direction,
            // "all" is what the filter dropdown sends for no filter.
            specialty: non_blank(&self.specialty).filter(|s| !s.eq_ignore_ascii_case("all")),
            search_query: non_blank(&self.search_query),
            text: non_blank(&self.filter),
            page: self.page.unwrap_or(1).max(1),
            page_size: self
                .page_size
                .unwrap_or(export.default_page_size)
                .clamp(1, export.max_page_size),
            after,
        })
    }
}

#[get("/api/health")]
async fn health_check() -> impl Responder {
    HttpResponse::Ok().json("Server is running")
}

#[get("/api/me")]
async fn me(user: AuthenticatedUser) -> impl Responder {
    HttpResponse::Ok().json(user.0)
}

#[derive(Serialize)]
struct ScrapeResponse {
    success: bool,
    results: Vec<Lead>,
}

#[post("/api/scrape")]
async fn scrape(
    user: AuthenticatedUser,
    body: web::Json<SearchRequest>,
    data: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    let request = body.into_inner();
    let query = request.effective_query();
    if query.is_empty() {
        return Err(ApiError::BadRequest("Search query is required".to_string()));
    }
    info!("Starting scrape for: {} (user {})", query, user.0.id);

    let service = data.service.clone();
    let user_id = user.0.id;
    let outcome = web::block(move || service.search(&user_id, &request))
        .await?
        .map_err(|e| ApiError::internal("Scraping failed", e))?;

    // The persist handle is dropped here; saving finishes on its own thread.
    Ok(HttpResponse::Ok().json(ScrapeResponse {
        success: true,
        results: outcome.leads,
    }))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SaveLeadsBody {
    leads: Option<Vec<Lead>>,
    user_id: Option<String>,
}

#[post("/api/save-leads")]
async fn save_leads(
    user: AuthenticatedUser,
    body: web::Json<SaveLeadsBody>,
    data: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    let body = body.into_inner();
    let leads = body
        .leads
        .ok_or_else(|| ApiError::BadRequest("Valid leads array is required".to_string()))?;
    if let Some(claimed) = body.user_id.as_deref() {
        if claimed != user.0.id {
            return Err(ApiError::Forbidden("Cannot save leads for another user".to_string()));
        }
    }

    let received = leads.len();
    let service = data.service.clone();
    let user_id = user.0.id;
    let inserted = web::block(move || service.save_leads(&user_id, leads))
        .await?
        .map_err(|e| ApiError::internal("Failed to save leads", e))?;

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": format!("Received {} leads, saved {} new", received, inserted),
        "inserted": inserted,
    })))
}

#[get("/api/leads")]
async fn list_leads(
    user: AuthenticatedUser,
    params: web::Query<LeadListParams>,
    data: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    let query = params.to_query(&data.export)?;
    let service = data.service.clone();
    let page = web::block(move || service.page(&user.0.id, &query))
        .await?
        .map_err(|e| ApiError::internal("Failed to load leads", e))?;
    Ok(HttpResponse::Ok().json(page))
}

#[get("/api/leads/count")]
async fn count_leads(user: AuthenticatedUser, data: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let service = data.service.clone();
    let count = web::block(move || service.count(&user.0.id))
        .await?
        .map_err(|e| ApiError::internal("Failed to count leads", e))?;
    Ok(HttpResponse::Ok().json(json!({ "count": count })))
}

#[get("/api/leads/specialties")]
async fn specialties(user: AuthenticatedUser, data: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let service = data.service.clone();
    let list = web::block(move || service.specialties(&user.0.id))
        .await?
        .map_err(|e| ApiError::internal("Failed to load specialties", e))?;
    Ok(HttpResponse::Ok().json(list))
}

#[derive(Deserialize)]
struct ByQueryParams {
    q: Option<String>,
}

#[get("/api/leads/by-query")]
async fn leads_by_query(
    user: AuthenticatedUser,
    params: web::Query<ByQueryParams>,
    data: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    let q = non_blank(&params.q).ok_or_else(|| ApiError::BadRequest("Query parameter q is required".to_string()))?;
    let service = data.service.clone();
    let rows = web::block(move || service.by_search_query(&user.0.id, &q))
        .await?
        .map_err(|e| ApiError::internal("Failed to load leads", e))?;
    Ok(HttpResponse::Ok().json(rows))
}

#[get("/api/leads/export")]
async fn export_leads(
    user: AuthenticatedUser,
    params: web::Query<LeadListParams>,
    data: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    let query = params.to_query(&data.export)?;
    let service = data.service.clone();
    let user_id = user.0.id;
    let rows = web::block(move || service.collect_all(&user_id, &query))
        .await?
        .map_err(|e| ApiError::internal("Failed to export leads", e))?;
    let body = export::leads_to_csv(&rows, CsvLayout::Archive).map_err(|e| ApiError::internal("Failed to export leads", e))?;
    let filename = export::export_filename(Local::now().date_naive());
    info!("Exported {} leads as {}", rows.len(), filename);

    Ok(HttpResponse::Ok()
        .content_type("text/csv; charset=utf-8")
        .append_header(("Content-Disposition", format!("attachment; filename=\"{}\"", filename)))
        .body(body))
}

#[get("/api/leads/print")]
async fn print_leads(
    user: AuthenticatedUser,
    params: web::Query<LeadListParams>,
    data: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    let query = params.to_query(&data.export)?;
    let search_query = query.search_query.clone();
    let service = data.service.clone();
    let user_id = user.0.id;
    let rows = web::block(move || service.collect_all(&user_id, &query))
        .await?
        .map_err(|e| ApiError::internal("Failed to load leads", e))?;
    let html = export::render_print_view(&rows, search_query.as_deref(), Local::now());
    Ok(HttpResponse::Ok().content_type("text/html; charset=utf-8").body(html))
}

#[post("/api/leads/import")]
async fn import_leads(
    user: AuthenticatedUser,
    mut payload: Multipart,
    data: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    let mut upload: Option<(String, Vec<u8>)> = None;

    while let Some(mut field) = payload
        .try_next()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Invalid upload: {}", e)))?
    {
        let (name, filename) = {
            let disposition = field.content_disposition();
            (
                disposition.get_name().unwrap_or("").to_string(),
                disposition.get_filename().unwrap_or("upload.csv").to_string(),
            )
        };
        if name != "file" {
            while field
                .try_next()
                .await
                .map_err(|e| ApiError::BadRequest(format!("Invalid upload: {}", e)))?
                .is_some()
            {}
            continue;
        }

        let mut bytes = Vec::new();
        while let Some(chunk) = field
            .try_next()
            .await
            .map_err(|e| ApiError::BadRequest(format!("Invalid upload: {}", e)))?
        {
            if bytes.len() + chunk.len() > MAX_IMPORT_BYTES {
                return Err(ApiError::BadRequest("Uploaded file is too large".to_string()));
            }
            bytes.extend_from_slice(&chunk);
        }
        upload = Some((filename, bytes));
    }

    let (filename, bytes) = upload.ok_or_else(|| ApiError::BadRequest("Multipart field 'file' is required".to_string()))?;
    let service = data.service.clone();
    let user_id = user.0.id;
    let (read, inserted) = web::block(move || {
        let leads = lead_import::read_leads(bytes.as_slice(), &format!("Imported from {}", filename));
        let read = leads.len();
        service.save_leads(&user_id, leads).map(|inserted| (read, inserted))
    })
    .await?
    .map_err(|e| ApiError::internal("Failed to import leads", e))?;

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "imported": read,
        "inserted": inserted,
    })))
}

#[get("/api/stats")]
async fn stats(user: AuthenticatedUser, data: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let service = data.service.clone();
    let stats = web::block(move || service.stats(&user.0.id))
        .await?
        .map_err(|e| ApiError::internal("Failed to compute statistics", e))?;
    Ok(HttpResponse::Ok().json(stats))
}

#[derive(Serialize)]
struct CategoryEntry {
    category: &'static str,
    types: &'static [&'static str],
}

#[get("/api/catalog/categories")]
async fn catalog_categories(_user: AuthenticatedUser) -> impl Responder {
    let entries: Vec<CategoryEntry> = BUSINESS_CATEGORIES
        .iter()
        .map(|&(category, types)| CategoryEntry { category, types })
        .collect();
    HttpResponse::Ok().json(entries)
}

#[get("/api/catalog/professions")]
async fn catalog_professions(_user: AuthenticatedUser) -> impl Responder {
    HttpResponse::Ok().json(PROFESSIONS)
}

#[get("/api/catalog/cities")]
async fn catalog_cities(_user: AuthenticatedUser) -> impl Responder {
    HttpResponse::Ok().json(CITIES)
}

#[get("/api/catalog/localities/{city}")]
async fn catalog_localities(_user: AuthenticatedUser, path: web::Path<String>) -> Result<HttpResponse, ApiError> {
    let city = path.into_inner();
    if !CITIES.contains(&city.as_str()) {
        return Err(ApiError::NotFound(format!("Unknown city '{}'", city)));
    }
    Ok(HttpResponse::Ok().json(catalog::localities_for_city(&city)))
}

/// Registers every API route plus JSON and query error handlers that answer
/// in the API's error shape.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(
        web::JsonConfig::default().error_handler(|err, _req| ApiError::BadRequest(err.to_string()).into()),
    )
    .app_data(web::QueryConfig::default().error_handler(|err, _req| ApiError::BadRequest(err.to_string()).into()))
    .service(health_check)
    .service(me)
    .service(scrape)
    .service(save_leads)
    .service(count_leads)
    .service(specialties)
    .service(leads_by_query)
    .service(export_leads)
    .service(print_leads)
    .service(import_leads)
    .service(list_leads)
    .service(stats)
    .service(catalog_categories)
    .service(catalog_professions)
    .service(catalog_cities)
    .service(catalog_localities);
}
