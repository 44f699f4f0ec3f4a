use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{middleware, Json, Router};
use hyper::Method;
use serde_json::Value;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;
use utoipa::OpenApi;
use utoipa_redoc::{Redoc, Servable};
use utoipa_swagger_ui::SwaggerUi;

use crate::config::Config;
use crate::errors::{AppError, Result};
use crate::services::auth::AuthService;
use crate::services::gemini::GeminiClient;
use crate::services::openai::OpenAiClient;
use crate::storage::{MemStorage, SqliteStorage, Storage};
use crate::utils::middleware::{rate_limit_middleware, request_id_middleware, RateLimits};

pub mod docs;
pub mod routes;
pub mod types;

/// Uploads are buffered in memory; 10 MB covers phone photos.
const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Everything the route layer needs, built once at startup and passed in
/// explicitly. No module globals.
#[derive(Clone)]
pub struct AppState {
    pub storage: Arc<dyn Storage>,
    pub auth: AuthService,
    pub openai: OpenAiClient,
    pub gemini: GeminiClient,
    pub limits: RateLimits,
}

impl AppState {
    pub fn new(storage: Arc<dyn Storage>, config: &Config) -> Self {
        Self {
            auth: AuthService::new(storage.clone(), config.session_secret.clone()),
            openai: OpenAiClient::new(config.openai_api_key.clone()),
            gemini: GeminiClient::new(config.gemini_api_key.clone()),
            limits: RateLimits::standard(),
            storage,
        }
    }

    /// Select the storage backend from configuration: SQLite when a
    /// database path is set, the dev in-memory store otherwise.
    pub async fn from_config(config: &Config) -> Result<Self> {
        let storage: Arc<dyn Storage> = match &config.database_path {
            Some(path) => Arc::new(SqliteStorage::new(path).await?),
            None => {
                info!(action = "memstorage_selected");
                Arc::new(MemStorage::new())
            }
        };
        Ok(Self::new(storage, config))
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        routes::register,
        routes::login,
        routes::logout,
        routes::current_user,
        routes::list_projects,
        routes::list_user_projects,
        routes::get_project,
        routes::create_project,
        routes::update_project,
        routes::delete_project,
        routes::list_materials,
        routes::list_materials_by_type,
        routes::list_distributors,
        routes::get_distributor,
        routes::contact,
        routes::list_messages,
        routes::mark_message_read,
        routes::create_quote,
        routes::list_quotes,
        routes::update_quote_status,
        routes::design_chat,
        routes::design_generator,
        routes::generate_preview,
        routes::estimate_cost,
        routes::design_suggestions,
        routes::smart_container,
        routes::modular_pool,
        routes::analyze_image,
        routes::analyze_image_gemini,
        routes::convert_heic,
    ),
    components(
        schemas(
            types::ErrorBody,
            types::RegisterRequest,
            types::LoginRequest,
            types::AuthResponse,
            types::LogoutResponse,
            types::CreateProjectRequest,
            types::UpdateProjectRequest,
            types::ContactRequest,
            types::ContactResponse,
            types::CreateQuoteRequest,
            types::UpdateQuoteStatusRequest,
            types::DesignChatRequest,
            types::DesignChatResponse,
            types::AnalyzeImageResponse,
            types::PreviewResponse,
            types::CostRange,
            types::EstimateCostResponse,
            crate::models::user::UserResponse,
            crate::models::project::Project,
            crate::models::catalog::Material,
            crate::models::catalog::Distributor,
            crate::models::message::Message,
            crate::models::quote::Quote,
            crate::models::quote::QuoteStatus,
            crate::models::design::DesignParams,
            crate::models::design::ContainerParams,
            crate::models::design::PoolParams,
            crate::models::design::DesignResult,
            crate::models::design::CostLine,
            crate::models::design::CostEstimate,
            crate::models::design::DesignSuggestions,
        )
    ),
    tags(
        (name = "Auth", description = "Registration, login and session endpoints"),
        (name = "Projects", description = "Design project CRUD (owner-scoped)"),
        (name = "Catalog", description = "Materials and distributors"),
        (name = "Quotes", description = "Quote requests and admin review"),
        (name = "AI", description = "Design generation, analysis and chat"),
    )
)]
pub struct ApiDoc;

/// Assemble the application router. Sub-routers carry their own rate
/// limiter; the general limiter and request-id span wrap everything.
pub fn router(state: AppState) -> Router {
    let limits = state.limits.clone();
    let openapi = ApiDoc::openapi();

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers(Any);

    Router::new()
        .merge(routes::catalog_router())
        .merge(routes::account_router())
        .merge(routes::project_router())
        .merge(routes::admin_router())
        .merge(routes::file_router())
        .merge(routes::auth_router().route_layer(middleware::from_fn_with_state(
            limits.auth.clone(),
            rate_limit_middleware,
        )))
        .merge(routes::quote_router().route_layer(middleware::from_fn_with_state(
            limits.quotes.clone(),
            rate_limit_middleware,
        )))
        .merge(routes::ai_router().route_layer(middleware::from_fn_with_state(
            limits.ai.clone(),
            rate_limit_middleware,
        )))
        .route("/health", get(health_check))
        .route("/docs/openapi.json", get(openapi_json))
        .route("/docs/markdown", get(api_markdown))
        .route("/docs", get(api_documentation))
        .merge(SwaggerUi::new("/api/docs").url("/api/openapi.json", openapi.clone()))
        .merge(Redoc::with_url("/api/redoc", openapi))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(cors)
        .layer(middleware::from_fn_with_state(
            limits.general.clone(),
            rate_limit_middleware,
        ))
        .layer(middleware::from_fn(request_id_middleware))
        .with_state(state)
}

pub async fn start_http_server(state: AppState, port: u16) -> Result<()> {
    let app = router(state);
    let addr = SocketAddr::from(([0, 0, 0, 0], port));

    info!(action = "http_listen", addr = %addr);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| AppError::InternalError(format!("Failed to bind {}: {}", addr, e)))?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .map_err(|e| AppError::InternalError(format!("Server error: {}", e)))
}

async fn health_check() -> impl IntoResponse {
    "OK"
}

async fn openapi_json() -> Json<Value> {
    let openapi = ApiDoc::openapi();
    Json(serde_json::to_value(openapi).unwrap_or_default())
}

/// Serves the API documentation as downloadable Markdown.
async fn api_markdown() -> impl IntoResponse {
    let markdown = docs::generate_markdown_docs();
    axum::response::Response::builder()
        .header("Content-Type", "text/markdown")
        .header(
            "Content-Disposition",
            "attachment; filename=\"API_DOCUMENTATION.md\"",
        )
        .body(axum::body::Body::from(markdown))
        .unwrap()
}

/// Serves the main API documentation HTML page.
async fn api_documentation() -> impl IntoResponse {
    axum::response::Html(docs::generate_documentation_html())
}
