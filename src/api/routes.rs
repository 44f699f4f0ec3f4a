use axum::extract::{FromRequestParts, Multipart, Path, State};
use axum::http::header::{AUTHORIZATION, COOKIE, SET_COOKIE};
use axum::http::{request::Parts, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use tracing::{error, info};

use crate::api::types::*;
use crate::api::AppState;
use crate::errors::AppError;
use crate::models::design::{ContainerParams, DesignParams, PoolParams};
use crate::models::project::{NewProject, Project, ProjectUpdate};
use crate::models::quote::{NewQuote, QuoteStatus};
use crate::models::message::NewMessage;
use crate::models::user::UserResponse;
use crate::services::auth::{AuthenticatedUser, RegisterInput};
use crate::utils::heic;
use crate::utils::validation::Validator;

pub const SESSION_COOKIE: &str = "kasa_session";
const SESSION_TTL_SECS: u64 = 24 * 60 * 60;

/// Session token from the `kasa_session` cookie, with an
/// `Authorization: Bearer` fallback for non-browser clients.
pub struct SessionToken(pub String);

#[axum::async_trait]
impl<S> FromRequestParts<S> for SessionToken
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        if let Some(cookies) = parts.headers.get(COOKIE).and_then(|v| v.to_str().ok()) {
            for pair in cookies.split(';') {
                if let Some((name, value)) = pair.trim().split_once('=') {
                    if name == SESSION_COOKIE && !value.is_empty() {
                        return Ok(SessionToken(value.to_string()));
                    }
                }
            }
        }
        if let Some(auth) = parts.headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok()) {
            if let Some(token) = auth.strip_prefix("Bearer ") {
                return Ok(SessionToken(token.to_string()));
            }
        }
        Err(json_error(StatusCode::UNAUTHORIZED, "Not logged in"))
    }
}

fn json_error(status: StatusCode, message: impl Into<String>) -> Response {
    (
        status,
        Json(ErrorBody {
            error: message.into(),
        }),
    )
        .into_response()
}

/// Single mapping from the error taxonomy to HTTP statuses. 500 responses
/// carry the underlying message verbatim, matching the site's historical
/// behavior.
fn app_error_response(err: AppError) -> Response {
    let status = match &err {
        AppError::ValidationError(_) | AppError::ImageError(_) => StatusCode::BAD_REQUEST,
        AppError::AuthenticationError(_) => StatusCode::UNAUTHORIZED,
        AppError::Forbidden(_) => StatusCode::FORBIDDEN,
        AppError::NotFound(_) => StatusCode::NOT_FOUND,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    json_error(status, err.to_string())
}

fn session_cookie(token: &str) -> String {
    format!(
        "{}={}; HttpOnly; Path=/; Max-Age={}; SameSite=Lax",
        SESSION_COOKIE, token, SESSION_TTL_SECS
    )
}

fn expired_session_cookie() -> String {
    format!("{}=; HttpOnly; Path=/; Max-Age=0; SameSite=Lax", SESSION_COOKIE)
}

async fn user_from_session(state: &AppState, token: &str) -> Result<AuthenticatedUser, Response> {
    state
        .auth
        .validate_session(token)
        .await
        .map_err(|e| json_error(StatusCode::UNAUTHORIZED, e.to_string()))
}

// ---------------------------------------------------------------------------
// Auth & account
// ---------------------------------------------------------------------------

/// Register and login share the stricter auth rate limit.
pub fn auth_router() -> Router<AppState> {
    Router::new()
        .route("/api/register", post(register))
        .route("/api/login", post(login))
}

pub fn account_router() -> Router<AppState> {
    Router::new()
        .route("/api/logout", post(logout))
        .route("/api/user", get(current_user))
}

#[utoipa::path(post, path = "/api/register", request_body = RegisterRequest,
    responses((status = 200, body = AuthResponse), (status = 400, body = ErrorBody)))]
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Response {
    let username = req.username.trim().to_string();
    let email = req.email.trim().to_string();
    if let Err(e) = Validator::validate_username(&username) {
        return app_error_response(e);
    }
    if let Err(e) = Validator::validate_email(&email) {
        return app_error_response(e);
    }
    if let Err(e) = Validator::validate_password(&req.password) {
        return app_error_response(e);
    }

    match state
        .auth
        .register(RegisterInput {
            username: username.clone(),
            email,
            password: req.password,
            full_name: req.full_name,
            is_professional: req.is_professional,
        })
        .await
    {
        Ok((user, token)) => (
            StatusCode::OK,
            [(SET_COOKIE, session_cookie(&token))],
            Json(AuthResponse {
                user: UserResponse::from(user),
                token,
                expires_in: SESSION_TTL_SECS,
            }),
        )
            .into_response(),
        Err(AppError::ValidationError(msg)) => {
            info!(action = "register_conflict", user = %username, detail = %msg);
            json_error(StatusCode::BAD_REQUEST, msg)
        }
        Err(e) => {
            error!(action = "register_failed", user = %username, error = %e);
            app_error_response(e)
        }
    }
}

#[utoipa::path(post, path = "/api/login", request_body = LoginRequest,
    responses((status = 200, body = AuthResponse), (status = 401, body = ErrorBody)))]
pub async fn login(State(state): State<AppState>, Json(req): Json<LoginRequest>) -> Response {
    match state.auth.login(&req.username_or_email, &req.password).await {
        Ok((user, token)) => (
            StatusCode::OK,
            [(SET_COOKIE, session_cookie(&token))],
            Json(AuthResponse {
                user: UserResponse::from(user),
                token,
                expires_in: SESSION_TTL_SECS,
            }),
        )
            .into_response(),
        Err(e) => {
            info!(action = "login_failed", user = %req.username_or_email, error = %e);
            json_error(StatusCode::UNAUTHORIZED, "Invalid credentials")
        }
    }
}

#[utoipa::path(post, path = "/api/logout",
    responses((status = 200, body = LogoutResponse), (status = 401, body = ErrorBody)))]
pub async fn logout(State(state): State<AppState>, SessionToken(token): SessionToken) -> Response {
    match state.auth.logout(&token).await {
        Ok(()) => (
            StatusCode::OK,
            [(SET_COOKIE, expired_session_cookie())],
            Json(LogoutResponse {
                message: "Logged out successfully".to_string(),
            }),
        )
            .into_response(),
        Err(e) => json_error(StatusCode::UNAUTHORIZED, e.to_string()),
    }
}

#[utoipa::path(get, path = "/api/user",
    responses((status = 200, body = UserResponse), (status = 401, body = ErrorBody)))]
pub async fn current_user(
    State(state): State<AppState>,
    SessionToken(token): SessionToken,
) -> Response {
    match state.auth.current_user(&token).await {
        Ok(user) => (StatusCode::OK, Json(UserResponse::from(user))).into_response(),
        Err(e) => json_error(StatusCode::UNAUTHORIZED, e.to_string()),
    }
}

// ---------------------------------------------------------------------------
// Projects
// ---------------------------------------------------------------------------

pub fn project_router() -> Router<AppState> {
    Router::new()
        .route("/api/projects", get(list_projects).post(create_project))
        .route("/api/projects/user", get(list_user_projects))
        .route(
            "/api/projects/:id",
            get(get_project).put(update_project).delete(delete_project),
        )
}

#[utoipa::path(get, path = "/api/projects",
    responses((status = 200, body = [Project]), (status = 401, body = ErrorBody)))]
pub async fn list_projects(
    State(state): State<AppState>,
    SessionToken(token): SessionToken,
) -> Response {
    if let Err(resp) = user_from_session(&state, &token).await {
        return resp;
    }
    match state.storage.list_projects().await {
        Ok(projects) => (StatusCode::OK, Json(projects)).into_response(),
        Err(e) => {
            error!(action = "list_projects_failed", error = %e);
            app_error_response(e)
        }
    }
}

#[utoipa::path(get, path = "/api/projects/user",
    responses((status = 200, body = [Project]), (status = 401, body = ErrorBody)))]
pub async fn list_user_projects(
    State(state): State<AppState>,
    SessionToken(token): SessionToken,
) -> Response {
    let user = match user_from_session(&state, &token).await {
        Ok(u) => u,
        Err(resp) => return resp,
    };
    match state.storage.list_projects_by_user(user.user_id).await {
        Ok(projects) => (StatusCode::OK, Json(projects)).into_response(),
        Err(e) => {
            error!(action = "list_user_projects_failed", user_id = user.user_id, error = %e);
            app_error_response(e)
        }
    }
}

#[utoipa::path(get, path = "/api/projects/{id}", params(("id" = i64, Path, description = "Record id")),
    responses((status = 200, body = Project), (status = 404, body = ErrorBody)))]
pub async fn get_project(
    State(state): State<AppState>,
    SessionToken(token): SessionToken,
    Path(id): Path<i64>,
) -> Response {
    if let Err(resp) = user_from_session(&state, &token).await {
        return resp;
    }
    match state.storage.get_project(id).await {
        Ok(Some(project)) => (StatusCode::OK, Json(project)).into_response(),
        Ok(None) => json_error(StatusCode::NOT_FOUND, "Project not found"),
        Err(e) => app_error_response(e),
    }
}

#[utoipa::path(post, path = "/api/projects", request_body = CreateProjectRequest,
    responses((status = 201, body = Project), (status = 400, body = ErrorBody)))]
pub async fn create_project(
    State(state): State<AppState>,
    SessionToken(token): SessionToken,
    Json(req): Json<CreateProjectRequest>,
) -> Response {
    let user = match user_from_session(&state, &token).await {
        Ok(u) => u,
        Err(resp) => return resp,
    };
    if req.name.trim().is_empty() {
        return json_error(StatusCode::BAD_REQUEST, "Project name is required");
    }
    if let Err(e) = Validator::validate_project_type(&req.project_type) {
        return app_error_response(e);
    }
    let status = req.status.unwrap_or_else(|| "draft".to_string());
    if let Err(e) = Validator::validate_project_status(&status) {
        return app_error_response(e);
    }

    match state
        .storage
        .create_project(NewProject {
            user_id: user.user_id,
            name: req.name,
            description: req.description,
            project_type: req.project_type,
            status,
            cost: req.cost,
            estimated_delivery_time: req.estimated_delivery_time,
            image_url: req.image_url,
            ai_analysis: req.ai_analysis,
            materials_list: req.materials_list,
        })
        .await
    {
        Ok(project) => {
            info!(action = "project_created", user_id = user.user_id, project_id = project.id);
            (StatusCode::CREATED, Json(project)).into_response()
        }
        Err(e) => {
            error!(action = "project_create_failed", user_id = user.user_id, error = %e);
            app_error_response(e)
        }
    }
}

#[utoipa::path(put, path = "/api/projects/{id}", request_body = UpdateProjectRequest,
    params(("id" = i64, Path, description = "Record id")),
    responses((status = 200, body = Project), (status = 403, body = ErrorBody), (status = 404, body = ErrorBody)))]
pub async fn update_project(
    State(state): State<AppState>,
    SessionToken(token): SessionToken,
    Path(id): Path<i64>,
    Json(req): Json<UpdateProjectRequest>,
) -> Response {
    let user = match user_from_session(&state, &token).await {
        Ok(u) => u,
        Err(resp) => return resp,
    };
    let existing = match state.storage.get_project(id).await {
        Ok(Some(project)) => project,
        Ok(None) => return json_error(StatusCode::NOT_FOUND, "Project not found"),
        Err(e) => return app_error_response(e),
    };
    if existing.user_id != user.user_id {
        info!(action = "project_update_forbidden", user_id = user.user_id, project_id = id);
        return json_error(StatusCode::FORBIDDEN, "You do not own this project");
    }
    if let Some(status) = &req.status {
        if let Err(e) = Validator::validate_project_status(status) {
            return app_error_response(e);
        }
    }

    match state
        .storage
        .update_project(
            id,
            ProjectUpdate {
                name: req.name,
                description: req.description,
                status: req.status,
                cost: req.cost,
                estimated_delivery_time: req.estimated_delivery_time,
                image_url: req.image_url,
                ai_analysis: req.ai_analysis,
                materials_list: req.materials_list,
            },
        )
        .await
    {
        Ok(Some(project)) => (StatusCode::OK, Json(project)).into_response(),
        Ok(None) => json_error(StatusCode::NOT_FOUND, "Project not found"),
        Err(e) => {
            error!(action = "project_update_failed", project_id = id, error = %e);
            app_error_response(e)
        }
    }
}

#[utoipa::path(delete, path = "/api/projects/{id}", params(("id" = i64, Path, description = "Record id")),
    responses((status = 204), (status = 403, body = ErrorBody), (status = 404, body = ErrorBody)))]
pub async fn delete_project(
    State(state): State<AppState>,
    SessionToken(token): SessionToken,
    Path(id): Path<i64>,
) -> Response {
    let user = match user_from_session(&state, &token).await {
        Ok(u) => u,
        Err(resp) => return resp,
    };
    let existing = match state.storage.get_project(id).await {
        Ok(Some(project)) => project,
        Ok(None) => return json_error(StatusCode::NOT_FOUND, "Project not found"),
        Err(e) => return app_error_response(e),
    };
    if existing.user_id != user.user_id {
        info!(action = "project_delete_forbidden", user_id = user.user_id, project_id = id);
        return json_error(StatusCode::FORBIDDEN, "You do not own this project");
    }
    match state.storage.delete_project(id).await {
        Ok(true) => StatusCode::NO_CONTENT.into_response(),
        Ok(false) => json_error(StatusCode::NOT_FOUND, "Project not found"),
        Err(e) => app_error_response(e),
    }
}

// ---------------------------------------------------------------------------
// Catalog & contact (public)
// ---------------------------------------------------------------------------

pub fn catalog_router() -> Router<AppState> {
    Router::new()
        .route("/api/materials", get(list_materials))
        .route("/api/materials/type/:material_type", get(list_materials_by_type))
        .route("/api/distributors", get(list_distributors))
        .route("/api/distributors/:id", get(get_distributor))
        .route("/api/contact", post(contact))
}

#[utoipa::path(get, path = "/api/materials", responses((status = 200)))]
pub async fn list_materials(State(state): State<AppState>) -> Response {
    match state.storage.list_materials().await {
        Ok(materials) => (StatusCode::OK, Json(materials)).into_response(),
        Err(e) => app_error_response(e),
    }
}

#[utoipa::path(get, path = "/api/materials/type/{material_type}",
    params(("material_type" = String, Path, description = "Project type to filter by")), responses((status = 200)))]
pub async fn list_materials_by_type(
    State(state): State<AppState>,
    Path(material_type): Path<String>,
) -> Response {
    match state.storage.list_materials_by_type(&material_type).await {
        Ok(materials) => (StatusCode::OK, Json(materials)).into_response(),
        Err(e) => app_error_response(e),
    }
}

#[utoipa::path(get, path = "/api/distributors", responses((status = 200)))]
pub async fn list_distributors(State(state): State<AppState>) -> Response {
    match state.storage.list_distributors().await {
        Ok(distributors) => (StatusCode::OK, Json(distributors)).into_response(),
        Err(e) => app_error_response(e),
    }
}

#[utoipa::path(get, path = "/api/distributors/{id}", params(("id" = i64, Path, description = "Record id")),
    responses((status = 200), (status = 404, body = ErrorBody)))]
pub async fn get_distributor(State(state): State<AppState>, Path(id): Path<i64>) -> Response {
    match state.storage.get_distributor(id).await {
        Ok(Some(distributor)) => (StatusCode::OK, Json(distributor)).into_response(),
        Ok(None) => json_error(StatusCode::NOT_FOUND, "Distributor not found"),
        Err(e) => app_error_response(e),
    }
}

#[utoipa::path(post, path = "/api/contact", request_body = ContactRequest,
    responses((status = 201, body = ContactResponse), (status = 400, body = ErrorBody)))]
pub async fn contact(State(state): State<AppState>, Json(req): Json<ContactRequest>) -> Response {
    if let Err(e) = Validator::validate_email(&req.email) {
        return app_error_response(e);
    }
    if let Err(e) = Validator::validate_contact(&req.name, &req.subject, &req.message) {
        return app_error_response(e);
    }
    match state
        .storage
        .create_message(NewMessage {
            name: req.name,
            email: req.email,
            subject: req.subject,
            message: req.message,
            subscribed: req.subscribed,
        })
        .await
    {
        Ok(message) => {
            info!(action = "contact_received", message_id = message.id);
            (
                StatusCode::CREATED,
                Json(ContactResponse {
                    id: message.id,
                    message: "Thanks for reaching out; we will reply shortly".to_string(),
                }),
            )
                .into_response()
        }
        Err(e) => {
            error!(action = "contact_store_failed", error = %e);
            app_error_response(e)
        }
    }
}

// ---------------------------------------------------------------------------
// Admin inbox
// ---------------------------------------------------------------------------

pub fn admin_router() -> Router<AppState> {
    Router::new()
        .route("/api/messages", get(list_messages))
        .route("/api/messages/:id/read", post(mark_message_read))
        .route("/api/quotes/:id/status", put(update_quote_status))
}

async fn require_admin(state: &AppState, token: &str) -> Result<AuthenticatedUser, Response> {
    let user = user_from_session(state, token).await?;
    if !user.is_admin() {
        return Err(json_error(StatusCode::FORBIDDEN, "Admin access required"));
    }
    Ok(user)
}

#[utoipa::path(get, path = "/api/messages",
    responses((status = 200), (status = 403, body = ErrorBody)))]
pub async fn list_messages(
    State(state): State<AppState>,
    SessionToken(token): SessionToken,
) -> Response {
    if let Err(resp) = require_admin(&state, &token).await {
        return resp;
    }
    match state.storage.list_messages().await {
        Ok(messages) => (StatusCode::OK, Json(messages)).into_response(),
        Err(e) => app_error_response(e),
    }
}

#[utoipa::path(post, path = "/api/messages/{id}/read", params(("id" = i64, Path, description = "Record id")),
    responses((status = 200), (status = 404, body = ErrorBody)))]
pub async fn mark_message_read(
    State(state): State<AppState>,
    SessionToken(token): SessionToken,
    Path(id): Path<i64>,
) -> Response {
    if let Err(resp) = require_admin(&state, &token).await {
        return resp;
    }
    match state.storage.mark_message_read(id).await {
        Ok(true) => StatusCode::OK.into_response(),
        Ok(false) => json_error(StatusCode::NOT_FOUND, "Message not found"),
        Err(e) => app_error_response(e),
    }
}

#[utoipa::path(put, path = "/api/quotes/{id}/status", request_body = UpdateQuoteStatusRequest,
    params(("id" = i64, Path, description = "Record id")),
    responses((status = 200), (status = 400, body = ErrorBody), (status = 404, body = ErrorBody)))]
pub async fn update_quote_status(
    State(state): State<AppState>,
    SessionToken(token): SessionToken,
    Path(id): Path<i64>,
    Json(req): Json<UpdateQuoteStatusRequest>,
) -> Response {
    let admin = match require_admin(&state, &token).await {
        Ok(u) => u,
        Err(resp) => return resp,
    };
    let Some(status) = QuoteStatus::parse(&req.status) else {
        return json_error(StatusCode::BAD_REQUEST, format!("Unknown quote status '{}'", req.status));
    };
    match state.storage.update_quote_status(id, status, req.total_cost).await {
        Ok(Some(quote)) => {
            info!(action = "quote_reviewed", admin_id = admin.user_id, quote_id = id, status = status.as_str());
            (StatusCode::OK, Json(quote)).into_response()
        }
        Ok(None) => json_error(StatusCode::NOT_FOUND, "Quote not found"),
        Err(e) => app_error_response(e),
    }
}

// ---------------------------------------------------------------------------
// Quotes
// ---------------------------------------------------------------------------

/// Submission and listing both sit behind the daily quote limiter; the
/// admin review route lives in `admin_router` under the general limit.
pub fn quote_router() -> Router<AppState> {
    Router::new().route("/api/quotes", post(create_quote).get(list_quotes))
}

#[utoipa::path(post, path = "/api/quotes", request_body = CreateQuoteRequest,
    responses((status = 201), (status = 401, body = ErrorBody)))]
pub async fn create_quote(
    State(state): State<AppState>,
    SessionToken(token): SessionToken,
    Json(req): Json<CreateQuoteRequest>,
) -> Response {
    let user = match user_from_session(&state, &token).await {
        Ok(u) => u,
        Err(resp) => return resp,
    };
    if let Some(project_id) = req.project_id {
        match state.storage.get_project(project_id).await {
            Ok(Some(project)) if project.user_id == user.user_id => {}
            Ok(Some(_)) => return json_error(StatusCode::FORBIDDEN, "You do not own this project"),
            Ok(None) => return json_error(StatusCode::NOT_FOUND, "Project not found"),
            Err(e) => return app_error_response(e),
        }
    }
    match state
        .storage
        .create_quote(NewQuote {
            user_id: user.user_id,
            project_id: req.project_id,
            details: req.details,
        })
        .await
    {
        Ok(quote) => {
            info!(action = "quote_created", user_id = user.user_id, quote_id = quote.id);
            (StatusCode::CREATED, Json(quote)).into_response()
        }
        Err(e) => {
            error!(action = "quote_create_failed", user_id = user.user_id, error = %e);
            app_error_response(e)
        }
    }
}

#[utoipa::path(get, path = "/api/quotes",
    responses((status = 200), (status = 401, body = ErrorBody)))]
pub async fn list_quotes(
    State(state): State<AppState>,
    SessionToken(token): SessionToken,
) -> Response {
    let user = match user_from_session(&state, &token).await {
        Ok(u) => u,
        Err(resp) => return resp,
    };
    match state.storage.list_quotes_by_user(user.user_id).await {
        Ok(quotes) => (StatusCode::OK, Json(quotes)).into_response(),
        Err(e) => app_error_response(e),
    }
}

// ---------------------------------------------------------------------------
// AI generation
// ---------------------------------------------------------------------------

pub fn ai_router() -> Router<AppState> {
    Router::new()
        .route("/api/design-chat", post(design_chat))
        .route("/api/design-generator", post(design_generator))
        .route("/api/generate-preview", post(generate_preview))
        .route("/api/estimate-cost", post(estimate_cost))
        .route("/api/design-suggestions", post(design_suggestions))
        .route("/api/smart-container", post(smart_container))
        .route("/api/modular-pool", post(modular_pool))
        .route("/api/analyze-image", post(analyze_image))
        .route("/api/analyze-image-gemini", post(analyze_image_gemini))
}

#[utoipa::path(post, path = "/api/design-chat", request_body = DesignChatRequest,
    responses((status = 200, body = DesignChatResponse), (status = 500, body = ErrorBody)))]
pub async fn design_chat(
    State(state): State<AppState>,
    Json(req): Json<DesignChatRequest>,
) -> Response {
    if req.message.trim().is_empty() {
        return json_error(StatusCode::BAD_REQUEST, "Message is required");
    }
    match state.openai.design_chat(&req.message).await {
        Ok(reply) => (StatusCode::OK, Json(DesignChatResponse { reply })).into_response(),
        Err(e) => {
            error!(action = "design_chat_failed", error = %e);
            json_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Design chat is unavailable: {}", e),
            )
        }
    }
}

#[utoipa::path(post, path = "/api/design-generator", request_body = DesignParams,
    responses((status = 200), (status = 400, body = ErrorBody), (status = 401, body = ErrorBody)))]
pub async fn design_generator(
    State(state): State<AppState>,
    SessionToken(token): SessionToken,
    Json(params): Json<DesignParams>,
) -> Response {
    let user = match user_from_session(&state, &token).await {
        Ok(u) => u,
        Err(resp) => return resp,
    };
    if let Err(e) = Validator::validate_design_params(&params) {
        return app_error_response(e);
    }
    info!(action = "design_generation", user_id = user.user_id, tipo = %params.tipo);
    let result = state.openai.generate_design(&params).await;
    (StatusCode::OK, Json(result)).into_response()
}

#[utoipa::path(post, path = "/api/generate-preview", request_body = DesignParams,
    responses((status = 200, body = PreviewResponse), (status = 401, body = ErrorBody)))]
pub async fn generate_preview(
    State(state): State<AppState>,
    SessionToken(token): SessionToken,
    Json(params): Json<DesignParams>,
) -> Response {
    if let Err(resp) = user_from_session(&state, &token).await {
        return resp;
    }
    if let Err(e) = Validator::validate_design_params(&params) {
        return app_error_response(e);
    }
    let image_url = state.openai.generate_preview(&params).await;
    (StatusCode::OK, Json(PreviewResponse { image_url })).into_response()
}

#[utoipa::path(post, path = "/api/estimate-cost", request_body = DesignParams,
    responses((status = 200, body = EstimateCostResponse), (status = 401, body = ErrorBody)))]
pub async fn estimate_cost(
    State(state): State<AppState>,
    SessionToken(token): SessionToken,
    Json(params): Json<DesignParams>,
) -> Response {
    if let Err(resp) = user_from_session(&state, &token).await {
        return resp;
    }
    if let Err(e) = Validator::validate_design_params(&params) {
        return app_error_response(e);
    }
    let estimate = state.openai.estimate_cost(&params).await;
    (StatusCode::OK, Json(EstimateCostResponse::from(estimate))).into_response()
}

#[utoipa::path(post, path = "/api/design-suggestions", request_body = DesignParams,
    responses((status = 200), (status = 401, body = ErrorBody)))]
pub async fn design_suggestions(
    State(state): State<AppState>,
    SessionToken(token): SessionToken,
    Json(params): Json<DesignParams>,
) -> Response {
    if let Err(resp) = user_from_session(&state, &token).await {
        return resp;
    }
    if let Err(e) = Validator::validate_design_params(&params) {
        return app_error_response(e);
    }
    let suggestions = state.gemini.design_suggestions(&params).await;
    (StatusCode::OK, Json(suggestions)).into_response()
}

#[utoipa::path(post, path = "/api/smart-container", request_body = ContainerParams,
    responses((status = 200), (status = 400, body = ErrorBody), (status = 401, body = ErrorBody)))]
pub async fn smart_container(
    State(state): State<AppState>,
    SessionToken(token): SessionToken,
    Json(params): Json<ContainerParams>,
) -> Response {
    let user = match user_from_session(&state, &token).await {
        Ok(u) => u,
        Err(resp) => return resp,
    };
    if let Err(e) = Validator::validate_container_params(&params) {
        return app_error_response(e);
    }
    info!(action = "container_generation", user_id = user.user_id, uso = %params.uso);
    let result = state.openai.generate_container_design(&params).await;
    (StatusCode::OK, Json(result)).into_response()
}

#[utoipa::path(post, path = "/api/modular-pool", request_body = PoolParams,
    responses((status = 200), (status = 400, body = ErrorBody), (status = 401, body = ErrorBody)))]
pub async fn modular_pool(
    State(state): State<AppState>,
    SessionToken(token): SessionToken,
    Json(params): Json<PoolParams>,
) -> Response {
    let user = match user_from_session(&state, &token).await {
        Ok(u) => u,
        Err(resp) => return resp,
    };
    if let Err(e) = Validator::validate_pool_params(&params) {
        return app_error_response(e);
    }
    info!(action = "pool_generation", user_id = user.user_id, forma = %params.forma);
    let result = state.openai.generate_pool_design(&params).await;
    (StatusCode::OK, Json(result)).into_response()
}

async fn read_upload(mut multipart: Multipart) -> Result<(Vec<u8>, String), Response> {
    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => {
                return Err(json_error(
                    StatusCode::BAD_REQUEST,
                    format!("Malformed upload: {}", e),
                ))
            }
        };
        let name = field.name().unwrap_or_default();
        if name == "image" || name == "file" {
            let mime = field
                .content_type()
                .unwrap_or("application/octet-stream")
                .to_string();
            let data = field.bytes().await.map_err(|e| {
                json_error(StatusCode::BAD_REQUEST, format!("Upload read failed: {}", e))
            })?;
            return Ok((data.to_vec(), mime));
        }
    }
    Err(json_error(
        StatusCode::BAD_REQUEST,
        "Expected a multipart field named 'image' or 'file'",
    ))
}

#[utoipa::path(post, path = "/api/analyze-image",
    responses((status = 200, body = AnalyzeImageResponse), (status = 500, body = ErrorBody)))]
pub async fn analyze_image(
    State(state): State<AppState>,
    SessionToken(token): SessionToken,
    multipart: Multipart,
) -> Response {
    if let Err(resp) = user_from_session(&state, &token).await {
        return resp;
    }
    let (data, mime) = match read_upload(multipart).await {
        Ok(upload) => upload,
        Err(resp) => return resp,
    };
    match state.openai.analyze_image(&data, &mime).await {
        Ok(analysis) => (StatusCode::OK, Json(AnalyzeImageResponse { analysis })).into_response(),
        Err(e) => {
            error!(action = "image_analysis_failed", error = %e);
            json_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Image analysis failed: {}", e),
            )
        }
    }
}

#[utoipa::path(post, path = "/api/analyze-image-gemini",
    responses((status = 200, body = AnalyzeImageResponse), (status = 500, body = ErrorBody)))]
pub async fn analyze_image_gemini(
    State(state): State<AppState>,
    SessionToken(token): SessionToken,
    multipart: Multipart,
) -> Response {
    if let Err(resp) = user_from_session(&state, &token).await {
        return resp;
    }
    let (data, mime) = match read_upload(multipart).await {
        Ok(upload) => upload,
        Err(resp) => return resp,
    };
    match state.gemini.analyze_image(&data, &mime).await {
        Ok(analysis) => (StatusCode::OK, Json(AnalyzeImageResponse { analysis })).into_response(),
        Err(e) => {
            error!(action = "gemini_analysis_failed", error = %e);
            json_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Image analysis failed: {}", e),
            )
        }
    }
}

// ---------------------------------------------------------------------------
// File conversion
// ---------------------------------------------------------------------------

pub fn file_router() -> Router<AppState> {
    Router::new().route("/api/convert-heic", post(convert_heic))
}

#[utoipa::path(post, path = "/api/convert-heic",
    responses((status = 200, description = "JPEG bytes"), (status = 400, body = ErrorBody)))]
pub async fn convert_heic(multipart: Multipart) -> Response {
    let (data, _mime) = match read_upload(multipart).await {
        Ok(upload) => upload,
        Err(resp) => return resp,
    };
    match heic::heic_to_jpeg(&data, 85) {
        Ok(jpeg) => (
            StatusCode::OK,
            [(axum::http::header::CONTENT_TYPE, "image/jpeg")],
            jpeg,
        )
            .into_response(),
        Err(e) => {
            info!(action = "heic_conversion_rejected", error = %e);
            app_error_response(e)
        }
    }
}
