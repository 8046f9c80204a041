//! REST API router and handlers.
//!
//! Cookie-authenticated endpoints for message submission and analysis
//! retrieval, plus role-gated admin endpoints for blocklist management,
//! report review, and service statistics. Static dashboard files are
//! served with an SPA fallback; API routes take precedence.

use std::num::NonZeroU32;
use std::sync::Arc;
use std::task::{Context, Poll};

use axum::{
    extract::{Path, Query, Request, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{delete, get, patch, post},
    Json, Router,
};
use chrono::Utc;
use governor::clock::{Clock, DefaultClock};
use governor::{Quota, RateLimiter as GovRateLimiter};
use serde::{Deserialize, Serialize};
use tower::{Layer, Service};
use tower_http::services::{ServeDir, ServeFile};

use crate::accounts::{self, AccountService};
use crate::config::AppConfig;
use crate::database::Database;
use crate::detector::ScamDetector;
use crate::error::{AntiphishError, ErrorContext};
use crate::metrics::MetricsCollector;
use crate::models::{MessageSource, ReportStatus, Role, User};
use crate::reports::ReportService;
use crate::session::SessionManager;

const SESSION_COOKIE: &str = "antiphish_session";

/// Session cookie lifetime in seconds (7 days, matching the session TTL).
const SESSION_COOKIE_MAX_AGE: u64 = 604_800;

/// Maximum accepted message content length in characters.
const MAX_CONTENT_CHARS: usize = 10_000;

/// Maximum accepted sender identifier length in characters.
const MAX_SENDER_CHARS: usize = 500;

/// Maximum accepted blocklist URL length in characters.
const MAX_URL_CHARS: usize = 2048;

type ApiError = (StatusCode, Json<ErrorResponse>);

/// Per-user submission rate limiter type.
type SubmitLimiter = GovRateLimiter<
    i64,
    governor::state::keyed::DefaultKeyedStateStore<i64>,
    governor::clock::DefaultClock,
>;

/// Request logging middleware layer.
#[derive(Clone)]
pub struct RequestLoggingLayer;

impl<S> Layer<S> for RequestLoggingLayer {
    type Service = RequestLoggingService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        RequestLoggingService { inner }
    }
}

/// Service that logs all requests with method, path, status, and response time.
#[derive(Clone)]
pub struct RequestLoggingService<S> {
    inner: S,
}

impl<S> Service<Request> for RequestLoggingService<S>
where
    S: Service<Request, Response = Response> + Clone + Send + 'static,
    S::Future: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<Self::Response, Self::Error>> + Send>,
    >;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request) -> Self::Future {
        let method = req.method().clone();
        let uri = req.uri().clone();
        let start = std::time::Instant::now();

        let mut inner = self.inner.clone();

        Box::pin(async move {
            let response = inner.call(req).await?;
            let duration = start.elapsed();
            let status = response.status();

            tracing::info!(
                method = %method,
                path = %uri.path(),
                status = %status.as_u16(),
                duration_ms = %duration.as_millis(),
                "HTTP request"
            );

            Ok(response)
        })
    }
}

/// Shared application state for all handlers.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<Database>,
    pub detector: Arc<ScamDetector>,
    pub accounts: Arc<AccountService>,
    pub sessions: Arc<SessionManager>,
    pub reports: Arc<ReportService>,
    pub metrics: Arc<MetricsCollector>,
    pub submit_limiter: Arc<SubmitLimiter>,
    pub static_dir: String,
}

/// Build the application state from configuration and a connected database.
pub fn build_state(db: Arc<Database>, config: &AppConfig) -> crate::error::Result<AppState> {
    let metrics = Arc::new(MetricsCollector::new());
    let detector = Arc::new(ScamDetector::new(
        &config.detection,
        db.clone(),
        metrics.clone(),
    )?);

    let quota = Quota::per_minute(
        NonZeroU32::new(config.submit_rate_per_minute).unwrap_or(NonZeroU32::MIN),
    );

    Ok(AppState {
        accounts: Arc::new(AccountService::new(db.clone())),
        sessions: Arc::new(SessionManager::new(db.clone())),
        reports: Arc::new(ReportService::new(db.clone())),
        submit_limiter: Arc::new(GovRateLimiter::keyed(quota)),
        static_dir: config.static_dir.clone(),
        db,
        detector,
        metrics,
    })
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
            request_id: None,
        }
    }

    pub fn with_request_id(message: impl Into<String>, request_id: String) -> Self {
        Self {
            error: message.into(),
            request_id: Some(request_id),
        }
    }
}

#[derive(Debug, Deserialize)]
struct SignupRequest {
    email: String,
    password: String,
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct LoginRequest {
    email: String,
    password: String,
}

#[derive(Debug, Serialize)]
struct UserInfo {
    id: i64,
    username: String,
    email: String,
    name: Option<String>,
    role: Role,
}

impl UserInfo {
    fn from_user(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            email: user.email.clone(),
            name: user.name.clone(),
            role: user.role,
        }
    }
}

#[derive(Debug, Deserialize)]
struct SubmitMessageRequest {
    content: String,
    source: Option<String>,
    sender: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SubmitReportRequest {
    message_id: Option<i64>,
    url: Option<String>,
    details: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ReviewReportRequest {
    status: String,
}

#[derive(Debug, Deserialize)]
struct AddPhishingUrlRequest {
    url: String,
    domain: Option<String>,
    source: Option<String>,
    severity: Option<String>,
    notes: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PaginationQuery {
    page: Option<i64>,
    limit: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct StatusQuery {
    status: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SourceQuery {
    source: Option<String>,
}

/// Map a service error onto an HTTP response, logging it with context.
fn api_error(error: AntiphishError, context: ErrorContext) -> ApiError {
    error.log_with_context(&context);

    let status = match &error {
        AntiphishError::Validation(_)
        | AntiphishError::Config(_)
        | AntiphishError::RegexPattern(_) => StatusCode::BAD_REQUEST,
        AntiphishError::Auth(_) => StatusCode::UNAUTHORIZED,
        AntiphishError::Forbidden(_) => StatusCode::FORBIDDEN,
        AntiphishError::NotFound(_) => StatusCode::NOT_FOUND,
        AntiphishError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
        AntiphishError::Database(_)
        | AntiphishError::InternalState(_)
        | AntiphishError::Io(_) => StatusCode::SERVICE_UNAVAILABLE,
        AntiphishError::Json(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };

    (
        status,
        Json(ErrorResponse::with_request_id(
            error.user_message(),
            context.request_id,
        )),
    )
}

fn get_session_id(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::COOKIE)?
        .to_str()
        .ok()?
        .split(';')
        .find_map(|cookie| {
            let cookie = cookie.trim();
            cookie
                .strip_prefix(SESSION_COOKIE)?
                .strip_prefix('=')
                .map(|s| s.to_string())
        })
}

fn session_cookie(session_id: &str) -> String {
    format!(
        "{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
        SESSION_COOKIE, session_id, SESSION_COOKIE_MAX_AGE
    )
}

fn clear_session_cookie() -> String {
    format!("{}=; Path=/; Max-Age=0", SESSION_COOKIE)
}

/// Resolve the calling user from the session cookie.
async fn authenticate(
    state: &AppState,
    headers: &HeaderMap,
    operation: &str,
) -> Result<User, ApiError> {
    let context = ErrorContext::new(operation);

    let session_id = get_session_id(headers).ok_or_else(|| {
        api_error(
            AntiphishError::Auth("Authentication required".to_string()),
            context.clone(),
        )
    })?;

    let session = state
        .sessions
        .get_session(&session_id)
        .await
        .map_err(|e| api_error(e, context.clone()))?
        .ok_or_else(|| {
            api_error(
                AntiphishError::Auth("Invalid or expired session".to_string()),
                context.clone(),
            )
        })?;

    let user = state
        .db
        .get_user(session.user_id)
        .await
        .map_err(|e| api_error(e, context.clone()))?
        .ok_or_else(|| {
            api_error(
                AntiphishError::Auth("Invalid or expired session".to_string()),
                context.clone(),
            )
        })?;

    if user.disabled {
        return Err(api_error(
            AntiphishError::Auth("Account is disabled".to_string()),
            context.with_user_id(user.id),
        ));
    }

    Ok(user)
}

/// Reject non-admin callers.
fn require_admin(user: &User, operation: &str) -> Result<(), ApiError> {
    if user.role != Role::Admin {
        return Err(api_error(
            AntiphishError::Forbidden("Admin access required".to_string()),
            ErrorContext::new(operation).with_user_id(user.id),
        ));
    }
    Ok(())
}

/// Build the application router.
pub fn build_router(state: AppState) -> Router {
    let static_dir = state.static_dir.clone();

    let api_router = Router::new()
        .route("/api", get(service_info))
        .route("/api/health", get(health))
        .route("/api/auth/signup", post(signup))
        .route("/api/auth/login", post(login))
        .route("/api/auth/logout", post(logout))
        .route("/api/auth/me", get(auth_me))
        .route("/api/messages", post(submit_message))
        .route("/api/messages", get(list_messages))
        .route("/api/messages/{id}", get(get_message))
        .route("/api/analyses", get(list_analyses))
        .route("/api/analyses/statistics", get(analysis_statistics))
        .route("/api/analyses/{id}", get(get_analysis))
        .route("/api/analyses/{id}", delete(delete_analysis))
        .route("/api/reports", post(submit_report))
        .route("/api/admin/phishing-urls", post(add_phishing_url))
        .route("/api/admin/phishing-urls", get(list_phishing_urls))
        .route("/api/admin/phishing-urls/{id}", delete(delete_phishing_url))
        .route("/api/admin/reports", get(list_reports))
        .route("/api/admin/reports/{id}", get(get_report))
        .route("/api/admin/reports/{id}", patch(review_report))
        .route("/api/admin/submissions", get(list_submissions))
        .route("/api/admin/submissions/{id}", get(get_submission))
        .route("/api/admin/statistics", get(admin_statistics))
        .layer(RequestLoggingLayer)
        .with_state(state);

    // Serve the dashboard with SPA fallback; API routes take precedence
    let serve_dir = ServeDir::new(&static_dir)
        .not_found_service(ServeFile::new(format!("{}/index.html", static_dir)));

    api_router.fallback_service(serve_dir)
}

async fn service_info() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "ok": true,
        "service": "antiphish",
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": Utc::now().to_rfc3339(),
    }))
}

async fn health(State(state): State<AppState>) -> Result<Json<serde_json::Value>, ApiError> {
    state
        .db
        .health_check()
        .await
        .map_err(|e| api_error(e, ErrorContext::new("health")))?;

    Ok(Json(serde_json::json!({ "status": "ok" })))
}

async fn signup(
    State(state): State<AppState>,
    Json(req): Json<SignupRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let context = ErrorContext::new("signup");

    let user = state
        .accounts
        .register(&req.email, &req.password, req.name.as_deref())
        .await
        .map_err(|e| api_error(e, context.clone()))?;

    let session = state
        .sessions
        .create_session(&user)
        .await
        .map_err(|e| api_error(e, context))?;

    Ok((
        [(header::SET_COOKIE, session_cookie(&session.id))],
        Json(serde_json::json!({ "user": UserInfo::from_user(&user) })),
    ))
}

async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let context = ErrorContext::new("login");

    let user = state
        .accounts
        .authenticate(&req.email, &req.password)
        .await
        .map_err(|e| api_error(e, context.clone()))?
        .ok_or_else(|| {
            api_error(
                AntiphishError::Auth("Invalid credentials".to_string()),
                context.clone(),
            )
        })?;

    let session = state
        .sessions
        .create_session(&user)
        .await
        .map_err(|e| api_error(e, context))?;

    Ok((
        [(header::SET_COOKIE, session_cookie(&session.id))],
        Json(serde_json::json!({ "user": UserInfo::from_user(&user) })),
    ))
}

async fn logout(State(state): State<AppState>, headers: HeaderMap) -> impl IntoResponse {
    if let Some(session_id) = get_session_id(&headers) {
        let _ = state.sessions.delete_session(&session_id).await;
    }

    (
        [(header::SET_COOKIE, clear_session_cookie())],
        Json(serde_json::json!({ "success": true })),
    )
}

async fn auth_me(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<UserInfo>, ApiError> {
    let user = authenticate(&state, &headers, "auth_me").await?;
    Ok(Json(UserInfo::from_user(&user)))
}

async fn submit_message(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<SubmitMessageRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let user = authenticate(&state, &headers, "submit_message").await?;
    let context = ErrorContext::new("submit_message").with_user_id(user.id);

    let content = req.content.trim().to_string();
    if content.is_empty() || content.chars().count() > MAX_CONTENT_CHARS {
        return Err(api_error(
            AntiphishError::Validation(format!(
                "Content must be between 1 and {} characters",
                MAX_CONTENT_CHARS
            )),
            context,
        ));
    }

    let source = match req.source.as_deref() {
        None => None,
        Some(raw) => Some(MessageSource::parse(raw).ok_or_else(|| {
            api_error(
                AntiphishError::Validation("Invalid source type".to_string()),
                context.clone(),
            )
        })?),
    };

    if let Some(sender) = &req.sender {
        if sender.chars().count() > MAX_SENDER_CHARS {
            return Err(api_error(
                AntiphishError::Validation(format!(
                    "Sender must not exceed {} characters",
                    MAX_SENDER_CHARS
                )),
                context,
            ));
        }
    }

    if let Err(not_until) = state.submit_limiter.check_key(&user.id) {
        let wait = not_until.wait_time_from(DefaultClock::default().now());
        return Err(api_error(
            AntiphishError::RateLimited {
                retry_after_ms: wait.as_millis() as u64,
            },
            context,
        ));
    }

    let message = state
        .db
        .insert_message(
            user.id,
            &content,
            source,
            req.sender.as_deref(),
            &accounts::content_hash(&content),
        )
        .await
        .map_err(|e| api_error(e, context.clone()))?;

    let analysis = state.detector.analyze(&content).await;

    state
        .db
        .insert_analysis(message.id, &analysis)
        .await
        .map_err(|e| api_error(e, context))?;

    Ok(Json(serde_json::json!({
        "id": message.id,
        "message": message,
        "analysis": analysis,
    })))
}

async fn list_messages(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<serde_json::Value>, ApiError> {
    let user = authenticate(&state, &headers, "list_messages").await?;
    let context = ErrorContext::new("list_messages").with_user_id(user.id);

    let messages = state
        .db
        .list_messages(user.id)
        .await
        .map_err(|e| api_error(e, context))?;

    Ok(Json(serde_json::json!({ "messages": messages })))
}

async fn get_message(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    headers: HeaderMap,
) -> Result<Json<serde_json::Value>, ApiError> {
    let user = authenticate(&state, &headers, "get_message").await?;
    let context = ErrorContext::new("get_message").with_user_id(user.id);

    let message = state
        .db
        .get_message(id, user.id)
        .await
        .map_err(|e| api_error(e, context.clone()))?
        .ok_or_else(|| {
            api_error(
                AntiphishError::NotFound("Message not found".to_string()),
                context.clone(),
            )
        })?;

    let analysis = state
        .db
        .get_analysis_by_message(message.id)
        .await
        .map_err(|e| api_error(e, context))?;

    Ok(Json(serde_json::json!({
        "message": message,
        "analysis": analysis,
    })))
}

async fn list_analyses(
    State(state): State<AppState>,
    Query(query): Query<PaginationQuery>,
    headers: HeaderMap,
) -> Result<Json<serde_json::Value>, ApiError> {
    let user = authenticate(&state, &headers, "list_analyses").await?;
    let context = ErrorContext::new("list_analyses").with_user_id(user.id);

    let page = query.page.unwrap_or(1).max(1);
    let limit = query.limit.unwrap_or(20).clamp(1, 100);

    let (analyses, total) = state
        .db
        .list_analyses(user.id, page, limit)
        .await
        .map_err(|e| api_error(e, context))?;

    let pages = (total + limit - 1) / limit;

    Ok(Json(serde_json::json!({
        "analyses": analyses,
        "pagination": {
            "page": page,
            "limit": limit,
            "total": total,
            "pages": pages,
        },
    })))
}

async fn analysis_statistics(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<serde_json::Value>, ApiError> {
    let user = authenticate(&state, &headers, "analysis_statistics").await?;
    let context = ErrorContext::new("analysis_statistics").with_user_id(user.id);

    let statistics = state
        .db
        .user_statistics(user.id)
        .await
        .map_err(|e| api_error(e, context))?;

    Ok(Json(serde_json::json!({ "statistics": statistics })))
}

async fn get_analysis(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    headers: HeaderMap,
) -> Result<Json<serde_json::Value>, ApiError> {
    let user = authenticate(&state, &headers, "get_analysis").await?;
    let context = ErrorContext::new("get_analysis").with_user_id(user.id);

    let analysis = state
        .db
        .get_analysis(id, user.id)
        .await
        .map_err(|e| api_error(e, context.clone()))?
        .ok_or_else(|| {
            api_error(
                AntiphishError::NotFound("Analysis not found".to_string()),
                context,
            )
        })?;

    Ok(Json(serde_json::json!({ "analysis": analysis })))
}

async fn delete_analysis(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    headers: HeaderMap,
) -> Result<Json<serde_json::Value>, ApiError> {
    let user = authenticate(&state, &headers, "delete_analysis").await?;
    let context = ErrorContext::new("delete_analysis").with_user_id(user.id);

    let deleted = state
        .db
        .delete_analysis(id, user.id)
        .await
        .map_err(|e| api_error(e, context.clone()))?;

    if !deleted {
        return Err(api_error(
            AntiphishError::NotFound("Analysis not found".to_string()),
            context,
        ));
    }

    Ok(Json(serde_json::json!({ "ok": true })))
}

async fn submit_report(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<SubmitReportRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let user = authenticate(&state, &headers, "submit_report").await?;
    let context = ErrorContext::new("submit_report").with_user_id(user.id);

    let report = state
        .reports
        .submit(
            user.id,
            req.message_id,
            req.url.as_deref(),
            req.details.as_deref(),
        )
        .await
        .map_err(|e| api_error(e, context))?;

    Ok(Json(serde_json::json!({ "report": report })))
}

async fn add_phishing_url(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<AddPhishingUrlRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let user = authenticate(&state, &headers, "add_phishing_url").await?;
    require_admin(&user, "add_phishing_url")?;
    let context = ErrorContext::new("add_phishing_url").with_user_id(user.id);

    let url = req.url.trim();
    let has_scheme = url.starts_with("http://") || url.starts_with("https://");
    if url.is_empty() || !has_scheme || url.chars().count() > MAX_URL_CHARS {
        return Err(api_error(
            AntiphishError::Validation("Valid URL is required".to_string()),
            context,
        ));
    }

    let entry = state
        .db
        .add_known_phishing_url(
            url,
            req.domain.as_deref(),
            req.source.as_deref(),
            req.severity.as_deref(),
            req.notes.as_deref(),
        )
        .await
        .map_err(|e| api_error(e, context))?;

    tracing::info!(url = %entry.url, admin = user.id, "Blocklist entry added");
    Ok(Json(serde_json::json!({ "url": entry })))
}

async fn list_phishing_urls(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<serde_json::Value>, ApiError> {
    let user = authenticate(&state, &headers, "list_phishing_urls").await?;
    require_admin(&user, "list_phishing_urls")?;
    let context = ErrorContext::new("list_phishing_urls").with_user_id(user.id);

    let urls = state
        .db
        .list_known_phishing_urls()
        .await
        .map_err(|e| api_error(e, context))?;

    Ok(Json(serde_json::json!({ "urls": urls })))
}

async fn delete_phishing_url(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    headers: HeaderMap,
) -> Result<Json<serde_json::Value>, ApiError> {
    let user = authenticate(&state, &headers, "delete_phishing_url").await?;
    require_admin(&user, "delete_phishing_url")?;
    let context = ErrorContext::new("delete_phishing_url").with_user_id(user.id);

    let deleted = state
        .db
        .delete_known_phishing_url(id)
        .await
        .map_err(|e| api_error(e, context.clone()))?;

    if !deleted {
        return Err(api_error(
            AntiphishError::NotFound("Not found".to_string()),
            context,
        ));
    }

    tracing::info!(entry_id = id, admin = user.id, "Blocklist entry deleted");
    Ok(Json(serde_json::json!({ "ok": true })))
}

async fn list_reports(
    State(state): State<AppState>,
    Query(query): Query<StatusQuery>,
    headers: HeaderMap,
) -> Result<Json<serde_json::Value>, ApiError> {
    let user = authenticate(&state, &headers, "list_reports").await?;
    require_admin(&user, "list_reports")?;
    let context = ErrorContext::new("list_reports").with_user_id(user.id);

    let status = match query.status.as_deref() {
        None => None,
        Some(raw) => Some(ReportStatus::parse(raw).ok_or_else(|| {
            api_error(
                AntiphishError::Validation("Invalid status filter".to_string()),
                context.clone(),
            )
        })?),
    };

    let reports = state
        .reports
        .list(status)
        .await
        .map_err(|e| api_error(e, context))?;

    Ok(Json(serde_json::json!({ "reports": reports })))
}

async fn get_report(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    headers: HeaderMap,
) -> Result<Json<serde_json::Value>, ApiError> {
    let user = authenticate(&state, &headers, "get_report").await?;
    require_admin(&user, "get_report")?;
    let context = ErrorContext::new("get_report").with_user_id(user.id);

    let report = state
        .reports
        .get(id)
        .await
        .map_err(|e| api_error(e, context.clone()))?
        .ok_or_else(|| {
            api_error(
                AntiphishError::NotFound("Report not found".to_string()),
                context,
            )
        })?;

    Ok(Json(serde_json::json!({ "report": report })))
}

async fn review_report(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    headers: HeaderMap,
    Json(req): Json<ReviewReportRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let user = authenticate(&state, &headers, "review_report").await?;
    require_admin(&user, "review_report")?;
    let context = ErrorContext::new("review_report").with_user_id(user.id);

    let status = ReportStatus::parse(&req.status).ok_or_else(|| {
        api_error(
            AntiphishError::Validation("Invalid status".to_string()),
            context.clone(),
        )
    })?;

    let report = state
        .reports
        .review(id, status, user.id)
        .await
        .map_err(|e| api_error(e, context))?;

    Ok(Json(serde_json::json!({ "report": report })))
}

async fn list_submissions(
    State(state): State<AppState>,
    Query(query): Query<SourceQuery>,
    headers: HeaderMap,
) -> Result<Json<serde_json::Value>, ApiError> {
    let user = authenticate(&state, &headers, "list_submissions").await?;
    require_admin(&user, "list_submissions")?;
    let context = ErrorContext::new("list_submissions").with_user_id(user.id);

    let submissions = state
        .db
        .list_submissions(query.source.as_deref())
        .await
        .map_err(|e| api_error(e, context))?;

    Ok(Json(serde_json::json!({ "submissions": submissions })))
}

async fn get_submission(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    headers: HeaderMap,
) -> Result<Json<serde_json::Value>, ApiError> {
    let user = authenticate(&state, &headers, "get_submission").await?;
    require_admin(&user, "get_submission")?;
    let context = ErrorContext::new("get_submission").with_user_id(user.id);

    let submission = state
        .db
        .get_submission(id)
        .await
        .map_err(|e| api_error(e, context.clone()))?
        .ok_or_else(|| {
            api_error(
                AntiphishError::NotFound("Submission not found".to_string()),
                context,
            )
        })?;

    Ok(Json(serde_json::json!({ "submission": submission })))
}

async fn admin_statistics(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<serde_json::Value>, ApiError> {
    let user = authenticate(&state, &headers, "admin_statistics").await?;
    require_admin(&user, "admin_statistics")?;
    let context = ErrorContext::new("admin_statistics").with_user_id(user.id);

    let statistics = state
        .db
        .global_statistics()
        .await
        .map_err(|e| api_error(e, context))?;

    Ok(Json(serde_json::json!({
        "statistics": statistics,
        "engine": state.metrics.snapshot(),
    })))
}
