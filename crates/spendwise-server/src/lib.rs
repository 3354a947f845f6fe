//! Spendwise Web Server
//!
//! Axum-based REST API for the Spendwise expense tracker.
//!
//! Security features:
//! - Bearer token (HS256 JWT) authentication on every route except health and auth
//! - Restrictive CORS policy
//! - Security response headers
//! - Sanitized error responses

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Request, State},
    http::{header, HeaderValue, Method, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{de::DeserializeOwned, Serialize};
use tower_http::{cors::CorsLayer, set_header::SetResponseHeaderLayer, trace::TraceLayer};
use tracing::{debug, error, info, warn};

use spendwise_core::ai::{AIClient, ClassifierBackend};
use spendwise_core::db::Database;
use spendwise_core::{Error as CoreError, ExpenseService, TokenIssuer};

mod handlers;

/// Maximum accepted request body (1 MB, enough for bulk imports)
pub const MAX_BODY_SIZE: usize = 1024 * 1024;

/// Environment variable with comma-separated allowed CORS origins
pub const ALLOWED_ORIGINS_ENV: &str = "SPENDWISE_ALLOWED_ORIGINS";

/// Server configuration
#[derive(Clone, Default)]
pub struct ServerConfig {
    /// Allowed CORS origins (empty = same-origin only)
    pub allowed_origins: Vec<String>,
}

impl ServerConfig {
    /// Read `SPENDWISE_ALLOWED_ORIGINS`
    pub fn from_env() -> Self {
        let allowed_origins = std::env::var(ALLOWED_ORIGINS_ENV)
            .map(|v| parse_origins(&v))
            .unwrap_or_default();
        Self { allowed_origins }
    }
}

/// Split a comma-separated origin list, dropping blanks
pub fn parse_origins(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Shared application state
pub struct AppState {
    pub service: ExpenseService,
    pub tokens: TokenIssuer,
    pub config: ServerConfig,
}

impl AppState {
    pub fn db(&self) -> &Database {
        self.service.db()
    }
}

/// The authenticated caller, inserted into request extensions by the auth middleware
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: i64,
    pub email: String,
}

/// Authentication middleware - validates the bearer token and attaches the user
async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Response {
    let token = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|auth| auth.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty());

    let Some(token) = token else {
        warn!(path = %request.uri().path(), "Unauthorized request - no bearer token");
        return AppError::unauthorized("Authentication required").into_response();
    };

    match state.tokens.validate(token) {
        Ok(claims) => {
            debug!(user_id = claims.uid, path = %request.uri().path(), "Authenticated");
            request.extensions_mut().insert(AuthUser {
                id: claims.uid,
                email: claims.sub,
            });
            next.run(request).await
        }
        Err(e) => {
            warn!(error = %e, path = %request.uri().path(), "Rejected bearer token");
            AppError::unauthorized("Invalid or expired token").into_response()
        }
    }
}

/// Parse a JSON request body, mapping failures to 400
pub(crate) fn parse_json<T: DeserializeOwned>(body: &Bytes) -> Result<T, AppError> {
    serde_json::from_slice(body)
        .map_err(|e| AppError::bad_request(&format!("Invalid JSON: {}", e)))
}

/// Simple success response
#[derive(Serialize)]
pub struct SuccessResponse {
    pub success: bool,
}

/// Create the API router
pub fn create_router(service: ExpenseService, tokens: TokenIssuer, config: ServerConfig) -> Router {
    let state = Arc::new(AppState {
        service,
        tokens,
        config: config.clone(),
    });

    let public_routes = Router::new()
        .route("/health", get(handlers::health))
        .route("/auth/register", post(handlers::register))
        .route("/auth/login", post(handlers::login));

    let protected_routes = Router::new()
        .route("/me", get(handlers::get_me))
        .route(
            "/categories",
            get(handlers::list_categories).post(handlers::create_category),
        )
        .route(
            "/categories/:id",
            get(handlers::get_category)
                .put(handlers::update_category)
                .delete(handlers::delete_category),
        )
        .route(
            "/expenses",
            get(handlers::list_expenses).post(handlers::create_expense),
        )
        .route("/expenses/bulk", post(handlers::bulk_create_expenses))
        .route("/expenses/suggest", post(handlers::suggest_category))
        .route(
            "/expenses/:id",
            get(handlers::get_expense)
                .put(handlers::update_expense)
                .delete(handlers::delete_expense),
        )
        .route(
            "/budgets",
            get(handlers::list_budgets).post(handlers::create_budget),
        )
        .route("/budgets/alerts", get(handlers::budget_alerts))
        .route(
            "/budgets/:id",
            get(handlers::get_budget)
                .put(handlers::update_budget)
                .delete(handlers::delete_budget),
        )
        .route("/analytics/monthly", get(handlers::monthly_summary))
        .route("/analytics/category", get(handlers::category_breakdown))
        .route("/analytics/trends", get(handlers::trends))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    let api_routes = public_routes.merge(protected_routes);

    let methods = [
        Method::GET,
        Method::POST,
        Method::PUT,
        Method::DELETE,
        Method::OPTIONS,
    ];
    let cors = if config.allowed_origins.is_empty() {
        CorsLayer::new()
            .allow_methods(methods)
            .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
    } else {
        let origins: Vec<HeaderValue> = config
            .allowed_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(methods)
            .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
    };

    Router::new()
        .nest("/api", api_routes)
        .with_state(state)
        .layer(axum::extract::DefaultBodyLimit::max(MAX_BODY_SIZE))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(SetResponseHeaderLayer::overriding(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::X_FRAME_OPTIONS,
            HeaderValue::from_static("DENY"),
        ))
}

/// Start the server
pub async fn serve(
    service: ExpenseService,
    tokens: TokenIssuer,
    host: &str,
    port: u16,
    config: ServerConfig,
) -> anyhow::Result<()> {
    check_ai_connection(service.classifier().external()).await;
    info!(
        cache_capacity = service.classifier().config().cache_capacity,
        heuristic_fallback = service.classifier().config().heuristic_fallback,
        "Classifier configured"
    );

    let app = create_router(service, tokens, config);
    let addr = format!("{}:{}", host, port);

    info!("Starting server at http://{}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Log whether the external classifier answers
async fn check_ai_connection(client: Option<&AIClient>) {
    match client {
        Some(client) => {
            let info = client.info();
            if client.health_check().await {
                info!(
                    "Classifier backend connected: {} at {} (model: {})",
                    info.backend, info.host, info.model
                );
            } else {
                warn!(
                    "Classifier backend configured but not responding: {} at {} (model: {})",
                    info.backend, info.host, info.model
                );
            }
        }
        None => {
            info!("External classifier not configured (set GEMINI_API_KEY or AI_BACKEND); using keyword heuristics");
        }
    }
}

// ============================================================================
// Error Handling
// ============================================================================

/// Application error type with proper HTTP status codes
#[derive(Debug)]
pub struct AppError {
    status: StatusCode,
    message: String,
    internal: Option<anyhow::Error>,
}

impl AppError {
    fn new(status: StatusCode, msg: &str) -> Self {
        Self {
            status,
            message: msg.to_string(),
            internal: None,
        }
    }

    pub fn bad_request(msg: &str) -> Self {
        Self::new(StatusCode::BAD_REQUEST, msg)
    }

    pub fn unauthorized(msg: &str) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, msg)
    }

    pub fn not_found(msg: &str) -> Self {
        Self::new(StatusCode::NOT_FOUND, msg)
    }

    pub fn conflict(msg: &str) -> Self {
        Self::new(StatusCode::CONFLICT, msg)
    }

    pub fn internal(msg: &str) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, msg)
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Log the full internal error if present
        if let Some(err) = &self.internal {
            error!(error = %err, "Internal error");
        }

        let body = Json(serde_json::json!({
            "error": self.message
        }));

        (self.status, body).into_response()
    }
}

/// Status and client-facing message for a core error, `None` for internal failures
fn classify_core_error(err: &CoreError) -> Option<(StatusCode, String)> {
    match err {
        CoreError::Validation(msg) | CoreError::InvalidData(msg) => {
            Some((StatusCode::BAD_REQUEST, msg.clone()))
        }
        CoreError::NotFound(msg) => Some((StatusCode::NOT_FOUND, msg.clone())),
        CoreError::Auth(_) => Some((StatusCode::UNAUTHORIZED, "Invalid credentials".into())),
        e if e.is_constraint_violation() => {
            Some((StatusCode::CONFLICT, "Conflicting record".into()))
        }
        _ => None,
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        let err = err.into();
        if let Some((status, message)) = err.downcast_ref::<CoreError>().and_then(classify_core_error)
        {
            return Self {
                status,
                message,
                internal: None,
            };
        }
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            // Return generic message to client
            message: "An internal error occurred".to_string(),
            // Keep full error for logging
            internal: Some(err),
        }
    }
}
