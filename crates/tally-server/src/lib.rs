//! Tally Web Server
//!
//! Axum-based REST API for the Tally expense tracker.
//!
//! Security features:
//! - Authentication required by default (bearer JWT from the identity
//!   provider, trusted proxy header, or API key); `--no-auth` for local dev
//! - Every query is scoped to the authenticated user's records
//! - Restrictive CORS policy and security headers
//! - Audit logging for all API access
//! - Sanitized error responses

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, HeaderValue, Method, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tower_http::{
    cors::CorsLayer, services::ServeDir, set_header::SetResponseHeaderLayer, trace::TraceLayer,
};
use tracing::{error, info, warn};

use tally_core::ai::{AIBackend, AIClient};
use tally_core::db::Database;
use tally_core::models::{User, UserProfile};

mod handlers;

/// Maximum pagination limit
pub const MAX_PAGE_LIMIT: i64 = 1000;

/// User id assigned to every request when authentication is disabled
pub const DEV_USER: &str = "local-dev";

/// User id assigned to requests authenticated by API key
pub const API_KEY_USER: &str = "api-key";

const AUTHORIZATION_HEADER: &str = "authorization";

/// How long fetched signing keys are reused before refetching
const JWKS_TTL: Duration = Duration::from_secs(600);

/// JWT validation configuration for the hosted identity provider
#[derive(Clone, Default)]
pub struct JwtConfig {
    /// Token issuer URL (e.g. "https://clerk.example.com"); enables JWT auth
    pub issuer: Option<String>,
    /// Expected `aud` claim, if the provider sets one
    pub audience: Option<String>,
}

impl JwtConfig {
    pub fn is_enabled(&self) -> bool {
        self.issuer.is_some()
    }

    /// Where the provider publishes its signing keys
    pub fn jwks_url(&self) -> Option<String> {
        self.issuer
            .as_ref()
            .map(|iss| format!("{}/.well-known/jwks.json", iss.trim_end_matches('/')))
    }
}

/// Server configuration
#[derive(Clone)]
pub struct ServerConfig {
    /// Whether authentication is required (secure by default)
    pub require_auth: bool,
    /// Allowed CORS origins (empty = same-origin only)
    pub allowed_origins: Vec<String>,
    /// API keys for service access, sent as "Bearer <key>"
    pub api_keys: Vec<String>,
    /// Header carrying the user id set by an authenticating reverse proxy
    pub auth_header: Option<String>,
    pub jwt: JwtConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            require_auth: true,
            allowed_origins: vec![],
            api_keys: vec![],
            auth_header: None,
            jwt: JwtConfig::default(),
        }
    }
}

/// How a request was authenticated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthMethod {
    /// Authentication disabled
    None,
    Jwt,
    TrustedHeader,
    ApiKey,
}

/// Identity attached to each authenticated request
#[derive(Debug, Clone)]
pub struct AuthUser {
    /// Subject identifier from the identity provider
    pub external_id: String,
    pub profile: UserProfile,
    pub method: AuthMethod,
}

impl AuthUser {
    fn new(external_id: &str, method: AuthMethod) -> Self {
        Self {
            external_id: external_id.to_string(),
            profile: UserProfile::default(),
            method,
        }
    }
}

/// Signing keys fetched from the identity provider
#[derive(Clone)]
struct CachedKeys {
    keys: Vec<jsonwebtoken::jwk::Jwk>,
    fetched_at: Instant,
}

/// Shared application state
pub struct AppState {
    pub db: Database,
    pub config: ServerConfig,
    pub ai: Option<AIClient>,
    jwks: RwLock<Option<CachedKeys>>,
}

impl AppState {
    pub fn new(db: Database, config: ServerConfig, ai: Option<AIClient>) -> Self {
        Self {
            db,
            config,
            ai,
            jwks: RwLock::new(None),
        }
    }

    /// Local user row for the authenticated identity, created on first sight
    pub fn resolve_user(&self, auth: &AuthUser) -> Result<User, AppError> {
        Ok(self.db.get_or_create_user(&auth.external_id, &auth.profile)?)
    }
}

/// Authentication middleware
///
/// Tries, in order: a bearer JWT (when an issuer is configured), the trusted
/// proxy header, and a bearer API key. The resolved `AuthUser` is stored in
/// the request extensions for handlers.
///
/// **Trusted header**: only safe when the server is reachable solely through
/// a proxy that strips and sets the header itself.
///
/// **API keys**: compared in constant time.
async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Response {
    if !state.config.require_auth {
        request
            .extensions_mut()
            .insert(AuthUser::new(DEV_USER, AuthMethod::None));
        return next.run(request).await;
    }

    let path = request.uri().path().to_string();
    match authenticate(&state, request.headers(), &path).await {
        Some(user) => {
            info!(user = %user.external_id, method = ?user.method, path = %path, "Authenticated request");
            request.extensions_mut().insert(user);
            next.run(request).await
        }
        None => {
            warn!(path = %path, "Unauthorized request - no valid auth");
            (
                StatusCode::UNAUTHORIZED,
                Json(serde_json::json!({
                    "error": "Authentication required"
                })),
            )
                .into_response()
        }
    }
}

async fn authenticate(state: &AppState, headers: &HeaderMap, path: &str) -> Option<AuthUser> {
    let bearer = headers
        .get(AUTHORIZATION_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(|auth| auth.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty());

    if let Some(token) = bearer {
        if state.config.jwt.is_enabled() && looks_like_jwt(token) {
            match validate_jwt(state, token).await {
                Ok(user) => return Some(user),
                Err(e) => {
                    warn!(error = %e, path = %path, "Invalid JWT");
                }
            }
        }
    }

    if let Some(ref header_name) = state.config.auth_header {
        let header_user = headers
            .get(header_name.as_str())
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|s| !s.is_empty());
        if let Some(user) = header_user {
            return Some(AuthUser::new(user, AuthMethod::TrustedHeader));
        }
    }

    if let Some(token) = bearer {
        if validate_api_key(token, &state.config.api_keys) {
            return Some(AuthUser::new(API_KEY_USER, AuthMethod::ApiKey));
        }
    }

    None
}

fn looks_like_jwt(token: &str) -> bool {
    token.split('.').count() == 3
}

/// Claims read from the provider's session token
#[derive(Debug, Deserialize)]
struct Claims {
    sub: String,
    email: Option<String>,
    name: Option<String>,
    #[serde(alias = "image_url")]
    picture: Option<String>,
}

/// Validate a bearer JWT against the provider's published keys
async fn validate_jwt(state: &AppState, token: &str) -> Result<AuthUser, String> {
    use jsonwebtoken::{decode, decode_header, Algorithm, DecodingKey, Validation};

    let config = &state.config.jwt;
    let issuer = config.issuer.as_ref().ok_or("Issuer not configured")?;

    let header = decode_header(token).map_err(|e| format!("Invalid JWT header: {}", e))?;
    let kid = header.kid.ok_or("JWT missing key ID (kid)")?;

    let keys = signing_keys(state).await?;
    let jwk = keys
        .iter()
        .find(|k| k.common.key_id.as_deref() == Some(kid.as_str()))
        .ok_or_else(|| format!("No matching key found for kid: {}", kid))?;

    let decoding_key = DecodingKey::from_jwk(jwk).map_err(|e| format!("Invalid JWK: {}", e))?;

    let mut validation = Validation::new(Algorithm::RS256);
    validation.set_issuer(&[issuer.trim_end_matches('/')]);
    match config.audience {
        Some(ref audience) => validation.set_audience(&[audience]),
        None => validation.validate_aud = false,
    }

    let token_data = decode::<Claims>(token, &decoding_key, &validation)
        .map_err(|e| format!("JWT validation failed: {}", e))?;
    let claims = token_data.claims;

    Ok(AuthUser {
        external_id: claims.sub,
        profile: UserProfile {
            name: claims.name,
            email: claims.email,
            image_url: claims.picture,
        },
        method: AuthMethod::Jwt,
    })
}

/// Signing keys, refetched once the cached set is older than `JWKS_TTL`
async fn signing_keys(state: &AppState) -> Result<Vec<jsonwebtoken::jwk::Jwk>, String> {
    if let Some(cached) = state.jwks.read().await.as_ref() {
        if cached.fetched_at.elapsed() < JWKS_TTL {
            return Ok(cached.keys.clone());
        }
    }

    let url = state
        .config
        .jwt
        .jwks_url()
        .ok_or("Issuer not configured")?;
    let keys = fetch_public_keys(&url)
        .await
        .map_err(|e| format!("Failed to fetch signing keys: {}", e))?;

    *state.jwks.write().await = Some(CachedKeys {
        keys: keys.clone(),
        fetched_at: Instant::now(),
    });

    Ok(keys)
}

async fn fetch_public_keys(url: &str) -> Result<Vec<jsonwebtoken::jwk::Jwk>, String> {
    #[derive(Deserialize)]
    struct JwkSet {
        keys: Vec<jsonwebtoken::jwk::Jwk>,
    }

    let client = reqwest::Client::new();
    let response = client
        .get(url)
        .timeout(Duration::from_secs(10))
        .send()
        .await
        .map_err(|e| format!("HTTP request failed: {}", e))?;

    if !response.status().is_success() {
        return Err(format!("HTTP error: {}", response.status()));
    }

    let jwk_set: JwkSet = response
        .json()
        .await
        .map_err(|e| format!("Failed to parse JWK set: {}", e))?;

    Ok(jwk_set.keys)
}

/// Validate an API key against the configured keys using constant-time comparison
fn validate_api_key(provided: &str, valid_keys: &[String]) -> bool {
    use subtle::ConstantTimeEq;

    let provided_bytes = provided.as_bytes();

    valid_keys.iter().any(|key| {
        let key_bytes = key.as_bytes();
        // Constant-time for same-length keys
        provided_bytes.len() == key_bytes.len() && bool::from(provided_bytes.ct_eq(key_bytes))
    })
}

/// Parse a comma-separated list of API keys
pub fn parse_api_keys(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Create the application router
pub fn create_router(db: Database, static_dir: Option<&str>, config: ServerConfig) -> Router {
    let ai = AIClient::from_env();
    match ai {
        Some(ref client) => info!(
            "AI backend configured: {} (model: {})",
            client.host(),
            client.model()
        ),
        None => info!("AI backend not configured (set OPENAI_COMPATIBLE_HOST or AI_BACKEND)"),
    }

    create_router_with_ai(db, static_dir, config, ai)
}

/// Create the application router with an explicit AI client
pub fn create_router_with_ai(
    db: Database,
    static_dir: Option<&str>,
    config: ServerConfig,
    ai: Option<AIClient>,
) -> Router {
    let state = Arc::new(AppState::new(db, config.clone(), ai));

    let protected = Router::new()
        .route("/me", get(handlers::get_me))
        // Expenses
        .route(
            "/expenses",
            get(handlers::list_expenses).post(handlers::create_expense),
        )
        .route(
            "/expenses/:id",
            get(handlers::get_expense).delete(handlers::delete_expense),
        )
        // Statistics
        .route("/stats", get(handlers::get_stats))
        .route("/chart", get(handlers::get_chart))
        // AI
        .route("/categorize", post(handlers::categorize))
        .route("/insights", get(handlers::get_insights))
        .route("/insights/answer", post(handlers::answer_question))
        // Export
        .route("/export/expenses", get(handlers::export_expenses))
        .route("/audit", get(handlers::list_audit))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    let api_routes = Router::new()
        .route("/health", get(handlers::health))
        .merge(protected);

    let cors_methods = [Method::GET, Method::POST, Method::DELETE, Method::OPTIONS];
    let cors = if config.allowed_origins.is_empty() {
        CorsLayer::new()
            .allow_methods(cors_methods)
            .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
    } else {
        let origins: Vec<HeaderValue> = config
            .allowed_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(cors_methods)
            .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
    };

    let csp_value = HeaderValue::from_static(
        "default-src 'self'; script-src 'self'; style-src 'self' 'unsafe-inline'; img-src 'self' data: https:; connect-src 'self'; frame-ancestors 'none'"
    );

    let mut app = Router::new()
        .nest("/api", api_routes)
        .with_state(state)
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
        .layer(SetResponseHeaderLayer::overriding(
            header::CONTENT_SECURITY_POLICY,
            csp_value,
        ));

    if let Some(dir) = static_dir {
        app = app.fallback_service(ServeDir::new(dir));
    }

    app
}

/// Start the server
pub async fn serve(
    db: Database,
    host: &str,
    port: u16,
    static_dir: Option<&str>,
    config: ServerConfig,
) -> anyhow::Result<()> {
    if !config.require_auth {
        warn!("Authentication disabled - do not expose to network!");
    }

    check_ai_connection().await;

    let app = create_router(db, static_dir, config);
    let addr = format!("{}:{}", host, port);

    info!("Starting server at http://{}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn check_ai_connection() {
    match AIClient::from_env() {
        Some(client) => {
            if client.health_check().await {
                info!(
                    "AI backend connected: {} (model: {})",
                    client.host(),
                    client.model()
                );
            } else {
                warn!(
                    "AI backend configured but not responding: {} (model: {})",
                    client.host(),
                    client.model()
                );
            }
        }
        None => info!("AI backend not configured; AI features will return fallbacks"),
    }
}

// ============================================================================
// Error Handling
// ============================================================================

/// Application error type with HTTP status codes
pub struct AppError {
    status: StatusCode,
    message: String,
    internal: Option<anyhow::Error>,
}

impl AppError {
    pub fn bad_request(msg: &str) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: msg.to_string(),
            internal: None,
        }
    }

    pub fn not_found(msg: &str) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: msg.to_string(),
            internal: None,
        }
    }

    pub fn internal(msg: &str) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: msg.to_string(),
            internal: None,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if let Some(err) = &self.internal {
            error!(error = %err, "Internal error");
        }

        let body = Json(serde_json::json!({
            "error": self.message
        }));

        (self.status, body).into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        let err = err.into();
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            // Generic message to the client; full error is logged
            message: "An internal error occurred".to_string(),
            internal: Some(err),
        }
    }
}
