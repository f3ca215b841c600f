use std::sync::Arc;
use std::time::Duration;

use axum::{
    Router,
    extract::{Path, State},
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use cookieforge::prelude::*;
use serde::{Deserialize, Serialize};
use tracing_subscriber::EnvFilter;

// ---------------------------------------------------------------------------
// Session payload
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct Visits {
    count: u32,
}

type Sessions = SessionManager<CookieStore<Visits>, Visits>;

// ---------------------------------------------------------------------------
// Routes
// ---------------------------------------------------------------------------

/// Builds the demo router.
///
/// - GET /              count a visit
/// - GET /login/{name}  count a visit and remember `name`
/// - GET /logout        destroy the session
fn router(sessions: Arc<Sessions>) -> Router {
    Router::new()
        .route("/", get(visit))
        .route("/login/{name}", get(login))
        .route("/logout", get(logout))
        .with_state(sessions)
}

async fn visit(
    State(sessions): State<Arc<Sessions>>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    count_visit(&sessions, &headers, None)
}

async fn login(
    State(sessions): State<Arc<Sessions>>,
    Path(name): Path<String>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    count_visit(&sessions, &headers, Some(name))
}

async fn logout(
    State(sessions): State<Arc<Sessions>>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    let session = sessions.start_from_header(cookie_header(&headers))?;
    let cookie = sessions.destroy(&session)?;
    Ok(respond(&cookie, "logged out\n".to_string()))
}

/// Runs one request through the session lifecycle.
fn count_visit(
    sessions: &Sessions,
    headers: &HeaderMap,
    login: Option<String>,
) -> Result<Response, AppError> {
    let mut session = sessions.start_from_header(cookie_header(headers))?;

    if let Some(name) = login {
        session.login_name = name;
    }

    let visits = session.data.get_or_insert_with(Visits::default);
    visits.count = visits.count.saturating_add(1);
    let count = visits.count;

    let body = format!(
        "state={} user={} visits={count}\n",
        session.state,
        if session.login_name.is_empty() { "-" } else { session.login_name.as_str() },
    );

    let cookie = sessions.save(&mut session)?;
    Ok(respond(&cookie, body))
}

fn cookie_header(headers: &HeaderMap) -> Option<&str> {
    headers.get(header::COOKIE)?.to_str().ok()
}

fn respond(cookie: &SetCookie, body: String) -> Response {
    ([(header::SET_COOKIE, cookie.to_string())], body).into_response()
}

/// Maps session failures to `400 Bad Request`.
struct AppError(CookieforgeError);

impl From<CookieforgeError> for AppError {
    fn from(err: CookieforgeError) -> Self {
        Self(err)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        tracing::warn!(error = %self.0, "rejecting session cookie");
        (StatusCode::BAD_REQUEST, "bad session\n").into_response()
    }
}

// ---------------------------------------------------------------------------
// Server bootstrap
// ---------------------------------------------------------------------------

fn build_sessions() -> Result<Sessions, CookieforgeError> {
    let digest_key = std::env::var("COOKIEFORGE_DIGEST_KEY")
        .unwrap_or_else(|_| "change-me".to_string());
    let cipher_key = std::env::var("COOKIEFORGE_CIPHER_KEY").unwrap_or_default();

    let store = CookieStore::builder(digest_key)
        .cipher_key(cipher_key)
        .json_payload()
        .build()?;

    Ok(SessionManager::new(
        store,
        CookieConfig::default()
            .with_name("visits")
            .with_max_age(Duration::from_secs(300)),
    ))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let app = router(Arc::new(build_sessions()?));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:8080").await?;
    tracing::info!(addr = %listener.local_addr()?, "visit counter listening");

    axum::serve(listener, app).await?;
    Ok(())
}
