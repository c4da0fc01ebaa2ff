//! HTTP server implementation.
//!
//! Routes, handlers, and the server lifecycle. Task routes sit behind the
//! [`require_login`] middleware; every task mutation ends in a redirect back
//! to `/tasks` with a one-shot notice queued in the session.

use axum::{
    Router,
    extract::{Form, FromRef, Path, State},
    middleware,
    response::{Html, IntoResponse, Json, Redirect, Response},
    routing::{get, post},
};
use axum_extra::extract::cookie::{Key, SignedCookieJar};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use super::session::{LOGGED_OUT, Session, now_ms, require_login};
use super::views;
use crate::config::{AuthConfig, Config};
use crate::db::Database;
use crate::error::{AppError, AppResult};
use crate::types::NewTask;

/// Inline error on a failed login.
pub const INVALID_CREDENTIALS: &str = "Invalid Credentials. Try again.";

/// Notice after a task is added.
pub const TASK_ADDED: &str = "New entry was successfully posted. Thanks.";

/// Notice after a task is completed.
pub const TASK_COMPLETED: &str = "The task was marked as complete.";

/// Notice after a task is deleted.
pub const TASK_DELETED: &str = "The task was deleted.";

/// State shared across handlers.
#[derive(Clone)]
pub struct AppState {
    db: Arc<Database>,
    auth: Arc<AuthConfig>,
    key: Key,
    session_max_age_secs: Option<i64>,
}

impl AppState {
    pub fn new(
        db: Arc<Database>,
        auth: AuthConfig,
        key: Key,
        session_max_age_secs: Option<i64>,
    ) -> Self {
        Self {
            db,
            auth: Arc::new(auth),
            key,
            session_max_age_secs,
        }
    }

    /// Build state from configuration. Derives the cookie signing key from
    /// `server.secret_key`, or generates a random one for this process.
    pub fn from_config(db: Arc<Database>, config: &Config) -> anyhow::Result<Self> {
        config.validate()?;
        let key = match &config.server.secret_key {
            Some(secret) => Key::derive_from(secret.as_bytes()),
            None => {
                warn!("No secret_key configured; sessions will not survive a restart");
                Key::generate()
            }
        };
        Ok(Self::new(
            db,
            config.auth.clone(),
            key,
            config.server.session_max_age_secs,
        ))
    }

    /// Get the database reference.
    pub fn db(&self) -> &Arc<Database> {
        &self.db
    }
}

impl FromRef<AppState> for Key {
    fn from_ref(state: &AppState) -> Self {
        state.key.clone()
    }
}

/// Health check response.
#[derive(serde::Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

/// Health check endpoint.
async fn health() -> impl IntoResponse {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Login form fields. Missing fields read as empty.
#[derive(Debug, serde::Deserialize)]
struct LoginForm {
    #[serde(default)]
    username: String,
    #[serde(default)]
    password: String,
}

/// `GET /` - login page with any pending notices.
async fn login_page(jar: SignedCookieJar) -> (SignedCookieJar, Html<String>) {
    let mut session = Session::from_jar(&jar);
    let flashes = session.take_flashes();
    (session.save(jar), Html(views::render_login(&flashes, None)))
}

/// `POST /` - credential check.
async fn login_submit(
    State(state): State<AppState>,
    jar: SignedCookieJar,
    Form(form): Form<LoginForm>,
) -> Response {
    let mut session = Session::from_jar(&jar);

    if !state.auth.matches(&form.username, &form.password) {
        info!(username = %form.username, "Failed login attempt");
        let flashes = session.take_flashes();
        let page = views::render_login(&flashes, Some(INVALID_CREDENTIALS));
        return (session.save(jar), Html(page)).into_response();
    }

    info!("User logged in");
    session.login(state.session_max_age_secs, now_ms());
    (session.save(jar), Redirect::to("/tasks")).into_response()
}

/// `GET /logout`
async fn logout(jar: SignedCookieJar) -> (SignedCookieJar, Redirect) {
    let mut session = Session::from_jar(&jar);
    if session.is_authenticated() {
        info!("User logged out");
    }
    session.logout();
    session.flash(LOGGED_OUT);
    (session.save(jar), Redirect::to("/"))
}

/// `GET /tasks` - open and closed tasks plus the add form.
async fn tasks_page(State(state): State<AppState>, jar: SignedCookieJar) -> AppResult<Response> {
    let lists = state.db().list_tasks()?;
    let mut session = Session::from_jar(&jar);
    let flashes = session.take_flashes();
    let page = views::render_tasks(&flashes, &lists);
    Ok((session.save(jar), Html(page)).into_response())
}

/// `POST /add/`
async fn add_task(
    State(state): State<AppState>,
    jar: SignedCookieJar,
    Form(form): Form<NewTask>,
) -> AppResult<Response> {
    let mut session = Session::from_jar(&jar);

    match state.db().add_task(&form) {
        Ok(_) => session.flash(TASK_ADDED),
        Err(err) => {
            let err = AppError::from(err);
            if !err.is_validation() {
                return Err(err);
            }
            info!(field = ?err.field, "Rejected task: {}", err.message);
            session.flash(err.message);
        }
    }

    Ok((session.save(jar), Redirect::to("/tasks")).into_response())
}

/// `GET /complete/{task_id}/`
///
/// A missing task is reported the same way as a completed one.
async fn complete_task(
    State(state): State<AppState>,
    Path(task_id): Path<i64>,
    jar: SignedCookieJar,
) -> AppResult<Response> {
    state.db().complete_task(task_id)?;
    let mut session = Session::from_jar(&jar);
    session.flash(TASK_COMPLETED);
    Ok((session.save(jar), Redirect::to("/tasks")).into_response())
}

/// `GET /delete/{task_id}/`
///
/// A missing task is reported the same way as a deleted one.
async fn delete_task(
    State(state): State<AppState>,
    Path(task_id): Path<i64>,
    jar: SignedCookieJar,
) -> AppResult<Response> {
    state.db().delete_task(task_id)?;
    let mut session = Session::from_jar(&jar);
    session.flash(TASK_DELETED);
    Ok((session.save(jar), Redirect::to("/tasks")).into_response())
}

/// Build the router with all routes.
pub fn build_router(state: AppState) -> Router {
    let guarded = Router::new()
        .route("/tasks", get(tasks_page))
        .route("/add/", post(add_task))
        .route("/complete/{task_id}/", get(complete_task))
        .route("/delete/{task_id}/", get(delete_task))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_login));

    Router::new()
        .route("/", get(login_page).post(login_submit))
        .route("/logout", get(logout))
        .route("/health", get(health))
        .merge(guarded)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Handle for a running server.
pub struct ServerHandle {
    addr: SocketAddr,
    shutdown_tx: Option<oneshot::Sender<()>>,
    task: JoinHandle<()>,
}

impl ServerHandle {
    /// Address the server is bound to.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Stop accepting connections and wait for in-flight requests.
    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Err(e) = self.task.await {
            tracing::error!("Server task failed: {}", e);
        }
    }
}

/// Bind and start serving in the background.
///
/// Port 0 binds an ephemeral port; see [`ServerHandle::addr`].
pub async fn start_server(state: AppState, host: &str, port: u16) -> anyhow::Result<ServerHandle> {
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind((host, port)).await?;
    let addr = listener.local_addr()?;

    info!("Listening on http://{}", addr);

    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

    let task = tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app)
            .with_graceful_shutdown(async {
                let _ = shutdown_rx.await;
                info!("Server shutting down");
            })
            .await
        {
            tracing::error!("Server error: {}", e);
        }
    });

    Ok(ServerHandle {
        addr,
        shutdown_tx: Some(shutdown_tx),
        task,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    #[test]
    fn test_health_response_serialization() {
        let response = HealthResponse {
            status: "healthy",
            version: "0.1.0",
        };
        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("healthy"));
        assert!(json.contains("0.1.0"));
    }

    #[test]
    fn from_config_rejects_short_secret() {
        let dir = TempDir::new().unwrap();
        let db = Arc::new(Database::open(dir.path().join("tasks.db")).unwrap());
        let mut config = Config::default();
        config.server.secret_key = Some("short".into());

        assert!(AppState::from_config(db, &config).is_err());
    }

    #[tokio::test]
    async fn serves_health_over_tcp_and_shuts_down() {
        let dir = TempDir::new().unwrap();
        let db = Arc::new(Database::open(dir.path().join("tasks.db")).unwrap());
        let state = AppState::new(db, AuthConfig::default(), Key::generate(), None);

        let handle = start_server(state, "127.0.0.1", 0).await.unwrap();
        assert_ne!(handle.addr().port(), 0);

        let mut stream = tokio::net::TcpStream::connect(handle.addr()).await.unwrap();
        stream
            .write_all(b"GET /health HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n")
            .await
            .unwrap();
        let mut response = String::new();
        stream.read_to_string(&mut response).await.unwrap();

        assert!(response.starts_with("HTTP/1.1 200"));
        assert!(response.contains("healthy"));

        handle.shutdown().await;
    }
}
