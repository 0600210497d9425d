// Student Roster - Web Server
// REST API with Axum over one shared roster session

use anyhow::Context;
use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, MutexGuard};
use tower_http::cors::CorsLayer;
use tower_http::services::ServeFile;
use tracing::{error, info};
use student_roster::{
    logging, source::is_remote, source_from_location, DocumentSource, QuickXmlReader, RosterConfig, RosterError,
    RosterSession, SortDirective, SortKey, Student, StudentForm,
};

/// Shared application state
#[derive(Clone)]
struct AppState {
    session: Arc<Mutex<RosterSession>>,
    source: Arc<dyn DocumentSource>,
}

impl AppState {
    fn new(session: RosterSession, source: Arc<dyn DocumentSource>) -> Self {
        Self {
            session: Arc::new(Mutex::new(session)),
            source,
        }
    }

    /// Lock the session, recovering it from a poisoned mutex
    fn session(&self) -> MutexGuard<'_, RosterSession> {
        self.session.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// API Response wrapper
#[derive(Serialize)]
struct ApiResponse<T> {
    success: bool,
    data: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    status: String,
}

impl<T> ApiResponse<T> {
    fn ok(data: T, status: &str) -> Self {
        Self {
            success: true,
            data,
            error: None,
            status: status.to_string(),
        }
    }

    fn err(data: T, error: &RosterError, status: &str) -> Self {
        Self {
            success: false,
            data,
            error: Some(error.to_string()),
            status: status.to_string(),
        }
    }
}

/// GET /api/students query string
#[derive(Debug, Default, Deserialize)]
struct ViewParams {
    q: Option<String>,
    sort: Option<String>,
    dir: Option<String>,
}

#[derive(Serialize)]
struct ViewResponse {
    query: String,
    sort: SortDirective,
    total: usize,
    students: Vec<Student>,
}

fn view_response(session: &RosterSession) -> ViewResponse {
    ViewResponse {
        query: session.query().to_string(),
        sort: session.directive(),
        total: session.store().len(),
        students: session.visible().into_iter().cloned().collect(),
    }
}

fn requested_directive(params: &ViewParams, current: SortDirective) -> Result<SortDirective, RosterError> {
    let mut directive = current;
    if let Some(raw) = params.sort.as_deref() {
        directive.key = raw.parse()?;
    }
    if let Some(raw) = params.dir.as_deref() {
        directive.direction = raw.parse()?;
    }
    Ok(directive)
}

fn error_status(err: &RosterError) -> StatusCode {
    match err {
        RosterError::DuplicateIdentifier(_) => StatusCode::CONFLICT,
        RosterError::UnknownSortKey(_) | RosterError::UnknownSortDirection(_) => StatusCode::BAD_REQUEST,
        RosterError::Parse { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        _ => StatusCode::BAD_GATEWAY,
    }
}

// ============================================================================
// API Handlers
// ============================================================================

/// GET /api/health - Health check
async fn health_check() -> impl IntoResponse {
    Json(ApiResponse::ok("OK", ""))
}

/// GET /api/students - Projected view.
///
/// `q`, `sort` and `dir` are not just filters for this response: they are
/// stored in the shared session the way typing in the search box or picking a
/// column would be, and later requests see them. A bad `sort` or `dir` is
/// rejected with 400 before anything is stored.
async fn list_students(State(state): State<AppState>, Query(params): Query<ViewParams>) -> Response {
    let mut session = state.session();

    let directive = match requested_directive(&params, session.directive()) {
        Ok(directive) => directive,
        Err(err) => {
            let status = session.status().to_string();
            return (
                error_status(&err),
                Json(ApiResponse::err(view_response(&session), &err, &status)),
            )
                .into_response();
        }
    };

    if let Some(q) = params.q {
        session.set_query(q);
    }
    session.set_directive(directive);

    let status = session.status().to_string();
    (StatusCode::OK, Json(ApiResponse::ok(view_response(&session), &status))).into_response()
}

/// POST /api/students - Append from the add form
async fn add_student(State(state): State<AppState>, Json(form): Json<StudentForm>) -> Response {
    let mut session = state.session();

    // `add` borrows the session, so resolve the outcome before reading status
    let outcome = session.add(&form).cloned();
    let status = session.status().to_string();

    match outcome {
        Ok(student) => (StatusCode::CREATED, Json(ApiResponse::ok(Some(student), &status))).into_response(),
        Err(err) => (
            error_status(&err),
            Json(ApiResponse::<Option<Student>>::err(None, &err, &status)),
        )
            .into_response(),
    }
}

/// POST /api/sort/:key - Column header click
async fn click_sort(State(state): State<AppState>, Path(key): Path<String>) -> Response {
    let mut session = state.session();

    match key.parse::<SortKey>() {
        Ok(key) => {
            session.click_sort(key);
            let status = session.status().to_string();
            (StatusCode::OK, Json(ApiResponse::ok(view_response(&session), &status))).into_response()
        }
        Err(err) => {
            let status = session.status().to_string();
            (
                error_status(&err),
                Json(ApiResponse::err(view_response(&session), &err, &status)),
            )
                .into_response()
        }
    }
}

/// GET /api/status - Latest status line
async fn get_status(State(state): State<AppState>) -> impl IntoResponse {
    let session = state.session();
    Json(ApiResponse::ok(session.store().len(), session.status()))
}

/// POST /api/reload - Load the configured document again
async fn reload(State(state): State<AppState>) -> Response {
    let worker = state.clone();
    let joined = tokio::task::spawn_blocking(move || {
        // fetch before locking so other requests are not stuck behind the network
        let fetched = worker.source.fetch();
        let loaded = worker
            .session()
            .load_fetched(fetched, &worker.source.describe(), &QuickXmlReader::new());
        loaded.map(|_| ())
    })
    .await;

    let session = state.session();
    let status = session.status().to_string();
    match joined {
        Ok(Ok(())) => (StatusCode::OK, Json(ApiResponse::ok(session.store().len(), &status))).into_response(),
        Ok(Err(err)) => (
            error_status(&err),
            Json(ApiResponse::err(session.store().len(), &err, &status)),
        )
            .into_response(),
        Err(join_err) => {
            error!("reload task failed: {}", join_err);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// GET /api/export - Whole catalog as a download
async fn export(State(state): State<AppState>) -> Response {
    let export = state.session().export();

    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "application/xml".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", export.filename),
            ),
        ],
        export.document,
    )
        .into_response()
}

/// `document` is the local input file, republished as-is at /students.xml
fn build_router(state: AppState, document: Option<&std::path::Path>) -> Router {
    let api_routes = Router::new()
        .route("/health", get(health_check))
        .route("/students", get(list_students).post(add_student))
        .route("/sort/:key", post(click_sort))
        .route("/status", get(get_status))
        .route("/reload", post(reload))
        .route("/export", get(export))
        .with_state(state);

    let router = Router::new().nest("/api", api_routes);
    let router = match document {
        Some(path) => router.route_service("/students.xml", ServeFile::new(path)),
        None => router,
    };
    router.layer(CorsLayer::permissive())
}

// ============================================================================
// Main Server
// ============================================================================

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = RosterConfig::load(None).context("Failed to load configuration")?;
    logging::init(&config.log_filter);

    println!("🌐 Student Roster - Web Server");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    let source: Arc<dyn DocumentSource> = Arc::from(source_from_location(&config.source)?);

    // the first load may block on a remote fetch, keep it off the runtime threads
    let startup = source.clone();
    let session = tokio::task::spawn_blocking(move || {
        let mut session = RosterSession::new();
        let _ = session.load(startup.as_ref(), &QuickXmlReader::new());
        session
    })
    .await
    .context("Initial load task failed")?;
    println!("✓ {}", session.status());

    let document = (!is_remote(&config.source)).then(|| std::path::Path::new(&config.source));
    let app = build_router(AppState::new(session, source), document);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("Failed to bind to {}", config.bind_addr))?;

    info!(addr = %config.bind_addr, "server listening");
    println!("\n🚀 Server running on http://{}", config.bind_addr);
    println!("   API:    /api/students");
    println!("   Export: /api/export");
    println!("\n   Press Ctrl+C to stop\n");

    axum::serve(listener, app).await.context("Server error")?;
    Ok(())
}
