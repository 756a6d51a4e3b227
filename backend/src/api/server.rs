//! HTTP server for the payroll dashboard.
//!
//! # API Endpoints
//!
//! | Method | Path                  | Description                          |
//! |--------|-----------------------|--------------------------------------|
//! | GET    | `/health`             | Health check                         |
//! | POST   | `/api/upload`         | Ingest the first sheet of a file     |
//! | POST   | `/api/upload/sheets`  | Ingest every sheet of a workbook     |
//! | POST   | `/api/convert`        | Preeti → Unicode conversion          |
//! | GET    | `/api/session`        | Current session and theme            |
//! | POST   | `/api/session`        | Sign a user in                       |
//! | DELETE | `/api/session`        | Sign out                             |
//! | PUT    | `/api/session/theme`  | Set the theme                        |
//! | GET    | `/api/logs`           | SSE stream for real-time logs        |
//!
//! Uploads accept `?convertLegacy=true` to transliterate name, designation
//! and department of accepted records.

use axum::{
    extract::{DefaultBodyLimit, Multipart, Query, State},
    http::{header, Method, StatusCode},
    response::{sse::Event, IntoResponse, Json, Response, Sse},
    routing::{get, post, put},
    Router,
};
use futures::stream::Stream;
use serde::Deserialize;
use serde_json::{json, Value};
use std::{convert::Infallible, net::SocketAddr, sync::Arc, time::Duration};
use tokio::sync::Mutex;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt as _;
use tower_http::cors::CorsLayer;
use tower_http::limit::RequestBodyLimitLayer;

use super::logs::{log_error, LOG_BROADCASTER};
use super::types::{error_response, ConvertRequest, ConvertResponse, ThemeRequest, UploadResponse};
use crate::config::AppConfig;
use crate::error::{ServerResult, StoreError, StoreResult};
use crate::ingest::{parse, parse_all_sheets, validate_structure, IngestOptions, UploadFile};
use crate::models::UploadResult;
use crate::session::{FileStore, SessionContext, User};

type ApiError = (StatusCode, Json<Value>);

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub session: Arc<Mutex<SessionContext<FileStore>>>,
}

impl AppState {
    pub fn new(session: SessionContext<FileStore>) -> Self {
        Self {
            session: Arc::new(Mutex::new(session)),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UploadQuery {
    #[serde(default)]
    convert_legacy: bool,
}

impl UploadQuery {
    fn options(&self) -> IngestOptions {
        IngestOptions {
            convert_legacy: self.convert_legacy,
        }
    }
}

/// Build the application router.
pub fn router(state: AppState, config: &AppConfig) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
        .expose_headers([header::CONTENT_TYPE]);

    Router::new()
        .route("/", get(health))
        .route("/health", get(health))
        .route("/api/upload", post(upload))
        .route("/api/upload/sheets", post(upload_sheets))
        .route("/api/convert", post(convert))
        .route(
            "/api/session",
            get(get_session).post(sign_in).delete(sign_out),
        )
        .route("/api/session/theme", put(set_theme))
        .route("/api/logs", get(sse_logs))
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(config.max_upload_bytes))
        .layer(cors)
        .with_state(state)
}

/// Start the HTTP server
pub async fn start_server(config: AppConfig) -> ServerResult<()> {
    let session = SessionContext::load(FileStore::new(&config.state_dir))?;
    let app = router(AppState::new(session), &config);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!(
        port = config.port,
        state_dir = %config.state_dir.display(),
        "payroll server running on http://localhost:{}",
        config.port
    );

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Health check endpoint
async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "payroll",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "upload": "POST /api/upload",
            "uploadSheets": "POST /api/upload/sheets",
            "convert": "POST /api/convert",
            "session": "GET|POST|DELETE /api/session",
            "logs": "GET /api/logs (SSE)"
        }
    }))
}

/// SSE endpoint for real-time log streaming
async fn sse_logs() -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = LOG_BROADCASTER.subscribe();

    // lagged receivers skip missed entries
    let stream = BroadcastStream::new(rx).filter_map(|result| {
        let entry = result.ok()?;
        let json = serde_json::to_string(&entry).ok()?;
        Some(Ok(Event::default().data(json)))
    });

    Sse::new(stream).keep_alive(
        axum::response::sse::KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}

async fn upload(Query(query): Query<UploadQuery>, multipart: Multipart) -> Response {
    let file = match read_upload(multipart).await {
        Ok(file) => file,
        Err(err) => return err.into_response(),
    };
    ingest_upload(file, query.options()).await
}

async fn upload_sheets(Query(query): Query<UploadQuery>, multipart: Multipart) -> Response {
    let file = match read_upload(multipart).await {
        Ok(file) => file,
        Err(err) => return err.into_response(),
    };
    ingest_workbook(file, query.options()).await
}

/// Pull the `file` field out of a multipart body.
async fn read_upload(mut multipart: Multipart) -> Result<UploadFile, ApiError> {
    while let Some(field) = multipart.next_field().await.map_err(|e| {
        (StatusCode::BAD_REQUEST, Json(error_response(&format!("Multipart error: {}", e))))
    })? {
        if field.name() != Some("file") {
            continue;
        }

        let name = field.file_name().unwrap_or("upload").to_string();
        let bytes = field.bytes().await.map_err(|e| {
            (StatusCode::BAD_REQUEST, Json(error_response(&format!("Read error: {}", e))))
        })?;
        return Ok(UploadFile::from_bytes(name, bytes.to_vec()));
    }

    Err((StatusCode::BAD_REQUEST, Json(error_response("No file provided"))))
}

/// Structure check, then first-sheet ingestion.
async fn ingest_upload(file: UploadFile, options: IngestOptions) -> Response {
    let name = file.name().to_string();
    if let Err(rejected) = check_upload(&file) {
        return rejected;
    }

    match parse(file, &options).await {
        Ok(result) => Json(UploadResponse::new(name, result)).into_response(),
        Err(e) => ingest_failure(e),
    }
}

/// Structure check, then every-sheet ingestion.
async fn ingest_workbook(file: UploadFile, options: IngestOptions) -> Response {
    let name = file.name().to_string();
    if let Err(rejected) = check_upload(&file) {
        return rejected;
    }

    match parse_all_sheets(file, &options).await {
        Ok(result) => Json(UploadResponse::new(name, result)).into_response(),
        Err(e) => ingest_failure(e),
    }
}

fn check_upload(file: &UploadFile) -> Result<(), Response> {
    let check = validate_structure(file);
    if check.valid {
        return Ok(());
    }

    log_error(format!("{}: {}", file.name(), check.message));
    let body = UploadResponse::new(file.name(), UploadResult::structural_failure(check.message));
    Err((StatusCode::BAD_REQUEST, Json(body)).into_response())
}

fn ingest_failure(err: crate::error::IngestError) -> Response {
    log_error(err.to_string());
    (StatusCode::UNPROCESSABLE_ENTITY, Json(error_response(&err.to_string()))).into_response()
}

async fn convert(Json(request): Json<ConvertRequest>) -> Json<ConvertResponse> {
    Json(ConvertResponse::for_text(request.text))
}

async fn get_session(State(state): State<AppState>) -> Json<Value> {
    let session = state.session.lock().await;
    Json(json!(session.view()))
}

async fn sign_in(
    State(state): State<AppState>,
    Json(user): Json<User>,
) -> Result<Json<Value>, ApiError> {
    update_session(&state, move |session| session.sign_in(user)).await
}

async fn sign_out(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    update_session(&state, |session| session.sign_out()).await
}

async fn set_theme(
    State(state): State<AppState>,
    Json(request): Json<ThemeRequest>,
) -> Result<Json<Value>, ApiError> {
    update_session(&state, move |session| session.set_theme(request.theme)).await
}

/// Apply a persisting session change on the blocking pool and return the
/// new session view. The lock is held until the store write finishes.
async fn update_session<F>(state: &AppState, change: F) -> Result<Json<Value>, ApiError>
where
    F: FnOnce(&mut SessionContext<FileStore>) -> StoreResult<()> + Send + 'static,
{
    let mut session = state.session.clone().lock_owned().await;

    let view = tokio::task::spawn_blocking(move || {
        change(&mut *session)?;
        Ok::<_, StoreError>(session.view())
    })
    .await
    .map_err(|e| {
        log_error(format!("Session task failed: {}", e));
        (StatusCode::INTERNAL_SERVER_ERROR, Json(error_response(&e.to_string())))
    })?
    .map_err(store_failure)?;

    Ok(Json(json!(view)))
}

fn store_failure(err: StoreError) -> ApiError {
    log_error(err.to_string());
    (StatusCode::INTERNAL_SERVER_ERROR, Json(error_response(&err.to_string())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::Theme;

    async fn body_json(response: Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn state_in(dir: &std::path::Path) -> AppState {
        AppState::new(SessionContext::load(FileStore::new(dir)).unwrap())
    }

    const SALARY_CSV: &str = "l;=g++,gfdy/,kfg g+=,b/\n1,Ram,301234567,15\n2,Sita,301234567,10\n";

    #[tokio::test]
    async fn test_upload_rejects_bad_extension() {
        let file = UploadFile::from_bytes("salary.pdf", b"%PDF".to_vec());
        let response = ingest_upload(file, IngestOptions::default()).await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = body_json(response).await;
        assert_eq!(json["success"], false);
        assert_eq!(json["errors"][0]["row"], 0);
        assert_eq!(
            json["errors"][0]["message"],
            "Invalid file type. Please upload an Excel file (.xlsx, .xls) or CSV file."
        );
    }

    #[tokio::test]
    async fn test_upload_csv() {
        let file = UploadFile::from_bytes("salary.csv", SALARY_CSV.as_bytes().to_vec());
        let response = ingest_upload(file, IngestOptions::default()).await;

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["fileName"], "salary.csv");
        assert_eq!(json["success"], true);
        assert_eq!(json["totalRows"], 2);
        assert_eq!(json["validRows"], 1);
        assert_eq!(json["duplicates"], 1);
        assert_eq!(json["data"][0]["name"], "Ram");
    }

    #[tokio::test]
    async fn test_upload_sheets_csv_is_one_sheet() {
        let file = UploadFile::from_bytes("salary.csv", SALARY_CSV.as_bytes().to_vec());
        let response = ingest_workbook(file, IngestOptions::default()).await;

        let json = body_json(response).await;
        assert_eq!(json["totalSheets"], 1);
        assert_eq!(json["sheets"][0]["sheetName"], "Sheet1");
    }

    #[tokio::test]
    async fn test_corrupt_workbook_is_unprocessable() {
        let file = UploadFile::from_bytes("salary.xlsx", b"not a workbook".to_vec());
        let response = ingest_upload(file, IngestOptions::default()).await;
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_convert_endpoint() {
        let Json(response) = convert(Json(ConvertRequest { text: "sf".into() })).await;
        assert_eq!(response.converted, "का");
        assert!(response.legacy);
    }

    #[tokio::test]
    async fn test_session_endpoints() {
        let dir = tempfile::tempdir().unwrap();
        let state = state_in(dir.path());

        let user = User {
            id: "u-1".into(),
            username: "sita".into(),
            full_name: None,
            role: "admin".into(),
        };
        let Json(view) = sign_in(State(state.clone()), Json(user)).await.unwrap();
        assert_eq!(view["isAuthenticated"], true);

        let Json(view) = set_theme(State(state.clone()), Json(ThemeRequest { theme: Theme::Dark }))
            .await
            .unwrap();
        assert_eq!(view["theme"], "dark");

        // a fresh state over the same directory sees the persisted session
        let Json(view) = get_session(State(state_in(dir.path()))).await;
        assert_eq!(view["user"]["username"], "sita");
        assert_eq!(view["theme"], "dark");

        let Json(view) = sign_out(State(state)).await.unwrap();
        assert_eq!(view["isAuthenticated"], false);
        assert_eq!(view["theme"], "dark");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_concurrent_session_writes_persist() {
        let dir = tempfile::tempdir().unwrap();
        let state = state_in(dir.path());

        let user = User {
            id: "u-2".into(),
            username: "hari".into(),
            full_name: Some("Hari Thapa".into()),
            role: "accountant".into(),
        };
        let (signed_in, themed) = tokio::join!(
            sign_in(State(state.clone()), Json(user)),
            set_theme(State(state.clone()), Json(ThemeRequest { theme: Theme::Dark })),
        );
        signed_in.unwrap();
        themed.unwrap();

        let Json(live) = get_session(State(state)).await;
        let Json(reloaded) = get_session(State(state_in(dir.path()))).await;
        assert_eq!(reloaded["user"], live["user"]);
        assert_eq!(reloaded["theme"], "dark");
    }

    #[tokio::test]
    async fn test_session_store_failure_is_server_error() {
        let dir = tempfile::tempdir().unwrap();
        // a regular file where the state directory should be
        let blocked = dir.path().join("state");
        std::fs::write(&blocked, b"").unwrap();
        let state = state_in(&blocked);

        let request = ThemeRequest { theme: Theme::Dark };
        let (status, Json(body)) = set_theme(State(state), Json(request)).await.unwrap_err();
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["success"], false);
    }
}
