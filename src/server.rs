//! HTTP upload boundary.
//!
//! Two routes:
//!
//! | Route            | Response |
//! |------------------|----------|
//! | `GET /`          | HTML upload form |
//! | `POST /generate` | multipart field `file` → `application/pdf` attachment, or `Error: …` text |
//!
//! Client mistakes (no file, not a spreadsheet, identifier column missing,
//! unsupported identifier under the abort policy) answer 400; everything
//! else answers 500. A successful response carries the number of left-out
//! rows in `X-Skipped-Rows`.
//!
//! Each upload is one independent run on tokio's blocking pool; runs share
//! only the read-only [`RunConfig`].

use crate::config::RunConfig;
use crate::output::RunOutput;
use crate::run;
use axum::{
    extract::{DefaultBodyLimit, Multipart, State},
    http::{header, HeaderName, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

/// Response header carrying the skipped-row count.
pub const X_SKIPPED_ROWS: &str = "x-skipped-rows";

/// Default upload limit: 16 MiB.
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 16 * 1024 * 1024;

const UPLOAD_FORM: &str = r#"<!doctype html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <title>UPC to PDF</title>
</head>
<body>
  <h1>Generate barcode sheet</h1>
  <form action="/generate" method="post" enctype="multipart/form-data">
    <input type="file" name="file" accept=".xlsx,.xlsm,.xlsb,.xls,.ods">
    <button type="submit">Generate PDF</button>
  </form>
</body>
</html>
"#;

#[derive(Clone)]
struct AppState {
    config: Arc<RunConfig>,
}

/// Build the router. `max_upload_bytes` caps the request body.
pub fn router(config: Arc<RunConfig>, max_upload_bytes: usize) -> Router {
    Router::new()
        .route("/", get(upload_form))
        .route("/generate", post(generate_pdf))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(TraceLayer::new_for_http())
        .with_state(AppState { config })
}

/// Bind `addr` and serve until the process is stopped.
pub async fn serve(
    addr: SocketAddr,
    config: RunConfig,
    max_upload_bytes: usize,
) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Listening on http://{}", listener.local_addr()?);
    axum::serve(listener, router(Arc::new(config), max_upload_bytes)).await
}

async fn upload_form() -> Html<&'static str> {
    Html(UPLOAD_FORM)
}

async fn generate_pdf(State(state): State<AppState>, mut multipart: Multipart) -> Response {
    let (file_name, bytes) = match file_field(&mut multipart).await {
        Ok(Some(upload)) => upload,
        Ok(None) => return error_text(StatusCode::BAD_REQUEST, "No file uploaded."),
        Err(e) => return error_text(e.status(), &e.body_text()),
    };
    if file_name.is_empty() {
        return error_text(StatusCode::BAD_REQUEST, "No file selected.");
    }

    let config = Arc::clone(&state.config);
    let result = tokio::task::spawn_blocking(move || {
        run::generate_from_bytes(&bytes, &file_name, &config)
    })
    .await;

    match result {
        Ok(Ok(output)) => pdf_attachment(output),
        Ok(Err(e)) => {
            let status = if e.is_client_error() {
                StatusCode::BAD_REQUEST
            } else {
                error!("Run failed: {}", e);
                StatusCode::INTERNAL_SERVER_ERROR
            };
            error_text(status, &e.to_string())
        }
        Err(e) => {
            error!("Run task panicked or was cancelled: {}", e);
            error_text(StatusCode::INTERNAL_SERVER_ERROR, "Internal error")
        }
    }
}

/// The first multipart field named `file`, as (file name, bytes).
async fn file_field(
    multipart: &mut Multipart,
) -> Result<Option<(String, Vec<u8>)>, axum::extract::multipart::MultipartError> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some("file") {
            continue;
        }
        let file_name = field.file_name().unwrap_or_default().to_string();
        let bytes = field.bytes().await?;
        return Ok(Some((file_name, bytes.to_vec())));
    }
    Ok(None)
}

fn pdf_attachment(output: RunOutput) -> Response {
    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", output.file_name),
            ),
            (
                HeaderName::from_static(X_SKIPPED_ROWS),
                output.report.skipped_count().to_string(),
            ),
        ],
        output.pdf,
    )
        .into_response()
}

fn error_text(status: StatusCode, message: &str) -> Response {
    (status, format!("Error: {message}")).into_response()
}
