//! HTTP Server for the sales report API.
//!
//! # API Endpoints
//!
//! | Method | Path           | Description                            |
//! |--------|----------------|----------------------------------------|
//! | GET    | `/health`      | Health check                           |
//! | POST   | `/api/report`  | Upload sales files and build a report  |
//! | GET    | `/api/logs`    | SSE stream for real-time logs          |
//!
//! `POST /api/report?mode=debito&discount=true&group_by=name&format=xlsx`
//! takes one or more multipart fields named `file`, concatenated in upload
//! order. The request body limit comes from `Settings::max_upload_bytes`.

use axum::{
    extract::{rejection::QueryRejection, DefaultBodyLimit, Multipart, Query},
    http::{header, Method, StatusCode},
    response::{sse::Event, IntoResponse, Json, Response, Sse},
    routing::{get, post},
    Router,
};
use futures::stream::Stream;
use serde_json::{json, Value};
use std::{convert::Infallible, net::SocketAddr, time::Duration};
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt as _;
use tower_http::cors::CorsLayer;

use super::logs::{log_error, log_info, LOG_BROADCASTER};
use super::types::{error_response, ReportQuery, ReportResponse};
use crate::error::{PipelineError, ServerError, ServerResult, TransformError};
use crate::export::{default_file_name, write_csv, xlsx_bytes, ReportFormat};
use crate::models::{Grouping, Mode};
use crate::parser::{parse_bytes, Table};
use crate::transform::pipeline::{TransformOptions, Transformer};

const XLSX_CONTENT_TYPE: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

/// Build the application router. Report uploads may be up to
/// `max_upload_bytes` long.
pub fn router(max_upload_bytes: usize) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
        .expose_headers([header::CONTENT_TYPE, header::CONTENT_DISPOSITION]);

    Router::new()
        .route("/", get(health))
        .route("/health", get(health))
        .route(
            "/api/report",
            post(create_report).layer(DefaultBodyLimit::max(max_upload_bytes)),
        )
        .route("/api/logs", get(sse_logs))
        .layer(cors)
}

/// Start the HTTP server
pub async fn start_server(port: u16, max_upload_bytes: usize) -> Result<(), Box<dyn std::error::Error>> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    println!("🚀 Sales report server running on http://localhost:{}", port);
    println!("   POST /api/report - Upload sales files");
    println!("   GET  /api/logs   - SSE log stream");
    println!("   GET  /health     - Health check");
    println!("   Upload limit: {} MiB", max_upload_bytes / (1024 * 1024));

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router(max_upload_bytes)).await?;

    Ok(())
}

/// Health check endpoint
async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "salesreport",
        "version": env!("CARGO_PKG_VERSION"),
        "modes": Mode::ALL.iter().map(|m| m.token()).collect::<Vec<_>>(),
        "endpoints": {
            "report": "POST /api/report",
            "logs": "GET /api/logs (SSE)"
        }
    }))
}

/// SSE endpoint for real-time log streaming
async fn sse_logs() -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = LOG_BROADCASTER.subscribe();

    let stream = BroadcastStream::new(rx).filter_map(|result| match result {
        Ok(entry) => {
            let json = serde_json::to_string(&entry).ok()?;
            Some(Ok(Event::default().data(json)))
        }
        Err(_) => None,
    });

    Sse::new(stream).keep_alive(
        axum::response::sse::KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}

/// Report upload endpoint
async fn create_report(
    query: Result<Query<ReportQuery>, QueryRejection>,
    mut multipart: Multipart,
) -> ServerResult<ReportPayload> {
    let Query(query) = query.map_err(|e| ServerError::BadRequest(e.body_text()))?;
    let mut files: Vec<(String, Vec<u8>)> = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ServerError::BadRequest(format!("Multipart error: {}", e)))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let name = field
            .file_name()
            .map(|s| s.to_string())
            .ok_or_else(|| ServerError::BadRequest("Uploaded file has no name".to_string()))?;
        let bytes = field
            .bytes()
            .await
            .map_err(|e| ServerError::BadRequest(format!("Read error: {}", e)))?;
        log_info(format!("📄 Upload: {} ({} bytes)", name, bytes.len()));
        files.push((name, bytes.to_vec()));
    }

    build_report(&query, files)
}

/// A report ready to be sent back.
#[derive(Debug)]
pub enum ReportPayload {
    Json(Box<ReportResponse>),
    File {
        file_name: String,
        content_type: &'static str,
        bytes: Vec<u8>,
    },
}

impl IntoResponse for ReportPayload {
    fn into_response(self) -> Response {
        match self {
            ReportPayload::Json(response) => Json(*response).into_response(),
            ReportPayload::File {
                file_name,
                content_type,
                bytes,
            } => {
                let disposition = format!("attachment; filename=\"{}\"", file_name);
                (
                    [
                        (header::CONTENT_TYPE, content_type.to_string()),
                        (header::CONTENT_DISPOSITION, disposition),
                    ],
                    bytes,
                )
                    .into_response()
            }
        }
    }
}

/// Run the report for uploaded files.
///
/// The mode is checked before any file is parsed.
pub fn build_report(query: &ReportQuery, files: Vec<(String, Vec<u8>)>) -> ServerResult<ReportPayload> {
    let mode: Mode = query.mode.parse().map_err(PipelineError::from)?;
    let grouping = match &query.group_by {
        Some(token) => token.parse::<Grouping>().map_err(ServerError::BadRequest)?,
        None => Grouping::default(),
    };
    let format = match &query.format {
        Some(token) => token
            .parse::<ReportFormat>()
            .map_err(|e| ServerError::BadRequest(e.to_string()))?,
        None => ReportFormat::Json,
    };

    if files.is_empty() {
        return Err(PipelineError::NoInputFiles.into());
    }

    let mut tables = Vec::with_capacity(files.len());
    for (name, bytes) in &files {
        tables.push(parse_bytes(bytes, name).map_err(PipelineError::from)?);
    }
    let table = Table::concat(tables);

    let options = TransformOptions::new(mode)
        .with_discount(query.discount)
        .with_grouping(grouping);
    let output = Transformer::new(options.clone())
        .run(&table)
        .map_err(PipelineError::from)?;

    let file_name = default_file_name(mode, format);
    let payload = match format {
        ReportFormat::Json => {
            ReportPayload::Json(Box::new(ReportResponse::new(output, &options, &table.sources)))
        }
        ReportFormat::Xlsx => ReportPayload::File {
            file_name,
            content_type: XLSX_CONTENT_TYPE,
            bytes: xlsx_bytes(&output.report).map_err(PipelineError::from)?,
        },
        ReportFormat::Csv => {
            let mut bytes = Vec::new();
            write_csv(&output.report, &mut bytes).map_err(PipelineError::from)?;
            ReportPayload::File {
                file_name,
                content_type: "text/csv; charset=utf-8",
                bytes,
            }
        }
    };

    log_info(format!("Report '{}' sent as {}", mode.display_name(), format));
    Ok(payload)
}

/// HTTP status for an error
pub fn status_code(err: &ServerError) -> StatusCode {
    match err {
        ServerError::BadRequest(_) => StatusCode::BAD_REQUEST,
        ServerError::Pipeline(PipelineError::Table(_)) => StatusCode::BAD_REQUEST,
        ServerError::Pipeline(PipelineError::NoInputFiles) => StatusCode::BAD_REQUEST,
        ServerError::Pipeline(PipelineError::Transform(e)) => match e {
            TransformError::MissingColumns { .. } | TransformError::InvalidMode(_) => {
                StatusCode::BAD_REQUEST
            }
            TransformError::SchemaProjection { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        },
        ServerError::Pipeline(PipelineError::Export(_)) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let message = self.to_string();
        log_error(&message);
        (status_code(&self), Json(error_response(&message))).into_response()
    }
}
