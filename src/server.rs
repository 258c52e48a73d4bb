#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

//! Collects networked grading reports.
//!
//! `POST /` takes a JSON object, stamps it with a `received` block and
//! appends it as one line to a JSON-lines log. `GET /` reports uptime and
//! counters.

use std::{
    net::SocketAddr,
    path::PathBuf,
    sync::Arc,
    time::{SystemTime, UNIX_EPOCH},
};

use anyhow::{Context, Result};
use axum::{
    Json, Router,
    extract::{ConnectInfo, State},
    http::{HeaderMap, StatusCode},
    routing::get,
};
use serde::Serialize;
use serde_json::{Value, json};
use tokio::{io::AsyncWriteExt, net::TcpListener, sync::Mutex};
use uuid::Uuid;

use crate::constants::DEFAULT_SERVER_PORT;

/// Settings of the ingestion server.
#[derive(Clone, Debug)]
pub struct ServerConfig {
    /// interface to bind
    pub host:              String,
    /// port to listen on
    pub port:              u16,
    /// JSON-lines file reports are appended to
    pub log:               PathBuf,
    /// trust `X-Forwarded-For` for the client address
    pub check_x_forwarded: bool,
    /// stamped onto every stored report when set
    pub semester:          Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host:              "0.0.0.0".to_string(),
            port:              DEFAULT_SERVER_PORT,
            log:               PathBuf::from("reports.jsonl"),
            check_x_forwarded: false,
            semester:          None,
        }
    }
}

/// Answer to `GET /`.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerStatus {
    /// crate name
    pub name:          String,
    /// crate version
    pub version:       String,
    /// start time, milliseconds since the epoch
    pub up_since:      u64,
    /// reports stored
    pub upload_count:  u64,
    /// reports that could not be stored
    pub failure_count: u64,
    /// time of the last stored report
    pub last_upload:   Option<u64>,
}

/// Shared server state.
struct AppState {
    /// settings
    config: ServerConfig,
    /// counters; the lock also serializes appends to the log
    status: Mutex<ServerStatus>,
}

/// Milliseconds since the epoch.
fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}

/// Client address, honoring `X-Forwarded-For` when configured.
fn client_ip(config: &ServerConfig, headers: &HeaderMap, peer: SocketAddr) -> String {
    if config.check_x_forwarded {
        let forwarded = headers
            .get("x-forwarded-for")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .map(str::trim)
            .filter(|v| !v.is_empty());
        if let Some(ip) = forwarded {
            return ip.to_string();
        }
    }
    peer.ip().to_string()
}

/// Appends one line to the log.
async fn append_line(log: &PathBuf, line: &str) -> Result<()> {
    let mut file = tokio::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(log)
        .await
        .with_context(|| format!("Could not open {}", log.display()))?;
    file.write_all(format!("{line}\n").as_bytes())
        .await
        .with_context(|| format!("Could not append to {}", log.display()))?;
    Ok(())
}

/// `POST /`
async fn receive(
    State(state): State<Arc<AppState>>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    body: String,
) -> (StatusCode, &'static str) {
    let Ok(Value::Object(mut report)) = serde_json::from_str::<Value>(&body) else {
        return (StatusCode::BAD_REQUEST, "Invalid JSON");
    };

    let time = now_millis();
    let mut received = json!({
        "id": Uuid::new_v4().to_string(),
        "time": time,
        "ip": client_ip(&state.config, &headers, peer),
    });
    if let (Some(semester), Some(received)) = (&state.config.semester, received.as_object_mut()) {
        received.insert("semester".to_string(), Value::String(semester.clone()));
    }
    report.insert("received".to_string(), received);

    let line = Value::Object(report).to_string();
    let mut status = state.status.lock().await;
    match append_line(&state.config.log, &line).await {
        Ok(()) => {
            status.upload_count += 1;
            status.last_upload = Some(time);
            (StatusCode::OK, "")
        }
        Err(e) => {
            tracing::warn!("Couldn't save upload: {e:#}");
            status.failure_count += 1;
            (StatusCode::INTERNAL_SERVER_ERROR, "")
        }
    }
}

/// `GET /`
async fn status(State(state): State<Arc<AppState>>) -> Json<ServerStatus> {
    Json(state.status.lock().await.clone())
}

/// Builds the router.
pub fn router(config: ServerConfig) -> Router {
    let state = Arc::new(AppState {
        config,
        status: Mutex::new(ServerStatus {
            name:          env!("CARGO_PKG_NAME").to_string(),
            version:       env!("CARGO_PKG_VERSION").to_string(),
            up_since:      now_millis(),
            upload_count:  0,
            failure_count: 0,
            last_upload:   None,
        }),
    });

    Router::new()
        .route("/", get(status).post(receive))
        .with_state(state)
}

/// Serves on an already bound listener until the process ends.
pub async fn serve_on(listener: TcpListener, config: ServerConfig) -> Result<()> {
    let app = router(config).into_make_service_with_connect_info::<SocketAddr>();
    axum::serve(listener, app)
        .await
        .context("Report server stopped")
}

/// Binds the configured address and serves.
pub async fn serve(config: ServerConfig) -> Result<()> {
    let addr = format!("{}:{}", config.host, config.port);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Could not bind {addr}"))?;

    tracing::info!(
        "Collecting reports on {addr}, appending to {}",
        config.log.display()
    );
    serve_on(listener, config).await
}
