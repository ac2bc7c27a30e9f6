//! Develop server with live updates via Server-Sent Events.
//!
//! Serves the output directory from disk and streams [`LiveEvent`]s as JSON
//! to connected browsers.
//!
//! [`LiveEvent`]: kiln_core::LiveEvent

use crate::dev::SharedState;
use crate::error::{CliError, Result};
use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{
        sse::{Event, KeepAlive},
        IntoResponse, Response, Sse,
    },
    routing::get,
    Json, Router,
};
use std::convert::Infallible;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio_stream::{wrappers::BroadcastStream, StreamExt};
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tracing::{debug, info};

pub const EVENTS_ROUTE: &str = "/__kiln/events";
pub const STATUS_ROUTE: &str = "/__kiln/status";
pub const CLIENT_ROUTE: &str = "/__kiln/client.js";

const CLIENT_SCRIPT: &str = r#"(() => {
  const source = new EventSource("/__kiln/events");
  source.addEventListener("kiln", (message) => {
    const event = JSON.parse(message.data);
    switch (event.type) {
      case "BuildSucceeded":
      case "StaticQueriesChanged":
        window.location.reload();
        break;
      case "BuildFailed":
        console.error("[kiln] build failed", event.errors);
        break;
    }
  });
})();
"#;

/// Develop server.
pub struct DevServer {
    listener: TcpListener,
    state: SharedState,
}

impl DevServer {
    /// Bind the listening socket.
    ///
    /// Binding happens before the first build so a taken port fails fast.
    pub async fn bind(host: &str, port: u16, state: SharedState) -> Result<Self> {
        let listener = TcpListener::bind((host, port))
            .await
            .map_err(|e| CliError::Server(format!("Failed to bind to {}:{}: {}", host, port, e)))?;
        Ok(Self { listener, state })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Serve until the task is dropped or the listener fails.
    pub async fn serve(self) -> Result<()> {
        if let Ok(addr) = self.listener.local_addr() {
            info!(%addr, out_dir = %self.state.out_dir().display(), "develop server listening");
        }
        axum::serve(self.listener, router(self.state))
            .await
            .map_err(|e| CliError::Server(format!("Server error: {}", e)))
    }
}

/// Build the axum router with all routes.
pub fn router(state: SharedState) -> Router {
    let files = ServeDir::new(state.out_dir().to_path_buf());

    Router::new()
        .route(EVENTS_ROUTE, get(handle_events))
        .route(STATUS_ROUTE, get(handle_status))
        .route(CLIENT_ROUTE, get(handle_client_script))
        .fallback_service(files)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

async fn handle_events(State(state): State<SharedState>) -> Response {
    let Some(rx) = state.subscribe() else {
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            "Live updates are not available until the first build starts",
        )
            .into_response();
    };
    debug!("live update client connected");

    // A lagging client skips what it missed; the next event still reloads it
    let stream = BroadcastStream::new(rx).filter_map(|event| {
        let event = event.ok()?;
        let data = serde_json::to_string(&event).ok()?;
        Some(Ok::<_, Infallible>(Event::default().event("kiln").data(data)))
    });

    Sse::new(stream)
        .keep_alive(KeepAlive::new().interval(Duration::from_secs(15)).text("ping"))
        .into_response()
}

async fn handle_status(State(state): State<SharedState>) -> impl IntoResponse {
    Json(state.status())
}

async fn handle_client_script() -> impl IntoResponse {
    (
        [
            (header::CONTENT_TYPE, "application/javascript"),
            (header::CACHE_CONTROL, "no-cache"),
        ],
        CLIENT_SCRIPT,
    )
}
