//! # HTTP API for Frame Transmission
//!
//! Exposes the encoder, the serial link and the transmission pipeline as a
//! small JSON API, for a browser UI or another service that prepares images.
//!
//! ## Usage
//!
//! ```bash
//! pixelwire serve --listen 0.0.0.0:5000
//! ```
//!
//! ## Routes
//!
//! | Method | Path | Purpose |
//! |--------|------|---------|
//! | GET | `/api/serial/ports` | List host serial devices |
//! | POST | `/api/serial/connect` | Open a port |
//! | POST | `/api/serial/disconnect` | Close the port |
//! | GET | `/api/serial/status` | Connection state |
//! | POST | `/api/frames` | Encode a pixel grid |
//! | POST | `/api/transmission` | Start a paced run |
//! | POST | `/api/transmission/cancel` | Stop the run |
//! | GET | `/api/transmission/log` | Poll progress |

mod handlers;
mod state;

pub use state::{AppState, ServerConfig};

use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::error::PixelwireError;

/// Build the router over shared state.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        // Serial link
        .route("/api/serial/ports", get(handlers::serial::ports))
        .route("/api/serial/connect", post(handlers::serial::connect))
        .route("/api/serial/disconnect", post(handlers::serial::disconnect))
        .route("/api/serial/status", get(handlers::serial::status))
        // Encoding
        .route("/api/frames", post(handlers::frames::encode))
        // Transmission
        .route("/api/transmission", post(handlers::transmission::start))
        .route(
            "/api/transmission/cancel",
            post(handlers::transmission::cancel),
        )
        .route("/api/transmission/log", get(handlers::transmission::log))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the HTTP server.
///
/// ## Example
///
/// ```no_run
/// use pixelwire::server::{serve, ServerConfig};
///
/// # async fn example() -> Result<(), pixelwire::PixelwireError> {
/// let config = ServerConfig {
///     listen_addr: "0.0.0.0:5000".to_string(),
/// };
///
/// serve(config).await?;
/// # Ok(())
/// # }
/// ```
pub async fn serve(config: ServerConfig) -> Result<(), PixelwireError> {
    let app_state = Arc::new(AppState::new(config.clone()));
    let app = router(app_state);

    let listener = tokio::net::TcpListener::bind(&config.listen_addr)
        .await
        .map_err(|e| {
            PixelwireError::Server(format!("Failed to bind to {}: {}", config.listen_addr, e))
        })?;

    info!(listen_addr = %config.listen_addr, "pixelwire HTTP server listening");

    axum::serve(listener, app)
        .await
        .map_err(|e| PixelwireError::Server(format!("Server error: {}", e)))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::{Body, to_bytes},
        http::{Request, StatusCode},
    };
    use serde_json::{Value, json};
    use tower::ServiceExt;

    fn app() -> Router {
        router(Arc::new(AppState::new(ServerConfig {
            listen_addr: "127.0.0.1:0".to_string(),
        })))
    }

    async fn send(app: Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Vec<u8>) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(json) => builder
                .header("content-type", "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, bytes.to_vec())
    }

    #[tokio::test]
    async fn test_status_starts_disconnected() {
        let (status, body) = send(app(), "GET", "/api/serial/status", None).await;
        assert_eq!(status, StatusCode::OK);
        let json: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["connected"], false);
        assert_eq!(json["state"], "disconnected");
    }

    #[tokio::test]
    async fn test_disconnect_when_idle() {
        let (status, body) = send(app(), "POST", "/api/serial/disconnect", None).await;
        assert_eq!(status, StatusCode::OK);
        let json: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["outcome"], "not_connected");
    }

    #[tokio::test]
    async fn test_encode_grid() {
        let body = json!({ "width": 2, "height": 2, "array": [0, 100, 200, 300] });
        let (status, body) = send(app(), "POST", "/api/frames", Some(body)).await;
        assert_eq!(status, StatusCode::OK);

        let json: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["total_frames"], 3);
        assert_eq!(json["data_frames"], 2);
        assert_eq!(json["data_info"]["max_value"], 200);
        assert_eq!(json["frames"][0][0], 0xAA);
        // 300 keeps its low byte
        assert_eq!(json["frames"][2][3], 44);
    }

    #[tokio::test]
    async fn test_encode_rejects_mismatched_grid() {
        let body = json!({ "width": 3, "height": 3, "array": [1, 2, 3] });
        let (status, _) = send(app(), "POST", "/api/frames", Some(body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_transmit_requires_connection() {
        let app = app();
        let body = json!({ "grid": { "width": 1, "height": 1, "array": [7] }, "interval_ms": 0 });
        let (status, _) = send(app.clone(), "POST", "/api/transmission", Some(body)).await;
        assert_eq!(status, StatusCode::CONFLICT);

        let (_, body) = send(app, "GET", "/api/transmission/log", None).await;
        let json: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["total_entries"], 0);
        assert_eq!(json["status"]["state"], "idle");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_port_locked_while_transmitting() {
        use serialport::SerialPort;

        let (_master, slave) = serialport::TTYPort::pair().unwrap();
        let path = slave.name().unwrap();
        let app = app();

        let (status, _) = send(
            app.clone(),
            "POST",
            "/api/serial/connect",
            Some(json!({ "port": path })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        // Long pacing keeps the run in flight after the first frame
        let body = json!({ "grid": { "width": 3, "height": 1, "array": [1, 2, 3] }, "interval_ms": 60000 });
        let (status, _) = send(app.clone(), "POST", "/api/transmission", Some(body)).await;
        assert_eq!(status, StatusCode::ACCEPTED);

        let (status, _) = send(app.clone(), "POST", "/api/serial/disconnect", None).await;
        assert_eq!(status, StatusCode::CONFLICT);

        let (status, _) = send(
            app.clone(),
            "POST",
            "/api/serial/connect",
            Some(json!({ "port": path })),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);

        let (_, body) = send(app.clone(), "GET", "/api/serial/status", None).await;
        let json: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["connected"], true);

        let (_, body) = send(app, "POST", "/api/transmission/cancel", None).await;
        let json: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["cancelled"], true);
    }

    #[tokio::test]
    async fn test_cancel_without_run() {
        let (status, body) = send(app(), "POST", "/api/transmission/cancel", None).await;
        assert_eq!(status, StatusCode::OK);
        let json: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["cancelled"], false);
    }
}
