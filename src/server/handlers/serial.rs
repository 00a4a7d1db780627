//! Serial port API handlers.

use axum::{Json, extract::State};
use serde::Serialize;
use std::sync::Arc;

use crate::error::PixelwireError;
use crate::transport::{self, DisconnectOutcome, LinkStatus, PortInfo, SerialConfig};

use super::super::state::AppState;
use super::{ApiError, api_error, task_error};

/// Response from the ports endpoint.
#[derive(Debug, Serialize)]
pub struct PortsResponse {
    pub ports: Vec<PortInfo>,
}

/// Response from connect and status endpoints.
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub connected: bool,
    #[serde(flatten)]
    pub status: LinkStatus,
}

impl From<LinkStatus> for StatusResponse {
    fn from(status: LinkStatus) -> Self {
        Self {
            connected: status.is_connected(),
            status,
        }
    }
}

/// GET /api/serial/ports - Enumerate host serial devices.
pub async fn ports() -> Result<Json<PortsResponse>, ApiError> {
    let ports = tokio::task::spawn_blocking(transport::list_available_ports)
        .await
        .map_err(task_error)?
        .map_err(api_error)?;
    Ok(Json(PortsResponse { ports }))
}

/// The pipeline is the only writer while a run is in flight; the port
/// cannot be swapped or closed under it.
fn ensure_idle(state: &AppState) -> Result<(), ApiError> {
    if state.pipeline.is_running() {
        return Err(api_error(PixelwireError::TransmissionInProgress));
    }
    Ok(())
}

/// POST /api/serial/connect - Open a port, closing any open one first.
pub async fn connect(
    State(state): State<Arc<AppState>>,
    Json(config): Json<SerialConfig>,
) -> Result<Json<StatusResponse>, ApiError> {
    ensure_idle(&state)?;
    let link = Arc::clone(&state.link);
    let status = tokio::task::spawn_blocking(move || link.connect(&config))
        .await
        .map_err(task_error)?
        .map_err(api_error)?;
    Ok(Json(status.into()))
}

/// POST /api/serial/disconnect - Close the open port.
///
/// Disconnecting with nothing open is reported, not treated as an error.
pub async fn disconnect(
    State(state): State<Arc<AppState>>,
) -> Result<Json<DisconnectOutcome>, ApiError> {
    ensure_idle(&state)?;
    let link = Arc::clone(&state.link);
    let outcome = tokio::task::spawn_blocking(move || link.disconnect())
        .await
        .map_err(task_error)?;
    Ok(Json(outcome))
}

/// GET /api/serial/status - Current connection state.
pub async fn status(State(state): State<Arc<AppState>>) -> Json<StatusResponse> {
    Json(state.link.status().into())
}
