//! Transmission API handlers.
//!
//! Starting a run returns as soon as the worker is spawned. Clients then
//! poll the log endpoint, passing the number of entries they already have
//! as `offset`, until the status turns `finished`.

use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use std::{sync::Arc, time::Duration};

use crate::{
    error::PixelwireError,
    pipeline::{DEFAULT_PACING, LogSnapshot},
    protocol::{self, Frame},
};

use super::super::state::AppState;
use super::frames::GridRequest;
use super::{ApiError, api_error};

fn default_interval_ms() -> u64 {
    DEFAULT_PACING.as_millis() as u64
}

/// Request body for starting a run: either a grid to encode or a list of
/// already encoded frames.
#[derive(Debug, Deserialize)]
pub struct StartRequest {
    pub grid: Option<GridRequest>,
    pub frames: Option<Vec<Vec<u8>>>,
    /// Pause between frames; 0 disables pacing
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,
}

impl StartRequest {
    fn into_frames(self) -> Result<Vec<Frame>, PixelwireError> {
        match (self.grid, self.frames) {
            (Some(grid), None) => Ok(protocol::encode(&grid.into_grid()?)),
            (None, Some(raw)) => raw
                .iter()
                .enumerate()
                .map(|(i, bytes)| {
                    Frame::parse(bytes).map_err(|e| {
                        PixelwireError::InvalidFrame(format!("frame {}: {}", i + 1, e))
                    })
                })
                .collect(),
            (Some(_), Some(_)) => Err(PixelwireError::InvalidFrame(
                "send either grid or frames, not both".to_string(),
            )),
            (None, None) => Err(PixelwireError::EmptyFrameSet),
        }
    }
}

/// Response from the start endpoint.
#[derive(Debug, Serialize)]
pub struct StartResponse {
    pub total_frames: usize,
    pub interval_ms: u64,
}

/// Response from the cancel endpoint.
#[derive(Debug, Serialize)]
pub struct CancelResponse {
    pub cancelled: bool,
}

/// Query parameters for the log endpoint.
#[derive(Debug, Deserialize)]
pub struct LogQuery {
    #[serde(default)]
    pub offset: usize,
}

/// POST /api/transmission - Start a paced run on a worker thread.
pub async fn start(
    State(state): State<Arc<AppState>>,
    Json(req): Json<StartRequest>,
) -> Result<(StatusCode, Json<StartResponse>), ApiError> {
    let interval_ms = req.interval_ms;
    let frames = req.into_frames().map_err(api_error)?;

    let handle = state
        .pipeline
        .start(frames, Duration::from_millis(interval_ms))
        .map_err(api_error)?;

    Ok((
        StatusCode::ACCEPTED,
        Json(StartResponse {
            total_frames: handle.total_frames(),
            interval_ms,
        }),
    ))
}

/// POST /api/transmission/cancel - Stop the run in flight.
pub async fn cancel(State(state): State<Arc<AppState>>) -> Json<CancelResponse> {
    Json(CancelResponse {
        cancelled: state.pipeline.cancel(),
    })
}

/// GET /api/transmission/log - Entries from `offset` on, plus run status.
pub async fn log(
    State(state): State<Arc<AppState>>,
    Query(query): Query<LogQuery>,
) -> Json<LogSnapshot> {
    Json(state.log().snapshot_from(query.offset))
}
