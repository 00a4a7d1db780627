//! Frame encoding API handlers.

use axum::Json;
use serde::{Deserialize, Serialize};

use crate::{
    error::PixelwireError,
    protocol::{self, Frame, GridStats, PixelGrid},
};

use super::{ApiError, api_error};

fn default_true() -> bool {
    true
}

/// A pixel grid as sent by loosely typed clients.
///
/// Samples above 255 keep only their low 8 bits.
#[derive(Debug, Deserialize)]
pub struct GridRequest {
    pub width: i64,
    pub height: i64,
    #[serde(alias = "samples")]
    pub array: Vec<i64>,
}

impl GridRequest {
    pub fn into_grid(self) -> Result<PixelGrid, PixelwireError> {
        PixelGrid::from_wide(self.width, self.height, self.array)
    }
}

/// Request body for the encode endpoint.
#[derive(Debug, Deserialize)]
pub struct EncodeRequest {
    #[serde(flatten)]
    pub grid: GridRequest,
    /// Include the frame bytes in the response
    #[serde(default = "default_true")]
    pub frames: bool,
}

/// Response from the encode endpoint.
#[derive(Debug, Serialize)]
pub struct EncodeResponse {
    pub data_info: GridStats,
    pub total_frames: usize,
    pub data_frames: usize,
    pub frames: Vec<Vec<u8>>,
}

/// Raw bytes of each frame, ready for JSON.
pub fn frames_to_bytes(frames: &[Frame]) -> Vec<Vec<u8>> {
    frames.iter().map(|f| f.as_bytes().to_vec()).collect()
}

/// POST /api/frames - Encode a pixel grid into protocol frames.
pub async fn encode(Json(req): Json<EncodeRequest>) -> Result<Json<EncodeResponse>, ApiError> {
    let include_frames = req.frames;
    let grid = req.grid.into_grid().map_err(api_error)?;
    let frames = protocol::encode(&grid);

    Ok(Json(EncodeResponse {
        data_info: grid.stats(),
        total_frames: frames.len(),
        data_frames: frames.len() - 1,
        frames: if include_frames {
            frames_to_bytes(&frames)
        } else {
            Vec::new()
        },
    }))
}
