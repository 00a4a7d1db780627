//! HTTP handlers for the server.

pub mod frames;
pub mod serial;
pub mod transmission;

use axum::http::StatusCode;

use crate::error::PixelwireError;

/// Error half of every handler's result.
pub type ApiError = (StatusCode, String);

/// Map a library error onto a status code and message.
pub fn api_error(e: PixelwireError) -> ApiError {
    let status = match &e {
        PixelwireError::InvalidGrid(_)
        | PixelwireError::InvalidFrame(_)
        | PixelwireError::EmptyFrameSet
        | PixelwireError::Image(_) => StatusCode::BAD_REQUEST,
        PixelwireError::NotConnected | PixelwireError::TransmissionInProgress => {
            StatusCode::CONFLICT
        }
        PixelwireError::WriteTimeout(_) => StatusCode::GATEWAY_TIMEOUT,
        PixelwireError::Write(_) => StatusCode::BAD_GATEWAY,
        PixelwireError::Connect(_) | PixelwireError::Server(_) | PixelwireError::Io(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    (status, e.to_string())
}

/// Error for a `spawn_blocking` task that did not complete.
pub fn task_error(e: tokio::task::JoinError) -> ApiError {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        format!("Task error: {}", e),
    )
}
