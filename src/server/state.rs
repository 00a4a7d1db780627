//! Server state and configuration.

use std::sync::Arc;

use crate::pipeline::{TransmissionLog, TransmissionPipeline};
use crate::transport::SerialLink;

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to listen on (e.g., "0.0.0.0:5000")
    pub listen_addr: String,
}

/// Application state shared across handlers.
///
/// Holds the one serial link and the pipeline bound to it. Handlers never
/// write to the link directly; only the pipeline's worker does.
pub struct AppState {
    pub config: ServerConfig,
    pub link: Arc<SerialLink>,
    pub pipeline: Arc<TransmissionPipeline<SerialLink>>,
}

impl AppState {
    pub fn new(config: ServerConfig) -> Self {
        let link = Arc::new(SerialLink::new());
        let log = Arc::new(TransmissionLog::new());
        let pipeline = Arc::new(TransmissionPipeline::new(Arc::clone(&link), log));
        Self {
            config,
            link,
            pipeline,
        }
    }

    pub fn log(&self) -> &Arc<TransmissionLog> {
        self.pipeline.log()
    }
}
