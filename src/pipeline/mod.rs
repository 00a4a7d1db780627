//! # Transmission Pipeline
//!
//! Writes an encoded frame sequence to a [`FrameLink`] in order, one frame at
//! a time, idling for a pacing interval between frames so the FPGA can drain
//! its UART buffer.
//!
//! ## Run Lifecycle
//!
//! ```text
//! transmit/start
//!   │  link disconnected ──► NotConnected        (log untouched)
//!   │  no frames ──────────► EmptyFrameSet       (log untouched)
//!   │  run in flight ──────► TransmissionInProgress
//!   ▼
//! clear log ─► for each frame: write ─► append entry ─► pace ─► ...
//!                                   │
//!                                   └─ cancel? stop, report partial result
//! ```
//!
//! A failed write is logged and counted, and the run moves on to the next
//! frame. Nothing is retried.
//!
//! ## Workers
//!
//! [`TransmissionPipeline::transmit`] runs on the caller's thread.
//! [`TransmissionPipeline::start`] moves the same loop to a dedicated worker
//! thread and returns a [`TransmissionHandle`], so the log and the link
//! status stay readable while a long run is paced out.

pub mod log;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::PixelwireError;
use crate::protocol::Frame;
use crate::transport::FrameLink;

pub use log::{LogEntry, LogSnapshot, Outcome, RunStatus, TransmissionLog};

/// Pacing interval used when the caller does not pick one
pub const DEFAULT_PACING: Duration = Duration::from_millis(100);

/// Longest stretch the pacing wait sleeps before rechecking for cancellation
const CANCEL_POLL: Duration = Duration::from_millis(10);

/// Counters for one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TransmissionResult {
    /// Frames submitted
    pub total_frames: usize,
    /// Frames a write was issued for
    pub attempted: usize,
    pub succeeded: usize,
    pub failed: usize,
    /// The run stopped early on request
    pub cancelled: bool,
}

/// Cooperative stop flag, checked between frames.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Claim on the in-flight slot for one run. Clears the slot when dropped,
/// so a panicking worker still frees it.
struct ActiveRun<'a> {
    slot: &'a Mutex<Option<CancelToken>>,
    log: &'a TransmissionLog,
}

impl ActiveRun<'_> {
    /// Publish the final counters and free the slot under one lock, so a
    /// caller that sees `Finished` in the log can start the next run.
    fn finish(self, result: TransmissionResult) {
        let mut slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
        *slot = None;
        self.log.finish_run(result);
    }
}

impl Drop for ActiveRun<'_> {
    fn drop(&mut self) {
        *self.slot.lock().unwrap_or_else(PoisonError::into_inner) = None;
    }
}

/// # Transmission Pipeline
///
/// Binds a link and a log. At most one run is in flight at a time.
///
/// ## Example
///
/// ```no_run
/// use std::sync::Arc;
/// use std::time::Duration;
/// use pixelwire::pipeline::{CancelToken, TransmissionLog, TransmissionPipeline};
/// use pixelwire::protocol::{encode, PixelGrid};
/// use pixelwire::transport::{SerialConfig, SerialLink};
///
/// let link = Arc::new(SerialLink::new());
/// link.connect(&SerialConfig::new("/dev/ttyUSB0"))?;
///
/// let pipeline = TransmissionPipeline::new(link, Arc::new(TransmissionLog::new()));
/// let frames = encode(&PixelGrid::new(64, 64, vec![0; 4096])?);
///
/// let result = pipeline.transmit(&frames, Duration::from_millis(5), &CancelToken::new())?;
/// println!("{} ok, {} failed", result.succeeded, result.failed);
/// # Ok::<(), pixelwire::PixelwireError>(())
/// ```
pub struct TransmissionPipeline<L: FrameLink> {
    link: Arc<L>,
    log: Arc<TransmissionLog>,
    active: Mutex<Option<CancelToken>>,
}

impl<L: FrameLink + 'static> TransmissionPipeline<L> {
    pub fn new(link: Arc<L>, log: Arc<TransmissionLog>) -> Self {
        Self {
            link,
            log,
            active: Mutex::new(None),
        }
    }

    pub fn link(&self) -> &Arc<L> {
        &self.link
    }

    pub fn log(&self) -> &Arc<TransmissionLog> {
        &self.log
    }

    /// True while a run is in flight.
    pub fn is_running(&self) -> bool {
        self.active
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// Ask the in-flight run to stop. Returns false if nothing is running.
    pub fn cancel(&self) -> bool {
        match self
            .active
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
        {
            Some(token) => {
                info!("transmission cancel requested");
                token.cancel();
                true
            }
            None => false,
        }
    }

    /// # Transmit on the Calling Thread
    ///
    /// Blocks until every frame has been attempted or `cancel` fires.
    ///
    /// ## Errors
    ///
    /// `NotConnected`, `EmptyFrameSet` or `TransmissionInProgress`, all
    /// raised before the log is touched. Per-frame write failures are not
    /// errors; they are counted in the result.
    pub fn transmit(
        &self,
        frames: &[Frame],
        pacing: Duration,
        cancel: &CancelToken,
    ) -> Result<TransmissionResult, PixelwireError> {
        self.begin(frames, cancel)?;
        let active = ActiveRun {
            slot: &self.active,
            log: &self.log,
        };
        let result = self.run(frames, pacing, cancel);
        active.finish(result);
        Ok(result)
    }

    /// # Transmit on a Worker Thread
    ///
    /// Checks the same preconditions as [`transmit`](Self::transmit)
    /// synchronously, then returns while the worker writes.
    pub fn start(
        self: &Arc<Self>,
        frames: Vec<Frame>,
        pacing: Duration,
    ) -> Result<TransmissionHandle, PixelwireError> {
        let cancel = CancelToken::new();
        self.begin(&frames, &cancel)?;

        let total_frames = frames.len();
        let pipeline = Arc::clone(self);
        let token = cancel.clone();
        let spawned = thread::Builder::new()
            .name("transmission".to_string())
            .spawn(move || {
                let active = ActiveRun {
                    slot: &pipeline.active,
                    log: &pipeline.log,
                };
                let result = pipeline.run(&frames, pacing, &token);
                active.finish(result);
                result
            });

        match spawned {
            Ok(thread) => Ok(TransmissionHandle {
                cancel,
                total_frames,
                thread,
            }),
            Err(e) => {
                *self.active.lock().unwrap_or_else(PoisonError::into_inner) = None;
                Err(PixelwireError::Io(e))
            }
        }
    }

    /// Validate preconditions and claim the in-flight slot.
    fn begin(&self, frames: &[Frame], cancel: &CancelToken) -> Result<(), PixelwireError> {
        if !self.link.is_connected() {
            return Err(PixelwireError::NotConnected);
        }
        if frames.is_empty() {
            return Err(PixelwireError::EmptyFrameSet);
        }

        let mut active = self.active.lock().unwrap_or_else(PoisonError::into_inner);
        if active.is_some() {
            return Err(PixelwireError::TransmissionInProgress);
        }
        *active = Some(cancel.clone());
        Ok(())
    }

    fn run(&self, frames: &[Frame], pacing: Duration, cancel: &CancelToken) -> TransmissionResult {
        let total_frames = frames.len();
        let mut result = TransmissionResult {
            total_frames,
            attempted: 0,
            succeeded: 0,
            failed: 0,
            cancelled: false,
        };

        self.log.start_run(total_frames);
        info!(
            frames = total_frames,
            pacing_ms = pacing.as_millis() as u64,
            "transmission started"
        );

        for (i, frame) in frames.iter().enumerate() {
            if cancel.is_cancelled() {
                result.cancelled = true;
                break;
            }

            let number = i + 1;
            let bytes = frame.as_bytes();
            let entry = match self.link.write_frame(bytes) {
                Ok(n) if n == bytes.len() => {
                    result.succeeded += 1;
                    debug!(frame = number, hex = %frame, "frame sent");
                    LogEntry::success(number, frame, n)
                }
                Ok(n) => {
                    result.failed += 1;
                    warn!(frame = number, written = n, expected = bytes.len(), "short write");
                    LogEntry::short_write(number, frame, n)
                }
                Err(e) => {
                    result.failed += 1;
                    warn!(frame = number, error = %e, "frame write failed");
                    LogEntry::error(number, frame, e.to_string())
                }
            };
            result.attempted += 1;
            self.log.append(entry);

            if number < total_frames && !pacing.is_zero() && pause(pacing, cancel) {
                result.cancelled = true;
                break;
            }
        }

        info!(
            succeeded = result.succeeded,
            failed = result.failed,
            attempted = result.attempted,
            total = result.total_frames,
            cancelled = result.cancelled,
            "transmission finished"
        );
        result
    }
}

/// Sleep for `interval`, waking early if `cancel` fires. Returns true when
/// cancelled.
fn pause(interval: Duration, cancel: &CancelToken) -> bool {
    let deadline = Instant::now() + interval;
    loop {
        if cancel.is_cancelled() {
            return true;
        }
        let now = Instant::now();
        if now >= deadline {
            return false;
        }
        thread::sleep((deadline - now).min(CANCEL_POLL));
    }
}

/// Handle to a run executing on a worker thread.
pub struct TransmissionHandle {
    cancel: CancelToken,
    total_frames: usize,
    thread: JoinHandle<TransmissionResult>,
}

impl TransmissionHandle {
    /// Request a cooperative stop. The frame being written completes.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    pub fn total_frames(&self) -> usize {
        self.total_frames
    }

    pub fn is_finished(&self) -> bool {
        self.thread.is_finished()
    }

    /// Wait for the worker and return its counters.
    pub fn join(self) -> Result<TransmissionResult, PixelwireError> {
        self.thread
            .join()
            .map_err(|_| PixelwireError::Io(std::io::Error::other("transmission worker panicked")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::LinkStatus;

    struct NullLink {
        connected: bool,
    }

    impl FrameLink for NullLink {
        fn status(&self) -> LinkStatus {
            if self.connected {
                LinkStatus::Connected {
                    port: "null".to_string(),
                    baud_rate: 115_200,
                }
            } else {
                LinkStatus::Disconnected
            }
        }

        fn write_frame(&self, bytes: &[u8]) -> Result<usize, PixelwireError> {
            Ok(bytes.len())
        }
    }

    fn pipeline(connected: bool) -> TransmissionPipeline<NullLink> {
        TransmissionPipeline::new(
            Arc::new(NullLink { connected }),
            Arc::new(TransmissionLog::new()),
        )
    }

    #[test]
    fn test_cancel_token() {
        let token = CancelToken::new();
        let clone = token.clone();
        assert!(!clone.is_cancelled());
        token.cancel();
        assert!(clone.is_cancelled());
    }

    #[test]
    fn test_pause_returns_early_on_cancel() {
        let token = CancelToken::new();
        token.cancel();
        let started = Instant::now();
        assert!(pause(Duration::from_secs(5), &token));
        assert!(started.elapsed() < Duration::from_secs(1));
    }

    #[test]
    fn test_pause_full_interval() {
        let started = Instant::now();
        assert!(!pause(Duration::from_millis(30), &CancelToken::new()));
        assert!(started.elapsed() >= Duration::from_millis(30));
    }

    #[test]
    fn test_preconditions_checked_in_order() {
        let p = pipeline(false);
        assert!(matches!(
            p.transmit(&[], Duration::ZERO, &CancelToken::new()),
            Err(PixelwireError::NotConnected)
        ));

        let p = pipeline(true);
        assert!(matches!(
            p.transmit(&[], Duration::ZERO, &CancelToken::new()),
            Err(PixelwireError::EmptyFrameSet)
        ));
        assert_eq!(p.log().status(), RunStatus::Idle);
    }

    #[test]
    fn test_slot_released_after_run() {
        let p = pipeline(true);
        let frames = vec![Frame::meta(1, 1), Frame::data(1, [0, 0, 0])];
        p.transmit(&frames, Duration::ZERO, &CancelToken::new()).unwrap();
        assert!(!p.is_running());
        assert!(!p.cancel());
        // A second run is accepted once the first is done
        p.transmit(&frames, Duration::ZERO, &CancelToken::new()).unwrap();
    }

    #[test]
    fn test_finished_status_carries_result() {
        let p = pipeline(true);
        let frames = vec![Frame::meta(1, 1), Frame::data(1, [0, 0, 0])];
        let result = p.transmit(&frames, Duration::ZERO, &CancelToken::new()).unwrap();
        assert_eq!(p.log().status(), RunStatus::Finished(result));
        assert_eq!(result.succeeded, 2);
    }
}
