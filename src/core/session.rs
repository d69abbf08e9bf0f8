// Background monitoring session
// Capture hands frames to a processing task through a single-slot queue.

use crate::core::confirmation::Clock;
use crate::core::config::MonitorConfig;
use crate::core::orchestrator::FrameOrchestrator;
use crate::models::capture::RawFrame;
use crate::models::monitor::{
    FrameOutcome, FrameReport, MonitorError, MonitorResult, SessionStatistics, Verdict,
};
use crate::platform::camera::{mirror_frame, FrameSource};
use crate::platform::pose::LandmarkProvider;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, watch, RwLock};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Reports buffered for a slow consumer before new ones are dropped
pub const REPORT_BUFFER: usize = 64;

/// Content of the latest-frame slot
#[derive(Debug, Clone)]
pub enum FrameSlot {
    Empty,
    Frame(RawFrame),
    /// Capture failed for this cycle
    Dropped(String),
}

// ==============================================================================
// Monitor Session
// ==============================================================================

pub struct MonitorSession {
    config: Arc<RwLock<MonitorConfig>>,
    current_session_id: Arc<RwLock<Option<String>>>,
    is_monitoring: Arc<RwLock<bool>>,
    current_verdict: Arc<RwLock<Verdict>>,
    frame_tx: Arc<RwLock<Option<watch::Sender<FrameSlot>>>>,
    worker: RwLock<Option<JoinHandle<SessionStatistics>>>,
}

impl MonitorSession {
    pub fn new() -> Self {
        Self {
            config: Arc::new(RwLock::new(MonitorConfig::default())),
            current_session_id: Arc::new(RwLock::new(None)),
            is_monitoring: Arc::new(RwLock::new(false)),
            current_verdict: Arc::new(RwLock::new(Verdict::Idle)),
            frame_tx: Arc::new(RwLock::new(None)),
            worker: RwLock::new(None),
        }
    }

    /// Start a monitoring session that owns `provider` until it is stopped.
    ///
    /// Returns the session id and the receiving end of the report stream.
    pub async fn start_monitoring(
        &self,
        config: MonitorConfig,
        provider: Box<dyn LandmarkProvider>,
    ) -> MonitorResult<(String, mpsc::Receiver<FrameReport>)> {
        let mut is_monitoring = self.is_monitoring.write().await;
        if *is_monitoring {
            return Err(MonitorError::AlreadyRunning);
        }

        config.validate()?;
        if !provider.is_initialized() {
            return Err(MonitorError::NotInitialized);
        }

        let session_id = Uuid::new_v4().to_string();
        *self.current_session_id.write().await = Some(session_id.clone());
        *self.current_verdict.write().await = Verdict::Idle;

        let (frame_tx, frame_rx) = watch::channel(FrameSlot::Empty);
        let (report_tx, report_rx) = mpsc::channel::<FrameReport>(REPORT_BUFFER);
        *self.frame_tx.write().await = Some(frame_tx);

        let orchestrator = FrameOrchestrator::new(session_id.clone());
        let current_verdict = self.current_verdict.clone();
        let mirror = config.mirror;
        info!(
            "Started monitoring session {} with {} (mirror: {})",
            session_id,
            provider.describe(),
            mirror
        );
        *self.config.write().await = config;

        let handle = tokio::spawn(async move {
            Self::process_frames(frame_rx, report_tx, provider, orchestrator, current_verdict, mirror)
                .await
        });
        *self.worker.write().await = Some(handle);

        *is_monitoring = true;
        Ok((session_id, report_rx))
    }

    /// Stop the session and wait for the processing task to finish.
    ///
    /// Returns `None` when no session was running.
    pub async fn stop_monitoring(&self) -> MonitorResult<Option<SessionStatistics>> {
        let mut is_monitoring = self.is_monitoring.write().await;
        if !*is_monitoring {
            return Ok(None);
        }

        // Dropping the sender ends the processing loop
        *self.frame_tx.write().await = None;
        *is_monitoring = false;
        *self.current_session_id.write().await = None;

        let handle = self.worker.write().await.take();
        let statistics = match handle {
            Some(handle) => handle
                .await
                .map_err(|e| MonitorError::ProviderFailed(format!("processing task failed: {}", e)))?,
            None => return Err(MonitorError::NotInitialized),
        };

        info!(
            "Stopped monitoring session {}: {} frames evaluated, {} skipped, {} confirmations",
            statistics.session_id,
            statistics.frames_evaluated,
            statistics.frames_skipped,
            statistics.confirmations
        );
        Ok(Some(statistics))
    }

    /// Offer a frame to the processing task. Never blocks; an unprocessed
    /// frame still waiting in the slot is replaced.
    pub async fn submit_frame(&self, frame: RawFrame) {
        self.submit(FrameSlot::Frame(frame)).await;
    }

    /// Record a capture failure for this cycle
    pub async fn submit_dropped(&self, reason: String) {
        self.submit(FrameSlot::Dropped(reason)).await;
    }

    async fn submit(&self, slot: FrameSlot) {
        if let Some(tx) = self.frame_tx.read().await.as_ref() {
            // send_replace stores the value even when the task has exited
            tx.send_replace(slot);
        }
    }

    pub async fn is_monitoring(&self) -> bool {
        *self.is_monitoring.read().await
    }

    pub async fn current_session_id(&self) -> Option<String> {
        self.current_session_id.read().await.clone()
    }

    /// Verdict of the most recently processed frame
    pub async fn current_verdict(&self) -> Verdict {
        *self.current_verdict.read().await
    }

    pub async fn config(&self) -> MonitorConfig {
        self.config.read().await.clone()
    }

    /// Background task: classify the latest frame whenever the slot changes
    async fn process_frames(
        mut frame_rx: watch::Receiver<FrameSlot>,
        report_tx: mpsc::Sender<FrameReport>,
        mut provider: Box<dyn LandmarkProvider>,
        mut orchestrator: FrameOrchestrator,
        current_verdict: Arc<RwLock<Verdict>>,
        mirror: bool,
    ) -> SessionStatistics {
        let mut last_timestamp: Option<u64> = None;

        while frame_rx.changed().await.is_ok() {
            let slot = frame_rx.borrow_and_update().clone();

            let frame = match slot {
                FrameSlot::Empty => continue,
                FrameSlot::Dropped(reason) => {
                    orchestrator.skip_frame(reason);
                    continue;
                }
                FrameSlot::Frame(frame) => frame,
            };

            if last_timestamp.map_or(false, |last| frame.timestamp_ms < last) {
                orchestrator.skip_frame(format!(
                    "frame at {} ms arrived after {} ms",
                    frame.timestamp_ms,
                    last_timestamp.unwrap_or_default()
                ));
                continue;
            }
            last_timestamp = Some(frame.timestamp_ms);

            let frame = if mirror {
                match mirror_frame(&frame) {
                    Ok(mirrored) => mirrored,
                    Err(e) => {
                        orchestrator.skip_frame(e.to_string());
                        continue;
                    }
                }
            } else {
                frame
            };

            if let FrameOutcome::Evaluated(report) =
                orchestrator.process_frame(provider.as_mut(), &frame)
            {
                *current_verdict.write().await = report.verdict;
                match report_tx.try_send(report) {
                    Ok(()) => {}
                    Err(TrySendError::Full(_)) => debug!("Report consumer lagging, dropping report"),
                    // Nobody is listening; keep tracking for the statistics
                    Err(TrySendError::Closed(_)) => {}
                }
            }
        }

        provider.close();
        orchestrator.statistics().clone()
    }
}

impl Default for MonitorSession {
    fn default() -> Self {
        Self::new()
    }
}

// ==============================================================================
// Capture Loop
// ==============================================================================

/// Read frames from `source` at a fixed interval and feed them to `session`.
///
/// Every frame is stamped with `clock` at capture time. Capture failures are
/// logged and reported as dropped frames; they never end the loop. Runs until
/// the session stops or `max_frames` cycles have completed, and returns the
/// number of cycles run.
pub async fn run_capture_loop<S>(
    source: &mut S,
    session: &MonitorSession,
    clock: &dyn Clock,
    interval: Duration,
    max_frames: Option<u64>,
) -> u64
where
    S: FrameSource + ?Sized,
{
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut cycles = 0u64;

    debug!("Capture loop reading from {}", source.device().name);

    while session.is_monitoring().await {
        if max_frames.map_or(false, |max| cycles >= max) {
            break;
        }
        ticker.tick().await;

        match source.read_frame().await {
            Ok(mut frame) => {
                frame.timestamp_ms = clock.now_ms();
                session.submit_frame(frame).await;
            }
            Err(e) => {
                warn!("Failed to capture frame from {}: {}", source.device().name, e);
                session.submit_dropped(e.to_string()).await;
            }
        }
        cycles += 1;

        // Let the processing task drain the slot before the next capture
        tokio::task::yield_now().await;
    }

    cycles
}
