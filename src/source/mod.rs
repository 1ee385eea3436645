//! Capture source abstraction.
//!
//! A [`CaptureSource`] is the platform screen and audio capture backend.
//! The recorder asks it to start and stop; while running it pushes
//! timestamped samples and runtime failures through the [`SampleSender`]
//! it was handed at start.
//!
//! The crate provides [`MockCaptureSource`] for tests and demos. Real
//! backends (ReplayKit, ScreenCaptureKit, PipeWire) plug in by implementing
//! the trait.

mod mock;

pub use mock::MockCaptureSource;

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::machine::Inbound;
use crate::session::SessionId;
use crate::{CaptureError, MediaSample};

/// Logical size and scale factor of the captured display.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DisplayGeometry {
    /// Width in logical points.
    pub width: u32,
    /// Height in logical points.
    pub height: u32,
    /// Pixels per point.
    pub scale_factor: f64,
}

impl DisplayGeometry {
    /// Creates a display geometry.
    pub fn new(width: u32, height: u32, scale_factor: f64) -> Self {
        Self {
            width,
            height,
            scale_factor,
        }
    }

    /// Size in physical pixels, rounded to the nearest pixel.
    pub fn pixel_size(&self) -> (u32, u32) {
        let scale = if self.scale_factor > 0.0 {
            self.scale_factor
        } else {
            1.0
        };
        (
            (f64::from(self.width) * scale).round() as u32,
            (f64::from(self.height) * scale).round() as u32,
        )
    }
}

impl Default for DisplayGeometry {
    fn default() -> Self {
        Self::new(1920, 1080, 1.0)
    }
}

/// What the capture source should deliver for one recording.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureConfig {
    /// Mix in microphone audio.
    pub microphone: bool,
    /// Deliver application audio.
    pub app_audio: bool,
    /// Requested video frame rate, if any.
    pub frame_rate: Option<u32>,
}

/// Pushes samples and failures from a capture source to the recorder.
///
/// Tied to one recording: anything sent after that recording ended is
/// ignored. Sending never blocks; when the recorder's sample queue is full
/// the sample is dropped.
#[derive(Clone)]
pub struct SampleSender {
    session: SessionId,
    samples: mpsc::Sender<(SessionId, MediaSample)>,
    events: mpsc::UnboundedSender<Inbound>,
}

impl std::fmt::Debug for SampleSender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SampleSender")
            .field("session", &self.session)
            .finish_non_exhaustive()
    }
}

impl SampleSender {
    pub(crate) fn new(
        session: SessionId,
        samples: mpsc::Sender<(SessionId, MediaSample)>,
        events: mpsc::UnboundedSender<Inbound>,
    ) -> Self {
        Self {
            session,
            samples,
            events,
        }
    }

    /// Recording this sender belongs to.
    pub fn session(&self) -> SessionId {
        self.session
    }

    /// Queues a sample for the recorder.
    ///
    /// Returns `false` if the sample was dropped because the queue is full
    /// or the recorder has shut down.
    pub fn send(&self, sample: MediaSample) -> bool {
        match self.samples.try_send((self.session, sample)) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full((_, sample))) => {
                tracing::trace!(session = %self.session, track = %sample.kind, "Sample queue full, sample dropped");
                false
            }
            Err(mpsc::error::TrySendError::Closed(_)) => false,
        }
    }

    /// Reports a runtime capture failure. The recording is discarded unless
    /// it is already stopping.
    pub fn fail(&self, error: CaptureError) {
        let _ = self.events.send(Inbound::CaptureFailed {
            session: self.session,
            error,
        });
    }

    /// Returns `true` if the recorder has shut down.
    pub fn is_closed(&self) -> bool {
        self.samples.is_closed()
    }
}

/// A platform screen capture backend.
///
/// # Implementation Notes
///
/// - `start_capture` resolves once capture is running; samples may be
///   pushed through `sender` before it resolves.
/// - Errors returned from `start_capture` or `stop_capture` are outcomes of
///   that request. Failures of a running stream go through
///   [`SampleSender::fail`].
/// - Both calls are bounded by the recorder's capture timeout.
/// - `display` is read each time a recording is prepared.
#[async_trait]
pub trait CaptureSource: Send + Sync {
    /// Human-readable name for logging.
    fn name(&self) -> &str;

    /// Returns `true` if capture can start on this device right now.
    fn is_available(&self) -> bool;

    /// Current geometry of the display being captured.
    fn display(&self) -> DisplayGeometry;

    /// Starts capturing, delivering samples through `sender`.
    async fn start_capture(
        &self,
        config: CaptureConfig,
        sender: SampleSender,
    ) -> Result<(), CaptureError>;

    /// Stops capturing.
    async fn stop_capture(&self) -> Result<(), CaptureError>;
}
