//! Programmable capture source for testing without capture hardware.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use super::{CaptureConfig, CaptureSource, DisplayGeometry, SampleSender};
use crate::{CaptureError, MediaSample};

#[derive(Default)]
struct Script {
    start_result: Option<CaptureError>,
    stop_result: Option<CaptureError>,
    start_delay: Duration,
    stop_delay: Duration,
}

struct MockState {
    available: AtomicBool,
    display: Mutex<DisplayGeometry>,
    script: Mutex<Script>,
    sender: Mutex<Option<SampleSender>>,
    last_config: Mutex<Option<CaptureConfig>>,
    start_calls: AtomicUsize,
    stop_calls: AtomicUsize,
}

/// A capture source driven by the test or demo that owns it.
///
/// Clones share state: hand one clone to the recorder and keep another to
/// push samples, inject failures and inspect calls. This allows exercising
/// the whole recorder without capture hardware, making it suitable for CI.
///
/// # Example
///
/// ```
/// use screen_recorder::{MediaSample, MediaTime, MockCaptureSource};
///
/// let source = MockCaptureSource::new();
///
/// // Not capturing yet: nothing is delivered.
/// assert!(!source.push(MediaSample::video(MediaTime::ZERO, vec![0u8; 16])));
/// assert_eq!(source.start_calls(), 0);
/// ```
#[derive(Clone)]
pub struct MockCaptureSource {
    state: Arc<MockState>,
}

impl Default for MockCaptureSource {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for MockCaptureSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockCaptureSource")
            .field("available", &self.state.available.load(Ordering::SeqCst))
            .field("capturing", &self.is_capturing())
            .finish_non_exhaustive()
    }
}

impl MockCaptureSource {
    /// Creates an available source with a 1920x1080 display at scale 1.
    pub fn new() -> Self {
        Self {
            state: Arc::new(MockState {
                available: AtomicBool::new(true),
                display: Mutex::new(DisplayGeometry::default()),
                script: Mutex::new(Script::default()),
                sender: Mutex::new(None),
                last_config: Mutex::new(None),
                start_calls: AtomicUsize::new(0),
                stop_calls: AtomicUsize::new(0),
            }),
        }
    }

    /// Sets the reported display geometry.
    #[must_use]
    pub fn with_display(self, display: DisplayGeometry) -> Self {
        *self.state.display.lock() = display;
        self
    }

    /// Sets whether the source reports itself available.
    pub fn set_available(&self, available: bool) {
        self.state.available.store(available, Ordering::SeqCst);
    }

    /// Makes every later `start_capture` fail with `error`.
    pub fn fail_start_with(&self, error: CaptureError) {
        self.state.script.lock().start_result = Some(error);
    }

    /// Makes every later `stop_capture` fail with `error`.
    pub fn fail_stop_with(&self, error: CaptureError) {
        self.state.script.lock().stop_result = Some(error);
    }

    /// Delays the completion of `start_capture`.
    pub fn set_start_delay(&self, delay: Duration) {
        self.state.script.lock().start_delay = delay;
    }

    /// Delays the completion of `stop_capture`.
    pub fn set_stop_delay(&self, delay: Duration) {
        self.state.script.lock().stop_delay = delay;
    }

    /// Delivers a sample to the running recording.
    ///
    /// Returns `false` if capture is not running or the sample was dropped.
    pub fn push(&self, sample: MediaSample) -> bool {
        self.state
            .sender
            .lock()
            .as_ref()
            .is_some_and(|sender| sender.send(sample))
    }

    /// Reports a runtime failure of the running stream.
    ///
    /// Returns `false` if capture is not running.
    pub fn fail(&self, error: CaptureError) -> bool {
        match self.state.sender.lock().as_ref() {
            Some(sender) => {
                sender.fail(error);
                true
            }
            None => false,
        }
    }

    /// Returns `true` between a successful start and the next stop.
    pub fn is_capturing(&self) -> bool {
        self.state.sender.lock().is_some()
    }

    /// Configuration of the most recent start request.
    pub fn last_config(&self) -> Option<CaptureConfig> {
        *self.state.last_config.lock()
    }

    /// Number of `start_capture` calls.
    pub fn start_calls(&self) -> usize {
        self.state.start_calls.load(Ordering::SeqCst)
    }

    /// Number of `stop_capture` calls.
    pub fn stop_calls(&self) -> usize {
        self.state.stop_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CaptureSource for MockCaptureSource {
    fn name(&self) -> &str {
        "mock"
    }

    fn is_available(&self) -> bool {
        self.state.available.load(Ordering::SeqCst)
    }

    fn display(&self) -> DisplayGeometry {
        *self.state.display.lock()
    }

    async fn start_capture(
        &self,
        config: CaptureConfig,
        sender: SampleSender,
    ) -> Result<(), CaptureError> {
        self.state.start_calls.fetch_add(1, Ordering::SeqCst);
        *self.state.last_config.lock() = Some(config);

        let (delay, failure) = {
            let script = self.state.script.lock();
            (script.start_delay, script.start_result.clone())
        };
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        if let Some(error) = failure {
            return Err(error);
        }

        *self.state.sender.lock() = Some(sender);
        Ok(())
    }

    async fn stop_capture(&self) -> Result<(), CaptureError> {
        self.state.stop_calls.fetch_add(1, Ordering::SeqCst);

        let (delay, failure) = {
            let script = self.state.script.lock();
            (script.stop_delay, script.stop_result.clone())
        };
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        self.state.sender.lock().take();
        match failure {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}
