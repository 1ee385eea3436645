//! Client handle for the recorder task.

use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};

use crate::builder::ScreenRecorderBuilder;
use crate::machine::Command;
use crate::session::{RecordingSummary, StartOptions};
use crate::source::CaptureSource;
use crate::state::{RecorderState, StateCell};
use crate::RecorderError;

/// Handle to a screen recorder.
///
/// Created by [`ScreenRecorderBuilder::build()`]. Handles are cheap to
/// clone and all talk to the same recorder task, which owns at most one
/// recording at a time. The task stops, discarding any active recording,
/// when the last handle is dropped or [`shutdown()`](Self::shutdown) is
/// called.
///
/// # Lifecycle
///
/// 1. [`start()`](Self::start) moves `idle → recording`
/// 2. The capture source pushes samples into the recording's file
/// 3. [`stop()`](Self::stop) moves `recording → stopping → idle` and keeps the file
/// 4. [`cancel()`](Self::cancel) ends the recording from any active state and deletes the file
///
/// # Example
///
/// ```no_run
/// use screen_recorder::{MockCaptureSource, ScreenRecorder, StartOptions};
///
/// # async fn demo() -> Result<(), screen_recorder::RecorderError> {
/// let recorder = ScreenRecorder::builder(MockCaptureSource::new()).build();
///
/// recorder.start(StartOptions::default()).await?;
/// // Capture runs in background...
/// let summary = recorder.stop().await?;
/// println!("saved {} ({:.1}s)", summary.uri, summary.duration_seconds);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct ScreenRecorder {
    commands: mpsc::Sender<Command>,
    state: Arc<StateCell>,
    source: Arc<dyn CaptureSource>,
}

impl std::fmt::Debug for ScreenRecorder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScreenRecorder")
            .field("state", &self.state.get())
            .field("source", &self.source.name())
            .finish_non_exhaustive()
    }
}

impl ScreenRecorder {
    /// Creates a builder for a recorder capturing from `source`.
    pub fn builder<S: CaptureSource + 'static>(source: S) -> ScreenRecorderBuilder {
        ScreenRecorderBuilder::new(source)
    }

    pub(crate) fn new(
        commands: mpsc::Sender<Command>,
        state: Arc<StateCell>,
        source: Arc<dyn CaptureSource>,
    ) -> Self {
        Self {
            commands,
            state,
            source,
        }
    }

    /// Returns `true` if the capture source can record right now.
    pub fn is_available(&self) -> bool {
        self.source.is_available()
    }

    /// Current state. Never blocks.
    pub fn state(&self) -> RecorderState {
        self.state.get()
    }

    /// Returns `true` once the recorder task has stopped.
    pub fn is_closed(&self) -> bool {
        self.commands.is_closed()
    }

    /// Starts a recording.
    ///
    /// Resolves once the capture source confirmed it is running.
    ///
    /// # Errors
    ///
    /// - [`RecorderError::Busy`] if a recording is active
    /// - [`RecorderError::Unavailable`] if the capture source cannot record
    /// - [`RecorderError::PrepareFailed`] if the output file could not be set up
    /// - [`RecorderError::StartFailed`] if capture did not start; the file is deleted
    /// - [`RecorderError::Cancelled`] if the recording was cancelled first
    /// - [`RecorderError::Closed`] if the recorder has shut down
    pub async fn start(&self, options: StartOptions) -> Result<(), RecorderError> {
        let (reply, rx) = oneshot::channel();
        self.request(Command::Start { options, reply }, rx).await
    }

    /// Stops the active recording and finalizes its file.
    ///
    /// # Errors
    ///
    /// - [`RecorderError::NotRunning`] unless a recording is in `recording`
    /// - [`RecorderError::StopFailed`] if the capture source failed to stop
    /// - [`RecorderError::MissingWriter`] if no writer was left to finalize
    /// - [`RecorderError::WriteFailed`] if the writer did not complete
    /// - [`RecorderError::Cancelled`] if a cancel overtook the stop
    /// - [`RecorderError::Closed`] if the recorder has shut down
    ///
    /// Every error after `NotRunning` has already deleted the file.
    pub async fn stop(&self) -> Result<RecordingSummary, RecorderError> {
        let (reply, rx) = oneshot::channel();
        self.request(Command::Stop { reply }, rx).await
    }

    /// Cancels the active recording and deletes its file.
    ///
    /// Returns `false` if there was nothing to cancel.
    pub async fn cancel(&self) -> bool {
        let (reply, rx) = oneshot::channel();
        if self.commands.send(Command::Cancel { reply }).await.is_err() {
            return false;
        }
        rx.await.unwrap_or(false)
    }

    /// Stops the recorder task, cancelling any active recording.
    ///
    /// Later requests on any handle fail with [`RecorderError::Closed`].
    pub async fn shutdown(&self) {
        let (done, rx) = oneshot::channel();
        if self.commands.send(Command::Shutdown { done }).await.is_ok() {
            let _ = rx.await;
        }
    }

    async fn request<T>(
        &self,
        command: Command,
        rx: oneshot::Receiver<Result<T, RecorderError>>,
    ) -> Result<T, RecorderError> {
        self.commands
            .send(command)
            .await
            .map_err(|_| RecorderError::Closed)?;
        rx.await.unwrap_or(Err(RecorderError::Closed))
    }
}
