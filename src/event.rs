//! Runtime events for monitoring recordings.
//!
//! Events are notifications about what the recorder did. They are for
//! logging and UI updates; the outcome of each request is still delivered
//! through its own `Result`.

use std::path::PathBuf;
use std::sync::Arc;

use crate::sample::MediaTime;
use crate::session::SessionId;
use crate::state::RecorderState;

/// Runtime events emitted by the recorder.
///
/// # Example
///
/// ```
/// use screen_recorder::RecorderEvent;
///
/// fn handle_event(event: RecorderEvent) {
///     match event {
///         RecorderEvent::StateChanged { previous, current } => {
///             eprintln!("{previous} -> {current}");
///         }
///         RecorderEvent::RecordingSaved { path, duration_seconds, .. } => {
///             eprintln!("saved {} ({duration_seconds:.1}s)", path.display());
///         }
///         RecorderEvent::RecordingDiscarded { session, reason } => {
///             eprintln!("{session} discarded: {reason}");
///         }
///         other => eprintln!("{other:?}"),
///     }
/// }
/// ```
#[derive(Debug, Clone)]
pub enum RecorderEvent {
    /// The recorder moved to a new state.
    StateChanged {
        /// State before the transition.
        previous: RecorderState,
        /// State after the transition.
        current: RecorderState,
    },

    /// The capture source confirmed that capture is running.
    CaptureStarted {
        /// Session that started.
        session: SessionId,
    },

    /// The first sample of a session fixed the writer's time origin.
    OriginSet {
        /// Session the origin belongs to.
        session: SessionId,
        /// Timestamp of the first accepted sample.
        origin: MediaTime,
    },

    /// The capture source reported a runtime failure.
    ///
    /// While recording this ends the session; while stopping the stop
    /// request takes precedence and the failure is only reported here.
    CaptureFailed {
        /// Session the failure belongs to.
        session: SessionId,
        /// Description of the failure.
        error: String,
    },

    /// A recording was finalized and kept on disk.
    RecordingSaved {
        /// Session that finished.
        session: SessionId,
        /// Location of the finalized file.
        path: PathBuf,
        /// Wall-clock length of the recording.
        duration_seconds: f64,
    },

    /// A recording ended without a usable file; its output was deleted.
    RecordingDiscarded {
        /// Session that was discarded.
        session: SessionId,
        /// Why the session was discarded.
        reason: String,
    },
}

/// Callback type for receiving runtime events.
///
/// Register one via [`ScreenRecorderBuilder::on_event()`]. The callback runs
/// on the recorder task, so it must return quickly.
///
/// [`ScreenRecorderBuilder::on_event()`]: crate::ScreenRecorderBuilder::on_event
pub type EventCallback = Arc<dyn Fn(RecorderEvent) + Send + Sync>;

/// Creates an [`EventCallback`] from a closure.
///
/// # Example
///
/// ```
/// use screen_recorder::{event_callback, RecorderEvent};
///
/// let callback = event_callback(|event| {
///     println!("Got event: {:?}", event);
/// });
/// ```
pub fn event_callback<F>(f: F) -> EventCallback
where
    F: Fn(RecorderEvent) + Send + Sync + 'static,
{
    Arc::new(f)
}
