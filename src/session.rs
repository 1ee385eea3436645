//! Recording session data.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;

use crate::clock::SessionClock;
use crate::pipeline::TrackRouter;
use crate::writer::WriterHandle;
use crate::RecorderError;

/// Identifies one recording of a [`ScreenRecorder`](crate::ScreenRecorder).
///
/// Ids increase monotonically per recorder. Samples and capture
/// notifications carry the id of the recording they belong to, so late
/// deliveries for a finished recording are recognized and ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SessionId(u64);

impl SessionId {
    /// Creates a session id.
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the numeric id.
    pub fn get(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "session-{}", self.0)
    }
}

fn enabled() -> bool {
    true
}

/// Options for one recording, fixed when it starts.
///
/// Omitted audio flags default to `true`.
///
/// # Example
///
/// ```
/// use screen_recorder::StartOptions;
///
/// let options: StartOptions = serde_json::from_str(r#"{ "appAudio": false }"#).unwrap();
/// assert!(options.mic);
/// assert!(!options.app_audio);
/// assert_eq!(options.fps, None);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartOptions {
    /// Record microphone audio into its own track.
    #[serde(default = "enabled")]
    pub mic: bool,
    /// Record application audio into its own track.
    #[serde(default = "enabled")]
    pub app_audio: bool,
    /// Frame rate hint for the capture source.
    #[serde(default)]
    pub fps: Option<u32>,
}

impl Default for StartOptions {
    fn default() -> Self {
        Self {
            mic: true,
            app_audio: true,
            fps: None,
        }
    }
}

/// Result of a completed recording.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordingSummary {
    /// `file://` URI of the recording.
    pub uri: String,
    /// Filesystem path of the recording.
    #[serde(skip)]
    pub path: PathBuf,
    /// Wall-clock length in seconds, never negative.
    pub duration_seconds: f64,
    /// Unix time in milliseconds when recording started.
    pub started_at_ms: i64,
    /// Unix time in milliseconds when stop was requested.
    pub ended_at_ms: i64,
}

impl RecordingSummary {
    /// Builds a summary; the duration is clamped at zero.
    pub fn new(path: PathBuf, started_at_ms: i64, ended_at_ms: i64) -> Self {
        let duration_seconds = (ended_at_ms.saturating_sub(started_at_ms) as f64 / 1000.0).max(0.0);
        Self {
            uri: file_uri(&path),
            path,
            duration_seconds,
            started_at_ms,
            ended_at_ms,
        }
    }
}

/// Formats `path` as a `file://` URI.
pub fn file_uri(path: &Path) -> String {
    format!("file://{}", path.display())
}

/// Reply channel for a pending request.
pub(crate) type Reply<T> = oneshot::Sender<Result<T, RecorderError>>;

/// The single active recording, owned by the recorder task.
pub(crate) struct RecordingSession {
    pub id: SessionId,
    /// Present until finalized or discarded.
    pub writer: Option<WriterHandle>,
    pub clock: SessionClock,
    pub router: TrackRouter,
    pub started_at_ms: i64,
    pub ended_at_ms: Option<i64>,
    /// Caller of `start`, until the capture source confirms.
    pub pending_start: Option<Reply<()>>,
    /// Caller of `stop`, until finalization.
    pub pending_stop: Option<Reply<RecordingSummary>>,
    /// A capture stop request has been issued.
    pub stop_requested: bool,
    pub samples_written: u64,
}

impl RecordingSession {
    pub fn new(
        id: SessionId,
        writer: WriterHandle,
        started_at_ms: i64,
        pending_start: Reply<()>,
    ) -> Self {
        Self {
            id,
            writer: Some(writer),
            clock: SessionClock::new(),
            router: TrackRouter::new(id),
            started_at_ms,
            ended_at_ms: None,
            pending_start: Some(pending_start),
            pending_stop: None,
            stop_requested: false,
            samples_written: 0,
        }
    }
}
