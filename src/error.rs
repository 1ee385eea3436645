//! Error types for screen-recorder.
//!
//! Errors are split into three layers:
//! - **Recorder errors** ([`RecorderError`]): what callers of the control
//!   surface see. Every variant maps to a stable code.
//! - **Capture errors** ([`CaptureError`]): failures reported by a
//!   [`CaptureSource`](crate::source::CaptureSource).
//! - **Writer errors** ([`WriterError`]): failures inside a
//!   [`ContainerWriter`](crate::writer::ContainerWriter).

use std::path::PathBuf;

use crate::track::TrackKind;

/// Errors returned by [`ScreenRecorder`](crate::ScreenRecorder) operations.
///
/// The variants follow the recording lifecycle: precondition errors are
/// returned before anything is touched, everything else has already
/// discarded the session's output file by the time the caller sees it.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RecorderError {
    /// A recording is already recording or stopping.
    #[error("a screen recording is already in progress")]
    Busy,

    /// The capture source cannot record on this device right now.
    #[error("screen capture is not available on this device")]
    Unavailable,

    /// The output writer could not be created or configured.
    #[error("failed to prepare output writer: {reason}")]
    PrepareFailed {
        /// What went wrong while preparing.
        reason: String,
    },

    /// The capture source failed to start, or failed before start completed.
    #[error("capture source could not start: {reason}")]
    StartFailed {
        /// Error reported by the capture source.
        reason: String,
    },

    /// No recording is in progress.
    #[error("no screen recording is currently in progress")]
    NotRunning,

    /// The session had no writer left to finalize.
    #[error("recording writer was unavailable while stopping capture")]
    MissingWriter,

    /// The capture source failed to stop.
    #[error("failed to stop capture: {reason}")]
    StopFailed {
        /// Error reported by the capture source.
        reason: String,
    },

    /// The writer did not reach the completed state.
    #[error("failed to finalize captured recording: {reason}")]
    WriteFailed {
        /// Terminal writer status or error.
        reason: String,
    },

    /// The request was superseded by a cancel.
    #[error("recording was cancelled")]
    Cancelled,

    /// The recorder task has shut down.
    #[error("recorder has shut down")]
    Closed,
}

impl RecorderError {
    /// Stable machine-readable code for the control surface.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Busy => "ERR_RECORDER_BUSY",
            Self::Unavailable => "ERR_RECORDER_UNAVAILABLE",
            Self::PrepareFailed { .. } => "ERR_RECORDER_PREPARE_FAILED",
            Self::StartFailed { .. } => "ERR_RECORDER_START_FAILED",
            Self::NotRunning => "ERR_RECORDER_NOT_RUNNING",
            Self::MissingWriter => "ERR_RECORDER_MISSING_WRITER",
            Self::StopFailed { .. } => "ERR_RECORDER_STOP_FAILED",
            Self::WriteFailed { .. } => "ERR_RECORDER_WRITE_FAILED",
            Self::Cancelled => "ERR_RECORDER_CANCELLED",
            Self::Closed => "ERR_RECORDER_CLOSED",
        }
    }

    /// Creates a prepare failure with the given reason.
    pub fn prepare_failed(reason: impl Into<String>) -> Self {
        Self::PrepareFailed {
            reason: reason.into(),
        }
    }

    /// Creates a start failure with the given reason.
    pub fn start_failed(reason: impl Into<String>) -> Self {
        Self::StartFailed {
            reason: reason.into(),
        }
    }

    /// Creates a stop failure with the given reason.
    pub fn stop_failed(reason: impl Into<String>) -> Self {
        Self::StopFailed {
            reason: reason.into(),
        }
    }

    /// Creates a write failure with the given reason.
    pub fn write_failed(reason: impl Into<String>) -> Self {
        Self::WriteFailed {
            reason: reason.into(),
        }
    }
}

/// Errors reported by a capture source.
///
/// These arrive asynchronously: as the outcome of a start or stop request,
/// or through [`SampleSender::fail`](crate::source::SampleSender::fail)
/// while capture is running.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CaptureError {
    /// The capture backend is not usable.
    #[error("capture unavailable: {reason}")]
    Unavailable {
        /// Why capture is unavailable.
        reason: String,
    },

    /// The user or OS refused screen capture.
    #[error("permission denied for screen capture (check OS settings)")]
    PermissionDenied,

    /// The capture source did not answer in time.
    #[error("capture {operation} timed out")]
    TimedOut {
        /// The operation that timed out (`start` or `stop`).
        operation: &'static str,
    },

    /// The running stream was interrupted.
    #[error("capture interrupted: {reason}")]
    Interrupted {
        /// Description of the interruption.
        reason: String,
    },

    /// Any other backend failure.
    #[error("capture backend error: {0}")]
    Backend(String),
}

impl CaptureError {
    /// Creates a backend error with the given message.
    pub fn backend(msg: impl Into<String>) -> Self {
        Self::Backend(msg.into())
    }

    /// Creates an interruption error with the given reason.
    pub fn interrupted(reason: impl Into<String>) -> Self {
        Self::Interrupted {
            reason: reason.into(),
        }
    }
}

/// Errors that can occur within a [`ContainerWriter`](crate::writer::ContainerWriter).
#[derive(Debug, thiserror::Error)]
pub enum WriterError {
    /// File I/O error.
    #[error("file error: {path}: {source}")]
    FileError {
        /// Path to the file.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The writer refused a track configuration.
    #[error("cannot add {kind} track: {reason}")]
    TrackRejected {
        /// Kind of the rejected track.
        kind: TrackKind,
        /// Why it was rejected.
        reason: String,
    },

    /// The track id does not belong to this writer.
    #[error("unknown track {0}")]
    UnknownTrack(usize),

    /// An operation was called in the wrong writer state.
    #[error("invalid writer state: {reason}")]
    InvalidState {
        /// Description of the misuse.
        reason: String,
    },

    /// A sample was appended before the writer session began.
    #[error("writer session has not started")]
    SessionNotStarted,

    /// A sample was appended to a track already marked finished.
    #[error("{kind} track is finished")]
    TrackFinished {
        /// Kind of the finished track.
        kind: TrackKind,
    },

    /// A sample's timestamp goes backwards or precedes the session origin.
    #[error("{kind} sample out of order: {timestamp_ns}ns after {previous_ns}ns")]
    OutOfOrder {
        /// Kind of the track.
        kind: TrackKind,
        /// Relative timestamp of the rejected sample.
        timestamp_ns: i64,
        /// Latest accepted relative timestamp (0 for the origin).
        previous_ns: i64,
    },

    /// A container file could not be parsed.
    #[error("malformed container: {reason}")]
    Malformed {
        /// What was wrong with the file.
        reason: String,
    },
}

impl WriterError {
    /// Creates a file error for the given path.
    pub fn file_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::FileError {
            path: path.into(),
            source,
        }
    }

    /// Creates an invalid state error with the given reason.
    pub fn invalid_state(reason: impl Into<String>) -> Self {
        Self::InvalidState {
            reason: reason.into(),
        }
    }

    /// Creates a malformed container error with the given reason.
    pub fn malformed(reason: impl Into<String>) -> Self {
        Self::Malformed {
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recorder_error_display() {
        let err = RecorderError::prepare_failed("disk full");
        assert_eq!(err.to_string(), "failed to prepare output writer: disk full");
    }

    #[test]
    fn test_recorder_error_codes() {
        assert_eq!(RecorderError::Busy.code(), "ERR_RECORDER_BUSY");
        assert_eq!(RecorderError::NotRunning.code(), "ERR_RECORDER_NOT_RUNNING");
        assert_eq!(
            RecorderError::write_failed("failed").code(),
            "ERR_RECORDER_WRITE_FAILED"
        );
        assert_eq!(RecorderError::MissingWriter.code(), "ERR_RECORDER_MISSING_WRITER");
    }

    #[test]
    fn test_capture_error_timed_out() {
        let err = CaptureError::TimedOut { operation: "stop" };
        assert_eq!(err.to_string(), "capture stop timed out");
    }

    #[test]
    fn test_writer_error_file_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err = WriterError::file_error("/tmp/test.screc", io_err);
        assert!(err.to_string().contains("/tmp/test.screc"));
    }

    #[test]
    fn test_writer_error_out_of_order() {
        let err = WriterError::OutOfOrder {
            kind: TrackKind::Video,
            timestamp_ns: 10,
            previous_ns: 20,
        };
        assert_eq!(err.to_string(), "video sample out of order: 10ns after 20ns");
    }
}
