//! # screen-recorder
//!
//! **Note:** This crate is under active development. The API may change before 1.0.
//!
//! Screen recording sessions: capture samples in, one container file out.
//!
//! `screen-recorder` drives a capture source (screen frames plus optional
//! microphone and application audio) into a muxing writer that produces a
//! single file per recording, and exposes a start/stop/cancel surface with
//! accurate timing metadata.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use screen_recorder::{MockCaptureSource, RecorderConfig, ScreenRecorder, StartOptions};
//!
//! # async fn demo() -> Result<(), screen_recorder::RecorderError> {
//! let recorder = ScreenRecorder::builder(MockCaptureSource::new())
//!     .with_config(RecorderConfig::default())
//!     .on_event(|e| tracing::info!(?e, "recorder event"))
//!     .build();
//!
//! recorder.start(StartOptions { app_audio: false, ..Default::default() }).await?;
//! // The capture source pushes samples...
//! let summary = recorder.stop().await?;
//! println!("{} ({:.1}s)", summary.uri, summary.duration_seconds);
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! Each recorder is one tokio task that owns the active recording:
//!
//! - **Capture source**: pushes samples through a [`SampleSender`] that never
//!   blocks; a full queue drops samples
//! - **Recorder task**: serializes commands, capture notifications and
//!   samples, anchors timestamps to the first sample and routes each sample
//!   to its track
//! - **Writer**: a [`ContainerWriter`] whose blocking open, finish and delete
//!   run on tokio's blocking pool
//!
//! Every way a recording ends returns the recorder to
//! [`RecorderState::Idle`]; the file is kept only after a successful stop.

#![warn(missing_docs)]
// Timestamps and dimensions are converted between integer and float units
#![allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_possible_wrap,
    clippy::cast_lossless
)]
// unwrap/expect allowed in tests only
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used))]
// These doc lints are too strict for internal implementation details
#![allow(clippy::missing_panics_doc, clippy::missing_errors_doc)]

mod builder;
mod clock;
mod config;
mod control;
mod error;
mod event;
mod machine;
mod pipeline;
mod recorder;
mod sample;
mod session;
pub mod source;
mod state;
mod track;
pub mod writer;

pub use builder::ScreenRecorderBuilder;
pub use config::{
    AudioCodec, AudioEncoding, RecorderConfig, VideoCodec, VideoEncoding, VideoProfile,
};
pub use control::{ControlRequest, ControlSurface, ErrorResponse, StateResponse};
pub use error::{CaptureError, RecorderError, WriterError};
pub use event::{event_callback, EventCallback, RecorderEvent};
pub use recorder::ScreenRecorder;
pub use sample::{MediaSample, MediaTime};
pub use session::{file_uri, RecordingSummary, SessionId, StartOptions};
pub use source::{CaptureConfig, CaptureSource, DisplayGeometry, MockCaptureSource, SampleSender};
pub use state::RecorderState;
pub use track::TrackKind;
pub use writer::{
    probe, ContainerWriter, FileContainerFactory, FileContainerWriter, WriterFactory,
    WriterStatus,
};
