//! Container writer trait and implementations.
//!
//! A [`ContainerWriter`] is the muxing library the recorder drives. It is
//! strictly sequential: tracks are added, writing starts, the session
//! origin is set once, samples are appended per track, tracks are marked
//! finished and the container is finished. A [`WriterFactory`] creates one
//! writer per recording.
//!
//! The crate provides [`FileContainerWriter`], which stores samples in a
//! small packetized container, and [`probe`] to inspect its output. Other
//! muxers (MP4, Matroska) plug in by implementing the two traits.

mod file;
mod lifecycle;
mod probe;

#[cfg(test)]
pub(crate) mod test_support;

pub use file::{FileContainerFactory, FileContainerWriter, FILE_CONTAINER_EXTENSION};
pub(crate) use lifecycle::WriterHandle;
pub use probe::{probe, ContainerSummary, TrackParams, TrackSummary};

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::config::{AudioCodec, VideoCodec, VideoProfile};
use crate::{MediaSample, MediaTime, TrackKind, WriterError};

/// Identifies a track inside one writer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TrackId(usize);

impl TrackId {
    /// Creates a track id from the writer's track index.
    pub fn new(index: usize) -> Self {
        Self(index)
    }

    /// Returns the writer's track index.
    pub fn index(&self) -> usize {
        self.0
    }
}

/// Output settings for a video track.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoFormat {
    /// Codec to produce.
    pub codec: VideoCodec,
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// Average bitrate in bits per second.
    pub average_bitrate: u32,
    /// Profile and level.
    pub profile: VideoProfile,
    /// Expected frame rate, if the caller asked for one.
    pub frame_rate: Option<u32>,
}

/// Output settings for an audio track.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AudioFormat {
    /// Codec to produce.
    pub codec: AudioCodec,
    /// Channel count.
    pub channels: u16,
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// Bitrate in bits per second.
    pub bitrate: u32,
}

/// Format of one track.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TrackFormat {
    /// Video track settings.
    Video(VideoFormat),
    /// Audio track settings.
    Audio(AudioFormat),
}

/// Everything a writer needs to add a track.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackConfig {
    /// Which stream the track carries.
    pub kind: TrackKind,
    /// Codec and geometry.
    pub format: TrackFormat,
    /// Whether samples arrive in real time (writers should not buffer ahead).
    pub real_time: bool,
}

/// Writer status, mirroring the lifecycle of a muxing session.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum WriterStatus {
    /// Created, tracks may still be added.
    #[default]
    Unknown,
    /// Writing started, samples are accepted.
    Writing,
    /// The container was finished and is playable.
    Completed,
    /// The writer hit an unrecoverable error.
    Failed(String),
    /// Writing was abandoned.
    Cancelled,
}

impl std::fmt::Display for WriterStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unknown => f.write_str("unknown"),
            Self::Writing => f.write_str("writing"),
            Self::Completed => f.write_str("completed"),
            Self::Failed(reason) => write!(f, "failed: {reason}"),
            Self::Cancelled => f.write_str("cancelled"),
        }
    }
}

/// A sequential container muxer.
///
/// # Implementation Notes
///
/// - Methods are synchronous and are called from one task at a time.
/// - `add_track` is only valid before `start_writing`.
/// - `start_session` is called exactly once, before the first `append`.
/// - `append` must not block; a writer that cannot take more data should
///   report it through `is_ready_for_more_data` instead.
/// - `finish` may block on I/O; the recorder runs it on the blocking pool.
pub trait ContainerWriter: Send {
    /// Adds a track. Errors mean the configuration is not supported.
    fn add_track(&mut self, config: &TrackConfig) -> Result<TrackId, WriterError>;

    /// Opens the container for writing.
    fn start_writing(&mut self) -> Result<(), WriterError>;

    /// Sets the time origin every appended timestamp is measured against.
    fn start_session(&mut self, origin: MediaTime);

    /// Returns `true` if `track` can take another sample right now.
    fn is_ready_for_more_data(&self, track: TrackId) -> bool;

    /// Appends one sample to `track`.
    fn append(&mut self, track: TrackId, sample: &MediaSample) -> Result<(), WriterError>;

    /// Marks `track` as complete; later appends to it are rejected.
    fn mark_finished(&mut self, track: TrackId);

    /// Finishes the container and returns the terminal status.
    fn finish(&mut self) -> WriterStatus;

    /// Abandons writing. The recorder deletes the file afterwards.
    ///
    /// Default implementation does nothing.
    fn cancel(&mut self) {}

    /// Returns the current status.
    fn status(&self) -> WriterStatus;
}

/// Creates one [`ContainerWriter`] per recording.
pub trait WriterFactory: Send + Sync {
    /// Human-readable name for logging.
    fn name(&self) -> &str;

    /// File extension (without the dot) of the produced container.
    fn extension(&self) -> &str;

    /// Creates a writer for a new file at `path`.
    ///
    /// The directory exists and no file is present at `path`.
    fn create(&self, path: &Path) -> Result<Box<dyn ContainerWriter>, WriterError>;
}
