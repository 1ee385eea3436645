//! Configuration types for the recorder.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Subdirectory of the platform cache directory used by default.
const DEFAULT_OUTPUT_SUBDIR: &str = "screen-recorder";

/// Video codecs a writer may be asked to produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VideoCodec {
    /// H.264 / AVC.
    #[default]
    H264,
    /// H.265 / HEVC.
    Hevc,
}

impl VideoCodec {
    pub(crate) fn to_tag(self) -> u8 {
        match self {
            Self::H264 => 1,
            Self::Hevc => 2,
        }
    }
}

/// H.264 profile and level selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum VideoProfile {
    /// Baseline profile, encoder-chosen level.
    BaselineAutoLevel,
    /// Main profile, encoder-chosen level.
    MainAutoLevel,
    /// High profile, encoder-chosen level.
    #[default]
    HighAutoLevel,
}

/// Audio codecs a writer may be asked to produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AudioCodec {
    /// MPEG-4 AAC.
    #[default]
    Aac,
    /// Uncompressed linear PCM.
    Pcm,
}

impl AudioCodec {
    pub(crate) fn to_tag(self) -> u8 {
        match self {
            Self::Aac => 16,
            Self::Pcm => 17,
        }
    }
}

/// Encoding profile for the video track.
///
/// Dimensions are not part of this profile: they come from the display at
/// the moment each recording is prepared.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoEncoding {
    /// Codec. Default: H.264
    pub codec: VideoCodec,
    /// Average bitrate in bits per second. Default: 10 Mbit/s
    pub average_bitrate: u32,
    /// Profile and level. Default: High, auto level
    pub profile: VideoProfile,
}

impl Default for VideoEncoding {
    fn default() -> Self {
        Self {
            codec: VideoCodec::H264,
            average_bitrate: 10_000_000,
            profile: VideoProfile::HighAutoLevel,
        }
    }
}

/// Encoding profile shared by both audio tracks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AudioEncoding {
    /// Codec. Default: AAC
    pub codec: AudioCodec,
    /// Channel count. Default: 2
    pub channels: u16,
    /// Sample rate in Hz. Default: 44100
    pub sample_rate: u32,
    /// Encoder bitrate in bits per second. Default: 128 kbit/s
    pub bitrate: u32,
}

impl Default for AudioEncoding {
    fn default() -> Self {
        Self {
            codec: AudioCodec::Aac,
            channels: 2,
            sample_rate: 44_100,
            bitrate: 128_000,
        }
    }
}

/// Configuration for recorder behavior.
///
/// Use [`RecorderConfig::default()`] for sensible defaults, or customize as needed.
///
/// # Example
///
/// ```
/// use screen_recorder::RecorderConfig;
/// use std::time::Duration;
///
/// let config = RecorderConfig {
///     output_dir: std::env::temp_dir().join("captures"),
///     capture_timeout: Duration::from_secs(3),
///     ..Default::default()
/// };
/// ```
#[derive(Debug, Clone)]
pub struct RecorderConfig {
    /// Directory recordings are written to.
    ///
    /// Created on demand when a recording is prepared.
    /// Default: the platform cache directory plus `screen-recorder`
    pub output_dir: PathBuf,

    /// File name prefix; files are named `{prefix}-{unix_millis}.{extension}`.
    ///
    /// Default: `recording`
    pub file_prefix: String,

    /// Video track encoding profile.
    pub video: VideoEncoding,

    /// Audio track encoding profile.
    pub audio: AudioEncoding,

    /// Capacity of the queue between the capture source and the recorder.
    ///
    /// When the queue is full, new samples are dropped rather than
    /// blocking the capture source.
    /// Default: 256
    pub sample_queue_capacity: usize,

    /// Upper bound on capture source start and stop requests.
    ///
    /// Default: 10 seconds
    pub capture_timeout: Duration,
}

impl RecorderConfig {
    /// Returns the default output directory for this platform.
    ///
    /// Uses the user cache directory when one is known, otherwise the
    /// system temp directory.
    pub fn default_output_dir() -> PathBuf {
        directories::BaseDirs::new()
            .map_or_else(std::env::temp_dir, |dirs| dirs.cache_dir().to_path_buf())
            .join(DEFAULT_OUTPUT_SUBDIR)
    }
}

impl Default for RecorderConfig {
    fn default() -> Self {
        Self {
            output_dir: Self::default_output_dir(),
            file_prefix: "recording".to_string(),
            video: VideoEncoding::default(),
            audio: AudioEncoding::default(),
            sample_queue_capacity: 256,
            capture_timeout: Duration::from_secs(10),
        }
    }
}
