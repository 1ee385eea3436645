//! Media samples and presentation timestamps.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::track::TrackKind;

/// A presentation timestamp in nanoseconds on the capture source's clock.
///
/// Capture sources stamp samples with their own monotonic clock; the
/// recorder only cares about differences, so the epoch is arbitrary.
///
/// # Example
///
/// ```
/// use screen_recorder::MediaTime;
///
/// let a = MediaTime::from_millis(1_500);
/// let b = MediaTime::from_millis(1_000);
/// assert_eq!(a.saturating_sub(b), MediaTime::from_millis(500));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct MediaTime(i64);

impl MediaTime {
    /// Timestamp zero.
    pub const ZERO: MediaTime = MediaTime(0);

    /// Creates a timestamp from nanoseconds.
    pub const fn from_nanos(nanos: i64) -> Self {
        Self(nanos)
    }

    /// Creates a timestamp from milliseconds.
    pub const fn from_millis(millis: i64) -> Self {
        Self(millis.saturating_mul(1_000_000))
    }

    /// Creates a timestamp from a [`Duration`], saturating at `i64::MAX` nanoseconds.
    pub fn from_duration(duration: Duration) -> Self {
        Self(i64::try_from(duration.as_nanos()).unwrap_or(i64::MAX))
    }

    /// Returns the timestamp in nanoseconds.
    pub const fn as_nanos(&self) -> i64 {
        self.0
    }

    /// Returns the timestamp in seconds.
    pub fn as_secs_f64(&self) -> f64 {
        self.0 as f64 / 1_000_000_000.0
    }

    /// Returns `self - other`, saturating at the numeric bounds.
    #[must_use]
    pub const fn saturating_sub(self, other: MediaTime) -> MediaTime {
        MediaTime(self.0.saturating_sub(other.0))
    }

    /// Returns `self + duration`, saturating at the numeric bounds.
    #[must_use]
    pub fn saturating_add(self, duration: Duration) -> MediaTime {
        MediaTime(self.0.saturating_add(Self::from_duration(duration).0))
    }
}

impl std::fmt::Display for MediaTime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.3}s", self.as_secs_f64())
    }
}

/// One timestamped unit of media delivered by a capture source.
///
/// A video sample usually carries one frame, an audio sample one buffer of
/// PCM or encoded audio. The payload is `Arc`-wrapped so samples can be
/// cloned cheaply while they queue between the capture thread and the
/// recorder.
///
/// # Example
///
/// ```
/// use screen_recorder::{MediaSample, MediaTime, TrackKind};
///
/// let frame = MediaSample::video(MediaTime::from_millis(16), vec![0u8; 64]);
/// assert_eq!(frame.kind, TrackKind::Video);
/// assert!(frame.is_data_ready());
/// ```
#[derive(Debug, Clone)]
pub struct MediaSample {
    /// Track the sample belongs to.
    pub kind: TrackKind,

    /// Presentation timestamp on the capture source's clock.
    pub timestamp: MediaTime,

    /// Encoded or raw media bytes.
    pub payload: Arc<Vec<u8>>,

    /// Whether the source finished filling the payload.
    ///
    /// Samples that are not ready are skipped by the recorder.
    pub data_ready: bool,
}

impl MediaSample {
    /// Creates a ready sample of the given kind.
    pub fn new(kind: TrackKind, timestamp: MediaTime, payload: Vec<u8>) -> Self {
        Self {
            kind,
            timestamp,
            payload: Arc::new(payload),
            data_ready: true,
        }
    }

    /// Creates a video sample.
    pub fn video(timestamp: MediaTime, payload: Vec<u8>) -> Self {
        Self::new(TrackKind::Video, timestamp, payload)
    }

    /// Creates a microphone audio sample.
    pub fn mic_audio(timestamp: MediaTime, payload: Vec<u8>) -> Self {
        Self::new(TrackKind::MicAudio, timestamp, payload)
    }

    /// Creates an application audio sample.
    pub fn app_audio(timestamp: MediaTime, payload: Vec<u8>) -> Self {
        Self::new(TrackKind::AppAudio, timestamp, payload)
    }

    /// Marks the payload as not yet ready.
    #[must_use]
    pub fn not_ready(mut self) -> Self {
        self.data_ready = false;
        self
    }

    /// Returns `true` if the sample can be handed to a writer.
    ///
    /// Empty payloads are treated as not ready.
    pub fn is_data_ready(&self) -> bool {
        self.data_ready && !self.payload.is_empty()
    }

    /// Returns the payload size in bytes.
    pub fn len(&self) -> usize {
        self.payload.len()
    }

    /// Returns `true` if the payload is empty.
    pub fn is_empty(&self) -> bool {
        self.payload.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_media_time_conversions() {
        assert_eq!(MediaTime::from_millis(2).as_nanos(), 2_000_000);
        assert_eq!(
            MediaTime::from_duration(Duration::from_millis(250)),
            MediaTime::from_millis(250)
        );
        assert!((MediaTime::from_millis(1_500).as_secs_f64() - 1.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_media_time_saturates() {
        let max = MediaTime::from_nanos(i64::MAX);
        assert_eq!(max.saturating_add(Duration::from_secs(1)), max);

        let min = MediaTime::from_nanos(i64::MIN);
        assert_eq!(min.saturating_sub(MediaTime::from_millis(1)), min);
    }

    #[test]
    fn test_media_time_display() {
        assert_eq!(MediaTime::from_millis(1_250).to_string(), "1.250s");
    }

    #[test]
    fn test_sample_constructors() {
        let ts = MediaTime::from_millis(10);
        assert_eq!(MediaSample::video(ts, vec![1]).kind, TrackKind::Video);
        assert_eq!(MediaSample::mic_audio(ts, vec![1]).kind, TrackKind::MicAudio);
        assert_eq!(MediaSample::app_audio(ts, vec![1]).kind, TrackKind::AppAudio);
    }

    #[test]
    fn test_sample_readiness() {
        let ts = MediaTime::ZERO;
        assert!(MediaSample::video(ts, vec![1, 2]).is_data_ready());
        assert!(!MediaSample::video(ts, vec![1, 2]).not_ready().is_data_ready());
        assert!(!MediaSample::video(ts, Vec::new()).is_data_ready());
    }

    #[test]
    fn test_sample_clone_shares_payload() {
        let sample = MediaSample::video(MediaTime::ZERO, vec![0u8; 1024]);
        let cloned = sample.clone();
        assert!(Arc::ptr_eq(&sample.payload, &cloned.payload));
        assert_eq!(cloned.len(), 1024);
    }
}
