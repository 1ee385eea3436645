//! Track kind identification.

use serde::{Deserialize, Serialize};

/// The media stream a sample belongs to.
///
/// A recording always carries a [`Video`](TrackKind::Video) track. The two
/// audio tracks exist only when enabled through [`StartOptions`].
///
/// # Example
///
/// ```
/// use screen_recorder::TrackKind;
///
/// assert!(TrackKind::MicAudio.is_audio());
/// assert_eq!(TrackKind::AppAudio.to_string(), "app_audio");
/// ```
///
/// [`StartOptions`]: crate::StartOptions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TrackKind {
    /// Screen frames.
    Video,
    /// Microphone audio mixed in by the capture source.
    MicAudio,
    /// Audio produced by the captured application.
    AppAudio,
}

impl TrackKind {
    /// All kinds in container order.
    pub const ALL: [TrackKind; 3] = [TrackKind::Video, TrackKind::MicAudio, TrackKind::AppAudio];

    /// Returns the kind's short name, used in logs and file metadata.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Video => "video",
            Self::MicAudio => "mic_audio",
            Self::AppAudio => "app_audio",
        }
    }

    /// Returns `true` for the two audio kinds.
    pub fn is_audio(&self) -> bool {
        !matches!(self, Self::Video)
    }

    /// Stable on-disk tag for the file container.
    pub(crate) fn to_tag(self) -> u8 {
        match self {
            Self::Video => 0,
            Self::MicAudio => 1,
            Self::AppAudio => 2,
        }
    }

    pub(crate) fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            0 => Some(Self::Video),
            1 => Some(Self::MicAudio),
            2 => Some(Self::AppAudio),
            _ => None,
        }
    }
}

impl std::fmt::Display for TrackKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
