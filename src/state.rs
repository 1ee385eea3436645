//! Recorder state and its lock-free publication.

use std::sync::atomic::{AtomicU8, Ordering};

use serde::{Deserialize, Serialize};

/// Current state of the recorder.
///
/// ```text
/// Idle ──start──▶ Recording ──stop──▶ Stopping ──▶ Idle
///                     │                   │
///                     └──error/cancel─────┴──────▶ Idle
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecorderState {
    /// No recording in progress.
    #[default]
    Idle,
    /// Samples are being written.
    Recording,
    /// Capture is shutting down and the file is being finalized.
    Stopping,
}

impl RecorderState {
    /// Returns the lowercase name used at the control boundary.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Recording => "recording",
            Self::Stopping => "stopping",
        }
    }

    /// Returns `true` while a session exists.
    pub fn is_active(&self) -> bool {
        !matches!(self, Self::Idle)
    }

    fn to_u8(self) -> u8 {
        match self {
            Self::Idle => 0,
            Self::Recording => 1,
            Self::Stopping => 2,
        }
    }

    fn from_u8(value: u8) -> Self {
        match value {
            1 => Self::Recording,
            2 => Self::Stopping,
            _ => Self::Idle,
        }
    }
}

impl std::fmt::Display for RecorderState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// State shared between the recorder task and its handles.
///
/// Only the recorder task writes; handles read without blocking.
#[derive(Debug, Default)]
pub(crate) struct StateCell {
    state: AtomicU8,
}

impl StateCell {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self) -> RecorderState {
        RecorderState::from_u8(self.state.load(Ordering::SeqCst))
    }

    /// Stores `next` and returns the previous state.
    pub fn set(&self, next: RecorderState) -> RecorderState {
        RecorderState::from_u8(self.state.swap(next.to_u8(), Ordering::SeqCst))
    }
}
