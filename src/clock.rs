//! Session time origin.

use crate::sample::MediaTime;
use crate::writer::WriterHandle;

/// Establishes one time origin per recording.
///
/// The first observed timestamp becomes the origin and starts the writer's
/// session there. Every later sample is positioned relative to it by the
/// writer.
#[derive(Debug, Default)]
pub(crate) struct SessionClock {
    origin: Option<MediaTime>,
}

impl SessionClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the origin, if a sample has been observed.
    #[cfg(test)]
    pub fn origin(&self) -> Option<MediaTime> {
        self.origin
    }

    /// Records `timestamp` as the origin on first use and begins the writer
    /// session there. Returns the origin and whether this call set it.
    pub fn observe(
        &mut self,
        timestamp: MediaTime,
        writer: &mut WriterHandle,
    ) -> (MediaTime, bool) {
        match self.origin {
            Some(origin) => (origin, false),
            None => {
                writer.begin(timestamp);
                self.origin = Some(timestamp);
                (timestamp, true)
            }
        }
    }
}
