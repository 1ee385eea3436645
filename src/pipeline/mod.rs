//! Sample pipeline components.
//!
//! Samples flow from the capture source to the writer through the recorder
//! task:
//!
//! ```text
//! Capture Source → Sample Queue → Recorder Task → Track Router → Writer Track
//! ```
//!
//! - **Sample Queue**: bounded channel; full means the sample is dropped
//! - **Track Router**: picks the writer track for a sample, drops it if the
//!   track is disabled or not ready
//! - **Track Table**: which kinds have a track in the current recording
//!
//! Nothing on this path blocks the capture source.

mod router;
mod routing;

pub(crate) use router::{RouteOutcome, TrackRouter};
pub(crate) use routing::TrackTable;
