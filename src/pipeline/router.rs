//! Forwards samples to their writer track.

use crate::session::SessionId;
use crate::writer::WriterHandle;
use crate::MediaSample;

/// Why a sample did not reach the writer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum DropReason {
    /// The session has no track for the sample's kind.
    TrackDisabled,
    /// The track cannot take more data right now.
    NotReady,
    /// The writer refused the sample.
    Rejected,
}

/// Result of routing one sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum RouteOutcome {
    /// The sample was appended to its track.
    Appended,
    /// The sample was dropped.
    Dropped(DropReason),
}

/// Routes samples of one session to the writer's tracks.
///
/// Routing never blocks and never retries: a sample that cannot be
/// appended right away is dropped.
#[derive(Debug, Clone, Copy)]
pub(crate) struct TrackRouter {
    session: SessionId,
}

impl TrackRouter {
    pub fn new(session: SessionId) -> Self {
        Self { session }
    }

    /// Appends `sample` to the track for its kind if that track exists and
    /// is ready.
    pub fn route(&self, writer: &mut WriterHandle, sample: &MediaSample) -> RouteOutcome {
        let Some(track) = writer.track_for(sample.kind) else {
            tracing::trace!(session = %self.session, track = %sample.kind, "Track disabled, sample dropped");
            return RouteOutcome::Dropped(DropReason::TrackDisabled);
        };

        if !writer.is_ready(track) {
            tracing::trace!(session = %self.session, track = %sample.kind, "Track not ready, sample dropped");
            return RouteOutcome::Dropped(DropReason::NotReady);
        }

        match writer.append(track, sample) {
            Ok(()) => RouteOutcome::Appended,
            Err(e) => {
                tracing::debug!(
                    session = %self.session,
                    track = %sample.kind,
                    timestamp = %sample.timestamp,
                    error = %e,
                    "Writer rejected sample"
                );
                RouteOutcome::Dropped(DropReason::Rejected)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::writer::test_support::{recording_writer, WriterLog};
    use crate::{MediaTime, TrackKind};

    fn started(log: &WriterLog, kinds: &[TrackKind]) -> WriterHandle {
        let mut writer = recording_writer(log, kinds);
        writer.begin(MediaTime::ZERO);
        writer
    }

    #[test]
    fn test_routes_to_matching_track() {
        let log = WriterLog::default();
        let mut writer = started(&log, &[TrackKind::Video, TrackKind::MicAudio]);
        let router = TrackRouter::new(SessionId::new(1));

        let frame = MediaSample::video(MediaTime::from_millis(1), vec![1]);
        let audio = MediaSample::mic_audio(MediaTime::from_millis(2), vec![1]);

        assert_eq!(router.route(&mut writer, &frame), RouteOutcome::Appended);
        assert_eq!(router.route(&mut writer, &audio), RouteOutcome::Appended);
        assert_eq!(log.appended(TrackKind::Video), 1);
        assert_eq!(log.appended(TrackKind::MicAudio), 1);
    }

    #[test]
    fn test_disabled_kind_is_dropped() {
        let log = WriterLog::default();
        let mut writer = started(&log, &[TrackKind::Video]);
        let router = TrackRouter::new(SessionId::new(1));

        let audio = MediaSample::app_audio(MediaTime::from_millis(2), vec![1]);
        assert_eq!(
            router.route(&mut writer, &audio),
            RouteOutcome::Dropped(DropReason::TrackDisabled)
        );
        assert!(log.appends().is_empty());
    }

    #[test]
    fn test_not_ready_track_is_dropped_without_retry() {
        let log = WriterLog::default();
        let mut writer = started(&log, &[TrackKind::Video]);
        let router = TrackRouter::new(SessionId::new(1));
        log.set_not_ready(TrackKind::Video);

        let frame = MediaSample::video(MediaTime::from_millis(1), vec![1]);
        assert_eq!(
            router.route(&mut writer, &frame),
            RouteOutcome::Dropped(DropReason::NotReady)
        );

        log.set_ready(TrackKind::Video);
        let next = MediaSample::video(MediaTime::from_millis(2), vec![1]);
        assert_eq!(router.route(&mut writer, &next), RouteOutcome::Appended);
        assert_eq!(log.appends(), vec![(TrackKind::Video, MediaTime::from_millis(2))]);
    }

    #[test]
    fn test_writer_rejection_is_a_drop() {
        let log = WriterLog::default();
        let mut writer = recording_writer(&log, &[TrackKind::Video]);
        writer.begin(MediaTime::from_millis(100));
        let router = TrackRouter::new(SessionId::new(1));

        let early = MediaSample::video(MediaTime::from_millis(50), vec![1]);
        assert_eq!(
            router.route(&mut writer, &early),
            RouteOutcome::Dropped(DropReason::Rejected)
        );
    }
}
