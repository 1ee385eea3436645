//! Scripted writer for unit tests.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;

use super::lifecycle::{audio_track, video_track};
use super::{ContainerWriter, TrackConfig, TrackId, WriterFactory, WriterHandle, WriterStatus};
use crate::config::{AudioEncoding, VideoEncoding};
use crate::pipeline::TrackTable;
use crate::{MediaSample, MediaTime, TrackKind, WriterError};

#[derive(Default)]
struct Script {
    not_ready: Vec<TrackKind>,
    reject_track: Option<TrackKind>,
    fail_create: bool,
    fail_start: bool,
    final_status: Option<WriterStatus>,
}

#[derive(Default)]
struct Calls {
    tracks: Vec<TrackKind>,
    session_starts: Vec<MediaTime>,
    appends: Vec<(TrackKind, MediaTime)>,
    finished: Vec<TrackKind>,
    finish_calls: usize,
    cancelled: bool,
}

/// Shared script and call log for [`ScriptedWriter`]s.
#[derive(Clone, Default)]
pub(crate) struct WriterLog {
    script: Arc<Mutex<Script>>,
    calls: Arc<Mutex<Calls>>,
}

impl WriterLog {
    pub fn set_not_ready(&self, kind: TrackKind) {
        self.script.lock().not_ready.push(kind);
    }

    pub fn set_ready(&self, kind: TrackKind) {
        self.script.lock().not_ready.retain(|k| *k != kind);
    }

    pub fn reject_track(&self, kind: TrackKind) {
        self.script.lock().reject_track = Some(kind);
    }

    pub fn fail_create(&self) {
        self.script.lock().fail_create = true;
    }

    pub fn fail_start(&self) {
        self.script.lock().fail_start = true;
    }

    pub fn set_final_status(&self, status: WriterStatus) {
        self.script.lock().final_status = Some(status);
    }

    pub fn tracks(&self) -> Vec<TrackKind> {
        self.calls.lock().tracks.clone()
    }

    pub fn session_starts(&self) -> Vec<MediaTime> {
        self.calls.lock().session_starts.clone()
    }

    pub fn appends(&self) -> Vec<(TrackKind, MediaTime)> {
        self.calls.lock().appends.clone()
    }

    pub fn appended(&self, kind: TrackKind) -> usize {
        self.calls
            .lock()
            .appends
            .iter()
            .filter(|(k, _)| *k == kind)
            .count()
    }

    pub fn finished_tracks(&self) -> Vec<TrackKind> {
        self.calls.lock().finished.clone()
    }

    pub fn finish_calls(&self) -> usize {
        self.calls.lock().finish_calls
    }

    pub fn cancelled(&self) -> bool {
        self.calls.lock().cancelled
    }
}

/// A [`ContainerWriter`] that records calls and follows a [`WriterLog`] script.
pub(crate) struct ScriptedWriter {
    log: WriterLog,
    kinds: Vec<TrackKind>,
    status: WriterStatus,
    origin: Option<MediaTime>,
}

impl ScriptedWriter {
    pub fn new(log: &WriterLog) -> Self {
        Self {
            log: log.clone(),
            kinds: Vec::new(),
            status: WriterStatus::Unknown,
            origin: None,
        }
    }

    fn kind(&self, track: TrackId) -> Result<TrackKind, WriterError> {
        self.kinds
            .get(track.index())
            .copied()
            .ok_or(WriterError::UnknownTrack(track.index()))
    }
}

impl ContainerWriter for ScriptedWriter {
    fn add_track(&mut self, config: &TrackConfig) -> Result<TrackId, WriterError> {
        if self.log.script.lock().reject_track == Some(config.kind) {
            return Err(WriterError::TrackRejected {
                kind: config.kind,
                reason: "scripted rejection".to_string(),
            });
        }
        self.kinds.push(config.kind);
        self.log.calls.lock().tracks.push(config.kind);
        Ok(TrackId::new(self.kinds.len() - 1))
    }

    fn start_writing(&mut self) -> Result<(), WriterError> {
        if self.log.script.lock().fail_start {
            self.status = WriterStatus::Failed("scripted start failure".to_string());
            return Err(WriterError::invalid_state("scripted start failure"));
        }
        self.status = WriterStatus::Writing;
        Ok(())
    }

    fn start_session(&mut self, origin: MediaTime) {
        self.origin = Some(origin);
        self.log.calls.lock().session_starts.push(origin);
    }

    fn is_ready_for_more_data(&self, track: TrackId) -> bool {
        match self.kind(track) {
            Ok(kind) => {
                self.status == WriterStatus::Writing
                    && !self.log.script.lock().not_ready.contains(&kind)
            }
            Err(_) => false,
        }
    }

    fn append(&mut self, track: TrackId, sample: &MediaSample) -> Result<(), WriterError> {
        let kind = self.kind(track)?;
        let origin = self.origin.ok_or(WriterError::SessionNotStarted)?;
        if sample.timestamp < origin {
            return Err(WriterError::OutOfOrder {
                kind,
                timestamp_ns: sample.timestamp.saturating_sub(origin).as_nanos(),
                previous_ns: 0,
            });
        }
        self.log.calls.lock().appends.push((kind, sample.timestamp));
        Ok(())
    }

    fn mark_finished(&mut self, track: TrackId) {
        if let Ok(kind) = self.kind(track) {
            self.log.calls.lock().finished.push(kind);
        }
    }

    fn finish(&mut self) -> WriterStatus {
        self.log.calls.lock().finish_calls += 1;
        self.status = self
            .log
            .script
            .lock()
            .final_status
            .clone()
            .unwrap_or(WriterStatus::Completed);
        self.status.clone()
    }

    fn cancel(&mut self) {
        self.log.calls.lock().cancelled = true;
        self.status = WriterStatus::Cancelled;
    }

    fn status(&self) -> WriterStatus {
        self.status.clone()
    }
}

/// Factory for [`ScriptedWriter`]s. Creates an empty file at the output path
/// so tests can observe whether it was kept or deleted.
#[derive(Clone, Default)]
pub(crate) struct ScriptedFactory {
    log: WriterLog,
}

impl ScriptedFactory {
    pub fn new(log: &WriterLog) -> Self {
        Self { log: log.clone() }
    }
}

impl WriterFactory for ScriptedFactory {
    fn name(&self) -> &str {
        "scripted"
    }

    fn extension(&self) -> &str {
        "fake"
    }

    fn create(&self, path: &Path) -> Result<Box<dyn ContainerWriter>, WriterError> {
        std::fs::write(path, b"").map_err(|e| WriterError::file_error(path, e))?;
        if self.log.script.lock().fail_create {
            return Err(WriterError::invalid_state("scripted create failure"));
        }
        Ok(Box::new(ScriptedWriter::new(&self.log)))
    }
}

fn track_config(kind: TrackKind) -> TrackConfig {
    match kind {
        TrackKind::Video => video_track(&VideoEncoding::default(), (1280, 720), None),
        audio => audio_track(audio, &AudioEncoding::default()),
    }
}

/// Builds a started [`WriterHandle`] around a [`ScriptedWriter`] with one
/// track per kind. No file is created.
pub(crate) fn recording_writer(log: &WriterLog, kinds: &[TrackKind]) -> WriterHandle {
    recording_writer_at(log, kinds, PathBuf::from("scripted-recording.fake"))
}

/// Like [`recording_writer`], with an explicit output path.
pub(crate) fn recording_writer_at(
    log: &WriterLog,
    kinds: &[TrackKind],
    path: PathBuf,
) -> WriterHandle {
    let mut writer = ScriptedWriter::new(log);
    let mut tracks = TrackTable::new();
    for kind in kinds {
        let id = writer
            .add_track(&track_config(*kind))
            .expect("scripted track");
        tracks.insert(*kind, id);
    }
    writer.start_writing().expect("scripted start");
    WriterHandle::from_parts(Box::new(writer), path, tracks)
}
