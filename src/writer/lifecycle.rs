//! Creation, finalization and disposal of one recording's writer.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::{
    AudioFormat, ContainerWriter, TrackConfig, TrackFormat, TrackId, VideoFormat, WriterFactory,
    WriterStatus,
};
use crate::config::{AudioEncoding, RecorderConfig, VideoEncoding};
use crate::pipeline::TrackTable;
use crate::session::StartOptions;
use crate::source::DisplayGeometry;
use crate::{MediaSample, MediaTime, RecorderError, TrackKind, WriterError};

/// Exclusive owner of a started writer, its output path and its tracks.
///
/// Exactly one of [`finalize`](Self::finalize) or [`discard`](Self::discard)
/// ends the handle's life and decides the fate of the file.
pub(crate) struct WriterHandle {
    writer: Box<dyn ContainerWriter>,
    path: PathBuf,
    tracks: TrackTable,
}

impl std::fmt::Debug for WriterHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WriterHandle")
            .field("path", &self.path)
            .field("tracks", &self.tracks)
            .field("status", &self.writer.status())
            .finish_non_exhaustive()
    }
}

impl WriterHandle {
    /// Opens a writer for a new recording and starts it.
    ///
    /// The file is named `{prefix}-{unix_millis}.{extension}` inside the
    /// configured output directory. A stale file with that name is removed
    /// first. On failure nothing is left on disk.
    pub async fn prepare(
        factory: Arc<dyn WriterFactory>,
        config: &RecorderConfig,
        options: &StartOptions,
        display: DisplayGeometry,
    ) -> Result<Self, RecorderError> {
        let file_name = format!(
            "{}-{}.{}",
            config.file_prefix,
            chrono::Utc::now().timestamp_millis(),
            factory.extension()
        );
        let path = config.output_dir.join(file_name);
        let tracks = track_configs(config, options, display);

        tracing::debug!(
            writer = factory.name(),
            path = %path.display(),
            tracks = tracks.len(),
            "Preparing writer"
        );

        let task_path = path.clone();
        let opened = tokio::task::spawn_blocking(move || {
            open_blocking(factory.as_ref(), &task_path, &tracks)
        })
        .await;

        match opened {
            Ok(Ok((writer, tracks))) => Ok(Self {
                writer,
                path,
                tracks,
            }),
            Ok(Err(reason)) => Err(RecorderError::prepare_failed(reason)),
            Err(join_error) => {
                remove_output(path).await;
                Err(RecorderError::prepare_failed(join_error.to_string()))
            }
        }
    }

    /// Wraps an already started writer.
    #[cfg(test)]
    pub fn from_parts(writer: Box<dyn ContainerWriter>, path: PathBuf, tracks: TrackTable) -> Self {
        Self {
            writer,
            path,
            tracks,
        }
    }

    /// Output file of this recording.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Tracks created for this recording.
    pub fn tracks(&self) -> &TrackTable {
        &self.tracks
    }

    /// Starts the writer session at `origin`.
    pub fn begin(&mut self, origin: MediaTime) {
        self.writer.start_session(origin);
    }

    /// Returns the track for `kind`, or `None` if that kind is disabled.
    pub fn track_for(&self, kind: TrackKind) -> Option<TrackId> {
        self.tracks.get(kind)
    }

    /// Returns `true` if `track` can take another sample now.
    pub fn is_ready(&self, track: TrackId) -> bool {
        self.writer.is_ready_for_more_data(track)
    }

    /// Appends a sample to `track`.
    pub fn append(&mut self, track: TrackId, sample: &MediaSample) -> Result<(), WriterError> {
        self.writer.append(track, sample)
    }

    /// Marks every track finished and finishes the container.
    ///
    /// Returns the output path if the writer completed. Any other terminal
    /// status deletes the file and fails with [`RecorderError::WriteFailed`].
    pub async fn finalize(self) -> Result<PathBuf, RecorderError> {
        let Self {
            mut writer,
            path,
            tracks,
        } = self;

        for (_, track) in tracks.iter() {
            writer.mark_finished(track);
        }

        let finished = tokio::task::spawn_blocking(move || {
            let status = writer.finish();
            (writer, status)
        })
        .await;

        let reason = match finished {
            Ok((_, WriterStatus::Completed)) => {
                tracing::debug!(path = %path.display(), "Writer completed");
                return Ok(path);
            }
            Ok((mut writer, status)) => {
                writer.cancel();
                drop(writer);
                status.to_string()
            }
            Err(join_error) => join_error.to_string(),
        };

        tracing::warn!(path = %path.display(), %reason, "Writer did not complete");
        remove_output(path).await;
        Err(RecorderError::write_failed(reason))
    }

    /// Abandons the writer and deletes the output file.
    pub async fn discard(self) {
        let Self {
            mut writer, path, ..
        } = self;

        let task_path = path.clone();
        let result = tokio::task::spawn_blocking(move || {
            writer.cancel();
            drop(writer);
            remove_file_if_exists(&task_path)
        })
        .await;

        match result {
            Ok(Ok(())) => tracing::debug!(path = %path.display(), "Discarded recording output"),
            Ok(Err(e)) => {
                tracing::warn!(path = %path.display(), error = %e, "Failed to delete recording output");
            }
            Err(e) => tracing::warn!(error = %e, "Discard task failed"),
        }
    }
}

/// Video track configuration for a frame of `pixels` (width, height).
pub(crate) fn video_track(
    encoding: &VideoEncoding,
    pixels: (u32, u32),
    frame_rate: Option<u32>,
) -> TrackConfig {
    TrackConfig {
        kind: TrackKind::Video,
        format: TrackFormat::Video(VideoFormat {
            codec: encoding.codec,
            width: pixels.0,
            height: pixels.1,
            average_bitrate: encoding.average_bitrate,
            profile: encoding.profile,
            frame_rate,
        }),
        real_time: true,
    }
}

/// Audio track configuration for `kind`.
pub(crate) fn audio_track(kind: TrackKind, encoding: &AudioEncoding) -> TrackConfig {
    TrackConfig {
        kind,
        format: TrackFormat::Audio(AudioFormat {
            codec: encoding.codec,
            channels: encoding.channels,
            sample_rate: encoding.sample_rate,
            bitrate: encoding.bitrate,
        }),
        real_time: true,
    }
}

/// Track configurations for one recording, video first.
fn track_configs(
    config: &RecorderConfig,
    options: &StartOptions,
    display: DisplayGeometry,
) -> Vec<TrackConfig> {
    let mut tracks = vec![video_track(&config.video, display.pixel_size(), options.fps)];
    if options.mic {
        tracks.push(audio_track(TrackKind::MicAudio, &config.audio));
    }
    if options.app_audio {
        tracks.push(audio_track(TrackKind::AppAudio, &config.audio));
    }
    tracks
}

fn open_blocking(
    factory: &dyn WriterFactory,
    path: &Path,
    tracks: &[TrackConfig],
) -> Result<(Box<dyn ContainerWriter>, TrackTable), String> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)
            .map_err(|e| format!("cannot create output directory {}: {e}", dir.display()))?;
    }
    remove_file_if_exists(path)
        .map_err(|e| format!("cannot remove stale file {}: {e}", path.display()))?;

    let mut writer = match factory.create(path) {
        Ok(writer) => writer,
        Err(e) => {
            let _ = remove_file_if_exists(path);
            return Err(e.to_string());
        }
    };

    match configure(writer.as_mut(), tracks) {
        Ok(table) => Ok((writer, table)),
        Err(e) => {
            writer.cancel();
            drop(writer);
            let _ = remove_file_if_exists(path);
            Err(e.to_string())
        }
    }
}

fn configure(
    writer: &mut dyn ContainerWriter,
    tracks: &[TrackConfig],
) -> Result<TrackTable, WriterError> {
    let mut table = TrackTable::new();
    for config in tracks {
        let id = writer.add_track(config)?;
        table.insert(config.kind, id);
    }
    writer.start_writing()?;
    Ok(table)
}

fn remove_file_if_exists(path: &Path) -> io::Result<()> {
    match std::fs::remove_file(path) {
        Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e),
        _ => Ok(()),
    }
}

async fn remove_output(path: PathBuf) {
    let result = tokio::task::spawn_blocking(move || remove_file_if_exists(&path)).await;
    if let Ok(Err(e)) = result {
        tracing::warn!(error = %e, "Failed to delete recording output");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::writer::test_support::{recording_writer_at, ScriptedFactory, WriterLog};
    use crate::writer::FileContainerFactory;
    use tempfile::tempdir;

    fn config_in(dir: &Path) -> RecorderConfig {
        RecorderConfig {
            output_dir: dir.join("out"),
            ..Default::default()
        }
    }

    fn display() -> DisplayGeometry {
        DisplayGeometry::new(390, 844, 3.0)
    }

    #[tokio::test]
    async fn test_prepare_creates_directory_and_tracks() {
        let dir = tempdir().unwrap();
        let log = WriterLog::default();
        let options = StartOptions {
            mic: true,
            app_audio: false,
            fps: Some(30),
        };

        let handle = WriterHandle::prepare(
            Arc::new(ScriptedFactory::new(&log)),
            &config_in(dir.path()),
            &options,
            display(),
        )
        .await
        .unwrap();

        assert!(handle.path().exists());
        assert_eq!(handle.path().extension().unwrap(), "fake");
        let name = handle.path().file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("recording-"));
        assert_eq!(log.tracks(), vec![TrackKind::Video, TrackKind::MicAudio]);
        assert!(handle.track_for(TrackKind::AppAudio).is_none());
    }

    #[test]
    fn test_video_track_uses_pixel_size() {
        let options = StartOptions::default();
        let tracks = track_configs(&RecorderConfig::default(), &options, display());

        assert_eq!(tracks.len(), 3);
        match &tracks[0].format {
            TrackFormat::Video(video) => {
                assert_eq!((video.width, video.height), (1170, 2532));
                assert_eq!(video.average_bitrate, 10_000_000);
            }
            TrackFormat::Audio(_) => panic!("first track must be video"),
        }
        assert!(tracks.iter().all(|t| t.real_time));
    }

    #[tokio::test]
    async fn test_prepare_rejected_track_leaves_no_file() {
        let dir = tempdir().unwrap();
        let config = config_in(dir.path());
        let log = WriterLog::default();
        log.reject_track(TrackKind::MicAudio);

        let err = WriterHandle::prepare(
            Arc::new(ScriptedFactory::new(&log)),
            &config,
            &StartOptions::default(),
            display(),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, RecorderError::PrepareFailed { .. }));
        assert_eq!(std::fs::read_dir(&config.output_dir).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_prepare_start_failure_leaves_no_file() {
        let dir = tempdir().unwrap();
        let config = config_in(dir.path());
        let log = WriterLog::default();
        log.fail_start();

        let err = WriterHandle::prepare(
            Arc::new(ScriptedFactory::new(&log)),
            &config,
            &StartOptions::default(),
            display(),
        )
        .await
        .unwrap_err();

        assert_eq!(err.code(), "ERR_RECORDER_PREPARE_FAILED");
        assert_eq!(std::fs::read_dir(&config.output_dir).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_prepare_fails_when_directory_is_a_file() {
        let dir = tempdir().unwrap();
        let blocker = dir.path().join("out");
        std::fs::write(&blocker, b"not a directory").unwrap();

        let err = WriterHandle::prepare(
            Arc::new(FileContainerFactory),
            &config_in(dir.path()),
            &StartOptions::default(),
            display(),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, RecorderError::PrepareFailed { .. }));
    }

    #[tokio::test]
    async fn test_finalize_marks_tracks_and_keeps_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("keep.fake");
        std::fs::write(&path, b"").unwrap();
        let log = WriterLog::default();
        let handle =
            recording_writer_at(&log, &[TrackKind::Video, TrackKind::AppAudio], path.clone());

        let finalized = handle.finalize().await.unwrap();

        assert_eq!(finalized, path);
        assert!(path.exists());
        assert_eq!(
            log.finished_tracks(),
            vec![TrackKind::Video, TrackKind::AppAudio]
        );
        assert_eq!(log.finish_calls(), 1);
    }

    #[tokio::test]
    async fn test_finalize_failure_deletes_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("broken.fake");
        std::fs::write(&path, b"").unwrap();
        let log = WriterLog::default();
        log.set_final_status(WriterStatus::Failed("encoder crashed".to_string()));
        let handle = recording_writer_at(&log, &[TrackKind::Video], path.clone());

        let err = handle.finalize().await.unwrap_err();

        assert_eq!(err, RecorderError::write_failed("failed: encoder crashed"));
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_discard_cancels_and_deletes() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("gone.fake");
        std::fs::write(&path, b"").unwrap();
        let log = WriterLog::default();
        let handle = recording_writer_at(&log, &[TrackKind::Video], path.clone());

        handle.discard().await;

        assert!(log.cancelled());
        assert!(!path.exists());
    }

    #[test]
    fn test_open_removes_stale_and_partial_files() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("recording-1.fake");
        std::fs::write(&path, b"stale contents").unwrap();
        let log = WriterLog::default();
        log.fail_create();
        let tracks = track_configs(&RecorderConfig::default(), &StartOptions::default(), display());

        let err = open_blocking(&ScriptedFactory::new(&log), &path, &tracks).err().unwrap();

        assert!(err.contains("scripted create failure"));
        assert!(!path.exists());
    }

    #[test]
    fn test_remove_file_if_exists_ignores_missing() {
        let dir = tempdir().unwrap();
        assert!(remove_file_if_exists(&dir.path().join("missing.fake")).is_ok());
    }
}
