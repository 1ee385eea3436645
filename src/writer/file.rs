//! Packetized file container writer.

use std::fs::File;
use std::io::{BufWriter, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use super::{ContainerWriter, TrackConfig, TrackFormat, TrackId, WriterFactory, WriterStatus};
use crate::{MediaSample, MediaTime, WriterError};

// Container layout, all integers little-endian:
//   header (32 bytes) | track table (32 bytes per track) | packets...
// The header and track table are written as placeholders when writing
// starts and rewritten with final counts when the container is finished.

/// File extension of the packetized container.
pub const FILE_CONTAINER_EXTENSION: &str = "screc";

/// Magic bytes at the start of every container.
pub(crate) const MAGIC: &[u8; 4] = b"SREC";

/// Container format version.
pub(crate) const VERSION: u16 = 1;

/// Size of the file header in bytes.
pub(crate) const HEADER_SIZE: usize = 32;

/// Size of one track table entry in bytes.
pub(crate) const TRACK_ENTRY_SIZE: usize = 32;

/// Size of the header in front of each packet payload.
pub(crate) const PACKET_HEADER_SIZE: usize = 16;

/// Header flag set once the container was finished.
pub(crate) const FLAG_FINALIZED: u32 = 1;

/// Origin value stored while no session has started.
pub(crate) const NO_ORIGIN: i64 = i64::MIN;

/// Maximum number of tracks per container.
const MAX_TRACKS: usize = 8;

/// Creates [`FileContainerWriter`]s.
///
/// # Example
///
/// ```no_run
/// use screen_recorder::{FileContainerFactory, ScreenRecorder, MockCaptureSource};
///
/// # async fn demo() {
/// let recorder = ScreenRecorder::builder(MockCaptureSource::new())
///     .writer(FileContainerFactory)
///     .build();
/// # }
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct FileContainerFactory;

impl WriterFactory for FileContainerFactory {
    fn name(&self) -> &str {
        "file-container"
    }

    fn extension(&self) -> &str {
        FILE_CONTAINER_EXTENSION
    }

    fn create(&self, path: &Path) -> Result<Box<dyn ContainerWriter>, WriterError> {
        Ok(Box::new(FileContainerWriter::create(path)?))
    }
}

struct TrackEntry {
    config: TrackConfig,
    packets: u32,
    last_timestamp_ns: Option<i64>,
    finished: bool,
}

/// A [`ContainerWriter`] that stores samples as packets in a single file.
///
/// Payloads are stored as delivered; encoding happens upstream. The writer
/// enforces the muxing contract: no tracks after writing starts, no appends
/// before the session origin, per-track timestamps never go backwards, and
/// finished tracks take no more data.
pub struct FileContainerWriter {
    path: PathBuf,
    writer: Option<BufWriter<File>>,
    tracks: Vec<TrackEntry>,
    status: WriterStatus,
    origin: Option<MediaTime>,
    packet_count: u64,
}

impl FileContainerWriter {
    /// Creates the file at `path`.
    ///
    /// # Errors
    ///
    /// Returns a file error if the file cannot be created.
    pub fn create(path: impl AsRef<Path>) -> Result<Self, WriterError> {
        let path = path.as_ref().to_path_buf();
        let file = File::create(&path).map_err(|e| WriterError::file_error(&path, e))?;
        Ok(Self {
            path,
            writer: Some(BufWriter::new(file)),
            tracks: Vec::new(),
            status: WriterStatus::Unknown,
            origin: None,
            packet_count: 0,
        })
    }

    /// Returns the path of the container file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Encodes the header and track table with the current counters.
    fn encode_preamble(&self, finalized: bool) -> Vec<u8> {
        let mut buf = Vec::with_capacity(HEADER_SIZE + TRACK_ENTRY_SIZE * self.tracks.len());

        buf.extend_from_slice(MAGIC);
        buf.extend_from_slice(&VERSION.to_le_bytes());
        buf.extend_from_slice(&(self.tracks.len() as u16).to_le_bytes());
        let flags = if finalized { FLAG_FINALIZED } else { 0 };
        buf.extend_from_slice(&flags.to_le_bytes());
        buf.extend_from_slice(&0u32.to_le_bytes());
        let origin = self.origin.map_or(NO_ORIGIN, |o| o.as_nanos());
        buf.extend_from_slice(&origin.to_le_bytes());
        buf.extend_from_slice(&self.packet_count.to_le_bytes());

        for entry in &self.tracks {
            let (codec, a, b, bitrate, frame_rate) = match &entry.config.format {
                TrackFormat::Video(video) => (
                    video.codec.to_tag(),
                    video.width,
                    video.height,
                    video.average_bitrate,
                    video.frame_rate.unwrap_or(0),
                ),
                TrackFormat::Audio(audio) => (
                    audio.codec.to_tag(),
                    audio.sample_rate,
                    u32::from(audio.channels),
                    audio.bitrate,
                    0,
                ),
            };
            buf.push(entry.config.kind.to_tag());
            buf.push(codec);
            buf.extend_from_slice(&0u16.to_le_bytes());
            buf.extend_from_slice(&a.to_le_bytes());
            buf.extend_from_slice(&b.to_le_bytes());
            buf.extend_from_slice(&bitrate.to_le_bytes());
            buf.extend_from_slice(&frame_rate.to_le_bytes());
            buf.extend_from_slice(&entry.packets.to_le_bytes());
            buf.extend_from_slice(&entry.last_timestamp_ns.unwrap_or(0).to_le_bytes());
        }

        buf
    }

    /// Records an I/O failure; the writer accepts nothing afterwards.
    fn fail(&mut self, source: std::io::Error) -> WriterError {
        self.status = WriterStatus::Failed(source.to_string());
        WriterError::file_error(&self.path, source)
    }

    fn finalize_blocking(&mut self) -> std::io::Result<()> {
        let preamble = self.encode_preamble(true);
        if let Some(ref mut writer) = self.writer {
            writer.seek(SeekFrom::Start(0))?;
            writer.write_all(&preamble)?;
            writer.seek(SeekFrom::End(0))?;
            writer.flush()?;
            writer.get_ref().sync_all()?;
        }
        Ok(())
    }
}

impl ContainerWriter for FileContainerWriter {
    fn add_track(&mut self, config: &TrackConfig) -> Result<TrackId, WriterError> {
        if self.status != WriterStatus::Unknown {
            return Err(WriterError::invalid_state(
                "tracks cannot be added after writing started",
            ));
        }
        if self.tracks.len() >= MAX_TRACKS {
            return Err(WriterError::TrackRejected {
                kind: config.kind,
                reason: format!("container holds at most {MAX_TRACKS} tracks"),
            });
        }
        let valid = match &config.format {
            TrackFormat::Video(video) => {
                video.width > 0 && video.height > 0 && !config.kind.is_audio()
            }
            TrackFormat::Audio(audio) => {
                audio.channels > 0 && audio.sample_rate > 0 && config.kind.is_audio()
            }
        };
        if !valid {
            return Err(WriterError::TrackRejected {
                kind: config.kind,
                reason: "format does not match track kind or has zero dimensions".to_string(),
            });
        }

        self.tracks.push(TrackEntry {
            config: config.clone(),
            packets: 0,
            last_timestamp_ns: None,
            finished: false,
        });
        Ok(TrackId::new(self.tracks.len() - 1))
    }

    fn start_writing(&mut self) -> Result<(), WriterError> {
        if self.status != WriterStatus::Unknown {
            return Err(WriterError::invalid_state("writing already started"));
        }
        if self.tracks.is_empty() {
            return Err(WriterError::invalid_state("no tracks configured"));
        }

        let preamble = self.encode_preamble(false);
        let result = match self.writer {
            Some(ref mut writer) => writer.write_all(&preamble),
            None => return Err(WriterError::invalid_state("file already closed")),
        };
        result.map_err(|e| self.fail(e))?;

        self.status = WriterStatus::Writing;
        Ok(())
    }

    fn start_session(&mut self, origin: MediaTime) {
        if self.status == WriterStatus::Writing && self.origin.is_none() {
            self.origin = Some(origin);
        }
    }

    fn is_ready_for_more_data(&self, track: TrackId) -> bool {
        self.status == WriterStatus::Writing
            && self
                .tracks
                .get(track.index())
                .is_some_and(|entry| !entry.finished)
    }

    fn append(&mut self, track: TrackId, sample: &MediaSample) -> Result<(), WriterError> {
        if self.status != WriterStatus::Writing {
            return Err(WriterError::invalid_state(format!(
                "cannot append while {}",
                self.status
            )));
        }
        let origin = self.origin.ok_or(WriterError::SessionNotStarted)?;
        let entry = self
            .tracks
            .get(track.index())
            .ok_or(WriterError::UnknownTrack(track.index()))?;
        let kind = entry.config.kind;
        if entry.finished {
            return Err(WriterError::TrackFinished { kind });
        }

        let relative = sample.timestamp.saturating_sub(origin).as_nanos();
        let previous = entry.last_timestamp_ns.unwrap_or(0);
        if relative < previous {
            return Err(WriterError::OutOfOrder {
                kind,
                timestamp_ns: relative,
                previous_ns: previous,
            });
        }
        let len = u32::try_from(sample.payload.len())
            .map_err(|_| WriterError::invalid_state("payload larger than 4 GiB"))?;

        let mut header = [0u8; PACKET_HEADER_SIZE];
        header[0] = track.index() as u8;
        header[4..12].copy_from_slice(&relative.to_le_bytes());
        header[12..16].copy_from_slice(&len.to_le_bytes());

        let result = match self.writer {
            Some(ref mut writer) => match writer.write_all(&header) {
                Ok(()) => writer.write_all(&sample.payload),
                Err(e) => Err(e),
            },
            None => return Err(WriterError::invalid_state("file already closed")),
        };
        result.map_err(|e| self.fail(e))?;

        if let Some(entry) = self.tracks.get_mut(track.index()) {
            entry.packets += 1;
            entry.last_timestamp_ns = Some(relative);
        }
        self.packet_count += 1;
        Ok(())
    }

    fn mark_finished(&mut self, track: TrackId) {
        if let Some(entry) = self.tracks.get_mut(track.index()) {
            entry.finished = true;
        }
    }

    fn finish(&mut self) -> WriterStatus {
        match self.status {
            WriterStatus::Writing => {}
            WriterStatus::Unknown => {
                self.status = WriterStatus::Failed("writing never started".to_string());
                self.writer = None;
                return self.status.clone();
            }
            _ => return self.status.clone(),
        }

        if self.origin.is_none() {
            self.status = WriterStatus::Failed("no samples were written".to_string());
            self.writer = None;
            return self.status.clone();
        }

        for entry in &mut self.tracks {
            entry.finished = true;
        }

        match self.finalize_blocking() {
            Ok(()) => self.status = WriterStatus::Completed,
            Err(e) => self.status = WriterStatus::Failed(e.to_string()),
        }
        self.writer = None;
        self.status.clone()
    }

    fn cancel(&mut self) {
        if self.status != WriterStatus::Completed {
            self.status = WriterStatus::Cancelled;
        }
        self.writer = None;
    }

    fn status(&self) -> WriterStatus {
        self.status.clone()
    }
}
