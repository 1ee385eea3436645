//! Reads back containers produced by [`FileContainerWriter`](super::FileContainerWriter).

use std::path::Path;

use super::file::{
    FLAG_FINALIZED, HEADER_SIZE, MAGIC, NO_ORIGIN, PACKET_HEADER_SIZE, TRACK_ENTRY_SIZE, VERSION,
};
use crate::{MediaTime, TrackKind, WriterError};

/// Track geometry as stored in the track table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackParams {
    /// Video dimensions and frame rate (`None` if unknown).
    Video {
        /// Width in pixels.
        width: u32,
        /// Height in pixels.
        height: u32,
        /// Expected frame rate.
        frame_rate: Option<u32>,
    },
    /// Audio format.
    Audio {
        /// Sample rate in Hz.
        sample_rate: u32,
        /// Channel count.
        channels: u32,
    },
}

/// One track of a probed container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackSummary {
    /// Stream carried by the track.
    pub kind: TrackKind,
    /// Codec tag as stored on disk.
    pub codec_tag: u8,
    /// Geometry of the track.
    pub params: TrackParams,
    /// Bitrate in bits per second.
    pub bitrate: u32,
    /// Number of packets stored for the track.
    pub packets: u32,
    /// Relative timestamp of the last packet.
    pub last_timestamp: MediaTime,
    /// Total payload bytes across the track's packets.
    pub payload_bytes: u64,
}

/// Summary of a container file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerSummary {
    /// Format version.
    pub version: u16,
    /// Whether the writer finished the file.
    pub finalized: bool,
    /// Session origin on the capture clock.
    pub origin: Option<MediaTime>,
    /// Total number of packets.
    pub packet_count: u64,
    /// Tracks in container order.
    pub tracks: Vec<TrackSummary>,
}

impl ContainerSummary {
    /// Number of tracks of the given kind.
    pub fn track_count(&self, kind: TrackKind) -> usize {
        self.tracks.iter().filter(|t| t.kind == kind).count()
    }

    /// The first track of the given kind.
    pub fn track(&self, kind: TrackKind) -> Option<&TrackSummary> {
        self.tracks.iter().find(|t| t.kind == kind)
    }
}

struct ByteReader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    fn take(&mut self, len: usize) -> Result<&'a [u8], WriterError> {
        if self.remaining() < len {
            return Err(WriterError::malformed(format!(
                "unexpected end of file at byte {}",
                self.pos
            )));
        }
        let slice = &self.buf[self.pos..self.pos + len];
        self.pos += len;
        Ok(slice)
    }

    fn array<const N: usize>(&mut self) -> Result<[u8; N], WriterError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    fn u8(&mut self) -> Result<u8, WriterError> {
        Ok(self.array::<1>()?[0])
    }

    fn u16(&mut self) -> Result<u16, WriterError> {
        Ok(u16::from_le_bytes(self.array()?))
    }

    fn u32(&mut self) -> Result<u32, WriterError> {
        Ok(u32::from_le_bytes(self.array()?))
    }

    fn i64(&mut self) -> Result<i64, WriterError> {
        Ok(i64::from_le_bytes(self.array()?))
    }

    fn u64(&mut self) -> Result<u64, WriterError> {
        Ok(u64::from_le_bytes(self.array()?))
    }
}

/// Parses a container file and checks its packets against the track table.
///
/// # Errors
///
/// Returns a file error if the file cannot be read, or
/// [`WriterError::Malformed`] if the contents are not a valid container.
pub fn probe(path: impl AsRef<Path>) -> Result<ContainerSummary, WriterError> {
    let path = path.as_ref();
    let data = std::fs::read(path).map_err(|e| WriterError::file_error(path, e))?;
    parse(&data)
}

fn parse(data: &[u8]) -> Result<ContainerSummary, WriterError> {
    if data.len() < HEADER_SIZE {
        return Err(WriterError::malformed("file shorter than header"));
    }
    let mut reader = ByteReader::new(data);

    if &reader.array::<4>()? != MAGIC {
        return Err(WriterError::malformed("bad magic"));
    }
    let version = reader.u16()?;
    if version != VERSION {
        return Err(WriterError::malformed(format!("unsupported version {version}")));
    }
    let track_count = usize::from(reader.u16()?);
    let flags = reader.u32()?;
    let _reserved = reader.u32()?;
    let origin = match reader.i64()? {
        NO_ORIGIN => None,
        nanos => Some(MediaTime::from_nanos(nanos)),
    };
    let packet_count = reader.u64()?;

    let mut tracks = Vec::with_capacity(track_count);
    for _ in 0..track_count {
        let entry = reader.take(TRACK_ENTRY_SIZE)?;
        let mut entry = ByteReader::new(entry);
        let kind_tag = entry.u8()?;
        let kind = TrackKind::from_tag(kind_tag)
            .ok_or_else(|| WriterError::malformed(format!("unknown track kind {kind_tag}")))?;
        let codec_tag = entry.u8()?;
        let _reserved = entry.u16()?;
        let a = entry.u32()?;
        let b = entry.u32()?;
        let bitrate = entry.u32()?;
        let frame_rate = entry.u32()?;
        let packets = entry.u32()?;
        let last_timestamp = MediaTime::from_nanos(entry.i64()?);

        let params = if kind.is_audio() {
            TrackParams::Audio {
                sample_rate: a,
                channels: b,
            }
        } else {
            TrackParams::Video {
                width: a,
                height: b,
                frame_rate: (frame_rate > 0).then_some(frame_rate),
            }
        };
        tracks.push(TrackSummary {
            kind,
            codec_tag,
            params,
            bitrate,
            packets,
            last_timestamp,
            payload_bytes: 0,
        });
    }

    let mut seen_packets = vec![0u32; tracks.len()];
    let mut total = 0u64;
    while reader.remaining() > 0 {
        if reader.remaining() < PACKET_HEADER_SIZE {
            return Err(WriterError::malformed("truncated packet header"));
        }
        let index = usize::from(reader.u8()?);
        let _reserved = reader.take(3)?;
        let _timestamp = reader.i64()?;
        let len = reader.u32()? as usize;
        reader.take(len)?;

        let track = tracks
            .get_mut(index)
            .ok_or_else(|| WriterError::malformed(format!("packet for unknown track {index}")))?;
        track.payload_bytes += len as u64;
        seen_packets[index] += 1;
        total += 1;
    }

    let finalized = flags & FLAG_FINALIZED != 0;
    if finalized {
        if total != packet_count {
            return Err(WriterError::malformed(format!(
                "header lists {packet_count} packets, found {total}"
            )));
        }
        for (track, seen) in tracks.iter().zip(&seen_packets) {
            if track.packets != *seen {
                return Err(WriterError::malformed(format!(
                    "{} track lists {} packets, found {seen}",
                    track.kind, track.packets
                )));
            }
        }
    }

    Ok(ContainerSummary {
        version,
        finalized,
        origin,
        packet_count: if finalized { packet_count } else { total },
        tracks,
    })
}
