//! Video + audio track composition
//!
//! The composer owns both media clocks. Audio presentation time comes from the
//! running sample count. Video presentation time comes from the session clock:
//! each frame is stamped at the `1/fps` slot nearest to the elapsed time the
//! caller reports, so a late or skipped frame tick leaves a gap in the video
//! track instead of pulling later frames earlier than the audio they belong
//! to. Encoded bytes are cut into segments every `timeslice_ms` of media time
//! and queued for the recorder.
//!
//! # Chunk stream layout
//!
//! Stream header (21 bytes):
//! - Bytes 0-3: magic `CCST`
//! - Byte 4: format version
//! - Bytes 5-8: video width (LE)
//! - Bytes 9-12: video height (LE)
//! - Bytes 13-16: frames per second (LE)
//! - Bytes 17-20: audio sample rate (LE)
//!
//! Each packet (13-byte header + payload):
//! - Byte 0: track (0 = video PNG, 1 = audio PCM16 LE mono)
//! - Bytes 1-8: presentation time in microseconds (LE)
//! - Bytes 9-12: payload length (LE)

use std::collections::VecDeque;

use log::{debug, warn};

use crate::audio::float_to_pcm16_into;
use crate::error::{Result, StudioError};
use crate::render::Surface;

pub const CHUNK_MIME_TYPE: &str = "video/x-chalkcast";
pub const CHUNK_EXTENSION: &str = "ccst";

pub const STREAM_MAGIC: &[u8; 4] = b"CCST";
pub const STREAM_VERSION: u8 = 1;
pub const STREAM_HEADER_SIZE: usize = 21;
pub const PACKET_HEADER_SIZE: usize = 13;

/// Default segment length
pub const DEFAULT_TIMESLICE_MS: u64 = 1000;

/// Track parameters fixed for the lifetime of one stream
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamFormat {
    pub width: u32,
    pub height: u32,
    pub fps: u32,
    pub sample_rate: u32,
}

impl StreamFormat {
    pub fn validate(&self) -> Result<()> {
        if self.width == 0 || self.height == 0 {
            return Err(StudioError::invalid_parameter(
                "video_size",
                format!("{}x{}", self.width, self.height),
                "non-zero width and height",
            ));
        }
        if self.fps == 0 {
            return Err(StudioError::invalid_parameter("fps", self.fps, "> 0"));
        }
        if self.sample_rate == 0 {
            return Err(StudioError::invalid_parameter("sample_rate", self.sample_rate, "> 0"));
        }
        Ok(())
    }
}

/// Packet track identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Track {
    Video = 0,
    Audio = 1,
}

impl Track {
    pub fn from_byte(b: u8) -> Option<Self> {
        match b {
            0 => Some(Track::Video),
            1 => Some(Track::Audio),
            _ => None,
        }
    }
}

/// Turns track data into container bytes
pub trait MediaEncoder: Send {
    /// MIME type of the produced stream
    fn mime_type(&self) -> &str;

    /// Whether this encoder can produce `mime_type`
    fn supports(&self, mime_type: &str) -> bool {
        mime_type == self.mime_type()
    }

    /// Start a new stream; any previous state is discarded
    fn begin(&mut self, format: StreamFormat) -> Result<()>;

    fn write_video(&mut self, pts_us: u64, frame: &Surface) -> Result<()>;

    fn write_audio(&mut self, pts_us: u64, samples: &[f32]) -> Result<()>;

    /// Bytes produced since the last call
    fn take_pending(&mut self) -> Vec<u8>;
}

/// Built-in container: PNG video packets and PCM16 audio packets
#[derive(Debug, Default)]
pub struct ChunkMuxer {
    pending: Vec<u8>,
    png: Vec<u8>,
    pcm: Vec<i16>,
}

impl ChunkMuxer {
    pub fn new() -> Self {
        Self::default()
    }

    fn write_packet(&mut self, track: Track, pts_us: u64, payload_len: usize) {
        self.pending.push(track as u8);
        self.pending.extend_from_slice(&pts_us.to_le_bytes());
        self.pending
            .extend_from_slice(&(payload_len as u32).to_le_bytes());
    }
}

impl MediaEncoder for ChunkMuxer {
    fn mime_type(&self) -> &str {
        CHUNK_MIME_TYPE
    }

    fn begin(&mut self, format: StreamFormat) -> Result<()> {
        format.validate()?;
        self.pending.clear();
        self.pending.extend_from_slice(STREAM_MAGIC);
        self.pending.push(STREAM_VERSION);
        self.pending.extend_from_slice(&format.width.to_le_bytes());
        self.pending.extend_from_slice(&format.height.to_le_bytes());
        self.pending.extend_from_slice(&format.fps.to_le_bytes());
        self.pending.extend_from_slice(&format.sample_rate.to_le_bytes());
        Ok(())
    }

    fn write_video(&mut self, pts_us: u64, frame: &Surface) -> Result<()> {
        let mut png = std::mem::take(&mut self.png);
        png.clear();
        let encoded = frame.encode_png(&mut png);
        if encoded.is_ok() {
            self.write_packet(Track::Video, pts_us, png.len());
            self.pending.extend_from_slice(&png);
        }
        self.png = png;
        encoded
    }

    fn write_audio(&mut self, pts_us: u64, samples: &[f32]) -> Result<()> {
        let mut pcm = std::mem::take(&mut self.pcm);
        float_to_pcm16_into(samples, &mut pcm);
        self.write_packet(Track::Audio, pts_us, pcm.len() * 2);
        for s in &pcm {
            self.pending.extend_from_slice(&s.to_le_bytes());
        }
        self.pcm = pcm;
        Ok(())
    }

    fn take_pending(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.pending)
    }
}

/// One parsed packet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    pub track: Track,
    pub pts_us: u64,
    pub payload: Vec<u8>,
}

/// Parsed chunk stream
#[derive(Debug, Clone)]
pub struct Demuxed {
    pub format: StreamFormat,
    pub packets: Vec<Packet>,
}

fn read_u32(buf: &[u8], at: usize) -> u32 {
    let mut b = [0u8; 4];
    b.copy_from_slice(&buf[at..at + 4]);
    u32::from_le_bytes(b)
}

fn read_u64(buf: &[u8], at: usize) -> u64 {
    let mut b = [0u8; 8];
    b.copy_from_slice(&buf[at..at + 8]);
    u64::from_le_bytes(b)
}

/// Parse a complete chunk stream (the concatenated artifact)
pub fn demux(data: &[u8]) -> Result<Demuxed> {
    let malformed = |reason: String| StudioError::Encoding { reason };

    if data.len() < STREAM_HEADER_SIZE {
        return Err(malformed(format!(
            "stream header needs {} bytes, got {}",
            STREAM_HEADER_SIZE,
            data.len()
        )));
    }
    if &data[0..4] != STREAM_MAGIC {
        return Err(malformed("bad stream magic".to_string()));
    }
    if data[4] != STREAM_VERSION {
        return Err(malformed(format!("unsupported stream version {}", data[4])));
    }
    let format = StreamFormat {
        width: read_u32(data, 5),
        height: read_u32(data, 9),
        fps: read_u32(data, 13),
        sample_rate: read_u32(data, 17),
    };

    let mut packets = Vec::new();
    let mut at = STREAM_HEADER_SIZE;
    while at < data.len() {
        if data.len() - at < PACKET_HEADER_SIZE {
            return Err(malformed(format!("truncated packet header at byte {}", at)));
        }
        let track = Track::from_byte(data[at])
            .ok_or_else(|| malformed(format!("unknown track {} at byte {}", data[at], at)))?;
        let pts_us = read_u64(data, at + 1);
        let len = read_u32(data, at + 9) as usize;
        let start = at + PACKET_HEADER_SIZE;
        if data.len() - start < len {
            return Err(malformed(format!("truncated payload at byte {}", start)));
        }
        packets.push(Packet {
            track,
            pts_us,
            payload: data[start..start + len].to_vec(),
        });
        at = start + len;
    }

    Ok(Demuxed { format, packets })
}

/// Presentation time of `count` units at `rate` units per second
fn pts_us(count: u64, rate: u32) -> u64 {
    count * 1_000_000 / rate as u64
}

/// Feeds both tracks into a `MediaEncoder` and queues timesliced segments
pub struct StreamComposer {
    encoder: Box<dyn MediaEncoder>,
    format: Option<StreamFormat>,
    timeslice_us: u64,
    samples_written: u64,
    frames_written: u64,
    last_video_slot: Option<u64>,
    next_cut_us: u64,
    segments: VecDeque<Vec<u8>>,
    delivery_failures: u64,
}

impl StreamComposer {
    pub fn new(encoder: Box<dyn MediaEncoder>, timeslice_ms: u64) -> Result<Self> {
        if timeslice_ms == 0 {
            return Err(StudioError::invalid_parameter("timeslice_ms", timeslice_ms, "> 0"));
        }
        Ok(Self {
            encoder,
            format: None,
            timeslice_us: timeslice_ms * 1000,
            samples_written: 0,
            frames_written: 0,
            last_video_slot: None,
            next_cut_us: timeslice_ms * 1000,
            segments: VecDeque::new(),
            delivery_failures: 0,
        })
    }

    pub fn mime_type(&self) -> &str {
        self.encoder.mime_type()
    }

    pub fn supports(&self, mime_type: &str) -> bool {
        self.encoder.supports(mime_type)
    }

    pub fn is_active(&self) -> bool {
        self.format.is_some()
    }

    /// Reset both clocks and start a new stream
    pub fn begin(&mut self, format: StreamFormat) -> Result<()> {
        self.encoder.begin(format)?;
        self.format = Some(format);
        self.samples_written = 0;
        self.frames_written = 0;
        self.last_video_slot = None;
        self.next_cut_us = self.timeslice_us;
        self.segments.clear();
        self.delivery_failures = 0;
        debug!("Composer started: {:?}", format);
        Ok(())
    }

    /// Audio track media time in microseconds
    pub fn audio_time_us(&self) -> u64 {
        self.format
            .map(|f| pts_us(self.samples_written, f.sample_rate))
            .unwrap_or(0)
    }

    /// Video track media time in microseconds: the end of the latest frame slot
    pub fn video_time_us(&self) -> u64 {
        match (self.format, self.last_video_slot) {
            (Some(f), Some(slot)) => pts_us(slot + 1, f.fps),
            _ => 0,
        }
    }

    pub fn frames_written(&self) -> u64 {
        self.frames_written
    }

    pub fn samples_written(&self) -> u64 {
        self.samples_written
    }

    pub fn delivery_failures(&self) -> u64 {
        self.delivery_failures
    }

    pub fn push_audio(&mut self, samples: &[f32]) -> Result<()> {
        let format = self.format.ok_or(StudioError::NoActiveSession)?;
        let pts = pts_us(self.samples_written, format.sample_rate);
        self.samples_written += samples.len() as u64;
        self.encoder.write_audio(pts, samples)?;
        self.maybe_cut();
        Ok(())
    }

    /// Frame slot nearest to `elapsed_us`, always after the previous frame's slot
    fn video_slot(&self, elapsed_us: u64, fps: u32) -> u64 {
        let nearest = (elapsed_us * fps as u64 + 500_000) / 1_000_000;
        match self.last_video_slot {
            Some(last) if nearest <= last => last + 1,
            _ => nearest,
        }
    }

    /// Stamp `frame` at `elapsed_us` of session time, snapped to a `1/fps` slot.
    /// A failed frame is counted and skipped; its slot stays used.
    pub fn push_video(&mut self, frame: &Surface, elapsed_us: u64) -> Result<()> {
        let format = self.format.ok_or(StudioError::NoActiveSession)?;
        let slot = self.video_slot(elapsed_us, format.fps);
        let pts = pts_us(slot, format.fps);
        self.last_video_slot = Some(slot);
        self.frames_written += 1;
        if let Err(e) = self.encoder.write_video(pts, frame) {
            self.delivery_failures += 1;
            warn!("Dropped video frame at {} us: {}", pts, e);
            return Err(StudioError::EncoderDelivery {
                reason: e.to_string(),
            });
        }
        self.maybe_cut();
        Ok(())
    }

    fn maybe_cut(&mut self) {
        let now = self.audio_time_us().max(self.video_time_us());
        if now < self.next_cut_us {
            return;
        }
        while self.next_cut_us <= now {
            self.next_cut_us += self.timeslice_us;
        }
        self.cut();
    }

    fn cut(&mut self) {
        let segment = self.encoder.take_pending();
        if !segment.is_empty() {
            self.segments.push_back(segment);
        }
    }

    /// Emit the final segment and close the stream
    pub fn flush(&mut self) {
        if self.format.take().is_some() {
            self.cut();
            debug!(
                "Composer flushed: {} frames, {} samples",
                self.frames_written, self.samples_written
            );
        }
    }

    /// Oldest queued segment
    pub fn next_segment(&mut self) -> Option<Vec<u8>> {
        self.segments.pop_front()
    }

    pub fn queued_segments(&self) -> usize {
        self.segments.len()
    }
}

impl std::fmt::Debug for StreamComposer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamComposer")
            .field("mime_type", &self.encoder.mime_type())
            .field("format", &self.format)
            .field("samples_written", &self.samples_written)
            .field("frames_written", &self.frames_written)
            .field("queued_segments", &self.segments.len())
            .finish()
    }
}
