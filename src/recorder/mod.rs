//! Recording: codec negotiation, track composition and the session state machine
//!
//! Data flow: rendered frames and processed audio → `StreamComposer` →
//! encoder segments (FIFO) → `Recorder` → `Artifact`.

mod codec;
mod composer;
mod session;

pub use codec::{
    default_codec_preferences, CodecChoice, CodecNegotiator, CodecSupport, FALLBACK_EXTENSION,
    FALLBACK_MIME_TYPE,
};
pub use composer::{
    demux, ChunkMuxer, Demuxed, MediaEncoder, Packet, StreamComposer, StreamFormat, Track,
    CHUNK_EXTENSION, CHUNK_MIME_TYPE, DEFAULT_TIMESLICE_MS, PACKET_HEADER_SIZE,
    STREAM_HEADER_SIZE, STREAM_MAGIC, STREAM_VERSION,
};
pub use session::{Artifact, Recorder, RecorderState, RecordingSession};
