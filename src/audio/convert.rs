//! Sample conversion for the AI collaborator
//!
//! The collaborator consumes 16-bit little-endian PCM at 16kHz, base64
//! encoded, one packet per analysis block. Replies come back in the same
//! encoding.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use crate::error::{Result, StudioError};

/// Sample rate expected by the collaborator
pub const COLLABORATOR_SAMPLE_RATE: u32 = 16000;

/// MIME tag attached to every outbound packet
pub const PCM_MIME_TYPE: &str = "audio/pcm;rate=16000";

/// Quantize float samples to signed 16-bit PCM
///
/// Samples are clamped to [-1, 1]. Negative values scale by 32768 and
/// non-negative values by 32767 so both rails are reachable; the fractional
/// part is truncated toward zero.
pub fn float_to_pcm16(samples: &[f32]) -> Vec<i16> {
    let mut out = Vec::with_capacity(samples.len());
    float_to_pcm16_into(samples, &mut out);
    out
}

/// Same as [`float_to_pcm16`] but reuses the output buffer
pub fn float_to_pcm16_into(samples: &[f32], out: &mut Vec<i16>) {
    out.clear();
    out.extend(samples.iter().map(|&s| {
        let s = if s.is_nan() { 0.0 } else { s.clamp(-1.0, 1.0) };
        if s < 0.0 {
            (s * 32768.0) as i16
        } else {
            (s * 32767.0) as i16
        }
    }));
}

/// Serialize PCM samples as little-endian bytes
pub fn pcm16_to_le_bytes(samples: &[i16]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(samples.len() * 2);
    for sample in samples {
        bytes.extend_from_slice(&sample.to_le_bytes());
    }
    bytes
}

/// Decode little-endian 16-bit PCM bytes back to floats (÷32768)
///
/// A trailing odd byte is ignored.
pub fn pcm16_le_bytes_to_float(bytes: &[u8]) -> Vec<f32> {
    bytes
        .chunks_exact(2)
        .map(|pair| i16::from_le_bytes([pair[0], pair[1]]) as f32 / 32768.0)
        .collect()
}

pub fn encode_base64(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}

pub fn decode_base64(data: &str) -> Result<Vec<u8>> {
    STANDARD.decode(data).map_err(|e| StudioError::Encoding {
        reason: format!("invalid base64 payload: {}", e),
    })
}

/// Streaming linear-interpolation resampler
///
/// Carries its fractional read position and the previous block's last
/// sample across calls so consecutive blocks resample as one stream.
#[derive(Debug, Clone)]
pub struct Resampler {
    /// Input samples advanced per output sample
    step: f64,
    /// Read position relative to the start of the next input block
    position: f64,
    /// Last sample of the previous block (index -1)
    last: f32,
    output: Vec<f32>,
}

impl Resampler {
    pub fn new(input_rate: u32, output_rate: u32, max_block: usize) -> Result<Self> {
        if input_rate == 0 || output_rate == 0 {
            return Err(StudioError::Configuration {
                reason: format!(
                    "cannot resample from {} Hz to {} Hz",
                    input_rate, output_rate
                ),
            });
        }
        let step = input_rate as f64 / output_rate as f64;
        let capacity = (max_block as f64 / step).ceil() as usize + 2;
        Ok(Self {
            step,
            position: 0.0,
            last: 0.0,
            output: Vec::with_capacity(capacity),
        })
    }

    /// Resample one block; the returned slice is valid until the next call
    pub fn process(&mut self, input: &[f32]) -> &[f32] {
        self.output.clear();
        if input.is_empty() {
            return &self.output;
        }

        let len = input.len();
        let last_index = (len - 1) as f64;
        while self.position <= last_index {
            let floor = self.position.floor();
            let frac = (self.position - floor) as f32;
            let index = floor as isize;

            let s0 = if index < 0 {
                self.last
            } else {
                input[index as usize]
            };
            let next = (index + 1) as usize;
            let s1 = if next < len { input[next] } else { s0 };

            self.output.push(s0 + (s1 - s0) * frac);
            self.position += self.step;
        }

        self.position -= len as f64;
        self.last = input[len - 1];
        &self.output
    }

    pub fn reset(&mut self) {
        self.position = 0.0;
        self.last = 0.0;
        self.output.clear();
    }
}

/// One outbound packet for the collaborator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PcmPacket {
    /// Base64 of 16-bit little-endian PCM
    pub data: String,
    pub mime_type: &'static str,
    /// Number of 16kHz samples in the packet
    pub sample_count: usize,
}

impl PcmPacket {
    /// Decode the payload back into PCM samples
    pub fn decode(&self) -> Result<Vec<i16>> {
        let bytes = decode_base64(&self.data)?;
        Ok(bytes
            .chunks_exact(2)
            .map(|pair| i16::from_le_bytes([pair[0], pair[1]]))
            .collect())
    }
}

/// Device block → 16kHz → PCM16 → base64, with reusable buffers
#[derive(Debug, Clone)]
pub struct PcmFramer {
    resampler: Resampler,
    pcm: Vec<i16>,
    bytes: Vec<u8>,
}

impl PcmFramer {
    pub fn new(device_rate: u32, max_block: usize) -> Result<Self> {
        let resampler = Resampler::new(device_rate, COLLABORATOR_SAMPLE_RATE, max_block)?;
        Ok(Self {
            resampler,
            pcm: Vec::with_capacity(max_block),
            bytes: Vec::with_capacity(max_block * 2),
        })
    }

    /// Packetize one analysis block
    pub fn packetize(&mut self, block: &[f32]) -> PcmPacket {
        let resampled = self.resampler.process(block);
        float_to_pcm16_into(resampled, &mut self.pcm);

        self.bytes.clear();
        for sample in &self.pcm {
            self.bytes.extend_from_slice(&sample.to_le_bytes());
        }

        PcmPacket {
            data: encode_base64(&self.bytes),
            mime_type: PCM_MIME_TYPE,
            sample_count: self.pcm.len(),
        }
    }

    pub fn reset(&mut self) {
        self.resampler.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(0.0 => 0)]
    #[test_case(1.0 => 32767)]
    #[test_case(-1.0 => -32768)]
    #[test_case(2.5 => 32767; "clamps above")]
    #[test_case(-3.0 => -32768; "clamps below")]
    #[test_case(0.5 => 16383; "truncates toward zero")]
    #[test_case(-0.5 => -16384)]
    fn test_quantization(sample: f32) -> i16 {
        float_to_pcm16(&[sample])[0]
    }

    #[test]
    fn test_nan_quantizes_to_silence() {
        assert_eq!(float_to_pcm16(&[f32::NAN]), vec![0]);
    }

    #[test]
    fn test_le_byte_layout() {
        assert_eq!(pcm16_to_le_bytes(&[0x0102, -1]), vec![0x02, 0x01, 0xFF, 0xFF]);
    }

    #[test]
    fn test_decode_reply_bytes() {
        let floats = pcm16_le_bytes_to_float(&[0x00, 0x80, 0x00, 0x40, 0x7F]);
        assert_eq!(floats, vec![-1.0, 0.5]);
    }

    #[test]
    fn test_invalid_base64_is_an_encoding_error() {
        let err = decode_base64("***").unwrap_err();
        assert_eq!(err.error_code(), "ENCODING");
    }

    #[test]
    fn test_resampler_three_to_one() {
        let mut resampler = Resampler::new(48000, 16000, 4096).unwrap();
        let input: Vec<f32> = (0..9).map(|i| i as f32).collect();
        assert_eq!(resampler.process(&input), &[0.0, 3.0, 6.0]);
        // Next block continues the stream: positions 9, 12 → local 0, 3
        let next: Vec<f32> = (9..15).map(|i| i as f32).collect();
        assert_eq!(resampler.process(&next), &[9.0, 12.0]);
    }

    #[test]
    fn test_resampler_interpolates_across_block_boundary() {
        // 2 → 1.5 ratio leaves fractional positions straddling blocks
        let mut resampler = Resampler::new(3, 2, 16).unwrap();
        let a = resampler.process(&[0.0, 1.0]).to_vec();
        assert_eq!(a, vec![0.0]);
        // position is now -0.5 relative to the new block
        let b = resampler.process(&[2.0, 3.0]).to_vec();
        assert_eq!(b, vec![1.5, 3.0]);
    }

    #[test]
    fn test_resampler_long_stream_count() {
        let mut resampler = Resampler::new(48000, 16000, 4096).unwrap();
        let block = vec![0.0_f32; 4096];
        let total: usize = (0..100).map(|_| resampler.process(&block).len()).sum();
        let expected = 4096 * 100 / 3;
        assert!((total as i64 - expected as i64).abs() <= 1);
    }

    #[test]
    fn test_packet_round_trip_through_base64() {
        let mut framer = PcmFramer::new(16000, 8).unwrap();
        let packet = framer.packetize(&[0.0, 1.0, -1.0]);
        assert_eq!(packet.mime_type, PCM_MIME_TYPE);
        assert_eq!(packet.sample_count, 3);
        assert_eq!(packet.decode().unwrap(), vec![0, 32767, -32768]);
    }
}
