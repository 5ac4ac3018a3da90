//! Fixed-size audio blocks
//!
//! Devices deliver callbacks of whatever size they like; the DSP chain and
//! the collaborator framing both want fixed-size blocks. `BlockFramer`
//! rechunks without dropping or duplicating a single sample.

use crate::error::{Result, StudioError};

/// Fixed-size block of mono samples in [-1, 1]
#[derive(Debug, Clone, PartialEq)]
pub struct AudioFrame {
    samples: Vec<f32>,
    sample_rate: u32,
    /// Index of the first sample of this block in the session stream
    position: u64,
}

impl AudioFrame {
    /// Create a silent frame of `block_size` samples
    pub fn new(block_size: usize, sample_rate: u32) -> Self {
        Self {
            samples: vec![0.0; block_size],
            sample_rate,
            position: 0,
        }
    }

    /// Wrap existing samples
    pub fn from_samples(samples: Vec<f32>, sample_rate: u32, position: u64) -> Self {
        Self {
            samples,
            sample_rate,
            position,
        }
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn samples_mut(&mut self) -> &mut [f32] {
        &mut self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn position(&self) -> u64 {
        self.position
    }

    /// Start time of the block in seconds since the stream began
    pub fn start_secs(&self) -> f64 {
        self.position as f64 / self.sample_rate as f64
    }

    /// Duration of the block in seconds
    pub fn duration_secs(&self) -> f64 {
        self.samples.len() as f64 / self.sample_rate as f64
    }
}

/// Rechunks arbitrary-size input into fixed-size frames
///
/// # Example
/// ```
/// use chalkcast::audio::BlockFramer;
/// let mut framer = BlockFramer::new(4, 48000).unwrap();
/// let input = [0.1_f32; 6];
/// let consumed = framer.fill(&input);
/// assert_eq!(consumed, 4);
/// assert!(framer.is_ready());
/// framer.advance();
/// assert_eq!(framer.fill(&input[consumed..]), 2);
/// assert!(!framer.is_ready());
/// ```
#[derive(Debug, Clone)]
pub struct BlockFramer {
    frame: AudioFrame,
    filled: usize,
}

impl BlockFramer {
    pub fn new(block_size: usize, sample_rate: u32) -> Result<Self> {
        if block_size == 0 {
            return Err(StudioError::invalid_parameter(
                "block_size",
                block_size,
                "at least 1 sample",
            ));
        }
        if sample_rate == 0 {
            return Err(StudioError::invalid_parameter(
                "sample_rate",
                sample_rate,
                "a positive rate in Hz",
            ));
        }
        Ok(Self {
            frame: AudioFrame::new(block_size, sample_rate),
            filled: 0,
        })
    }

    /// Copy as many samples as fit into the pending frame.
    ///
    /// Returns the number of samples consumed from `input`. Consumes nothing
    /// while a completed frame is waiting for `advance`.
    pub fn fill(&mut self, input: &[f32]) -> usize {
        let capacity = self.frame.len() - self.filled;
        let count = capacity.min(input.len());
        self.frame.samples[self.filled..self.filled + count].copy_from_slice(&input[..count]);
        self.filled += count;
        count
    }

    /// True when a complete frame is ready
    pub fn is_ready(&self) -> bool {
        self.filled == self.frame.len()
    }

    /// The pending frame (complete only when `is_ready`)
    pub fn frame(&self) -> &AudioFrame {
        &self.frame
    }

    /// Release the completed frame and start the next one
    pub fn advance(&mut self) {
        if self.is_ready() {
            self.frame.position += self.frame.len() as u64;
            self.filled = 0;
        }
    }

    /// Number of samples waiting in the partial frame
    pub fn pending(&self) -> usize {
        self.filled
    }

    pub fn block_size(&self) -> usize {
        self.frame.len()
    }

    /// Drop any partial frame and restart the stream position at zero
    pub fn reset(&mut self) {
        self.filled = 0;
        self.frame.position = 0;
    }
}
