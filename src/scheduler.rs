//! Cooperative timeline for the two callback sources
//!
//! Audio blocks fire every `block_size / sample_rate` seconds (a block is due
//! once it has been fully captured) and display frames every `1 / fps`
//! seconds. Ticks come out in due-time order; a tie goes to audio so the
//! frame sees the freshest loudness. Due times are compared with integer
//! cross-multiplication, so the two clocks never drift apart.

use std::fmt;

use log::debug;
use serde::Serialize;

use crate::audio::AudioSource;
use crate::error::{Result, StudioError};
use crate::pipeline::StudioPipeline;

/// Which callback a tick runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskKind {
    AudioBlock,
    Frame,
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskKind::AudioBlock => write!(f, "audio"),
            TaskKind::Frame => write!(f, "frame"),
        }
    }
}

/// One scheduled callback
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tick {
    pub kind: TaskKind,
    /// Sequence number within its own kind, from 0
    pub index: u64,
    /// Due time in microseconds on the session clock
    pub due_us: u64,
}

impl Tick {
    pub fn due_ms(&self) -> u64 {
        self.due_us / 1000
    }
}

/// Infinite, ordered stream of audio and frame ticks
#[derive(Debug, Clone)]
pub struct Scheduler {
    sample_rate: u32,
    block_size: usize,
    fps: u32,
    audio_ticks: u64,
    frame_ticks: u64,
}

impl Scheduler {
    pub fn new(sample_rate: u32, block_size: usize, fps: u32) -> Result<Self> {
        if sample_rate == 0 || block_size == 0 || fps == 0 {
            return Err(StudioError::Configuration {
                reason: format!(
                    "scheduler needs positive rates (sample_rate {}, block_size {}, fps {})",
                    sample_rate, block_size, fps
                ),
            });
        }
        Ok(Self {
            sample_rate,
            block_size,
            fps,
            audio_ticks: 0,
            frame_ticks: 0,
        })
    }

    pub fn block_period_us(&self) -> f64 {
        self.block_size as f64 * 1e6 / self.sample_rate as f64
    }

    pub fn frame_period_us(&self) -> f64 {
        1e6 / self.fps as f64
    }

    fn audio_due_us(&self, index: u64) -> u64 {
        (index + 1) * self.block_size as u64 * 1_000_000 / self.sample_rate as u64
    }

    fn frame_due_us(&self, index: u64) -> u64 {
        index * 1_000_000 / self.fps as u64
    }

    /// Audio block `a` is due at (a+1)·block/sr, frame `v` at v/fps
    fn audio_first(&self) -> bool {
        let audio = (self.audio_ticks + 1) as u128 * self.block_size as u128 * self.fps as u128;
        let frame = self.frame_ticks as u128 * self.sample_rate as u128;
        audio <= frame
    }

    pub fn reset(&mut self) {
        self.audio_ticks = 0;
        self.frame_ticks = 0;
    }
}

impl Iterator for Scheduler {
    type Item = Tick;

    fn next(&mut self) -> Option<Tick> {
        let tick = if self.audio_first() {
            let index = self.audio_ticks;
            self.audio_ticks += 1;
            Tick {
                kind: TaskKind::AudioBlock,
                index,
                due_us: self.audio_due_us(index),
            }
        } else {
            let index = self.frame_ticks;
            self.frame_ticks += 1;
            Tick {
                kind: TaskKind::Frame,
                index,
                due_us: self.frame_due_us(index),
            }
        };
        Some(tick)
    }
}

/// Counts from one [`run_timeline`] call
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TimelineStats {
    pub audio_blocks: u64,
    pub frames: u64,
    pub end_ms: u64,
}

/// Drive `pipeline` from `source` for `duration_ms` of session time,
/// starting at `start_ms`. Every tick runs to completion before the next.
pub fn run_timeline(
    pipeline: &mut StudioPipeline,
    source: &mut dyn AudioSource,
    start_ms: u64,
    duration_ms: u64,
) -> Result<TimelineStats> {
    let config = pipeline.config();
    let scheduler = Scheduler::new(config.sample_rate, config.block_size, config.fps)?;
    let mut block = vec![0.0f32; config.block_size];
    let end_us = duration_ms * 1000;
    let mut stats = TimelineStats::default();

    for tick in scheduler.take_while(|t| t.due_us < end_us) {
        let now_ms = start_ms + tick.due_ms();
        match tick.kind {
            TaskKind::AudioBlock => {
                source.read_block(&mut block);
                pipeline.on_audio(&block, now_ms)?;
                stats.audio_blocks += 1;
            }
            TaskKind::Frame => {
                pipeline.on_frame(now_ms)?;
                stats.frames += 1;
            }
        }
        stats.end_ms = now_ms;
    }

    debug!(
        "Timeline ran {} audio blocks and {} frames over {} ms",
        stats.audio_blocks, stats.frames, duration_ms
    );
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_ticks_are_time_ordered() {
        let scheduler = Scheduler::new(48000, 4096, 30).unwrap();
        let ticks: Vec<Tick> = scheduler.take(200).collect();
        for pair in ticks.windows(2) {
            assert!(pair[0].due_us <= pair[1].due_us, "{:?}", pair);
        }
    }

    #[test]
    fn test_counts_over_one_second() {
        let scheduler = Scheduler::new(48000, 4800, 30).unwrap();
        let ticks: Vec<Tick> = scheduler.take_while(|t| t.due_us < 1_000_000).collect();
        let audio = ticks.iter().filter(|t| t.kind == TaskKind::AudioBlock).count();
        let frames = ticks.iter().filter(|t| t.kind == TaskKind::Frame).count();
        // Blocks due at 100ms..900ms, frames at 0..966ms
        assert_eq!(audio, 9);
        assert_eq!(frames, 30);
    }

    #[test]
    fn test_tie_goes_to_audio() {
        // Block period 100 ms, frame period 100 ms
        let mut scheduler = Scheduler::new(1000, 100, 10).unwrap();
        let first = scheduler.next().unwrap();
        assert_eq!(first.kind, TaskKind::Frame);
        let second = scheduler.next().unwrap();
        let third = scheduler.next().unwrap();
        assert_eq!((second.kind, second.due_us), (TaskKind::AudioBlock, 100_000));
        assert_eq!((third.kind, third.due_us), (TaskKind::Frame, 100_000));
    }

    #[test]
    fn test_zero_rates_rejected() {
        assert!(Scheduler::new(0, 4096, 30).is_err());
        assert!(Scheduler::new(48000, 0, 30).is_err());
        assert!(Scheduler::new(48000, 4096, 0).is_err());
    }

    #[test]
    fn test_no_drift_after_many_ticks() {
        let scheduler = Scheduler::new(44100, 1024, 60).unwrap();
        let last_audio = scheduler
            .filter(|t| t.kind == TaskKind::AudioBlock)
            .nth(99_999)
            .unwrap();
        assert_eq!(last_audio.due_us, 100_000u64 * 1024 * 1_000_000 / 44100);
    }
}
