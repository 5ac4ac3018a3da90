//! CLI Command Implementations
//!
//! Implements the actual logic for each CLI command.

use std::fs;
use std::path::{Path, PathBuf};

use log::{info, warn};

use crate::audio::{AudioSource, ToneSource, WavSource};
use crate::collaborator::{CollaboratorLink, MockCollaborator};
use crate::config::StudioConfig;
use crate::dsp::VoiceProfile;
use crate::error::Result;
use crate::pipeline::StudioPipeline;
use crate::recorder::{demux, Track};
use crate::render::AspectRatio;
use crate::scheduler::run_timeline;

/// Options for [`record`]
#[derive(Debug, Clone)]
pub struct RecordOptions {
    pub seconds: f64,
    pub profile: Option<String>,
    pub input: Option<PathBuf>,
    pub tone: f32,
    pub output: PathBuf,
    pub config: Option<PathBuf>,
    pub aspect: Option<String>,
    pub mock_ai: bool,
}

fn load_config(path: Option<&Path>) -> Result<StudioConfig> {
    match path {
        Some(path) => StudioConfig::load(path),
        None => Ok(StudioConfig::default()),
    }
}

/// Run one recording session and save the artifact.
pub fn record(options: &RecordOptions) -> Result<PathBuf> {
    let mut config = load_config(options.config.as_deref())?;
    if let Some(profile) = &options.profile {
        config.voice_profile = profile.parse()?;
    }
    if let Some(aspect) = &options.aspect {
        config.aspect_ratio = aspect.parse()?;
    }

    let mut source: Box<dyn AudioSource> = match &options.input {
        Some(path) => {
            let wav = WavSource::open(path)?;
            if wav.sample_rate() != config.sample_rate {
                warn!(
                    "{} is {} Hz; running the session at that rate",
                    path.display(),
                    wav.sample_rate()
                );
                config.sample_rate = wav.sample_rate();
            }
            Box::new(wav)
        }
        None => Box::new(ToneSource::new(options.tone, 0.5, config.sample_rate)),
    };

    let link = if options.mock_ai {
        let mock = MockCollaborator::new().with_reply_every(
            24,
            "Today we talk about waves",
            "What makes a wave travel?",
        );
        CollaboratorLink::new(Box::new(mock))
    } else {
        CollaboratorLink::detached()
    };

    info!(
        "Recording {:.1}s with {} voice at {}",
        options.seconds, config.voice_profile, config.aspect_ratio
    );

    let mut pipeline = StudioPipeline::new(config, link)?;
    pipeline.start_recording(source.as_mut(), 0)?;
    let duration_ms = (options.seconds.max(0.0) * 1000.0) as u64;
    let timeline = run_timeline(&mut pipeline, source.as_mut(), 0, duration_ms)?;
    let artifact = pipeline.stop_recording()?;
    let path = artifact.save_to(&options.output)?;

    let transcript = pipeline.transcript();
    if !transcript.is_empty() {
        let transcript_path = path.with_extension("transcript.json");
        fs::write(&transcript_path, serde_json::to_string_pretty(transcript)?)?;
        println!("Transcript: {}", transcript_path.display());
    }

    println!("Recorded: {}", path.display());
    println!("  Container:   {}", artifact.mime_type);
    println!("  Size:        {} bytes in {} segments", artifact.len(), artifact.segment_count);
    println!("  Audio:       {} blocks", timeline.audio_blocks);
    println!("  Video:       {} frames", timeline.frames);
    println!("  SHA-256:     {}", artifact.sha256);
    if let Some(message) = pipeline.status().status_message {
        println!("  Note:        {}", message);
    }

    Ok(path)
}

/// List voice profiles.
pub fn list_profiles() -> Result<()> {
    println!("Voice profiles:");
    println!("{:-<60}", "");
    for profile in VoiceProfile::ALL {
        println!("  {:<12} {}", profile.to_string(), profile.description());
    }
    Ok(())
}

/// Write the default configuration file.
pub fn write_default_config(output: &Path) -> Result<()> {
    StudioConfig::default().save(output)?;
    println!("Configuration written: {}", output.display());
    Ok(())
}

/// Render a single idle frame.
pub fn snapshot(output: &Path, aspect: Option<&str>) -> Result<()> {
    let mut config = StudioConfig::default();
    if let Some(aspect) = aspect {
        config.aspect_ratio = aspect.parse::<AspectRatio>()?;
    }
    let mut pipeline = StudioPipeline::new(config, CollaboratorLink::detached())?;
    pipeline.on_frame(0)?;

    let mut png = Vec::new();
    pipeline.surface().encode_png(&mut png)?;
    fs::write(output, &png)?;

    let surface = pipeline.surface();
    println!(
        "Frame written: {} ({}x{})",
        output.display(),
        surface.width(),
        surface.height()
    );
    Ok(())
}

/// Print the stream header and per-track packet counts of an artifact.
pub fn inspect(path: &Path) -> Result<()> {
    let data = fs::read(path)?;
    let stream = demux(&data)?;

    let (mut video, mut audio, mut audio_bytes) = (0usize, 0usize, 0usize);
    let mut last_pts = 0u64;
    for packet in &stream.packets {
        match packet.track {
            Track::Video => video += 1,
            Track::Audio => {
                audio += 1;
                audio_bytes += packet.payload.len();
            }
        }
        last_pts = last_pts.max(packet.pts_us);
    }

    let format = stream.format;
    println!("Stream: {}", path.display());
    println!("{:-<60}", "");
    println!("  Video:   {}x{} @ {} fps, {} frames", format.width, format.height, format.fps, video);
    println!(
        "  Audio:   {} Hz mono, {} packets, {:.2}s",
        format.sample_rate,
        audio,
        (audio_bytes / 2) as f64 / format.sample_rate as f64
    );
    println!("  Last timestamp: {:.3}s", last_pts as f64 / 1e6);
    Ok(())
}
