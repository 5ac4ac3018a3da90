//! CLI Module
//!
//! Command-line driver: runs a recording session from a tone or WAV file in
//! place of the microphone.

pub mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Chalkcast - voice-changing classroom avatar recorder
#[derive(Parser, Debug)]
#[command(name = "chalkcast")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Record a session and write the artifact
    #[command(name = "record")]
    Record {
        /// Session length in seconds
        #[arg(short, long, default_value_t = 5.0)]
        seconds: f64,

        /// Voice profile (none, bright_up, deep_down, robot)
        #[arg(short, long)]
        profile: Option<String>,

        /// WAV file to use as the microphone
        #[arg(short, long, conflicts_with = "tone")]
        input: Option<PathBuf>,

        /// Sine tone frequency to use as the microphone
        #[arg(long, default_value_t = 220.0)]
        tone: f32,

        /// Output directory
        #[arg(short, long, default_value = ".")]
        output: PathBuf,

        /// Configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Canvas aspect ratio (9:16, 16:9, 3:4, 1:1)
        #[arg(long)]
        aspect: Option<String>,

        /// Attach the scripted collaborator
        #[arg(long)]
        mock_ai: bool,
    },

    /// List voice profiles
    #[command(name = "profiles")]
    Profiles,

    /// Write the default configuration
    #[command(name = "config")]
    Config {
        /// Where to write the configuration
        #[arg(short, long, default_value = "chalkcast.json")]
        output: PathBuf,
    },

    /// Render one frame to PNG
    #[command(name = "snapshot")]
    Snapshot {
        /// PNG output path
        #[arg(short, long, default_value = "frame.png")]
        output: PathBuf,

        /// Canvas aspect ratio (9:16, 16:9, 3:4, 1:1)
        #[arg(long)]
        aspect: Option<String>,
    },

    /// Summarize a recorded chunk stream
    #[command(name = "inspect")]
    Inspect {
        /// Artifact to read
        path: PathBuf,
    },
}
