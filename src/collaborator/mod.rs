//! Conversational AI collaborator
//!
//! The live service is an opaque bidirectional stream: 16 kHz PCM packets go
//! out, transcript fragments come back. Only the interface lives here, plus a
//! scripted [`MockCollaborator`] for tests and the CLI.

mod link;
mod mock;
mod transcript;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::audio::PcmPacket;
use crate::error::{Result, StudioError};

pub use link::CollaboratorLink;
pub use mock::{MockCollaborator, MockHandle};
pub use transcript::{
    PromptOverlay, Speaker, Transcript, TranscriptEntry, CAPTION_VISIBLE_MS, MERGE_WINDOW_MS,
    PROMPT_VISIBLE_MS,
};

/// Conversation language
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    Zh,
    En,
}

impl Language {
    pub fn code(&self) -> &'static str {
        match self {
            Language::Zh => "zh",
            Language::En => "en",
        }
    }

    /// Standing instruction sent when the session opens
    pub fn system_instruction(&self) -> &'static str {
        match self {
            Language::Zh => SYSTEM_INSTRUCTION_ZH,
            Language::En => SYSTEM_INSTRUCTION_EN,
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Language {
    type Err = StudioError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "zh" | "zh-cn" | "chinese" => Ok(Language::Zh),
            "en" | "en-us" | "english" => Ok(Language::En),
            other => Err(StudioError::invalid_parameter("language", other, "zh or en")),
        }
    }
}

pub const SYSTEM_INSTRUCTION_ZH: &str = "你是一位专业的视频播客主持人，负责聆听用户发言并充当即兴互动的搭档。\
回复要非常简短：通常是一两句鼓励的话，或每隔15到30秒提出一个简短而有启发性的追问。\
不要长篇大论，语气保持温柔、支持和好奇。如果用户停止说话，请温和地引出一个相关的新话题。";

pub const SYSTEM_INSTRUCTION_EN: &str = "You are a professional video podcast host. Listen to the user \
and act as their improv partner. Keep replies very short: usually a few encouraging words, or a brief \
follow-up question every 15 to 30 seconds. Never give long speeches. Stay gentle, supportive and \
curious. If the user stops talking, gently suggest a related new topic.";

/// Something the collaborator said or heard
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CollaboratorEvent {
    /// Transcription fragment of either side of the conversation
    Transcript {
        text: String,
        speaker: Speaker,
        at_ms: u64,
    },
    /// Assistant line to show in the prompt overlay
    Prompt { text: String, at_ms: u64 },
}

/// Live conversational service
pub trait Collaborator: Send {
    fn name(&self) -> &str;

    fn connect(&mut self, language: Language) -> Result<()>;

    fn send_audio(&mut self, packet: &PcmPacket) -> Result<()>;

    /// Events received since the last poll, stamped with `now_ms`
    fn poll_events(&mut self, now_ms: u64) -> Vec<CollaboratorEvent>;

    fn disconnect(&mut self);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_language_parsing() {
        assert_eq!("EN".parse::<Language>().unwrap(), Language::En);
        assert_eq!("zh".parse::<Language>().unwrap(), Language::Zh);
        assert!("fr".parse::<Language>().is_err());
        assert_eq!(Language::default(), Language::Zh);
    }

    #[test]
    fn test_instructions_differ_per_language() {
        assert!(Language::En.system_instruction().contains("podcast host"));
        assert!(Language::Zh.system_instruction().contains("播客"));
    }

    #[test]
    fn test_event_serialization_is_tagged() {
        let event = CollaboratorEvent::Prompt {
            text: "Why?".to_string(),
            at_ms: 5,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "prompt");
        assert_eq!(json["text"], "Why?");
    }
}
