//! Conversation transcript and on-screen text timing

use serde::{Deserialize, Serialize};

/// Fragments from the same speaker closer than this are merged
pub const MERGE_WINDOW_MS: u64 = 2000;

/// How long the latest user line stays as a caption
pub const CAPTION_VISIBLE_MS: u64 = 3000;

/// How long an assistant prompt stays in the overlay
pub const PROMPT_VISIBLE_MS: u64 = 8000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Speaker {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscriptEntry {
    pub text: String,
    pub speaker: Speaker,
    /// Wall-clock ms of the latest fragment
    pub timestamp_ms: u64,
    /// Ms since recording start when the entry was opened, 0 outside recording
    pub relative_ms: u64,
}

/// Ordered conversation log for one session
#[derive(Debug, Clone, Default, Serialize)]
pub struct Transcript {
    entries: Vec<TranscriptEntry>,
    #[serde(skip)]
    recording_started_ms: Option<u64>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear the log and start relative timestamps at `now_ms`
    pub fn start(&mut self, now_ms: u64) {
        self.entries.clear();
        self.recording_started_ms = Some(now_ms);
    }

    pub fn stop(&mut self) {
        self.recording_started_ms = None;
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Add a fragment, merging into the last entry when the same speaker
    /// continues within [`MERGE_WINDOW_MS`]
    pub fn add(&mut self, text: &str, speaker: Speaker, now_ms: u64) {
        let text = text.trim();
        if text.is_empty() {
            return;
        }
        if let Some(last) = self.entries.last_mut() {
            if last.speaker == speaker && now_ms.saturating_sub(last.timestamp_ms) < MERGE_WINDOW_MS
            {
                last.text.push(' ');
                last.text.push_str(text);
                last.timestamp_ms = now_ms;
                return;
            }
        }
        let relative_ms = self
            .recording_started_ms
            .map(|start| now_ms.saturating_sub(start))
            .unwrap_or(0);
        self.entries.push(TranscriptEntry {
            text: text.to_string(),
            speaker,
            timestamp_ms: now_ms,
            relative_ms,
        });
    }

    pub fn entries(&self) -> &[TranscriptEntry] {
        &self.entries
    }

    pub fn last(&self) -> Option<&TranscriptEntry> {
        self.entries.last()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The latest line, if it is the user's and younger than [`CAPTION_VISIBLE_MS`]
    pub fn caption(&self, now_ms: u64) -> Option<&str> {
        self.entries
            .last()
            .filter(|e| e.speaker == Speaker::User)
            .filter(|e| now_ms.saturating_sub(e.timestamp_ms) < CAPTION_VISIBLE_MS)
            .map(|e| e.text.as_str())
    }
}

/// Latest assistant line, visible for [`PROMPT_VISIBLE_MS`] after it arrives
#[derive(Debug, Clone, Default)]
pub struct PromptOverlay {
    current: Option<(String, u64)>,
}

impl PromptOverlay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn show(&mut self, text: &str, now_ms: u64) {
        self.current = Some((text.to_string(), now_ms));
    }

    pub fn visible(&self, now_ms: u64) -> Option<&str> {
        match &self.current {
            Some((text, shown)) if now_ms.saturating_sub(*shown) < PROMPT_VISIBLE_MS => {
                Some(text.as_str())
            }
            _ => None,
        }
    }

    pub fn clear(&mut self) {
        self.current = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_same_speaker_fragments_merge() {
        let mut t = Transcript::new();
        t.start(1000);
        t.add("hello", Speaker::User, 2000);
        t.add("world", Speaker::User, 3500);

        assert_eq!(t.len(), 1);
        let entry = t.last().unwrap();
        assert_eq!(entry.text, "hello world");
        assert_eq!(entry.timestamp_ms, 3500);
        assert_eq!(entry.relative_ms, 1000);
    }

    #[test]
    fn test_gap_or_speaker_change_appends() {
        let mut t = Transcript::new();
        t.start(0);
        t.add("one", Speaker::User, 100);
        t.add("two", Speaker::User, 2100);
        t.add("three", Speaker::Assistant, 2200);

        let texts: Vec<&str> = t.entries().iter().map(|e| e.text.as_str()).collect();
        assert_eq!(texts, vec!["one", "two", "three"]);
        assert_eq!(t.entries()[2].relative_ms, 2200);
    }

    #[test]
    fn test_merge_window_slides_with_each_fragment() {
        let mut t = Transcript::new();
        t.add("a", Speaker::User, 0);
        t.add("b", Speaker::User, 1900);
        t.add("c", Speaker::User, 3800);
        assert_eq!(t.len(), 1);
        assert_eq!(t.last().unwrap().text, "a b c");
    }

    #[test]
    fn test_relative_time_zero_outside_recording() {
        let mut t = Transcript::new();
        t.add("idle", Speaker::User, 50_000);
        assert_eq!(t.last().unwrap().relative_ms, 0);
    }

    #[test]
    fn test_caption_shows_recent_user_line_only() {
        let mut t = Transcript::new();
        t.add("hi there", Speaker::User, 1000);
        assert_eq!(t.caption(3999), Some("hi there"));
        assert_eq!(t.caption(4000), None);

        t.add("reply", Speaker::Assistant, 1500);
        assert_eq!(t.caption(1600), None);
    }

    #[test]
    fn test_prompt_overlay_expires() {
        let mut overlay = PromptOverlay::new();
        assert_eq!(overlay.visible(0), None);
        overlay.show("Tell me more?", 10_000);
        assert_eq!(overlay.visible(17_999), Some("Tell me more?"));
        assert_eq!(overlay.visible(18_000), None);

        overlay.show("And then?", 17_000);
        assert_eq!(overlay.visible(24_000), Some("And then?"));
    }

    #[test]
    fn test_blank_fragments_ignored() {
        let mut t = Transcript::new();
        t.add("   ", Speaker::User, 0);
        assert!(t.is_empty());
    }
}
