//! Container format negotiation

use log::{debug, info};
use serde::{Deserialize, Serialize};

/// A container MIME type and the file extension it is saved under
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodecChoice {
    pub mime_type: String,
    pub extension: String,
}

impl CodecChoice {
    pub fn new(mime_type: impl Into<String>, extension: impl Into<String>) -> Self {
        Self {
            mime_type: mime_type.into(),
            extension: extension.into(),
        }
    }

    /// Used when nothing in the preference table is supported
    pub fn fallback() -> Self {
        Self::new(FALLBACK_MIME_TYPE, FALLBACK_EXTENSION)
    }
}

pub const FALLBACK_MIME_TYPE: &str = "video/webm";
pub const FALLBACK_EXTENSION: &str = "webm";

/// Answers whether the encoder can produce a given MIME type
pub trait CodecSupport {
    fn is_type_supported(&self, mime_type: &str) -> bool;
}

impl<F> CodecSupport for F
where
    F: Fn(&str) -> bool,
{
    fn is_type_supported(&self, mime_type: &str) -> bool {
        self(mime_type)
    }
}

/// Ordered preference table, resolved once per session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodecNegotiator {
    preferences: Vec<CodecChoice>,
}

impl Default for CodecNegotiator {
    fn default() -> Self {
        Self::new(default_codec_preferences())
    }
}

impl CodecNegotiator {
    pub fn new(preferences: Vec<CodecChoice>) -> Self {
        Self { preferences }
    }

    pub fn preferences(&self) -> &[CodecChoice] {
        &self.preferences
    }

    /// First supported entry, or the fixed webm fallback
    pub fn negotiate(&self, support: &dyn CodecSupport) -> CodecChoice {
        for choice in &self.preferences {
            if support.is_type_supported(&choice.mime_type) {
                info!("Negotiated container {} (.{})", choice.mime_type, choice.extension);
                return choice.clone();
            }
            debug!("Container {} not supported", choice.mime_type);
        }
        info!("No preferred container supported, falling back to {}", FALLBACK_MIME_TYPE);
        CodecChoice::fallback()
    }
}

/// Browser-style mp4/webm variants in preference order, then the built-in muxer
pub fn default_codec_preferences() -> Vec<CodecChoice> {
    vec![
        CodecChoice::new("video/mp4; codecs=\"avc1.42E01E, mp4a.40.2\"", "mp4"),
        CodecChoice::new("video/mp4; codecs=\"avc1.64001E, mp4a.40.2\"", "mp4"),
        CodecChoice::new("video/mp4; codecs=avc1", "mp4"),
        CodecChoice::new("video/mp4", "mp4"),
        CodecChoice::new("video/webm; codecs=vp9,opus", "webm"),
        CodecChoice::new("video/webm", "webm"),
        CodecChoice::new(super::composer::CHUNK_MIME_TYPE, super::composer::CHUNK_EXTENSION),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_first_supported_wins() {
        let negotiator = CodecNegotiator::default();
        let choice = negotiator.negotiate(&|mime: &str| mime.starts_with("video/webm"));
        assert_eq!(choice, CodecChoice::new("video/webm; codecs=vp9,opus", "webm"));
    }

    #[test]
    fn test_mp4_preferred_over_webm() {
        let negotiator = CodecNegotiator::default();
        let choice = negotiator.negotiate(&|_: &str| true);
        assert_eq!(choice.extension, "mp4");
        assert!(choice.mime_type.contains("avc1.42E01E"));
    }

    #[test]
    fn test_nothing_supported_falls_back_to_webm() {
        let negotiator = CodecNegotiator::default();
        let choice = negotiator.negotiate(&|_: &str| false);
        assert_eq!(choice, CodecChoice::fallback());
    }

    #[test]
    fn test_empty_table_falls_back() {
        let negotiator = CodecNegotiator::new(Vec::new());
        assert_eq!(negotiator.negotiate(&|_: &str| true), CodecChoice::fallback());
    }
}
