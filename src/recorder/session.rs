//! Recording session state machine and the finished artifact

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use log::{debug, info};
use serde::Serialize;
use sha2::{Digest, Sha256};
use uuid::Uuid;

use super::codec::CodecChoice;
use crate::error::{Result, StudioError};

/// Recorder lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RecorderState {
    Idle,
    Recording,
    Finished,
}

/// Chunks collected while a session is open
#[derive(Debug, Clone)]
pub struct RecordingSession {
    pub id: Uuid,
    pub codec: CodecChoice,
    pub started_at: DateTime<Utc>,
    chunks: Vec<Vec<u8>>,
}

impl RecordingSession {
    fn new(codec: CodecChoice) -> Self {
        Self {
            id: Uuid::new_v4(),
            codec,
            started_at: Utc::now(),
            chunks: Vec::new(),
        }
    }

    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    pub fn byte_len(&self) -> usize {
        self.chunks.iter().map(Vec::len).sum()
    }
}

/// Immutable result of one session
#[derive(Debug, Clone, Serialize)]
pub struct Artifact {
    pub session_id: Uuid,
    pub mime_type: String,
    pub extension: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub segment_count: usize,
    /// Hex SHA-256 of `data`
    pub sha256: String,
    #[serde(skip)]
    data: Vec<u8>,
}

impl Artifact {
    fn from_session(session: RecordingSession) -> Self {
        let segment_count = session.chunks.len();
        let data = session.chunks.concat();
        let sha256 = format!("{:x}", Sha256::digest(&data));
        Self {
            session_id: session.id,
            mime_type: session.codec.mime_type,
            extension: session.codec.extension,
            started_at: session.started_at,
            finished_at: Utc::now(),
            segment_count,
            sha256,
            data,
        }
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// `lesson-recording-<unix-ms>.<ext>`
    pub fn file_name(&self) -> String {
        format!(
            "lesson-recording-{}.{}",
            self.finished_at.timestamp_millis(),
            self.extension
        )
    }

    /// Write the artifact into `dir` under its suggested name, plus a JSON manifest
    pub fn save_to(&self, dir: &Path) -> Result<PathBuf> {
        fs::create_dir_all(dir)?;
        let path = dir.join(self.file_name());
        fs::write(&path, &self.data)?;

        let manifest = serde_json::to_string_pretty(self)?;
        fs::write(path.with_extension("json"), manifest)?;

        info!("Saved {} bytes to {}", self.data.len(), path.display());
        Ok(path)
    }
}

/// Idle → Recording → Finished state machine over ordered byte segments
#[derive(Debug, Default)]
pub struct Recorder {
    session: Option<RecordingSession>,
    artifact: Option<Arc<Artifact>>,
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> RecorderState {
        match (&self.session, &self.artifact) {
            (Some(_), _) => RecorderState::Recording,
            (None, Some(_)) => RecorderState::Finished,
            (None, None) => RecorderState::Idle,
        }
    }

    pub fn is_recording(&self) -> bool {
        self.session.is_some()
    }

    pub fn session(&self) -> Option<&RecordingSession> {
        self.session.as_ref()
    }

    /// Open a new session; the previous artifact is dropped
    pub fn start(&mut self, codec: CodecChoice) -> Result<Uuid> {
        if self.session.is_some() {
            return Err(StudioError::SessionActive);
        }
        self.artifact = None;
        let session = RecordingSession::new(codec);
        let id = session.id;
        info!("Recording session {} started ({})", id, session.codec.mime_type);
        self.session = Some(session);
        Ok(id)
    }

    /// Append one encoder segment; empty segments are ignored
    pub fn push_segment(&mut self, segment: Vec<u8>) -> Result<()> {
        let session = self.session.as_mut().ok_or(StudioError::NoActiveSession)?;
        if segment.is_empty() {
            return Ok(());
        }
        debug!("Segment {} ({} bytes)", session.chunks.len(), segment.len());
        session.chunks.push(segment);
        Ok(())
    }

    /// Concatenate the session's segments in arrival order
    pub fn stop(&mut self) -> Result<Arc<Artifact>> {
        let session = self.session.take().ok_or(StudioError::NoActiveSession)?;
        let artifact = Arc::new(Artifact::from_session(session));
        info!(
            "Recording session {} finished: {} segments, {} bytes",
            artifact.session_id,
            artifact.segment_count,
            artifact.len()
        );
        self.artifact = Some(Arc::clone(&artifact));
        Ok(artifact)
    }

    pub fn artifact(&self) -> Option<Arc<Artifact>> {
        self.artifact.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn webm() -> CodecChoice {
        CodecChoice::new("video/webm", "webm")
    }

    #[test]
    fn test_segments_concatenate_in_order() {
        let mut recorder = Recorder::new();
        recorder.start(webm()).unwrap();
        recorder.push_segment(vec![1; 100]).unwrap();
        recorder.push_segment(vec![2; 200]).unwrap();
        recorder.push_segment(vec![3; 150]).unwrap();

        let artifact = recorder.stop().unwrap();
        assert_eq!(artifact.len(), 450);
        assert_eq!(artifact.segment_count, 3);
        assert_eq!(artifact.data()[99], 1);
        assert_eq!(artifact.data()[100], 2);
        assert_eq!(artifact.data()[300], 3);
        assert_eq!(recorder.state(), RecorderState::Finished);
    }

    #[test]
    fn test_zero_segments_give_empty_artifact() {
        let mut recorder = Recorder::new();
        recorder.start(webm()).unwrap();
        let artifact = recorder.stop().unwrap();
        assert!(artifact.is_empty());
        assert_eq!(
            artifact.sha256,
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn test_empty_segments_ignored() {
        let mut recorder = Recorder::new();
        recorder.start(webm()).unwrap();
        recorder.push_segment(Vec::new()).unwrap();
        recorder.push_segment(vec![7; 4]).unwrap();
        assert_eq!(recorder.session().unwrap().chunk_count(), 1);
        assert_eq!(recorder.stop().unwrap().segment_count, 1);
    }

    #[test]
    fn test_state_violations() {
        let mut recorder = Recorder::new();
        assert!(matches!(recorder.stop(), Err(StudioError::NoActiveSession)));
        assert!(matches!(
            recorder.push_segment(vec![1]),
            Err(StudioError::NoActiveSession)
        ));

        recorder.start(webm()).unwrap();
        assert!(matches!(recorder.start(webm()), Err(StudioError::SessionActive)));
    }

    #[test]
    fn test_restart_discards_previous_artifact() {
        let mut recorder = Recorder::new();
        recorder.start(webm()).unwrap();
        recorder.stop().unwrap();
        assert!(recorder.artifact().is_some());

        recorder.start(webm()).unwrap();
        assert!(recorder.artifact().is_none());
        assert_eq!(recorder.state(), RecorderState::Recording);
    }

    #[test]
    fn test_file_name_and_save() {
        let mut recorder = Recorder::new();
        recorder.start(CodecChoice::new("video/mp4", "mp4")).unwrap();
        recorder.push_segment(b"abc".to_vec()).unwrap();
        let artifact = recorder.stop().unwrap();

        let name = artifact.file_name();
        assert!(name.starts_with("lesson-recording-"));
        assert!(name.ends_with(".mp4"));

        let dir = tempfile::tempdir().unwrap();
        let path = artifact.save_to(dir.path()).unwrap();
        assert_eq!(fs::read(&path).unwrap(), b"abc");

        let manifest: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(path.with_extension("json")).unwrap())
                .unwrap();
        assert_eq!(manifest["segment_count"], 1);
        assert_eq!(manifest["mime_type"], "video/mp4");
    }
}
