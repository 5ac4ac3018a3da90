//! Per-session studio pipeline
//!
//! Owns every stateful resource of one studio: the voice chain and its delay
//! lines, the loudness extractor, the animation engine, the render surface,
//! the composer and recorder, and the collaborator link. Nothing is global.
//!
//! All callbacks take `now_ms` on the pipeline's session clock (0 at
//! construction). Callbacks run to completion one at a time; see
//! [`crate::scheduler`].

use std::sync::Arc;

use log::{debug, info, warn};
use serde::Serialize;
use uuid::Uuid;

use crate::analysis::LoudnessExtractor;
use crate::animation::{AnimationEngine, AvatarState, CameraTransform, KeySide};
use crate::audio::{AudioSource, BlockFramer, PcmFramer};
use crate::collaborator::{
    CollaboratorEvent, CollaboratorLink, Language, PromptOverlay, Speaker, Transcript,
};
use crate::config::StudioConfig;
use crate::dsp::{VoiceChain, VoiceChainBuilder, VoiceProfile};
use crate::error::{Result, StudioError};
use crate::recorder::{
    Artifact, ChunkMuxer, CodecSupport, MediaEncoder, Recorder, StreamComposer, StreamFormat,
};
use crate::render::{AspectRatio, AvatarRenderer, BoardText, Scene, Surface};

/// Studio lifecycle as shown to the user
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AppState {
    #[default]
    Idle,
    Recording,
    /// Flushing and finalizing after stop
    Processing,
    Finished,
}

/// Running counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PipelineStats {
    pub audio_blocks: u64,
    pub frames_rendered: u64,
    pub packets_forwarded: u64,
    pub segments_delivered: u64,
    pub dropped_frames: u64,
}

/// Snapshot for status displays
#[derive(Debug, Clone, Serialize)]
pub struct PipelineStatus {
    pub state: AppState,
    pub voice_profile: VoiceProfile,
    pub aspect_ratio: AspectRatio,
    pub canvas_size: (u32, u32),
    pub loudness: f32,
    pub collaborator_offline: bool,
    pub status_message: Option<String>,
    pub stats: PipelineStats,
}

pub struct StudioPipeline {
    config: StudioConfig,
    state: AppState,

    chain_builder: VoiceChainBuilder,
    chain: VoiceChain,
    framer: BlockFramer,
    /// Block currently being processed, sized once
    work: Vec<f32>,
    pcm: PcmFramer,

    extractor: LoudnessExtractor,
    animation: AnimationEngine,
    renderer: AvatarRenderer,
    surface: Surface,

    composer: StreamComposer,
    recorder: Recorder,

    link: CollaboratorLink,
    transcript: Transcript,
    prompt: PromptOverlay,

    permission_granted: bool,
    /// Session clock origin for video timestamps
    recording_started_ms: u64,
    status_message: Option<String>,
    stats: PipelineStats,
}

impl StudioPipeline {
    /// Pipeline writing the built-in chunk container
    pub fn new(config: StudioConfig, link: CollaboratorLink) -> Result<Self> {
        Self::with_encoder(config, link, Box::new(ChunkMuxer::new()))
    }

    pub fn with_encoder(
        config: StudioConfig,
        link: CollaboratorLink,
        encoder: Box<dyn MediaEncoder>,
    ) -> Result<Self> {
        config.validate()?;
        let chain_builder = VoiceChainBuilder::new(config.sample_rate, config.block_size)
            .delay_window(config.delay_window_secs());
        let chain = chain_builder.build(config.voice_profile)?;
        let (width, height) = config.canvas_size();

        Ok(Self {
            chain_builder,
            chain,
            framer: BlockFramer::new(config.block_size, config.sample_rate)?,
            work: vec![0.0; config.block_size],
            pcm: PcmFramer::new(config.sample_rate, config.block_size)?,
            extractor: LoudnessExtractor::new(config.analysis_size)?,
            animation: AnimationEngine::new(),
            renderer: AvatarRenderer::new(),
            surface: Surface::new(width, height)?,
            composer: StreamComposer::new(encoder, config.timeslice_ms)?,
            recorder: Recorder::new(),
            link,
            transcript: Transcript::new(),
            prompt: PromptOverlay::new(),
            permission_granted: false,
            recording_started_ms: 0,
            status_message: None,
            stats: PipelineStats::default(),
            state: AppState::Idle,
            config,
        })
    }

    pub fn config(&self) -> &StudioConfig {
        &self.config
    }

    pub fn state(&self) -> AppState {
        self.state
    }

    pub fn is_recording(&self) -> bool {
        self.state == AppState::Recording
    }

    pub fn voice_profile(&self) -> VoiceProfile {
        self.chain.profile()
    }

    pub fn voice_chain(&self) -> &VoiceChain {
        &self.chain
    }

    pub fn avatar(&self) -> &AvatarState {
        self.animation.avatar()
    }

    pub fn camera(&self) -> &CameraTransform {
        self.animation.camera()
    }

    pub fn surface(&self) -> &Surface {
        &self.surface
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn prompt(&self, now_ms: u64) -> Option<&str> {
        if self.link.is_offline() {
            return None;
        }
        self.prompt.visible(now_ms)
    }

    pub fn link(&self) -> &CollaboratorLink {
        &self.link
    }

    pub fn stats(&self) -> PipelineStats {
        self.stats
    }

    pub fn last_artifact(&self) -> Option<Arc<Artifact>> {
        self.recorder.artifact()
    }

    pub fn status(&self) -> PipelineStatus {
        PipelineStatus {
            state: self.state,
            voice_profile: self.chain.profile(),
            aspect_ratio: self.config.aspect_ratio,
            canvas_size: (self.surface.width(), self.surface.height()),
            loudness: self.animation.loudness(),
            collaborator_offline: self.link.is_offline(),
            status_message: self.status_message.clone(),
            stats: self.stats,
        }
    }

    // --- Audio ---

    /// Device callback with an arbitrary number of mono samples
    pub fn on_audio(&mut self, samples: &[f32], now_ms: u64) -> Result<()> {
        let mut offset = 0;
        while offset < samples.len() {
            offset += self.framer.fill(&samples[offset..]);
            if self.framer.is_ready() {
                self.work.copy_from_slice(self.framer.frame().samples());
                self.framer.advance();
                self.process_block(now_ms)?;
            }
        }
        Ok(())
    }

    fn process_block(&mut self, now_ms: u64) -> Result<()> {
        self.stats.audio_blocks += 1;
        self.extractor.push_samples(&self.work);

        if !self.is_recording() {
            return Ok(());
        }

        if self.link.is_connected() && !self.link.is_offline() {
            let packet = self.pcm.packetize(&self.work);
            if self.link.forward(&packet) {
                self.stats.packets_forwarded += 1;
            } else if self.link.is_offline() {
                self.note_collaborator_fault();
            }
        }

        self.chain.process(&mut self.work);
        self.composer.push_audio(&self.work)?;
        self.deliver_segments();
        debug!("Processed audio block at {} ms", now_ms);
        Ok(())
    }

    // --- Display ---

    /// Display tick: derive the avatar, redraw, and feed the video track
    pub fn on_frame(&mut self, now_ms: u64) -> Result<()> {
        self.animation.set_loudness(self.extractor.loudness());
        self.poll_collaborator(now_ms);
        self.animation.tick(now_ms);

        let scene = Scene {
            avatar: self.animation.avatar(),
            camera: self.animation.camera(),
            pointer: (self.animation.input().pointer_x, self.animation.input().pointer_y),
            now_ms,
            board_text: &self.config.board_text,
            caption: self.transcript.caption(now_ms),
        };
        self.renderer.render(&mut self.surface, &scene);
        self.stats.frames_rendered += 1;

        if self.is_recording() {
            let elapsed_us = now_ms.saturating_sub(self.recording_started_ms) * 1000;
            match self.composer.push_video(&self.surface, elapsed_us) {
                Ok(()) => {}
                Err(StudioError::EncoderDelivery { reason }) => {
                    self.stats.dropped_frames += 1;
                    warn!("Frame at {} ms not recorded: {}", now_ms, reason);
                }
                Err(e) => return Err(e),
            }
            self.deliver_segments();
        }
        Ok(())
    }

    fn poll_collaborator(&mut self, now_ms: u64) {
        for event in self.link.poll(now_ms) {
            match event {
                CollaboratorEvent::Transcript {
                    text,
                    speaker,
                    at_ms,
                } => self.transcript.add(&text, speaker, at_ms),
                CollaboratorEvent::Prompt { text, at_ms } => self.prompt.show(&text, at_ms),
            }
        }
    }

    /// Transcript fragment reported outside the collaborator's own event
    /// stream (e.g. a UI-side speech recognizer)
    pub fn add_transcript(&mut self, text: &str, speaker: Speaker, now_ms: u64) {
        self.transcript.add(text, speaker, now_ms);
        if speaker == Speaker::Assistant {
            self.prompt.show(text, now_ms);
        }
    }

    /// Runtime failure reported by the collaborator transport
    pub fn on_collaborator_error(&mut self, message: &str) {
        self.link.report_error(message);
        self.note_collaborator_fault();
    }

    fn note_collaborator_fault(&mut self) {
        if let Some((kind, reason)) = self.link.last_fault() {
            self.status_message = Some(format!("AI offline ({}): {}", kind, reason));
        }
    }

    fn deliver_segments(&mut self) {
        while let Some(segment) = self.composer.next_segment() {
            match self.recorder.push_segment(segment) {
                Ok(()) => self.stats.segments_delivered += 1,
                Err(e) => warn!("Encoder segment dropped: {}", e),
            }
        }
    }

    // --- Input ---

    pub fn on_pointer_down(&mut self, x: f32, y: f32) {
        self.animation.pointer_down(x, y);
    }

    /// Pointer position inside a `width` × `height` viewport
    pub fn on_pointer_move(&mut self, x: f32, y: f32, width: f32, height: f32) {
        self.animation.pointer_move(x, y, width, height);
    }

    pub fn on_pointer_up(&mut self) {
        self.animation.pointer_up();
    }

    pub fn on_wheel(&mut self, delta_y: f32) {
        self.animation.wheel(delta_y);
    }

    pub fn on_key_down(&mut self, side: KeySide) {
        self.animation.key_down(side);
    }

    pub fn on_key_up(&mut self, side: KeySide) {
        self.animation.key_up(side);
    }

    pub fn zoom_in(&mut self) {
        self.animation.zoom_in();
    }

    pub fn zoom_out(&mut self) {
        self.animation.zoom_out();
    }

    pub fn reset_camera(&mut self) {
        self.animation.reset_camera();
    }

    // --- Settings ---

    /// Rebuild the voice chain; rejected while recording
    pub fn set_voice_profile(&mut self, profile: VoiceProfile) -> Result<()> {
        if self.is_recording() {
            return Err(StudioError::SessionActive);
        }
        self.chain = self.chain_builder.build(profile)?;
        self.config.voice_profile = profile;
        Ok(())
    }

    /// Resize the canvas; rejected while recording
    pub fn set_aspect_ratio(&mut self, ratio: AspectRatio) -> Result<()> {
        if self.is_recording() {
            return Err(StudioError::SessionActive);
        }
        let (width, height) = ratio.canvas_size(self.config.canvas_height);
        self.surface.resize(width, height)?;
        self.config.aspect_ratio = ratio;
        debug!("Canvas resized to {}x{} ({})", width, height, ratio);
        Ok(())
    }

    pub fn set_board_text(&mut self, board_text: BoardText) {
        self.config.board_text = board_text;
    }

    /// Language used for the next collaborator session
    pub fn set_language(&mut self, language: Language) -> Result<()> {
        if self.is_recording() {
            return Err(StudioError::SessionActive);
        }
        self.config.language = language;
        Ok(())
    }

    // --- Session ---

    /// Ask the source for microphone access; remembered once granted
    pub fn request_permission(&mut self, source: &mut dyn AudioSource) -> Result<()> {
        if !self.permission_granted {
            source.request_permission()?;
            self.permission_granted = true;
        }
        Ok(())
    }

    /// Start a session, negotiating the container against the pipeline's encoder
    pub fn start_recording(&mut self, source: &mut dyn AudioSource, now_ms: u64) -> Result<Uuid> {
        let encoder_mime = self.composer.mime_type().to_string();
        let support = move |mime: &str| mime == encoder_mime;
        self.start_recording_with(source, &support, now_ms)
    }

    /// Start a session, negotiating the container against `support` and the encoder.
    /// Fails with a configuration error when no type satisfies both.
    pub fn start_recording_with(
        &mut self,
        source: &mut dyn AudioSource,
        support: &dyn CodecSupport,
        now_ms: u64,
    ) -> Result<Uuid> {
        if self.is_recording() {
            return Err(StudioError::SessionActive);
        }

        let codec = {
            let composer = &self.composer;
            let writable = |mime: &str| support.is_type_supported(mime) && composer.supports(mime);
            self.config.codec_negotiator().negotiate(&writable)
        };
        if !self.composer.supports(&codec.mime_type) {
            return Err(StudioError::Configuration {
                reason: format!(
                    "encoder writes {} but the runtime offers none of the preferred containers",
                    self.composer.mime_type()
                ),
            });
        }

        self.status_message = None;
        self.request_permission(source)?;

        if let Err(e) = self.link.connect(self.config.language) {
            warn!("Recording without collaborator: {}", e);
            self.note_collaborator_fault();
        }

        self.chain = self.chain_builder.build(self.config.voice_profile)?;
        self.pcm.reset();

        let format = StreamFormat {
            width: self.surface.width(),
            height: self.surface.height(),
            fps: self.config.fps,
            sample_rate: self.config.sample_rate,
        };
        self.composer.begin(format)?;
        let id = match self.recorder.start(codec) {
            Ok(id) => id,
            Err(e) => {
                self.composer.flush();
                return Err(e);
            }
        };

        self.recording_started_ms = now_ms;
        self.transcript.start(now_ms);
        self.prompt.clear();
        self.stats = PipelineStats::default();
        self.state = AppState::Recording;
        info!(
            "Recording {} started with {} voice at {}x{}",
            id,
            self.chain.profile(),
            format.width,
            format.height
        );
        Ok(id)
    }

    /// Flush the composer, finalize the artifact and release the collaborator
    pub fn stop_recording(&mut self) -> Result<Arc<Artifact>> {
        if !self.is_recording() {
            return Err(StudioError::NoActiveSession);
        }
        self.state = AppState::Processing;

        self.composer.flush();
        self.deliver_segments();
        let artifact = self.recorder.stop();

        self.link.disconnect();
        self.transcript.stop();

        match artifact {
            Ok(artifact) => {
                self.state = AppState::Finished;
                info!("Recording finished: {} ({} bytes)", artifact.file_name(), artifact.len());
                Ok(artifact)
            }
            Err(e) => {
                self.state = AppState::Idle;
                Err(e)
            }
        }
    }
}

impl std::fmt::Debug for StudioPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StudioPipeline")
            .field("state", &self.state)
            .field("voice_profile", &self.chain.profile())
            .field("composer", &self.composer)
            .field("link", &self.link)
            .field("stats", &self.stats)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::ToneSource;
    use crate::collaborator::MockCollaborator;
    use crate::recorder::{demux, Track, CHUNK_MIME_TYPE};

    fn small_config() -> StudioConfig {
        StudioConfig {
            sample_rate: 16000,
            block_size: 1600,
            fps: 10,
            canvas_height: 64,
            timeslice_ms: 500,
            ..Default::default()
        }
    }

    fn pipeline() -> StudioPipeline {
        StudioPipeline::new(small_config(), CollaboratorLink::detached()).unwrap()
    }

    #[test]
    fn test_profile_switch_rejected_while_recording() {
        let mut p = pipeline();
        let mut mic = ToneSource::new(220.0, 0.5, 16000);
        p.set_voice_profile(VoiceProfile::Robot).unwrap();
        p.start_recording(&mut mic, 0).unwrap();

        assert!(matches!(
            p.set_voice_profile(VoiceProfile::DeepDown),
            Err(StudioError::SessionActive)
        ));
        assert!(matches!(
            p.set_aspect_ratio(AspectRatio::Square),
            Err(StudioError::SessionActive)
        ));
        assert_eq!(p.voice_profile(), VoiceProfile::Robot);

        p.stop_recording().unwrap();
        p.set_voice_profile(VoiceProfile::DeepDown).unwrap();
        assert_eq!(p.voice_profile(), VoiceProfile::DeepDown);
    }

    #[test]
    fn test_permission_denied_blocks_start() {
        let mut p = pipeline();
        let mut mic = ToneSource::denied(16000);
        let err = p.start_recording(&mut mic, 0).unwrap_err();
        assert_eq!(err.error_code(), "PERMISSION_DENIED");
        assert_eq!(p.state(), AppState::Idle);
    }

    #[test]
    fn test_stop_without_start() {
        let mut p = pipeline();
        assert!(matches!(p.stop_recording(), Err(StudioError::NoActiveSession)));
    }

    #[test]
    fn test_session_produces_demuxable_artifact() {
        let mut p = pipeline();
        let mut mic = ToneSource::new(220.0, 0.5, 16000);
        p.start_recording(&mut mic, 0).unwrap();

        let mut block = vec![0.0; 1600];
        for i in 0..10u64 {
            mic.read_block(&mut block);
            p.on_audio(&block, i * 100).unwrap();
            p.on_frame(i * 100).unwrap();
        }
        let artifact = p.stop_recording().unwrap();
        assert_eq!(p.state(), AppState::Finished);
        assert_eq!(artifact.mime_type, CHUNK_MIME_TYPE);

        let demuxed = demux(artifact.data()).unwrap();
        assert_eq!(demuxed.format.width, 36);
        let audio = demuxed.packets.iter().filter(|p| p.track == Track::Audio).count();
        let video = demuxed.packets.iter().filter(|p| p.track == Track::Video).count();
        assert_eq!((audio, video), (10, 10));
    }

    /// Chunk container labelled as webm, standing in for a platform encoder
    struct WebmEncoder(ChunkMuxer);

    impl MediaEncoder for WebmEncoder {
        fn mime_type(&self) -> &str {
            "video/webm"
        }

        fn begin(&mut self, format: StreamFormat) -> Result<()> {
            self.0.begin(format)
        }

        fn write_video(&mut self, pts_us: u64, frame: &Surface) -> Result<()> {
            self.0.write_video(pts_us, frame)
        }

        fn write_audio(&mut self, pts_us: u64, samples: &[f32]) -> Result<()> {
            self.0.write_audio(pts_us, samples)
        }

        fn take_pending(&mut self) -> Vec<u8> {
            self.0.take_pending()
        }
    }

    #[test]
    fn test_container_the_encoder_cannot_write_is_rejected() {
        let mock = MockCollaborator::new();
        let handle = mock.handle();
        let mut p = StudioPipeline::new(small_config(), CollaboratorLink::new(Box::new(mock))).unwrap();
        let mut mic = ToneSource::new(220.0, 0.5, 16000);

        // Only mp4 is offered and the built-in encoder writes neither mp4 nor webm
        let offered = |mime: &str| mime.starts_with("video/mp4");
        let err = p.start_recording_with(&mut mic, &offered, 0).unwrap_err();
        assert_eq!(err.error_code(), "CONFIGURATION");
        assert_eq!(p.state(), AppState::Idle);
        assert!(!handle.is_connected());
        assert!(p.last_artifact().is_none());
    }

    #[test]
    fn test_webm_fallback_when_the_encoder_writes_webm() {
        let mut p = StudioPipeline::with_encoder(
            small_config(),
            CollaboratorLink::detached(),
            Box::new(WebmEncoder(ChunkMuxer::new())),
        )
        .unwrap();
        let mut mic = ToneSource::new(220.0, 0.5, 16000);
        p.start_recording_with(&mut mic, &|_: &str| false, 0).unwrap();
        let artifact = p.stop_recording().unwrap();
        assert_eq!(artifact.mime_type, "video/webm");
        assert_eq!(artifact.extension, "webm");
    }

    #[test]
    fn test_video_timestamps_follow_session_time() {
        let mut p = pipeline();
        let mut mic = ToneSource::new(220.0, 0.5, 16000);
        p.start_recording(&mut mic, 5000).unwrap();

        let mut block = vec![0.0; 1600];
        for i in 0..10u64 {
            let now = 5000 + i * 100;
            mic.read_block(&mut block);
            p.on_audio(&block, now).unwrap();
            // The display only gets every third tick
            if i % 3 == 0 {
                p.on_frame(now).unwrap();
            }
        }
        let artifact = p.stop_recording().unwrap();

        let demuxed = demux(artifact.data()).unwrap();
        let pts = |track: Track| -> Vec<u64> {
            demuxed
                .packets
                .iter()
                .filter(|p| p.track == track)
                .map(|p| p.pts_us)
                .collect()
        };
        assert_eq!(pts(Track::Video), vec![0, 300_000, 600_000, 900_000]);
        assert_eq!(pts(Track::Audio).last(), Some(&900_000));
    }

    #[test]
    fn test_loudness_drives_mouth() {
        let mut p = pipeline();
        let mut mic = ToneSource::new(440.0, 0.8, 16000);
        mic.request_permission().unwrap();
        let mut block = vec![0.0; 1600];
        mic.read_block(&mut block);

        p.on_frame(0).unwrap();
        assert_eq!(p.avatar().mouth_open, 0.0);
        p.on_audio(&block, 100).unwrap();
        p.on_frame(100).unwrap();
        assert!(p.avatar().mouth_open > 0.0);
    }

    #[test]
    fn test_collaborator_offline_keeps_recording() {
        let mock = MockCollaborator::new().with_send_failure_after(2, "network error");
        let handle = mock.handle();
        let mut p = StudioPipeline::new(small_config(), CollaboratorLink::new(Box::new(mock))).unwrap();
        let mut mic = ToneSource::new(220.0, 0.5, 16000);
        p.start_recording(&mut mic, 0).unwrap();

        let mut block = vec![0.0; 1600];
        for i in 0..5u64 {
            mic.read_block(&mut block);
            p.on_audio(&block, i * 100).unwrap();
        }
        assert!(p.status().collaborator_offline);
        assert!(p.status().status_message.is_some());
        assert_eq!(p.stats().packets_forwarded, 2);
        assert_eq!(handle.send_attempts(), 3);
        assert_eq!(p.stats().audio_blocks, 5);

        let artifact = p.stop_recording().unwrap();
        assert!(!artifact.is_empty());
    }

    #[test]
    fn test_collaborator_events_reach_transcript_and_caption() {
        let mock = MockCollaborator::new().with_reply_every(1, "hello class", "What next?");
        let mut p = StudioPipeline::new(small_config(), CollaboratorLink::new(Box::new(mock))).unwrap();
        let mut mic = ToneSource::new(220.0, 0.5, 16000);
        p.start_recording(&mut mic, 1000).unwrap();

        let mut block = vec![0.0; 1600];
        mic.read_block(&mut block);
        p.on_audio(&block, 1100).unwrap();
        p.on_frame(1100).unwrap();

        let entries = p.transcript().entries();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].relative_ms, 100);
        assert_eq!(p.prompt(1200), Some("What next?"));
        // The assistant spoke last, so no user caption
        assert_eq!(p.transcript().caption(1200), None);
    }

    #[test]
    fn test_restart_after_finish() {
        let mut p = pipeline();
        let mut mic = ToneSource::new(220.0, 0.5, 16000);
        p.start_recording(&mut mic, 0).unwrap();
        let first = p.stop_recording().unwrap();
        p.start_recording(&mut mic, 5000).unwrap();
        assert!(p.last_artifact().is_none());
        let second = p.stop_recording().unwrap();
        assert_ne!(first.session_id, second.session_id);
    }
}
