//! Scripted collaborator for tests and offline demos
//!
//! Does no speech processing: it counts the packets it receives and replays
//! canned transcript lines on a packet schedule.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};

use super::{Collaborator, CollaboratorEvent, Language, Speaker};
use crate::audio::PcmPacket;
use crate::error::{Result, StudioError};

#[derive(Debug, Default)]
struct MockLog {
    language: Option<Language>,
    connected: bool,
    packets_received: u64,
    send_attempts: u64,
    disconnects: u64,
}

/// Read-only view of what a [`MockCollaborator`] has seen, usable after the
/// mock has been moved into a link
#[derive(Debug, Clone, Default)]
pub struct MockHandle {
    log: Arc<Mutex<MockLog>>,
}

impl MockHandle {
    fn lock(&self) -> MutexGuard<'_, MockLog> {
        self.log.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn language(&self) -> Option<Language> {
        self.lock().language
    }

    pub fn is_connected(&self) -> bool {
        self.lock().connected
    }

    pub fn packets_received(&self) -> u64 {
        self.lock().packets_received
    }

    pub fn send_attempts(&self) -> u64 {
        self.lock().send_attempts
    }

    pub fn disconnects(&self) -> u64 {
        self.lock().disconnects
    }
}

#[derive(Debug, Clone)]
struct Reply {
    every_packets: u64,
    user_text: String,
    assistant_text: String,
}

#[derive(Debug, Default)]
enum Pending {
    #[default]
    None,
    Reply,
}

/// In-process stand-in for the live service
#[derive(Debug, Default)]
pub struct MockCollaborator {
    handle: MockHandle,
    connect_failure: Option<String>,
    send_failure: Option<(u64, String)>,
    reply: Option<Reply>,
    pending: Pending,
    queued: VecDeque<(String, Speaker, bool)>,
}

impl MockCollaborator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn handle(&self) -> MockHandle {
        self.handle.clone()
    }

    /// `connect` fails with `message`
    pub fn with_connect_failure(mut self, message: &str) -> Self {
        self.connect_failure = Some(message.to_string());
        self
    }

    /// The first `ok_sends` packets succeed, every later send fails
    pub fn with_send_failure_after(mut self, ok_sends: u64, message: &str) -> Self {
        self.send_failure = Some((ok_sends, message.to_string()));
        self
    }

    /// Every `every_packets` packets, hear `user_text` and answer `assistant_text`
    pub fn with_reply_every(mut self, every_packets: u64, user_text: &str, assistant_text: &str) -> Self {
        self.reply = Some(Reply {
            every_packets: every_packets.max(1),
            user_text: user_text.to_string(),
            assistant_text: assistant_text.to_string(),
        });
        self
    }

    /// Deliver a transcript fragment on the next poll; assistant lines also
    /// become prompts when `prompt` is set
    pub fn queue_transcript(&mut self, text: &str, speaker: Speaker, prompt: bool) {
        self.queued.push_back((text.to_string(), speaker, prompt));
    }
}

impl Collaborator for MockCollaborator {
    fn name(&self) -> &str {
        "mock"
    }

    fn connect(&mut self, language: Language) -> Result<()> {
        if let Some(message) = &self.connect_failure {
            return Err(StudioError::collaborator(message.clone()));
        }
        let mut log = self.handle.lock();
        log.language = Some(language);
        log.connected = true;
        log.packets_received = 0;
        log.send_attempts = 0;
        Ok(())
    }

    fn send_audio(&mut self, packet: &PcmPacket) -> Result<()> {
        let mut log = self.handle.lock();
        if !log.connected {
            return Err(StudioError::collaborator("connection closed"));
        }
        log.send_attempts += 1;
        if let Some((ok_sends, message)) = &self.send_failure {
            if log.packets_received >= *ok_sends {
                return Err(StudioError::collaborator(message.clone()));
            }
        }
        if packet.data.is_empty() {
            return Err(StudioError::collaborator("empty audio packet"));
        }
        log.packets_received += 1;
        if let Some(reply) = &self.reply {
            if log.packets_received % reply.every_packets == 0 {
                self.pending = Pending::Reply;
            }
        }
        Ok(())
    }

    fn poll_events(&mut self, now_ms: u64) -> Vec<CollaboratorEvent> {
        let mut events = Vec::new();
        if let (Pending::Reply, Some(reply)) = (std::mem::take(&mut self.pending), &self.reply) {
            self.queued.push_back((reply.user_text.clone(), Speaker::User, false));
            self.queued.push_back((reply.assistant_text.clone(), Speaker::Assistant, true));
        }
        while let Some((text, speaker, prompt)) = self.queued.pop_front() {
            if prompt {
                events.push(CollaboratorEvent::Prompt {
                    text: text.clone(),
                    at_ms: now_ms,
                });
            }
            events.push(CollaboratorEvent::Transcript {
                text,
                speaker,
                at_ms: now_ms,
            });
        }
        events
    }

    fn disconnect(&mut self) {
        let mut log = self.handle.lock();
        log.connected = false;
        log.disconnects += 1;
    }
}
