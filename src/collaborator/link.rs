//! Fault-isolating wrapper around a [`Collaborator`]

use log::{debug, info, warn};

use super::{Collaborator, CollaboratorEvent, Language};
use crate::audio::PcmPacket;
use crate::error::{CollaboratorFault, Result, StudioError};

/// Owns the optional collaborator and its offline flag.
///
/// Once a connect or send fails the link goes offline and stops forwarding
/// for the rest of the session. Recording and animation never see the error.
pub struct CollaboratorLink {
    collaborator: Option<Box<dyn Collaborator>>,
    connected: bool,
    offline: bool,
    last_fault: Option<(CollaboratorFault, String)>,
    packets_sent: u64,
}

impl CollaboratorLink {
    pub fn new(collaborator: Box<dyn Collaborator>) -> Self {
        Self {
            collaborator: Some(collaborator),
            ..Self::detached()
        }
    }

    /// A link with nothing behind it; forwarding is a no-op
    pub fn detached() -> Self {
        Self {
            collaborator: None,
            connected: false,
            offline: false,
            last_fault: None,
            packets_sent: 0,
        }
    }

    pub fn has_collaborator(&self) -> bool {
        self.collaborator.is_some()
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    pub fn is_offline(&self) -> bool {
        self.offline
    }

    pub fn last_fault(&self) -> Option<&(CollaboratorFault, String)> {
        self.last_fault.as_ref()
    }

    pub fn packets_sent(&self) -> u64 {
        self.packets_sent
    }

    /// Open a session. Failure flips the link offline and is returned for
    /// the caller to surface; it is never fatal to recording.
    pub fn connect(&mut self, language: Language) -> Result<()> {
        self.offline = false;
        self.last_fault = None;
        self.packets_sent = 0;
        let Some(collaborator) = self.collaborator.as_mut() else {
            return Ok(());
        };
        match collaborator.connect(language) {
            Ok(()) => {
                info!("Collaborator {} connected ({})", collaborator.name(), language);
                self.connected = true;
                Ok(())
            }
            Err(e) => {
                self.mark_offline(&e);
                Err(e)
            }
        }
    }

    /// Forward one packet; returns whether it was sent
    pub fn forward(&mut self, packet: &PcmPacket) -> bool {
        if !self.connected || self.offline {
            return false;
        }
        let Some(collaborator) = self.collaborator.as_mut() else {
            return false;
        };
        match collaborator.send_audio(packet) {
            Ok(()) => {
                self.packets_sent += 1;
                true
            }
            Err(e) => {
                self.mark_offline(&e);
                false
            }
        }
    }

    /// Runtime error reported by the service outside of a send
    pub fn report_error(&mut self, message: &str) {
        let err = StudioError::collaborator(message);
        self.mark_offline(&err);
    }

    pub fn poll(&mut self, now_ms: u64) -> Vec<CollaboratorEvent> {
        match self.collaborator.as_mut() {
            Some(c) if self.connected && !self.offline => c.poll_events(now_ms),
            _ => Vec::new(),
        }
    }

    /// Fire-and-forget close
    pub fn disconnect(&mut self) {
        if !self.connected {
            return;
        }
        if let Some(collaborator) = self.collaborator.as_mut() {
            collaborator.disconnect();
            debug!("Collaborator {} disconnected", collaborator.name());
        }
        self.connected = false;
    }

    fn mark_offline(&mut self, err: &StudioError) {
        let (kind, reason) = match err {
            StudioError::Collaborator { kind, reason } => (*kind, reason.clone()),
            other => {
                let reason = other.to_string();
                (CollaboratorFault::classify(&reason), reason)
            }
        };
        warn!("Collaborator offline ({}): {}", kind, reason);
        self.offline = true;
        self.last_fault = Some((kind, reason));
    }
}

impl std::fmt::Debug for CollaboratorLink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CollaboratorLink")
            .field("collaborator", &self.collaborator.as_ref().map(|c| c.name()))
            .field("connected", &self.connected)
            .field("offline", &self.offline)
            .field("packets_sent", &self.packets_sent)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::PcmFramer;
    use crate::collaborator::MockCollaborator;

    fn packet() -> PcmPacket {
        PcmFramer::new(16000, 160).unwrap().packetize(&[0.0; 160])
    }

    #[test]
    fn test_forwarding_counts_packets() {
        let mock = MockCollaborator::new();
        let handle = mock.handle();
        let mut link = CollaboratorLink::new(Box::new(mock));
        link.connect(Language::En).unwrap();

        assert!(link.forward(&packet()));
        assert!(link.forward(&packet()));
        assert_eq!(link.packets_sent(), 2);
        assert_eq!(handle.packets_received(), 2);
        assert_eq!(handle.language(), Some(Language::En));
    }

    #[test]
    fn test_connect_failure_goes_offline() {
        let mock = MockCollaborator::new().with_connect_failure("Region not supported");
        let mut link = CollaboratorLink::new(Box::new(mock));

        let err = link.connect(Language::Zh).unwrap_err();
        assert_eq!(err.error_code(), "COLLABORATOR");
        assert!(link.is_offline());
        assert_eq!(
            link.last_fault().map(|(kind, _)| *kind),
            Some(CollaboratorFault::RegionUnsupported)
        );
        assert!(!link.forward(&packet()));
    }

    #[test]
    fn test_send_failure_suppresses_further_forwarding() {
        let mock = MockCollaborator::new().with_send_failure_after(1, "socket closed");
        let handle = mock.handle();
        let mut link = CollaboratorLink::new(Box::new(mock));
        link.connect(Language::En).unwrap();

        assert!(link.forward(&packet()));
        assert!(!link.forward(&packet()));
        assert!(!link.forward(&packet()));
        assert!(link.is_offline());
        assert_eq!(handle.packets_received(), 1);
        assert_eq!(handle.send_attempts(), 2);
    }

    #[test]
    fn test_runtime_error_goes_offline() {
        let mut link = CollaboratorLink::new(Box::new(MockCollaborator::new()));
        link.connect(Language::En).unwrap();
        link.report_error("HTTP 403");
        assert!(link.is_offline());
        assert!(link.poll(0).is_empty());
    }

    #[test]
    fn test_detached_link_is_inert() {
        let mut link = CollaboratorLink::detached();
        link.connect(Language::Zh).unwrap();
        assert!(!link.forward(&packet()));
        assert!(!link.is_offline());
        link.disconnect();
    }

    #[test]
    fn test_reconnect_clears_offline() {
        let mock = MockCollaborator::new().with_send_failure_after(0, "network down");
        let mut link = CollaboratorLink::new(Box::new(mock));
        link.connect(Language::En).unwrap();
        assert!(!link.forward(&packet()));
        assert!(link.is_offline());

        link.disconnect();
        link.connect(Language::En).unwrap();
        assert!(!link.is_offline());
    }
}
