//! Placeholder peer links, one per remote participant.
//!
//! No transport is negotiated; the links only track lifecycle so that leaving
//! the session closes everything a real transport would have opened.

use std::collections::HashMap;

use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeerLinkState {
    Pending,
    Closed,
}

#[derive(Debug)]
pub struct PeerLink {
    participant_id: String,
    state: PeerLinkState,
}

impl PeerLink {
    fn close(&mut self) -> bool {
        if self.state == PeerLinkState::Closed {
            return false;
        }
        self.state = PeerLinkState::Closed;
        debug!(participant = %self.participant_id, "peer link closed");
        true
    }

    pub fn state(&self) -> PeerLinkState {
        self.state
    }
}

#[derive(Debug, Default)]
pub struct PeerLinks {
    links: HashMap<String, PeerLink>,
}

impl PeerLinks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn open(&mut self, participant_id: &str) {
        self.links
            .entry(participant_id.to_string())
            .or_insert_with(|| PeerLink {
                participant_id: participant_id.to_string(),
                state: PeerLinkState::Pending,
            });
    }

    pub fn close(&mut self, participant_id: &str) -> bool {
        match self.links.remove(participant_id) {
            Some(mut link) => link.close(),
            None => false,
        }
    }

    /// Closes and forgets every link. Returns how many were closed.
    pub fn close_all(&mut self) -> usize {
        self.links
            .drain()
            .filter(|(_, link)| link.state != PeerLinkState::Closed)
            .map(|(_, mut link)| link.close())
            .filter(|closed| *closed)
            .count()
    }

    pub fn get(&self, participant_id: &str) -> Option<&PeerLink> {
        self.links.get(participant_id)
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_close_lifecycle() {
        let mut links = PeerLinks::new();
        links.open("participant1");
        links.open("participant1");
        assert_eq!(links.len(), 1);
        assert_eq!(
            links.get("participant1").map(PeerLink::state),
            Some(PeerLinkState::Pending)
        );

        assert!(links.close("participant1"));
        assert!(!links.close("participant1"));
        assert!(links.is_empty());
    }

    #[test]
    fn test_close_all() {
        let mut links = PeerLinks::new();
        links.open("a");
        links.open("b");
        assert_eq!(links.close_all(), 2);
        assert_eq!(links.close_all(), 0);
    }
}
