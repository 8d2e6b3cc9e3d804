//! Participant roster.
//!
//! Remote entries keep join order. The local entry is refreshed from
//! [`MediaDeviceState`] by [`Roster::upsert_local`] and always listed first.

use convene_common::{Participant, LOCAL_PARTICIPANT_ID};

use crate::device::MediaDeviceState;
use crate::error::RosterError;

#[derive(Debug, Default)]
pub struct Roster {
    local: Option<Participant>,
    remotes: Vec<Participant>,
}

impl Roster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Writes the local entry from the current device flags.
    pub fn upsert_local(&mut self, name: &str, devices: &MediaDeviceState) {
        self.local = Some(Participant {
            id: LOCAL_PARTICIPANT_ID.to_string(),
            name: name.to_string(),
            audio_enabled: devices.audio_enabled(),
            video_enabled: devices.video_enabled(),
            is_local: true,
        });
    }

    pub fn local(&self) -> Option<&Participant> {
        self.local.as_ref()
    }

    pub fn add_remote(
        &mut self,
        id: &str,
        name: &str,
        audio_enabled: bool,
        video_enabled: bool,
    ) -> Result<&Participant, RosterError> {
        if id == LOCAL_PARTICIPANT_ID || self.remote_index(id).is_some() {
            return Err(RosterError::DuplicateId(id.to_string()));
        }
        self.remotes.push(Participant {
            id: id.to_string(),
            name: name.to_string(),
            audio_enabled,
            video_enabled,
            is_local: false,
        });
        Ok(&self.remotes[self.remotes.len() - 1])
    }

    /// Updates a remote participant's media flags in place.
    /// Returns `false` for unknown ids.
    pub fn update_remote(&mut self, id: &str, audio_enabled: bool, video_enabled: bool) -> bool {
        match self.remote_index(id) {
            Some(idx) => {
                let entry = &mut self.remotes[idx];
                entry.audio_enabled = audio_enabled;
                entry.video_enabled = video_enabled;
                true
            }
            None => false,
        }
    }

    /// Removes a remote participant. Unknown ids are ignored.
    pub fn remove_remote(&mut self, id: &str) -> Option<Participant> {
        self.remote_index(id).map(|idx| self.remotes.remove(idx))
    }

    pub fn get(&self, id: &str) -> Option<&Participant> {
        if id == LOCAL_PARTICIPANT_ID {
            return self.local.as_ref();
        }
        self.remote_index(id).map(|idx| &self.remotes[idx])
    }

    pub fn count(&self) -> usize {
        self.remotes.len() + usize::from(self.local.is_some())
    }

    /// Local entry first, then remotes in join order.
    pub fn participants(&self) -> Vec<Participant> {
        self.local
            .iter()
            .chain(self.remotes.iter())
            .cloned()
            .collect()
    }

    pub fn clear(&mut self) {
        self.local = None;
        self.remotes.clear();
    }

    fn remote_index(&self, id: &str) -> Option<usize> {
        self.remotes.iter().position(|p| p.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roster_with_local() -> Roster {
        let mut roster = Roster::new();
        roster.upsert_local("You", &MediaDeviceState::new());
        roster
    }

    #[test]
    fn test_count_includes_local() {
        let mut roster = roster_with_local();
        assert_eq!(roster.count(), 1);

        roster
            .add_remote("participant1", "John Doe", true, true)
            .unwrap();
        assert_eq!(roster.count(), 2);

        roster.remove_remote("participant1");
        assert_eq!(roster.count(), 1);
    }

    #[test]
    fn test_duplicate_join_is_rejected() {
        let mut roster = roster_with_local();
        roster
            .add_remote("participant1", "John Doe", true, true)
            .unwrap();
        let err = roster
            .add_remote("participant1", "Someone Else", false, false)
            .unwrap_err();
        assert_eq!(err, RosterError::DuplicateId("participant1".into()));
        assert_eq!(roster.get("participant1").unwrap().name, "John Doe");
    }

    #[test]
    fn test_local_id_is_reserved() {
        let mut roster = roster_with_local();
        assert!(roster
            .add_remote(LOCAL_PARTICIPANT_ID, "Impostor", true, true)
            .is_err());
        assert_eq!(roster.count(), 1);
    }

    #[test]
    fn test_remove_unknown_is_noop() {
        let mut roster = roster_with_local();
        assert!(roster.remove_remote("ghost").is_none());
        assert!(roster.remove_remote("ghost").is_none());
        assert_eq!(roster.count(), 1);
    }

    #[test]
    fn test_upsert_local_tracks_device_flags() {
        let mut roster = roster_with_local();
        let mut devices = MediaDeviceState::new();
        devices.toggle_audio();
        roster.upsert_local("You", &devices);

        let local = roster.local().unwrap();
        assert!(!local.audio_enabled);
        assert!(local.video_enabled);
        assert!(local.is_local);
        assert_eq!(roster.count(), 1);
    }

    #[test]
    fn test_participants_order() {
        let mut roster = Roster::new();
        roster.add_remote("b", "Bee", true, true).unwrap();
        roster.add_remote("a", "Ay", true, true).unwrap();
        roster.upsert_local("You", &MediaDeviceState::new());

        let ids: Vec<_> = roster.participants().into_iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![LOCAL_PARTICIPANT_ID, "b", "a"]);
    }

    #[test]
    fn test_update_remote_in_place() {
        let mut roster = roster_with_local();
        roster
            .add_remote("participant2", "Jane Smith", true, false)
            .unwrap();
        assert!(roster.update_remote("participant2", false, true));
        assert!(!roster.update_remote("ghost", true, true));

        let jane = roster.get("participant2").unwrap();
        assert!(!jane.audio_enabled);
        assert!(jane.video_enabled);
    }

    #[test]
    fn test_clear_empties_everything() {
        let mut roster = roster_with_local();
        roster.add_remote("participant1", "John Doe", true, true).unwrap();
        roster.clear();
        assert_eq!(roster.count(), 0);
        assert!(roster.participants().is_empty());
    }
}
