use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

use crate::helpers::initials;

/// Reserved roster id of the local participant.
pub const LOCAL_PARTICIPANT_ID: &str = "local";

/// Side panels with mutually exclusive visibility.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Panel {
    Participants,
    Chat,
}

impl std::fmt::Display for Panel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Participants => write!(f, "participants"),
            Self::Chat => write!(f, "chat"),
        }
    }
}

/// Which stream the local preview renders.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DisplaySource {
    None,
    Capture,
    ScreenShare,
}

/// Local capture enablement as shown by the status indicators.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct MediaStatus {
    pub audio_enabled: bool,
    pub video_enabled: bool,
}

/// One roster entry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Participant {
    pub id: String,
    pub name: String,
    pub audio_enabled: bool,
    pub video_enabled: bool,
    pub is_local: bool,
}

impl Participant {
    pub fn initials(&self) -> String {
        initials(&self.name)
    }

    /// The local participant hosts the meeting.
    pub fn role_label(&self) -> &'static str {
        if self.is_local {
            "Host"
        } else {
            "Participant"
        }
    }
}

/// One chat log record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub sender: String,
    pub text: String,
    pub sent_at: DateTime<Local>,
}

impl ChatMessage {
    /// Two-digit hour and minute with an AM/PM marker, e.g. `09:05 AM`.
    pub fn timestamp_label(&self) -> String {
        self.sent_at.format("%I:%M %p").to_string()
    }
}

/// Events delivered by the signaling collaborator.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RemoteEvent {
    ParticipantJoined {
        id: String,
        name: String,
        audio_enabled: bool,
        video_enabled: bool,
    },
    ParticipantLeft {
        id: String,
    },
    MediaStateChanged {
        id: String,
        audio_enabled: bool,
        video_enabled: bool,
    },
    ChatReceived {
        sender: String,
        text: String,
    },
}

/// State-change notification consumed by a rendering layer.
///
/// Serialized as `{"kind": ..., "payload": ...}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", content = "payload", rename_all = "camelCase")]
pub enum Notification {
    #[serde(rename_all = "camelCase")]
    SessionStarted { meeting_id: String },

    MediaStatusChanged(MediaStatus),

    RosterChanged { participants: Vec<Participant> },

    ChatAppended(ChatMessage),

    PanelChanged { open: Option<Panel> },

    ClockTick { elapsed: String },

    #[serde(rename_all = "camelCase")]
    ShareStateChanged {
        sharing: bool,
        display_source: DisplaySource,
    },

    PermissionRequired { message: String },

    SessionEnded { elapsed: String },

    Error { message: String, retryable: bool },
}

impl Notification {
    /// Wire name of this notification kind.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::SessionStarted { .. } => "sessionStarted",
            Self::MediaStatusChanged(_) => "mediaStatusChanged",
            Self::RosterChanged { .. } => "rosterChanged",
            Self::ChatAppended(_) => "chatAppended",
            Self::PanelChanged { .. } => "panelChanged",
            Self::ClockTick { .. } => "clockTick",
            Self::ShareStateChanged { .. } => "shareStateChanged",
            Self::PermissionRequired { .. } => "permissionRequired",
            Self::SessionEnded { .. } => "sessionEnded",
            Self::Error { .. } => "error",
        }
    }

    pub fn to_json(&self) -> crate::Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}
