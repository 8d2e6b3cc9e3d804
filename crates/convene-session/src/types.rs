use std::fmt;
use std::time::Duration;

use convene_common::{Panel, RemoteEvent};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{MediaAccessError, ShareError};
use crate::stream::MediaStream;

pub const DEFAULT_DISPLAY_NAME: &str = "You";
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_secs(1);
pub const DEFAULT_NOTIFICATION_CAPACITY: usize = 256;

#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Name shown for the local participant and used as the chat sender.
    pub display_name: String,
    pub capture: CaptureConstraints,
    pub display: DisplayConstraints,
    pub tick_interval: Duration,
    pub notification_capacity: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            display_name: DEFAULT_DISPLAY_NAME.to_string(),
            capture: CaptureConstraints::default(),
            display: DisplayConstraints::default(),
            tick_interval: DEFAULT_TICK_INTERVAL,
            notification_capacity: DEFAULT_NOTIFICATION_CAPACITY,
        }
    }
}

/// Advisory capture request; the environment may not honor it exactly.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct CaptureConstraints {
    pub audio: AudioConstraints,
    pub video: VideoConstraints,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AudioConstraints {
    pub echo_cancellation: bool,
    pub noise_suppression: bool,
    pub auto_gain_control: bool,
}

impl Default for AudioConstraints {
    fn default() -> Self {
        Self {
            echo_cancellation: true,
            noise_suppression: true,
            auto_gain_control: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct VideoConstraints {
    pub ideal_width: u32,
    pub ideal_height: u32,
    pub facing_mode: FacingMode,
}

impl Default for VideoConstraints {
    fn default() -> Self {
        Self {
            ideal_width: 1280,
            ideal_height: 720,
            facing_mode: FacingMode::User,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FacingMode {
    User,
    Environment,
}

/// Screen-share request. Shares never carry audio.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DisplayConstraints {
    pub cursor: CursorVisibility,
    pub display_surface: DisplaySurface,
}

impl Default for DisplayConstraints {
    fn default() -> Self {
        Self {
            cursor: CursorVisibility::Always,
            display_surface: DisplaySurface::Monitor,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CursorVisibility {
    Always,
    Motion,
    Never,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DisplaySurface {
    Monitor,
    Window,
    Browser,
}

/// Lifecycle of one session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionPhase {
    Idle,
    AcquiringMedia,
    /// Capture was declined; `initialize` or `retry_permission` tries again.
    AwaitingPermission,
    Active,
    /// Terminal for this session.
    Failed { message: String },
    Ended,
}

impl SessionPhase {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Failed { .. } | Self::Ended)
    }
}

impl fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::AcquiringMedia => write!(f, "acquiring media"),
            Self::AwaitingPermission => write!(f, "awaiting permission"),
            Self::Active => write!(f, "active"),
            Self::Failed { .. } => write!(f, "failed"),
            Self::Ended => write!(f, "ended"),
        }
    }
}

/// Actions issued by the local user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserAction {
    Join { meeting_id: String, token: String },
    RetryPermission,
    ToggleAudio,
    ToggleVideo,
    ToggleScreenShare,
    SendChat(String),
    OpenPanel(Panel),
    ClosePanel(Panel),
    TogglePanel(Panel),
    Leave,
}

/// Everything the controller reacts to, delivered through its inbox one at a time.
#[derive(Debug)]
pub enum SessionEvent {
    User(UserAction),
    Remote(RemoteEvent),
    CaptureResolved {
        attempt: u64,
        result: Result<MediaStream, MediaAccessError>,
    },
    ShareResolved {
        attempt: u64,
        result: Result<MediaStream, ShareError>,
    },
    /// A screen-share track was ended by the host environment.
    ShareEnded { stream_id: Uuid },
    /// The remote feed has no more events.
    FeedClosed,
}
