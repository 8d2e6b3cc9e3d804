pub mod backend;
pub mod chat;
pub mod clock;
pub mod controller;
pub mod device;
pub mod error;
pub mod feed;
pub mod identity;
pub mod media;
pub mod panel;
pub mod peer;
pub mod roster;
pub mod stream;
pub mod types;

pub use backend::{MediaBackend, SyntheticBackend};
pub use controller::{SessionController, SessionHandle};
pub use error::{MediaAccessError, Result, RosterError, SessionError, ShareError};
pub use feed::{ChannelFeed, RemoteFeed, ScriptedEvent, ScriptedFeed};
pub use identity::SessionIdentity;
pub use stream::{MediaStream, MediaTrack, StreamKind, TrackKind};
pub use types::{SessionConfig, SessionEvent, SessionPhase, UserAction};
