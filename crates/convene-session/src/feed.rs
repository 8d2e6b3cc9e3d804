//! Remote activity feeds.
//!
//! The controller consumes remote roster and chat events from a [`RemoteFeed`].
//! [`ScriptedFeed`] replays timed events and stands in for a signaling service;
//! [`ChannelFeed`] adapts any producer that can push into an mpsc channel.

use std::collections::VecDeque;
use std::time::Duration;

use convene_common::RemoteEvent;
use futures::future::BoxFuture;
use futures::FutureExt;
use tokio::sync::mpsc;
use tokio::time::Instant;

pub trait RemoteFeed: Send {
    /// Next remote event, or `None` once the feed is exhausted.
    fn next_event(&mut self) -> BoxFuture<'_, Option<RemoteEvent>>;
}

#[derive(Debug, Clone)]
pub struct ScriptedEvent {
    /// Offset from the first poll of the feed.
    pub after: Duration,
    pub event: RemoteEvent,
}

#[derive(Debug, Default)]
pub struct ScriptedFeed {
    started_at: Option<Instant>,
    script: VecDeque<ScriptedEvent>,
}

impl ScriptedFeed {
    /// Events must be ordered by `after`.
    pub fn new(script: impl IntoIterator<Item = ScriptedEvent>) -> Self {
        Self {
            started_at: None,
            script: script.into_iter().collect(),
        }
    }

    /// Two participants join, then one of them says hello.
    pub fn demo() -> Self {
        Self::new([
            ScriptedEvent {
                after: Duration::from_secs(2),
                event: RemoteEvent::ParticipantJoined {
                    id: "participant1".into(),
                    name: "John Doe".into(),
                    audio_enabled: true,
                    video_enabled: true,
                },
            },
            ScriptedEvent {
                after: Duration::from_secs(4),
                event: RemoteEvent::ParticipantJoined {
                    id: "participant2".into(),
                    name: "Jane Smith".into(),
                    audio_enabled: true,
                    video_enabled: false,
                },
            },
            ScriptedEvent {
                after: Duration::from_secs(5),
                event: RemoteEvent::ChatReceived {
                    sender: "John Doe".into(),
                    text: "Hello everyone!".into(),
                },
            },
        ])
    }

    pub fn remaining(&self) -> usize {
        self.script.len()
    }
}

impl RemoteFeed for ScriptedFeed {
    fn next_event(&mut self) -> BoxFuture<'_, Option<RemoteEvent>> {
        async move {
            let started_at = *self.started_at.get_or_insert_with(Instant::now);
            let next = self.script.pop_front()?;
            tokio::time::sleep_until(started_at + next.after).await;
            Some(next.event)
        }
        .boxed()
    }
}

/// Feed backed by an mpsc receiver; ends when every sender is dropped.
#[derive(Debug)]
pub struct ChannelFeed {
    rx: mpsc::UnboundedReceiver<RemoteEvent>,
}

impl ChannelFeed {
    pub fn new() -> (mpsc::UnboundedSender<RemoteEvent>, Self) {
        let (tx, rx) = mpsc::unbounded_channel();
        (tx, Self { rx })
    }
}

impl RemoteFeed for ChannelFeed {
    fn next_event(&mut self) -> BoxFuture<'_, Option<RemoteEvent>> {
        self.rx.recv().boxed()
    }
}
