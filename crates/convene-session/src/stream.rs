//! Media stream and track handles.
//!
//! A [`MediaTrack`] is a cheap clonable handle; every clone observes the same
//! enabled flag and the same end-of-track signal.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::watch;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackKind {
    Audio,
    Video,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamKind {
    Capture,
    ScreenShare,
}

#[derive(Debug)]
struct TrackState {
    enabled: AtomicBool,
    ended: watch::Sender<bool>,
}

#[derive(Debug, Clone)]
pub struct MediaTrack {
    id: Uuid,
    kind: TrackKind,
    label: String,
    state: Arc<TrackState>,
}

impl MediaTrack {
    pub fn new(kind: TrackKind, label: impl Into<String>) -> Self {
        let (ended, _) = watch::channel(false);
        Self {
            id: Uuid::new_v4(),
            kind,
            label: label.into(),
            state: Arc::new(TrackState {
                enabled: AtomicBool::new(true),
                ended,
            }),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn kind(&self) -> TrackKind {
        self.kind
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn is_enabled(&self) -> bool {
        self.state.enabled.load(Ordering::Relaxed)
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.state.enabled.store(enabled, Ordering::Relaxed);
    }

    pub fn is_live(&self) -> bool {
        !*self.state.ended.borrow()
    }

    /// Ends the track. Returns `false` if it had already ended.
    pub fn stop(&self) -> bool {
        self.state.ended.send_if_modified(|ended| {
            if *ended {
                false
            } else {
                *ended = true;
                true
            }
        })
    }

    /// Resolves to `true` once the track ends.
    pub fn ended(&self) -> impl Future<Output = bool> + Send + 'static {
        let mut rx = self.state.ended.subscribe();
        async move { rx.wait_for(|ended| *ended).await.is_ok() }
    }
}

#[derive(Debug, Clone)]
pub struct MediaStream {
    id: Uuid,
    kind: StreamKind,
    tracks: Vec<MediaTrack>,
}

impl MediaStream {
    pub fn new(kind: StreamKind, tracks: Vec<MediaTrack>) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            tracks,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn kind(&self) -> StreamKind {
        self.kind
    }

    pub fn tracks(&self) -> &[MediaTrack] {
        &self.tracks
    }

    pub fn audio_track(&self) -> Option<&MediaTrack> {
        self.tracks.iter().find(|t| t.kind() == TrackKind::Audio)
    }

    pub fn video_track(&self) -> Option<&MediaTrack> {
        self.tracks.iter().find(|t| t.kind() == TrackKind::Video)
    }

    pub fn is_live(&self) -> bool {
        self.tracks.iter().any(MediaTrack::is_live)
    }

    /// Stops every track, returning how many were still live.
    pub fn stop_all(&self) -> usize {
        self.tracks.iter().filter(|track| track.stop()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn capture_stream() -> MediaStream {
        MediaStream::new(
            StreamKind::Capture,
            vec![
                MediaTrack::new(TrackKind::Audio, "mic"),
                MediaTrack::new(TrackKind::Video, "camera"),
            ],
        )
    }

    #[test]
    fn test_stop_is_idempotent() {
        let track = MediaTrack::new(TrackKind::Video, "camera");
        assert!(track.is_live());
        assert!(track.stop());
        assert!(!track.stop());
        assert!(!track.is_live());
    }

    #[test]
    fn test_clones_share_state() {
        let track = MediaTrack::new(TrackKind::Audio, "mic");
        let handle = track.clone();
        handle.set_enabled(false);
        assert!(!track.is_enabled());
        handle.stop();
        assert!(!track.is_live());
    }

    #[test]
    fn test_stop_all_counts_live_tracks() {
        let stream = capture_stream();
        stream.audio_track().unwrap().stop();
        assert!(stream.is_live());
        assert_eq!(stream.stop_all(), 1);
        assert!(!stream.is_live());
        assert_eq!(stream.stop_all(), 0);
    }

    #[tokio::test]
    async fn test_ended_resolves_after_stop() {
        let track = MediaTrack::new(TrackKind::Video, "screen");
        let ended = tokio::spawn(track.ended());
        tokio::task::yield_now().await;
        track.stop();
        assert!(ended.await.unwrap());
    }

    #[tokio::test]
    async fn test_ended_resolves_immediately_for_stopped_track() {
        let track = MediaTrack::new(TrackKind::Video, "screen");
        track.stop();
        assert!(track.ended().await);
    }
}
