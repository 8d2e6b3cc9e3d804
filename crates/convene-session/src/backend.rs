//! Media acquisition seam.
//!
//! The session never talks to capture hardware directly; it asks a
//! [`MediaBackend`] for streams and converts failures into notifications.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use futures::future::BoxFuture;
use futures::FutureExt;
use tracing::debug;

use crate::error::MediaAccessError;
use crate::stream::{MediaStream, MediaTrack, StreamKind, TrackKind};
use crate::types::{CaptureConstraints, DisplayConstraints};

/// Environment capability for acquiring local media.
///
/// Returned futures own everything they need so they can run on a spawned task
/// while the controller keeps handling events.
pub trait MediaBackend: Send + Sync {
    fn acquire_capture(
        &self,
        constraints: &CaptureConstraints,
    ) -> BoxFuture<'static, Result<MediaStream, MediaAccessError>>;

    /// Screen-share streams carry a single video track and no audio.
    fn acquire_display(
        &self,
        constraints: &DisplayConstraints,
    ) -> BoxFuture<'static, Result<MediaStream, MediaAccessError>>;
}

/// In-process backend that fabricates streams.
///
/// Failures are scripted per call; unscripted calls succeed. Every stream handed
/// out is remembered so a caller can act as the host environment (for example,
/// ending a share from the system's own "stop sharing" control).
#[derive(Debug, Clone, Default)]
pub struct SyntheticBackend {
    inner: Arc<Mutex<SyntheticState>>,
}

#[derive(Debug, Default)]
struct SyntheticState {
    delay: Duration,
    capture_failures: VecDeque<MediaAccessError>,
    display_failures: VecDeque<MediaAccessError>,
    issued: Vec<MediaStream>,
}

impl SyntheticBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every acquisition resolves only after `delay`.
    pub fn with_delay(delay: Duration) -> Self {
        let backend = Self::default();
        backend.state().delay = delay;
        backend
    }

    pub fn fail_next_capture(&self, err: MediaAccessError) {
        self.state().capture_failures.push_back(err);
    }

    pub fn fail_next_display(&self, err: MediaAccessError) {
        self.state().display_failures.push_back(err);
    }

    /// Streams handed out so far, oldest first.
    pub fn issued(&self) -> Vec<MediaStream> {
        self.state().issued.clone()
    }

    pub fn last_screen_share(&self) -> Option<MediaStream> {
        self.state()
            .issued
            .iter()
            .rev()
            .find(|s| s.kind() == StreamKind::ScreenShare)
            .cloned()
    }

    /// Ends the most recent share the way the host's own controls would.
    pub fn end_screen_share(&self) -> bool {
        match self.last_screen_share() {
            Some(stream) => stream.stop_all() > 0,
            None => false,
        }
    }

    fn state(&self) -> MutexGuard<'_, SyntheticState> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn issue(&self, stream: MediaStream) -> MediaStream {
        self.state().issued.push(stream.clone());
        stream
    }
}

impl MediaBackend for SyntheticBackend {
    fn acquire_capture(
        &self,
        constraints: &CaptureConstraints,
    ) -> BoxFuture<'static, Result<MediaStream, MediaAccessError>> {
        let backend = self.clone();
        let (delay, failure) = {
            let mut state = backend.state();
            (state.delay, state.capture_failures.pop_front())
        };
        let camera_label = format!(
            "Synthetic camera ({}x{})",
            constraints.video.ideal_width, constraints.video.ideal_height
        );

        async move {
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            if let Some(err) = failure {
                debug!("synthetic capture failing: {}", err);
                return Err(err);
            }
            let stream = MediaStream::new(
                StreamKind::Capture,
                vec![
                    MediaTrack::new(TrackKind::Audio, "Synthetic microphone"),
                    MediaTrack::new(TrackKind::Video, camera_label),
                ],
            );
            Ok(backend.issue(stream))
        }
        .boxed()
    }

    fn acquire_display(
        &self,
        constraints: &DisplayConstraints,
    ) -> BoxFuture<'static, Result<MediaStream, MediaAccessError>> {
        let backend = self.clone();
        let (delay, failure) = {
            let mut state = backend.state();
            (state.delay, state.display_failures.pop_front())
        };
        let label = format!("Synthetic screen ({:?})", constraints.display_surface);

        async move {
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            if let Some(err) = failure {
                debug!("synthetic screen share failing: {}", err);
                return Err(err);
            }
            let stream = MediaStream::new(
                StreamKind::ScreenShare,
                vec![MediaTrack::new(TrackKind::Video, label)],
            );
            Ok(backend.issue(stream))
        }
        .boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_capture_has_audio_and_video() {
        let backend = SyntheticBackend::new();
        let stream = backend
            .acquire_capture(&CaptureConstraints::default())
            .await
            .unwrap();
        assert_eq!(stream.kind(), StreamKind::Capture);
        assert!(stream.audio_track().is_some());
        assert_eq!(
            stream.video_track().unwrap().label(),
            "Synthetic camera (1280x720)"
        );
        assert_eq!(backend.issued().len(), 1);
    }

    #[tokio::test]
    async fn test_display_is_video_only() {
        let backend = SyntheticBackend::new();
        let stream = backend
            .acquire_display(&DisplayConstraints::default())
            .await
            .unwrap();
        assert_eq!(stream.kind(), StreamKind::ScreenShare);
        assert!(stream.audio_track().is_none());
        assert_eq!(stream.tracks().len(), 1);
    }

    #[tokio::test]
    async fn test_scripted_failure_applies_once() {
        let backend = SyntheticBackend::new();
        backend.fail_next_capture(MediaAccessError::PermissionDenied);

        let first = backend.acquire_capture(&CaptureConstraints::default()).await;
        assert_eq!(first.unwrap_err(), MediaAccessError::PermissionDenied);

        let second = backend.acquire_capture(&CaptureConstraints::default()).await;
        assert!(second.is_ok());
    }

    #[tokio::test]
    async fn test_end_screen_share_stops_latest_share() {
        let backend = SyntheticBackend::new();
        assert!(!backend.end_screen_share());

        let share = backend
            .acquire_display(&DisplayConstraints::default())
            .await
            .unwrap();
        assert!(backend.end_screen_share());
        assert!(!share.is_live());
        assert!(!backend.end_screen_share());
    }

    #[tokio::test(start_paused = true)]
    async fn test_delay_is_honored() {
        let backend = SyntheticBackend::with_delay(Duration::from_secs(3));
        let start = tokio::time::Instant::now();
        backend
            .acquire_capture(&CaptureConstraints::default())
            .await
            .unwrap();
        assert!(start.elapsed() >= Duration::from_secs(3));
    }
}
