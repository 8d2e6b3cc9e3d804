//! Local capture and screen-share stream ownership.

use std::sync::Arc;

use convene_common::DisplaySource;
use futures::future::BoxFuture;
use futures::FutureExt;
use tokio::task::JoinHandle;
use tracing::{debug, info};
use uuid::Uuid;

use crate::backend::MediaBackend;
use crate::device::MediaDeviceState;
use crate::error::{MediaAccessError, ShareError};
use crate::stream::MediaStream;
use crate::types::{CaptureConstraints, DisplayConstraints};

/// Watches a share for host-initiated termination. Dropping it cancels the watch.
#[derive(Debug)]
pub struct EndedSubscription {
    task: JoinHandle<()>,
}

impl Drop for EndedSubscription {
    fn drop(&mut self) {
        self.task.abort();
    }
}

#[derive(Debug)]
struct ActiveShare {
    stream: MediaStream,
    watch: EndedSubscription,
}

/// Owns zero or one capture stream and zero or one screen-share stream.
pub struct MediaStreamManager {
    backend: Arc<dyn MediaBackend>,
    capture: Option<MediaStream>,
    share: Option<ActiveShare>,
}

impl MediaStreamManager {
    pub fn new(backend: Arc<dyn MediaBackend>) -> Self {
        Self {
            backend,
            capture: None,
            share: None,
        }
    }

    /// Starts a capture acquisition. The stream is not owned until [`attach_capture`].
    ///
    /// [`attach_capture`]: Self::attach_capture
    pub fn acquire_capture(
        &self,
        constraints: &CaptureConstraints,
    ) -> BoxFuture<'static, Result<MediaStream, MediaAccessError>> {
        self.backend.acquire_capture(constraints)
    }

    /// Starts a screen-share acquisition. The stream is not owned until
    /// [`start_screen_share`](Self::start_screen_share).
    pub fn request_screen_share(
        &self,
        constraints: &DisplayConstraints,
    ) -> BoxFuture<'static, Result<MediaStream, ShareError>> {
        self.backend
            .acquire_display(constraints)
            .map(|result| result.map_err(ShareError::from))
            .boxed()
    }

    /// Takes ownership of a capture stream, applying the requested enablement to
    /// its tracks. A previously attached capture stream is stopped.
    pub fn attach_capture(&mut self, stream: MediaStream, devices: &MediaDeviceState) {
        if let Some(previous) = self.capture.replace(stream) {
            previous.stop_all();
        }
        self.apply_device_state(devices);
        if let Some(capture) = &self.capture {
            info!(
                stream = %capture.id(),
                tracks = capture.tracks().len(),
                "capture stream attached"
            );
        }
    }

    /// Mirrors the requested enablement onto the live capture tracks, if any.
    pub fn apply_device_state(&self, devices: &MediaDeviceState) {
        let Some(capture) = &self.capture else {
            return;
        };
        if let Some(track) = capture.audio_track() {
            track.set_enabled(devices.audio_enabled());
        }
        if let Some(track) = capture.video_track() {
            track.set_enabled(devices.video_enabled());
        }
    }

    pub fn capture(&self) -> Option<&MediaStream> {
        self.capture.as_ref()
    }

    pub fn screen_share(&self) -> Option<&MediaStream> {
        self.share.as_ref().map(|s| &s.stream)
    }

    pub fn is_sharing(&self) -> bool {
        self.share.is_some()
    }

    /// Makes `stream` the display source and watches its video track.
    ///
    /// `on_ended` runs with the stream id if the host environment ends the
    /// track; it never runs after [`stop_screen_share`](Self::stop_screen_share).
    /// Must be called within a tokio runtime.
    pub fn start_screen_share<F>(&mut self, stream: MediaStream, on_ended: F)
    where
        F: FnOnce(Uuid) + Send + 'static,
    {
        self.stop_screen_share();

        let stream_id = stream.id();
        let watched = stream.video_track().or_else(|| stream.tracks().first());
        let task = match watched {
            Some(track) => {
                let ended = track.ended();
                tokio::spawn(async move {
                    if ended.await {
                        on_ended(stream_id);
                    }
                })
            }
            None => tokio::spawn(async {}),
        };

        info!(stream = %stream_id, "screen share started");
        self.share = Some(ActiveShare {
            stream,
            watch: EndedSubscription { task },
        });
    }

    /// Releases the share and restores capture as the display source.
    /// Returns `false` when nothing was being shared.
    pub fn stop_screen_share(&mut self) -> bool {
        let Some(ActiveShare { stream, watch }) = self.share.take() else {
            return false;
        };
        drop(watch);
        let stopped = stream.stop_all();
        info!(stream = %stream.id(), stopped, "screen share stopped");
        true
    }

    /// Screen share if present and live, else capture, else nothing.
    pub fn active_display_source(&self) -> Option<&MediaStream> {
        match self.screen_share() {
            Some(share) if share.is_live() => Some(share),
            _ => self.capture.as_ref(),
        }
    }

    pub fn display_source(&self) -> DisplaySource {
        match self.active_display_source() {
            Some(stream) if self.screen_share().map(MediaStream::id) == Some(stream.id()) => {
                DisplaySource::ScreenShare
            }
            Some(_) => DisplaySource::Capture,
            None => DisplaySource::None,
        }
    }

    /// Stops every track of both streams. Returns how many tracks were still live.
    pub fn teardown_all(&mut self) -> usize {
        let mut stopped = 0;
        if let Some(ActiveShare { stream, watch }) = self.share.take() {
            drop(watch);
            stopped += stream.stop_all();
        }
        if let Some(capture) = self.capture.take() {
            stopped += capture.stop_all();
        }
        debug!(stopped, "media torn down");
        stopped
    }
}

impl std::fmt::Debug for MediaStreamManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MediaStreamManager")
            .field("capture", &self.capture.as_ref().map(MediaStream::id))
            .field("share", &self.screen_share().map(MediaStream::id))
            .finish()
    }
}
