use convene_common::MediaStatus;

/// Requested enablement of local capture. Both start enabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MediaDeviceState {
    audio_enabled: bool,
    video_enabled: bool,
}

impl Default for MediaDeviceState {
    fn default() -> Self {
        Self {
            audio_enabled: true,
            video_enabled: true,
        }
    }
}

impl MediaDeviceState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn audio_enabled(&self) -> bool {
        self.audio_enabled
    }

    pub fn video_enabled(&self) -> bool {
        self.video_enabled
    }

    /// Flips the audio flag and returns the new value.
    pub fn toggle_audio(&mut self) -> bool {
        self.audio_enabled = !self.audio_enabled;
        self.audio_enabled
    }

    /// Flips the video flag and returns the new value.
    pub fn toggle_video(&mut self) -> bool {
        self.video_enabled = !self.video_enabled;
        self.video_enabled
    }

    pub fn status(&self) -> MediaStatus {
        MediaStatus {
            audio_enabled: self.audio_enabled,
            video_enabled: self.video_enabled,
        }
    }
}
