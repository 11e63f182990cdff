use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use super::device::{CaptureDevice, MediaStream, TrackKind};
use crate::error::DeviceError;

/// User-facing device toggles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaState {
    pub video_enabled: bool,
    pub audio_enabled: bool,
    pub screen_sharing: bool,
}

impl Default for MediaState {
    fn default() -> Self {
        Self {
            video_enabled: true,
            audio_enabled: true,
            screen_sharing: false,
        }
    }
}

/// Owns the session's capture streams: at most one camera/mic stream and one
/// screen stream. Everything still held is stopped on drop.
pub struct MediaController {
    device: Arc<dyn CaptureDevice>,
    state: MediaState,
    camera: Option<MediaStream>,
    screen: Option<MediaStream>,
}

impl MediaController {
    pub fn new(device: Arc<dyn CaptureDevice>) -> Self {
        Self {
            device,
            state: MediaState::default(),
            camera: None,
            screen: None,
        }
    }

    pub fn state(&self) -> MediaState {
        self.state
    }

    /// Number of streams currently held
    pub fn held_streams(&self) -> usize {
        usize::from(self.camera.is_some()) + usize::from(self.screen.is_some())
    }

    pub fn has_camera(&self) -> bool {
        self.camera.is_some()
    }

    /// Acquire combined camera + microphone capture
    ///
    /// The current toggles are applied to the new tracks, so a camera switched
    /// off before the interview starts stays off.
    pub async fn acquire_camera_mic(&mut self) -> Result<Uuid, DeviceError> {
        if let Some(stream) = &self.camera {
            return Ok(stream.id());
        }

        info!("Acquiring camera/mic via {}", self.device.name());

        let stream = self.device.open_camera_mic().await?;
        stream.set_enabled(TrackKind::Video, self.state.video_enabled);
        stream.set_enabled(TrackKind::Audio, self.state.audio_enabled);

        let id = stream.id();
        self.camera = Some(stream);

        info!("Camera/mic stream {} acquired", id);

        Ok(id)
    }

    /// Flip the video toggle and apply it to the camera track. Returns the new value.
    pub fn toggle_video(&mut self) -> bool {
        self.state.video_enabled = !self.state.video_enabled;
        if let Some(stream) = &self.camera {
            stream.set_enabled(TrackKind::Video, self.state.video_enabled);
        }
        self.state.video_enabled
    }

    /// Flip the audio toggle and apply it to the microphone track. Returns the new value.
    pub fn toggle_audio(&mut self) -> bool {
        self.state.audio_enabled = !self.state.audio_enabled;
        if let Some(stream) = &self.camera {
            stream.set_enabled(TrackKind::Audio, self.state.audio_enabled);
        }
        self.state.audio_enabled
    }

    /// Acquire a screen share. Denial leaves the camera/mic stream untouched.
    pub async fn start_screen_share(&mut self) -> Result<Uuid, DeviceError> {
        if let Some(stream) = &self.screen {
            return Ok(stream.id());
        }

        let stream = match self.device.open_screen().await {
            Ok(stream) => stream,
            Err(e) => {
                warn!("Screen share refused: {}", e);
                return Err(e);
            }
        };

        let id = stream.id();
        self.screen = Some(stream);
        self.state.screen_sharing = true;

        info!("Screen share stream {} started", id);

        Ok(id)
    }

    pub fn stop_screen_share(&mut self) {
        if let Some(stream) = self.screen.take() {
            stream.stop();
            info!("Screen share stream {} stopped", stream.id());
        }
        self.state.screen_sharing = false;
    }

    /// Stop the camera/mic stream only, keeping any screen share
    pub fn release_camera(&mut self) -> bool {
        match self.camera.take() {
            Some(stream) => {
                stream.stop();
                info!("Camera/mic stream {} released", stream.id());
                true
            }
            None => false,
        }
    }

    /// Stop every held stream. Calling again is a no-op.
    pub fn release(&mut self) -> usize {
        let mut released = usize::from(self.release_camera());

        if let Some(stream) = self.screen.take() {
            stream.stop();
            info!("Screen share stream {} released", stream.id());
            released += 1;
        }

        self.state.screen_sharing = false;
        released
    }
}

impl Drop for MediaController {
    fn drop(&mut self) {
        self.release();
    }
}
