use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::synthetic::{SyntheticDevice, SyntheticPolicy};
use crate::error::DeviceError;

/// Kind of captured track
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrackKind {
    /// Microphone
    Audio,
    /// Camera
    Video,
    /// Display capture
    Screen,
}

impl fmt::Display for TrackKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TrackKind::Audio => "audio",
            TrackKind::Video => "video",
            TrackKind::Screen => "screen",
        };
        f.write_str(name)
    }
}

/// A single hardware track owned by a [`MediaStream`]
///
/// Disabling a track must silence the underlying device, not just hide it.
pub trait MediaTrack: Send + Sync {
    fn kind(&self) -> TrackKind;

    fn label(&self) -> &str;

    fn set_enabled(&self, enabled: bool);

    fn is_enabled(&self) -> bool;

    /// Stop the track and release the device. Stopping twice is a no-op.
    fn stop(&self);

    fn is_live(&self) -> bool;
}

/// An acquired capture stream: camera + microphone, or a screen share
pub struct MediaStream {
    id: Uuid,
    tracks: Vec<Arc<dyn MediaTrack>>,
}

impl MediaStream {
    pub fn new(tracks: Vec<Arc<dyn MediaTrack>>) -> Self {
        Self {
            id: Uuid::new_v4(),
            tracks,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn tracks(&self) -> &[Arc<dyn MediaTrack>] {
        &self.tracks
    }

    pub fn tracks_of(&self, kind: TrackKind) -> impl Iterator<Item = &Arc<dyn MediaTrack>> {
        self.tracks.iter().filter(move |t| t.kind() == kind)
    }

    /// Enable or disable every track of `kind`
    pub fn set_enabled(&self, kind: TrackKind, enabled: bool) {
        for track in self.tracks_of(kind) {
            track.set_enabled(enabled);
        }
    }

    /// Stop every track
    pub fn stop(&self) {
        for track in &self.tracks {
            track.stop();
        }
    }

    pub fn is_live(&self) -> bool {
        self.tracks.iter().any(|t| t.is_live())
    }
}

impl fmt::Debug for MediaStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MediaStream")
            .field("id", &self.id)
            .field("tracks", &self.tracks.len())
            .finish()
    }
}

/// Local capture backend
///
/// Implementations:
/// - Synthetic: software tracks with a scripted permission policy
/// - Headless: hosts with no capture hardware
#[async_trait::async_trait]
pub trait CaptureDevice: Send + Sync {
    /// Request combined camera + microphone capture
    async fn open_camera_mic(&self) -> Result<MediaStream, DeviceError>;

    /// Request a display capture stream
    async fn open_screen(&self) -> Result<MediaStream, DeviceError>;

    /// Backend name for logging
    fn name(&self) -> &str;
}

/// Capture backend selection
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceBackendKind {
    #[default]
    Synthetic,
    Headless,
}

/// Capture backend factory
pub struct CaptureDeviceFactory;

impl CaptureDeviceFactory {
    pub fn create(kind: DeviceBackendKind) -> Arc<dyn CaptureDevice> {
        match kind {
            DeviceBackendKind::Synthetic => {
                Arc::new(SyntheticDevice::new(SyntheticPolicy::default()))
            }
            DeviceBackendKind::Headless => Arc::new(HeadlessDevice),
        }
    }
}

/// A host without capture hardware
pub struct HeadlessDevice;

#[async_trait::async_trait]
impl CaptureDevice for HeadlessDevice {
    async fn open_camera_mic(&self) -> Result<MediaStream, DeviceError> {
        Err(DeviceError::NotFound(TrackKind::Video))
    }

    async fn open_screen(&self) -> Result<MediaStream, DeviceError> {
        Err(DeviceError::NotFound(TrackKind::Screen))
    }

    fn name(&self) -> &str {
        "headless"
    }
}
