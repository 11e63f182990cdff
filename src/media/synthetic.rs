// Software capture backend
//
// Produces tracks that behave like hardware tracks (enable/disable, stop)
// without touching a device. Permission outcomes are scripted through
// `SyntheticPolicy` so the session lifecycle can run on any host.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tracing::info;

use super::device::{CaptureDevice, MediaStream, MediaTrack, TrackKind};
use crate::error::DeviceError;

/// Outcome of a permission prompt
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Availability {
    #[default]
    Granted,
    Denied,
    Missing,
}

#[derive(Debug, Clone, Default)]
pub struct SyntheticPolicy {
    pub camera: Availability,
    pub screen: Availability,
    /// Simulated time the user spends on the permission prompt
    pub prompt_delay: Duration,
}

/// A software track. Counts stop calls so release can be audited.
pub struct SyntheticTrack {
    kind: TrackKind,
    label: String,
    enabled: AtomicBool,
    live: AtomicBool,
    stop_calls: AtomicUsize,
}

impl SyntheticTrack {
    fn new(kind: TrackKind, label: impl Into<String>) -> Self {
        Self {
            kind,
            label: label.into(),
            enabled: AtomicBool::new(true),
            live: AtomicBool::new(true),
            stop_calls: AtomicUsize::new(0),
        }
    }

    /// Number of times `stop` was invoked on this track
    pub fn stop_calls(&self) -> usize {
        self.stop_calls.load(Ordering::SeqCst)
    }
}

impl MediaTrack for SyntheticTrack {
    fn kind(&self) -> TrackKind {
        self.kind
    }

    fn label(&self) -> &str {
        &self.label
    }

    fn set_enabled(&self, enabled: bool) {
        if self.is_live() {
            self.enabled.store(enabled, Ordering::SeqCst);
        }
    }

    fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }

    fn stop(&self) {
        self.stop_calls.fetch_add(1, Ordering::SeqCst);
        self.live.store(false, Ordering::SeqCst);
        self.enabled.store(false, Ordering::SeqCst);
    }

    fn is_live(&self) -> bool {
        self.live.load(Ordering::SeqCst)
    }
}

/// Software capture device
#[derive(Clone, Default)]
pub struct SyntheticDevice {
    policy: SyntheticPolicy,
    opened: Arc<Mutex<Vec<Arc<SyntheticTrack>>>>,
}

impl SyntheticDevice {
    pub fn new(policy: SyntheticPolicy) -> Self {
        Self {
            policy,
            opened: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Every track this device has handed out, in creation order
    pub fn tracks(&self) -> Vec<Arc<SyntheticTrack>> {
        self.opened
            .lock()
            .map(|tracks| tracks.clone())
            .unwrap_or_default()
    }

    /// Tracks that have not been stopped yet
    pub fn live_tracks(&self) -> usize {
        self.tracks().iter().filter(|t| t.is_live()).count()
    }

    async fn prompt(&self, availability: Availability, kind: TrackKind) -> Result<(), DeviceError> {
        if !self.policy.prompt_delay.is_zero() {
            tokio::time::sleep(self.policy.prompt_delay).await;
        }

        match availability {
            Availability::Granted => Ok(()),
            Availability::Denied => Err(DeviceError::PermissionDenied(kind)),
            Availability::Missing => Err(DeviceError::NotFound(kind)),
        }
    }

    fn open(&self, layout: &[(TrackKind, &str)]) -> MediaStream {
        let tracks: Vec<Arc<SyntheticTrack>> = layout
            .iter()
            .map(|(kind, label)| Arc::new(SyntheticTrack::new(*kind, *label)))
            .collect();

        if let Ok(mut opened) = self.opened.lock() {
            opened.extend(tracks.iter().cloned());
        }

        MediaStream::new(
            tracks
                .into_iter()
                .map(|t| t as Arc<dyn MediaTrack>)
                .collect(),
        )
    }
}

#[async_trait::async_trait]
impl CaptureDevice for SyntheticDevice {
    async fn open_camera_mic(&self) -> Result<MediaStream, DeviceError> {
        self.prompt(self.policy.camera, TrackKind::Video).await?;

        let stream = self.open(&[
            (TrackKind::Audio, "synthetic microphone"),
            (TrackKind::Video, "synthetic camera"),
        ]);
        info!("Synthetic camera/mic stream opened: {}", stream.id());

        Ok(stream)
    }

    async fn open_screen(&self) -> Result<MediaStream, DeviceError> {
        self.prompt(self.policy.screen, TrackKind::Screen).await?;

        let stream = self.open(&[(TrackKind::Screen, "synthetic display")]);
        info!("Synthetic screen stream opened: {}", stream.id());

        Ok(stream)
    }

    fn name(&self) -> &str {
        "synthetic"
    }
}
