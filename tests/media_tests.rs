use std::sync::Arc;

use anyhow::Result;
use interview_session::error::DeviceError;
use interview_session::media::{
    Availability, CaptureDevice, CaptureDeviceFactory, DeviceBackendKind, MediaController,
    MediaState, MediaTrack, SyntheticDevice, SyntheticPolicy, TrackKind,
};

#[test]
fn test_media_state_defaults() {
    let state = MediaState::default();
    assert!(state.video_enabled);
    assert!(state.audio_enabled);
    assert!(!state.screen_sharing);
}

#[tokio::test]
async fn test_acquire_is_idempotent() -> Result<()> {
    let device = SyntheticDevice::default();
    let mut media = MediaController::new(Arc::new(device.clone()));

    let first = media.acquire_camera_mic().await?;
    let second = media.acquire_camera_mic().await?;

    assert_eq!(first, second, "A held stream is reused");
    assert_eq!(media.held_streams(), 1);
    assert_eq!(device.tracks().len(), 2);

    Ok(())
}

#[tokio::test]
async fn test_release_stops_every_track_once() -> Result<()> {
    let device = SyntheticDevice::default();
    let mut media = MediaController::new(Arc::new(device.clone()));

    media.acquire_camera_mic().await?;
    media.start_screen_share().await?;
    assert_eq!(device.live_tracks(), 3);

    assert_eq!(media.release(), 2);
    assert_eq!(media.release(), 0, "Second release is a no-op");
    drop(media);

    assert_eq!(device.live_tracks(), 0);
    for track in device.tracks() {
        assert_eq!(track.stop_calls(), 1);
        assert!(!track.is_enabled());
    }

    Ok(())
}

#[tokio::test]
async fn test_drop_releases_streams() -> Result<()> {
    let device = SyntheticDevice::default();
    let mut media = MediaController::new(Arc::new(device.clone()));
    media.acquire_camera_mic().await?;

    drop(media);

    assert_eq!(device.live_tracks(), 0);

    Ok(())
}

#[tokio::test]
async fn test_missing_camera() -> Result<()> {
    let device = SyntheticDevice::new(SyntheticPolicy {
        camera: Availability::Missing,
        ..SyntheticPolicy::default()
    });
    let mut media = MediaController::new(Arc::new(device));

    let err = media.acquire_camera_mic().await.unwrap_err();

    assert_eq!(err, DeviceError::NotFound(TrackKind::Video));
    assert!(!media.has_camera());

    Ok(())
}

#[tokio::test]
async fn test_toggle_without_stream_only_changes_state() -> Result<()> {
    let device = SyntheticDevice::default();
    let mut media = MediaController::new(Arc::new(device.clone()));

    assert!(!media.toggle_audio());
    assert!(!media.state().audio_enabled);
    assert!(device.tracks().is_empty());

    media.acquire_camera_mic().await?;
    let microphone = device
        .tracks()
        .into_iter()
        .find(|t| t.kind() == TrackKind::Audio)
        .unwrap();
    assert!(!microphone.is_enabled(), "Muted before acquisition stays muted");

    Ok(())
}

#[tokio::test]
async fn test_headless_device_has_nothing() -> Result<()> {
    let device = CaptureDeviceFactory::create(DeviceBackendKind::Headless);
    assert_eq!(device.name(), "headless");

    assert_eq!(
        device.open_camera_mic().await.unwrap_err(),
        DeviceError::NotFound(TrackKind::Video)
    );
    assert_eq!(
        device.open_screen().await.unwrap_err(),
        DeviceError::NotFound(TrackKind::Screen)
    );

    Ok(())
}

#[tokio::test]
async fn test_stopped_track_cannot_be_enabled() -> Result<()> {
    let device = SyntheticDevice::default();
    let stream = device.open_screen().await?;

    stream.stop();
    stream.set_enabled(TrackKind::Screen, true);

    assert!(!stream.is_live());
    assert!(stream.tracks_of(TrackKind::Screen).all(|t| !t.is_enabled()));

    Ok(())
}
