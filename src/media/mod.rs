pub mod controller;
pub mod device;
pub mod synthetic;

pub use controller::{MediaController, MediaState};
pub use device::{
    CaptureDevice, CaptureDeviceFactory, DeviceBackendKind, HeadlessDevice, MediaStream,
    MediaTrack, TrackKind,
};
pub use synthetic::{Availability, SyntheticDevice, SyntheticPolicy, SyntheticTrack};
