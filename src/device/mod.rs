//! Capture device module.
//!
//! This module owns the camera resource lifecycle:
//! - Platform boundary via [`VideoPlatform`] and [`VideoFeed`]
//! - Device lifecycle and snapshots via [`DeviceSession`]
//! - Snapshot encoding via [`encode_jpeg`]

mod encode;
mod session;
mod types;

#[cfg(feature = "native-camera")]
mod native;

pub use encode::{encode_jpeg, DEFAULT_JPEG_QUALITY};
pub use session::{DeviceSession, VideoFeed, VideoPlatform};
pub use types::{
    CaptureError, DeviceError, Frame, FrameFormat, Resolution, Snapshot, StreamConstraints,
};

#[cfg(feature = "native-camera")]
pub use native::{list_devices, CameraInfo, NativeCameraPlatform};
