//! Hardware camera backend built on nokhwa.
//!
//! Only compiled with the `native-camera` feature; the rest of the crate
//! depends solely on the [`VideoPlatform`] boundary.

use std::fmt;

use nokhwa::pixel_format::RgbFormat;
use nokhwa::utils::{
    ApiBackend, CameraFormat, CameraIndex, FrameFormat as NokhwaFrameFormat, RequestedFormat,
    RequestedFormatType, Resolution as NokhwaResolution,
};
use nokhwa::{query, Camera};

use super::session::{VideoFeed, VideoPlatform};
use super::types::{CaptureError, DeviceError, Frame, FrameFormat, StreamConstraints};

/// Information about an available camera device.
#[derive(Debug, Clone)]
pub struct CameraInfo {
    /// Device index for selection
    pub index: u32,
    /// Human-readable device name
    pub name: String,
    /// Device description
    pub description: String,
}

impl fmt::Display for CameraInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {} ({})", self.index, self.name, self.description)
    }
}

/// List all available camera devices on the system.
///
/// If no cameras are found, returns an empty vector (not an error).
pub fn list_devices() -> Result<Vec<CameraInfo>, DeviceError> {
    let devices =
        query(ApiBackend::Auto).map_err(|e| DeviceError::Unavailable(e.to_string()))?;

    Ok(devices
        .into_iter()
        .map(|d| CameraInfo {
            index: d.index().as_index().unwrap_or(0),
            name: d.human_name(),
            description: d.description().to_string(),
        })
        .collect())
}

/// Video platform backed by a physical camera.
pub struct NativeCameraPlatform {
    device_index: u32,
}

impl NativeCameraPlatform {
    pub fn new(device_index: u32) -> Self {
        Self { device_index }
    }
}

impl VideoPlatform for NativeCameraPlatform {
    fn request(&self, constraints: &StreamConstraints) -> Result<Box<dyn VideoFeed>, DeviceError> {
        let format = RequestedFormat::new::<RgbFormat>(RequestedFormatType::Closest(
            CameraFormat::new(
                NokhwaResolution::new(constraints.ideal.width, constraints.ideal.height),
                NokhwaFrameFormat::MJPEG,
                30,
            ),
        ));

        let mut camera = Camera::new(CameraIndex::Index(self.device_index), format)
            .map_err(|e| classify_open_error(&e.to_string()))?;
        camera
            .open_stream()
            .map_err(|e| classify_open_error(&e.to_string()))?;

        Ok(Box::new(NativeCameraFeed { camera }))
    }
}

struct NativeCameraFeed {
    camera: Camera,
}

impl VideoFeed for NativeCameraFeed {
    fn read_frame(&mut self) -> Result<Frame, CaptureError> {
        let buffer = self
            .camera
            .frame()
            .map_err(|e| CaptureError::FrameReadFailed(e.to_string()))?;
        let decoded = buffer
            .decode_image::<RgbFormat>()
            .map_err(|e| CaptureError::FrameReadFailed(e.to_string()))?;
        Ok(Frame {
            width: decoded.width(),
            height: decoded.height(),
            data: decoded.into_raw(),
            format: FrameFormat::Rgb,
        })
    }

    fn stop(&mut self) {
        if let Err(e) = self.camera.stop_stream() {
            log::warn!("failed to stop camera stream: {}", e);
        }
    }
}

/// Map a backend open error onto the device error taxonomy.
///
/// Backends report permission problems with varying messages, so this keys on
/// the text rather than backend-specific error variants.
fn classify_open_error(msg: &str) -> DeviceError {
    let lower = msg.to_lowercase();
    if lower.contains("permission") || lower.contains("denied") || lower.contains("not authorized")
    {
        DeviceError::AccessDenied(msg.to_string())
    } else {
        DeviceError::Unavailable(msg.to_string())
    }
}
