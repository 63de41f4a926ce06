//! Device types and data structures.

use std::fmt;

/// Camera resolution hint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

impl Resolution {
    /// Low resolution (320x240)
    pub const LOW: Resolution = Resolution {
        width: 320,
        height: 240,
    };

    /// Medium resolution (640x480)
    pub const MEDIUM: Resolution = Resolution {
        width: 640,
        height: 480,
    };

    /// High resolution (1280x720) - preferred for recognition captures
    pub const HIGH: Resolution = Resolution {
        width: 1280,
        height: 720,
    };
}

impl Default for Resolution {
    fn default() -> Self {
        Self::HIGH
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Advisory constraints passed to the video platform when requesting a feed.
///
/// The platform treats the resolution as a hint, not a guarantee; frames are
/// read back at whatever native dimensions the device actually delivers.
#[derive(Debug, Clone, Copy)]
pub struct StreamConstraints {
    pub ideal: Resolution,
}

impl Default for StreamConstraints {
    fn default() -> Self {
        Self {
            ideal: Resolution::HIGH,
        }
    }
}

/// Pixel format of a captured frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameFormat {
    /// RGB format (3 bytes per pixel)
    Rgb,
}

/// A raw frame read from the live feed.
#[derive(Debug, Clone)]
pub struct Frame {
    /// Raw pixel data
    pub data: Vec<u8>,
    /// Frame width in pixels
    pub width: u32,
    /// Frame height in pixels
    pub height: u32,
    /// Pixel format
    pub format: FrameFormat,
}

impl Frame {
    /// Get the number of bytes per pixel (3 for RGB).
    pub fn bytes_per_pixel(&self) -> usize {
        match self.format {
            FrameFormat::Rgb => 3,
        }
    }
}

/// An encoded still image ready for submission.
///
/// Produced by [`DeviceSession::capture_snapshot`](super::DeviceSession::capture_snapshot)
/// and consumed once by the capture workflow.
#[derive(Debug, Clone)]
pub struct Snapshot {
    /// Encoded image bytes (JPEG)
    pub data: Vec<u8>,
    /// Source frame width in pixels
    pub width: u32,
    /// Source frame height in pixels
    pub height: u32,
    /// MIME type of the encoded bytes
    pub mime: &'static str,
}

/// Errors that can occur when acquiring the capture device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceError {
    /// The platform denied access to the camera
    AccessDenied(String),
    /// No usable camera, or the device is held by another session
    Unavailable(String),
}

impl fmt::Display for DeviceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceError::AccessDenied(msg) => {
                write!(
                    f,
                    "Camera access denied: {}. Grant camera permission to this application and try again.",
                    msg
                )
            }
            DeviceError::Unavailable(msg) => {
                write!(
                    f,
                    "Camera unavailable: {}. Check that a camera is connected and not in use by another program.",
                    msg
                )
            }
        }
    }
}

impl std::error::Error for DeviceError {}

/// Errors that can occur when producing a snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureError {
    /// The session has no live feed
    DeviceNotActive,
    /// The feed failed to deliver a frame
    FrameReadFailed(String),
    /// The frame could not be encoded
    EncodeFailed(String),
}

impl fmt::Display for CaptureError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CaptureError::DeviceNotActive => {
                write!(f, "Camera is not active. Start the camera before capturing.")
            }
            CaptureError::FrameReadFailed(msg) => write!(f, "Failed to read frame: {}", msg),
            CaptureError::EncodeFailed(msg) => write!(f, "Failed to encode snapshot: {}", msg),
        }
    }
}

impl std::error::Error for CaptureError {}
