//! Device session: acquisition, activation and release of a capture device.

use super::encode::{encode_jpeg, DEFAULT_JPEG_QUALITY};
use super::types::{CaptureError, DeviceError, Frame, Snapshot, StreamConstraints};

/// A live video feed handle returned by the platform.
///
/// Stopping the feed releases the underlying device tracks (the hardware
/// indicator light / OS-level device lock goes away).
pub trait VideoFeed {
    /// Read one frame at the feed's current native dimensions.
    fn read_frame(&mut self) -> Result<Frame, CaptureError>;

    /// Release the underlying device resources.
    fn stop(&mut self);
}

/// The video capture platform boundary.
///
/// Implementations wrap whatever the host exposes (a hardware backend, a test
/// double). The constraints are advisory; the platform may deliver a feed at
/// a different resolution.
pub trait VideoPlatform {
    fn request(&self, constraints: &StreamConstraints) -> Result<Box<dyn VideoFeed>, DeviceError>;
}

/// Owns one capture device's lifecycle and produces snapshots from it.
///
/// The session is active exactly when it holds a feed. `deactivate()` is
/// idempotent, and `Drop` deactivates so the device lock cannot leak past the
/// session's lifetime.
pub struct DeviceSession {
    platform: Box<dyn VideoPlatform>,
    constraints: StreamConstraints,
    feed: Option<Box<dyn VideoFeed>>,
    jpeg_quality: u8,
}

impl std::fmt::Debug for DeviceSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeviceSession")
            .field("active", &self.is_active())
            .field("constraints", &self.constraints)
            .field("jpeg_quality", &self.jpeg_quality)
            .finish_non_exhaustive()
    }
}

impl DeviceSession {
    /// Create an inactive session on the given platform.
    pub fn new(platform: Box<dyn VideoPlatform>) -> Self {
        Self {
            platform,
            constraints: StreamConstraints::default(),
            feed: None,
            jpeg_quality: DEFAULT_JPEG_QUALITY,
        }
    }

    /// Set the advisory resolution hint used on activation.
    pub fn with_constraints(mut self, constraints: StreamConstraints) -> Self {
        self.constraints = constraints;
        self
    }

    /// Set the JPEG quality used when encoding snapshots.
    pub fn with_jpeg_quality(mut self, quality: u8) -> Self {
        self.jpeg_quality = quality;
        self
    }

    /// Whether the session currently holds a live feed.
    pub fn is_active(&self) -> bool {
        self.feed.is_some()
    }

    /// Request access to the capture device and bind its live feed.
    ///
    /// A no-op when already active. On failure the session is unchanged and
    /// holds no resource.
    ///
    /// # Errors
    /// * `DeviceError::AccessDenied` - the platform denied camera access
    /// * `DeviceError::Unavailable` - no usable device, or it is already held
    pub fn activate(&mut self) -> Result<(), DeviceError> {
        if self.is_active() {
            return Ok(());
        }
        let feed = self.platform.request(&self.constraints)?;
        self.feed = Some(feed);
        log::debug!("device session activated ({})", self.constraints.ideal);
        Ok(())
    }

    /// Release the device feed and all underlying resources.
    ///
    /// Idempotent: calling this when already inactive is a no-op.
    pub fn deactivate(&mut self) {
        if let Some(mut feed) = self.feed.take() {
            feed.stop();
            log::debug!("device session deactivated");
        }
    }

    /// Capture one still frame from the live feed and encode it as JPEG.
    ///
    /// The session's state is unchanged by a capture, successful or not.
    ///
    /// # Errors
    /// * `CaptureError::DeviceNotActive` - the session holds no feed
    /// * `CaptureError::FrameReadFailed` - the feed failed to deliver a frame
    /// * `CaptureError::EncodeFailed` - the frame could not be encoded
    pub fn capture_snapshot(&mut self) -> Result<Snapshot, CaptureError> {
        let feed = self.feed.as_mut().ok_or(CaptureError::DeviceNotActive)?;
        let frame = feed.read_frame()?;
        let data = encode_jpeg(&frame, self.jpeg_quality)?;
        Ok(Snapshot {
            data,
            width: frame.width,
            height: frame.height,
            mime: "image/jpeg",
        })
    }
}

impl Drop for DeviceSession {
    fn drop(&mut self) {
        self.deactivate();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use super::super::types::FrameFormat;
    use super::*;

    struct StubFeed {
        stops: Arc<AtomicUsize>,
    }

    impl VideoFeed for StubFeed {
        fn read_frame(&mut self) -> Result<Frame, CaptureError> {
            Ok(Frame {
                data: vec![200; 2 * 2 * 3],
                width: 2,
                height: 2,
                format: FrameFormat::Rgb,
            })
        }

        fn stop(&mut self) {
            self.stops.fetch_add(1, Ordering::SeqCst);
        }
    }

    struct StubPlatform {
        stops: Arc<AtomicUsize>,
    }

    impl StubPlatform {
        fn new() -> (Self, Arc<AtomicUsize>) {
            let stops = Arc::new(AtomicUsize::new(0));
            (
                Self {
                    stops: Arc::clone(&stops),
                },
                stops,
            )
        }
    }

    impl VideoPlatform for StubPlatform {
        fn request(
            &self,
            _constraints: &StreamConstraints,
        ) -> Result<Box<dyn VideoFeed>, DeviceError> {
            Ok(Box::new(StubFeed {
                stops: Arc::clone(&self.stops),
            }))
        }
    }

    struct DeniedPlatform;

    impl VideoPlatform for DeniedPlatform {
        fn request(
            &self,
            _constraints: &StreamConstraints,
        ) -> Result<Box<dyn VideoFeed>, DeviceError> {
            Err(DeviceError::AccessDenied("user dismissed prompt".to_string()))
        }
    }

    #[test]
    fn test_session_starts_inactive() {
        let (platform, _) = StubPlatform::new();
        let session = DeviceSession::new(Box::new(platform));
        assert!(!session.is_active());
    }

    #[test]
    fn test_activate_binds_feed() {
        let (platform, _) = StubPlatform::new();
        let mut session = DeviceSession::new(Box::new(platform));
        session.activate().unwrap();
        assert!(session.is_active());
    }

    #[test]
    fn test_activate_failure_leaves_session_inactive() {
        let mut session = DeviceSession::new(Box::new(DeniedPlatform));
        let result = session.activate();
        assert!(matches!(result, Err(DeviceError::AccessDenied(_))));
        assert!(!session.is_active());
    }

    #[test]
    fn test_deactivate_is_idempotent() {
        let (platform, stops) = StubPlatform::new();
        let mut session = DeviceSession::new(Box::new(platform));
        session.activate().unwrap();

        session.deactivate();
        assert!(!session.is_active());
        session.deactivate();
        assert!(!session.is_active());
        // The feed was only stopped once
        assert_eq!(stops.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_deactivate_when_never_activated_is_noop() {
        let (platform, stops) = StubPlatform::new();
        let mut session = DeviceSession::new(Box::new(platform));
        session.deactivate();
        assert_eq!(stops.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_drop_releases_feed() {
        let (platform, stops) = StubPlatform::new();
        {
            let mut session = DeviceSession::new(Box::new(platform));
            session.activate().unwrap();
        }
        assert_eq!(stops.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_capture_snapshot_requires_active_session() {
        let (platform, _) = StubPlatform::new();
        let mut session = DeviceSession::new(Box::new(platform));
        let result = session.capture_snapshot();
        assert!(matches!(result, Err(CaptureError::DeviceNotActive)));
    }

    #[test]
    fn test_capture_snapshot_after_deactivate_fails() {
        let (platform, _) = StubPlatform::new();
        let mut session = DeviceSession::new(Box::new(platform));
        session.activate().unwrap();
        session.deactivate();
        let result = session.capture_snapshot();
        assert!(matches!(result, Err(CaptureError::DeviceNotActive)));
    }

    #[test]
    fn test_capture_snapshot_encodes_jpeg() {
        let (platform, _) = StubPlatform::new();
        let mut session = DeviceSession::new(Box::new(platform));
        session.activate().unwrap();

        let snapshot = session.capture_snapshot().unwrap();
        assert_eq!(snapshot.mime, "image/jpeg");
        assert_eq!(snapshot.width, 2);
        assert_eq!(snapshot.height, 2);
        assert_eq!(&snapshot.data[..2], &[0xFF, 0xD8]);
        // Capturing does not change the session's state
        assert!(session.is_active());
    }

    #[test]
    fn test_capture_failure_does_not_deactivate() {
        struct DeadFeed;
        impl VideoFeed for DeadFeed {
            fn read_frame(&mut self) -> Result<Frame, CaptureError> {
                Err(CaptureError::FrameReadFailed("feed stalled".to_string()))
            }
            fn stop(&mut self) {}
        }
        struct DeadPlatform;
        impl VideoPlatform for DeadPlatform {
            fn request(
                &self,
                _constraints: &StreamConstraints,
            ) -> Result<Box<dyn VideoFeed>, DeviceError> {
                Ok(Box::new(DeadFeed))
            }
        }

        let mut session = DeviceSession::new(Box::new(DeadPlatform));
        session.activate().unwrap();
        let result = session.capture_snapshot();
        assert!(matches!(result, Err(CaptureError::FrameReadFailed(_))));
        assert!(session.is_active());
    }
}
