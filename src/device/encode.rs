//! Snapshot encoding.

use image::codecs::jpeg::JpegEncoder;
use image::{ExtendedColorType, ImageEncoder};

use super::types::{CaptureError, Frame, FrameFormat};

/// Default JPEG quality for snapshots (equivalent to a 0.8 quality factor).
pub const DEFAULT_JPEG_QUALITY: u8 = 80;

/// Encode a raw frame as JPEG at the given quality.
pub fn encode_jpeg(frame: &Frame, quality: u8) -> Result<Vec<u8>, CaptureError> {
    let expected = frame.width as usize * frame.height as usize * frame.bytes_per_pixel();
    if frame.data.len() != expected {
        return Err(CaptureError::FrameReadFailed(format!(
            "frame buffer is {} bytes, expected {} for {}x{}",
            frame.data.len(),
            expected,
            frame.width,
            frame.height
        )));
    }

    let color = match frame.format {
        FrameFormat::Rgb => ExtendedColorType::Rgb8,
    };

    let mut out = Vec::new();
    let encoder = JpegEncoder::new_with_quality(&mut out, quality);
    encoder
        .write_image(&frame.data, frame.width, frame.height, color)
        .map_err(|e| CaptureError::EncodeFailed(e.to_string()))?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_frame(width: u32, height: u32) -> Frame {
        Frame {
            data: vec![128; (width * height * 3) as usize],
            width,
            height,
            format: FrameFormat::Rgb,
        }
    }

    #[test]
    fn test_encode_jpeg_produces_jpeg_magic() {
        let bytes = encode_jpeg(&test_frame(4, 4), DEFAULT_JPEG_QUALITY).unwrap();
        // JPEG start-of-image marker
        assert_eq!(&bytes[..2], &[0xFF, 0xD8]);
    }

    #[test]
    fn test_encode_jpeg_rejects_short_buffer() {
        let mut frame = test_frame(4, 4);
        frame.data.truncate(5);
        let result = encode_jpeg(&frame, DEFAULT_JPEG_QUALITY);
        assert!(matches!(result, Err(CaptureError::FrameReadFailed(_))));
    }

    #[test]
    fn test_encode_jpeg_nontrivial_frame() {
        // Gradient frame so the encoder has real content to compress
        let width = 16u32;
        let height = 8u32;
        let mut data = Vec::with_capacity((width * height * 3) as usize);
        for y in 0..height {
            for x in 0..width {
                data.push((x * 16) as u8);
                data.push((y * 32) as u8);
                data.push(0);
            }
        }
        let frame = Frame {
            data,
            width,
            height,
            format: FrameFormat::Rgb,
        };
        let bytes = encode_jpeg(&frame, 90).unwrap();
        assert!(!bytes.is_empty());
        assert_eq!(&bytes[..2], &[0xFF, 0xD8]);
    }
}
