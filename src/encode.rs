//! PNG and animated GIF serialization

use crate::error::{PetpetError, Result};
use image::codecs::gif::{GifEncoder, Repeat};
use image::codecs::png::PngEncoder;
use image::{ColorType, Delay, Frame, ImageEncoder, RgbaImage};
use std::path::Path;

/// Encode a single frame as PNG.
pub fn encode_static(frame: &RgbaImage) -> Result<Vec<u8>> {
    let (width, height) = frame.dimensions();
    let mut bytes = Vec::new();
    PngEncoder::new(&mut bytes)
        .write_image(frame.as_raw(), width, height, ColorType::Rgba8)
        .map_err(|e| PetpetError::EncodeFailed(e.to_string()))?;
    Ok(bytes)
}

/// Encode frames as an infinitely looping GIF with a uniform delay.
///
/// GIF stores delays in centiseconds, so `delay_ms` is rounded down to a
/// multiple of 10 with a floor of 10ms. Frame order is preserved.
pub fn encode_animated(frames: &[RgbaImage], delay_ms: u32) -> Result<Vec<u8>> {
    if frames.is_empty() {
        return Err(PetpetError::EncodeFailed("no frames to encode".to_string()));
    }

    let delay_cs = (delay_ms / 10).max(1);
    let delay = Delay::from_numer_denom_ms(delay_cs * 10, 1);

    let mut bytes = Vec::new();
    {
        // The trailer is written when the encoder drops
        let mut encoder = GifEncoder::new(&mut bytes);
        encoder.set_repeat(Repeat::Infinite).map_err(|e| PetpetError::EncodeFailed(e.to_string()))?;
        for image in frames {
            let frame = Frame::from_parts(image.clone(), 0, 0, delay);
            encoder.encode_frame(frame).map_err(|e| PetpetError::EncodeFailed(e.to_string()))?;
        }
    }
    Ok(bytes)
}

/// Write encoded bytes to `path`, creating parent directories as needed.
pub fn save_output(bytes: &[u8], path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent)?;
        }
    }
    std::fs::write(path, bytes)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::codecs::gif::GifDecoder;
    use image::{AnimationDecoder, Rgba};
    use std::io::Cursor;
    use tempfile::tempdir;

    /// Create a simple test frame with a solid color
    fn create_test_frame(width: u32, height: u32, color: Rgba<u8>) -> RgbaImage {
        RgbaImage::from_pixel(width, height, color)
    }

    fn decode_gif(bytes: &[u8]) -> Vec<image::Frame> {
        GifDecoder::new(Cursor::new(bytes)).unwrap().into_frames().collect_frames().unwrap()
    }

    #[test]
    fn test_encode_static_round_trips_dimensions() {
        let frame = create_test_frame(37, 21, Rgba([10, 20, 30, 255]));
        let bytes = encode_static(&frame).unwrap();
        let decoded = image::load_from_memory(&bytes).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (37, 21));
        assert_eq!(decoded.to_rgba8().get_pixel(5, 5), &Rgba([10, 20, 30, 255]));
    }

    #[test]
    fn test_encode_animated_frame_count_and_delay() {
        let frames = vec![
            create_test_frame(4, 4, Rgba([255, 0, 0, 255])),
            create_test_frame(4, 4, Rgba([0, 255, 0, 255])),
            create_test_frame(4, 4, Rgba([0, 0, 255, 255])),
        ];
        let bytes = encode_animated(&frames, 60).unwrap();
        let decoded = decode_gif(&bytes);

        assert_eq!(decoded.len(), 3);
        for frame in &decoded {
            assert_eq!(frame.delay().numer_denom_ms(), (60, 1));
            assert_eq!(frame.buffer().dimensions(), (4, 4));
        }
    }

    #[test]
    fn test_encode_animated_preserves_order() {
        let frames = vec![
            create_test_frame(2, 2, Rgba([255, 0, 0, 255])),
            create_test_frame(2, 2, Rgba([0, 0, 255, 255])),
        ];
        let decoded = decode_gif(&encode_animated(&frames, 100).unwrap());
        let first = decoded[0].buffer().get_pixel(0, 0);
        let second = decoded[1].buffer().get_pixel(0, 0);
        assert!(first[0] > 200 && first[2] < 50);
        assert!(second[2] > 200 && second[0] < 50);
    }

    #[test]
    fn test_encode_animated_minimum_delay() {
        let frames = vec![create_test_frame(2, 2, Rgba([1, 2, 3, 255]))];
        let decoded = decode_gif(&encode_animated(&frames, 5).unwrap());
        assert_eq!(decoded[0].delay().numer_denom_ms(), (10, 1));
    }

    #[test]
    fn test_encode_animated_loops_forever() {
        let frames = vec![create_test_frame(2, 2, Rgba([1, 2, 3, 255]))];
        let bytes = encode_animated(&frames, 60).unwrap();
        // NETSCAPE2.0 application extension with loop count 0
        let marker = b"NETSCAPE2.0";
        let pos = bytes.windows(marker.len()).position(|w| w == marker).unwrap();
        assert_eq!(&bytes[pos + marker.len()..pos + marker.len() + 4], &[3, 1, 0, 0]);
    }

    #[test]
    fn test_encode_animated_empty_fails() {
        let err = encode_animated(&[], 60).unwrap_err();
        assert!(matches!(err, PetpetError::EncodeFailed(_)));
    }

    #[test]
    fn test_save_output_creates_parent_dirs() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested/dirs/out.png");
        save_output(b"png-bytes", &path).unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"png-bytes");
    }
}
