//! Compositing of avatars and text onto template frames

use crate::models::Rect;
use crate::text::TextOverlay;
use image::{Rgba, RgbaImage};

/// A transformed avatar and where it goes on the frame.
#[derive(Debug, Clone, Copy)]
pub struct AvatarPlacement<'a> {
    pub image: &'a RgbaImage,
    pub rect: Rect,
    /// Composite with Porter-Duff "over" instead of a masked paste
    pub on_top: bool,
}

/// Compose one output frame.
///
/// The template frame is never modified; a copy is returned. Placement
/// origins may be negative or extend past the frame and are clipped.
///
/// - `on_top`: the avatar is laid on a transparent frame-sized layer and that
///   layer is alpha-composited over the frame.
/// - otherwise the avatar is pasted into the frame using its own alpha as the
///   paste mask; every channel, alpha included, is interpolated by the mask.
///
/// The text overlay, if any, is drawn last.
pub fn compose_frame(
    frame: &RgbaImage,
    avatar: Option<AvatarPlacement<'_>>,
    text: Option<&TextOverlay>,
) -> RgbaImage {
    let mut out = frame.clone();

    if let Some(placement) = avatar {
        let apply: fn(&mut Rgba<u8>, Rgba<u8>) =
            if placement.on_top { blend_over } else { paste_masked };
        for_each_overlap(&mut out, placement.image, placement.rect.x, placement.rect.y, apply);
    }

    if let Some(overlay) = text {
        overlay.draw(&mut out);
    }

    out
}

/// Visit every avatar pixel that lands inside the canvas.
fn for_each_overlap(
    canvas: &mut RgbaImage,
    layer: &RgbaImage,
    offset_x: i32,
    offset_y: i32,
    mut apply: impl FnMut(&mut Rgba<u8>, Rgba<u8>),
) {
    let (canvas_w, canvas_h) = (canvas.width() as i64, canvas.height() as i64);

    for (lx, ly, src) in layer.enumerate_pixels() {
        let x = offset_x as i64 + lx as i64;
        let y = offset_y as i64 + ly as i64;
        if x < 0 || y < 0 || x >= canvas_w || y >= canvas_h {
            continue;
        }
        apply(canvas.get_pixel_mut(x as u32, y as u32), *src);
    }
}

/// Porter-Duff "source over destination" on straight (non-premultiplied) RGBA.
pub(crate) fn blend_over(dst: &mut Rgba<u8>, src: Rgba<u8>) {
    match src[3] {
        0 => return,
        255 => {
            *dst = src;
            return;
        }
        _ => {}
    }

    let sa = src[3] as f32 / 255.0;
    let da = dst[3] as f32 / 255.0;
    let out_a = sa + da * (1.0 - sa);

    for c in 0..3 {
        let sc = src[c] as f32 / 255.0;
        let dc = dst[c] as f32 / 255.0;
        let value = (sc * sa + dc * da * (1.0 - sa)) / out_a;
        dst[c] = (value * 255.0).round().clamp(0.0, 255.0) as u8;
    }
    dst[3] = (out_a * 255.0).round().clamp(0.0, 255.0) as u8;
}

/// Masked paste: `dst = src * m + dst * (1 - m)` with `m` = source alpha.
fn paste_masked(dst: &mut Rgba<u8>, src: Rgba<u8>) {
    let mask = src[3] as u32;
    if mask == 0 {
        return;
    }
    for c in 0..4 {
        let value = src[c] as u32 * mask + dst[c] as u32 * (255 - mask);
        dst[c] = ((value + 127) / 255) as u8;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::text::Typeface;

    const RED: Rgba<u8> = Rgba([255, 0, 0, 255]);
    const BLUE: Rgba<u8> = Rgba([0, 0, 255, 255]);

    fn placement(image: &RgbaImage, x: i32, y: i32, on_top: bool) -> AvatarPlacement<'_> {
        AvatarPlacement { image, rect: Rect::new(x, y, image.width(), image.height()), on_top }
    }

    #[test]
    fn test_template_frame_is_not_mutated() {
        let frame = RgbaImage::from_pixel(8, 8, BLUE);
        let avatar = RgbaImage::from_pixel(4, 4, RED);
        let out = compose_frame(&frame, Some(placement(&avatar, 2, 2, false)), None);

        assert_eq!(*frame.get_pixel(3, 3), BLUE);
        assert_eq!(*out.get_pixel(3, 3), RED);
        assert_eq!(*out.get_pixel(0, 0), BLUE);
        assert_eq!(out.dimensions(), frame.dimensions());
    }

    #[test]
    fn test_on_top_over_transparent_frame_hole() {
        // Frame with a transparent hole: avatar shows through with full alpha
        let mut frame = RgbaImage::from_pixel(6, 6, BLUE);
        frame.put_pixel(1, 1, Rgba([0, 0, 0, 0]));
        let avatar = RgbaImage::from_pixel(3, 3, RED);

        let out = compose_frame(&frame, Some(placement(&avatar, 0, 0, true)), None);
        assert_eq!(*out.get_pixel(1, 1), RED);
        assert_eq!(*out.get_pixel(2, 2), RED);
        assert_eq!(*out.get_pixel(4, 4), BLUE);
    }

    #[test]
    fn test_on_top_respects_avatar_alpha() {
        let frame = RgbaImage::from_pixel(2, 2, BLUE);
        let avatar = RgbaImage::from_pixel(2, 2, Rgba([255, 0, 0, 0]));
        let out = compose_frame(&frame, Some(placement(&avatar, 0, 0, true)), None);
        assert_eq!(*out.get_pixel(0, 0), BLUE);
    }

    #[test]
    fn test_over_half_alpha_on_opaque() {
        let mut dst = Rgba([0, 0, 0, 255]);
        blend_over(&mut dst, Rgba([255, 255, 255, 128]));
        assert_eq!(dst[3], 255);
        assert!((dst[0] as i32 - 128).abs() <= 1);
    }

    #[test]
    fn test_masked_paste_interpolates_alpha() {
        let mut dst = Rgba([0, 0, 0, 0]);
        paste_masked(&mut dst, Rgba([255, 255, 255, 128]));
        // Alpha is interpolated too, unlike "over"
        assert_eq!(dst[3], 64);
        assert_eq!(dst[0], 128);
    }

    #[test]
    fn test_masked_paste_skips_transparent_pixels() {
        let frame = RgbaImage::from_pixel(4, 4, BLUE);
        let mut avatar = RgbaImage::from_pixel(4, 4, RED);
        avatar.put_pixel(0, 0, Rgba([255, 0, 0, 0]));
        let out = compose_frame(&frame, Some(placement(&avatar, 0, 0, false)), None);
        assert_eq!(*out.get_pixel(0, 0), BLUE);
        assert_eq!(*out.get_pixel(1, 1), RED);
    }

    #[test]
    fn test_negative_and_overflowing_placement_clips() {
        let frame = RgbaImage::from_pixel(4, 4, BLUE);
        let avatar = RgbaImage::from_pixel(4, 4, RED);

        let out = compose_frame(&frame, Some(placement(&avatar, -2, -2, false)), None);
        assert_eq!(*out.get_pixel(1, 1), RED);
        assert_eq!(*out.get_pixel(2, 2), BLUE);

        let out = compose_frame(&frame, Some(placement(&avatar, 3, 3, true)), None);
        assert_eq!(*out.get_pixel(3, 3), RED);
        assert_eq!(*out.get_pixel(2, 2), BLUE);
    }

    #[test]
    fn test_text_drawn_after_avatar() {
        let frame = RgbaImage::from_pixel(32, 32, BLUE);
        let avatar = RgbaImage::from_pixel(32, 32, RED);
        let overlay = TextOverlay {
            text: "#".to_string(),
            origin: (0, 0),
            size: 16.0,
            color: Rgba([0, 255, 0, 255]),
            typeface: Typeface::Builtin,
        };
        let out = compose_frame(&frame, Some(placement(&avatar, 0, 0, false)), Some(&overlay));
        assert!(out.pixels().any(|p| *p == Rgba([0, 255, 0, 255])));
        assert!(out.pixels().any(|p| *p == RED));
    }
}
