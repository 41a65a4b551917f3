//! Per-frame placement resolution

use crate::models::Rect;

/// Pick the rectangle used for `frame_index`.
///
/// A single rectangle is used for every frame. With several, selection wraps
/// modulo their count, so templates may carry fewer rectangles than frames
/// (cyclic reuse) or more (trailing rectangles unused). Returns `None` only
/// when there are no rectangles at all.
///
/// # Examples
///
/// ```
/// use petpet::geometry::resolve_rect;
/// use petpet::models::Rect;
///
/// let positions = [Rect::new(0, 0, 10, 10), Rect::new(5, 5, 20, 20)];
/// assert_eq!(resolve_rect(&positions, 3), Some(Rect::new(5, 5, 20, 20)));
/// assert_eq!(resolve_rect(&[], 0), None);
/// ```
pub fn resolve_rect(positions: &[Rect], frame_index: usize) -> Option<Rect> {
    match positions {
        [] => None,
        [only] => Some(*only),
        many => Some(many[frame_index % many.len()]),
    }
}
