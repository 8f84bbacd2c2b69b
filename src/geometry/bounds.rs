//! Bounding boxes over drawn glyph paths

use crate::font_source::GlyphPath;
use kurbo::Rect;

/// The smallest axis-aligned rectangle enclosing every point of `paths`,
/// grown by half the stroke thickness on each side so it covers the
/// rendered stroke and not only the path centerlines.
///
/// Returns `None` when there is nothing drawn.
pub fn bounding_box(paths: &[GlyphPath], stroke_thickness: f64) -> Option<Rect> {
    let mut points = paths.iter().flat_map(|path| path.all_points());
    let first = points.next()?;
    let rect = points.fold(Rect::from_points(first, first), |rect, point| {
        rect.union_pt(point)
    });
    let half = stroke_thickness.max(0.0) / 2.0;
    Some(rect.inflate(half, half))
}
