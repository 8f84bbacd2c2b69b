//! UFO format conversion utilities
//!
//! Font sources are y-up with the baseline at zero. The positioning canvas
//! is y-down, so outline points are flipped around `FontMetrics::baseline_y`
//! on the way in.

use crate::font_source::{FontMetrics, GlyphData, GlyphPath};
use kurbo::Point;
use norad::Font;

impl FontMetrics {
    /// Vertical metrics from a UFO's fontinfo. The canvas baseline sits one
    /// ascender below the top of the canvas.
    pub fn from_ufo(font: &Font) -> Self {
        let info = &font.font_info;
        let units_per_em = info
            .units_per_em
            .map(|v| v.to_string().parse().unwrap_or(1000.0))
            .unwrap_or(1000.0);
        let mut metrics = Self {
            units_per_em,
            ascender: info.ascender,
            descender: info.descender,
            x_height: info.x_height,
            cap_height: info.cap_height,
            ..Default::default()
        };
        metrics.baseline_y = metrics.ascender_or_default();
        metrics
    }
}

impl GlyphPath {
    /// One path per contour, with on- and off-curve points in canvas space
    pub fn from_norad_contour(contour: &norad::Contour, baseline_y: f64) -> Self {
        let points = contour
            .points
            .iter()
            .map(|point| Point::new(point.x, baseline_y - point.y))
            .collect();
        Self::new(points)
    }
}

impl GlyphData {
    /// Convert a norad glyph's contours. Components are not decomposed.
    pub fn from_norad_glyph(glyph: &norad::Glyph, baseline_y: f64) -> Self {
        let paths = glyph
            .contours
            .iter()
            .map(|contour| GlyphPath::from_norad_contour(contour, baseline_y))
            .collect();
        Self::new(paths)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(size: f64) -> norad::Contour {
        let corner = |x: f64, y: f64| {
            norad::ContourPoint::new(x, y, norad::PointType::Line, false, None, None)
        };
        norad::Contour::new(
            vec![
                corner(0.0, 0.0),
                corner(size, 0.0),
                corner(size, size),
                corner(0.0, size),
            ],
            None,
        )
    }

    #[test]
    fn test_contours_flip_into_canvas_space() {
        let mut glyph = norad::Glyph::new("o");
        glyph.contours.push(square(100.0));
        glyph.contours.push(square(10.0));

        let data = GlyphData::from_norad_glyph(&glyph, 800.0);
        assert_eq!(data.paths.len(), 2);
        assert_eq!(data.paths[0].points[0], Point::new(0.0, 800.0));
        assert_eq!(data.paths[0].points[2], Point::new(100.0, 700.0));
        assert!(data.is_drawn());
    }

    #[test]
    fn test_metrics_default_without_fontinfo() {
        let font = Font::new();
        let metrics = FontMetrics::from_ufo(&font);
        assert_eq!(metrics.units_per_em, 1000.0);
        assert_eq!(metrics.baseline_y, 800.0);
        assert_eq!(metrics.x_height, None);
    }
}
