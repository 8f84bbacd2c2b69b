//! Named anchor points on a bounding box
//!
//! Anchors form a 3×3 grid over a rectangle. Coordinates follow the drawing
//! canvas, where y grows downward: "top" is the rectangle's minimum y.

use crate::core::errors::GeometryError;
use crate::font_source::FontMetrics;
use kurbo::{Point, Rect};
use std::fmt;
use std::str::FromStr;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum VerticalPosition {
    Top,
    Middle,
    Bottom,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum HorizontalPosition {
    Left,
    Center,
    Right,
}

/// One of the nine standard anchor positions
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct AnchorPoint {
    pub vertical: VerticalPosition,
    pub horizontal: HorizontalPosition,
}

impl AnchorPoint {
    pub const TOP_CENTER: AnchorPoint =
        AnchorPoint::new(VerticalPosition::Top, HorizontalPosition::Center);
    pub const BOTTOM_CENTER: AnchorPoint =
        AnchorPoint::new(VerticalPosition::Bottom, HorizontalPosition::Center);

    pub const fn new(vertical: VerticalPosition, horizontal: HorizontalPosition) -> Self {
        Self {
            vertical,
            horizontal,
        }
    }

    /// All nine anchors, top row first
    pub fn all() -> impl Iterator<Item = AnchorPoint> {
        use HorizontalPosition::*;
        use VerticalPosition::*;
        [Top, Middle, Bottom].into_iter().flat_map(|vertical| {
            [Left, Center, Right]
                .into_iter()
                .map(move |horizontal| AnchorPoint::new(vertical, horizontal))
        })
    }

    /// The anchor's coordinate on `bbox`
    pub fn coordinate(&self, bbox: Rect) -> Point {
        let x = match self.horizontal {
            HorizontalPosition::Left => bbox.x0,
            HorizontalPosition::Center => (bbox.x0 + bbox.x1) / 2.0,
            HorizontalPosition::Right => bbox.x1,
        };
        let y = match self.vertical {
            VerticalPosition::Top => bbox.y0,
            VerticalPosition::Middle => (bbox.y0 + bbox.y1) / 2.0,
            VerticalPosition::Bottom => bbox.y1,
        };
        Point::new(x, y)
    }

    /// Like [`coordinate`](Self::coordinate), but top-row anchors never sit
    /// below the x-height line and bottom-row anchors never sit above the
    /// baseline. Ascenders and descenders still extend past those lines.
    pub fn coordinate_with_metrics(&self, bbox: Rect, metrics: &FontMetrics) -> Point {
        let point = self.coordinate(bbox);
        let y = match self.vertical {
            VerticalPosition::Top => point.y.min(metrics.x_height_line_y()),
            VerticalPosition::Middle => point.y,
            VerticalPosition::Bottom => point.y.max(metrics.baseline_y),
        };
        Point::new(point.x, y)
    }

    pub fn as_str(&self) -> &'static str {
        use HorizontalPosition::*;
        use VerticalPosition::*;
        match (self.vertical, self.horizontal) {
            (Top, Left) => "topLeft",
            (Top, Center) => "topCenter",
            (Top, Right) => "topRight",
            (Middle, Left) => "middleLeft",
            (Middle, Center) => "middleCenter",
            (Middle, Right) => "middleRight",
            (Bottom, Left) => "bottomLeft",
            (Bottom, Center) => "bottomCenter",
            (Bottom, Right) => "bottomRight",
        }
    }
}

impl FromStr for AnchorPoint {
    type Err = GeometryError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        // "center" is accepted as shorthand for the middle of the box
        if name == "center" {
            return Ok(AnchorPoint::new(
                VerticalPosition::Middle,
                HorizontalPosition::Center,
            ));
        }
        AnchorPoint::all()
            .find(|anchor| anchor.as_str() == name)
            .ok_or_else(|| GeometryError::InvalidAnchorName {
                name: name.to_string(),
            })
    }
}

impl fmt::Display for AnchorPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Resolve a named anchor on `bbox`.
///
/// Unknown names are a configuration error and are never guessed.
pub fn anchor_point_coordinate(bbox: Rect, name: &str) -> Result<Point, GeometryError> {
    let anchor: AnchorPoint = name.parse()?;
    Ok(anchor.coordinate(bbox))
}
