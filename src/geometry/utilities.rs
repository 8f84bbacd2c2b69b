//! Geometry utility functions
//!
//! Movement constraints and path translation shared by the positioning
//! session and the class engine.

use crate::font_source::GlyphPath;
use kurbo::Vec2;
use serde::{Deserialize, Serialize};

/// Axis restriction for moving a mark relative to its base
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Movement {
    Horizontal,
    Vertical,
    /// The mark may not be moved at all
    None,
}

/// Restrict a deviation from the default offset to the allowed axis.
///
/// Returns `None` when movement is not allowed.
pub fn constrain_deviation(deviation: Vec2, movement: Option<Movement>) -> Option<Vec2> {
    match movement {
        None => Some(deviation),
        Some(Movement::Horizontal) => Some(Vec2::new(deviation.x, 0.0)),
        Some(Movement::Vertical) => Some(Vec2::new(0.0, deviation.y)),
        Some(Movement::None) => None,
    }
}

/// Lock a drag delta to its dominant axis
/// (used when shift is held to constrain movement)
pub fn axis_lock_delta(delta: Vec2) -> Vec2 {
    if delta.x.abs() > delta.y.abs() {
        Vec2::new(delta.x, 0.0)
    } else {
        Vec2::new(0.0, delta.y)
    }
}

/// Clone `paths` moved by `offset`, tagging every copy with `group_id`
/// so the editing surface treats them as one rigid unit.
pub fn translate_paths(
    paths: &[GlyphPath],
    offset: Vec2,
    group_id: Option<&str>,
) -> Vec<GlyphPath> {
    paths
        .iter()
        .map(|path| {
            let mut moved = path.translated(offset);
            if let Some(group_id) = group_id {
                moved.group_id = Some(group_id.to_string());
            }
            moved
        })
        .collect()
}
