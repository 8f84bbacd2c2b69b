//! Font source data structures
//!
//! Characters, drawn glyph outlines and font metrics, as supplied by the
//! script configuration and the drawing subsystem.

pub mod data;
pub mod metrics;

pub use data::{Bearings, Character, CharacterIndex, CharacterSet, GlyphClass, GlyphData, GlyphPath};
pub use metrics::FontMetrics;
