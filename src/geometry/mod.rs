//! Geometric Primitives and Operations
//!
//! Points and vectors are kurbo's `Point` and `Vec2`; their operators
//! (`Point - Point`, `Point + Vec2`, `Vec2 + Vec2`) are the vector helpers
//! used for offset composition throughout the crate.

pub mod anchor;
pub mod bounds;
pub mod utilities;

// Re-export commonly used items
pub use anchor::{anchor_point_coordinate, AnchorPoint};
pub use bounds::bounding_box;
pub use utilities::{axis_lock_delta, constrain_deviation, translate_paths, Movement};
