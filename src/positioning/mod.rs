//! Mark Positioning
//!
//! This module contains the mark attachment engine:
//! - Pattern expansion for groups and character sets
//! - Attachment and positioning rule lookup
//! - Default offsets from glyph geometry
//! - Attachment classes that keep related pairs in sync
//! - The per-pair editing session and its Bevy plugin

pub mod autosave;
pub mod classes;
pub mod context;
pub mod membership;
pub mod offset;
pub mod pair;
pub mod plugin;
pub mod positioning_map;
pub mod rules;
pub mod session;

// Re-export commonly used items
pub use classes::{AttachmentClass, ClassKind};
pub use context::{EffectiveOffset, OffsetSource, PositioningContext, PositioningSettings};
pub use membership::{first_matching, Groups, MembershipExpander};
pub use offset::calculate_default_offset;
pub use pair::{PositionKey, PositioningPair};
pub use plugin::MarkPositioningPlugin;
pub use positioning_map::MarkPositioningMap;
pub use rules::{AttachmentRule, MarkAttachmentRules, PositioningRule};
pub use session::{LinkChange, PositioningSession, RenderOutput, SaveReport, SessionState};
