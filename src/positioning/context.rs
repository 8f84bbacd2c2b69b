//! Read-only view of a project for offset resolution
//!
//! Bundles the project with a memoizing membership expander and a
//! character index so every lookup on the drag path stays in memory.

use super::classes::{
    class_for_pair, is_linked, leader_where, siblings_of, AttachmentClass, ClassKind,
};
use super::membership::MembershipExpander;
use super::offset::calculate_default_offset;
use super::pair::PositioningPair;
use super::rules::{movement_for, positioning_pairs};
use crate::core::errors::GeometryError;
use crate::data::project::Project;
use crate::font_source::{CharacterIndex, FontMetrics, GlyphData, GlyphPath};
use crate::geometry::{bounding_box, translate_paths, Movement};
use kurbo::{Rect, Vec2};

/// Tunables for offset computation and the editing session
#[derive(Clone, Debug, PartialEq)]
pub struct PositioningSettings {
    /// Stroke width used when measuring drawn glyphs
    pub stroke_thickness: f64,
    /// Let font metrics adjust base anchors
    pub use_metrics: bool,
    pub autosave: bool,
    pub autosave_debounce_secs: f64,
}

impl Default for PositioningSettings {
    fn default() -> Self {
        Self {
            stroke_thickness: 8.0,
            use_metrics: true,
            autosave: true,
            autosave_debounce_secs: 0.5,
        }
    }
}

/// Where a pair's effective offset came from
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum OffsetSource {
    /// Stored in the mark positioning map
    Manual,
    /// Synchronized from the class leader
    Class { leader: String },
    /// Computed from rules and glyph geometry
    Default,
}

#[derive(Clone, Debug, PartialEq)]
pub struct EffectiveOffset {
    pub offset: Vec2,
    pub default: Vec2,
    pub source: OffsetSource,
}

impl EffectiveOffset {
    pub fn anchor_delta(&self) -> Vec2 {
        self.offset - self.default
    }
}

/// A sibling pair's new offset and composed ligature after propagation
#[derive(Clone, Debug, PartialEq)]
pub struct PropagatedOffset {
    pub pair: PositioningPair,
    pub offset: Vec2,
    pub ligature: GlyphData,
}

/// Group id shared by the translated mark paths of a pair
pub fn mark_group_id(pair: &PositioningPair) -> String {
    format!("mark-{:04X}-{:04X}", pair.base.unicode, pair.mark.unicode)
}

pub struct PositioningContext<'a> {
    project: &'a Project,
    settings: &'a PositioningSettings,
    expander: MembershipExpander<'a>,
    characters: CharacterIndex<'a>,
}

impl<'a> PositioningContext<'a> {
    pub fn new(project: &'a Project, settings: &'a PositioningSettings) -> Self {
        Self {
            project,
            settings,
            expander: MembershipExpander::new(&project.groups, &project.character_sets),
            characters: CharacterIndex::new(&project.character_sets),
        }
    }

    pub fn project(&self) -> &'a Project {
        self.project
    }

    pub fn settings(&self) -> &'a PositioningSettings {
        self.settings
    }

    pub fn expander(&self) -> &MembershipExpander<'a> {
        &self.expander
    }

    pub fn characters(&self) -> &CharacterIndex<'a> {
        &self.characters
    }

    pub fn pair(&self, base_name: &str, mark_name: &str) -> Option<PositioningPair> {
        PositioningPair::lookup(base_name, mark_name, &self.characters)
    }

    /// All pairs the positioning rules ask for
    pub fn pairs(&self) -> Vec<PositioningPair> {
        positioning_pairs(&self.project.positioning_rules, &self.expander, &self.characters)
    }

    pub fn glyph(&self, unicode: u32) -> Option<&'a GlyphData> {
        self.project.glyphs.get(&unicode)
    }

    pub fn glyph_paths(&self, unicode: u32) -> &'a [GlyphPath] {
        self.glyph(unicode).map(|glyph| glyph.paths.as_slice()).unwrap_or(&[])
    }

    pub fn is_drawn(&self, unicode: u32) -> bool {
        self.glyph(unicode).is_some_and(GlyphData::is_drawn)
    }

    pub fn pair_is_drawn(&self, pair: &PositioningPair) -> bool {
        self.is_drawn(pair.base.unicode) && self.is_drawn(pair.mark.unicode)
    }

    pub fn bbox(&self, unicode: u32) -> Option<Rect> {
        bounding_box(self.glyph_paths(unicode), self.settings.stroke_thickness)
    }

    pub fn metrics(&self) -> Option<&'a FontMetrics> {
        if self.settings.use_metrics {
            self.project.metrics.as_ref()
        } else {
            None
        }
    }

    pub fn movement(&self, pair: &PositioningPair) -> Option<Movement> {
        movement_for(
            &pair.base.name,
            &pair.mark.name,
            &self.project.positioning_rules,
            &self.expander,
        )
    }

    /// Rule/geometry default for `pair`
    pub fn default_offset(&self, pair: &PositioningPair) -> Result<Vec2, GeometryError> {
        calculate_default_offset(
            &pair.base.name,
            &pair.mark.name,
            self.bbox(pair.base.unicode),
            self.bbox(pair.mark.unicode),
            &self.project.attachment_rules,
            self.metrics(),
            &self.expander,
        )
    }

    pub fn class_for(&self, pair: &PositioningPair) -> Option<&'a AttachmentClass> {
        class_for_pair(
            pair,
            &self.project.mark_classes,
            &self.project.base_classes,
            &self.expander,
        )
    }

    /// The first member of `class` whose pair with this pair's counterpart
    /// is linked, drawn and has a ligature.
    pub fn sync_leader(
        &self,
        pair: &PositioningPair,
        class: &AttachmentClass,
    ) -> Option<PositioningPair> {
        let counterpart = class.counterpart_of(pair);
        let member_pair = |member: &str| match class.kind {
            ClassKind::Mark => self.pair(counterpart, member),
            ClassKind::Base => self.pair(member, counterpart),
        };
        let leader = leader_where(class, counterpart, &self.expander, |member| {
            member_pair(member).is_some_and(|candidate| self.pair_is_drawn(&candidate))
        })?;
        member_pair(&leader)
    }

    /// Stored offset minus default offset; zero when nothing is stored
    pub fn anchor_delta(&self, pair: &PositioningPair) -> Result<Vec2, GeometryError> {
        match self.project.mark_positioning.get(pair.position_key()) {
            Some(stored) => Ok(stored - self.default_offset(pair)?),
            None => Ok(Vec2::ZERO),
        }
    }

    /// Resolve the offset used for rendering: a manual entry, then the
    /// class leader's delta applied to this pair's default, then the default.
    pub fn effective_offset(
        &self,
        pair: &PositioningPair,
    ) -> Result<EffectiveOffset, GeometryError> {
        let default = self.default_offset(pair)?;
        if let Some(stored) = self.project.mark_positioning.get(pair.position_key()) {
            return Ok(EffectiveOffset {
                offset: stored,
                default,
                source: OffsetSource::Manual,
            });
        }

        if let Some(class) = self.class_for(pair).filter(|class| is_linked(pair, class)) {
            if let Some(leader) = self.sync_leader(pair, class) {
                let leader_stored = self.project.mark_positioning.get(leader.position_key());
                if leader != *pair {
                    if let Some(leader_stored) = leader_stored {
                        let delta = leader_stored - self.default_offset(&leader)?;
                        return Ok(EffectiveOffset {
                            offset: default + delta,
                            default,
                            source: OffsetSource::Class {
                                leader: class.member_of(&leader).to_string(),
                            },
                        });
                    }
                }
            }
        }

        Ok(EffectiveOffset {
            offset: default,
            default,
            source: OffsetSource::Default,
        })
    }

    /// Offsets for every linked sibling of `pair` after the pair is saved
    /// with anchor delta `delta`: each sibling gets its own default plus
    /// the same delta.
    pub fn propagation(
        &self,
        pair: &PositioningPair,
        class: &AttachmentClass,
        delta: Vec2,
    ) -> Result<Vec<PropagatedOffset>, GeometryError> {
        siblings_of(
            pair,
            class,
            &self.characters,
            &self.project.glyphs,
            &self.expander,
        )
        .into_iter()
        .filter(|sibling| sibling != pair && is_linked(sibling, class))
        .map(|sibling| -> Result<PropagatedOffset, GeometryError> {
            let offset = self.default_offset(&sibling)? + delta;
            let ligature = self.compose_ligature(&sibling, offset);
            Ok(PropagatedOffset {
                pair: sibling,
                offset,
                ligature,
            })
        })
        .collect()
    }

    /// Base paths followed by the mark paths moved by `offset`
    pub fn compose_ligature(&self, pair: &PositioningPair, offset: Vec2) -> GlyphData {
        let mut paths = self.glyph_paths(pair.base.unicode).to_vec();
        paths.extend(translate_paths(
            self.glyph_paths(pair.mark.unicode),
            offset,
            Some(&mark_group_id(pair)),
        ));
        GlyphData::new(paths)
    }
}
