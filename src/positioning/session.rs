//! Positioning session - editing state for one base/mark pair at a time
//!
//! The session owns a private working copy of the mark paths. Loading
//! clones the mark outline and translates it to the pair's effective
//! offset; saving replaces the stored data wholesale. Nothing is aliased
//! between the project and the live edit buffer.
//!
//! States: `Idle → Loaded → Editing → (Saving | Resetting) → Loaded`

use super::autosave::AutosaveTimer;
use super::classes::{is_linked, toggle_link, AttachmentClass, ClassKind};
use super::context::{mark_group_id, OffsetSource, PositioningContext, PositioningSettings};
use super::pair::PositioningPair;
use crate::core::errors::PositioningError;
use crate::data::project::{Project, ProjectChanges, ProjectPersistence};
use crate::font_source::{Bearings, GlyphData, GlyphPath};
use crate::geometry::{bounding_box, constrain_deviation, translate_paths, Movement};
use kurbo::{Rect, Vec2};
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum SessionState {
    #[default]
    Idle,
    Loaded,
    Editing,
    Saving,
    Resetting,
}

/// What a successful save wrote
#[derive(Clone, Debug, PartialEq)]
pub struct SaveReport {
    pub pair: PositioningPair,
    pub offset: Vec2,
    /// Linked siblings that received the same anchor delta
    pub propagated: Vec<PositioningPair>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum LinkChange {
    Unlinked,
    /// `report` is `None` when the pair has nothing drawn to save
    Relinked {
        offset: Vec2,
        report: Option<SaveReport>,
    },
}

/// Colour and stroke for drawing the composed pair
#[derive(Clone, Debug, PartialEq)]
pub struct RenderOutput {
    pub paths: Vec<GlyphPath>,
    pub color: [u8; 4],
    pub stroke_width: f64,
}

const MANUAL_COLOR: [u8; 4] = [0x20, 0x20, 0x20, 0xFF];
const CLASS_COLOR: [u8; 4] = [0x2F, 0x6F, 0xDB, 0xFF];
const DEFAULT_COLOR: [u8; 4] = [0x80, 0x80, 0x80, 0xFF];
const EDITING_COLOR: [u8; 4] = [0xF2, 0x8C, 0x28, 0xFF];

#[derive(Clone, Debug, Default, PartialEq)]
struct ClassLink {
    kind: Option<ClassKind>,
    name: Option<String>,
    linked: bool,
    is_leader: bool,
}

#[derive(Clone, Debug)]
struct LoadedPair {
    pair: PositioningPair,
    base_paths: Vec<GlyphPath>,
    /// Untranslated copy of the mark outline
    source_mark_paths: Vec<GlyphPath>,
    source_bbox: Option<Rect>,
    initial_mark_paths: Vec<GlyphPath>,
    mark_paths: Vec<GlyphPath>,
    offset: Vec2,
    default_offset: Vec2,
    source: OffsetSource,
    movement: Option<Movement>,
    drawn: bool,
    class: ClassLink,
    initial_bearings: Bearings,
    bearings: Bearings,
}

impl LoadedPair {
    fn place_mark(&mut self, offset: Vec2) {
        self.offset = offset;
        self.mark_paths = translate_paths(
            &self.source_mark_paths,
            offset,
            Some(&mark_group_id(&self.pair)),
        );
    }

    /// Offset observed from the working copy: current bbox origin minus
    /// the untranslated bbox origin
    fn current_offset(&self, stroke_thickness: f64) -> Vec2 {
        match (bounding_box(&self.mark_paths, stroke_thickness), self.source_bbox) {
            (Some(current), Some(source)) => current.origin() - source.origin(),
            _ => self.offset,
        }
    }

    fn composed_paths(&self) -> Vec<GlyphPath> {
        let mut paths = self.base_paths.clone();
        paths.extend(self.mark_paths.iter().cloned());
        paths
    }

    fn has_unsaved_changes(&self) -> bool {
        self.mark_paths != self.initial_mark_paths || self.bearings != self.initial_bearings
    }

    fn mark_clean(&mut self) {
        self.initial_mark_paths = self.mark_paths.clone();
        self.initial_bearings = self.bearings;
    }
}

fn class_link(ctx: &PositioningContext, pair: &PositioningPair) -> ClassLink {
    let Some(class) = ctx.class_for(pair) else {
        return ClassLink::default();
    };
    let linked = is_linked(pair, class);
    let is_leader = linked && ctx.sync_leader(pair, class).is_some_and(|leader| leader == *pair);
    ClassLink {
        kind: Some(class.kind),
        name: Some(class.name.clone()),
        linked,
        is_leader,
    }
}

/// Editing session for the active positioning pair
#[derive(Clone, Debug, Default)]
pub struct PositioningSession {
    settings: PositioningSettings,
    state: SessionState,
    loaded: Option<LoadedPair>,
    autosave: AutosaveTimer,
}

impl PositioningSession {
    pub fn new(settings: PositioningSettings) -> Self {
        let autosave = AutosaveTimer::new(settings.autosave_debounce_secs);
        Self {
            settings,
            state: SessionState::Idle,
            loaded: None,
            autosave,
        }
    }

    pub fn settings(&self) -> &PositioningSettings {
        &self.settings
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn pair(&self) -> Option<&PositioningPair> {
        self.loaded.as_ref().map(|loaded| &loaded.pair)
    }

    /// Enter `pair`, resolving its effective offset (manual entry, class
    /// sync, then geometric default).
    pub fn load(
        &mut self,
        ctx: &PositioningContext,
        pair: PositioningPair,
    ) -> Result<(), PositioningError> {
        let effective = ctx.effective_offset(&pair)?;
        let base_paths = ctx.glyph_paths(pair.base.unicode).to_vec();
        let source_mark_paths = ctx.glyph_paths(pair.mark.unicode).to_vec();
        let source_bbox = bounding_box(&source_mark_paths, self.settings.stroke_thickness);
        let drawn = ctx.pair_is_drawn(&pair);
        if !drawn {
            debug!("{} has no drawn base or mark, editing disabled", pair);
        }
        let bearings = pair.ligature.bearings;

        let mut loaded = LoadedPair {
            base_paths,
            source_mark_paths,
            source_bbox,
            initial_mark_paths: Vec::new(),
            mark_paths: Vec::new(),
            offset: Vec2::ZERO,
            default_offset: effective.default,
            source: effective.source.clone(),
            movement: ctx.movement(&pair),
            drawn,
            class: class_link(ctx, &pair),
            initial_bearings: bearings,
            bearings,
            pair,
        };
        loaded.place_mark(effective.offset);
        loaded.mark_clean();

        info!(
            "Loaded {} at ({:.1}, {:.1}) from {:?}",
            loaded.pair, effective.offset.x, effective.offset.y, effective.source
        );
        self.loaded = Some(loaded);
        self.state = SessionState::Loaded;
        self.autosave.clear();
        Ok(())
    }

    /// Leave the current pair without saving
    pub fn unload(&mut self) {
        self.loaded = None;
        self.state = SessionState::Idle;
        self.autosave.clear();
    }

    /// Why the active pair cannot be edited, if it cannot
    pub fn edit_block_reason(&self) -> Option<String> {
        let Some(loaded) = &self.loaded else {
            return Some("no pair is loaded".to_string());
        };
        if loaded.drawn && loaded.movement == Some(Movement::None) {
            return Some(format!("{} does not allow movement", loaded.pair));
        }
        save_block_reason(loaded)
    }

    pub fn can_edit(&self) -> bool {
        self.edit_block_reason().is_none()
    }

    fn editable(&mut self) -> Result<&mut LoadedPair, PositioningError> {
        if let Some(reason) = self.edit_block_reason() {
            return Err(PositioningError::EditNotAllowed { reason });
        }
        self.loaded.as_mut().ok_or(PositioningError::NoActivePair)
    }

    /// Move the mark by `delta`; returns the new current offset
    pub fn drag(&mut self, delta: Vec2, now: f64) -> Result<Vec2, PositioningError> {
        let target = self.current_offset().ok_or(PositioningError::NoActivePair)? + delta;
        self.set_offset(target, now)
    }

    /// Place the mark at `offset`, honouring the pair's movement constraint
    pub fn set_offset(&mut self, offset: Vec2, now: f64) -> Result<Vec2, PositioningError> {
        let stroke_thickness = self.settings.stroke_thickness;
        let loaded = self.editable()?;
        let deviation = constrain_deviation(offset - loaded.default_offset, loaded.movement)
            .ok_or_else(|| PositioningError::EditNotAllowed {
                reason: format!("{} does not allow movement", loaded.pair),
            })?;
        loaded.place_mark(loaded.default_offset + deviation);
        let current = loaded.current_offset(stroke_thickness);
        debug!("Edited {} to ({:.1}, {:.1})", loaded.pair, current.x, current.y);

        self.state = SessionState::Editing;
        self.autosave.touch(now);
        Ok(current)
    }

    /// Change the ligature's side bearings
    pub fn set_bearings(&mut self, bearings: Bearings, now: f64) -> Result<(), PositioningError> {
        let loaded = self.loaded.as_mut().ok_or(PositioningError::NoActivePair)?;
        if let Some(reason) = save_block_reason(loaded) {
            return Err(PositioningError::EditNotAllowed { reason });
        }
        loaded.bearings = bearings;
        self.state = SessionState::Editing;
        self.autosave.touch(now);
        Ok(())
    }

    pub fn bearings(&self) -> Option<Bearings> {
        self.loaded.as_ref().map(|loaded| loaded.bearings)
    }

    pub fn current_offset(&self) -> Option<Vec2> {
        self.loaded
            .as_ref()
            .map(|loaded| loaded.current_offset(self.settings.stroke_thickness))
    }

    pub fn default_offset(&self) -> Option<Vec2> {
        self.loaded.as_ref().map(|loaded| loaded.default_offset)
    }

    /// How far the current offset deviates from the geometric default
    pub fn anchor_delta(&self) -> Option<Vec2> {
        Some(self.current_offset()? - self.default_offset()?)
    }

    pub fn source(&self) -> Option<&OffsetSource> {
        self.loaded.as_ref().map(|loaded| &loaded.source)
    }

    pub fn movement(&self) -> Option<Movement> {
        self.loaded.as_ref().and_then(|loaded| loaded.movement)
    }

    pub fn class_name(&self) -> Option<&str> {
        self.loaded.as_ref().and_then(|loaded| loaded.class.name.as_deref())
    }

    pub fn is_linked(&self) -> bool {
        self.loaded.as_ref().is_some_and(|loaded| loaded.class.linked)
    }

    pub fn is_leader(&self) -> bool {
        self.loaded.as_ref().is_some_and(|loaded| loaded.class.is_leader)
    }

    /// Whether the working copy differs from what was loaded or last saved
    pub fn has_unsaved_changes(&self) -> bool {
        self.loaded.as_ref().is_some_and(LoadedPair::has_unsaved_changes)
    }

    /// Whether the debounced autosave should run now
    pub fn autosave_due(&self, now: f64) -> bool {
        self.settings.autosave
            && self.state == SessionState::Editing
            && self.loaded.as_ref().is_some_and(|loaded| save_block_reason(loaded).is_none())
            && self.has_unsaved_changes()
            && self.autosave.due(now)
    }

    /// The working mark paths (translated, tagged with the pair's group id)
    pub fn mark_paths(&self) -> &[GlyphPath] {
        self.loaded
            .as_ref()
            .map(|loaded| loaded.mark_paths.as_slice())
            .unwrap_or(&[])
    }

    /// Paths and style for drawing the pair as currently positioned
    pub fn render_output(&self) -> Option<RenderOutput> {
        let loaded = self.loaded.as_ref()?;
        let color = if loaded.has_unsaved_changes() {
            EDITING_COLOR
        } else {
            match loaded.source {
                OffsetSource::Manual => MANUAL_COLOR,
                OffsetSource::Class { .. } => CLASS_COLOR,
                OffsetSource::Default => DEFAULT_COLOR,
            }
        };
        Some(RenderOutput {
            paths: loaded.composed_paths(),
            color,
            stroke_width: self.settings.stroke_thickness,
        })
    }

    /// Persist the current offset and composed ligature. When the pair is
    /// the leader of a linked class, every linked sibling receives the same
    /// anchor delta on top of its own default.
    ///
    /// Pairs with nothing drawn and linked followers cannot be saved. On
    /// persistence failure the project and the working copy are left intact.
    pub fn save(
        &mut self,
        project: &mut Project,
        persistence: &mut dyn ProjectPersistence,
    ) -> Result<SaveReport, PositioningError> {
        let previous = self.state;
        let loaded = self.loaded.as_ref().ok_or(PositioningError::NoActivePair)?;
        if let Some(reason) = save_block_reason(loaded) {
            return Err(PositioningError::EditNotAllowed { reason });
        }
        self.state = SessionState::Saving;

        match write_save(loaded, &self.settings, project, persistence) {
            Ok(report) => {
                info!(
                    "Saved {} at ({:.1}, {:.1}), propagated to {} siblings",
                    report.pair,
                    report.offset.x,
                    report.offset.y,
                    report.propagated.len()
                );
                self.mark_saved();
                Ok(report)
            }
            Err(error) => {
                warn!("Failed to save mark position: {}", error);
                self.state = previous;
                Err(error)
            }
        }
    }

    fn mark_saved(&mut self) {
        if let Some(loaded) = self.loaded.as_mut() {
            loaded.source = OffsetSource::Manual;
            loaded.pair.ligature.bearings = loaded.bearings;
            loaded.mark_clean();
        }
        self.state = SessionState::Loaded;
        self.autosave.clear();
    }

    /// Unlink the pair from its class, or relink it.
    ///
    /// Unlinking freezes the pair where it is. Relinking copies the class
    /// leader's anchor delta onto this pair's default and saves it together
    /// with the class change.
    pub fn toggle_link(
        &mut self,
        project: &mut Project,
        persistence: &mut dyn ProjectPersistence,
    ) -> Result<LinkChange, PositioningError> {
        let loaded = self.loaded.as_ref().ok_or(PositioningError::NoActivePair)?;
        let pair = loaded.pair.clone();

        let (kind, classes, was_linked, relink_delta) = {
            let ctx = PositioningContext::new(project, &self.settings);
            let class = ctx
                .class_for(&pair)
                .ok_or_else(|| PositioningError::NotLinkedToClass {
                    pair: pair.name_key(),
                })?;
            let was_linked = is_linked(&pair, class);
            // Taken from the leader as it stands before the toggle
            let relink_delta = match ctx.sync_leader(&pair, class) {
                Some(leader) if !was_linked => ctx.anchor_delta(&leader)?,
                _ => Vec2::ZERO,
            };
            let toggled = toggle_link(&pair, class);
            let classes = replace_class(ctx.project().classes(class.kind), class, toggled);
            (class.kind, classes, was_linked, relink_delta)
        };
        let mut changes = ProjectChanges {
            classes: Some((kind, classes)),
            ..Default::default()
        };

        if was_linked {
            // A class-synced pair keeps its position once unlinked
            let frozen = matches!(loaded.source, OffsetSource::Class { .. });
            if frozen {
                let mut positions = project.mark_positioning.clone();
                positions.insert(
                    pair.position_key(),
                    loaded.current_offset(self.settings.stroke_thickness),
                );
                changes.positions = Some(positions);
            }
            persistence.persist(&changes)?;
            changes.apply(project);

            let ctx = PositioningContext::new(project, &self.settings);
            if let Some(loaded) = self.loaded.as_mut() {
                loaded.class = class_link(&ctx, &loaded.pair);
                if frozen {
                    loaded.source = OffsetSource::Manual;
                }
            }
            info!("Unlinked {} from its class", pair);
            return Ok(LinkChange::Unlinked);
        }

        let mut relinked = loaded.clone();
        let mut next = project.clone();
        changes.apply(&mut next);
        relinked.class = class_link(&PositioningContext::new(&next, &self.settings), &pair);
        let offset = relinked.default_offset + relink_delta;

        let report = if relinked.drawn {
            relinked.place_mark(offset);
            let (report, save) = save_changes(&relinked, &self.settings, &next)?;
            changes = ProjectChanges {
                classes: changes.classes.take(),
                ..save
            };
            Some(report)
        } else {
            None
        };
        persistence.persist(&changes)?;
        changes.apply(project);

        self.loaded = Some(relinked);
        if report.is_some() {
            self.mark_saved();
        }
        info!("Relinked {}, synced to ({:.1}, {:.1})", pair, offset.x, offset.y);
        Ok(LinkChange::Relinked { offset, report })
    }

    /// Drop the pair's manual position and composed ligature, returning to
    /// the computed offset.
    pub fn reset(
        &mut self,
        project: &mut Project,
        persistence: &mut dyn ProjectPersistence,
    ) -> Result<(), PositioningError> {
        let previous = self.state;
        let pair = self.pair().cloned().ok_or(PositioningError::NoActivePair)?;
        self.state = SessionState::Resetting;

        let mut positions = project.mark_positioning.clone();
        positions.remove(pair.position_key());
        let changes = ProjectChanges {
            positions: Some(positions),
            glyphs: BTreeMap::from([(pair.ligature.unicode, None)]),
            ..Default::default()
        };
        if let Err(error) = persistence.persist(&changes) {
            warn!("Failed to reset {}: {}", pair, error);
            self.state = previous;
            return Err(error.into());
        }
        changes.apply(project);

        info!("Reset {} to its computed position", pair);
        let settings = self.settings.clone();
        let ctx = PositioningContext::new(project, &settings);
        self.load(&ctx, pair)
    }
}

/// Why `loaded` cannot be written back, if it cannot
fn save_block_reason(loaded: &LoadedPair) -> Option<String> {
    if !loaded.drawn {
        return Some(format!("{} is not drawn", loaded.pair));
    }
    if loaded.class.name.is_some() && loaded.class.linked && !loaded.class.is_leader {
        return Some(format!(
            "{} follows its class leader; unlink it or edit the leader",
            loaded.pair
        ));
    }
    None
}

fn replace_class(
    classes: &[AttachmentClass],
    original: &AttachmentClass,
    updated: AttachmentClass,
) -> Vec<AttachmentClass> {
    let mut updated = Some(updated);
    classes
        .iter()
        .map(|class| match updated.take_if(|_| std::ptr::eq(class, original)) {
            Some(replacement) => replacement,
            None => class.clone(),
        })
        .collect()
}

fn write_save(
    loaded: &LoadedPair,
    settings: &PositioningSettings,
    project: &mut Project,
    persistence: &mut dyn ProjectPersistence,
) -> Result<SaveReport, PositioningError> {
    let (report, changes) = save_changes(loaded, settings, project)?;
    persistence.persist(&changes)?;
    changes.apply(project);
    Ok(report)
}

/// Everything a save of `loaded` writes. Siblings follow only when the pair
/// leads its linked class.
fn save_changes(
    loaded: &LoadedPair,
    settings: &PositioningSettings,
    project: &Project,
) -> Result<(SaveReport, ProjectChanges), PositioningError> {
    let pair = &loaded.pair;
    let offset = loaded.current_offset(settings.stroke_thickness);

    let mut positions = project.mark_positioning.clone();
    positions.insert(pair.position_key(), offset);
    let mut glyphs = BTreeMap::from([(
        pair.ligature.unicode,
        Some(GlyphData::new(loaded.composed_paths())),
    )]);
    let mut propagated = Vec::new();

    let ctx = PositioningContext::new(project, settings);
    let leading = ctx.class_for(pair).filter(|class| {
        is_linked(pair, class) && ctx.sync_leader(pair, class).as_ref() == Some(pair)
    });
    if let Some(class) = leading {
        let delta = offset - loaded.default_offset;
        for sibling in ctx.propagation(pair, class, delta)? {
            positions.insert(sibling.pair.position_key(), sibling.offset);
            glyphs.insert(sibling.pair.ligature.unicode, Some(sibling.ligature));
            propagated.push(sibling.pair);
        }
    }

    let mut characters = Vec::new();
    if loaded.bearings != loaded.initial_bearings {
        let mut ligature = pair.ligature.clone();
        ligature.bearings = loaded.bearings;
        characters.push(ligature);
    }

    let report = SaveReport {
        pair: pair.clone(),
        offset,
        propagated,
    };
    let changes = ProjectChanges {
        positions: Some(positions),
        glyphs,
        classes: None,
        characters,
    };
    Ok((report, changes))
}
