//! Project data and the persistence collaborator
//!
//! A project bundles the script configuration, drawn glyphs and positioning
//! configuration. The positioning engine never writes to disk itself: it
//! hands immutable snapshots to a [`ProjectPersistence`] implementation.

use crate::core::errors::PersistError;
use crate::font_source::{Character, CharacterSet, FontMetrics, GlyphData};
use crate::positioning::classes::{AttachmentClass, ClassKind};
use crate::positioning::membership::Groups;
use crate::positioning::positioning_map::MarkPositioningMap;
use crate::positioning::rules::{MarkAttachmentRules, PositioningRule};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    #[serde(default)]
    pub character_sets: Vec<CharacterSet>,
    #[serde(default)]
    pub groups: Groups,
    /// Drawn outlines keyed by unicode
    #[serde(default)]
    pub glyphs: BTreeMap<u32, GlyphData>,
    #[serde(default)]
    pub mark_positioning: MarkPositioningMap,
    #[serde(default)]
    pub mark_classes: Vec<AttachmentClass>,
    #[serde(default)]
    pub base_classes: Vec<AttachmentClass>,
    #[serde(default)]
    pub positioning_rules: Vec<PositioningRule>,
    #[serde(default)]
    pub attachment_rules: MarkAttachmentRules,
    #[serde(default)]
    pub metrics: Option<FontMetrics>,
}

impl Project {
    /// Load a project from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read project file {}", path.display()))?;
        let project: Project = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse project file {}", path.display()))?;
        info!(
            "Loaded project {:?}: {} glyphs, {} mark positions",
            path,
            project.glyphs.len(),
            project.mark_positioning.len()
        );
        Ok(project)
    }

    /// Save the project as pretty-printed JSON
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        fs::write(path, contents)?;
        debug!("Saved project to {:?}", path);
        Ok(())
    }

    pub fn classes(&self, kind: ClassKind) -> &[AttachmentClass] {
        match kind {
            ClassKind::Mark => &self.mark_classes,
            ClassKind::Base => &self.base_classes,
        }
    }

    pub fn classes_mut(&mut self, kind: ClassKind) -> &mut Vec<AttachmentClass> {
        match kind {
            ClassKind::Mark => &mut self.mark_classes,
            ClassKind::Base => &mut self.base_classes,
        }
    }

    /// Every definition of the named character across character sets
    pub fn characters_named_mut<'a>(
        &'a mut self,
        name: &'a str,
    ) -> impl Iterator<Item = &'a mut Character> + 'a {
        self.character_sets
            .iter_mut()
            .flat_map(|set| set.characters.iter_mut())
            .filter(move |character| character.name == name)
    }
}

/// One atomic write: everything an edit changed, handed over together so a
/// backend either takes all of it or none of it.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ProjectChanges {
    /// Replacement positioning map
    pub positions: Option<MarkPositioningMap>,
    /// `None` removes any stored outline for that unicode
    pub glyphs: BTreeMap<u32, Option<GlyphData>>,
    pub classes: Option<(ClassKind, Vec<AttachmentClass>)>,
    pub characters: Vec<Character>,
}

impl ProjectChanges {
    pub fn is_empty(&self) -> bool {
        self.positions.is_none()
            && self.glyphs.is_empty()
            && self.classes.is_none()
            && self.characters.is_empty()
    }

    /// Write the changes into `project`
    pub fn apply(&self, project: &mut Project) {
        if let Some(positions) = &self.positions {
            project.mark_positioning = positions.clone();
        }
        for (unicode, glyph) in &self.glyphs {
            match glyph {
                Some(glyph) => {
                    project.glyphs.insert(*unicode, glyph.clone());
                }
                None => {
                    project.glyphs.remove(unicode);
                }
            }
        }
        if let Some((kind, classes)) = &self.classes {
            *project.classes_mut(*kind) = classes.clone();
        }
        for character in &self.characters {
            for existing in project.characters_named_mut(&character.name) {
                *existing = character.clone();
            }
        }
    }
}

/// Receives immutable snapshots of the data the positioning engine changes
pub trait ProjectPersistence {
    /// Store every change or none of them
    fn persist(&mut self, changes: &ProjectChanges) -> Result<(), PersistError>;
}

/// Keeps a shadow copy of the project and rewrites the project file on
/// every snapshot
pub struct JsonFilePersistence {
    path: PathBuf,
    shadow: Project,
}

impl JsonFilePersistence {
    pub fn new(path: impl Into<PathBuf>, project: &Project) -> Self {
        Self {
            path: path.into(),
            shadow: project.clone(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ProjectPersistence for JsonFilePersistence {
    fn persist(&mut self, changes: &ProjectChanges) -> Result<(), PersistError> {
        let mut next = self.shadow.clone();
        changes.apply(&mut next);
        let contents = serde_json::to_string_pretty(&next)?;
        fs::write(&self.path, contents)?;
        self.shadow = next;
        debug!("Wrote project snapshot to {:?}", self.path);
        Ok(())
    }
}

/// Records snapshots in memory; used by headless hosts and tests
#[derive(Debug, Default)]
pub struct MemoryPersistence {
    pub positions: Option<MarkPositioningMap>,
    pub glyphs: BTreeMap<u32, Option<GlyphData>>,
    pub classes: BTreeMap<String, Vec<AttachmentClass>>,
    pub characters: BTreeMap<String, Character>,
    /// Accepted snapshots
    pub writes: usize,
    /// When set, every snapshot is rejected
    pub fail_with: Option<String>,
}

impl ProjectPersistence for MemoryPersistence {
    fn persist(&mut self, changes: &ProjectChanges) -> Result<(), PersistError> {
        if let Some(message) = &self.fail_with {
            return Err(PersistError::Unavailable(message.clone()));
        }
        if let Some(positions) = &changes.positions {
            self.positions = Some(positions.clone());
        }
        self.glyphs
            .extend(changes.glyphs.iter().map(|(unicode, glyph)| (*unicode, glyph.clone())));
        if let Some((kind, classes)) = &changes.classes {
            let key = match kind {
                ClassKind::Mark => "mark",
                ClassKind::Base => "base",
            };
            self.classes.insert(key.to_string(), classes.clone());
        }
        for character in &changes.characters {
            self.characters.insert(character.name.clone(), character.clone());
        }
        self.writes += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::positioning::pair::PositionKey;
    use kurbo::Vec2;

    fn sample() -> Project {
        let mut project = Project::default();
        project.character_sets.push(CharacterSet {
            name: "latin".to_string(),
            characters: vec![Character::new("n", 110)],
        });
        project
            .mark_positioning
            .insert(PositionKey::new(110, 771), Vec2::new(4.0, -2.0));
        project
    }

    #[test]
    fn test_project_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("project.json");
        let project = sample();
        project.save(&path).unwrap();
        assert_eq!(Project::load(&path).unwrap(), project);
    }

    #[test]
    fn test_missing_sections_default() {
        let project: Project = serde_json::from_str("{}").unwrap();
        assert!(project.glyphs.is_empty());
        assert!(project.metrics.is_none());
    }

    #[test]
    fn test_json_persistence_writes_snapshots() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("project.json");
        let project = sample();
        let mut persistence = JsonFilePersistence::new(&path, &project);

        let mut positions = project.mark_positioning.clone();
        positions.insert(PositionKey::new(110, 772), Vec2::new(1.0, 1.0));
        let mut renamed = Character::new("n", 110);
        renamed.bearings.left = Some(30.0);
        let changes = ProjectChanges {
            positions: Some(positions),
            characters: vec![renamed],
            ..Default::default()
        };
        persistence.persist(&changes).unwrap();

        let written = Project::load(&path).unwrap();
        assert_eq!(written.mark_positioning.len(), 2);
        assert_eq!(written.character_sets[0].characters[0].bearings.left, Some(30.0));

        let mut applied = project.clone();
        changes.apply(&mut applied);
        assert_eq!(written, applied);
    }

    #[test]
    fn test_failed_json_write_keeps_shadow() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("project.json");
        let project = sample();
        let mut persistence = JsonFilePersistence::new(&path, &project);

        let changes = ProjectChanges {
            glyphs: BTreeMap::from([(110, Some(GlyphData::default()))]),
            ..Default::default()
        };
        assert!(persistence.persist(&changes).is_err());

        // A later snapshot does not carry the rejected glyph
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        persistence.persist(&ProjectChanges::default()).unwrap();
        assert!(Project::load(&path).unwrap().glyphs.is_empty());
    }

    #[test]
    fn test_memory_persistence_can_fail() {
        let mut persistence = MemoryPersistence {
            fail_with: Some("disk full".to_string()),
            ..Default::default()
        };
        let changes = ProjectChanges {
            positions: Some(MarkPositioningMap::default()),
            ..Default::default()
        };
        let error = persistence.persist(&changes).unwrap_err();
        assert_eq!(error.to_string(), "persistence unavailable: disk full");
        assert_eq!(persistence.writes, 0);
        assert!(persistence.positions.is_none());
    }
}
