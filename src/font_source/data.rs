//! Character and glyph outline data consumed by the positioning engine
//!
//! Characters come from the script configuration (character sets). Glyph
//! outlines are owned by the drawing subsystem; the positioning engine only
//! reads them, and writes translated copies into ligature glyphs on save.

use kurbo::{Point, Vec2};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Classification of a character within the script
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GlyphClass {
    Base,
    Mark,
    Ligature,
}

impl GlyphClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            GlyphClass::Base => "base",
            GlyphClass::Mark => "mark",
            GlyphClass::Ligature => "ligature",
        }
    }
}

/// Side-bearing overrides for a character
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Bearings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub left: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub right: Option<f64>,
}

/// A named, numbered grapheme unit
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Character {
    pub name: String,
    pub unicode: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub glyph_class: Option<GlyphClass>,
    #[serde(default, skip_serializing_if = "is_default_bearings")]
    pub bearings: Bearings,
    /// Names of the characters this one is composed of (base first, then mark)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub components: Vec<String>,
}

fn is_default_bearings(bearings: &Bearings) -> bool {
    *bearings == Bearings::default()
}

impl Character {
    pub fn new(name: impl Into<String>, unicode: u32) -> Self {
        Self {
            name: name.into(),
            unicode,
            glyph_class: None,
            bearings: Bearings::default(),
            components: Vec::new(),
        }
    }

    pub fn with_class(mut self, class: GlyphClass) -> Self {
        self.glyph_class = Some(class);
        self
    }

    pub fn composed_of(mut self, base: &str, mark: &str) -> Self {
        self.components = vec![base.to_string(), mark.to_string()];
        self.glyph_class = Some(GlyphClass::Ligature);
        self
    }
}

/// A semantic grouping of characters defined by the script configuration
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CharacterSet {
    pub name: String,
    #[serde(default)]
    pub characters: Vec<Character>,
}

/// A single drawn path
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GlyphPath {
    pub points: Vec<Point>,
    /// Point groups produced by stroke smoothing
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub smoothed_segments: Vec<Vec<Point>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_id: Option<String>,
}

impl GlyphPath {
    pub fn new(points: Vec<Point>) -> Self {
        Self {
            points,
            smoothed_segments: Vec::new(),
            group_id: None,
        }
    }

    /// Every point of the path, including smoothed segment points
    pub fn all_points(&self) -> impl Iterator<Item = Point> + '_ {
        self.points
            .iter()
            .chain(self.smoothed_segments.iter().flatten())
            .copied()
    }

    /// A copy of this path moved by `offset`
    pub fn translated(&self, offset: Vec2) -> Self {
        Self {
            points: self.points.iter().map(|p| *p + offset).collect(),
            smoothed_segments: self
                .smoothed_segments
                .iter()
                .map(|segment| segment.iter().map(|p| *p + offset).collect())
                .collect(),
            group_id: self.group_id.clone(),
        }
    }
}

/// The drawn outline for one character
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GlyphData {
    #[serde(default)]
    pub paths: Vec<GlyphPath>,
}

impl GlyphData {
    pub fn new(paths: Vec<GlyphPath>) -> Self {
        Self { paths }
    }

    /// Whether anything has been drawn for this glyph
    pub fn is_drawn(&self) -> bool {
        self.paths.iter().any(|path| path.all_points().next().is_some())
    }

    /// All paths tagged with the given group id
    pub fn paths_in_group<'a>(&'a self, group_id: &'a str) -> impl Iterator<Item = &'a GlyphPath> {
        self.paths
            .iter()
            .filter(move |path| path.group_id.as_deref() == Some(group_id))
    }
}

/// Name and unicode lookup over all configured characters
#[derive(Debug, Default)]
pub struct CharacterIndex<'a> {
    by_name: HashMap<&'a str, &'a Character>,
    by_unicode: HashMap<u32, &'a Character>,
    ligatures: HashMap<&'a str, HashMap<&'a str, &'a Character>>,
}

impl<'a> CharacterIndex<'a> {
    pub fn new(character_sets: &'a [CharacterSet]) -> Self {
        let mut index = Self::default();
        for character in character_sets.iter().flat_map(|set| set.characters.iter()) {
            // First definition wins when a character appears in several sets
            index.by_name.entry(character.name.as_str()).or_insert(character);
            index.by_unicode.entry(character.unicode).or_insert(character);
            if let [base, mark] = character.components.as_slice() {
                index
                    .ligatures
                    .entry(base.as_str())
                    .or_default()
                    .entry(mark.as_str())
                    .or_insert(character);
            }
        }
        index
    }

    pub fn by_name(&self, name: &str) -> Option<&'a Character> {
        self.by_name.get(name).copied()
    }

    pub fn by_unicode(&self, unicode: u32) -> Option<&'a Character> {
        self.by_unicode.get(&unicode).copied()
    }

    /// The registered ligature composed of `base` followed by `mark`
    pub fn ligature_for(&self, base: &str, mark: &str) -> Option<&'a Character> {
        self.ligatures
            .get(base)
            .and_then(|marks| marks.get(mark))
            .copied()
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sets() -> Vec<CharacterSet> {
        vec![CharacterSet {
            name: "latin".to_string(),
            characters: vec![
                Character::new("n", 0x6E).with_class(GlyphClass::Base),
                Character::new("tilde", 0x303).with_class(GlyphClass::Mark),
                Character::new("n-tilde", 0xF1).composed_of("n", "tilde"),
            ],
        }]
    }

    #[test]
    fn test_index_lookups() {
        let sets = sets();
        let index = CharacterIndex::new(&sets);
        assert_eq!(index.len(), 3);
        assert_eq!(index.by_unicode(0x303).map(|c| c.name.as_str()), Some("tilde"));
        assert_eq!(
            index.ligature_for("n", "tilde").map(|c| c.unicode),
            Some(0xF1)
        );
        assert!(index.ligature_for("tilde", "n").is_none());
        assert!(index.by_name("missing").is_none());
    }

    #[test]
    fn test_translated_path_moves_smoothed_points() {
        let mut path = GlyphPath::new(vec![Point::new(0.0, 0.0), Point::new(10.0, 0.0)]);
        path.smoothed_segments = vec![vec![Point::new(5.0, 1.0)]];
        path.group_id = Some("mark".to_string());

        let moved = path.translated(Vec2::new(3.0, -2.0));
        assert_eq!(moved.points[1], Point::new(13.0, -2.0));
        assert_eq!(moved.smoothed_segments[0][0], Point::new(8.0, -1.0));
        assert_eq!(moved.group_id.as_deref(), Some("mark"));
        // The source path is untouched
        assert_eq!(path.points[1], Point::new(10.0, 0.0));
    }

    #[test]
    fn test_empty_glyph_is_not_drawn() {
        assert!(!GlyphData::default().is_drawn());
        assert!(!GlyphData::new(vec![GlyphPath::new(Vec::new())]).is_drawn());
        assert!(GlyphData::new(vec![GlyphPath::new(vec![Point::ORIGIN])]).is_drawn());
    }
}
