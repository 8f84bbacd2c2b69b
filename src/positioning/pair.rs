//! Base/mark pairs and their keys

use crate::font_source::{Character, CharacterIndex};
use std::fmt;

/// Key identifying a base/mark pair by name, as stored in a class's
/// `exceptPairs`: `"baseName-markName"`.
pub fn pair_key(base_name: &str, mark_name: &str) -> String {
    format!("{base_name}-{mark_name}")
}

/// Key identifying a base/mark pair by unicode, as stored in the mark
/// positioning map: `"baseUnicode-markUnicode"`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PositionKey {
    pub base: u32,
    pub mark: u32,
}

impl PositionKey {
    pub fn new(base: u32, mark: u32) -> Self {
        Self { base, mark }
    }

    pub fn parse(key: &str) -> Option<Self> {
        let (base, mark) = key.split_once('-')?;
        Some(Self {
            base: base.trim().parse().ok()?,
            mark: mark.trim().parse().ok()?,
        })
    }
}

impl fmt::Display for PositionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.base, self.mark)
    }
}

/// The base, mark and resulting ligature being positioned
#[derive(Clone, Debug, PartialEq)]
pub struct PositioningPair {
    pub base: Character,
    pub mark: Character,
    pub ligature: Character,
}

impl PositioningPair {
    /// Build the pair for two names, if both characters and their ligature
    /// are registered.
    pub fn lookup(base_name: &str, mark_name: &str, characters: &CharacterIndex) -> Option<Self> {
        Some(Self {
            base: characters.by_name(base_name)?.clone(),
            mark: characters.by_name(mark_name)?.clone(),
            ligature: characters.ligature_for(base_name, mark_name)?.clone(),
        })
    }

    pub fn name_key(&self) -> String {
        pair_key(&self.base.name, &self.mark.name)
    }

    pub fn position_key(&self) -> PositionKey {
        PositionKey::new(self.base.unicode, self.mark.unicode)
    }
}

impl fmt::Display for PositioningPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} + {}", self.base.name, self.mark.name)
    }
}
