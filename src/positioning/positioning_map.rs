//! Persisted manual mark positions
//!
//! Serialized as a JSON object from `"baseUnicode-markUnicode"` to `{x, y}`.
//! Keys that do not parse are dropped with a warning instead of failing the
//! whole project load.

use super::pair::PositionKey;
use kurbo::Vec2;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::warn;

/// Manually confirmed mark offsets keyed by base/mark unicode
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "BTreeMap<String, Vec2>", into = "BTreeMap<String, Vec2>")]
pub struct MarkPositioningMap {
    entries: BTreeMap<PositionKey, Vec2>,
}

impl MarkPositioningMap {
    pub fn get(&self, key: PositionKey) -> Option<Vec2> {
        self.entries.get(&key).copied()
    }

    pub fn insert(&mut self, key: PositionKey, offset: Vec2) -> Option<Vec2> {
        self.entries.insert(key, offset)
    }

    pub fn remove(&mut self, key: PositionKey) -> Option<Vec2> {
        self.entries.remove(&key)
    }

    pub fn contains(&self, key: PositionKey) -> bool {
        self.entries.contains_key(&key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (PositionKey, Vec2)> + '_ {
        self.entries.iter().map(|(key, offset)| (*key, *offset))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl From<BTreeMap<String, Vec2>> for MarkPositioningMap {
    fn from(raw: BTreeMap<String, Vec2>) -> Self {
        let entries = raw
            .into_iter()
            .filter_map(|(key, offset)| match PositionKey::parse(&key) {
                Some(parsed) => Some((parsed, offset)),
                None => {
                    warn!("Ignoring malformed mark position key '{}'", key);
                    None
                }
            })
            .collect();
        Self { entries }
    }
}

impl From<MarkPositioningMap> for BTreeMap<String, Vec2> {
    fn from(map: MarkPositioningMap) -> Self {
        map.entries
            .into_iter()
            .map(|(key, offset)| (key.to_string(), offset))
            .collect()
    }
}
