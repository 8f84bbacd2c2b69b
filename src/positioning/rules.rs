//! Attachment and positioning rules
//!
//! Attachment rules say *how* a mark attaches to a base (which anchors,
//! plus a nudge). Positioning rules say *which* base/mark combinations need
//! positioning at all, and how the mark may move.

use super::membership::{first_matching, MembershipExpander};
use super::pair::PositioningPair;
use crate::font_source::CharacterIndex;
use crate::geometry::Movement;
use kurbo::Vec2;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One entry of the ordered attachment rule list
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttachmentRule {
    pub base: Vec<String>,
    pub mark: Vec<String>,
    pub base_point: String,
    pub mark_point: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dx: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dy: Option<f64>,
}

/// Ordered attachment rules; the first matching entry wins
pub type MarkAttachmentRules = Vec<AttachmentRule>;

/// Anchor names and nudge selected for a base/mark pair
#[derive(Clone, Debug, PartialEq)]
pub struct ResolvedRule {
    pub base_point: String,
    pub mark_point: String,
    pub nudge: Vec2,
}

impl ResolvedRule {
    /// Top-center of the base onto bottom-center of the mark, no nudge
    pub fn fallback() -> Self {
        Self {
            base_point: "topCenter".to_string(),
            mark_point: "bottomCenter".to_string(),
            nudge: Vec2::ZERO,
        }
    }
}

impl fmt::Display for ResolvedRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} -> {}, nudge ({}, {})",
            self.base_point, self.mark_point, self.nudge.x, self.nudge.y
        )
    }
}

impl From<&AttachmentRule> for ResolvedRule {
    fn from(rule: &AttachmentRule) -> Self {
        Self {
            base_point: rule.base_point.clone(),
            mark_point: rule.mark_point.clone(),
            nudge: Vec2::new(rule.dx.unwrap_or(0.0), rule.dy.unwrap_or(0.0)),
        }
    }
}

/// Find the first attachment rule covering `base_name` + `mark_name`.
///
/// Returns `None` when no rule matches; callers then use
/// [`ResolvedRule::fallback`].
pub fn resolve_rule(
    base_name: &str,
    mark_name: &str,
    rules: &[AttachmentRule],
    expander: &MembershipExpander,
) -> Option<ResolvedRule> {
    first_matching(rules, |rule| {
        expander.contains(&rule.base, base_name) && expander.contains(&rule.mark, mark_name)
    })
    .map(ResolvedRule::from)
}

/// Declares base × mark combinations that require positioning
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PositioningRule {
    pub base: Vec<String>,
    pub mark: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub movement: Option<Movement>,
    /// Substitution rule this positioning relates to, for the property panel
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gsub: Option<String>,
}

/// The first positioning rule covering `base_name` + `mark_name`
pub fn find_positioning_rule<'r>(
    base_name: &str,
    mark_name: &str,
    rules: &'r [PositioningRule],
    expander: &MembershipExpander,
) -> Option<&'r PositioningRule> {
    first_matching(rules, |rule| {
        expander.contains(&rule.base, base_name) && expander.contains(&rule.mark, mark_name)
    })
}

pub fn requires_positioning(
    base_name: &str,
    mark_name: &str,
    rules: &[PositioningRule],
    expander: &MembershipExpander,
) -> bool {
    find_positioning_rule(base_name, mark_name, rules, expander).is_some()
}

/// Movement allowed for a pair; `None` means unrestricted
pub fn movement_for(
    base_name: &str,
    mark_name: &str,
    rules: &[PositioningRule],
    expander: &MembershipExpander,
) -> Option<Movement> {
    find_positioning_rule(base_name, mark_name, rules, expander).and_then(|rule| rule.movement)
}

/// Every (base, mark, ligature) triple required by `rules` whose characters
/// and ligature are all registered, in rule declaration order.
pub fn positioning_pairs(
    rules: &[PositioningRule],
    expander: &MembershipExpander,
    characters: &CharacterIndex,
) -> Vec<PositioningPair> {
    let mut pairs: Vec<PositioningPair> = Vec::new();
    for rule in rules {
        let bases = expander.expand(&rule.base);
        let marks = expander.expand(&rule.mark);
        for base_name in bases.iter() {
            for mark_name in marks.iter() {
                if pairs
                    .iter()
                    .any(|pair| pair.base.name == base_name && pair.mark.name == mark_name)
                {
                    continue;
                }
                if let Some(pair) = PositioningPair::lookup(base_name, mark_name, characters) {
                    pairs.push(pair);
                }
            }
        }
    }
    pairs
}
