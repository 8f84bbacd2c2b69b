//! Default mark offsets
//!
//! The default offset translates the mark so its resolved anchor lands on
//! the base's resolved anchor (plus the rule's nudge). It is always the
//! full 2D answer; movement constraints apply to edits, not to defaults.

use super::membership::MembershipExpander;
use super::rules::{resolve_rule, AttachmentRule, ResolvedRule};
use crate::core::errors::GeometryError;
use crate::font_source::FontMetrics;
use crate::geometry::AnchorPoint;
use kurbo::{Rect, Vec2};

/// Compute the default offset of `mark_name` relative to `base_name`.
///
/// Returns a zero offset when either glyph has no drawn content. Invalid
/// anchor names in the matching rule are reported, never replaced.
pub fn calculate_default_offset(
    base_name: &str,
    mark_name: &str,
    base_bbox: Option<Rect>,
    mark_bbox: Option<Rect>,
    rules: &[AttachmentRule],
    metrics: Option<&FontMetrics>,
    expander: &MembershipExpander,
) -> Result<Vec2, GeometryError> {
    let (Some(base_bbox), Some(mark_bbox)) = (base_bbox, mark_bbox) else {
        return Ok(Vec2::ZERO);
    };
    let rule = resolve_rule(base_name, mark_name, rules, expander)
        .unwrap_or_else(ResolvedRule::fallback);
    offset_for_rule(&rule, base_bbox, mark_bbox, metrics)
}

/// Offset placing the mark's anchor on the (nudged) base anchor
pub fn offset_for_rule(
    rule: &ResolvedRule,
    base_bbox: Rect,
    mark_bbox: Rect,
    metrics: Option<&FontMetrics>,
) -> Result<Vec2, GeometryError> {
    let base_point: AnchorPoint = rule.base_point.parse()?;
    let mark_point: AnchorPoint = rule.mark_point.parse()?;

    let base_anchor = match metrics {
        Some(metrics) => base_point.coordinate_with_metrics(base_bbox, metrics),
        None => base_point.coordinate(base_bbox),
    } + rule.nudge;
    let mark_anchor = mark_point.coordinate(mark_bbox);

    Ok(base_anchor - mark_anchor)
}
