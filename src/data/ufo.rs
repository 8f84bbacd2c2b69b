//! UFO file I/O operations

use super::project::Project;
use crate::font_source::{FontMetrics, GlyphData};
use anyhow::{Context, Result};
use norad::Font;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, info};

/// Load a UFO font file from disk
pub fn load_ufo_from_path(path: impl AsRef<Path>) -> Result<Font> {
    let path = path.as_ref();
    let font = Font::load(path).with_context(|| format!("Failed to load UFO {}", path.display()))?;
    Ok(font)
}

/// Drawn outlines of the default layer keyed by each glyph's first
/// codepoint. Unencoded glyphs are skipped.
pub fn glyphs_by_unicode(font: &Font) -> BTreeMap<u32, GlyphData> {
    let baseline_y = FontMetrics::from_ufo(font).baseline_y;
    let mut glyphs = BTreeMap::new();
    for glyph in font.default_layer().iter() {
        let Some(codepoint) = glyph.codepoints.iter().next() else {
            debug!("Skipping unencoded glyph {}", glyph.name());
            continue;
        };
        glyphs.insert(u32::from(codepoint), GlyphData::from_norad_glyph(glyph, baseline_y));
    }
    glyphs
}

/// Replace the project's outlines with those drawn in `font`. Font metrics
/// are taken from the UFO when the project has none.
pub fn overlay_ufo(project: &mut Project, font: &Font) {
    let glyphs = glyphs_by_unicode(font);
    info!("Overlaying {} glyphs from UFO", glyphs.len());
    project.glyphs.extend(glyphs);
    if project.metrics.is_none() {
        project.metrics = Some(FontMetrics::from_ufo(font));
    }
}
