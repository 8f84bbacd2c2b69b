//! Font metrics and measurement data
//!
//! Vertical metrics are stored in font units relative to the baseline
//! (y-up), the way font sources record them. The drawing canvas is y-down,
//! so `baseline_y` places the baseline on the canvas and the `*_line_y`
//! helpers convert metrics into canvas coordinates.

use serde::{Deserialize, Serialize};

/// Font-wide vertical metrics
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FontMetrics {
    pub units_per_em: f64,
    /// Canvas y coordinate of the baseline
    pub baseline_y: f64,
    #[serde(default)]
    pub ascender: Option<f64>,
    #[serde(default)]
    pub descender: Option<f64>,
    #[serde(default)]
    pub x_height: Option<f64>,
    #[serde(default)]
    pub cap_height: Option<f64>,
}

impl Default for FontMetrics {
    fn default() -> Self {
        Self {
            units_per_em: 1000.0,
            baseline_y: 800.0,
            ascender: None,
            descender: None,
            x_height: None,
            cap_height: None,
        }
    }
}

impl FontMetrics {
    /// Get ascender value with sensible default based on UPM
    pub fn ascender_or_default(&self) -> f64 {
        self.ascender.unwrap_or(self.units_per_em * 0.8)
    }

    /// Get descender value with sensible default based on UPM
    pub fn descender_or_default(&self) -> f64 {
        self.descender.unwrap_or(-(self.units_per_em * 0.2))
    }

    /// Get x-height value with sensible default based on UPM
    pub fn x_height_or_default(&self) -> f64 {
        self.x_height.unwrap_or(self.units_per_em * 0.5)
    }

    /// Get cap-height value with sensible default based on UPM
    pub fn cap_height_or_default(&self) -> f64 {
        self.cap_height.unwrap_or(self.units_per_em * 0.7)
    }

    /// Canvas y coordinate of the x-height line
    pub fn x_height_line_y(&self) -> f64 {
        self.baseline_y - self.x_height_or_default()
    }

    /// Canvas y coordinate of the ascender line
    pub fn ascender_line_y(&self) -> f64 {
        self.baseline_y - self.ascender_or_default()
    }

    /// Canvas y coordinate of the descender line
    pub fn descender_line_y(&self) -> f64 {
        self.baseline_y - self.descender_or_default()
    }
}
