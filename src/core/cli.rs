//! Command line interface for the mark positioning tool
//!
//! Handles parsing command line arguments and provides
//! validation for user inputs. Many CLI options are documented with
//! examples to help users understand the expected format.

use crate::core::config_file::ConfigFile;
use crate::positioning::PositioningSettings;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::debug;

/// bezy-marks CLI arguments
///
/// Examples:
///   bezy-marks --project script.json offsets
///   bezy-marks --project script.json pair --base n --mark tilde
///   bezy-marks --project script.json --ufo MyFont.ufo validate
///   bezy-marks --new-config
#[derive(Parser, Debug, Clone, PartialEq)]
#[clap(
    name = "bezy-marks",
    version,
    about = "Mark attachment positioning for font sources",
    long_about = "bezy-marks resolves where combining marks sit on their bases: it computes default offsets from attachment rules and glyph geometry, keeps attachment classes in sync, and reports or validates a project's positioning data."
)]
pub struct CliArgs {
    /// Path to a project JSON file
    #[clap(
        long = "project",
        short = 'p',
        help = "Project file to read (JSON)",
        long_help = "Path to a project JSON file holding character sets, groups, glyph outlines, attachment rules, attachment classes and the mark positioning map."
    )]
    pub project: Option<PathBuf>,

    /// UFO whose default layer supplies glyph outlines
    #[clap(
        long = "ufo",
        short = 'u',
        help = "UFO source for glyph outlines",
        long_help = "Path to a UFO directory. Outlines from its default layer replace the project's glyphs, keyed by each glyph's first codepoint."
    )]
    pub ufo: Option<PathBuf>,

    /// Stroke width used when measuring glyphs
    #[clap(long = "stroke", help = "Stroke thickness used for bounding boxes")]
    pub stroke: Option<f64>,

    #[clap(long = "verbose", short = 'v', help = "Enable debug logging")]
    pub verbose: bool,

    #[clap(long = "log-file", help = "Also write logs to the config logs directory")]
    pub log_file: bool,

    /// Initialize user configuration directory with default settings
    #[clap(
        long = "new-config",
        help = "Initialize user config directory with settings",
        long_help = "Initialize the ~/.config/bezy-marks directory with a settings.json file containing the default settings and a logs directory."
    )]
    pub new_config: bool,

    #[clap(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Print every positioning pair with its effective offset
    Offsets,
    /// Explain how one base/mark pair is positioned
    Pair {
        #[clap(long)]
        base: String,
        #[clap(long)]
        mark: String,
    },
    /// Initialize the user config directory
    NewConfig,
    /// Check attachment rules for invalid anchor names
    Validate,
}

impl CliArgs {
    /// Validate the CLI arguments after parsing
    ///
    /// This ensures that all paths exist and are valid before the application starts,
    /// providing clear error messages for common mistakes.
    pub fn validate(&self) -> Result<(), String> {
        if let Some(path) = &self.project {
            if !path.is_file() {
                return Err(format!(
                    "Project file does not exist: {}\nMake sure the path is correct and the file exists.",
                    path.display()
                ));
            }
        }

        if let Some(path) = &self.ufo {
            if !path.is_dir() {
                return Err(format!(
                    "UFO source does not exist: {}\nA UFO is a directory ending in .ufo.",
                    path.display()
                ));
            }
            if !path.join("metainfo.plist").exists() {
                return Err(format!(
                    "Not a valid UFO directory: missing metainfo.plist in {}\nMake sure this is a valid UFO directory.",
                    path.display()
                ));
            }
        }

        if let Some(stroke) = self.stroke {
            if !stroke.is_finite() || stroke < 0.0 {
                return Err(format!("Stroke thickness must be a non-negative number, got {stroke}"));
            }
        }

        let needs_project = matches!(
            self.command,
            Some(Command::Offsets | Command::Pair { .. } | Command::Validate)
        );
        if needs_project && self.project.is_none() {
            return Err("This command needs a project: pass --project <file>".to_string());
        }

        Ok(())
    }

    /// Whether the config directory should be initialized
    pub fn wants_new_config(&self) -> bool {
        self.new_config || self.command == Some(Command::NewConfig)
    }

    /// Positioning settings from CLI args, config file, or defaults
    ///
    /// Priority order:
    /// 1. CLI argument (--stroke)
    /// 2. Config file setting (~/.config/bezy-marks/settings.json)
    /// 3. Built-in defaults
    pub fn positioning_settings(&self, config: Option<&ConfigFile>) -> PositioningSettings {
        let mut settings = config.map(ConfigFile::to_settings).unwrap_or_default();
        if let Some(stroke) = self.stroke {
            debug!("Using stroke thickness from CLI: {}", stroke);
            settings.stroke_thickness = stroke;
        }
        settings
    }

    /// Whether logs should also go to a file
    pub fn log_to_file(&self, config: Option<&ConfigFile>) -> bool {
        self.log_file || config.and_then(|config| config.log_to_file).unwrap_or(false)
    }
}
