//! Application runner logic
//!
//! Handles the different ways to run bezy-marks

use crate::core::cli::{CliArgs, Command};
use crate::core::config_file::ConfigFile;
use crate::core::errors::PositioningError;
use crate::data::project::Project;
use crate::data::ufo;
use crate::geometry::AnchorPoint;
use crate::logging;
use crate::positioning::classes::is_linked;
use crate::positioning::rules::{find_positioning_rule, resolve_rule};
use crate::positioning::{OffsetSource, PositioningContext, PositioningSettings};
use anyhow::{bail, Result};
use kurbo::Vec2;
use std::io::Write;
use tracing::{info, warn};

/// Create and run the application with the given CLI arguments.
/// Handles special CLI flags and delegates to the selected command.
pub fn run_app(cli_args: CliArgs) -> Result<()> {
    if cli_args.wants_new_config() {
        return ConfigFile::initialize_config_directory();
    }

    cli_args.validate().map_err(anyhow::Error::msg)?;
    let config = ConfigFile::load();
    let _log_guard = logging::init(cli_args.verbose, cli_args.log_to_file(config.as_ref()))?;
    let settings = cli_args.positioning_settings(config.as_ref());

    let Some(project_path) = &cli_args.project else {
        bail!("No project given. Pass --project <file> followed by a command.");
    };
    let mut project = Project::load(project_path)?;
    if let Some(ufo_path) = &cli_args.ufo {
        let font = ufo::load_ufo_from_path(ufo_path)?;
        ufo::overlay_ufo(&mut project, &font);
    }

    let mut out = std::io::stdout().lock();
    match cli_args.command.unwrap_or(Command::Offsets) {
        Command::Offsets => write_offsets(&project, &settings, &mut out),
        Command::Pair { base, mark } => write_pair(&project, &settings, &base, &mark, &mut out),
        Command::Validate => {
            let problems = validate_project(&project);
            for problem in &problems {
                writeln!(out, "{problem}")?;
            }
            if problems.is_empty() {
                writeln!(out, "No configuration errors found")?;
                Ok(())
            } else {
                bail!("{} configuration error(s) found", problems.len())
            }
        }
        Command::NewConfig => ConfigFile::initialize_config_directory(),
    }
}

fn format_offset(offset: Vec2) -> String {
    format!("({:.1}, {:.1})", offset.x, offset.y)
}

fn source_label(source: &OffsetSource) -> String {
    match source {
        OffsetSource::Manual => "manual".to_string(),
        OffsetSource::Class { leader } => format!("class ({leader})"),
        OffsetSource::Default => "default".to_string(),
    }
}

/// One line per positioning pair: key, effective offset and its source
pub fn write_offsets(
    project: &Project,
    settings: &PositioningSettings,
    out: &mut impl Write,
) -> Result<()> {
    let ctx = PositioningContext::new(project, settings);
    let pairs = ctx.pairs();
    info!("Resolving {} positioning pairs", pairs.len());
    for pair in pairs {
        let effective = ctx.effective_offset(&pair)?;
        writeln!(
            out,
            "{}\t{}\t{}",
            pair.name_key(),
            format_offset(effective.offset),
            source_label(&effective.source)
        )?;
    }
    Ok(())
}

/// Explain how `base` + `mark` is positioned
pub fn write_pair(
    project: &Project,
    settings: &PositioningSettings,
    base: &str,
    mark: &str,
    out: &mut impl Write,
) -> Result<()> {
    let ctx = PositioningContext::new(project, settings);
    for name in [base, mark] {
        if ctx.characters().by_name(name).is_none() {
            return Err(PositioningError::CharacterNotFound(name.to_string()).into());
        }
    }
    let Some(pair) = ctx.pair(base, mark) else {
        bail!("No ligature is composed of '{base}' and '{mark}'");
    };

    writeln!(
        out,
        "{} (U+{:04X} U+{:04X} -> {} U+{:04X})",
        pair, pair.base.unicode, pair.mark.unicode, pair.ligature.name, pair.ligature.unicode
    )?;

    let rule = resolve_rule(base, mark, &project.attachment_rules, ctx.expander());
    match &rule {
        Some(rule) => writeln!(out, "  rule: {rule}")?,
        None => writeln!(out, "  rule: none, using topCenter -> bottomCenter")?,
    }

    let positioning = find_positioning_rule(base, mark, &project.positioning_rules, ctx.expander());
    let movement = positioning
        .and_then(|rule| rule.movement)
        .map(|movement| format!("{movement:?}").to_lowercase())
        .unwrap_or_else(|| "free".to_string());
    writeln!(out, "  movement: {movement}")?;
    if let Some(gsub) = positioning.and_then(|rule| rule.gsub.as_deref()) {
        writeln!(out, "  gsub: {gsub}")?;
    }
    if !ctx.pair_is_drawn(&pair) {
        writeln!(out, "  not drawn: offsets default to zero")?;
    }

    match ctx.class_for(&pair) {
        Some(class) => {
            let status = if is_linked(&pair, class) { "linked" } else { "unlinked" };
            let leader = ctx
                .sync_leader(&pair, class)
                .map(|leader| class.member_of(&leader).to_string())
                .unwrap_or_else(|| "none".to_string());
            writeln!(
                out,
                "  class: {} ({:?}), {}, leader {}",
                class.name, class.kind, status, leader
            )?;
        }
        None => writeln!(out, "  class: none")?,
    }

    let effective = ctx.effective_offset(&pair)?;
    writeln!(out, "  default offset: {}", format_offset(effective.default))?;
    writeln!(
        out,
        "  effective offset: {} from {}",
        format_offset(effective.offset),
        source_label(&effective.source)
    )?;
    Ok(())
}

/// Configuration problems that would make positioning fail: invalid anchor
/// names in attachment rules. Classes that match nothing are only logged.
pub fn validate_project(project: &Project) -> Vec<String> {
    let mut problems = Vec::new();
    for (index, rule) in project.attachment_rules.iter().enumerate() {
        for name in [&rule.base_point, &rule.mark_point] {
            if let Err(error) = name.parse::<AnchorPoint>() {
                problems.push(format!("attachment rule {index}: {error}"));
            }
        }
    }

    let settings = PositioningSettings::default();
    let ctx = PositioningContext::new(project, &settings);
    for class in project.mark_classes.iter().chain(&project.base_classes) {
        if ctx.expander().expand(&class.members).is_empty() {
            warn!("Class '{}' has no members and is ignored", class.name);
        }
    }
    problems
}
