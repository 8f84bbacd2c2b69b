//! Bevy integration for the positioning session
//!
//! The host UI sends [`PositioningCommand`] events; a system applies them
//! to the session and reports back through [`PositioningNotification`]
//! events, including persistence failures the UI must surface.

use super::context::{PositioningContext, PositioningSettings};
use super::session::{LinkChange, PositioningSession};
use crate::core::errors::PositioningError;
use crate::data::project::{MemoryPersistence, Project, ProjectPersistence};
use crate::font_source::Bearings;
use crate::geometry::axis_lock_delta;
use bevy::prelude::*;
use kurbo::Vec2;

/// The project being positioned
#[derive(Resource, Debug, Default)]
pub struct PositioningProject(pub Project);

/// The editing session for the active pair
#[derive(Resource, Debug, Default)]
pub struct ActivePositioningSession(pub PositioningSession);

impl ActivePositioningSession {
    pub fn with_settings(settings: PositioningSettings) -> Self {
        Self(PositioningSession::new(settings))
    }
}

/// Where snapshots are persisted
#[derive(Resource)]
pub struct PositioningStore(pub Box<dyn ProjectPersistence + Send + Sync>);

impl Default for PositioningStore {
    fn default() -> Self {
        Self(Box::new(MemoryPersistence::default()))
    }
}

/// Requests from the host UI
#[derive(Event, Debug, Clone, PartialEq)]
pub enum PositioningCommand {
    SelectPair { base: String, mark: String },
    Drag { delta: Vec2, axis_lock: bool },
    SetOffset { offset: Vec2 },
    SetBearings { bearings: Bearings },
    Save,
    ToggleLink,
    Reset,
}

/// Outcomes reported back to the host UI
#[derive(Event, Debug, Clone, PartialEq)]
pub enum PositioningNotification {
    PairLoaded { pair: String, offset: Vec2, editable: bool },
    PairNotFound { base: String, mark: String },
    Saved { pair: String, propagated: usize },
    LinkChanged { pair: String, linked: bool },
    Reset { pair: String },
    Failed { message: String },
}

fn apply_command(
    command: &PositioningCommand,
    project: &mut Project,
    session: &mut PositioningSession,
    persistence: &mut dyn ProjectPersistence,
    now: f64,
) -> Result<Option<PositioningNotification>, PositioningError> {
    match command {
        PositioningCommand::SelectPair { base, mark } => {
            let settings = session.settings().clone();
            let ctx = PositioningContext::new(project, &settings);
            let Some(pair) = ctx.pair(base, mark) else {
                return Ok(Some(PositioningNotification::PairNotFound {
                    base: base.clone(),
                    mark: mark.clone(),
                }));
            };
            let label = pair.to_string();
            session.load(&ctx, pair)?;
            Ok(Some(PositioningNotification::PairLoaded {
                pair: label,
                offset: session.current_offset().unwrap_or(Vec2::ZERO),
                editable: session.can_edit(),
            }))
        }
        PositioningCommand::Drag { delta, axis_lock } => {
            let delta = if *axis_lock {
                axis_lock_delta(*delta)
            } else {
                *delta
            };
            session.drag(delta, now)?;
            Ok(None)
        }
        PositioningCommand::SetOffset { offset } => {
            session.set_offset(*offset, now)?;
            Ok(None)
        }
        PositioningCommand::SetBearings { bearings } => {
            session.set_bearings(*bearings, now)?;
            Ok(None)
        }
        PositioningCommand::Save => {
            let report = session.save(project, persistence)?;
            Ok(Some(PositioningNotification::Saved {
                pair: report.pair.to_string(),
                propagated: report.propagated.len(),
            }))
        }
        PositioningCommand::ToggleLink => {
            let linked = matches!(
                session.toggle_link(project, persistence)?,
                LinkChange::Relinked { .. }
            );
            Ok(Some(PositioningNotification::LinkChanged {
                pair: session.pair().map(ToString::to_string).unwrap_or_default(),
                linked,
            }))
        }
        PositioningCommand::Reset => {
            session.reset(project, persistence)?;
            Ok(Some(PositioningNotification::Reset {
                pair: session.pair().map(ToString::to_string).unwrap_or_default(),
            }))
        }
    }
}

/// System applying positioning commands in arrival order
pub fn handle_positioning_commands(
    mut commands: EventReader<PositioningCommand>,
    mut notifications: EventWriter<PositioningNotification>,
    mut project: ResMut<PositioningProject>,
    mut session: ResMut<ActivePositioningSession>,
    mut store: ResMut<PositioningStore>,
    time: Res<Time>,
) {
    let now = time.elapsed_secs_f64();
    for command in commands.read() {
        debug!("PositioningCommand received: {:?}", command);
        match apply_command(command, &mut project.0, &mut session.0, store.0.as_mut(), now) {
            Ok(Some(notification)) => {
                notifications.write(notification);
            }
            Ok(None) => {}
            Err(error) => {
                warn!("Positioning command {:?} failed: {}", command, error);
                notifications.write(PositioningNotification::Failed {
                    message: error.to_string(),
                });
            }
        }
    }
}

/// System saving the active pair once drag edits have been idle long enough
pub fn autosave_positioning(
    mut notifications: EventWriter<PositioningNotification>,
    mut project: ResMut<PositioningProject>,
    mut session: ResMut<ActivePositioningSession>,
    mut store: ResMut<PositioningStore>,
    time: Res<Time>,
) {
    if !session.0.autosave_due(time.elapsed_secs_f64()) {
        return;
    }
    match session.0.save(&mut project.0, store.0.as_mut()) {
        Ok(report) => {
            debug!("Autosaved {}", report.pair);
            notifications.write(PositioningNotification::Saved {
                pair: report.pair.to_string(),
                propagated: report.propagated.len(),
            });
        }
        Err(error) => {
            notifications.write(PositioningNotification::Failed {
                message: error.to_string(),
            });
        }
    }
}

/// Plugin wiring the positioning session into a Bevy app
pub struct MarkPositioningPlugin;

impl Plugin for MarkPositioningPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<Time>()
            .init_resource::<PositioningProject>()
            .init_resource::<ActivePositioningSession>()
            .init_resource::<PositioningStore>()
            .add_event::<PositioningCommand>()
            .add_event::<PositioningNotification>()
            .add_systems(
                Update,
                (handle_positioning_commands, autosave_positioning).chain(),
            );
    }
}
