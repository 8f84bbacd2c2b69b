#![allow(clippy::assertions_on_constants)]

/// A small latin project shared by the positioning tests.
///
/// With a zero stroke and the fallback rule the default offsets are:
/// n+tilde (150, -40), n+macron (100, -50), m+tilde (250, -40),
/// m+macron (200, -50).
#[cfg(test)]
pub(crate) mod fixtures {
    use crate::data::project::Project;
    use crate::font_source::{Character, CharacterSet, GlyphClass, GlyphData, GlyphPath};
    use crate::positioning::classes::{AttachmentClass, ClassKind};
    use crate::positioning::context::{PositioningContext, PositioningSettings};
    use crate::positioning::rules::PositioningRule;
    use crate::positioning::session::PositioningSession;
    use kurbo::Point;

    pub const N: u32 = 0x6E;
    pub const M: u32 = 0x6D;
    pub const TILDE: u32 = 0x303;
    pub const MACRON: u32 = 0x304;
    pub const N_TILDE: u32 = 0xE000;
    pub const N_MACRON: u32 = 0xE001;
    pub const M_TILDE: u32 = 0xE002;
    pub const M_MACRON: u32 = 0xE003;

    pub fn rect(width: f64, height: f64) -> GlyphData {
        GlyphData::new(vec![GlyphPath::new(vec![
            Point::new(0.0, 0.0),
            Point::new(width, 0.0),
            Point::new(width, height),
            Point::new(0.0, height),
        ])])
    }

    pub fn settings() -> PositioningSettings {
        PositioningSettings {
            stroke_thickness: 0.0,
            use_metrics: false,
            ..Default::default()
        }
    }

    pub fn project() -> Project {
        let mut project = Project::default();
        project.character_sets.push(CharacterSet {
            name: "latin".to_string(),
            characters: vec![
                Character::new("n", N).with_class(GlyphClass::Base),
                Character::new("m", M).with_class(GlyphClass::Base),
                Character::new("tilde", TILDE).with_class(GlyphClass::Mark),
                Character::new("macron", MACRON).with_class(GlyphClass::Mark),
                Character::new("n-tilde", N_TILDE).composed_of("n", "tilde"),
                Character::new("n-macron", N_MACRON).composed_of("n", "macron"),
                Character::new("m-tilde", M_TILDE).composed_of("m", "tilde"),
                Character::new("m-macron", M_MACRON).composed_of("m", "macron"),
            ],
        });
        project
            .groups
            .insert("above".to_string(), vec!["tilde".to_string(), "macron".to_string()]);
        project.glyphs.insert(N, rect(400.0, 500.0));
        project.glyphs.insert(M, rect(600.0, 500.0));
        project.glyphs.insert(TILDE, rect(100.0, 40.0));
        project.glyphs.insert(MACRON, rect(200.0, 50.0));
        project.mark_classes.push(AttachmentClass::new(
            "above",
            ClassKind::Mark,
            vec!["@above".to_string()],
        ));
        project.positioning_rules.push(PositioningRule {
            base: vec!["$base".to_string()],
            mark: vec!["@above".to_string()],
            ..Default::default()
        });
        project
    }

    /// Load `base` + `mark` into `session`, panicking if the pair is unknown
    pub fn load(session: &mut PositioningSession, project: &Project, base: &str, mark: &str) {
        let settings = session.settings().clone();
        let ctx = PositioningContext::new(project, &settings);
        let pair = ctx.pair(base, mark).expect("pair should be registered");
        session.load(&ctx, pair).expect("pair should load");
    }
}

#[cfg(test)]
mod offset_tests {
    use super::fixtures::{self, M, MACRON, N, TILDE};
    use crate::geometry::bounding_box;
    use crate::positioning::classes::{AttachmentClass, ClassKind};
    use crate::positioning::context::{OffsetSource, PositioningContext};
    use crate::positioning::pair::PositionKey;
    use kurbo::Vec2;

    #[test]
    fn test_pairs_follow_rule_expansion_order() {
        let project = fixtures::project();
        let settings = fixtures::settings();
        let ctx = PositioningContext::new(&project, &settings);

        let names: Vec<String> = ctx.pairs().iter().map(|pair| pair.name_key()).collect();
        assert_eq!(names, vec!["n-tilde", "n-macron", "m-tilde", "m-macron"]);
    }

    #[test]
    fn test_manual_entry_always_wins() {
        let mut project = fixtures::project();
        project
            .mark_positioning
            .insert(PositionKey::new(N, TILDE), Vec2::new(170.0, -60.0));
        project
            .mark_positioning
            .insert(PositionKey::new(N, MACRON), Vec2::new(-3.0, 4.0));
        let settings = fixtures::settings();
        let ctx = PositioningContext::new(&project, &settings);

        let macron = ctx.pair("n", "macron").unwrap();
        let effective = ctx.effective_offset(&macron).unwrap();
        assert_eq!(effective.offset, Vec2::new(-3.0, 4.0));
        assert_eq!(effective.default, Vec2::new(100.0, -50.0));
        assert_eq!(effective.source, OffsetSource::Manual);
    }

    #[test]
    fn test_linked_follower_takes_leader_delta() {
        let mut project = fixtures::project();
        project
            .mark_positioning
            .insert(PositionKey::new(N, TILDE), Vec2::new(160.0, -45.0));
        let settings = fixtures::settings();
        let ctx = PositioningContext::new(&project, &settings);

        let macron = ctx.pair("n", "macron").unwrap();
        let effective = ctx.effective_offset(&macron).unwrap();
        assert_eq!(effective.offset, Vec2::new(110.0, -55.0));
        assert_eq!(effective.anchor_delta(), Vec2::new(10.0, -5.0));
        assert_eq!(
            effective.source,
            OffsetSource::Class {
                leader: "tilde".to_string()
            }
        );

        // The leader's delta is per counterpart
        let m_macron = ctx.pair("m", "macron").unwrap();
        assert_eq!(ctx.effective_offset(&m_macron).unwrap().source, OffsetSource::Default);
    }

    #[test]
    fn test_empty_class_falls_through_to_default() {
        let mut project = fixtures::project();
        project.mark_classes = vec![AttachmentClass::new(
            "ghost",
            ClassKind::Mark,
            vec!["@missing".to_string()],
        )];
        project
            .mark_positioning
            .insert(PositionKey::new(N, TILDE), Vec2::new(160.0, -45.0));
        let settings = fixtures::settings();
        let ctx = PositioningContext::new(&project, &settings);

        let macron = ctx.pair("n", "macron").unwrap();
        assert!(ctx.class_for(&macron).is_none());
        let effective = ctx.effective_offset(&macron).unwrap();
        assert_eq!(effective.source, OffsetSource::Default);
        assert_eq!(effective.offset, Vec2::new(100.0, -50.0));
    }

    #[test]
    fn test_stale_map_entries_are_ignored() {
        let mut project = fixtures::project();
        project
            .mark_positioning
            .insert(PositionKey::new(0x10FFFF, 0x10FFFE), Vec2::new(1.0, 1.0));
        let settings = fixtures::settings();
        let ctx = PositioningContext::new(&project, &settings);

        assert!(ctx.pair("gone", "tilde").is_none());
        let m_tilde = ctx.pair("m", "tilde").unwrap();
        assert_eq!(ctx.effective_offset(&m_tilde).unwrap().offset, Vec2::new(250.0, -40.0));
    }

    #[test]
    fn test_undrawn_base_defaults_to_zero() {
        let mut project = fixtures::project();
        project.glyphs.remove(&M);
        let settings = fixtures::settings();
        let ctx = PositioningContext::new(&project, &settings);

        let m_tilde = ctx.pair("m", "tilde").unwrap();
        assert!(!ctx.pair_is_drawn(&m_tilde));
        assert_eq!(ctx.default_offset(&m_tilde), Ok(Vec2::ZERO));
        assert!(bounding_box(&[], 8.0).is_none());
    }
}

#[cfg(test)]
mod class_tests {
    use super::fixtures;
    use crate::positioning::classes::{effective_leader, is_linked, toggle_link};
    use crate::positioning::context::PositioningContext;

    #[test]
    fn test_leader_is_never_excepted() {
        let project = fixtures::project();
        let settings = fixtures::settings();
        let ctx = PositioningContext::new(&project, &settings);
        let class = &project.mark_classes[0];
        let pairs = ctx.pairs();

        // Every subset of excepted pairs
        for mask in 0..(1u32 << pairs.len()) {
            let mut excepted = class.clone();
            for (index, pair) in pairs.iter().enumerate() {
                if mask & (1 << index) != 0 {
                    excepted = toggle_link(pair, &excepted);
                }
            }
            for counterpart in ["n", "m"] {
                let leader = effective_leader(&excepted, counterpart, ctx.expander());
                let linked: Vec<_> = pairs
                    .iter()
                    .filter(|pair| pair.base.name == counterpart && is_linked(pair, &excepted))
                    .collect();
                match leader {
                    Some(leader) => {
                        let leader_pair = ctx.pair(counterpart, &leader).unwrap();
                        assert!(is_linked(&leader_pair, &excepted));
                    }
                    None => assert!(linked.is_empty()),
                }
            }
        }
    }
}

#[cfg(test)]
mod base_class_tests {
    use super::fixtures::{self, M, N, TILDE};
    use crate::data::project::{MemoryPersistence, Project};
    use crate::positioning::classes::{AttachmentClass, ClassKind};
    use crate::positioning::context::{OffsetSource, PositioningContext};
    use crate::positioning::pair::PositionKey;
    use crate::positioning::session::{LinkChange, PositioningSession};
    use kurbo::Vec2;

    /// n and m share one position for each mark
    fn project() -> Project {
        let mut project = fixtures::project();
        project.mark_classes.clear();
        project.base_classes.push(AttachmentClass::new(
            "stems",
            ClassKind::Base,
            vec!["n".to_string(), "m".to_string()],
        ));
        project
    }

    #[test]
    fn test_base_leader_syncs_other_bases() {
        let mut project = project();
        project
            .mark_positioning
            .insert(PositionKey::new(N, TILDE), Vec2::new(160.0, -30.0));
        let settings = fixtures::settings();
        let ctx = PositioningContext::new(&project, &settings);

        let m_tilde = ctx.pair("m", "tilde").unwrap();
        let class = ctx.class_for(&m_tilde).unwrap();
        assert_eq!(class.kind, ClassKind::Base);
        let leader = ctx.sync_leader(&m_tilde, class).unwrap();
        assert_eq!(leader.name_key(), "n-tilde");

        let effective = ctx.effective_offset(&m_tilde).unwrap();
        assert_eq!(effective.offset, Vec2::new(260.0, -30.0));
        assert_eq!(
            effective.source,
            OffsetSource::Class {
                leader: "n".to_string()
            }
        );

        // Macron pairs have their own leader, which has nothing stored
        let m_macron = ctx.pair("m", "macron").unwrap();
        assert_eq!(ctx.effective_offset(&m_macron).unwrap().source, OffsetSource::Default);
    }

    #[test]
    fn test_base_leader_save_reaches_other_bases() {
        let mut project = project();
        let mut persistence = MemoryPersistence::default();
        let mut session = PositioningSession::new(fixtures::settings());

        fixtures::load(&mut session, &project, "m", "tilde");
        assert!(session.is_linked());
        assert!(!session.can_edit());

        fixtures::load(&mut session, &project, "n", "tilde");
        assert!(session.is_leader());
        session.drag(Vec2::new(0.0, -8.0), 1.0).unwrap();
        let report = session.save(&mut project, &mut persistence).unwrap();

        let propagated: Vec<_> = report.propagated.iter().map(|pair| pair.name_key()).collect();
        assert_eq!(propagated, vec!["m-tilde"]);
        assert_eq!(
            project.mark_positioning.get(PositionKey::new(M, TILDE)),
            Some(Vec2::new(250.0, -48.0))
        );
        assert_eq!(project.mark_positioning.len(), 2);
    }

    #[test]
    fn test_base_relink_takes_current_leader_delta() {
        let mut project = project();
        project
            .mark_positioning
            .insert(PositionKey::new(N, TILDE), Vec2::new(160.0, -30.0));
        let mut persistence = MemoryPersistence::default();
        let mut session = PositioningSession::new(fixtures::settings());

        fixtures::load(&mut session, &project, "m", "tilde");
        assert_eq!(
            session.toggle_link(&mut project, &mut persistence).unwrap(),
            LinkChange::Unlinked
        );
        assert!(project.base_classes[0].except_pairs.contains("m-tilde"));
        assert_eq!(
            project.mark_positioning.get(PositionKey::new(M, TILDE)),
            Some(Vec2::new(260.0, -30.0))
        );

        // The leader moves while m-tilde is unlinked
        fixtures::load(&mut session, &project, "n", "tilde");
        session.drag(Vec2::new(0.0, -20.0), 1.0).unwrap();
        let report = session.save(&mut project, &mut persistence).unwrap();
        assert!(report.propagated.is_empty());

        fixtures::load(&mut session, &project, "m", "tilde");
        assert!(session.can_edit());
        let change = session.toggle_link(&mut project, &mut persistence).unwrap();
        let LinkChange::Relinked { offset, .. } = change else {
            panic!("expected a relink");
        };
        assert_eq!(offset, Vec2::new(260.0, -50.0));
        assert_eq!(
            project.mark_positioning.get(PositionKey::new(M, TILDE)),
            Some(Vec2::new(260.0, -50.0))
        );
        assert!(project.base_classes[0].except_pairs.is_empty());
        assert!(!session.can_edit());
    }
}

#[cfg(test)]
mod persistence_tests {
    use super::fixtures::{self, N, N_TILDE, TILDE};
    use crate::data::project::{JsonFilePersistence, Project};
    use crate::positioning::pair::PositionKey;
    use crate::positioning::session::PositioningSession;
    use kurbo::Vec2;

    #[test]
    fn test_saved_edit_reaches_project_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("project.json");
        let mut project = fixtures::project();
        project.save(&path).unwrap();
        let mut persistence = JsonFilePersistence::new(&path, &project);

        let mut session = PositioningSession::new(fixtures::settings());
        fixtures::load(&mut session, &project, "n", "tilde");
        session.drag(Vec2::new(12.0, -6.0), 1.0).unwrap();
        session.save(&mut project, &mut persistence).unwrap();

        let written = Project::load(&path).unwrap();
        assert_eq!(
            written.mark_positioning.get(PositionKey::new(N, TILDE)),
            Some(Vec2::new(162.0, -46.0))
        );
        assert!(written.glyphs.contains_key(&N_TILDE));
        assert_eq!(written, project);
    }
}

#[cfg(test)]
mod plugin_tests {
    use super::fixtures;
    use crate::positioning::plugin::{
        ActivePositioningSession, MarkPositioningPlugin, PositioningCommand,
        PositioningNotification, PositioningProject,
    };
    use bevy::app::App;
    use bevy::ecs::event::Events;
    use kurbo::Vec2;

    fn app() -> App {
        let mut app = App::new();
        app.add_plugins(MarkPositioningPlugin);
        app.insert_resource(PositioningProject(fixtures::project()));
        app.insert_resource(ActivePositioningSession::with_settings(fixtures::settings()));
        app
    }

    fn notifications(app: &App) -> Vec<PositioningNotification> {
        app.world()
            .resource::<Events<PositioningNotification>>()
            .iter_current_update_events()
            .cloned()
            .collect()
    }

    #[test]
    fn test_select_drag_and_save() {
        let mut app = app();
        app.world_mut().send_event(PositioningCommand::SelectPair {
            base: "n".to_string(),
            mark: "tilde".to_string(),
        });
        app.update();
        assert_eq!(
            notifications(&app),
            vec![PositioningNotification::PairLoaded {
                pair: "n + tilde".to_string(),
                offset: Vec2::new(150.0, -40.0),
                editable: true,
            }]
        );

        app.world_mut().send_event(PositioningCommand::Drag {
            delta: Vec2::new(8.0, 3.0),
            axis_lock: true,
        });
        app.world_mut().send_event(PositioningCommand::Save);
        app.update();
        assert_eq!(
            notifications(&app),
            vec![PositioningNotification::Saved {
                pair: "n + tilde".to_string(),
                propagated: 1,
            }]
        );

        let session = &app.world().resource::<ActivePositioningSession>().0;
        assert_eq!(session.current_offset(), Some(Vec2::new(158.0, -40.0)));
    }

    #[test]
    fn test_follower_edit_reports_failure() {
        let mut app = app();
        app.world_mut().send_event(PositioningCommand::SelectPair {
            base: "n".to_string(),
            mark: "macron".to_string(),
        });
        app.world_mut().send_event(PositioningCommand::Drag {
            delta: Vec2::new(1.0, 0.0),
            axis_lock: false,
        });
        app.world_mut().send_event(PositioningCommand::Save);
        app.update();

        let sent = notifications(&app);
        assert_eq!(sent.len(), 3);
        assert!(matches!(
            sent[0],
            PositioningNotification::PairLoaded { editable: false, .. }
        ));
        assert!(matches!(sent[1], PositioningNotification::Failed { .. }));
        assert!(matches!(sent[2], PositioningNotification::Failed { .. }));
        assert!(app
            .world()
            .resource::<PositioningProject>()
            .0
            .mark_positioning
            .is_empty());
    }

    #[test]
    fn test_unknown_pair_is_reported() {
        let mut app = app();
        app.world_mut().send_event(PositioningCommand::SelectPair {
            base: "q".to_string(),
            mark: "tilde".to_string(),
        });
        app.update();
        assert_eq!(
            notifications(&app),
            vec![PositioningNotification::PairNotFound {
                base: "q".to_string(),
                mark: "tilde".to_string(),
            }]
        );
    }
}

#[cfg(test)]
mod ufo_tests {
    use crate::data::ufo;

    #[test]
    #[ignore = "Requires a UFO source provided through TEST_UFO_PATH"]
    fn test_load_ufo_from_path() {
        let test_path = std::env::var("TEST_UFO_PATH")
            .unwrap_or_else(|_| "path/to/test.ufo".to_string());

        if !std::path::Path::new(&test_path).exists() {
            println!("Test UFO not found at {}, skipping test", test_path);
            return;
        }

        let font = ufo::load_ufo_from_path(&test_path).expect("Failed to load UFO file");
        let glyphs = ufo::glyphs_by_unicode(&font);
        assert!(!glyphs.is_empty(), "UFO should have encoded glyphs");
    }
}
