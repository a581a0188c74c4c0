use engine::{
    BuildKind, EngineError, FileStore, MemoryStore, RowCollection, Session, SessionConfig, Store,
};
use serde_json::json;

fn session() -> Session<MemoryStore> {
    Session::init(SessionConfig::default(), MemoryStore::new()).unwrap()
}

fn total(session: &Session<MemoryStore>, id: u32) -> f64 {
    session.totals(id).unwrap().total
}

#[test]
fn init_starts_with_one_default_build() {
    let session = session();
    assert_eq!(session.builds().len(), 1);
    assert!((total(&session, 1) - 4.5).abs() < 1e-9);
    assert!(!session.can_undo());
    assert_eq!(session.store().writes(), 0);
}

#[test]
fn edits_then_undos_restore_every_total() {
    let mut session = session();
    let edits = [
        ("meleePower", json!(50)),
        ("baseDice", json!("3d6")),
        ("sneakDice", json!(4)),
        ("threatRange", json!(3)),
        ("multiStrikePercent", json!(25)),
    ];
    let mut seen = vec![total(&session, 1)];
    for (path, value) in edits.iter().cloned() {
        seen.push(session.on_edit(1, path, value).unwrap().total);
    }

    for expected in seen.iter().rev().skip(1) {
        assert!(session.undo().unwrap());
        assert_eq!(total(&session, 1).to_bits(), expected.to_bits());
    }
    assert!(!session.undo().unwrap());

    for expected in seen.iter().skip(1) {
        assert!(session.redo().unwrap());
        assert_eq!(total(&session, 1).to_bits(), expected.to_bits());
    }
    assert!(!session.redo().unwrap());
}

#[test]
fn unchanged_value_is_not_recorded() {
    let mut session = session();
    session.on_edit(1, "baseDice", json!("1d8")).unwrap();
    assert!(!session.can_undo());
}

#[test]
fn new_edit_discards_redo() {
    let mut session = session();
    session.on_edit(1, "meleePower", json!(10)).unwrap();
    session.undo().unwrap();
    assert!(session.can_redo());
    session.on_edit(1, "meleePower", json!(20)).unwrap();
    assert!(!session.can_redo());
}

#[test]
fn every_change_and_replay_persists_once() {
    let mut session = session();
    session.on_edit(1, "meleePower", json!(10)).unwrap();
    session.on_edit(1, "meleePower", json!(20)).unwrap();
    assert_eq!(session.store().writes(), 2);
    session.undo().unwrap();
    session.undo().unwrap();
    assert_eq!(session.store().writes(), 4);
    session.redo().unwrap();
    assert_eq!(session.store().writes(), 5);
    session.redo().unwrap();
    // empty redo stack: no write
    assert!(!session.redo().unwrap());
    assert_eq!(session.store().writes(), 6);
}

#[test]
fn persisted_payload_matches_current_state() {
    let mut session = session();
    session.on_edit(1, "meleePower", json!(75)).unwrap();
    let stored = session.store().get("builds").unwrap().to_string();
    assert_eq!(stored, session.export_json().unwrap());
}

#[test]
fn undo_remove_restores_position_and_state() {
    let mut session = session();
    session.add_build(BuildKind::Spell).unwrap();
    session.add_build(BuildKind::Weapon).unwrap();
    session.on_edit(2, "boosts.empowered", json!(true)).unwrap();
    session.rename(2, "Caster").unwrap();
    let before = session.builds().get(2).unwrap().clone();

    session.remove_build(2).unwrap();
    assert!(session.builds().get(2).is_err());
    session.undo().unwrap();
    assert_eq!(session.builds().position(2), Some(1));
    assert_eq!(session.builds().get(2).unwrap(), &before);

    session.redo().unwrap();
    assert!(session.builds().get(2).is_err());
}

#[test]
fn undo_add_removes_and_redo_recreates() {
    let mut session = session();
    let id = session.add_build(BuildKind::Spell).unwrap();
    assert_eq!(id, 2);
    session.undo().unwrap();
    assert_eq!(session.builds().len(), 1);
    session.redo().unwrap();
    assert_eq!(session.builds().get(2).unwrap().kind(), BuildKind::Spell);
}

#[test]
fn rename_is_undoable() {
    let mut session = session();
    session.rename(1, "Main").unwrap();
    assert_eq!(session.totals(1).unwrap().tab_name, "Main");
    session.undo().unwrap();
    assert_eq!(session.totals(1).unwrap().tab_name, "Build 1");
    session.redo().unwrap();
    assert_eq!(session.totals(1).unwrap().tab_name, "Main");
}

#[test]
fn row_changes_are_undoable() {
    let mut session = session();
    let key = session.add_row(1, RowCollection::DamageSources).unwrap();
    let path = format!("damageSources.{}.damage", key);
    let with_row = session.on_edit(1, &path, json!("10")).unwrap().total;
    assert!(with_row > 4.5);

    session.remove_row(1, RowCollection::DamageSources, key).unwrap();
    assert!((total(&session, 1) - 4.5).abs() < 1e-9);
    session.undo().unwrap();
    assert_eq!(total(&session, 1).to_bits(), with_row.to_bits());
    session.undo().unwrap();
    session.undo().unwrap();
    assert!(!session.can_undo());
    assert!(session.builds().field(1, "damageSources").unwrap().as_array().unwrap().is_empty());
}

#[test]
fn rows_need_the_matching_build_kind() {
    let mut session = session();
    assert!(matches!(
        session.add_row(1, RowCollection::SpellSources),
        Err(EngineError::WrongBuildKind { id: 1, expected: BuildKind::Spell })
    ));
    assert!(matches!(
        session.remove_row(1, RowCollection::DamageSources, 7),
        Err(EngineError::UnknownRow { .. })
    ));
    assert!(!session.can_undo());
}

#[test]
fn spell_profiles_are_undoable() {
    let mut session = session();
    let id = session.add_build(BuildKind::Spell).unwrap();
    let source = session.add_row(id, RowCollection::SpellSources).unwrap();
    session
        .add_row(id, RowCollection::AdditionalScalings { source })
        .unwrap();

    let profile = session.add_spell_profile(id).unwrap();
    assert_eq!(profile, 2);
    assert!(matches!(session.remove_spell_profile(id, 5), Err(EngineError::UnknownProfile(5))));
    session.remove_spell_profile(id, 1).unwrap();
    assert!(matches!(session.remove_spell_profile(id, 2), Err(EngineError::LastProfile)));

    session.undo().unwrap();
    let profiles = session.builds().field(id, "profiles").unwrap();
    assert_eq!(profiles.as_array().unwrap().len(), 2);
    assert!(matches!(session.add_spell_profile(1), Err(EngineError::WrongBuildKind { .. })));
}

#[test]
fn structural_limits_leave_history_alone() {
    let mut session = session();
    assert!(matches!(session.remove_build(1), Err(EngineError::LastBuild)));
    for _ in 0..5 {
        session.add_build(BuildKind::Weapon).unwrap();
    }
    assert!(matches!(session.add_build(BuildKind::Weapon), Err(EngineError::BuildLimit { max: 6 })));
    assert_eq!(session.builds().len(), 6);
}

#[test]
fn failed_edit_changes_nothing() {
    let mut session = session();
    let writes = session.store().writes();
    assert!(session.on_edit(1, "baseDice", json!([1, 2])).is_err());
    assert!(session.on_edit(7, "meleePower", json!(1)).is_err());
    assert!(!session.can_undo());
    assert_eq!(session.store().writes(), writes);
}

#[test]
fn spell_builds_keep_a_profile_through_edits() {
    let mut session = session();
    let id = session.add_build(BuildKind::Spell).unwrap();
    let before = session.builds().field(id, "profiles").unwrap();
    let writes = session.store().writes();
    assert!(matches!(session.on_edit(id, "profiles", json!([])), Err(EngineError::LastProfile)));
    assert_eq!(session.builds().field(id, "profiles").unwrap(), before);
    assert_eq!(session.store().writes(), writes);
}

#[test]
fn edits_cannot_leave_clashing_row_keys() {
    let mut session = session();
    session.add_row(1, RowCollection::DamageSources).unwrap();
    session.add_row(1, RowCollection::DamageSources).unwrap();
    let before = session.builds().field(1, "damageSources").unwrap();
    for (path, value) in [
        ("damageSources.2.id", json!(1)),
        ("damageSources.2.id", json!(0)),
        ("damageSources", json!([{"id": 3}, {"id": 3}])),
        ("damageSources", json!([{"damage": "1d6"}])),
    ] {
        assert!(
            matches!(session.on_edit(1, path, value), Err(EngineError::InvalidField { .. })),
            "{} was accepted",
            path
        );
    }
    assert_eq!(session.builds().field(1, "damageSources").unwrap(), before);
}

#[test]
fn adding_a_row_after_the_highest_possible_key_is_refused() {
    let mut session = session();
    session.on_edit(1, "damageSources", json!([{"id": u32::MAX}])).unwrap();
    assert!(matches!(
        session.add_row(1, RowCollection::DamageSources),
        Err(EngineError::InvalidField { .. })
    ));
    let rows = session.builds().field(1, "damageSources").unwrap();
    assert_eq!(rows.as_array().unwrap().len(), 1);
    session.undo().unwrap();
    assert!(!session.can_undo());
}

#[test]
fn imported_rows_get_unique_keys() {
    let mut session = session();
    let payload = json!([{
        "type": "weapon",
        "setId": 1,
        "damageSources": [
            {"id": 1, "damage": "10"},
            {"id": 1, "damage": "20"},
            {"damage": "30"},
            {"damage": "40"}
        ]
    }])
    .to_string();
    session.import_json(&payload).unwrap();
    let keys = |session: &Session<MemoryStore>| -> Vec<u64> {
        let rows = session.builds().field(1, "damageSources").unwrap();
        rows.as_array().unwrap().iter().map(|row| row["id"].as_u64().unwrap()).collect()
    };
    assert_eq!(keys(&session), vec![1, 2, 3, 4]);

    session.on_edit(1, "damageSources.2.damage", json!("25")).unwrap();
    assert_eq!(session.builds().field(1, "damageSources.1.damage").unwrap(), json!("10"));
    assert_eq!(session.builds().field(1, "damageSources.2.damage").unwrap(), json!("25"));

    session.remove_row(1, RowCollection::DamageSources, 1).unwrap();
    assert_eq!(keys(&session), vec![2, 3, 4]);
}

#[test]
fn imported_spell_builds_get_usable_profiles() {
    let mut session = session();
    let payload = json!([
        {"type": "spell", "setId": 1, "profiles": []},
        {
            "type": "spell",
            "setId": 2,
            "profiles": [{"id": 2, "label": "A"}, {"id": 2, "label": "B"}, {"id": 0, "label": "C"}],
            "sources": [{"additionalScalings": [{"id": 5}, {"id": 5}]}]
        }
    ])
    .to_string();
    session.import_json(&payload).unwrap();

    let empty = session.builds().field(1, "profiles").unwrap();
    assert_eq!(empty.as_array().unwrap().len(), 1);
    assert_eq!(empty[0]["id"], json!(1));

    let profiles = session.builds().field(2, "profiles").unwrap();
    let ids: Vec<u64> = profiles.as_array().unwrap().iter().map(|p| p["id"].as_u64().unwrap()).collect();
    assert_eq!(ids, vec![2, 1, 3]);
    let scalings = session.builds().field(2, "sources.1.additionalScalings").unwrap();
    assert_eq!(scalings[0]["id"], json!(5));
    assert_eq!(scalings[1]["id"], json!(1));
    session.remove_spell_profile(2, 3).unwrap();
}

#[test]
fn import_replaces_builds_and_clears_history() {
    let mut session = session();
    session.on_edit(1, "meleePower", json!(40)).unwrap();
    let payload = json!([
        {"type": "spell", "setId": 3, "tabName": "Caster"},
        {"type": "weapon", "setId": 3, "tabName": "Dupe", "baseDice": "2d6"}
    ])
    .to_string();
    assert_eq!(session.import_json(&payload).unwrap(), 2);
    assert!(!session.can_undo());
    let ids: Vec<u32> = session.builds().iter().map(|p| p.set_id).collect();
    assert_eq!(ids, vec![3, 1]);
    assert!((total(&session, 1) - 7.0).abs() < 1e-9);
}

#[test]
fn rejected_import_keeps_state() {
    let mut session = session();
    session.on_edit(1, "meleePower", json!(40)).unwrap();
    let before = session.export_json().unwrap();
    for payload in ["not json", "{}", "[]", r#"[{"type": "bow"}]"#] {
        assert!(matches!(session.import_json(payload), Err(EngineError::MalformedImport(_))));
    }
    assert_eq!(session.export_json().unwrap(), before);
    assert!(session.can_undo());
}

#[test]
fn init_recovers_from_bad_stored_data() {
    let store = MemoryStore::with_entry("builds", "{ definitely not builds");
    let session = Session::init(SessionConfig::default(), store).unwrap();
    assert_eq!(session.builds().len(), 1);
}

#[test]
fn init_honours_default_kind() {
    let config = SessionConfig { default_kind: BuildKind::Spell, ..Default::default() };
    let session = Session::init(config, MemoryStore::new()).unwrap();
    assert_eq!(session.builds().get(1).unwrap().kind(), BuildKind::Spell);
}

#[test]
fn state_survives_a_restart() {
    let dir = tempfile::tempdir().unwrap();
    let mut session = Session::init(SessionConfig::default(), FileStore::new(dir.path())).unwrap();
    session.add_build(BuildKind::Spell).unwrap();
    session.on_edit(1, "meleePower", json!(60)).unwrap();
    session.rename(2, "Caster").unwrap();
    let expected = session.export_json().unwrap();
    let store = session.teardown().unwrap();
    assert_eq!(store.load("builds").unwrap().as_deref(), Some(expected.as_str()));

    let reopened = Session::init(SessionConfig::default(), FileStore::new(dir.path())).unwrap();
    assert_eq!(reopened.export_json().unwrap(), expected);
    assert!(!reopened.can_undo());
}

#[test]
fn ranking_follows_display_order() {
    let mut session = session();
    session.add_build(BuildKind::Weapon).unwrap();
    session.on_edit(2, "baseDice", json!("2d8")).unwrap();
    let rows = session.rank();
    assert_eq!(rows[0].standing.label(), "-50.0%");
    assert_eq!(rows[1].standing.label(), "best");
}
