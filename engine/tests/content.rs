use engine::content::{builtin_builds, load_builtin};
use engine::BuildKind;

#[test]
fn every_builtin_parses_with_damage() {
    for name in builtin_builds().keys() {
        let builds = load_builtin(name).unwrap();
        assert!(!builds.is_empty(), "{} is empty", name);
        for build in &builds {
            assert!(build.total_damage > 0.0, "{} deals no damage", name);
        }
    }
}

#[test]
fn builtins_cover_both_kinds() {
    assert_eq!(load_builtin("fire_sorcerer").unwrap()[0].kind(), BuildKind::Spell);
    assert_eq!(load_builtin("repeater_rogue").unwrap()[0].kind(), BuildKind::Weapon);
}

#[test]
fn unknown_builtin_is_an_error() {
    let err = load_builtin("paladin").unwrap_err();
    assert!(err.to_string().contains("paladin"));
}
