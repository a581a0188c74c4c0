use engine::EngineError;
use engine::spell::{
    AdditionalScaling, SpellBoosts, SpellBuildInputs, SpellDamageSource, SpellPowerProfile, compose,
};

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

fn profile(id: u32, spell_power: f64, crit_chance: f64, crit_damage_bonus: f64) -> SpellPowerProfile {
    SpellPowerProfile {
        id,
        spell_power,
        crit_chance,
        crit_damage_bonus,
        label: format!("P{}", id),
    }
}

fn bolt() -> SpellDamageSource {
    SpellDamageSource {
        id: 1,
        name: "Bolt".into(),
        base: "10".into(),
        per_caster_level: "1d6".into(),
        caster_level: 10,
        hit_count: 2,
        additional_scalings: Vec::new(),
    }
}

fn caster(sources: Vec<SpellDamageSource>) -> SpellBuildInputs {
    SpellBuildInputs {
        sources,
        profiles: vec![profile(1, 100.0, 0.2, 0.5), profile(2, 300.0, 0.0, 0.0)],
        boosts: SpellBoosts::default(),
    }
}

#[test]
fn single_source_expectation() {
    let b = compose(&caster(vec![bolt()]));
    let s = &b.sources[0];
    // (10 + 3.5 * 10) * 2 = 90 on hit, x2.5 on crit
    assert!(close(s.scalings[0].hit, 90.0));
    assert!(close(s.scalings[0].crit, 225.0));
    assert!(close(s.per_hit, 90.0 * 0.8 + 225.0 * 0.2));
    assert!(close(b.total, 234.0));
}

#[test]
fn metamagic_adds_flat_spell_power() {
    let mut inputs = caster(vec![bolt()]);
    inputs.boosts = SpellBoosts { empowered: true, intensified: true, maximized: true, ..Default::default() };
    let b = compose(&inputs);
    assert!(close(b.sources[0].scalings[0].spell_power, 400.0));
    assert!(close(b.sources[0].scalings[0].hit, 45.0 * 5.0));
}

#[test]
fn wellspring_adds_power_and_crit_damage() {
    let mut inputs = caster(vec![bolt()]);
    inputs.boosts = SpellBoosts { wellspring: true, night_horrors: true, ..Default::default() };
    let s = &compose(&inputs).sources[0].scalings[0];
    assert!(close(s.spell_power, 250.0));
    assert!(close(s.hit, 45.0 * 3.5));
    assert!(close(s.crit, s.hit * (2.0 + 0.5 + 0.2 + 0.25)));
}

#[test]
fn additional_scaling_uses_its_profile() {
    let mut source = bolt();
    source.hit_count = 1;
    source.additional_scalings.push(AdditionalScaling {
        id: 1,
        base: "10".into(),
        per_caster_level: String::new(),
        profile_id: 2,
    });
    let b = compose(&caster(vec![source]));
    let extra = &b.sources[0].scalings[1];
    assert_eq!(extra.profile_id, 2);
    assert!(close(extra.hit, 40.0));
    assert!(close(extra.expected, 40.0));
}

#[test]
fn missing_profile_falls_back_to_first() {
    let mut source = bolt();
    source.additional_scalings.push(AdditionalScaling {
        id: 1,
        base: "10".into(),
        per_caster_level: String::new(),
        profile_id: 42,
    });
    let b = compose(&caster(vec![source]));
    assert_eq!(b.sources[0].scalings[1].profile_id, 1);
}

#[test]
fn primary_falls_back_when_profile_one_is_gone() {
    let mut inputs = caster(vec![bolt()]);
    inputs.profiles.remove(0);
    let b = compose(&inputs);
    assert_eq!(b.sources[0].scalings[0].profile_id, 2);
}

#[test]
fn no_profiles_computes_with_zero_power() {
    let mut inputs = caster(vec![bolt()]);
    inputs.profiles.clear();
    let b = compose(&inputs);
    assert!(close(b.sources[0].per_hit, 45.0));
}

#[test]
fn hit_count_is_at_least_one() {
    let mut source = bolt();
    source.hit_count = 0;
    let b = compose(&caster(vec![source]));
    assert_eq!(b.sources[0].hit_count, 1);
}

#[test]
fn sources_sum_into_total() {
    let mut second = bolt();
    second.id = 2;
    second.name = String::new();
    let b = compose(&caster(vec![bolt(), second]));
    assert!(close(b.total, 468.0));
    assert_eq!(b.components[1].name, "Source 2");
}

#[test]
fn last_profile_cannot_be_removed() {
    let mut inputs = SpellBuildInputs::default();
    assert!(matches!(inputs.remove_profile(1), Err(EngineError::LastProfile)));
    assert_eq!(inputs.profiles.len(), 1);
}

#[test]
fn added_profiles_take_the_lowest_free_id() {
    let mut inputs = caster(Vec::new());
    inputs.remove_profile(1).unwrap();
    assert_eq!(inputs.add_profile(), 1);
    assert_eq!(inputs.add_profile(), 3);
    assert!(matches!(inputs.remove_profile(9), Err(EngineError::UnknownProfile(9))));
}
