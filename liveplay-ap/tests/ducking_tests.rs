//! Ducking coordination through the engine

mod helpers;

use helpers::*;
use liveplay_common::model::{AudioItem, DuckingBehavior, Item};

fn ducker(name: &str) -> AudioItem {
    let mut item = quiet(name, 30.0);
    item.ducking_behavior = DuckingBehavior::duck_others(0.2);
    item
}

fn bed(name: &str, volume: f32) -> AudioItem {
    let mut item = quiet(name, 60.0);
    item.volume = volume;
    item
}

#[test]
fn test_duck_others_with_two_duckers() {
    let b = bed("B", 1.0);
    let c = bed("C", 0.5);
    let a = ducker("A");
    let d = ducker("D");
    let (ub, uc, ua, ud) = (b.uuid, c.uuid, a.uuid, d.uuid);
    let mut rig = Rig::new(project(
        [b, c, a, d].into_iter().map(Item::Audio).collect(),
    ));

    rig.engine.trigger_by_uuid(ub);
    rig.engine.trigger_by_uuid(uc);
    rig.advance_ms(100);

    rig.engine.trigger_by_uuid(ua);
    for (uuid, original) in [(ub, 1.0), (uc, 0.5)] {
        let cue = rig.cue(uuid).unwrap();
        assert!(cue.is_ducked);
        assert!(approx(cue.volume, 0.2 * original));
        assert!(approx(cue.original_volume, original));
        assert!(cue.ducked_by.contains(&ua));
        assert!(approx(rig.transport.target_volume(cue.transport).unwrap(), 0.2 * original));
    }

    rig.advance_ms(100);
    rig.engine.trigger_by_uuid(ud);
    let cue = rig.cue(ub).unwrap();
    assert_eq!(cue.ducked_by.len(), 2);
    // Ducked relative to the original volume, not compounded
    assert!(approx(cue.volume, 0.2));

    rig.advance_ms(100);
    rig.engine.stop_cue(ua);
    for (uuid, original) in [(ub, 1.0), (uc, 0.5)] {
        let cue = rig.cue(uuid).unwrap();
        assert!(cue.is_ducked, "still ducked by D");
        assert!(approx(cue.volume, 0.2 * original));
        assert!(!cue.ducked_by.contains(&ua));
        assert!(cue.ducked_by.contains(&ud));
    }

    rig.advance_ms(100);
    rig.engine.stop_cue(ud);
    for (uuid, original) in [(ub, 1.0), (uc, 0.5)] {
        let cue = rig.cue(uuid).unwrap();
        assert!(!cue.is_ducked);
        assert!(cue.ducked_by.is_empty());
        assert!(approx(cue.volume, original));
        assert!(approx(rig.transport.target_volume(cue.transport).unwrap(), original));
    }
}

#[test]
fn test_restore_without_ducked_cues_is_noop() {
    let b = bed("B", 0.8);
    let a = ducker("A");
    let (ub, ua) = (b.uuid, a.uuid);
    let mut rig = Rig::new(project(vec![Item::Audio(a), Item::Audio(b)]));

    // A ducks nothing: it starts alone
    rig.engine.trigger_by_uuid(ua);
    rig.advance_ms(100);
    rig.engine.trigger_by_uuid(ub);
    let voice = rig.voice(ub);
    rig.advance_ms(100);
    rig.events();

    rig.engine.stop_cue(ua);
    let cue = rig.cue(ub).unwrap();
    assert!(approx(cue.volume, 0.8));
    assert!(!rig.transport.is_fading(voice));
    assert_eq!(count_events(&rig.events(), "CueRestored"), 0);
}

#[test]
fn test_stop_all_ducking_stops_previous_cues() {
    let first = quiet("First", 30.0);
    let mut second = quiet("Second", 30.0);
    second.ducking_behavior = DuckingBehavior::StopAll;
    let (u1, u2) = (first.uuid, second.uuid);
    let mut rig = Rig::new(project(vec![Item::Audio(first), Item::Audio(second)]));

    rig.engine.trigger_by_uuid(u1);
    rig.advance_ms(200);
    rig.engine.trigger_by_uuid(u2);

    assert!(!rig.is_active(u1));
    assert!(rig.is_active(u2));
}

#[test]
fn test_natural_end_of_ducker_restores() {
    let b = bed("B", 1.0);
    let mut a = ducker("A");
    a.duration = 1.0;
    let (ub, ua) = (b.uuid, a.uuid);
    let mut rig = Rig::new(project(vec![Item::Audio(b), Item::Audio(a)]));

    rig.engine.trigger_by_uuid(ub);
    rig.engine.trigger_by_uuid(ua);
    assert!(approx(rig.cue(ub).unwrap().volume, 0.2));

    rig.advance_ms(1000);
    assert!(!rig.is_active(ua));
    assert!(approx(rig.cue(ub).unwrap().volume, 1.0));
    assert_eq!(count_events(&rig.events(), "CueRestored"), 1);
}

#[test]
fn test_failed_ducker_releases_its_ducking() {
    let b = bed("B", 1.0);
    let a = ducker("A");
    let (ub, ua) = (b.uuid, a.uuid);
    let mut rig = Rig::new(project(vec![Item::Audio(b), Item::Audio(a)]));

    rig.engine.trigger_by_uuid(ub);
    rig.engine.trigger_by_uuid(ua);
    rig.advance_ms(100);

    rig.transport.inject_failure(rig.voice(ua), "device lost");
    rig.advance_ms(10);

    assert!(!rig.is_active(ua));
    let cue = rig.cue(ub).unwrap();
    assert!(!cue.is_ducked);
    assert!(approx(cue.volume, 1.0));
}

#[test]
fn test_panic_does_not_fade_ducked_cues_back_up() {
    let b = bed("B", 1.0);
    let mut a = ducker("A");
    a.duration = 0.3;
    let (ub, ua) = (b.uuid, a.uuid);
    let mut rig = Rig::new(project(vec![Item::Audio(b), Item::Audio(a)]));

    rig.engine.trigger_by_uuid(ub);
    rig.engine.trigger_by_uuid(ua);
    rig.advance_ms(100);
    let voice = rig.voice(ub);

    rig.engine.panic_stop();
    // A ends naturally inside the panic window
    rig.advance_ms(200);
    assert!(!rig.is_active(ua));
    assert_eq!(rig.transport.target_volume(voice), Some(0.0));

    rig.advance_ms(300);
    assert!(rig.engine.session().is_empty());
}
