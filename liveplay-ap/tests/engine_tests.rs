//! Cue lifecycle tests for CueEngine
//!
//! The engine runs against a ClockTransport and is stepped in 10 ms ticks.

mod helpers;

use helpers::*;
use liveplay_ap::library::MediaLibrary;
use liveplay_ap::playback::engine::{PANIC_FADE, TriggerTarget};
use liveplay_common::events::LiveplayEvent;
use liveplay_common::model::{
    ContentType, CustomAction, CustomActionKind, EndBehavior, HttpMethod, HttpRequest, Item,
    StartBehavior,
};

fn http_action(time_point: f64, url: &str) -> CustomAction {
    CustomAction {
        time_point,
        action: CustomActionKind::HttpRequest {
            request: HttpRequest {
                method: HttpMethod::Post,
                url: url.to_string(),
                content_type: ContentType::Json,
                body: None,
            },
        },
    }
}

// ============================================================================
// Start
// ============================================================================

#[test]
fn test_duplicate_trigger_is_rejected() {
    let item = quiet("Thunder", 10.0);
    let uuid = item.uuid;
    let mut rig = Rig::new(project(vec![Item::Audio(item)]));

    assert!(rig.engine.trigger_by_uuid(uuid));
    rig.advance_ms(500);
    let before = rig.cue(uuid).unwrap().clone();

    assert!(!rig.engine.trigger_by_uuid(uuid));

    let after = rig.cue(uuid).unwrap();
    assert_eq!(after.transport, before.transport);
    assert_eq!(after.started_at, before.started_at);
    assert_eq!(after.current_time, before.current_time);
    assert_eq!(rig.transport.voice_count(), 1);
}

#[test]
fn test_unresolvable_targets_are_noops() {
    let mut rig = Rig::new(project(vec![Item::Audio(quiet("Bell", 2.0))]));

    assert!(!rig.engine.trigger_by_uuid(uuid::Uuid::new_v4()));
    assert!(!rig.engine.trigger_by_index(&[7]));
    assert!(!rig.engine.trigger_by_index(&[0, 1]));
    assert!(!rig.engine.trigger(&TriggerTarget::Cart { slot: 3 }));
    assert!(rig.engine.session().is_empty());
    assert_eq!(rig.transport.voice_count(), 0);
}

#[test]
fn test_trim_window_bounds_current_time() {
    let mut item = quiet("Sting", 10.0);
    item.in_point = Some(2.0);
    item.out_point = Some(5.0);
    let uuid = item.uuid;
    let mut rig = Rig::new(project(vec![Item::Audio(item)]));

    assert!(rig.engine.trigger_by_uuid(uuid));
    assert_eq!(rig.cue(uuid).unwrap().duration, 3.0);

    let mut polled = Vec::new();
    rig.advance_checking(2990, |engine| {
        let cue = engine.session().cue(uuid).expect("still playing");
        assert!(cue.current_time >= 0.0 && cue.current_time <= 3.0);
        polled.push(cue.current_time);
    });
    assert!(polled.iter().any(|t| *t > 2.5));

    rig.advance_ms(20);
    assert!(!rig.is_active(uuid));

    let events = rig.events();
    assert!(events.iter().any(|e| matches!(
        e,
        LiveplayEvent::CueEnded { uuid: u, completed: true, .. } if *u == uuid
    )));
}

#[test]
fn test_whole_file_plays_past_stale_duration() {
    // Metadata not yet analysed: the file is really 3 s long
    let item = quiet("Unscanned", 0.5);
    let uuid = item.uuid;
    let mut rig = Rig::new(project(vec![Item::Audio(item.clone())]));
    rig.transport
        .set_media_length(rig.library.media_path(&item), 3.0);

    assert!(rig.engine.trigger_by_uuid(uuid));
    rig.advance_ms(2000);
    assert!(rig.is_active(uuid));
    assert_eq!(rig.cue(uuid).unwrap().current_time, 0.5);

    rig.advance_ms(1010);
    assert!(!rig.is_active(uuid));
}

#[test]
fn test_media_path_comes_from_project_folder() {
    let item = quiet("Door Slam", 1.0);
    let uuid = item.uuid;
    let mut rig = Rig::new(project(vec![Item::Audio(item)]));

    rig.engine.trigger_by_uuid(uuid);
    assert_eq!(
        rig.transport.load_log(),
        vec![std::path::PathBuf::from("/shows/test/media/door-slam.wav")]
    );
}

#[test]
fn test_cart_slot_triggers_cart_only_item() {
    let cart = quiet("Applause", 4.0);
    let uuid = cart.uuid;
    let mut rig = Rig::new(with_cart(project(Vec::new()), 3, cart));

    assert!(!rig.engine.trigger_cart_slot(4));
    assert!(rig.engine.trigger_cart_slot(3));
    assert!(rig.is_active(uuid));
}

// ============================================================================
// Chained behaviors
// ============================================================================

#[test]
fn test_start_behavior_play_next_starts_sibling() {
    let mut first = quiet("Rain", 8.0);
    first.start_behavior = StartBehavior::PlayNext;
    let second = quiet("Wind", 8.0);
    let (a, b) = (first.uuid, second.uuid);
    let mut rig = Rig::new(project(vec![Item::Audio(first), Item::Audio(second)]));

    assert!(rig.engine.trigger_by_uuid(a));
    assert!(rig.is_active(a));
    assert!(rig.is_active(b));
}

#[test]
fn test_end_behavior_next_and_goto_index() {
    let first = with_end(quiet("One", 1.0), EndBehavior::Next);
    let second = with_end(
        quiet("Two", 1.0),
        EndBehavior::GotoIndex {
            target_index: Some(vec![3]),
        },
    );
    let skipped = quiet("Skipped", 1.0);
    let last = quiet("Four", 1.0);
    let (one, two, three, four) = (first.uuid, second.uuid, skipped.uuid, last.uuid);
    let mut rig = Rig::new(project(vec![
        Item::Audio(first),
        Item::Audio(second),
        Item::Audio(skipped),
        Item::Audio(last),
    ]));

    rig.engine.trigger_by_uuid(one);
    rig.advance_ms(1000);
    assert!(!rig.is_active(one));
    assert!(rig.is_active(two));

    rig.advance_ms(1000);
    assert!(!rig.is_active(three));
    assert!(rig.is_active(four));

    rig.advance_ms(1000);
    assert!(rig.engine.session().is_empty());
}

#[test]
fn test_looping_cue_never_ends() {
    let item = with_end(quiet("Bed", 1.0), EndBehavior::Loop);
    let uuid = item.uuid;
    let mut rig = Rig::new(project(vec![Item::Audio(item)]));

    rig.engine.trigger_by_uuid(uuid);
    rig.advance_checking(3500, |engine| {
        let cue = engine.session().cue(uuid).expect("loop keeps playing");
        assert!(cue.current_time <= 1.0);
    });
    assert!(rig.is_active(uuid));
    assert!(rig.cue(uuid).unwrap().looping);
}

// ============================================================================
// Custom actions
// ============================================================================

#[test]
fn test_custom_actions_fire_at_time_points() {
    let target = quiet("Response", 5.0);
    let mut source = quiet("Cue", 5.0);
    source.custom_actions = vec![
        http_action(1.0, "http://lights.local/go"),
        CustomAction {
            time_point: 2.0,
            action: CustomActionKind::PlayItem { uuid: target.uuid },
        },
    ];
    let (a, b) = (source.uuid, target.uuid);
    let mut rig = Rig::new(project(vec![Item::Audio(source), Item::Audio(target)]));

    rig.engine.trigger_by_uuid(a);
    rig.advance_ms(990);
    assert!(rig.actions.sent().is_empty());
    rig.advance_ms(10);
    assert_eq!(rig.actions.sent().len(), 1);
    assert_eq!(rig.actions.sent()[0].url, "http://lights.local/go");

    rig.advance_ms(1000);
    assert!(rig.is_active(b));
}

#[test]
fn test_custom_actions_cancelled_when_cue_stops() {
    let target = quiet("Response", 5.0);
    let mut source = quiet("Cue", 5.0);
    source.custom_actions = vec![
        http_action(1.0, "http://lights.local/early"),
        http_action(3.0, "http://lights.local/late"),
        CustomAction {
            time_point: 2.0,
            action: CustomActionKind::PlayItem { uuid: target.uuid },
        },
    ];
    let (a, b) = (source.uuid, target.uuid);
    let mut rig = Rig::new(project(vec![Item::Audio(source), Item::Audio(target)]));

    rig.engine.trigger_by_uuid(a);
    rig.advance_ms(1500);
    rig.engine.stop_cue(a);
    rig.advance_ms(3000);

    assert_eq!(rig.actions.sent().len(), 1);
    assert!(!rig.is_active(b));
}

#[test]
fn test_custom_action_time_is_relative_to_in_point() {
    let mut item = quiet("Sting", 10.0);
    item.in_point = Some(3.0);
    item.custom_actions = vec![
        http_action(2.0, "http://lights.local/before"),
        http_action(4.0, "http://lights.local/after"),
    ];
    let uuid = item.uuid;
    let mut rig = Rig::new(project(vec![Item::Audio(item)]));

    rig.engine.trigger_by_uuid(uuid);
    rig.advance_ms(1000);
    let sent = rig.actions.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].url, "http://lights.local/after");
}

// ============================================================================
// Stop / stop-all / panic
// ============================================================================

#[test]
fn test_stop_fades_then_releases_voice() {
    let mut item = quiet("Music", 30.0);
    item.fade_out_duration = 2.0;
    let uuid = item.uuid;
    let mut rig = Rig::new(project(vec![Item::Audio(item)]));

    rig.engine.trigger_by_uuid(uuid);
    rig.advance_ms(500);
    let voice = rig.voice(uuid);

    rig.engine.stop_cue(uuid);
    assert!(!rig.is_active(uuid));
    assert!(rig.transport.is_fading(voice));
    assert_eq!(rig.transport.target_volume(voice), Some(0.0));

    rig.advance_ms(1990);
    assert_eq!(rig.transport.voice_count(), 1);
    rig.advance_ms(10);
    assert_eq!(rig.transport.voice_count(), 0);
}

#[test]
fn test_stop_with_zero_fade_is_immediate() {
    let mut item = quiet("Click", 30.0);
    item.fade_out_duration = 0.0;
    let uuid = item.uuid;
    let mut rig = Rig::new(project(vec![Item::Audio(item)]));

    rig.engine.trigger_by_uuid(uuid);
    rig.engine.stop_cue(uuid);
    assert_eq!(rig.transport.voice_count(), 0);
    assert_eq!(rig.engine.pending_timers(), 0);
}

#[test]
fn test_stop_all_clears_everything_and_timers() {
    let mut a = quiet("A", 20.0);
    a.custom_actions = vec![http_action(5.0, "http://lights.local/a")];
    let b = quiet("B", 20.0);
    let (ua, ub) = (a.uuid, b.uuid);
    let mut rig = Rig::new(project(vec![Item::Audio(a), Item::Audio(b)]));

    rig.engine.trigger_by_uuid(ua);
    rig.engine.trigger_by_uuid(ub);
    rig.advance_ms(300);

    rig.engine.stop_all_cues();
    assert!(rig.engine.session().is_empty());
    assert_eq!(rig.engine.pending_timers(), 0);
    assert_eq!(rig.transport.voice_count(), 0);

    rig.advance_checking(6000, |engine| {
        assert!(engine.session().is_empty());
    });
    assert!(rig.actions.sent().is_empty());
}

#[test]
fn test_panic_empties_maps_only_after_fade_window() {
    let a = quiet("A", 20.0);
    let b = quiet("B", 20.0);
    let (ua, ub) = (a.uuid, b.uuid);
    let mut rig = Rig::new(project(vec![Item::Audio(a), Item::Audio(b)]));

    rig.engine.trigger_by_uuid(ua);
    rig.engine.trigger_by_uuid(ub);
    rig.advance_ms(200);
    let voice = rig.voice(ua);

    rig.engine.panic_stop();
    assert!(rig.engine.is_panic_pending());
    assert!(rig.transport.is_fading(voice));
    assert_eq!(rig.transport.target_volume(voice), Some(0.0));

    let window = PANIC_FADE.as_millis() as u64;
    rig.advance_checking(window - 10, |engine| {
        assert_eq!(engine.session().cue_count(), 2);
    });

    rig.advance_ms(10);
    assert!(rig.engine.session().is_empty());
    assert!(!rig.engine.is_panic_pending());
    assert_eq!(rig.transport.voice_count(), 0);
}

#[test]
fn test_second_panic_is_ignored() {
    let a = quiet("A", 20.0);
    let ua = a.uuid;
    let mut rig = Rig::new(project(vec![Item::Audio(a)]));

    rig.engine.trigger_by_uuid(ua);
    rig.engine.panic_stop();
    rig.advance_ms(300);
    rig.engine.panic_stop();
    rig.advance_ms(200);

    // Ended at the original deadline, not pushed back
    assert!(rig.engine.session().is_empty());
    assert_eq!(count_events(&rig.events(), "PanicStarted"), 1);
}

#[test]
fn test_stop_all_ends_pending_panic() {
    let a = quiet("A", 20.0);
    let next = quiet("Next", 20.0);
    let (ua, un) = (a.uuid, next.uuid);
    let mut rig = Rig::new(project(vec![Item::Audio(a), Item::Audio(next)]));

    rig.engine.trigger_by_uuid(ua);
    rig.engine.panic_stop();
    rig.advance_ms(100);

    rig.engine.stop_all_cues();
    assert!(!rig.engine.is_panic_pending());
    assert_eq!(rig.engine.pending_timers(), 0);

    // Operator starts the next cue; the old panic window must not take it
    assert!(rig.engine.trigger_by_uuid(un));
    rig.advance_ms(1000);
    assert!(rig.is_active(un));
    let voice = rig.voice(un);
    assert!(approx(rig.transport.volume(voice).unwrap(), 1.0));
}

#[test]
fn test_cue_started_during_panic_is_released_with_it() {
    let a = quiet("A", 20.0);
    let late = quiet("Late", 20.0);
    let (ua, ul) = (a.uuid, late.uuid);
    let mut rig = Rig::new(project(vec![Item::Audio(a), Item::Audio(late)]));

    rig.engine.trigger_by_uuid(ua);
    rig.engine.panic_stop();
    rig.advance_ms(100);
    assert!(rig.engine.trigger_by_uuid(ul));

    rig.advance_ms(400);
    assert!(rig.engine.session().is_empty());
}

// ============================================================================
// Pause / resume
// ============================================================================

#[test]
fn test_pause_holds_position_until_resume() {
    let item = quiet("Speech", 5.0);
    let uuid = item.uuid;
    let mut rig = Rig::new(project(vec![Item::Audio(item)]));

    rig.engine.trigger_by_uuid(uuid);
    rig.advance_ms(1000);
    assert!(rig.engine.pause_cue(uuid));
    let voice = rig.voice(uuid);
    assert!(rig.transport.is_paused(voice));

    rig.advance_ms(6000);
    let cue = rig.cue(uuid).expect("paused cue stays active");
    assert!(cue.is_paused);
    assert!((cue.current_time - 1.0).abs() < 1e-6);

    assert!(rig.engine.resume_cue(uuid));
    assert!(!rig.engine.resume_cue(uuid));
    rig.advance_ms(3900);
    assert!(rig.is_active(uuid));
    rig.advance_ms(200);
    assert!(!rig.is_active(uuid));
}

#[test]
fn test_pause_unknown_cue_is_false() {
    let mut rig = Rig::new(project(Vec::new()));
    assert!(!rig.engine.pause_cue(uuid::Uuid::new_v4()));
    assert!(!rig.engine.resume_cue(uuid::Uuid::new_v4()));
}

// ============================================================================
// Transport failures
// ============================================================================

#[test]
fn test_load_failure_reports_and_leaves_no_cue() {
    let item = quiet("Missing", 5.0);
    let uuid = item.uuid;
    let mut rig = Rig::new(project(vec![Item::Audio(item)]));

    rig.transport.fail_next_load("file not found");
    assert!(!rig.engine.trigger_by_uuid(uuid));
    assert!(rig.engine.session().is_empty());
    assert_eq!(count_events(&rig.events(), "CueFailed"), 1);
}

#[test]
fn test_play_failure_tears_down_cue() {
    let mut item = quiet("Broken", 5.0);
    item.custom_actions = vec![http_action(1.0, "http://lights.local/x")];
    let uuid = item.uuid;
    let mut rig = Rig::new(project(vec![Item::Audio(item)]));

    rig.transport.fail_next_play("device busy");
    assert!(!rig.engine.trigger_by_uuid(uuid));
    assert!(rig.engine.session().is_empty());
    assert_eq!(rig.transport.voice_count(), 0);
    assert_eq!(rig.engine.pending_timers(), 0);

    // Retrying works once the transport recovers
    assert!(rig.engine.trigger_by_uuid(uuid));
}

#[test]
fn test_failure_while_playing_removes_cue() {
    let item = quiet("Flaky", 5.0);
    let uuid = item.uuid;
    let mut rig = Rig::new(project(vec![Item::Audio(item)]));

    rig.engine.trigger_by_uuid(uuid);
    rig.advance_ms(500);
    rig.transport.inject_failure(rig.voice(uuid), "decoder error");
    rig.advance_ms(10);

    assert!(!rig.is_active(uuid));
    let events = rig.events();
    assert!(events.iter().any(|e| matches!(
        e,
        LiveplayEvent::CueFailed { uuid: u, reason, .. } if *u == uuid && reason == "decoder error"
    )));
}

// ============================================================================
// Meters
// ============================================================================

#[test]
fn test_levels_rise_while_playing_and_fall_after() {
    let item = quiet("Loud", 2.0);
    let uuid = item.uuid;
    let mut rig = Rig::new(project(vec![Item::Audio(item)]));

    rig.engine.trigger_by_uuid(uuid);
    rig.advance_ms(500);
    let cue = rig.cue(uuid).unwrap();
    assert!(cue.current_level > -60.0);
    assert!(cue.peak_level >= cue.current_level);
    assert!(rig.engine.master_level().level > -60.0);

    rig.advance_ms(2000);
    assert!(!rig.is_active(uuid));
    assert_eq!(rig.engine.master_level().level, -60.0);
}
