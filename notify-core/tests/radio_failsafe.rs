mod common;

use common::Bench;
use notify_core::patterns::Pattern;
use notify_core::status::{NotifyStatus, StatusFlag};
use notify_core::telemetry::TelemetryEventKind;

/// Arms once and waits for the arming tone to finish.
fn armed_bench() -> Bench {
    let mut bench = Bench::booted();
    bench.set(StatusFlag::Armed, true);
    bench.run_until_idle();
    bench.clear_history();
    bench
}

#[test]
fn radio_loss_before_arming_plays_once() {
    let mut bench = Bench::booted();
    bench.set(StatusFlag::FailsafeRadio, true);

    bench.tick();
    assert_eq!(bench.sequencer.active_pattern(), Pattern::RadioLost);
    assert_eq!(bench.run_until_idle(), 10);

    bench.tick_levels(30);
    assert_eq!(bench.started().as_slice(), &[Pattern::RadioLost]);
    assert!(!bench.sequencer.output_level());
}

#[test]
fn radio_loss_before_arming_is_not_cut_short_by_battery() {
    let mut bench = Bench::booted();
    bench.set(StatusFlag::FailsafeBattery, true);
    bench.run_until_idle();
    bench.clear_history();

    bench.set(StatusFlag::FailsafeRadio, true);
    bench.tick();
    assert_eq!(bench.sequencer.active_pattern(), Pattern::RadioLost);

    let levels = bench.tick_levels(10);
    assert_eq!(
        levels.as_slice(),
        &[true, true, true, true, true, true, true, true, true, false]
    );
    assert_eq!(bench.started().as_slice(), &[Pattern::RadioLost]);
    assert_eq!(
        bench.count(TelemetryEventKind::PatternComplete(Pattern::RadioLost)),
        1
    );

    bench.tick();
    assert_eq!(
        bench.started().as_slice(),
        &[Pattern::RadioLost, Pattern::SingleBuzz]
    );
}

#[test]
fn arming_waits_for_single_radio_loss_tone() {
    let mut bench = Bench::booted();
    bench.set(StatusFlag::FailsafeRadio, true);
    bench.tick();
    bench.tick_levels(2);

    bench.set(StatusFlag::Armed, true);
    bench.set(StatusFlag::VehicleLost, true);
    let levels = bench.tick_levels(8);
    assert!(levels[..7].iter().all(|level| *level));
    assert!(!levels[7]);
    assert_eq!(bench.started().as_slice(), &[Pattern::RadioLost]);
    assert!(!bench.sequencer.latched().ever_armed);

    bench.tick();
    assert_eq!(bench.sequencer.active_pattern(), Pattern::ArmingBuzz);
    assert!(bench.sequencer.latched().ever_armed);
}

#[test]
fn radio_loss_after_arming_repeats_every_two_seconds() {
    let mut bench = armed_bench();
    bench.set(StatusFlag::FailsafeRadio, true);
    bench.tick();
    assert_eq!(bench.sequencer.active_pattern(), Pattern::RadioLost);

    let levels = bench.tick_levels(100);
    for (index, level) in levels.iter().enumerate() {
        assert_eq!(*level, index % 20 < 9, "tick {index}");
    }
    assert_eq!(bench.sequencer.active_pattern(), Pattern::RadioLost);
    assert_eq!(bench.count(TelemetryEventKind::BuzzerOn), 5);
    assert_eq!(
        bench.count(TelemetryEventKind::PatternComplete(Pattern::RadioLost)),
        0
    );
}

#[test]
fn ever_armed_survives_disarm_for_radio_loop() {
    let mut bench = armed_bench();
    bench.set(StatusFlag::Armed, false);
    bench.run_until_idle();

    bench.set(StatusFlag::FailsafeRadio, true);
    bench.tick();
    bench.tick_levels(60);
    assert_eq!(bench.sequencer.active_pattern(), Pattern::RadioLost);
}

#[test]
fn radio_failsafe_suppresses_lower_priority_triggers() {
    let mut bench = armed_bench();
    bench.set(StatusFlag::FailsafeRadio, true);
    bench.tick();

    bench.set(StatusFlag::FailsafeBattery, true);
    bench.set(StatusFlag::EkfBad, true);
    bench.set(StatusFlag::VehicleLost, true);
    bench.set(StatusFlag::Armed, false);
    bench.tick_levels(45);

    assert_eq!(bench.started().as_slice(), &[Pattern::RadioLost]);
    assert!(bench.sequencer.latched().armed);
    assert!(!bench.sequencer.latched().ekf_bad);
}

#[test]
fn radio_recovery_interrupts_loop_then_queued_triggers_resume() {
    let mut bench = armed_bench();
    bench.set(StatusFlag::FailsafeRadio, true);
    bench.tick();
    bench.set(StatusFlag::EkfBad, true);
    bench.tick_levels(12);

    bench.set(StatusFlag::FailsafeRadio, false);
    bench.tick();
    assert_eq!(bench.sequencer.active_pattern(), Pattern::RadioRecovered);
    assert_eq!(
        bench.count(TelemetryEventKind::PatternReplaced(Pattern::RadioLost)),
        1
    );

    bench.run_until_idle();
    bench.tick();
    assert_eq!(bench.sequencer.active_pattern(), Pattern::EkfBad);
    assert_eq!(
        bench.started().as_slice(),
        &[Pattern::RadioLost, Pattern::RadioRecovered, Pattern::EkfBad]
    );
}

#[test]
fn arming_failed_overrides_radio_loop() {
    let mut bench = armed_bench();
    bench.set(StatusFlag::FailsafeRadio, true);
    bench.tick();
    bench.tick_levels(3);
    assert!(bench.sequencer.output_level());

    bench.raise_arming_failed();
    bench.call();
    assert_eq!(bench.sequencer.active_pattern(), Pattern::SingleBuzz);

    bench.run_until_idle();
    bench.tick_levels(40);
    assert!(bench.sequencer.active_pattern().is_idle());
    assert!(!bench.sequencer.output_level());
}

#[test]
fn radio_changes_are_ignored_while_initialising() {
    let mut bench = Bench::new(NotifyStatus::booting());
    bench.set(StatusFlag::FailsafeRadio, true);
    bench.tick_levels(10);
    bench.set(StatusFlag::FailsafeRadio, false);
    bench.tick_levels(10);

    assert!(bench.started().is_empty());
    assert!(!bench.sequencer.latched().failsafe_radio);
}
