//! Arming tone: one long buzz timed against the wall clock.
//!
//! The first tick turns the buzzer on and marks the time. The second entry
//! repeats every tick until [`ARMING_BUZZ_HOLD`] has elapsed since the mark,
//! so the tone length does not depend on how evenly the ticks arrive.

use core::time::Duration;

use super::{Pattern, PatternEnding, PatternTemplate, ToneStep};

/// Minimum time the arming tone stays on.
pub const ARMING_BUZZ_HOLD: Duration = Duration::from_millis(3_000);

pub const ARMING_BUZZ_STEPS: [ToneStep; 2] =
    [ToneStep::OnMarked, ToneStep::OffAfter(ARMING_BUZZ_HOLD)];

pub const ARMING_BUZZ_TEMPLATE: PatternTemplate = PatternTemplate::new(
    Pattern::ArmingBuzz,
    &ARMING_BUZZ_STEPS,
    PatternEnding::Once,
    false,
);
