//! Short alert patterns: single/double buzz, baro glitch, and EKF failure.
//!
//! One entry per 100 ms tick. The final entry drives the buzzer low and
//! returns the sequencer to idle.

use super::{Pattern, PatternEnding, PatternTemplate, ToneStep};

/// Disarm, arming-failed and battery failsafe: a single 100 ms buzz.
pub const SINGLE_BUZZ_STEPS: [ToneStep; 2] = [ToneStep::On, ToneStep::Off];

/// Vehicle-lost locator: two 100 ms buzzes.
pub const DOUBLE_BUZZ_STEPS: [ToneStep; 4] =
    [ToneStep::On, ToneStep::Off, ToneStep::On, ToneStep::Off];

/// Four fast tones followed by a trailing off tick.
pub const BARO_GLITCH_STEPS: [ToneStep; 9] = [
    ToneStep::On,
    ToneStep::Off,
    ToneStep::On,
    ToneStep::Off,
    ToneStep::On,
    ToneStep::Off,
    ToneStep::On,
    ToneStep::Off,
    ToneStep::Off,
];

/// Four tones getting shorter: 300 ms, 200 ms, 100 ms, 100 ms.
pub const EKF_BAD_STEPS: [ToneStep; 11] = [
    ToneStep::On,
    ToneStep::Hold,
    ToneStep::Hold,
    ToneStep::Off,
    ToneStep::On,
    ToneStep::Hold,
    ToneStep::Off,
    ToneStep::On,
    ToneStep::Off,
    ToneStep::On,
    ToneStep::Off,
];

pub const SINGLE_BUZZ_TEMPLATE: PatternTemplate = PatternTemplate::new(
    Pattern::SingleBuzz,
    &SINGLE_BUZZ_STEPS,
    PatternEnding::Once,
    false,
);

pub const DOUBLE_BUZZ_TEMPLATE: PatternTemplate = PatternTemplate::new(
    Pattern::DoubleBuzz,
    &DOUBLE_BUZZ_STEPS,
    PatternEnding::Once,
    false,
);

pub const BARO_GLITCH_TEMPLATE: PatternTemplate = PatternTemplate::new(
    Pattern::BaroGlitch,
    &BARO_GLITCH_STEPS,
    PatternEnding::Once,
    false,
);

pub const EKF_BAD_TEMPLATE: PatternTemplate =
    PatternTemplate::new(Pattern::EkfBad, &EKF_BAD_STEPS, PatternEnding::Once, false);
