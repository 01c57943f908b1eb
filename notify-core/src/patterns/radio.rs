//! Radio failsafe tones.
//!
//! `RadioLost` is a 900 ms tone followed by a pause. Once the vehicle has
//! been armed at least once it keeps looping every two seconds so a crashed
//! model can be found by ear. `RadioRecovered` plays a long tone and a short
//! one, then stops.

use super::{Pattern, PatternEnding, PatternTemplate, ToneStep};

/// Step count after which a looping `RadioLost` restarts from the top.
pub const RADIO_LOST_PERIOD: u16 = 20;

pub const RADIO_LOST_STEPS: [ToneStep; 10] = [
    ToneStep::On,
    ToneStep::On,
    ToneStep::On,
    ToneStep::On,
    ToneStep::On,
    ToneStep::On,
    ToneStep::On,
    ToneStep::On,
    ToneStep::On,
    ToneStep::Off,
];

pub const RADIO_RECOVERED_STEPS: [ToneStep; 7] = [
    ToneStep::On,
    ToneStep::On,
    ToneStep::On,
    ToneStep::On,
    ToneStep::Off,
    ToneStep::On,
    ToneStep::Off,
];

pub const RADIO_LOST_TEMPLATE: PatternTemplate = PatternTemplate::new(
    Pattern::RadioLost,
    &RADIO_LOST_STEPS,
    PatternEnding::RepeatWhenEverArmed {
        period: RADIO_LOST_PERIOD,
    },
    true,
);

pub const RADIO_RECOVERED_TEMPLATE: PatternTemplate = PatternTemplate::new(
    Pattern::RadioRecovered,
    &RADIO_RECOVERED_STEPS,
    PatternEnding::Once,
    false,
);
