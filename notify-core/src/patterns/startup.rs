//! Boot-complete tone: three short pulses, played once per process.

use super::{Pattern, PatternEnding, PatternTemplate, ToneStep};

pub const INITIALIZE_COMPLETE_STEPS: [ToneStep; 6] = [
    ToneStep::On,
    ToneStep::Off,
    ToneStep::On,
    ToneStep::Off,
    ToneStep::On,
    ToneStep::Off,
];

pub const INITIALIZE_COMPLETE_TEMPLATE: PatternTemplate = PatternTemplate::new(
    Pattern::InitializeComplete,
    &INITIALIZE_COMPLETE_STEPS,
    PatternEnding::Once,
    false,
);
