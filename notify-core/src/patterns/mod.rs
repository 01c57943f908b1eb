//! Buzzer tone pattern data shared by firmware and host targets.
//!
//! Each pattern is a fixed table of per-tick output actions played on the
//! decimated 10 Hz clock. The sequencer walks these tables with a single
//! generic routine, so adding a pattern only means adding a template here.
//! Everything in this module is `no_std` friendly and `const` constructed.

use core::{fmt, time::Duration};

pub mod alerts;
pub mod arming;
pub mod radio;
pub mod startup;

pub use alerts::{
    BARO_GLITCH_TEMPLATE, DOUBLE_BUZZ_TEMPLATE, EKF_BAD_TEMPLATE, SINGLE_BUZZ_TEMPLATE,
};
pub use arming::{ARMING_BUZZ_HOLD, ARMING_BUZZ_TEMPLATE};
pub use radio::{RADIO_LOST_TEMPLATE, RADIO_RECOVERED_TEMPLATE};
pub use startup::INITIALIZE_COMPLETE_TEMPLATE;

/// Period of one decimated pattern tick.
pub const PATTERN_TICK: Duration = Duration::from_millis(100);

/// Number of playable patterns (everything except [`Pattern::None`]).
pub const PATTERN_COUNT: usize = 8;

/// Named tone sequence communicating one status condition.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub enum Pattern {
    /// Idle sentinel: nothing is mid-playback.
    #[default]
    None,
    SingleBuzz,
    DoubleBuzz,
    ArmingBuzz,
    BaroGlitch,
    EkfBad,
    RadioLost,
    RadioRecovered,
    InitializeComplete,
}

impl Pattern {
    /// Every playable pattern in catalog order.
    pub const ALL: [Pattern; PATTERN_COUNT] = [
        Pattern::SingleBuzz,
        Pattern::DoubleBuzz,
        Pattern::ArmingBuzz,
        Pattern::BaroGlitch,
        Pattern::EkfBad,
        Pattern::RadioLost,
        Pattern::RadioRecovered,
        Pattern::InitializeComplete,
    ];

    /// Returns `true` for the idle sentinel.
    #[must_use]
    pub const fn is_idle(self) -> bool {
        matches!(self, Pattern::None)
    }

    /// Deterministic index into [`Pattern::ALL`]; `None` for the idle sentinel.
    #[must_use]
    pub const fn as_index(self) -> Option<usize> {
        match self {
            Pattern::None => None,
            Pattern::SingleBuzz => Some(0),
            Pattern::DoubleBuzz => Some(1),
            Pattern::ArmingBuzz => Some(2),
            Pattern::BaroGlitch => Some(3),
            Pattern::EkfBad => Some(4),
            Pattern::RadioLost => Some(5),
            Pattern::RadioRecovered => Some(6),
            Pattern::InitializeComplete => Some(7),
        }
    }

    /// Attempts to construct a playable [`Pattern`] from a raw index.
    #[must_use]
    pub const fn from_index(index: usize) -> Option<Self> {
        if index < PATTERN_COUNT {
            Some(Self::ALL[index])
        } else {
            None
        }
    }

    /// Short kebab-case label used by logs and the bench console.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Pattern::None => "none",
            Pattern::SingleBuzz => "single-buzz",
            Pattern::DoubleBuzz => "double-buzz",
            Pattern::ArmingBuzz => "arming-buzz",
            Pattern::BaroGlitch => "baro-glitch",
            Pattern::EkfBad => "ekf-bad",
            Pattern::RadioLost => "radio-lost",
            Pattern::RadioRecovered => "radio-recovered",
            Pattern::InitializeComplete => "initialize-complete",
        }
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Action applied to the buzzer output on one decimated tick.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ToneStep {
    /// Drive the buzzer on.
    On,
    /// Drive the buzzer off.
    Off,
    /// Leave the output untouched.
    Hold,
    /// Drive the buzzer on and remember the tick time as the hold mark.
    OnMarked,
    /// Keep the current level until `Duration` has elapsed since the hold mark,
    /// then drive the buzzer off. The step repeats until the deadline passes.
    OffAfter(Duration),
}

impl ToneStep {
    /// Level written by this step when it fires, if any.
    #[must_use]
    pub const fn level(self) -> Option<bool> {
        match self {
            ToneStep::On | ToneStep::OnMarked => Some(true),
            ToneStep::Off | ToneStep::OffAfter(_) => Some(false),
            ToneStep::Hold => None,
        }
    }
}

/// What happens once the last step of a table has played.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum PatternEnding {
    /// Return to [`Pattern::None`] after the final step.
    Once,
    /// Once the vehicle has ever been armed, hold the output low until the
    /// step counter reaches `period` and then restart from the first step.
    /// Otherwise behaves like [`PatternEnding::Once`].
    RepeatWhenEverArmed { period: u16 },
}

/// Immutable tone pattern template.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct PatternTemplate {
    pub pattern: Pattern,
    pub steps: &'static [ToneStep],
    pub ending: PatternEnding,
    /// When set, trigger evaluation still runs on ticks this pattern advances,
    /// so a status change can replace it mid-playback. Repeating templates
    /// only yield once the loop is live (see [`Self::yields_when`]).
    pub yields_tick: bool,
}

impl PatternTemplate {
    pub const fn new(
        pattern: Pattern,
        steps: &'static [ToneStep],
        ending: PatternEnding,
        yields_tick: bool,
    ) -> Self {
        Self {
            pattern,
            steps,
            ending,
            yields_tick,
        }
    }

    /// Returns the ordered tone steps.
    #[must_use]
    pub const fn steps(&self) -> &'static [ToneStep] {
        self.steps
    }

    /// Number of table entries, which is also the tick count of a single
    /// playback for patterns without an elapsed-time hold.
    #[must_use]
    pub const fn step_count(&self) -> usize {
        self.steps.len()
    }

    /// Looks up the step played on the 1-based tick `tick`.
    #[must_use]
    pub fn step_at(&self, tick: u16) -> Option<ToneStep> {
        let index = usize::from(tick).checked_sub(1)?;
        self.steps.get(index).copied()
    }

    /// Whether an advancing tick is shared with trigger evaluation, given the
    /// ever-armed latch. A repeating template plays its single pass
    /// uninterrupted until the loop is armed.
    #[must_use]
    pub const fn yields_when(&self, ever_armed: bool) -> bool {
        self.yields_tick && (ever_armed || !self.can_repeat())
    }

    /// Returns `true` when the template can loop forever.
    #[must_use]
    pub const fn can_repeat(&self) -> bool {
        matches!(self.ending, PatternEnding::RepeatWhenEverArmed { .. })
    }
}

/// Returns the template that plays `pattern`, or `None` for the idle sentinel.
#[must_use]
pub const fn template_for(pattern: Pattern) -> Option<PatternTemplate> {
    match pattern {
        Pattern::None => None,
        Pattern::SingleBuzz => Some(SINGLE_BUZZ_TEMPLATE),
        Pattern::DoubleBuzz => Some(DOUBLE_BUZZ_TEMPLATE),
        Pattern::ArmingBuzz => Some(ARMING_BUZZ_TEMPLATE),
        Pattern::BaroGlitch => Some(BARO_GLITCH_TEMPLATE),
        Pattern::EkfBad => Some(EKF_BAD_TEMPLATE),
        Pattern::RadioLost => Some(RADIO_LOST_TEMPLATE),
        Pattern::RadioRecovered => Some(RADIO_RECOVERED_TEMPLATE),
        Pattern::InitializeComplete => Some(INITIALIZE_COMPLETE_TEMPLATE),
    }
}
