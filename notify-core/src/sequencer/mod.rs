//! Signal sequencer: multiplexes vehicle status changes onto one buzzer.
//!
//! The sequencer is polled at a fixed rate (50 Hz by default) with a
//! [`NotifyStatus`] snapshot. It decimates those calls down to a 10 Hz pattern
//! clock, advances the active tone pattern one step per decimated tick, and
//! when idle checks the status flags for transitions in a fixed priority
//! order. Only one pattern plays at a time; starting one discards whatever was
//! in flight.
//!
//! Nothing here blocks or allocates. The only side effects are writes through
//! the [`OutputDriver`] and records appended to the caller's
//! [`TelemetryRecorder`].

use core::{fmt, time::Duration};

use crate::patterns::{Pattern, PatternEnding, PatternTemplate, ToneStep, template_for};
use crate::status::NotifyStatus;
use crate::telemetry::{TelemetryInstant, TelemetryRecorder};

/// Default number of external calls per decimated pattern tick (50 Hz → 10 Hz).
pub const DEFAULT_DECIMATION: u8 = 5;

/// Period between external [`SignalSequencer::update`] calls.
pub const UPDATE_PERIOD: Duration = Duration::from_millis(20);

/// Electrical level that makes the buzzer sound.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum OutputPolarity {
    ActiveHigh,
    ActiveLow,
}

impl OutputPolarity {
    /// Maps the logical buzzer state onto the pin level.
    #[must_use]
    pub const fn pin_level(self, on: bool) -> bool {
        match self {
            OutputPolarity::ActiveHigh => on,
            OutputPolarity::ActiveLow => !on,
        }
    }
}

/// Metadata describing the pin that drives the buzzer.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct OutputChannel {
    pub name: &'static str,
    pub mcu_pin: &'static str,
    pub polarity: OutputPolarity,
}

impl OutputChannel {
    pub const fn new(name: &'static str, mcu_pin: &'static str, polarity: OutputPolarity) -> Self {
        Self {
            name,
            mcu_pin,
            polarity,
        }
    }
}

/// Boot-time configuration consumed by [`SignalSequencer::init`].
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct SequencerConfig {
    /// Whether audible notifications are permitted at all.
    pub enabled: bool,
    /// Pin assigned to the buzzer; `None` leaves the sequencer disabled.
    pub channel: Option<OutputChannel>,
    /// External calls per decimated tick. Zero is treated as one.
    pub decimation: u8,
}

impl SequencerConfig {
    /// Creates an enabled configuration for `channel`.
    #[must_use]
    pub const fn new(channel: OutputChannel) -> Self {
        Self {
            enabled: true,
            channel: Some(channel),
            decimation: DEFAULT_DECIMATION,
        }
    }

    /// Configuration with notifications switched off.
    #[must_use]
    pub const fn disabled() -> Self {
        Self {
            enabled: false,
            channel: None,
            decimation: DEFAULT_DECIMATION,
        }
    }

    /// Overrides the decimation factor.
    #[must_use]
    pub const fn with_decimation(mut self, decimation: u8) -> Self {
        self.decimation = decimation;
        self
    }

    /// Validates the configuration and returns the channel to drive.
    ///
    /// # Errors
    ///
    /// Returns [`InitError::NotificationDisabled`] when notifications are off
    /// and [`InitError::NoOutputChannel`] when no pin is assigned.
    pub const fn resolve_channel(&self) -> Result<OutputChannel, InitError> {
        if !self.enabled {
            return Err(InitError::NotificationDisabled);
        }
        match self.channel {
            Some(channel) => Ok(channel),
            None => Err(InitError::NoOutputChannel),
        }
    }
}

impl Default for SequencerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            channel: None,
            decimation: DEFAULT_DECIMATION,
        }
    }
}

/// Reason the sequencer refused to start.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum InitError {
    NotificationDisabled,
    NoOutputChannel,
}

impl fmt::Display for InitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InitError::NotificationDisabled => f.write_str("buzzer notifications disabled"),
            InitError::NoOutputChannel => f.write_str("no buzzer output channel assigned"),
        }
    }
}

/// Abstraction over the physical buzzer pin.
pub trait OutputDriver {
    /// Drives `channel` to the electrical `level` (`true` == high).
    fn set_level(&mut self, channel: &OutputChannel, level: bool);
}

/// Output driver that performs no hardware interaction.
#[derive(Copy, Clone, Debug, Default)]
pub struct NoopOutputDriver;

impl NoopOutputDriver {
    /// Creates a new no-op output driver.
    pub const fn new() -> Self {
        Self
    }
}

impl OutputDriver for NoopOutputDriver {
    fn set_level(&mut self, _: &OutputChannel, _: bool) {}
}

/// Status condition that started a pattern.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Trigger {
    ArmingFailed,
    RadioLost,
    RadioRecovered,
    InitializeComplete,
    Armed,
    Disarmed,
    EkfBad,
    VehicleLost,
    BatteryFailsafe,
}

impl Trigger {
    /// Pattern played in response to the trigger.
    #[must_use]
    pub const fn pattern(self) -> Pattern {
        match self {
            Trigger::ArmingFailed | Trigger::Disarmed | Trigger::BatteryFailsafe => {
                Pattern::SingleBuzz
            }
            Trigger::RadioLost => Pattern::RadioLost,
            Trigger::RadioRecovered => Pattern::RadioRecovered,
            Trigger::InitializeComplete => Pattern::InitializeComplete,
            Trigger::Armed => Pattern::ArmingBuzz,
            Trigger::EkfBad => Pattern::EkfBad,
            Trigger::VehicleLost => Pattern::DoubleBuzz,
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Trigger::ArmingFailed => "arming-failed",
            Trigger::RadioLost => "radio-lost",
            Trigger::RadioRecovered => "radio-recovered",
            Trigger::InitializeComplete => "initialize-complete",
            Trigger::Armed => "armed",
            Trigger::Disarmed => "disarmed",
            Trigger::EkfBad => "ekf-bad",
            Trigger::VehicleLost => "vehicle-lost",
            Trigger::BatteryFailsafe => "battery-failsafe",
        }
    }
}

impl fmt::Display for Trigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Status values the sequencer has already reacted to.
///
/// Each field only changes when its trigger fires, so a transition is
/// reported once no matter how many ticks the new level persists.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct LatchedFlags {
    pub armed: bool,
    pub failsafe_radio: bool,
    pub ekf_bad: bool,
    /// Set on the first arming and never cleared.
    pub ever_armed: bool,
    pub initialize_done: bool,
    pub hardware_ready: bool,
}

/// Buzzer pattern state machine.
pub struct SignalSequencer<D, I>
where
    D: OutputDriver,
    I: TelemetryInstant,
{
    config: SequencerConfig,
    driver: D,
    channel: Option<OutputChannel>,
    init_error: Option<InitError>,
    active: Pattern,
    step: u16,
    decimation_counter: u8,
    output_level: bool,
    latched: LatchedFlags,
    pattern_started_at: Option<I>,
    hold_mark: Option<I>,
}

impl<D, I> SignalSequencer<D, I>
where
    D: OutputDriver,
    I: TelemetryInstant,
{
    /// Creates a sequencer that stays inert until [`init`](Self::init) succeeds.
    pub const fn new(config: SequencerConfig, driver: D) -> Self {
        Self {
            config,
            driver,
            channel: None,
            init_error: None,
            active: Pattern::None,
            step: 0,
            decimation_counter: 0,
            output_level: false,
            latched: LatchedFlags {
                armed: false,
                failsafe_radio: false,
                ekf_bad: false,
                ever_armed: false,
                initialize_done: false,
                hardware_ready: false,
            },
            pattern_started_at: None,
            hold_mark: None,
        }
    }

    /// Validates the configuration, silences the buzzer, and seeds the latches
    /// from `status` so booting into an already-armed state stays quiet.
    ///
    /// # Errors
    ///
    /// Returns the [`InitError`] describing the missing resource. The
    /// sequencer then ignores every subsequent [`update`](Self::update).
    pub fn init(&mut self, status: &NotifyStatus) -> Result<(), InitError> {
        let channel = match self.config.resolve_channel() {
            Ok(channel) => channel,
            Err(err) => {
                self.init_error = Some(err);
                self.latched.hardware_ready = false;
                return Err(err);
            }
        };

        self.channel = Some(channel);
        self.init_error = None;
        self.driver
            .set_level(&channel, channel.polarity.pin_level(false));
        self.output_level = false;

        self.latched = LatchedFlags {
            armed: status.armed,
            hardware_ready: true,
            ..LatchedFlags::default()
        };
        self.active = Pattern::None;
        self.step = 0;
        self.decimation_counter = 0;
        self.pattern_started_at = None;
        self.hold_mark = None;

        Ok(())
    }

    /// Returns `true` once [`init`](Self::init) has succeeded.
    pub const fn is_ready(&self) -> bool {
        self.latched.hardware_ready
    }

    /// Returns the reason initialization failed, if it did.
    pub const fn init_error(&self) -> Option<InitError> {
        self.init_error
    }

    /// Pattern currently playing ([`Pattern::None`] when idle).
    pub const fn active_pattern(&self) -> Pattern {
        self.active
    }

    /// Step counter of the active pattern (0 right after a start).
    pub const fn step(&self) -> u16 {
        self.step
    }

    /// Logical buzzer state (`true` == sounding).
    pub const fn output_level(&self) -> bool {
        self.output_level
    }

    /// Status values the sequencer has already reacted to.
    pub const fn latched(&self) -> LatchedFlags {
        self.latched
    }

    /// Returns the configuration the sequencer was built with.
    pub const fn config(&self) -> &SequencerConfig {
        &self.config
    }

    /// Accesses the underlying output driver.
    pub fn driver(&self) -> &D {
        &self.driver
    }

    /// Mutably accesses the underlying output driver.
    pub fn driver_mut(&mut self) -> &mut D {
        &mut self.driver
    }

    /// Drives the buzzer on or off. Writes the pin only when the level
    /// actually changes and returns `true` when a write happened.
    pub fn on(&mut self, level: bool) -> bool {
        let Some(channel) = self.channel else {
            return false;
        };
        if self.output_level == level {
            return false;
        }

        self.output_level = level;
        self.driver
            .set_level(&channel, channel.polarity.pin_level(level));
        true
    }

    /// Makes `pattern` the active one starting from its first step. The output
    /// is left alone until the next pattern tick plays that step.
    pub fn start_pattern(&mut self, pattern: Pattern) {
        self.active = pattern;
        self.step = 0;
        self.hold_mark = None;
    }

    /// Runs one fixed-rate invocation.
    pub fn update<const CAPACITY: usize>(
        &mut self,
        status: &NotifyStatus,
        now: I,
        telemetry: &mut TelemetryRecorder<I, CAPACITY>,
    ) {
        if !self.latched.hardware_ready {
            return;
        }

        if status.arming_failed {
            self.begin(Trigger::ArmingFailed, now, telemetry);
            return;
        }

        self.decimation_counter = self.decimation_counter.saturating_add(1);
        if self.decimation_counter < self.config.decimation.max(1) {
            return;
        }
        self.decimation_counter = 0;

        if !self.active.is_idle() {
            let yields = self.advance(now, telemetry);
            if !yields {
                return;
            }
        }

        self.evaluate_triggers(status, now, telemetry);
    }

    /// Plays the next step of the active pattern. Returns `true` when trigger
    /// evaluation should still run on this tick.
    fn advance<const CAPACITY: usize>(
        &mut self,
        now: I,
        telemetry: &mut TelemetryRecorder<I, CAPACITY>,
    ) -> bool {
        let Some(template) = template_for(self.active) else {
            self.active = Pattern::None;
            return true;
        };

        let yields = template.yields_when(self.latched.ever_armed);
        self.step = self.step.saturating_add(1);

        match template.step_at(self.step) {
            Some(step) => {
                if !self.play_step(step, now, telemetry) {
                    // Elapsed-time hold not satisfied yet: replay this step next tick.
                    self.step -= 1;
                    return yields;
                }
                if usize::from(self.step) == template.step_count() {
                    self.finish_table(&template, now, telemetry);
                }
            }
            None => self.drive(false, now, telemetry),
        }

        if let PatternEnding::RepeatWhenEverArmed { period } = template.ending
            && self.active == template.pattern
            && self.step >= period
        {
            self.step = 0;
        }

        yields
    }

    /// Applies a single tone step. Returns `false` when the step is waiting on
    /// an elapsed-time hold.
    fn play_step<const CAPACITY: usize>(
        &mut self,
        step: ToneStep,
        now: I,
        telemetry: &mut TelemetryRecorder<I, CAPACITY>,
    ) -> bool {
        match step {
            ToneStep::On => self.drive(true, now, telemetry),
            ToneStep::Off => self.drive(false, now, telemetry),
            ToneStep::Hold => {}
            ToneStep::OnMarked => {
                self.hold_mark = Some(now);
                self.drive(true, now, telemetry);
            }
            ToneStep::OffAfter(hold) => {
                let elapsed = self
                    .hold_mark
                    .map_or(Duration::MAX, |mark| now.saturating_duration_since(mark));
                if elapsed < hold {
                    return false;
                }
                self.hold_mark = None;
                self.drive(false, now, telemetry);
            }
        }
        true
    }

    fn finish_table<const CAPACITY: usize>(
        &mut self,
        template: &PatternTemplate,
        now: I,
        telemetry: &mut TelemetryRecorder<I, CAPACITY>,
    ) {
        let keeps_looping = match template.ending {
            PatternEnding::Once => false,
            PatternEnding::RepeatWhenEverArmed { .. } => self.latched.ever_armed,
        };
        if keeps_looping {
            return;
        }

        self.drive(false, now, telemetry);
        telemetry.record_pattern_complete(self.active, self.pattern_started_at, self.step, now);
        self.active = Pattern::None;
        self.step = 0;
        self.pattern_started_at = None;
        self.hold_mark = None;
    }

    fn evaluate_triggers<const CAPACITY: usize>(
        &mut self,
        status: &NotifyStatus,
        now: I,
        telemetry: &mut TelemetryRecorder<I, CAPACITY>,
    ) {
        if let Some(trigger) = self.next_trigger(status) {
            self.begin(trigger, now, telemetry);
        }
    }

    /// Compares `status` against the latches in priority order, updating the
    /// latch of the first transition found.
    fn next_trigger(&mut self, status: &NotifyStatus) -> Option<Trigger> {
        let latched = &mut self.latched;

        if latched.failsafe_radio != status.failsafe_radio && !status.initialising {
            latched.failsafe_radio = status.failsafe_radio;
            return Some(if status.failsafe_radio {
                Trigger::RadioLost
            } else {
                Trigger::RadioRecovered
            });
        }

        if !latched.initialize_done && !status.initialising {
            latched.initialize_done = true;
            return Some(Trigger::InitializeComplete);
        }

        // The looping failsafe tone must not be interrupted.
        if latched.failsafe_radio && latched.ever_armed {
            return None;
        }

        if latched.armed != status.armed {
            latched.armed = status.armed;
            return Some(if status.armed {
                latched.ever_armed = true;
                Trigger::Armed
            } else {
                Trigger::Disarmed
            });
        }

        if latched.ekf_bad != status.ekf_bad {
            latched.ekf_bad = status.ekf_bad;
            // Recovery is silent but still consumes the tick.
            return status.ekf_bad.then_some(Trigger::EkfBad);
        }

        if status.vehicle_lost {
            return Some(Trigger::VehicleLost);
        }

        if status.failsafe_battery {
            return Some(Trigger::BatteryFailsafe);
        }

        None
    }

    fn begin<const CAPACITY: usize>(
        &mut self,
        trigger: Trigger,
        now: I,
        telemetry: &mut TelemetryRecorder<I, CAPACITY>,
    ) {
        let replaced = (!self.active.is_idle()).then_some(self.active);
        if let Some(previous) = replaced {
            telemetry.record_pattern_replaced(previous, self.pattern_started_at, self.step, now);
        }

        let pattern = trigger.pattern();
        self.start_pattern(pattern);
        self.pattern_started_at = Some(now);
        telemetry.record_pattern_started(pattern, trigger, replaced, now);
    }

    fn drive<const CAPACITY: usize>(
        &mut self,
        level: bool,
        now: I,
        telemetry: &mut TelemetryRecorder<I, CAPACITY>,
    ) {
        if self.on(level) {
            telemetry.record_output_transition(level, now);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::telemetry::TelemetryEventKind;
    use heapless::Vec as HeaplessVec;

    const CHANNEL: OutputChannel = OutputChannel::new("BUZZER", "PA8", OutputPolarity::ActiveHigh);

    #[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
    struct MockInstant(u64);

    impl MockInstant {
        fn millis(value: u64) -> Self {
            Self(value * 1_000)
        }
    }

    impl TelemetryInstant for MockInstant {
        fn saturating_duration_since(&self, earlier: Self) -> Duration {
            Duration::from_micros(self.0.saturating_sub(earlier.0))
        }
    }

    #[derive(Default)]
    struct RecordingDriver {
        writes: HeaplessVec<bool, 64>,
    }

    impl OutputDriver for RecordingDriver {
        fn set_level(&mut self, _: &OutputChannel, level: bool) {
            self.writes.push(level).expect("write log overflow");
        }
    }

    fn ready(config: SequencerConfig) -> SignalSequencer<RecordingDriver, MockInstant> {
        let mut sequencer = SignalSequencer::new(config, RecordingDriver::default());
        sequencer
            .init(&NotifyStatus::default())
            .expect("init should succeed");
        sequencer.driver_mut().writes.clear();
        sequencer
    }

    #[test]
    fn init_rejects_disabled_configuration() {
        let mut sequencer: SignalSequencer<RecordingDriver, MockInstant> =
            SignalSequencer::new(SequencerConfig::disabled(), RecordingDriver::default());

        assert_eq!(
            sequencer.init(&NotifyStatus::default()),
            Err(InitError::NotificationDisabled)
        );
        assert!(!sequencer.is_ready());
        assert_eq!(sequencer.init_error(), Some(InitError::NotificationDisabled));
        assert!(sequencer.driver().writes.is_empty());
    }

    #[test]
    fn init_rejects_missing_channel() {
        let mut sequencer: SignalSequencer<RecordingDriver, MockInstant> =
            SignalSequencer::new(SequencerConfig::default(), RecordingDriver::default());

        assert_eq!(
            sequencer.init(&NotifyStatus::default()),
            Err(InitError::NoOutputChannel)
        );
        assert!(!sequencer.on(true));
        assert!(sequencer.driver().writes.is_empty());
    }

    #[test]
    fn init_silences_output_using_polarity() {
        let channel = OutputChannel::new("BUZZER", "PB3", OutputPolarity::ActiveLow);
        let mut sequencer: SignalSequencer<RecordingDriver, MockInstant> =
            SignalSequencer::new(SequencerConfig::new(channel), RecordingDriver::default());

        sequencer
            .init(&NotifyStatus::default())
            .expect("init should succeed");

        assert_eq!(sequencer.driver().writes.as_slice(), &[true]);
        assert!(!sequencer.output_level());

        assert!(sequencer.on(true));
        assert_eq!(sequencer.driver().writes.as_slice(), &[true, false]);
    }

    #[test]
    fn on_is_idempotent() {
        let mut sequencer = ready(SequencerConfig::new(CHANNEL));

        assert!(sequencer.on(true));
        assert!(!sequencer.on(true));
        assert_eq!(sequencer.driver().writes.as_slice(), &[true]);

        assert!(sequencer.on(false));
        assert!(!sequencer.on(false));
        assert_eq!(sequencer.driver().writes.as_slice(), &[true, false]);
    }

    #[test]
    fn start_pattern_resets_step_without_touching_output() {
        let mut sequencer = ready(SequencerConfig::new(CHANNEL));
        sequencer.start_pattern(Pattern::DoubleBuzz);

        assert_eq!(sequencer.active_pattern(), Pattern::DoubleBuzz);
        assert_eq!(sequencer.step(), 0);
        assert!(sequencer.driver().writes.is_empty());
    }

    #[test]
    fn decimation_factor_is_configurable() {
        let mut sequencer = ready(SequencerConfig::new(CHANNEL).with_decimation(2));
        let mut telemetry = TelemetryRecorder::<MockInstant>::new();
        let status = NotifyStatus::booting();

        sequencer.start_pattern(Pattern::SingleBuzz);
        sequencer.update(&status, MockInstant::millis(0), &mut telemetry);
        assert!(!sequencer.output_level());

        sequencer.update(&status, MockInstant::millis(20), &mut telemetry);
        assert!(sequencer.output_level());
        assert_eq!(telemetry.latest().unwrap().event, TelemetryEventKind::BuzzerOn);
    }

    #[test]
    fn zero_decimation_ticks_every_call() {
        let mut sequencer = ready(SequencerConfig::new(CHANNEL).with_decimation(0));
        let mut telemetry = TelemetryRecorder::<MockInstant>::new();

        sequencer.start_pattern(Pattern::SingleBuzz);
        sequencer.update(&NotifyStatus::booting(), MockInstant::millis(0), &mut telemetry);
        assert!(sequencer.output_level());
    }

    #[test]
    fn trigger_patterns_match_notification_table() {
        assert_eq!(Trigger::Armed.pattern(), Pattern::ArmingBuzz);
        assert_eq!(Trigger::Disarmed.pattern(), Pattern::SingleBuzz);
        assert_eq!(Trigger::ArmingFailed.pattern(), Pattern::SingleBuzz);
        assert_eq!(Trigger::BatteryFailsafe.pattern(), Pattern::SingleBuzz);
        assert_eq!(Trigger::VehicleLost.pattern(), Pattern::DoubleBuzz);
        assert_eq!(Trigger::EkfBad.pattern(), Pattern::EkfBad);
    }
}
