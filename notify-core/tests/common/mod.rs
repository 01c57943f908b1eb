#![allow(dead_code)]

use core::time::Duration;

use heapless::Vec as HeaplessVec;
use notify_core::patterns::Pattern;
use notify_core::sequencer::{
    DEFAULT_DECIMATION, OutputChannel, OutputDriver, OutputPolarity, SequencerConfig,
    SignalSequencer, UPDATE_PERIOD,
};
use notify_core::status::{NotifyStatus, StatusFlag};
use notify_core::telemetry::{
    EventId, TelemetryEventKind, TelemetryInstant, TelemetryRecord, TelemetryRecorder,
};

pub const BUZZER: OutputChannel = OutputChannel::new("BUZZER", "PA8", OutputPolarity::ActiveHigh);

const MAX_WRITES: usize = 512;
const MAX_LOG: usize = 1024;
pub const MAX_TICKS: usize = 400;

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct MockInstant(pub u64);

impl MockInstant {
    fn advance(self, by: Duration) -> Self {
        let micros = u64::try_from(by.as_micros()).expect("duration overflow");
        Self(self.0 + micros)
    }
}

impl TelemetryInstant for MockInstant {
    fn saturating_duration_since(&self, earlier: Self) -> Duration {
        Duration::from_micros(self.0.saturating_sub(earlier.0))
    }
}

#[derive(Default)]
pub struct RecordingDriver {
    pub writes: HeaplessVec<bool, MAX_WRITES>,
}

impl OutputDriver for RecordingDriver {
    fn set_level(&mut self, _: &OutputChannel, level: bool) {
        self.writes.push(level).expect("write log overflow");
    }
}

/// Drives a sequencer at 50 Hz against a simulated clock.
pub struct Bench {
    pub sequencer: SignalSequencer<RecordingDriver, MockInstant>,
    pub telemetry: TelemetryRecorder<MockInstant>,
    pub status: NotifyStatus,
    pub log: HeaplessVec<TelemetryRecord<MockInstant>, MAX_LOG>,
    now: MockInstant,
    cursor: EventId,
}

impl Bench {
    pub fn new(status: NotifyStatus) -> Self {
        let mut sequencer = SignalSequencer::new(SequencerConfig::new(BUZZER), RecordingDriver::default());
        sequencer.init(&status).expect("init should succeed");

        Self {
            sequencer,
            telemetry: TelemetryRecorder::new(),
            status,
            log: HeaplessVec::new(),
            now: MockInstant::default(),
            cursor: 0,
        }
    }

    /// Sequencer that has finished the boot chime and has never been armed.
    pub fn booted() -> Self {
        let mut bench = Self::new(NotifyStatus::booting());
        bench.set(StatusFlag::Initialising, false);
        bench.run_until_idle();
        bench.clear_history();
        bench
    }

    pub fn set(&mut self, flag: StatusFlag, value: bool) {
        self.status.set(flag, value);
    }

    pub fn raise_arming_failed(&mut self) {
        self.status.arming_failed = true;
    }

    /// Runs one external 50 Hz call.
    pub fn call(&mut self) {
        self.sequencer
            .update(&self.status, self.now, &mut self.telemetry);
        self.status.clear_events();

        for record in self.telemetry.since(self.cursor) {
            self.log.push(*record).expect("telemetry log overflow");
        }
        self.cursor = self.telemetry.next_event_id();
        self.now = self.now.advance(UPDATE_PERIOD);
    }

    /// Runs enough calls for exactly one decimated pattern tick.
    pub fn tick(&mut self) {
        for _ in 0..DEFAULT_DECIMATION {
            self.call();
        }
    }

    /// Runs `ticks` pattern ticks and returns the output level after each.
    pub fn tick_levels(&mut self, ticks: usize) -> HeaplessVec<bool, MAX_TICKS> {
        let mut levels = HeaplessVec::new();
        for _ in 0..ticks {
            self.tick();
            levels
                .push(self.sequencer.output_level())
                .expect("too many ticks");
        }
        levels
    }

    /// Ticks until no pattern is active and returns how many ticks it took.
    pub fn run_until_idle(&mut self) -> usize {
        let mut ticks = 0;
        loop {
            self.tick();
            ticks += 1;
            if self.sequencer.active_pattern().is_idle() {
                return ticks;
            }
            assert!(ticks < MAX_TICKS, "pattern never finished");
        }
    }

    /// Starts `pattern` directly and returns the level after every tick until
    /// it finishes.
    pub fn play(&mut self, pattern: Pattern) -> HeaplessVec<bool, MAX_TICKS> {
        self.sequencer.start_pattern(pattern);
        let mut levels = HeaplessVec::new();
        loop {
            self.tick();
            levels
                .push(self.sequencer.output_level())
                .expect("too many ticks");
            if self.sequencer.active_pattern().is_idle() {
                return levels;
            }
        }
    }

    /// Moves the clock forward without calling the sequencer.
    pub fn jump(&mut self, by: Duration) {
        self.now = self.now.advance(by);
    }

    pub fn clear_history(&mut self) {
        self.log.clear();
        self.sequencer.driver_mut().writes.clear();
    }

    pub fn writes(&self) -> &[bool] {
        &self.sequencer.driver().writes
    }

    pub fn count(&self, event: TelemetryEventKind) -> usize {
        self.log.iter().filter(|record| record.event == event).count()
    }

    pub fn started(&self) -> HeaplessVec<Pattern, 64> {
        self.log
            .iter()
            .filter_map(|record| match record.event {
                TelemetryEventKind::PatternStarted(pattern) => Some(pattern),
                _ => None,
            })
            .collect()
    }
}
