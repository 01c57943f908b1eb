//! Telemetry event catalog and ring buffer shared by firmware and host targets.
//!
//! The sequencer records every buzzer edge and pattern lifecycle change here
//! instead of logging directly, which keeps the core `no_std` and lets each
//! target decide how to surface the history (`defmt` on the MCU, transcripts
//! in the emulator). Event kinds encode to compact numeric codes for
//! diagnostics transports.

use core::{fmt, time::Duration};

use heapless::{HistoryBuf, OldestOrdered};

use crate::patterns::Pattern;
use crate::sequencer::Trigger;

/// Identifier used when tracking emitted telemetry events.
pub type EventId = u32;

/// Total number of telemetry entries retained in memory.
pub const TELEMETRY_RING_CAPACITY: usize = 64;

/// Discriminated telemetry events.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum TelemetryEventKind {
    BuzzerOn,
    BuzzerOff,
    PatternStarted(Pattern),
    PatternComplete(Pattern),
    PatternReplaced(Pattern),
    Custom(u16),
}

impl fmt::Display for TelemetryEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TelemetryEventKind::BuzzerOn => f.write_str("buzzer-on"),
            TelemetryEventKind::BuzzerOff => f.write_str("buzzer-off"),
            TelemetryEventKind::PatternStarted(pattern) => write!(f, "pattern-started {pattern}"),
            TelemetryEventKind::PatternComplete(pattern) => {
                write!(f, "pattern-complete {pattern}")
            }
            TelemetryEventKind::PatternReplaced(pattern) => {
                write!(f, "pattern-replaced {pattern}")
            }
            TelemetryEventKind::Custom(code) => write!(f, "custom({code})"),
        }
    }
}

impl TelemetryEventKind {
    const BUZZER_ON_CODE: u16 = 0x0000;
    const BUZZER_OFF_CODE: u16 = 0x0001;
    const PATTERN_STARTED_BASE: u16 = 0x0010;
    const PATTERN_COMPLETE_BASE: u16 = 0x0020;
    const PATTERN_REPLACED_BASE: u16 = 0x0030;
    const PATTERN_BLOCK: u16 = 0x0010;

    /// Encodes the event into a compact transport-friendly discriminant.
    #[must_use]
    pub const fn to_raw(self) -> u16 {
        match self {
            TelemetryEventKind::BuzzerOn => Self::BUZZER_ON_CODE,
            TelemetryEventKind::BuzzerOff => Self::BUZZER_OFF_CODE,
            TelemetryEventKind::PatternStarted(pattern) => {
                Self::PATTERN_STARTED_BASE + pattern_code(pattern)
            }
            TelemetryEventKind::PatternComplete(pattern) => {
                Self::PATTERN_COMPLETE_BASE + pattern_code(pattern)
            }
            TelemetryEventKind::PatternReplaced(pattern) => {
                Self::PATTERN_REPLACED_BASE + pattern_code(pattern)
            }
            TelemetryEventKind::Custom(code) => code,
        }
    }

    /// Decodes a raw discriminant into a telemetry event, falling back to [`Custom`].
    ///
    /// [`Custom`]: TelemetryEventKind::Custom
    #[must_use]
    pub fn from_raw(code: u16) -> Self {
        let block = |base: u16| base..base + Self::PATTERN_BLOCK;
        match code {
            Self::BUZZER_ON_CODE => TelemetryEventKind::BuzzerOn,
            Self::BUZZER_OFF_CODE => TelemetryEventKind::BuzzerOff,
            value if block(Self::PATTERN_STARTED_BASE).contains(&value) => {
                pattern_from_code(value - Self::PATTERN_STARTED_BASE)
                    .map_or(TelemetryEventKind::Custom(value), |pattern| {
                        TelemetryEventKind::PatternStarted(pattern)
                    })
            }
            value if block(Self::PATTERN_COMPLETE_BASE).contains(&value) => {
                pattern_from_code(value - Self::PATTERN_COMPLETE_BASE)
                    .map_or(TelemetryEventKind::Custom(value), |pattern| {
                        TelemetryEventKind::PatternComplete(pattern)
                    })
            }
            value if block(Self::PATTERN_REPLACED_BASE).contains(&value) => {
                pattern_from_code(value - Self::PATTERN_REPLACED_BASE)
                    .map_or(TelemetryEventKind::Custom(value), |pattern| {
                        TelemetryEventKind::PatternReplaced(pattern)
                    })
            }
            other => TelemetryEventKind::Custom(other),
        }
    }
}

/// Payloads carried alongside telemetry events.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TelemetryPayload {
    /// No additional metadata accompanies the event.
    None,
    /// Details describing a buzzer edge.
    Output(OutputTelemetry),
    /// Why a pattern started.
    Start(StartTelemetry),
    /// How far a pattern got before it ended or was replaced.
    Playback(PlaybackTelemetry),
}

impl TelemetryPayload {
    /// Convenience constructor when no payload data is needed.
    #[must_use]
    pub const fn none() -> Self {
        TelemetryPayload::None
    }
}

/// Buzzer edge payload.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct OutputTelemetry {
    pub level: bool,
    pub elapsed_since_previous: Option<Duration>,
}

impl OutputTelemetry {
    #[must_use]
    pub const fn new(level: bool, elapsed_since_previous: Option<Duration>) -> Self {
        Self {
            level,
            elapsed_since_previous,
        }
    }
}

/// Pattern start payload.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct StartTelemetry {
    pub trigger: Trigger,
    pub replaced: Option<Pattern>,
}

impl StartTelemetry {
    #[must_use]
    pub const fn new(trigger: Trigger, replaced: Option<Pattern>) -> Self {
        Self { trigger, replaced }
    }
}

/// Pattern completion or replacement payload.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct PlaybackTelemetry {
    pub duration: Option<Duration>,
    pub ticks: u16,
}

impl PlaybackTelemetry {
    #[must_use]
    pub const fn new(duration: Option<Duration>, ticks: u16) -> Self {
        Self { duration, ticks }
    }
}

/// Trait implemented by monotonic instant wrappers used by the sequencer.
pub trait TelemetryInstant: Copy {
    /// Returns the saturating duration from `earlier` to `self`.
    fn saturating_duration_since(&self, earlier: Self) -> Duration;
}

/// Telemetry record stored in the ring buffer.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct TelemetryRecord<TInstant>
where
    TInstant: Copy,
{
    pub id: EventId,
    pub timestamp: TInstant,
    pub event: TelemetryEventKind,
    pub details: TelemetryPayload,
}

/// Telemetry ring buffer type alias.
pub type TelemetryRing<TInstant, const CAPACITY: usize = TELEMETRY_RING_CAPACITY> =
    HistoryBuf<TelemetryRecord<TInstant>, CAPACITY>;

/// Records telemetry events into a fixed-size ring buffer.
pub struct TelemetryRecorder<TInstant, const CAPACITY: usize = TELEMETRY_RING_CAPACITY>
where
    TInstant: Copy,
{
    ring: TelemetryRing<TInstant, CAPACITY>,
    last_edge_at: Option<TInstant>,
    next_event_id: EventId,
}

impl<TInstant, const CAPACITY: usize> TelemetryRecorder<TInstant, CAPACITY>
where
    TInstant: Copy + TelemetryInstant,
{
    /// Creates a new telemetry recorder with an empty history.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            ring: HistoryBuf::new(),
            last_edge_at: None,
            next_event_id: 0,
        }
    }

    /// Returns an iterator over the recorded telemetry in chronological order.
    pub fn oldest_first(&self) -> OldestOrdered<'_, TelemetryRecord<TInstant>> {
        self.ring.oldest_ordered()
    }

    /// Returns the records with ids at or after `cursor`, oldest first.
    ///
    /// Callers keep [`next_event_id`](Self::next_event_id) from their previous
    /// drain as the cursor. Records that already fell out of the ring are lost.
    pub fn since(&self, cursor: EventId) -> impl Iterator<Item = &TelemetryRecord<TInstant>> {
        let pending = self.next_event_id.wrapping_sub(cursor);
        self.ring
            .oldest_ordered()
            .filter(move |record| self.next_event_id.wrapping_sub(record.id) <= pending)
    }

    /// Identifier the next recorded event will receive.
    #[must_use]
    pub const fn next_event_id(&self) -> EventId {
        self.next_event_id
    }

    /// Returns the most recent telemetry record, if available.
    pub fn latest(&self) -> Option<&TelemetryRecord<TInstant>> {
        self.ring.recent()
    }

    /// Returns the number of records currently stored.
    pub fn len(&self) -> usize {
        self.ring.len()
    }

    /// Returns `true` when no telemetry records are stored.
    pub fn is_empty(&self) -> bool {
        self.ring.is_empty()
    }

    /// Records a buzzer edge and captures elapsed time since the previous edge.
    pub fn record_output_transition(&mut self, level: bool, timestamp: TInstant) -> EventId {
        let elapsed = self
            .last_edge_at
            .map(|previous| timestamp.saturating_duration_since(previous));
        self.last_edge_at = Some(timestamp);

        let payload = TelemetryPayload::Output(OutputTelemetry::new(level, elapsed));
        self.record(
            if level {
                TelemetryEventKind::BuzzerOn
            } else {
                TelemetryEventKind::BuzzerOff
            },
            payload,
            timestamp,
        )
    }

    /// Records the start of a pattern and the trigger that caused it.
    pub fn record_pattern_started(
        &mut self,
        pattern: Pattern,
        trigger: Trigger,
        replaced: Option<Pattern>,
        timestamp: TInstant,
    ) -> EventId {
        let payload = TelemetryPayload::Start(StartTelemetry::new(trigger, replaced));
        self.record(
            TelemetryEventKind::PatternStarted(pattern),
            payload,
            timestamp,
        )
    }

    /// Records a pattern that played its final step.
    pub fn record_pattern_complete(
        &mut self,
        pattern: Pattern,
        started_at: Option<TInstant>,
        ticks: u16,
        timestamp: TInstant,
    ) -> EventId {
        let payload = playback_payload(started_at, ticks, timestamp);
        self.record(
            TelemetryEventKind::PatternComplete(pattern),
            payload,
            timestamp,
        )
    }

    /// Records a pattern discarded mid-playback by a newer one.
    pub fn record_pattern_replaced(
        &mut self,
        pattern: Pattern,
        started_at: Option<TInstant>,
        ticks: u16,
        timestamp: TInstant,
    ) -> EventId {
        let payload = playback_payload(started_at, ticks, timestamp);
        self.record(
            TelemetryEventKind::PatternReplaced(pattern),
            payload,
            timestamp,
        )
    }

    /// Records an arbitrary telemetry event with the supplied payload.
    pub fn record(
        &mut self,
        event: TelemetryEventKind,
        payload: TelemetryPayload,
        timestamp: TInstant,
    ) -> EventId {
        let id = self.next_event_id;
        self.next_event_id = self.next_event_id.wrapping_add(1);

        self.ring.write(TelemetryRecord {
            id,
            timestamp,
            event,
            details: payload,
        });

        id
    }
}

impl<TInstant, const CAPACITY: usize> Default for TelemetryRecorder<TInstant, CAPACITY>
where
    TInstant: Copy + TelemetryInstant,
{
    fn default() -> Self {
        Self::new()
    }
}

fn playback_payload<TInstant: TelemetryInstant>(
    started_at: Option<TInstant>,
    ticks: u16,
    timestamp: TInstant,
) -> TelemetryPayload {
    let duration = started_at.map(|start| timestamp.saturating_duration_since(start));
    TelemetryPayload::Playback(PlaybackTelemetry::new(duration, ticks))
}

const fn pattern_code(pattern: Pattern) -> u16 {
    match pattern {
        Pattern::SingleBuzz => 0,
        Pattern::DoubleBuzz => 1,
        Pattern::ArmingBuzz => 2,
        Pattern::BaroGlitch => 3,
        Pattern::EkfBad => 4,
        Pattern::RadioLost => 5,
        Pattern::RadioRecovered => 6,
        Pattern::InitializeComplete => 7,
        // Never emitted; decodes back to `Custom`.
        Pattern::None => TelemetryEventKind::PATTERN_BLOCK - 1,
    }
}

fn pattern_from_code(code: u16) -> Option<Pattern> {
    Pattern::from_index(usize::from(code))
}
