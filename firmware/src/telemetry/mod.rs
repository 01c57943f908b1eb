//! Firmware-side telemetry sink.
//!
//! The sequencer records buzzer edges and pattern lifecycle changes into the
//! shared `notify-core` ring. After each update the buzzer task drains the new
//! records through [`TelemetryDrain`], which mirrors them to defmt on the MCU
//! and stdout on host builds.

#![cfg_attr(not(target_os = "none"), allow(dead_code))]

use notify_core::sequencer::InitError;
use notify_core::telemetry::{
    EventId, TelemetryEventKind, TelemetryPayload, TelemetryRecord, TelemetryRecorder,
};

use crate::hw::FirmwareInstant;

/// Records retained between drains; a full update emits at most four.
pub const FIRMWARE_TELEMETRY_CAPACITY: usize = 32;

/// Telemetry recorder bound to the Embassy clock.
pub type FirmwareTelemetry = TelemetryRecorder<FirmwareInstant, FIRMWARE_TELEMETRY_CAPACITY>;

/// Tracks which records have already been logged.
pub struct TelemetryDrain {
    cursor: EventId,
}

impl TelemetryDrain {
    pub const fn new() -> Self {
        Self { cursor: 0 }
    }

    /// Logs every record added since the previous call and returns how many.
    pub fn flush(&mut self, telemetry: &FirmwareTelemetry) -> usize {
        let mut logged = 0;
        for record in telemetry.since(self.cursor) {
            log_record(record);
            logged += 1;
        }
        self.cursor = telemetry.next_event_id();
        logged
    }
}

impl Default for TelemetryDrain {
    fn default() -> Self {
        Self::new()
    }
}

fn log_record(record: &TelemetryRecord<FirmwareInstant>) {
    let timestamp_us = record.timestamp.into_embassy().as_micros();

    match (record.event, record.details) {
        (TelemetryEventKind::BuzzerOn | TelemetryEventKind::BuzzerOff, payload) => {
            let level = if record.event == TelemetryEventKind::BuzzerOn {
                "on"
            } else {
                "off"
            };
            let delta_us = match payload {
                TelemetryPayload::Output(details) => details
                    .elapsed_since_previous
                    .map(micros),
                _ => None,
            };
            emit_edge(level, timestamp_us, delta_us);
        }
        (TelemetryEventKind::PatternStarted(pattern), TelemetryPayload::Start(details)) => {
            emit_started(
                pattern.label(),
                details.trigger.label(),
                details.replaced.map(|previous| previous.label()),
                timestamp_us,
            );
        }
        (TelemetryEventKind::PatternComplete(pattern), TelemetryPayload::Playback(details)) => {
            emit_finished(pattern.label(), "complete", details.ticks, timestamp_us);
        }
        (TelemetryEventKind::PatternReplaced(pattern), TelemetryPayload::Playback(details)) => {
            emit_finished(pattern.label(), "replaced", details.ticks, timestamp_us);
        }
        (event, _) => emit_raw(event.to_raw(), timestamp_us),
    }
}

fn micros(duration: core::time::Duration) -> u64 {
    u64::try_from(duration.as_micros()).unwrap_or(u64::MAX)
}

#[cfg(target_os = "none")]
fn emit_edge(level: &'static str, timestamp_us: u64, delta_us: Option<u64>) {
    if let Some(delta) = delta_us {
        defmt::info!(
            "telemetry:buzzer {} t={}us Δ={}us",
            level,
            timestamp_us,
            delta
        );
    } else {
        defmt::info!("telemetry:buzzer {} t={}us", level, timestamp_us);
    }
}

#[cfg(not(target_os = "none"))]
fn emit_edge(level: &'static str, timestamp_us: u64, delta_us: Option<u64>) {
    if let Some(delta) = delta_us {
        println!("telemetry:buzzer {level} t={timestamp_us}us Δ={delta}us");
    } else {
        println!("telemetry:buzzer {level} t={timestamp_us}us");
    }
}

#[cfg(target_os = "none")]
fn emit_started(
    pattern: &'static str,
    trigger: &'static str,
    replaced: Option<&'static str>,
    timestamp_us: u64,
) {
    if let Some(previous) = replaced {
        defmt::info!(
            "telemetry:pattern {} started by {} over {} t={}us",
            pattern,
            trigger,
            previous,
            timestamp_us
        );
    } else {
        defmt::info!(
            "telemetry:pattern {} started by {} t={}us",
            pattern,
            trigger,
            timestamp_us
        );
    }
}

#[cfg(not(target_os = "none"))]
fn emit_started(
    pattern: &'static str,
    trigger: &'static str,
    replaced: Option<&'static str>,
    timestamp_us: u64,
) {
    if let Some(previous) = replaced {
        println!("telemetry:pattern {pattern} started by {trigger} over {previous} t={timestamp_us}us");
    } else {
        println!("telemetry:pattern {pattern} started by {trigger} t={timestamp_us}us");
    }
}

#[cfg(target_os = "none")]
fn emit_finished(pattern: &'static str, outcome: &'static str, ticks: u16, timestamp_us: u64) {
    defmt::info!(
        "telemetry:pattern {} {} after {=u16} ticks t={}us",
        pattern,
        outcome,
        ticks,
        timestamp_us
    );
}

#[cfg(not(target_os = "none"))]
fn emit_finished(pattern: &'static str, outcome: &'static str, ticks: u16, timestamp_us: u64) {
    println!("telemetry:pattern {pattern} {outcome} after {ticks} ticks t={timestamp_us}us");
}

#[cfg(target_os = "none")]
fn emit_raw(code: u16, timestamp_us: u64) {
    defmt::debug!("telemetry:raw {=u16:#x} t={}us", code, timestamp_us);
}

#[cfg(not(target_os = "none"))]
fn emit_raw(code: u16, timestamp_us: u64) {
    println!("telemetry:raw {code:#06x} t={timestamp_us}us");
}

/// Reports why the buzzer stays silent for this boot.
#[cfg(target_os = "none")]
pub fn log_init_failure(error: InitError) {
    defmt::warn!(
        "buzzer: disabled ({})",
        defmt::Display2Format(&error)
    );
}

#[cfg(not(target_os = "none"))]
pub fn log_init_failure(error: InitError) {
    println!("buzzer: disabled ({error})");
}
