//! Board wiring for the buzzer and the glue between Embassy time and
//! `notify-core`.

#![cfg_attr(not(target_os = "none"), allow(dead_code))]

use embassy_time::{Duration, Instant};
use notify_core::sequencer::{OutputChannel, OutputPolarity};
use notify_core::telemetry::TelemetryInstant;

#[cfg(target_os = "none")]
use embassy_stm32::gpio::Output;
#[cfg(target_os = "none")]
use notify_core::sequencer::OutputDriver;

/// Buzzer transistor on PA8 (TIM1_CH1 capable), high == sounding.
pub const BUZZER_CHANNEL: OutputChannel =
    OutputChannel::new("BUZZER", "PA8", OutputPolarity::ActiveHigh);

/// Embassy instant wrapped so it can implement `notify-core` traits.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct FirmwareInstant(Instant);

impl FirmwareInstant {
    #[cfg(target_os = "none")]
    pub fn now() -> Self {
        Self(Instant::now())
    }

    pub const fn into_embassy(self) -> Instant {
        self.0
    }
}

impl From<Instant> for FirmwareInstant {
    fn from(instant: Instant) -> Self {
        Self(instant)
    }
}

impl TelemetryInstant for FirmwareInstant {
    fn saturating_duration_since(&self, earlier: Self) -> core::time::Duration {
        let elapsed = self.0.saturating_duration_since(earlier.0);
        core::time::Duration::from_micros(elapsed.as_micros())
    }
}

pub fn core_duration_to_embassy(duration: core::time::Duration) -> Duration {
    let micros = u64::try_from(duration.as_micros()).unwrap_or(u64::MAX);
    Duration::from_micros(micros)
}

/// Push-pull GPIO driving the buzzer.
#[cfg(target_os = "none")]
pub struct HardwareBuzzer<'d> {
    output: Output<'d>,
}

#[cfg(target_os = "none")]
impl<'d> HardwareBuzzer<'d> {
    pub fn new(output: Output<'d>) -> Self {
        Self { output }
    }
}

#[cfg(target_os = "none")]
impl OutputDriver for HardwareBuzzer<'_> {
    fn set_level(&mut self, _: &OutputChannel, level: bool) {
        if level {
            self.output.set_high();
        } else {
            self.output.set_low();
        }
    }
}
