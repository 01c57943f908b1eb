//! Read-only vehicle status snapshot consumed by the sequencer each tick.
//!
//! The wider firmware publishes these conditions from many places. The
//! sequencer never reads that shared state itself; the caller hands it a copy
//! on every invocation.

use core::fmt;

/// Number of level-style status flags.
pub const STATUS_FLAG_COUNT: usize = 6;

/// Level-style condition published by the status aggregator.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum StatusFlag {
    Armed,
    FailsafeBattery,
    FailsafeRadio,
    EkfBad,
    VehicleLost,
    Initialising,
}

impl StatusFlag {
    pub const ALL: [StatusFlag; STATUS_FLAG_COUNT] = [
        StatusFlag::Armed,
        StatusFlag::FailsafeBattery,
        StatusFlag::FailsafeRadio,
        StatusFlag::EkfBad,
        StatusFlag::VehicleLost,
        StatusFlag::Initialising,
    ];

    /// Console keyword for the flag.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            StatusFlag::Armed => "armed",
            StatusFlag::FailsafeBattery => "battery",
            StatusFlag::FailsafeRadio => "radio",
            StatusFlag::EkfBad => "ekf",
            StatusFlag::VehicleLost => "lost",
            StatusFlag::Initialising => "init",
        }
    }

    /// Case-insensitive lookup by console keyword.
    #[must_use]
    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|flag| flag.label().eq_ignore_ascii_case(label))
    }
}

impl fmt::Display for StatusFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Snapshot of the status conditions the buzzer reacts to.
///
/// `arming_failed` is a one-shot event rather than a level: producers set it
/// for exactly one snapshot after a rejected arming attempt.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct NotifyStatus {
    pub armed: bool,
    pub failsafe_battery: bool,
    pub failsafe_radio: bool,
    pub ekf_bad: bool,
    pub vehicle_lost: bool,
    pub initialising: bool,
    pub arming_failed: bool,
}

impl NotifyStatus {
    /// Status reported while the autopilot is still booting.
    #[must_use]
    pub const fn booting() -> Self {
        Self {
            armed: false,
            failsafe_battery: false,
            failsafe_radio: false,
            ekf_bad: false,
            vehicle_lost: false,
            initialising: true,
            arming_failed: false,
        }
    }

    /// Reads a level flag.
    #[must_use]
    pub const fn get(&self, flag: StatusFlag) -> bool {
        match flag {
            StatusFlag::Armed => self.armed,
            StatusFlag::FailsafeBattery => self.failsafe_battery,
            StatusFlag::FailsafeRadio => self.failsafe_radio,
            StatusFlag::EkfBad => self.ekf_bad,
            StatusFlag::VehicleLost => self.vehicle_lost,
            StatusFlag::Initialising => self.initialising,
        }
    }

    /// Writes a level flag.
    pub fn set(&mut self, flag: StatusFlag, value: bool) {
        let slot = match flag {
            StatusFlag::Armed => &mut self.armed,
            StatusFlag::FailsafeBattery => &mut self.failsafe_battery,
            StatusFlag::FailsafeRadio => &mut self.failsafe_radio,
            StatusFlag::EkfBad => &mut self.ekf_bad,
            StatusFlag::VehicleLost => &mut self.vehicle_lost,
            StatusFlag::Initialising => &mut self.initialising,
        };
        *slot = value;
    }

    /// Returns a copy with `value` applied to `flag`.
    #[must_use]
    pub fn with(mut self, flag: StatusFlag, value: bool) -> Self {
        self.set(flag, value);
        self
    }

    /// Returns a copy carrying the arming-failed event.
    #[must_use]
    pub const fn with_arming_failed(mut self) -> Self {
        self.arming_failed = true;
        self
    }

    /// Clears the one-shot event after it has been handed to the sequencer.
    pub fn clear_events(&mut self) {
        self.arming_failed = false;
    }
}
