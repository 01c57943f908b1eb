#![cfg_attr(not(target_os = "none"), allow(dead_code))]

//! Shared status storage for the firmware target.
//!
//! Producers anywhere in the firmware publish vehicle conditions through
//! lightweight atomics; the buzzer task takes a [`NotifyStatus`] snapshot once
//! per update without touching shared mutable state directly.

use notify_core::status::{NotifyStatus, StatusFlag};
use portable_atomic::{AtomicBool, AtomicU8, Ordering};

const BOOT_MASK: u8 = 1 << StatusFlag::Initialising as u8;

/// Bitmask of level flags (1 == set), indexed by [`StatusFlag`] order.
static FLAG_MASK: AtomicU8 = AtomicU8::new(BOOT_MASK);
/// Pending one-shot arming-failed event.
static ARMING_FAILED: AtomicBool = AtomicBool::new(false);

fn bit_for(flag: StatusFlag) -> u8 {
    1 << flag as u8
}

/// Publishes the level of a status flag.
pub fn record_flag(flag: StatusFlag, value: bool) {
    let bit = bit_for(flag);
    if value {
        FLAG_MASK.fetch_or(bit, Ordering::Relaxed);
    } else {
        FLAG_MASK.fetch_and(!bit, Ordering::Relaxed);
    }
}

/// Clears the boot flag once the board has finished bringing up its
/// peripherals, which lets the buzzer play the boot chime.
pub fn mark_boot_complete() {
    record_flag(StatusFlag::Initialising, false);
}

/// Queues an arming-failed event for the next snapshot.
///
/// Raised by the arming checks, which live outside this firmware image.
#[allow(dead_code)]
pub fn record_arming_failed() {
    ARMING_FAILED.store(true, Ordering::Relaxed);
}

/// Returns the current flags and consumes any pending one-shot event.
pub fn snapshot() -> NotifyStatus {
    let mask = FLAG_MASK.load(Ordering::Relaxed);
    let arming_failed = ARMING_FAILED.swap(false, Ordering::Relaxed);
    status_from_mask(mask, arming_failed)
}

fn status_from_mask(mask: u8, arming_failed: bool) -> NotifyStatus {
    let mut status = NotifyStatus {
        arming_failed,
        ..NotifyStatus::default()
    };
    for flag in StatusFlag::ALL {
        status.set(flag, mask & bit_for(flag) != 0);
    }
    status
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn boot_mask_reports_initialising_only() {
        assert_eq!(status_from_mask(BOOT_MASK, false), NotifyStatus::booting());
    }

    #[test]
    fn mask_bits_map_to_distinct_flags() {
        for flag in StatusFlag::ALL {
            let status = status_from_mask(bit_for(flag), false);
            assert_eq!(status, NotifyStatus::default().with(flag, true));
        }
    }

    #[test]
    fn boot_completion_clears_only_initialising() {
        record_flag(StatusFlag::EkfBad, true);

        mark_boot_complete();
        let status = snapshot();
        assert!(!status.initialising);
        assert!(status.ekf_bad);

        record_flag(StatusFlag::EkfBad, false);
    }

    #[test]
    fn snapshot_consumes_arming_failed() {
        record_flag(StatusFlag::Initialising, false);
        record_flag(StatusFlag::Armed, true);
        record_arming_failed();

        let first = snapshot();
        assert!(first.armed);
        assert!(first.arming_failed);
        assert!(!first.initialising);

        let second = snapshot();
        assert!(second.armed);
        assert!(!second.arming_failed);
    }
}
