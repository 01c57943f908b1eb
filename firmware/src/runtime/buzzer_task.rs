use embassy_time::Ticker;
use notify_core::sequencer::{SignalSequencer, UPDATE_PERIOD};

use crate::hw::{FirmwareInstant, HardwareBuzzer, core_duration_to_embassy};
use crate::status;
use crate::telemetry::{FirmwareTelemetry, TelemetryDrain};

pub type FirmwareSequencer = SignalSequencer<HardwareBuzzer<'static>, FirmwareInstant>;

/// Polls the status snapshot at the fixed update rate and drives the buzzer.
#[embassy_executor::task]
pub async fn run(mut sequencer: FirmwareSequencer, mut telemetry: FirmwareTelemetry) -> ! {
    let mut ticker = Ticker::every(core_duration_to_embassy(UPDATE_PERIOD));
    let mut drain = TelemetryDrain::new();

    loop {
        let snapshot = status::snapshot();
        sequencer.update(&snapshot, FirmwareInstant::now(), &mut telemetry);
        drain.flush(&telemetry);
        ticker.next().await;
    }
}
