use core::panic::PanicInfo;

use cortex_m::interrupt;
use cortex_m::register::primask;
use critical_section::{self, RawRestoreState};
use defmt_rtt as _;
use embassy_executor::Spawner;
use embassy_stm32 as hal;
use embassy_stm32::gpio::{Level, Output, Speed};
use notify_core::sequencer::{SequencerConfig, SignalSequencer};

use crate::hw::{BUZZER_CHANNEL, HardwareBuzzer};
use crate::status;
use crate::telemetry::{self, FirmwareTelemetry};

mod buzzer_task;

critical_section::set_impl!(InterruptCriticalSection);

struct InterruptCriticalSection;

unsafe impl critical_section::Impl for InterruptCriticalSection {
    unsafe fn acquire() -> RawRestoreState {
        let primask = primask::read();
        interrupt::disable();
        primask.is_active()
    }

    unsafe fn release(restore_state: RawRestoreState) {
        if restore_state {
            unsafe {
                interrupt::enable();
            }
        }
    }
}

#[panic_handler]
fn panic(info: &PanicInfo) -> ! {
    defmt::error!("notify-firmware panic: {}", defmt::Display2Format(info));
    cortex_m::asm::udf();
}

#[embassy_executor::main]
pub async fn main(spawner: Spawner) {
    let hal::Peripherals { PA8, .. } = hal::init(hal::Config::default());

    let buzzer = HardwareBuzzer::new(Output::new(PA8, Level::Low, Speed::Low));
    let mut sequencer = SignalSequencer::new(SequencerConfig::new(BUZZER_CHANNEL), buzzer);

    match sequencer.init(&status::snapshot()) {
        Ok(()) => {
            defmt::info!(
                "buzzer: ready on {} ({})",
                BUZZER_CHANNEL.name,
                BUZZER_CHANNEL.mcu_pin
            );
            match buzzer_task::run(sequencer, FirmwareTelemetry::new()) {
                Ok(token) => spawner.spawn(token),
                Err(_) => defmt::error!("buzzer: no room to spawn update task"),
            }
            status::mark_boot_complete();
        }
        Err(error) => telemetry::log_init_failure(error),
    }

    core::future::pending::<()>().await;
}
