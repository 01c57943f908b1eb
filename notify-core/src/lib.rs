#![no_std]

// Buzzer notification logic shared by the firmware and the host emulator.
//
// This crate stays portable across MCU firmware and host tooling by avoiding the
// Rust standard library; hardware and clocks come in through small traits.

pub mod console;
pub mod patterns;
pub mod sequencer;
pub mod status;
pub mod telemetry;
