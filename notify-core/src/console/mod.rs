//! Bench console shared by the emulator and any host tooling.
//!
//! The grammar lives in [`grammar`], the keyword catalog in [`catalog`] and
//! the dispatcher that edits the bench status in [`commands`]. Everything
//! stays `no_std` so the same parser could back a firmware shell.

pub mod catalog;
pub mod commands;
pub mod grammar;
