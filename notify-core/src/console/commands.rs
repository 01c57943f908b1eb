//! Bench console dispatcher.
//!
//! Applies parsed commands to a bench-side [`NotifyStatus`] and tells the host
//! how many sequencer updates to run. The host owns the clock and the
//! sequencer; this module never calls into either.

use core::fmt;
use core::time::Duration;

use super::catalog::{self, CommandSpec};
use super::grammar::{self, BenchEvent, Command};
use crate::sequencer::UPDATE_PERIOD;
use crate::status::{NotifyStatus, StatusFlag};

/// Longest run a single `tick` or `wait` may request (ten simulated minutes).
pub const MAX_BENCH_UPDATES: u32 = 30_000;

/// Command execution successes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CommandOutcome {
    FlagSet { flag: StatusFlag, value: bool },
    EventRaised(BenchEvent),
    /// Run this many sequencer updates.
    Run { updates: u32 },
    Status(NotifyStatus),
    Help(HelpOutcome),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HelpOutcome {
    Catalog(&'static [CommandSpec]),
    Command(&'static CommandSpec),
}

/// Errors surfaced while executing a command.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CommandError<'a> {
    Parse(grammar::ParseError<'a>),
    Unsupported(&'static str),
    UnknownTopic(&'a str),
}

impl<'a> From<grammar::ParseError<'a>> for CommandError<'a> {
    fn from(error: grammar::ParseError<'a>) -> Self {
        Self::Parse(error)
    }
}

impl fmt::Display for CommandError<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandError::Parse(err) => err.fmt(f),
            CommandError::Unsupported(reason) => f.write_str(reason),
            CommandError::UnknownTopic(topic) => write!(f, "no help for `{topic}`"),
        }
    }
}

/// Bench state edited by console commands.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BenchConsole {
    status: NotifyStatus,
}

impl BenchConsole {
    pub const fn new(status: NotifyStatus) -> Self {
        Self { status }
    }

    pub const fn status(&self) -> &NotifyStatus {
        &self.status
    }

    /// Returns the snapshot for the next update and consumes pending events.
    pub fn take_snapshot(&mut self) -> NotifyStatus {
        let snapshot = self.status;
        self.status.clear_events();
        snapshot
    }

    /// Parses and executes a console line.
    ///
    /// # Errors
    ///
    /// Returns [`CommandError`] when the line does not parse or asks for
    /// something the bench cannot do.
    pub fn execute<'a>(&mut self, line: &'a str) -> Result<CommandOutcome, CommandError<'a>> {
        let command = grammar::parse(line)?;
        self.dispatch(command)
    }

    fn dispatch<'a>(&mut self, command: Command<'a>) -> Result<CommandOutcome, CommandError<'a>> {
        match command {
            Command::Set { flag, value } => {
                self.status.set(flag, value);
                Ok(CommandOutcome::FlagSet { flag, value })
            }
            Command::Event(event) => {
                match event {
                    BenchEvent::ArmingFailed => self.status.arming_failed = true,
                }
                Ok(CommandOutcome::EventRaised(event))
            }
            Command::Tick { count: 0 } => {
                Err(CommandError::Unsupported("tick count must be at least 1"))
            }
            Command::Tick { count } => bounded_run(
                u32::from(count),
                "tick count exceeds the bench limit of 30000 updates",
            ),
            Command::Wait(duration) => match updates_for(duration) {
                0 => Err(CommandError::Unsupported(
                    "wait must cover at least one update period",
                )),
                updates => bounded_run(updates, "wait exceeds the bench limit of 10 minutes"),
            },
            Command::Status => Ok(CommandOutcome::Status(self.status)),
            Command::Help { topic: None } => {
                Ok(CommandOutcome::Help(HelpOutcome::Catalog(catalog::commands())))
            }
            Command::Help { topic: Some(topic) } => catalog::find(topic)
                .map(|spec| CommandOutcome::Help(HelpOutcome::Command(spec)))
                .ok_or(CommandError::UnknownTopic(topic)),
        }
    }
}

fn bounded_run<'a>(updates: u32, too_long: &'static str) -> Result<CommandOutcome, CommandError<'a>> {
    if updates > MAX_BENCH_UPDATES {
        Err(CommandError::Unsupported(too_long))
    } else {
        Ok(CommandOutcome::Run { updates })
    }
}

/// Number of updates needed to cover `duration`, rounded up.
#[must_use]
pub fn updates_for(duration: Duration) -> u32 {
    let updates = duration.as_micros().div_ceil(UPDATE_PERIOD.as_micros());
    u32::try_from(updates).unwrap_or(u32::MAX)
}
