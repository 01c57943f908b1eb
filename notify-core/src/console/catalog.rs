//! Bench console command catalog.
//!
//! The parser uses it to resolve keywords and the `help` command renders it.

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CommandTag {
    Set,
    Event,
    Tick,
    Wait,
    Status,
    Help,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CommandSpec {
    pub name: &'static str,
    pub tag: CommandTag,
    pub usage: &'static str,
    pub summary: &'static str,
}

const COMMANDS: [CommandSpec; 6] = [
    CommandSpec {
        name: "set",
        tag: CommandTag::Set,
        usage: "set <armed|battery|radio|ekf|lost|init> <on|off>",
        summary: "change a status flag seen by the sequencer",
    },
    CommandSpec {
        name: "event",
        tag: CommandTag::Event,
        usage: "event arming-failed",
        summary: "raise a one-shot event for the next update",
    },
    CommandSpec {
        name: "tick",
        tag: CommandTag::Tick,
        usage: "tick [count]",
        summary: "run the given number of 50 Hz updates (default 1)",
    },
    CommandSpec {
        name: "wait",
        tag: CommandTag::Wait,
        usage: "wait <duration>",
        summary: "run updates covering a duration such as 500ms or 3s (at most 10 minutes)",
    },
    CommandSpec {
        name: "status",
        tag: CommandTag::Status,
        usage: "status",
        summary: "show the bench status flags",
    },
    CommandSpec {
        name: "help",
        tag: CommandTag::Help,
        usage: "help [command]",
        summary: "list commands or describe one",
    },
];

/// Returns the full command catalog.
#[must_use]
pub const fn commands() -> &'static [CommandSpec] {
    &COMMANDS
}

/// Looks up a command by its tag.
#[must_use]
pub const fn command(tag: CommandTag) -> &'static CommandSpec {
    match tag {
        CommandTag::Set => &COMMANDS[0],
        CommandTag::Event => &COMMANDS[1],
        CommandTag::Tick => &COMMANDS[2],
        CommandTag::Wait => &COMMANDS[3],
        CommandTag::Status => &COMMANDS[4],
        CommandTag::Help => &COMMANDS[5],
    }
}

/// Finds a command by name (case insensitive).
#[must_use]
pub fn find(name: &str) -> Option<&'static CommandSpec> {
    COMMANDS
        .iter()
        .find(|command| command.name.eq_ignore_ascii_case(name))
}
