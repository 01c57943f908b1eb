#![allow(clippy::module_name_repetitions)]

//! Parser for bench console lines.
//!
//! Lines are parsed in place with `winnow` combinators; nothing is copied or
//! allocated, so parsed commands borrow from the input. Keywords are matched
//! case-insensitively and errors carry the byte offset where parsing stopped.

use core::fmt;
use core::time::Duration;

use winnow::ascii::{Caseless, dec_uint, multispace0, space0};
use winnow::combinator::{alt, eof, preceded};
use winnow::error::{ContextError, ErrMode, ModalResult};
use winnow::prelude::*;
use winnow::token::take_while;

use super::catalog::{self, CommandTag};
use crate::status::StatusFlag;

type Input<'a> = &'a str;

/// One-shot events the bench can raise.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BenchEvent {
    ArmingFailed,
}

impl BenchEvent {
    pub const ALL: [BenchEvent; 1] = [BenchEvent::ArmingFailed];

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            BenchEvent::ArmingFailed => "arming-failed",
        }
    }

    #[must_use]
    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|event| event.label().eq_ignore_ascii_case(label))
    }
}

impl fmt::Display for BenchEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Structured commands produced by the parser.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command<'a> {
    Set { flag: StatusFlag, value: bool },
    Event(BenchEvent),
    Tick { count: u16 },
    Wait(Duration),
    Status,
    Help { topic: Option<&'a str> },
}

/// Reason a line failed to parse.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ParseErrorKind<'a> {
    Empty,
    UnknownCommand(&'a str),
    UnknownFlag(&'a str),
    UnknownEvent(&'a str),
    Expected(&'static str),
}

/// Parse failure with the byte offset it was detected at.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ParseError<'a> {
    pub kind: ParseErrorKind<'a>,
    pub offset: usize,
}

impl<'a> ParseError<'a> {
    const fn new(kind: ParseErrorKind<'a>, offset: usize) -> Self {
        Self { kind, offset }
    }
}

impl fmt::Display for ParseError<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            ParseErrorKind::Empty => f.write_str("empty command"),
            ParseErrorKind::UnknownCommand(name) => {
                write!(f, "unknown command `{name}` at {}", self.offset)
            }
            ParseErrorKind::UnknownFlag(name) => {
                write!(f, "unknown status flag `{name}` at {}", self.offset)
            }
            ParseErrorKind::UnknownEvent(name) => {
                write!(f, "unknown event `{name}` at {}", self.offset)
            }
            ParseErrorKind::Expected(what) => write!(f, "expected {what} at {}", self.offset),
        }
    }
}

/// Parse a console command from the provided line.
///
/// # Errors
///
/// Returns a [`ParseError`] pointing at the first byte that could not be
/// understood.
pub fn parse(line: &str) -> Result<Command<'_>, ParseError<'_>> {
    let mut cursor = LineCursor::new(line);
    if cursor.at_end() {
        return Err(ParseError::new(ParseErrorKind::Empty, cursor.offset()));
    }

    let name_at = cursor.offset();
    let name = cursor.expect("command keyword", word)?;
    let spec = catalog::find(name)
        .ok_or(ParseError::new(ParseErrorKind::UnknownCommand(name), name_at))?;

    let command = match spec.tag {
        CommandTag::Set => {
            let flag_at = cursor.offset();
            let label = cursor.expect("status flag", word)?;
            let flag = StatusFlag::from_label(label)
                .ok_or(ParseError::new(ParseErrorKind::UnknownFlag(label), flag_at))?;
            let value = cursor.expect("`on` or `off`", switch)?;
            Command::Set { flag, value }
        }
        CommandTag::Event => {
            let event_at = cursor.offset();
            let label = cursor.expect("event name", word)?;
            let event = BenchEvent::from_label(label)
                .ok_or(ParseError::new(ParseErrorKind::UnknownEvent(label), event_at))?;
            Command::Event(event)
        }
        CommandTag::Tick => {
            let count = if cursor.at_end() {
                1
            } else {
                cursor.expect("update count", count)?
            };
            Command::Tick { count }
        }
        CommandTag::Wait => Command::Wait(cursor.expect("duration", duration)?),
        CommandTag::Status => Command::Status,
        CommandTag::Help => {
            let topic = if cursor.at_end() {
                None
            } else {
                Some(cursor.expect("command name", word)?)
            };
            Command::Help { topic }
        }
    };

    cursor.expect("end of command", end_of_line)?;
    Ok(command)
}

/// Tracks how much of the line has been consumed.
struct LineCursor<'a> {
    line: &'a str,
    rest: &'a str,
}

impl<'a> LineCursor<'a> {
    const fn new(line: &'a str) -> Self {
        Self { line, rest: line }
    }

    /// Offset of the next non-blank byte.
    fn offset(&self) -> usize {
        self.line.len() - self.rest.trim_start().len()
    }

    fn at_end(&self) -> bool {
        self.rest.trim().is_empty()
    }

    fn expect<O, P>(&mut self, expected: &'static str, mut parser: P) -> Result<O, ParseError<'a>>
    where
        P: Parser<Input<'a>, O, ErrMode<ContextError>>,
    {
        let start = self.offset();
        parser
            .parse_next(&mut self.rest)
            .map_err(|_| ParseError::new(ParseErrorKind::Expected(expected), start))
    }
}

fn is_word_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '-'
}

fn word<'a>(input: &mut Input<'a>) -> ModalResult<&'a str> {
    preceded(space0, take_while(1.., is_word_char)).parse_next(input)
}

fn switch(input: &mut Input<'_>) -> ModalResult<bool> {
    preceded(
        space0,
        alt((Caseless("on").value(true), Caseless("off").value(false))),
    )
    .parse_next(input)
}

fn count(input: &mut Input<'_>) -> ModalResult<u16> {
    preceded(space0, dec_uint).parse_next(input)
}

fn duration(input: &mut Input<'_>) -> ModalResult<Duration> {
    let (value, millis) = preceded(
        space0,
        (
            dec_uint::<_, u32, _>,
            alt((Caseless("ms").value(true), Caseless("s").value(false))),
        ),
    )
    .parse_next(input)?;

    Ok(if millis {
        Duration::from_millis(value.into())
    } else {
        Duration::from_secs(value.into())
    })
}

fn end_of_line(input: &mut Input<'_>) -> ModalResult<()> {
    (multispace0, eof).void().parse_next(input)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_ok(input: &str) -> Command<'_> {
        parse(input).expect("command should parse")
    }

    #[test]
    fn parses_set_flag() {
        assert_eq!(
            parse_ok("set radio on"),
            Command::Set {
                flag: StatusFlag::FailsafeRadio,
                value: true,
            }
        );
        assert_eq!(
            parse_ok("set armed off\r\n"),
            Command::Set {
                flag: StatusFlag::Armed,
                value: false,
            }
        );
    }

    #[test]
    fn parses_event() {
        assert_eq!(
            parse_ok("event arming-failed"),
            Command::Event(BenchEvent::ArmingFailed)
        );
    }

    #[test]
    fn tick_defaults_to_one_update() {
        assert_eq!(parse_ok("tick"), Command::Tick { count: 1 });
        assert_eq!(parse_ok("tick 25"), Command::Tick { count: 25 });
    }

    #[test]
    fn parses_wait_durations() {
        assert_eq!(
            parse_ok("wait 150ms"),
            Command::Wait(Duration::from_millis(150))
        );
        assert_eq!(parse_ok("wait 3s"), Command::Wait(Duration::from_secs(3)));
    }

    #[test]
    fn parses_status_and_help() {
        assert_eq!(parse_ok("status"), Command::Status);
        assert_eq!(parse_ok("help"), Command::Help { topic: None });
        assert_eq!(
            parse_ok("help wait"),
            Command::Help {
                topic: Some("wait"),
            }
        );
    }

    #[test]
    fn supports_case_insensitive_keywords() {
        assert_eq!(
            parse_ok("SeT EKF On"),
            Command::Set {
                flag: StatusFlag::EkfBad,
                value: true,
            }
        );
    }

    #[test]
    fn reports_unknown_flag_offset() {
        let err = parse("set  gps on").unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::UnknownFlag("gps"));
        assert_eq!(err.offset, 5);
    }

    #[test]
    fn rejects_trailing_input() {
        let err = parse("status now").unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::Expected("end of command"));
        assert_eq!(err.offset, 7);
    }

    #[test]
    fn rejects_duration_without_unit() {
        let err = parse("wait 15").unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::Expected("duration"));
    }

    #[test]
    fn rejects_empty_and_unknown_lines() {
        assert_eq!(parse("   ").unwrap_err().kind, ParseErrorKind::Empty);
        assert_eq!(
            parse("reboot").unwrap_err().kind,
            ParseErrorKind::UnknownCommand("reboot")
        );
    }
}
