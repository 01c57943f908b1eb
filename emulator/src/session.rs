use std::fmt;
use std::fs::{self, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::Path;
use std::time::{Duration, Instant as HostInstant};

use notify_core::console::catalog::CommandSpec;
use notify_core::console::commands::{BenchConsole, CommandError, CommandOutcome, HelpOutcome};
use notify_core::sequencer::{
    OutputChannel, OutputDriver, OutputPolarity, SequencerConfig, SignalSequencer, UPDATE_PERIOD,
};
use notify_core::status::{NotifyStatus, StatusFlag};
use notify_core::telemetry::{
    EventId, TelemetryEventKind, TelemetryInstant, TelemetryPayload, TelemetryRecord,
    TelemetryRecorder,
};

/// Simulated buzzer wired the same way as the board.
pub const SIM_CHANNEL: OutputChannel =
    OutputChannel::new("BUZZER", "SIM", OutputPolarity::ActiveHigh);

const SESSION_TELEMETRY_CAPACITY: usize = 64;
/// Updates folded into one timeline column, sampled after the pattern tick.
const TIMELINE_STRIDE: u32 = 5;
/// Columns per timeline row (five seconds).
const TIMELINE_WIDTH: usize = 50;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum TranscriptProfile {
    Boot,
    Arming,
    RadioFailsafe,
}

impl TranscriptProfile {
    pub const ALL: [TranscriptProfile; 3] = [
        TranscriptProfile::Boot,
        TranscriptProfile::Arming,
        TranscriptProfile::RadioFailsafe,
    ];

    pub fn log_path(self) -> &'static str {
        match self {
            TranscriptProfile::Boot => "transcripts/emulator-boot.log",
            TranscriptProfile::Arming => "transcripts/emulator-arming.log",
            TranscriptProfile::RadioFailsafe => "transcripts/emulator-radio-failsafe.log",
        }
    }

    pub fn header(self) -> &'static str {
        match self {
            TranscriptProfile::Boot => "Notify emulator boot chime transcript",
            TranscriptProfile::Arming => "Notify emulator arming transcript",
            TranscriptProfile::RadioFailsafe => "Notify emulator radio failsafe transcript",
        }
    }

    pub fn tag(self) -> &'static str {
        match self {
            TranscriptProfile::Boot => "boot",
            TranscriptProfile::Arming => "arming",
            TranscriptProfile::RadioFailsafe => "radio-failsafe",
        }
    }

    pub fn from_tag(tag: &str) -> Result<Self, String> {
        if tag.eq_ignore_ascii_case("radio") {
            return Ok(Self::RadioFailsafe);
        }
        Self::ALL
            .into_iter()
            .find(|profile| profile.tag().eq_ignore_ascii_case(tag))
            .ok_or_else(|| format!("Unknown transcript profile `{tag}`"))
    }
}

/// Position on the simulated clock, measured from session start.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Ord, PartialOrd)]
pub struct SimInstant(Duration);

impl SimInstant {
    pub fn as_duration(self) -> Duration {
        self.0
    }

    fn advance(&mut self, by: Duration) {
        self.0 += by;
    }
}

impl TelemetryInstant for SimInstant {
    fn saturating_duration_since(&self, earlier: Self) -> Duration {
        self.0.saturating_sub(earlier.0)
    }
}

/// Buzzer stand-in that remembers the last pin level.
#[derive(Debug, Default)]
pub struct SimBuzzer {
    level: bool,
    writes: usize,
}

impl SimBuzzer {
    pub fn level(&self) -> bool {
        self.level
    }

    pub fn writes(&self) -> usize {
        self.writes
    }
}

impl OutputDriver for SimBuzzer {
    fn set_level(&mut self, _: &OutputChannel, level: bool) {
        self.level = level;
        self.writes += 1;
    }
}

/// How a response line should be presented on a terminal.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum LineTone {
    Plain,
    Edge,
    Pattern,
    Timeline,
    Error,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SessionLine {
    pub tone: LineTone,
    pub text: String,
}

impl SessionLine {
    fn new(tone: LineTone, text: impl Into<String>) -> Self {
        Self {
            tone,
            text: text.into(),
        }
    }

    fn plain(text: impl Into<String>) -> Self {
        Self::new(LineTone::Plain, text)
    }

    fn error(text: impl Into<String>) -> Self {
        Self::new(LineTone::Error, text)
    }
}

impl fmt::Display for SessionLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

pub struct Session {
    console: BenchConsole,
    sequencer: SignalSequencer<SimBuzzer, SimInstant>,
    telemetry: TelemetryRecorder<SimInstant, SESSION_TELEMETRY_CAPACITY>,
    cursor: EventId,
    now: SimInstant,
    transcript: TranscriptLogger,
    started_at: HostInstant,
    command_count: usize,
}

impl Session {
    pub fn new(profile: TranscriptProfile) -> io::Result<Self> {
        let transcript = TranscriptLogger::new(profile)?;
        Ok(Self::with_transcript(transcript))
    }

    /// Session that keeps no transcript file.
    #[cfg(test)]
    pub fn detached() -> Self {
        Self::with_transcript(TranscriptLogger::discard())
    }

    fn with_transcript(transcript: TranscriptLogger) -> Self {
        let console = BenchConsole::new(NotifyStatus::booting());
        let mut sequencer =
            SignalSequencer::new(SequencerConfig::new(SIM_CHANNEL), SimBuzzer::default());
        // A failed init leaves the sequencer inert; `status` reports why.
        let _ = sequencer.init(console.status());

        Self {
            console,
            sequencer,
            telemetry: TelemetryRecorder::new(),
            cursor: 0,
            now: SimInstant::default(),
            transcript,
            started_at: HostInstant::now(),
            command_count: 0,
        }
    }

    pub fn now(&self) -> SimInstant {
        self.now
    }

    pub fn command_count(&self) -> usize {
        self.command_count
    }

    #[cfg(test)]
    pub fn sequencer(&self) -> &SignalSequencer<SimBuzzer, SimInstant> {
        &self.sequencer
    }

    pub fn handle_command(&mut self, line: &str) -> io::Result<Vec<SessionLine>> {
        let elapsed = self.started_at.elapsed();
        self.command_count += 1;
        self.transcript
            .append_line(elapsed, TranscriptRole::Host, line)?;

        let lines = match self.console.execute(line) {
            Ok(outcome) => self.render_outcome(outcome),
            Err(error) => describe_error(&error),
        };

        self.record_output(elapsed, &lines)?;
        Ok(lines)
    }

    fn render_outcome(&mut self, outcome: CommandOutcome) -> Vec<SessionLine> {
        match outcome {
            CommandOutcome::FlagSet { flag, value } => {
                vec![SessionLine::plain(format!("OK {flag}={}", on_off(value)))]
            }
            CommandOutcome::EventRaised(event) => vec![SessionLine::plain(format!(
                "OK {event} queued for the next update"
            ))],
            CommandOutcome::Run { updates } => self.run(updates),
            CommandOutcome::Status(status) => self.describe_status(status),
            CommandOutcome::Help(HelpOutcome::Catalog(specs)) => describe_catalog(specs),
            CommandOutcome::Help(HelpOutcome::Command(spec)) => {
                vec![SessionLine::plain(describe_command(spec, spec.usage.len()))]
            }
        }
    }

    fn run(&mut self, updates: u32) -> Vec<SessionLine> {
        let started = self.now;
        let mut lines = Vec::new();
        let mut timeline = String::new();

        for index in 0..updates {
            let status = self.console.take_snapshot();
            self.sequencer
                .update(&status, self.now, &mut self.telemetry);
            lines.extend(self.drain_telemetry());
            if index % TIMELINE_STRIDE == TIMELINE_STRIDE - 1 {
                timeline.push(if self.sequencer.output_level() { '#' } else { '.' });
            }
            self.now.advance(UPDATE_PERIOD);
        }

        lines.extend(timeline_rows(started, &timeline));
        lines.push(SessionLine::plain(format!(
            "ran {updates} updates ({}) now={} pattern={} step={} buzzer={}",
            format_duration_short(self.now.0.saturating_sub(started.0)),
            format_timestamp(self.now),
            self.sequencer.active_pattern(),
            self.sequencer.step(),
            on_off(self.sequencer.output_level()),
        )));
        lines
    }

    fn drain_telemetry(&mut self) -> Vec<SessionLine> {
        let lines = self
            .telemetry
            .since(self.cursor)
            .map(describe_record)
            .collect();
        self.cursor = self.telemetry.next_event_id();
        lines
    }

    fn describe_status(&self, status: NotifyStatus) -> Vec<SessionLine> {
        let flags = StatusFlag::ALL
            .iter()
            .map(|flag| format!("{flag}={}", on_off(status.get(*flag))))
            .collect::<Vec<_>>()
            .join(" ");

        let sequencer = match self.sequencer.init_error() {
            Some(error) => format!("sequencer disabled ({error})"),
            None => {
                let latched = self.sequencer.latched();
                format!(
                    "sequencer ready pattern={} step={} buzzer={} ever-armed={} pin={} writes={}",
                    self.sequencer.active_pattern(),
                    self.sequencer.step(),
                    on_off(self.sequencer.output_level()),
                    yes_no(latched.ever_armed),
                    if self.sequencer.driver().level() { "high" } else { "low" },
                    self.sequencer.driver().writes(),
                )
            }
        };

        vec![
            SessionLine::plain(format!("flags {flags}")),
            SessionLine::plain(sequencer),
            SessionLine::plain(format!("clock {}", format_timestamp(self.now))),
        ]
    }

    fn record_output(&mut self, elapsed: Duration, lines: &[SessionLine]) -> io::Result<()> {
        for line in lines {
            self.transcript
                .append_line(elapsed, TranscriptRole::Emulator, &line.text)?;
        }
        Ok(())
    }
}

struct TranscriptLogger {
    writer: Option<BufWriter<fs::File>>,
}

impl TranscriptLogger {
    fn new(profile: TranscriptProfile) -> io::Result<Self> {
        let path = Path::new(profile.log_path());
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(path)?;

        let mut logger = Self {
            writer: Some(BufWriter::new(file)),
        };

        logger.write_header(profile)?;
        Ok(logger)
    }

    #[cfg(test)]
    fn discard() -> Self {
        Self { writer: None }
    }

    fn write_header(&mut self, profile: TranscriptProfile) -> io::Result<()> {
        let Some(writer) = self.writer.as_mut() else {
            return Ok(());
        };
        writeln!(writer, "# {}", profile.header())?;
        writeln!(
            writer,
            "# Timestamps are host milliseconds since session start; `now=` is simulated time"
        )?;
        writeln!(writer)?;
        writer.flush()
    }

    fn append_line(
        &mut self,
        elapsed: Duration,
        role: TranscriptRole,
        line: &str,
    ) -> io::Result<()> {
        let Some(writer) = self.writer.as_mut() else {
            return Ok(());
        };
        writeln!(
            writer,
            "[+{:>6} ms] {} {}",
            elapsed.as_millis(),
            role.prefix(),
            line
        )?;
        writer.flush()
    }
}

enum TranscriptRole {
    Host,
    Emulator,
}

impl TranscriptRole {
    fn prefix(&self) -> &'static str {
        match self {
            TranscriptRole::Host => "HOST>",
            TranscriptRole::Emulator => "EMU <",
        }
    }
}

fn describe_record(record: &TelemetryRecord<SimInstant>) -> SessionLine {
    let at = format_timestamp(record.timestamp);
    match (record.event, record.details) {
        (TelemetryEventKind::BuzzerOn | TelemetryEventKind::BuzzerOff, payload) => {
            let level = on_off(record.event == TelemetryEventKind::BuzzerOn);
            let text = match payload {
                TelemetryPayload::Output(details) => match details.elapsed_since_previous {
                    Some(delta) => {
                        format!("[{at}] buzzer {level} (+{})", format_duration_short(delta))
                    }
                    None => format!("[{at}] buzzer {level}"),
                },
                _ => format!("[{at}] buzzer {level}"),
            };
            SessionLine::new(LineTone::Edge, text)
        }
        (TelemetryEventKind::PatternStarted(pattern), TelemetryPayload::Start(details)) => {
            let text = match details.replaced {
                Some(previous) => format!(
                    "[{at}] pattern {pattern} started by {} over {previous}",
                    details.trigger
                ),
                None => format!("[{at}] pattern {pattern} started by {}", details.trigger),
            };
            SessionLine::new(LineTone::Pattern, text)
        }
        (TelemetryEventKind::PatternComplete(pattern), TelemetryPayload::Playback(details)) => {
            SessionLine::new(
                LineTone::Pattern,
                format!(
                    "[{at}] pattern {pattern} complete after {} ticks{}",
                    details.ticks,
                    describe_playback(details.duration)
                ),
            )
        }
        (TelemetryEventKind::PatternReplaced(pattern), TelemetryPayload::Playback(details)) => {
            SessionLine::new(
                LineTone::Pattern,
                format!(
                    "[{at}] pattern {pattern} replaced after {} ticks{}",
                    details.ticks,
                    describe_playback(details.duration)
                ),
            )
        }
        (event, _) => SessionLine::plain(format!("[{at}] {event}")),
    }
}

fn describe_playback(duration: Option<Duration>) -> String {
    duration
        .map(|value| format!(" ({})", format_duration_short(value)))
        .unwrap_or_default()
}

fn timeline_rows(started: SimInstant, timeline: &str) -> Vec<SessionLine> {
    let column = UPDATE_PERIOD * TIMELINE_STRIDE;
    timeline
        .as_bytes()
        .chunks(TIMELINE_WIDTH)
        .enumerate()
        .map(|(row, cells)| {
            let offset = u32::try_from(row * TIMELINE_WIDTH).unwrap_or(u32::MAX);
            let mut at = started;
            at.advance(column.saturating_mul(offset));
            SessionLine::new(
                LineTone::Timeline,
                format!(
                    "{:>9} |{}|",
                    format_timestamp(at),
                    String::from_utf8_lossy(cells)
                ),
            )
        })
        .collect()
}

fn describe_error(error: &CommandError<'_>) -> Vec<SessionLine> {
    match error {
        CommandError::Parse(err) => vec![SessionLine::error(format!("ERR syntax: {err}"))],
        CommandError::Unsupported(reason) => {
            vec![SessionLine::error(format!("ERR unsupported: {reason}"))]
        }
        CommandError::UnknownTopic(_) => vec![
            SessionLine::error(format!("ERR {error}")),
            SessionLine::plain(format!("Available topics: {}", help_topic_list())),
        ],
    }
}

fn describe_catalog(specs: &[CommandSpec]) -> Vec<SessionLine> {
    let width = specs.iter().map(|spec| spec.usage.len()).max().unwrap_or(0);
    let mut lines = vec![SessionLine::plain("Available commands:")];
    lines.extend(
        specs
            .iter()
            .map(|spec| SessionLine::plain(format!("  {}", describe_command(spec, width)))),
    );
    lines.push(SessionLine::plain(
        "Type `help <command>` for a single entry.",
    ));
    lines
}

fn describe_command(spec: &CommandSpec, width: usize) -> String {
    format!("{:<width$}  - {}", spec.usage, spec.summary)
}

fn help_topic_list() -> String {
    notify_core::console::catalog::commands()
        .iter()
        .map(|spec| spec.name)
        .collect::<Vec<_>>()
        .join(", ")
}

fn on_off(value: bool) -> &'static str {
    if value { "on" } else { "off" }
}

fn yes_no(value: bool) -> &'static str {
    if value { "yes" } else { "no" }
}

fn format_timestamp(at: SimInstant) -> String {
    let duration = at.as_duration();
    format!("+{}.{:03}s", duration.as_secs(), duration.subsec_millis())
}

fn format_duration_short(duration: Duration) -> String {
    if duration.as_secs() == 0 {
        format!("{}ms", duration.as_millis())
    } else {
        format!("{:.3}s", duration.as_secs_f64())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify_core::patterns::Pattern;

    fn run(session: &mut Session, line: &str) -> Vec<String> {
        session
            .handle_command(line)
            .expect("detached session never fails")
            .into_iter()
            .map(|line| line.text)
            .collect()
    }

    fn contains(lines: &[String], needle: &str) -> bool {
        lines.iter().any(|line| line.contains(needle))
    }

    #[test]
    fn boot_chime_plays_after_init_clears() {
        let mut session = Session::detached();
        run(&mut session, "set init off");

        let lines = run(&mut session, "wait 1s");
        assert!(contains(
            &lines,
            "pattern initialize-complete started by initialize-complete"
        ));
        assert!(contains(&lines, "buzzer on"));
        assert_eq!(session.now().as_duration(), Duration::from_secs(1));
    }

    #[test]
    fn arming_failed_starts_single_buzz_on_next_update() {
        let mut session = Session::detached();
        run(&mut session, "set init off");
        run(&mut session, "wait 2s");

        assert_eq!(
            run(&mut session, "event arming-failed"),
            vec!["OK arming-failed queued for the next update".to_string()]
        );
        let lines = run(&mut session, "tick");
        assert!(contains(&lines, "pattern single-buzz started by arming-failed"));
        assert_eq!(session.sequencer().active_pattern(), Pattern::SingleBuzz);
    }

    #[test]
    fn timeline_marks_each_pattern_tick() {
        let mut session = Session::detached();
        run(&mut session, "set init off");
        run(&mut session, "wait 2s");
        run(&mut session, "set armed on");

        let lines = run(&mut session, "wait 1s");
        let row = lines
            .iter()
            .find(|line| line.contains('|'))
            .expect("timeline row");
        assert!(row.ends_with("|.#########|"), "{row}");
    }

    #[test]
    fn errors_are_reported_without_running_updates() {
        let mut session = Session::detached();

        let lines = run(&mut session, "bogus");
        assert!(lines[0].starts_with("ERR syntax: unknown command `bogus`"));

        let lines = run(&mut session, "tick 0");
        assert!(lines[0].starts_with("ERR unsupported"));

        let lines = run(&mut session, "wait 4294967295s");
        assert!(lines[0].starts_with("ERR unsupported: wait exceeds"));

        let lines = run(&mut session, "help nope");
        assert!(lines[0].starts_with("ERR no help"));
        assert!(lines[1].contains("set, event, tick, wait, status, help"));

        assert_eq!(session.now(), SimInstant::default());
        assert_eq!(session.command_count(), 4);
    }

    #[test]
    fn status_reports_flags_and_sequencer_state() {
        let mut session = Session::detached();
        let lines = run(&mut session, "status");

        assert!(lines[0].contains("init=on"));
        assert!(lines[0].contains("armed=off"));
        assert!(lines[1].starts_with("sequencer ready pattern=none"));
        assert!(lines[2].ends_with("+0.000s"));
    }

    #[test]
    fn profiles_parse_from_tags() {
        assert_eq!(
            TranscriptProfile::from_tag("RADIO"),
            Ok(TranscriptProfile::RadioFailsafe)
        );
        assert!(TranscriptProfile::from_tag("reboot").is_err());
    }
}
