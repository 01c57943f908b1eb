mod session;

use std::env;
use std::io::{self, BufRead, Write};
use std::process;

use crossterm::style::Stylize;
use crossterm::tty::IsTty;
use session::{LineTone, Session, SessionLine, TranscriptProfile};

fn main() -> io::Result<()> {
    let profile = parse_profile().unwrap_or_else(|err| {
        eprintln!("{err}");
        eprintln!(
            "Usage: notify-emulator [--profile <{}>] | notify-emulator <profile>",
            profile_tags()
        );
        process::exit(2);
    });

    let stdin = io::stdin();
    let mut reader = stdin.lock();
    let stdout = io::stdout();
    let styled = stdout.is_tty();
    let mut writer = stdout.lock();
    let mut session = Session::new(profile)?;
    let mut line = String::new();

    writeln!(
        writer,
        "Notify emulator ready ({}). Type `help` for commands or `exit` to quit.",
        profile.log_path()
    )?;

    loop {
        line.clear();
        write!(writer, "> ")?;
        writer.flush()?;

        let bytes_read = reader.read_line(&mut line)?;
        if bytes_read == 0 {
            writeln!(writer)?;
            break;
        }

        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        if should_terminate(trimmed) {
            writeln!(
                writer,
                "Session closed after {} commands ({:.2}s simulated).",
                session.command_count(),
                session.now().as_duration().as_secs_f64()
            )?;
            break;
        }

        for response in session.handle_command(trimmed)? {
            write_line(&mut writer, &response, styled)?;
        }
    }

    Ok(())
}

fn write_line(writer: &mut impl Write, line: &SessionLine, styled: bool) -> io::Result<()> {
    if !styled {
        return writeln!(writer, "{line}");
    }

    let text = line.text.as_str();
    match line.tone {
        LineTone::Plain => writeln!(writer, "{text}"),
        LineTone::Edge => writeln!(writer, "{}", text.yellow()),
        LineTone::Pattern => writeln!(writer, "{}", text.cyan().bold()),
        LineTone::Timeline => writeln!(writer, "{}", text.dark_grey()),
        LineTone::Error => writeln!(writer, "{}", text.red()),
    }
}

fn should_terminate(input: &str) -> bool {
    input.eq_ignore_ascii_case("exit") || input.eq_ignore_ascii_case("quit")
}

fn profile_tags() -> String {
    TranscriptProfile::ALL
        .into_iter()
        .map(TranscriptProfile::tag)
        .collect::<Vec<_>>()
        .join("|")
}

fn parse_profile() -> Result<TranscriptProfile, String> {
    let mut args = env::args().skip(1);
    if let Some(arg) = args.next() {
        if let Some(value) = arg.strip_prefix("--profile=") {
            TranscriptProfile::from_tag(value)
        } else if arg == "--profile" {
            if let Some(value) = args.next() {
                TranscriptProfile::from_tag(&value)
            } else {
                Err("Expected value after --profile".to_string())
            }
        } else {
            TranscriptProfile::from_tag(&arg)
        }
    } else {
        Ok(TranscriptProfile::Boot)
    }
}
