use std::io;

#[allow(dead_code)]
#[path = "../session.rs"]
mod session;

use session::{Session, TranscriptProfile};

fn main() -> io::Result<()> {
    for profile in TranscriptProfile::ALL {
        record_profile(profile)?;
        println!("wrote {}", profile.log_path());
    }
    Ok(())
}

fn record_profile(profile: TranscriptProfile) -> io::Result<()> {
    let mut session = Session::new(profile)?;
    let script: &[&str] = match profile {
        TranscriptProfile::Boot => BOOT,
        TranscriptProfile::Arming => ARMING,
        TranscriptProfile::RadioFailsafe => RADIO_FAILSAFE,
    };
    for line in script {
        let _ = session.handle_command(line)?;
    }
    Ok(())
}

const BOOT: &[&str] = &[
    "help",
    "status",
    "wait 500ms",
    "set radio on",
    "wait 500ms",
    "set init off",
    "wait 1s",
    "status",
];

const ARMING: &[&str] = &[
    "set init off",
    "wait 1s",
    "event arming-failed",
    "tick",
    "wait 500ms",
    "set armed on",
    "wait 4s",
    "set battery on",
    "wait 2s",
    "set battery off",
    "set armed off",
    "wait 1s",
    "status",
];

const RADIO_FAILSAFE: &[&str] = &[
    "set init off",
    "wait 1s",
    "set armed on",
    "wait 4s",
    "set radio on",
    "wait 5s",
    "set ekf on",
    "set radio off",
    "wait 3s",
    "status",
];
