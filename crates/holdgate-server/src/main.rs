//! Holdgate command-line front end.
//!
//! # Usage
//!
//! ```bash
//! # Wake the configured target and wait until it accepts connections
//! holdgate --config /etc/holdgate.toml wait
//!
//! # Show the passcode expected right now
//! holdgate --config /etc/holdgate.toml code
//!
//! # Check a passcode
//! holdgate --config /etc/holdgate.toml verify 123456
//!
//! # Type a passcode on stdin: digits, '-' for backspace, newline to submit
//! holdgate --config /etc/holdgate.toml prompt
//! ```

use std::{
    io::BufRead,
    path::PathBuf,
    process::ExitCode,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
};

use clap::{Parser, Subcommand};
use holdgate_app::{HostError, KeySender, SessionHost, key_channel};
use holdgate_core::{
    KBD_FLAGS_RELEASE, SCAN_BACKSPACE, SCAN_DIGITS, SCAN_ENTER, Strategy, SurfaceBitmap,
    env::Environment, totp,
};
use holdgate_server::{ServerError, SessionGate, Settings, SystemEnv};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Holdgate admission gate
#[derive(Parser, Debug)]
#[command(name = "holdgate")]
#[command(about = "Hold a remote-desktop session until the target is awake or a passcode is entered")]
#[command(version)]
struct Args {
    /// Settings file (TOML); defaults are used when omitted
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Wake the target and wait until it is reachable
    Wait,
    /// Print the passcode expected now
    Code,
    /// Check a passcode against the shared secret
    Verify {
        /// Six-digit passcode
        code: String,
    },
    /// Run the passcode gate interactively on stdin
    Prompt,
}

/// Host for the command line: frames go to the log, Ctrl-C disconnects.
#[derive(Debug, Default, Clone)]
struct ConsoleHost {
    disconnected: Arc<AtomicBool>,
}

impl SessionHost for ConsoleHost {
    fn shall_disconnect(&self) -> bool {
        self.disconnected.load(Ordering::SeqCst)
    }

    fn submit_frame(&self, bitmap: &SurfaceBitmap<'_>) -> Result<(), HostError> {
        let lit = bitmap.data.chunks_exact(4).filter(|px| px[0] != 0).count();
        tracing::debug!(width = bitmap.width, height = bitmap.height, lit, "status frame");
        Ok(())
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    match run(args).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(1),
        Err(e) => {
            tracing::error!(error = %e, "holdgate failed");
            ExitCode::from(2)
        },
    }
}

async fn run(args: Args) -> Result<bool, ServerError> {
    let settings = Settings::load(args.config.as_deref())?;

    match args.command {
        Command::Wait => {
            let gate = SessionGate::from_settings(&settings, Strategy::Liveness)?;
            let host = ConsoleHost::default();
            watch_ctrl_c(&host);

            let (_keys, rx) = key_channel();
            let outcome = gate.run(&host, rx).await;
            tracing::info!(?outcome, "wait finished");
            Ok(outcome.admits())
        },
        Command::Code => {
            let config = settings.gate_config()?;
            let code = totp::expected_code(&config.passcode.secret, SystemEnv::new().unix_time());
            print_line(&code);
            Ok(true)
        },
        Command::Verify { code } => {
            let config = settings.gate_config()?;
            let passcode = &config.passcode;
            let valid = totp::validate(
                &passcode.secret,
                passcode.tolerance_window,
                code.trim(),
                SystemEnv::new().unix_time(),
            );
            tracing::info!(valid, "passcode checked");
            Ok(valid)
        },
        Command::Prompt => {
            let gate = SessionGate::from_settings(&settings, Strategy::Passcode)?;
            let host = ConsoleHost::default();
            watch_ctrl_c(&host);

            let (keys, rx) = key_channel();
            spawn_stdin_keyboard(keys);
            tracing::info!("type the passcode, '-' for backspace, Enter to submit");

            let outcome = gate.run(&host, rx).await;
            tracing::info!(?outcome, "prompt finished");
            Ok(outcome.admits())
        },
    }
}

fn watch_ctrl_c(host: &ConsoleHost) {
    let flag = Arc::clone(&host.disconnected);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("interrupted, disconnecting");
            flag.store(true, Ordering::SeqCst);
        }
    });
}

/// Translate stdin into scan codes on a plain thread, like a host's input
/// dispatch context. EOF drops the sender, which the gate sees as a
/// disconnect.
fn spawn_stdin_keyboard(keys: KeySender) {
    std::thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else { break };
            for ch in line.chars() {
                let scan_code = match ch {
                    '-' => SCAN_BACKSPACE,
                    _ => match ch.to_digit(10) {
                        Some(digit) => SCAN_DIGITS[digit as usize],
                        None => continue,
                    },
                };
                press(&keys, scan_code);
            }
            press(&keys, SCAN_ENTER);
        }
    });
}

fn press(keys: &KeySender, scan_code: u16) {
    keys.on_key_event(scan_code, 0);
    keys.on_key_event(scan_code, KBD_FLAGS_RELEASE);
}

#[allow(clippy::print_stdout)]
fn print_line(line: &str) {
    println!("{line}");
}
