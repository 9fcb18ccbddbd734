use std::io::Write;
use std::process::ExitCode;

use clap::Args;
use inquire::{Password, PasswordDisplayMode};
use log::{debug, warn};
use tokio::sync::mpsc;

use cmdshelf::runner::messages::{format_finished_message, format_start_message};
use cmdshelf::runner::{RunEvent, Runner, SudoCredential};
use cmdshelf::store::{CommandStore, StoreError};

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Position of the command, as shown by `list`
    index: usize,
}

fn ask_password() -> Option<SudoCredential> {
    match Password::new("Sudo password:")
        .without_confirmation()
        .with_display_mode(PasswordDisplayMode::Masked)
        .prompt()
    {
        Ok(password) => Some(SudoCredential::new(password)),
        Err(e) => {
            debug!("Password prompt ended: {e}");
            None
        }
    }
}

/// Run one stored command in the foreground and mirror its exit code.
///
/// # Errors
///
/// Returns an error if the index is out of range, the password prompt is
/// cancelled, the shell cannot be started, or stdout cannot be written.
pub async fn run(
    args: &RunArgs,
    store: &CommandStore,
) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let entry = store.get(args.index).ok_or(StoreError::Index {
        index: args.index,
        len: store.len(),
    })?;

    let (tx, mut rx) = mpsc::channel(256);
    let mut runner = Runner::new(tx);
    runner.run(&entry.command, ask_password)?;

    let mut stdout = std::io::stdout();
    let mut exit_code = None;
    loop {
        tokio::select! {
            event = rx.recv() => match event {
                Some(RunEvent::Started { command }) => {
                    eprint!("{}", format_start_message(&command));
                }
                Some(RunEvent::Output(text)) => {
                    stdout.write_all(text.as_bytes())?;
                    stdout.flush()?;
                }
                Some(RunEvent::Finished { exit_code: code }) => {
                    eprint!("{}", format_finished_message(code));
                    exit_code = code;
                    break;
                }
                None => break,
            },
            _ = tokio::signal::ctrl_c() => {
                debug!("Received Ctrl+C signal");
                if let Err(e) = runner.cancel() {
                    warn!("{e}");
                }
            }
        }
    }
    runner.clear_credential();

    Ok(match exit_code {
        Some(0) => ExitCode::SUCCESS,
        Some(code) => ExitCode::from(u8::try_from(code).unwrap_or(1)),
        None => ExitCode::FAILURE,
    })
}
