//! Single-process command execution
//!
//! The [`Runner`] executes one command text at a time under `sh -c`, with
//! stdout and stderr merged, and reports progress as [`RunEvent`]s over a
//! tokio channel. It also owns the cached sudo credential.

use std::sync::Arc;

use log::{debug, info};
use parking_lot::Mutex;
use thiserror::Error;
use tokio::sync::mpsc;

pub mod decode;
pub mod invocation;
pub mod messages;
mod session;

pub use invocation::{Invocation, SudoCredential, requires_credential};

use session::ActiveSlot;

#[derive(Debug, Error)]
pub enum RunError {
    #[error("A command is already running")]
    AlreadyRunning,
    #[error("Sudo password entry cancelled")]
    Cancelled,
    #[error("No command is running")]
    NotRunning,
    #[error("Unable to start command: {0}")]
    Spawn(#[source] std::io::Error),
}

/// Progress of a run, in the order it happened
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunEvent {
    /// The process was spawned; `command` is the text as the user wrote it
    Started { command: String },
    /// A chunk of merged stdout/stderr, without added line breaks
    Output(String),
    /// The process exited and the runner is idle again. `exit_code` is `None`
    /// when the process was killed by a signal.
    Finished { exit_code: Option<i32> },
}

/// Runs at most one command at a time and caches the sudo password
pub struct Runner {
    events: mpsc::Sender<RunEvent>,
    credential: Option<SudoCredential>,
    active: ActiveSlot,
    next_id: u64,
}

impl Runner {
    #[must_use]
    pub fn new(events: mpsc::Sender<RunEvent>) -> Self {
        Self {
            events,
            credential: None,
            active: Arc::new(Mutex::new(None)),
            next_id: 0,
        }
    }

    /// Whether a command is currently running
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.active.lock().is_some()
    }

    /// Process id of the running command, if any
    #[must_use]
    pub fn running_pid(&self) -> Option<u32> {
        self.active.lock().as_ref().and_then(|handle| handle.pid())
    }

    #[must_use]
    pub fn has_credential(&self) -> bool {
        self.credential.is_some()
    }

    /// Whether running `command` would have to ask for a password first
    #[must_use]
    pub fn needs_prompt(&self, command: &str) -> bool {
        requires_credential(command) && self.credential.is_none()
    }

    pub fn set_credential(&mut self, credential: SudoCredential) {
        self.credential = Some(credential);
    }

    pub fn clear_credential(&mut self) {
        if self.credential.take().is_some() {
            info!("Cleared cached sudo password");
        }
    }

    /// Start running `command` and return without waiting for it.
    ///
    /// If the command needs sudo and no password is cached, `prompt` is called
    /// once; the password it returns is cached for later runs. Output and
    /// completion are reported on the runner's event channel.
    ///
    /// # Errors
    ///
    /// Returns `RunError::AlreadyRunning` if a command is running (it is left
    /// untouched), `RunError::Cancelled` if `prompt` returns `None`, or
    /// `RunError::Spawn` if the shell cannot be started. The runner stays idle
    /// in the last two cases.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    pub fn run<F>(&mut self, command: &str, prompt: F) -> Result<(), RunError>
    where
        F: FnOnce() -> Option<SudoCredential>,
    {
        if self.is_running() {
            return Err(RunError::AlreadyRunning);
        }

        if self.needs_prompt(command) {
            debug!("Command needs sudo; asking for password");
            let credential = prompt().ok_or(RunError::Cancelled)?;
            self.credential = Some(credential);
        }

        let invocation = Invocation::resolve(command, self.credential.as_ref());
        let id = self.next_id;
        self.next_id += 1;

        let mut slot = self.active.lock();
        if slot.is_some() {
            return Err(RunError::AlreadyRunning);
        }
        let handle = session::start(
            id,
            command,
            &invocation,
            Arc::clone(&self.active),
            self.events.clone(),
        )?;
        *slot = Some(handle);
        Ok(())
    }

    /// Kill the running command.
    ///
    /// The runner stays busy until the process has actually exited and
    /// `RunEvent::Finished` has been sent.
    ///
    /// # Errors
    ///
    /// Returns `RunError::NotRunning` if nothing is running.
    pub fn cancel(&self) -> Result<(), RunError> {
        let mut slot = self.active.lock();
        let handle = slot.as_mut().ok_or(RunError::NotRunning)?;
        if handle.request_cancel() {
            info!("Cancelling running command");
        } else {
            debug!("Cancellation already requested");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    async fn collect_until_finished(rx: &mut mpsc::Receiver<RunEvent>) -> (String, Option<i32>) {
        let mut output = String::new();
        loop {
            let event = tokio::time::timeout(Duration::from_secs(10), rx.recv())
                .await
                .expect("timed out waiting for run events")
                .expect("event channel closed");
            match event {
                RunEvent::Started { .. } => {}
                RunEvent::Output(text) => output.push_str(&text),
                RunEvent::Finished { exit_code } => return (output, exit_code),
            }
        }
    }

    #[tokio::test]
    async fn test_output_and_finish() {
        let (tx, mut rx) = mpsc::channel(64);
        let mut runner = Runner::new(tx);
        runner.run("echo 1 && echo 2", || None).unwrap();
        assert!(runner.is_running());
        let (output, exit_code) = collect_until_finished(&mut rx).await;
        assert_eq!(output, "1\n2\n");
        assert_eq!(exit_code, Some(0));
        assert!(!runner.is_running());
    }

    #[tokio::test]
    async fn test_started_comes_first() {
        let (tx, mut rx) = mpsc::channel(64);
        let mut runner = Runner::new(tx);
        runner.run("true", || None).unwrap();
        assert_eq!(
            rx.recv().await,
            Some(RunEvent::Started {
                command: "true".into()
            })
        );
    }

    #[tokio::test]
    async fn test_stderr_is_merged() {
        let (tx, mut rx) = mpsc::channel(64);
        let mut runner = Runner::new(tx);
        runner.run("echo out; echo err 1>&2; exit 3", || None).unwrap();
        let (output, exit_code) = collect_until_finished(&mut rx).await;
        assert_eq!(output, "out\nerr\n");
        assert_eq!(exit_code, Some(3));
    }

    #[tokio::test]
    async fn test_cancelled_prompt_stays_idle() {
        let (tx, _rx) = mpsc::channel(64);
        let mut runner = Runner::new(tx);
        let result = runner.run("sudo true", || None);
        assert!(matches!(result, Err(RunError::Cancelled)));
        assert!(!runner.is_running());
        assert!(!runner.has_credential());
    }

    #[tokio::test]
    async fn test_prompt_only_when_needed() {
        let (tx, mut rx) = mpsc::channel(64);
        let mut runner = Runner::new(tx);
        runner
            .run("echo plain", || panic!("prompted for a plain command"))
            .unwrap();
        collect_until_finished(&mut rx).await;
        assert!(runner.needs_prompt("sudo ls"));
        runner.set_credential(SudoCredential::new("pw"));
        assert!(!runner.needs_prompt("sudo ls"));
        runner.clear_credential();
        assert!(runner.needs_prompt("sudo ls"));
    }

    #[tokio::test]
    async fn test_cancel_when_idle() {
        let (tx, _rx) = mpsc::channel(64);
        let runner = Runner::new(tx);
        assert!(matches!(runner.cancel(), Err(RunError::NotRunning)));
    }
}
