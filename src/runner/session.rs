use std::io::ErrorKind;
use std::os::fd::OwnedFd;
use std::process::ExitStatus;
use std::sync::Arc;
use std::time::Duration;

use log::{debug, error, info, warn};
use parking_lot::Mutex;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::unix::pipe;
use tokio::process::{Child, Command};
use tokio::sync::{mpsc, oneshot};

use super::decode::Utf8Decoder;
use super::invocation::Invocation;
use super::{RunError, RunEvent};

const READ_CHUNK: usize = 4096;

/// How long the output pipe may stay open and silent after the child has
/// exited before the run is finished anyway. The timer restarts with every
/// chunk and does not run while a chunk waits for the consumer, so a slow
/// consumer never loses output. A background grandchild holding the pipe
/// open does not keep the run alive; its later output is discarded when the
/// pipe is closed.
const DRAIN_GRACE: Duration = Duration::from_millis(250);

/// Slot holding the live session, shared between the runner and the session task
pub(super) type ActiveSlot = Arc<Mutex<Option<SessionHandle>>>;

/// Runner-side handle of the one live process
#[derive(Debug)]
pub(super) struct SessionHandle {
    id: u64,
    pid: Option<u32>,
    cancel_tx: Option<oneshot::Sender<()>>,
}

impl SessionHandle {
    pub(super) fn pid(&self) -> Option<u32> {
        self.pid
    }

    /// Ask the session to kill its child. Returns false if already asked.
    pub(super) fn request_cancel(&mut self) -> bool {
        match self.cancel_tx.take() {
            Some(tx) => tx.send(()).is_ok(),
            None => false,
        }
    }
}

/// Spawn `invocation` with stdout and stderr sharing one pipe, and start the
/// task that forwards its output and reaps it.
///
/// The returned handle must be stored in `active` before the caller releases
/// the slot's lock; the session task clears the slot when the run is over.
///
/// # Panics
///
/// Panics if called outside a Tokio runtime.
pub(super) fn start(
    id: u64,
    display: &str,
    invocation: &Invocation,
    active: ActiveSlot,
    events: mpsc::Sender<RunEvent>,
) -> Result<SessionHandle, RunError> {
    let (reader, writer) = std::io::pipe().map_err(RunError::Spawn)?;
    let output = pipe::Receiver::from_owned_fd(OwnedFd::from(reader)).map_err(RunError::Spawn)?;

    let mut command = Command::from(invocation);
    command
        .stdout(writer.try_clone().map_err(RunError::Spawn)?)
        .stderr(writer);
    let mut child = command.spawn().map_err(RunError::Spawn)?;
    // The command still owns the parent's copies of the write end
    drop(command);

    let pid = child.id();
    info!("Started '{display}' (pid {pid:?})");

    if let Some(payload) = invocation.stdin_payload() {
        feed_stdin(&mut child, payload);
    }

    let (cancel_tx, cancel_rx) = oneshot::channel();
    let session = Session {
        id,
        child,
        output,
        cancel_rx,
        cancel_armed: true,
        active,
        events,
    };
    tokio::spawn(session.drive(display.to_string()));

    Ok(SessionHandle {
        id,
        pid,
        cancel_tx: Some(cancel_tx),
    })
}

fn feed_stdin(child: &mut Child, payload: Vec<u8>) {
    let Some(mut stdin) = child.stdin.take() else {
        warn!("Child has no stdin to write the credential to");
        return;
    };
    tokio::spawn(async move {
        if let Err(e) = stdin.write_all(&payload).await {
            debug!("Failed to write credential to stdin: {e}");
        }
        // Dropping stdin closes it, so sudo sees EOF on a wrong password
    });
}

/// One live run: the child, its merged output pipe and the event channel.
/// All events of a run are sent from this task, in order.
struct Session {
    id: u64,
    child: Child,
    output: pipe::Receiver,
    cancel_rx: oneshot::Receiver<()>,
    cancel_armed: bool,
    active: ActiveSlot,
    events: mpsc::Sender<RunEvent>,
}

impl Session {
    async fn drive(mut self, display: String) {
        self.send(RunEvent::Started { command: display }).await;

        let mut decoder = Utf8Decoder::new();
        let mut buf = vec![0u8; READ_CHUNK];
        let mut status: Option<std::io::Result<ExitStatus>> = None;

        loop {
            tokio::select! {
                read = self.output.read(&mut buf) => match read {
                    Ok(0) => {
                        debug!("Output pipe EOF");
                        break;
                    }
                    Ok(n) => {
                        let text = decoder.decode(&buf[..n]);
                        self.send_output(text).await;
                    }
                    Err(e) if e.kind() == ErrorKind::Interrupted => {}
                    Err(e) => {
                        error!("Output reader error: {e:?}");
                        break;
                    }
                },
                result = self.child.wait(), if status.is_none() => {
                    status = Some(result);
                }
                cancel = &mut self.cancel_rx, if self.cancel_armed => {
                    self.cancel_armed = false;
                    if cancel.is_ok() {
                        self.kill();
                    }
                }
                () = tokio::time::sleep(DRAIN_GRACE), if status.is_some() => {
                    debug!("Output pipe still open after exit; closing it");
                    break;
                }
            }
        }
        self.send_output(decoder.finish()).await;

        let status = match status {
            Some(status) => status,
            None => self.wait_for_exit().await,
        };
        let exit_code = match status {
            Ok(status) => {
                info!("Process exited with {status}");
                status.code()
            }
            Err(e) => {
                error!("Failed to wait for process: {e}");
                None
            }
        };

        {
            let mut slot = self.active.lock();
            if slot.as_ref().is_some_and(|handle| handle.id == self.id) {
                *slot = None;
            }
        }

        self.send(RunEvent::Finished { exit_code }).await;
    }

    /// Wait for a child that closed its output but is still running
    async fn wait_for_exit(&mut self) -> std::io::Result<ExitStatus> {
        if self.cancel_armed {
            tokio::select! {
                status = self.child.wait() => return status,
                cancel = &mut self.cancel_rx => {
                    self.cancel_armed = false;
                    if cancel.is_ok() {
                        self.kill();
                    }
                }
            }
        }
        self.child.wait().await
    }

    fn kill(&mut self) {
        info!("Cancellation requested; killing process");
        if let Err(e) = self.child.start_kill() {
            warn!("Failed to kill child process: {e}");
        }
    }

    async fn send_output(&self, text: String) {
        if !text.is_empty() {
            self.send(RunEvent::Output(text)).await;
        }
    }

    async fn send(&self, event: RunEvent) {
        if self.events.send(event).await.is_err() {
            debug!("Run event channel closed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::SudoCredential;

    async fn collect(rx: &mut mpsc::Receiver<RunEvent>) -> (String, Option<i32>) {
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
    async fn test_stdin_payload_reaches_child_then_closes() {
        let invocation =
            Invocation::with_stdin("sh", &["-c", "cat"], SudoCredential::new("hunter2"));
        let active: ActiveSlot = Arc::new(Mutex::new(None));
        let (tx, mut rx) = mpsc::channel(16);

        {
            let mut slot = active.lock();
            *slot = Some(start(0, "cat", &invocation, Arc::clone(&active), tx).unwrap());
        }

        // cat only exits once stdin reaches EOF
        let (output, exit_code) = collect(&mut rx).await;
        assert_eq!(output, "hunter2\n");
        assert_eq!(exit_code, Some(0));
        assert!(active.lock().is_none());
    }

    #[tokio::test]
    async fn test_detaches_from_silent_grandchild() {
        let invocation = Invocation::resolve("echo parent; (sleep 5; echo late) &", None);
        let active: ActiveSlot = Arc::new(Mutex::new(None));
        let (tx, mut rx) = mpsc::channel(16);

        let started = std::time::Instant::now();
        {
            let mut slot = active.lock();
            *slot = Some(start(0, "bg", &invocation, Arc::clone(&active), tx).unwrap());
        }

        let (output, exit_code) = collect(&mut rx).await;
        assert!(started.elapsed() < Duration::from_secs(4));
        assert_eq!(output, "parent\n");
        assert_eq!(exit_code, Some(0));
    }
}
