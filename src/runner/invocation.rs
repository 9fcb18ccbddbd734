use std::fmt;
use std::process::Stdio;

use log::debug;
use tokio::process::Command;

/// Substring that marks a command as needing root privileges
pub const SUDO_MARKER: &str = "sudo";

const SHELL: &str = "sh";

/// Whether running `command` needs a sudo password
#[must_use]
pub fn requires_credential(command: &str) -> bool {
    command.contains(SUDO_MARKER)
}

/// A cached sudo password.
///
/// The secret never appears in `Debug` output or in a command line.
#[derive(Clone, PartialEq, Eq)]
pub struct SudoCredential(String);

impl SudoCredential {
    #[must_use]
    pub fn new(secret: impl Into<String>) -> Self {
        Self(secret.into())
    }

    fn stdin_line(&self) -> Vec<u8> {
        format!("{}\n", self.0).into_bytes()
    }
}

impl fmt::Debug for SudoCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SudoCredential(***)")
    }
}

/// The program, arguments and stdin payload a command text resolves to
#[derive(Debug, Clone)]
pub struct Invocation {
    program: &'static str,
    args: Vec<String>,
    stdin: Option<SudoCredential>,
}

impl Invocation {
    /// Resolve `command` into an invocation.
    ///
    /// Commands containing [`SUDO_MARKER`] run under `sudo -S` when a
    /// credential is given; the password is then written to the child's stdin
    /// rather than spliced into a shell string. Everything else runs verbatim
    /// under `sh -c`.
    #[must_use]
    pub fn resolve(command: &str, credential: Option<&SudoCredential>) -> Self {
        match credential {
            Some(credential) if requires_credential(command) => Self {
                program: "sudo",
                // -k ignores sudo's timestamp cache so the password line is always consumed
                args: vec![
                    "-S".into(),
                    "-k".into(),
                    "-p".into(),
                    String::new(),
                    SHELL.into(),
                    "-c".into(),
                    command.into(),
                ],
                stdin: Some(credential.clone()),
            },
            _ => Self {
                program: SHELL,
                args: vec!["-c".into(), command.into()],
                stdin: None,
            },
        }
    }

    #[must_use]
    pub fn program(&self) -> &str {
        self.program
    }

    #[must_use]
    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// Whether the invocation runs through sudo
    #[must_use]
    pub fn is_privileged(&self) -> bool {
        self.stdin.is_some()
    }

    /// Bytes to write to the child's stdin before closing it
    pub(crate) fn stdin_payload(&self) -> Option<Vec<u8>> {
        self.stdin.as_ref().map(SudoCredential::stdin_line)
    }

    #[cfg(test)]
    pub(crate) fn with_stdin(
        program: &'static str,
        args: &[&str],
        credential: SudoCredential,
    ) -> Self {
        Self {
            program,
            args: args.iter().map(ToString::to_string).collect(),
            stdin: Some(credential),
        }
    }
}

impl From<&Invocation> for Command {
    fn from(invocation: &Invocation) -> Self {
        debug!(
            "Building {} invocation (privileged: {})",
            invocation.program,
            invocation.is_privileged()
        );
        let mut command = Command::new(invocation.program);
        command.args(&invocation.args);
        command.stdin(if invocation.is_privileged() {
            Stdio::piped()
        } else {
            Stdio::null()
        });
        command.kill_on_drop(true);
        command
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_command_is_verbatim() {
        let invocation = Invocation::resolve("echo 1 && echo 2", None);
        assert_eq!(invocation.program(), "sh");
        assert_eq!(invocation.args(), ["-c", "echo 1 && echo 2"]);
        assert!(invocation.stdin_payload().is_none());
    }

    #[test]
    fn test_credential_ignored_without_sudo() {
        let credential = SudoCredential::new("hunter2");
        let invocation = Invocation::resolve("ls", Some(&credential));
        assert_eq!(invocation.program(), "sh");
        assert!(!invocation.is_privileged());
    }

    #[test]
    fn test_sudo_command_pipes_credential() {
        let credential = SudoCredential::new("hunter2");
        let command = "sudo apt update && echo 'it''s done'";
        let invocation = Invocation::resolve(command, Some(&credential));
        assert_eq!(invocation.program(), "sudo");
        assert_eq!(
            invocation.args(),
            ["-S", "-k", "-p", "", "sh", "-c", command]
        );
        assert!(invocation.args().iter().all(|a| !a.contains("hunter2")));
        assert_eq!(invocation.stdin_payload().unwrap(), b"hunter2\n");
    }

    #[test]
    fn test_sudo_without_credential_runs_plain() {
        let invocation = Invocation::resolve("sudo -n true", None);
        assert_eq!(invocation.program(), "sh");
    }

    #[test]
    fn test_debug_hides_secret() {
        let credential = SudoCredential::new("hunter2");
        let invocation = Invocation::resolve("sudo ls", Some(&credential));
        assert!(!format!("{invocation:?}").contains("hunter2"));
    }

    #[test]
    fn test_marker_is_substring() {
        assert!(requires_credential("visudo -c"));
        assert!(!requires_credential("su -c ls"));
    }
}
