use crate::parser::CommandLine;
use crate::state::ShellState;
use anyhow::Result;
use nix::sys::wait::WaitStatus;
use std::fmt;
use std::io::Write;

/// Conventional process exit code type used by this crate.
pub type ExitCode = i32;

/// How a child process finished.
///
/// Rendered as the status line shared by the `status` builtin, foreground
/// signal reports and background completion notices.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitStatus {
    /// Normal termination with the given code.
    Exited(ExitCode),
    /// Termination by the given signal number.
    Signaled(i32),
}

impl ExitStatus {
    /// Convert a terminal wait result; `None` for stop/continue/still-alive
    /// notifications, which do not end a process.
    pub fn from_wait(status: WaitStatus) -> Option<Self> {
        match status {
            WaitStatus::Exited(_, code) => Some(ExitStatus::Exited(code)),
            WaitStatus::Signaled(_, signal, _) => Some(ExitStatus::Signaled(signal as i32)),
            _ => None,
        }
    }

    pub fn is_signaled(&self) -> bool {
        matches!(self, ExitStatus::Signaled(_))
    }
}

impl Default for ExitStatus {
    /// The status reported before any foreground command has run.
    fn default() -> Self {
        ExitStatus::Exited(0)
    }
}

impl fmt::Display for ExitStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExitStatus::Exited(code) => write!(f, "exit value {code}"),
            ExitStatus::Signaled(signal) => write!(f, "terminated by signal {signal}"),
        }
    }
}

/// Object-safe trait for any command the interpreter can dispatch.
///
/// Implemented by built-ins via a blanket impl and by external commands.
/// Messages meant for the user are written to `stdout`; state changes
/// (last status, job table, exit request) go through `state`.
pub trait ExecutableCommand {
    fn execute(self: Box<Self>, stdout: &mut dyn Write, state: &mut ShellState) -> Result<()>;
}

/// Factory that tries to create a command for a parsed line.
///
/// Returns `None` when the factory doesn't recognize the command name.
pub trait CommandFactory {
    fn try_create(&self, line: &CommandLine) -> Option<Box<dyn ExecutableCommand>>;
}
