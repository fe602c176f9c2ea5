use crate::command::{ExitCode, ExitStatus};
use crate::config::Config;
use crate::env::Environment;
use crate::jobs::JobTable;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Everything the interpreter remembers between prompts.
///
/// There is one instance per run. The foreground-only flag is the only
/// field touched outside the loop: the SIGTSTP handler holds a clone of the
/// `Arc` and flips it.
#[derive(Debug)]
pub struct ShellState {
    pub env: Environment,
    pub config: Config,
    pub jobs: JobTable,
    /// Status of the most recently completed foreground child.
    pub last_status: ExitStatus,
    foreground_only: Arc<AtomicBool>,
    exit_code: Option<ExitCode>,
}

impl ShellState {
    pub fn new(env: Environment, config: Config) -> Self {
        let jobs = JobTable::new(config.max_background_jobs);
        Self {
            env,
            config,
            jobs,
            last_status: ExitStatus::default(),
            foreground_only: Arc::new(AtomicBool::new(false)),
            exit_code: None,
        }
    }

    /// Pid substituted for `$$`.
    pub fn pid(&self) -> u32 {
        std::process::id()
    }

    pub fn foreground_only(&self) -> bool {
        self.foreground_only.load(Ordering::SeqCst)
    }

    pub fn set_foreground_only(&self, on: bool) {
        self.foreground_only.store(on, Ordering::SeqCst);
    }

    /// Shared handle for the signal handler.
    pub fn foreground_only_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.foreground_only)
    }

    pub fn request_exit(&mut self, code: ExitCode) {
        self.exit_code = Some(code);
    }

    pub fn should_exit(&self) -> bool {
        self.exit_code.is_some()
    }

    pub fn exit_code(&self) -> ExitCode {
        self.exit_code.unwrap_or(0)
    }
}
