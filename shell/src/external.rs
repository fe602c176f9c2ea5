use crate::command::{CommandFactory, ExecutableCommand, ExitStatus};
use crate::interpreter::Factory;
use crate::jobs;
use crate::parser::CommandLine;
use crate::redirect::{self, Redirection};
use crate::signals;
use crate::state::ShellState;
use anyhow::{Context, Result};
use nix::unistd::{self, ForkResult, Pid};
use std::ffi::CString;
use std::io::{self, Write};
use std::path::Path;

/// Any command that is not a builtin; run as a child process.
pub struct ExternalCommand {
    line: CommandLine,
}

impl ExternalCommand {
    pub fn new(line: CommandLine) -> Self {
        Self { line }
    }
}

impl CommandFactory for Factory<ExternalCommand> {
    fn try_create(&self, line: &CommandLine) -> Option<Box<dyn ExecutableCommand>> {
        Some(Box::new(ExternalCommand::new(line.clone())))
    }
}

/// What the child needs to exec, built before forking so the child does
/// no parsing or allocation of its own on the success path.
struct ExecPlan {
    name: String,
    argv: Vec<CString>,
    redirection: Redirection,
}

impl ExecPlan {
    /// Resolve redirections and encode argv. The error is the message the
    /// child prints before exiting with status 1.
    fn prepare(tokens: &[String]) -> Result<Self, String> {
        let resolved = redirect::resolve(tokens).map_err(|e| e.to_string())?;
        let argv = resolved
            .argv
            .iter()
            .map(|arg| CString::new(arg.as_bytes()))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|_| format!("{}: argument contains a NUL byte", resolved.argv[0]))?;
        Ok(Self {
            name: resolved.argv[0].clone(),
            argv,
            redirection: resolved.redirection,
        })
    }
}

impl ExecutableCommand for ExternalCommand {
    fn execute(self: Box<Self>, stdout: &mut dyn Write, state: &mut ShellState) -> Result<()> {
        let background = self.line.background;
        if background && state.jobs.is_full() {
            eprintln!("background job limit ({}) reached", state.jobs.limit());
            return Ok(());
        }

        // Problems with the line are only reported by the child, which then
        // exits; the interpreter itself carries on.
        let plan = ExecPlan::prepare(&self.line.argv);

        stdout.flush()?;
        match unsafe { unistd::fork() } {
            Err(e) => {
                log::error!("fork failed for {}: {e}", self.line.name());
                eprintln!("fork: {e}");
                Ok(())
            }
            Ok(ForkResult::Child) => run_child(plan, background, &state.config.null_device),
            Ok(ForkResult::Parent { child }) => {
                log::debug!(
                    "started {} as pid {child}{}",
                    self.line.name(),
                    if background { " in background" } else { "" }
                );
                if background {
                    state.jobs.track(child)?;
                    writeln!(stdout, "background pid is {child}")?;
                } else {
                    let status = wait_foreground(child)?;
                    if status.is_signaled() {
                        writeln!(stdout, "{status}")?;
                    }
                    state.last_status = status;
                }
                stdout.flush()?;
                Ok(())
            }
        }
    }
}

fn wait_foreground(child: Pid) -> Result<ExitStatus> {
    let status = jobs::wait_for_exit(child).with_context(|| format!("waiting for pid {child}"))?;
    log::debug!("foreground pid {child} finished: {status}");
    Ok(status)
}

/// Child side of the fork. Never returns into interpreter code: it either
/// becomes the target program or exits with status 1.
///
/// Failures are reported on the child's stdout, which may already be a
/// redirection target.
fn run_child(plan: Result<ExecPlan, String>, background: bool, null_device: &Path) -> ! {
    let _ = signals::configure_child(background);

    let failure = match plan {
        Err(message) => message,
        Ok(plan) => match redirect::apply(&plan.redirection, background, null_device) {
            Err(e) => e.to_string(),
            Ok(()) => {
                let _ = unistd::execvp(plan.argv[0].as_c_str(), &plan.argv);
                format!("{}: no such file or directory", plan.name)
            }
        },
    };

    let mut stdout = io::stdout();
    let _ = writeln!(stdout, "{failure}");
    let _ = stdout.flush();
    unsafe { libc::_exit(1) }
}
