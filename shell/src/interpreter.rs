use crate::builtin;
use crate::command::{CommandFactory, ExitCode};
use crate::input::{Input, LineSource};
use crate::parser;
use crate::state::ShellState;
use anyhow::anyhow;
use std::io::Write;

/// Factory allows creating instances of ExecutableCommand.
///
/// Only supports commands defined in this crate: the builtins and
/// ExternalCommand.
pub(crate) struct Factory<T> {
    _phantom: std::marker::PhantomData<T>,
}

impl<T> Default for Factory<T> {
    fn default() -> Self {
        Self {
            _phantom: std::marker::PhantomData,
        }
    }
}

/// The prompt loop.
///
/// Each iteration first reports background jobs that finished, then reads a
/// line, parses it and hands it to the first [`CommandFactory`] that
/// recognizes it. Builtins are queried before the external launcher, which
/// accepts everything.
///
/// Example
/// ```
/// use smallsh::{Config, Environment, Interpreter, ShellState};
/// let mut sh = Interpreter::new(ShellState::new(Environment::new(), Config::default()));
/// let mut out = Vec::new();
/// sh.execute_line("status", &mut out).unwrap();
/// assert_eq!(out, b"exit value 0\n");
/// ```
pub struct Interpreter {
    state: ShellState,
    commands: Vec<Box<dyn CommandFactory>>,
}

impl Interpreter {
    /// Interpreter with the builtins `cd`, `status`, `exit` and the
    /// external command launcher.
    pub fn new(state: ShellState) -> Self {
        use crate::builtin::*;
        use crate::external::ExternalCommand;
        Self::with_commands(
            state,
            vec![
                Box::new(Factory::<Cd>::default()),
                Box::new(Factory::<Status>::default()),
                Box::new(Factory::<Exit>::default()),
                Box::new(Factory::<ExternalCommand>::default()),
            ],
        )
    }

    /// Create an interpreter with a custom set of command factories.
    pub fn with_commands(state: ShellState, commands: Vec<Box<dyn CommandFactory>>) -> Self {
        Self { state, commands }
    }

    pub fn state(&self) -> &ShellState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut ShellState {
        &mut self.state
    }

    /// Parse and run a single line. Blank lines and comments do nothing.
    pub fn execute_line(&mut self, line: &str, stdout: &mut dyn Write) -> anyhow::Result<()> {
        let Some(command) =
            parser::parse_line(line, self.state.pid(), self.state.foreground_only())
        else {
            return Ok(());
        };
        log::trace!("dispatching {:?}", command);

        for factory in &self.commands {
            if let Some(cmd) = factory.try_create(&command) {
                return cmd.execute(stdout, &mut self.state);
            }
        }
        Err(anyhow!("command not found: {}", command.name()))
    }

    /// Print a completion notice for every background job that ended since
    /// the last check.
    pub fn reap_background(&mut self, stdout: &mut dyn Write) -> anyhow::Result<()> {
        for (pid, status) in self.state.jobs.reap() {
            writeln!(stdout, "background pid {pid} is done: {status}")?;
        }
        stdout.flush()?;
        Ok(())
    }

    /// Run until `exit` or end of input and return the code the process
    /// should exit with.
    pub fn repl(
        &mut self,
        input: &mut dyn LineSource,
        stdout: &mut dyn Write,
    ) -> anyhow::Result<ExitCode> {
        while !self.state.should_exit() {
            self.reap_background(stdout)?;

            let prompt = self.state.config.prompt.clone();
            match input.read_line(&prompt)? {
                Input::Line(line) => {
                    if let Err(e) = self.execute_line(&line, stdout) {
                        log::error!("{line:?}: {e:#}");
                        eprintln!("smallsh: {e:#}");
                    }
                }
                Input::Interrupted => continue,
                Input::Eof => {
                    log::info!("end of input, shutting down");
                    builtin::shutdown(stdout, &mut self.state)?;
                }
            }
        }
        Ok(self.state.exit_code())
    }
}
