//! A small interactive shell with POSIX-style job control.
//!
//! Each line is split on whitespace, `$$` is expanded to the shell's pid,
//! and the result is either handled by one of the builtins (`cd`, `status`,
//! `exit`) or run as a child process. A trailing `&` runs the child in the
//! background; its completion is reported before a later prompt. SIGTSTP
//! toggles a foreground-only mode in which `&` is ignored, and SIGINT only
//! ever reaches the foreground child.
//!
//! The main entry point is [`Interpreter`], driven by a [`LineSource`] and
//! holding all run state in a [`ShellState`].

mod builtin;
pub mod command;
pub mod config;
pub mod env;
mod external;
pub mod input;
mod interpreter;
pub mod jobs;
pub mod lexer;
pub mod logging;
pub mod parser;
pub mod redirect;
pub mod signals;
pub mod state;

pub use command::ExitStatus;
pub use config::Config;
pub use env::Environment;
pub use input::{Input, LineSource, Script, Terminal};
pub use interpreter::Interpreter;
pub use signals::SignalController;
pub use state::ShellState;
