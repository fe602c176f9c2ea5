//! Redirection Resolver.
//!
//! `<file` and `>file` pairs are found by [`resolve`], which strips them
//! from the argument vector. [`apply`] then opens the files and rebinds
//! stdin/stdout; it runs in the forked child only, so every failure here
//! ends that child and never the interpreter.

use nix::unistd;
use std::fmt;
use std::fs::{File, OpenOptions};
use std::os::unix::fs::OpenOptionsExt;
use std::os::unix::io::{IntoRawFd, RawFd};
use std::path::Path;

pub const INPUT_SYMBOL: &str = "<";
pub const OUTPUT_SYMBOL: &str = ">";

const OUTPUT_MODE: u32 = 0o644;

#[derive(Debug)]
pub enum RedirectError {
    /// A redirection symbol was the final token.
    DanglingSymbol,
    /// Nothing but redirections was left on the line.
    MissingCommand,
    CannotOpenInput(String),
    CannotOpenOutput(String),
    Rebind(nix::Error),
}

impl fmt::Display for RedirectError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RedirectError::DanglingSymbol => write!(f, "no file specified for redirection"),
            RedirectError::MissingCommand => write!(f, "no command specified"),
            RedirectError::CannotOpenInput(path) => write!(f, "cannot open {path} for input"),
            RedirectError::CannotOpenOutput(path) => write!(f, "cannot open {path} for output"),
            RedirectError::Rebind(e) => write!(f, "cannot rebind standard stream: {e}"),
        }
    }
}

impl std::error::Error for RedirectError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RedirectError::Rebind(e) => Some(e),
            _ => None,
        }
    }
}

/// Files a command wants its standard streams bound to.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Redirection {
    pub input: Option<String>,
    pub output: Option<String>,
}

/// Argument vector with redirections removed, plus the redirections.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolved {
    pub argv: Vec<String>,
    pub redirection: Redirection,
}

/// Scan `tokens` left to right for `<`/`>` pairs.
///
/// A symbol is paired with the token right after it, which is consumed as a
/// filename even if it looks like a symbol. When the same stream is
/// redirected twice the later pair wins. The remaining tokens keep their
/// relative order.
pub fn resolve(tokens: &[String]) -> Result<Resolved, RedirectError> {
    let mut keep = vec![true; tokens.len()];
    let mut redirection = Redirection::default();

    let mut i = 0;
    while i < tokens.len() {
        let slot = match tokens[i].as_str() {
            INPUT_SYMBOL => &mut redirection.input,
            OUTPUT_SYMBOL => &mut redirection.output,
            _ => {
                i += 1;
                continue;
            }
        };
        let Some(target) = tokens.get(i + 1) else {
            return Err(RedirectError::DanglingSymbol);
        };
        *slot = Some(target.clone());
        keep[i] = false;
        keep[i + 1] = false;
        i += 2;
    }

    let argv: Vec<String> = tokens
        .iter()
        .zip(keep)
        .filter_map(|(token, keep)| keep.then(|| token.clone()))
        .collect();
    if argv.is_empty() {
        return Err(RedirectError::MissingCommand);
    }
    Ok(Resolved { argv, redirection })
}

/// Open the requested files and rebind stdin/stdout in the calling process.
///
/// A background command gets the null device for every stream it did not
/// redirect itself.
pub fn apply(
    redirection: &Redirection,
    background: bool,
    null_device: &Path,
) -> Result<(), RedirectError> {
    let input = match &redirection.input {
        Some(path) => Some(open_input(path)?),
        None if background => Some(open_null(null_device, false)?),
        None => None,
    };
    if let Some(file) = input {
        rebind(file, libc::STDIN_FILENO)?;
    }

    let output = match &redirection.output {
        Some(path) => Some(open_output(path)?),
        None if background => Some(open_null(null_device, true)?),
        None => None,
    };
    if let Some(file) = output {
        rebind(file, libc::STDOUT_FILENO)?;
    }
    Ok(())
}

fn open_input(path: &str) -> Result<File, RedirectError> {
    File::open(path).map_err(|_| RedirectError::CannotOpenInput(path.to_owned()))
}

/// Open for writing with truncation, creating the file only if the plain
/// open fails.
pub fn open_output(path: &str) -> Result<File, RedirectError> {
    OpenOptions::new()
        .write(true)
        .truncate(true)
        .open(path)
        .or_else(|_| {
            OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(true)
                .mode(OUTPUT_MODE)
                .open(path)
        })
        .map_err(|_| RedirectError::CannotOpenOutput(path.to_owned()))
}

fn open_null(null_device: &Path, write: bool) -> Result<File, RedirectError> {
    let shown = null_device.display().to_string();
    OpenOptions::new()
        .read(!write)
        .write(write)
        .open(null_device)
        .map_err(|_| {
            if write {
                RedirectError::CannotOpenOutput(shown)
            } else {
                RedirectError::CannotOpenInput(shown)
            }
        })
}

fn rebind(file: File, target: RawFd) -> Result<(), RedirectError> {
    let fd = file.into_raw_fd();
    if fd != target {
        unistd::dup2(fd, target).map_err(RedirectError::Rebind)?;
        unistd::close(fd).map_err(RedirectError::Rebind)?;
    }
    Ok(())
}
