//! Signal Controller.
//!
//! The interpreter catches SIGINT with a handler that does nothing, so ^C
//! only hurts the foreground child, and catches SIGTSTP to flip
//! foreground-only mode. Handlers may only flip the shared flag and write a
//! fixed notice; the loop observes the flag the next time it parses a line.

use anyhow::{Context, Result};
use nix::sys::signal::{self, SigHandler, Signal};
use signal_hook::SigId;
use signal_hook::consts::{SIGINT, SIGTSTP};
use signal_hook::low_level;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

pub const ENTER_FOREGROUND_ONLY: &str = "\nEntering foreground-only mode (& is now ignored)\n: ";
pub const EXIT_FOREGROUND_ONLY: &str = "\nExiting foreground-only mode\n: ";

/// Flip foreground-only mode and return the notice for the mode just
/// entered.
pub fn toggle_foreground_only(flag: &AtomicBool) -> &'static str {
    if flag.fetch_xor(true, Ordering::SeqCst) {
        EXIT_FOREGROUND_ONLY
    } else {
        ENTER_FOREGROUND_ONLY
    }
}

/// Write straight to fd 1; the only output primitive allowed in a handler.
fn write_notice(notice: &str) {
    unsafe {
        libc::write(libc::STDOUT_FILENO, notice.as_ptr().cast(), notice.len());
    }
}

/// Owns the interpreter's handler registrations; dropping it unregisters
/// them.
pub struct SignalController {
    registrations: Vec<SigId>,
}

impl SignalController {
    pub fn install(foreground_only: Arc<AtomicBool>) -> Result<Self> {
        let interrupt =
            unsafe { low_level::register(SIGINT, || {}) }.context("installing SIGINT handler")?;
        let suspend = unsafe {
            low_level::register(SIGTSTP, move || {
                write_notice(toggle_foreground_only(&foreground_only));
            })
        }
        .context("installing SIGTSTP handler")?;
        log::debug!("signal handlers installed");
        Ok(Self {
            registrations: vec![interrupt, suspend],
        })
    }
}

impl Drop for SignalController {
    fn drop(&mut self) {
        for id in self.registrations.drain(..) {
            low_level::unregister(id);
        }
    }
}

/// Set the dispositions a freshly forked child runs its program with.
///
/// Both kinds of child ignore SIGTSTP. A foreground child takes the default
/// SIGINT action so ^C terminates it; a background child ignores SIGINT as
/// well so terminal signals never reach it.
pub fn configure_child(background: bool) -> nix::Result<()> {
    let interrupt = if background {
        SigHandler::SigIgn
    } else {
        SigHandler::SigDfl
    };
    unsafe {
        signal::signal(Signal::SIGTSTP, SigHandler::SigIgn)?;
        signal::signal(Signal::SIGINT, interrupt)?;
    }
    Ok(())
}
