//! Bookkeeping for background jobs.
//!
//! Jobs are identified only by pid. A record is appended when a background
//! child is launched and is never removed; reaping just flips its `done`
//! flag, which only ever goes from `false` to `true`. A finished record is
//! never waited on again.

use crate::command::ExitStatus;
use anyhow::{Result, bail};
use nix::errno::Errno;
use nix::sys::signal::{self, Signal};
use nix::sys::wait::{WaitPidFlag, WaitStatus, waitpid};
use nix::unistd::Pid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Job {
    pub pid: Pid,
    pub done: bool,
}

#[derive(Debug)]
pub struct JobTable {
    jobs: Vec<Job>,
    limit: usize,
}

impl JobTable {
    /// Create a table that refuses new jobs while `limit` of them are still
    /// running.
    pub fn new(limit: usize) -> Self {
        Self {
            jobs: Vec::new(),
            limit,
        }
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn jobs(&self) -> &[Job] {
        &self.jobs
    }

    pub fn running(&self) -> impl Iterator<Item = &Job> {
        self.jobs.iter().filter(|job| !job.done)
    }

    pub fn is_full(&self) -> bool {
        self.running().count() >= self.limit
    }

    /// Record a freshly launched background child.
    pub fn track(&mut self, pid: Pid) -> Result<()> {
        if self.is_full() {
            bail!("background job limit ({}) reached", self.limit);
        }
        if self.running().any(|job| job.pid == pid) {
            bail!("pid {pid} is already tracked");
        }
        self.jobs.push(Job { pid, done: false });
        Ok(())
    }

    /// Poll every unfinished job without blocking and return the ones that
    /// terminated since the last call, in launch order.
    pub fn reap(&mut self) -> Vec<(Pid, ExitStatus)> {
        let mut finished = Vec::new();
        for job in self.jobs.iter_mut().filter(|job| !job.done) {
            match waitpid(job.pid, Some(WaitPidFlag::WNOHANG)) {
                Ok(WaitStatus::StillAlive) | Err(Errno::EINTR) => {}
                Ok(status) => {
                    if let Some(status) = ExitStatus::from_wait(status) {
                        log::debug!("reaped background pid {}: {status}", job.pid);
                        job.done = true;
                        finished.push((job.pid, status));
                    }
                }
                Err(Errno::ECHILD) => {
                    log::warn!("background pid {} vanished before it was reaped", job.pid);
                    job.done = true;
                }
                Err(e) => log::warn!("polling background pid {}: {e}", job.pid),
            }
        }
        finished
    }

    /// Send SIGTERM to every unfinished job and block until each one is
    /// gone. Returns the final status of every job that could be collected.
    pub fn terminate_all(&mut self) -> Vec<(Pid, ExitStatus)> {
        let mut finished = Vec::new();
        for job in self.jobs.iter_mut().filter(|job| !job.done) {
            if let Err(e) = signal::kill(job.pid, Signal::SIGTERM) {
                log::debug!("SIGTERM to {}: {e}", job.pid);
            }
            match wait_for_exit(job.pid) {
                Ok(status) => finished.push((job.pid, status)),
                Err(e) => log::warn!("waiting for background pid {}: {e}", job.pid),
            }
            job.done = true;
        }
        finished
    }
}

/// Block until `pid` terminates, riding out interrupted waits.
pub fn wait_for_exit(pid: Pid) -> nix::Result<ExitStatus> {
    loop {
        match waitpid(pid, None) {
            Ok(status) => {
                if let Some(status) = ExitStatus::from_wait(status) {
                    return Ok(status);
                }
            }
            Err(Errno::EINTR) => continue,
            Err(e) => return Err(e),
        }
    }
}
