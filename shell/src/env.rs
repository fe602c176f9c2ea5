use anyhow::{Context, Result};
use std::collections::HashMap;
use std::env as stdenv;
use std::path::{Path, PathBuf};

/// Snapshot of the process environment used by the interpreter.
///
/// Variable lookups go through `vars` first and fall back to the live
/// process environment. External programs are started with `execvp`, so
/// they always see the real process environment, not this map.
#[derive(Debug, Clone)]
pub struct Environment {
    pub vars: HashMap<String, String>,
    pub current_dir: PathBuf,
}

impl Environment {
    pub fn new() -> Self {
        let vars = stdenv::vars().collect();
        let current_dir = stdenv::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        Self { vars, current_dir }
    }

    pub fn get_var(&self, key: &str) -> Option<String> {
        self.vars
            .get(key)
            .cloned()
            .or_else(|| stdenv::var(key).ok())
    }

    pub fn set_var(&mut self, key: impl Into<String>, val: impl Into<String>) {
        self.vars.insert(key.into(), val.into());
    }

    /// Directory named by `HOME`, if set.
    pub fn home(&self) -> Option<PathBuf> {
        self.get_var("HOME").map(PathBuf::from)
    }

    /// Change the process working directory and record the result.
    pub fn change_dir(&mut self, target: &Path) -> Result<()> {
        stdenv::set_current_dir(target).with_context(|| target.display().to_string())?;
        self.current_dir = stdenv::current_dir().unwrap_or_else(|_| target.to_path_buf());
        Ok(())
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self::new()
    }
}
