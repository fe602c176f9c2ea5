//! Runtime configuration, resolved once at startup from the environment.

use crate::env::Environment;
use log::LevelFilter;
use std::path::PathBuf;
use std::str::FromStr;

/// Prompt written before every read.
pub const DEFAULT_PROMPT: &str = ": ";

/// Upper bound on simultaneously running background jobs.
pub const DEFAULT_MAX_BACKGROUND_JOBS: usize = 256;

/// Device that background jobs read from and write to when they name no
/// redirection of their own.
pub const NULL_DEVICE: &str = "/dev/null";

pub const LOG_LEVEL_VAR: &str = "SMALLSH_LOG";
pub const LOG_FILE_VAR: &str = "SMALLSH_LOG_FILE";
pub const MAX_JOBS_VAR: &str = "SMALLSH_MAX_JOBS";

#[derive(Debug, Clone)]
pub struct Config {
    pub prompt: String,
    pub max_background_jobs: usize,
    pub null_device: PathBuf,
    pub log_level: LevelFilter,
    pub log_file: Option<PathBuf>,
    /// Settings that were rejected and replaced by their defaults. Kept so
    /// they can be reported once logging is up.
    pub rejected: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            prompt: DEFAULT_PROMPT.to_string(),
            max_background_jobs: DEFAULT_MAX_BACKGROUND_JOBS,
            null_device: PathBuf::from(NULL_DEVICE),
            log_level: LevelFilter::Off,
            log_file: None,
            rejected: Vec::new(),
        }
    }
}

impl Config {
    pub fn from_env(env: &Environment) -> Self {
        let mut config = Config::default();

        if let Some(level) = env.get_var(LOG_LEVEL_VAR) {
            match LevelFilter::from_str(level.trim()) {
                Ok(level) => config.log_level = level,
                Err(_) => config.rejected.push(format!("{LOG_LEVEL_VAR}={level}")),
            }
        }

        config.log_file = env
            .get_var(LOG_FILE_VAR)
            .filter(|path| !path.is_empty())
            .map(PathBuf::from);

        if let Some(limit) = env.get_var(MAX_JOBS_VAR) {
            match limit.trim().parse::<usize>() {
                Ok(n) if n > 0 => config.max_background_jobs = n,
                _ => config.rejected.push(format!("{MAX_JOBS_VAR}={limit}")),
            }
        }

        config
    }
}
