use crate::config::Config;
use anyhow::{Context, Result};
use simplelog::{ColorChoice, ConfigBuilder, LevelFilter, TermLogger, TerminalMode, WriteLogger};
use std::fs::OpenOptions;

/// Install the diagnostic logger described by `config`.
///
/// Logging is off unless a level was configured. Records go to stderr, or
/// are appended to `config.log_file` when one is set, so they never mix
/// with the prompt protocol on stdout.
pub fn init(config: &Config) -> Result<()> {
    if config.log_level == LevelFilter::Off {
        return Ok(());
    }

    let log_config = ConfigBuilder::new()
        .set_target_level(LevelFilter::Off)
        .set_thread_level(LevelFilter::Off)
        .build();

    match &config.log_file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("opening log file {}", path.display()))?;
            WriteLogger::init(config.log_level, log_config, file)?;
        }
        None => {
            TermLogger::init(
                config.log_level,
                log_config,
                TerminalMode::Stderr,
                ColorChoice::Auto,
            )?;
        }
    }

    for setting in &config.rejected {
        log::warn!("ignoring invalid setting {setting}, using default");
    }
    log::info!(
        "smallsh {} started, pid {}, job limit {}",
        env!("CARGO_PKG_VERSION"),
        std::process::id(),
        config.max_background_jobs
    );
    Ok(())
}
