//! log4rs setup: a rolling `app.log` for everything and an `audit.log` for the
//! `kartoteka::audit` target (one line per CRUD call).

use log::LevelFilter;
use log4rs::append::rolling_file::RollingFileAppender;
use log4rs::append::rolling_file::policy::compound::{
    CompoundPolicy, roll::fixed_window::FixedWindowRoller, trigger::size::SizeTrigger,
};
use log4rs::config::{Appender, Config, Logger, Root};
use log4rs::encode::pattern::PatternEncoder;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

pub const AUDIT_TARGET: &str = "kartoteka::audit";
pub const DEFAULT_RETENTION: usize = 7;
const ROLL_SIZE: u64 = 10 * 1024 * 1024;
const PATTERN: &str = "{d(%Y-%m-%d %H:%M:%S%.3f)} [{l}] {t} - {m}{n}";

static HANDLE: OnceLock<log4rs::Handle> = OnceLock::new();

/// `error|warn|info|debug|trace|off`, case-insensitive; anything else is `info`.
#[must_use]
pub fn parse_level(level: Option<&str>) -> LevelFilter {
    level.and_then(|l| l.trim().parse().ok()).unwrap_or(LevelFilter::Info)
}

fn rolling(base: &Path, stem: &str, keep: u32) -> Result<RollingFileAppender, Box<dyn std::error::Error>> {
    let roller =
        FixedWindowRoller::builder().build(&base.join(format!("{stem}.{{}}.log")).display().to_string(), keep)?;
    let policy = CompoundPolicy::new(Box::new(SizeTrigger::new(ROLL_SIZE)), Box::new(roller));
    Ok(RollingFileAppender::builder()
        .encoder(Box::new(PatternEncoder::new(PATTERN)))
        .build(base.join(format!("{stem}.log")), Box::new(policy))?)
}

/// Route logging to rolling files under `dir` (current directory when `None`).
///
/// Safe to call more than once: later calls swap the configuration in place.
///
/// # Errors
/// Returns an error if the directory or log files cannot be created.
pub fn configure_logging(
    dir: Option<&Path>,
    level: Option<&str>,
    retention: Option<usize>,
) -> Result<(), Box<dyn std::error::Error>> {
    let base = match dir {
        Some(d) => d.to_path_buf(),
        None => std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
    };
    std::fs::create_dir_all(&base)?;
    let keep = u32::try_from(retention.unwrap_or(DEFAULT_RETENTION)).unwrap_or(u32::MAX);
    let lvl = parse_level(level);

    let config = Config::builder()
        .appender(Appender::builder().build("app", Box::new(rolling(&base, "app", keep)?)))
        .appender(Appender::builder().build("audit", Box::new(rolling(&base, "audit", keep)?)))
        .logger(Logger::builder().appender("audit").additive(false).build(AUDIT_TARGET, LevelFilter::Info))
        .build(Root::builder().appender("app").build(lvl))?;

    if let Some(handle) = HANDLE.get() {
        handle.set_config(config);
    } else {
        let handle = log4rs::init_config(config)?;
        let _ = HANDLE.set(handle);
    }
    log::debug!("logging to {} at {lvl}", base.display());
    Ok(())
}
