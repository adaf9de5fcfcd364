use chrono::Local;
use colored::*;
use log::{Level, LevelFilter};
use std::path::{Path, PathBuf};

const LOGS_PREFIX: &str = "tong_log";
const SEPARATOR: &str = "_";
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d_%H-%M-%S";
const LOG_EXTENSION: &str = "log";
const CONSOLE_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";

fn generate_filename_only() -> String {
    let now = Local::now();
    let timestamp = now.format(TIMESTAMP_FORMAT).to_string();
    format!("{}{}{}.{}", LOGS_PREFIX, SEPARATOR, timestamp, LOG_EXTENSION)
}

fn ensure_log_directory_exists(log_dir: &Path) -> std::io::Result<()> {
    if !log_dir.exists() {
        std::fs::create_dir_all(log_dir)?;
    }
    Ok(())
}

fn timestamp() -> String {
    Local::now().format(CONSOLE_TIMESTAMP_FORMAT).to_string()
}

/// Pool workers are named by the task runner; the main thread is "main".
fn thread_name() -> String {
    std::thread::current().name().unwrap_or("unnamed").to_string()
}

fn colored_level(level: Level) -> ColoredString {
    match level {
        Level::Error => "ERROR".red().bold(),
        Level::Warn => "WARN ".yellow().bold(),
        Level::Info => "INFO ".green().bold(),
        Level::Debug => "DEBUG".blue().bold(),
        Level::Trace => "TRACE".magenta().bold(),
    }
}

/// Installs the global logger.
///
/// Console records go to stderr so that they never interleave with program
/// output printed on stdout. When `log_dir` is given, a second dispatch writes
/// every record at or above `file_level` into a timestamped file inside it.
pub fn init(
    log_dir: Option<impl AsRef<Path>>,
    console_level: LevelFilter,
    file_level: LevelFilter,
) -> Result<(), fern::InitError> {
    let mut log_file_path: Option<PathBuf> = None;

    if let Some(dir) = log_dir {
        let dir_path = dir.as_ref();
        ensure_log_directory_exists(dir_path).map_err(|e| {
            fern::InitError::Io(std::io::Error::other(format!(
                "could not create log directory '{}': {}",
                dir_path.display(),
                e
            )))
        })?;
        log_file_path = Some(dir_path.join(generate_filename_only()));
    }

    let console_dispatch = fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "[{}] [{}] [{}] [{}] {}",
                timestamp(),
                colored_level(record.level()),
                thread_name(),
                record.target(),
                message
            ))
        })
        .level(console_level)
        .chain(std::io::stderr());

    let mut base_dispatch = fern::Dispatch::new()
        .level(LevelFilter::Trace)
        .chain(console_dispatch);

    if let Some(path) = &log_file_path {
        let file_dispatch = fern::Dispatch::new()
            .format(|out, message, record| {
                out.finish(format_args!(
                    "[{}] [{:<5}] [{}] [{}] [{}:{}] {}",
                    timestamp(),
                    record.level(),
                    thread_name(),
                    record.target(),
                    record.file().unwrap_or("?"),
                    record.line().unwrap_or(0),
                    message
                ))
            })
            .level(file_level)
            .chain(fern::log_file(path)?);

        base_dispatch = base_dispatch.chain(file_dispatch);
    }

    base_dispatch.apply()?;

    log::debug!("Logger initialised. Console level: {}, file level: {}", console_level, file_level);
    match &log_file_path {
        Some(path) => log::debug!("Writing logs to {}", path.display()),
        None => log::debug!("File logging disabled"),
    }

    Ok(())
}
