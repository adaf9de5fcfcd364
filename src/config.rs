use std::fs;
use std::path::{Path, PathBuf};
use log::{LevelFilter, debug};
use serde::Deserialize;
use tong_core::InterpreterConfig;
use tong_core::language::interpreter::{DEFAULT_MAP_PARALLEL_THRESHOLD, DEFAULT_SUM_PARALLEL_THRESHOLD};

pub const DEFAULT_CONFIG_FILE: &str = "tong.toml";

#[derive(Debug, Default, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub runtime: RuntimeConfigure,
    pub logging: LoggingConfigure,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunnerKind {
    #[default]
    Sequential,
    Threads,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RuntimeConfigure {
    pub runner: RunnerKind,
    pub workers: Option<usize>,
    pub sum_threshold: usize,
    pub map_threshold: usize,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfigure {
    pub console_level: String,
    pub file_level: String,
    pub directory: Option<PathBuf>,
}

impl Default for RuntimeConfigure {
    fn default() -> Self {
        RuntimeConfigure {
            runner: RunnerKind::Sequential,
            workers: None,
            sum_threshold: DEFAULT_SUM_PARALLEL_THRESHOLD,
            map_threshold: DEFAULT_MAP_PARALLEL_THRESHOLD,
        }
    }
}

impl RuntimeConfigure {
    pub fn interpreter_config(&self) -> InterpreterConfig {
        InterpreterConfig {
            sum_parallel_threshold: self.sum_threshold,
            map_parallel_threshold: self.map_threshold,
        }
    }
}

impl Default for LoggingConfigure {
    fn default() -> Self {
        LoggingConfigure {
            console_level: "warn".to_string(),
            file_level: "debug".to_string(),
            directory: None,
        }
    }
}

impl LoggingConfigure {
    pub fn console_filter(&self) -> Result<LevelFilter, Box<dyn std::error::Error>> {
        parse_level(&self.console_level)
    }

    pub fn file_filter(&self) -> Result<LevelFilter, Box<dyn std::error::Error>> {
        parse_level(&self.file_level)
    }
}

fn parse_level(level: &str) -> Result<LevelFilter, Box<dyn std::error::Error>> {
    level
        .parse::<LevelFilter>()
        .map_err(|_| format!("Unknown log level '{}'", level).into())
}

pub fn parse_config(content: &str) -> Result<Config, Box<dyn std::error::Error>> {
    let config: Config = toml::from_str(content)?;
    Ok(config)
}

pub fn load_config(path: &Path) -> Result<Config, Box<dyn std::error::Error>> {
    let content = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read config file '{}': {}", path.display(), e))?;
    parse_config(&content)
        .map_err(|e| format!("Failed to parse config file '{}': {}", path.display(), e).into())
}

/// An explicit path must exist; the default file is optional.
pub fn resolve(explicit: Option<&Path>) -> Result<Config, Box<dyn std::error::Error>> {
    match explicit {
        Some(path) => load_config(path),
        None if Path::new(DEFAULT_CONFIG_FILE).is_file() => {
            debug!("Using {} from the working directory", DEFAULT_CONFIG_FILE);
            load_config(Path::new(DEFAULT_CONFIG_FILE))
        }
        None => Ok(Config::default()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_uses_defaults() {
        let config = parse_config("").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.runtime.sum_threshold, 1000);
        assert_eq!(config.logging.console_filter().unwrap(), LevelFilter::Warn);
    }

    #[test]
    fn full_file_is_read() {
        let config = parse_config(
            r#"
[runtime]
runner = "threads"
workers = 8
sum_threshold = 10
map_threshold = 5

[logging]
console_level = "info"
file_level = "trace"
directory = "logs"
"#,
        )
        .unwrap();

        assert_eq!(config.runtime.runner, RunnerKind::Threads);
        assert_eq!(config.runtime.workers, Some(8));
        assert_eq!(
            config.runtime.interpreter_config(),
            InterpreterConfig { sum_parallel_threshold: 10, map_parallel_threshold: 5 }
        );
        assert_eq!(config.logging.file_filter().unwrap(), LevelFilter::Trace);
        assert_eq!(config.logging.directory, Some(PathBuf::from("logs")));
    }

    #[test]
    fn malformed_values_are_rejected() {
        assert!(parse_config("[runtime]\nrunner = \"gpu\"").is_err());
        assert!(parse_config("[runtime]\nthreads = 2").is_err());
        let config = parse_config("[logging]\nconsole_level = \"loud\"").unwrap();
        assert!(config.logging.console_filter().is_err());
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        let error = resolve(Some(Path::new("definitely/missing/tong.toml"))).unwrap_err();
        assert!(error.to_string().starts_with("Failed to read config file"));
    }
}
