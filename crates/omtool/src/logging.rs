//! JSON-lines logging.
//!
//! Every record is one line `{"time", "level", "message_type", "payload"}`.
//! The log target is the message type; records logged under a module path
//! target are plain messages of type `msg`. A message that is a JSON object
//! becomes the payload as is.

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::PathBuf;

use log::{Level, LevelFilter, Record};
use serde::Deserialize;
use serde_json::json;

use crate::config::ConfigError;

fn default_level() -> String {
    "info".to_string()
}

/// The `logging` section of every config file.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LoggingConfig {
    /// Records are appended here as well as printed to stdout
    #[serde(default)]
    pub filename: Option<PathBuf>,
    #[serde(default = "default_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filename: None,
            level: default_level(),
        }
    }
}

impl LoggingConfig {
    pub fn level_filter(&self, verbose: bool) -> Result<LevelFilter, ConfigError> {
        if verbose {
            return Ok(LevelFilter::Debug);
        }
        self.level
            .parse()
            .map_err(|_| ConfigError::Invalid(format!("unknown log level `{}`", self.level)))
    }
}

/// Writes each line to stdout and, when configured, to a file.
struct Tee {
    file: Option<File>,
}

impl Write for Tee {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        io::stdout().write_all(buf)?;
        if let Some(file) = &mut self.file {
            file.write_all(buf)?;
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        io::stdout().flush()?;
        if let Some(file) = &mut self.file {
            file.flush()?;
        }
        Ok(())
    }
}

/// Installs the global JSON logger.
pub fn init(config: &LoggingConfig, verbose: bool) -> Result<(), ConfigError> {
    let file = config
        .filename
        .as_ref()
        .map(|path| {
            OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .map_err(|source| ConfigError::Io {
                    path: path.clone(),
                    source,
                })
        })
        .transpose()?;

    env_logger::Builder::new()
        .filter_level(config.level_filter(verbose)?)
        .format(|buf, record| {
            let time = buf.timestamp_seconds().to_string();
            let line = record_json(&time, record.level(), record.target(), &record.args().to_string());
            writeln!(buf, "{line}")
        })
        .target(env_logger::Target::Pipe(Box::new(Tee { file })))
        .try_init()
        .map_err(|e| ConfigError::Invalid(format!("logger already initialized: {e}")))
}

/// The JSON line of one record.
pub fn record_json(time: &str, level: Level, target: &str, message: &str) -> serde_json::Value {
    let message_type = if target.is_empty() || target.contains("::") {
        "msg"
    } else {
        target
    };
    let payload = match serde_json::from_str::<serde_json::Value>(message) {
        Ok(object @ serde_json::Value::Object(_)) => object,
        _ => json!({ "message": message }),
    };
    json!({
        "time": time,
        "level": level.as_str(),
        "message_type": message_type,
        "payload": payload,
    })
}

/// Logs `payload` under a message type only known at run time.
pub fn emit(level: Level, message_type: &str, payload: &serde_json::Value) {
    log::logger().log(
        &Record::builder()
            .level(level)
            .target(message_type)
            .args(format_args!("{payload}"))
            .build(),
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_messages_become_payloads() {
        let line = record_json("t", Level::Info, "task_output", r#"{"id": "mass", "values": [1, 2]}"#);
        assert_eq!(line["message_type"], "task_output");
        assert_eq!(line["level"], "INFO");
        assert_eq!(line["payload"]["id"], "mass");
    }

    #[test]
    fn test_plain_messages_are_wrapped() {
        let line = record_json("t", Level::Warn, "omtool::analyze", "Analysis started");
        assert_eq!(line["message_type"], "msg");
        assert_eq!(line["payload"], json!({"message": "Analysis started"}));

        let array = record_json("t", Level::Debug, "slice", "[1, 2]");
        assert_eq!(array["payload"], json!({"message": "[1, 2]"}));
    }

    #[test]
    fn test_level_comes_from_config_or_verbose_flag() {
        let config: LoggingConfig = serde_yaml::from_str("level: warn\ndatefmt: '%H'").unwrap();
        assert_eq!(config.level_filter(false).unwrap(), LevelFilter::Warn);
        assert_eq!(config.level_filter(true).unwrap(), LevelFilter::Debug);
        assert_eq!(LoggingConfig::default().level_filter(false).unwrap(), LevelFilter::Info);

        let bad = LoggingConfig {
            level: "loud".to_string(),
            ..LoggingConfig::default()
        };
        assert!(bad.level_filter(false).is_err());
    }
}
