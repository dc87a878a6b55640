//! Forwards engine log entries to the `log` facade
//!
//! The engine keeps its own logger host; the demo routes it into `env_logger`
//! so `RUST_LOG` filters engine output like any other crate's.

use log::Level;
use water_engine::water3d::log::{LogEntry, LogSeverity, Logger};

pub struct LogBridge;

impl Logger for LogBridge {
    fn log(&self, entry: &LogEntry) {
        let level = match entry.severity {
            LogSeverity::Trace => Level::Trace,
            LogSeverity::Debug => Level::Debug,
            LogSeverity::Info => Level::Info,
            LogSeverity::Warn => Level::Warn,
            LogSeverity::Error => Level::Error,
        };
        match (entry.file, entry.line) {
            (Some(file), Some(line)) => {
                log::log!(target: "water3d", level, "[{}] {} ({}:{})", entry.source, entry.message, file, line)
            }
            _ => log::log!(target: "water3d", level, "[{}] {}", entry.source, entry.message),
        }
    }
}
