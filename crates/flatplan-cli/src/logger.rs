use chrono::{DateTime, Local};
use log::{Level, LevelFilter, Metadata, Record};

/// Writes timestamped log lines to stderr, leaving stdout for reports
#[derive(Clone)]
pub struct CliLogger {
    level: LevelFilter,
}

impl CliLogger {
    pub fn new(verbose: bool) -> Self {
        Self {
            level: if verbose {
                LevelFilter::Debug
            } else {
                LevelFilter::Info
            },
        }
    }

    pub fn init(self) -> Result<(), log::SetLoggerError> {
        let level = self.level;
        log::set_boxed_logger(Box::new(self))?;
        log::set_max_level(level);
        Ok(())
    }
}

fn format_line(timestamp: DateTime<Local>, level: Level, message: &str) -> String {
    format!("{} {:<5} {}", timestamp.format("%H:%M:%S"), level, message)
}

impl log::Log for CliLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            eprintln!(
                "{}",
                format_line(Local::now(), record.level(), &record.args().to_string())
            );
        }
    }

    fn flush(&self) {}
}
