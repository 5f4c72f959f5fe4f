use crate::error::Result;
use chrono::{DateTime, Utc};
use log::{LevelFilter, Metadata, Record};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use std::sync::Mutex;

pub const DEFAULT_LOGFILE: &str = "c19.log";

/// Where the log records go and how verbose each destination is.
/// Built by the caller and passed to `init`.
#[derive(Debug, Clone, PartialEq)]
pub struct LogConfig {
    /// truncated at init; None disables the file log
    pub file: Option<PathBuf>,
    pub file_level: LevelFilter,
    pub console_level: LevelFilter,
}

impl Default for LogConfig {
    fn default() -> Self {
        LogConfig {
            file: Some(PathBuf::from(DEFAULT_LOGFILE)),
            file_level: LevelFilter::Debug,
            console_level: LevelFilter::Info,
        }
    }
}

/// Writes "[rfc3339] LEVEL - message" to stderr and, optionally, to a file,
/// each with its own level.
pub struct DualLogger {
    console_level: LevelFilter,
    file_level: LevelFilter,
    file: Option<Mutex<BufWriter<File>>>,
}

impl DualLogger {
    pub fn new(config: &LogConfig) -> Result<DualLogger> {
        let file = match &config.file {
            Some(p) => Some(Mutex::new(BufWriter::new(File::create(p)?))),
            None => None,
        };
        let file_level = if file.is_some() {
            config.file_level
        } else {
            LevelFilter::Off
        };
        Ok(DualLogger {
            console_level: config.console_level,
            file_level,
            file,
        })
    }

    pub fn max_level(&self) -> LevelFilter {
        self.console_level.max(self.file_level)
    }
}

impl log::Log for DualLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.max_level()
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let now: DateTime<Utc> = Utc::now();
        let line = format!(
            "[{}] {} - {}",
            now.to_rfc3339(),
            record.level(),
            record.args()
        );
        if record.level() <= self.console_level {
            eprintln!("{}", line);
        }
        if record.level() <= self.file_level {
            if let Some(Ok(mut f)) = self.file.as_ref().map(|f| f.lock()) {
                // a failed log write must not abort the plot; flushed per
                // record since the boxed logger is never dropped
                let _ = writeln!(f, "{}", line).and_then(|_| f.flush());
            }
        }
    }

    fn flush(&self) {
        if let Some(Ok(mut f)) = self.file.as_ref().map(|f| f.lock()) {
            let _ = f.flush();
        }
    }
}

/// Installs the global logger; call once, before any other operation.
pub fn init(config: &LogConfig) -> Result<()> {
    let logger = DualLogger::new(config)?;
    log::set_max_level(logger.max_level());
    log::set_boxed_logger(Box::new(logger))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use log::{Level, Log};

    #[test]
    fn test_file_gets_debug_console_level_filters() {
        let path = std::env::temp_dir().join(format!("c19_logger_{}.log", std::process::id()));
        let config = LogConfig {
            file: Some(path.clone()),
            file_level: LevelFilter::Debug,
            console_level: LevelFilter::Warn,
        };
        let logger = DualLogger::new(&config).unwrap();
        assert_eq!(logger.max_level(), LevelFilter::Debug);
        logger.log(
            &Record::builder()
                .args(format_args!("reading {}", "locations"))
                .level(Level::Debug)
                .target("c19_plot")
                .build(),
        );
        logger.log(
            &Record::builder()
                .args(format_args!("too verbose"))
                .level(Level::Trace)
                .target("c19_plot")
                .build(),
        );
        logger.flush();
        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.contains("DEBUG - reading locations"));
        assert!(!written.contains("too verbose"));
        std::fs::remove_file(path).unwrap();
    }

    #[test]
    fn test_record_reaches_file_before_exit() {
        let path = std::env::temp_dir().join(format!("c19_logger_noflush_{}.log", std::process::id()));
        let config = LogConfig {
            file: Some(path.clone()),
            file_level: LevelFilter::Debug,
            console_level: LevelFilter::Off,
        };
        let logger = DualLogger::new(&config).unwrap();
        logger.log(
            &Record::builder()
                .args(format_args!("line 7: invalid date 'bad'"))
                .level(Level::Error)
                .target("c19_plot")
                .build(),
        );
        // read back while the logger is alive and never flushed, like after an early exit
        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.contains("ERROR - line 7: invalid date 'bad'"));
        drop(logger);
        std::fs::remove_file(path).unwrap();
    }

    #[test]
    fn test_without_file_only_console_level() {
        let config = LogConfig {
            file: None,
            ..LogConfig::default()
        };
        let logger = DualLogger::new(&config).unwrap();
        assert_eq!(logger.max_level(), LevelFilter::Info);
        let debug = Metadata::builder().level(Level::Debug).build();
        assert!(!logger.enabled(&debug));
    }
}
