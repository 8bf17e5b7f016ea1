use crate::env;
use log::{Level, LevelFilter, Log, Metadata, Record};
use once_cell::sync::Lazy;
use std::fs::File;
use std::io::Write;
use std::sync::Mutex;

struct Logger {
    level: LevelFilter,
    term_level: LevelFilter,
    file_level: LevelFilter,
    log_file: Option<Mutex<File>>,
}

impl Log for Logger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if record.level() <= self.file_level
            && let Some(log_file) = &self.log_file
        {
            let mut log_file = log_file.lock().unwrap_or_else(|e| e.into_inner());
            let out = format!(
                "{now} {level} {args}",
                now = chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
                level = self.styled_level(record.level()),
                args = record.args()
            );
            let _ = writeln!(log_file, "{}", console::strip_ansi_codes(&out));
        }
        if record.level() <= self.term_level {
            let out = self.render(record, self.term_level);
            if !out.is_empty() {
                eprintln!("{out}");
            }
        }
    }

    fn flush(&self) {}
}

static LOGGER: Lazy<Logger> = Lazy::new(Logger::init);

impl Logger {
    fn init() -> Self {
        let term_level = *env::PORTWARDEN_LOG;
        let file_level = *env::PORTWARDEN_LOG_FILE_LEVEL;

        let mut logger = Logger {
            level: std::cmp::max(term_level, file_level),
            file_level,
            term_level,
            log_file: None,
        };

        let log_file = &*env::PORTWARDEN_LOG_FILE;
        if let Ok(log_file) = init_log_file(log_file) {
            logger.log_file = Some(Mutex::new(log_file));
        } else {
            // the terminal still gets output when the state dir is read-only
            logger.file_level = LevelFilter::Off;
            logger.level = term_level;
        }

        logger
    }

    fn render(&self, record: &Record, level: LevelFilter) -> String {
        match level {
            LevelFilter::Off => "".to_string(),
            LevelFilter::Trace => {
                let file = record.file().unwrap_or("<unknown>");
                let line = record
                    .line()
                    .map(|l| l.to_string())
                    .unwrap_or_else(|| "<unknown>".to_string());
                format!(
                    "{level} {file}:{line} {args}",
                    level = self.styled_level(record.level()),
                    args = record.args()
                )
            }
            _ => format!(
                "{level} {args}",
                level = self.styled_level(record.level()),
                args = record.args()
            ),
        }
    }

    fn styled_level(&self, level: Level) -> String {
        let level = match level {
            Level::Error => console::style("ERROR").red(),
            Level::Warn => console::style("WARN").yellow(),
            Level::Info => console::style("INFO").cyan(),
            Level::Debug => console::style("DEBUG").magenta(),
            Level::Trace => console::style("TRACE").dim(),
        };
        format!("{}", console::style("portwarden").dim()) + " " + &level.to_string()
    }
}

pub fn init() {
    static INIT: std::sync::Once = std::sync::Once::new();
    INIT.call_once(|| {
        if let Err(err) = log::set_logger(&*LOGGER).map(|()| log::set_max_level(LOGGER.level)) {
            eprintln!("portwarden: could not initialize logger: {err}");
        }
    });
}

fn init_log_file(log_file: &std::path::Path) -> std::io::Result<File> {
    if let Some(log_dir) = log_file.parent() {
        std::fs::create_dir_all(log_dir)?;
    }
    File::options().append(true).create(true).open(log_file)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_log_file_creates_parent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logs").join("portwarden.log");
        let file = init_log_file(&path);
        assert!(file.is_ok());
        assert!(path.exists());
    }

    #[test]
    fn test_styled_level_mentions_level() {
        let logger = Logger {
            level: LevelFilter::Info,
            term_level: LevelFilter::Info,
            file_level: LevelFilter::Off,
            log_file: None,
        };
        let styled = console::strip_ansi_codes(&logger.styled_level(Level::Warn)).to_string();
        assert_eq!(styled, "portwarden WARN");
    }
}
