use crate::shell::Shell;
use once_cell::sync::Lazy;
pub use std::env::*;
use std::path::PathBuf;
use std::time::Duration;

pub static HOME_DIR: Lazy<PathBuf> = Lazy::new(|| {
    dirs::home_dir().unwrap_or_else(|| {
        eprintln!("Warning: Could not determine home directory");
        PathBuf::from("/tmp")
    })
});
pub static PORTWARDEN_CONFIG_DIR: Lazy<PathBuf> = Lazy::new(|| {
    var_path("PORTWARDEN_CONFIG_DIR").unwrap_or(HOME_DIR.join(".config").join("portwarden"))
});
pub static PORTWARDEN_SERVERS_FILE: Lazy<PathBuf> = Lazy::new(|| {
    var_path("PORTWARDEN_SERVERS_FILE").unwrap_or(PORTWARDEN_CONFIG_DIR.join("servers.toml"))
});
pub static PORTWARDEN_STATE_DIR: Lazy<PathBuf> = Lazy::new(|| {
    var_path("PORTWARDEN_STATE_DIR").unwrap_or(
        dirs::state_dir()
            .unwrap_or(HOME_DIR.join(".local").join("state"))
            .join("portwarden"),
    )
});
pub static PORTWARDEN_LOG: Lazy<log::LevelFilter> =
    Lazy::new(|| var_log_level("PORTWARDEN_LOG").unwrap_or(log::LevelFilter::Info));
pub static PORTWARDEN_LOG_FILE_LEVEL: Lazy<log::LevelFilter> =
    Lazy::new(|| var_log_level("PORTWARDEN_LOG_FILE_LEVEL").unwrap_or(*PORTWARDEN_LOG));
pub static PORTWARDEN_LOG_FILE: Lazy<PathBuf> =
    Lazy::new(|| PORTWARDEN_STATE_DIR.join("logs").join("portwarden.log"));

// Time between signalling a port's occupants and checking the port again
pub static PORTWARDEN_SETTLE_DELAY: Lazy<Duration> = Lazy::new(|| {
    var_duration("PORTWARDEN_SETTLE_DELAY").unwrap_or(Duration::from_millis(500))
});

pub static PORTWARDEN_WEB_PORT: Lazy<u16> =
    Lazy::new(|| var_u16("PORTWARDEN_WEB_PORT").unwrap_or(3120));

pub static PORTWARDEN_SHELL: Lazy<Shell> = Lazy::new(|| {
    var("PORTWARDEN_SHELL")
        .ok()
        .and_then(|val| val.parse().ok())
        .unwrap_or_else(Shell::default_for_platform)
});

// Capture the PATH at startup so launched servers can find user tools
pub static ORIGINAL_PATH: Lazy<Option<String>> = Lazy::new(|| var("PATH").ok());

fn var_path(name: &str) -> Option<PathBuf> {
    var(name).map(PathBuf::from).ok()
}

fn var_u16(name: &str) -> Option<u16> {
    var(name).ok().and_then(|val| val.parse().ok())
}

fn var_duration(name: &str) -> Option<Duration> {
    var(name).ok().and_then(|val| parse_duration(&val))
}

fn var_log_level(name: &str) -> Option<log::LevelFilter> {
    var(name).ok().and_then(|level| level.parse().ok())
}

/// Parses "500ms", "2s" and bare millisecond counts.
pub fn parse_duration(val: &str) -> Option<Duration> {
    let val = val.trim();
    if let Ok(ms) = val.parse::<u64>() {
        return Some(Duration::from_millis(ms));
    }
    humantime::parse_duration(val).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_duration() {
        assert_eq!(parse_duration("500ms"), Some(Duration::from_millis(500)));
        assert_eq!(parse_duration("2s"), Some(Duration::from_secs(2)));
        assert_eq!(parse_duration("250"), Some(Duration::from_millis(250)));
        assert_eq!(parse_duration(" 1s "), Some(Duration::from_secs(1)));
        assert_eq!(parse_duration("soon"), None);
    }
}
