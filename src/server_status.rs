use serde::{Deserialize, Serialize};

/// A server's state as observed from the OS, recomputed on every query.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display, strum::EnumIs,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ServerStatus {
    Unconfigured,
    Running,
    Stopped,
    Unknown,
}

impl ServerStatus {
    pub fn style(&self) -> String {
        let s = self.to_string();
        match self {
            ServerStatus::Unconfigured => console::style(s).dim().to_string(),
            ServerStatus::Running => console::style(s).green().to_string(),
            ServerStatus::Stopped => console::style(s).yellow().to_string(),
            ServerStatus::Unknown => console::style(s).red().to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_status_serializes_snake_case() {
        assert_eq!(
            serde_json::to_string(&ServerStatus::Unconfigured).unwrap(),
            "\"unconfigured\""
        );
        assert_eq!(ServerStatus::Running.to_string(), "running");
        let status: ServerStatus = serde_json::from_str("\"unknown\"").unwrap();
        assert!(status.is_unknown());
    }
}
