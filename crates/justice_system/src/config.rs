//! Justice system settings, usually read from the `[justice]` table of the
//! host configuration file.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::parser::QUOTE;

fn default_reports_per_ban() -> u16 {
    3
}

fn default_ban_folder() -> PathBuf {
    PathBuf::from("bans")
}

fn default_command_keyword() -> String {
    "hacking".to_string()
}

fn default_report_command() -> String {
    "/report".to_string()
}

/// Configuration for complaint handling and ban escalation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JusticeSettings {
    /// Distinct reporters required before a player is banned
    #[serde(default = "default_reports_per_ban")]
    pub reports_per_ban: u16,
    /// Folder holding one file per permanent ban
    #[serde(default = "default_ban_folder")]
    pub ban_folder: PathBuf,
    /// Keyword every complaint body starts with
    #[serde(default = "default_command_keyword")]
    pub command_keyword: String,
    /// Chat command the host routes to the complaint handler
    #[serde(default = "default_report_command")]
    pub report_command: String,
}

impl Default for JusticeSettings {
    fn default() -> Self {
        Self {
            reports_per_ban: default_reports_per_ban(),
            ban_folder: default_ban_folder(),
            command_keyword: default_command_keyword(),
            report_command: default_report_command(),
        }
    }
}

impl JusticeSettings {
    /// Validates the settings for consistency and correctness.
    pub fn validate(&self) -> Result<(), String> {
        if self.reports_per_ban == 0 {
            return Err("reports_per_ban must be at least 1".to_string());
        }

        if self.ban_folder.as_os_str().is_empty() {
            return Err("Ban folder cannot be empty".to_string());
        }

        if self.command_keyword.is_empty() {
            return Err("Command keyword cannot be empty".to_string());
        }
        if self
            .command_keyword
            .chars()
            .any(|c| c.is_whitespace() || c == QUOTE)
        {
            return Err(format!(
                "Command keyword must not contain whitespace or {QUOTE}: {:?}",
                self.command_keyword
            ));
        }

        if self.report_command.trim().is_empty() {
            return Err("Report command cannot be empty".to_string());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = JusticeSettings::default();
        assert_eq!(settings.reports_per_ban, 3);
        assert_eq!(settings.ban_folder, PathBuf::from("bans"));
        assert_eq!(settings.command_keyword, "hacking");
        assert_eq!(settings.report_command, "/report");
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_zero_threshold_rejected() {
        let settings = JusticeSettings {
            reports_per_ban: 0,
            ..Default::default()
        };
        assert!(settings.validate().unwrap_err().contains("reports_per_ban"));
    }

    #[test]
    fn test_bad_keywords_rejected() {
        for keyword in ["", "two words", "it's"] {
            let settings = JusticeSettings {
                command_keyword: keyword.to_string(),
                ..Default::default()
            };
            assert!(settings.validate().is_err(), "keyword {keyword:?} should be rejected");
        }
    }

    #[test]
    fn test_empty_ban_folder_rejected() {
        let settings = JusticeSettings {
            ban_folder: PathBuf::new(),
            ..Default::default()
        };
        assert!(settings.validate().is_err());
    }
}
