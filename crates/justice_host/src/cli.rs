//! Command-line interface handling for the justice host.
//!
//! Command-line options override the matching configuration file settings.

use clap::{value_parser, Arg, Command};
use std::path::PathBuf;

/// Command line arguments parsed from user input.
#[derive(Debug, Clone)]
pub struct CliArgs {
    /// Path to the configuration file
    pub config_path: PathBuf,
    /// Optional override for the ban folder
    pub ban_folder: Option<PathBuf>,
    /// Optional override for the number of reports per ban
    pub reports_per_ban: Option<u16>,
    /// Optional override for log level
    pub log_level: Option<String>,
    /// Whether to force JSON log output
    pub json_logs: bool,
}

impl CliArgs {
    /// Parses command line arguments using clap.
    pub fn parse() -> Self {
        Self::from_matches(Self::command().get_matches())
    }

    fn command() -> Command {
        Command::new("Horizon Justice Host")
            .version(env!("CARGO_PKG_VERSION"))
            .about("Console session host for the Horizon complaint and ban system")
            .arg(
                Arg::new("config")
                    .short('c')
                    .long("config")
                    .value_name("FILE")
                    .help("Configuration file path")
                    .default_value("justice.toml"),
            )
            .arg(
                Arg::new("ban-folder")
                    .short('b')
                    .long("ban-folder")
                    .value_name("DIR")
                    .help("Folder holding one file per permanent ban"),
            )
            .arg(
                Arg::new("threshold")
                    .short('t')
                    .long("threshold")
                    .value_name("COUNT")
                    .help("Distinct reporters required to ban a player")
                    .value_parser(value_parser!(u16)),
            )
            .arg(
                Arg::new("log-level")
                    .short('l')
                    .long("log-level")
                    .value_name("LEVEL")
                    .help("Log level (trace, debug, info, warn, error)"),
            )
            .arg(
                Arg::new("json-logs")
                    .long("json-logs")
                    .help("Output logs in JSON format")
                    .action(clap::ArgAction::SetTrue),
            )
    }

    fn from_matches(matches: clap::ArgMatches) -> Self {
        Self {
            config_path: matches
                .get_one::<String>("config")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("justice.toml")),
            ban_folder: matches.get_one::<String>("ban-folder").map(PathBuf::from),
            reports_per_ban: matches.get_one::<u16>("threshold").copied(),
            log_level: matches.get_one::<String>("log-level").cloned(),
            json_logs: matches.get_flag("json-logs"),
        }
    }
}
