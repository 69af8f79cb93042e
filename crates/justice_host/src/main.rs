//! Horizon justice host
//!
//! Loads the configuration, opens the ban folder and runs a console session
//! whose chat and join events are handled by the justice engine.

mod cli;
mod config;
mod console;
mod logging;
mod signals;

use justice_system::{JusticeEngine, Session};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast::error::RecvError;
use tracing::{error, info, warn};

use crate::cli::CliArgs;
use crate::config::AppConfig;
use crate::console::{Console, HELP};

/// Main application struct
pub struct Application {
    config: AppConfig,
    engine: Arc<JusticeEngine>,
}

impl Application {
    /// Load configuration, start logging and open the ban store
    pub async fn new(args: CliArgs) -> Result<Self, Box<dyn std::error::Error>> {
        // Load configuration first (before logging setup)
        let mut config = AppConfig::load_from_file(&args.config_path).await?;
        config.apply_overrides(&args);

        if let Err(e) = config.validate() {
            return Err(format!("Configuration validation failed: {}", e).into());
        }

        logging::setup_logging(&config.logging)?;
        display_banner();

        info!(
            "📂 Config: {} | Ban folder: {}",
            args.config_path.display(),
            config.ban_folder().display()
        );

        // Reading every ban file is blocking I/O
        let settings = config.justice.clone();
        let engine = tokio::task::spawn_blocking(move || JusticeEngine::open(settings)).await??;

        Ok(Self {
            config,
            engine: Arc::new(engine),
        })
    }

    /// Run the console session until input ends, `quit` or a signal
    pub async fn run(self) -> Result<(), Box<dyn std::error::Error>> {
        info!("📋 Configuration Summary:");
        info!("  ⚖️ Reports per ban: {}", self.config.justice.reports_per_ban);
        info!(
            "  💬 Complaint syntax: {} {} <player> '<reason>'",
            self.config.justice.report_command, self.config.justice.command_keyword
        );

        // Announce every ban to the operator
        let announcer = {
            let mut excluded = self.engine.subscribe();
            tokio::spawn(async move {
                loop {
                    match excluded.recv().await {
                        Ok(event) => {
                            info!("📣 Player excluded: {} ({})", event.display_name, event.identity)
                        }
                        Err(RecvError::Lagged(missed)) => {
                            warn!("Ban announcer fell behind, {} events dropped", missed)
                        }
                        Err(RecvError::Closed) => break,
                    }
                }
            })
        };

        let console = Console::new(self.engine.clone());
        let mut lines = BufReader::new(tokio::io::stdin()).lines();

        let shutdown = signals::wait_for_shutdown();
        tokio::pin!(shutdown);

        info!("✅ Justice host is now running!");
        info!("{}", HELP);

        loop {
            tokio::select! {
                result = &mut shutdown => {
                    result?;
                    info!("🛑 Shutdown signal received");
                    break;
                }
                line = lines.next_line() => {
                    match line? {
                        Some(line) => {
                            if !console.execute(&line) {
                                break;
                            }
                        }
                        None => {
                            info!("Console input closed");
                            break;
                        }
                    }
                }
            }
        }

        announcer.abort();

        info!("📊 Final Statistics:");
        info!("  - Players still connected: {}", console.session().players().len());
        info!("  - Bans on record: {}", self.engine.exclusion_count());
        info!("  - Open complaint records dropped: {}", self.engine.open_complaints());
        info!("✅ Justice host shutdown complete");

        Ok(())
    }
}

#[tokio::main(flavor = "multi_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliArgs::parse();

    match Application::new(args).await {
        Ok(app) => {
            if let Err(e) = app.run().await {
                error!("❌ Application error: {:?}", e);
                std::process::exit(1);
            }
        }
        Err(e) => {
            eprintln!("❌ Failed to start application: {:?}", e);
            std::process::exit(1);
        }
    }

    Ok(())
}

/// Display startup banner using proper logging
fn display_banner() {
    let version = option_env!("CARGO_PKG_VERSION").unwrap_or("UNK");
    info!("╔══════════════════════════════════════════╗");
    info!("║         ⚖️  HORIZON JUSTICE HOST          ║");
    info!("║                 v{:<8}                ║", version);
    info!("║                                          ║");
    info!("║  Player complaints and automatic bans    ║");
    info!("╚══════════════════════════════════════════╝");
}
