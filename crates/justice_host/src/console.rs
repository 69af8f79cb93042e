//! Line-driven console session.
//!
//! Stands in for a live game session: players join and leave, and chat lines
//! starting with the report command are routed to the justice engine.
//!
//! ```text
//! join <address> <name>     connect a player
//! leave <name>              disconnect a player
//! say <address> <message>   chat as the player connected from <address>
//! players                   list connected players
//! bans                      show ban and open complaint totals
//! help                      show this list
//! quit                      shut down
//! ```

use justice_system::{JusticeEngine, Notice, Session, SessionPlayer, Severity};
use std::net::IpAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{error, info, warn};

pub const HELP: &str = "commands: join <address> <name> | leave <name> | say <address> <message> | players | bans | help | quit";

// ============================================================================
// Players and session
// ============================================================================

#[derive(Debug)]
struct PlayerEntry {
    name: String,
    address: IpAddr,
    connected: AtomicBool,
}

/// A player connected to the console session
#[derive(Debug, Clone)]
pub struct ConsolePlayer(Arc<PlayerEntry>);

impl ConsolePlayer {
    fn new(name: &str, address: IpAddr) -> Self {
        Self(Arc::new(PlayerEntry {
            name: name.to_string(),
            address,
            connected: AtomicBool::new(true),
        }))
    }

    pub fn address(&self) -> IpAddr {
        self.0.address
    }

    pub fn is_connected(&self) -> bool {
        self.0.connected.load(Ordering::SeqCst)
    }
}

impl SessionPlayer for ConsolePlayer {
    fn display_name(&self) -> &str {
        &self.0.name
    }

    fn identity(&self) -> justice_system::Identity {
        self.0.address.into()
    }

    fn exclude(&self) {
        if self.0.connected.swap(false, Ordering::SeqCst) {
            warn!("🚫 Kicked {} ({}) from the session", self.0.name, self.0.address);
        }
    }
}

/// In-process session whose roster is driven by console commands
#[derive(Debug, Default)]
pub struct ConsoleSession {
    roster: Mutex<Vec<ConsolePlayer>>,
}

impl ConsoleSession {
    pub fn new() -> Self {
        Self::default()
    }

    fn roster(&self) -> MutexGuard<'_, Vec<ConsolePlayer>> {
        self.roster.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Connect a new player. Returns `None` when the name is taken.
    pub fn connect(&self, name: &str, address: IpAddr) -> Option<ConsolePlayer> {
        let mut roster = self.roster();
        roster.retain(ConsolePlayer::is_connected);
        if roster.iter().any(|player| player.display_name() == name) {
            return None;
        }

        let player = ConsolePlayer::new(name, address);
        roster.push(player.clone());
        Some(player)
    }

    /// Disconnect a player by name
    pub fn disconnect(&self, name: &str) -> bool {
        let mut roster = self.roster();
        let before = roster.len();
        roster.retain(|player| player.is_connected() && player.display_name() != name);
        roster.len() < before
    }

    /// First connected player using `address`
    pub fn find_by_address(&self, address: IpAddr) -> Option<ConsolePlayer> {
        self.roster()
            .iter()
            .find(|player| player.is_connected() && player.address() == address)
            .cloned()
    }
}

impl Session for ConsoleSession {
    type Player = ConsolePlayer;

    fn players(&self) -> Vec<ConsolePlayer> {
        self.roster()
            .iter()
            .filter(|player| player.is_connected())
            .cloned()
            .collect()
    }

    fn reply(&self, target: &ConsolePlayer, notice: Notice) {
        log_notice(Some(target.display_name()), &notice);
    }

    fn broadcast(&self, notice: Notice) {
        log_notice(None, &notice);
    }
}

fn log_notice(target: Option<&str>, notice: &Notice) {
    let audience = notice.audience.as_deref().unwrap_or("(server)");
    let target = target.unwrap_or("everyone");
    match notice.severity {
        Severity::Information => info!("💬 {} -> {}: {}", audience, target, notice.message),
        Severity::Warning => warn!("💬 {} -> {}: {}", audience, target, notice.message),
        Severity::Error => error!("💬 {} -> {}: {}", audience, target, notice.message),
    }
}

// ============================================================================
// Commands
// ============================================================================

/// One parsed console line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleCommand {
    Join { address: IpAddr, name: String },
    Leave { name: String },
    Say { address: IpAddr, message: String },
    Players,
    Bans,
    Help,
    Quit,
}

impl ConsoleCommand {
    pub fn parse(line: &str) -> Result<Self, String> {
        let line = line.trim();
        let (verb, rest) = line.split_once(' ').unwrap_or((line, ""));
        let rest = rest.trim();

        match verb {
            "join" => {
                let (address, name) = split_address(rest)?;
                if name.is_empty() {
                    return Err("usage: join <address> <name>".to_string());
                }
                Ok(Self::Join {
                    address,
                    name: name.to_string(),
                })
            }
            "leave" if !rest.is_empty() => Ok(Self::Leave {
                name: rest.to_string(),
            }),
            "leave" => Err("usage: leave <name>".to_string()),
            "say" => {
                let (address, message) = split_address(rest)?;
                Ok(Self::Say {
                    address,
                    message: message.to_string(),
                })
            }
            "players" => Ok(Self::Players),
            "bans" => Ok(Self::Bans),
            "help" => Ok(Self::Help),
            "quit" | "exit" => Ok(Self::Quit),
            other => Err(format!("unknown command {other:?}; {HELP}")),
        }
    }
}

fn split_address(rest: &str) -> Result<(IpAddr, &str), String> {
    let (address, tail) = rest.split_once(' ').unwrap_or((rest, ""));
    let address = address
        .parse()
        .map_err(|_| format!("invalid address {address:?}"))?;
    Ok((address, tail.trim()))
}

/// Runs console commands against one session and one engine
pub struct Console {
    engine: Arc<JusticeEngine>,
    session: ConsoleSession,
}

impl Console {
    pub fn new(engine: Arc<JusticeEngine>) -> Self {
        Self {
            engine,
            session: ConsoleSession::new(),
        }
    }

    pub fn session(&self) -> &ConsoleSession {
        &self.session
    }

    /// Execute one line. Returns `false` once the console should stop.
    pub fn execute(&self, line: &str) -> bool {
        if line.trim().is_empty() {
            return true;
        }

        let command = match ConsoleCommand::parse(line) {
            Ok(command) => command,
            Err(e) => {
                warn!("{}", e);
                return true;
            }
        };

        match command {
            ConsoleCommand::Join { address, name } => self.join(address, &name),
            ConsoleCommand::Leave { name } => {
                if self.session.disconnect(&name) {
                    info!("👋 {} left the session", name);
                } else {
                    warn!("No connected player named {:?}", name);
                }
            }
            ConsoleCommand::Say { address, message } => self.say(address, &message),
            ConsoleCommand::Players => {
                let players = self.session.players();
                info!("👥 {} player(s) connected", players.len());
                for player in players {
                    info!("  - {} ({})", player.display_name(), player.address());
                }
            }
            ConsoleCommand::Bans => {
                info!(
                    "⚖️ {} ban(s) on record, {} open complaint record(s)",
                    self.engine.exclusion_count(),
                    self.engine.open_complaints()
                );
            }
            ConsoleCommand::Help => info!("{}", HELP),
            ConsoleCommand::Quit => return false,
        }

        true
    }

    fn join(&self, address: IpAddr, name: &str) {
        let Some(player) = self.session.connect(name, address) else {
            warn!("A player named {:?} is already connected", name);
            return;
        };

        if !self.engine.handle_join(&player) {
            info!("🎮 {} joined from {}", name, address);
        }
    }

    fn say(&self, address: IpAddr, message: &str) {
        let Some(player) = self.session.find_by_address(address) else {
            warn!("No connected player at {}", address);
            return;
        };

        let report_command = &self.engine.settings().report_command;
        match message
            .strip_prefix(report_command.as_str())
            .and_then(|rest| rest.strip_prefix(' '))
        {
            Some(body) => {
                self.engine.handle_complaint(body, &player, &self.session);
            }
            None => info!("💬 {}: {}", player.display_name(), message),
        }
    }
}
