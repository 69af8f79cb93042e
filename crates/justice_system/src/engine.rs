//! The justice engine ties complaint parsing, the report ledger and the ban
//! store together and answers the two session events it cares about:
//! a complaint typed in chat and a player joining.

use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::config::JusticeSettings;
use crate::error::{ComplaintError, JusticeError, JusticeResult};
use crate::ledger::{ReportLedger, SubmitOutcome};
use crate::parser::parse_complaint;
use crate::session::{Session, SessionPlayer};
use crate::storage::{ExclusionBackend, JsonExclusionBackend};
use crate::store::ExclusionStore;
use crate::types::{ExclusionRecord, Identity, Notice, PlayerExcluded, Severity};

/// Capacity of the "player excluded" event channel
const EVENT_CHANNEL_CAPACITY: usize = 64;

const AUDIENCE_PRIVATE: &str = "(server/private)";
const AUDIENCE_WARN: &str = "(server/warn)";
const AUDIENCE_ERROR: &str = "(server/error/private)";
const AUDIENCE_COMPLAINTS: &str = "(server complaints/private)";

/// What happened to a complaint
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ComplaintResolution {
    /// The complaint never reached the ledger
    Rejected(ComplaintError),
    /// The offender was already banned; the ban was re-applied
    AlreadyExcluded(Identity),
    /// The ledger accepted the complaint and produced this outcome
    Submitted(SubmitOutcome),
}

/// Complaint handling and automatic banning for a session host
#[derive(Debug)]
pub struct JusticeEngine {
    settings: JusticeSettings,
    ledger: ReportLedger,
    exclusions: ExclusionStore,
    excluded_tx: broadcast::Sender<PlayerExcluded>,
}

impl JusticeEngine {
    /// Open the engine on the JSON ban folder named in `settings`
    pub fn open(settings: JusticeSettings) -> JusticeResult<Self> {
        settings.validate().map_err(JusticeError::Config)?;
        let backend = JsonExclusionBackend::new(&settings.ban_folder)?;
        Self::with_backend(settings, Box::new(backend))
    }

    /// Open the engine on an arbitrary ban backend. Every stored ban is
    /// loaded before this returns.
    pub fn with_backend(
        settings: JusticeSettings,
        backend: Box<dyn ExclusionBackend>,
    ) -> JusticeResult<Self> {
        settings.validate().map_err(JusticeError::Config)?;
        let exclusions = ExclusionStore::open(backend)?;
        let (excluded_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);

        info!(
            "⚖️ Justice system ready: {} reports per ban, {} bans on record",
            settings.reports_per_ban,
            exclusions.len()
        );

        Ok(Self {
            settings,
            ledger: ReportLedger::new(),
            exclusions,
            excluded_tx,
        })
    }

    pub fn settings(&self) -> &JusticeSettings {
        &self.settings
    }

    /// Receive an event for every player banned from now on
    pub fn subscribe(&self) -> broadcast::Receiver<PlayerExcluded> {
        self.excluded_tx.subscribe()
    }

    /// Handle a complaint command body such as
    /// `hacking Bob 'flying through walls'` sent by `reporter`.
    ///
    /// The reporter always gets a reply, except when the complaint bans the
    /// offender, in which case the whole session is told instead.
    pub fn handle_complaint<S: Session>(
        &self,
        body: &str,
        reporter: &S::Player,
        session: &S,
    ) -> ComplaintResolution {
        let parsed = match parse_complaint(body, &self.settings.command_keyword) {
            Ok(parsed) => parsed,
            Err(kind) => {
                debug!("Malformed complaint from {}: {}", reporter.display_name(), kind);
                session.reply(reporter, self.usage_notice());
                return ComplaintResolution::Rejected(kind.into());
            }
        };

        let mut candidates = session
            .players()
            .into_iter()
            .filter(|player| player.display_name() == parsed.offender_name);
        let Some(offender) = candidates.next() else {
            debug!("Complaint names unknown player {:?}", parsed.offender_name);
            session.reply(
                reporter,
                Notice::new("Could not find player", Severity::Warning).with_audience(AUDIENCE_WARN),
            );
            return ComplaintResolution::Rejected(ComplaintError::PlayerNotFound(parsed.offender_name.clone()));
        };
        if candidates.next().is_some() {
            debug!(
                "Several players named {:?}, complaint goes to the first one",
                parsed.offender_name
            );
        }

        let offender_id = offender.identity();
        let reporter_id = reporter.identity();

        if offender_id == reporter_id {
            session.reply(
                reporter,
                Notice::new("You cannot report yourself.", Severity::Error).with_audience(AUDIENCE_ERROR),
            );
            return ComplaintResolution::Rejected(ComplaintError::SelfReport);
        }

        if self.exclusions.is_excluded(&offender_id) {
            info!(
                "Complaint against banned player {} ({}), re-applying ban",
                offender.display_name(),
                offender_id
            );
            offender.exclude();
            session.reply(
                reporter,
                Notice::new(
                    format!("\"{}\" is already permanently banned.", offender.display_name()),
                    Severity::Information,
                )
                .with_audience(AUDIENCE_PRIVATE),
            );
            return ComplaintResolution::AlreadyExcluded(offender_id);
        }

        let outcome = self.ledger.submit(
            &offender_id,
            offender.display_name(),
            &reporter_id,
            &parsed.reason,
            self.settings.reports_per_ban,
        );

        match &outcome {
            SubmitOutcome::Created { .. } => {
                session.reply(
                    reporter,
                    Notice::new(
                        format!("A criminal record has been created for {}!", offender.display_name()),
                        Severity::Information,
                    )
                    .with_audience(AUDIENCE_COMPLAINTS),
                );
            }
            SubmitOutcome::Updated { count } => {
                session.reply(
                    reporter,
                    Notice::new(
                        format!(
                            "Your report has been filed successfully. The offender has {count} complaints now."
                        ),
                        Severity::Information,
                    )
                    .with_audience(AUDIENCE_COMPLAINTS),
                );
            }
            SubmitOutcome::DuplicateReporter => {
                session.reply(
                    reporter,
                    Notice::new(
                        "You cannot report the offender again. They will be taken care of.",
                        Severity::Error,
                    )
                    .with_audience(AUDIENCE_ERROR),
                );
            }
            SubmitOutcome::Escalated(record) => {
                self.escalate(&offender, record.clone(), session);
            }
        }

        ComplaintResolution::Submitted(outcome)
    }

    /// Handle a player joining the session. Returns `true` when the player
    /// is banned and was excluded again.
    pub fn handle_join<P: SessionPlayer>(&self, player: &P) -> bool {
        let identity = player.identity();
        if !self.exclusions.is_excluded(&identity) {
            return false;
        }

        info!("🚫 Banned player {} ({}) tried to join", player.display_name(), identity);
        player.exclude();
        true
    }

    /// Number of offenders with open, not yet escalated complaints
    pub fn open_complaints(&self) -> usize {
        self.ledger.len()
    }

    /// Open complaint count against `identity`
    pub fn complaint_count(&self, identity: &Identity) -> Option<u32> {
        self.ledger.count(identity)
    }

    pub fn exclusion_count(&self) -> usize {
        self.exclusions.len()
    }

    pub fn is_excluded(&self, identity: &Identity) -> bool {
        self.exclusions.is_excluded(identity)
    }

    pub fn exclusion(&self, identity: &Identity) -> Option<ExclusionRecord> {
        self.exclusions.get(identity).map(|record| (*record).clone())
    }

    fn escalate<S: Session>(&self, offender: &S::Player, record: ExclusionRecord, session: &S) {
        warn!(
            "🔨 Banning {} ({}) after {} complaints: {:?}",
            record.offender_display_name, record.offender_identity, record.count, record.reasons
        );

        offender.exclude();

        let event = PlayerExcluded {
            display_name: offender.display_name().to_string(),
            identity: record.offender_identity.clone(),
        };

        match self.exclusions.add(record) {
            Ok(true) | Err(_) => {}
            Ok(false) => {
                debug!("{} was banned concurrently, skipping announcement", event.identity);
                return;
            }
        }

        session.broadcast(Notice::new(
            format!("\"{}\" has been permanently banned.", event.display_name),
            Severity::Warning,
        ));

        // No subscribers is fine
        let _ = self.excluded_tx.send(event);
    }

    fn usage_notice(&self) -> Notice {
        Notice::new(
            format!(
                "Invalid format. Please use : \"{} {} Player's name 'Describe the cheat here'\"!",
                self.settings.report_command, self.settings.command_keyword
            ),
            Severity::Error,
        )
        .with_audience(AUDIENCE_PRIVATE)
    }
}
