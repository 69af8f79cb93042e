//! Justice System - automatic moderation for Horizon game sessions
//!
//! Players file complaints against each other from chat. Complaints pile up
//! per offender identity, and once enough distinct players have complained
//! the offender is banned permanently:
//! - Complaint command parsing (`/report hacking Name 'reason'`)
//! - An in-memory report ledger with one open record per offender
//! - Threshold-triggered promotion of a record into a permanent ban
//! - A ban store that survives restarts, one JSON file per ban
//! - Join-time enforcement and a "player excluded" event stream
//!
//! The hosting session supplies players, identities and chat delivery
//! through the [`Session`] and [`SessionPlayer`] traits.

pub mod config;
pub mod engine;
pub mod error;
pub mod ledger;
pub mod parser;
pub mod session;
pub mod storage;
pub mod store;
pub mod types;

pub use config::JusticeSettings;
pub use engine::{ComplaintResolution, JusticeEngine};
pub use error::{ComplaintError, JusticeError, JusticeResult, MalformedKind, StorageError, StorageResult};
pub use ledger::{ReportLedger, SubmitOutcome};
pub use parser::{parse_complaint, ParsedComplaint};
pub use session::{Session, SessionPlayer};
pub use storage::{ExclusionBackend, JsonExclusionBackend};
pub use store::ExclusionStore;
pub use types::{ComplaintRecord, ExclusionRecord, Identity, Notice, PlayerExcluded, Severity};
