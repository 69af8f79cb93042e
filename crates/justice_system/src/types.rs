//! Core data types shared by the ledger, the exclusion store and the engine.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::IpAddr;

// ============================================================================
// Identity
// ============================================================================

/// Stable, opaque identity of a connected player.
///
/// The session host supplies this; in practice it is the remote address of
/// the player's connection. The justice system only compares and copies it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Identity(String);

impl Identity {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<IpAddr> for Identity {
    fn from(addr: IpAddr) -> Self {
        Self(addr.to_string())
    }
}

impl From<&str> for Identity {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for Identity {
    fn from(value: String) -> Self {
        Self(value)
    }
}

// ============================================================================
// Records
// ============================================================================

/// An open, not yet escalated set of complaints against one offender.
///
/// Lives only in memory. `count()` is always the number of distinct
/// reporters, and there is exactly one reason per reporter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComplaintRecord {
    offender_identity: Identity,
    offender_display_name: String,
    reasons: Vec<String>,
    reporter_identities: Vec<Identity>,
}

impl ComplaintRecord {
    /// Start a record with its first complaint
    pub fn new(
        offender_identity: Identity,
        offender_display_name: impl Into<String>,
        reporter: Identity,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            offender_identity,
            offender_display_name: offender_display_name.into(),
            reasons: vec![reason.into()],
            reporter_identities: vec![reporter],
        }
    }

    pub fn offender_identity(&self) -> &Identity {
        &self.offender_identity
    }

    pub fn offender_display_name(&self) -> &str {
        &self.offender_display_name
    }

    pub fn reasons(&self) -> &[String] {
        &self.reasons
    }

    pub fn reporter_identities(&self) -> &[Identity] {
        &self.reporter_identities
    }

    pub fn count(&self) -> u32 {
        self.reporter_identities.len() as u32
    }

    pub fn has_reporter(&self, reporter: &Identity) -> bool {
        self.reporter_identities.contains(reporter)
    }

    /// Accept a complaint from a new reporter and return the new count.
    ///
    /// Callers check `has_reporter` first; the record does not deduplicate.
    pub(crate) fn push(&mut self, reporter: Identity, reason: impl Into<String>) -> u32 {
        self.reporter_identities.push(reporter);
        self.reasons.push(reason.into());
        self.count()
    }

    /// Freeze this record into a permanent exclusion
    pub fn into_exclusion(self) -> ExclusionRecord {
        let count = self.count();
        ExclusionRecord {
            offender_display_name: self.offender_display_name,
            offender_identity: self.offender_identity,
            count,
            reasons: self.reasons,
            reporter_identities: self.reporter_identities,
        }
    }
}

/// A permanent ban. Written once at escalation time and never mutated.
///
/// This is the on-disk shape as well, one JSON file per record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExclusionRecord {
    pub offender_display_name: String,
    pub offender_identity: Identity,
    pub count: u32,
    pub reasons: Vec<String>,
    pub reporter_identities: Vec<Identity>,
}

// ============================================================================
// Notifications
// ============================================================================

/// Severity of a chat notice sent back into the session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Severity {
    Information,
    Warning,
    Error,
}

/// A chat message produced by the justice system for the session to deliver
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub message: String,
    pub severity: Severity,
    /// Display tag shown as the sender, e.g. `(server/private)`
    pub audience: Option<String>,
}

impl Notice {
    pub fn new(message: impl Into<String>, severity: Severity) -> Self {
        Self {
            message: message.into(),
            severity,
            audience: None,
        }
    }

    pub fn with_audience(mut self, audience: impl Into<String>) -> Self {
        self.audience = Some(audience.into());
        self
    }
}

/// Published to subscribers whenever a player is permanently banned
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerExcluded {
    pub display_name: String,
    pub identity: Identity,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_complaint_record_counts_reporters() {
        let mut record = ComplaintRecord::new("10.0.0.5".into(), "Bob", "10.0.0.1".into(), "wallhack");
        assert_eq!(record.count(), 1);
        assert!(record.has_reporter(&"10.0.0.1".into()));
        assert!(!record.has_reporter(&"10.0.0.2".into()));

        assert_eq!(record.push("10.0.0.2".into(), "aimbot"), 2);
        assert_eq!(record.reasons(), ["wallhack", "aimbot"]);
        assert_eq!(record.count() as usize, record.reporter_identities().len());
    }

    #[test]
    fn test_into_exclusion_freezes_fields() {
        let mut record = ComplaintRecord::new("10.0.0.5".into(), "Bob", "10.0.0.1".into(), "wallhack");
        record.push("10.0.0.2".into(), "aimbot");

        let ban = record.into_exclusion();
        assert_eq!(ban.offender_display_name, "Bob");
        assert_eq!(ban.offender_identity.as_str(), "10.0.0.5");
        assert_eq!(ban.count, 2);
        assert_eq!(ban.reasons, vec!["wallhack", "aimbot"]);
        assert_eq!(ban.reporter_identities.len(), 2);
    }

    #[test]
    fn test_exclusion_record_field_names() {
        let ban = ComplaintRecord::new("::1".into(), "Eve", "10.0.0.1".into(), "speed").into_exclusion();
        let json: serde_json::Value = serde_json::to_value(&ban).unwrap();

        assert_eq!(json["offenderDisplayName"], "Eve");
        assert_eq!(json["offenderIdentity"], "::1");
        assert_eq!(json["count"], 1);
        assert_eq!(json["reasons"][0], "speed");
        assert_eq!(json["reporterIdentities"][0], "10.0.0.1");

        let back: ExclusionRecord = serde_json::from_value(json).unwrap();
        assert_eq!(back, ban);
    }

    #[test]
    fn test_identity_from_ip() {
        let addr: IpAddr = "192.168.1.20".parse().unwrap();
        assert_eq!(Identity::from(addr).as_str(), "192.168.1.20");
    }
}
