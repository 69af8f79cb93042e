//! Report ledger
//!
//! Holds every open complaint record keyed by offender identity and decides
//! when a record is promoted to a permanent ban.
//!
//! All work for one offender (duplicate check, append, threshold check and
//! removal on escalation) runs while holding that key's map entry, so two
//! reporters racing on the last missing complaint cannot both escalate.
//! Whoever is serialized second finds no record and starts a fresh one.

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tracing::debug;

use crate::types::{ComplaintRecord, ExclusionRecord, Identity};

/// Result of submitting one complaint to the ledger
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// First complaint against this offender
    Created { count: u32 },
    /// Complaint accepted, still below the threshold
    Updated { count: u32 },
    /// This reporter already complained about this offender; nothing changed
    DuplicateReporter,
    /// Threshold reached. The open record is gone and this is its frozen copy.
    Escalated(ExclusionRecord),
}

/// In-memory ledger of open complaints
#[derive(Debug, Default)]
pub struct ReportLedger {
    records: DashMap<Identity, ComplaintRecord>,
}

impl ReportLedger {
    pub fn new() -> Self {
        Self {
            records: DashMap::new(),
        }
    }

    /// Record a complaint from `reporter` against `offender`.
    ///
    /// A threshold of zero behaves like one.
    pub fn submit(
        &self,
        offender: &Identity,
        offender_name: &str,
        reporter: &Identity,
        reason: &str,
        threshold: u16,
    ) -> SubmitOutcome {
        let threshold = u32::from(threshold.max(1));

        match self.records.entry(offender.clone()) {
            Entry::Vacant(slot) => {
                let record =
                    ComplaintRecord::new(offender.clone(), offender_name, reporter.clone(), reason);
                if record.count() >= threshold {
                    debug!("Record for {} escalated on first complaint", offender);
                    return SubmitOutcome::Escalated(record.into_exclusion());
                }
                slot.insert(record);
                debug!("Opened complaint record for {} ({})", offender_name, offender);
                SubmitOutcome::Created { count: 1 }
            }
            Entry::Occupied(mut slot) => {
                if slot.get().has_reporter(reporter) {
                    debug!("Duplicate complaint from {} against {}", reporter, offender);
                    return SubmitOutcome::DuplicateReporter;
                }

                let count = slot.get_mut().push(reporter.clone(), reason);
                if count >= threshold {
                    let record = slot.remove();
                    SubmitOutcome::Escalated(record.into_exclusion())
                } else {
                    SubmitOutcome::Updated { count }
                }
            }
        }
    }

    /// Current complaint count for an offender with an open record
    pub fn count(&self, offender: &Identity) -> Option<u32> {
        self.records.get(offender).map(|record| record.count())
    }

    /// Snapshot of an open record
    pub fn get(&self, offender: &Identity) -> Option<ComplaintRecord> {
        self.records.get(offender).map(|record| record.clone())
    }

    /// Number of open records
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Barrier};
    use std::thread;

    fn id(value: &str) -> Identity {
        Identity::new(value)
    }

    #[test]
    fn test_first_complaint_creates_record() {
        let ledger = ReportLedger::new();
        let outcome = ledger.submit(&id("10.0.0.9"), "Bob", &id("10.0.0.1"), "wallhack", 3);

        assert_eq!(outcome, SubmitOutcome::Created { count: 1 });
        assert_eq!(ledger.count(&id("10.0.0.9")), Some(1));
        assert_eq!(ledger.len(), 1);
    }

    #[test]
    fn test_distinct_reporters_update_count() {
        let ledger = ReportLedger::new();
        ledger.submit(&id("10.0.0.9"), "Bob", &id("10.0.0.1"), "wallhack", 3);
        let outcome = ledger.submit(&id("10.0.0.9"), "Bob", &id("10.0.0.2"), "aimbot", 3);

        assert_eq!(outcome, SubmitOutcome::Updated { count: 2 });
        let record = ledger.get(&id("10.0.0.9")).unwrap();
        assert_eq!(record.reasons(), ["wallhack", "aimbot"]);
    }

    #[test]
    fn test_duplicate_reporter_is_rejected() {
        let ledger = ReportLedger::new();
        ledger.submit(&id("10.0.0.9"), "Bob", &id("10.0.0.1"), "wallhack", 3);
        let outcome = ledger.submit(&id("10.0.0.9"), "Bob", &id("10.0.0.1"), "again", 3);

        assert_eq!(outcome, SubmitOutcome::DuplicateReporter);
        let record = ledger.get(&id("10.0.0.9")).unwrap();
        assert_eq!(record.count(), 1);
        assert_eq!(record.reasons(), ["wallhack"]);
    }

    #[test]
    fn test_threshold_escalates_and_removes_record() {
        let ledger = ReportLedger::new();
        assert_eq!(
            ledger.submit(&id("10.0.0.9"), "Bob", &id("10.0.0.1"), "wallhack", 2),
            SubmitOutcome::Created { count: 1 }
        );

        match ledger.submit(&id("10.0.0.9"), "Bob", &id("10.0.0.2"), "aimbot", 2) {
            SubmitOutcome::Escalated(ban) => {
                assert_eq!(ban.offender_display_name, "Bob");
                assert_eq!(ban.count, 2);
                assert_eq!(ban.reasons, vec!["wallhack", "aimbot"]);
                assert_eq!(ban.reporter_identities, vec![id("10.0.0.1"), id("10.0.0.2")]);
            }
            other => panic!("expected escalation, got {other:?}"),
        }

        assert!(ledger.get(&id("10.0.0.9")).is_none());
        assert!(ledger.is_empty());
    }

    #[test]
    fn test_threshold_of_one_escalates_immediately() {
        let ledger = ReportLedger::new();
        let outcome = ledger.submit(&id("10.0.0.9"), "Bob", &id("10.0.0.1"), "wallhack", 1);
        assert!(matches!(outcome, SubmitOutcome::Escalated(ref ban) if ban.count == 1));
        assert!(ledger.is_empty());

        let outcome = ledger.submit(&id("10.0.0.8"), "Eve", &id("10.0.0.1"), "speed", 0);
        assert!(matches!(outcome, SubmitOutcome::Escalated(_)));
    }

    #[test]
    fn test_below_threshold_never_escalates() {
        let ledger = ReportLedger::new();
        for i in 1..5 {
            let reporter = id(&format!("10.0.1.{i}"));
            let outcome = ledger.submit(&id("10.0.0.9"), "Bob", &reporter, "cheating", 5);
            assert!(!matches!(outcome, SubmitOutcome::Escalated(_)));
        }
        assert_eq!(ledger.count(&id("10.0.0.9")), Some(4));
    }

    #[test]
    fn test_records_are_independent_per_offender() {
        let ledger = ReportLedger::new();
        ledger.submit(&id("10.0.0.9"), "Bob", &id("10.0.0.1"), "wallhack", 2);
        let outcome = ledger.submit(&id("10.0.0.8"), "Eve", &id("10.0.0.1"), "speed", 2);

        assert_eq!(outcome, SubmitOutcome::Created { count: 1 });
        assert_eq!(ledger.len(), 2);
    }

    #[test]
    fn test_concurrent_final_complaints_escalate_once() {
        const THRESHOLD: u16 = 4;
        const REPORTERS: usize = 32;

        for _ in 0..20 {
            let ledger = Arc::new(ReportLedger::new());
            let offender = id("10.0.0.9");
            for i in 0..(THRESHOLD - 1) {
                ledger.submit(&offender, "Bob", &id(&format!("10.0.1.{i}")), "seed", THRESHOLD);
            }

            let barrier = Arc::new(Barrier::new(REPORTERS));
            let escalations: usize = thread::scope(|scope| {
                let handles: Vec<_> = (0..REPORTERS)
                    .map(|i| {
                        let ledger = ledger.clone();
                        let barrier = barrier.clone();
                        let offender = offender.clone();
                        scope.spawn(move || {
                            barrier.wait();
                            let reporter = id(&format!("10.0.2.{i}"));
                            ledger.submit(&offender, "Bob", &reporter, "racing", THRESHOLD)
                        })
                    })
                    .collect();

                handles
                    .into_iter()
                    .map(|handle| handle.join().unwrap())
                    .filter(|outcome| matches!(outcome, SubmitOutcome::Escalated(_)))
                    .count()
            });

            // 3 seeded + 32 racers: the first racer crosses the threshold, the
            // remaining 31 restart the record and 28 of them cross it 7 more times.
            let total = usize::from(THRESHOLD - 1) + REPORTERS;
            let expected = total / usize::from(THRESHOLD);
            assert_eq!(escalations, expected);
            assert_eq!(
                ledger.count(&offender).unwrap_or(0) as usize,
                total % usize::from(THRESHOLD)
            );
        }
    }
}
