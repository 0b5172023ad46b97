//! Append-only, hash-chained audit journal.
//!
//! Every event the controller emits lands here as an [`EventRecord`]. Each
//! record's hash commits to the one before it, so a host that ships drained
//! batches to cold storage can later prove nothing was dropped, reordered
//! or edited.

use chrono::Utc;
use timelock_types::{EventId, EventRecord, GatewayEvent, Height, Result, TimelockError};

/// Hash-chained outbox of gateway events.
#[derive(Debug, Clone, Default)]
pub struct EventJournal {
    /// Records not yet drained by the host.
    records: Vec<EventRecord>,
    /// Sequence number the next record gets.
    next_sequence: u64,
    /// Hash of the most recent record ever appended (drained or not).
    last_hash: [u8; 32],
}

impl EventJournal {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Chain `event` onto the journal.
    pub fn append(&mut self, height: Height, event: GatewayEvent) -> Result<&EventRecord> {
        let sequence = self.next_sequence;
        let prev_hash = self.last_hash;
        let hash = EventRecord::compute_hash(sequence, height, &prev_hash, &event)?;

        tracing::debug!(
            sequence,
            height = height.0,
            event = event.name(),
            hash = hex::encode(&hash[..8]),
            "Event journaled"
        );

        self.records.push(EventRecord {
            id: EventId::new(),
            sequence,
            height,
            emitted_at: Utc::now(),
            event,
            prev_hash,
            hash,
        });
        self.next_sequence += 1;
        self.last_hash = hash;

        let last = self.records.len() - 1;
        Ok(&self.records[last])
    }

    /// Records not yet drained.
    #[must_use]
    pub fn records(&self) -> &[EventRecord] {
        &self.records
    }

    /// Hand all undrained records to the caller. The chain continues from
    /// the last drained record.
    pub fn drain(&mut self) -> Vec<EventRecord> {
        std::mem::take(&mut self.records)
    }

    /// Total records ever appended.
    #[must_use]
    pub fn total_appended(&self) -> u64 {
        self.next_sequence
    }

    #[must_use]
    pub fn last_hash(&self) -> [u8; 32] {
        self.last_hash
    }

    /// Check that `records` form an unbroken chain starting at `anchor`
    /// (all zeros for a journal's very first batch).
    pub fn verify_chain(anchor: [u8; 32], records: &[EventRecord]) -> Result<()> {
        let mut expected_prev = anchor;
        let mut expected_seq = records.first().map_or(0, |r| r.sequence);

        for record in records {
            if record.sequence != expected_seq {
                return Err(TimelockError::Internal(format!(
                    "journal gap: expected sequence {expected_seq}, found {}",
                    record.sequence
                )));
            }
            if record.prev_hash != expected_prev {
                return Err(TimelockError::Internal(format!(
                    "journal chain broken at sequence {}",
                    record.sequence
                )));
            }
            if !record.is_intact() {
                return Err(TimelockError::Internal(format!(
                    "journal record {} was altered",
                    record.sequence
                )));
            }
            expected_prev = record.hash;
            expected_seq += 1;
        }
        Ok(())
    }
}
