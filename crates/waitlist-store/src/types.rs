//! Registrant data model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A persisted record of one successful registration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registrant {
    /// The unique handle (email-shaped, compared literally).
    pub handle: String,

    /// When the store accepted the registration.
    pub registered_at: DateTime<Utc>,

    /// Insertion sequence, used to break `registered_at` ties.
    pub sequence: u64,
}

/// Index plus insertion-ordered entries shared by the store backends.
#[derive(Debug, Clone, Default)]
pub(crate) struct Ledger {
    entries: Vec<Registrant>,
    positions: HashMap<String, usize>,
}

impl Ledger {
    /// Rebuild from persisted entries, restoring insertion order.
    ///
    /// Later duplicates of a handle are dropped, and `registered_at` is
    /// clamped so it never decreases along the restored order.
    pub(crate) fn from_entries(mut entries: Vec<Registrant>) -> Self {
        entries.sort_by_key(|r| r.sequence);

        let mut ledger = Self::default();
        for mut registrant in entries {
            if ledger.positions.contains_key(&registrant.handle) {
                continue;
            }
            if let Some(last) = ledger.entries.last() {
                registrant.registered_at = registrant.registered_at.max(last.registered_at);
            }
            ledger
                .positions
                .insert(registrant.handle.clone(), ledger.entries.len());
            ledger.entries.push(registrant);
        }
        ledger
    }

    pub(crate) fn entries(&self) -> &[Registrant] {
        &self.entries
    }

    pub(crate) fn get(&self, handle: &str) -> Option<&Registrant> {
        self.positions.get(handle).map(|&i| &self.entries[i])
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    /// Build the next registrant for `handle` without recording it.
    ///
    /// Returns `None` if the handle is already present. Timestamps never go
    /// backwards relative to the previous entry.
    pub(crate) fn prepare(&self, handle: &str, now: DateTime<Utc>) -> Option<Registrant> {
        if self.positions.contains_key(handle) {
            return None;
        }

        let (registered_at, sequence) = match self.entries.last() {
            Some(last) => (now.max(last.registered_at), last.sequence + 1),
            None => (now, 1),
        };

        Some(Registrant {
            handle: handle.to_string(),
            registered_at,
            sequence,
        })
    }

    /// Record a registrant produced by [`Ledger::prepare`].
    pub(crate) fn commit(&mut self, registrant: Registrant) {
        self.positions
            .insert(registrant.handle.clone(), self.entries.len());
        self.entries.push(registrant);
    }

    pub(crate) fn append(&mut self, handle: &str, now: DateTime<Utc>) -> Option<Registrant> {
        let registrant = self.prepare(handle, now)?;
        self.commit(registrant.clone());
        Some(registrant)
    }

    /// Up to `limit` entries, newest first.
    pub(crate) fn newest(&self, limit: usize) -> Vec<Registrant> {
        self.entries.iter().rev().take(limit).cloned().collect()
    }
}
