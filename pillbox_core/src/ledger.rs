//! The history ledger of committed sessions.
//!
//! New records go to the front (newest first) or the back (oldest first)
//! depending on the reverse-order flag. That placement only holds for live
//! commits, so `reorder` always does a full re-sort by creation instant.

use crate::ordering::sort_records_by_date;
use crate::{Error, Pill, Result, SessionRecord};
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Append-only, reorderable record of committed sessions
#[derive(Clone, Debug, Default, PartialEq)]
pub struct HistoryLedger {
    history: Vec<SessionRecord>,
    /// Cleared snapshots, oldest first. Kept but never restorable.
    trash: Vec<Vec<SessionRecord>>,
    reverse_order: bool,
}

impl HistoryLedger {
    pub fn new(reverse_order: bool) -> Self {
        Self {
            reverse_order,
            ..Self::default()
        }
    }

    /// Rebuild a ledger from persisted parts, re-sorting for the stored flag
    pub fn from_parts(
        history: Vec<SessionRecord>,
        trash: Vec<Vec<SessionRecord>>,
        reverse_order: bool,
    ) -> Self {
        let mut ledger = Self {
            history,
            trash,
            reverse_order,
        };
        ledger.reorder(reverse_order);
        ledger
    }

    pub fn records(&self) -> &[SessionRecord] {
        &self.history
    }

    pub fn trash(&self) -> &[Vec<SessionRecord>] {
        &self.trash
    }

    pub fn len(&self) -> usize {
        self.history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }

    pub fn is_reverse_order(&self) -> bool {
        self.reverse_order
    }

    /// File a freshly committed record according to the current order
    pub fn append(&mut self, record: SessionRecord) {
        tracing::debug!("Appending session {} to history", record.id);
        if self.reverse_order {
            self.history.push(record);
        } else {
            self.history.insert(0, record);
        }
    }

    /// Take back a record filed by `append`
    pub(crate) fn retract(&mut self, id: Uuid) -> Option<SessionRecord> {
        let position = self.history.iter().position(|record| record.id == id)?;
        tracing::debug!("Retracting session {} from history", id);
        Some(self.history.remove(position))
    }

    /// Set the order flag and fully re-sort by creation instant
    pub fn reorder(&mut self, reverse_order: bool) {
        self.reverse_order = reverse_order;
        sort_records_by_date(&mut self.history, reverse_order);
        tracing::debug!(
            "Sorted {} history records ({})",
            self.history.len(),
            if reverse_order { "oldest first" } else { "newest first" }
        );
    }

    /// Records containing a dose of `pill`, or every record when `pill` is `None`
    pub fn filter<'a>(
        &'a self,
        pill: Option<&'a Pill>,
    ) -> impl Iterator<Item = &'a SessionRecord> + 'a {
        self.history
            .iter()
            .filter(move |record| pill.map_or(true, |pill| record.contains_pill(pill)))
    }

    /// Ledger positions of the records `filter(Some(pill))` would yield
    pub fn matching_indices(&self, pill: &Pill) -> Vec<usize> {
        self.history
            .iter()
            .enumerate()
            .filter(|(_, record)| record.contains_pill(pill))
            .map(|(index, _)| index)
            .collect()
    }

    /// Ledger positions of records created strictly after `cutoff`
    pub fn indices_since(&self, cutoff: DateTime<Utc>) -> Vec<usize> {
        self.history
            .iter()
            .enumerate()
            .filter(|(_, record)| record.date > cutoff)
            .map(|(index, _)| index)
            .collect()
    }

    /// Move the whole history into the trash as one snapshot
    pub fn clear(&mut self) -> usize {
        let snapshot = std::mem::take(&mut self.history);
        let count = snapshot.len();
        self.trash.push(snapshot);
        tracing::debug!("Cleared {} history records into trash", count);
        count
    }

    /// Stamp `date_emailed` on each listed record
    ///
    /// All indices are checked before anything is stamped.
    pub fn mark_sent(&mut self, indices: &[usize], now: DateTime<Utc>) -> Result<()> {
        let len = self.history.len();
        if let Some(&bad) = indices.iter().find(|&&index| index >= len) {
            return Err(Error::out_of_range("history", bad, len));
        }

        for &index in indices {
            self.history[index].date_emailed = Some(now);
        }
        tracing::debug!("Marked {} history records as emailed", indices.len());
        Ok(())
    }
}
