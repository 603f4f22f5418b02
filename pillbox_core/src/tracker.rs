//! The `Pillbox` orchestrator.
//!
//! Owns the catalog, the working session and the history ledger, and is the
//! only thing that mutates them. Every successful mutation of a persisted
//! collection is followed by a save through the injected `StateStore`.

use crate::collaborators::{
    Announcer, Clock, ConfirmPrompt, Confirmation, LogNotifier, NoticeKind, Notifier,
    AlwaysDecline, SilentAnnouncer, SystemClock,
};
use crate::email::{EmailScope, EmailSender};
use crate::{
    Dose, DoseSessionBuilder, Error, HistoryLedger, Pill, PillCatalog, PillboxState, Result,
    SessionRecord, StateStore,
};
use chrono::{DateTime, Duration, Utc};
use std::path::Path;

/// External collaborators the orchestrator reports to
pub struct Collaborators {
    pub prompt: Box<dyn ConfirmPrompt>,
    pub announcer: Box<dyn Announcer>,
    pub notifier: Box<dyn Notifier>,
    pub clock: Box<dyn Clock>,
}

impl Default for Collaborators {
    fn default() -> Self {
        Self {
            prompt: Box::new(AlwaysDecline),
            announcer: Box::new(SilentAnnouncer),
            notifier: Box::new(LogNotifier),
            clock: Box::new(SystemClock),
        }
    }
}

/// State store plus every in-memory collection of the tracker
pub struct Pillbox<S: StateStore> {
    store: S,
    catalog: PillCatalog,
    session: DoseSessionBuilder,
    ledger: HistoryLedger,
    play_sounds: bool,
    collaborators: Collaborators,
}

impl<S: StateStore> Pillbox<S> {
    /// Load persisted state from `store` and take ownership of it
    pub fn open(store: S, collaborators: Collaborators) -> Result<Self> {
        let state = store.load()?;
        tracing::info!(
            "Opened pillbox: {} pills, {} trashed, {} history records",
            state.pills.len(),
            state.pill_trash.len(),
            state.history.len()
        );

        Ok(Self {
            store,
            catalog: PillCatalog::from_parts(state.pills, state.pill_trash),
            session: DoseSessionBuilder::new(),
            ledger: HistoryLedger::from_parts(
                state.history,
                state.history_trash,
                state.history_is_reverse,
            ),
            play_sounds: state.play_sounds,
            collaborators,
        })
    }

    pub fn catalog(&self) -> &PillCatalog {
        &self.catalog
    }

    pub fn ledger(&self) -> &HistoryLedger {
        &self.ledger
    }

    pub fn session(&self) -> &[Dose] {
        self.session.doses()
    }

    pub fn play_sounds(&self) -> bool {
        self.play_sounds
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Copy of everything that gets persisted
    pub fn snapshot(&self) -> PillboxState {
        PillboxState {
            pills: self.catalog.pills().to_vec(),
            pill_trash: self.catalog.trash().to_vec(),
            history: self.ledger.records().to_vec(),
            history_trash: self.ledger.trash().to_vec(),
            history_is_reverse: self.ledger.is_reverse_order(),
            play_sounds: self.play_sounds,
        }
    }

    fn persist(&mut self) -> Result<()> {
        let state = self.snapshot();
        self.store.save(&state)
    }

    fn now(&self) -> DateTime<Utc> {
        self.collaborators.clock.now()
    }

    fn notify(&mut self, kind: NoticeKind, title: &str, body: &str) {
        self.collaborators.notifier.notify(kind, title, body);
    }

    fn confirm(&mut self, request: Confirmation) -> bool {
        self.collaborators.prompt.confirm(&request)
    }

    // ========================================================================
    // Catalog commands
    // ========================================================================

    /// Add a pill to the catalog
    ///
    /// Duplicates are rejected with an error notice and leave the catalog
    /// untouched.
    pub fn add_pill(&mut self, name: &str, dosage: f64, unit: &str) -> Result<Pill> {
        let before = self.catalog.len();
        let pill = match self.catalog.add(name, dosage, unit) {
            Ok(pill) => pill,
            Err(e @ Error::DuplicatePill { .. }) => {
                self.notify(
                    NoticeKind::Error,
                    "You already have a pill with that Name, Dosage, and Unit",
                    "",
                );
                return Err(e);
            }
            Err(e) => return Err(e),
        };
        self.persist()?;

        if self.play_sounds {
            self.collaborators
                .announcer
                .announce_pills(std::slice::from_ref(&pill));
        }

        if self.catalog.len() != before + 1 {
            self.notify(NoticeKind::Error, "Error adding Pill", "");
            return Err(Error::IntegrityMismatch(format!(
                "catalog has {} pills after adding to {}",
                self.catalog.len(),
                before
            )));
        }

        self.notify(NoticeKind::Success, "Pill Added!", &pill.short_label());
        tracing::info!("Added pill {}", pill.label());
        Ok(pill)
    }

    /// Move the catalog pill at `index` into the trash
    pub fn delete_pill(&mut self, index: usize) -> Result<Pill> {
        let pill = self.catalog.delete(index)?;
        self.persist()?;
        Ok(pill)
    }

    /// Move the trashed pill at `index` back into the catalog
    pub fn restore_pill(&mut self, index: usize) -> Result<Pill> {
        let pill = self.catalog.restore(index)?;
        self.persist()?;
        Ok(pill)
    }

    /// Empty the pill trash after confirmation; `false` if declined
    pub fn empty_trash(&mut self) -> Result<bool> {
        if !self.confirm(Confirmation::empty_trash()) {
            return Ok(false);
        }
        self.catalog.empty_trash();
        self.persist()?;
        Ok(true)
    }

    // ========================================================================
    // Session commands
    // ========================================================================

    /// Add `quantity` of the catalog pill at `pill_index` to the working session
    pub fn add_dose(&mut self, pill_index: usize, quantity: u32) -> Result<&[Dose]> {
        let pill = self.catalog.get(pill_index)?.clone();
        Ok(self.session.add_dose(pill, quantity))
    }

    /// Remove the working-session entry at `index`
    pub fn remove_dose(&mut self, index: usize) -> Result<&[Dose]> {
        self.session.remove_dose(index)
    }

    /// Drop the working session without recording anything
    pub fn discard_session(&mut self) {
        self.session.discard();
    }

    /// Commit the working session to history
    ///
    /// Returns `None` when the session was empty and the user declined to
    /// record a note-only entry.
    pub fn take_session(
        &mut self,
        note: &str,
        user_date: Option<DateTime<Utc>>,
    ) -> Result<Option<SessionRecord>> {
        let now = self.now();
        let prompt = self.collaborators.prompt.as_mut();
        let Some(record) = self.session.commit(note, user_date, now, prompt) else {
            return Ok(None);
        };

        let before = self.ledger.len();
        self.ledger.append(record.clone());
        if let Err(e) = self.persist() {
            // Unsaved: undo the append and hand the doses back to the builder
            self.ledger.retract(record.id);
            self.session.reinstate(record.session);
            tracing::warn!("Failed to save session, kept it open: {}", e);
            return Err(e);
        }

        if self.ledger.len() != before + 1 {
            self.notify(NoticeKind::Error, "Pill Taken Error", "");
            return Err(Error::IntegrityMismatch(format!(
                "history has {} records after committing to {}",
                self.ledger.len(),
                before
            )));
        }

        if self.play_sounds {
            self.collaborators.announcer.announce_doses(&record.session);
        }
        let body = record
            .session
            .iter()
            .map(Dose::summary)
            .collect::<Vec<_>>()
            .join("\n");
        self.notify(NoticeKind::Success, "Pills Taken!", &body);

        tracing::info!(
            "Committed session {} with {} doses",
            record.id,
            record.session.len()
        );
        Ok(Some(record))
    }

    // ========================================================================
    // History commands
    // ========================================================================

    /// History view, optionally restricted to the catalog pill at `filter`
    pub fn history(
        &self,
        filter: Option<usize>,
    ) -> Result<impl Iterator<Item = &SessionRecord> + '_> {
        let pill = filter.map(|index| self.catalog.get(index)).transpose()?;
        Ok(self.ledger.filter(pill))
    }

    pub fn set_reverse_order(&mut self, reverse_order: bool) -> Result<()> {
        self.ledger.reorder(reverse_order);
        self.persist()
    }

    /// Flip the history order, returning the new flag
    pub fn toggle_reverse_order(&mut self) -> Result<bool> {
        let reverse_order = !self.ledger.is_reverse_order();
        self.set_reverse_order(reverse_order)?;
        Ok(reverse_order)
    }

    pub fn set_play_sounds(&mut self, play_sounds: bool) -> Result<()> {
        self.play_sounds = play_sounds;
        self.persist()
    }

    /// Archive the whole history after confirmation; `false` if declined
    pub fn clear_history(&mut self) -> Result<bool> {
        if !self.confirm(Confirmation::clear_history()) {
            return Ok(false);
        }
        let count = self.ledger.clear();
        self.persist()?;
        tracing::info!("Cleared {} history records", count);
        Ok(true)
    }

    /// Ledger indices selected by `scope`
    pub fn email_selection(&self, scope: EmailScope) -> Result<Vec<usize>> {
        let indices = match scope {
            EmailScope::All => (0..self.ledger.len()).collect(),
            EmailScope::Recent { days } => {
                let cutoff = Duration::try_days(days)
                    .and_then(|span| self.now().checked_sub_signed(span))
                    .ok_or_else(|| {
                        Error::Config(format!("recent window of {} days is out of range", days))
                    })?;
                self.ledger.indices_since(cutoff)
            }
            EmailScope::Filtered { pill_index } => {
                let pill = self.catalog.get(pill_index)?;
                self.ledger.matching_indices(pill)
            }
        };
        Ok(indices)
    }

    /// Send the records selected by `scope` and mark them as emailed
    ///
    /// Returns how many records were sent. Nothing is marked if the sender fails.
    pub fn email_history(
        &mut self,
        recipient: &str,
        scope: EmailScope,
        sender: &mut dyn EmailSender,
    ) -> Result<usize> {
        let indices = self.email_selection(scope)?;
        if indices.is_empty() {
            return Err(Error::NothingToSend);
        }

        let records: Vec<SessionRecord> = indices
            .iter()
            .map(|&index| self.ledger.records()[index].clone())
            .collect();

        if let Err(e) = sender.send(recipient, &records) {
            tracing::warn!("Failed to email history to {}: {}", recipient, e);
            self.notify(NoticeKind::Error, "Email Failed", &e.to_string());
            return Err(Error::EmailFailed(e.to_string()));
        }

        let now = self.now();
        self.ledger.mark_sent(&indices, now)?;
        self.persist()?;
        self.notify(
            NoticeKind::Success,
            "Email Sent!",
            &format!("{} entries sent to {}", records.len(), recipient),
        );
        Ok(records.len())
    }

    /// Write the current history to a CSV file
    pub fn export_history(&self, path: &Path) -> Result<usize> {
        crate::export::export_history_csv(self.ledger.records(), path)
    }
}
