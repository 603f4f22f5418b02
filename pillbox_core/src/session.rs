//! Building a dose session before it is committed to history.
//!
//! Every added dose triggers a normalization pass that merges repeated doses
//! of the same pill and orders the session by case-insensitive pill name.

use crate::collaborators::{ConfirmPrompt, Confirmation};
use crate::ordering::compare_names;
use crate::{Dose, Error, Pill, Result, SessionRecord};
use chrono::{DateTime, Utc};

/// Merge repeated doses and order the result by pill name
///
/// Doses are grouped by exact name. Within a group, doses whose dosage and
/// unit both match are merged by summing quantities; anything else stays a
/// separate entry in first-seen order. Groups are emitted in case-insensitive
/// name order, ties keeping first-seen order. Units are never rewritten.
pub fn normalize_session(doses: &[Dose]) -> Vec<Dose> {
    let mut groups: Vec<(&str, Vec<Dose>)> = Vec::new();

    for dose in doses {
        match groups.iter_mut().find(|(name, _)| *name == dose.pill.name) {
            Some((_, group)) => {
                let existing = group.iter_mut().find(|entry| {
                    entry.pill.dosage == dose.pill.dosage && entry.pill.unit == dose.pill.unit
                });
                match existing {
                    Some(entry) => entry.quantity = entry.quantity.saturating_add(dose.quantity),
                    None => group.push(dose.clone()),
                }
            }
            None => groups.push((dose.pill.name.as_str(), vec![dose.clone()])),
        }
    }

    groups.sort_by(|a, b| compare_names(a.0, b.0));
    groups.into_iter().flat_map(|(_, group)| group).collect()
}

/// Accumulates the doses of one in-progress session
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DoseSessionBuilder {
    doses: Vec<Dose>,
}

impl DoseSessionBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn doses(&self) -> &[Dose] {
        &self.doses
    }

    pub fn is_empty(&self) -> bool {
        self.doses.is_empty()
    }

    /// Append a dose and renormalize the whole session
    pub fn add_dose(&mut self, pill: Pill, quantity: u32) -> &[Dose] {
        self.doses.push(Dose::new(pill, quantity));
        self.doses = normalize_session(&self.doses);
        &self.doses
    }

    /// Remove the displayed entry at `index` without renormalizing
    pub fn remove_dose(&mut self, index: usize) -> Result<&[Dose]> {
        if index >= self.doses.len() {
            return Err(Error::out_of_range("session", index, self.doses.len()));
        }
        self.doses.remove(index);
        Ok(&self.doses)
    }

    /// Drop the working session without committing it
    pub fn discard(&mut self) {
        self.doses.clear();
    }

    /// Put back the doses of a record whose commit could not be saved
    pub(crate) fn reinstate(&mut self, doses: Vec<Dose>) {
        self.doses = doses;
    }

    /// Turn the working session into a record stamped with `now`
    ///
    /// An empty session asks `prompt` whether to record a note-only entry and
    /// returns `None` if the user declines, leaving the builder untouched. On
    /// success the builder is reset for the next session.
    pub fn commit(
        &mut self,
        note: impl Into<String>,
        user_date: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
        prompt: &mut dyn ConfirmPrompt,
    ) -> Option<SessionRecord> {
        if self.doses.is_empty() && !prompt.confirm(&Confirmation::note_only_session()) {
            tracing::debug!("Note-only session declined");
            return None;
        }

        let doses = std::mem::take(&mut self.doses);
        Some(SessionRecord::new(doses, note, user_date, now))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collaborators::{AlwaysAccept, AlwaysDecline};

    fn pill(name: &str, dosage: f64) -> Pill {
        Pill::new(name, dosage, "mg")
    }

    #[test]
    fn test_reinstate_after_commit() {
        let mut builder = DoseSessionBuilder::new();
        builder.add_dose(pill("A", 10.0), 2);
        let record = builder
            .commit("", None, Utc::now(), &mut AlwaysAccept)
            .unwrap();
        assert!(builder.is_empty());

        builder.reinstate(record.session);
        assert_eq!(builder.doses(), &[Dose::new(pill("A", 10.0), 2)]);
    }

    #[test]
    fn test_repeated_pill_merges_and_sorts() {
        let mut builder = DoseSessionBuilder::new();
        builder.add_dose(pill("A", 10.0), 1);
        builder.add_dose(pill("B", 5.0), 1);
        let session = builder.add_dose(pill("A", 10.0), 1);

        assert_eq!(
            session,
            &[Dose::new(pill("A", 10.0), 2), Dose::new(pill("B", 5.0), 1)]
        );
    }

    #[test]
    fn test_different_dosage_not_merged() {
        let doses = normalize_session(&[
            Dose::new(pill("A", 10.0), 1),
            Dose::new(pill("A", 20.0), 1),
        ]);
        assert_eq!(
            doses,
            vec![Dose::new(pill("A", 10.0), 1), Dose::new(pill("A", 20.0), 1)]
        );
    }

    #[test]
    fn test_groups_ordered_case_insensitively() {
        let doses = normalize_session(&[
            Dose::new(pill("zinc", 50.0), 1),
            Dose::new(pill("Biotin", 5.0), 1),
            Dose::new(pill("aspirin", 100.0), 1),
        ]);
        let names: Vec<&str> = doses.iter().map(|d| d.pill.name.as_str()).collect();
        assert_eq!(names, vec!["aspirin", "Biotin", "zinc"]);
    }

    #[test]
    fn test_group_keeps_first_seen_order() {
        let doses = normalize_session(&[
            Dose::new(pill("A", 20.0), 1),
            Dose::new(pill("B", 1.0), 1),
            Dose::new(pill("A", 10.0), 3),
            Dose::new(pill("A", 20.0), 2),
        ]);
        assert_eq!(
            doses,
            vec![
                Dose::new(pill("A", 20.0), 3),
                Dose::new(pill("A", 10.0), 3),
                Dose::new(pill("B", 1.0), 1),
            ]
        );
    }

    // Merged doses keep their own unit; nothing is coerced to "mg".
    #[test]
    fn test_normalization_preserves_non_mg_units() {
        let drops = Pill::new("Vitamin D", 400.0, "IU");
        let doses = normalize_session(&[
            Dose::new(drops.clone(), 1),
            Dose::new(drops.clone(), 2),
        ]);
        assert_eq!(doses, vec![Dose::new(drops, 3)]);
        assert_eq!(doses[0].pill.unit, "IU");
    }

    #[test]
    fn test_same_dosage_different_unit_not_merged() {
        let doses = normalize_session(&[
            Dose::new(Pill::new("Melatonin", 3.0, "mg"), 1),
            Dose::new(Pill::new("Melatonin", 3.0, "ml"), 1),
        ]);
        assert_eq!(doses.len(), 2);
        assert_eq!(doses[0].pill.unit, "mg");
        assert_eq!(doses[1].pill.unit, "ml");
    }

    #[test]
    fn test_remove_does_not_renormalize() {
        let mut builder = DoseSessionBuilder::new();
        builder.add_dose(pill("A", 10.0), 1);
        builder.add_dose(pill("B", 5.0), 1);
        builder.add_dose(pill("C", 1.0), 1);

        let session = builder.remove_dose(1).unwrap();
        assert_eq!(
            session,
            &[Dose::new(pill("A", 10.0), 1), Dose::new(pill("C", 1.0), 1)]
        );
        assert!(matches!(
            builder.remove_dose(2),
            Err(Error::IndexOutOfRange { collection: "session", .. })
        ));
    }

    #[test]
    fn test_commit_with_doses_skips_prompt() {
        let mut builder = DoseSessionBuilder::new();
        builder.add_dose(pill("A", 10.0), 2);
        let now = Utc::now();

        let record = builder
            .commit("after lunch", None, now, &mut AlwaysDecline)
            .expect("non-empty session commits without confirmation");
        assert_eq!(record.session.len(), 1);
        assert_eq!(record.note, "after lunch");
        assert_eq!(record.date, now);
        assert!(builder.is_empty());
    }

    #[test]
    fn test_empty_commit_requires_confirmation() {
        let mut builder = DoseSessionBuilder::new();
        let now = Utc::now();

        assert!(builder.commit("note", None, now, &mut AlwaysDecline).is_none());

        let record = builder.commit("note", Some(now), now, &mut AlwaysAccept).unwrap();
        assert!(record.is_note_only());
        assert_eq!(record.user_date, Some(now));
    }

    #[test]
    fn test_discard_drops_working_state() {
        let mut builder = DoseSessionBuilder::new();
        builder.add_dose(pill("A", 10.0), 1);
        builder.discard();
        assert!(builder.is_empty());
    }
}
