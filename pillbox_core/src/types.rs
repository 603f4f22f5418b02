//! Core domain types for the Pillbox system.
//!
//! This module defines the fundamental types used throughout the system:
//! - Pills and their identity key
//! - Doses within a session
//! - Committed session records
//! - The persisted state of every collection

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Format used for every timestamp shown in history text
pub const DISPLAY_TIME_FORMAT: &str = "%a %b %d %Y, %H:%M:%S";

// ============================================================================
// Pill and Dose Types
// ============================================================================

/// A medication the user owns.
///
/// Two pills are the same pill iff name, dosage and unit all match exactly,
/// which is what the derived `PartialEq` compares.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Pill {
    pub name: String,
    pub dosage: f64,
    pub unit: String,
}

impl Pill {
    pub fn new(name: impl Into<String>, dosage: f64, unit: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            dosage,
            unit: unit.into(),
        }
    }

    /// Picker label, e.g. `Aspirin: 100mg`
    pub fn label(&self) -> String {
        format!("{}: {}{}", self.name, self.dosage, self.unit)
    }

    /// Compact form used in notifications, e.g. `Aspirin 100mg`
    pub fn short_label(&self) -> String {
        format!("{} {}{}", self.name, self.dosage, self.unit)
    }
}

/// A quantity of one pill taken within a session
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Dose {
    pub pill: Pill,
    pub quantity: u32,
}

impl Dose {
    pub fn new(pill: Pill, quantity: u32) -> Self {
        Self { pill, quantity }
    }

    /// Notification line, e.g. `Aspirin 100mg x 2`
    pub fn summary(&self) -> String {
        format!("{} x {}", self.pill.short_label(), self.quantity)
    }
}

// ============================================================================
// Session Record
// ============================================================================

/// A committed session.
///
/// Immutable once created except for `date_emailed`.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct SessionRecord {
    pub id: Uuid,
    pub session: Vec<Dose>,
    #[serde(default)]
    pub note: String,
    /// Creation instant; the ordering key of the ledger
    pub date: DateTime<Utc>,
    /// When the user says the pills were taken
    #[serde(default)]
    pub user_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub date_emailed: Option<DateTime<Utc>>,
}

impl SessionRecord {
    pub fn new(
        session: Vec<Dose>,
        note: impl Into<String>,
        user_date: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            session,
            note: note.into(),
            date: now,
            user_date,
            date_emailed: None,
        }
    }

    /// Whether any dose in this record is of the given pill
    pub fn contains_pill(&self, pill: &Pill) -> bool {
        self.session.iter().any(|dose| dose.pill == *pill)
    }

    /// Whether this record only carries a note
    pub fn is_note_only(&self) -> bool {
        self.session.is_empty()
    }

    /// Lines shown for this record in the history view
    pub fn display_lines(&self) -> Vec<String> {
        let mut lines = vec![self.date.format(DISPLAY_TIME_FORMAT).to_string()];
        if let Some(user_date) = self.user_date {
            lines.push(format!(
                "Date Taken: {}",
                user_date.format(DISPLAY_TIME_FORMAT)
            ));
        }
        if !self.note.is_empty() {
            lines.push(self.note.clone());
        }
        for dose in &self.session {
            lines.push(format!(
                "\t\t{}, {}{} X {}",
                dose.pill.name, dose.pill.dosage, dose.pill.unit, dose.quantity
            ));
        }
        lines
    }
}

// ============================================================================
// Persisted State
// ============================================================================

/// Every collection the tracker persists between runs
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct PillboxState {
    #[serde(default)]
    pub pills: Vec<Pill>,
    #[serde(default)]
    pub pill_trash: Vec<Pill>,
    #[serde(default)]
    pub history: Vec<SessionRecord>,
    #[serde(default)]
    pub history_trash: Vec<Vec<SessionRecord>>,
    #[serde(default)]
    pub history_is_reverse: bool,
    #[serde(default = "default_play_sounds")]
    pub play_sounds: bool,
}

fn default_play_sounds() -> bool {
    true
}

impl Default for PillboxState {
    fn default() -> Self {
        Self {
            pills: Vec::new(),
            pill_trash: Vec::new(),
            history: Vec::new(),
            history_trash: Vec::new(),
            history_is_reverse: false,
            play_sounds: default_play_sounds(),
        }
    }
}
