//! Contracts for the collaborators the tracker talks to.
//!
//! Confirmation prompts, audio announcements, notifications and the clock
//! all live outside the core; the orchestrator only sees these traits.

use crate::{Dose, Pill};
use chrono::{DateTime, Utc};

// ============================================================================
// Confirmation
// ============================================================================

/// A yes/no question put to the user before an irreversible step
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Confirmation {
    pub title: String,
    pub message: String,
    pub decline_label: String,
    pub accept_label: String,
}

impl Confirmation {
    pub fn new(title: &str, message: &str, decline_label: &str, accept_label: &str) -> Self {
        Self {
            title: title.into(),
            message: message.into(),
            decline_label: decline_label.into(),
            accept_label: accept_label.into(),
        }
    }

    pub fn empty_trash() -> Self {
        Self::new(
            "Empty Trash",
            "Are you sure you want to empty your trash?",
            "cancel",
            "OK",
        )
    }

    pub fn note_only_session() -> Self {
        Self::new(
            "Confirmation",
            "No pills added.  Add Note Anyway?",
            "Cancel",
            "Add Note without Pills",
        )
    }

    pub fn clear_history() -> Self {
        Self::new(
            "Confirm Clear Pill History",
            "Are you sure you want to clear your entire Pill History? This action cannot be undone.",
            "Cancel",
            "Confirm",
        )
    }
}

/// Synchronous yes/no prompt; `true` means the user accepted
pub trait ConfirmPrompt {
    fn confirm(&mut self, request: &Confirmation) -> bool;
}

/// Accepts every confirmation
#[derive(Clone, Copy, Debug, Default)]
pub struct AlwaysAccept;

impl ConfirmPrompt for AlwaysAccept {
    fn confirm(&mut self, request: &Confirmation) -> bool {
        tracing::debug!("Auto-accepted confirmation: {}", request.title);
        true
    }
}

/// Declines every confirmation
#[derive(Clone, Copy, Debug, Default)]
pub struct AlwaysDecline;

impl ConfirmPrompt for AlwaysDecline {
    fn confirm(&mut self, request: &Confirmation) -> bool {
        tracing::debug!("Auto-declined confirmation: {}", request.title);
        false
    }
}

// ============================================================================
// Announcements
// ============================================================================

/// Phrase spoken for a pill, e.g. `Aspirin 100 mg`
pub fn spoken_pill(pill: &Pill) -> String {
    format!("{} {} {}", pill.name, pill.dosage, pill.unit)
}

/// Phrase spoken for a dose, e.g. `2 Aspirin 100 mg`
pub fn spoken_dose(dose: &Dose) -> String {
    format!("{} {}", dose.quantity, spoken_pill(&dose.pill))
}

/// Fire-and-forget audio feedback. Failures never reach the core.
pub trait Announcer {
    fn announce_pills(&mut self, pills: &[Pill]);
    fn announce_doses(&mut self, doses: &[Dose]);
}

#[derive(Clone, Copy, Debug, Default)]
pub struct SilentAnnouncer;

impl Announcer for SilentAnnouncer {
    fn announce_pills(&mut self, _pills: &[Pill]) {}
    fn announce_doses(&mut self, _doses: &[Dose]) {}
}

// ============================================================================
// Notifications
// ============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NoticeKind {
    Success,
    Error,
}

/// Toast-style notification surface
pub trait Notifier {
    fn notify(&mut self, kind: NoticeKind, title: &str, body: &str);
}

/// Routes notifications into the log
#[derive(Clone, Copy, Debug, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&mut self, kind: NoticeKind, title: &str, body: &str) {
        match kind {
            NoticeKind::Success => tracing::info!("{}: {}", title, body),
            NoticeKind::Error => tracing::warn!("{}: {}", title, body),
        }
    }
}

// ============================================================================
// Clock
// ============================================================================

/// Source of the current instant
pub trait Clock {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spoken_phrases() {
        let pill = Pill::new("Aspirin", 100.0, "mg");
        assert_eq!(spoken_pill(&pill), "Aspirin 100 mg");
        assert_eq!(spoken_dose(&Dose::new(pill, 2)), "2 Aspirin 100 mg");
    }

    #[test]
    fn test_fixed_prompts() {
        let request = Confirmation::empty_trash();
        assert!(AlwaysAccept.confirm(&request));
        assert!(!AlwaysDecline.confirm(&request));
        assert_eq!(request.accept_label, "OK");
    }
}
