#![forbid(unsafe_code)]

//! Core domain model and business logic for the Pillbox medication tracker.
//!
//! This crate provides:
//! - Domain types (pills, doses, session records, persisted state)
//! - Pill catalog with soft-delete trash
//! - Dose session building and normalization
//! - History ledger with ordering, filtering and cleared-history archive
//! - The `Pillbox` orchestrator that owns all collections
//! - Persistence (JSON state, CSV export, email outbox)

pub mod types;
pub mod error;
pub mod ordering;
pub mod catalog;
pub mod session;
pub mod ledger;
pub mod collaborators;
pub mod config;
pub mod logging;
pub mod state;
pub mod email;
pub mod export;
pub mod tracker;

// Re-export commonly used types
pub use error::{Error, Result};
pub use types::*;
pub use catalog::PillCatalog;
pub use session::{normalize_session, DoseSessionBuilder};
pub use ledger::HistoryLedger;
pub use collaborators::{
    AlwaysAccept, AlwaysDecline, Announcer, Clock, ConfirmPrompt, Confirmation, LogNotifier,
    NoticeKind, Notifier, SilentAnnouncer, SystemClock,
};
pub use config::Config;
pub use state::{JsonStateStore, MemoryStateStore, StateStore};
pub use email::{EmailScope, EmailSender, OutboxSender};
pub use export::export_history_csv;
pub use tracker::{Collaborators, Pillbox};
