//! CSV export of the history ledger.
//!
//! One row per dose; note-only sessions get a single row with empty dose
//! columns so the note is not lost.

use crate::{Result, SessionRecord};
use std::fs::File;
use std::path::Path;

/// A row in the CSV output
#[derive(Debug, serde::Serialize)]
struct CsvRow<'a> {
    record_id: String,
    date: String,
    user_date: Option<String>,
    date_emailed: Option<String>,
    note: &'a str,
    pill_name: Option<&'a str>,
    dosage: Option<f64>,
    unit: Option<&'a str>,
    quantity: Option<u32>,
}

impl<'a> CsvRow<'a> {
    fn rows_for(record: &'a SessionRecord) -> Vec<CsvRow<'a>> {
        let base = || CsvRow {
            record_id: record.id.to_string(),
            date: record.date.to_rfc3339(),
            user_date: record.user_date.map(|t| t.to_rfc3339()),
            date_emailed: record.date_emailed.map(|t| t.to_rfc3339()),
            note: &record.note,
            pill_name: None,
            dosage: None,
            unit: None,
            quantity: None,
        };

        if record.session.is_empty() {
            return vec![base()];
        }

        record
            .session
            .iter()
            .map(|dose| CsvRow {
                pill_name: Some(dose.pill.name.as_str()),
                dosage: Some(dose.pill.dosage),
                unit: Some(dose.pill.unit.as_str()),
                quantity: Some(dose.quantity),
                ..base()
            })
            .collect()
    }
}

/// Write `records` to a new CSV file at `path`, returning the rows written
///
/// An existing file is replaced. The file is synced before returning.
pub fn export_history_csv(records: &[SessionRecord], path: &Path) -> Result<usize> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let file = File::create(path)?;
    let mut writer = csv::WriterBuilder::new()
        .has_headers(true)
        .from_writer(file);

    let mut count = 0;
    for record in records {
        for row in CsvRow::rows_for(record) {
            writer.serialize(row)?;
            count += 1;
        }
    }

    writer.flush()?;
    let file = writer
        .into_inner()
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e.to_string()))?;
    file.sync_all()?;

    tracing::info!("Exported {} history rows to {:?}", count, path);
    Ok(count)
}
