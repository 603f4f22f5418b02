//! Shared ordering utilities.
//!
//! Pills order by upper-cased name only. Dosage and unit never break ties,
//! so equal names keep their relative order (the sorts here are stable).

use crate::{Pill, SessionRecord};
use std::cmp::Ordering;

/// Case-insensitive comparison of two pill names
pub fn compare_names(a: &str, b: &str) -> Ordering {
    a.to_uppercase().cmp(&b.to_uppercase())
}

/// Stable sort of pills by case-insensitive name
pub fn sort_pills(pills: &mut [Pill]) {
    pills.sort_by(|a, b| compare_names(&a.name, &b.name));
}

/// Whether the slice already satisfies the catalog ordering
#[cfg(test)]
pub(crate) fn is_sorted_by_name(pills: &[Pill]) -> bool {
    pills
        .windows(2)
        .all(|pair| compare_names(&pair[0].name, &pair[1].name) != Ordering::Greater)
}

/// Stable sort of records by creation instant
///
/// `oldest_first` is the ledger's reverse-order flag.
pub fn sort_records_by_date(records: &mut [SessionRecord], oldest_first: bool) {
    if oldest_first {
        records.sort_by(|a, b| a.date.cmp(&b.date));
    } else {
        records.sort_by(|a, b| b.date.cmp(&a.date));
    }
}
