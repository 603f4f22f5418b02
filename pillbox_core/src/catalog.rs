//! The pill catalog: active pills plus a restorable trash.
//!
//! Both lists are kept sorted by case-insensitive name after every mutation,
//! and no two active pills share a name, dosage and unit.

use crate::ordering::sort_pills;
use crate::{Error, Pill, Result};

/// Ordered set of pills the user owns, with soft-delete trash
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PillCatalog {
    pills: Vec<Pill>,
    trash: Vec<Pill>,
}

impl PillCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a catalog from persisted lists, restoring the ordering invariant
    pub fn from_parts(mut pills: Vec<Pill>, mut trash: Vec<Pill>) -> Self {
        sort_pills(&mut pills);
        sort_pills(&mut trash);
        Self { pills, trash }
    }

    pub fn pills(&self) -> &[Pill] {
        &self.pills
    }

    pub fn trash(&self) -> &[Pill] {
        &self.trash
    }

    pub fn len(&self) -> usize {
        self.pills.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pills.is_empty()
    }

    /// Active pill at `index`
    pub fn get(&self, index: usize) -> Result<&Pill> {
        self.pills
            .get(index)
            .ok_or_else(|| Error::out_of_range("pills", index, self.pills.len()))
    }

    pub fn contains(&self, pill: &Pill) -> bool {
        self.pills.iter().any(|p| p == pill)
    }

    /// Add a new pill, rejecting exact duplicates of an active pill
    ///
    /// Pills sitting in the trash do not count as duplicates. NaN would never
    /// compare equal to itself, so non-finite dosages are refused up front.
    pub fn add(&mut self, name: impl Into<String>, dosage: f64, unit: impl Into<String>) -> Result<Pill> {
        if !dosage.is_finite() || dosage < 0.0 {
            return Err(Error::InvalidDosage(dosage));
        }

        let pill = Pill::new(name, dosage, unit);
        if self.contains(&pill) {
            tracing::debug!("Rejected duplicate pill {}", pill.label());
            return Err(Error::DuplicatePill {
                name: pill.name,
                dosage: pill.dosage,
                unit: pill.unit,
            });
        }

        self.pills.push(pill.clone());
        sort_pills(&mut self.pills);
        tracing::debug!("Added pill {}", pill.label());
        Ok(pill)
    }

    /// Move the active pill at `index` into the trash
    pub fn delete(&mut self, index: usize) -> Result<Pill> {
        if index >= self.pills.len() {
            return Err(Error::out_of_range("pills", index, self.pills.len()));
        }

        let pill = self.pills.remove(index);
        self.trash.push(pill.clone());
        sort_pills(&mut self.trash);
        tracing::debug!("Moved pill {} to trash", pill.label());
        Ok(pill)
    }

    /// Move the trashed pill at `index` back into the active list
    pub fn restore(&mut self, index: usize) -> Result<Pill> {
        if index >= self.trash.len() {
            return Err(Error::out_of_range("pill trash", index, self.trash.len()));
        }

        let pill = self.trash.remove(index);
        self.pills.push(pill.clone());
        sort_pills(&mut self.pills);
        tracing::debug!("Restored pill {} from trash", pill.label());
        Ok(pill)
    }

    /// Permanently drop everything in the trash, returning how many pills went
    pub fn empty_trash(&mut self) -> usize {
        let count = self.trash.len();
        self.trash.clear();
        tracing::debug!("Emptied pill trash ({} pills)", count);
        count
    }
}
