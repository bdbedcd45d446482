//! Availability board: caregiver-declared open slots
//!
//! Slots are keyed by (date, caregiver) with uniqueness per pair.
//! `claim_any` only picks; the slot's removal is staged by the
//! reservation engine so that a failed reservation leaves the slot
//! open for other callers.

use crate::{
    error::{Error, Result},
    storage::Storage,
    types::{AvailabilitySlot, Username},
};
use chrono::NaiveDate;

/// Publish one open slot for one date
///
/// A duplicate (date, caregiver) pair is rejected, not merged.
pub fn publish(storage: &Storage, caregiver: &Username, date: NaiveDate) -> Result<AvailabilitySlot> {
    if storage.slot_exists(date, caregiver)? {
        return Err(Error::DuplicateSlot);
    }

    storage.put_slot(date, caregiver)?;

    tracing::info!(caregiver = %caregiver, %date, "Availability published");

    Ok(AvailabilitySlot { date, caregiver: caregiver.clone() })
}

/// Deterministically select one available caregiver for `date`
///
/// Lowest username in lexicographic order wins. The slot stays on the
/// board until the caller's reservation commits.
pub fn claim_any(storage: &Storage, date: NaiveDate) -> Result<Username> {
    storage
        .slots_for_date(date)?
        .into_iter()
        .next()
        .ok_or(Error::NoCaregiverAvailable)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Config;
    use tempfile::TempDir;

    fn test_storage() -> (Storage, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let mut config = Config::default();
        config.data_dir = temp_dir.path().to_path_buf();
        (Storage::open(&config).unwrap(), temp_dir)
    }

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    #[test]
    fn test_publish_then_duplicate_rejected() {
        let (storage, _temp) = test_storage();
        let cara = Username::new("cara");
        let d = date("2024-01-05");

        publish(&storage, &cara, d).unwrap();
        assert!(matches!(publish(&storage, &cara, d), Err(Error::DuplicateSlot)));

        // Same caregiver, different date is fine
        publish(&storage, &cara, date("2024-01-06")).unwrap();
    }

    #[test]
    fn test_claim_any_picks_lowest_username() {
        let (storage, _temp) = test_storage();
        let d = date("2024-01-05");

        publish(&storage, &Username::new("zoe"), d).unwrap();
        publish(&storage, &Username::new("cara"), d).unwrap();

        let picked = claim_any(&storage, d).unwrap();
        assert_eq!(picked.as_str(), "cara");

        // Picking does not remove the slot
        let picked_again = claim_any(&storage, d).unwrap();
        assert_eq!(picked_again.as_str(), "cara");
    }

    #[test]
    fn test_claim_any_empty_date() {
        let (storage, _temp) = test_storage();
        assert!(matches!(
            claim_any(&storage, date("2024-03-01")),
            Err(Error::NoCaregiverAvailable)
        ));
    }
}
