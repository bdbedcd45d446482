//! Inventory ledger: named vaccines and their dose counts
//!
//! `try_consume` never writes; it returns the decremented stock for
//! the reservation engine to stage into its commit batch. That keeps
//! the check-and-decrement indivisible with the rest of the
//! reservation: nothing is visible until the batch commits, and the
//! single writer means no other mutation can interleave.

use crate::{
    error::{Error, Result},
    storage::Storage,
    types::VaccineStock,
};

/// Add doses, creating the vaccine on first reference
///
/// `count` must be at least 1. There is no upper bound on the total,
/// but overflow is a checked error rather than a wrap or saturation.
pub fn restock(storage: &Storage, name: &str, count: u32) -> Result<VaccineStock> {
    if count == 0 {
        return Err(Error::Validation("Dose count must be positive".to_string()));
    }

    let stock = match storage.get_vaccine(name)? {
        Some(existing) => {
            let total = existing
                .available_doses
                .checked_add(count)
                .ok_or_else(|| Error::Validation("Dose count overflow".to_string()))?;
            VaccineStock { name: existing.name, available_doses: total }
        }
        None => VaccineStock { name: name.to_string(), available_doses: count },
    };

    storage.put_vaccine(&stock)?;

    tracing::info!(vaccine = %stock.name, available_doses = stock.available_doses, "Doses restocked");

    Ok(stock)
}

/// Guarded decrement: succeeds only if `quantity` doses are available
///
/// Returns the stock with the decrement applied but NOT persisted;
/// the caller commits it as part of its atomic unit.
pub fn try_consume(storage: &Storage, name: &str, quantity: u32) -> Result<VaccineStock> {
    let stock = storage
        .get_vaccine(name)?
        .ok_or_else(|| Error::UnknownVaccine(name.to_string()))?;

    let remaining = stock
        .available_doses
        .checked_sub(quantity)
        .ok_or(Error::InsufficientDoses)?;

    Ok(VaccineStock { name: stock.name, available_doses: remaining })
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

    #[test]
    fn test_restock_creates_then_adds() {
        let (storage, _temp) = test_storage();

        let stock = restock(&storage, "Pfizer", 3).unwrap();
        assert_eq!(stock.available_doses, 3);

        let stock = restock(&storage, "Pfizer", 2).unwrap();
        assert_eq!(stock.available_doses, 5);

        assert_eq!(storage.get_vaccine("Pfizer").unwrap().unwrap().available_doses, 5);
    }

    #[test]
    fn test_restock_rejects_zero() {
        let (storage, _temp) = test_storage();
        assert!(matches!(restock(&storage, "Pfizer", 0), Err(Error::Validation(_))));
        assert!(storage.get_vaccine("Pfizer").unwrap().is_none());
    }

    #[test]
    fn test_restock_overflow_is_checked() {
        let (storage, _temp) = test_storage();
        restock(&storage, "Pfizer", u32::MAX).unwrap();

        assert!(matches!(restock(&storage, "Pfizer", 1), Err(Error::Validation(_))));
        // Total untouched by the failed restock
        assert_eq!(
            storage.get_vaccine("Pfizer").unwrap().unwrap().available_doses,
            u32::MAX
        );
    }

    #[test]
    fn test_try_consume_unknown_vaccine() {
        let (storage, _temp) = test_storage();
        assert!(matches!(
            try_consume(&storage, "Moderna", 1),
            Err(Error::UnknownVaccine(_))
        ));
    }

    #[test]
    fn test_try_consume_guards_zero() {
        let (storage, _temp) = test_storage();
        restock(&storage, "Pfizer", 1).unwrap();

        let staged = try_consume(&storage, "Pfizer", 1).unwrap();
        assert_eq!(staged.available_doses, 0);
        // Not persisted until the caller commits
        assert_eq!(storage.get_vaccine("Pfizer").unwrap().unwrap().available_doses, 1);

        storage.put_vaccine(&staged).unwrap();
        assert!(matches!(
            try_consume(&storage, "Pfizer", 1),
            Err(Error::InsufficientDoses)
        ));
    }
}
