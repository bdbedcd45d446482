//! Reservation engine: the core state machine
//!
//! One booking request walks Requested → CaregiverSelected →
//! DosesReserved → Committed, or aborts with no surviving side
//! effects. Nothing is written to storage before the single commit
//! batch, so every failure path is a rollback by construction.
//! Splitting slot lookup, dose lookup, appointment insert, slot
//! delete and dose decrement into independent writes would invite
//! double-booking and negative-inventory races; this module exists
//! to make those five steps one unit.
//!
//! Callers must hold the single-writer serialization (these functions
//! are only invoked from the scheduler actor task).

use crate::{
    availability, inventory,
    error::{Error, Result},
    storage::Storage,
    types::{Appointment, Confirmation, Username},
};
use chrono::NaiveDate;

/// Reserve one appointment for `patient` on `date` with `vaccine`
///
/// Selects the lexicographically lowest available caregiver, consumes
/// one dose, and commits slot removal + dose decrement + appointment
/// as one atomic unit. The slot check runs before the dose check, so
/// an empty date reports `NoCaregiverAvailable` even when doses are
/// also short.
pub fn reserve(
    storage: &Storage,
    patient: &Username,
    date: NaiveDate,
    vaccine: &str,
) -> Result<Confirmation> {
    // CaregiverSelected
    let caregiver = availability::claim_any(storage, date)?;

    // DosesReserved (staged, not yet visible)
    let stock = inventory::try_consume(storage, vaccine, 1).map_err(|err| match err {
        // The user-visible contract folds an unknown vaccine into the
        // dose failure; the slot claim is simply not committed
        Error::UnknownVaccine(_) => Error::InsufficientDoses,
        other => other,
    })?;

    let appointment = Appointment {
        id: storage.next_appointment_id()?,
        caregiver: caregiver.clone(),
        patient: patient.clone(),
        vaccine: vaccine.to_string(),
        date,
    };

    // Committed: all four writes land together or not at all
    storage.commit_reservation(&appointment, &stock)?;

    tracing::info!(
        appointment_id = appointment.id,
        patient = %patient,
        caregiver = %caregiver,
        vaccine,
        %date,
        "Appointment reserved"
    );

    Ok(Confirmation { appointment_id: appointment.id, caregiver })
}
