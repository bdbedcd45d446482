//! Core types for the scheduler
//!
//! All types are designed for:
//! - Deterministic serialization (bincode)
//! - Memory safety (no unsafe code)
//! - Exact integral dose counts (no floats anywhere)

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Length of the per-account random salt in bytes
pub const SALT_LEN: usize = 16;

/// Length of the derived password hash in bytes
pub const HASH_LEN: usize = 16;

/// Account username (unique per role, case-sensitive, immutable)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Username(String);

impl Username {
    /// Create new username
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Get as string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Username {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Actor role, dispatched at the session and authorization layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    /// Books appointments
    Patient,
    /// Publishes availability and restocks doses
    Caregiver,
}

impl Role {
    /// Stable storage/display tag
    pub fn tag(&self) -> &'static str {
        match self {
            Role::Patient => "patient",
            Role::Caregiver => "caregiver",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.tag())
    }
}

/// Registered account with salted password hash
///
/// Created at registration, never mutated or deleted thereafter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// Unique username (per role)
    pub username: Username,

    /// Patient or caregiver
    pub role: Role,

    /// Random salt from the OS CSPRNG
    pub salt: [u8; SALT_LEN],

    /// PBKDF2-derived hash of password + salt
    pub password_hash: [u8; HASH_LEN],
}

/// Named vaccine product and its available dose count
///
/// Invariant: `available_doses` never goes negative; the decrement is
/// guarded before being applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VaccineStock {
    /// Unique vaccine name
    pub name: String,

    /// Doses currently available for reservation
    pub available_doses: u32,
}

/// A caregiver's declared open slot for one date
///
/// Consumable exactly once: destroyed the instant a reservation
/// claims it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailabilitySlot {
    /// Appointment date
    pub date: NaiveDate,

    /// Caregiver who published the slot
    pub caregiver: Username,
}

/// Committed appointment, the durable successor of a claimed slot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Appointment {
    /// Monotonically increasing id assigned by the store
    pub id: u64,

    /// Caregiver whose slot was claimed
    pub caregiver: Username,

    /// Patient who reserved
    pub patient: Username,

    /// Vaccine whose dose was consumed
    pub vaccine: String,

    /// Appointment date
    pub date: NaiveDate,
}

/// Successful reservation result returned to the caller
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Confirmation {
    /// Id of the committed appointment
    pub appointment_id: u64,

    /// Caregiver selected for the appointment
    pub caregiver: Username,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_tag() {
        assert_eq!(Role::Patient.tag(), "patient");
        assert_eq!(Role::Caregiver.tag(), "caregiver");
        assert_eq!(Role::Caregiver.to_string(), "caregiver");
    }

    #[test]
    fn test_username_ordering_is_lexicographic() {
        let mut names = vec![
            Username::new("cara"),
            Username::new("Bob"),
            Username::new("alice"),
        ];
        names.sort();
        // Bytewise order: uppercase sorts before lowercase
        assert_eq!(names[0].as_str(), "Bob");
        assert_eq!(names[1].as_str(), "alice");
        assert_eq!(names[2].as_str(), "cara");
    }

    #[test]
    fn test_username_is_case_sensitive() {
        assert_ne!(Username::new("Alice"), Username::new("alice"));
    }
}
