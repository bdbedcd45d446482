//! Vaccine Scheduler Core
//!
//! Booking-and-inventory consistency engine for a vaccine appointment
//! scheduler: patients and caregivers register and authenticate,
//! caregivers publish availability and restock doses, patients reserve
//! appointments against the shared dose pool.
//!
//! # Architecture
//!
//! - **Single Writer**: all mutations flow through one actor task,
//!   serializing the reservation critical section
//! - **Atomic Commit**: a reservation's slot removal, dose decrement
//!   and appointment insert land in one storage write batch
//! - **Typed Failures**: a lost race for a slot or a dose aborts
//!   promptly with a typed error, never a silent retry
//!
//! # Invariants
//!
//! - Available doses never go negative: the decrement is guarded, not
//!   checked after the fact
//! - A (date, caregiver) slot is claimed at most once
//! - Appointments are immutable and carry monotonically increasing ids

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, unused_qualifications)]

pub mod actor;
pub mod availability;
pub mod config;
pub mod credentials;
pub mod error;
pub mod inventory;
pub mod reservation;
pub mod scheduler;
pub mod session;
pub mod storage;
pub mod types;

// Re-exports
pub use config::Config;
pub use error::{Error, Result};
pub use scheduler::Scheduler;
pub use session::Session;
pub use storage::Storage;
pub use types::{Account, Appointment, AvailabilitySlot, Confirmation, Role, Username, VaccineStock};
