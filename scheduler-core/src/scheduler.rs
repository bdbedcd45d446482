//! Main scheduler orchestration layer
//!
//! Ties together storage, credentials and the writer actor into a
//! high-level API. Mutations go through the actor (one writer,
//! serializable); reads hit storage directly. Role gating happens
//! here, against the caller's [`Session`], before anything reaches
//! the write path.

use crate::{
    actor::{spawn_scheduler_actor, SchedulerHandle},
    credentials,
    error::Result,
    session::Session,
    storage::Storage,
    types::{Account, Appointment, Confirmation, Role, Username, VaccineStock},
    Config,
};
use chrono::NaiveDate;
use std::sync::Arc;

/// Main scheduler interface
pub struct Scheduler {
    /// Actor handle for mutations
    handle: SchedulerHandle,

    /// Direct storage access (for reads)
    storage: Arc<Storage>,

    /// Configuration
    config: Config,
}

impl Scheduler {
    /// Open scheduler with configuration
    pub fn open(config: Config) -> Result<Self> {
        let storage = Arc::new(Storage::open(&config)?);

        let handle = spawn_scheduler_actor(
            storage.clone(),
            config.mailbox_capacity,
            config.hashing.rounds,
        );

        Ok(Self { handle, storage, config })
    }

    /// Register a new patient or caregiver account
    ///
    /// Validates password strength first, then checks username
    /// uniqueness (case-sensitive, per role), then hashes and
    /// persists. Existing accounts are never touched.
    pub async fn register(&self, role: Role, username: &str, password: &str) -> Result<Account> {
        self.handle
            .register(role, Username::new(username), password.to_string())
            .await
    }

    /// Verify credentials without mutating anything
    ///
    /// A missing account and a wrong password are indistinguishable:
    /// both yield `None`.
    pub fn authenticate(&self, role: Role, username: &str, password: &str) -> Result<Option<Account>> {
        let username = Username::new(username);
        let Some(account) = self.storage.get_account(role, &username)? else {
            return Ok(None);
        };

        let rounds = self.config.hashing.rounds;
        if credentials::verify(password, &account.salt, rounds, &account.password_hash) {
            Ok(Some(account))
        } else {
            Ok(None)
        }
    }

    /// Authenticate and bind the identity to `session`
    ///
    /// Fails with `AlreadyLoggedIn` if the session holds an identity;
    /// returns `Ok(None)` on bad credentials, leaving the session
    /// untouched.
    pub fn login(
        &self,
        session: &mut Session,
        role: Role,
        username: &str,
        password: &str,
    ) -> Result<Option<Account>> {
        if session.identity().is_some() {
            return Err(crate::Error::AlreadyLoggedIn);
        }

        match self.authenticate(role, username, password)? {
            Some(account) => {
                session.login(role, account.username.clone())?;
                Ok(Some(account))
            }
            None => Ok(None),
        }
    }

    /// Publish one open slot for the logged-in caregiver
    pub async fn publish(&self, session: &Session, date: NaiveDate) -> Result<()> {
        let caregiver = session.require_role(Role::Caregiver)?;
        self.handle.publish(caregiver.clone(), date).await
    }

    /// Add doses to a vaccine, creating it on first reference
    pub async fn restock(&self, session: &Session, name: &str, count: u32) -> Result<VaccineStock> {
        session.require_role(Role::Caregiver)?;
        self.handle.restock(name.to_string(), count).await
    }

    /// Reserve an appointment for the logged-in patient
    pub async fn reserve(&self, session: &Session, date: NaiveDate, vaccine: &str) -> Result<Confirmation> {
        let patient = session.require_role(Role::Patient)?;
        self.handle
            .reserve(patient.clone(), date, vaccine.to_string())
            .await
    }

    /// Open caregivers for `date` (lexicographic) plus the full stock
    /// table, for any authenticated identity
    pub fn schedule_for(
        &self,
        session: &Session,
        date: NaiveDate,
    ) -> Result<(Vec<Username>, Vec<VaccineStock>)> {
        session.require_any()?;

        let caregivers = self.storage.slots_for_date(date)?;
        let stocks = self.storage.list_vaccines()?;

        Ok((caregivers, stocks))
    }

    /// Appointments on the logged-in identity's side, ordered by id
    pub fn appointments_for(&self, session: &Session) -> Result<Vec<Appointment>> {
        let (role, username) = session.require_any()?;
        self.storage.appointments_for(role, username)
    }

    /// Shutdown scheduler
    pub async fn shutdown(self) -> Result<()> {
        self.handle.shutdown().await
    }
}
