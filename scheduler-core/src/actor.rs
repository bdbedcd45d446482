//! Actor-based concurrency for the scheduler
//!
//! All mutations flow through one actor task (single-writer pattern):
//! registration, availability publication, restocking and
//! reservations are applied strictly one at a time, which gives the
//! reservation's claim → consume → commit sequence serializable
//! isolation against every other concurrent mutation. Reads bypass
//! the actor and hit storage directly.
//!
//! A request that loses its race (slot or doses already gone by the
//! time the actor processes it) gets a typed failure back on its
//! oneshot channel; nothing is retried.

use crate::{
    availability, credentials, inventory, reservation,
    error::{Error, Result},
    storage::Storage,
    types::{Account, Confirmation, Role, Username, VaccineStock},
};
use chrono::NaiveDate;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};

/// Message sent to the scheduler actor
pub enum SchedulerMessage {
    /// Register a new account
    Register {
        /// Patient or caregiver
        role: Role,
        /// Requested username
        username: Username,
        /// Plaintext password, validated and hashed by the actor
        password: String,
        /// Reply channel
        response: oneshot::Sender<Result<Account>>,
    },

    /// Publish caregiver availability
    Publish {
        /// Publishing caregiver
        caregiver: Username,
        /// Slot date
        date: NaiveDate,
        /// Reply channel
        response: oneshot::Sender<Result<()>>,
    },

    /// Add doses to the inventory
    Restock {
        /// Vaccine name
        name: String,
        /// Doses to add (>= 1)
        count: u32,
        /// Reply channel
        response: oneshot::Sender<Result<VaccineStock>>,
    },

    /// Reserve an appointment
    Reserve {
        /// Booking patient
        patient: Username,
        /// Requested date
        date: NaiveDate,
        /// Requested vaccine
        vaccine: String,
        /// Reply channel
        response: oneshot::Sender<Result<Confirmation>>,
    },

    /// Shutdown actor
    Shutdown,
}

/// Actor that applies scheduler mutations one at a time
pub struct SchedulerActor {
    /// Storage backend
    storage: Arc<Storage>,

    /// Mailbox for incoming messages
    mailbox: mpsc::Receiver<SchedulerMessage>,

    /// PBKDF2 iteration count for registration
    hash_rounds: u32,
}

impl SchedulerActor {
    /// Create new actor
    pub fn new(
        storage: Arc<Storage>,
        mailbox: mpsc::Receiver<SchedulerMessage>,
        hash_rounds: u32,
    ) -> Self {
        Self { storage, mailbox, hash_rounds }
    }

    /// Run the actor loop until shutdown or all handles drop
    pub async fn run(mut self) {
        while let Some(message) = self.mailbox.recv().await {
            match message {
                SchedulerMessage::Register { role, username, password, response } => {
                    let _ = response.send(self.handle_register(role, username, &password));
                }
                SchedulerMessage::Publish { caregiver, date, response } => {
                    let result = availability::publish(&self.storage, &caregiver, date).map(|_| ());
                    let _ = response.send(result);
                }
                SchedulerMessage::Restock { name, count, response } => {
                    let _ = response.send(inventory::restock(&self.storage, &name, count));
                }
                SchedulerMessage::Reserve { patient, date, vaccine, response } => {
                    let result = reservation::reserve(&self.storage, &patient, date, &vaccine);
                    let _ = response.send(result);
                }
                SchedulerMessage::Shutdown => {
                    tracing::info!("Scheduler actor shutting down");
                    break;
                }
            }
        }
    }

    fn handle_register(&self, role: Role, username: Username, password: &str) -> Result<Account> {
        credentials::validate_password(password)?;

        if self.storage.get_account(role, &username)?.is_some() {
            return Err(Error::UsernameTaken);
        }

        let salt = credentials::generate_salt();
        let password_hash = credentials::derive_hash(password, &salt, self.hash_rounds);

        let account = Account { username, role, salt, password_hash };
        self.storage.put_account(&account)?;

        tracing::info!(username = %account.username, role = %account.role, "Account created");

        Ok(account)
    }
}

/// Cloneable handle that sends messages to the actor mailbox
#[derive(Clone)]
pub struct SchedulerHandle {
    sender: mpsc::Sender<SchedulerMessage>,
}

impl SchedulerHandle {
    /// Register a new account
    pub async fn register(&self, role: Role, username: Username, password: String) -> Result<Account> {
        let (response, receiver) = oneshot::channel();
        self.send(SchedulerMessage::Register { role, username, password, response })
            .await?;
        Self::receive(receiver).await
    }

    /// Publish caregiver availability
    pub async fn publish(&self, caregiver: Username, date: NaiveDate) -> Result<()> {
        let (response, receiver) = oneshot::channel();
        self.send(SchedulerMessage::Publish { caregiver, date, response })
            .await?;
        Self::receive(receiver).await
    }

    /// Add doses to the inventory
    pub async fn restock(&self, name: String, count: u32) -> Result<VaccineStock> {
        let (response, receiver) = oneshot::channel();
        self.send(SchedulerMessage::Restock { name, count, response })
            .await?;
        Self::receive(receiver).await
    }

    /// Reserve an appointment
    pub async fn reserve(&self, patient: Username, date: NaiveDate, vaccine: String) -> Result<Confirmation> {
        let (response, receiver) = oneshot::channel();
        self.send(SchedulerMessage::Reserve { patient, date, vaccine, response })
            .await?;
        Self::receive(receiver).await
    }

    /// Shutdown the actor
    pub async fn shutdown(&self) -> Result<()> {
        self.send(SchedulerMessage::Shutdown).await
    }

    async fn send(&self, message: SchedulerMessage) -> Result<()> {
        self.sender
            .send(message)
            .await
            .map_err(|_| Error::Concurrency("Scheduler actor mailbox closed".to_string()))
    }

    async fn receive<T>(receiver: oneshot::Receiver<Result<T>>) -> Result<T> {
        receiver
            .await
            .map_err(|_| Error::Concurrency("Scheduler actor dropped response".to_string()))?
    }
}

/// Spawn the scheduler actor and return a handle to it
pub fn spawn_scheduler_actor(
    storage: Arc<Storage>,
    mailbox_capacity: usize,
    hash_rounds: u32,
) -> SchedulerHandle {
    let (sender, receiver) = mpsc::channel(mailbox_capacity);
    let actor = SchedulerActor::new(storage, receiver, hash_rounds);

    tokio::spawn(actor.run());

    SchedulerHandle { sender }
}
