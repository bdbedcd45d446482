//! Storage layer using RocksDB
//!
//! # Column Families
//!
//! - `accounts` - Registered accounts (key: role|username)
//! - `vaccines` - Dose inventory (key: vaccine name)
//! - `slots` - Open availability slots (key: date|username, empty value)
//! - `appointments` - Committed appointments (key: big-endian id)
//! - `meta` - Counters (key: appointment_seq)
//!
//! Slot keys put the date first so a forward scan over one date's
//! prefix yields caregivers in lexicographic username order, which is
//! exactly the deterministic pick order the reservation engine needs.

use crate::{
    error::{Error, Result},
    types::{Account, Appointment, Role, Username, VaccineStock},
    Config,
};
use chrono::NaiveDate;
use rocksdb::{
    ColumnFamily, ColumnFamilyDescriptor, Direction, IteratorMode, Options, WriteBatch, DB,
};
use std::sync::Arc;

/// Column family names
const CF_ACCOUNTS: &str = "accounts";
const CF_VACCINES: &str = "vaccines";
const CF_SLOTS: &str = "slots";
const CF_APPOINTMENTS: &str = "appointments";
const CF_META: &str = "meta";

/// Meta key holding the last issued appointment id
const APPOINTMENT_SEQ_KEY: &[u8] = b"appointment_seq";

/// Storage wrapper for RocksDB
pub struct Storage {
    db: Arc<DB>,
}

impl Storage {
    /// Open or create database
    pub fn open(config: &Config) -> Result<Self> {
        let path = &config.data_dir;

        std::fs::create_dir_all(path)?;

        let mut db_opts = Options::default();
        db_opts.create_if_missing(true);
        db_opts.create_missing_column_families(true);

        // Tuning from config
        db_opts.set_write_buffer_size(config.rocksdb.write_buffer_size_mb * 1024 * 1024);
        db_opts.set_max_write_buffer_number(config.rocksdb.max_write_buffer_number);
        db_opts.set_max_background_jobs(config.rocksdb.max_background_jobs);

        let cf_descriptors = vec![
            ColumnFamilyDescriptor::new(CF_ACCOUNTS, Options::default()),
            ColumnFamilyDescriptor::new(CF_VACCINES, Options::default()),
            ColumnFamilyDescriptor::new(CF_SLOTS, Options::default()),
            ColumnFamilyDescriptor::new(CF_APPOINTMENTS, Options::default()),
            ColumnFamilyDescriptor::new(CF_META, Options::default()),
        ];

        let db = DB::open_cf_descriptors(&db_opts, path, cf_descriptors)?;

        tracing::info!("Opened RocksDB at {:?}", path);

        Ok(Self { db: Arc::new(db) })
    }

    // Helper: get column family handle

    fn cf_handle(&self, name: &str) -> Result<&ColumnFamily> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| Error::Storage(format!("Column family {} not found", name)))
    }

    // Key encodings

    fn account_key(role: Role, username: &Username) -> Vec<u8> {
        let mut key = role.tag().as_bytes().to_vec();
        key.push(b'|');
        key.extend_from_slice(username.as_str().as_bytes());
        key
    }

    fn slot_key(date: NaiveDate, caregiver: &Username) -> Vec<u8> {
        // %Y-%m-%d is fixed-width, so bytewise key order is date order
        let mut key = date.to_string().into_bytes();
        key.push(b'|');
        key.extend_from_slice(caregiver.as_str().as_bytes());
        key
    }

    fn slot_prefix(date: NaiveDate) -> Vec<u8> {
        let mut prefix = date.to_string().into_bytes();
        prefix.push(b'|');
        prefix
    }

    // Account operations

    /// Persist a new account
    pub fn put_account(&self, account: &Account) -> Result<()> {
        let cf = self.cf_handle(CF_ACCOUNTS)?;
        let key = Self::account_key(account.role, &account.username);
        let value = bincode::serialize(account)?;

        self.db.put_cf(cf, key, &value)?;

        Ok(())
    }

    /// Look up an account by role and username
    pub fn get_account(&self, role: Role, username: &Username) -> Result<Option<Account>> {
        let cf = self.cf_handle(CF_ACCOUNTS)?;
        let key = Self::account_key(role, username);

        match self.db.get_cf(cf, key)? {
            Some(value) => Ok(Some(bincode::deserialize(&value)?)),
            None => Ok(None),
        }
    }

    // Vaccine operations

    /// Look up vaccine stock by name
    pub fn get_vaccine(&self, name: &str) -> Result<Option<VaccineStock>> {
        let cf = self.cf_handle(CF_VACCINES)?;

        match self.db.get_cf(cf, name.as_bytes())? {
            Some(value) => Ok(Some(bincode::deserialize(&value)?)),
            None => Ok(None),
        }
    }

    /// Put vaccine stock (create or overwrite)
    pub fn put_vaccine(&self, stock: &VaccineStock) -> Result<()> {
        let cf = self.cf_handle(CF_VACCINES)?;
        let value = bincode::serialize(stock)?;

        self.db.put_cf(cf, stock.name.as_bytes(), &value)?;

        Ok(())
    }

    /// Full stock table, ordered by vaccine name
    pub fn list_vaccines(&self) -> Result<Vec<VaccineStock>> {
        let cf = self.cf_handle(CF_VACCINES)?;

        let mut stocks = Vec::new();
        for item in self.db.iterator_cf(cf, IteratorMode::Start) {
            let (_, value) = item?;
            stocks.push(bincode::deserialize(&value)?);
        }

        Ok(stocks)
    }

    // Slot operations

    /// Check whether a (date, caregiver) slot is already published
    pub fn slot_exists(&self, date: NaiveDate, caregiver: &Username) -> Result<bool> {
        let cf = self.cf_handle(CF_SLOTS)?;
        let key = Self::slot_key(date, caregiver);

        Ok(self.db.get_cf(cf, key)?.is_some())
    }

    /// Publish a slot
    pub fn put_slot(&self, date: NaiveDate, caregiver: &Username) -> Result<()> {
        let cf = self.cf_handle(CF_SLOTS)?;
        let key = Self::slot_key(date, caregiver);

        self.db.put_cf(cf, key, b"")?;

        Ok(())
    }

    /// Caregivers with an open slot on `date`, in lexicographic
    /// username order
    pub fn slots_for_date(&self, date: NaiveDate) -> Result<Vec<Username>> {
        let cf = self.cf_handle(CF_SLOTS)?;
        let prefix = Self::slot_prefix(date);

        let iter = self
            .db
            .iterator_cf(cf, IteratorMode::From(prefix.as_slice(), Direction::Forward));

        let mut caregivers = Vec::new();
        for item in iter {
            let (key, _) = item?;
            if !key.starts_with(&prefix) {
                break;
            }
            let name = std::str::from_utf8(&key[prefix.len()..])
                .map_err(|_| Error::Storage("Malformed slot key".to_string()))?;
            caregivers.push(Username::new(name));
        }

        Ok(caregivers)
    }

    // Appointment operations

    /// Get appointment by id
    pub fn get_appointment(&self, id: u64) -> Result<Option<Appointment>> {
        let cf = self.cf_handle(CF_APPOINTMENTS)?;

        match self.db.get_cf(cf, id.to_be_bytes())? {
            Some(value) => Ok(Some(bincode::deserialize(&value)?)),
            None => Ok(None),
        }
    }

    /// Appointments where `username` participates on the `role` side,
    /// ordered by id
    pub fn appointments_for(&self, role: Role, username: &Username) -> Result<Vec<Appointment>> {
        let cf = self.cf_handle(CF_APPOINTMENTS)?;

        // Big-endian id keys make a forward scan id-ordered
        let mut appointments = Vec::new();
        for item in self.db.iterator_cf(cf, IteratorMode::Start) {
            let (_, value) = item?;
            let appointment: Appointment = bincode::deserialize(&value)?;
            let mine = match role {
                Role::Caregiver => &appointment.caregiver == username,
                Role::Patient => &appointment.patient == username,
            };
            if mine {
                appointments.push(appointment);
            }
        }

        Ok(appointments)
    }

    /// Next appointment id (last issued + 1, starting at 1)
    ///
    /// Only the single writer allocates ids; the advanced counter is
    /// persisted inside the reservation commit batch.
    pub fn next_appointment_id(&self) -> Result<u64> {
        let cf = self.cf_handle(CF_META)?;

        let last = match self.db.get_cf(cf, APPOINTMENT_SEQ_KEY)? {
            Some(value) => {
                let bytes: [u8; 8] = value
                    .as_slice()
                    .try_into()
                    .map_err(|_| Error::Storage("Malformed appointment counter".to_string()))?;
                u64::from_be_bytes(bytes)
            }
            None => 0,
        };

        Ok(last + 1)
    }

    // Atomic reservation commit

    /// Commit one reservation: slot delete, stock decrement,
    /// appointment insert and counter advance become durable together,
    /// or none do.
    pub fn commit_reservation(&self, appointment: &Appointment, stock: &VaccineStock) -> Result<()> {
        let mut batch = WriteBatch::default();

        // 1. Claimed slot is destroyed
        let cf_slots = self.cf_handle(CF_SLOTS)?;
        batch.delete_cf(cf_slots, Self::slot_key(appointment.date, &appointment.caregiver));

        // 2. Decremented stock
        let cf_vaccines = self.cf_handle(CF_VACCINES)?;
        batch.put_cf(cf_vaccines, stock.name.as_bytes(), bincode::serialize(stock)?);

        // 3. Appointment record
        let cf_appointments = self.cf_handle(CF_APPOINTMENTS)?;
        batch.put_cf(
            cf_appointments,
            appointment.id.to_be_bytes(),
            bincode::serialize(appointment)?,
        );

        // 4. Advance the id counter
        let cf_meta = self.cf_handle(CF_META)?;
        batch.put_cf(cf_meta, APPOINTMENT_SEQ_KEY, appointment.id.to_be_bytes());

        // Atomic commit
        self.db.write(batch)?;

        tracing::debug!(
            appointment_id = appointment.id,
            caregiver = %appointment.caregiver,
            vaccine = %appointment.vaccine,
            "Reservation committed"
        );

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{HASH_LEN, SALT_LEN};
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

    fn test_account(role: Role, username: &str) -> Account {
        Account {
            username: Username::new(username),
            role,
            salt: [7u8; SALT_LEN],
            password_hash: [9u8; HASH_LEN],
        }
    }

    #[test]
    fn test_storage_open() {
        let (storage, _temp) = test_storage();
        assert!(storage.db.cf_handle(CF_ACCOUNTS).is_some());
        assert!(storage.db.cf_handle(CF_APPOINTMENTS).is_some());
    }

    #[test]
    fn test_put_and_get_account() {
        let (storage, _temp) = test_storage();

        let account = test_account(Role::Patient, "pat");
        storage.put_account(&account).unwrap();

        let retrieved = storage.get_account(Role::Patient, &account.username).unwrap();
        assert_eq!(retrieved, Some(account.clone()));

        // Same username under the other role is a different record
        let other = storage.get_account(Role::Caregiver, &account.username).unwrap();
        assert!(other.is_none());
    }

    #[test]
    fn test_vaccine_roundtrip_and_ordering() {
        let (storage, _temp) = test_storage();

        storage
            .put_vaccine(&VaccineStock { name: "Pfizer".to_string(), available_doses: 3 })
            .unwrap();
        storage
            .put_vaccine(&VaccineStock { name: "Moderna".to_string(), available_doses: 5 })
            .unwrap();

        let stocks = storage.list_vaccines().unwrap();
        assert_eq!(stocks.len(), 2);
        assert_eq!(stocks[0].name, "Moderna");
        assert_eq!(stocks[1].name, "Pfizer");
    }

    #[test]
    fn test_slots_for_date_is_username_ordered() {
        let (storage, _temp) = test_storage();
        let d = date("2024-01-05");

        storage.put_slot(d, &Username::new("zoe")).unwrap();
        storage.put_slot(d, &Username::new("amy")).unwrap();
        storage.put_slot(d, &Username::new("cara")).unwrap();
        // Neighboring date must not leak into the scan
        storage.put_slot(date("2024-01-06"), &Username::new("aaa")).unwrap();

        let caregivers = storage.slots_for_date(d).unwrap();
        assert_eq!(
            caregivers,
            vec![Username::new("amy"), Username::new("cara"), Username::new("zoe")]
        );
    }

    #[test]
    fn test_slot_exists() {
        let (storage, _temp) = test_storage();
        let d = date("2024-01-05");
        let cara = Username::new("cara");

        assert!(!storage.slot_exists(d, &cara).unwrap());
        storage.put_slot(d, &cara).unwrap();
        assert!(storage.slot_exists(d, &cara).unwrap());
    }

    #[test]
    fn test_next_appointment_id_starts_at_one() {
        let (storage, _temp) = test_storage();
        assert_eq!(storage.next_appointment_id().unwrap(), 1);
    }

    #[test]
    fn test_commit_reservation_is_atomic() {
        let (storage, _temp) = test_storage();
        let d = date("2024-01-05");
        let cara = Username::new("cara");

        storage.put_slot(d, &cara).unwrap();
        storage
            .put_vaccine(&VaccineStock { name: "Pfizer".to_string(), available_doses: 1 })
            .unwrap();

        let appointment = Appointment {
            id: storage.next_appointment_id().unwrap(),
            caregiver: cara.clone(),
            patient: Username::new("pat"),
            vaccine: "Pfizer".to_string(),
            date: d,
        };
        let stock = VaccineStock { name: "Pfizer".to_string(), available_doses: 0 };

        storage.commit_reservation(&appointment, &stock).unwrap();

        // Slot gone, stock decremented, appointment present, counter advanced
        assert!(!storage.slot_exists(d, &cara).unwrap());
        assert_eq!(storage.get_vaccine("Pfizer").unwrap().unwrap().available_doses, 0);
        assert_eq!(storage.get_appointment(1).unwrap(), Some(appointment));
        assert_eq!(storage.next_appointment_id().unwrap(), 2);
    }

    #[test]
    fn test_appointments_for_filters_by_side() {
        let (storage, _temp) = test_storage();
        let d = date("2024-01-05");

        for (id, caregiver, patient) in [(1, "cara", "pat"), (2, "dana", "pat"), (3, "cara", "quinn")] {
            let appointment = Appointment {
                id,
                caregiver: Username::new(caregiver),
                patient: Username::new(patient),
                vaccine: "Pfizer".to_string(),
                date: d,
            };
            let stock = VaccineStock { name: "Pfizer".to_string(), available_doses: 0 };
            storage.commit_reservation(&appointment, &stock).unwrap();
        }

        let pats = storage.appointments_for(Role::Patient, &Username::new("pat")).unwrap();
        assert_eq!(pats.iter().map(|a| a.id).collect::<Vec<_>>(), vec![1, 2]);

        let caras = storage.appointments_for(Role::Caregiver, &Username::new("cara")).unwrap();
        assert_eq!(caras.iter().map(|a| a.id).collect::<Vec<_>>(), vec![1, 3]);
    }
}
