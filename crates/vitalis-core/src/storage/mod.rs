//! Storage collaborator interfaces and the SQLite adapter.
//!
//! The engine reaches persistence only through the narrow [`VitalityStore`]
//! trait, and reads the externally-owned capacity/burnout facts through
//! [`FactProvider`]. The engine performs no retries: a storage failure
//! propagates unchanged and leaves prior state untouched.

mod config;
pub mod database;

pub use config::{BoostDefaults, BurndownConfig, EngineConfig};
pub use database::{Database, StoredFacts};

use std::path::PathBuf;

use chrono::{DateTime, NaiveDate, Utc};

use crate::energy::EnergyBoost;
use crate::error::StorageError;
use crate::sleep::Sleep;

/// Persisted base-energy row for one owner.
///
/// `restored_at` is the timestamp drain is measured from. It can be absent
/// on rows created before burndown existed; the engine initializes it on
/// first read.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BaseEnergyRow {
    pub amount: f64,
    pub cap: f64,
    pub restored_at: Option<DateTime<Utc>>,
}

/// Narrow persistence interface for the vitality engine.
///
/// Each write must be atomic per owner row; racing writers resolve
/// last-writer-wins (accepted weak consistency, not corrected here).
pub trait VitalityStore {
    /// Read the base-energy row; `None` means no data yet.
    fn get_base_energy(&self, owner_id: &str) -> Result<Option<BaseEnergyRow>, StorageError>;

    /// Persist the base-energy row (amount, cap, and drain timestamp) in a
    /// single atomic write.
    fn set_base_energy(
        &self,
        owner_id: &str,
        amount: f64,
        cap: f64,
        restored_at: DateTime<Utc>,
    ) -> Result<(), StorageError>;

    /// Every boost stored for the owner, regardless of decay state.
    fn list_boosts(&self, owner_id: &str) -> Result<Vec<EnergyBoost>, StorageError>;

    /// Coarse pre-filter: boosts not yet known to be depleted at `now`.
    /// The authoritative activity check is the decay model, not this query.
    fn list_undepleted_boosts(
        &self,
        owner_id: &str,
        now: DateTime<Utc>,
    ) -> Result<Vec<EnergyBoost>, StorageError>;

    fn save_boost(&self, boost: &EnergyBoost) -> Result<(), StorageError>;

    /// Housekeeping: delete boosts whose contribution provably reached zero
    /// at or before `instant`. Returns the number removed.
    fn delete_boosts_depleted_before(
        &self,
        owner_id: &str,
        instant: DateTime<Utc>,
    ) -> Result<usize, StorageError>;

    fn get_sleep(&self, owner_id: &str, date: NaiveDate) -> Result<Option<Sleep>, StorageError>;

    /// Insert or update by `(owner_id, date)`. An update keeps the original
    /// record id and `created_at`.
    fn upsert_sleep(&self, sleep: &Sleep) -> Result<(), StorageError>;

    /// Sleep history, newest first, optionally bounded by dates (inclusive).
    fn list_sleep(
        &self,
        owner_id: &str,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> Result<Vec<Sleep>, StorageError>;

    fn most_recent_sleep(&self, owner_id: &str) -> Result<Option<Sleep>, StorageError>;
}

/// External facts this engine consumes but never computes.
pub trait FactProvider {
    /// The owner's capacity score (operating stability).
    fn capacity(&self, owner_id: &str) -> Result<f64, StorageError>;

    /// Whether the owner is currently in burnout.
    fn in_burnout(&self, owner_id: &str) -> Result<bool, StorageError>;
}

/// Returns `~/.config/vitalis[-dev]/` based on VITALIS_ENV.
///
/// Set VITALIS_ENV=dev to use the development data directory.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf, std::io::Error> {
    let base_dir = dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config");

    let env = std::env::var("VITALIS_ENV").unwrap_or_else(|_| "production".to_string());

    let dir = if env == "dev" {
        base_dir.join("vitalis-dev")
    } else {
        base_dir.join("vitalis")
    };

    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}
