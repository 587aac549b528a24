//! SQLite-based storage for base energy, boosts, and sleep logs.
//!
//! Provides persistent storage for:
//! - The per-owner base-energy row (amount, cap, drain timestamp)
//! - Energy boosts with their precomputed depletion instants
//! - Sleep logs, one per owner per day
//! - Key-value store backing externally-seeded facts

use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

use super::{data_dir, BaseEnergyRow, FactProvider, VitalityStore};
use crate::energy::{BoostKind, EnergyBoost};
use crate::error::StorageError;
use crate::sleep::{Sleep, SleepQuality};

/// Format a timestamp as RFC 3339. With a fixed `+00:00` offset the string
/// ordering matches chronological order, so SQL range comparisons work on
/// the text column.
fn fmt_ts(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339()
}

fn parse_ts(table: &'static str, raw: &str) -> Result<DateTime<Utc>, StorageError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| StorageError::CorruptRow {
            table,
            message: format!("bad timestamp '{raw}': {e}"),
        })
}

fn parse_date(table: &'static str, raw: &str) -> Result<NaiveDate, StorageError> {
    raw.parse::<NaiveDate>().map_err(|e| StorageError::CorruptRow {
        table,
        message: format!("bad date '{raw}': {e}"),
    })
}

/// SQLite database implementing [`VitalityStore`].
pub struct Database {
    conn: Connection,
}

// Raw row shapes pulled out of query_map closures before domain conversion.
struct RawBoostRow {
    id: String,
    owner_id: String,
    kind: String,
    amount: f64,
    grace_duration_min: f64,
    decay_rate_per_hour: f64,
    created_at: String,
    expires_at: String,
}

struct RawSleepRow {
    id: String,
    owner_id: String,
    date: String,
    hours_slept: f64,
    quality: u8,
    bed_time: Option<String>,
    wake_time: Option<String>,
    energy_restored: f64,
    notes: Option<String>,
    created_at: String,
    updated_at: String,
}

const BOOST_COLUMNS: &str =
    "id, owner_id, kind, amount, grace_duration_min, decay_rate_per_hour, created_at, expires_at";

const SLEEP_COLUMNS: &str = "id, owner_id, date, hours_slept, quality, bed_time, wake_time, \
     energy_restored, notes, created_at, updated_at";

impl Database {
    /// Get a reference to the underlying SQLite connection.
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Open the database at `~/.config/vitalis/vitalis.db`.
    ///
    /// Creates the database file and schema if they don't exist.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open() -> Result<Self, StorageError> {
        let path = data_dir()?.join("vitalis.db");
        let conn = Connection::open(&path).map_err(|source| StorageError::OpenFailed {
            path: path.clone(),
            source,
        })?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    /// Open an in-memory database (for tests).
    pub fn open_memory() -> Result<Self, StorageError> {
        let conn = Connection::open_in_memory().map_err(StorageError::from)?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    fn migrate(&self) -> Result<(), StorageError> {
        self.conn
            .execute_batch(
                "CREATE TABLE IF NOT EXISTS base_energy (
                    owner_id    TEXT PRIMARY KEY,
                    amount      REAL NOT NULL,
                    cap         REAL NOT NULL,
                    restored_at TEXT
                );

                CREATE TABLE IF NOT EXISTS boosts (
                    id          TEXT PRIMARY KEY,
                    owner_id    TEXT NOT NULL,
                    kind        TEXT NOT NULL,
                    amount      REAL NOT NULL,
                    grace_duration_min  REAL NOT NULL,
                    decay_rate_per_hour REAL NOT NULL,
                    created_at  TEXT NOT NULL,
                    expires_at  TEXT NOT NULL,
                    depleted_at TEXT
                );

                CREATE TABLE IF NOT EXISTS sleep (
                    id          TEXT PRIMARY KEY,
                    owner_id    TEXT NOT NULL,
                    date        TEXT NOT NULL,
                    hours_slept REAL NOT NULL,
                    quality     INTEGER NOT NULL,
                    bed_time    TEXT,
                    wake_time   TEXT,
                    energy_restored REAL NOT NULL,
                    notes       TEXT,
                    created_at  TEXT NOT NULL,
                    updated_at  TEXT NOT NULL,
                    UNIQUE(owner_id, date)
                );

                CREATE TABLE IF NOT EXISTS kv (
                    key   TEXT PRIMARY KEY,
                    value TEXT NOT NULL
                );

                -- Indexes for the owner-scoped query patterns
                CREATE INDEX IF NOT EXISTS idx_boosts_owner ON boosts(owner_id);
                CREATE INDEX IF NOT EXISTS idx_boosts_owner_depleted
                    ON boosts(owner_id, depleted_at);
                CREATE INDEX IF NOT EXISTS idx_sleep_owner_date ON sleep(owner_id, date);",
            )
            .map_err(|e| StorageError::MigrationFailed(e.to_string()))
    }

    fn boost_from_raw(raw: RawBoostRow) -> Result<EnergyBoost, StorageError> {
        let id = Uuid::parse_str(&raw.id).map_err(|e| StorageError::CorruptRow {
            table: "boosts",
            message: format!("bad uuid '{}': {e}", raw.id),
        })?;
        let kind = BoostKind::parse(&raw.kind).ok_or_else(|| StorageError::CorruptRow {
            table: "boosts",
            message: format!("unknown boost kind '{}'", raw.kind),
        })?;
        Ok(EnergyBoost::from_persistence(
            id,
            raw.owner_id,
            kind,
            raw.amount,
            raw.grace_duration_min,
            raw.decay_rate_per_hour,
            parse_ts("boosts", &raw.created_at)?,
            parse_ts("boosts", &raw.expires_at)?,
        ))
    }

    fn sleep_from_raw(raw: RawSleepRow) -> Result<Sleep, StorageError> {
        let id = Uuid::parse_str(&raw.id).map_err(|e| StorageError::CorruptRow {
            table: "sleep",
            message: format!("bad uuid '{}': {e}", raw.id),
        })?;
        let quality = SleepQuality::new(raw.quality).map_err(|e| StorageError::CorruptRow {
            table: "sleep",
            message: e.to_string(),
        })?;
        let bed_time = raw
            .bed_time
            .as_deref()
            .map(|s| parse_ts("sleep", s))
            .transpose()?;
        let wake_time = raw
            .wake_time
            .as_deref()
            .map(|s| parse_ts("sleep", s))
            .transpose()?;

        Ok(Sleep {
            id,
            owner_id: raw.owner_id,
            date: parse_date("sleep", &raw.date)?,
            hours_slept: raw.hours_slept,
            quality,
            bed_time,
            wake_time,
            energy_restored: raw.energy_restored,
            notes: raw.notes,
            created_at: parse_ts("sleep", &raw.created_at)?,
            updated_at: parse_ts("sleep", &raw.updated_at)?,
        })
    }

    fn query_boosts(
        &self,
        sql: &str,
        params: &[&dyn rusqlite::ToSql],
    ) -> Result<Vec<EnergyBoost>, StorageError> {
        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt.query_map(params, |row| {
            Ok(RawBoostRow {
                id: row.get(0)?,
                owner_id: row.get(1)?,
                kind: row.get(2)?,
                amount: row.get(3)?,
                grace_duration_min: row.get(4)?,
                decay_rate_per_hour: row.get(5)?,
                created_at: row.get(6)?,
                expires_at: row.get(7)?,
            })
        })?;

        let mut boosts = Vec::new();
        for raw in rows {
            boosts.push(Self::boost_from_raw(raw?)?);
        }
        Ok(boosts)
    }

    fn query_sleep(
        &self,
        sql: &str,
        params: &[&dyn rusqlite::ToSql],
    ) -> Result<Vec<Sleep>, StorageError> {
        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt.query_map(params, |row| {
            Ok(RawSleepRow {
                id: row.get(0)?,
                owner_id: row.get(1)?,
                date: row.get(2)?,
                hours_slept: row.get(3)?,
                quality: row.get(4)?,
                bed_time: row.get(5)?,
                wake_time: row.get(6)?,
                energy_restored: row.get(7)?,
                notes: row.get(8)?,
                created_at: row.get(9)?,
                updated_at: row.get(10)?,
            })
        })?;

        let mut entries = Vec::new();
        for raw in rows {
            entries.push(Self::sleep_from_raw(raw?)?);
        }
        Ok(entries)
    }

    /// Get a value from the kv store.
    pub fn kv_get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let mut stmt = self.conn.prepare("SELECT value FROM kv WHERE key = ?1")?;
        let result = stmt
            .query_row(params![key], |row| row.get::<_, String>(0))
            .optional()?;
        Ok(result)
    }

    /// Set a value in the kv store.
    pub fn kv_set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.conn.execute(
            "INSERT OR REPLACE INTO kv (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
        Ok(())
    }
}

impl VitalityStore for Database {
    fn get_base_energy(&self, owner_id: &str) -> Result<Option<BaseEnergyRow>, StorageError> {
        let row = self
            .conn
            .query_row(
                "SELECT amount, cap, restored_at FROM base_energy WHERE owner_id = ?1",
                params![owner_id],
                |row| {
                    Ok((
                        row.get::<_, f64>(0)?,
                        row.get::<_, f64>(1)?,
                        row.get::<_, Option<String>>(2)?,
                    ))
                },
            )
            .optional()?;

        match row {
            None => Ok(None),
            Some((amount, cap, restored_at)) => {
                let restored_at = restored_at
                    .as_deref()
                    .map(|s| parse_ts("base_energy", s))
                    .transpose()?;
                Ok(Some(BaseEnergyRow {
                    amount,
                    cap,
                    restored_at,
                }))
            }
        }
    }

    fn set_base_energy(
        &self,
        owner_id: &str,
        amount: f64,
        cap: f64,
        restored_at: DateTime<Utc>,
    ) -> Result<(), StorageError> {
        // Single-statement upsert: the whole row changes or nothing does.
        self.conn.execute(
            "INSERT INTO base_energy (owner_id, amount, cap, restored_at)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(owner_id) DO UPDATE SET
                amount = excluded.amount,
                cap = excluded.cap,
                restored_at = excluded.restored_at",
            params![owner_id, amount, cap, fmt_ts(restored_at)],
        )?;
        Ok(())
    }

    fn list_boosts(&self, owner_id: &str) -> Result<Vec<EnergyBoost>, StorageError> {
        self.query_boosts(
            &format!("SELECT {BOOST_COLUMNS} FROM boosts WHERE owner_id = ?1 ORDER BY created_at"),
            &[&owner_id],
        )
    }

    fn list_undepleted_boosts(
        &self,
        owner_id: &str,
        now: DateTime<Utc>,
    ) -> Result<Vec<EnergyBoost>, StorageError> {
        self.query_boosts(
            &format!(
                "SELECT {BOOST_COLUMNS} FROM boosts
                 WHERE owner_id = ?1 AND (depleted_at IS NULL OR depleted_at > ?2)
                 ORDER BY created_at"
            ),
            &[&owner_id, &fmt_ts(now)],
        )
    }

    fn save_boost(&self, boost: &EnergyBoost) -> Result<(), StorageError> {
        // depleted_at is derived but deterministic, so it is precomputed
        // here to give the pre-filter and purge a plain indexed column.
        let depleted_at = boost.depleted_at().map(fmt_ts);
        self.conn.execute(
            "INSERT OR REPLACE INTO boosts
                (id, owner_id, kind, amount, grace_duration_min, decay_rate_per_hour,
                 created_at, expires_at, depleted_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                boost.id().to_string(),
                boost.owner_id(),
                boost.kind().as_str(),
                boost.amount(),
                boost.grace_duration_minutes(),
                boost.decay_rate_per_hour(),
                fmt_ts(boost.created_at()),
                fmt_ts(boost.expires_at()),
                depleted_at,
            ],
        )?;
        Ok(())
    }

    fn delete_boosts_depleted_before(
        &self,
        owner_id: &str,
        instant: DateTime<Utc>,
    ) -> Result<usize, StorageError> {
        let deleted = self.conn.execute(
            "DELETE FROM boosts
             WHERE owner_id = ?1 AND depleted_at IS NOT NULL AND depleted_at <= ?2",
            params![owner_id, fmt_ts(instant)],
        )?;
        Ok(deleted)
    }

    fn get_sleep(&self, owner_id: &str, date: NaiveDate) -> Result<Option<Sleep>, StorageError> {
        let mut entries = self.query_sleep(
            &format!("SELECT {SLEEP_COLUMNS} FROM sleep WHERE owner_id = ?1 AND date = ?2"),
            &[&owner_id, &date.to_string()],
        )?;
        Ok(entries.pop())
    }

    fn upsert_sleep(&self, sleep: &Sleep) -> Result<(), StorageError> {
        // On conflict the original id and created_at are kept; everything
        // else reflects the re-logged entry.
        self.conn.execute(
            "INSERT INTO sleep
                (id, owner_id, date, hours_slept, quality, bed_time, wake_time,
                 energy_restored, notes, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
             ON CONFLICT(owner_id, date) DO UPDATE SET
                hours_slept = excluded.hours_slept,
                quality = excluded.quality,
                bed_time = excluded.bed_time,
                wake_time = excluded.wake_time,
                energy_restored = excluded.energy_restored,
                notes = excluded.notes,
                updated_at = excluded.updated_at",
            params![
                sleep.id.to_string(),
                sleep.owner_id,
                sleep.date.to_string(),
                sleep.hours_slept,
                sleep.quality.value(),
                sleep.bed_time.map(fmt_ts),
                sleep.wake_time.map(fmt_ts),
                sleep.energy_restored,
                sleep.notes,
                fmt_ts(sleep.created_at),
                fmt_ts(sleep.updated_at),
            ],
        )?;
        Ok(())
    }

    fn list_sleep(
        &self,
        owner_id: &str,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> Result<Vec<Sleep>, StorageError> {
        let from = from.map(|d| d.to_string());
        let to = to.map(|d| d.to_string());
        match (&from, &to) {
            (Some(from), Some(to)) => self.query_sleep(
                &format!(
                    "SELECT {SLEEP_COLUMNS} FROM sleep
                     WHERE owner_id = ?1 AND date >= ?2 AND date <= ?3
                     ORDER BY date DESC"
                ),
                &[&owner_id, from, to],
            ),
            (Some(from), None) => self.query_sleep(
                &format!(
                    "SELECT {SLEEP_COLUMNS} FROM sleep
                     WHERE owner_id = ?1 AND date >= ?2 ORDER BY date DESC"
                ),
                &[&owner_id, from],
            ),
            (None, Some(to)) => self.query_sleep(
                &format!(
                    "SELECT {SLEEP_COLUMNS} FROM sleep
                     WHERE owner_id = ?1 AND date <= ?2 ORDER BY date DESC"
                ),
                &[&owner_id, to],
            ),
            (None, None) => self.query_sleep(
                &format!(
                    "SELECT {SLEEP_COLUMNS} FROM sleep WHERE owner_id = ?1 ORDER BY date DESC"
                ),
                &[&owner_id],
            ),
        }
    }

    fn most_recent_sleep(&self, owner_id: &str) -> Result<Option<Sleep>, StorageError> {
        let mut entries = self.query_sleep(
            &format!(
                "SELECT {SLEEP_COLUMNS} FROM sleep
                 WHERE owner_id = ?1 ORDER BY date DESC LIMIT 1"
            ),
            &[&owner_id],
        )?;
        Ok(entries.pop())
    }
}

/// [`FactProvider`] backed by the kv table.
///
/// Capacity and burnout are owned by another subsystem; this provider just
/// reads whatever that subsystem (or an operator) last seeded. Unseeded
/// owners default to capacity 60 (the 100-ceiling tier) and no burnout.
pub struct StoredFacts {
    db: Database,
}

impl StoredFacts {
    pub const DEFAULT_CAPACITY: f64 = 60.0;

    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Open against the default database location.
    pub fn open() -> Result<Self, StorageError> {
        Ok(Self::new(Database::open()?))
    }

    fn capacity_key(owner_id: &str) -> String {
        format!("capacity:{owner_id}")
    }

    fn burnout_key(owner_id: &str) -> String {
        format!("burnout:{owner_id}")
    }

    pub fn set_capacity(&self, owner_id: &str, capacity: f64) -> Result<(), StorageError> {
        self.db
            .kv_set(&Self::capacity_key(owner_id), &capacity.to_string())
    }

    pub fn set_burnout(&self, owner_id: &str, in_burnout: bool) -> Result<(), StorageError> {
        self.db
            .kv_set(&Self::burnout_key(owner_id), if in_burnout { "true" } else { "false" })
    }
}

impl FactProvider for StoredFacts {
    fn capacity(&self, owner_id: &str) -> Result<f64, StorageError> {
        match self.db.kv_get(&Self::capacity_key(owner_id))? {
            Some(raw) => raw.parse().map_err(|e| StorageError::CorruptRow {
                table: "kv",
                message: format!("bad capacity '{raw}': {e}"),
            }),
            None => Ok(Self::DEFAULT_CAPACITY),
        }
    }

    fn in_burnout(&self, owner_id: &str) -> Result<bool, StorageError> {
        match self.db.kv_get(&Self::burnout_key(owner_id))? {
            Some(raw) => Ok(raw == "true"),
            None => Ok(false),
        }
    }
}
