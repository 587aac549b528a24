//! The vitality engine: live energy reconstruction and lifecycle management.
//!
//! This is the only component that touches "now" and persisted state
//! together. Everything time-dependent is reconstructed lazily from the
//! stored `(amount, cap, restored_at)` row -- energy keeps draining between
//! observations without any background work.
//!
//! Reads are idempotent: drain is computed from elapsed time since the
//! *stored* timestamp, and a read never rewrites that timestamp. Only a
//! restoration event does, which is exactly what makes subsequent drain
//! calculations correct.

use chrono::{DateTime, NaiveDate, Utc};
use tracing::{debug, info};

use crate::capacity::resolve_ceiling;
use crate::energy::{BaseEnergy, BoostKind, BurndownPolicy, EnergyBoost, LinearBurndown};
use crate::error::{EngineError, Result, ValidationError};
use crate::sleep::{Sleep, SleepEntry};
use crate::storage::{BaseEnergyRow, FactProvider, VitalityStore};
use crate::vitality::VitalitySnapshot;

/// Stateful orchestrator over a storage collaborator and a fact provider.
///
/// All public operations sample the clock exactly once and pass that
/// instant through every calculation; `_at` variants take an explicit `now`
/// and exist for deterministic callers and tests.
pub struct VitalityEngine<S: VitalityStore, F: FactProvider> {
    store: S,
    facts: F,
    burndown: Box<dyn BurndownPolicy + Send + Sync>,
}

impl<S: VitalityStore, F: FactProvider> VitalityEngine<S, F> {
    /// Build an engine with the default linear burndown (2.0 energy/hour).
    pub fn new(store: S, facts: F) -> Self {
        Self::with_burndown(store, facts, Box::new(LinearBurndown::default()))
    }

    pub fn with_burndown(
        store: S,
        facts: F,
        burndown: Box<dyn BurndownPolicy + Send + Sync>,
    ) -> Self {
        Self {
            store,
            facts,
            burndown,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn facts(&self) -> &F {
        &self.facts
    }

    /// Create the owner's base-energy row.
    ///
    /// The amount is validated, then capped at the owner's current ceiling.
    pub fn init_base_energy(&self, owner_id: &str, amount: f64) -> Result<BaseEnergy> {
        self.init_base_energy_at(owner_id, amount, Utc::now())
    }

    pub fn init_base_energy_at(
        &self,
        owner_id: &str,
        amount: f64,
        now: DateTime<Utc>,
    ) -> Result<BaseEnergy> {
        if !amount.is_finite() || amount < 0.0 {
            return Err(ValidationError::invalid_value(
                "amount",
                format!("must be a non-negative finite number, got {amount}"),
            )
            .into());
        }
        let tier = resolve_ceiling(self.facts.capacity(owner_id)?);
        let amount = amount.min(tier.ceiling);
        self.store
            .set_base_energy(owner_id, amount, tier.ceiling, now)?;
        info!(owner_id, amount, ceiling = tier.ceiling, "initialized base energy");
        BaseEnergy::new(amount, tier.ceiling)
    }

    /// Fetch the stored row and the timestamp drain is measured from.
    ///
    /// Rows written before burndown existed carry no timestamp; those are
    /// initialized to `now` and persisted once, after which the row behaves
    /// like any other.
    fn live_row(&self, owner_id: &str, now: DateTime<Utc>) -> Result<(BaseEnergyRow, DateTime<Utc>)> {
        let row = self
            .store
            .get_base_energy(owner_id)?
            .ok_or_else(|| EngineError::NotFound {
                resource: "base energy",
                owner_id: owner_id.to_string(),
            })?;

        let restored_at = match row.restored_at {
            Some(ts) => ts,
            None => {
                debug!(owner_id, "base energy row had no drain timestamp; initializing");
                self.store
                    .set_base_energy(owner_id, row.amount, row.cap, now)?;
                now
            }
        };
        Ok((row, restored_at))
    }

    /// Reconstruct the present base energy from the persisted snapshot.
    ///
    /// Applies the burndown policy over elapsed time. Does *not* cap to the
    /// live capacity ceiling -- that belongs to aggregation.
    pub fn reconstruct(&self, owner_id: &str) -> Result<BaseEnergy> {
        self.reconstruct_at(owner_id, Utc::now())
    }

    pub fn reconstruct_at(&self, owner_id: &str, now: DateTime<Utc>) -> Result<BaseEnergy> {
        let (row, restored_at) = self.live_row(owner_id, now)?;
        let current = self.burndown.current_amount(row.amount, restored_at, now);
        debug!(owner_id, stored = row.amount, current, "reconstructed base energy");
        BaseEnergy::new(current.min(row.cap), row.cap)
    }

    /// Apply a restoration delta to the live base energy.
    ///
    /// Reconstructs first, adds `delta` (negative deltas correct earlier
    /// credits), clamps to `[0, ceiling]`, then persists the new amount and
    /// resets the drain timestamp to `now` in one write.
    pub fn apply_restoration(&self, owner_id: &str, delta: f64) -> Result<BaseEnergy> {
        self.apply_restoration_at(owner_id, delta, Utc::now())
    }

    pub fn apply_restoration_at(
        &self,
        owner_id: &str,
        delta: f64,
        now: DateTime<Utc>,
    ) -> Result<BaseEnergy> {
        if !delta.is_finite() {
            return Err(
                ValidationError::invalid_value("delta", "must be a finite number").into(),
            );
        }
        let current = self.reconstruct_at(owner_id, now)?;
        let tier = resolve_ceiling(self.facts.capacity(owner_id)?);
        let new_amount = (current.amount() + delta).clamp(0.0, tier.ceiling);

        self.store
            .set_base_energy(owner_id, new_amount, tier.ceiling, now)?;
        info!(
            owner_id,
            delta,
            from = current.amount(),
            to = new_amount,
            "applied restoration"
        );
        BaseEnergy::new(new_amount, tier.ceiling)
    }

    /// Log (or re-log) a night of sleep and apply its restoration.
    ///
    /// One entry exists per `(owner, date)`. A re-log recomputes the
    /// frozen restoration from the new inputs and applies only the *delta*
    /// against what the earlier entry already credited, so editing a day
    /// converges instead of double-counting.
    pub fn log_sleep(&self, owner_id: &str, entry: &SleepEntry) -> Result<Sleep> {
        self.log_sleep_at(owner_id, entry, Utc::now())
    }

    pub fn log_sleep_at(
        &self,
        owner_id: &str,
        entry: &SleepEntry,
        now: DateTime<Utc>,
    ) -> Result<Sleep> {
        let tier = resolve_ceiling(self.facts.capacity(owner_id)?);

        let mut sleep = Sleep::create(owner_id, entry, tier.ceiling, now)?;

        // Fail before any write if the owner has no base-energy row.
        let current = self.reconstruct_at(owner_id, now)?;

        let existing = self.store.get_sleep(owner_id, entry.date)?;
        let previously_credited = match &existing {
            Some(prev) => {
                sleep.id = prev.id;
                sleep.created_at = prev.created_at;
                prev.energy_restored
            }
            None => 0.0,
        };

        self.store.upsert_sleep(&sleep)?;

        let delta = sleep.energy_restored - previously_credited;
        let new_amount = (current.amount() + delta).clamp(0.0, tier.ceiling);
        self.store
            .set_base_energy(owner_id, new_amount, tier.ceiling, now)?;

        info!(
            owner_id,
            date = %sleep.date,
            restored = sleep.energy_restored,
            delta,
            relog = existing.is_some(),
            "logged sleep"
        );
        Ok(sleep)
    }

    /// Create and persist a boost.
    pub fn create_boost(
        &self,
        owner_id: &str,
        kind: BoostKind,
        amount: f64,
        grace_duration_minutes: f64,
        decay_rate_per_hour: f64,
    ) -> Result<EnergyBoost> {
        self.create_boost_at(
            owner_id,
            kind,
            amount,
            grace_duration_minutes,
            decay_rate_per_hour,
            Utc::now(),
        )
    }

    pub fn create_boost_at(
        &self,
        owner_id: &str,
        kind: BoostKind,
        amount: f64,
        grace_duration_minutes: f64,
        decay_rate_per_hour: f64,
        now: DateTime<Utc>,
    ) -> Result<EnergyBoost> {
        let boost = EnergyBoost::create(
            owner_id,
            kind,
            amount,
            grace_duration_minutes,
            decay_rate_per_hour,
            now,
        )?;
        self.store.save_boost(&boost)?;
        info!(owner_id, kind = kind.as_str(), amount, "created boost");
        Ok(boost)
    }

    /// Boosts still contributing at `now`.
    ///
    /// Storage pre-filters on the precomputed depletion instant; the decay
    /// model stays the authoritative check.
    pub fn list_active_boosts(&self, owner_id: &str) -> Result<Vec<EnergyBoost>> {
        self.list_active_boosts_at(owner_id, Utc::now())
    }

    pub fn list_active_boosts_at(
        &self,
        owner_id: &str,
        now: DateTime<Utc>,
    ) -> Result<Vec<EnergyBoost>> {
        let boosts = self.store.list_undepleted_boosts(owner_id, now)?;
        Ok(boosts.into_iter().filter(|b| b.is_active(now)).collect())
    }

    /// Housekeeping: drop boosts whose contribution has provably reached
    /// zero. Never part of any value computation; past aggregations are
    /// unaffected by their absence.
    pub fn purge_depleted_boosts(&self, owner_id: &str) -> Result<usize> {
        self.purge_depleted_boosts_at(owner_id, Utc::now())
    }

    pub fn purge_depleted_boosts_at(
        &self,
        owner_id: &str,
        now: DateTime<Utc>,
    ) -> Result<usize> {
        let purged = self.store.delete_boosts_depleted_before(owner_id, now)?;
        if purged > 0 {
            info!(owner_id, purged, "purged depleted boosts");
        }
        Ok(purged)
    }

    /// The aggregate answer: usable energy and everything behind it,
    /// evaluated at one consistent instant.
    pub fn status(&self, owner_id: &str) -> Result<VitalitySnapshot> {
        self.status_at(owner_id, Utc::now())
    }

    pub fn status_at(&self, owner_id: &str, now: DateTime<Utc>) -> Result<VitalitySnapshot> {
        let (row, restored_at) = self.live_row(owner_id, now)?;
        let report = self.burndown.report(row.amount, restored_at, now);
        let base = self
            .burndown
            .current_amount(row.amount, restored_at, now)
            .min(row.cap);

        let capacity = self.facts.capacity(owner_id)?;
        let tier = resolve_ceiling(capacity);
        let in_burnout = self.facts.in_burnout(owner_id)?;
        let boosts = self.list_active_boosts_at(owner_id, now)?;

        Ok(VitalitySnapshot::build(
            owner_id, base, capacity, tier, in_burnout, &boosts, report, now,
        ))
    }

    /// Sleep history, newest first, optionally bounded by dates.
    pub fn sleep_history(
        &self,
        owner_id: &str,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> Result<Vec<Sleep>> {
        Ok(self.store.list_sleep(owner_id, from, to)?)
    }

    pub fn most_recent_sleep(&self, owner_id: &str) -> Result<Option<Sleep>> {
        Ok(self.store.most_recent_sleep(owner_id)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capacity::BURNOUT_ENERGY_CAP;
    use crate::error::StorageError;
    use crate::storage::Database;
    use chrono::Duration;
    use std::cell::Cell;

    const OWNER: &str = "owner-1";

    /// Facts provider with directly settable values.
    struct FakeFacts {
        capacity: Cell<f64>,
        burnout: Cell<bool>,
    }

    impl FakeFacts {
        fn new(capacity: f64) -> Self {
            Self {
                capacity: Cell::new(capacity),
                burnout: Cell::new(false),
            }
        }
    }

    impl FactProvider for FakeFacts {
        fn capacity(&self, _owner_id: &str) -> Result<f64, StorageError> {
            Ok(self.capacity.get())
        }

        fn in_burnout(&self, _owner_id: &str) -> Result<bool, StorageError> {
            Ok(self.burnout.get())
        }
    }

    fn engine(capacity: f64) -> VitalityEngine<Database, FakeFacts> {
        VitalityEngine::new(Database::open_memory().unwrap(), FakeFacts::new(capacity))
    }

    fn entry(date: NaiveDate, hours: f64, quality: u8) -> SleepEntry {
        SleepEntry {
            date,
            hours_slept: hours,
            quality,
            bed_time: None,
            wake_time: None,
            notes: None,
        }
    }

    #[test]
    fn reconstruct_without_row_is_not_found() {
        let engine = engine(60.0);
        assert!(matches!(
            engine.reconstruct(OWNER),
            Err(EngineError::NotFound { .. })
        ));
    }

    #[test]
    fn init_caps_at_ceiling() {
        let engine = engine(25.0); // ceiling 70
        let base = engine.init_base_energy(OWNER, 200.0).unwrap();
        assert_eq!(base.amount(), 70.0);
        assert_eq!(base.cap(), 70.0);

        assert!(engine.init_base_energy(OWNER, -5.0).is_err());
    }

    #[test]
    fn reconstruct_drains_and_is_idempotent() {
        let engine = engine(60.0);
        let t0 = Utc::now();
        engine.init_base_energy_at(OWNER, 100.0, t0).unwrap();

        // Same instant, twice: same answer, no drift
        let later = t0 + Duration::hours(10);
        let first = engine.reconstruct_at(OWNER, later).unwrap();
        let second = engine.reconstruct_at(OWNER, later).unwrap();
        assert_eq!(first.amount(), 80.0);
        assert_eq!(first, second);

        // A read did not rewrite the drain timestamp
        let even_later = t0 + Duration::hours(20);
        assert_eq!(engine.reconstruct_at(OWNER, even_later).unwrap().amount(), 60.0);
    }

    #[test]
    fn legacy_row_without_timestamp_is_initialized_once() {
        let db = Database::open_memory().unwrap();
        db.conn()
            .execute(
                "INSERT INTO base_energy (owner_id, amount, cap, restored_at)
                 VALUES (?1, 88.0, 100.0, NULL)",
                rusqlite::params![OWNER],
            )
            .unwrap();
        let engine = VitalityEngine::new(db, FakeFacts::new(60.0));

        let t0 = Utc::now();
        // First read initializes the timestamp; no drain yet
        assert_eq!(engine.reconstruct_at(OWNER, t0).unwrap().amount(), 88.0);
        // Drain now runs from t0
        let later = t0 + Duration::hours(4);
        assert_eq!(engine.reconstruct_at(OWNER, later).unwrap().amount(), 80.0);
    }

    #[test]
    fn restoration_resets_the_drain_clock() {
        let engine = engine(60.0);
        let t0 = Utc::now();
        engine.init_base_energy_at(OWNER, 50.0, t0).unwrap();

        // 10h later: 50 - 20 = 30, then +31 restored = 61, clock reset
        let t1 = t0 + Duration::hours(10);
        let restored = engine.apply_restoration_at(OWNER, 31.0, t1).unwrap();
        assert_eq!(restored.amount(), 61.0);

        // Drain measured from t1, not t0
        let t2 = t1 + Duration::hours(5);
        assert_eq!(engine.reconstruct_at(OWNER, t2).unwrap().amount(), 51.0);
    }

    #[test]
    fn restoration_clamps_to_ceiling_and_floor() {
        let engine = engine(60.0); // ceiling 100
        let t0 = Utc::now();
        engine.init_base_energy_at(OWNER, 90.0, t0).unwrap();

        let up = engine.apply_restoration_at(OWNER, 50.0, t0).unwrap();
        assert_eq!(up.amount(), 100.0);

        let down = engine.apply_restoration_at(OWNER, -500.0, t0).unwrap();
        assert_eq!(down.amount(), 0.0);

        assert!(engine.apply_restoration_at(OWNER, f64::NAN, t0).is_err());
    }

    #[test]
    fn log_sleep_applies_restoration_once() {
        let engine = engine(60.0);
        let t0 = Utc::now();
        engine.init_base_energy_at(OWNER, 50.0, t0).unwrap();

        let date = NaiveDate::from_ymd_opt(2025, 3, 10).unwrap();
        let sleep = engine
            .log_sleep_at(OWNER, &entry(date, 8.0, 9), t0)
            .unwrap();
        assert_eq!(sleep.energy_restored, 31.0);
        assert_eq!(engine.reconstruct_at(OWNER, t0).unwrap().amount(), 81.0);
    }

    #[test]
    fn relog_applies_only_the_delta() {
        let engine = engine(60.0);
        let t0 = Utc::now();
        engine.init_base_energy_at(OWNER, 50.0, t0).unwrap();

        let date = NaiveDate::from_ymd_opt(2025, 3, 10).unwrap();
        let first = engine
            .log_sleep_at(OWNER, &entry(date, 8.0, 9), t0)
            .unwrap();
        assert_eq!(engine.reconstruct_at(OWNER, t0).unwrap().amount(), 81.0);

        // Re-log the same day as a worse night: 6h * 1.0 = 6 restored.
        // Delta is 6 - 31 = -25, not another +6.
        let second = engine
            .log_sleep_at(OWNER, &entry(date, 6.0, 5), t0)
            .unwrap();
        assert_eq!(second.energy_restored, 6.0);
        assert_eq!(second.id, first.id);
        assert_eq!(engine.reconstruct_at(OWNER, t0).unwrap().amount(), 56.0);

        // Still one entry for the day
        assert_eq!(engine.sleep_history(OWNER, None, None).unwrap().len(), 1);
    }

    #[test]
    fn log_sleep_rejects_invalid_hours() {
        let engine = engine(60.0);
        let t0 = Utc::now();
        engine.init_base_energy_at(OWNER, 50.0, t0).unwrap();

        let date = NaiveDate::from_ymd_opt(2025, 3, 10).unwrap();
        let err = engine.log_sleep_at(OWNER, &entry(date, 25.0, 5), t0);
        assert!(matches!(err, Err(EngineError::Validation(_))));
        // Nothing was written
        assert!(engine.sleep_history(OWNER, None, None).unwrap().is_empty());
        assert_eq!(engine.reconstruct_at(OWNER, t0).unwrap().amount(), 50.0);
    }

    #[test]
    fn log_sleep_without_base_row_leaves_no_partial_state() {
        let engine = engine(60.0);
        let date = NaiveDate::from_ymd_opt(2025, 3, 10).unwrap();
        let err = engine.log_sleep(OWNER, &entry(date, 8.0, 9));
        assert!(matches!(err, Err(EngineError::NotFound { .. })));
        assert!(engine.sleep_history(OWNER, None, None).unwrap().is_empty());
    }

    #[test]
    fn boost_lifecycle() {
        let engine = engine(60.0);
        let t0 = Utc::now();

        let boost = engine
            .create_boost_at(OWNER, BoostKind::Caffeine, 20.0, 60.0, 10.0, t0)
            .unwrap();
        assert_eq!(boost.amount(), 20.0);

        // Active during grace and decay, gone afterward
        assert_eq!(
            engine
                .list_active_boosts_at(OWNER, t0 + Duration::minutes(90))
                .unwrap()
                .len(),
            1
        );
        assert!(engine
            .list_active_boosts_at(OWNER, t0 + Duration::hours(4))
            .unwrap()
            .is_empty());

        // Purge drops it once depleted
        assert_eq!(engine.purge_depleted_boosts_at(OWNER, t0).unwrap(), 0);
        assert_eq!(
            engine
                .purge_depleted_boosts_at(OWNER, t0 + Duration::hours(4))
                .unwrap(),
            1
        );
    }

    #[test]
    fn purge_never_touches_zero_decay_boosts() {
        let engine = engine(60.0);
        let t0 = Utc::now();
        engine
            .create_boost_at(OWNER, BoostKind::Supplement, 5.0, 0.0, 0.0, t0)
            .unwrap();

        let far = t0 + Duration::days(400);
        assert_eq!(engine.purge_depleted_boosts_at(OWNER, far).unwrap(), 0);
        assert_eq!(engine.list_active_boosts_at(OWNER, far).unwrap().len(), 1);
    }

    #[test]
    fn status_aggregates_at_one_instant() {
        let engine = engine(80.0); // ceiling 110, efficiency 1.10
        let t0 = Utc::now();
        engine.init_base_energy_at(OWNER, 50.0, t0).unwrap();
        engine
            .create_boost_at(OWNER, BoostKind::Caffeine, 20.0, 60.0, 10.0, t0)
            .unwrap();

        // 90 minutes in: base 50 - 3 = 47, boost contributes 15
        let now = t0 + Duration::minutes(90);
        let snapshot = engine.status_at(OWNER, now).unwrap();
        assert_eq!(snapshot.base_energy, 47.0);
        assert_eq!(snapshot.boosts.len(), 1);
        assert_eq!(snapshot.boosts[0].contribution, 15.0);
        assert_eq!(snapshot.usable_energy, 62.0);
        assert_eq!(snapshot.ceiling, 110.0);
        assert_eq!(snapshot.xp_efficiency, 1.10);
        assert_eq!(snapshot.as_of, now);
    }

    #[test]
    fn status_under_burnout_caps_at_40() {
        let engine = engine(80.0);
        engine.facts().burnout.set(true);
        let t0 = Utc::now();
        engine.init_base_energy_at(OWNER, 50.0, t0).unwrap();
        engine
            .create_boost_at(OWNER, BoostKind::Food, 30.0, 60.0, 10.0, t0)
            .unwrap();

        let snapshot = engine.status_at(OWNER, t0).unwrap();
        assert!(snapshot.in_burnout);
        assert_eq!(snapshot.usable_energy, BURNOUT_ENERGY_CAP);
        // The tier ceiling is still reported; only clamping changed
        assert_eq!(snapshot.ceiling, 110.0);
    }

    #[test]
    fn round_trip_restore_then_reconstruct() {
        let engine = engine(60.0); // ceiling 100
        let t0 = Utc::now();
        engine.init_base_energy_at(OWNER, 80.0, t0).unwrap();

        // calculate + apply + reconstruct == min(prior + restoration, ceiling)
        let quality = crate::sleep::SleepQuality::new(9).unwrap();
        let restoration = crate::sleep::calculate_restoration(8.0, quality, 100.0).unwrap();
        engine.apply_restoration_at(OWNER, restoration, t0).unwrap();
        assert_eq!(
            engine.reconstruct_at(OWNER, t0).unwrap().amount(),
            (80.0 + restoration).min(100.0)
        );
    }
}
