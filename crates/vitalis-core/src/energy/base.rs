//! Base energy value object and burndown policy.
//!
//! Base energy drains continuously from the moment it was last restored.
//! The persisted row only stores `(amount, cap, restored_at)`; the present
//! value is always reconstructed from elapsed wall-clock time.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::capacity::MAX_ENERGY_CEILING;
use crate::error::{EngineError, Result};

/// Immutable base-energy snapshot.
///
/// Invariant: `0 <= amount <= cap` and `0 <= cap <= 110`. A new instance
/// replaces the old on every change; there are no setters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BaseEnergy {
    amount: f64,
    cap: f64,
}

impl BaseEnergy {
    /// Construct a snapshot, enforcing the `amount <= cap` invariant.
    ///
    /// # Errors
    /// Returns `EngineError::Invariant` on violation; this is a programming
    /// error, not recoverable input.
    pub fn new(amount: f64, cap: f64) -> Result<Self> {
        if !cap.is_finite() || !(0.0..=MAX_ENERGY_CEILING).contains(&cap) {
            return Err(EngineError::Invariant(format!(
                "base energy cap must be within [0, {MAX_ENERGY_CEILING}], got {cap}"
            )));
        }
        if !amount.is_finite() || amount < 0.0 || amount > cap {
            return Err(EngineError::Invariant(format!(
                "base energy amount must be within [0, {cap}], got {amount}"
            )));
        }
        Ok(Self { amount, cap })
    }

    pub fn amount(&self) -> f64 {
        self.amount
    }

    pub fn cap(&self) -> f64 {
        self.cap
    }
}

/// Live burndown report for one owner's base energy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BurndownReport {
    /// Present energy after drain (floored to a whole point)
    pub current_energy: f64,
    /// Energy at the last restoration event
    pub restored_energy: f64,
    /// Whole points drained since restoration
    pub energy_decayed: f64,
    /// Elapsed time since restoration, in hours (2 decimal places)
    pub hours_elapsed: f64,
    /// Drain rate in energy per hour
    pub decay_rate_per_hour: f64,
    /// Hours until the reserve hits zero; `None` once depleted
    pub hours_until_depletion: Option<f64>,
    /// Instant the reserve hits zero; `None` once depleted
    pub depleted_at: Option<DateTime<Utc>>,
}

/// Drain policy applied when reconstructing base energy from its last
/// persisted snapshot. Collaborator seam: the engine never assumes a
/// particular curve.
pub trait BurndownPolicy {
    /// Present amount after draining `restored_amount` from `restored_at`
    /// to `now`. Must be non-negative and never exceed `restored_amount`.
    fn current_amount(
        &self,
        restored_amount: f64,
        restored_at: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> f64;

    /// Full burndown report, including depletion forecast.
    fn report(
        &self,
        restored_amount: f64,
        restored_at: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> BurndownReport;
}

/// Linear drain at a fixed rate per hour.
///
/// The default rate of 2.0/h depletes a full 100-point reserve in ~48 hours.
/// Amounts are floored on read so displayed energy moves in whole points.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct LinearBurndown {
    pub rate_per_hour: f64,
}

impl Default for LinearBurndown {
    fn default() -> Self {
        Self { rate_per_hour: 2.0 }
    }
}

impl LinearBurndown {
    pub fn new(rate_per_hour: f64) -> Self {
        Self { rate_per_hour }
    }

    fn hours_elapsed(restored_at: DateTime<Utc>, now: DateTime<Utc>) -> f64 {
        let elapsed: Duration = now - restored_at;
        // Guard against a restored_at in the future (clock skew): energy
        // never rises from drain.
        (elapsed.num_milliseconds() as f64 / 3_600_000.0).max(0.0)
    }
}

impl BurndownPolicy for LinearBurndown {
    fn current_amount(
        &self,
        restored_amount: f64,
        restored_at: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> f64 {
        let decayed = Self::hours_elapsed(restored_at, now) * self.rate_per_hour;
        (restored_amount - decayed).max(0.0).floor()
    }

    fn report(
        &self,
        restored_amount: f64,
        restored_at: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> BurndownReport {
        let hours_elapsed = Self::hours_elapsed(restored_at, now);
        let decayed = hours_elapsed * self.rate_per_hour;
        let remaining = (restored_amount - decayed).max(0.0);

        let hours_until_depletion = if remaining > 0.0 && self.rate_per_hour > 0.0 {
            Some(remaining / self.rate_per_hour)
        } else {
            None
        };
        let depleted_at = hours_until_depletion
            .map(|h| now + Duration::milliseconds((h * 3_600_000.0) as i64));

        BurndownReport {
            current_energy: remaining.floor(),
            restored_energy: restored_amount,
            energy_decayed: decayed.min(restored_amount).floor(),
            hours_elapsed: (hours_elapsed * 100.0).round() / 100.0,
            decay_rate_per_hour: self.rate_per_hour,
            hours_until_depletion: hours_until_depletion.map(|h| (h * 100.0).round() / 100.0),
            depleted_at,
        }
    }
}
