//! Temporary energy boosts and their decay model.
//!
//! A boost contributes its full amount during a grace window, then decays
//! linearly at its own rate. The contribution is always derived from the
//! clock -- it is never stored, so it can never go stale.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Result, ValidationError};

/// Kind of boost. All kinds share identical decay math; the label exists
/// for display and bookkeeping only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoostKind {
    Caffeine,
    Food,
    Supplement,
    Other,
}

impl BoostKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BoostKind::Caffeine => "caffeine",
            BoostKind::Food => "food",
            BoostKind::Supplement => "supplement",
            BoostKind::Other => "other",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "caffeine" => Some(BoostKind::Caffeine),
            "food" => Some(BoostKind::Food),
            "supplement" => Some(BoostKind::Supplement),
            "other" => Some(BoostKind::Other),
            _ => None,
        }
    }
}

/// A temporary additive energy bonus.
///
/// Created once with fixed parameters and never mutated -- only superseded
/// or deleted. Its current contribution is a derived read over `now`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnergyBoost {
    id: Uuid,
    owner_id: String,
    kind: BoostKind,
    amount: f64,
    grace_duration_minutes: f64,
    decay_rate_per_hour: f64,
    created_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
}

impl EnergyBoost {
    /// Create a new boost, validating all numeric parameters.
    ///
    /// # Errors
    /// Fails with a validation error if amount, grace duration, or decay
    /// rate is negative or non-finite.
    pub fn create(
        owner_id: &str,
        kind: BoostKind,
        amount: f64,
        grace_duration_minutes: f64,
        decay_rate_per_hour: f64,
        now: DateTime<Utc>,
    ) -> Result<Self, ValidationError> {
        if !amount.is_finite() || amount < 0.0 {
            return Err(ValidationError::invalid_value(
                "amount",
                format!("must be a non-negative finite number, got {amount}"),
            ));
        }
        if !grace_duration_minutes.is_finite() || grace_duration_minutes < 0.0 {
            return Err(ValidationError::invalid_value(
                "grace_duration_minutes",
                format!("must be a non-negative finite number, got {grace_duration_minutes}"),
            ));
        }
        if !decay_rate_per_hour.is_finite() || decay_rate_per_hour < 0.0 {
            return Err(ValidationError::invalid_value(
                "decay_rate_per_hour",
                format!("must be a non-negative finite number, got {decay_rate_per_hour}"),
            ));
        }

        let expires_at = now + Duration::milliseconds((grace_duration_minutes * 60_000.0) as i64);
        Ok(Self {
            id: Uuid::new_v4(),
            owner_id: owner_id.to_string(),
            kind,
            amount,
            grace_duration_minutes,
            decay_rate_per_hour,
            created_at: now,
            expires_at,
        })
    }

    /// Rehydrate a boost from persisted fields. Trusts storage; no
    /// re-validation beyond what the constructor already guaranteed.
    #[allow(clippy::too_many_arguments)]
    pub fn from_persistence(
        id: Uuid,
        owner_id: String,
        kind: BoostKind,
        amount: f64,
        grace_duration_minutes: f64,
        decay_rate_per_hour: f64,
        created_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            owner_id,
            kind,
            amount,
            grace_duration_minutes,
            decay_rate_per_hour,
            created_at,
            expires_at,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn owner_id(&self) -> &str {
        &self.owner_id
    }

    pub fn kind(&self) -> BoostKind {
        self.kind
    }

    /// Full bonus granted at creation (before any decay).
    pub fn amount(&self) -> f64 {
        self.amount
    }

    pub fn grace_duration_minutes(&self) -> f64 {
        self.grace_duration_minutes
    }

    pub fn decay_rate_per_hour(&self) -> f64 {
        self.decay_rate_per_hour
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// End of the grace window; decay starts here.
    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    /// Current contribution at `now`.
    ///
    /// Full `amount` while the grace window lasts, then linear decay at
    /// `decay_rate_per_hour`, floored at zero. A zero decay rate means the
    /// boost holds its full amount forever past expiry.
    pub fn current_contribution(&self, now: DateTime<Utc>) -> f64 {
        if now < self.expires_at {
            return self.amount;
        }
        let hours_since_expiry =
            (now - self.expires_at).num_milliseconds() as f64 / 3_600_000.0;
        let decayed = hours_since_expiry * self.decay_rate_per_hour;
        (self.amount - decayed).max(0.0)
    }

    /// Whether the boost still contributes anything at `now`.
    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        self.current_contribution(now) > 0.0
    }

    /// Instant the contribution reaches zero.
    ///
    /// `None` when it never will: a positive amount with a zero decay rate.
    /// A zero-amount boost is depleted from the moment it was created.
    pub fn depleted_at(&self) -> Option<DateTime<Utc>> {
        if self.amount == 0.0 {
            return Some(self.created_at);
        }
        if self.decay_rate_per_hour == 0.0 {
            return None;
        }
        let hours_to_zero = self.amount / self.decay_rate_per_hour;
        Some(self.expires_at + Duration::milliseconds((hours_to_zero * 3_600_000.0) as i64))
    }

    /// Minutes left in the grace window (0 once expired).
    pub fn time_until_expiry(&self, now: DateTime<Utc>) -> i64 {
        if now >= self.expires_at {
            return 0;
        }
        let ms = (self.expires_at - now).num_milliseconds();
        (ms + 59_999) / 60_000 // round up to the next whole minute
    }
}
