//! Usable-energy aggregation.
//!
//! Pure composition of base energy, active boost contributions, the
//! capacity ceiling, and the burnout override. Every boost in one
//! aggregation is evaluated against the same captured `now`; the clock is
//! never re-sampled per boost, so a snapshot is internally consistent.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::capacity::{CapacityTier, BURNOUT_ENERGY_CAP};
use crate::energy::{BoostKind, BurndownReport, EnergyBoost};

/// Final capped sum of base energy and active boost contributions.
///
/// Burnout shrinks the ceiling used for clamping to 40 -- it does not merely
/// shrink the result. Component non-negativity makes a floor unnecessary.
pub fn usable_energy(
    base_amount: f64,
    boosts: &[EnergyBoost],
    ceiling: f64,
    in_burnout: bool,
    now: DateTime<Utc>,
) -> f64 {
    let effective_ceiling = if in_burnout {
        BURNOUT_ENERGY_CAP
    } else {
        ceiling
    };
    let boosted: f64 = boosts.iter().map(|b| b.current_contribution(now)).sum();
    (base_amount + boosted).min(effective_ceiling)
}

/// One boost's standing within a snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoostContribution {
    pub id: Uuid,
    pub kind: BoostKind,
    /// Contribution at the snapshot's `as_of` instant
    pub contribution: f64,
    pub expires_at: DateTime<Utc>,
    pub minutes_until_expiry: i64,
}

/// The aggregate answer to "how much energy does this owner have right now".
///
/// Entirely derived and never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VitalitySnapshot {
    pub owner_id: String,
    /// Live base energy after burndown
    pub base_energy: f64,
    pub capacity: f64,
    pub ceiling: f64,
    pub xp_efficiency: f64,
    pub in_burnout: bool,
    pub boosts: Vec<BoostContribution>,
    pub usable_energy: f64,
    /// Base energy as a percentage of the ceiling (0 when ceiling is 0)
    pub base_energy_percentage: f64,
    pub burndown: BurndownReport,
    /// The single instant every time-dependent value above was evaluated at
    pub as_of: DateTime<Utc>,
}

impl VitalitySnapshot {
    /// Fold the components into a snapshot, evaluating every boost at the
    /// one captured `now`.
    pub fn build(
        owner_id: &str,
        base_energy: f64,
        capacity: f64,
        tier: CapacityTier,
        in_burnout: bool,
        boosts: &[EnergyBoost],
        burndown: BurndownReport,
        now: DateTime<Utc>,
    ) -> Self {
        let usable = usable_energy(base_energy, boosts, tier.ceiling, in_burnout, now);
        let contributions = boosts
            .iter()
            .filter(|b| b.is_active(now))
            .map(|b| BoostContribution {
                id: b.id(),
                kind: b.kind(),
                contribution: b.current_contribution(now),
                expires_at: b.expires_at(),
                minutes_until_expiry: b.time_until_expiry(now),
            })
            .collect();

        let base_energy_percentage = if tier.ceiling > 0.0 {
            base_energy / tier.ceiling * 100.0
        } else {
            0.0
        };

        Self {
            owner_id: owner_id.to_string(),
            base_energy,
            capacity,
            ceiling: tier.ceiling,
            xp_efficiency: tier.xp_efficiency,
            in_burnout,
            boosts: contributions,
            usable_energy: usable,
            base_energy_percentage,
            burndown,
            as_of: now,
        }
    }
}
