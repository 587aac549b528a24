//! Energy domain types.
//!
//! Base energy is the owner's persistent, slowly-draining reserve; boosts
//! are temporary additive bonuses with a grace period followed by linear
//! decay. Both expose their current value as a derived, time-dependent read
//! over an explicit `now` -- nothing here caches "current" state.

mod base;
mod boost;

pub use base::{BaseEnergy, BurndownPolicy, BurndownReport, LinearBurndown};
pub use boost::{BoostKind, EnergyBoost};
