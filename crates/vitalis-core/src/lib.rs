//! # Vitalis Core Library
//!
//! This library provides the resource vitality engine: it tracks an
//! owner's renewable energy as a continuously draining quantity, restored
//! by sleep, topped up by temporary boosts with independent decay curves,
//! and capped by a capacity-derived ceiling that burnout can override.
//!
//! ## Architecture
//!
//! - **Pure calculators**: capacity tier resolution, sleep restoration,
//!   boost decay, and usable-energy aggregation are side-effect-free and
//!   take an explicit `now`
//! - **Engine**: [`VitalityEngine`] is the only stateful component; it
//!   reconstructs live energy lazily from the persisted snapshot and
//!   orchestrates the sleep/boost lifecycles
//! - **Storage**: narrow [`VitalityStore`] / [`FactProvider`] traits with a
//!   SQLite adapter and TOML-based configuration
//!
//! ## Key Components
//!
//! - [`VitalityEngine`]: live energy reconstruction and lifecycle managers
//! - [`VitalitySnapshot`]: the aggregate "how much energy right now" answer
//! - [`Database`]: SQLite persistence for energy, boosts, and sleep logs
//! - [`EngineConfig`]: burndown and boost-default tunables

pub mod capacity;
pub mod energy;
pub mod engine;
pub mod error;
pub mod sleep;
pub mod storage;
pub mod vitality;

pub use capacity::{resolve_ceiling, CapacityTier, BURNOUT_ENERGY_CAP};
pub use energy::{BaseEnergy, BoostKind, BurndownPolicy, BurndownReport, EnergyBoost, LinearBurndown};
pub use engine::VitalityEngine;
pub use error::{EngineError, StorageError, ValidationError};
pub use sleep::{calculate_restoration, Sleep, SleepCategory, SleepEntry, SleepQuality};
pub use storage::{
    BaseEnergyRow, Database, EngineConfig, FactProvider, StoredFacts, VitalityStore,
};
pub use vitality::{usable_energy, BoostContribution, VitalitySnapshot};
