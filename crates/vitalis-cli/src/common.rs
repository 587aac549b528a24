//! Shared helpers for CLI commands.

use vitalis_core::{Database, EngineConfig, StoredFacts, VitalityEngine};

/// Owner id: explicit flag, VITALIS_OWNER, or "default".
pub fn resolve_owner(flag: Option<String>) -> String {
    flag.or_else(|| std::env::var("VITALIS_OWNER").ok())
        .unwrap_or_else(|| "default".to_string())
}

/// Open the engine against the default database, with the configured
/// burndown rate.
pub fn open_engine(
) -> Result<VitalityEngine<Database, StoredFacts>, Box<dyn std::error::Error>> {
    let config = EngineConfig::load()?;
    Ok(VitalityEngine::with_burndown(
        Database::open()?,
        StoredFacts::open()?,
        Box::new(config.burndown_policy()),
    ))
}
