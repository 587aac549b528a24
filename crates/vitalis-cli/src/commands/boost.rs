//! Boost management commands.

use clap::Subcommand;

use vitalis_core::{BoostKind, EngineConfig};

use crate::common::{open_engine, resolve_owner};

#[derive(Subcommand)]
pub enum BoostAction {
    /// Add a temporary energy boost
    Add {
        #[arg(long)]
        owner: Option<String>,
        /// caffeine, food, supplement, or other
        #[arg(long)]
        kind: String,
        /// Energy added while active
        #[arg(long)]
        amount: f64,
        /// Minutes before decay starts (default from config)
        #[arg(long)]
        grace: Option<f64>,
        /// Energy lost per hour after the grace window (default from config)
        #[arg(long)]
        decay: Option<f64>,
    },
    /// List boosts still contributing energy
    List {
        #[arg(long)]
        owner: Option<String>,
    },
    /// Delete boosts that have fully decayed
    Cleanup {
        #[arg(long)]
        owner: Option<String>,
    },
}

pub fn run(action: BoostAction) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        BoostAction::Add {
            owner,
            kind,
            amount,
            grace,
            decay,
        } => add(owner, kind, amount, grace, decay),
        BoostAction::List { owner } => list(owner),
        BoostAction::Cleanup { owner } => cleanup(owner),
    }
}

fn add(
    owner: Option<String>,
    kind: String,
    amount: f64,
    grace: Option<f64>,
    decay: Option<f64>,
) -> Result<(), Box<dyn std::error::Error>> {
    let owner = resolve_owner(owner);
    let kind = BoostKind::parse(&kind)
        .ok_or_else(|| format!("invalid kind '{kind}', expected caffeine/food/supplement/other"))?;

    let config = EngineConfig::load()?;
    let grace = grace.unwrap_or(config.boost_defaults.grace_duration_minutes);
    let decay = decay.unwrap_or(config.boost_defaults.decay_rate_per_hour);

    let engine = open_engine()?;
    let boost = engine.create_boost(&owner, kind, amount, grace, decay)?;
    println!(
        "Added {} boost: +{:.0} energy for {:.0} min, then -{:.0}/h",
        boost.kind().as_str(),
        boost.amount(),
        boost.grace_duration_minutes(),
        boost.decay_rate_per_hour()
    );
    Ok(())
}

fn list(owner: Option<String>) -> Result<(), Box<dyn std::error::Error>> {
    let owner = resolve_owner(owner);
    let engine = open_engine()?;
    let now = chrono::Utc::now();
    let boosts = engine.list_active_boosts(&owner)?;

    if boosts.is_empty() {
        println!("No active boosts.");
        return Ok(());
    }

    for boost in boosts {
        let minutes = boost.time_until_expiry(now);
        let phase = if minutes > 0 {
            format!("full for {minutes} more min")
        } else {
            "decaying".to_string()
        };
        println!(
            "{:<10} +{:.1} / {:.0}  ({})",
            boost.kind().as_str(),
            boost.current_contribution(now),
            boost.amount(),
            phase
        );
    }
    Ok(())
}

fn cleanup(owner: Option<String>) -> Result<(), Box<dyn std::error::Error>> {
    let owner = resolve_owner(owner);
    let engine = open_engine()?;
    let purged = engine.purge_depleted_boosts(&owner)?;
    println!("Cleaned up {purged} depleted boost(s)");
    Ok(())
}
