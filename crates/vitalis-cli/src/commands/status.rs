//! Status and init commands.

use crate::common::{open_engine, resolve_owner};

pub fn run(owner: Option<String>, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let owner = resolve_owner(owner);
    let engine = open_engine()?;
    let snapshot = engine.status(&owner)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
        return Ok(());
    }

    println!("Vitality for '{}':", snapshot.owner_id);
    println!(
        "  Usable energy: {:.0} / {:.0}{}",
        snapshot.usable_energy,
        snapshot.ceiling,
        if snapshot.in_burnout {
            "  (burnout: capped at 40)"
        } else {
            ""
        }
    );
    println!(
        "  Base energy:   {:.0} ({:.0}% of ceiling)",
        snapshot.base_energy, snapshot.base_energy_percentage
    );
    println!(
        "  Capacity:      {:.0} (xp efficiency {:.0}%)",
        snapshot.capacity,
        snapshot.xp_efficiency * 100.0
    );

    if snapshot.boosts.is_empty() {
        println!("  Boosts:        none active");
    } else {
        println!("  Boosts:");
        for boost in &snapshot.boosts {
            println!(
                "    {:<10} +{:.1}  (expires in {} min)",
                boost.kind.as_str(),
                boost.contribution,
                boost.minutes_until_expiry
            );
        }
    }

    let burndown = &snapshot.burndown;
    match burndown.hours_until_depletion {
        Some(hours) => println!(
            "  Burndown:      -{:.1}/h, empty in {:.1}h",
            burndown.decay_rate_per_hour, hours
        ),
        None => println!("  Burndown:      -{:.1}/h", burndown.decay_rate_per_hour),
    }

    Ok(())
}

pub fn init(owner: Option<String>, energy: f64) -> Result<(), Box<dyn std::error::Error>> {
    let owner = resolve_owner(owner);
    let engine = open_engine()?;
    let base = engine.init_base_energy(&owner, energy)?;
    println!(
        "Initialized '{}' with {:.0} energy (ceiling {:.0})",
        owner,
        base.amount(),
        base.cap()
    );
    Ok(())
}
