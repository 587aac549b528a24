//! Seeding the externally-owned capacity/burnout facts.
//!
//! The engine consumes these facts but never computes them; in a full
//! deployment another subsystem writes them. These commands stand in for
//! that subsystem.

use clap::Subcommand;

use vitalis_core::{resolve_ceiling, FactProvider, StoredFacts};

use crate::common::resolve_owner;

#[derive(Subcommand)]
pub enum FactsAction {
    /// Set the owner's capacity score
    SetCapacity {
        #[arg(long)]
        owner: Option<String>,
        capacity: f64,
    },
    /// Set the owner's burnout flag
    SetBurnout {
        #[arg(long)]
        owner: Option<String>,
        #[arg(value_parser = clap::value_parser!(bool))]
        in_burnout: bool,
    },
    /// Show the stored facts and the tier they resolve to
    Show {
        #[arg(long)]
        owner: Option<String>,
    },
}

pub fn run(action: FactsAction) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        FactsAction::SetCapacity { owner, capacity } => {
            let owner = resolve_owner(owner);
            let facts = StoredFacts::open()?;
            facts.set_capacity(&owner, capacity)?;
            let tier = resolve_ceiling(capacity);
            println!(
                "Capacity for '{}' set to {:.0} (ceiling {:.0}, xp efficiency {:.0}%)",
                owner,
                capacity,
                tier.ceiling,
                tier.xp_efficiency * 100.0
            );
            Ok(())
        }
        FactsAction::SetBurnout { owner, in_burnout } => {
            let owner = resolve_owner(owner);
            let facts = StoredFacts::open()?;
            facts.set_burnout(&owner, in_burnout)?;
            println!("Burnout for '{owner}' set to {in_burnout}");
            Ok(())
        }
        FactsAction::Show { owner } => {
            let owner = resolve_owner(owner);
            let facts = StoredFacts::open()?;
            let capacity = facts.capacity(&owner)?;
            let in_burnout = facts.in_burnout(&owner)?;
            let tier = resolve_ceiling(capacity);
            println!("Facts for '{owner}':");
            println!(
                "  capacity: {:.0} (ceiling {:.0}, xp efficiency {:.0}%)",
                capacity,
                tier.ceiling,
                tier.xp_efficiency * 100.0
            );
            println!("  burnout:  {in_burnout}");
            Ok(())
        }
    }
}
