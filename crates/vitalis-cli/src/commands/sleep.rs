//! Sleep logging and history commands.

use chrono::{DateTime, Local, NaiveDate, Utc};
use clap::Subcommand;

use vitalis_core::SleepEntry;

use crate::common::{open_engine, resolve_owner};

#[derive(Subcommand)]
pub enum SleepAction {
    /// Log (or re-log) a night of sleep
    Log {
        #[arg(long)]
        owner: Option<String>,
        /// Date of the night (YYYY-MM-DD, default today)
        #[arg(long)]
        date: Option<String>,
        /// Hours slept (0-24)
        #[arg(long)]
        hours: f64,
        /// Subjective quality (1-10)
        #[arg(long)]
        quality: u8,
        /// Bed time (RFC 3339)
        #[arg(long)]
        bed: Option<String>,
        /// Wake time (RFC 3339)
        #[arg(long)]
        wake: Option<String>,
        #[arg(long)]
        notes: Option<String>,
    },
    /// Show sleep history, newest first
    History {
        #[arg(long)]
        owner: Option<String>,
        /// Start date (YYYY-MM-DD, inclusive)
        #[arg(long)]
        from: Option<String>,
        /// End date (YYYY-MM-DD, inclusive)
        #[arg(long)]
        to: Option<String>,
    },
    /// Show the most recent entry
    Last {
        #[arg(long)]
        owner: Option<String>,
    },
}

pub fn run(action: SleepAction) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        SleepAction::Log {
            owner,
            date,
            hours,
            quality,
            bed,
            wake,
            notes,
        } => log(owner, date, hours, quality, bed, wake, notes),
        SleepAction::History { owner, from, to } => history(owner, from, to),
        SleepAction::Last { owner } => last(owner),
    }
}

fn parse_date(raw: &str) -> Result<NaiveDate, Box<dyn std::error::Error>> {
    raw.parse::<NaiveDate>()
        .map_err(|_| format!("invalid date '{raw}', expected YYYY-MM-DD").into())
}

fn parse_instant(raw: &str) -> Result<DateTime<Utc>, Box<dyn std::error::Error>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| format!("invalid instant '{raw}', expected RFC 3339").into())
}

#[allow(clippy::too_many_arguments)]
fn log(
    owner: Option<String>,
    date: Option<String>,
    hours: f64,
    quality: u8,
    bed: Option<String>,
    wake: Option<String>,
    notes: Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    let owner = resolve_owner(owner);
    let date = match date {
        Some(raw) => parse_date(&raw)?,
        None => Local::now().date_naive(),
    };
    let entry = SleepEntry {
        date,
        hours_slept: hours,
        quality,
        bed_time: bed.as_deref().map(parse_instant).transpose()?,
        wake_time: wake.as_deref().map(parse_instant).transpose()?,
        notes,
    };

    let engine = open_engine()?;
    let sleep = engine.log_sleep(&owner, &entry)?;
    println!(
        "Logged {} for {}: {} ({}), restored {:.0} energy",
        sleep.duration_formatted(),
        sleep.date,
        sleep.category().as_str(),
        if sleep.is_optimal() { "optimal night" } else { "not optimal" },
        sleep.energy_restored
    );
    Ok(())
}

fn history(
    owner: Option<String>,
    from: Option<String>,
    to: Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    let owner = resolve_owner(owner);
    let from = from.as_deref().map(parse_date).transpose()?;
    let to = to.as_deref().map(parse_date).transpose()?;

    let engine = open_engine()?;
    let entries = engine.sleep_history(&owner, from, to)?;
    if entries.is_empty() {
        println!("No sleep logged yet.");
        return Ok(());
    }

    for sleep in entries {
        println!(
            "{}  {:>7}  quality {:>2}  {:<12} +{:.0} energy",
            sleep.date,
            sleep.duration_formatted(),
            sleep.quality.value(),
            sleep.category().as_str(),
            sleep.energy_restored
        );
    }
    Ok(())
}

fn last(owner: Option<String>) -> Result<(), Box<dyn std::error::Error>> {
    let owner = resolve_owner(owner);
    let engine = open_engine()?;
    match engine.most_recent_sleep(&owner)? {
        Some(sleep) => {
            println!(
                "{}: {} slept, quality {}, restored {:.0} energy",
                sleep.date,
                sleep.duration_formatted(),
                sleep.quality.value(),
                sleep.energy_restored
            );
            if let Some(notes) = &sleep.notes {
                println!("  notes: {notes}");
            }
        }
        None => println!("No sleep logged yet."),
    }
    Ok(())
}
