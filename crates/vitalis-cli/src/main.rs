use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;
mod common;

#[derive(Parser)]
#[command(name = "vitalis-cli", version, about = "Vitalis CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Current usable-energy snapshot
    Status {
        /// Owner id (defaults to VITALIS_OWNER or "default")
        #[arg(long)]
        owner: Option<String>,
        /// Emit the snapshot as JSON
        #[arg(long)]
        json: bool,
    },
    /// Create the owner's base-energy row
    Init {
        #[arg(long)]
        owner: Option<String>,
        /// Starting energy (capped at the owner's ceiling)
        #[arg(long, default_value_t = 100.0)]
        energy: f64,
    },
    /// Sleep logging and history
    Sleep {
        #[command(subcommand)]
        action: commands::sleep::SleepAction,
    },
    /// Temporary energy boosts
    Boost {
        #[command(subcommand)]
        action: commands::boost::BoostAction,
    },
    /// Externally-owned capacity/burnout facts
    Facts {
        #[command(subcommand)]
        action: commands::facts::FactsAction,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Status { owner, json } => commands::status::run(owner, json),
        Commands::Init { owner, energy } => commands::status::init(owner, energy),
        Commands::Sleep { action } => commands::sleep::run(action),
        Commands::Boost { action } => commands::boost::run(action),
        Commands::Facts { action } => commands::facts::run(action),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
