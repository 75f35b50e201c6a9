//! Ghostreel CLI - render ghost replay races
//!
//! # Commands
//!
//! - `ghostreel render` - Render one or more levels to frame sequences or GIFs
//! - `ghostreel overview` - Render the still image with every trail of a level
//! - `ghostreel inspect` - Dump the header and first frames of a replay blob
//! - `ghostreel init` - Write a default `ghostreel.toml`
//!
//! # Data layout
//!
//! ```text
//! <data>/players.toml          [[player]] pid, name, code, country, avatar_url
//! <data>/<level>/runs.toml     [[run]] pid, time_ms, replay
//! ```

mod avatars;
mod init;
mod inspect;
mod overview;
mod render;

use anyhow::Result;
use clap::{Parser, Subcommand};

/// Ghostreel - render every ghost of a level racing at once
#[derive(Parser)]
#[command(name = "ghostreel")]
#[command(about = "Render ghost replay races")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render levels to frame sequences (main command)
    Render(render::RenderArgs),

    /// Render the trail overview still of one level
    Overview(overview::OverviewArgs),

    /// Dump a replay blob
    Inspect(inspect::InspectArgs),

    /// Write a default configuration file
    Init(init::InitArgs),
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Render(args) => render::execute(args),
        Commands::Overview(args) => overview::execute(args),
        Commands::Inspect(args) => inspect::execute(args),
        Commands::Init(args) => init::execute(args),
    }
}
