//! Init command - write a default ghostreel.toml

use anyhow::{Result, bail};
use clap::Args;
use ghostreel_core::config::{self, RenderConfig};
use std::path::PathBuf;

/// Arguments for the init command
#[derive(Args)]
pub struct InitArgs {
    /// Where to write (defaults to the config directory)
    #[arg(long)]
    pub path: Option<PathBuf>,

    /// Overwrite an existing file
    #[arg(long)]
    pub force: bool,
}

/// Execute the init command
pub fn execute(args: InitArgs) -> Result<()> {
    let defaults = RenderConfig::default();
    match args.path {
        Some(path) => {
            if path.exists() && !args.force {
                bail!("{} already exists (use --force to overwrite)", path.display());
            }
            config::save_to(&defaults, &path)?;
            println!("Wrote {}", path.display());
        }
        None => {
            config::save(&defaults)?;
            println!("Wrote default config");
        }
    }
    Ok(())
}
