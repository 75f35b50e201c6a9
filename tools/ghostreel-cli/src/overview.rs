//! Overview command - one still with every complete trail

use anyhow::{Context, Result};
use clap::Args;
use ghostreel_core::{ManifestSource, RowSource, save_png};
use std::path::PathBuf;
use tracing::info;

use crate::render::{InputArgs, level_info_or_default, load_config, open_session};

/// Arguments for the overview command
#[derive(Args)]
pub struct OverviewArgs {
    /// Level id
    #[arg(long)]
    pub id: u32,

    #[command(flatten)]
    pub input: InputArgs,

    /// Output PNG
    #[arg(long)]
    pub out: PathBuf,
}

/// Execute the overview command
pub fn execute(args: OverviewArgs) -> Result<()> {
    let config = load_config(args.input.config.as_deref())?;
    let source = ManifestSource::new(&args.input.data);
    let profiles = source.profiles()?;
    let info = level_info_or_default(args.id);

    let session = open_session(args.id, &args.input, &config, &source, &profiles, info)?;
    save_png(&args.out, &session.render_overview())
        .with_context(|| format!("Failed to write {}", args.out.display()))?;
    info!(
        "Saved overview of {} trails: {}",
        session.store().len(),
        args.out.display()
    );
    Ok(())
}
