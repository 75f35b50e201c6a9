//! Inspect command - dump a replay blob

use anyhow::{Context, Result, bail};
use clap::Args;
use ghostreel_core::replay::{DecodedReplay, ReplayDecoder, TerminationPolicy, encode_blob};
use ghostreel_core::inflate::inflate;
use std::path::PathBuf;

/// Arguments for the inspect command
#[derive(Args)]
pub struct InspectArgs {
    /// Replay blob, compressed or not
    pub blob: PathBuf,

    /// Number of frames to print
    #[arg(long, default_value_t = 10)]
    pub frames: usize,

    /// Blob ends with a (0, 0) record instead of using the header count
    #[arg(long)]
    pub sentinel: bool,

    /// Print the listed frames as JSON instead of a table
    #[arg(long)]
    pub json: bool,

    /// Re-encode the trajectory and check it decodes identically
    #[arg(long)]
    pub roundtrip: bool,
}

/// Execute the inspect command
pub fn execute(args: InspectArgs) -> Result<()> {
    let bytes = std::fs::read(&args.blob)
        .with_context(|| format!("Failed to read {}", args.blob.display()))?;
    let blob = match inflate(&bytes) {
        Ok(inflated) => inflated,
        Err(_) => bytes,
    };

    let policy = if args.sentinel {
        TerminationPolicy::Sentinel
    } else {
        TerminationPolicy::FixedCount
    };
    let decoder = ReplayDecoder::new(policy);
    let replay = decoder
        .decode(&blob)
        .with_context(|| format!("Failed to decode {}", args.blob.display()))?;

    if args.json {
        let frames: Vec<_> = replay.trajectory.iter().take(args.frames).collect();
        println!("{}", serde_json::to_string_pretty(&frames)?);
    } else {
        print!("{}", describe(&replay, args.frames));
    }

    if args.roundtrip {
        let encoded = encode_blob(&replay.trajectory, replay.header.character, args.sentinel);
        let again = decoder.decode(&encoded).context("Re-encoded blob does not decode")?;
        if again.trajectory != replay.trajectory {
            bail!("Round trip changed the trajectory");
        }
        println!("Round trip OK ({} bytes)", encoded.len());
    }
    Ok(())
}

/// Human-readable header and frame listing.
fn describe(replay: &DecodedReplay, limit: usize) -> String {
    let header = &replay.header;
    let mut out = String::new();
    out.push_str(&format!("Character:   {:?}\n", header.character));
    out.push_str(&format!("Raw count:   {}\n", header.raw_frame_count));
    out.push_str(&format!("Frame count: {}\n", header.frame_count()));
    out.push_str(&format!("Decoded:     {}\n", replay.trajectory.len()));

    for (i, frame) in replay.trajectory.iter().take(limit).enumerate() {
        out.push_str(&format!(
            "{:>6}  state {:>2}  x {:>5}  y {:>5}  flags {:04b}\n",
            i,
            frame.state,
            frame.x,
            frame.y,
            frame.flags.bits()
        ));
    }
    out
}
