//! Export command: download the store's CSV export.

use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use super::util::block_on;
use crate::Config;

#[derive(Debug, Args)]
pub struct ExportArgs {
    /// Write the CSV to this file instead of stdout.
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,
}

pub fn run<W: Write>(writer: &mut W, args: &ExportArgs, config: &Config) -> Result<()> {
    let client = config.client()?;
    let csv = block_on(client.export_csv())?.context("failed to export entries")?;

    match &args.output {
        Some(path) => {
            std::fs::write(path, &csv)
                .with_context(|| format!("failed to write {}", path.display()))?;
            tracing::debug!(path = %path.display(), bytes = csv.len(), "wrote export");
            writeln!(
                writer,
                "Exported {} rows to {}",
                csv.lines().count().saturating_sub(1),
                path.display()
            )?;
        }
        None => {
            writer.write_all(csv.as_bytes())?;
            if !csv.is_empty() && !csv.ends_with('\n') {
                writeln!(writer)?;
            }
        }
    }
    Ok(())
}
