//! Colors command: manage the tag color preference.

use std::io::Write;
use std::sync::LazyLock;

use anyhow::{Context, Result, bail};
use clap::Subcommand;
use regex::Regex;
use tl_db::Database;

/// Accepted color notation: `#rgb` or `#rrggbb`.
static HEX_COLOR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^#(?:[0-9a-fA-F]{3}|[0-9a-fA-F]{6})$").expect("hex color regex is valid")
});

/// Actions on tag colors.
#[derive(Debug, Subcommand)]
pub enum ColorsAction {
    /// List configured tag colors.
    List {
        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Set the color of a tag.
    Set {
        /// Tag to color.
        tag: String,
        /// Hex color such as #1f77b4.
        color: String,
    },
    /// Forget the color of a tag.
    Unset {
        /// Tag whose color to forget.
        tag: String,
    },
    /// Forget all tag colors.
    Reset,
}

pub fn run<W: Write>(writer: &mut W, db: &Database, action: &ColorsAction) -> Result<()> {
    match action {
        ColorsAction::List { json } => list(writer, db, *json),
        ColorsAction::Set { tag, color } => set(writer, db, tag, color),
        ColorsAction::Unset { tag } => unset(writer, db, tag),
        ColorsAction::Reset => reset(writer, db),
    }
}

fn list<W: Write>(writer: &mut W, db: &Database, json: bool) -> Result<()> {
    let colors = db.tag_colors().context("failed to load tag colors")?;
    if json {
        writeln!(writer, "{}", serde_json::to_string_pretty(&colors)?)?;
        return Ok(());
    }

    if colors.is_empty() {
        writeln!(writer, "No tag colors configured.")?;
        return Ok(());
    }
    for (tag, color) in colors.iter() {
        writeln!(writer, "{tag:<16}  {color}")?;
    }
    Ok(())
}

fn set<W: Write>(writer: &mut W, db: &Database, tag: &str, color: &str) -> Result<()> {
    let tag = tag.trim();
    if tag.is_empty() {
        bail!("tag cannot be empty; untagged entries always use the neutral color");
    }
    let color = color.trim();
    if !HEX_COLOR_RE.is_match(color) {
        bail!("invalid color: {color}. Use #rgb or #rrggbb");
    }
    let color = color.to_ascii_lowercase();

    let mut colors = db.tag_colors().context("failed to load tag colors")?;
    colors.set(tag, color.as_str());
    db.save_tag_colors(&colors)
        .context("failed to save tag colors")?;
    tracing::debug!(tag, %color, "set tag color");
    writeln!(writer, "Set color of '{tag}' to {color}")?;
    Ok(())
}

fn unset<W: Write>(writer: &mut W, db: &Database, tag: &str) -> Result<()> {
    let tag = tag.trim();
    let mut colors = db.tag_colors().context("failed to load tag colors")?;
    if colors.remove(tag).is_none() {
        writeln!(writer, "No color set for '{tag}'")?;
        return Ok(());
    }
    db.save_tag_colors(&colors)
        .context("failed to save tag colors")?;
    writeln!(writer, "Removed color of '{tag}'")?;
    Ok(())
}

fn reset<W: Write>(writer: &mut W, db: &Database) -> Result<()> {
    if db.reset_tag_colors().context("failed to reset tag colors")? {
        writeln!(writer, "Removed all tag colors")?;
    } else {
        writeln!(writer, "No tag colors configured.")?;
    }
    Ok(())
}
