use std::io::Write;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use tl_cli::commands::{add, colors, dashboard, edit, export, list, summary, timeline};
use tl_cli::{Cli, Commands, Config};

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing with verbose flag support
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env()
    };
    // Logs go to stderr so JSON output on stdout stays parseable
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();

    let Some(command) = &cli.command else {
        // No subcommand, show help
        use clap::CommandFactory;
        Cli::command().print_help()?;
        println!();
        return Ok(());
    };

    let config = Config::load_from(cli.config.as_deref()).context("failed to load configuration")?;
    tracing::debug!(?config, "loaded configuration");

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    match command {
        Commands::List(args) => list::run(&mut out, args, &config)?,
        Commands::Add(args) => add::run(&mut out, args, &config)?,
        Commands::Edit(args) => edit::run(&mut out, args, &config)?,
        Commands::Delete(args) => edit::delete(&mut out, args, &config)?,
        Commands::Summary(args) => summary::run(&mut out, args, &config)?,
        Commands::Timeline(args) => timeline::run(&mut out, args, &config)?,
        Commands::Dashboard(args) => dashboard::run(&mut out, args, &config)?,
        Commands::Colors { action } => {
            let db = config.open_database()?;
            colors::run(&mut out, &db, action)?;
        }
        Commands::Export(args) => export::run(&mut out, args, &config)?,
    }
    out.flush()?;

    Ok(())
}
