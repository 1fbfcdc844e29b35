use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use solar_pathfinder::config::write_default_problem;

/// Write a commented default problem file.
#[derive(Parser, Debug)]
#[command(author, version, about = "Default problem file generator")]
struct Cli {
    /// Destination of the problem file
    #[arg(long, default_value = "problem.yaml")]
    output: PathBuf,

    /// Replace an existing file
    #[arg(long, default_value_t = false)]
    force: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    if cli.output.exists() && !cli.force {
        anyhow::bail!(
            "{} already exists; pass --force to replace it",
            cli.output.display()
        );
    }
    write_default_problem(&cli.output)
        .with_context(|| format!("writing {}", cli.output.display()))?;
    println!("wrote {}", cli.output.display());
    Ok(())
}
