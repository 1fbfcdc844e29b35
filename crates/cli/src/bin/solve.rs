use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use solar_pathfinder::config::{Problem, load_problem};
use solar_pathfinder::export::{FlightDb, db_paths, write_db};
use solar_pathfinder::transfer::PathFinder;
use tracing::info;

/// Search a problem's launch window and refine the cheapest chains.
#[derive(Parser, Debug)]
#[command(author, version, about = "Multi-leg trajectory search")]
struct Cli {
    /// Problem file (YAML, or TOML by extension)
    #[arg(long)]
    problem: PathBuf,

    /// Stop after the first approximation
    #[arg(long, default_value_t = false)]
    skip_refine: bool,

    /// Log solver internals
    #[arg(long, short, default_value_t = false)]
    verbose: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    pathfinder_cli::init_tracing(cli.verbose);

    let Problem {
        mission,
        weights,
        sweep,
        start_date,
    } = load_problem(&cli.problem)
        .with_context(|| format!("loading problem {}", cli.problem.display()))?;
    info!(%start_date, legs = mission.legs(), "problem loaded");

    let mut finder = PathFinder::new(mission, weights);
    for offset in sweep.offsets() {
        let found = finder
            .first_approx(offset)
            .with_context(|| format!("first approximation at offset {offset} s"))?
            .len();
        println!("offset {offset:>12.0} s: {found} chains");
    }

    match finder.keep_threshold(sweep.keep_factor) {
        Some(threshold) => {
            finder.filter(threshold);
            println!(
                "kept {} chains with functionality <= {threshold:.3}",
                finder.first_len()
            );
        }
        None => println!("no chain with a finite functionality"),
    }

    let (fax_path, sax_path) = db_paths(&cli.problem);
    write_db(&fax_path, &FlightDb::from_first(finder.first_db(), finder.weights()))
        .with_context(|| format!("writing {}", fax_path.display()))?;
    println!("wrote {}", fax_path.display());

    if !cli.skip_refine {
        finder.second_approx().context("second approximation")?;
        let db = FlightDb::from_second(finder.second_db());
        if let Some(best) = db
            .flights
            .iter()
            .min_by(|a, b| a.functionality.total_cmp(&b.functionality))
        {
            println!(
                "best refined chain: functionality {:.3}, impulse {:.1} m/s",
                best.functionality, best.chain.impulse
            );
        }
        write_db(&sax_path, &db).with_context(|| format!("writing {}", sax_path.display()))?;
        println!("wrote {}", sax_path.display());
    }
    Ok(())
}
