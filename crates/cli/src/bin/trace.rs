use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use solar_pathfinder::config::{parse_start_date, seconds_since_j2000};
use solar_pathfinder::ephemeris::find_body;
use solar_pathfinder::export::{
    body_trace, flight_trace, read_db, write_body_trace, write_flight_trace,
};

/// Sample trajectories or body ephemerides into CSV.
#[derive(Parser, Debug)]
#[command(author, version, about = "Trajectory and ephemeris CSV traces")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Log internals
    #[arg(long, short, global = true, default_value_t = false)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Positions of a catalogue body over a time range
    Body {
        /// Catalogue body name (case-insensitive)
        #[arg(long)]
        body: String,

        /// Calendar date of time zero (YYYY-MM-DD or RFC 3339)
        #[arg(long)]
        start_date: String,

        /// First sample time (s)
        #[arg(long, default_value_t = 0.0)]
        begin: f64,

        /// End of the range, exclusive (s)
        #[arg(long)]
        end: f64,

        /// Sampling step (s)
        #[arg(long, default_value_t = 86_400.0)]
        step: f64,

        /// Output CSV file (use '-' for stdout)
        #[arg(long, default_value = "-")]
        output: PathBuf,
    },
    /// Legs of a stored flight sampled along their arcs
    Flight {
        /// `.fax.json` or `.sax.json` database
        #[arg(long)]
        db: PathBuf,

        /// Row of the database
        #[arg(long, default_value_t = 0)]
        index: usize,

        /// Sampling step as a fraction of each leg's arc
        #[arg(long, default_value_t = 0.01)]
        fraction: f64,

        /// Output CSV file (use '-' for stdout)
        #[arg(long, default_value = "-")]
        output: PathBuf,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    pathfinder_cli::init_tracing(cli.verbose);

    match cli.command {
        Command::Body {
            body,
            start_date,
            begin,
            end,
            step,
            output,
        } => {
            let date = parse_start_date(&start_date)?;
            let orbit = find_body(&body)?.circular_orbit(seconds_since_j2000(&date))?;
            let samples = body_trace(&orbit, begin, end, step)?;
            write_body_trace(&output, &samples)
                .with_context(|| format!("writing {}", output.display()))?;
        }
        Command::Flight {
            db,
            index,
            fraction,
            output,
        } => {
            let flights = read_db(&db).with_context(|| format!("reading {}", db.display()))?;
            let row = flights.flight(index)?;
            let points = flight_trace(&row.chain, fraction)?;
            write_flight_trace(&output, &points)
                .with_context(|| format!("writing {}", output.display()))?;
        }
    }
    Ok(())
}
