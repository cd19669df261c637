use std::env;
use std::error::Error;
use std::path::PathBuf;

use clap::Parser;
use stanza::renderer::console::Console;
use stanza::renderer::Renderer;
use tinyrand::{Seeded, StdRand};
use tracing::{debug, info};

use korfball::data;
use korfball::file::ReadJsonFile;
use korfball::fit::{Estimator, ModelKind, SolverConfig};
use korfball::print::tabulate_standings;
use korfball::season::{Points, Season, SimulationConfig};

#[derive(Debug, clap::Parser, Clone)]
struct Args {
    /// CSV file of played matches
    file: PathBuf,

    /// CSV file of unplayed fixtures
    #[clap(short = 'f', long)]
    fixtures: PathBuf,

    /// model to fit: 'dc' (Dixon-Coles) or 'poisson'
    #[clap(short = 'm', long)]
    model: Option<ModelKind>,

    /// daily decay rate of match weights
    #[clap(long)]
    xi: Option<f64>,

    /// JSON file of solver settings
    #[clap(short = 'c', long)]
    config: Option<PathBuf>,

    /// seed for the initial parameter values and the simulation
    #[clap(short = 's', long, default_value = "42")]
    seed: u64,

    /// number of simulated seasons
    #[clap(short = 't', long, default_value = "10000")]
    trials: u64,

    /// points for a win
    #[clap(long, default_value = "2")]
    win_points: u16,

    /// points for a draw
    #[clap(long, default_value = "1")]
    draw_points: u16,

    /// print the projection as JSON
    #[clap(long)]
    json: bool,
}
impl Args {
    fn solver_config(&self) -> Result<SolverConfig, Box<dyn Error>> {
        let mut config = match &self.config {
            None => SolverConfig::default(),
            Some(path) => SolverConfig::read_json_file(path)?,
        };
        if let Some(model) = self.model {
            config.model = model;
        }
        if let Some(xi) = self.xi {
            config.xi = xi;
        }
        Ok(config)
    }

    fn simulation_config(&self) -> SimulationConfig {
        SimulationConfig {
            trials: self.trials,
            points: Points {
                win: self.win_points,
                draw: self.draw_points,
                loss: 0,
            },
            ..SimulationConfig::default()
        }
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    if env::var("RUST_BACKTRACE").is_err() {
        env::set_var("RUST_BACKTRACE", "full")
    }
    if env::var("RUST_LOG").is_err() {
        env::set_var("RUST_LOG", "info")
    }
    tracing_subscriber::fmt::init();

    let args = Args::parse();
    debug!("args: {args:?}");

    let estimator = Estimator::try_from(args.solver_config()?)?;
    let simulation_config = args.simulation_config();
    simulation_config.validate()?;

    let played = data::read_matches(&args.file)?;
    let fixtures = data::read_fixtures(&args.fixtures)?;
    info!("loaded {} played matches and {} fixtures", played.len(), fixtures.len());

    let mut rand = StdRand::seed(args.seed);
    let estimate = estimator.fit(&played, &mut rand)?;
    info!(
        "{} fit: {} after {} iterations",
        estimate.model, estimate.convergence.termination, estimate.convergence.iterations
    );

    let season = Season::simulate_from(&estimate, &played, &fixtures, &simulation_config, &mut rand)?;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&season)?);
    } else {
        println!("{}", Console::default().render(&tabulate_standings(&season)));
    }

    Ok(())
}
