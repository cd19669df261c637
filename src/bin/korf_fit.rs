use std::env;
use std::error::Error;
use std::path::PathBuf;

use anyhow::bail;
use chrono::NaiveDate;
use clap::Parser;
use stanza::renderer::console::Console;
use stanza::renderer::Renderer;
use tinyrand::{Seeded, StdRand};
use tracing::{debug, info};

use korfball::csv::CsvWriter;
use korfball::data;
use korfball::file::ReadJsonFile;
use korfball::fit::{Estimator, ModelKind, SolverConfig};
use korfball::print::{tabulate_prediction, tabulate_strengths};

#[derive(Debug, clap::Parser, Clone)]
struct Args {
    /// CSV file of played matches
    file: PathBuf,

    /// model to fit: 'dc' (Dixon-Coles) or 'poisson'
    #[clap(short = 'm', long)]
    model: Option<ModelKind>,

    /// daily decay rate of match weights
    #[clap(long)]
    xi: Option<f64>,

    /// date the match weights decay from (YYYY-MM-DD)
    #[clap(long)]
    as_of: Option<NaiveDate>,

    /// seed for the initial parameter values
    #[clap(short = 's', long, default_value = "42")]
    seed: u64,

    /// iteration budget of the optimiser
    #[clap(long)]
    max_iterations: Option<u64>,

    /// JSON file of solver settings
    #[clap(short = 'c', long)]
    config: Option<PathBuf>,

    /// fixture to predict, as HOME:AWAY
    #[clap(short = 'p', long)]
    predict: Option<String>,

    /// highest score per side in the predicted score grid
    #[clap(long, default_value = "60")]
    max_score: u16,

    /// print the estimate as JSON
    #[clap(long)]
    json: bool,

    /// CSV file to write the fitted parameters to
    #[clap(short = 'o', long)]
    out: Option<PathBuf>,
}
impl Args {
    fn validate(&self) -> anyhow::Result<()> {
        if let Some(predict) = &self.predict {
            if parse_fixture(predict).is_none() {
                bail!("fixture must be specified as HOME:AWAY, got '{predict}'");
            }
        }
        if self.max_score == 0 {
            bail!("maximum score must be positive");
        }
        Ok(())
    }

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
        if let Some(as_of) = self.as_of {
            config.reference_date = Some(as_of);
        }
        if let Some(max_iterations) = self.max_iterations {
            config.max_iterations = max_iterations;
        }
        Ok(config)
    }
}

fn parse_fixture(fixture: &str) -> Option<(&str, &str)> {
    let (home, away) = fixture.split_once(':')?;
    let (home, away) = (home.trim(), away.trim());
    if home.is_empty() || away.is_empty() {
        None
    } else {
        Some((home, away))
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
    args.validate()?;
    debug!("args: {args:?}");

    let config = args.solver_config()?;
    debug!("config: {config:?}");
    let estimator = Estimator::try_from(config)?;

    let records = data::read_matches(&args.file)?;
    info!("loaded {} matches from {}", records.len(), args.file.display());

    let estimate = estimator.fit(&records, &mut StdRand::seed(args.seed))?;
    info!(
        "{} fit: {} after {} iterations, objective: {:.6} (initial {:.6})",
        estimate.model,
        estimate.convergence.termination,
        estimate.convergence.iterations,
        estimate.convergence.objective,
        estimate.convergence.initial_objective
    );

    if args.json {
        println!("{}", serde_json::to_string_pretty(&estimate)?);
    } else {
        println!("{}", Console::default().render(&tabulate_strengths(&estimate)));
    }

    if let Some((home, away)) = args.predict.as_deref().and_then(parse_fixture) {
        let grid = estimate.predict(home, away, args.max_score)?;
        println!(
            "{}",
            Console::default().render(&tabulate_prediction(home, away, &grid))
        );
    }

    if let Some(path) = &args.out {
        let mut csv = CsvWriter::create(path)?;
        csv.append(["parameter", "value"])?;
        for (name, value) in &estimate.parameters {
            csv.append([name.clone(), value.to_string()])?;
        }
        csv.flush()?;
        info!("wrote {} parameters to {}", estimate.parameters.len(), path.display());
    }

    Ok(())
}
