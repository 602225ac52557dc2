use std::path::PathBuf;
use std::time::Duration;

use clap::Args;

use crate::config::Config;
use crate::convert::Convert;
use crate::error::MinPolResult;
use crate::resolution::{SolverCommand, SolverOutput};

#[derive(Debug, Clone, Args)]
pub struct Solve {
    /// The path to the MiniZinc model
    #[clap(short, long)]
    pub model: Option<PathBuf>,
    /// The path to the data file
    #[clap(short, long)]
    pub data: Option<PathBuf>,
    /// timeout in seconds
    #[clap(short, long)]
    pub timeout: Option<u64>,
    /// The solver executable
    #[clap(short, long)]
    pub solver: Option<String>,
}

impl Solve {
    pub fn command(&self, config: &Config) -> SolverCommand {
        SolverCommand {
            program: self.solver.clone().unwrap_or_else(|| config.solver.program.clone()),
            model: self.model.clone().unwrap_or_else(|| config.solver.model.clone()),
            data: self.data.clone().unwrap_or_else(|| config.paths.data.clone()),
            timeout: self.timeout.map(Duration::from_secs).unwrap_or_else(|| config.solver.timeout()),
        }
    }

    pub fn solve(&self, config: &Config) -> MinPolResult<SolverOutput> {
        let output = self.command(config).run()?;
        report(&output);
        Ok(output)
    }
}

/// Converts an instance, then hands the fresh data file to the solver.
#[derive(Debug, Args)]
pub struct Run {
    /// The instance file to convert (looked up in the instances directory if not found)
    pub input: PathBuf,
    #[clap(flatten)]
    pub solve: Solve,
}

impl Run {
    pub fn run(&self, config: &Config) -> MinPolResult<SolverOutput> {
        let convert = Convert {
            input: self.input.clone(),
            output: self.solve.data.clone(),
            format: None,
        };
        convert.convert(config)?;
        self.solve.solve(config)
    }
}

fn report(output: &SolverOutput) {
    if !output.status.success() {
        log::warn!("solver exited with {}", output.status);
    }
    if !output.stdout.is_empty() {
        println!("=== RESULT ===");
        println!("{}", output.stdout);
    }
    if !output.stderr.is_empty() {
        println!("=== ERRORS ===");
        println!("{}", output.stderr);
    }
}
