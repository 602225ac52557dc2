use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use config::Config;
use convert::Convert;
use form::Build;
use generate::MinPolGenerator;
use resolution::{Run, Solve};

mod config;
mod convert;
mod error;
mod form;
mod instance;
mod generate;
mod resolution;

/// Prepares MinPol instances for MiniZinc and runs the model on them.
#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct MinPolTools {
    /// Configuration file (defaults to ./minpol.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Convert a plain-text instance into a MiniZinc data file
    Convert(Convert),
    /// Write a data file from fields given one by one
    Build(Build),
    /// Run the solver on the model and the current data file
    Solve(Solve),
    /// Convert an instance, then run the solver on it
    Run(Run),
    /// Generate a random instance
    Generate(MinPolGenerator),
    /// Show the bundled example instance and its data file
    Example {
        /// Where to write the example data file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Print the effective configuration
    Config,
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = MinPolTools::parse();
    let config = Config::load(cli.config.as_deref())?;

    match cli.command {
        Command::Convert(convert) => {
            convert.convert(&config)
                .with_context(|| format!("cannot convert '{}'", convert.input.display()))?;
        }
        Command::Build(build) => {
            build.build(&config).context("cannot build the data file")?;
        }
        Command::Solve(solve) => {
            solve.solve(&config).context("cannot run the model")?;
        }
        Command::Run(run) => {
            run.run(&config)
                .with_context(|| format!("cannot solve '{}'", run.input.display()))?;
        }
        Command::Generate(mut generate) => {
            generate.generate().context("cannot generate an instance")?;
        }
        Command::Example { output } => {
            println!("{}\n", instance::EXAMPLE_TXT);
            let (_, dzn) = convert::convert_str(instance::EXAMPLE_TXT)?;
            print!("{dzn}");
            if let Some(output) = output {
                convert::write_atomically(&output, &dzn)
                    .with_context(|| format!("cannot write '{}'", output.display()))?;
                log::info!("example data file written to {}", output.display());
            }
        }
        Command::Config => {
            print!("{}", toml::to_string(&config)?);
        }
    }
    Ok(())
}
