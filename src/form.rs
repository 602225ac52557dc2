//! Builds an instance from individually entered fields.

use std::path::PathBuf;

use clap::Args;

use crate::config::Config;
use crate::convert::convert_buffer;
use crate::error::{MinPolError, MinPolResult};
use crate::instance::InstanceSpec;

/// Every field is taken verbatim, as typed, and goes through the same
/// parser as a plain-text instance file.
#[derive(Debug, Clone, Args)]
pub struct Build {
    /// Number of people
    #[clap(long)]
    pub n: String,
    /// Number of opinions
    #[clap(long)]
    pub m: String,
    /// People per opinion, comma separated (e.g. 1,8,1)
    #[clap(long)]
    pub p: String,
    /// Value of each opinion, comma separated (e.g. 0.3,0.5,0.9)
    #[clap(long)]
    pub v: String,
    /// low,medium,high resistance of one opinion; repeat once per opinion
    #[clap(short, long = "resistance")]
    pub resistance: Vec<String>,
    /// Maximum total cost
    #[clap(long)]
    pub ct: String,
    /// Maximum number of moves
    #[clap(long = "max-movs")]
    pub max_movs: String,
    /// Where to write the data file (defaults to the configured data file)
    #[clap(short, long)]
    pub output: Option<PathBuf>,
}

impl Build {

    /// Assembles the fields in the plain-text layout.
    pub fn to_txt(&self) -> MinPolResult<String> {
        let m: usize = self.m.trim().parse().map_err(|e| MinPolError::value("m", 2, self.m.trim(), e))?;
        if self.resistance.len() != m {
            return Err(MinPolError::structure(
                5,
                format!("{} resistance rows given but m = {m}", self.resistance.len()),
            ));
        }

        let mut lines = vec![self.n.as_str(), self.m.as_str(), self.p.as_str(), self.v.as_str()];
        lines.extend(self.resistance.iter().map(String::as_str));
        lines.push(&self.ct);
        lines.push(&self.max_movs);
        Ok(lines.join("\n"))
    }

    pub fn build(&self, config: &Config) -> MinPolResult<InstanceSpec> {
        let output = self.output.as_deref().unwrap_or(&config.paths.data);
        let txt = self.to_txt()?;
        convert_buffer(&txt, output)
    }
}
