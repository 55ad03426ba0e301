use std::path::PathBuf;

use clap::Parser;
use parmix::{NestedArray, SampleStrategy};

#[derive(Parser, Debug)]
pub struct SampleArgs {
    /// Path to the mixture definition (.yaml, .yml, or .json)
    #[clap(name = "DEFINITION")]
    pub def: PathBuf,
    /// The number of draws
    #[clap(short = 'n', default_value = "1")]
    pub n: usize,
    /// The PRNG seed. Overrides the seed in the definition.
    #[clap(long = "seed")]
    pub seed: Option<u64>,
    /// Draw every component and mask (dense) or only the picked one
    /// (selected). Overrides the strategy in the definition.
    #[clap(long = "strategy")]
    pub strategy: Option<SampleStrategy>,
    /// Also print the component index of every draw
    #[clap(long)]
    pub with_indices: bool,
}

#[derive(Parser, Debug)]
pub struct MomentsArgs {
    /// Path to the mixture definition (.yaml, .yml, or .json)
    #[clap(name = "DEFINITION")]
    pub def: PathBuf,
}

#[derive(Parser, Debug)]
pub struct LogpArgs {
    /// Path to the mixture definition (.yaml, .yml, or .json)
    #[clap(name = "DEFINITION")]
    pub def: PathBuf,
    /// Observations as a JSON array of shape
    /// `sample_shape + batch_shape + event_shape`
    #[clap(long = "x", value_parser = parse_array)]
    pub x: NestedArray,
    /// Condition on the realized categorical instead of summing it out
    #[clap(long)]
    pub conditional: bool,
}

fn parse_array(s: &str) -> Result<NestedArray, String> {
    serde_json::from_str(s).map_err(|err| format!("invalid array: {err}"))
}

#[derive(Parser, Debug)]
#[clap(
    name = "parmix",
    author = "Promised AI",
    about = "Parameterized mixture distributions",
    version
)]
pub enum Opt {
    /// Draw from a mixture and print the draws as JSON
    #[clap(name = "sample")]
    Sample(SampleArgs),
    /// Print the mean, variance, and standard deviation of a mixture
    #[clap(name = "moments")]
    Moments(MomentsArgs),
    /// Print the log probability of observations under a mixture
    #[clap(name = "logp")]
    Logp(LogpArgs),
}
