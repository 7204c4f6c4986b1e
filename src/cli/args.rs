use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "parallel_runner")]
#[command(about = "Run workloads across a pool of per-device worker threads")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Sum the squares of 0..ITEMS in arrival order
    SumSquares {
        #[command(flatten)]
        pool: PoolArgs,
    },

    /// Print the squares of 0..ITEMS as a JSON array
    Squares {
        #[command(flatten)]
        pool: PoolArgs,

        /// Collect results in arrival order instead of input order
        #[arg(long)]
        unordered: bool,
    },
}

/// Input size and device pool shared by all subcommands
#[derive(Args, Debug, Clone)]
pub struct PoolArgs {
    /// Number of input items
    #[arg(short = 'n', long, default_value = "100")]
    pub items: u64,

    /// Number of CPU workers (defaults to the number of available CPUs)
    #[arg(short, long, conflicts_with = "device")]
    pub devices: Option<usize>,

    /// Explicit device name, repeatable (e.g. --device cuda:0 --device cuda:1)
    #[arg(long)]
    pub device: Vec<String>,
}
