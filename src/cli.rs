use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "chain-pulse", version, about = "Polling Ethereum chain aggregator")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the aggregator with its HTTP API and background poller
    Serve {
        /// Override bind address, e.g. 0.0.0.0:8080
        #[arg(long)]
        addr: Option<String>,
    },
    /// Run a single refresh cycle and print the snapshot as JSON
    SnapshotOnce,
}
