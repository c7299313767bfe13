use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "releasebot")]
#[command(about = "Watches RouterOS and WinBox releases and posts them to a chat webhook")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Poll all sources on an interval and notify new releases
    Run {
        /// Run a single cycle and exit
        #[arg(long)]
        once: bool,

        /// Detect and record releases without sending notifications
        #[arg(long)]
        debug: bool,
    },

    /// Show the stored watermarks
    Status,

    /// List the polled sources
    Sources,
}
