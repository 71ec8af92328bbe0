use clap::{Parser, Subcommand};
use utils::version;

use crate::config::args::{DaemonArgs, RunArgs};

#[derive(Parser)]
#[command(about, long_about, version = &**version::VERSION)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Evaluate every UPS periodically until interrupted
    Daemon(Box<DaemonArgs>),
    /// Evaluate every UPS once and exit
    Once(Box<RunArgs>),
}
