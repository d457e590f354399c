//! Command-line interface

use clap::Parser;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Port to listen on.
    #[arg(long, default_value_t = 8008)]
    pub port: u16,

    /// Keep peer addresses out of logs and diagnostics.
    #[arg(long)]
    pub safe_mode: bool,

    /// Bound the broadcast queue at this many in-flight messages.
    /// Unbounded when not given.
    #[arg(long)]
    pub queue_capacity: Option<usize>,

    /// Name that operator console messages are delivered under.
    #[arg(long, default_value = "Pip")]
    pub operator_name: String,
}
