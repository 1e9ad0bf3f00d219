//! # salesflow command-line entry point
//!
//! ```text
//! main()
//!   │
//!   ├─> logging::init (console + rotating files)
//!   ├─> Parse CLI arguments (clap)
//!   └─> Run the subcommand: run | stream | config
//! ```

#![expect(clippy::print_stdout)] // The CLI reports to stdout

mod cli;

use anyhow::Result;
use clap::Parser as _;

fn main() -> Result<()> {
    salesflow::logging::init()?;

    let cli = cli::Cli::parse();
    cli::run_command(cli.command)
}
