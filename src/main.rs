#![deny(
    warnings,
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    clippy::cargo
)]
#![allow(clippy::multiple_crate_versions)]

use anyhow::Result;
use clap::Parser;
use waymark::{cli, dlog, session, utils};

fn main() -> Result<()> {
    let cli = cli::Cli::parse();
    utils::init_logging(cli.verbose, cli.quiet);

    match cli.cmd {
        Some(cli::Cmd::Session { at }) => {
            dlog!("mode=session db={} at={at}", cli.db.display());
            session::run_session(&cli.db, &at)
        }
        None => {
            dlog!("mode=list db={} details={}", cli.db.display(), cli.details);
            session::print_workouts(&cli.db, cli.details)
        }
    }
}
