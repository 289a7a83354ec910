use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;

const DEFAULT_DB: &str = "waymark.db";
const DEFAULT_POSITION: &str = "51.505,-0.09";

#[derive(Parser, Debug)]
#[command(
    name = "waymark",
    about = "Log running and cycling workouts against map coordinates"
)]
pub struct Cli {
    /// SQLite file that mirrors the workout history.
    ///
    /// Default: waymark.db in the current directory
    #[arg(long, global = true, default_value = DEFAULT_DB)]
    pub db: PathBuf,

    /// Also print ids, coordinates and creation timestamps.
    #[arg(long)]
    pub details: bool,

    /// Increase log verbosity (-v, -vv). Defaults to INFO.
    #[arg(short = 'v', long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Decrease log verbosity (-q, -qq). Defaults to INFO.
    #[arg(short = 'q', long, action = ArgAction::Count, global = true)]
    pub quiet: u8,

    #[command(subcommand)]
    pub cmd: Option<Cmd>,
}

#[derive(Subcommand, Debug)]
pub enum Cmd {
    /// Open an interactive tracking session.
    Session {
        /// Current position as LAT,LNG. A value that does not parse starts
        /// the session without a map, like a denied geolocation prompt.
        #[arg(long, default_value = DEFAULT_POSITION)]
        at: String,
    },
}
