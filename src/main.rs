use clap::Parser;
use tradecast::cli::{run, Cli};

fn main() -> std::process::ExitCode {
    run(Cli::parse())
}
