mod cli;

use clap::Parser;

use crate::cli::Cli;

fn main() {
    let cli = Cli::parse();
    if let Err(err) = cli.run() {
        eprintln!("dsync error: {:#}", err);
        std::process::exit(1);
    }
}
