use clap::Parser;
use log::error;

use fantail::cmd::{self, Cli};

fn main() {
    let cli = Cli::parse();
    if let Err(err) = cmd::init_logger(&cli) {
        eprintln!("Error: {:#}", err);
        std::process::exit(1);
    }
    if let Err(err) = cmd::run(&cli) {
        error!("{:#}", err);
        std::process::exit(1);
    }
}
