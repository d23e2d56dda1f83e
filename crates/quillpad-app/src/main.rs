//! Quillpad command-line entry point.

use clap::Parser;
use quillpad_app::Cli;

fn main() {
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
    log::info!("Starting Quillpad");

    if let Err(e) = quillpad_app::run(&cli) {
        log::error!("{}", e);
        std::process::exit(1);
    }
}
