use std::process::ExitCode;

use clap::Parser;
use ilc_cli::app::{execute, exit_status};
use ilc_cli::cli_args::Args;
use log::LevelFilter;

fn init_logging(debug: bool) {
    let mut builder = env_logger::Builder::from_default_env();
    if debug {
        builder.filter_level(LevelFilter::Debug);
    }
    builder.init();
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(args.debug);

    ExitCode::from(exit_status(&execute(&args)))
}
