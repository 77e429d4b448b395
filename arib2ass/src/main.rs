use std::process::ExitCode;

use clap::Parser;
use log::error;

use arib2ass::config::{find_config, load_config, ConfigFile, Settings};
use arib2ass::context::Cli;
use arib2ass::logging::init_logging;

fn main() -> ExitCode {
    // Usage errors exit with 2 from here.
    let cli = Cli::parse();

    // Config file: explicit path > auto-detect > default
    let file_config = match find_config(cli.config.as_deref()) {
        Some(path) => match load_config(&path) {
            Ok(c) => {
                eprintln!("Loaded config from: {}", path.display());
                c
            }
            Err(e) => {
                eprintln!("Failed to load config file: {}", e);
                return ExitCode::FAILURE;
            }
        },
        None => ConfigFile::default(),
    };

    let settings = Settings::resolve(&cli, file_config);
    init_logging(settings.verbose, settings.log_level.as_deref());

    match arib2ass::run(&settings) {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
