//! Viewer binary.
//!
//! Configuration is loaded from `config.ron` and can be overridden via CLI flags:
//! `relief --heightmap assets/HeightMap.bmp --width 1280 --height 720`.

use std::process::ExitCode;

use clap::Parser;
use relief_config::{CliArgs, Config};
use tracing::{error, info, warn};

fn main() -> ExitCode {
    let args = CliArgs::parse();

    let config_dir = match args.config.clone().map_or_else(Config::default_dir, Ok) {
        Ok(dir) => dir,
        Err(e) => {
            eprintln!("Failed to resolve config directory: {e}");
            return ExitCode::FAILURE;
        }
    };

    let (mut config, origin) = match Config::load_or_create(&config_dir) {
        Ok((config, origin)) => (config, Ok(origin)),
        Err(e) => (Config::default(), Err(e)),
    };
    config.apply_cli_overrides(&args);

    let log_dir = config_dir.join("logs");
    relief_log::init_logging(Some(&log_dir), cfg!(debug_assertions), Some(&config));
    match origin {
        Ok(origin) => info!("{origin}"),
        Err(e) => warn!("Failed to load config: {e}, using defaults"),
    }
    info!(
        heightmap = %config.scene.heightmap_path.display(),
        shaders = %config.scene.shader_dir.display(),
        "Starting relief"
    );

    match relief_app::run_with_config(config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}
