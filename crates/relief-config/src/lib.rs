//! Configuration system for the relief heightmap viewer.
//!
//! Settings persist to disk as a RON file and can be overridden from the
//! command line. Missing fields fall back to defaults so older and newer
//! config files both load.

mod cli;
mod config;
mod error;

pub use cli::CliArgs;
pub use config::{
    CONFIG_FILE_NAME, Config, ConfigOrigin, DebugConfig, LandmarkConfig, SceneConfig, WindowConfig,
};
pub use error::ConfigError;
