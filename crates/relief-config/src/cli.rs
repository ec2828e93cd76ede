//! Command-line argument parsing.

use std::path::PathBuf;

use clap::Parser;

use crate::Config;

/// Heightmap viewer command-line arguments.
///
/// CLI values override settings loaded from `config.ron`.
#[derive(Parser, Debug, Default)]
#[command(name = "relief", about = "Orbiting heightmap viewer")]
pub struct CliArgs {
    /// Window width.
    #[arg(long)]
    pub width: Option<u32>,

    /// Window height.
    #[arg(long)]
    pub height: Option<u32>,

    /// Wait for vertical blank before presenting.
    #[arg(long)]
    pub vsync: Option<bool>,

    /// Path to the 24-bit BMP heightmap.
    #[arg(long)]
    pub heightmap: Option<PathBuf>,

    /// Directory containing the WGSL shaders.
    #[arg(long)]
    pub shader_dir: Option<PathBuf>,

    /// Orbit angle increment per frame, in radians.
    #[arg(long)]
    pub orbit_step: Option<f32>,

    /// Log level (error, warn, info, debug, trace).
    #[arg(long)]
    pub log_level: Option<String>,

    /// Path to config directory (overrides default location).
    #[arg(long)]
    pub config: Option<PathBuf>,
}

impl Config {
    /// Apply CLI overrides to a loaded config.
    pub fn apply_cli_overrides(&mut self, args: &CliArgs) {
        if let Some(w) = args.width {
            self.window.width = w;
        }
        if let Some(h) = args.height {
            self.window.height = h;
        }
        if let Some(vsync) = args.vsync {
            self.window.vsync = vsync;
        }
        if let Some(ref path) = args.heightmap {
            self.scene.heightmap_path = path.clone();
        }
        if let Some(ref dir) = args.shader_dir {
            self.scene.shader_dir = dir.clone();
        }
        if let Some(step) = args.orbit_step {
            self.scene.orbit_step = step;
        }
        if let Some(ref level) = args.log_level {
            self.debug.log_level = level.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_override() {
        let mut config = Config::default();
        let args = CliArgs {
            width: Some(1920),
            heightmap: Some(PathBuf::from("maps/alps.bmp")),
            orbit_step: Some(0.01),
            ..CliArgs::default()
        };
        config.apply_cli_overrides(&args);
        assert_eq!(config.window.width, 1920);
        assert_eq!(config.scene.heightmap_path, PathBuf::from("maps/alps.bmp"));
        assert_eq!(config.scene.orbit_step, 0.01);
        // Non-overridden fields retain defaults
        assert_eq!(config.window.height, 600);
        assert_eq!(config.scene.orbit_radius, 3.5);
    }

    #[test]
    fn test_cli_no_override() {
        let original = Config::default();
        let mut config = Config::default();
        config.apply_cli_overrides(&CliArgs::default());
        assert_eq!(config, original);
    }

    #[test]
    fn test_cli_parses_flags() {
        let args = CliArgs::parse_from([
            "relief",
            "--vsync",
            "false",
            "--shader-dir",
            "custom/shaders",
            "--log-level",
            "debug",
        ]);
        assert_eq!(args.vsync, Some(false));
        assert_eq!(args.shader_dir, Some(PathBuf::from("custom/shaders")));
        assert_eq!(args.log_level.as_deref(), Some("debug"));
        assert!(args.width.is_none());
    }
}
