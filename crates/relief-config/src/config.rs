//! Configuration structs with sensible defaults and RON persistence.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// File name of the persisted configuration inside the config directory.
pub const CONFIG_FILE_NAME: &str = "config.ron";

const APP_DIR_NAME: &str = "relief";

/// Top-level viewer configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Window settings.
    pub window: WindowConfig,
    /// Heightfield scene settings.
    pub scene: SceneConfig,
    /// Debug/development settings.
    pub debug: DebugConfig,
}

/// Window configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct WindowConfig {
    /// Window width in logical pixels.
    pub width: u32,
    /// Window height in logical pixels.
    pub height: u32,
    /// Wait for vertical blank before presenting (swap interval 1).
    pub vsync: bool,
    /// Window title.
    pub title: String,
}

/// Pixel position of the landmark spire painted into the heightmap.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct LandmarkConfig {
    pub x: u32,
    pub y: u32,
}

/// Heightfield scene configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SceneConfig {
    /// Path to the 24-bit BMP heightmap.
    pub heightmap_path: PathBuf,
    /// Directory holding the WGSL shader files.
    pub shader_dir: PathBuf,
    /// Vertex shader file name, relative to `shader_dir`.
    pub vertex_shader: String,
    /// Fragment shader file name, relative to `shader_dir`.
    pub fragment_shader: String,
    /// Orbit angle increment per frame, in radians.
    pub orbit_step: f32,
    /// Horizontal distance of the camera from the origin.
    pub orbit_radius: f32,
    /// Camera height above the origin.
    pub camera_height: f32,
    /// Vertical field of view in degrees.
    pub fov_y_degrees: f32,
    /// Near clip plane distance.
    pub near: f32,
    /// Far clip plane distance.
    pub far: f32,
    /// Translation applied to the grid (model matrix).
    pub model_offset: [f32; 3],
    /// Landmark spire location; `None` leaves the heightmap untouched.
    pub landmark: Option<LandmarkConfig>,
    /// Framebuffer clear color (RGBA).
    pub clear_color: [f64; 4],
}

/// Debug/development configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DebugConfig {
    /// Log filter override (e.g., "debug", "info,relief_render=trace").
    pub log_level: String,
    /// Log the frame counter and orbit angle every this many frames (0 = off).
    pub frame_log_interval: u64,
}

// --- Default implementations ---

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            width: 800,
            height: 600,
            vsync: true,
            title: "Oh look a heightmap!".to_string(),
        }
    }
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            heightmap_path: PathBuf::from("assets/HeightMap.bmp"),
            shader_dir: PathBuf::from("shaders"),
            vertex_shader: "heightfield.vert.wgsl".to_string(),
            fragment_shader: "heightfield.frag.wgsl".to_string(),
            orbit_step: 0.0025,
            orbit_radius: 3.5,
            camera_height: 2.0,
            fov_y_degrees: 45.0,
            near: 0.1,
            far: 1000.0,
            model_offset: [-2.5, -0.2, -2.5],
            landmark: Some(LandmarkConfig { x: 270, y: 962 }),
            clear_color: [0.5, 0.5, 0.5, 1.0],
        }
    }
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            frame_log_interval: 600,
        }
    }
}

impl SceneConfig {
    /// Full path of the vertex shader file.
    pub fn vertex_shader_path(&self) -> PathBuf {
        self.shader_dir.join(&self.vertex_shader)
    }

    /// Full path of the fragment shader file.
    pub fn fragment_shader_path(&self) -> PathBuf {
        self.shader_dir.join(&self.fragment_shader)
    }
}

// --- Load / Save ---

/// Where [`Config::load_or_create`] got its configuration from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigOrigin {
    /// Read from an existing file.
    Loaded(PathBuf),
    /// No file existed; defaults were written here.
    Created(PathBuf),
}

impl std::fmt::Display for ConfigOrigin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Loaded(path) => write!(f, "loaded config from {}", path.display()),
            Self::Created(path) => write!(f, "created default config at {}", path.display()),
        }
    }
}

impl Config {
    /// The platform configuration directory for the viewer
    /// (e.g. `~/.config/relief` on Linux).
    pub fn default_dir() -> Result<PathBuf, ConfigError> {
        dirs::config_dir()
            .map(|base| base.join(APP_DIR_NAME))
            .ok_or(ConfigError::NoConfigDir)
    }

    /// Load config from the given directory, or create a default config file.
    ///
    /// Nothing is logged; the caller reports the returned [`ConfigOrigin`]
    /// once logging is initialised.
    pub fn load_or_create(config_dir: &Path) -> Result<(Self, ConfigOrigin), ConfigError> {
        let config_path = config_dir.join(CONFIG_FILE_NAME);

        if config_path.exists() {
            let contents = std::fs::read_to_string(&config_path).map_err(ConfigError::ReadError)?;
            let config: Config = ron::from_str(&contents).map_err(ConfigError::ParseError)?;
            Ok((config, ConfigOrigin::Loaded(config_path)))
        } else {
            let config = Config::default();
            config.save(config_dir)?;
            Ok((config, ConfigOrigin::Created(config_path)))
        }
    }

    /// Save config to the given directory as `config.ron`.
    pub fn save(&self, config_dir: &Path) -> Result<(), ConfigError> {
        std::fs::create_dir_all(config_dir).map_err(ConfigError::WriteError)?;

        let config_path = config_dir.join(CONFIG_FILE_NAME);
        let pretty = ron::ser::PrettyConfig::new()
            .depth_limit(3)
            .separate_tuple_members(true)
            .enumerate_arrays(false);

        let serialized =
            ron::ser::to_string_pretty(self, pretty).map_err(ConfigError::SerializeError)?;

        std::fs::write(&config_path, serialized).map_err(ConfigError::WriteError)?;
        Ok(())
    }
}
