//! The relief viewer: a window showing a heightmap as a terrain mesh seen
//! from a camera that circles it forever.

pub mod scene;
pub mod window;

pub use scene::{HeightfieldScene, MVP_UNIFORM, SceneError};
pub use window::{AppError, AppState, run_with_config};
