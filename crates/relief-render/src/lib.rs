//! wgpu rendering for the heightfield: GPU context, shader compilation and
//! linking, heightmap texture upload, orbit camera, and frame encoding.

pub mod camera;
pub mod depth;
pub mod gpu;
pub mod grid;
pub mod pass;
pub mod program;
pub mod shader;
pub mod texture;

pub use camera::{
    DEFAULT_CAMERA_HEIGHT, DEFAULT_ORBIT_RADIUS, DEFAULT_ORBIT_STEP, OrbitCamera, PerspectiveParams,
    TransformState,
};
pub use depth::DepthBuffer;
pub use gpu::{RenderContext, RenderContextError, SurfaceError, init_render_context_blocking};
pub use grid::{GRID_TILES, GRID_VERTEX_COUNT, draw_heightfield, grid_vertex};
pub use pass::{CLEAR_GREY, FrameEncoder, RenderPassBuilder};
pub use program::{GpuProgram, TEXTURE_GROUP, UNIFORM_GROUP};
pub use shader::{
    CompiledShader, INFO_LOG_CAPACITY, ShaderError, ShaderProgram, ShaderStage, UniformInfo,
    UniformLocation, build_program, compile_shader, load_shader_source,
};
pub use texture::{
    HEIGHT_TEXTURE_FORMAT, HeightTexture, TextureError, height_texture_layout, upload_heightmap,
};
