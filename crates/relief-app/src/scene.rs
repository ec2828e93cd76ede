//! The orbiting heightfield: everything needed to update and draw a frame.

use glam::Vec3;
use relief_config::SceneConfig;
use relief_heightmap::{BitmapError, Heightmap, Landmark, load_bitmap};
use relief_render::{
    DepthBuffer, FrameEncoder, GpuProgram, HeightTexture, OrbitCamera, PerspectiveParams,
    RenderPassBuilder, ShaderError, ShaderProgram, ShaderStage, TextureError, TransformState,
    UniformLocation, build_program, compile_shader, draw_heightfield, height_texture_layout,
    load_shader_source, upload_heightmap,
};
use tracing::{debug, info};

/// Name of the combined transform uniform in the vertex shader.
pub const MVP_UNIFORM: &str = "MVP";

/// Failure while setting up the scene.
#[derive(Debug, thiserror::Error)]
pub enum SceneError {
    #[error(transparent)]
    Shader(#[from] ShaderError),

    #[error(transparent)]
    Bitmap(#[from] BitmapError),

    #[error(transparent)]
    Texture(#[from] TextureError),
}

/// GPU resources and per-frame state of the heightfield view.
pub struct HeightfieldScene {
    program: GpuProgram,
    texture: HeightTexture,
    depth: DepthBuffer,
    transforms: TransformState,
    orbit: OrbitCamera,
    mvp: UniformLocation,
    clear_color: wgpu::Color,
    frame_count: u64,
    frame_log_interval: u64,
}

impl HeightfieldScene {
    /// Load the shaders and heightmap named in `config` and build the scene
    /// for a `size` framebuffer in `color_format`.
    pub fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        color_format: wgpu::TextureFormat,
        size: (u32, u32),
        config: &SceneConfig,
    ) -> Result<Self, SceneError> {
        let vertex = compile_shader(
            &load_shader_source(config.vertex_shader_path())?,
            ShaderStage::Vertex,
        )?;
        let fragment = compile_shader(
            &load_shader_source(config.fragment_shader_path())?,
            ShaderStage::Fragment,
        )?;
        let program = build_program(vertex, fragment)?;

        let landmark = config.landmark.map(|l| Landmark { x: l.x, y: l.y });
        let heightmap = load_bitmap(&config.heightmap_path, landmark)?;

        Self::from_parts(device, queue, color_format, size, config, &program, &heightmap)
    }

    /// Build the scene from an already linked program and loaded heightmap.
    pub fn from_parts(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        color_format: wgpu::TextureFormat,
        size: (u32, u32),
        config: &SceneConfig,
        program: &ShaderProgram,
        heightmap: &Heightmap,
    ) -> Result<Self, SceneError> {
        let texture_layout = height_texture_layout(device);
        let texture = upload_heightmap(device, queue, &texture_layout, heightmap)?;
        let gpu_program = GpuProgram::new(
            device,
            program,
            color_format,
            Some(DepthBuffer::FORMAT),
            &texture_layout,
        )?;
        let mvp = program.uniform_location(MVP_UNIFORM);
        if !mvp.is_valid() {
            tracing::warn!("Vertex shader declares no '{MVP_UNIFORM}' uniform");
        }

        let mut perspective = PerspectiveParams {
            fov_y_degrees: config.fov_y_degrees,
            near: config.near,
            far: config.far,
            ..PerspectiveParams::default()
        };
        perspective.set_aspect_ratio(size.0, size.1);
        let transforms = TransformState::new(Vec3::from_array(config.model_offset), perspective);

        let [r, g, b, a] = config.clear_color;
        info!(
            "Heightfield scene ready ({}x{} heightmap, {}x{} framebuffer)",
            heightmap.width(),
            heightmap.height(),
            size.0,
            size.1
        );

        Ok(Self {
            program: gpu_program,
            texture,
            depth: DepthBuffer::new(device, size.0, size.1),
            transforms,
            orbit: OrbitCamera::new(config.orbit_step, config.orbit_radius, config.camera_height),
            mvp,
            clear_color: wgpu::Color { r, g, b, a },
            frame_count: 0,
            frame_log_interval: 0,
        })
    }

    /// Log the orbit angle every `interval` frames at debug level. Zero
    /// disables it.
    pub fn with_frame_log_interval(mut self, interval: u64) -> Self {
        self.frame_log_interval = interval;
        self
    }

    /// Advance the orbit one step and upload the new `MVP`.
    pub fn update(&mut self, queue: &wgpu::Queue) {
        self.orbit.advance();
        self.transforms.view = self.orbit.view_matrix();
        self.program
            .set_uniform_mat4(queue, self.mvp, &self.transforms.combined());

        self.frame_count += 1;
        if self.frame_log_interval > 0 && self.frame_count % self.frame_log_interval == 0 {
            debug!(
                frame = self.frame_count,
                angle = self.orbit.angle(),
                "Orbit progress"
            );
        }
    }

    /// Clear the frame and draw the heightfield.
    pub fn render(&self, frame: &mut FrameEncoder) {
        let builder = RenderPassBuilder::new()
            .clear_color(self.clear_color)
            .depth(self.depth.view.clone(), DepthBuffer::CLEAR_VALUE)
            .label("heightfield-pass");
        let mut pass = frame.begin_render_pass(&builder);
        draw_heightfield(&mut pass, &self.program, &self.texture);
    }

    /// Follow a framebuffer resize: new aspect ratio and depth buffer.
    pub fn resize(&mut self, device: &wgpu::Device, width: u32, height: u32) {
        self.transforms.set_aspect_ratio(width, height);
        self.depth.resize(device, width, height);
    }

    pub fn transforms(&self) -> &TransformState {
        &self.transforms
    }

    pub fn orbit(&self) -> &OrbitCamera {
        &self.orbit
    }

    pub fn mvp_location(&self) -> UniformLocation {
        self.mvp
    }

    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }
}
