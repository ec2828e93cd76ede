//! Window creation and event handling via winit.
//!
//! [`AppState`] implements winit's [`ApplicationHandler`]: it opens the
//! window on `resumed`, builds the GPU context and the heightfield scene,
//! then updates and draws one frame per `RedrawRequested` until the window
//! is closed.

use std::sync::Arc;

use relief_config::Config;
use relief_render::{FrameEncoder, RenderContext, SurfaceError, init_render_context_blocking};
use tracing::{error, info, instrument, warn};
use winit::application::ApplicationHandler;
use winit::event::{ElementState, WindowEvent};
use winit::event_loop::{ActiveEventLoop, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowAttributes, WindowId};

use crate::scene::HeightfieldScene;

/// Failure that ends the application.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("event loop error: {0}")]
    EventLoop(#[from] winit::error::EventLoopError),

    #[error("startup failed: {0}")]
    Startup(String),
}

/// Returns [`WindowAttributes`] based on the given configuration.
pub fn window_attributes_from_config(config: &Config) -> WindowAttributes {
    WindowAttributes::default()
        .with_title(config.window.title.clone())
        .with_inner_size(winit::dpi::PhysicalSize::new(
            config.window.width,
            config.window.height,
        ))
}

/// Whether a key event should close the viewer.
pub fn is_exit_key(key: PhysicalKey, state: ElementState) -> bool {
    state == ElementState::Pressed && key == PhysicalKey::Code(KeyCode::Escape)
}

/// Application state: window, GPU context and scene.
pub struct AppState {
    pub config: Config,
    pub window: Option<Arc<Window>>,
    pub gpu: Option<RenderContext>,
    pub scene: Option<HeightfieldScene>,
    /// Set when startup failed; reported by [`run_with_config`].
    pub startup_error: Option<String>,
}

impl AppState {
    pub fn with_config(config: Config) -> Self {
        Self {
            config,
            window: None,
            gpu: None,
            scene: None,
            startup_error: None,
        }
    }

    fn fail_startup(&mut self, event_loop: &ActiveEventLoop, message: String) {
        error!("{message}");
        self.startup_error = Some(message);
        event_loop.exit();
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        let (Some(gpu), Some(scene)) = (&self.gpu, &mut self.scene) else {
            return;
        };

        scene.update(&gpu.queue);

        match gpu.get_current_texture() {
            Ok(surface_texture) => {
                if let Some(window) = &self.window {
                    window.pre_present_notify();
                }
                let mut frame = FrameEncoder::new(&gpu.device, &gpu.queue, surface_texture);
                scene.render(&mut frame);
                frame.submit();
            }
            Err(SurfaceError::Timeout) => {
                warn!("Surface timeout, skipping frame");
            }
            Err(e) => {
                error!("Failed to acquire surface texture: {e}");
                event_loop.exit();
                return;
            }
        }

        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::with_config(Config::default())
    }
}

impl ApplicationHandler for AppState {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let attrs = window_attributes_from_config(&self.config);
        let window = match event_loop.create_window(attrs) {
            Ok(window) => Arc::new(window),
            Err(e) => {
                self.fail_startup(event_loop, format!("Failed to create window: {e}"));
                return;
            }
        };

        let gpu = match init_render_context_blocking(window.clone(), self.config.window.vsync) {
            Ok(gpu) => gpu,
            Err(e) => {
                self.fail_startup(event_loop, format!("GPU initialization failed: {e}"));
                return;
            }
        };

        match HeightfieldScene::new(
            &gpu.device,
            &gpu.queue,
            gpu.surface_format,
            gpu.size(),
            &self.config.scene,
        ) {
            Ok(scene) => {
                self.scene =
                    Some(scene.with_frame_log_interval(self.config.debug.frame_log_interval));
            }
            Err(e) => {
                self.fail_startup(event_loop, format!("Scene setup failed: {e}"));
                return;
            }
        }

        window.request_redraw();
        self.gpu = Some(gpu);
        self.window = Some(window);
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested => {
                info!("Close requested, shutting down");
                event_loop.exit();
            }
            WindowEvent::KeyboardInput { event, .. }
                if is_exit_key(event.physical_key, event.state) =>
            {
                info!("Escape pressed, shutting down");
                event_loop.exit();
            }
            WindowEvent::Resized(new_size) => {
                let (w, h) = (new_size.width, new_size.height);
                if w == 0 || h == 0 {
                    return;
                }
                if let Some(gpu) = &mut self.gpu {
                    gpu.resize(w, h);
                    if let Some(scene) = &mut self.scene {
                        scene.resize(&gpu.device, w, h);
                    }
                }
                info!("Window resized to {w}x{h}");
            }
            WindowEvent::RedrawRequested => self.redraw(event_loop),
            _ => {}
        }
    }
}

/// Creates an event loop and runs the viewer with the given config.
///
/// Blocks until the window is closed.
#[instrument(skip(config))]
pub fn run_with_config(config: Config) -> Result<(), AppError> {
    let event_loop = EventLoop::new()?;
    let mut app = AppState::with_config(config);
    event_loop.run_app(&mut app)?;

    match app.startup_error {
        Some(message) => Err(AppError::Startup(message)),
        None => Ok(()),
    }
}
