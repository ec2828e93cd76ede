//! Per-frame command encoding.
//!
//! [`RenderPassBuilder`] describes the clear colour and depth attachment of
//! the single pass a frame uses; [`FrameEncoder`] owns the command encoder
//! and the target view for one frame and submits (and presents) it.

/// Mid grey, the heightfield's background.
pub const CLEAR_GREY: wgpu::Color = wgpu::Color {
    r: 0.5,
    g: 0.5,
    b: 0.5,
    a: 1.0,
};

#[derive(Debug)]
pub struct DepthAttachmentConfig {
    pub view: wgpu::TextureView,
    pub clear_value: f32,
}

/// Builder for the frame's render pass.
#[derive(Debug)]
pub struct RenderPassBuilder {
    clear_color: wgpu::Color,
    depth_attachment: Option<DepthAttachmentConfig>,
    label: Option<&'static str>,
}

impl Default for RenderPassBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderPassBuilder {
    /// A pass that clears to [`CLEAR_GREY`] with no depth attachment.
    pub fn new() -> Self {
        Self {
            clear_color: CLEAR_GREY,
            depth_attachment: None,
            label: None,
        }
    }

    pub fn clear_color(mut self, color: wgpu::Color) -> Self {
        self.clear_color = color;
        self
    }

    /// Attach a depth buffer, cleared to `clear_value` at the start of the pass.
    pub fn depth(mut self, view: wgpu::TextureView, clear_value: f32) -> Self {
        self.depth_attachment = Some(DepthAttachmentConfig { view, clear_value });
        self
    }

    pub fn label(mut self, label: &'static str) -> Self {
        self.label = Some(label);
        self
    }

    fn create_render_pass<'encoder>(
        &self,
        encoder: &'encoder mut wgpu::CommandEncoder,
        color_view: &'encoder wgpu::TextureView,
    ) -> wgpu::RenderPass<'encoder> {
        let color_attachment = wgpu::RenderPassColorAttachment {
            view: color_view,
            resolve_target: None,
            ops: wgpu::Operations {
                load: wgpu::LoadOp::Clear(self.clear_color),
                store: wgpu::StoreOp::Store,
            },
            depth_slice: None,
        };

        let depth_stencil_attachment =
            self.depth_attachment
                .as_ref()
                .map(|depth| wgpu::RenderPassDepthStencilAttachment {
                    view: &depth.view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(depth.clear_value),
                        store: wgpu::StoreOp::Discard,
                    }),
                    stencil_ops: None,
                });

        encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: self.label,
            color_attachments: &[Some(color_attachment)],
            depth_stencil_attachment,
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        })
    }
}

/// Command encoding for one frame.
///
/// Built either around an acquired surface texture, which is presented on
/// [`submit`](Self::submit), or around an offscreen view.
pub struct FrameEncoder {
    encoder: wgpu::CommandEncoder,
    queue: wgpu::Queue,
    surface_texture: Option<wgpu::SurfaceTexture>,
    view: wgpu::TextureView,
}

impl FrameEncoder {
    pub fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        surface_texture: wgpu::SurfaceTexture,
    ) -> Self {
        let view = surface_texture
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        Self {
            encoder: create_encoder(device),
            queue: queue.clone(),
            surface_texture: Some(surface_texture),
            view,
        }
    }

    /// Encode into an offscreen color target. Nothing is presented.
    pub fn offscreen(device: &wgpu::Device, queue: &wgpu::Queue, view: wgpu::TextureView) -> Self {
        Self {
            encoder: create_encoder(device),
            queue: queue.clone(),
            surface_texture: None,
            view,
        }
    }

    pub fn begin_render_pass<'a>(
        &'a mut self,
        builder: &'a RenderPassBuilder,
    ) -> wgpu::RenderPass<'a> {
        builder.create_render_pass(&mut self.encoder, &self.view)
    }

    /// Submit the recorded commands and present the surface texture, if any.
    pub fn submit(self) {
        self.queue.submit([self.encoder.finish()]);
        if let Some(surface_texture) = self.surface_texture {
            surface_texture.present();
        }
    }
}

fn create_encoder(device: &wgpu::Device) -> wgpu::CommandEncoder {
    device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
        label: Some("frame-encoder"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::texture::create_test_device_queue;

    #[test]
    fn test_default_clear_color_is_grey() {
        let builder = RenderPassBuilder::new();
        assert_eq!(builder.clear_color, CLEAR_GREY);
        assert_eq!(
            (CLEAR_GREY.r, CLEAR_GREY.g, CLEAR_GREY.b, CLEAR_GREY.a),
            (0.5, 0.5, 0.5, 1.0)
        );
    }

    #[test]
    fn test_builder_sets_clear_color() {
        let builder = RenderPassBuilder::new().clear_color(wgpu::Color::RED);
        assert_eq!(builder.clear_color, wgpu::Color::RED);
    }

    #[test]
    fn test_depth_attachment_is_optional() {
        let builder = RenderPassBuilder::new().label("heightfield");
        assert!(builder.depth_attachment.is_none());
        assert_eq!(builder.label, Some("heightfield"));
    }

    #[test]
    fn test_offscreen_clear_submits() {
        let Some((device, queue)) = create_test_device_queue() else {
            return;
        };
        let target = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("offscreen-target"),
            size: wgpu::Extent3d {
                width: 4,
                height: 4,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8Unorm,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        let view = target.create_view(&wgpu::TextureViewDescriptor::default());

        let mut frame = FrameEncoder::offscreen(&device, &queue, view);
        let builder = RenderPassBuilder::new();
        {
            let _pass = frame.begin_render_pass(&builder);
        }
        frame.submit();
    }
}
