use crate::config::Config;
use crate::error::{Error, Result};
use crate::field::seed::seed;
use crate::field::step::{FieldStepper, Stationary};
use crate::field::ScalarField;
use crate::framework::Application;
use crate::mesh::shapes::{self, QUAD_HALF_EXTENT};
use crate::mesh::{DrawMesh, Mesh, Vertex};
use crate::shader::{self, PipelineTarget, ShaderProgram};
use crate::texture::{FieldDisplay, Sampling, TextureLayout};

const BACKGROUND: wgpu::Color = wgpu::Color {
    r: 0.2,
    g: 0.3,
    b: 0.3,
    a: 1.0,
};

/// The fluid simulation: a scalar field stepped once per frame and drawn on a
/// quad.
pub struct Simulation {
    /// Absent pipeline means the shaders failed and nothing is drawn.
    program: ShaderProgram,

    /// Mesh the field is drawn on.
    quad: Mesh,

    display: FieldDisplay,
    stepper: Box<dyn FieldStepper>,
}

impl Application for Simulation {
    /// Lets `R32Float` be filtered on adapters that support it.
    fn optional_features() -> wgpu::Features {
        wgpu::Features::TEXTURE_ADAPTER_SPECIFIC_FORMAT_FEATURES
    }

    fn init(
        settings: &Config,
        config: &wgpu::SurfaceConfiguration,
        adapter: &wgpu::Adapter,
        device: &wgpu::Device,
        _queue: &wgpu::Queue,
    ) -> Result<Self> {
        let sampling = Sampling::supported(adapter, device);
        log::info!("Sampling the field texture with {sampling:?} filtering");
        let texture_layout = TextureLayout::new(device, sampling);
        let program = create_program(settings, config, device, &texture_layout)?;

        let quad = shapes::quad(device, QUAD_HALF_EXTENT);
        log::debug!("Quad mesh with {} indices", quad.index_count());

        let mut field = ScalarField::new(settings.field_width, settings.field_height)
            .ok_or_else(|| {
                Error::Config(format!(
                    "field size {}x{} must be non-zero",
                    settings.field_width, settings.field_height
                ))
            })?;
        seed(&mut field, &settings.drops, settings.drop_radius2);
        log::info!("Simulating a {}x{} field", field.width(), field.height());

        let display = FieldDisplay::new(device, &texture_layout, field)?;

        Ok(Self {
            program,
            quad,
            display,
            stepper: Box::new(Stationary),
        })
    }

    fn resize(
        &mut self,
        _config: &wgpu::SurfaceConfiguration,
        _device: &wgpu::Device,
        _queue: &wgpu::Queue,
    ) {
        // The quad is in clip space, so it follows the surface on its own.
    }

    fn handle_event(&mut self, _event: winit::event::WindowEvent) {
        // empty
    }

    fn update(&mut self) {
        self.stepper.step(self.display.field_mut());
    }

    fn render(&mut self, view: &wgpu::TextureView, device: &wgpu::Device, queue: &wgpu::Queue) {
        self.display.upload(queue);

        // Create render pass descriptor and its color attachments
        let color_attachment = [Some(wgpu::RenderPassColorAttachment {
            view,
            resolve_target: None,
            ops: wgpu::Operations {
                load: wgpu::LoadOp::Clear(BACKGROUND),
                store: true,
            },
        })];
        let render_pass_descriptor = wgpu::RenderPassDescriptor {
            label: Some("Render Pass"),
            color_attachments: &color_attachment,
            depth_stencil_attachment: None,
        };

        // Get the command encoder
        let mut command_encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Command Encoder"),
        });

        // Render pass
        command_encoder.push_debug_group("Render Pass");
        {
            let mut render_pass = command_encoder.begin_render_pass(&render_pass_descriptor);
            if let Some(pipeline) = self.program.pipeline() {
                render_pass.set_pipeline(pipeline);
                render_pass.set_bind_group(0, self.display.texture().bind_group(), &[]);
                render_pass.draw_mesh(&self.quad);
            }
        }
        command_encoder.pop_debug_group();

        // Submit the command encoder
        queue.submit(Some(command_encoder.finish()));
    }

    fn teardown(&mut self) {
        self.quad.destroy();
        self.display.destroy();
        log::info!("Released field texture and quad buffers");
    }
}

/// Reads both shader files and builds the program, applying the configured
/// failure policy.
fn create_program(
    settings: &Config,
    config: &wgpu::SurfaceConfiguration,
    device: &wgpu::Device,
    texture_layout: &TextureLayout,
) -> Result<ShaderProgram> {
    let vertex_source = shader::read_source(&settings.vertex_shader);
    let fragment_source = shader::read_source(&settings.fragment_shader);

    let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("Render Pipeline Layout"),
        bind_group_layouts: &[texture_layout.layout()],
        push_constant_ranges: &[],
    });

    let target = PipelineTarget {
        layout: &pipeline_layout,
        vertex_buffers: &[Vertex::desc()],
        format: config.format,
    };

    ShaderProgram::build(device, &vertex_source, &fragment_source, &target)
        .check(settings.strict_shaders)
}
