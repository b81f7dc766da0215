use std::time::{Duration, Instant};
use winit::{
    event::{self, WindowEvent},
    event_loop::{ControlFlow, EventLoop},
};

use crate::config::Config;
use crate::error::{Error, Result};

/**
 * Adapted from WGPU examples, but with the wasm32 target and other
 * non-essential code removed.
 * */

/// A trait that defines the interface for an application.
/// The framework will call the methods on this trait to run the application.
pub trait Application: 'static + Sized {
    /// Defines the optional features that the application requires. They will be enabled if the
    /// adapter supports them.
    fn optional_features() -> wgpu::Features {
        wgpu::Features::empty()
    }

    /// Defines the required features for the application. Setup fails if the adapter does not
    /// support them.
    fn required_features() -> wgpu::Features {
        wgpu::Features::empty()
    }

    /// Returns the required downlevel capabilities that the application requires.
    fn required_downlevel_capabilities() -> wgpu::DownlevelCapabilities {
        wgpu::DownlevelCapabilities {
            flags: wgpu::DownlevelFlags::empty(),
            shader_model: wgpu::ShaderModel::Sm5,
            ..wgpu::DownlevelCapabilities::default()
        }
    }

    /// Returns the limits that the application requires.
    fn required_limits() -> wgpu::Limits {
        wgpu::Limits::downlevel_webgl2_defaults() // These downlevel limits will allow the code to run on all possible hardware
    }

    /// Constructs an initial instance of the application.
    fn init(
        settings: &Config,
        config: &wgpu::SurfaceConfiguration,
        adapter: &wgpu::Adapter,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
    ) -> Result<Self>;

    /// Called on WindowEvent::Resized events.
    fn resize(
        &mut self,
        config: &wgpu::SurfaceConfiguration,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
    );

    /// Called for any WindowEvent that is not handled by the framework.
    fn handle_event(&mut self, event: WindowEvent);

    /// Advances the application state by one step. Called once per frame, before `render`.
    fn update(&mut self);

    /// Called every frame.
    fn render(&mut self, view: &wgpu::TextureView, device: &wgpu::Device, queue: &wgpu::Queue);

    /// Releases GPU resources. Called exactly once, when the loop starts exiting.
    fn teardown(&mut self);
}

/// State of the render loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Running,
    Exiting,
}

impl LoopState {
    pub fn is_running(self) -> bool {
        self == Self::Running
    }

    /// Moves to `Exiting`. Returns `true` only for the call that made the
    /// transition, so teardown can be tied to it.
    pub fn request_exit(&mut self) -> bool {
        let was_running = self.is_running();
        *self = Self::Exiting;
        was_running
    }
}

/// Whether the event asks the loop to stop: a close request or Escape.
pub fn is_exit_request(event: &WindowEvent) -> bool {
    matches!(
        event,
        WindowEvent::CloseRequested
            | WindowEvent::KeyboardInput {
                input: event::KeyboardInput {
                    virtual_keycode: Some(event::VirtualKeyCode::Escape),
                    state: event::ElementState::Pressed,
                    ..
                },
                ..
            }
    )
}

/// Running frame-time average, reported every few seconds.
#[derive(Debug, Default)]
struct FrameStats {
    frame_count: u32,
    accum_time: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct FrameReport {
    frame_count: u32,
    avg_frame_ms: f32,
    fps: f32,
}

impl FrameStats {
    const MIN_FRAMES: u32 = 1000;
    const MIN_SECONDS: f32 = 5.0;

    fn record(&mut self, timestep: Duration) -> Option<FrameReport> {
        self.accum_time += timestep.as_secs_f32();
        self.frame_count += 1;
        if self.frame_count < Self::MIN_FRAMES || self.accum_time <= Self::MIN_SECONDS {
            return None;
        }
        let report = FrameReport {
            frame_count: self.frame_count,
            avg_frame_ms: self.accum_time * 1000.0 / self.frame_count as f32,
            fps: self.frame_count as f32 / self.accum_time,
        };
        *self = Self::default();
        Some(report)
    }
}

struct Setup {
    window: winit::window::Window,
    event_loop: EventLoop<()>,
    instance: wgpu::Instance,
    size: winit::dpi::PhysicalSize<u32>,
    surface: wgpu::Surface,
    adapter: wgpu::Adapter,
    device: wgpu::Device,
    queue: wgpu::Queue,
}

async fn setup<E: Application>(title: &str, settings: &Config) -> Result<Setup> {
    let event_loop = EventLoop::new();
    let window = winit::window::WindowBuilder::new()
        .with_title(title)
        .with_inner_size(winit::dpi::LogicalSize::new(
            settings.window_width,
            settings.window_height,
        ))
        .build(&event_loop)?;

    log::info!("Initializing the surface...");

    let backends = wgpu::util::backend_bits_from_env().unwrap_or_else(wgpu::Backends::all);
    let dx12_shader_compiler = wgpu::util::dx12_shader_compiler_from_env().unwrap_or_default();

    let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
        backends,
        dx12_shader_compiler,
    });
    let (size, surface) = unsafe {
        let size = window.inner_size();

        let surface = instance.create_surface(&window)?;

        (size, surface)
    };
    let adapter =
        wgpu::util::initialize_adapter_from_env_or_default(&instance, backends, Some(&surface))
            .await
            .ok_or_else(|| {
                Error::GraphicsContextInit("no suitable GPU adapters found on the system".into())
            })?;

    let adapter_info = adapter.get_info();
    log::info!("Using {} ({:?})", adapter_info.name, adapter_info.backend);

    let optional_features = E::optional_features();
    let required_features = E::required_features();
    let adapter_features = adapter.features();
    if !adapter_features.contains(required_features) {
        return Err(Error::GraphicsContextInit(format!(
            "adapter does not support required features: {:?}",
            required_features - adapter_features
        )));
    }

    let required_downlevel_capabilities = E::required_downlevel_capabilities();
    let downlevel_capabilities = adapter.get_downlevel_capabilities();
    if downlevel_capabilities.shader_model < required_downlevel_capabilities.shader_model {
        return Err(Error::GraphicsContextInit(format!(
            "adapter does not support the minimum shader model: {:?}",
            required_downlevel_capabilities.shader_model
        )));
    }
    if !downlevel_capabilities
        .flags
        .contains(required_downlevel_capabilities.flags)
    {
        return Err(Error::GraphicsContextInit(format!(
            "adapter does not support the required downlevel capabilities: {:?}",
            required_downlevel_capabilities.flags - downlevel_capabilities.flags
        )));
    }

    // Make sure we use the texture resolution limits from the adapter, so the field texture can be
    // as large as the adapter allows.
    let needed_limits = E::required_limits().using_resolution(adapter.limits());

    let trace_dir = std::env::var("WGPU_TRACE");
    let (device, queue) = adapter
        .request_device(
            &wgpu::DeviceDescriptor {
                label: None,
                features: (optional_features & adapter_features) | required_features,
                limits: needed_limits,
            },
            trace_dir.ok().as_ref().map(std::path::Path::new),
        )
        .await?;

    Ok(Setup {
        window,
        event_loop,
        instance,
        size,
        surface,
        adapter,
        device,
        queue,
    })
}

fn start<E: Application>(
    Setup {
        window,
        event_loop,
        instance,
        size,
        surface,
        adapter,
        device,
        queue,
    }: Setup,
    settings: &Config,
) -> Result<()> {
    let mut config = surface
        .get_default_config(&adapter, size.width, size.height)
        .ok_or_else(|| {
            Error::GraphicsContextInit("surface isn't supported by the adapter".into())
        })?;

    let surface_caps = surface.get_capabilities(&adapter);

    // Change the format to BgraUnorm if it is supported.
    // This format is the only one supported by Wayland on Nvidia.
    if surface_caps
        .formats
        .contains(&wgpu::TextureFormat::Bgra8Unorm)
    {
        config.format = wgpu::TextureFormat::Bgra8Unorm;
    }

    // Change the present mode to AutoVsync. It is supported on all platforms.
    config.present_mode = wgpu::PresentMode::AutoVsync;

    surface.configure(&device, &config);

    log::info!("Initializing the program...");
    let mut program = E::init(settings, &config, &adapter, &device, &queue)?;

    let mut state = LoopState::Running;
    let mut stats = FrameStats::default();
    let mut last_frame_inst = Instant::now();

    log::info!("Entering render loop...");
    event_loop.run(move |event, _, control_flow| {
        let _ = (&instance, &adapter); // force ownership by the closure
        *control_flow = ControlFlow::Poll;
        match event {
            event::Event::RedrawEventsCleared => {
                window.request_redraw();
            }
            event::Event::WindowEvent {
                event:
                    WindowEvent::Resized(size)
                    | WindowEvent::ScaleFactorChanged {
                        new_inner_size: &mut size,
                        ..
                    },
                ..
            } => {
                log::info!("Resizing to {:?}", size);
                config.width = size.width.max(1);
                config.height = size.height.max(1);
                program.resize(&config, &device, &queue);
                surface.configure(&device, &config);
            }
            event::Event::WindowEvent { event, .. } => {
                if is_exit_request(&event) {
                    if state.request_exit() {
                        log::info!("Exit requested, shutting down...");
                        program.teardown();
                    }
                    *control_flow = ControlFlow::Exit;
                } else {
                    program.handle_event(event);
                }
            }
            event::Event::RedrawRequested(_) if state.is_running() => {
                let timestep = last_frame_inst.elapsed();
                last_frame_inst = Instant::now();
                if let Some(report) = stats.record(timestep) {
                    log::info!(
                        "Avg frame time {}ms, timestep {}ms, {} frames = {} FPS",
                        report.avg_frame_ms,
                        timestep.as_secs_f32() * 1000.0,
                        report.frame_count,
                        report.fps,
                    );
                }

                program.update();

                let frame = match surface.get_current_texture() {
                    Ok(frame) => frame,
                    Err(_) => {
                        surface.configure(&device, &config);
                        match surface.get_current_texture() {
                            Ok(frame) => frame,
                            Err(err) => {
                                log::error!("Failed to acquire next surface texture: {err}");
                                return;
                            }
                        }
                    }
                };
                let view = frame
                    .texture
                    .create_view(&wgpu::TextureViewDescriptor::default());

                program.render(&view, &device, &queue);

                frame.present();
            }
            event::Event::LoopDestroyed => {
                if state.request_exit() {
                    program.teardown();
                }
            }
            _ => {}
        }
    })
}

/// Runs the application until the window is closed.
/// Usage:
/// ```ignore
/// framework::run::<MyApplication>("My Title", &Config::default())?;
/// ```
/// Returns only if setup fails; once the loop starts the process exits from
/// inside it.
pub fn run<E: Application>(title: &str, settings: &Config) -> Result<()> {
    let setup = pollster::block_on(setup::<E>(title, settings))?;
    start::<E>(setup, settings)
}
