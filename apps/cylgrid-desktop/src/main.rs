use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use cylgrid_common::SceneConfig;
use cylgrid_render::{RenderOrchestrator, ShaderSource, SystemClock, TimeSource};
use cylgrid_render_wgpu::{WgpuDevice, builtin_shaders};
use tracing_subscriber::EnvFilter;
use winit::application::ApplicationHandler;
use winit::dpi::{PhysicalPosition, PhysicalSize};
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{Window, WindowId};

#[derive(Parser)]
#[command(name = "cylgrid-desktop", about = "Instanced cylinder grid viewer")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Scene config (YAML); defaults apply to anything it leaves out
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Fixed color seed instead of the wall clock
    #[arg(short, long)]
    seed: Option<u64>,

    /// Directory holding cylinder.vert.wgsl and cylinder.frag.wgsl
    #[arg(long)]
    shader_dir: Option<PathBuf>,
}

/// Window plus the pipeline drawing into it. Both exist only between
/// `resumed` and exit.
struct Viewer {
    window: Arc<Window>,
    orchestrator: RenderOrchestrator<WgpuDevice>,
    clock: SystemClock,
}

struct DesktopApp {
    config: SceneConfig,
    shaders: ShaderSource,
    viewer: Option<Viewer>,
    error: Option<anyhow::Error>,
}

impl DesktopApp {
    fn new(config: SceneConfig, shaders: ShaderSource) -> Self {
        Self {
            config,
            shaders,
            viewer: None,
            error: None,
        }
    }

    fn create_viewer(&self, event_loop: &ActiveEventLoop) -> Result<Viewer> {
        let win = &self.config.window;
        let attrs = Window::default_attributes()
            .with_title(win.title.clone())
            .with_inner_size(PhysicalSize::new(win.width, win.height))
            .with_position(PhysicalPosition::new(win.position[0], win.position[1]));
        let window = Arc::new(event_loop.create_window(attrs).context("create window")?);

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });
        let surface = instance
            .create_surface(window.clone())
            .context("create surface")?;

        let size = window.inner_size();
        let device = WgpuDevice::new(&instance, surface, size.width, size.height)?;
        let aspect = device.aspect();

        let mut orchestrator = RenderOrchestrator::from_config(device, &self.config, &self.shaders)?;
        orchestrator.set_aspect(aspect);

        Ok(Viewer {
            window,
            orchestrator,
            clock: SystemClock::new(),
        })
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, err: anyhow::Error) {
        tracing::error!("{err:#}");
        self.error = Some(err);
        event_loop.exit();
    }
}

impl ApplicationHandler for DesktopApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.viewer.is_some() {
            return;
        }
        match self.create_viewer(event_loop) {
            Ok(viewer) => self.viewer = Some(viewer),
            Err(err) => self.fail(event_loop, err),
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        let Some(viewer) = &mut self.viewer else {
            return;
        };

        match event {
            WindowEvent::CloseRequested => {
                tracing::info!(
                    frames = viewer.orchestrator.frames_rendered(),
                    "window closed"
                );
                event_loop.exit();
            }
            WindowEvent::Resized(new_size) => {
                let device = viewer.orchestrator.device_mut();
                device.resize(new_size.width, new_size.height);
                let aspect = device.aspect();
                viewer.orchestrator.set_aspect(aspect);
            }
            WindowEvent::RedrawRequested => {
                let t = viewer.clock.seconds();
                if let Err(err) = viewer.orchestrator.frame(t) {
                    self.fail(event_loop, err.into());
                    return;
                }
                viewer.window.request_redraw();
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(viewer) = &self.viewer {
            viewer.window.request_redraw();
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    tracing::info!("cylgrid-desktop starting");

    let mut config = match &cli.config {
        Some(path) => {
            SceneConfig::load(path).with_context(|| format!("loading {}", path.display()))?
        }
        None => SceneConfig::default(),
    };
    if let Some(seed) = cli.seed {
        config.tint.seed = Some(seed);
    }
    config.validate()?;

    let shaders = match &cli.shader_dir {
        Some(dir) => ShaderSource::load(dir)?,
        None => builtin_shaders(),
    };

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = DesktopApp::new(config, shaders);
    event_loop.run_app(&mut app)?;

    match app.error {
        Some(err) => Err(err),
        None => Ok(()),
    }
}
