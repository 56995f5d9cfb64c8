use crate::camera::{Camera, CameraController, CameraUniform};
use crate::clock::FrameClock;
use crate::error::AppError;
use crate::galaxy::GalaxyState;
use crate::render::Render;
use crate::{CameraParams, GalaxyParameters, StarfieldParams};
use rand::{rngs::SmallRng, SeedableRng};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use wgpu::util::DeviceExt;
use winit::event::ElementState;
use winit::keyboard::*;
use winit::{
  dpi::{LogicalSize, PhysicalSize},
  event::{Event, KeyEvent, WindowEvent},
  event_loop::{EventLoop, EventLoopWindowTarget},
  window::Window,
};

const HEADLESS_FRAME: Duration = Duration::from_micros(16_667);
const STATS_EVERY: u64 = 300;

/// Everything the front end needs to start.
pub struct RunOptions {
  pub galaxy: GalaxyParameters,
  pub starfield: StarfieldParams,
  pub camera: CameraParams,
  /// Fixed seed for reproducible galaxies; entropy when absent.
  pub seed: Option<u64>,
  pub headless: bool,
  /// Headless only: number of frames to simulate.
  pub frames: u64,
  /// Headless only: explode at a particle every this many frames, 0 to disable.
  pub explode_every: u64,
}

struct EventLoopWrapper {
  event_loop: EventLoop<()>,
  window: Arc<Window>,
}

impl EventLoopWrapper {
  pub fn new(title: &str) -> Result<Self, AppError> {
    let event_loop = EventLoop::new()?;
    let mut builder = winit::window::WindowBuilder::new();
    builder = builder
      .with_title(title)
      .with_inner_size(LogicalSize::new(1280.0, 720.0));
    let window = Arc::new(builder.build(&event_loop)?);

    Ok(Self { event_loop, window })
  }
}

struct SurfaceWrapper {
  surface: wgpu::Surface<'static>,
  config: wgpu::SurfaceConfiguration,
}

impl SurfaceWrapper {
  fn resize(&mut self, device: &wgpu::Device, size: PhysicalSize<u32>) {
    self.config.width = size.width.max(1);
    self.config.height = size.height.max(1);
    self.surface.configure(device, &self.config);
  }

  fn acquire(&mut self, device: &wgpu::Device) -> Option<wgpu::SurfaceTexture> {
    match self.surface.get_current_texture() {
      Ok(frame) => Some(frame),
      Err(wgpu::SurfaceError::Timeout) => {
        log::warn!("surface timed out, skipping frame");
        None
      }
      Err(err) => {
        log::warn!("surface error ({err}), reconfiguring");
        self.surface.configure(device, &self.config);
        self.surface.get_current_texture().ok()
      }
    }
  }
}

struct State {
  device: wgpu::Device,
  queue: wgpu::Queue,
  surface: SurfaceWrapper,
  camera: Camera,
  camera_uniform: CameraUniform,
  camera_buffer: wgpu::Buffer,
  camera_bind_group: wgpu::BindGroup,
  camera_controller: CameraController,
  galaxy: GalaxyState,
  clock: FrameClock,
  render: Render,
}

impl State {
  fn input(&mut self, event: &WindowEvent) -> bool {
    self.camera_controller.process_events(event)
  }

  fn resize(&mut self, size: PhysicalSize<u32>) {
    self.surface.resize(&self.device, size);
    self.camera.resize(size.width, size.height);
  }

  fn update(&mut self) {
    let time = self.clock.tick();

    if let Some((x, y)) = self.camera_controller.take_click() {
      let ray = self.camera.ray_through(
        x as f32,
        y as f32,
        self.surface.config.width,
        self.surface.config.height,
      );
      if ray.and_then(|ray| self.galaxy.explode_along(&ray)).is_none() {
        log::debug!("click at ({x:.0}, {y:.0}) missed the galaxy");
      }
    }
    self.galaxy.advance(time);

    self.camera_controller.update_camera(&mut self.camera);
    self.camera_uniform.update_view_proj(&self.camera);
    self.queue.write_buffer(
      &self.camera_buffer,
      0,
      bytemuck::cast_slice(&[self.camera_uniform]),
    );

    if self.clock.frame() % STATS_EVERY == 0 {
      log::debug!(
        "frame {}: {:.1} fps, max displacement {:.4}",
        self.clock.frame(),
        self.clock.fps(),
        self.galaxy.particles().max_displacement()
      );
    }
  }

  fn draw(&mut self) {
    let Some(frame) = self.surface.acquire(&self.device) else {
      return;
    };
    let view = frame.texture.create_view(&wgpu::TextureViewDescriptor {
      format: Some(self.surface.config.view_formats[0]),
      ..wgpu::TextureViewDescriptor::default()
    });
    self.render.render(
      &view,
      &self.device,
      &self.queue,
      &self.camera_bind_group,
      &mut self.galaxy,
    );
    frame.present();
  }

  async fn init(
    window: Arc<Window>,
    mut galaxy: GalaxyState,
    camera_params: &CameraParams,
  ) -> Result<Self, AppError> {
    let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
      #[cfg(not(target_arch = "wasm32"))]
      backends: wgpu::Backends::PRIMARY,
      ..Default::default()
    });
    let size = window.inner_size();
    let surface = instance.create_surface(window)?;

    let adapter = instance
      .request_adapter(&wgpu::RequestAdapterOptions {
        power_preference: wgpu::PowerPreference::default(),
        compatible_surface: Some(&surface),
        force_fallback_adapter: false,
      })
      .await
      .ok_or(AppError::NoAdapter)?;
    log::info!("using GPU: {}", adapter.get_info().name);

    let (device, queue) = adapter
      .request_device(
        &wgpu::DeviceDescriptor {
          label: None,
          required_features: wgpu::Features::empty(),
          required_limits: wgpu::Limits::default(),
          memory_hints: Default::default(),
        },
        None,
      )
      .await?;

    let mut config = surface
      .get_default_config(&adapter, size.width.max(1), size.height.max(1))
      .ok_or(AppError::UnsupportedSurface)?;
    let view_format = config.format.add_srgb_suffix();
    config.view_formats.push(view_format);
    surface.configure(&device, &config);

    let camera = Camera::new(camera_params, config.width, config.height);
    let mut camera_uniform = CameraUniform::new();
    camera_uniform.update_view_proj(&camera);

    let camera_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
      label: Some("Camera Buffer"),
      contents: bytemuck::cast_slice(&[camera_uniform]),
      usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
    });
    let camera_bind_group_layout =
      device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        entries: &[wgpu::BindGroupLayoutEntry {
          binding: 0,
          visibility: wgpu::ShaderStages::VERTEX,
          ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: false,
            min_binding_size: None,
          },
          count: None,
        }],
        label: Some("camera_bind_group_layout"),
      });
    let camera_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
      layout: &camera_bind_group_layout,
      entries: &[wgpu::BindGroupEntry {
        binding: 0,
        resource: camera_buffer.as_entire_binding(),
      }],
      label: Some("camera_bind_group"),
    });
    let camera_controller = CameraController::init(camera_params);

    let render = Render::init(
      &config,
      &device,
      &queue,
      &camera_bind_group_layout,
      &mut galaxy,
    );

    Ok(Self {
      device,
      queue,
      surface: SurfaceWrapper { surface, config },
      camera,
      camera_uniform,
      camera_buffer,
      camera_bind_group,
      camera_controller,
      galaxy,
      clock: FrameClock::realtime(),
      render,
    })
  }
}

async fn start(galaxy: GalaxyState, camera_params: &CameraParams) -> Result<(), AppError> {
  let EventLoopWrapper { event_loop, window } = EventLoopWrapper::new("Particle Galaxy")?;
  let mut context = State::init(window.clone(), galaxy, camera_params).await?;
  window.request_redraw();

  event_loop.run(move |event, target: &EventLoopWindowTarget<()>| match event {
    Event::WindowEvent { event, window_id } if window_id == window.id() => {
      if !context.input(&event) {
        match event {
          WindowEvent::CloseRequested
          | WindowEvent::KeyboardInput {
            event:
              KeyEvent {
                state: ElementState::Pressed,
                physical_key: PhysicalKey::Code(KeyCode::Escape),
                ..
              },
            ..
          } => target.exit(),
          WindowEvent::Resized(size) => context.resize(size),
          WindowEvent::RedrawRequested => {
            context.update();
            context.draw();
            window.request_redraw();
          }
          _ => {}
        }
      }
    }
    _ => {}
  })?;
  Ok(())
}

/// Outcome of a headless simulation.
#[derive(Debug, Clone, PartialEq)]
pub struct HeadlessSummary {
  pub frames: u64,
  pub explosions: u64,
  pub displaced_particles: usize,
  pub max_displacement: f32,
}

/// Runs the animation without a window until `frames` frames have passed or
/// `running` is cleared.
pub fn simulate(
  galaxy: &mut GalaxyState,
  frames: u64,
  explode_every: u64,
  running: &AtomicBool,
) -> HeadlessSummary {
  let mut clock = FrameClock::fixed(HEADLESS_FRAME);
  let mut explosions = 0;
  let mut displaced_particles = 0;

  while running.load(Ordering::SeqCst) && clock.frame() < frames {
    let time = clock.tick();
    if explode_every > 0 && clock.frame() % explode_every == 0 {
      let target = (clock.frame() as usize).wrapping_mul(7919) % galaxy.particles().len();
      let center = galaxy.particles().position(target);
      displaced_particles += galaxy.explode(center);
      explosions += 1;
    }
    galaxy.advance(time);
  }

  HeadlessSummary {
    frames: clock.frame(),
    explosions,
    displaced_particles,
    max_displacement: galaxy.particles().max_displacement(),
  }
}

fn seeded_rng(seed: Option<u64>) -> SmallRng {
  match seed {
    Some(seed) => SmallRng::seed_from_u64(seed),
    None => SmallRng::from_entropy(),
  }
}

pub fn run(options: RunOptions) -> Result<(), AppError> {
  let mut rng = seeded_rng(options.seed);
  let mut galaxy = GalaxyState::new(options.galaxy, options.starfield, &mut rng)?;
  let params = galaxy.params();
  log::info!(
    "generated galaxy: {} particles, radius {}, {} branches, spin {}, {} stars",
    params.count,
    params.radius,
    params.branches,
    params.spin,
    galaxy.stars().len()
  );

  if options.headless {
    let running = Arc::new(AtomicBool::new(true));
    let handler_flag = running.clone();
    ctrlc::set_handler(move || handler_flag.store(false, Ordering::SeqCst))?;

    let summary = simulate(&mut galaxy, options.frames, options.explode_every, &running);
    log::info!(
      "headless run: {} frames, {} explosions moving {} particles, max displacement {:.4}",
      summary.frames,
      summary.explosions,
      summary.displaced_particles,
      summary.max_displacement
    );
    return Ok(());
  }

  pollster::block_on(start(galaxy, &options.camera))
}
