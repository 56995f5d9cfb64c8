use crate::buffers::ParticleBuffers;
use crate::color::Rgb;
use crate::galaxy::GalaxyState;
use cgmath::{Matrix3, Matrix4};
use std::borrow::Cow;
use wgpu::{util::DeviceExt, PipelineCompilationOptions};

const BACKGROUND: wgpu::Color = wgpu::Color {
  r: 0.0,
  g: 0.0,
  b: 16.0 / 255.0,
  a: 1.0,
};

/// Linear distance fog towards a violet haze.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Fog {
  pub color: Rgb,
  /// View depth where fading starts.
  pub near: f32,
  /// View depth past which only the fog color is left.
  pub far: f32,
}

impl Default for Fog {
  fn default() -> Self {
    Self {
      color: Rgb::from_hex_u32(0x05010F),
      near: 50.0,
      far: 200.0,
    }
  }
}

impl Fog {
  /// Share of the fog color at view depth `depth`. Mirrors `fog_factor` in `points.wgsl`.
  pub fn factor(&self, depth: f32) -> f32 {
    if self.far <= self.near {
      return if depth < self.near { 0.0 } else { 1.0 };
    }
    let t = ((depth - self.near) / (self.far - self.near)).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
  }
}

/// Two triangles spanning the unit square; expanded into a billboard per particle.
const QUAD: [[f32; 2]; 6] = [
  [-1.0, -1.0],
  [1.0, -1.0],
  [1.0, 1.0],
  [-1.0, -1.0],
  [1.0, 1.0],
  [-1.0, 1.0],
];

/// Brighter-than-white sprites add up instead of saturating against each other.
const ADDITIVE: wgpu::BlendState = wgpu::BlendState {
  color: wgpu::BlendComponent {
    src_factor: wgpu::BlendFactor::SrcAlpha,
    dst_factor: wgpu::BlendFactor::One,
    operation: wgpu::BlendOperation::Add,
  },
  alpha: wgpu::BlendComponent::OVER,
};

#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
struct CloudUniform {
  model: [[f32; 4]; 4],
  tint: [f32; 4],
  fog_color: [f32; 4],
  // near, far, unused, unused
  fog_range: [f32; 4],
}

impl CloudUniform {
  fn new(rotation: Matrix3<f32>, opacity: f32, fog: &Fog) -> Self {
    let [r, g, b] = fog.color.to_array();
    Self {
      model: Matrix4::from(rotation).into(),
      tint: [1.0, 1.0, 1.0, opacity],
      fog_color: [r, g, b, 1.0],
      fog_range: [fog.near, fog.far, 0.0, 0.0],
    }
  }
}

/// GPU mirror of one `ParticleBuffers`: one vertex buffer per attribute.
struct PointCloud {
  positions: wgpu::Buffer,
  colors: wgpu::Buffer,
  sizes: wgpu::Buffer,
  uniform_buffer: wgpu::Buffer,
  bind_group: wgpu::BindGroup,
  count: u32,
}

impl PointCloud {
  fn new(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    layout: &wgpu::BindGroupLayout,
    label: &str,
    particles: &mut ParticleBuffers,
    uniform: CloudUniform,
  ) -> Self {
    let vertex_buffer = |name: &str, len: usize| {
      device.create_buffer(&wgpu::BufferDescriptor {
        label: Some(&format!("{label} {name} Buffer")),
        // zero-sized vertex buffers cannot be bound
        size: (len * std::mem::size_of::<f32>()).max(16) as u64,
        usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
      })
    };
    let positions = vertex_buffer("Position", particles.positions().len());
    let colors = vertex_buffer("Color", particles.colors().len());
    let sizes = vertex_buffer("Size", particles.sizes().len());
    if !particles.is_empty() {
      queue.write_buffer(&sizes, 0, bytemuck::cast_slice(particles.sizes()));
    }

    let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
      label: Some(&format!("{label} Uniform Buffer")),
      contents: bytemuck::bytes_of(&uniform),
      usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
    });
    let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
      layout,
      entries: &[wgpu::BindGroupEntry {
        binding: 0,
        resource: uniform_buffer.as_entire_binding(),
      }],
      label: Some(&format!("{label} bind group")),
    });

    let cloud = Self {
      positions,
      colors,
      sizes,
      uniform_buffer,
      bind_group,
      count: particles.len() as u32,
    };
    cloud.sync(queue, particles, uniform);
    cloud
  }

  /// Re-uploads whatever changed since the last frame.
  fn sync(&self, queue: &wgpu::Queue, particles: &mut ParticleBuffers, uniform: CloudUniform) {
    if particles.take_positions_dirty() && !particles.is_empty() {
      queue.write_buffer(&self.positions, 0, bytemuck::cast_slice(particles.positions()));
    }
    if particles.take_colors_dirty() && !particles.is_empty() {
      queue.write_buffer(&self.colors, 0, bytemuck::cast_slice(particles.colors()));
    }
    queue.write_buffer(&self.uniform_buffer, 0, bytemuck::bytes_of(&uniform));
  }

  fn draw<'a>(&'a self, rpass: &mut wgpu::RenderPass<'a>) {
    if self.count == 0 {
      return;
    }
    rpass.set_bind_group(1, &self.bind_group, &[]);
    rpass.set_vertex_buffer(0, self.positions.slice(..));
    rpass.set_vertex_buffer(1, self.colors.slice(..));
    rpass.set_vertex_buffer(2, self.sizes.slice(..));
    rpass.draw(0..QUAD.len() as u32, 0..self.count);
  }
}

pub struct Render {
  render_pipeline: wgpu::RenderPipeline,
  fog: Fog,
  quad_buffer: wgpu::Buffer,
  galaxy: PointCloud,
  stars: PointCloud,
}

impl Render {
  #[must_use]
  pub fn init(
    config: &wgpu::SurfaceConfiguration,
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    camera_bind_group_layout: &wgpu::BindGroupLayout,
    state: &mut GalaxyState,
  ) -> Self {
    let draw_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
      label: Some("points"),
      source: wgpu::ShaderSource::Wgsl(Cow::Borrowed(include_str!("shaders/points.wgsl"))),
    });

    let cloud_bind_group_layout =
      device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        entries: &[wgpu::BindGroupLayoutEntry {
          binding: 0,
          visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
          ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: false,
            min_binding_size: wgpu::BufferSize::new(std::mem::size_of::<CloudUniform>() as _),
          },
          count: None,
        }],
        label: Some("cloud_bind_group_layout"),
      });

    let render_pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
      label: Some("render"),
      bind_group_layouts: &[camera_bind_group_layout, &cloud_bind_group_layout],
      push_constant_ranges: &[],
    });
    let position_buffer = wgpu::VertexBufferLayout {
      array_stride: 3 * 4,
      step_mode: wgpu::VertexStepMode::Instance,
      attributes: &wgpu::vertex_attr_array![0 => Float32x3],
    };
    let color_buffer = wgpu::VertexBufferLayout {
      array_stride: 3 * 4,
      step_mode: wgpu::VertexStepMode::Instance,
      attributes: &wgpu::vertex_attr_array![1 => Float32x3],
    };
    let size_buffer = wgpu::VertexBufferLayout {
      array_stride: 4,
      step_mode: wgpu::VertexStepMode::Instance,
      attributes: &wgpu::vertex_attr_array![2 => Float32],
    };
    let quad_layout = wgpu::VertexBufferLayout {
      array_stride: 2 * 4,
      step_mode: wgpu::VertexStepMode::Vertex,
      attributes: &wgpu::vertex_attr_array![3 => Float32x2],
    };
    let render_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
      label: Some("Render Pipeline"),
      layout: Some(&render_pipeline_layout),
      vertex: wgpu::VertexState {
        module: &draw_shader,
        entry_point: "main_vs",
        compilation_options: PipelineCompilationOptions::default(),
        buffers: &[position_buffer, color_buffer, size_buffer, quad_layout],
      },
      fragment: Some(wgpu::FragmentState {
        module: &draw_shader,
        entry_point: "main_fs",
        compilation_options: PipelineCompilationOptions::default(),
        targets: &[Some(wgpu::ColorTargetState {
          format: config.view_formats[0],
          blend: Some(ADDITIVE),
          write_mask: wgpu::ColorWrites::ALL,
        })],
      }),
      primitive: wgpu::PrimitiveState::default(),
      depth_stencil: None,
      multisample: wgpu::MultisampleState::default(),
      multiview: None,
      cache: None,
    });

    let quad_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
      label: Some("Quad Buffer"),
      contents: bytemuck::cast_slice(&QUAD),
      usage: wgpu::BufferUsages::VERTEX,
    });

    let fog = Fog::default();
    let galaxy_uniform = CloudUniform::new(state.galaxy_rotation(), 1.0, &fog);
    let galaxy = PointCloud::new(
      device,
      queue,
      &cloud_bind_group_layout,
      "Galaxy",
      state.particles_mut(),
      galaxy_uniform,
    );
    let stars_uniform =
      CloudUniform::new(state.starfield_rotation(), state.starfield().opacity, &fog);
    let stars = PointCloud::new(
      device,
      queue,
      &cloud_bind_group_layout,
      "Starfield",
      state.stars_mut(),
      stars_uniform,
    );

    Render {
      render_pipeline,
      fog,
      quad_buffer,
      galaxy,
      stars,
    }
  }

  pub fn render(
    &mut self,
    view: &wgpu::TextureView,
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    camera_bind_group: &wgpu::BindGroup,
    state: &mut GalaxyState,
  ) {
    let galaxy_uniform = CloudUniform::new(state.galaxy_rotation(), 1.0, &self.fog);
    self.galaxy.sync(queue, state.particles_mut(), galaxy_uniform);
    let stars_uniform =
      CloudUniform::new(state.starfield_rotation(), state.starfield().opacity, &self.fog);
    self.stars.sync(queue, state.stars_mut(), stars_uniform);

    let color_attachments = [Some(wgpu::RenderPassColorAttachment {
      view,
      resolve_target: None,
      ops: wgpu::Operations {
        load: wgpu::LoadOp::Clear(BACKGROUND),
        store: wgpu::StoreOp::Store,
      },
    })];
    let render_pass_descriptor = wgpu::RenderPassDescriptor {
      label: None,
      color_attachments: &color_attachments,
      depth_stencil_attachment: None,
      timestamp_writes: None,
      occlusion_query_set: None,
    };
    let mut command_encoder =
      device.create_command_encoder(&wgpu::CommandEncoderDescriptor { label: None });
    {
      let mut rpass = command_encoder.begin_render_pass(&render_pass_descriptor);
      rpass.set_pipeline(&self.render_pipeline);
      rpass.set_bind_group(0, camera_bind_group, &[]);
      rpass.set_vertex_buffer(3, self.quad_buffer.slice(..));
      self.stars.draw(&mut rpass);
      self.galaxy.draw(&mut rpass);
    }
    queue.submit(Some(command_encoder.finish()));
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use cgmath::Rad;

  #[test]
  fn cloud_uniform_carries_rotation_and_opacity() {
    let rotation = Matrix3::from_angle_y(Rad(0.3));
    let uniform = CloudUniform::new(rotation, 0.6, &Fog::default());
    assert_eq!(uniform.tint, [1.0, 1.0, 1.0, 0.6]);
    assert_eq!(uniform.model[3], [0.0, 0.0, 0.0, 1.0]);
    assert!((uniform.model[0][0] - 0.3f32.cos()).abs() < 1e-6);
    assert_eq!(uniform.fog_range, [50.0, 200.0, 0.0, 0.0]);
    assert!((uniform.fog_color[0] - 5.0 / 255.0).abs() < 1e-6);
    assert!((uniform.fog_color[2] - 15.0 / 255.0).abs() < 1e-6);
    assert_eq!(std::mem::size_of::<CloudUniform>() % 16, 0);
  }

  #[test]
  fn fog_fades_between_near_and_far() {
    let fog = Fog::default();
    assert_eq!(fog.factor(0.0), 0.0);
    assert_eq!(fog.factor(50.0), 0.0);
    assert!((fog.factor(125.0) - 0.5).abs() < 1e-6);
    assert_eq!(fog.factor(200.0), 1.0);
    assert_eq!(fog.factor(1000.0), 1.0);
    assert!(fog.factor(80.0) < fog.factor(120.0));
  }

  #[test]
  fn degenerate_fog_is_a_step() {
    let fog = Fog {
      near: 10.0,
      far: 10.0,
      ..Fog::default()
    };
    assert_eq!(fog.factor(9.9), 0.0);
    assert_eq!(fog.factor(10.0), 1.0);
  }
}
