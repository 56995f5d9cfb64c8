use crate::picking::Ray;
use crate::CameraParams;
use cgmath::{EuclideanSpace, InnerSpace, Point3, SquareMatrix, Vector3, Vector4};
use std::f32::consts::PI;
use winit::{
  event::{ElementState, KeyEvent, MouseButton, MouseScrollDelta, WindowEvent},
  keyboard::{KeyCode, PhysicalKey},
};

#[rustfmt::skip]
pub const OPENGL_TO_WGPU_MATRIX: cgmath::Matrix4<f32> = cgmath::Matrix4::new(
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 0.5, 0.0,
    0.0, 0.0, 0.5, 1.0,
);

const MIN_DISTANCE: f32 = 1.0;
const MAX_DISTANCE: f32 = 150.0;
/// Keeps the orbit away from the poles, where the view basis degenerates.
const POLAR_MARGIN: f32 = 0.01;
/// Cursor travel, in pixels, below which a press and release count as a click.
const CLICK_SLOP: f64 = 4.0;
const PIXELS_PER_LINE: f32 = 50.0;

pub struct Camera {
  pub eye: cgmath::Point3<f32>,
  pub target: cgmath::Point3<f32>,
  pub up: cgmath::Vector3<f32>,
  pub aspect: f32,
  pub fovy: f32,
  pub znear: f32,
  pub zfar: f32,
}

impl Camera {
  pub fn new(params: &CameraParams, width: u32, height: u32) -> Self {
    Self {
      eye: params.eye.into(),
      target: params.target.into(),
      up: cgmath::Vector3::unit_y(),
      aspect: width.max(1) as f32 / height.max(1) as f32,
      fovy: params.fovy,
      znear: params.znear,
      zfar: params.zfar,
    }
  }

  pub fn resize(&mut self, width: u32, height: u32) {
    self.aspect = width.max(1) as f32 / height.max(1) as f32;
  }

  pub fn build_view_projection_matrix(&self) -> cgmath::Matrix4<f32> {
    let view = cgmath::Matrix4::look_at_rh(self.eye, self.target, self.up);
    let proj = cgmath::perspective(cgmath::Deg(self.fovy), self.aspect, self.znear, self.zfar);
    OPENGL_TO_WGPU_MATRIX * proj * view
  }

  /// Screen-aligned right and up axes in world space.
  pub fn basis(&self) -> (Vector3<f32>, Vector3<f32>) {
    let forward = (self.target - self.eye).normalize();
    let right = forward.cross(self.up).normalize();
    (right, right.cross(forward))
  }

  /// World-space ray through a cursor position given in physical pixels.
  pub fn ray_through(&self, x: f32, y: f32, width: u32, height: u32) -> Option<Ray> {
    let ndc_x = x / width.max(1) as f32 * 2.0 - 1.0;
    let ndc_y = -(y / height.max(1) as f32) * 2.0 + 1.0;
    let inverse = self.build_view_projection_matrix().invert()?;

    let unproject = |depth: f32| {
      let p = inverse * Vector4::new(ndc_x, ndc_y, depth, 1.0);
      Point3::from_vec(p.truncate() / p.w)
    };
    let near = unproject(0.0);
    let far = unproject(1.0);
    Some(Ray::new(near, far - near))
  }
}

#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CameraUniform {
  view_proj: [[f32; 4]; 4],
  right: [f32; 4],
  up: [f32; 4],
}

impl CameraUniform {
  pub fn new() -> Self {
    Self {
      view_proj: cgmath::Matrix4::identity().into(),
      right: [1.0, 0.0, 0.0, 0.0],
      up: [0.0, 1.0, 0.0, 0.0],
    }
  }

  pub fn update_view_proj(&mut self, camera: &Camera) {
    self.view_proj = camera.build_view_projection_matrix().into();
    let (right, up) = camera.basis();
    self.right = right.extend(0.0).into();
    self.up = up.extend(0.0).into();
  }
}

impl Default for CameraUniform {
  fn default() -> Self {
    Self::new()
  }
}

/// Orbits the camera around its target from mouse drags, wheel and keyboard,
/// and reports clicks that did not turn into drags.
pub struct CameraController {
  rotation_speed: f32,
  keyboard_speed: f32,
  zoom_speed: f32,
  damping: f32,
  pending_yaw: f32,
  pending_pitch: f32,
  pending_zoom: f32,
  is_forward_pressed: bool,
  is_backward_pressed: bool,
  is_left_pressed: bool,
  is_right_pressed: bool,
  is_rotate_up_pressed: bool,
  is_rotate_down_pressed: bool,
  cursor: (f64, f64),
  button_down: bool,
  drag_distance: f64,
  click: Option<(f64, f64)>,
}

impl CameraController {
  pub fn init(params: &CameraParams) -> Self {
    Self {
      rotation_speed: params.rotational_speed,
      keyboard_speed: 0.02,
      zoom_speed: params.zoom_speed,
      damping: params.damping.clamp(0.0, 0.99),
      pending_yaw: 0.0,
      pending_pitch: 0.0,
      pending_zoom: 0.0,
      is_forward_pressed: false,
      is_backward_pressed: false,
      is_left_pressed: false,
      is_right_pressed: false,
      is_rotate_up_pressed: false,
      is_rotate_down_pressed: false,
      cursor: (0.0, 0.0),
      button_down: false,
      drag_distance: 0.0,
      click: None,
    }
  }

  pub fn process_events(&mut self, event: &WindowEvent) -> bool {
    match event {
      WindowEvent::KeyboardInput {
        event:
          KeyEvent {
            state,
            physical_key: PhysicalKey::Code(keycode),
            ..
          },
        ..
      } => self.on_key(*keycode, *state == ElementState::Pressed),
      WindowEvent::CursorMoved { position, .. } => {
        self.on_cursor_moved(position.x, position.y);
        true
      }
      WindowEvent::MouseInput {
        state,
        button: MouseButton::Left,
        ..
      } => {
        self.on_left_button(*state == ElementState::Pressed);
        true
      }
      WindowEvent::MouseWheel { delta, .. } => {
        let lines = match delta {
          MouseScrollDelta::LineDelta(_, y) => *y,
          MouseScrollDelta::PixelDelta(p) => p.y as f32 / PIXELS_PER_LINE,
        };
        self.on_scroll(lines);
        true
      }
      _ => false,
    }
  }

  pub fn on_key(&mut self, keycode: KeyCode, is_pressed: bool) -> bool {
    match keycode {
      KeyCode::KeyW | KeyCode::ArrowUp => {
        self.is_forward_pressed = is_pressed;
        true
      }
      KeyCode::KeyA | KeyCode::ArrowLeft => {
        self.is_left_pressed = is_pressed;
        true
      }
      KeyCode::KeyS | KeyCode::ArrowDown => {
        self.is_backward_pressed = is_pressed;
        true
      }
      KeyCode::KeyD | KeyCode::ArrowRight => {
        self.is_right_pressed = is_pressed;
        true
      }
      KeyCode::KeyQ => {
        self.is_rotate_up_pressed = is_pressed;
        true
      }
      KeyCode::KeyE => {
        self.is_rotate_down_pressed = is_pressed;
        true
      }
      _ => false,
    }
  }

  pub fn on_cursor_moved(&mut self, x: f64, y: f64) {
    let (dx, dy) = (x - self.cursor.0, y - self.cursor.1);
    self.cursor = (x, y);
    if self.button_down {
      self.drag_distance += (dx * dx + dy * dy).sqrt();
      self.pending_yaw += dx as f32 * self.rotation_speed;
      self.pending_pitch += dy as f32 * self.rotation_speed;
    }
  }

  pub fn on_left_button(&mut self, pressed: bool) {
    if pressed {
      self.button_down = true;
      self.drag_distance = 0.0;
    } else if self.button_down {
      self.button_down = false;
      if self.drag_distance < CLICK_SLOP {
        self.click = Some(self.cursor);
      }
    }
  }

  /// Positive `lines` zoom in.
  pub fn on_scroll(&mut self, lines: f32) {
    self.pending_zoom += lines;
  }

  /// Cursor position of the last click, consumed on read.
  pub fn take_click(&mut self) -> Option<(f64, f64)> {
    self.click.take()
  }

  pub fn update_camera(&mut self, camera: &mut Camera) {
    if self.is_left_pressed {
      self.pending_yaw -= self.keyboard_speed;
    }
    if self.is_right_pressed {
      self.pending_yaw += self.keyboard_speed;
    }
    if self.is_rotate_up_pressed {
      self.pending_pitch -= self.keyboard_speed;
    }
    if self.is_rotate_down_pressed {
      self.pending_pitch += self.keyboard_speed;
    }
    if self.is_forward_pressed {
      self.pending_zoom += self.keyboard_speed * 5.0;
    }
    if self.is_backward_pressed {
      self.pending_zoom -= self.keyboard_speed * 5.0;
    }

    let apply = 1.0 - self.damping;
    let yaw = self.pending_yaw * apply;
    let pitch = self.pending_pitch * apply;
    self.pending_yaw -= yaw;
    self.pending_pitch -= pitch;

    let offset = camera.eye - camera.target;
    let mut distance = offset.magnitude();
    let mut azimuth = offset.x.atan2(offset.z);
    let mut polar = (offset.y / distance).clamp(-1.0, 1.0).acos();

    azimuth -= yaw;
    polar = (polar - pitch).clamp(POLAR_MARGIN, PI - POLAR_MARGIN);
    distance = (distance * (1.0 - self.zoom_speed).powf(self.pending_zoom))
      .clamp(MIN_DISTANCE, MAX_DISTANCE);
    self.pending_zoom = 0.0;

    camera.eye = camera.target
      + Vector3::new(
        distance * polar.sin() * azimuth.sin(),
        distance * polar.cos(),
        distance * polar.sin() * azimuth.cos(),
      );
  }
}
