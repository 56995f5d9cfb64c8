use crate::color::Rgb;
use cgmath::{MetricSpace, Point3};

/// Per-particle state as flat, GPU-uploadable arrays.
///
/// `positions`, `original_positions` and `colors` hold `3 * len` floats; `sizes`
/// holds `len`. Rest positions are written once, when a particle is pushed.
#[derive(Clone, Debug, Default)]
pub struct ParticleBuffers {
  positions: Vec<f32>,
  original_positions: Vec<f32>,
  colors: Vec<f32>,
  sizes: Vec<f32>,
  positions_dirty: bool,
  colors_dirty: bool,
}

/// Simultaneous mutable view over the animated arrays and the rest positions.
pub struct ParticlesMut<'a> {
  pub positions: &'a mut [f32],
  pub original_positions: &'a [f32],
  pub colors: &'a mut [f32],
}

impl ParticleBuffers {
  pub(crate) fn with_capacity(count: usize) -> Self {
    Self {
      positions: Vec::with_capacity(count * 3),
      original_positions: Vec::with_capacity(count * 3),
      colors: Vec::with_capacity(count * 3),
      sizes: Vec::with_capacity(count),
      positions_dirty: true,
      colors_dirty: true,
    }
  }

  pub(crate) fn push(&mut self, position: [f32; 3], color: Rgb, size: f32) {
    self.positions.extend_from_slice(&position);
    self.original_positions.extend_from_slice(&position);
    self.colors.extend_from_slice(&color.to_array());
    self.sizes.push(size);
  }

  pub fn len(&self) -> usize {
    self.sizes.len()
  }

  pub fn is_empty(&self) -> bool {
    self.sizes.is_empty()
  }

  pub fn positions(&self) -> &[f32] {
    &self.positions
  }

  pub fn original_positions(&self) -> &[f32] {
    &self.original_positions
  }

  pub fn colors(&self) -> &[f32] {
    &self.colors
  }

  pub fn sizes(&self) -> &[f32] {
    &self.sizes
  }

  pub fn position(&self, i: usize) -> Point3<f32> {
    point_at(&self.positions, i)
  }

  pub fn original_position(&self, i: usize) -> Point3<f32> {
    point_at(&self.original_positions, i)
  }

  pub fn color(&self, i: usize) -> Rgb {
    Rgb::from_slice(&self.colors[i * 3..i * 3 + 3])
  }

  /// Distance of particle `i` from its rest position.
  pub fn displacement(&self, i: usize) -> f32 {
    self.position(i).distance(self.original_position(i))
  }

  pub fn max_displacement(&self) -> f32 {
    (0..self.len())
      .map(|i| self.displacement(i))
      .fold(0.0, f32::max)
  }

  /// Borrows the animated arrays for mutation and flags both for re-upload.
  pub fn particles_mut(&mut self) -> ParticlesMut<'_> {
    self.positions_dirty = true;
    self.colors_dirty = true;
    ParticlesMut {
      positions: &mut self.positions,
      original_positions: &self.original_positions,
      colors: &mut self.colors,
    }
  }

  /// Position array only; flags it for re-upload.
  pub fn positions_mut(&mut self) -> &mut [f32] {
    self.positions_dirty = true;
    &mut self.positions
  }

  /// Returns whether positions changed since the last call, clearing the flag.
  pub fn take_positions_dirty(&mut self) -> bool {
    std::mem::take(&mut self.positions_dirty)
  }

  pub fn take_colors_dirty(&mut self) -> bool {
    std::mem::take(&mut self.colors_dirty)
  }
}

fn point_at(data: &[f32], i: usize) -> Point3<f32> {
  Point3::new(data[i * 3], data[i * 3 + 1], data[i * 3 + 2])
}
