use crate::buffers::ParticleBuffers;
use cgmath::{InnerSpace, Point3, Vector3};

/// Pushes particles near a point outward. Displacements compound across calls.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Explosion {
  /// Particles strictly closer than this to the center are affected.
  pub radius: f32,
  /// Fraction of the offset from the center added to each affected particle.
  pub strength: f32,
}

impl Default for Explosion {
  fn default() -> Self {
    Self {
      radius: 1.5,
      strength: 0.5,
    }
  }
}

impl Explosion {
  /// Applies the blast in place and returns how many particles moved.
  pub fn apply(&self, buffers: &mut ParticleBuffers, center: Point3<f32>) -> usize {
    let mut affected = 0;
    for p in buffers.positions_mut().chunks_exact_mut(3) {
      let d = Vector3::new(p[0] - center.x, p[1] - center.y, p[2] - center.z);
      if d.magnitude() < self.radius {
        p[0] += d.x * self.strength;
        p[1] += d.y * self.strength;
        p[2] += d.z * self.strength;
        affected += 1;
      }
    }
    affected
  }
}
