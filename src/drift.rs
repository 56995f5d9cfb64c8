use crate::buffers::{ParticleBuffers, ParticlesMut};
use crate::color::Rgb;

/// Per-frame motion: a small vertical wobble, relaxation toward the rest
/// position, and a slow hue rotation.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct DriftAnimator {
  /// Peak vertical offset added per frame.
  pub drift_amplitude: f32,
  /// Phase advance of the wobble per millisecond.
  pub drift_frequency: f64,
  /// Fraction of the remaining offset to the rest position removed per frame.
  pub relaxation: f32,
  /// Hue rotation per frame, in turns.
  pub hue_step: f32,
}

impl Default for DriftAnimator {
  fn default() -> Self {
    Self {
      drift_amplitude: 0.0001,
      drift_frequency: 0.0001,
      relaxation: 0.02,
      hue_step: 0.0001,
    }
  }
}

impl DriftAnimator {
  /// Advances every particle by one frame. `time_ms` is the frame timestamp in
  /// milliseconds; each particle's index offsets the wobble phase.
  pub fn step(&self, buffers: &mut ParticleBuffers, time_ms: f64) {
    let phase = time_ms * self.drift_frequency;
    let ParticlesMut {
      positions,
      original_positions,
      colors,
    } = buffers.particles_mut();

    for (i, (pos, rest)) in positions
      .chunks_exact_mut(3)
      .zip(original_positions.chunks_exact(3))
      .enumerate()
    {
      pos[1] += (phase + i as f64).sin() as f32 * self.drift_amplitude;
      for axis in 0..3 {
        pos[axis] += (rest[axis] - pos[axis]) * self.relaxation;
      }
    }

    if self.hue_step != 0.0 {
      for rgb in colors.chunks_exact_mut(3) {
        let shifted = Rgb::from_slice(rgb).offset_hue(self.hue_step);
        rgb.copy_from_slice(&shifted.to_array());
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::explosion::Explosion;
  use crate::initialize::generate;
  use crate::GalaxyParameters;
  use rand::{rngs::SmallRng, SeedableRng};

  fn galaxy(count: u32) -> ParticleBuffers {
    let params = GalaxyParameters {
      count,
      ..GalaxyParameters::default()
    };
    generate(&params, &mut SmallRng::seed_from_u64(21)).unwrap()
  }

  #[test]
  fn rest_state_stays_bounded() {
    let mut buffers = galaxy(200);
    let animator = DriftAnimator::default();
    for frame in 0..10_000 {
      animator.step(&mut buffers, frame as f64 * 16.0);
    }
    // wobble settles at amplitude / relaxation, far below the 0.1 vertical jitter
    let worst = buffers.max_displacement();
    assert!(worst < 0.01, "max displacement {worst}");
  }

  #[test]
  fn explosion_heals_after_relaxation() {
    let mut buffers = galaxy(2000);
    let center = buffers.position(0);
    let affected = Explosion::default().apply(&mut buffers, center);
    assert!(affected > 1);

    let animator = DriftAnimator {
      drift_amplitude: 0.0,
      ..DriftAnimator::default()
    };
    for frame in 0..500 {
      animator.step(&mut buffers, frame as f64 * 16.0);
    }
    let worst = buffers.max_displacement();
    assert!(worst < 1e-3, "max displacement {worst}");
  }

  #[test]
  fn relaxation_is_exponential() {
    let mut buffers = galaxy(1);
    buffers.positions_mut()[0] += 1.0;
    let animator = DriftAnimator {
      drift_amplitude: 0.0,
      hue_step: 0.0,
      ..DriftAnimator::default()
    };
    animator.step(&mut buffers, 0.0);
    assert!((buffers.displacement(0) - 0.98).abs() < 1e-5);
    animator.step(&mut buffers, 0.0);
    assert!((buffers.displacement(0) - 0.98 * 0.98).abs() < 1e-5);
  }

  #[test]
  fn colors_cycle_without_losing_intensity() {
    let mut buffers = galaxy(300);
    let before: Vec<f32> = buffers.colors().to_vec();
    let animator = DriftAnimator::default();
    for frame in 0..100 {
      animator.step(&mut buffers, frame as f64);
    }
    let after = buffers.colors();
    assert_ne!(before.as_slice(), after);
    for (old, new) in before.chunks_exact(3).zip(after.chunks_exact(3)) {
      let peak = |c: &[f32]| c.iter().cloned().fold(f32::MIN, f32::max);
      assert!((peak(old) - peak(new)).abs() < 1e-4);
      assert!(new.iter().all(|c| *c >= 0.0));
    }
  }

  #[test]
  fn step_marks_buffers_dirty() {
    let mut buffers = galaxy(10);
    buffers.take_positions_dirty();
    buffers.take_colors_dirty();
    DriftAnimator::default().step(&mut buffers, 0.0);
    assert!(buffers.take_positions_dirty());
    assert!(buffers.take_colors_dirty());
  }
}
