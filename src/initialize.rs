use crate::buffers::ParticleBuffers;
use crate::color::{blend, Rgb};
use crate::error::ParamsError;
use crate::{GalaxyParameters, StarfieldParams};
use rand::Rng;
use rand_distr::{Distribution, Uniform};
use std::f32::consts::PI;

/// Inner edge of the empty ring between the core and the arms.
pub const GAP_START: f32 = 2.0;
/// Outer edge of the empty ring.
pub const GAP_END: f32 = 3.0;
/// Share of particles placed in the core.
pub const CORE_FRACTION: f64 = 0.1;
/// Particles closer than this to the center render as the bright nucleus.
pub const NUCLEUS_RADIUS: f32 = 0.5;

const JITTER_SCALE: f32 = 0.2;

/// Builds the spiral galaxy described by `params`.
///
/// Fails without allocating if `params` violates a precondition.
pub fn generate<R: Rng + ?Sized>(
  params: &GalaxyParameters,
  rng: &mut R,
) -> Result<ParticleBuffers, ParamsError> {
  params.validate()?;

  let count = params.count as usize;
  let mut buffers = ParticleBuffers::with_capacity(count);
  let jitter = Uniform::new(-0.5f32, 0.5);

  for i in 0..count {
    let radius = sample_radius(rng, params.radius);

    let spin_angle = radius * params.spin;
    let branch_angle = (i as u32 % params.branches) as f32 / params.branches as f32 * PI * 2.0;

    let random_x = jitter.sample(rng) * JITTER_SCALE * radius;
    let random_y = jitter.sample(rng) * JITTER_SCALE;
    let random_z = jitter.sample(rng) * JITTER_SCALE * radius;

    let angle = branch_angle + spin_angle;
    let pos = [
      angle.cos() * radius + random_x,
      random_y,
      angle.sin() * radius + random_z,
    ];

    let (color, size) = appearance(&params.colors, radius, params.radius);
    buffers.push(pos, color, size);
  }

  log::debug!(
    "generated {} particles across {} branches",
    buffers.len(),
    params.branches
  );
  Ok(buffers)
}

/// Draws a particle radius: a dense core inside [0, GAP_START) or the arms in
/// [GAP_END, outer_radius), thinning toward the rim.
pub fn sample_radius<R: Rng + ?Sized>(rng: &mut R, outer_radius: f32) -> f32 {
  if rng.gen_bool(CORE_FRACTION) {
    rng.gen::<f32>().sqrt() * GAP_START
  } else {
    GAP_END + rng.gen::<f32>().powf(0.6) * (outer_radius - GAP_END)
  }
}

/// Color and sprite size for a particle at `radius`.
fn appearance(palette: &[Rgb], radius: f32, outer_radius: f32) -> (Rgb, f32) {
  let t = (radius / outer_radius).min(1.0);
  let falloff = 1.0 - t;

  let intensity = 0.6 + falloff.powi(4) * 6.0;
  let size = 0.04 + falloff.powi(3) * 0.2;

  if radius < NUCLEUS_RADIUS {
    (Rgb::WHITE, size * 3.0)
  } else {
    (blend(palette, t).scale(intensity), size)
  }
}

/// Scatters background stars uniformly through a cube centered on the origin.
#[must_use]
pub fn create_starfield<R: Rng + ?Sized>(params: &StarfieldParams, rng: &mut R) -> ParticleBuffers {
  let count = params.count as usize;
  let mut buffers = ParticleBuffers::with_capacity(count);
  let half = params.extent * 0.5;
  if half <= 0.0 {
    return buffers;
  }
  let axis = Uniform::new(-half, half);
  for _ in 0..count {
    let pos = [axis.sample(rng), axis.sample(rng), axis.sample(rng)];
    buffers.push(pos, Rgb::WHITE, params.size);
  }
  buffers
}

#[cfg(test)]
mod tests {
  use super::*;
  use rand::{rngs::SmallRng, SeedableRng};

  fn params(count: u32) -> GalaxyParameters {
    GalaxyParameters {
      count,
      ..GalaxyParameters::default()
    }
  }

  #[test]
  fn sampled_radius_never_lands_in_gap() {
    let mut rng = SmallRng::seed_from_u64(7);
    let mut inner = 0;
    for _ in 0..50_000 {
      let r = sample_radius(&mut rng, 8.0);
      assert!(
        (0.0..=GAP_START).contains(&r) || (GAP_END..=8.0).contains(&r),
        "radius {r} inside the gap"
      );
      if r <= GAP_START {
        inner += 1;
      }
    }
    // roughly a tenth of the samples belong to the core
    assert!((4_000..6_000).contains(&inner), "{inner} core samples");
  }

  #[test]
  fn buffer_lengths_match_count() {
    let mut rng = SmallRng::seed_from_u64(1);
    for count in [1, 2, 17, 1000] {
      let buffers = generate(&params(count), &mut rng).unwrap();
      assert_eq!(buffers.len(), count as usize);
      assert_eq!(buffers.positions().len(), 3 * count as usize);
      assert_eq!(buffers.original_positions().len(), 3 * count as usize);
      assert_eq!(buffers.colors().len(), 3 * count as usize);
      assert_eq!(buffers.sizes().len(), count as usize);
    }
  }

  #[test]
  fn seeded_generation_is_reproducible() {
    let a = generate(&params(500), &mut SmallRng::seed_from_u64(99)).unwrap();
    let b = generate(&params(500), &mut SmallRng::seed_from_u64(99)).unwrap();
    assert_eq!(a.positions(), b.positions());
    assert_eq!(a.colors(), b.colors());
    assert_eq!(a.sizes(), b.sizes());
  }

  #[test]
  fn particles_stay_near_their_arm() {
    let p = params(2000);
    let buffers = generate(&p, &mut SmallRng::seed_from_u64(3)).unwrap();
    for i in 0..buffers.len() {
      let pos = buffers.original_position(i);
      assert!(pos.y.abs() <= 0.1 + 1e-6);
      let planar = (pos.x * pos.x + pos.z * pos.z).sqrt();
      // jitter is at most 10% of the radius per axis
      assert!(planar <= p.radius * 1.15, "particle {i} at {planar}");
    }
  }

  #[test]
  fn particles_follow_their_branch_and_spin() {
    let p = GalaxyParameters {
      count: 60,
      branches: 3,
      spin: 1.5,
      ..GalaxyParameters::default()
    };
    let mut rng = SmallRng::seed_from_u64(21);
    let mut replay = rng.clone();
    let buffers = generate(&p, &mut rng).unwrap();

    let jitter = Uniform::new(-0.5f32, 0.5);
    for i in 0..buffers.len() {
      let radius = sample_radius(&mut replay, p.radius);
      let jx = jitter.sample(&mut replay) * 0.2 * radius;
      let jy = jitter.sample(&mut replay) * 0.2;
      let jz = jitter.sample(&mut replay) * 0.2 * radius;

      let branch = (i % 3) as f32 / 3.0 * 2.0 * PI;
      let angle = branch + radius * 1.5;
      let expected = [angle.cos() * radius + jx, jy, angle.sin() * radius + jz];

      let pos = buffers.original_position(i);
      for (axis, (got, want)) in [pos.x, pos.y, pos.z].iter().zip(expected).enumerate() {
        assert!((got - want).abs() < 1e-5, "particle {i} axis {axis}: {got} vs {want}");
      }
    }
  }

  #[test]
  fn nucleus_is_white_and_large() {
    let palette = [Rgb::new(1.0, 0.0, 0.0), Rgb::new(0.0, 0.0, 1.0)];
    let (color, size) = appearance(&palette, 0.2, 8.0);
    assert_eq!(color, Rgb::WHITE);
    let t: f32 = 0.2 / 8.0;
    assert!((size - (0.04 + (1.0 - t).powi(3) * 0.2) * 3.0).abs() < 1e-6);
  }

  #[test]
  fn core_is_boosted_and_rim_is_dim() {
    let palette = [Rgb::new(1.0, 0.0, 0.0), Rgb::new(0.0, 0.0, 1.0)];
    let (inner, inner_size) = appearance(&palette, 0.8, 8.0);
    assert!(inner.r > 1.0, "near-core red should exceed 1.0: {inner:?}");

    let (rim, rim_size) = appearance(&palette, 8.0, 8.0);
    assert!((rim.b - 0.6).abs() < 1e-6);
    assert!(rim.r.abs() < 1e-6);
    assert!((rim_size - 0.04).abs() < 1e-6);
    assert!(inner_size > rim_size);
  }

  #[test]
  fn small_radius_never_yields_negative_size() {
    let palette = [Rgb::new(1.0, 0.0, 0.0), Rgb::new(0.0, 0.0, 1.0)];
    let (_, size) = appearance(&palette, 5.0, 1.0);
    assert!(size >= 0.0);
  }

  #[test]
  fn invalid_parameters_fail_fast() {
    let mut rng = SmallRng::seed_from_u64(0);
    assert_eq!(
      generate(&params(0), &mut rng).unwrap_err(),
      ParamsError::EmptyGalaxy
    );
  }

  #[test]
  fn starfield_fills_cube() {
    let sp = StarfieldParams::default();
    let stars = create_starfield(&sp, &mut SmallRng::seed_from_u64(5));
    assert_eq!(stars.len(), sp.count as usize);
    assert!(stars.positions().iter().all(|c| c.abs() <= sp.extent * 0.5));
    assert!(stars.sizes().iter().all(|&s| s == sp.size));
  }
}
