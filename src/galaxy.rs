use crate::buffers::ParticleBuffers;
use crate::drift::DriftAnimator;
use crate::error::ParamsError;
use crate::explosion::Explosion;
use crate::initialize::{create_starfield, generate};
use crate::picking::{pick_point, Ray};
use crate::{GalaxyParameters, StarfieldParams};
use cgmath::{Matrix3, Point3, Rad};
use rand::Rng;
use std::f32::consts::FRAC_PI_4;

/// Tilt of the galactic plane about the X axis.
pub const GALAXY_TILT: f32 = FRAC_PI_4;
/// Rotation of the galaxy about its Y axis per frame, in radians.
pub const GALAXY_SPIN_PER_FRAME: f32 = 0.0005;
pub const STARFIELD_SPIN_PER_FRAME: f32 = 0.0001;
/// Maximum distance between a picking ray and a particle that still counts as a hit.
pub const PICK_THRESHOLD: f32 = 1.0;

/// All mutable scene state, owned by the front end and lent to each operation.
pub struct GalaxyState {
  params: GalaxyParameters,
  particles: ParticleBuffers,
  stars: ParticleBuffers,
  starfield: StarfieldParams,
  pub animator: DriftAnimator,
  pub explosion: Explosion,
  galaxy_yaw: f32,
  starfield_yaw: f32,
  frames: u64,
}

impl GalaxyState {
  pub fn new<R: Rng + ?Sized>(
    params: GalaxyParameters,
    starfield: StarfieldParams,
    rng: &mut R,
  ) -> Result<Self, ParamsError> {
    let particles = generate(&params, rng)?;
    let stars = create_starfield(&starfield, rng);
    log::info!(
      "galaxy ready: {} particles, {} stars",
      particles.len(),
      stars.len()
    );
    Ok(Self {
      params,
      particles,
      stars,
      starfield,
      animator: DriftAnimator::default(),
      explosion: Explosion::default(),
      galaxy_yaw: 0.0,
      starfield_yaw: 0.0,
      frames: 0,
    })
  }

  /// One display frame: drift the particles and turn the scene.
  pub fn advance(&mut self, time_ms: f64) {
    self.animator.step(&mut self.particles, time_ms);
    self.galaxy_yaw = (self.galaxy_yaw + GALAXY_SPIN_PER_FRAME) % std::f32::consts::TAU;
    self.starfield_yaw = (self.starfield_yaw + STARFIELD_SPIN_PER_FRAME) % std::f32::consts::TAU;
    self.frames += 1;
  }

  /// Explodes around `center`, given in galaxy-local coordinates.
  pub fn explode(&mut self, center: Point3<f32>) -> usize {
    self.explosion.apply(&mut self.particles, center)
  }

  /// Intersects a world-space ray with the galaxy and returns the hit in galaxy-local space.
  pub fn pick(&self, world_ray: &Ray) -> Option<Point3<f32>> {
    let local = world_ray.into_local(&self.galaxy_rotation());
    pick_point(&local, self.particles.positions(), PICK_THRESHOLD)
  }

  /// Picks along `world_ray` and explodes at the hit, if any.
  pub fn explode_along(&mut self, world_ray: &Ray) -> Option<usize> {
    let center = self.pick(world_ray)?;
    let affected = self.explode(center);
    log::info!(
      "explosion at ({:.2}, {:.2}, {:.2}) moved {affected} particles",
      center.x,
      center.y,
      center.z
    );
    Some(affected)
  }

  pub fn galaxy_rotation(&self) -> Matrix3<f32> {
    Matrix3::from_angle_x(Rad(GALAXY_TILT)) * Matrix3::from_angle_y(Rad(self.galaxy_yaw))
  }

  pub fn starfield_rotation(&self) -> Matrix3<f32> {
    Matrix3::from_angle_y(Rad(self.starfield_yaw))
  }

  pub fn params(&self) -> &GalaxyParameters {
    &self.params
  }

  pub fn starfield(&self) -> &StarfieldParams {
    &self.starfield
  }

  pub fn particles(&self) -> &ParticleBuffers {
    &self.particles
  }

  pub fn particles_mut(&mut self) -> &mut ParticleBuffers {
    &mut self.particles
  }

  pub fn stars(&self) -> &ParticleBuffers {
    &self.stars
  }

  pub fn stars_mut(&mut self) -> &mut ParticleBuffers {
    &mut self.stars
  }

  pub fn frames(&self) -> u64 {
    self.frames
  }
}
