use cgmath::{EuclideanSpace, InnerSpace, Matrix, Matrix3, Point3, Vector3};

/// Half-line used for cursor picking.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Ray {
  pub origin: Point3<f32>,
  /// Unit length.
  pub direction: Vector3<f32>,
}

impl Ray {
  pub fn new(origin: Point3<f32>, direction: Vector3<f32>) -> Self {
    Self {
      origin,
      direction: direction.normalize(),
    }
  }

  pub fn at(&self, t: f32) -> Point3<f32> {
    self.origin + self.direction * t
  }

  /// Expresses the ray in the frame of an object rotated by `rotation`.
  pub fn into_local(&self, rotation: &Matrix3<f32>) -> Ray {
    let inverse = rotation.transpose();
    Ray {
      origin: Point3::from_vec(inverse * self.origin.to_vec()),
      direction: inverse * self.direction,
    }
  }
}

/// Finds the particle closest along `ray` that lies within `threshold` of it and
/// returns the point on the ray nearest to that particle.
///
/// Only particles in front of the origin are considered. A particle just behind
/// the origin is skipped even when it lies within `threshold` of it; three.js
/// point raycasting would still report that one.
pub fn pick_point(ray: &Ray, positions: &[f32], threshold: f32) -> Option<Point3<f32>> {
  let threshold_sq = threshold * threshold;
  let mut best: Option<f32> = None;

  for p in positions.chunks_exact(3) {
    let to_particle = Point3::new(p[0], p[1], p[2]) - ray.origin;
    let along = to_particle.dot(ray.direction);
    if along < 0.0 {
      continue;
    }
    let offset_sq = (to_particle - ray.direction * along).magnitude2();
    if offset_sq < threshold_sq && best.map_or(true, |b| along < b) {
      best = Some(along);
    }
  }

  best.map(|t| ray.at(t))
}

#[cfg(test)]
mod tests {
  use super::*;
  use cgmath::Rad;

  #[test]
  fn picks_nearest_particle_along_ray() {
    let positions = [
      0.0, 0.2, -10.0, //
      0.0, 0.0, -5.0, //
      5.0, 0.0, -2.0,
    ];
    let ray = Ray::new(Point3::origin(), Vector3::new(0.0, 0.0, -1.0));
    let hit = pick_point(&ray, &positions, 1.0).unwrap();
    assert!((hit - Point3::new(0.0, 0.0, -5.0)).magnitude() < 1e-6);
  }

  #[test]
  fn hit_lies_on_the_ray() {
    let positions = [0.5, 0.0, -4.0];
    let ray = Ray::new(Point3::origin(), Vector3::new(0.0, 0.0, -1.0));
    let hit = pick_point(&ray, &positions, 1.0).unwrap();
    assert!((hit - Point3::new(0.0, 0.0, -4.0)).magnitude() < 1e-6);
  }

  #[test]
  fn ignores_particles_behind_or_far_from_ray() {
    let positions = [0.0, 0.0, 3.0, 4.0, 0.0, -3.0];
    let ray = Ray::new(Point3::origin(), Vector3::new(0.0, 0.0, -1.0));
    assert_eq!(pick_point(&ray, &positions, 1.0), None);
    assert_eq!(pick_point(&ray, &[], 1.0), None);
  }

  #[test]
  fn particle_just_behind_origin_is_skipped() {
    // 0.5 behind the origin, well within the threshold of it
    let positions = [0.0, 0.0, 0.5];
    let ray = Ray::new(Point3::origin(), Vector3::new(0.0, 0.0, -1.0));
    assert_eq!(pick_point(&ray, &positions, 1.0), None);

    let positions = [0.0, 0.0, 0.5, 0.0, 0.0, -5.0];
    let hit = pick_point(&ray, &positions, 1.0).unwrap();
    assert!((hit.z + 5.0).abs() < 1e-6);
  }

  #[test]
  fn local_ray_undoes_rotation() {
    let rotation = Matrix3::from_angle_y(Rad(std::f32::consts::FRAC_PI_2));
    let world = Ray::new(Point3::new(1.0, 0.0, 0.0), Vector3::new(0.0, 0.0, -1.0));
    let local = world.into_local(&rotation);
    // rotating the local ray back must give the world ray
    let back_origin = rotation * local.origin.to_vec();
    let back_dir = rotation * local.direction;
    assert!((back_origin - world.origin.to_vec()).magnitude() < 1e-6);
    assert!((back_dir - world.direction).magnitude() < 1e-6);
  }
}
