pub mod buffers;
pub mod camera;
pub mod clock;
pub mod color;
pub mod drift;
pub mod error;
pub mod explosion;
pub mod galaxy;
pub mod initialize;
pub mod picking;
pub mod render;
pub mod state;

use color::Rgb;
use error::ParamsError;

/// Shape and palette of the generated spiral galaxy. Fixed once generated.
#[derive(Clone, Debug, PartialEq)]
pub struct GalaxyParameters {
  pub count: u32,
  pub radius: f32,
  pub branches: u32,
  pub spin: f32,
  /// Carried with the configuration; the jitter itself uses fixed amplitudes.
  pub randomness: f32,
  pub randomness_power: f32,
  /// Inner to outer, at least two entries.
  pub colors: Vec<Rgb>,
}

impl Default for GalaxyParameters {
  fn default() -> Self {
    Self {
      count: 40_000,
      radius: 8.0,
      branches: 5,
      spin: 3.0,
      randomness: 0.5,
      randomness_power: 2.5,
      colors: vec![
        Rgb::from_hex_u32(0x924EBF),
        Rgb::from_hex_u32(0x0C0826),
        Rgb::from_hex_u32(0x353273),
        Rgb::from_hex_u32(0x022859),
        Rgb::from_hex_u32(0x023059),
      ],
    }
  }
}

impl GalaxyParameters {
  pub fn validate(&self) -> Result<(), ParamsError> {
    if self.count == 0 {
      return Err(ParamsError::EmptyGalaxy);
    }
    if !(self.radius.is_finite() && self.radius > 0.0) {
      return Err(ParamsError::InvalidRadius(self.radius));
    }
    if self.branches == 0 {
      return Err(ParamsError::NoBranches);
    }
    for (name, value) in [
      ("spin", self.spin),
      ("randomness", self.randomness),
      ("randomness power", self.randomness_power),
    ] {
      if !value.is_finite() {
        return Err(ParamsError::NonFinite { name, value });
      }
    }
    if self.colors.len() < 2 {
      return Err(ParamsError::PaletteTooShort(self.colors.len()));
    }
    if let Some(index) = self.colors.iter().position(|c| !c.is_unit()) {
      return Err(ParamsError::ColorOutOfRange { index });
    }
    Ok(())
  }
}

/// Background stars, scattered uniformly through a cube around the origin.
#[derive(Clone, Debug, PartialEq)]
pub struct StarfieldParams {
  pub count: u32,
  /// Side length of the cube.
  pub extent: f32,
  pub size: f32,
  pub opacity: f32,
}

impl Default for StarfieldParams {
  fn default() -> Self {
    Self {
      count: 5000,
      extent: 200.0,
      size: 0.05,
      opacity: 0.6,
    }
  }
}

pub struct CameraParams {
  pub eye: [f32; 3],
  pub target: [f32; 3],
  pub fovy: f32,
  pub znear: f32,
  pub zfar: f32,
  /// Radians per pixel of mouse drag.
  pub rotational_speed: f32,
  /// Fraction of the orbit distance per wheel line.
  pub zoom_speed: f32,
  /// Per-frame retention of orbit velocity, in [0, 1).
  pub damping: f32,
}

impl Default for CameraParams {
  fn default() -> Self {
    Self {
      eye: [10.0, 6.0, 10.0],
      target: [0.0, 0.0, 0.0],
      fovy: 75.0,
      znear: 0.1,
      zfar: 1000.0,
      rotational_speed: 0.005,
      zoom_speed: 0.1,
      damping: 0.9,
    }
  }
}
