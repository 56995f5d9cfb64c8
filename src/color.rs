use crate::error::ParamsError;
use std::str::FromStr;

/// Linear RGB triple. Components may exceed 1.0 once an intensity boost is applied.
#[derive(Copy, Clone, Debug, PartialEq, Default)]
pub struct Rgb {
  pub r: f32,
  pub g: f32,
  pub b: f32,
}

impl Rgb {
  pub const WHITE: Rgb = Rgb::new(1.0, 1.0, 1.0);

  pub const fn new(r: f32, g: f32, b: f32) -> Self {
    Self { r, g, b }
  }

  pub fn from_hex_u32(hex: u32) -> Self {
    let channel = |shift: u32| ((hex >> shift) & 0xFF) as f32 / 255.0;
    Self::new(channel(16), channel(8), channel(0))
  }

  pub fn from_slice(rgb: &[f32]) -> Self {
    Self::new(rgb[0], rgb[1], rgb[2])
  }

  pub fn to_array(self) -> [f32; 3] {
    [self.r, self.g, self.b]
  }

  /// True when every component lies in [0, 1].
  pub fn is_unit(&self) -> bool {
    self.to_array().iter().all(|c| (0.0..=1.0).contains(c))
  }

  #[must_use]
  pub fn lerp(self, other: Rgb, alpha: f32) -> Self {
    Self::new(
      self.r + (other.r - self.r) * alpha,
      self.g + (other.g - self.g) * alpha,
      self.b + (other.b - self.b) * alpha,
    )
  }

  #[must_use]
  pub fn scale(self, factor: f32) -> Self {
    Self::new(self.r * factor, self.g * factor, self.b * factor)
  }

  /// Rotates the hue by `delta` turns, keeping saturation and lightness.
  ///
  /// Works directly on the channel extremes, so over-bright colors keep their
  /// intensity instead of being clamped into [0, 1] by an HSL round trip.
  #[must_use]
  pub fn offset_hue(self, delta: f32) -> Self {
    let max = self.r.max(self.g).max(self.b);
    let min = self.r.min(self.g).min(self.b);
    if max == min {
      return self;
    }
    let hue = (self.hue() + delta).rem_euclid(1.0);
    Self::new(
      hue_channel(min, max, hue + 1.0 / 3.0),
      hue_channel(min, max, hue),
      hue_channel(min, max, hue - 1.0 / 3.0),
    )
  }

  /// Hue in turns, [0, 1). Zero for greys.
  pub fn hue(&self) -> f32 {
    let max = self.r.max(self.g).max(self.b);
    let min = self.r.min(self.g).min(self.b);
    let delta = max - min;
    if delta == 0.0 {
      return 0.0;
    }
    let sextant = if max == self.r {
      (self.g - self.b) / delta + if self.g < self.b { 6.0 } else { 0.0 }
    } else if max == self.g {
      (self.b - self.r) / delta + 2.0
    } else {
      (self.r - self.g) / delta + 4.0
    };
    sextant / 6.0
  }
}

fn hue_channel(low: f32, high: f32, t: f32) -> f32 {
  let t = t.rem_euclid(1.0);
  if t < 1.0 / 6.0 {
    low + (high - low) * 6.0 * t
  } else if t < 0.5 {
    high
  } else if t < 2.0 / 3.0 {
    low + (high - low) * 6.0 * (2.0 / 3.0 - t)
  } else {
    low
  }
}

impl FromStr for Rgb {
  type Err = ParamsError;

  /// Parses `#RRGGBB` or `RRGGBB`.
  fn from_str(s: &str) -> Result<Self, Self::Err> {
    let digits = s.trim().trim_start_matches('#');
    if digits.len() != 6 || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
      return Err(ParamsError::InvalidColor(s.to_string()));
    }
    u32::from_str_radix(digits, 16)
      .map(Rgb::from_hex_u32)
      .map_err(|_| ParamsError::InvalidColor(s.to_string()))
  }
}

/// Samples a piecewise-linear gradient through `palette` at `t` in [0, 1].
///
/// `palette` must hold at least two colors.
pub fn blend(palette: &[Rgb], t: f32) -> Rgb {
  debug_assert!(palette.len() >= 2, "gradient needs two colors");
  let segments = (palette.len() - 1) as f32;
  let scaled = t * segments;
  let idx = (scaled.floor().max(0.0) as usize).min(palette.len() - 2);
  palette[idx].lerp(palette[idx + 1], scaled - idx as f32)
}

#[cfg(test)]
mod tests {
  use super::*;

  const EPS: f32 = 1e-5;

  fn close(a: Rgb, b: Rgb) -> bool {
    (a.r - b.r).abs() < EPS && (a.g - b.g).abs() < EPS && (a.b - b.b).abs() < EPS
  }

  fn palette() -> Vec<Rgb> {
    vec![
      Rgb::new(1.0, 0.0, 0.0),
      Rgb::new(0.0, 1.0, 0.0),
      Rgb::new(0.0, 0.0, 1.0),
      Rgb::new(0.2, 0.4, 0.6),
    ]
  }

  #[test]
  fn blend_hits_endpoints() {
    let palette = palette();
    assert!(close(blend(&palette, 0.0), palette[0]));
    assert!(close(blend(&palette, 1.0), palette[3]));

    let two = [Rgb::new(1.0, 0.0, 0.0), Rgb::new(0.0, 0.0, 1.0)];
    assert!(close(blend(&two, 0.0), two[0]));
    assert!(close(blend(&two, 1.0), two[1]));
    assert!(close(blend(&two, 0.5), Rgb::new(0.5, 0.0, 0.5)));
  }

  #[test]
  fn blend_is_continuous_at_stops() {
    let palette = palette();
    let stop = 1.0 / 3.0;
    let below = blend(&palette, stop - 1e-4);
    let above = blend(&palette, stop + 1e-4);
    assert!((below.g - above.g).abs() < 1e-3);
    assert!(close(blend(&palette, stop), palette[1]));
  }

  #[test]
  fn blend_stays_between_neighbours() {
    let palette = palette();
    let segments = (palette.len() - 1) as f32;
    for step in 0..=1000 {
      let t = step as f32 / 1000.0;
      let idx = ((t * segments).floor() as usize).min(palette.len() - 2);
      let (a, b) = (palette[idx].to_array(), palette[idx + 1].to_array());
      let out = blend(&palette, t).to_array();
      for c in 0..3 {
        assert!(out[c] >= a[c].min(b[c]) - EPS, "t={t} channel {c}");
        assert!(out[c] <= a[c].max(b[c]) + EPS, "t={t} channel {c}");
      }
    }
  }

  #[test]
  fn parses_hex() {
    let c: Rgb = "#924EBF".parse().unwrap();
    assert!(close(c, Rgb::new(146.0 / 255.0, 78.0 / 255.0, 191.0 / 255.0)));
    assert_eq!("ffffff".parse::<Rgb>().unwrap(), Rgb::WHITE);
    assert!(matches!("#12345".parse::<Rgb>(), Err(ParamsError::InvalidColor(_))));
    assert!(matches!("#GG0000".parse::<Rgb>(), Err(ParamsError::InvalidColor(_))));
  }

  #[test]
  fn hue_offset_keeps_extremes() {
    let c = Rgb::new(2.4, 0.3, 1.1);
    let shifted = c.offset_hue(0.05);
    let arr = shifted.to_array();
    let max = arr.iter().cloned().fold(f32::MIN, f32::max);
    let min = arr.iter().cloned().fold(f32::MAX, f32::min);
    assert!((max - 2.4).abs() < EPS);
    assert!((min - 0.3).abs() < EPS);
    assert!((shifted.hue() - (c.hue() + 0.05).rem_euclid(1.0)).abs() < 1e-4);
  }

  #[test]
  fn hue_offset_wraps_and_ignores_grey() {
    let red = Rgb::new(1.0, 0.0, 0.0);
    assert!(close(red.offset_hue(1.0), red));
    assert!(close(red.offset_hue(1.0 / 3.0), Rgb::new(0.0, 1.0, 0.0)));
    assert_eq!(Rgb::WHITE.offset_hue(0.3), Rgb::WHITE);
  }
}
