//! Frame timing for the animation loop.
//!
//! The windowed loop runs on wall-clock time; headless runs and tests use a
//! fixed step so the drift phase is reproducible.

use std::time::{Duration, Instant};

#[derive(Debug)]
pub struct FrameClock {
  start: Instant,
  /// When set, each tick advances simulated time by this much.
  fixed_step: Option<Duration>,
  simulated: Duration,
  frame_count: u64,
  fps: f32,
  fps_frame_count: u64,
  fps_update_time: Instant,
  fps_update_interval: Duration,
}

impl FrameClock {
  /// Clock driven by wall time since creation.
  pub fn realtime() -> Self {
    Self::with_step(None)
  }

  /// Clock advancing `step` per tick regardless of wall time.
  pub fn fixed(step: Duration) -> Self {
    Self::with_step(Some(step))
  }

  fn with_step(fixed_step: Option<Duration>) -> Self {
    let now = Instant::now();
    Self {
      start: now,
      fixed_step,
      simulated: Duration::ZERO,
      frame_count: 0,
      fps: 0.0,
      fps_frame_count: 0,
      fps_update_time: now,
      fps_update_interval: Duration::from_secs(1),
    }
  }

  /// Starts a new frame and returns its timestamp in milliseconds.
  pub fn tick(&mut self) -> f64 {
    self.frame_count += 1;
    let now = Instant::now();
    let since = now.duration_since(self.fps_update_time);
    if since >= self.fps_update_interval {
      let frames = self.frame_count - self.fps_frame_count;
      self.fps = frames as f32 / since.as_secs_f32();
      self.fps_frame_count = self.frame_count;
      self.fps_update_time = now;
      log::debug!("{:.1} fps", self.fps);
    }

    match self.fixed_step {
      Some(step) => {
        self.simulated += step;
        self.simulated.as_secs_f64() * 1000.0
      }
      None => now.duration_since(self.start).as_secs_f64() * 1000.0,
    }
  }

  pub fn frame(&self) -> u64 {
    self.frame_count
  }

  /// Frames per second over the last measurement window; zero until the first window ends.
  pub fn fps(&self) -> f32 {
    self.fps
  }
}
