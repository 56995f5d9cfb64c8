use thiserror::Error;

/// Invalid galaxy configuration. Raised before any buffer is allocated.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParamsError {
  #[error("particle count must be greater than zero")]
  EmptyGalaxy,
  #[error("galaxy radius must be a positive finite number, got {0}")]
  InvalidRadius(f32),
  #[error("branch count must be at least 1")]
  NoBranches,
  #[error("{name} must be finite, got {value}")]
  NonFinite { name: &'static str, value: f32 },
  #[error("color palette needs at least 2 colors, got {0}")]
  PaletteTooShort(usize),
  #[error("palette color {index} has a component outside [0, 1]")]
  ColorOutOfRange { index: usize },
  #[error("invalid hex color {0:?}, expected #RRGGBB")]
  InvalidColor(String),
}

/// Failures of the windowed front end.
#[derive(Error, Debug)]
pub enum AppError {
  #[error(transparent)]
  Params(#[from] ParamsError),
  #[error("event loop error: {0}")]
  EventLoop(#[from] winit::error::EventLoopError),
  #[error("window creation failed: {0}")]
  Window(#[from] winit::error::OsError),
  #[error("surface creation failed: {0}")]
  CreateSurface(#[from] wgpu::CreateSurfaceError),
  #[error("no compatible GPU adapter found")]
  NoAdapter,
  #[error("device request failed: {0}")]
  RequestDevice(#[from] wgpu::RequestDeviceError),
  #[error("surface is not supported by the adapter")]
  UnsupportedSurface,
  #[error("failed to install Ctrl-C handler: {0}")]
  Signal(#[from] ctrlc::Error),
}
