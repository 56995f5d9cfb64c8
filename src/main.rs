use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use particle_galaxy::color::Rgb;
use particle_galaxy::state::RunOptions;
use particle_galaxy::{CameraParams, GalaxyParameters, StarfieldParams};
use std::io;
use std::process::ExitCode;

/// Interactive spiral galaxy made of particles. Click to blow holes in it.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
  /// Number of galaxy particles
  #[arg(short, long, default_value_t = GalaxyParameters::default().count)]
  count: u32,
  /// Outer radius of the spiral arms
  #[arg(short, long, default_value_t = GalaxyParameters::default().radius)]
  radius: f32,
  /// Number of spiral arms
  #[arg(short, long, default_value_t = GalaxyParameters::default().branches)]
  branches: u32,
  /// Twist of the arms per unit of radius
  #[arg(long, default_value_t = GalaxyParameters::default().spin, allow_negative_numbers = true)]
  spin: f32,
  #[arg(long, default_value_t = GalaxyParameters::default().randomness)]
  randomness: f32,
  #[arg(long, default_value_t = GalaxyParameters::default().randomness_power)]
  randomness_power: f32,
  /// Gradient from core to rim, as comma separated hex colors
  #[arg(long, value_delimiter = ',', value_parser = parse_color)]
  colors: Vec<Rgb>,
  /// Number of background stars
  #[arg(long, default_value_t = StarfieldParams::default().count)]
  stars: u32,
  /// Seed for a reproducible galaxy
  #[arg(long)]
  seed: Option<u64>,
  /// Run in headless mode (no window)
  #[arg(long, default_value_t = false)]
  headless: bool,
  /// Frames to simulate in headless mode
  #[arg(long, default_value_t = 600)]
  frames: u64,
  /// In headless mode, trigger an explosion every N frames (0 disables)
  #[arg(long, default_value_t = 0)]
  explode_every: u64,
  #[command(subcommand)]
  command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
  /// Generate shell completion scripts
  Completions {
    /// The shell to generate the script for
    #[arg(value_enum)]
    shell: Shell,
  },
}

fn parse_color(s: &str) -> Result<Rgb, String> {
  s.parse::<Rgb>().map_err(|e| e.to_string())
}

impl Args {
  fn into_options(self) -> RunOptions {
    let defaults = GalaxyParameters::default();
    let colors = if self.colors.is_empty() {
      defaults.colors
    } else {
      self.colors
    };
    RunOptions {
      galaxy: GalaxyParameters {
        count: self.count,
        radius: self.radius,
        branches: self.branches,
        spin: self.spin,
        randomness: self.randomness,
        randomness_power: self.randomness_power,
        colors,
      },
      starfield: StarfieldParams {
        count: self.stars,
        ..StarfieldParams::default()
      },
      camera: CameraParams::default(),
      seed: self.seed,
      headless: self.headless,
      frames: self.frames,
      explode_every: self.explode_every,
    }
  }
}

fn main() -> ExitCode {
  let args = Args::parse();

  if let Some(Commands::Completions { shell }) = args.command {
    let mut cmd = Args::command();
    let name = cmd.get_name().to_string();
    generate(shell, &mut cmd, name, &mut io::stdout());
    return ExitCode::SUCCESS;
  }

  env_logger::init();
  match particle_galaxy::state::run(args.into_options()) {
    Ok(()) => ExitCode::SUCCESS,
    Err(err) => {
      log::error!("{err}");
      eprintln!("error: {err}");
      ExitCode::FAILURE
    }
  }
}
