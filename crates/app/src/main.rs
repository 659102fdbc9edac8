mod capture;

use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use clap::{Args, Parser, Subcommand};
use spectrum_visualiser_core::{
    AppConfig, IntervalClock, PixelSurface, RenderStyle, Rgb, SessionState, Visualiser,
};
use tracing_subscriber::EnvFilter;

use crate::capture::CommandCapture;

const DECODE_POLL: Duration = Duration::from_millis(100);

fn main() -> spectrum_visualiser_core::Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let config = build_config(&cli.options)?;
    let mut visualiser = Visualiser::with_pixel_surface(config)?;

    match cli.command {
        Commands::Live { program, device } => {
            tracing::info!(%program, ?device, "starting live mode");
            visualiser.start_capture(&mut CommandCapture::new(program, device))?;
        }
        Commands::File { path } => start_file(&mut visualiser, &path)?,
    }

    run_frames(&mut visualiser, &cli.options)
}

fn build_config(options: &Options) -> spectrum_visualiser_core::Result<AppConfig> {
    let mut config = match &options.config {
        Some(path) => AppConfig::load(path)?,
        None => AppConfig::default(),
    };

    if let Some(style) = options.style {
        config.render.set_style(style);
    }
    if let Some(sensitivity) = options.sensitivity {
        config.render.set_sensitivity(sensitivity)?;
    }
    if let Some(color) = options.color {
        config.render.set_color(color);
    }
    if let Some(width) = options.width {
        config.surface.width = width;
    }
    if let Some(height) = options.height {
        config.surface.height = height;
    }
    if options.audible {
        config.playback.audible = true;
    }

    config.validate()?;
    Ok(config)
}

fn start_file(
    visualiser: &mut Visualiser<PixelSurface>,
    path: &Path,
) -> spectrum_visualiser_core::Result<()> {
    tracing::info!(?path, "starting file playback");
    let bytes = std::fs::read(path)?;
    let extension = path
        .extension()
        .map(|extension| extension.to_string_lossy().into_owned());

    visualiser.start_playback(bytes, extension)?;
    while visualiser.wait_for_decode(DECODE_POLL)? == SessionState::Decoding {
        tracing::debug!("still decoding");
    }
    Ok(())
}

fn run_frames(
    visualiser: &mut Visualiser<PixelSurface>,
    options: &Options,
) -> spectrum_visualiser_core::Result<()> {
    if let Some(dir) = &options.snapshot_dir {
        std::fs::create_dir_all(dir)?;
    }

    let mut clock = IntervalClock::new(visualiser.config().display.refresh_hz)?;
    let every = options.snapshot_every.max(1);

    let rendered = visualiser.run(&mut clock, |visualiser| {
        let tick = visualiser.scheduler().ticks();

        if let Some(dir) = &options.snapshot_dir {
            if tick % every == 0 {
                let path = dir.join(format!("frame-{tick:06}.png"));
                visualiser.surface().save_png(&path)?;
                tracing::debug!(?path, "snapshot written");
            }
        }

        if options.frames.is_some_and(|limit| tick >= limit) {
            visualiser.stop_capture();
        }
        Ok(())
    })?;

    tracing::info!(rendered, "done");
    Ok(())
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .try_init();
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Real-time audio spectrum visualiser", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[command(flatten)]
    options: Options,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Visualise audio captured live from a recorder process.
    Live {
        /// Recorder that writes mono float32le samples to stdout.
        #[arg(long, default_value = "parec")]
        program: String,
        /// Capture device passed to the recorder.
        #[arg(short, long)]
        device: Option<String>,
    },
    /// Decode an audio file and visualise it in real time.
    File {
        /// Path to the audio file.
        path: PathBuf,
    },
}

#[derive(Args, Debug)]
struct Options {
    /// JSON configuration file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Render style: bars, waveform or radial.
    #[arg(long, global = true)]
    style: Option<RenderStyle>,
    #[arg(long, global = true)]
    sensitivity: Option<f32>,
    /// Stroke and fill colour as #rrggbb.
    #[arg(long, global = true)]
    color: Option<Rgb>,
    #[arg(long, global = true)]
    width: Option<u32>,
    #[arg(long, global = true)]
    height: Option<u32>,
    /// Also play decoded files on the default output device.
    #[arg(long, global = true)]
    audible: bool,
    /// Stop after this many frames.
    #[arg(long, global = true)]
    frames: Option<u64>,
    /// Directory that receives PNG snapshots of the surface.
    #[arg(long, global = true)]
    snapshot_dir: Option<PathBuf>,
    /// Write a snapshot every N frames.
    #[arg(long, global = true, default_value_t = 1)]
    snapshot_every: u64,
}
