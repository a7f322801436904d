use std::path::PathBuf;

use clap::{Parser, Subcommand};
use reactive_backdrop_core::{
    AudioEngine, AudioInput, AudioSource, DirectorConfig, DirectorError, DirectorEvent,
    HeadlessSurface, MediaDirector, MediaSource, RenderSurface, Viewport,
};
use tracing_subscriber::EnvFilter;

mod simulation;

use simulation::{KickSynth, LoggingReleaser, SimulatedPlayback};

fn main() -> reactive_backdrop_core::Result<()> {
    init_tracing();

    let cli = Cli::parse();

    match cli.command {
        Commands::Simulate {
            config,
            frames,
            fps,
            bpm,
            deny_capture,
            media,
        } => {
            let config = load_config(config.as_ref(), &media)?;
            run_simulation(&config, frames, fps, bpm, deny_capture)
        }
        Commands::Config { config } => {
            let config = load_config(config.as_ref(), &[])?;
            println!("{}", config.to_json_pretty()?);
            Ok(())
        }
    }
}

fn load_config(
    path: Option<&PathBuf>,
    media: &[String],
) -> reactive_backdrop_core::Result<DirectorConfig> {
    let mut config = match path {
        Some(path) => DirectorConfig::load(path)?,
        None => DirectorConfig::default(),
    };

    if !media.is_empty() {
        config.playlist.sources = media
            .iter()
            .map(|path| {
                MediaSource::from_path(path)
                    .ok_or_else(|| DirectorError::msg(format!("unsupported media file `{path}`")))
            })
            .collect::<reactive_backdrop_core::Result<_>>()?;
        config.validate()?;
    }
    Ok(config)
}

fn run_simulation(
    config: &DirectorConfig,
    frames: u32,
    fps: f64,
    bpm: f32,
    deny_capture: bool,
) -> reactive_backdrop_core::Result<()> {
    if !(fps > 0.0) {
        return Err(DirectorError::InvalidInput("fps must be positive"));
    }
    tracing::info!(
        frames,
        fps,
        bpm,
        sources = config.playlist.sources.len(),
        "starting simulation"
    );

    let viewport = Viewport::default();
    let mut director = MediaDirector::new(
        config,
        viewport,
        SimulatedPlayback::default(),
        LoggingReleaser::default(),
    )?;
    let mut audio = AudioEngine::new(config.audio.clone())?;
    let mut synth = KickSynth::new(config.audio.sample_rate, bpm);
    let mut render = HeadlessSurface::new();

    let ticket = audio.request_capture()?;
    let frame_ms = 1000.0 / fps;
    let samples_per_frame = (config.audio.sample_rate as f64 / fps).round() as usize;

    for frame in 0..frames {
        let now_ms = frame as f64 * frame_ms;
        let mut events = director.playback_mut().advance(frame_ms / 1000.0);

        // The user answers the capture prompt on the second frame.
        if frame == 1 {
            if deny_capture {
                audio.capture_denied(ticket, "permission denied by user")?;
            } else {
                audio.capture_granted(ticket)?;
            }
            events.push(DirectorEvent::LiveCaptureChanged(audio.is_capturing()?));
        }

        let input = if audio.is_capturing()? {
            AudioInput::Capture
        } else {
            AudioInput::MediaElement
        };
        audio.push_samples(input, &synth.next_block(samples_per_frame))?;
        if let Some(bins) = audio.frequency_bins() {
            events.push(DirectorEvent::AudioFrame(bins));
        }

        let (x, y) = pointer_path(now_ms, viewport);
        events.push(DirectorEvent::PointerMoved { x, y });

        let uniforms = director.tick(now_ms, events);
        render.present(&uniforms, director.visual().as_ref());
        tracing::trace!(frame, ?uniforms, "frame presented");
    }

    audio.stop_capture()?;
    director.shutdown();

    let stats = director.stats();
    tracing::info!(
        frames = render.frames(),
        beat_advances = stats.beat_advances,
        loops = stats.loops,
        stale_completions = stats.stale_completions,
        current = %director.playlist().current(),
        "simulation finished"
    );
    Ok(())
}

/// Slow Lissajous sweep across the viewport.
fn pointer_path(now_ms: f64, viewport: Viewport) -> (f32, f32) {
    let t = (now_ms / 1000.0) as f32;
    let x = 0.5 + 0.4 * (t * 0.7).sin();
    let y = 0.5 + 0.4 * (t * 0.3).cos();
    (x * viewport.width, y * viewport.height)
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .try_init();
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Audio-reactive media background director", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Drive the director headlessly with a synthetic kick drum.
    Simulate {
        /// JSON configuration file.
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Number of animation frames to run.
        #[arg(long, default_value_t = 600)]
        frames: u32,
        /// Animation frame rate.
        #[arg(long, default_value_t = 60.0)]
        fps: f64,
        /// Tempo of the synthetic kick drum.
        #[arg(long, default_value_t = 128.0)]
        bpm: f32,
        /// Refuse the live capture request and fall back to the media soundtrack.
        #[arg(long)]
        deny_capture: bool,
        /// Media files to play instead of the configured playlist.
        media: Vec<String>,
    },
    /// Print the effective configuration as JSON.
    Config {
        /// JSON configuration file.
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}
