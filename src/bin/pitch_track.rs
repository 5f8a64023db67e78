use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use pitch_tracking::clock::{Clock, ManualClock};
use pitch_tracking::config::{load_config, EngineConfig};
use pitch_tracking::music::Scale;
use pitch_tracking::source::{ReadyGate, SliceSource};
use pitch_tracking::synth::SilentSink;
use pitch_tracking::{wav, Engine, SessionMode};

#[derive(Parser, Debug)]
#[command(
    name = "pitch-track",
    about = "Transcribe a monophonic recording into a note sequence"
)]
struct Cli {
    /// Input recording (WAV)
    input: Option<PathBuf>,

    /// Write the sequence as JSON to this file instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Engine configuration (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Analysis window in samples
    #[arg(long, default_value_t = 2048)]
    frame_size: usize,

    /// Samples between the starts of consecutive windows
    #[arg(long, default_value_t = 512)]
    hop: usize,

    /// Scale preset name or comma-separated semitone offsets, e.g. "0,2,4,5,7,9,11"
    #[arg(short, long)]
    scale: Option<String>,

    /// Keep detected notes off-scale
    #[arg(long)]
    no_autotune: bool,

    /// Octaves to shift every note by
    #[arg(long, allow_hyphen_values = true)]
    octave_shift: Option<i32>,

    /// Minimum frame loudness (RMS) to detect a pitch
    #[arg(long)]
    sensitivity: Option<f64>,

    /// List available scale presets and exit
    #[arg(long)]
    list_scales: bool,
}

fn parse_scale(text: &str) -> Result<Scale> {
    if text.contains(',') || text.chars().all(|c| c.is_ascii_digit()) {
        let offsets = text
            .split(',')
            .map(|s| s.trim().parse::<u8>())
            .collect::<Result<Vec<_>, _>>()
            .with_context(|| format!("Invalid scale offsets \"{}\"", text))?;
        return Ok(Scale::new(offsets)?);
    }
    Ok(Scale::by_name(text)?)
}

fn engine_config(cli: &Cli) -> Result<EngineConfig> {
    let mut config = match &cli.config {
        Some(path) => load_config(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => EngineConfig::default(),
    };

    if let Some(scale) = &cli.scale {
        config = config.with_scale(parse_scale(scale)?);
    }
    if cli.no_autotune {
        config = config.with_autotune(false);
    }
    if let Some(octaves) = cli.octave_shift {
        config = config.with_octave_shift(octaves);
    }
    if let Some(sensitivity) = cli.sensitivity {
        config = config.with_sensitivity(sensitivity);
    }
    config.validate()?;
    Ok(config)
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let cli = Cli::parse();

    if cli.list_scales {
        println!("Available scales:");
        for name in Scale::preset_names() {
            println!("  {}", name);
        }
        return Ok(());
    }

    let input = cli.input.as_ref().context("Input recording is required")?;
    if !input.exists() {
        anyhow::bail!("Input file not found: {}", input.display());
    }
    if cli.frame_size == 0 {
        anyhow::bail!("--frame-size must be positive");
    }

    let config = engine_config(&cli)?;
    let signal =
        wav::read_mono(input).with_context(|| format!("Failed to read {}", input.display()))?;
    log::info!(
        "Input: {} ({:.2}s at {} Hz)",
        input.display(),
        signal.duration(),
        signal.sample_rate
    );

    let clock = ManualClock::new();
    let mut engine = Engine::with_config(SilentSink::default(), clock.clone(), config)?;
    let notes = engine.subscribe();

    // Tick until every input sample has been covered by a window start.
    let total_frames = signal.samples.len().div_ceil(cli.hop.max(1));
    let source = SliceSource::new(signal.samples, signal.sample_rate, cli.frame_size, cli.hop);
    let hop_seconds = source.hop_seconds();
    let mut gate = ReadyGate::new(source);
    pollster::block_on(engine.start(SessionMode::Recording, &mut gate))?;

    for _ in 0..total_frames {
        clock.advance(hop_seconds);
        engine.tick();
        for change in notes.try_iter() {
            match change.name {
                Some(name) => log::debug!("{:>8.3}s  {}", clock.now(), name),
                None => log::debug!("{:>8.3}s  -", clock.now()),
            }
        }
    }
    engine.stop();

    let sequence = engine.sequence();
    log::info!(
        "Transcribed {} notes spanning {:.2}s",
        sequence.len(),
        sequence.duration()
    );

    let json = sequence.to_json()?;
    match &cli.output {
        Some(path) => {
            std::fs::write(path, json)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            log::info!("Output: {}", path.display());
        }
        None => println!("{}", json),
    }
    Ok(())
}
