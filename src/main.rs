use anyhow::{Context, Result};
use clap::Parser;
use log::info;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use std::time::{Duration, Instant};

use arrvee_soundsight::audio::{load_wav_mono, MonoClip};
use arrvee_soundsight::{AnalysisConfig, Visualizer, VisualizerEvent};

/// Base colors handed out to sources in file order
const PALETTE: [&str; 6] = ["#ff4040", "#40a0ff", "#40ff80", "#ffd040", "#d040ff", "#40ffff"];

#[derive(Parser)]
#[command(name = "sound-sight")]
#[command(about = "Turns one or more audio files into a stream of visual frames (JSON lines)")]
struct Args {
    /// WAV files, one source per file
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// Analysis config JSON (fftSize, minFrequency, maxFrequency, updateRate, ...)
    #[arg(long, short)]
    config: Option<PathBuf>,

    /// Samples per ingestion block
    #[arg(long, default_value = "1024")]
    chunk_size: usize,

    /// Output path for JSON lines (stdout when omitted)
    #[arg(long, short)]
    output: Option<PathBuf>,

    /// Feed audio at wall-clock speed and let the scheduler tick on its own
    #[arg(long)]
    realtime: bool,
}

struct Track {
    id: String,
    clip: MonoClip,
    cursor: usize,
}

/// Feeds each track block by block up to a given audio time
struct Feeder {
    tracks: Vec<Track>,
    chunk_size: usize,
}

impl Feeder {
    /// Ingest every block that ends at or before `clock` seconds
    fn advance_to(&mut self, visualizer: &Visualizer, clock: f64) {
        for track in &mut self.tracks {
            let len = track.clip.samples.len();
            let rate = track.clip.sample_rate.max(1) as f64;

            while track.cursor < len {
                let end = (track.cursor + self.chunk_size).min(len);
                if end as f64 / rate > clock {
                    break;
                }
                visualizer.process_audio(&track.id, &track.clip.samples[track.cursor..end], track.clip.sample_rate);
                track.cursor = end;
            }
        }
    }

    fn finished(&self) -> bool {
        self.tracks.iter().all(|t| t.cursor >= t.clip.samples.len())
    }
}

#[derive(Default)]
struct RunStats {
    events_written: usize,
    frames_written: usize,
    peak_active_sources: usize,
}

fn write_events(
    events: &crossbeam_channel::Receiver<VisualizerEvent>,
    writer: &mut dyn Write,
    stats: &mut RunStats,
) -> Result<()> {
    for event in events.try_iter() {
        if let VisualizerEvent::FrameUpdate { frame } = &event {
            stats.frames_written += 1;
            stats.peak_active_sources = stats.peak_active_sources.max(frame.global_metrics.num_active_sources);
        }
        serde_json::to_writer(&mut *writer, &event)?;
        writeln!(writer)?;
        stats.events_written += 1;
    }
    Ok(())
}

fn frame_is_empty(visualizer: &Visualizer) -> bool {
    visualizer
        .current_frame()
        .map_or(true, |frame| frame.elements.is_empty())
}

/// Step audio time one tick at a time, ticking by hand; output is deterministic
fn run_offline(
    visualizer: &Visualizer,
    feeder: &mut Feeder,
    events: &crossbeam_channel::Receiver<VisualizerEvent>,
    writer: &mut dyn Write,
    stats: &mut RunStats,
) -> Result<()> {
    let tick_seconds = 1.0 / visualizer.config().update_rate as f64;
    let mut clock = 0.0;

    // Keep ticking after the audio ends until every element has faded out
    while !feeder.finished() || !frame_is_empty(visualizer) {
        clock += tick_seconds;
        feeder.advance_to(visualizer, clock);
        visualizer.tick();
        write_events(events, writer, stats)?;
    }
    Ok(())
}

async fn run_realtime(
    visualizer: &Visualizer,
    feeder: &mut Feeder,
    events: &crossbeam_channel::Receiver<VisualizerEvent>,
    writer: &mut dyn Write,
    stats: &mut RunStats,
) -> Result<()> {
    visualizer.start()?;

    let period = visualizer.config().tick_interval();
    let mut pacer = tokio::time::interval(period.max(Duration::from_millis(1)));
    let started = Instant::now();

    while !feeder.finished() || !frame_is_empty(visualizer) {
        pacer.tick().await;
        feeder.advance_to(visualizer, started.elapsed().as_secs_f64());
        write_events(events, writer, stats)?;
    }

    visualizer.stop();
    write_events(events, writer, stats)
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => AnalysisConfig::from_json_file(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => AnalysisConfig::default(),
    };
    let chunk_size = args.chunk_size.max(1);

    let visualizer = Visualizer::new(config)?;
    let events = visualizer.subscribe();

    let mut tracks = Vec::new();
    for (i, path) in args.files.iter().enumerate() {
        let clip = load_wav_mono(path)
            .with_context(|| format!("Failed to load WAV file {}", path.display()))?;
        let id = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| format!("source-{}", i));

        visualizer.register_source(&id, &path.display().to_string(), PALETTE[i % PALETTE.len()]);
        tracks.push(Track { id, clip, cursor: 0 });
    }

    let longest = tracks.iter().map(|t| t.clip.duration_seconds()).fold(0.0, f64::max);
    info!("Visualizing {} source(s), {:.2}s of audio, {} samples per block", tracks.len(), longest, chunk_size);

    let mut writer: Box<dyn Write> = match &args.output {
        Some(path) => Box::new(BufWriter::new(
            File::create(path).with_context(|| format!("Failed to create {}", path.display()))?,
        )),
        None => Box::new(BufWriter::new(io::stdout().lock())),
    };

    let mut feeder = Feeder { tracks, chunk_size };
    let mut stats = RunStats::default();

    if args.realtime {
        run_realtime(&visualizer, &mut feeder, &events, writer.as_mut(), &mut stats).await?;
    } else {
        run_offline(&visualizer, &mut feeder, &events, writer.as_mut(), &mut stats)?;
    }
    writer.flush()?;

    info!(
        "Done: {} events, {} frames, peak {} active source(s)",
        stats.events_written, stats.frames_written, stats.peak_active_sources
    );

    Ok(())
}
