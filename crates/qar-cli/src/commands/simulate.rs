//! Run presets against a fixed-tempo clock.
//!
//! With `--engines N` the preset is instantiated N times and daisy-chained:
//! every track's end-of-cycle output is patched to the matching start input
//! of the next engine, the last one feeding back into the first. The first
//! engine runs in boss mode, the others in employee mode, so the instances
//! take turns.

use anyhow::Context;
use clap::Args;
use qar_config::RhythmPreset;
use qar_core::{ChainMode, Rack, RhythmEngine, TRACK_COUNT};
use serde::Serialize;

use super::common::{OutputFormat, load_preset, parse_tracks};

/// Run a preset against a fixed-tempo clock and print what plays.
#[derive(Args)]
pub struct SimulateArgs {
    /// Preset name or path
    #[arg(short, long, default_value = "init")]
    pub preset: String,

    /// Replace the preset's tracks, e.g. "steps=8,division=3|steps=12,division=5"
    #[arg(short, long)]
    pub tracks: Option<String>,

    /// Tempo in quarter notes per minute
    #[arg(long, default_value_t = 120.0)]
    pub bpm: f64,

    /// Clock pulses per quarter note
    #[arg(long, default_value_t = 4)]
    pub ppqn: u32,

    /// Length of the run in 4/4 bars
    #[arg(short, long, default_value_t = 2)]
    pub bars: u32,

    /// Frames per second (defaults to the preset's sample rate)
    #[arg(long)]
    pub sample_rate: Option<u32>,

    /// Number of daisy-chained engine instances
    #[arg(short, long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..=8))]
    pub engines: u32,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

/// Width of the simulated clock pulse.
const CLOCK_PULSE_SECONDS: f64 = 0.005;
const CLOCK_HIGH_VOLTS: f32 = 10.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
enum EventKind {
    Beat,
    Accent,
    EndOfCycle,
}

#[derive(Debug, Serialize)]
struct Event {
    frame: u64,
    time: f64,
    engine: usize,
    track: usize,
    kind: EventKind,
}

#[derive(Debug, Serialize)]
struct SimulationReport {
    preset: String,
    sample_rate: u32,
    frames: u64,
    /// `[engine][track]` step strings: `X`/`x`/`.` per step, `|` per cycle.
    lanes: Vec<[String; TRACK_COUNT]>,
    /// `[engine][track]` beat counts.
    beats: Vec<[usize; TRACK_COUNT]>,
    events: Vec<Event>,
}

/// Fixed-tempo square-wave clock.
struct Clock {
    period_frames: f64,
    high_frames: f64,
}

impl Clock {
    fn new(sample_rate: u32, bpm: f64, ppqn: u32) -> anyhow::Result<Self> {
        anyhow::ensure!(bpm.is_finite() && bpm > 0.0, "bpm must be positive, got {bpm}");
        anyhow::ensure!(ppqn > 0, "ppqn must be at least 1");
        let period_frames = f64::from(sample_rate) * 60.0 / (bpm * f64::from(ppqn));
        anyhow::ensure!(
            period_frames >= 2.0,
            "clock at {bpm} bpm x {ppqn} ppqn is too fast for {sample_rate} Hz"
        );
        let high_frames =
            (f64::from(sample_rate) * CLOCK_PULSE_SECONDS).clamp(1.0, period_frames / 2.0);
        Ok(Self {
            period_frames,
            high_frames,
        })
    }

    fn volts(&self, frame: u64) -> f32 {
        if (frame as f64) % self.period_frames < self.high_frames {
            CLOCK_HIGH_VOLTS
        } else {
            0.0
        }
    }
}

fn engine_mut(rack: &mut Rack) -> anyhow::Result<&mut RhythmEngine> {
    rack.module_mut::<RhythmEngine>(0)
        .context("rack slot 0 is not a rhythm engine")
}

fn engine(rack: &Rack) -> anyhow::Result<&RhythmEngine> {
    rack.module::<RhythmEngine>(0)
        .context("rack slot 0 is not a rhythm engine")
}

fn simulate(
    preset: &RhythmPreset,
    sample_rate: u32,
    clock: &Clock,
    frames: u64,
    engines: usize,
) -> anyhow::Result<SimulationReport> {
    let preset = preset.clone().with_sample_rate(sample_rate);
    let mut racks = Vec::with_capacity(engines);
    for index in 0..engines {
        let mut rack = preset
            .build_rack()
            .with_context(|| format!("cannot build preset '{}'", preset.name))?;
        if engines > 1 {
            let engine = engine_mut(&mut rack)?;
            let mode = if index == 0 {
                ChainMode::Boss
            } else {
                ChainMode::Employee
            };
            engine.set_chain_mode(mode);
            for track in &mut engine.inputs_mut().tracks {
                track.start = Some(0.0);
            }
        }
        racks.push(rack);
    }

    let sample_time = 1.0 / f64::from(sample_rate);
    let mut report = SimulationReport {
        preset: preset.name.clone(),
        sample_rate,
        frames,
        lanes: vec![Default::default(); engines],
        beats: vec![[0; TRACK_COUNT]; engines],
        events: Vec::new(),
    };
    let mut cables = vec![[0.0_f32; TRACK_COUNT]; engines];

    for frame in 0..frames {
        let volts = clock.volts(frame);
        for (index, rack) in racks.iter_mut().enumerate() {
            let engine = engine_mut(rack)?;
            engine.inputs_mut().clock = volts;
            if engines > 1 {
                let upstream = &cables[(index + engines - 1) % engines];
                for (input, &cable) in engine.inputs_mut().tracks.iter_mut().zip(upstream) {
                    input.start = Some(cable);
                }
            }
            rack.process_frame();
        }

        for (index, rack) in racks.iter().enumerate() {
            let engine = engine(rack)?;
            for track in 0..TRACK_COUNT {
                cables[index][track] = engine.outputs().tracks[track].end_of_cycle;
                let events = engine.events()[track];
                let lane = &mut report.lanes[index][track];
                let mut push = |kind| {
                    report.events.push(Event {
                        frame,
                        time: frame as f64 * sample_time,
                        engine: index,
                        track,
                        kind,
                    });
                };
                if events.beat {
                    report.beats[index][track] += 1;
                    push(EventKind::Beat);
                }
                if events.accent {
                    push(EventKind::Accent);
                }
                if events.end_of_cycle {
                    push(EventKind::EndOfCycle);
                    lane.push('|');
                }
                if events.stepped {
                    lane.push(match (events.beat, events.accent) {
                        (true, true) => 'X',
                        (true, false) => 'x',
                        _ => '.',
                    });
                }
            }
        }
    }

    Ok(report)
}

/// Run the simulate command.
pub fn run(args: SimulateArgs) -> anyhow::Result<()> {
    let mut preset = load_preset(&args.preset)?;
    if let Some(spec) = &args.tracks {
        preset.tracks = parse_tracks(spec)?;
    }
    let sample_rate = args.sample_rate.unwrap_or(preset.sample_rate);
    anyhow::ensure!(sample_rate > 0, "sample rate must be positive");

    let clock = Clock::new(sample_rate, args.bpm, args.ppqn)?;
    let seconds = f64::from(args.bars) * 4.0 * 60.0 / args.bpm;
    let frames = (seconds * f64::from(sample_rate)).ceil() as u64;

    tracing::info!(
        preset = %preset.name,
        sample_rate,
        frames,
        engines = args.engines,
        "starting simulation"
    );
    let report = simulate(&preset, sample_rate, &clock, frames, args.engines as usize)?;

    match args.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        OutputFormat::Text => {
            println!(
                "{}: {} bars at {} bpm ({} frames at {} Hz)",
                report.preset, args.bars, args.bpm, report.frames, report.sample_rate
            );
            for (index, lanes) in report.lanes.iter().enumerate() {
                if report.lanes.len() > 1 {
                    println!("engine {}:", index + 1);
                }
                for (track, lane) in lanes.iter().enumerate() {
                    println!(
                        "  track {} [{:>3} beats] {}",
                        track + 1,
                        report.beats[index][track],
                        lane
                    );
                }
            }
        }
    }

    Ok(())
}
