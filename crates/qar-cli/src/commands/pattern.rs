//! Print the pattern one track would play.

use clap::Args;
use qar_core::{Algorithm, GOLOMB_RULERS, Pattern, PatternParams};
use serde::Serialize;

use super::common::{OutputFormat, render_pattern};

/// Print the beats and accents of one track's parameters.
#[derive(Args)]
pub struct PatternArgs {
    /// Total steps (0-18)
    pub steps: usize,

    /// Beats per cycle
    pub division: usize,

    /// Rotate every beat by this many steps
    #[arg(short, long, default_value_t = 0)]
    pub offset: usize,

    /// Leading silent steps
    #[arg(short, long, default_value_t = 0)]
    pub pad: usize,

    /// Accents distributed over the beats
    #[arg(short, long, default_value_t = 0)]
    pub accents: usize,

    /// Rotate the accents by this many beats
    #[arg(long, default_value_t = 0)]
    pub accent_rotation: usize,

    /// Place beats with a Golomb ruler instead of the Euclidean bucket
    #[arg(short, long)]
    pub golomb: bool,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

impl PatternArgs {
    fn params(&self) -> PatternParams {
        let algorithm = if self.golomb {
            Algorithm::GolombRuler
        } else {
            Algorithm::Euclidean
        };
        PatternParams::new(self.steps, self.division)
            .with_offset(self.offset)
            .with_pad(self.pad)
            .with_accents(self.accents, self.accent_rotation)
            .with_algorithm(algorithm)
    }
}

#[derive(Serialize)]
struct PatternReport {
    algorithm: &'static str,
    steps: usize,
    division: usize,
    offset: usize,
    pad: usize,
    pattern: String,
    beats: Vec<usize>,
    accents: Vec<usize>,
    ruler: Option<Vec<u8>>,
}

impl PatternReport {
    /// Report on the clamped parameters, which is what a track would play.
    fn new(params: &PatternParams) -> Self {
        let params = params.clamped();
        let pattern = Pattern::generate(&params);
        Self {
            algorithm: params.algorithm.name(),
            steps: params.steps,
            division: params.division,
            offset: params.offset,
            pad: params.pad,
            pattern: render_pattern(&pattern),
            beats: (0..pattern.steps()).filter(|&i| pattern.is_beat(i)).collect(),
            accents: (0..pattern.steps()).filter(|&i| pattern.is_accent(i)).collect(),
            ruler: pattern
                .ruler()
                .and_then(|r| GOLOMB_RULERS.get(r))
                .map(|marks| marks.to_vec()),
        }
    }
}

/// Run the pattern command.
pub fn run(args: PatternArgs) -> anyhow::Result<()> {
    let report = PatternReport::new(&args.params());

    match args.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        OutputFormat::Text => {
            println!(
                "{} {}/{} (offset {}, pad {})",
                report.algorithm, report.division, report.steps, report.offset, report.pad
            );
            println!("  {}", report.pattern);
            println!("  beats:   {:?}", report.beats);
            println!("  accents: {:?}", report.accents);
            if let Some(ruler) = &report.ruler {
                println!("  ruler:   {ruler:?}");
            }
        }
    }

    Ok(())
}
