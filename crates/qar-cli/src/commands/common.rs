//! Shared CLI helpers used across multiple commands.

use anyhow::Context;
use clap::ValueEnum;
use qar_config::{RhythmPreset, TrackConfig, resolve_preset};
use qar_core::{Pattern, TrackParam};

/// How command results are printed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text
    #[default]
    Text,
    /// One JSON document on stdout
    Json,
}

/// Load a preset by path, user/system preset name, or factory preset name.
pub fn load_preset(name: &str) -> anyhow::Result<RhythmPreset> {
    resolve_preset(name).context("use 'qar presets list' to see available presets")
}

/// One character per step: `X` accented beat, `x` beat, `.` rest.
pub fn render_pattern(pattern: &Pattern) -> String {
    (0..pattern.steps())
        .map(|i| match (pattern.is_beat(i), pattern.is_accent(i)) {
            (true, true) => 'X',
            (true, false) => 'x',
            _ => '.',
        })
        .collect()
}

/// Parse a track list such as `steps=8,division=3|steps=12,division=5,algorithm=golomb`.
///
/// Tracks are separated by `|`, fields by `,`. Unlisted fields keep their
/// defaults. Values are not range-checked here; preset validation does that.
pub fn parse_tracks(spec: &str) -> anyhow::Result<Vec<TrackConfig>> {
    let mut tracks = Vec::new();

    for track_spec in spec.split('|') {
        let track_spec = track_spec.trim();
        if track_spec.is_empty() {
            continue;
        }

        let mut track = TrackConfig::default();
        for field in track_spec.split(',') {
            let field = field.trim();
            if field.is_empty() {
                continue;
            }
            let Some((key, value)) = field.split_once('=') else {
                anyhow::bail!("invalid track field '{field}' (expected key=value)");
            };
            let (key, value) = (key.trim(), value.trim());

            if key == "algorithm" {
                track.algorithm = value.to_string();
                continue;
            }
            let param = TrackParam::from_id(key)
                .with_context(|| format!("unknown track field '{key}'"))?;
            let value: u32 = value
                .parse()
                .with_context(|| format!("'{key}' must be a whole number, got '{value}'"))?;
            match param {
                TrackParam::Steps => track.steps = value,
                TrackParam::Division => track.division = value,
                TrackParam::Offset => track.offset = value,
                TrackParam::Pad => track.pad = value,
                TrackParam::Accents => track.accents = value,
                TrackParam::AccentRotation => track.accent_rotation = value,
            }
        }
        tracks.push(track);
    }

    Ok(tracks)
}

#[cfg(test)]
mod tests {
    use super::*;
    use qar_core::PatternParams;

    #[test]
    fn render_marks_accents() {
        let pattern = Pattern::generate(&PatternParams::new(8, 3).with_accents(1, 0));
        let text = render_pattern(&pattern);
        assert_eq!(text.len(), 8);
        assert_eq!(text.matches(['x', 'X']).count(), 3);
        assert_eq!(text.matches('X').count(), 1);
    }

    #[test]
    fn parse_single_track() {
        let tracks = parse_tracks("steps=8, division=3").unwrap();
        assert_eq!(tracks.len(), 1);
        assert_eq!(tracks[0].steps, 8);
        assert_eq!(tracks[0].division, 3);
        assert_eq!(tracks[0].algorithm, "euclidean");
    }

    #[test]
    fn parse_multiple_tracks() {
        let tracks =
            parse_tracks("steps=8,division=3|steps=12,division=5,algorithm=golomb|").unwrap();
        assert_eq!(tracks.len(), 2);
        assert_eq!(tracks[1].algorithm, "golomb");
        assert_eq!(tracks[1].steps, 12);
    }

    #[test]
    fn parse_accepts_accent_rotation_id() {
        let tracks = parse_tracks("accents=2,accent_rotation=1").unwrap();
        assert_eq!(tracks[0].accents, 2);
        assert_eq!(tracks[0].accent_rotation, 1);
    }

    #[test]
    fn parse_rejects_bad_fields() {
        assert!(parse_tracks("steps").is_err());
        assert!(parse_tracks("tempo=120").is_err());
        assert!(parse_tracks("steps=eight").is_err());
    }
}
