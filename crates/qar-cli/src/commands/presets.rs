//! Preset management commands.
//!
//! Provides commands to list, show, validate, save, copy and delete presets.

use anyhow::Context;
use clap::{Args, Subcommand};
use qar_config::{
    RhythmPreset, TrackConfig, ensure_user_presets_dir, factory_presets, get_factory_preset,
    list_presets_in, parse_algorithm, preset_name_from_path, system_presets_dir,
    user_config_dir, user_presets_dir, validate_preset,
};
use qar_core::{Pattern, PatternParams, TRACK_COUNT};

use super::common::{OutputFormat, load_preset, parse_tracks, render_pattern};

#[derive(Args)]
pub struct PresetsArgs {
    #[command(subcommand)]
    command: PresetsCommand,
}

#[derive(Subcommand)]
enum PresetsCommand {
    /// List available presets (factory and user)
    List {
        /// Show only factory presets
        #[arg(long)]
        factory: bool,

        /// Show only user presets
        #[arg(long)]
        user: bool,
    },

    /// Show details of a preset
    Show {
        /// Preset name or path
        name: String,

        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    /// Check a preset for out-of-range values and unknown names
    Validate {
        /// Preset name or path
        name: String,
    },

    /// Save a new user preset
    Save {
        /// Name for the new preset
        name: String,

        /// Tracks, e.g. "steps=8,division=3|steps=12,division=5,algorithm=golomb"
        #[arg(short, long)]
        tracks: String,

        /// Description of the preset
        #[arg(short, long)]
        description: Option<String>,

        /// Constant-time master track (1-4, 0 disables)
        #[arg(long, default_value_t = 0)]
        constant_time: u32,

        /// Overwrite if preset already exists
        #[arg(long)]
        force: bool,
    },

    /// Copy a preset into the user presets for editing
    Copy {
        /// Source preset name or path
        source: String,

        /// New preset name (defaults to the source name)
        #[arg(short, long)]
        name: Option<String>,
    },

    /// Delete a user preset
    Delete {
        /// Preset name to delete
        name: String,

        /// Confirm the deletion
        #[arg(long)]
        force: bool,
    },

    /// Show preset directories
    Paths,
}

pub fn run(args: PresetsArgs) -> anyhow::Result<()> {
    match args.command {
        PresetsCommand::List { factory, user } => list_presets(factory, user),
        PresetsCommand::Show { name, format } => show_preset(&name, format),
        PresetsCommand::Validate { name } => check_preset(&name),
        PresetsCommand::Save {
            name,
            tracks,
            description,
            constant_time,
            force,
        } => save_preset(&name, &tracks, description, constant_time, force),
        PresetsCommand::Copy { source, name } => copy_preset(&source, name.as_deref()),
        PresetsCommand::Delete { name, force } => delete_preset(&name, force),
        PresetsCommand::Paths => show_paths(),
    }
}

fn list_presets(factory_only: bool, user_only: bool) -> anyhow::Result<()> {
    if !user_only {
        println!("Factory Presets:");
        println!("================");
        for preset in factory_presets() {
            let desc = preset.description.as_deref().unwrap_or("");
            println!("  {:20} - {}", preset.name, desc);
        }
        println!();
    }

    if !factory_only {
        println!("User Presets:");
        println!("=============");
        let user_presets = list_presets_in(&user_presets_dir());
        if user_presets.is_empty() {
            println!("  (none)");
            println!();
            println!("  Create one with: qar presets save <name> --tracks \"steps=8,division=3\"");
        } else {
            for path in user_presets {
                let name = preset_name_from_path(&path).unwrap_or_else(|| "unknown".to_string());
                match RhythmPreset::load(&path) {
                    Ok(preset) => {
                        let desc = preset.description.as_deref().unwrap_or("");
                        println!("  {:20} - {}", name, desc);
                    }
                    Err(e) => {
                        tracing::warn!(path = %path.display(), "cannot load preset: {e}");
                        println!("  {:20} - (error loading)", name);
                    }
                }
            }
        }
        println!();
    }

    Ok(())
}

fn show_preset(name: &str, format: OutputFormat) -> anyhow::Result<()> {
    let preset = load_preset(name)?;

    if format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(&preset)?);
        return Ok(());
    }

    println!("Preset: {}", preset.name);
    println!("{}", "=".repeat(8 + preset.name.len()));
    if let Some(desc) = &preset.description {
        println!("{desc}");
    }
    println!();

    let engine = &preset.engine;
    println!("Chain mode:     {}", engine.chain_mode);
    match engine.constant_time_master {
        0 => println!("Constant time:  off"),
        master => println!("Constant time:  track {master}"),
    }
    println!("Muted:          {}", engine.muted);
    println!("Reset:          {}", engine.reset_mode);
    println!();

    validate_preset(&preset).with_context(|| format!("preset '{}' is invalid", preset.name))?;
    println!("Tracks:");
    let defaults = TrackConfig::default();
    for i in 0..TRACK_COUNT {
        let track = preset.tracks.get(i).unwrap_or(&defaults);
        let params = PatternParams::new(track.steps as usize, track.division as usize)
            .with_offset(track.offset as usize)
            .with_pad(track.pad as usize)
            .with_accents(track.accents as usize, track.accent_rotation as usize)
            .with_algorithm(parse_algorithm(&track.algorithm)?)
            .clamped();
        println!(
            "  {}. {:9} {:>2}/{:<2} {}",
            i + 1,
            params.algorithm.name(),
            params.division,
            params.steps,
            render_pattern(&Pattern::generate(&params))
        );
    }

    if !preset.satellites.is_empty() {
        println!();
        println!("Satellites (left to right):");
        for (i, sat) in preset.satellites.iter().enumerate() {
            let enabled: Vec<String> = sat
                .enabled
                .iter()
                .enumerate()
                .filter(|&(_, &on)| on)
                .map(|(t, _)| (t + 1).to_string())
                .collect();
            println!("  {}. {:12} tracks: {}", i + 1, sat.kind, enabled.join(","));
        }
    }

    Ok(())
}

fn check_preset(name: &str) -> anyhow::Result<()> {
    let preset = load_preset(name)?;
    validate_preset(&preset).with_context(|| format!("preset '{}' is invalid", preset.name))?;
    println!("Preset '{}' is valid.", preset.name);
    Ok(())
}

fn save_preset(
    name: &str,
    tracks: &str,
    description: Option<String>,
    constant_time: u32,
    force: bool,
) -> anyhow::Result<()> {
    let preset_path = ensure_user_presets_dir()?.join(format!("{name}.toml"));
    if preset_path.exists() && !force {
        anyhow::bail!("Preset '{name}' already exists. Use --force to overwrite.");
    }

    let mut preset = RhythmPreset::new(name);
    preset.description = description;
    preset.engine.constant_time_master = constant_time;
    preset.tracks = parse_tracks(tracks)?;
    validate_preset(&preset)?;

    preset.save(&preset_path)?;
    println!("Saved preset '{}' to {}", name, preset_path.display());
    Ok(())
}

fn copy_preset(source: &str, new_name: Option<&str>) -> anyhow::Result<()> {
    let mut preset = load_preset(source)?;
    let target_name = new_name.unwrap_or(source);

    let preset_path = ensure_user_presets_dir()?.join(format!("{target_name}.toml"));
    if preset_path.exists() {
        anyhow::bail!(
            "Preset '{target_name}' already exists in user presets. Choose a different name with --name."
        );
    }

    preset.name = target_name.to_string();
    preset.save(&preset_path)?;
    println!("Copied preset '{source}' to user preset '{target_name}'");
    println!("Path: {}", preset_path.display());
    Ok(())
}

fn delete_preset(name: &str, force: bool) -> anyhow::Result<()> {
    let preset_path = user_presets_dir().join(format!("{name}.toml"));
    if !preset_path.exists() {
        if get_factory_preset(name).is_some() {
            anyhow::bail!("Cannot delete factory preset '{name}'. Factory presets are built-in.");
        }
        anyhow::bail!("User preset '{name}' not found.");
    }

    if !force {
        anyhow::bail!("Use --force to confirm deletion of preset '{name}'.");
    }

    std::fs::remove_file(&preset_path)
        .with_context(|| format!("cannot delete {}", preset_path.display()))?;
    println!("Deleted preset '{name}'.");
    Ok(())
}

fn show_paths() -> anyhow::Result<()> {
    println!("Preset Directories:");
    println!("===================");
    println!();
    println!("User presets:   {}", user_presets_dir().display());
    println!("System presets: {}", system_presets_dir().display());
    println!("Config dir:     {}", user_config_dir().display());
    Ok(())
}
