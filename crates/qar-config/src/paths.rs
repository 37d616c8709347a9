//! Platform preset directories and preset lookup.
//!
//! - **User presets**: `<config dir>/qar/presets/`, where the config dir is
//!   `~/.config` on Linux, `~/Library/Application Support` on macOS and
//!   `%APPDATA%` on Windows
//! - **System presets**: `/usr/share/qar/presets/` on Linux,
//!   `/Library/Application Support/qar/presets/` on macOS, the data dir
//!   elsewhere
//!
//! [`resolve_preset`] searches a literal path, then the user directory, then
//! the system directory, then the factory presets.

use std::path::{Path, PathBuf};

use crate::error::ConfigError;
use crate::factory_presets::get_factory_preset;
use crate::preset::RhythmPreset;

const APP_NAME: &str = "qar";
const PRESETS_SUBDIR: &str = "presets";
const PRESET_EXTENSION: &str = "toml";

/// Per-user configuration directory. Falls back to `./qar`.
pub fn user_config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_NAME)
}

/// Per-user presets directory.
pub fn user_presets_dir() -> PathBuf {
    user_config_dir().join(PRESETS_SUBDIR)
}

/// System-wide, usually read-only, presets directory.
pub fn system_presets_dir() -> PathBuf {
    let base = if cfg!(target_os = "linux") {
        PathBuf::from("/usr/share")
    } else if cfg!(target_os = "macos") {
        PathBuf::from("/Library/Application Support")
    } else {
        dirs::data_dir().unwrap_or_else(|| PathBuf::from("."))
    };
    base.join(APP_NAME).join(PRESETS_SUBDIR)
}

/// File name for a preset name, adding the extension when missing.
fn preset_file_name(name: &str) -> String {
    if Path::new(name)
        .extension()
        .is_some_and(|ext| ext == PRESET_EXTENSION)
    {
        name.to_string()
    } else {
        format!("{name}.{PRESET_EXTENSION}")
    }
}

/// Find a preset file on disk.
///
/// `name` may be a path to an existing file, or a bare name (with or without
/// `.toml`) looked up in the user then system presets directory.
pub fn find_preset(name: &str) -> Option<PathBuf> {
    let literal = PathBuf::from(name);
    if literal.is_file() {
        return Some(literal);
    }
    let file_name = preset_file_name(name);
    [user_presets_dir(), system_presets_dir()]
        .into_iter()
        .map(|dir| dir.join(&file_name))
        .find(|path| path.is_file())
}

/// Load a preset by path or name, falling back to the factory presets.
///
/// # Example
///
/// ```rust,no_run
/// use qar_config::resolve_preset;
///
/// // a file on disk wins over a factory preset of the same name
/// let preset = resolve_preset("tresillo").unwrap();
/// assert_eq!(preset.tracks[0].steps, 8);
/// ```
pub fn resolve_preset(name: &str) -> Result<RhythmPreset, ConfigError> {
    if let Some(path) = find_preset(name) {
        return RhythmPreset::load(path);
    }
    get_factory_preset(name).ok_or_else(|| ConfigError::PresetNotFound(name.to_string()))
}

/// Create the user presets directory if needed and return it.
pub fn ensure_user_presets_dir() -> Result<PathBuf, ConfigError> {
    let dir = user_presets_dir();
    if !dir.exists() {
        std::fs::create_dir_all(&dir).map_err(|e| ConfigError::create_dir(&dir, e))?;
    }
    Ok(dir)
}

/// Preset files in a directory, sorted by path. Unreadable or missing
/// directories yield nothing.
pub fn list_presets_in(dir: &Path) -> Vec<PathBuf> {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return Vec::new();
    };
    let mut presets: Vec<PathBuf> = entries
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && path.extension().is_some_and(|e| e == PRESET_EXTENSION))
        .collect();
    presets.sort();
    presets
}

/// User preset files followed by system preset files.
pub fn list_all_presets() -> Vec<PathBuf> {
    let mut presets = list_presets_in(&user_presets_dir());
    presets.extend(list_presets_in(&system_presets_dir()));
    presets
}

/// Preset name of a file: its stem.
pub fn preset_name_from_path(path: &Path) -> Option<String> {
    path.file_stem()
        .and_then(|s| s.to_str())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn directories_are_namespaced() {
        assert!(user_config_dir().ends_with(APP_NAME));
        assert!(user_presets_dir().ends_with("qar/presets"));
        assert!(system_presets_dir().ends_with("qar/presets"));
    }

    #[test]
    fn file_name_gets_extension_once() {
        assert_eq!(preset_file_name("relay"), "relay.toml");
        assert_eq!(preset_file_name("relay.toml"), "relay.toml");
    }

    #[test]
    fn find_by_literal_path() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("mine.toml");
        fs::write(&path, "name = \"Mine\"").unwrap();
        assert_eq!(find_preset(path.to_str().unwrap()), Some(path));
    }

    #[test]
    fn missing_preset_is_not_found() {
        assert!(find_preset("no_such_preset_8d1f").is_none());
        assert!(matches!(
            resolve_preset("no_such_preset_8d1f"),
            Err(ConfigError::PresetNotFound(name)) if name == "no_such_preset_8d1f"
        ));
    }

    #[test]
    fn resolve_prefers_file_then_factory() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("tresillo.toml");
        fs::write(&path, "name = \"Local Tresillo\"").unwrap();
        let local = resolve_preset(path.to_str().unwrap()).unwrap();
        assert_eq!(local.name, "Local Tresillo");

        let factory = resolve_preset("polymeter").unwrap();
        assert_eq!(factory.name, "Polymeter");
    }

    #[test]
    fn listing_filters_and_sorts() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("b.toml"), "").unwrap();
        fs::write(temp.path().join("a.toml"), "").unwrap();
        fs::write(temp.path().join("notes.txt"), "").unwrap();
        fs::create_dir(temp.path().join("dir.toml")).unwrap();

        let names: Vec<_> = list_presets_in(temp.path())
            .iter()
            .filter_map(|p| preset_name_from_path(p))
            .collect();
        assert_eq!(names, vec!["a", "b"]);
        assert!(list_presets_in(Path::new("/nonexistent/qar/12345")).is_empty());
    }
}
