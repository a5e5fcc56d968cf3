use std::{
    fs::create_dir_all,
    path::{Path, PathBuf},
};

use super::input::KeybindSettings;
use crate::render::SineOffsetType;
use anyhow::{bail, Context, Result};
use olivine_core::terrain::{OctaveSet, OutOfExtentPolicy, TerrainExtent};
use serde::{Deserialize, Serialize};

const SETTINGS_RON_FILE: &str = "settings.ron";

#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
#[serde(default)]
pub struct CameraSettings {
    pub fov_degrees: f64,
    /// Horizontal speed the camera settles at while a movement key is held, units/s
    pub player_speed: f64,
    /// Offset from the camera to the feet, added to the camera's y for ground checks
    pub player_feet: f64,
    pub gravity: bool,
    pub debug_camera: bool,
    pub initial_position: [f64; 3],
}
impl Default for CameraSettings {
    fn default() -> Self {
        Self {
            fov_degrees: 45.0,
            player_speed: 8.0,
            player_feet: -4.0,
            gravity: true,
            debug_camera: false,
            initial_position: [2.0, 2.0, 2.0],
        }
    }
}

#[derive(Clone, Serialize, Deserialize, Debug, PartialEq, Default)]
#[serde(default)]
pub struct TerrainSettings {
    pub extent: TerrainExtent,
    pub octaves: OctaveSet,
    pub out_of_extent: OutOfExtentPolicy,
    pub seed: u32,
}

#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
#[serde(default)]
pub struct BounceSettings {
    pub offset_type: SineOffsetType,
    pub bounces_per_second: f64,
    /// Scales the phase offset, which is a cell's place in its chunk relative to the
    /// terrain extent
    pub oscillation_frequency: f64,
    pub bounce_height: f64,
}
impl Default for BounceSettings {
    fn default() -> Self {
        Self {
            offset_type: SineOffsetType::Concentric,
            bounces_per_second: 0.0,
            oscillation_frequency: 0.0,
            bounce_height: 1.0,
        }
    }
}

#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
#[serde(default)]
pub struct RenderSettings {
    pub target_fps: u32,
    pub light_position: [f32; 3],
    pub light_color: [f32; 3],
    pub ambient_color: [f32; 3],
    /// Rotation of the whole terrain about x, y and z, in degrees
    pub terrain_rotation: [f64; 3],
    pub bounce: BounceSettings,
}
impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            target_fps: 60,
            light_position: [0.0, 10.0, 0.0],
            light_color: [1.0, 1.0, 1.0],
            ambient_color: [0.3, 0.3, 0.3],
            terrain_rotation: [0.0, 0.0, 0.0],
            bounce: BounceSettings::default(),
        }
    }
}

#[derive(Clone, Serialize, Deserialize, Debug, PartialEq, Default)]
#[serde(default)]
pub struct DebugSettings {
    /// Log frame timing and terrain stats every this many frames; 0 disables
    pub log_stats_interval: u32,
    pub log_camera_position: bool,
}

#[derive(Clone, Serialize, Deserialize, Debug, Default, PartialEq)]
#[serde(default)]
pub struct GameSettings {
    pub input: KeybindSettings,
    pub camera: CameraSettings,
    pub terrain: TerrainSettings,
    pub render: RenderSettings,
    pub debug: DebugSettings,

    #[serde(skip)]
    internal_parsing_failure_message: Option<String>,
}
impl GameSettings {
    pub fn save_to_disk(&self) -> Result<()> {
        self.save_to_path(&default_settings_path()?)
    }

    pub fn save_to_path(&self, config_file: &Path) -> Result<()> {
        if let Some(message) = &self.internal_parsing_failure_message {
            bail!(
                "Not overwriting {} since it failed to parse: {}",
                clean_path(config_file.to_path_buf()),
                message
            );
        }
        if let Some(config_dir) = config_file.parent() {
            if !config_dir.exists() {
                create_dir_all(config_dir)?;
            }
        }
        let config = ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
            .context("couldn't serialize settings")?;
        std::fs::write(config_file, config)
            .with_context(|| format!("couldn't write {}", config_file.display()))?;
        log::info!("Saved settings to {}", clean_path(config_file.to_path_buf()));
        Ok(())
    }

    pub fn load_from_disk() -> Result<Self> {
        Self::load_from_path(&default_settings_path()?)
    }

    /// Missing files give the defaults. Unparsable files also give the defaults, and remember
    /// the parse error so the broken file isn't overwritten.
    pub fn load_from_path(config_file: &Path) -> Result<Self> {
        if !config_file.exists() {
            log::warn!("No settings found at {}", clean_path(config_file.to_path_buf()));
            return Ok(Self::default());
        }
        let config = std::fs::read_to_string(config_file)
            .with_context(|| format!("couldn't read {}", config_file.display()))?;
        match ron::from_str::<GameSettings>(&config) {
            Ok(parsed) => {
                log::info!(
                    "Loaded settings from {}",
                    clean_path(config_file.to_path_buf())
                );
                Ok(parsed)
            }
            Err(e) => {
                log::error!(
                    "Failed to parse {}, using defaults: {}",
                    clean_path(config_file.to_path_buf()),
                    e
                );
                Ok(Self {
                    internal_parsing_failure_message: Some(e.to_string()),
                    ..Default::default()
                })
            }
        }
    }

    pub fn parsing_failure_message(&self) -> Option<&str> {
        self.internal_parsing_failure_message.as_deref()
    }
}

pub fn default_settings_path() -> Result<PathBuf> {
    Ok(project_dirs()?.config_dir().join(SETTINGS_RON_FILE))
}

fn project_dirs() -> Result<directories::ProjectDirs> {
    directories::ProjectDirs::from("org", "olivine", "olivine").context("couldn't find config dir")
}

/// Replaces the user's home directory with an environment variable, so logs can be shared
/// without leaking the username.
pub fn clean_path(path: PathBuf) -> String {
    let user_dirs = directories::UserDirs::new();
    if let Some(user_dirs) = user_dirs {
        if cfg!(target_os = "windows") {
            path.strip_prefix(user_dirs.home_dir())
                .map(|p| format!("%UserProfile%\\{}", p.display()))
                .unwrap_or(path.display().to_string())
        } else if cfg!(target_os = "linux") {
            path.strip_prefix(user_dirs.home_dir())
                .map(|p| format!("$HOME/{}", p.display()))
                .unwrap_or(path.display().to_string())
        } else {
            path.display().to_string()
        }
    } else {
        path.display().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use olivine_core::terrain::Octave;

    fn scratch_file(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("olivine-settings-{}", std::process::id()));
        create_dir_all(&dir).unwrap();
        let path = dir.join(name);
        let _ = std::fs::remove_file(&path);
        path
    }

    #[test]
    fn missing_file_gives_defaults() {
        let path = scratch_file("missing.ron");
        let settings = GameSettings::load_from_path(&path).unwrap();
        assert_eq!(settings, GameSettings::default());
        assert!(settings.parsing_failure_message().is_none());
    }

    #[test]
    fn save_then_load() {
        let path = scratch_file("saved.ron");
        let mut settings = GameSettings::default();
        settings.render.target_fps = 30;
        settings.camera.gravity = false;
        settings.terrain.extent = TerrainExtent::new(7, 3);
        settings.terrain.octaves =
            OctaveSet::from_octaves([Octave::new(64.0, 8.0).unwrap()]).unwrap();
        settings.input.camera_sensitivity = 0.02;
        settings.save_to_path(&path).unwrap();

        let loaded = GameSettings::load_from_path(&path).unwrap();
        assert_eq!(loaded, settings);
    }

    #[test]
    fn partial_file_fills_defaults() {
        let path = scratch_file("partial.ron");
        std::fs::write(&path, "(render: (target_fps: 24))").unwrap();
        let loaded = GameSettings::load_from_path(&path).unwrap();
        assert_eq!(loaded.render.target_fps, 24);
        assert_eq!(loaded.camera, CameraSettings::default());
        assert_eq!(loaded.terrain.octaves.len(), 15);
    }

    #[test]
    fn unparsable_file_is_not_overwritten() {
        let path = scratch_file("broken.ron");
        std::fs::write(&path, "(render: (target_fps: \"fast\"").unwrap();
        let loaded = GameSettings::load_from_path(&path).unwrap();
        assert!(loaded.parsing_failure_message().is_some());
        assert_eq!(loaded.render, RenderSettings::default());
        assert!(loaded.save_to_path(&path).is_err());
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "(render: (target_fps: \"fast\""
        );
    }

    #[test]
    fn too_many_octaves_fails_to_parse() {
        let path = scratch_file("octaves.ron");
        let octaves = vec!["(16.0, 1.0)"; 17].join(", ");
        std::fs::write(&path, format!("(terrain: (octaves: [{octaves}]))")).unwrap();
        let loaded = GameSettings::load_from_path(&path).unwrap();
        assert!(loaded.parsing_failure_message().is_some());
    }
}
