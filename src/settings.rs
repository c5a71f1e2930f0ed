//! User preferences, persisted as JSON next to the binary
//!
//! Loading falls back to defaults on any error; saving is best-effort. Both
//! paths only log, settings problems never stop the game.

use std::path::Path;

use serde::{Deserialize, Serialize};

const SETTINGS_FILE: &str = "brick_rush_settings.json";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub master_volume: f32,
    pub show_fps: bool,
    pub particles_enabled: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            master_volume: 0.7,
            show_fps: false,
            particles_enabled: true,
        }
    }
}

impl Settings {
    pub fn load() -> Self {
        Self::load_from(Path::new(SETTINGS_FILE))
    }

    fn load_from(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(text) => match serde_json::from_str(&text) {
                Ok(settings) => settings,
                Err(err) => {
                    log::warn!("Settings - malformed {path:?}, using defaults: {err}");
                    Self::default()
                }
            },
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Self::default(),
            Err(err) => {
                log::warn!("Settings - cannot read {path:?}, using defaults: {err}");
                Self::default()
            }
        }
    }

    pub fn save(&self) {
        self.save_to(Path::new(SETTINGS_FILE));
    }

    fn save_to(&self, path: &Path) {
        let json = match serde_json::to_string_pretty(self) {
            Ok(json) => json,
            Err(err) => {
                log::warn!("Settings - serialization failed: {err}");
                return;
            }
        };
        if let Err(err) = std::fs::write(path, json) {
            log::warn!("Settings - cannot write {path:?}: {err}");
        }
    }
}
