//! Settings Module
//!
//! User-tunable behavior, loaded from a TOML file in the XDG config
//! directory. Missing file or missing keys fall back to defaults; a
//! malformed file is reported and replaced by defaults rather than
//! aborting startup.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum FocusPolicy {
    #[default]
    ClickToFocus,
    FocusFollowsMouse,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub focus_policy: FocusPolicy,
    /// Focus freshly mapped windows
    pub focus_new: bool,
    pub raise_on_focus: bool,
    pub workspace_count: u32,
    /// Pixel distance at which a moved frame snaps to screen edges;
    /// zero disables snapping
    pub snap_distance: u32,
    pub titlebar_height: u32,
    pub border_width: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            focus_policy: FocusPolicy::ClickToFocus,
            focus_new: true,
            raise_on_focus: true,
            workspace_count: 4,
            snap_distance: 10,
            titlebar_height: 24,
            border_width: 1,
        }
    }
}

impl Settings {
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("tabwm").join("settings.toml"))
    }

    /// Load settings, falling back to defaults on any failure.
    pub fn load() -> Self {
        let Some(path) = Self::config_path() else {
            return Self::default();
        };
        match fs::read_to_string(&path) {
            Ok(text) => match toml::from_str(&text) {
                Ok(settings) => {
                    info!("loaded settings from {}", path.display());
                    settings
                }
                Err(err) => {
                    warn!("ignoring malformed {}: {}", path.display(), err);
                    Self::default()
                }
            },
            Err(_) => Self::default(),
        }
    }

    pub fn save(&self) -> Result<()> {
        let path = Self::config_path().context("no config directory available")?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating {}", parent.display()))?;
        }
        let text = toml::to_string_pretty(self).context("serializing settings")?;
        fs::write(&path, text).with_context(|| format!("writing {}", path.display()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_and_missing_keys_fall_back() {
        let settings: Settings = toml::from_str("focus_policy = \"focus_follows_mouse\"\n")
            .expect("partial settings parse");
        assert_eq!(settings.focus_policy, FocusPolicy::FocusFollowsMouse);
        assert_eq!(settings.workspace_count, Settings::default().workspace_count);
    }

    #[test]
    fn defaults_round_trip_through_toml() {
        let text = toml::to_string(&Settings::default()).expect("serialize");
        let back: Settings = toml::from_str(&text).expect("parse");
        assert_eq!(back.snap_distance, Settings::default().snap_distance);
    }
}
