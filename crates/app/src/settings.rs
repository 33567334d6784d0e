use crate::events::SettingsEvent;
use overlay::PlacementSettings;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

pub const MIN_IMAGE_SIZE: f32 = 50.0;
pub const MIN_REVEAL_SIZE: f32 = 5.0;
pub const MAX_REVEAL_SIZE: f32 = 500.0;

/// How long settings must stay unchanged before they are written
pub const SAVE_DELAY: Duration = Duration::from_millis(750);

/// Persisted user preferences
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct AppConfig {
    /// Long edge of a newly added image, logical units
    #[serde(default = "default_max_image_size")]
    pub max_image_size: f32,
    /// Whether the Explorer "open with DMTool" entry should be installed
    #[serde(default = "default_install_context_menu")]
    pub install_context_menu: bool,
    #[serde(default)]
    pub show_debug_info: bool,
    #[serde(default)]
    pub enable_fog_of_war: bool,
    /// Diameter of the circle revealed by the pointer
    #[serde(default = "default_fog_reveal_size")]
    pub fog_reveal_size: f32,
    /// Overlay display, -1 picks a secondary display automatically
    #[serde(default = "default_target_display_index")]
    pub target_display_index: i32,
    #[serde(default)]
    pub offset_x: i32,
    #[serde(default)]
    pub offset_y: i32,
}

fn default_max_image_size() -> f32 {
    400.0
}

fn default_install_context_menu() -> bool {
    true
}

fn default_fog_reveal_size() -> f32 {
    50.0
}

fn default_target_display_index() -> i32 {
    -1
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            max_image_size: default_max_image_size(),
            install_context_menu: default_install_context_menu(),
            show_debug_info: false,
            enable_fog_of_war: false,
            fog_reveal_size: default_fog_reveal_size(),
            target_display_index: default_target_display_index(),
            offset_x: 0,
            offset_y: 0,
        }
    }
}

fn clamp_image_size(value: f32) -> f32 {
    if value.is_finite() {
        value.max(MIN_IMAGE_SIZE)
    } else {
        default_max_image_size()
    }
}

fn clamp_reveal_size(value: f32) -> f32 {
    if value.is_finite() {
        value.clamp(MIN_REVEAL_SIZE, MAX_REVEAL_SIZE)
    } else {
        default_fog_reveal_size()
    }
}

impl AppConfig {
    /// Pull hand-edited values back into range
    pub fn sanitize(&mut self) {
        self.max_image_size = clamp_image_size(self.max_image_size);
        self.fog_reveal_size = clamp_reveal_size(self.fog_reveal_size);
        if self.target_display_index < -1 {
            self.target_display_index = -1;
        }
    }

    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Self = serde_json::from_str(&content)?;
        config.sanitize();
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(dir) = path.parent() {
            if !dir.as_os_str().is_empty() {
                std::fs::create_dir_all(dir)?;
            }
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    pub fn placement(&self) -> PlacementSettings {
        PlacementSettings {
            target_display_index: self.target_display_index,
            offset_x: self.offset_x,
            offset_y: self.offset_y,
        }
    }
}

/// `<config dir>/DMTool/settings.json`
pub fn default_path() -> PathBuf {
    dirs_next::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("DMTool")
        .join("settings.json")
}

/// The settings record plus where it lives and whether it needs writing.
///
/// Every setter reports a [`SettingsEvent`] only when the stored value
/// actually changed.
#[derive(Debug)]
pub struct Settings {
    config: AppConfig,
    path: PathBuf,
    unsaved_since: Option<Instant>,
}

impl Settings {
    pub fn new(config: AppConfig, path: PathBuf) -> Self {
        Self {
            config,
            path,
            unsaved_since: None,
        }
    }

    /// Read `path`, falling back to defaults when it is missing or invalid.
    pub fn load(path: PathBuf) -> Self {
        let config = if path.exists() {
            match AppConfig::load(&path) {
                Ok(config) => {
                    tracing::info!("loaded settings from {}", path.display());
                    config
                }
                Err(e) => {
                    tracing::warn!("failed to read settings from {}, using defaults: {e}", path.display());
                    AppConfig::default()
                }
            }
        } else {
            tracing::warn!("no settings file at {}, using defaults", path.display());
            AppConfig::default()
        };
        Self::new(config, path)
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_dirty(&self) -> bool {
        self.unsaved_since.is_some()
    }

    /// Note an unsaved change made at `now`
    pub fn mark_dirty(&mut self, now: Instant) {
        self.unsaved_since = Some(now);
    }

    pub fn save(&mut self) -> anyhow::Result<()> {
        self.config.save(&self.path)?;
        self.unsaved_since = None;
        tracing::debug!("saved settings to {}", self.path.display());
        Ok(())
    }

    /// Save once changes have settled for [`SAVE_DELAY`]. Returns whether a
    /// write happened.
    pub fn save_if_due(&mut self, now: Instant) -> anyhow::Result<bool> {
        match self.unsaved_since {
            Some(since) if now.saturating_duration_since(since) >= SAVE_DELAY => {
                // A failed write waits for the next change instead of retrying every frame
                self.unsaved_since = None;
                self.config.save(&self.path)?;
                tracing::debug!("saved settings to {}", self.path.display());
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    pub fn set_max_image_size(&mut self, value: f32) -> Option<SettingsEvent> {
        let value = clamp_image_size(value);
        if self.config.max_image_size == value {
            return None;
        }
        self.config.max_image_size = value;
        Some(SettingsEvent::MaxImageSizeChanged(value))
    }

    pub fn set_show_debug_info(&mut self, value: bool) -> Option<SettingsEvent> {
        if self.config.show_debug_info == value {
            return None;
        }
        self.config.show_debug_info = value;
        Some(SettingsEvent::ShowDebugInfoChanged(value))
    }

    pub fn set_fog_enabled(&mut self, value: bool) -> Option<SettingsEvent> {
        if self.config.enable_fog_of_war == value {
            return None;
        }
        self.config.enable_fog_of_war = value;
        Some(SettingsEvent::FogEnabledChanged(value))
    }

    pub fn set_fog_reveal_size(&mut self, value: f32) -> Option<SettingsEvent> {
        let value = clamp_reveal_size(value);
        if self.config.fog_reveal_size == value {
            return None;
        }
        self.config.fog_reveal_size = value;
        Some(SettingsEvent::FogRevealSizeChanged(value))
    }

    pub fn set_target_display_index(&mut self, value: i32) -> Option<SettingsEvent> {
        let value = value.max(-1);
        if self.config.target_display_index == value {
            return None;
        }
        self.config.target_display_index = value;
        Some(SettingsEvent::TargetDisplayChanged(value))
    }

    pub fn set_offset(&mut self, x: i32, y: i32) -> Option<SettingsEvent> {
        if (self.config.offset_x, self.config.offset_y) == (x, y) {
            return None;
        }
        self.config.offset_x = x;
        self.config.offset_y = y;
        Some(SettingsEvent::OffsetChanged { x, y })
    }

    pub fn set_install_context_menu(&mut self, value: bool) -> Option<SettingsEvent> {
        if self.config.install_context_menu == value {
            return None;
        }
        self.config.install_context_menu = value;
        Some(SettingsEvent::InstallContextMenuChanged(value))
    }
}
