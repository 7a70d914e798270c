//! Engine configuration.
//!
//! Everything the engine needs from its host at start-up: window size,
//! resource location, frame pacing, and the two policy switches (component
//! cardinality and system error handling). Loaded from JSON; every field is
//! optional and falls back to [`EngineConfig::default`].

use std::path::{Path, PathBuf};

use neo_component::ComponentPolicy;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// What the scheduler does when a system's `init` or `update` fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorPolicy {
    /// Log the failure, count it in the frame report, run the next system.
    #[default]
    Continue,
    /// Abort the frame and return the failure to the caller.
    Halt,
}

/// Framebuffer dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowConfig {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl WindowConfig {
    /// Width over height, or `1.0` for a zero-height window.
    #[must_use]
    pub fn aspect(&self) -> f32 {
        if self.height == 0 {
            1.0
        } else {
            self.width as f32 / self.height as f32
        }
    }
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
        }
    }
}

/// Configuration for an [`Engine`](crate::Engine) instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Application name, used in logs.
    pub app_name: String,
    /// Directory assets are loaded from.
    pub resource_dir: PathBuf,
    /// Initial framebuffer size.
    pub window: WindowConfig,
    /// Frames per second to pace [`Engine::run`](crate::Engine::run) to (0 = unpaced).
    pub target_fps: f64,
    /// Number of frames to run before stopping (0 = unlimited).
    pub max_frames: u64,
    /// Per-entity component cardinality.
    pub component_policy: ComponentPolicy,
    /// System failure handling.
    pub error_policy: ErrorPolicy,
    /// Run the editor inspection pass every frame.
    pub editor_enabled: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            app_name: "neo".to_string(),
            resource_dir: PathBuf::from("res"),
            window: WindowConfig::default(),
            target_fps: 60.0,
            max_frames: 0,
            component_policy: ComponentPolicy::default(),
            error_policy: ErrorPolicy::default(),
            editor_enabled: false,
        }
    }
}

impl EngineConfig {
    /// Load and validate a JSON config file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file can't be read, and
    /// [`ConfigError::Parse`] or [`ConfigError::Invalid`] for bad contents.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&text)
    }

    /// Parse and validate a JSON config document.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] or [`ConfigError::Invalid`].
    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Check value ranges.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the first bad field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.window.width == 0 || self.window.height == 0 {
            return Err(ConfigError::Invalid(format!(
                "window size must be non-zero, got {}x{}",
                self.window.width, self.window.height
            )));
        }
        if !self.target_fps.is_finite() || self.target_fps < 0.0 {
            return Err(ConfigError::Invalid(format!(
                "target_fps must be a non-negative number, got {}",
                self.target_fps
            )));
        }
        Ok(())
    }

    /// Override the application name.
    #[must_use]
    pub fn with_app_name(mut self, name: impl Into<String>) -> Self {
        self.app_name = name.into();
        self
    }

    /// Override the resource directory.
    #[must_use]
    pub fn with_resource_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.resource_dir = dir.into();
        self
    }

    /// Override the initial window size.
    #[must_use]
    pub fn with_window(mut self, width: u32, height: u32) -> Self {
        self.window = WindowConfig { width, height };
        self
    }

    /// Override the frame pacing target.
    #[must_use]
    pub fn with_target_fps(mut self, fps: f64) -> Self {
        self.target_fps = fps;
        self
    }

    /// Stop [`Engine::run`](crate::Engine::run) after `frames` frames.
    #[must_use]
    pub fn with_max_frames(mut self, frames: u64) -> Self {
        self.max_frames = frames;
        self
    }

    /// Override the component cardinality policy.
    #[must_use]
    pub fn with_component_policy(mut self, policy: ComponentPolicy) -> Self {
        self.component_policy = policy;
        self
    }

    /// Override the system error policy.
    #[must_use]
    pub fn with_error_policy(mut self, policy: ErrorPolicy) -> Self {
        self.error_policy = policy;
        self
    }

    /// Enable or disable the editor inspection pass.
    #[must_use]
    pub fn with_editor(mut self, enabled: bool) -> Self {
        self.editor_enabled = enabled;
        self
    }
}
