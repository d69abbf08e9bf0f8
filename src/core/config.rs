use crate::models::monitor::{MonitorError, MonitorResult};
use crate::platform::pose::ProviderOptions;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MonitorConfig {
    /// Camera to open (index of /dev/video<N>)
    pub camera_index: u32,
    /// Requested capture width in pixels
    pub frame_width: u32,
    /// Requested capture height in pixels
    pub frame_height: u32,
    /// Frames processed per second
    pub target_fps: u32,
    /// Flip frames horizontally before inference (front camera mirror)
    pub mirror: bool,
    /// Pose detection confidence slider (10-100 %)
    pub detection_confidence_percent: u32,
    /// Pose tracking confidence slider (10-100 %)
    pub tracking_confidence_percent: u32,
    /// Hand detection confidence (0.0-1.0)
    pub hand_detection_confidence: f32,
    /// Hand tracking confidence (0.0-1.0)
    pub hand_tracking_confidence: f32,
    /// Maximum hands reported per frame
    pub max_num_hands: u32,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            camera_index: 0,
            frame_width: 640,
            frame_height: 480,
            target_fps: 30,
            mirror: true,
            detection_confidence_percent: 50,
            tracking_confidence_percent: 50,
            hand_detection_confidence: 0.6,
            hand_tracking_confidence: 0.6,
            max_num_hands: 2,
        }
    }
}

impl MonitorConfig {
    /// Load configuration from the default location, creating it with defaults if missing
    pub fn load() -> MonitorResult<Self> {
        Self::load_from(&Self::get_config_path()?)
    }

    pub fn load_from(path: &Path) -> MonitorResult<Self> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)?;
            let config: MonitorConfig = serde_json::from_str(&contents).map_err(|e| {
                MonitorError::InvalidConfig(format!("{}: {}", path.display(), e))
            })?;
            config.validate()?;
            Ok(config)
        } else {
            let config = Self::default();
            config.save_to(path)?;
            Ok(config)
        }
    }

    /// Save configuration to the default location
    pub fn save(&self) -> MonitorResult<()> {
        self.save_to(&Self::get_config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> MonitorResult<()> {
        self.validate()?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = serde_json::to_string_pretty(self)
            .map_err(|e| MonitorError::InvalidConfig(e.to_string()))?;
        std::fs::write(path, contents)?;

        Ok(())
    }

    /// Validate configuration values
    pub fn validate(&self) -> MonitorResult<()> {
        if self.frame_width == 0 || self.frame_height == 0 {
            return Err(MonitorError::InvalidConfig(format!(
                "Invalid frame size: {}x{}. Both dimensions must be non-zero",
                self.frame_width, self.frame_height
            )));
        }

        if self.target_fps == 0 || self.target_fps > 60 {
            return Err(MonitorError::InvalidConfig(format!(
                "Invalid target FPS: {}. Must be between 1 and 60",
                self.target_fps
            )));
        }

        // Slider ranges and hand settings are checked by the provider options
        self.provider_options()?;

        Ok(())
    }

    /// Landmark provider thresholds described by this configuration
    pub fn provider_options(&self) -> MonitorResult<ProviderOptions> {
        let options = ProviderOptions {
            hand_min_detection_confidence: self.hand_detection_confidence,
            hand_min_tracking_confidence: self.hand_tracking_confidence,
            max_num_hands: self.max_num_hands,
            ..ProviderOptions::from_slider_percent(
                self.detection_confidence_percent,
                self.tracking_confidence_percent,
            )?
        };
        options.validate()?;
        Ok(options)
    }

    /// Time between processed frames
    pub fn frame_interval(&self) -> Duration {
        Duration::from_millis(1000 / u64::from(self.target_fps.max(1)))
    }

    /// Reset to default configuration
    pub fn reset() -> MonitorResult<Self> {
        let config = Self::default();
        config.save()?;
        Ok(config)
    }

    /// Get the configuration file path
    pub fn get_config_path() -> MonitorResult<PathBuf> {
        let home = std::env::var("HOME")
            .or_else(|_| std::env::var("USERPROFILE"))
            .map_err(|_| {
                MonitorError::InvalidConfig("Could not determine home directory".to_string())
            })?;

        let mut path = PathBuf::from(home);
        path.push(".phone_watch");
        path.push("config");
        path.push("settings.json");

        Ok(path)
    }
}
