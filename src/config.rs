use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;
use anyhow::Result;

use crate::error::SentinelError;

/// Posture thresholds. Every desk-monitor variant is one of these.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThresholdProfile {
    /// Max shoulder->ear deviation from vertical, degrees.
    pub neck_thresh: f32,
    /// Max hip->shoulder deviation from vertical, degrees.
    pub torso_thresh: f32,
    /// Min ear-shoulder-hip interior angle, degrees.
    pub shoulder_round_thresh: f32,
    /// Max ear or shoulder line tilt from horizontal, degrees.
    pub tilt_thresh: f32,
    /// Allowed shrink of the nose-to-shoulder distance, pixels.
    pub offset_y: f32,
    /// Seconds of continuous bad posture before the alarm fires.
    pub alarm_delay_secs: f32,
}

impl ThresholdProfile {
    pub const NAMES: [&'static str; 4] = ["standard", "strict", "relaxed", "lenient"];

    pub fn standard() -> Self {
        Self {
            neck_thresh: 45.0,
            torso_thresh: 15.0,
            shoulder_round_thresh: 155.0,
            tilt_thresh: 20.0,
            offset_y: 30.0,
            alarm_delay_secs: 3.0,
        }
    }

    pub fn named(name: &str) -> Result<Self, SentinelError> {
        let profile = match name {
            "standard" => Self::standard(),
            "strict" => Self {
                neck_thresh: 40.0,
                torso_thresh: 10.0,
                tilt_thresh: 15.0,
                ..Self::standard()
            },
            "relaxed" => Self {
                neck_thresh: 50.0,
                shoulder_round_thresh: 145.0,
                ..Self::standard()
            },
            "lenient" => Self {
                neck_thresh: 50.0,
                shoulder_round_thresh: 145.0,
                tilt_thresh: 25.0,
                offset_y: 40.0,
                alarm_delay_secs: 5.0,
                ..Self::standard()
            },
            other => return Err(SentinelError::UnknownProfile(other.to_string())),
        };
        Ok(profile)
    }

    /// Negative or non-finite delays collapse to zero.
    pub fn alarm_delay(&self) -> Duration {
        Duration::try_from_secs_f32(self.alarm_delay_secs).unwrap_or_default()
    }
}

impl Default for ThresholdProfile {
    fn default() -> Self {
        Self::standard()
    }
}

/// How landmarks map into pixels, and when a landmark counts as seen.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewSettings {
    pub frame_width: u32,
    pub frame_height: u32,
    pub min_visibility: f32,
}

impl Default for ViewSettings {
    fn default() -> Self {
        Self {
            frame_width: 1280,
            frame_height: 720,
            min_visibility: 0.5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub user: String,
    pub target_minutes: u32,
    pub journal_path: Option<String>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            user: "anonymous".to_string(),
            target_minutes: 30,
            journal_path: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub frame_width: u32,
    pub frame_height: u32,
    pub min_visibility: f32,
    pub profile: String,
    /// Custom thresholds; replaces the named profile when present.
    pub thresholds: Option<ThresholdProfile>,
    pub session: SessionConfig,
}

impl Default for Config {
    fn default() -> Self {
        let view = ViewSettings::default();
        Self {
            frame_width: view.frame_width,
            frame_height: view.frame_height,
            min_visibility: view.min_visibility,
            profile: "standard".to_string(),
            thresholds: None,
            session: SessionConfig::default(),
        }
    }
}

impl Config {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<(), SentinelError> {
        if self.frame_width == 0 || self.frame_height == 0 {
            return Err(SentinelError::InvalidConfig(
                "frame geometry must be non-zero".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.min_visibility) {
            return Err(SentinelError::InvalidConfig(format!(
                "min_visibility {} is outside [0, 1]",
                self.min_visibility
            )));
        }
        let profile = self.threshold_profile()?;
        if !(profile.alarm_delay_secs.is_finite() && profile.alarm_delay_secs > 0.0) {
            return Err(SentinelError::InvalidConfig(
                "alarm_delay_secs must be positive".to_string(),
            ));
        }
        Ok(())
    }

    pub fn threshold_profile(&self) -> Result<ThresholdProfile, SentinelError> {
        match &self.thresholds {
            Some(custom) => Ok(custom.clone()),
            None => ThresholdProfile::named(&self.profile),
        }
    }

    pub fn view_settings(&self) -> ViewSettings {
        ViewSettings {
            frame_width: self.frame_width,
            frame_height: self.frame_height,
            min_visibility: self.min_visibility,
        }
    }
}
