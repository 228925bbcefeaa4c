// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Runtime configuration for XR systems and sessions.
//!
//! Every field has a default, so a JSON document only needs to name the values
//! it overrides:
//!
//! ```
//! use xrlink_core::config::XrConfig;
//!
//! let config = XrConfig::from_json_str(r#"{ "application_name": "Viewer" }"#).unwrap();
//! assert_eq!(config.application_name, "Viewer");
//! assert_eq!(config.availability_poll.attempts, 100);
//! ```

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{XrError, XrResult};
use crate::session::DepthRange;
use crate::view::{TextureFormat, TextureFormatKind};

/// A bounded retry policy: how many attempts, and how long to sleep between them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollPolicy {
    /// Maximum number of attempts before giving up.
    pub attempts: u32,
    /// Delay between two attempts, in milliseconds.
    pub interval_ms: u64,
}

impl PollPolicy {
    /// Creates a policy.
    pub const fn new(attempts: u32, interval_ms: u64) -> Self {
        Self {
            attempts,
            interval_ms,
        }
    }

    /// The delay between two attempts.
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

impl Default for PollPolicy {
    /// 100 attempts, 200 ms apart: a 20 second budget.
    fn default() -> Self {
        Self::new(100, 200)
    }
}

/// How many views the runtime renders per frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ViewConfiguration {
    /// One view per eye.
    #[default]
    Stereo,
    /// A single view.
    Mono,
}

impl ViewConfiguration {
    /// The number of views this configuration expects.
    pub fn view_count(self) -> usize {
        match self {
            ViewConfiguration::Stereo => 2,
            ViewConfiguration::Mono => 1,
        }
    }
}

/// Configuration shared by every backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct XrConfig {
    /// Name reported to the runtime at instance creation.
    pub application_name: String,
    /// Initial near/far clip distances.
    pub depth_range: DepthRange,
    /// Policy for polling the runtime-availability oracle.
    pub availability_poll: PollPolicy,
    /// Policy for retrying system initialization when beginning a session.
    pub initialize_retry: PollPolicy,
    /// Upper bound on waiting for the runtime to be ready for a new frame.
    pub frame_wait_timeout_ms: u64,
    /// Upper bound on waiting for an acquired swapchain image to become writable.
    pub image_wait_timeout_ms: u64,
    /// Acceptable color formats, most preferred first.
    pub color_formats: Vec<TextureFormat>,
    /// Acceptable depth formats, most preferred first.
    pub depth_formats: Vec<TextureFormat>,
    /// The view configuration to request.
    pub view_configuration: ViewConfiguration,
}

impl Default for XrConfig {
    fn default() -> Self {
        Self {
            application_name: String::from("xrlink"),
            depth_range: DepthRange::default(),
            availability_poll: PollPolicy::default(),
            initialize_retry: PollPolicy::default(),
            frame_wait_timeout_ms: 1_000,
            image_wait_timeout_ms: 1_000,
            color_formats: vec![TextureFormat::Rgba8Srgb, TextureFormat::Bgra8Srgb],
            depth_formats: vec![TextureFormat::D24S8],
            view_configuration: ViewConfiguration::Stereo,
        }
    }
}

impl XrConfig {
    /// Parses a configuration from JSON. Missing fields take their defaults.
    pub fn from_json_str(json: &str) -> XrResult<Self> {
        let config: XrConfig =
            serde_json::from_str(json).map_err(|e| XrError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reads and parses a JSON configuration file.
    pub fn from_json_file(path: impl AsRef<Path>) -> XrResult<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .map_err(|e| XrError::Config(format!("{}: {e}", path.display())))?;
        log::debug!("Loaded XR configuration from {}", path.display());
        Self::from_json_str(&contents)
    }

    /// The frame wait bound as a [`Duration`].
    pub fn frame_wait_timeout(&self) -> Duration {
        Duration::from_millis(self.frame_wait_timeout_ms)
    }

    /// The image wait bound as a [`Duration`].
    pub fn image_wait_timeout(&self) -> Duration {
        Duration::from_millis(self.image_wait_timeout_ms)
    }

    /// Checks the configuration for values no runtime could satisfy.
    pub fn validate(&self) -> XrResult<()> {
        let DepthRange { near, far } = self.depth_range;
        if near.is_nan() || near <= 0.0 {
            return Err(XrError::Config(format!(
                "depth_range.near must be positive, got {near}"
            )));
        }
        if far.is_nan() || far <= near {
            return Err(XrError::Config(format!(
                "depth_range.far ({far}) must be greater than near ({near})"
            )));
        }
        check_formats("color_formats", &self.color_formats, TextureFormatKind::Color)?;
        check_formats("depth_formats", &self.depth_formats, TextureFormatKind::Depth)?;
        if self.availability_poll.attempts == 0 {
            return Err(XrError::Config(
                "availability_poll.attempts must be at least 1".into(),
            ));
        }
        if self.initialize_retry.attempts == 0 {
            return Err(XrError::Config(
                "initialize_retry.attempts must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

fn check_formats(
    field: &str,
    formats: &[TextureFormat],
    expected: TextureFormatKind,
) -> XrResult<()> {
    if formats.is_empty() {
        return Err(XrError::Config(format!("{field} must not be empty")));
    }
    if let Some(format) = formats.iter().find(|f| f.kind() != expected) {
        return Err(XrError::Config(format!(
            "{field} contains {format:?}, which is not a {expected} format"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = XrConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.depth_range.near, 0.5);
        assert_eq!(config.depth_range.far, 1000.0);
        assert_eq!(config.availability_poll, PollPolicy::new(100, 200));
        assert_eq!(config.availability_poll.interval(), Duration::from_millis(200));
        assert_eq!(config.initialize_retry, PollPolicy::new(100, 200));
        assert_eq!(config.view_configuration.view_count(), 2);
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config = XrConfig::from_json_str(
            r#"{ "depth_range": { "near": 0.1, "far": 50.0 }, "view_configuration": "Mono" }"#,
        )
        .unwrap();
        assert_eq!(config.depth_range, DepthRange::new(0.1, 50.0));
        assert_eq!(config.view_configuration, ViewConfiguration::Mono);
        assert_eq!(config.color_formats, XrConfig::default().color_formats);
    }

    #[test]
    fn rejects_inverted_depth_range() {
        let err = XrConfig::from_json_str(r#"{ "depth_range": { "near": 10.0, "far": 1.0 } }"#)
            .unwrap_err();
        assert!(matches!(err, XrError::Config(_)));
    }

    #[test]
    fn rejects_depth_format_in_color_list() {
        let config = XrConfig {
            color_formats: vec![TextureFormat::D24S8],
            ..XrConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_empty_format_list_and_zero_attempts() {
        let config = XrConfig {
            depth_formats: vec![],
            ..XrConfig::default()
        };
        assert!(config.validate().is_err());

        let config = XrConfig {
            availability_poll: PollPolicy::new(0, 200),
            ..XrConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_malformed_json() {
        assert!(matches!(
            XrConfig::from_json_str("{ not json"),
            Err(XrError::Config(_))
        ));
    }

    #[test]
    fn missing_file_is_a_config_error() {
        assert!(matches!(
            XrConfig::from_json_file("/definitely/not/here.json"),
            Err(XrError::Config(_))
        ));
    }
}
