//! Playback metrics
//!
//! Contains the metric event model, the repeating timer that drives `time`
//! metrics, and the consumer that posts metrics to the collector.

mod consumer;
mod timer;

pub use consumer::MetricsConsumer;
pub use timer::RepeatingTimer;

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde_json::{json, Map, Value};

use crate::config::ClientConfig;

/// Receives every metric emitted by a playback session.
pub trait MetricSink: Send + Sync {
    fn consume(&self, metric: Metric);
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MetricAction {
    Setup,
    Play,
    Pause,
    Buffer,
    Seek { to: Duration },
    Time,
    Complete,
}

impl MetricAction {
    pub fn name(&self) -> &'static str {
        match self {
            MetricAction::Setup => "setup",
            MetricAction::Play => "play",
            MetricAction::Pause => "pause",
            MetricAction::Buffer => "buffer",
            MetricAction::Seek { .. } => "seek",
            MetricAction::Time => "time",
            MetricAction::Complete => "complete",
        }
    }

    fn write_fields(&self, params: &mut Map<String, Value>, platform: &PlatformInfo) {
        params.insert("action".to_string(), json!(self.name()));
        match self {
            MetricAction::Setup => {
                let os = platform.os_name.as_str();
                let fields = [
                    ("user_agent", json!(platform.user_agent())),
                    ("platform", json!(os)),
                    ("browser_name", json!(os)),
                    ("os", json!(os)),
                    ("browser_version", json!(platform.os_version)),
                    ("model", json!(platform.model)),
                    ("product_type", json!("")),
                    ("system_version", json!(platform.os_version)),
                    ("vendor_identifier", json!("")),
                    ("player_version", json!(platform.sdk_version)),
                    ("host", json!(format!("{} for {}", platform.app_name, os))),
                    ("language", json!("")),
                    ("remote_ip", json!("")),
                ];
                for (key, value) in fields {
                    params.insert(key.to_string(), value);
                }
            }
            MetricAction::Seek { to } => {
                params.insert("offset".to_string(), json!(to.as_secs_f64()));
            }
            _ => {}
        }
    }
}

impl fmt::Display for MetricAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetricAction::Seek { to } => write!(f, "seek (to {})", to.as_secs_f64()),
            other => f.write_str(other.name()),
        }
    }
}

/// One playback interaction event. Created at a state transition, sent once.
#[derive(Debug, Clone, PartialEq)]
pub struct Metric {
    pub action: MetricAction,
    /// Media position the event refers to
    pub time: Duration,
    /// Accumulated watch time for the session
    pub total_time: Duration,
    pub timestamp: DateTime<Utc>,
    pub video_height: u32,
}

impl Metric {
    pub fn new(action: MetricAction, time: Duration, total_time: Duration, video_height: u32) -> Self {
        Self {
            action,
            time,
            total_time,
            timestamp: Utc::now(),
            video_height,
        }
    }

    /// The metric's own fields as sent to the collector.
    pub fn to_params(&self, platform: &PlatformInfo) -> Map<String, Value> {
        let mut params = Map::new();
        params.insert("position".to_string(), json!(self.time.as_secs_f64()));
        params.insert("duration".to_string(), json!(self.total_time.as_secs_f64()));
        params.insert(
            "timestamp".to_string(),
            json!(self.timestamp.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string()),
        );
        params.insert("videoHeight".to_string(), json!(self.video_height));
        self.action.write_fields(&mut params, platform);
        params
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "action: {}, time: {}, totalTime: {}",
            self.action,
            self.time.as_secs_f64(),
            self.total_time.as_secs_f64()
        )
    }
}

/// Host application and platform identity reported with the setup metric.
#[derive(Debug, Clone, PartialEq)]
pub struct PlatformInfo {
    pub app_name: String,
    pub app_version: String,
    pub app_build: String,
    pub bundle_identifier: String,
    pub os_name: String,
    pub os_version: String,
    pub model: String,
    pub sdk_version: String,
}

impl PlatformInfo {
    pub fn from_config(config: &ClientConfig) -> Self {
        Self {
            app_name: config.app_name.clone(),
            app_version: config.app_version.clone(),
            app_build: config.app_build.clone(),
            bundle_identifier: config.bundle_identifier.clone(),
            os_name: std::env::consts::OS.to_string(),
            os_version: config.os_version.clone(),
            model: std::env::consts::ARCH.to_string(),
            sdk_version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    pub fn user_agent(&self) -> String {
        format!(
            "{}/{} ({}; build:{}; {} {}) BoxCast SDK/{}",
            self.app_name,
            self.app_version,
            self.bundle_identifier,
            self.app_build,
            self.os_name,
            self.os_version,
            self.sdk_version
        )
    }
}
