//! # Configuration
//!
//! [`FulfillmentConfig`] is plain serde data with a default for every field, so a JSON
//! document only needs to name what it changes. [`FulfillmentConfig::from_env`] layers
//! `FULFILLMENT_*` environment variables on top:
//!
//! | Variable | Field |
//! |----------|-------|
//! | `FULFILLMENT_CONFIG` | path of a JSON file loaded first |
//! | `FULFILLMENT_CUBBY_SLOTS` | `cubby_slots` |
//! | `FULFILLMENT_MAX_CUBBY_PROBES` | `max_cubby_probes` |
//! | `FULFILLMENT_ROBOT_CALL_TIMEOUT_MS` | `robot_call_timeout_ms` |
//! | `FULFILLMENT_REJECT_CUBBY` | `reject_cubby` |
//! | `FULFILLMENT_CONNECT_MAX_ATTEMPTS` | `connect.max_attempts` |
//! | `FULFILLMENT_CONNECT_INITIAL_DELAY_MS` | `connect.initial_delay_ms` |
//! | `FULFILLMENT_CONNECT_MAX_DELAY_MS` | `connect.max_delay_ms` |
//! | `FULFILLMENT_CONNECT_MULTIPLIER` | `connect.multiplier` |

use crate::cubby::{CubbyResolver, DEFAULT_CUBBY_SLOTS, DEFAULT_MAX_PROBES};
use crate::error::FulfillmentError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

/// Lies outside the numeric slot space, so it never collides with an order's cubby.
pub const DEFAULT_REJECT_CUBBY: &str = "reject";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FulfillmentConfig {
    /// Size of the cubby slot space; cubby ids run `"1"..=cubby_slots`.
    pub cubby_slots: u32,
    /// Probe cap for one cubby assignment.
    pub max_cubby_probes: u32,
    /// Upper bound for a single robot call.
    pub robot_call_timeout_ms: u64,
    /// Cubby that receives items nobody is waiting for. Setting it to `null` (or an empty
    /// `FULFILLMENT_REJECT_CUBBY`) leaves such items in the gripper, which blocks every later
    /// selection.
    pub reject_cubby: Option<String>,
    pub connect: ConnectRetryConfig,
}

impl Default for FulfillmentConfig {
    fn default() -> Self {
        Self {
            cubby_slots: DEFAULT_CUBBY_SLOTS,
            max_cubby_probes: DEFAULT_MAX_PROBES,
            robot_call_timeout_ms: 5_000,
            reject_cubby: Some(DEFAULT_REJECT_CUBBY.to_string()),
            connect: ConnectRetryConfig::default(),
        }
    }
}

/// Bounded exponential backoff for the startup connection to the robot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectRetryConfig {
    pub max_attempts: u32,
    pub initial_delay_ms: u64,
    pub max_delay_ms: u64,
    pub multiplier: f64,
}

impl Default for ConnectRetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            initial_delay_ms: 100,
            max_delay_ms: 5_000,
            multiplier: 2.0,
        }
    }
}

impl ConnectRetryConfig {
    /// Delay to wait after the given failed attempt (1-based), capped at `max_delay_ms`.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let exponent = i32::try_from(attempt.saturating_sub(1)).unwrap_or(i32::MAX);
        let delay_ms = self.initial_delay_ms as f64 * self.multiplier.powi(exponent);
        let capped = delay_ms.min(self.max_delay_ms as f64).max(0.0);
        Duration::from_millis(capped as u64)
    }
}

impl FulfillmentConfig {
    pub fn from_json_str(json: &str) -> Result<Self, FulfillmentError> {
        serde_json::from_str(json).map_err(|e| FulfillmentError::Config(e.to_string()))
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, FulfillmentError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .map_err(|e| FulfillmentError::Config(format!("{}: {}", path.display(), e)))?;
        Self::from_json_str(&json)
    }

    /// Defaults (or the `FULFILLMENT_CONFIG` file) overlaid with the process environment.
    pub fn from_env() -> Result<Self, FulfillmentError> {
        let base = match std::env::var("FULFILLMENT_CONFIG") {
            Ok(path) => Self::from_json_file(path)?,
            Err(_) => Self::default(),
        };
        base.with_overrides(|key| std::env::var(key).ok())
    }

    /// Applies `FULFILLMENT_*` overrides read through `lookup`, then validates.
    pub fn with_overrides(
        mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, FulfillmentError> {
        if let Some(value) = lookup("FULFILLMENT_CUBBY_SLOTS") {
            self.cubby_slots = parse("FULFILLMENT_CUBBY_SLOTS", &value)?;
        }
        if let Some(value) = lookup("FULFILLMENT_MAX_CUBBY_PROBES") {
            self.max_cubby_probes = parse("FULFILLMENT_MAX_CUBBY_PROBES", &value)?;
        }
        if let Some(value) = lookup("FULFILLMENT_ROBOT_CALL_TIMEOUT_MS") {
            self.robot_call_timeout_ms = parse("FULFILLMENT_ROBOT_CALL_TIMEOUT_MS", &value)?;
        }
        if let Some(value) = lookup("FULFILLMENT_REJECT_CUBBY") {
            let value = value.trim();
            self.reject_cubby = (!value.is_empty()).then(|| value.to_string());
        }
        if let Some(value) = lookup("FULFILLMENT_CONNECT_MAX_ATTEMPTS") {
            self.connect.max_attempts = parse("FULFILLMENT_CONNECT_MAX_ATTEMPTS", &value)?;
        }
        if let Some(value) = lookup("FULFILLMENT_CONNECT_INITIAL_DELAY_MS") {
            self.connect.initial_delay_ms = parse("FULFILLMENT_CONNECT_INITIAL_DELAY_MS", &value)?;
        }
        if let Some(value) = lookup("FULFILLMENT_CONNECT_MAX_DELAY_MS") {
            self.connect.max_delay_ms = parse("FULFILLMENT_CONNECT_MAX_DELAY_MS", &value)?;
        }
        if let Some(value) = lookup("FULFILLMENT_CONNECT_MULTIPLIER") {
            self.connect.multiplier = parse("FULFILLMENT_CONNECT_MULTIPLIER", &value)?;
        }
        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> Result<(), FulfillmentError> {
        if self.cubby_slots == 0 {
            return Err(FulfillmentError::Config("cubby_slots must be positive".into()));
        }
        if self.max_cubby_probes == 0 {
            return Err(FulfillmentError::Config(
                "max_cubby_probes must be positive".into(),
            ));
        }
        if self.robot_call_timeout_ms == 0 {
            return Err(FulfillmentError::Config(
                "robot_call_timeout_ms must be positive".into(),
            ));
        }
        if self.connect.max_attempts == 0 {
            return Err(FulfillmentError::Config(
                "connect.max_attempts must be positive".into(),
            ));
        }
        if self.connect.multiplier.is_nan() || self.connect.multiplier < 1.0 {
            return Err(FulfillmentError::Config(
                "connect.multiplier must be at least 1.0".into(),
            ));
        }
        if let Some(reject) = &self.reject_cubby {
            if reject.is_empty() || self.resolver().in_slot_space(reject) {
                return Err(FulfillmentError::Config(format!(
                    "reject_cubby {:?} collides with the cubby slot space",
                    reject
                )));
            }
        }
        Ok(())
    }

    pub fn resolver(&self) -> CubbyResolver {
        CubbyResolver::new(self.cubby_slots, self.max_cubby_probes)
    }

    pub fn robot_call_timeout(&self) -> Duration {
        Duration::from_millis(self.robot_call_timeout_ms)
    }
}

fn parse<T: FromStr>(key: &str, value: &str) -> Result<T, FulfillmentError>
where
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e| FulfillmentError::Config(format!("{key}={value:?}: {e}")))
}
