//! `roboapp-types` – shared message shapes and the workspace error type.
//!
//! Every value that arrives on a key expression has a matching struct here.
//! Payloads are JSON, or a bare scalar on the per-field `robot/*` keys; use
//! [`decode`] / [`decode_scalar`] / [`decode_finite`] at the boundary so that
//! malformed or non-finite input never reaches a store.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

/// Identifier of a camera feed selectable from the dashboard.
///
/// 0 is the RealSense, 1 the front camera, 2 the rear camera on the current
/// robot, but any value is accepted.
pub type CameraId = u32;

/// Request to switch the displayed camera feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CameraSwitchMessage {
    pub camera_id: CameraId,
}

/// Repulsive force vector computed from the LiDAR scan.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LidarMessage {
    /// Magnitude of the wall repulsion.
    pub linear: f64,
    /// Direction of the wall, in degrees.
    pub angular: f64,
}

/// Disk counts/speeds for the left and right launchers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DisksMessage {
    pub left: f64,
    pub right: f64,
}

/// Flap orientation in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FlapMessage {
    pub pitch: f64,
    pub yaw: f64,
}

/// Damage panel detection result, in image pixel coordinates.
///
/// Missing fields fall back to the image centre of a 1280x720 frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DamagePanelRecognition {
    #[serde(default = "DamagePanelRecognition::default_target_x")]
    pub target_x: i32,
    #[serde(default = "DamagePanelRecognition::default_target_y")]
    pub target_y: i32,
    #[serde(default)]
    pub target_distance: i32,
}

impl DamagePanelRecognition {
    fn default_target_x() -> i32 {
        640
    }
    fn default_target_y() -> i32 {
        360
    }
}

impl Default for DamagePanelRecognition {
    fn default() -> Self {
        Self {
            target_x: Self::default_target_x(),
            target_y: Self::default_target_y(),
            target_distance: 0,
        }
    }
}

/// One raw inbound sample as delivered by a transport.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sample {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    /// Full key expression, including any configured prefix.
    pub key: String,
    /// Undecoded JSON payload.
    pub payload: String,
}

impl Sample {
    /// Stamp a new sample received now.
    pub fn new(key: impl Into<String>, payload: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            key: key.into(),
            payload: payload.into(),
        }
    }
}

/// Workspace-wide error type.
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DashError {
    #[error("Decode Error: {0}")]
    Decode(String),

    #[error("Non-finite value in field `{field}`")]
    NonFinite { field: String },

    #[error("No route for key `{0}`")]
    UnknownKey(String),

    #[error("Channel Error: {0}")]
    Channel(String),

    #[error("Config Error: {0}")]
    Config(String),
}

/// Boundary check run after a payload has been parsed.
pub trait Validate {
    fn validate(&self) -> Result<(), DashError>;
}

fn finite(field: &'static str, value: f64) -> Result<(), DashError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(DashError::NonFinite { field: field.to_string() })
    }
}

impl Validate for CameraSwitchMessage {
    fn validate(&self) -> Result<(), DashError> {
        Ok(())
    }
}

impl Validate for LidarMessage {
    fn validate(&self) -> Result<(), DashError> {
        finite("linear", self.linear)?;
        finite("angular", self.angular)
    }
}

impl Validate for DisksMessage {
    fn validate(&self) -> Result<(), DashError> {
        finite("left", self.left)?;
        finite("right", self.right)
    }
}

impl Validate for FlapMessage {
    fn validate(&self) -> Result<(), DashError> {
        finite("pitch", self.pitch)?;
        finite("yaw", self.yaw)
    }
}

impl Validate for DamagePanelRecognition {
    fn validate(&self) -> Result<(), DashError> {
        Ok(())
    }
}

/// Parse a JSON payload and validate it.
pub fn decode<M>(payload: &str) -> Result<M, DashError>
where
    M: DeserializeOwned + Validate,
{
    let message: M =
        serde_json::from_str(payload).map_err(|e| DashError::Decode(e.to_string()))?;
    message.validate()?;
    Ok(message)
}

/// Parse a bare scalar payload such as `"3"` (surrounding whitespace is
/// ignored).  `field` names the value in the error.
pub fn decode_scalar<T>(field: &'static str, payload: &str) -> Result<T, DashError>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    payload
        .trim()
        .parse()
        .map_err(|e| DashError::Decode(format!("{field}: {e}")))
}

/// Parse a bare floating-point payload, rejecting NaN and infinities.
pub fn decode_finite(field: &'static str, payload: &str) -> Result<f64, DashError> {
    let value = decode_scalar(field, payload)?;
    finite(field, value)?;
    Ok(value)
}
