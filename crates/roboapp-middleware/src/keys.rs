//! Key expressions the dashboard listens on.
//!
//! | Key | Message | Signal |
//! |---|---|---|
//! | `cam/switch` | `CameraSwitchMessage` | [`Signal::CameraSwitch`] |
//! | `lidar/force_vector` | `LidarMessage` | [`Signal::Lidar`] |
//! | `disk` | `DisksMessage` | [`Signal::Disks`] |
//! | `flap` | `FlapMessage` | [`Signal::Flap`] |
//! | `damagepanel` | `DamagePanelRecognition` | [`Signal::DamagePanel`] |
//! | `robot/state/video_id` | integer | [`Signal::StateVideoId`] |
//! | `robot/state/reloaded_left_disks` | number | [`Signal::StateLeftDisks`] |
//! | `robot/state/reloaded_right_disks` | number | [`Signal::StateRightDisks`] |
//! | `robot/command/target_x` | integer | [`Signal::CommandTargetX`] |
//! | `robot/command/target_y` | integer | [`Signal::CommandTargetY`] |
//! | `robot/command/target_distance` | integer | [`Signal::CommandTargetDistance`] |
//!
//! The `robot/*` keys carry one bare value each, as the UART bridge publishes
//! them.  Other `robot/state/*` fields have no store and are not routed.
//!
//! Every key is placed under the configured prefix, e.g. prefix `roboapp`
//! turns `disk` into `roboapp/disk`.

use std::fmt;

/// A logical inbound signal, one per routed key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Signal {
    CameraSwitch,
    Lidar,
    Disks,
    Flap,
    DamagePanel,
    StateVideoId,
    StateLeftDisks,
    StateRightDisks,
    CommandTargetX,
    CommandTargetY,
    CommandTargetDistance,
}

impl Signal {
    pub const ALL: [Signal; 11] = [
        Signal::CameraSwitch,
        Signal::Lidar,
        Signal::Disks,
        Signal::Flap,
        Signal::DamagePanel,
        Signal::StateVideoId,
        Signal::StateLeftDisks,
        Signal::StateRightDisks,
        Signal::CommandTargetX,
        Signal::CommandTargetY,
        Signal::CommandTargetDistance,
    ];

    /// Key expression relative to the prefix.
    pub fn key(self) -> &'static str {
        match self {
            Signal::CameraSwitch => "cam/switch",
            Signal::Lidar => "lidar/force_vector",
            Signal::Disks => "disk",
            Signal::Flap => "flap",
            Signal::DamagePanel => "damagepanel",
            Signal::StateVideoId => "robot/state/video_id",
            Signal::StateLeftDisks => "robot/state/reloaded_left_disks",
            Signal::StateRightDisks => "robot/state/reloaded_right_disks",
            Signal::CommandTargetX => "robot/command/target_x",
            Signal::CommandTargetY => "robot/command/target_y",
            Signal::CommandTargetDistance => "robot/command/target_distance",
        }
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Maps full key expressions to [`Signal`]s under one prefix.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyTable {
    prefix: String,
}

impl KeyTable {
    /// Build a table for `prefix`.  Trailing slashes are ignored and an
    /// empty prefix leaves keys unchanged.
    pub fn new(prefix: &str) -> Self {
        Self {
            prefix: prefix.trim_end_matches('/').to_string(),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Full key expression for `signal`.
    pub fn key_for(&self, signal: Signal) -> String {
        if self.prefix.is_empty() {
            signal.key().to_string()
        } else {
            format!("{}/{}", self.prefix, signal.key())
        }
    }

    /// Find the signal routed on `key`, if any.
    pub fn resolve(&self, key: &str) -> Option<Signal> {
        let relative = if self.prefix.is_empty() {
            key
        } else {
            key.strip_prefix(self.prefix.as_str())?.strip_prefix('/')?
        };
        Signal::ALL.into_iter().find(|s| s.key() == relative)
    }
}
