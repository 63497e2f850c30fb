//! [`Router`] – decodes inbound samples and writes them into the stores.
//!
//! The router is the only writer of the [`AppContext`] stores.  A payload is
//! decoded and validated before any store is touched, so a rejected sample
//! leaves every store as it was.

use roboapp_state::AppContext;
use roboapp_types::{
    CameraSwitchMessage, DamagePanelRecognition, DashError, DisksMessage, FlapMessage,
    LidarMessage, Sample, decode, decode_finite, decode_scalar,
};
use tracing::debug;

use crate::keys::{KeyTable, Signal};

/// Routes `(key, payload)` pairs onto the matching store of an
/// [`AppContext`].
#[derive(Debug, Clone)]
pub struct Router {
    ctx: AppContext,
    keys: KeyTable,
}

impl Router {
    pub fn new(ctx: AppContext, keys: KeyTable) -> Self {
        Self { ctx, keys }
    }

    pub fn context(&self) -> &AppContext {
        &self.ctx
    }

    pub fn keys(&self) -> &KeyTable {
        &self.keys
    }

    /// Decode `payload` as the message routed on `key` and set the store.
    ///
    /// # Errors
    ///
    /// - [`DashError::UnknownKey`] when no signal is routed on `key`.
    /// - [`DashError::Decode`] / [`DashError::NonFinite`] when the payload
    ///   does not parse or fails validation.
    pub fn dispatch(&self, key: &str, payload: &str) -> Result<Signal, DashError> {
        let signal = self
            .keys
            .resolve(key)
            .ok_or_else(|| DashError::UnknownKey(key.to_string()))?;

        match signal {
            Signal::CameraSwitch => {
                let msg: CameraSwitchMessage = decode(payload)?;
                self.ctx.camera_id().set(msg.camera_id);
            }
            Signal::Lidar => {
                let msg: LidarMessage = decode(payload)?;
                self.ctx.lidar().set(Some(msg));
            }
            Signal::Disks => {
                let msg: DisksMessage = decode(payload)?;
                self.ctx.left_disk().set(msg.left);
                self.ctx.right_disk().set(msg.right);
            }
            Signal::Flap => {
                let msg: FlapMessage = decode(payload)?;
                self.ctx.flap().set(Some(msg));
            }
            Signal::DamagePanel => {
                let msg: DamagePanelRecognition = decode(payload)?;
                self.ctx.damage_panel().set(msg);
            }
            Signal::StateVideoId => {
                let id: u32 = decode_scalar("video_id", payload)?;
                self.ctx.camera_id().set(id);
            }
            Signal::StateLeftDisks => {
                let n = decode_finite("reloaded_left_disks", payload)?;
                self.ctx.left_disk().set(n);
            }
            Signal::StateRightDisks => {
                let n = decode_finite("reloaded_right_disks", payload)?;
                self.ctx.right_disk().set(n);
            }
            // Per-field commands patch the current detection.
            Signal::CommandTargetX => {
                let x: i32 = decode_scalar("target_x", payload)?;
                self.ctx
                    .damage_panel()
                    .update(|p| DamagePanelRecognition { target_x: x, ..*p });
            }
            Signal::CommandTargetY => {
                let y: i32 = decode_scalar("target_y", payload)?;
                self.ctx
                    .damage_panel()
                    .update(|p| DamagePanelRecognition { target_y: y, ..*p });
            }
            Signal::CommandTargetDistance => {
                let d: i32 = decode_scalar("target_distance", payload)?;
                self.ctx
                    .damage_panel()
                    .update(|p| DamagePanelRecognition { target_distance: d, ..*p });
            }
        }

        debug!(%key, %signal, "sample routed");
        Ok(signal)
    }

    pub fn dispatch_sample(&self, sample: &Sample) -> Result<Signal, DashError> {
        self.dispatch(&sample.key, &sample.payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn router(prefix: &str) -> Router {
        Router::new(AppContext::new(), KeyTable::new(prefix))
    }

    #[test]
    fn lidar_sample_updates_lidar_store() {
        let r = router("");
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        let _sub = r.context().lidar().subscribe(move |v| sink.borrow_mut().push(*v));

        let signal = r
            .dispatch("lidar/force_vector", r#"{"linear": 1.5, "angular": -0.2}"#)
            .unwrap();

        assert_eq!(signal, Signal::Lidar);
        assert_eq!(
            *seen.borrow(),
            vec![None, Some(LidarMessage { linear: 1.5, angular: -0.2 })]
        );
    }

    #[test]
    fn disks_sample_sets_left_then_right() {
        let r = router("");
        let order = Rc::new(RefCell::new(Vec::new()));
        let left = Rc::clone(&order);
        let _l = r.context().left_disk().subscribe(move |v| left.borrow_mut().push(("left", *v)));
        let right = Rc::clone(&order);
        let _r = r.context().right_disk().subscribe(move |v| right.borrow_mut().push(("right", *v)));
        order.borrow_mut().clear();

        r.dispatch("disk", r#"{"left": 3, "right": 7}"#).unwrap();

        assert_eq!(*order.borrow(), vec![("left", 3.0), ("right", 7.0)]);
    }

    #[test]
    fn camera_switch_and_flap_and_damage_panel() {
        let r = router("roboapp");
        r.dispatch("roboapp/cam/switch", r#"{"camera_id": 2}"#).unwrap();
        r.dispatch("roboapp/flap", r#"{"pitch": 12.5, "yaw": -30.0}"#).unwrap();
        r.dispatch("roboapp/damagepanel", r#"{"target_x": 100, "target_y": 200}"#)
            .unwrap();

        let ctx = r.context();
        assert_eq!(ctx.camera_id().get(), 2);
        assert_eq!(ctx.flap().get(), Some(FlapMessage { pitch: 12.5, yaw: -30.0 }));
        assert_eq!(
            ctx.damage_panel().get(),
            DamagePanelRecognition { target_x: 100, target_y: 200, target_distance: 0 }
        );
    }

    #[test]
    fn unknown_key_is_rejected() {
        let r = router("");
        let err = r.dispatch("robot/state/muzzle_velocity", "1.0").unwrap_err();
        assert_eq!(err, DashError::UnknownKey("robot/state/muzzle_velocity".to_string()));
    }

    #[test]
    fn robot_state_scalars_update_camera_and_disks() {
        let r = router("");
        assert_eq!(r.dispatch("robot/state/video_id", "2").unwrap(), Signal::StateVideoId);
        r.dispatch("robot/state/reloaded_left_disks", "7").unwrap();
        r.dispatch("robot/state/reloaded_right_disks", " 3\n").unwrap();

        let ctx = r.context();
        assert_eq!(ctx.camera_id().get(), 2);
        assert_eq!(ctx.left_disk().get(), 7.0);
        assert_eq!(ctx.right_disk().get(), 3.0);
    }

    #[test]
    fn robot_state_rejects_non_finite_and_garbage() {
        let r = router("");
        r.context().left_disk().set(5.0);

        assert_eq!(
            r.dispatch("robot/state/reloaded_left_disks", "NaN"),
            Err(DashError::NonFinite { field: "reloaded_left_disks".to_string() })
        );
        assert!(r.dispatch("robot/state/reloaded_left_disks", "inf").is_err());
        assert!(matches!(
            r.dispatch("robot/state/video_id", "-1"),
            Err(DashError::Decode(_))
        ));

        assert_eq!(r.context().left_disk().get(), 5.0);
        assert_eq!(r.context().camera_id().get(), 0);
    }

    #[test]
    fn robot_command_target_updates_keep_other_fields() {
        let r = router("roboapp");
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        let _sub = r.context().damage_panel().subscribe(move |v| sink.borrow_mut().push(*v));

        r.dispatch("roboapp/robot/command/target_x", "100").unwrap();
        r.dispatch("roboapp/robot/command/target_distance", "42").unwrap();
        assert!(r.dispatch("roboapp/robot/command/target_y", "1.5").is_err());

        assert_eq!(
            *seen.borrow(),
            vec![
                DamagePanelRecognition { target_x: 640, target_y: 360, target_distance: 0 },
                DamagePanelRecognition { target_x: 100, target_y: 360, target_distance: 0 },
                DamagePanelRecognition { target_x: 100, target_y: 360, target_distance: 42 },
            ]
        );
    }

    #[test]
    fn key_outside_prefix_is_rejected() {
        let r = router("roboapp");
        assert!(matches!(
            r.dispatch("flap", r#"{"pitch": 0, "yaw": 0}"#),
            Err(DashError::UnknownKey(_))
        ));
        assert_eq!(r.context().flap().get(), None);
    }

    #[test]
    fn malformed_payload_leaves_store_untouched() {
        let r = router("");
        r.context().left_disk().set(4.0);

        assert!(matches!(
            r.dispatch("disk", r#"{"left": "many"}"#),
            Err(DashError::Decode(_))
        ));
        assert!(r.dispatch("disk", r#"{"left": 1e999, "right": 0}"#).is_err());

        assert_eq!(r.context().left_disk().get(), 4.0);
        assert_eq!(r.context().right_disk().get(), 0.0);
    }

    #[test]
    fn dispatch_sample_uses_key_and_payload() {
        let r = router("");
        let sample = Sample::new("cam/switch", r#"{"camera_id": 1}"#);
        assert_eq!(r.dispatch_sample(&sample).unwrap(), Signal::CameraSwitch);
        assert_eq!(r.context().camera_id().get(), 1);
    }
}
