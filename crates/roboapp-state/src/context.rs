//! [`AppContext`] – the set of stores one dashboard instance works with.
//!
//! Build it once at start-up and hand clones to whoever needs a store;
//! clones share every store.

use roboapp_types::{CameraId, DamagePanelRecognition, FlapMessage, LidarMessage};

use crate::store::Store;

/// Owns one [`Store`] per live signal.
#[derive(Clone, Debug)]
pub struct AppContext {
    camera_id: Store<CameraId>,
    lidar: Store<Option<LidarMessage>>,
    left_disk: Store<f64>,
    right_disk: Store<f64>,
    flap: Store<Option<FlapMessage>>,
    damage_panel: Store<DamagePanelRecognition>,
}

impl AppContext {
    /// Create every store with its start-up value.
    pub fn new() -> Self {
        Self {
            camera_id: Store::with_label("camera_id", 0),
            lidar: Store::with_label("lidar", None),
            left_disk: Store::with_label("left_disk", 0.0),
            right_disk: Store::with_label("right_disk", 0.0),
            flap: Store::with_label("flap", None),
            damage_panel: Store::with_label("damage_panel", DamagePanelRecognition::default()),
        }
    }

    /// Camera feed currently selected.
    pub fn camera_id(&self) -> &Store<CameraId> {
        &self.camera_id
    }

    /// Latest LiDAR force vector; `None` until the first one arrives.
    pub fn lidar(&self) -> &Store<Option<LidarMessage>> {
        &self.lidar
    }

    pub fn left_disk(&self) -> &Store<f64> {
        &self.left_disk
    }

    pub fn right_disk(&self) -> &Store<f64> {
        &self.right_disk
    }

    /// Latest flap orientation; `None` until the first one arrives.
    pub fn flap(&self) -> &Store<Option<FlapMessage>> {
        &self.flap
    }

    pub fn damage_panel(&self) -> &Store<DamagePanelRecognition> {
        &self.damage_panel
    }
}

impl Default for AppContext {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_context_holds_defaults() {
        let ctx = AppContext::new();
        assert_eq!(ctx.camera_id().get(), 0);
        assert_eq!(ctx.lidar().get(), None);
        assert_eq!(ctx.left_disk().get(), 0.0);
        assert_eq!(ctx.right_disk().get(), 0.0);
        assert_eq!(ctx.flap().get(), None);
        assert_eq!(ctx.damage_panel().get(), DamagePanelRecognition::default());
    }

    #[test]
    fn disk_stores_are_independent() {
        let ctx = AppContext::new();
        ctx.left_disk().set(42.0);
        assert_eq!(ctx.left_disk().get(), 42.0);
        assert_eq!(ctx.right_disk().get(), 0.0);
    }

    #[test]
    fn contexts_do_not_share_state() {
        let a = AppContext::new();
        let b = AppContext::new();
        a.camera_id().set(2);
        assert_eq!(b.camera_id().get(), 0);
    }

    #[test]
    fn cloned_context_shares_stores() {
        let ctx = AppContext::new();
        let view = ctx.clone();
        ctx.flap().set(Some(FlapMessage { pitch: 10.0, yaw: -5.0 }));
        assert_eq!(view.flap().get(), Some(FlapMessage { pitch: 10.0, yaw: -5.0 }));
    }

    #[test]
    fn labels_name_each_store() {
        let ctx = AppContext::new();
        assert_eq!(ctx.lidar().label(), "lidar");
        assert_eq!(ctx.right_disk().label(), "right_disk");
    }
}
