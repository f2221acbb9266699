//! Signal cluster: the Wi-Fi and cellular icons of one host surface.
//!
//! The cluster listens for style changes, repaints the strength, type and
//! airplane icons, and owns one [`SignalActivityTracker`] per transport
//! while the surface is attached. Connectivity callbacks from the host are
//! adapted into tracker updates here.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::artifact::{Tint, TintMode};
use crate::bus::StyleListener;
use crate::error::MutedErrors;
use crate::host::{FieldResult, HostIconSurface};
use crate::manager::IconManager;
use crate::style::{Aspects, StyleConfiguration};
use crate::tracker::{self, ActivityGlyph, SignalActivityTracker, SignalState, SignalType};

/// Aspects the cluster repaints for.
const CLUSTER_ASPECTS: Aspects = Aspects::ICON_COLOR
    .union(Aspects::ICON_COLOR_SECONDARY)
    .union(Aspects::DATA_ACTIVITY_COLOR)
    .union(Aspects::SIGNAL_ICON_MODE);

/// Identity of the quick-settings Wi-Fi icon for a connected network with
/// no signal bars; counts as fully connected.
const WIFI_ZERO_ICON: &str = "ic_qs_wifi_0";

/// Optional cluster features.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ClusterOptions {
    /// Mark partially connected signals.
    pub connection_state: bool,
    /// Show directional data-activity glyphs.
    pub data_activity: bool,
}

impl ClusterOptions {
    fn any(self) -> bool {
        self.connection_state || self.data_activity
    }
}

pub struct SignalCluster {
    options: ClusterOptions,
    manager: Weak<IconManager>,
    surface: Rc<dyn HostIconSurface>,
    wifi: RefCell<Option<SignalActivityTracker>>,
    mobile: RefCell<Option<SignalActivityTracker>>,
    errors: RefCell<MutedErrors>,
}

impl SignalCluster {
    /// Create a cluster for `surface` and register it with `manager`.
    ///
    /// Registration replays every aspect, so the surface is painted with
    /// the current style before this returns.
    pub fn install(
        manager: &Rc<IconManager>,
        surface: Rc<dyn HostIconSurface>,
        options: ClusterOptions,
    ) -> Rc<Self> {
        let cluster = Rc::new(Self {
            options,
            manager: Rc::downgrade(manager),
            surface,
            wifi: RefCell::new(None),
            mobile: RefCell::new(None),
            errors: RefCell::new(MutedErrors::new()),
        });
        manager.register_listener(cluster.listener());
        debug!("signal cluster installed ({:?})", options);
        cluster
    }

    /// Unregister from the manager and drop the trackers.
    pub fn uninstall(self: &Rc<Self>) {
        if let Some(manager) = self.manager.upgrade() {
            manager.unregister_listener(&self.listener());
        }
        self.detach();
    }

    pub fn listener(self: &Rc<Self>) -> Rc<dyn StyleListener> {
        Rc::clone(self) as Rc<dyn StyleListener>
    }

    pub fn options(&self) -> ClusterOptions {
        self.options
    }

    /// The host surface became available. Trackers are only created when
    /// a tracker feature is enabled.
    pub fn attach(&self) {
        if !self.options.any() {
            trace!("no tracker features enabled, nothing to attach");
            return;
        }
        *self.wifi.borrow_mut() = Some(self.new_tracker(SignalType::Wifi));
        *self.mobile.borrow_mut() = Some(self.new_tracker(SignalType::Mobile));
        debug!("signal trackers attached");
    }

    /// The host surface went away.
    pub fn detach(&self) {
        let had = self.wifi.borrow_mut().take().is_some();
        self.mobile.borrow_mut().take();
        if had {
            debug!("signal trackers detached");
        }
    }

    pub fn is_attached(&self) -> bool {
        self.wifi.borrow().is_some()
    }

    pub fn tracker_state(&self, signal: SignalType) -> Option<SignalState> {
        self.slot(signal).borrow().as_ref().map(|t| t.state())
    }

    pub fn glyph(&self, signal: SignalType) -> Option<ActivityGlyph> {
        self.slot(signal).borrow().as_ref().map(|t| t.glyph())
    }

    /// Repaint strength, type and airplane icons for the current style.
    /// With coloring off the host's own strength and type icons come back.
    ///
    /// Each step that fails is logged once and skipped.
    pub fn apply(&self) {
        let Some(manager) = self.manager.upgrade() else {
            return;
        };

        for (signal, step) in [
            (SignalType::Wifi, "update_wifi_icon"),
            (SignalType::Mobile, "update_mobile_icon"),
        ] {
            let result = if manager.coloring_enabled() {
                tracker::paint_signal(
                    &manager,
                    self.surface.as_ref(),
                    signal,
                    self.fully_connected(signal),
                )
            } else {
                tracker::restore_signal(self.surface.as_ref(), signal)
            };
            self.step(step, result);
        }

        let filter = manager.coloring_enabled().then(|| Tint {
            color: manager.icon_color(0),
            mode: TintMode::SrcIn,
        });
        let result = self.surface.set_airplane_filter(filter);
        self.step("update_airplane_icon", result);
    }

    /// Wi-Fi connectivity callback.
    ///
    /// With connection-state marking on, the network counts as fully
    /// connected when the host's icon name says so.
    pub fn on_wifi_signal(
        &self,
        enabled: bool,
        icon_id: &str,
        activity_in: bool,
        activity_out: bool,
    ) {
        let fully = if self.options.connection_state && !icon_id.is_empty() {
            icon_id.contains("full") || icon_id == WIFI_ZERO_ICON
        } else {
            true
        };
        self.update_tracker(SignalType::Wifi, enabled, fully, activity_in, activity_out);
    }

    /// Cellular connectivity callback.
    pub fn on_mobile_signal(
        &self,
        enabled: bool,
        icon_id: &str,
        activity_in: bool,
        activity_out: bool,
    ) {
        let fully = if self.options.connection_state && !icon_id.is_empty() {
            icon_id.contains("full")
        } else {
            true
        };
        self.update_tracker(SignalType::Mobile, enabled, fully, activity_in, activity_out);
    }

    /// Re-run every tracker with its stored state.
    pub fn refresh_trackers(&self) {
        for signal in [SignalType::Wifi, SignalType::Mobile] {
            if let Some(t) = self.slot(signal).borrow_mut().as_mut() {
                t.refresh();
            }
        }
    }

    fn update_tracker(
        &self,
        signal: SignalType,
        enabled: bool,
        fully_connected: bool,
        activity_in: bool,
        activity_out: bool,
    ) {
        match self.slot(signal).borrow_mut().as_mut() {
            Some(t) => t.update(enabled, fully_connected, activity_in, activity_out),
            None => trace!("{} signal report while detached, ignoring", signal),
        }
    }

    fn new_tracker(&self, signal: SignalType) -> SignalActivityTracker {
        SignalActivityTracker::new(
            signal,
            0,
            self.options,
            self.manager.clone(),
            Rc::clone(&self.surface),
        )
    }

    fn slot(&self, signal: SignalType) -> &RefCell<Option<SignalActivityTracker>> {
        match signal {
            SignalType::Wifi => &self.wifi,
            SignalType::Mobile => &self.mobile,
        }
    }

    fn fully_connected(&self, signal: SignalType) -> bool {
        self.slot(signal)
            .borrow()
            .as_ref()
            .map(|t| t.fully_connected())
            .unwrap_or(true)
    }

    fn step(&self, name: &str, result: FieldResult<()>) {
        if let Err(e) = result {
            self.errors.borrow_mut().log(name, &e);
        }
    }
}

impl StyleListener for SignalCluster {
    fn on_style_changed(&self, aspects: Aspects, _style: &StyleConfiguration) {
        if !aspects.intersects(CLUSTER_ASPECTS) {
            return;
        }

        if aspects.contains(Aspects::DATA_ACTIVITY_COLOR) && self.options.data_activity {
            for signal in [SignalType::Wifi, SignalType::Mobile] {
                if let Some(t) = self.slot(signal).borrow_mut().as_mut() {
                    t.update_data_activity_color();
                }
            }
        }

        self.apply();
        self.refresh_trackers();
    }
}

impl fmt::Debug for SignalCluster {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignalCluster")
            .field("options", &self.options)
            .field("attached", &self.is_attached())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifact::{IconImage, IconSet};
    use crate::assets::MemoryAssets;
    use crate::color::Color;
    use crate::host::RecordingSurface;
    use crate::style::SignalIconMode;
    use crate::tables;

    const RED: Color = Color::rgb(255, 0, 0);

    fn manager() -> Rc<IconManager> {
        let grey = IconImage::filled(1, 1, Color::rgb(60, 60, 60));
        let mut assets = MemoryAssets::new();
        for id in [
            "stat_sys_wifi_signal_3",
            "stat_sys_wifi_signal_3_fully",
            "stat_sys_signal_2",
            "stat_sys_signal_2_fully",
            "stat_sys_data_fully_connected_3g",
        ] {
            assets.insert(IconSet::Native, id, grey.clone());
            assets.insert(IconSet::Alternate, id, grey.clone());
        }
        for signal in [SignalType::Wifi, SignalType::Mobile] {
            for id in tables::activity_glyph_assets(signal) {
                assets.insert(IconSet::Alternate, id, grey.clone());
            }
        }
        IconManager::new(Rc::new(assets), StyleConfiguration::default(), 32)
    }

    fn surface() -> Rc<RecordingSurface> {
        let surface = Rc::new(RecordingSurface::new());
        surface.set_icon_id(SignalType::Wifi, "stat_sys_wifi_signal_3_fully");
        surface.set_icon_id(SignalType::Mobile, "stat_sys_signal_2_fully");
        surface.set_type_icon_id(Some("stat_sys_data_fully_connected_3g".into()));
        surface
    }

    fn install(
        manager: &Rc<IconManager>,
        surface: &Rc<RecordingSurface>,
        options: ClusterOptions,
    ) -> Rc<SignalCluster> {
        SignalCluster::install(manager, Rc::clone(surface) as Rc<dyn HostIconSurface>, options)
    }

    const ALL_ON: ClusterOptions = ClusterOptions {
        connection_state: true,
        data_activity: true,
    };

    #[test]
    fn test_install_paints_current_style() {
        let m = manager();
        m.set_coloring_enabled(true);
        m.set_icon_color(0, RED);
        let s = surface();
        let _cluster = install(&m, &s, ClusterOptions::default());

        let state = s.state();
        assert_eq!(
            state.strength_icon[&SignalType::Wifi].image.pixel(0, 0),
            Some(RED)
        );
        assert!(state.strength_icon.contains_key(&SignalType::Mobile));
        assert!(state.type_icon.is_some());
        assert_eq!(state.airplane_filter.map(|t| t.color), Some(RED));
        assert_eq!(m.listener_count(), 1);
    }

    #[test]
    fn test_coloring_off_shows_host_icons() {
        let m = manager();
        let s = surface();
        let _cluster = install(&m, &s, ClusterOptions::default());

        let state = s.state();
        assert!(state.strength_icon.is_empty());
        assert!(state.type_icon.is_none());
        assert_eq!(state.airplane_filter, None);
        assert_eq!(m.cache_stats().lookups, 0);
    }

    #[test]
    fn test_turning_coloring_off_restores_host_icons() {
        let m = manager();
        m.set_coloring_enabled(true);
        m.set_signal_icon_mode(SignalIconMode::Alternate);
        m.set_icon_color(0, RED);
        let s = surface();
        let _cluster = install(&m, &s, ALL_ON);

        let state = s.state();
        assert_eq!(state.strength_icon[&SignalType::Wifi].set, IconSet::Alternate);
        assert!(state.type_icon.is_some());

        m.set_coloring_enabled(false);
        let state = s.state();
        assert!(!state.strength_icon.contains_key(&SignalType::Wifi));
        assert!(!state.strength_icon.contains_key(&SignalType::Mobile));
        assert!(state.type_icon.is_none());
        assert_eq!(state.airplane_filter, None);

        // Back on: tinted artifacts are painted again.
        m.set_coloring_enabled(true);
        let icon = s.state().strength_icon[&SignalType::Wifi].clone();
        assert_eq!(icon.tint.map(|t| t.color), Some(RED));
    }

    #[test]
    fn test_switching_to_disabled_mode_restores_host_icons() {
        let m = manager();
        m.set_coloring_enabled(true);
        m.set_signal_icon_mode(SignalIconMode::Alternate);
        m.set_icon_color(0, RED);
        let s = surface();
        let _cluster = install(&m, &s, ClusterOptions::default());
        assert_eq!(s.state().strength_icon.len(), 2);

        m.set_signal_icon_mode(SignalIconMode::Disabled);
        let state = s.state();
        assert!(state.strength_icon.is_empty());
        assert!(state.type_icon.is_none());
        // Coloring is still on, so the airplane icon keeps its tint.
        assert_eq!(state.airplane_filter.map(|t| t.color), Some(RED));
    }

    #[test]
    fn test_airplane_mode_skips_mobile() {
        let m = manager();
        m.set_coloring_enabled(true);
        let s = surface();
        s.set_airplane_mode(true);
        let _cluster = install(&m, &s, ClusterOptions::default());

        let state = s.state();
        assert!(state.strength_icon.contains_key(&SignalType::Wifi));
        assert!(!state.strength_icon.contains_key(&SignalType::Mobile));
        assert!(state.type_icon.is_none());
    }

    #[test]
    fn test_disabled_mode_leaves_signal_icons_alone() {
        let m = manager();
        m.set_coloring_enabled(true);
        m.set_signal_icon_mode(SignalIconMode::Disabled);
        let s = surface();
        let _cluster = install(&m, &s, ClusterOptions::default());

        let state = s.state();
        assert!(state.strength_icon.is_empty());
        assert!(state.type_icon.is_none());
        assert!(state.airplane_filter.is_some());
    }

    #[test]
    fn test_wifi_fully_connected_rule() {
        let m = manager();
        let s = surface();
        let cluster = install(&m, &s, ALL_ON);
        cluster.attach();

        cluster.on_wifi_signal(true, "ic_qs_wifi_3", false, false);
        assert!(!cluster.tracker_state(SignalType::Wifi).unwrap().fully_connected);

        cluster.on_wifi_signal(true, "ic_qs_wifi_full_3", false, false);
        assert!(cluster.tracker_state(SignalType::Wifi).unwrap().fully_connected);

        cluster.on_wifi_signal(true, "ic_qs_wifi_0", false, false);
        assert!(cluster.tracker_state(SignalType::Wifi).unwrap().fully_connected);

        cluster.on_wifi_signal(true, "", false, false);
        assert!(cluster.tracker_state(SignalType::Wifi).unwrap().fully_connected);
    }

    #[test]
    fn test_mobile_fully_connected_ignores_wifi() {
        let m = manager();
        let s = surface();
        let cluster = install(&m, &s, ALL_ON);
        cluster.attach();

        cluster.on_wifi_signal(true, "ic_qs_wifi_full_3", false, false);
        cluster.on_mobile_signal(true, "ic_qs_signal_2", true, false);

        let mobile = cluster.tracker_state(SignalType::Mobile).unwrap();
        assert!(mobile.enabled);
        assert!(!mobile.fully_connected);
        assert_eq!(cluster.glyph(SignalType::Mobile), Some(ActivityGlyph::In));
    }

    #[test]
    fn test_without_connection_state_always_fully_connected() {
        let m = manager();
        let s = surface();
        let options = ClusterOptions {
            connection_state: false,
            data_activity: true,
        };
        let cluster = install(&m, &s, options);
        cluster.attach();

        cluster.on_mobile_signal(true, "ic_qs_signal_2", false, false);
        assert!(cluster.tracker_state(SignalType::Mobile).unwrap().fully_connected);
    }

    #[test]
    fn test_attach_detach_lifecycle() {
        let m = manager();
        let s = surface();
        let cluster = install(&m, &s, ALL_ON);
        assert!(!cluster.is_attached());

        cluster.on_wifi_signal(true, "ic_qs_wifi_full_3", true, true);
        assert!(cluster.glyph(SignalType::Wifi).is_none());

        cluster.attach();
        assert!(cluster.is_attached());
        cluster.detach();
        assert!(!cluster.is_attached());
        assert!(cluster.tracker_state(SignalType::Mobile).is_none());
    }

    #[test]
    fn test_attach_without_features_creates_no_trackers() {
        let m = manager();
        let s = surface();
        let cluster = install(&m, &s, ClusterOptions::default());
        cluster.attach();
        assert!(!cluster.is_attached());
    }

    #[test]
    fn test_data_activity_color_change_retints_shown_glyph() {
        let m = manager();
        let s = surface();
        let cluster = install(&m, &s, ALL_ON);
        cluster.attach();
        cluster.on_wifi_signal(true, "ic_qs_wifi_full_3", true, true);

        m.set_data_activity_color(0, RED);

        let shown = s.state().activity_glyph[&SignalType::Wifi].clone().unwrap();
        assert_eq!(shown.asset, "stat_sys_wifi_inout");
        assert_eq!(shown.image.pixel(0, 0), Some(RED));
    }

    #[test]
    fn test_partial_wifi_repainted_from_partial_key() {
        let m = manager();
        m.set_coloring_enabled(true);
        let s = surface();
        let cluster = install(&m, &s, ALL_ON);
        cluster.attach();

        cluster.on_wifi_signal(true, "ic_qs_wifi_3", false, false);
        assert_eq!(
            s.state().strength_icon[&SignalType::Wifi].key,
            "stat_sys_wifi_signal_3"
        );

        // A later style change keeps the partial variant.
        m.set_icon_color(0, RED);
        let icon = s.state().strength_icon[&SignalType::Wifi].clone();
        assert_eq!(icon.key, "stat_sys_wifi_signal_3");
        assert_eq!(icon.image.pixel(0, 0), Some(RED));
    }

    #[test]
    fn test_apply_failures_logged_once_per_step() {
        let m = manager();
        m.set_coloring_enabled(true);
        let s = surface();
        s.fail_field("airplane_filter");
        let cluster = install(&m, &s, ClusterOptions::default());

        m.set_icon_color(0, RED);
        m.set_icon_color(0, Color::WHITE);

        assert_eq!(cluster.errors.borrow().len(), 1);
        assert_eq!(
            s.state().strength_icon[&SignalType::Wifi].image.pixel(0, 0),
            Some(Color::WHITE)
        );
    }

    #[test]
    fn test_uninstall_stops_repaints() {
        let m = manager();
        m.set_coloring_enabled(true);
        let s = surface();
        let cluster = install(&m, &s, ALL_ON);
        cluster.attach();
        cluster.uninstall();
        assert_eq!(m.listener_count(), 0);
        assert!(!cluster.is_attached());

        let writes = s.state().writes;
        m.set_icon_color(0, RED);
        assert_eq!(s.state().writes, writes);
    }
}
