//! IconManager - owner of the style configuration.
//!
//! The manager is the single place where style configuration changes.
//! Every mutator compares against the current value first; an unchanged
//! value is a no-op. A real change clears the artifact cache (when the
//! field affects rendering) and then notifies listeners with exactly the
//! aspect bits implied by the mutator.
//!
//! Construct one manager at startup and hand out `Rc` clones (or `Weak`
//! references for consumers it notifies) to everything that needs it.

use std::cell::RefCell;
use std::rc::Rc;

use tracing::{debug, info, warn};

use crate::artifact::Artifact;
use crate::assets::AssetSource;
use crate::bus::{NotificationBus, StyleListener};
use crate::cache::CacheStats;
use crate::color::Color;
use crate::error::ResolveError;
use crate::resolver::{IconResolver, Resolution};
use crate::style::{Aspects, IconStyle, SignalIconMode, StyleConfiguration, StyleEvent};

#[derive(Debug)]
pub struct IconManager {
    style: RefCell<StyleConfiguration>,
    resolver: IconResolver,
    bus: NotificationBus,
}

impl IconManager {
    pub fn new(
        assets: Rc<dyn AssetSource>,
        style: StyleConfiguration,
        cache_capacity: usize,
    ) -> Rc<Self> {
        Rc::new(Self {
            style: RefCell::new(style),
            resolver: IconResolver::new(assets, cache_capacity),
            bus: NotificationBus::new(),
        })
    }

    /// Snapshot of the current configuration.
    pub fn style(&self) -> StyleConfiguration {
        self.style.borrow().clone()
    }

    pub fn coloring_enabled(&self) -> bool {
        self.style.borrow().coloring_enabled
    }

    pub fn signal_icon_mode(&self) -> SignalIconMode {
        self.style.borrow().signal_icon_mode
    }

    pub fn icon_color(&self, index: usize) -> Color {
        self.style.borrow().icon_color[index.min(1)]
    }

    pub fn data_activity_color(&self, index: usize) -> Color {
        self.style.borrow().data_activity_color[index.min(1)]
    }

    pub fn set_coloring_enabled(&self, enabled: bool) -> bool {
        self.mutate(
            "coloring_enabled",
            Aspects::COLORING_ENABLED | Aspects::ICON_COLOR,
            true,
            |style| replace(&mut style.coloring_enabled, enabled),
        )
    }

    pub fn set_signal_icon_mode(&self, mode: SignalIconMode) -> bool {
        self.mutate("signal_icon_mode", Aspects::SIGNAL_ICON_MODE, true, |style| {
            replace(&mut style.signal_icon_mode, mode)
        })
    }

    /// Set the tint of rail `index` (0 primary, 1 secondary).
    pub fn set_icon_color(&self, index: usize, color: Color) -> bool {
        let aspect = match index {
            0 => Aspects::ICON_COLOR,
            1 => Aspects::ICON_COLOR_SECONDARY,
            _ => {
                warn!("ignoring icon color for rail {}", index);
                return false;
            }
        };
        self.mutate("icon_color", aspect, true, |style| {
            replace(&mut style.icon_color[index], color)
        })
    }

    /// Set the activity glyph tint of rail `index`.
    ///
    /// Activity glyphs are never cached, so the cache is left alone.
    pub fn set_data_activity_color(&self, index: usize, color: Color) -> bool {
        if index > 1 {
            warn!("ignoring data activity color for rail {}", index);
            return false;
        }
        self.mutate(
            "data_activity_color",
            Aspects::DATA_ACTIVITY_COLOR,
            false,
            |style| replace(&mut style.data_activity_color[index], color),
        )
    }

    pub fn set_icon_style(&self, icon_style: IconStyle) -> bool {
        self.mutate("icon_style", Aspects::ICON_STYLE, true, |style| {
            replace(&mut style.icon_style, icon_style)
        })
    }

    /// Set group opacities. Values are clamped to 0.0..=1.0.
    pub fn set_icon_alpha(&self, signal_cluster: f32, text_and_battery: f32) -> bool {
        let signal_cluster = clamp_alpha(signal_cluster);
        let text_and_battery = clamp_alpha(text_and_battery);
        self.mutate("icon_alpha", Aspects::ICON_ALPHA, false, |style| {
            let changed = replace(&mut style.alpha_signal_cluster, signal_cluster);
            replace(&mut style.alpha_text_and_battery, text_and_battery) || changed
        })
    }

    /// Re-deliver every aspect to every listener without changing anything.
    pub fn refresh_state(&self) {
        debug!("refreshing style state");
        let snapshot = self.style();
        self.bus.notify(Aspects::ALL, &snapshot);
    }

    /// Apply a configuration-change event: one mutator call per present
    /// field. Returns the union of aspects that actually changed.
    pub fn apply_event(&self, event: &StyleEvent) -> Aspects {
        let mut changed = Aspects::empty();
        let mut track = |did_change: bool, aspect: Aspects| {
            if did_change {
                changed |= aspect;
            }
        };

        if let Some(enabled) = event.coloring_enabled {
            track(
                self.set_coloring_enabled(enabled),
                Aspects::COLORING_ENABLED | Aspects::ICON_COLOR,
            );
        }
        if let Some(color) = event.icon_color {
            track(self.set_icon_color(0, color), Aspects::ICON_COLOR);
        }
        if let Some(color) = event.icon_color_secondary {
            track(self.set_icon_color(1, color), Aspects::ICON_COLOR_SECONDARY);
        }
        if let Some(icon_style) = event.icon_style {
            track(self.set_icon_style(icon_style), Aspects::ICON_STYLE);
        }
        if let Some(mode) = event.signal_mode {
            track(self.set_signal_icon_mode(mode), Aspects::SIGNAL_ICON_MODE);
        }
        if let Some(color) = event.data_activity_color {
            track(
                self.set_data_activity_color(0, color),
                Aspects::DATA_ACTIVITY_COLOR,
            );
        }
        if let Some(color) = event.data_activity_color_secondary {
            track(
                self.set_data_activity_color(1, color),
                Aspects::DATA_ACTIVITY_COLOR,
            );
        }
        if let Some((cluster, text)) = event.icon_alpha {
            track(self.set_icon_alpha(cluster, text), Aspects::ICON_ALPHA);
        }

        changed
    }

    /// Move to `target`, going through the regular mutators.
    pub fn apply_style(&self, target: &StyleConfiguration) -> Aspects {
        let event = StyleEvent::between(&self.style.borrow(), target);
        if event.is_empty() {
            debug!("style unchanged, skipping");
            return Aspects::empty();
        }
        self.apply_event(&event)
    }

    /// Register a listener; it immediately receives [`Aspects::ALL`].
    pub fn register_listener(&self, listener: Rc<dyn StyleListener>) -> bool {
        let snapshot = self.style();
        self.bus.register(listener, &snapshot)
    }

    pub fn unregister_listener(&self, listener: &Rc<dyn StyleListener>) -> bool {
        self.bus.unregister(listener)
    }

    pub fn listener_count(&self) -> usize {
        self.bus.len()
    }

    /// See [`IconResolver::resolve`].
    pub fn resolve(
        &self,
        raw: &str,
        rail: usize,
        fully_connected: bool,
    ) -> Result<Resolution, ResolveError> {
        self.resolver
            .resolve(&self.style.borrow(), raw, rail, fully_connected)
    }

    /// See [`IconResolver::resolve_basic`].
    pub fn resolve_basic(&self, raw: &str) -> Result<Rc<Artifact>, ResolveError> {
        self.resolver.resolve_basic(&self.style.borrow(), raw)
    }

    /// See [`IconResolver::resolve_type_icon`].
    pub fn resolve_type_icon(&self, raw: &str, rail: usize) -> Result<Rc<Artifact>, ResolveError> {
        self.resolver
            .resolve_type_icon(&self.style.borrow(), raw, rail)
    }

    pub fn resolver(&self) -> &IconResolver {
        &self.resolver
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.resolver.cache_stats()
    }

    /// Low-memory hook for the host.
    pub fn trim_memory(&self) {
        self.resolver.trim_memory();
    }

    pub fn set_cache_capacity(&self, capacity: usize) {
        self.resolver.resize_cache(capacity);
    }

    fn mutate(
        &self,
        field: &str,
        aspects: Aspects,
        clears_cache: bool,
        apply: impl FnOnce(&mut StyleConfiguration) -> bool,
    ) -> bool {
        if !apply(&mut self.style.borrow_mut()) {
            debug!("{} unchanged, skipping", field);
            return false;
        }

        info!("style changed: {} ({:?})", field, aspects);
        if clears_cache {
            self.resolver.clear_cache();
        }
        let snapshot = self.style();
        self.bus.notify(aspects, &snapshot);
        true
    }
}

/// Store `new` in `slot`; returns whether the value differed.
fn replace<T: PartialEq>(slot: &mut T, new: T) -> bool {
    if *slot == new {
        return false;
    }
    *slot = new;
    true
}

fn clamp_alpha(alpha: f32) -> f32 {
    if alpha.is_nan() { 1.0 } else { alpha.clamp(0.0, 1.0) }
}
