//! Per-signal connection and data-activity state.
//!
//! A [`SignalActivityTracker`] exists for each monitored transport while
//! its host surface is attached. Connectivity callbacks drive
//! [`SignalActivityTracker::update`], which repaints the strength icon for
//! the connection state and picks the directional activity glyph.

use std::fmt;
use std::rc::{Rc, Weak};

use tracing::{debug, trace};

use crate::artifact::{Artifact, Tint, TintMode};
use crate::cluster::ClusterOptions;
use crate::color::Color;
use crate::error::{FieldAccessError, MutedErrors};
use crate::host::{FieldResult, HostIconSurface};
use crate::manager::IconManager;
use crate::resolver::Resolution;
use crate::style::SignalIconMode;
use crate::tables;

/// Transport class being monitored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SignalType {
    Wifi,
    Mobile,
}

impl SignalType {
    pub fn as_str(self) -> &'static str {
        match self {
            SignalType::Wifi => "wifi",
            SignalType::Mobile => "mobile",
        }
    }
}

impl fmt::Display for SignalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which activity glyph is shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ActivityGlyph {
    #[default]
    Hidden,
    In,
    Out,
    InOut,
}

impl ActivityGlyph {
    pub fn select(activity_in: bool, activity_out: bool) -> Self {
        match (activity_in, activity_out) {
            (true, true) => ActivityGlyph::InOut,
            (true, false) => ActivityGlyph::In,
            (false, true) => ActivityGlyph::Out,
            (false, false) => ActivityGlyph::Hidden,
        }
    }

    /// Position in the (in, out, in+out) glyph triple.
    fn index(self) -> Option<usize> {
        match self {
            ActivityGlyph::Hidden => None,
            ActivityGlyph::In => Some(0),
            ActivityGlyph::Out => Some(1),
            ActivityGlyph::InOut => Some(2),
        }
    }
}

/// Outline tint marking a partially connected signal.
pub const PARTIAL_CONNECTION_TINT: Tint = Tint {
    color: Color::PARTIAL_CONNECTION,
    mode: TintMode::SrcAtop,
};

/// Last connectivity report for one signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SignalState {
    pub enabled: bool,
    pub fully_connected: bool,
    pub activity_in: bool,
    pub activity_out: bool,
}

impl Default for SignalState {
    fn default() -> Self {
        Self {
            enabled: false,
            fully_connected: true,
            activity_in: false,
            activity_out: false,
        }
    }
}

pub struct SignalActivityTracker {
    signal: SignalType,
    rail: usize,
    options: ClusterOptions,
    manager: Weak<IconManager>,
    surface: Rc<dyn HostIconSurface>,
    state: SignalState,
    glyph: ActivityGlyph,
    /// Untinted (in, out, in+out) glyphs.
    pristine: Option<[Artifact; 3]>,
    /// Glyphs tinted with the current data-activity color.
    glyphs: Option<[Rc<Artifact>; 3]>,
    errors: MutedErrors,
}

impl SignalActivityTracker {
    /// Create a tracker. With data activity enabled, the glyphs are loaded
    /// and tinted immediately.
    pub fn new(
        signal: SignalType,
        rail: usize,
        options: ClusterOptions,
        manager: Weak<IconManager>,
        surface: Rc<dyn HostIconSurface>,
    ) -> Self {
        let mut tracker = Self {
            signal,
            rail: rail.min(1),
            options,
            manager,
            surface,
            state: SignalState::default(),
            glyph: ActivityGlyph::Hidden,
            pristine: None,
            glyphs: None,
            errors: MutedErrors::new(),
        };
        if options.data_activity {
            tracker.load_glyphs();
            tracker.update_data_activity_color();
        }
        debug!("{} tracker created", signal);
        tracker
    }

    pub fn signal(&self) -> SignalType {
        self.signal
    }

    pub fn state(&self) -> SignalState {
        self.state
    }

    pub fn enabled(&self) -> bool {
        self.state.enabled
    }

    pub fn fully_connected(&self) -> bool {
        self.state.fully_connected
    }

    /// Glyph selected by the last update.
    pub fn glyph(&self) -> ActivityGlyph {
        self.glyph
    }

    /// Tinted glyph for `which`, if glyphs are loaded.
    pub fn glyph_artifact(&self, which: ActivityGlyph) -> Option<Rc<Artifact>> {
        let index = which.index()?;
        self.glyphs.as_ref().map(|g| Rc::clone(&g[index]))
    }

    /// Number of distinct failures logged so far.
    pub fn logged_errors(&self) -> usize {
        self.errors.len()
    }

    /// Record a connectivity report and repaint.
    ///
    /// All four fields are overwritten. The connection-state step and the
    /// activity step run independently; a failure in one is logged and
    /// does not stop the other.
    pub fn update(
        &mut self,
        enabled: bool,
        fully_connected: bool,
        activity_in: bool,
        activity_out: bool,
    ) {
        self.state = SignalState {
            enabled,
            fully_connected,
            activity_in,
            activity_out,
        };

        if self.options.connection_state {
            if let Err(e) = self.paint_connection_state() {
                let key = format!("{}:connection_state", self.signal);
                self.errors.log(&key, &e);
            }
        }

        if self.options.data_activity {
            if let Err(e) = self.paint_activity() {
                let key = format!("{}:data_activity", self.signal);
                self.errors.log(&key, &e);
            }
        }
    }

    /// Repeat the last update with the stored state.
    pub fn refresh(&mut self) {
        let s = self.state;
        self.update(s.enabled, s.fully_connected, s.activity_in, s.activity_out);
    }

    /// Re-tint the three activity glyphs from their pristine images with
    /// the current data-activity color.
    pub fn update_data_activity_color(&mut self) {
        let Some(pristine) = &self.pristine else {
            return;
        };
        let Some(manager) = self.manager.upgrade() else {
            trace!("{} tracker: manager gone, skipping glyph tint", self.signal);
            return;
        };
        let tint = Tint {
            color: manager.data_activity_color(self.rail),
            mode: TintMode::SrcIn,
        };
        let [glyph_in, glyph_out, glyph_inout] = pristine;
        self.glyphs = Some([
            Rc::new(glyph_in.clone().tinted(tint)),
            Rc::new(glyph_out.clone().tinted(tint)),
            Rc::new(glyph_inout.clone().tinted(tint)),
        ]);
        debug!("{} activity glyphs tinted {}", self.signal, tint.color);
    }

    fn load_glyphs(&mut self) {
        let Some(manager) = self.manager.upgrade() else {
            return;
        };
        let [a, b, c] = tables::activity_glyph_assets(self.signal);
        let loaded = manager.resolver().load_pristine(a).and_then(|a| {
            let b = manager.resolver().load_pristine(b)?;
            let c = manager.resolver().load_pristine(c)?;
            Ok([a, b, c])
        });
        match loaded {
            Ok(glyphs) => self.pristine = Some(glyphs),
            Err(e) => {
                let key = format!("{}:activity_glyphs", self.signal);
                self.errors.log(&key, &e);
            }
        }
    }

    fn paint_connection_state(&self) -> FieldResult<()> {
        let Some(manager) = self.manager.upgrade() else {
            return Err(FieldAccessError::new("icon_manager", "dropped"));
        };

        if manager.coloring_enabled() && manager.signal_icon_mode() != SignalIconMode::Disabled {
            return paint_signal(
                &manager,
                self.surface.as_ref(),
                self.signal,
                self.state.fully_connected,
            );
        }

        // Coloring is off: outline tint straight on the host's own icon.
        let filter = (!self.state.fully_connected).then_some(PARTIAL_CONNECTION_TINT);
        self.surface.set_strength_filter(self.signal, filter)?;
        if self.signal == SignalType::Mobile {
            self.surface.set_type_filter(filter)?;
        }
        trace!("{} connection state outline: {:?}", self.signal, filter.is_some());
        Ok(())
    }

    fn paint_activity(&mut self) -> FieldResult<()> {
        self.glyph = ActivityGlyph::select(self.state.activity_in, self.state.activity_out);
        let artifact = self.glyph_artifact(self.glyph);
        if self.glyph != ActivityGlyph::Hidden && artifact.is_none() {
            return Err(FieldAccessError::new("activity_glyph", "glyphs not loaded"));
        }
        self.surface.set_activity_glyph(self.signal, artifact)
    }
}

impl fmt::Debug for SignalActivityTracker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignalActivityTracker")
            .field("signal", &self.signal)
            .field("state", &self.state)
            .field("glyph", &self.glyph)
            .finish_non_exhaustive()
    }
}

/// Resolve and display the strength icon of `signal` (and, for cellular,
/// the data-type icon) through the manager.
///
/// With signal icons disabled the host's own icons are restored. Nothing
/// is painted while the signal is hidden or, for cellular, in airplane
/// mode. Resolution failures leave the host's current icon in place.
pub(crate) fn paint_signal(
    manager: &IconManager,
    surface: &dyn HostIconSurface,
    signal: SignalType,
    fully_connected: bool,
) -> FieldResult<()> {
    if manager.signal_icon_mode() == SignalIconMode::Disabled {
        return restore_signal(surface, signal);
    }
    if !surface.signal_visible(signal)? {
        return Ok(());
    }
    if signal == SignalType::Mobile && surface.airplane_mode()? {
        return Ok(());
    }

    if let Some(id) = surface.strength_icon_id(signal)? {
        match manager.resolve(&id, 0, fully_connected) {
            Ok(Resolution::Icon(artifact)) => {
                surface.set_strength_icon(signal, artifact)?;
                surface.set_strength_filter(signal, None)?;
            }
            Ok(Resolution::NoArtifact) => return Ok(()),
            Err(e) => debug!("{} strength icon not resolved: {}", signal, e),
        }
    }

    if signal == SignalType::Mobile {
        if let Some(id) = surface.type_icon_id()? {
            match manager.resolve_type_icon(&id, 0) {
                Ok(artifact) => {
                    surface.set_type_icon(artifact)?;
                    surface.set_type_filter(None)?;
                }
                Err(e) => debug!("type icon not resolved: {}", e),
            }
        }
    }
    Ok(())
}

/// Drop any artifact painted over the host's strength icon of `signal`
/// (and, for cellular, its data-type icon).
pub(crate) fn restore_signal(
    surface: &dyn HostIconSurface,
    signal: SignalType,
) -> FieldResult<()> {
    surface.restore_strength_icon(signal)?;
    if signal == SignalType::Mobile {
        surface.restore_type_icon()?;
    }
    trace!("{} host icons restored", signal);
    Ok(())
}
