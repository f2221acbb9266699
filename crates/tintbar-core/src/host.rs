//! Host surface capability.
//!
//! The signal cluster never touches host internals directly. Everything it
//! reads or writes on the host's status bar goes through
//! [`HostIconSurface`], which the host-integration layer implements. Any
//! call may fail with a [`FieldAccessError`] when the host's view is
//! momentarily unavailable; callers log and skip.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use tracing::debug;

use crate::artifact::{Artifact, Tint};
use crate::error::FieldAccessError;
use crate::tracker::SignalType;

pub type FieldResult<T> = Result<T, FieldAccessError>;

/// What the core may read and write on one host status-bar surface.
pub trait HostIconSurface {
    /// Whether the strength icon group of `signal` is currently shown.
    fn signal_visible(&self, signal: SignalType) -> FieldResult<bool>;

    fn airplane_mode(&self) -> FieldResult<bool>;

    /// Raw identity of the strength icon the host last displayed for
    /// `signal`, if any.
    fn strength_icon_id(&self, signal: SignalType) -> FieldResult<Option<String>>;

    /// Raw identity of the cellular data-type icon, if any.
    fn type_icon_id(&self) -> FieldResult<Option<String>>;

    fn set_strength_icon(&self, signal: SignalType, artifact: Rc<Artifact>) -> FieldResult<()>;

    fn set_type_icon(&self, artifact: Rc<Artifact>) -> FieldResult<()>;

    /// Show the host's own strength icon for `signal` again, dropping any
    /// artifact set with [`set_strength_icon`](Self::set_strength_icon).
    fn restore_strength_icon(&self, signal: SignalType) -> FieldResult<()>;

    fn restore_type_icon(&self) -> FieldResult<()>;

    /// Color filter on the strength icon; `None` clears it.
    fn set_strength_filter(&self, signal: SignalType, filter: Option<Tint>) -> FieldResult<()>;

    fn set_type_filter(&self, filter: Option<Tint>) -> FieldResult<()>;

    fn set_airplane_filter(&self, filter: Option<Tint>) -> FieldResult<()>;

    /// Show an activity glyph next to `signal`, or hide it with `None`.
    fn set_activity_glyph(
        &self,
        signal: SignalType,
        glyph: Option<Rc<Artifact>>,
    ) -> FieldResult<()>;
}

/// Everything a [`RecordingSurface`] has been told, per signal.
#[derive(Debug, Default, Clone)]
pub struct SurfaceState {
    pub strength_icon: HashMap<SignalType, Rc<Artifact>>,
    pub strength_filter: HashMap<SignalType, Option<Tint>>,
    pub activity_glyph: HashMap<SignalType, Option<Rc<Artifact>>>,
    pub type_icon: Option<Rc<Artifact>>,
    pub type_filter: Option<Tint>,
    pub airplane_filter: Option<Tint>,
    /// Number of setter calls that succeeded.
    pub writes: usize,
}

/// In-memory surface that records every write.
///
/// Serves as the host for the command-line tool and for tests. Inputs
/// (visibility, icon ids) are set directly; a field can be made to fail
/// to exercise the error path.
#[derive(Debug)]
pub struct RecordingSurface {
    visible: RefCell<HashMap<SignalType, bool>>,
    airplane: RefCell<bool>,
    icon_ids: RefCell<HashMap<SignalType, String>>,
    type_icon_id: RefCell<Option<String>>,
    failing: RefCell<Vec<&'static str>>,
    state: RefCell<SurfaceState>,
}

impl Default for RecordingSurface {
    fn default() -> Self {
        Self {
            visible: RefCell::new(HashMap::from([
                (SignalType::Wifi, true),
                (SignalType::Mobile, true),
            ])),
            airplane: RefCell::new(false),
            icon_ids: RefCell::new(HashMap::new()),
            type_icon_id: RefCell::new(None),
            failing: RefCell::new(Vec::new()),
            state: RefCell::new(SurfaceState::default()),
        }
    }
}

impl RecordingSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_visible(&self, signal: SignalType, visible: bool) {
        self.visible.borrow_mut().insert(signal, visible);
    }

    pub fn set_airplane_mode(&self, on: bool) {
        *self.airplane.borrow_mut() = on;
    }

    pub fn set_icon_id(&self, signal: SignalType, id: impl Into<String>) {
        self.icon_ids.borrow_mut().insert(signal, id.into());
    }

    pub fn set_type_icon_id(&self, id: Option<String>) {
        *self.type_icon_id.borrow_mut() = id;
    }

    /// Make every access to `field` fail until [`heal`](Self::heal).
    pub fn fail_field(&self, field: &'static str) {
        self.failing.borrow_mut().push(field);
    }

    pub fn heal(&self) {
        self.failing.borrow_mut().clear();
    }

    pub fn state(&self) -> SurfaceState {
        self.state.borrow().clone()
    }

    fn check(&self, field: &'static str) -> FieldResult<()> {
        if self.failing.borrow().contains(&field) {
            return Err(FieldAccessError::new(field, "view detached"));
        }
        Ok(())
    }

    fn write(&self, field: &'static str, f: impl FnOnce(&mut SurfaceState)) -> FieldResult<()> {
        self.check(field)?;
        let mut state = self.state.borrow_mut();
        f(&mut state);
        state.writes += 1;
        debug!("surface write: {}", field);
        Ok(())
    }
}

impl HostIconSurface for RecordingSurface {
    fn signal_visible(&self, signal: SignalType) -> FieldResult<bool> {
        self.check("visible")?;
        Ok(self.visible.borrow().get(&signal).copied().unwrap_or(false))
    }

    fn airplane_mode(&self) -> FieldResult<bool> {
        self.check("airplane")?;
        Ok(*self.airplane.borrow())
    }

    fn strength_icon_id(&self, signal: SignalType) -> FieldResult<Option<String>> {
        self.check("strength_icon_id")?;
        Ok(self.icon_ids.borrow().get(&signal).cloned())
    }

    fn type_icon_id(&self) -> FieldResult<Option<String>> {
        self.check("type_icon_id")?;
        Ok(self.type_icon_id.borrow().clone())
    }

    fn set_strength_icon(&self, signal: SignalType, artifact: Rc<Artifact>) -> FieldResult<()> {
        self.write("strength_icon", |s| {
            s.strength_icon.insert(signal, artifact);
        })
    }

    fn set_type_icon(&self, artifact: Rc<Artifact>) -> FieldResult<()> {
        self.write("type_icon", |s| s.type_icon = Some(artifact))
    }

    fn restore_strength_icon(&self, signal: SignalType) -> FieldResult<()> {
        self.write("strength_icon", |s| {
            s.strength_icon.remove(&signal);
        })
    }

    fn restore_type_icon(&self) -> FieldResult<()> {
        self.write("type_icon", |s| s.type_icon = None)
    }

    fn set_strength_filter(&self, signal: SignalType, filter: Option<Tint>) -> FieldResult<()> {
        self.write("strength_filter", |s| {
            s.strength_filter.insert(signal, filter);
        })
    }

    fn set_type_filter(&self, filter: Option<Tint>) -> FieldResult<()> {
        self.write("type_filter", |s| s.type_filter = filter)
    }

    fn set_airplane_filter(&self, filter: Option<Tint>) -> FieldResult<()> {
        self.write("airplane_filter", |s| s.airplane_filter = filter)
    }

    fn set_activity_glyph(
        &self,
        signal: SignalType,
        glyph: Option<Rc<Artifact>>,
    ) -> FieldResult<()> {
        self.write("activity_glyph", |s| {
            s.activity_glyph.insert(signal, glyph);
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifact::{IconImage, IconSet, TintMode};
    use crate::color::Color;

    #[test]
    fn test_recording_surface_records_writes() {
        let surface = RecordingSurface::new();
        let artifact = Rc::new(Artifact::plain(
            "stat_sys_signal_2",
            IconSet::Native,
            "stat_sys_signal_2",
            IconImage::filled(1, 1, Color::WHITE),
        ));
        let tint = Tint {
            color: Color::PARTIAL_CONNECTION,
            mode: TintMode::SrcAtop,
        };

        surface
            .set_strength_icon(SignalType::Mobile, Rc::clone(&artifact))
            .unwrap();
        surface
            .set_strength_filter(SignalType::Wifi, Some(tint))
            .unwrap();

        let state = surface.state();
        assert_eq!(state.writes, 2);
        assert!(Rc::ptr_eq(&state.strength_icon[&SignalType::Mobile], &artifact));
        assert_eq!(state.strength_filter[&SignalType::Wifi], Some(tint));
    }

    #[test]
    fn test_restore_drops_artifacts() {
        let surface = RecordingSurface::new();
        let artifact = Rc::new(Artifact::plain(
            "stat_sys_data_fully_connected_lte",
            IconSet::Native,
            "stat_sys_data_fully_connected_lte",
            IconImage::filled(1, 1, Color::WHITE),
        ));
        surface
            .set_strength_icon(SignalType::Wifi, Rc::clone(&artifact))
            .unwrap();
        surface.set_type_icon(artifact).unwrap();

        surface.restore_strength_icon(SignalType::Wifi).unwrap();
        surface.restore_type_icon().unwrap();

        let state = surface.state();
        assert!(state.strength_icon.is_empty());
        assert!(state.type_icon.is_none());
        assert_eq!(state.writes, 4);
    }

    #[test]
    fn test_failing_field_reports_error() {
        let surface = RecordingSurface::new();
        surface.fail_field("airplane_filter");

        let err = surface.set_airplane_filter(None).unwrap_err();
        assert_eq!(err.field, "airplane_filter");
        assert_eq!(surface.state().writes, 0);

        surface.heal();
        assert!(surface.set_airplane_filter(None).is_ok());
    }

    #[test]
    fn test_inputs() {
        let surface = RecordingSurface::new();
        assert!(surface.signal_visible(SignalType::Wifi).unwrap());
        surface.set_visible(SignalType::Wifi, false);
        assert!(!surface.signal_visible(SignalType::Wifi).unwrap());

        assert_eq!(surface.strength_icon_id(SignalType::Wifi).unwrap(), None);
        surface.set_icon_id(SignalType::Wifi, "stat_sys_wifi_signal_2");
        assert_eq!(
            surface.strength_icon_id(SignalType::Wifi).unwrap().as_deref(),
            Some("stat_sys_wifi_signal_2")
        );
    }
}
