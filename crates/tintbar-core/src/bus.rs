//! Synchronous style-change notification.
//!
//! Listeners are held strongly and identified by `Rc` pointer identity.
//! Delivery happens on the calling thread, in registration order, before
//! `notify` returns.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use tracing::trace;

use crate::style::{Aspects, StyleConfiguration};

/// Receives style-change notifications.
pub trait StyleListener {
    /// `aspects` names what changed; `style` is a snapshot taken after the
    /// change.
    fn on_style_changed(&self, aspects: Aspects, style: &StyleConfiguration);
}

/// Adapter turning a closure into a [`StyleListener`].
pub struct FnListener<F>(pub F);

impl<F> StyleListener for FnListener<F>
where
    F: Fn(Aspects, &StyleConfiguration),
{
    fn on_style_changed(&self, aspects: Aspects, style: &StyleConfiguration) {
        (self.0)(aspects, style)
    }
}

impl<F> FnListener<F>
where
    F: Fn(Aspects, &StyleConfiguration) + 'static,
{
    /// Wrap `f` in an `Rc<dyn StyleListener>` ready for registration.
    pub fn shared(f: F) -> Rc<dyn StyleListener> {
        Rc::new(FnListener(f))
    }
}

#[derive(Default)]
pub struct NotificationBus {
    listeners: RefCell<Vec<Rc<dyn StyleListener>>>,
}

impl NotificationBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a listener and replay every aspect to it.
    ///
    /// Registering a listener that is already present does nothing and
    /// returns false.
    pub fn register(&self, listener: Rc<dyn StyleListener>, style: &StyleConfiguration) -> bool {
        if self.contains(&listener) {
            trace!("listener already registered");
            return false;
        }
        self.listeners.borrow_mut().push(Rc::clone(&listener));
        listener.on_style_changed(Aspects::ALL, style);
        true
    }

    /// Remove a listener. Returns false if it was not registered.
    pub fn unregister(&self, listener: &Rc<dyn StyleListener>) -> bool {
        let mut listeners = self.listeners.borrow_mut();
        let before = listeners.len();
        listeners.retain(|l| !same_listener(l, listener));
        listeners.len() != before
    }

    pub fn contains(&self, listener: &Rc<dyn StyleListener>) -> bool {
        self.listeners
            .borrow()
            .iter()
            .any(|l| same_listener(l, listener))
    }

    /// Deliver `aspects` to every listener registered at the time of the
    /// call.
    pub fn notify(&self, aspects: Aspects, style: &StyleConfiguration) {
        if aspects.is_empty() {
            return;
        }
        let snapshot: Vec<_> = self.listeners.borrow().clone();
        trace!("notifying {} listeners: {:?}", snapshot.len(), aspects);
        for listener in snapshot {
            listener.on_style_changed(aspects, style);
        }
    }

    pub fn len(&self) -> usize {
        self.listeners.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.borrow().is_empty()
    }
}

impl fmt::Debug for NotificationBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NotificationBus")
            .field("listeners", &self.len())
            .finish()
    }
}

// Compare data pointers only; vtable pointers for the same type may differ
// across codegen units.
fn same_listener(a: &Rc<dyn StyleListener>, b: &Rc<dyn StyleListener>) -> bool {
    std::ptr::addr_eq(Rc::as_ptr(a), Rc::as_ptr(b))
}
