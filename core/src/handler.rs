//! Event listeners installed on host nodes.
//!
//! A [`Handler`] is a shared, reference-counted closure. Two handlers are equal only
//! when they point at the same closure allocation, which lets the commit phase skip
//! re-installing a listener that did not change between renders.

use std::fmt;
use std::rc::Rc;

use crate::props::PropValue;

/// An event delivered by the host to an installed listener.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    name: String,
    value: Option<PropValue>,
}

impl Event {
    /// Creates an event with the given (lowercase) name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: None,
        }
    }

    /// Attaches a payload, e.g. the current value of an input.
    #[must_use]
    pub fn with_value(mut self, value: impl Into<PropValue>) -> Self {
        self.value = Some(value.into());
        self
    }

    /// Returns the event name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the payload carried by the event, if any.
    #[must_use]
    pub const fn value(&self) -> Option<&PropValue> {
        self.value.as_ref()
    }
}

/// Shared event listener.
#[derive(Clone)]
pub struct Handler(Rc<dyn Fn(&Event)>);

impl Handler {
    /// Wraps a closure into a handler.
    pub fn new(f: impl Fn(&Event) + 'static) -> Self {
        Self(Rc::new(f))
    }

    /// Invokes the listener.
    pub fn call(&self, event: &Event) {
        (self.0)(event);
    }

    /// Returns `true` if both handlers share the same closure.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl PartialEq for Handler {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Handler({:p})", Rc::as_ptr(&self.0).cast::<()>())
    }
}

impl<F: Fn(&Event) + 'static> From<F> for Handler {
    fn from(value: F) -> Self {
        Self::new(value)
    }
}

/// Prefix marking a property as an event listener.
pub const LISTENER_PREFIX: &str = "on";

/// Returns the event name for a property name, if it names a listener.
///
/// `onClick` with prefix `on` becomes `click`. The prefix alone is not an event.
#[must_use]
pub fn event_name(prefix: &str, property: &str) -> Option<String> {
    let rest = property.strip_prefix(prefix)?;
    if rest.is_empty() {
        return None;
    }
    Some(rest.to_lowercase())
}
