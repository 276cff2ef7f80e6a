//! Persistent state for function components.
//!
//! A function component is stateless: it is called again from scratch on every
//! render. [`Hooks`] gives it state that survives between those calls. The
//! reconciler hands each function component a `Hooks` value built from the slots
//! of the unit that rendered at the same position last time; each
//! [`Hooks::use_state`] call consumes the next slot in order.
//!
//! Slots from the previous render are never mutated. Their queued updates are folded
//! into a fresh slot owned by the new render, so a render pass that gets abandoned
//! leaves the committed state intact for the pass that replaces it.

use core::any::{Any, type_name};
use std::borrow::Cow;
use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use crate::error::HookViolation;

/// Shared flag raised by state setters to ask their scheduler for a new render.
#[derive(Debug, Clone, Default)]
pub struct UpdateSignal(Rc<Cell<bool>>);

impl UpdateSignal {
    /// Creates a lowered signal.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Raises the signal.
    pub fn request(&self) {
        self.0.set(true);
    }

    /// Returns `true` if an update was requested and not yet taken.
    #[must_use]
    pub fn is_requested(&self) -> bool {
        self.0.get()
    }

    /// Lowers the signal, returning whether it was raised.
    pub fn take(&self) -> bool {
        self.0.replace(false)
    }
}

enum Update<T> {
    Replace(T),
    Apply(Rc<dyn Fn(&T) -> T>),
}

impl<T: Clone> Update<T> {
    fn apply(&self, current: &T) -> T {
        match self {
            Self::Replace(value) => value.clone(),
            Self::Apply(f) => f(current),
        }
    }
}

struct SlotState<T> {
    state: T,
    queue: Vec<Update<T>>,
}

type SharedSlot<T> = Rc<RefCell<SlotState<T>>>;

/// One persisted hook, owned by the work unit whose render created it.
#[derive(Clone)]
pub struct HookSlot {
    cell: Rc<dyn Any>,
    type_name: &'static str,
}

impl HookSlot {
    fn new<T: 'static>(cell: SharedSlot<T>) -> Self {
        Self {
            cell,
            type_name: type_name::<T>(),
        }
    }

    fn downcast<T: 'static>(&self) -> Option<SharedSlot<T>> {
        self.cell.clone().downcast::<RefCell<SlotState<T>>>().ok()
    }

    /// Name of the state type stored in this slot.
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        self.type_name
    }
}

impl fmt::Debug for HookSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("HookSlot").field(&self.type_name).finish()
    }
}

/// Hook context for one render of one function component.
pub struct Hooks {
    component: Cow<'static, str>,
    previous: Option<Vec<HookSlot>>,
    slots: Vec<HookSlot>,
    cursor: usize,
    signal: UpdateSignal,
    violation: Option<HookViolation>,
}

impl_debug!(Hooks);

impl Hooks {
    /// Creates the context for a render.
    ///
    /// `previous` holds the slots of the unit rendered at the same position last time,
    /// or `None` when the component is mounting.
    #[must_use]
    pub fn new(
        component: impl Into<Cow<'static, str>>,
        previous: Option<Vec<HookSlot>>,
        signal: UpdateSignal,
    ) -> Self {
        Self {
            component: component.into(),
            previous,
            slots: Vec::new(),
            cursor: 0,
            signal,
            violation: None,
        }
    }

    /// Declares a piece of state, returning its current value and a setter.
    pub fn use_state<T>(&mut self, initial: T) -> (T, StateSetter<T>)
    where
        T: Clone + PartialEq + 'static,
    {
        self.use_state_with(move || initial)
    }

    /// Like [`Hooks::use_state`], but only computes the initial value on mount.
    pub fn use_state_with<T, F>(&mut self, init: F) -> (T, StateSetter<T>)
    where
        T: Clone + PartialEq + 'static,
        F: FnOnce() -> T,
    {
        let index = self.cursor;
        self.cursor += 1;

        let previous = self
            .previous
            .as_ref()
            .and_then(|slots| slots.get(index))
            .cloned();

        let state = match previous {
            Some(slot) => match slot.downcast::<T>() {
                Some(cell) => {
                    let old = cell.borrow();
                    let state = old
                        .queue
                        .iter()
                        .fold(old.state.clone(), |state, update| update.apply(&state));
                    if !old.queue.is_empty() {
                        tracing::trace!(
                            target: "undertow::hooks",
                            component = %self.component,
                            index,
                            drained = old.queue.len(),
                            "applied queued updates"
                        );
                    }
                    state
                }
                None => {
                    self.record(HookViolation::TypeMismatch {
                        index,
                        expected: type_name::<T>(),
                        found: slot.type_name(),
                    });
                    init()
                }
            },
            None => init(),
        };

        let cell = Rc::new(RefCell::new(SlotState {
            state: state.clone(),
            queue: Vec::new(),
        }));
        self.slots.push(HookSlot::new(cell.clone()));

        let setter = StateSetter {
            cell,
            signal: self.signal.clone(),
        };
        (state, setter)
    }

    /// Number of hooks called so far in this render.
    #[must_use]
    pub const fn cursor(&self) -> usize {
        self.cursor
    }

    /// Name of the component being rendered.
    #[must_use]
    pub fn component(&self) -> &str {
        &self.component
    }

    /// Ends the render, returning the new slots and the first contract violation seen.
    #[must_use]
    pub fn finish(mut self) -> (Vec<HookSlot>, Option<HookViolation>) {
        if let Some(previous) = &self.previous
            && previous.len() != self.slots.len()
        {
            let violation = HookViolation::CountMismatch {
                previous: previous.len(),
                current: self.slots.len(),
            };
            self.record(violation);
        }
        (self.slots, self.violation)
    }

    fn record(&mut self, violation: HookViolation) {
        if self.violation.is_none() {
            self.violation = Some(violation);
        }
    }
}

/// Setter bound to one hook slot.
pub struct StateSetter<T> {
    cell: SharedSlot<T>,
    signal: UpdateSignal,
}

impl<T> Clone for StateSetter<T> {
    fn clone(&self) -> Self {
        Self {
            cell: self.cell.clone(),
            signal: self.signal.clone(),
        }
    }
}

impl<T> fmt::Debug for StateSetter<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateSetter")
            .field("state", &type_name::<T>())
            .field("pending", &self.cell.borrow().queue.len())
            .finish()
    }
}

impl<T: Clone + PartialEq + 'static> StateSetter<T> {
    /// Replaces the state.
    ///
    /// Setting the value the slot already holds does nothing and does not schedule
    /// a render. Otherwise the value is queued and a render is requested; queued
    /// values are applied in order the next time the component renders.
    pub fn set(&self, value: T) {
        {
            let mut slot = self.cell.borrow_mut();
            if slot.state == value {
                tracing::trace!(target: "undertow::hooks", "state unchanged, skipping update");
                return;
            }
            slot.queue.push(Update::Replace(value));
        }
        self.signal.request();
    }

    /// Queues a functional update computed from the preceding state.
    pub fn update(&self, f: impl Fn(&T) -> T + 'static) {
        self.cell.borrow_mut().queue.push(Update::Apply(Rc::new(f)));
        self.signal.request();
    }

    /// Returns the state this setter's slot was rendered with.
    #[must_use]
    pub fn current(&self) -> T {
        self.cell.borrow().state.clone()
    }

    /// Number of updates waiting for the next render.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.cell.borrow().queue.len()
    }
}
