//! Component definitions.
//!
//! Components are identified by the Rust type of their render function or struct,
//! so a component value rebuilt on every render still matches the work unit that
//! rendered it last time.

use core::any::{TypeId, type_name};
use std::borrow::Cow;
use std::rc::Rc;

use crate::hooks::Hooks;
use crate::node::{ElementBuilder, NodeType};
use crate::props::Props;
use crate::VirtualNode;

type RenderFn = dyn Fn(&mut Hooks, &Props) -> VirtualNode;

/// A render function invoked with hooks and props.
#[derive(Clone)]
pub struct FunctionComponent {
    id: TypeId,
    name: Cow<'static, str>,
    render: Rc<RenderFn>,
    defaults: Rc<Props>,
}

impl_debug!(FunctionComponent, name);

impl FunctionComponent {
    /// Wraps a render function.
    pub fn new<F>(render: F) -> Self
    where
        F: Fn(&mut Hooks, &Props) -> VirtualNode + 'static,
    {
        Self {
            id: TypeId::of::<F>(),
            name: Cow::Borrowed(short_name(type_name::<F>())),
            render: Rc::new(render),
            defaults: Rc::new(Props::new()),
        }
    }

    /// Overrides the name shown in logs and errors.
    #[must_use]
    pub fn named(mut self, name: impl Into<Cow<'static, str>>) -> Self {
        self.name = name.into();
        self
    }

    /// Declares props filled in when a caller leaves them out.
    #[must_use]
    pub fn with_defaults(mut self, defaults: Props) -> Self {
        self.defaults = Rc::new(defaults);
        self
    }

    /// Starts a descriptor rendering this component.
    pub fn builder(&self) -> ElementBuilder {
        ElementBuilder::new(NodeType::Function(self.clone()))
    }

    /// Shorthand for a descriptor with the given props and no key.
    #[must_use]
    pub fn create(&self, props: Props) -> VirtualNode {
        let mut builder = self.builder();
        for (name, value) in props.attributes() {
            builder = builder.prop(name.to_owned(), value.clone());
        }
        builder.children(props.children().iter().cloned()).build()
    }

    /// Invokes the render function.
    pub fn render(&self, hooks: &mut Hooks, props: &Props) -> VirtualNode {
        (self.render)(hooks, props)
    }

    /// Returns the component name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the default props.
    #[must_use]
    pub fn defaults(&self) -> &Props {
        &self.defaults
    }

    /// Returns `true` if both values wrap the same render function type.
    #[must_use]
    pub fn same_component(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

/// A component that is constructed from its props and then rendered.
///
/// This is the object-with-render flavour of component. Instances are created afresh
/// on every render and hold no state across renders.
pub trait Component: 'static {
    /// Builds an instance carrying `props`.
    fn create(props: Rc<Props>) -> Self
    where
        Self: Sized;

    /// Produces the single child descriptor.
    fn render(&self) -> VirtualNode;

    /// Props filled in when a caller leaves them out.
    #[must_use]
    fn default_props() -> Props
    where
        Self: Sized,
    {
        Props::new()
    }
}

type Construct = dyn Fn(Rc<Props>) -> Box<dyn Component>;

/// Type-erased handle to a [`Component`] implementation.
#[derive(Clone)]
pub struct ClassComponent {
    id: TypeId,
    name: Cow<'static, str>,
    construct: Rc<Construct>,
    defaults: Rc<Props>,
}

impl_debug!(ClassComponent, name);

impl ClassComponent {
    /// Returns the handle for `C`.
    #[must_use]
    pub fn of<C: Component>() -> Self {
        Self {
            id: TypeId::of::<C>(),
            name: Cow::Borrowed(short_name(type_name::<C>())),
            construct: Rc::new(|props: Rc<Props>| -> Box<dyn Component> {
                Box::new(C::create(props))
            }),
            defaults: Rc::new(C::default_props()),
        }
    }

    /// Starts a descriptor rendering this component.
    pub fn builder(&self) -> ElementBuilder {
        ElementBuilder::new(NodeType::Class(self.clone()))
    }

    /// Constructs an instance.
    #[must_use]
    pub fn instantiate(&self, props: Rc<Props>) -> Box<dyn Component> {
        (self.construct)(props)
    }

    /// Returns the component name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the default props.
    #[must_use]
    pub fn defaults(&self) -> &Props {
        &self.defaults
    }

    /// Returns `true` if both handles refer to the same implementation.
    #[must_use]
    pub fn same_component(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

fn short_name(full: &'static str) -> &'static str {
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}
