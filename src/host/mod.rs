//! The host display API consumed by render passes.
//!
//! A host owns the concrete display objects (DOM nodes, terminal cells, ...).
//! Render passes only ever talk to it through the primitives on [`Host`], so
//! swapping the host swaps the display target without touching components.

pub mod memory;

use std::fmt;
use std::rc::Rc;

use crate::error::HostError;

pub use memory::{MemoryHost, NodeId};

/// An event delivered to a listener.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Event {
    pub name: String,
}

impl Event {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// A listener registered on a host node.
pub type EventHandler = Rc<dyn Fn(&Event)>;

/// Primitives a display host must provide.
///
/// Handles are cheap to clone and identify host nodes. A handle to a node that
/// the host has since discarded should be reported as [`HostError::StaleNode`].
pub trait Host {
    type Handle: Clone + fmt::Debug + 'static;

    fn create_element(&mut self, tag: &str) -> Result<Self::Handle, HostError>;

    fn create_text_node(&mut self, text: &str) -> Self::Handle;

    fn append_child(
        &mut self,
        parent: &Self::Handle,
        child: &Self::Handle,
    ) -> Result<(), HostError>;

    /// Remove and discard every child of `container`.
    fn remove_children(&mut self, container: &Self::Handle) -> Result<(), HostError>;

    fn set_attribute(
        &mut self,
        element: &Self::Handle,
        name: &str,
        value: &str,
    ) -> Result<(), HostError>;

    fn set_class_name(&mut self, element: &Self::Handle, class: &str) -> Result<(), HostError>;

    fn set_style(
        &mut self,
        element: &Self::Handle,
        property: &str,
        value: &str,
    ) -> Result<(), HostError>;

    fn add_event_listener(
        &mut self,
        element: &Self::Handle,
        event: &str,
        handler: EventHandler,
    ) -> Result<(), HostError>;
}
