//! Arena-backed in-memory document.
//!
//! [`MemoryHost`] implements [`Host`] without any display backend. It is used by
//! the tests and the demo, and it doubles as a reference for what a real host
//! has to do.
//!
//! ## Storage
//!
//! Nodes live in a slot arena addressed by [`NodeId`], a generational index:
//!
//! - `index`: position in the slot array (reused after removal)
//! - `generation`: bumped every time the slot is freed
//!
//! Removing a container's children frees the whole subtree, so handles held
//! from an earlier render pass stop resolving. That makes full-subtree
//! replacement observable through [`MemoryHost::contains`].
//!
//! `MemoryHost` is a cheap handle over a shared document. Clone it before
//! handing it to a root to keep inspecting the document and dispatching events.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::error::HostError;

use super::{Event, EventHandler, Host};

/// Unique identifier for a node in a [`MemoryHost`] document.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct NodeId {
    index: u32,
    generation: u32,
}

struct ElementData {
    tag: String,
    attributes: Vec<(String, String)>,
    class_name: Option<String>,
    style: Vec<(String, String)>,
    listeners: Vec<(String, EventHandler)>,
}

enum NodeKind {
    Element(ElementData),
    Text(String),
}

struct NodeEntry {
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

struct Slot {
    generation: u32,
    entry: Option<NodeEntry>,
}

#[derive(Default)]
struct Document {
    slots: Vec<Slot>,
    /// Free list of reusable slot indices
    free: Vec<u32>,
    live: usize,
}

impl Document {
    fn allocate(&mut self, kind: NodeKind) -> NodeId {
        let entry = NodeEntry {
            kind,
            parent: None,
            children: Vec::new(),
        };
        self.live += 1;

        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.entry = Some(entry);
            return NodeId {
                index,
                generation: slot.generation,
            };
        }

        let index = self.slots.len() as u32;
        self.slots.push(Slot {
            generation: 0,
            entry: Some(entry),
        });
        NodeId {
            index,
            generation: 0,
        }
    }

    fn get(&self, id: NodeId) -> Option<&NodeEntry> {
        self.slots
            .get(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.entry.as_ref())
    }

    fn get_mut(&mut self, id: NodeId) -> Option<&mut NodeEntry> {
        self.slots
            .get_mut(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.entry.as_mut())
    }

    fn element_mut(&mut self, id: NodeId) -> Result<&mut ElementData, HostError> {
        match self.get_mut(id) {
            Some(NodeEntry {
                kind: NodeKind::Element(data),
                ..
            }) => Ok(data),
            Some(_) => Err(HostError::NotAnElement),
            None => Err(HostError::StaleNode),
        }
    }

    fn element(&self, id: NodeId) -> Option<&ElementData> {
        match self.get(id) {
            Some(NodeEntry {
                kind: NodeKind::Element(data),
                ..
            }) => Some(data),
            _ => None,
        }
    }

    /// Free a node and all of its descendants.
    fn free_subtree(&mut self, root: NodeId) {
        let mut stack = vec![root];

        while let Some(id) = stack.pop() {
            let Some(slot) = self
                .slots
                .get_mut(id.index as usize)
                .filter(|slot| slot.generation == id.generation)
            else {
                continue;
            };

            if let Some(entry) = slot.entry.take() {
                slot.generation = slot.generation.wrapping_add(1);
                self.free.push(id.index);
                self.live -= 1;
                stack.extend(entry.children);
            }
        }
    }

    fn is_ancestor_or_self(&self, candidate: NodeId, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(id) = current {
            if id == candidate {
                return true;
            }
            current = self.get(id).and_then(|entry| entry.parent);
        }
        false
    }

    /// Descendants of `root` in document order, excluding `root`.
    fn descendants(&self, root: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = match self.get(root) {
            Some(entry) => entry.children.iter().rev().copied().collect(),
            None => return out,
        };

        while let Some(id) = stack.pop() {
            if let Some(entry) = self.get(id) {
                out.push(id);
                stack.extend(entry.children.iter().rev().copied());
            }
        }

        out
    }

    fn write_text_content(&self, id: NodeId, out: &mut String) {
        let Some(entry) = self.get(id) else {
            return;
        };
        match &entry.kind {
            NodeKind::Text(text) => out.push_str(text),
            NodeKind::Element(_) => {
                for child in &entry.children {
                    self.write_text_content(*child, out);
                }
            }
        }
    }

    fn write_html(&self, id: NodeId, out: &mut String) {
        let Some(entry) = self.get(id) else {
            return;
        };
        match &entry.kind {
            NodeKind::Text(text) => out.push_str(&escape_text(text)),
            NodeKind::Element(data) => {
                out.push('<');
                out.push_str(&data.tag);
                for (name, value) in &data.attributes {
                    out.push_str(&format!(" {}=\"{}\"", name, escape_attribute(value)));
                }
                if let Some(class) = &data.class_name {
                    out.push_str(&format!(" class=\"{}\"", escape_attribute(class)));
                }
                if !data.style.is_empty() {
                    let style = data
                        .style
                        .iter()
                        .map(|(property, value)| format!("{}: {};", property, value))
                        .collect::<Vec<_>>()
                        .join(" ");
                    out.push_str(&format!(" style=\"{}\"", escape_attribute(&style)));
                }
                out.push('>');
                for child in &entry.children {
                    self.write_html(*child, out);
                }
                out.push_str(&format!("</{}>", data.tag));
            }
        }
    }
}

/// Same acceptance rule for tag and attribute names: a letter, `_` or `:`
/// first, then no whitespace, control characters or markup delimiters.
fn is_valid_name(name: &str) -> bool {
    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    if !(first.is_alphabetic() || first == '_' || first == ':') {
        return false;
    }
    chars.all(|c| {
        !c.is_whitespace() && !c.is_control() && !matches!(c, '<' | '>' | '"' | '\'' | '/' | '=')
    })
}

fn escape_text(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

fn escape_attribute(value: &str) -> String {
    value.replace('&', "&amp;").replace('"', "&quot;")
}

/// In-memory [`Host`] implementation.
#[derive(Clone, Default)]
pub struct MemoryHost {
    doc: Rc<RefCell<Document>>,
}

impl MemoryHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a detached `div` with the given `id`, for use as a mount container.
    pub fn create_container(&self, id: &str) -> NodeId {
        let mut doc = self.doc.borrow_mut();
        doc.allocate(NodeKind::Element(ElementData {
            tag: "div".to_string(),
            attributes: vec![("id".to_string(), id.to_string())],
            class_name: None,
            style: Vec::new(),
            listeners: Vec::new(),
        }))
    }

    /// First live element whose `id` attribute equals `id`.
    pub fn get_element_by_id(&self, id: &str) -> Option<NodeId> {
        let doc = self.doc.borrow();
        doc.slots.iter().enumerate().find_map(|(index, slot)| {
            let entry = slot.entry.as_ref()?;
            let NodeKind::Element(data) = &entry.kind else {
                return None;
            };
            data.attributes
                .iter()
                .any(|(name, value)| name == "id" && value == id)
                .then_some(NodeId {
                    index: index as u32,
                    generation: slot.generation,
                })
        })
    }

    /// Whether `id` still refers to a live node.
    pub fn contains(&self, id: NodeId) -> bool {
        self.doc.borrow().get(id).is_some()
    }

    /// Number of live nodes in the document.
    pub fn node_count(&self) -> usize {
        self.doc.borrow().live
    }

    pub fn children(&self, id: NodeId) -> Vec<NodeId> {
        self.doc
            .borrow()
            .get(id)
            .map(|entry| entry.children.clone())
            .unwrap_or_default()
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.doc.borrow().get(id).and_then(|entry| entry.parent)
    }

    /// Tag of an element, `None` for text nodes and stale handles.
    pub fn tag(&self, id: NodeId) -> Option<String> {
        self.doc.borrow().element(id).map(|data| data.tag.clone())
    }

    /// Content of a text node, `None` for elements and stale handles.
    pub fn text(&self, id: NodeId) -> Option<String> {
        match self.doc.borrow().get(id).map(|entry| &entry.kind) {
            Some(NodeKind::Text(text)) => Some(text.clone()),
            _ => None,
        }
    }

    pub fn attribute(&self, id: NodeId, name: &str) -> Option<String> {
        self.doc.borrow().element(id).and_then(|data| {
            data.attributes
                .iter()
                .find(|(existing, _)| existing == name)
                .map(|(_, value)| value.clone())
        })
    }

    pub fn class_name(&self, id: NodeId) -> Option<String> {
        self.doc
            .borrow()
            .element(id)
            .and_then(|data| data.class_name.clone())
    }

    pub fn style(&self, id: NodeId, property: &str) -> Option<String> {
        self.doc.borrow().element(id).and_then(|data| {
            data.style
                .iter()
                .find(|(existing, _)| existing == property)
                .map(|(_, value)| value.clone())
        })
    }

    pub fn listener_count(&self, id: NodeId, event: &str) -> usize {
        self.doc.borrow().element(id).map_or(0, |data| {
            data.listeners
                .iter()
                .filter(|(name, _)| name == event)
                .count()
        })
    }

    /// Concatenated text of `id` and all of its descendants.
    pub fn text_content(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.doc.borrow().write_text_content(id, &mut out);
        out
    }

    /// Descendant elements of `root` with the given tag, in document order.
    pub fn find_by_tag(&self, root: NodeId, tag: &str) -> Vec<NodeId> {
        let doc = self.doc.borrow();
        doc.descendants(root)
            .into_iter()
            .filter(|id| doc.element(*id).is_some_and(|data| data.tag == tag))
            .collect()
    }

    /// First descendant text node of `root` whose content contains `needle`.
    pub fn find_text(&self, root: NodeId, needle: &str) -> Option<NodeId> {
        let doc = self.doc.borrow();
        doc.descendants(root).into_iter().find(|id| {
            matches!(
                doc.get(*id).map(|entry| &entry.kind),
                Some(NodeKind::Text(text)) if text.contains(needle)
            )
        })
    }

    /// Serialized markup of `id` itself and its subtree. Listeners are not serialized.
    pub fn to_html(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.doc.borrow().write_html(id, &mut out);
        out
    }

    /// Serialized markup of the children of `id`.
    pub fn inner_html(&self, id: NodeId) -> String {
        let doc = self.doc.borrow();
        let mut out = String::new();
        if let Some(entry) = doc.get(id) {
            for child in &entry.children {
                doc.write_html(*child, &mut out);
            }
        }
        out
    }

    /// Deliver an event to `target`, bubbling through its ancestors.
    ///
    /// Listeners are collected before any of them runs, so a listener that
    /// rebuilds the document does not affect which listeners fire. Returns the
    /// number of listeners invoked.
    pub fn dispatch(&self, target: NodeId, event: &str) -> usize {
        let handlers: Vec<EventHandler> = {
            let doc = self.doc.borrow();
            let mut handlers = Vec::new();
            let mut current = Some(target);
            while let Some(id) = current {
                let Some(entry) = doc.get(id) else {
                    break;
                };
                if let NodeKind::Element(data) = &entry.kind {
                    handlers.extend(
                        data.listeners
                            .iter()
                            .filter(|(name, _)| name == event)
                            .map(|(_, handler)| handler.clone()),
                    );
                }
                current = entry.parent;
            }
            handlers
        };

        if handlers.is_empty() {
            log::debug!("No listeners for {:?} on {:?}", event, target);
        }

        let event = Event::new(event);
        for handler in &handlers {
            handler(&event);
        }
        handlers.len()
    }
}

impl fmt::Debug for MemoryHost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryHost")
            .field("nodes", &self.node_count())
            .finish()
    }
}

impl Host for MemoryHost {
    type Handle = NodeId;

    fn create_element(&mut self, tag: &str) -> Result<NodeId, HostError> {
        if !is_valid_name(tag) {
            return Err(HostError::InvalidTagName(tag.to_string()));
        }
        Ok(self
            .doc
            .borrow_mut()
            .allocate(NodeKind::Element(ElementData {
                tag: tag.to_string(),
                attributes: Vec::new(),
                class_name: None,
                style: Vec::new(),
                listeners: Vec::new(),
            })))
    }

    fn create_text_node(&mut self, text: &str) -> NodeId {
        self.doc
            .borrow_mut()
            .allocate(NodeKind::Text(text.to_string()))
    }

    fn append_child(&mut self, parent: &NodeId, child: &NodeId) -> Result<(), HostError> {
        let mut doc = self.doc.borrow_mut();
        let (parent, child) = (*parent, *child);

        doc.element_mut(parent)?;
        let old_parent = doc.get(child).ok_or(HostError::StaleNode)?.parent;
        if doc.is_ancestor_or_self(child, parent) {
            return Err(HostError::HierarchyRequest);
        }

        // Appending moves the node, as in the DOM
        if let Some(old_parent) = old_parent {
            if let Some(entry) = doc.get_mut(old_parent) {
                entry.children.retain(|&c| c != child);
            }
        }

        if let Some(entry) = doc.get_mut(child) {
            entry.parent = Some(parent);
        }
        if let Some(entry) = doc.get_mut(parent) {
            entry.children.push(child);
        }
        Ok(())
    }

    fn remove_children(&mut self, container: &NodeId) -> Result<(), HostError> {
        let mut doc = self.doc.borrow_mut();
        let children = match doc.get_mut(*container) {
            Some(entry) => std::mem::take(&mut entry.children),
            None => return Err(HostError::StaleNode),
        };
        for child in children {
            doc.free_subtree(child);
        }
        Ok(())
    }

    fn set_attribute(&mut self, element: &NodeId, name: &str, value: &str) -> Result<(), HostError> {
        if !is_valid_name(name) {
            return Err(HostError::InvalidAttributeName(name.to_string()));
        }
        let mut doc = self.doc.borrow_mut();
        let data = doc.element_mut(*element)?;
        match data.attributes.iter_mut().find(|(existing, _)| existing == name) {
            Some(entry) => entry.1 = value.to_string(),
            None => data.attributes.push((name.to_string(), value.to_string())),
        }
        Ok(())
    }

    fn set_class_name(&mut self, element: &NodeId, class: &str) -> Result<(), HostError> {
        let mut doc = self.doc.borrow_mut();
        doc.element_mut(*element)?.class_name = Some(class.to_string());
        Ok(())
    }

    fn set_style(&mut self, element: &NodeId, property: &str, value: &str) -> Result<(), HostError> {
        let mut doc = self.doc.borrow_mut();
        let data = doc.element_mut(*element)?;
        match data.style.iter_mut().find(|(existing, _)| existing == property) {
            Some(entry) => entry.1 = value.to_string(),
            None => data.style.push((property.to_string(), value.to_string())),
        }
        Ok(())
    }

    fn add_event_listener(
        &mut self,
        element: &NodeId,
        event: &str,
        handler: EventHandler,
    ) -> Result<(), HostError> {
        let mut doc = self.doc.borrow_mut();
        doc.element_mut(*element)?
            .listeners
            .push((event.to_string(), handler));
        Ok(())
    }
}
