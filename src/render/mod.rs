//! Materialization of tree descriptions into host nodes.
//!
//! Rules, applied recursively:
//!
//! - Text and number nodes become host text nodes.
//! - Elements become host elements. Attributes are applied by name, except:
//!   - `on<event>` with a handler registers a listener for `<event>` lower-cased
//!   - `class` / `className` set the host class name
//!   - `style` with a style map sets each property on the host node
//! - Children are appended in order. Empty and boolean children are skipped,
//!   and a list of children is flattened into its parent. Lists inside lists
//!   are rejected.
//!
//! Each element is built completely before it is appended to its parent, but a
//! failure part-way through a pass leaves earlier siblings attached.

pub mod stats;

use crate::error::{HostError, RenderError};
use crate::host::Host;
use crate::node::{format_number, AttrValue, Element, Node};

pub use stats::{PassStats, StatsSnapshot};

/// Materialize `node` and append the result under `container`.
///
/// The container is not cleared first. A root-level list is flattened into the
/// container like the children of an element.
pub fn render_into<H: Host>(
    host: &mut H,
    container: &H::Handle,
    node: &Node,
) -> Result<PassStats, RenderError> {
    let mut materializer = Materializer {
        host,
        stats: PassStats::default(),
    };
    materializer.append(container, node, false)?;
    Ok(materializer.stats)
}

/// Replace the contents of `container` with a single `<tag>message</tag>`.
pub fn render_error_indicator<H: Host>(
    host: &mut H,
    container: &H::Handle,
    tag: &str,
    message: &str,
) -> Result<(), HostError> {
    host.remove_children(container)?;
    let element = host.create_element(tag)?;
    let text = host.create_text_node(message);
    host.append_child(&element, &text)?;
    host.append_child(container, &element)
}

/// Event name for an attribute, if the attribute names an event.
pub fn event_name(attribute: &str) -> Option<String> {
    attribute
        .strip_prefix("on")
        .filter(|rest| !rest.is_empty())
        .map(str::to_lowercase)
}

struct Materializer<'a, H: Host> {
    host: &'a mut H,
    stats: PassStats,
}

impl<H: Host> Materializer<'_, H> {
    fn append(&mut self, parent: &H::Handle, node: &Node, in_list: bool) -> Result<(), RenderError> {
        match node {
            Node::Element(element) => {
                let handle = self.build_element(element)?;
                self.host.append_child(parent, &handle)?;
            }
            Node::Text(text) => self.append_text(parent, text)?,
            Node::Int(n) => self.append_text(parent, &n.to_string())?,
            Node::Float(n) => self.append_text(parent, &format_number(*n))?,
            Node::Bool(_) | Node::Empty => self.stats.children_skipped += 1,
            Node::List(items) => {
                if in_list {
                    return Err(RenderError::NestedList);
                }
                for item in items {
                    self.append(parent, item, true)?;
                }
            }
        }
        Ok(())
    }

    fn append_text(&mut self, parent: &H::Handle, text: &str) -> Result<(), RenderError> {
        let handle = self.host.create_text_node(text);
        self.stats.text_nodes_created += 1;
        self.host.append_child(parent, &handle)?;
        Ok(())
    }

    fn build_element(&mut self, element: &Element) -> Result<H::Handle, RenderError> {
        let handle = self.host.create_element(element.tag())?;
        self.stats.elements_created += 1;

        for (name, value) in element.attrs() {
            self.apply_attr(&handle, name, value)?;
        }
        for child in element.child_nodes() {
            self.append(&handle, child, false)?;
        }

        Ok(handle)
    }

    fn apply_attr(
        &mut self,
        handle: &H::Handle,
        name: &str,
        value: &AttrValue,
    ) -> Result<(), RenderError> {
        match value {
            AttrValue::Handler(handler) => {
                let event = event_name(name)
                    .ok_or_else(|| RenderError::DetachedHandler(name.to_string()))?;
                self.host.add_event_listener(handle, &event, handler.clone())?;
                self.stats.listeners_attached += 1;
            }
            AttrValue::Text(class) if matches!(name, "class" | "className") => {
                self.host.set_class_name(handle, class)?;
            }
            AttrValue::Style(entries) if name == "style" => {
                for (property, value) in entries {
                    self.host.set_style(handle, property, value)?;
                }
            }
            AttrValue::Style(entries) => {
                let serialized = entries
                    .iter()
                    .map(|(property, value)| format!("{}: {};", property, value))
                    .collect::<Vec<_>>()
                    .join(" ");
                self.host.set_attribute(handle, name, &serialized)?;
            }
            AttrValue::Text(text) => self.host.set_attribute(handle, name, text)?,
            AttrValue::Number(n) => self.host.set_attribute(handle, name, &format_number(*n))?,
            AttrValue::Bool(true) => self.host.set_attribute(handle, name, "")?,
            AttrValue::Bool(false) => {}
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use super::*;
    use crate::host::MemoryHost;
    use crate::node::{element, text, IntoNode};

    fn render(node: impl IntoNode) -> (MemoryHost, crate::host::NodeId, Result<PassStats, RenderError>) {
        let mut host = MemoryHost::new();
        let root = host.create_container("root");
        let result = render_into(&mut host, &root, &node.into_node());
        (host, root, result)
    }

    #[test]
    fn test_text_and_numbers() {
        let (host, root, result) = render(vec![text("Count: "), 0_i32.into_node(), 2.5_f64.into_node()]);
        let stats = result.unwrap();
        assert_eq!(stats.text_nodes_created, 3);
        assert_eq!(host.inner_html(root), "Count: 02.5");
        assert_eq!(host.children(root).len(), 3);
    }

    #[test]
    fn test_nested_list_flattens_one_level() {
        let view = element("div")
            .child("a")
            .child(vec!["b", "c"]);
        let (host, root, result) = render(view);
        result.unwrap();

        let div = host.children(root)[0];
        let texts: Vec<_> = host
            .children(div)
            .into_iter()
            .filter_map(|id| host.text(id))
            .collect();
        assert_eq!(texts, ["a", "b", "c"]);
    }

    #[test]
    fn test_list_inside_list_is_rejected() {
        let view = element("div").child(vec![Node::Text("a".into()), vec!["b"].into_node()]);
        let (_, _, result) = render(view);
        assert!(matches!(result, Err(RenderError::NestedList)));
    }

    #[test]
    fn test_falsy_children_skipped_but_zero_kept() {
        let view = element("p")
            .child(false)
            .child(None::<&str>)
            .child(())
            .child(0)
            .child(true);
        let (host, root, result) = render(view);
        let stats = result.unwrap();

        let p = host.children(root)[0];
        assert_eq!(host.children(p).len(), 1);
        assert_eq!(host.text_content(p), "0");
        assert_eq!(stats.children_skipped, 4);
    }

    #[test]
    fn test_attribute_rules() {
        let view = element("input")
            .attr("type", "checkbox")
            .attr("tabindex", 2)
            .attr("checked", true)
            .attr("disabled", false)
            .class_name("toggle")
            .style("margin", "0")
            .attr("data-style", AttrValue::Style(vec![("a".into(), "b".into())]));
        let (host, root, result) = render(view);
        result.unwrap();

        let input = host.children(root)[0];
        assert_eq!(host.attribute(input, "type").as_deref(), Some("checkbox"));
        assert_eq!(host.attribute(input, "tabindex").as_deref(), Some("2"));
        assert_eq!(host.attribute(input, "checked").as_deref(), Some(""));
        assert_eq!(host.attribute(input, "disabled"), None);
        assert_eq!(host.attribute(input, "className"), None);
        assert_eq!(host.class_name(input).as_deref(), Some("toggle"));
        assert_eq!(host.style(input, "margin").as_deref(), Some("0"));
        assert_eq!(host.attribute(input, "data-style").as_deref(), Some("a: b;"));
    }

    #[test]
    fn test_event_names() {
        assert_eq!(event_name("onClick").as_deref(), Some("click"));
        assert_eq!(event_name("onclick").as_deref(), Some("click"));
        assert_eq!(event_name("onMouseDown").as_deref(), Some("mousedown"));
        assert_eq!(event_name("on"), None);
        assert_eq!(event_name("title"), None);
    }

    #[test]
    fn test_listeners_are_registered() {
        let clicks = Rc::new(Cell::new(0));
        let counter = clicks.clone();
        let view = element("button")
            .attr("onClick", AttrValue::handler(move |_| counter.set(counter.get() + 1)))
            .child("Increment");
        let (host, root, result) = render(view);
        assert_eq!(result.unwrap().listeners_attached, 1);

        let button = host.find_by_tag(root, "button")[0];
        assert_eq!(host.listener_count(button, "click"), 1);
        host.dispatch(button, "click");
        assert_eq!(clicks.get(), 1);
    }

    #[test]
    fn test_on_prefixed_text_is_plain_attribute() {
        let (host, root, result) = render(element("div").attr("one", "1"));
        result.unwrap();
        let div = host.children(root)[0];
        assert_eq!(host.attribute(div, "one").as_deref(), Some("1"));
    }

    #[test]
    fn test_handler_without_event_name_fails() {
        let view = element("div").attr("title", AttrValue::handler(|_| {}));
        let (_, _, result) = render(view);
        assert!(matches!(result, Err(RenderError::DetachedHandler(name)) if name == "title"));
    }

    #[test]
    fn test_host_errors_propagate() {
        let (_, _, result) = render(element("not a tag"));
        assert!(matches!(
            result,
            Err(RenderError::Host(HostError::InvalidTagName(_)))
        ));
    }

    #[test]
    fn test_error_indicator_replaces_content() {
        let (mut host, root, result) = render(crate::element!("p", "hello"));
        result.unwrap();

        render_error_indicator(&mut host, &root, "h1", "Error rendering app").unwrap();
        assert_eq!(host.inner_html(root), "<h1>Error rendering app</h1>");
    }
}
