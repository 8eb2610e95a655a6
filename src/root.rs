//! A mounted component and its render loop.
//!
//! A [`Root`] ties a component to a host container. Rendering is a two-state
//! cycle: idle until something asks for a pass, then rendering synchronously
//! until the pass finishes. A pass:
//!
//! 1. creates a fresh [`RenderContext`] (cursor at zero),
//! 2. evaluates the component into a tree description,
//! 3. removes every child of the container,
//! 4. materializes the description into new host nodes.
//!
//! State writes made while a pass is running cannot interrupt it. They mark
//! the root as pending and a follow-up pass runs once the current one ends.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use bitflags::bitflags;

use crate::error::RenderError;
use crate::host::Host;
use crate::reactive::{RenderContext, RenderTrigger, Schedule, SlotId, StateScope, StateStore};
use crate::render::stats::RenderStats;
use crate::render::{render_error_indicator, render_into, StatsSnapshot};
use crate::{AppConfig, Component};

bitflags! {
    /// Lifecycle state of a root.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
    pub struct RootFlags: u8 {
        /// At least one pass has been requested and the root is not unmounted
        const MOUNTED   = 0b0001;
        /// A pass is running
        const RENDERING = 0b0010;
        /// State changed during the running pass
        const PENDING   = 0b0100;
        /// The last pass failed
        const FAILED    = 0b1000;
        /// The host is lent out through `Root::with_host`; passes wait for it
        const HOST_BORROWED = 0b1_0000;
    }
}

struct Shared<H: Host> {
    host: RefCell<H>,
    container: H::Handle,
    component: Box<dyn Component>,
    scope: StateScope,
    hooks: RefCell<Vec<SlotId>>,
    flags: Cell<RootFlags>,
    stats: RefCell<RenderStats>,
    config: AppConfig,
}

impl<H: Host + 'static> Shared<H> {
    fn insert_flags(&self, flags: RootFlags) {
        self.flags.set(self.flags.get() | flags);
    }

    fn remove_flags(&self, flags: RootFlags) {
        self.flags.set(self.flags.get() - flags);
    }

    fn render(&self) -> Result<(), RenderError> {
        let flags = self.flags.get();
        if flags.contains(RootFlags::RENDERING) {
            self.insert_flags(RootFlags::PENDING);
            return Ok(());
        }
        if flags.contains(RootFlags::HOST_BORROWED) {
            self.insert_flags(RootFlags::MOUNTED | RootFlags::PENDING);
            return Ok(());
        }

        self.insert_flags(RootFlags::MOUNTED);
        let mut rerenders = 0;

        loop {
            self.remove_flags(RootFlags::PENDING);
            self.insert_flags(RootFlags::RENDERING);
            let result = self.render_once();
            self.remove_flags(RootFlags::RENDERING);

            if let Err(err) = result {
                self.remove_flags(RootFlags::PENDING);
                self.insert_flags(RootFlags::FAILED);
                self.stats.borrow_mut().record_failure();
                return Err(err);
            }

            if !self.flags.get().contains(RootFlags::PENDING) {
                self.remove_flags(RootFlags::FAILED);
                return Ok(());
            }

            rerenders += 1;
            if rerenders > self.config.max_rerenders {
                self.remove_flags(RootFlags::PENDING);
                self.insert_flags(RootFlags::FAILED);
                self.stats.borrow_mut().record_failure();
                return Err(RenderError::TooManyRerenders(self.config.max_rerenders));
            }
            log::debug!("State changed during render; rendering again");
        }
    }

    fn render_once(&self) -> Result<(), RenderError> {
        let hooks = self.hooks.take();
        let mut cx = RenderContext::new(self.scope.clone(), hooks);
        let node = self.component.render(&mut cx);
        let reads = cx.cursor();
        *self.hooks.borrow_mut() = cx.into_hooks();

        let mut host = self.host.borrow_mut();
        host.remove_children(&self.container)?;
        let pass = render_into(&mut *host, &self.container, &node)?;
        drop(host);

        log::debug!(
            "Rendered {} elements, {} text nodes, {} listeners ({} state reads)",
            pass.elements_created,
            pass.text_nodes_created,
            pass.listeners_attached,
            reads
        );
        self.stats.borrow_mut().record_pass(pass);
        Ok(())
    }

    fn show_error_indicator(&self) {
        let mut host = self.host.borrow_mut();
        if let Err(err) = render_error_indicator(
            &mut *host,
            &self.container,
            &self.config.error_indicator_tag,
            &self.config.error_indicator_text,
        ) {
            log::error!("Failed to show error indicator: {}", err);
        }
    }
}

impl<H: Host + 'static> Schedule for Shared<H> {
    fn schedule(&self) {
        let flags = self.flags.get();
        if flags.contains(RootFlags::RENDERING) {
            self.insert_flags(RootFlags::PENDING);
            return;
        }
        if !flags.contains(RootFlags::MOUNTED) {
            log::debug!("State changed on a root that is not mounted; skipping render");
            return;
        }
        if flags.contains(RootFlags::HOST_BORROWED) {
            log::debug!("Host is borrowed; deferring render");
            self.insert_flags(RootFlags::PENDING);
            return;
        }

        if let Err(err) = self.render() {
            log::error!("Error rendering app: {}", err);
            self.show_error_indicator();
        }
    }
}

/// A component mounted into a host container.
pub struct Root<H: Host + 'static> {
    shared: Rc<Shared<H>>,
}

impl<H: Host + 'static> Root<H> {
    /// Create a root for `component`. Nothing is rendered until
    /// [`render`](Self::render) is called.
    pub fn new<C>(host: H, container: H::Handle, component: C, config: AppConfig) -> Self
    where
        C: Component + 'static,
    {
        Self::with_factory(host, container, config, move |_| component)
    }

    /// Create a root whose component is built by `factory`. The factory gets
    /// the root's [`StateScope`] so it can allocate [`State`](crate::State)
    /// handles up front.
    pub fn with_factory<C, F>(host: H, container: H::Handle, config: AppConfig, factory: F) -> Self
    where
        C: Component + 'static,
        F: FnOnce(&StateScope) -> C,
    {
        let shared = Rc::new_cyclic(|this: &Weak<Shared<H>>| {
            let target: Weak<dyn Schedule> = this.clone();
            let scope = StateScope::new(
                Rc::new(RefCell::new(StateStore::new())),
                RenderTrigger::new(target),
            );
            let component = factory(&scope);

            Shared {
                host: RefCell::new(host),
                container,
                component: Box::new(component),
                scope,
                hooks: RefCell::default(),
                flags: Cell::new(RootFlags::empty()),
                stats: RefCell::default(),
                config,
            }
        });

        Self { shared }
    }

    /// Run a render pass now, followed by any passes requested by state
    /// written during it.
    ///
    /// Errors are returned to the caller, which is expected to report them and
    /// usually calls [`show_error_indicator`](Self::show_error_indicator).
    /// State is left as-is, so a later pass can still succeed.
    pub fn render(&self) -> Result<(), RenderError> {
        self.shared.render()
    }

    /// Replace the container's content with the configured error indicator.
    pub fn show_error_indicator(&self) {
        self.shared.show_error_indicator();
    }

    /// Clear the container and stop rendering on state changes. A later
    /// [`render`](Self::render) mounts again with the existing state.
    pub fn unmount(&self) {
        self.shared
            .remove_flags(RootFlags::MOUNTED | RootFlags::PENDING);
        let mut host = self.shared.host.borrow_mut();
        if let Err(err) = host.remove_children(&self.shared.container) {
            log::warn!("Failed to clear container on unmount: {}", err);
        }
    }

    pub fn container(&self) -> H::Handle {
        self.shared.container.clone()
    }

    /// Access the host.
    ///
    /// State written while `f` runs, for example by listeners invoked through
    /// the host, is stored at once and rendered in one pass after `f` returns.
    ///
    /// # Panics
    /// If called again from inside `f`, or if `f` calls
    /// [`unmount`](Self::unmount) or
    /// [`show_error_indicator`](Self::show_error_indicator).
    pub fn with_host<R>(&self, f: impl FnOnce(&mut H) -> R) -> R {
        let shared = &self.shared;
        shared.insert_flags(RootFlags::HOST_BORROWED);
        let result = f(&mut shared.host.borrow_mut());
        shared.remove_flags(RootFlags::HOST_BORROWED);

        let flags = shared.flags.get();
        if flags.contains(RootFlags::PENDING) && !flags.contains(RootFlags::RENDERING) {
            shared.remove_flags(RootFlags::PENDING);
            shared.schedule();
        }
        result
    }

    pub fn scope(&self) -> StateScope {
        self.shared.scope.clone()
    }

    pub fn flags(&self) -> RootFlags {
        self.shared.flags.get()
    }

    pub fn is_mounted(&self) -> bool {
        self.flags().contains(RootFlags::MOUNTED)
    }

    pub fn has_failed(&self) -> bool {
        self.flags().contains(RootFlags::FAILED)
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.shared.stats.borrow().snapshot()
    }

    /// Number of positional state slots claimed by the component.
    pub fn hook_count(&self) -> usize {
        self.shared.hooks.borrow().len()
    }

    pub fn config(&self) -> &AppConfig {
        &self.shared.config
    }
}

impl<H: Host + 'static> Clone for Root<H> {
    fn clone(&self) -> Self {
        Self {
            shared: self.shared.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::MemoryHost;
    use crate::node::{element, IntoNode, Node};
    use crate::element;

    fn counter(cx: &mut RenderContext) -> Node {
        let (count, set_count) = cx.use_state(0);
        element("div")
            .child(element!("p", "Count: ", count))
            .child(element!("button", "Increment").on("click", move |_| set_count.update(|c| c + 1)))
            .into_node()
    }

    fn mount(component: impl Component + 'static) -> (MemoryHost, Root<MemoryHost>) {
        let host = MemoryHost::new();
        let container = host.create_container("root");
        let root = Root::new(host.clone(), container, component, AppConfig::default());
        (host, root)
    }

    #[test]
    fn test_not_rendered_until_requested() {
        let (host, root) = mount(counter);
        assert!(!root.is_mounted());
        assert!(host.children(root.container()).is_empty());

        root.render().unwrap();
        assert!(root.is_mounted());
        assert_eq!(host.text_content(root.container()), "Count: 0Increment");
        assert_eq!(root.hook_count(), 1);
    }

    #[test]
    fn test_click_rerenders() {
        let (host, root) = mount(counter);
        root.render().unwrap();

        let button = host.find_by_tag(root.container(), "button")[0];
        host.dispatch(button, "click");

        assert!(host.text_content(root.container()).contains("Count: 1"));
        assert!(!host.contains(button));
        assert_eq!(root.stats().passes, 2);
    }

    #[test]
    fn test_write_during_render_runs_one_follow_up_pass() {
        fn settle(cx: &mut RenderContext) -> Node {
            let (loaded, set_loaded) = cx.use_state(false);
            if !loaded {
                set_loaded.set(true);
            }
            element!("p", if loaded { "loaded" } else { "loading..." }).into_node()
        }

        let (host, root) = mount(settle);
        root.render().unwrap();

        assert_eq!(host.text_content(root.container()), "loaded");
        assert_eq!(root.stats().passes, 2);
        assert!(!root.flags().contains(RootFlags::PENDING));
    }

    #[test]
    fn test_endless_writes_hit_rerender_limit() {
        fn runaway(cx: &mut RenderContext) -> Node {
            let (n, set_n) = cx.use_state(0_u32);
            set_n.set(n + 1);
            Node::Int(i64::from(n))
        }

        let host = MemoryHost::new();
        let container = host.create_container("root");
        let config = AppConfig {
            max_rerenders: 3,
            ..AppConfig::default()
        };
        let root = Root::new(host, container, runaway, config);

        let result = root.render();
        assert!(matches!(result, Err(RenderError::TooManyRerenders(3))));
        assert!(root.has_failed());
        assert_eq!(root.stats().failed_passes, 1);
    }

    #[test]
    fn test_failed_setter_pass_shows_indicator() {
        fn fragile(cx: &mut RenderContext) -> Node {
            let (broken, set_broken) = cx.use_state(false);
            let tag = if broken { "not valid" } else { "button" };
            element(tag)
                .on("click", move |_| set_broken.set(true))
                .into_node()
        }

        let (host, root) = mount(fragile);
        root.render().unwrap();

        let button = host.find_by_tag(root.container(), "button")[0];
        host.dispatch(button, "click");

        assert!(root.has_failed());
        assert_eq!(
            host.inner_html(root.container()),
            "<h1>Error rendering app - check console</h1>"
        );
    }

    #[test]
    fn test_unmount_stops_rendering() {
        let (host, root) = mount(counter);
        root.render().unwrap();
        let button = host.find_by_tag(root.container(), "button")[0];

        root.unmount();
        assert!(!root.is_mounted());
        assert!(host.children(root.container()).is_empty());
        assert!(!host.contains(button));

        root.render().unwrap();
        assert_eq!(host.text_content(root.container()), "Count: 0Increment");
    }

    #[test]
    fn test_explicit_state_handles() {
        struct Toggle {
            on: crate::State<bool>,
        }

        impl Component for Toggle {
            fn render(&self, _cx: &mut RenderContext) -> Node {
                let on = self.on.clone();
                element("button")
                    .child(if self.on.get() { "on" } else { "off" })
                    .on("click", move |_| on.update(|v| !v))
                    .into_node()
            }
        }

        let host = MemoryHost::new();
        let container = host.create_container("root");
        let root = Root::with_factory(host.clone(), container, AppConfig::default(), |scope| {
            Toggle {
                on: scope.create_state(false),
            }
        });
        root.render().unwrap();
        assert_eq!(host.text_content(container), "off");

        let button = host.find_by_tag(container, "button")[0];
        host.dispatch(button, "click");
        assert_eq!(host.text_content(container), "on");
        assert_eq!(root.hook_count(), 0);
        assert_eq!(root.scope().slot_count(), 1);
    }

    #[test]
    fn test_writes_before_mount_do_not_render() {
        let host = MemoryHost::new();
        let container = host.create_container("root");
        let mut handle = None;
        let root = Root::with_factory(host.clone(), container, AppConfig::default(), |scope| {
            let count = scope.create_state(0);
            handle = Some(count.clone());
            move |_: &mut RenderContext| Node::Int(i64::from(count.get()))
        });

        let handle = handle.unwrap();
        handle.set(5);
        assert_eq!(root.stats().passes, 0);

        root.render().unwrap();
        assert_eq!(host.text_content(container), "5");
    }

    #[test]
    fn test_dispatch_through_owned_host() {
        let host = MemoryHost::new();
        let container = host.create_container("root");
        let root = Root::new(host, container, counter, AppConfig::default());
        root.render().unwrap();

        let invoked = root.with_host(|host| {
            let button = host.find_by_tag(container, "button")[0];
            host.dispatch(button, "click")
        });

        assert_eq!(invoked, 1);
        assert_eq!(root.stats().passes, 2);
        assert!(!root.flags().intersects(RootFlags::PENDING | RootFlags::HOST_BORROWED));
        assert_eq!(
            root.with_host(|host| host.text_content(container)),
            "Count: 1Increment"
        );
    }

    #[test]
    fn test_writes_under_borrowed_host_render_once() {
        let host = MemoryHost::new();
        let container = host.create_container("root");
        let root = Root::new(host, container, counter, AppConfig::default());
        root.render().unwrap();

        root.with_host(|host| {
            for _ in 0..3 {
                let button = host.find_by_tag(container, "button")[0];
                host.dispatch(button, "click");
            }
            assert_eq!(host.text_content(container), "Count: 0Increment");
        });

        assert_eq!(root.stats().passes, 2);
        assert_eq!(
            root.with_host(|host| host.text_content(container)),
            "Count: 3Increment"
        );
    }

    #[test]
    fn test_dropped_root_ignores_writes() {
        let (host, root) = mount(counter);
        root.render().unwrap();
        let button = host.find_by_tag(root.container(), "button")[0];
        drop(root);

        // The listener still holds a setter, but the root is gone
        assert_eq!(host.dispatch(button, "click"), 1);
        assert!(host.contains(button));
    }
}
