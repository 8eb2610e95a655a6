/// Build an [`Element`](crate::node::Element) from a tag and a list of
/// children.
///
/// ```ignore
/// element!("p", "Count: ", count)
/// ```
#[macro_export]
macro_rules! element {
    ($tag:expr $(, $child:expr)* $(,)?) => {{
        #[allow(unused_mut)]
        let mut element = $crate::node::Element::new($tag);
        $(
            element = element.child($child);
        )*
        element
    }};
}

extern crate self as slotview;

pub mod error;
pub mod host;
pub mod node;
pub mod reactive;
pub mod render;
pub mod root;

use host::Host;

pub use error::{HostError, MountError, RenderError, StateError};
pub use host::{Event, EventHandler, MemoryHost, NodeId};
pub use node::{AttrValue, Element, IntoNode, Node};
pub use reactive::{RenderContext, Setter, SlotId, State, StateScope};
pub use render::StatsSnapshot;
pub use root::{Root, RootFlags};
pub use slotview_macros::component;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod prelude {
    pub use crate::host::{Event, Host, MemoryHost, NodeId};
    pub use crate::node::{element, text, AttrValue, Element, IntoNode, Node};
    pub use crate::reactive::{RenderContext, Setter, State, StateScope};
    pub use crate::{component, element, App, AppConfig, Component, Root};
}

/// Something that can be rendered into a tree description.
///
/// Implemented for closures and functions taking a [`RenderContext`], and
/// generated by [`#[component]`](macro@component).
pub trait Component {
    fn render(&self, cx: &mut RenderContext) -> Node;
}

impl<F> Component for F
where
    F: Fn(&mut RenderContext) -> Node,
{
    fn render(&self, cx: &mut RenderContext) -> Node {
        self(cx)
    }
}

#[derive(Clone, Debug)]
pub struct AppConfig {
    /// Tag of the element shown in place of the app when rendering fails
    pub error_indicator_tag: String,
    pub error_indicator_text: String,
    /// Follow-up passes allowed for writes made while rendering
    pub max_rerenders: usize,
    /// Initialize `env_logger` in [`App::start`]
    pub init_logger: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            error_indicator_tag: "h1".to_string(),
            error_indicator_text: "Error rendering app - check console".to_string(),
            max_rerenders: 25,
            init_logger: true,
        }
    }
}

pub struct App {
    config: AppConfig,
}

impl App {
    pub fn new() -> Self {
        Self {
            config: AppConfig::default(),
        }
    }

    pub fn with_config(config: AppConfig) -> Self {
        Self { config }
    }

    pub fn error_indicator(mut self, tag: impl Into<String>, text: impl Into<String>) -> Self {
        self.config.error_indicator_tag = tag.into();
        self.config.error_indicator_text = text.into();
        self
    }

    pub fn max_rerenders(mut self, max_rerenders: usize) -> Self {
        self.config.max_rerenders = max_rerenders;
        self
    }

    pub fn init_logger(mut self, init_logger: bool) -> Self {
        self.config.init_logger = init_logger;
        self
    }

    /// Mount `component` into `container` and run the first render pass.
    ///
    /// A failed first pass is logged and replaced by the error indicator; the
    /// root is still returned so a later pass can recover.
    pub fn mount<H, C>(
        self,
        host: H,
        container: Option<H::Handle>,
        component: C,
    ) -> Result<Root<H>, MountError>
    where
        H: Host + 'static,
        C: Component + 'static,
    {
        self.mount_with(host, container, move |_| component)
    }

    /// Like [`mount`](Self::mount), but the component is built by `factory`,
    /// which can allocate [`State`] handles from the root's scope.
    ///
    /// ```ignore
    /// struct Counter {
    ///     count: State<i32>,
    /// }
    ///
    /// App::new().mount_with(host, container, |scope| Counter {
    ///     count: scope.create_state(0),
    /// })?;
    /// ```
    pub fn mount_with<H, C, F>(
        self,
        host: H,
        container: Option<H::Handle>,
        factory: F,
    ) -> Result<Root<H>, MountError>
    where
        H: Host + 'static,
        C: Component + 'static,
        F: FnOnce(&StateScope) -> C,
    {
        let Some(container) = container else {
            log::error!("No root element found");
            return Err(MountError::MissingContainer);
        };
        log::debug!("Root container found: {:?}", container);

        let root = Root::with_factory(host, container, self.config, factory);

        log::info!("Rendering app...");
        match root.render() {
            Ok(()) => log::info!("App rendered successfully"),
            Err(err) => {
                log::error!("Error rendering app: {}", err);
                root.show_error_indicator();
            }
        }

        Ok(root)
    }

    /// Initialize logging if configured, then [`mount`](Self::mount).
    ///
    /// Never fails: a missing container is logged and yields `None`.
    pub fn start<H, C>(self, host: H, container: Option<H::Handle>, component: C) -> Option<Root<H>>
    where
        H: Host + 'static,
        C: Component + 'static,
    {
        if self.config.init_logger {
            init_logging();
        }
        self.mount(host, container, component).ok()
    }
}

impl Default for App {
    fn default() -> Self {
        Self::new()
    }
}

fn init_logging() {
    // A logger may already be installed by the embedding program or a test.
    if env_logger::try_init().is_err() {
        log::debug!("Logger already initialized");
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::*;

    struct CaptureLogger;

    thread_local! {
        static CAPTURED: RefCell<Vec<String>> = const { RefCell::new(Vec::new()) };
    }

    impl log::Log for CaptureLogger {
        fn enabled(&self, _: &log::Metadata) -> bool {
            true
        }

        fn log(&self, record: &log::Record) {
            CAPTURED.with(|lines| lines.borrow_mut().push(record.args().to_string()));
        }

        fn flush(&self) {}
    }

    static LOGGER: CaptureLogger = CaptureLogger;

    /// Log lines emitted on this thread while `f` runs.
    fn capture_logs(f: impl FnOnce()) -> Vec<String> {
        if log::set_logger(&LOGGER).is_ok() {
            log::set_max_level(log::LevelFilter::Trace);
        }
        CAPTURED.with(|lines| lines.borrow_mut().clear());
        f();
        CAPTURED.with(|lines| lines.take())
    }

    fn greeting(_: &mut RenderContext) -> Node {
        element!("h1", "Hello, world!").into_node()
    }

    #[test]
    fn test_mount_renders_first_pass() {
        let host = MemoryHost::new();
        let container = host.create_container("root");

        let root = App::new()
            .init_logger(false)
            .mount(host.clone(), Some(container), greeting)
            .unwrap();

        assert!(root.is_mounted());
        assert_eq!(host.inner_html(container), "<h1>Hello, world!</h1>");
        assert_eq!(root.stats().passes, 1);
    }

    #[test]
    fn test_mount_without_container() {
        let host = MemoryHost::new();
        let result = App::new().mount(host.clone(), host.get_element_by_id("root"), greeting);
        assert!(matches!(result, Err(MountError::MissingContainer)));
    }

    #[test]
    fn test_custom_error_indicator() {
        let host = MemoryHost::new();
        let container = host.create_container("root");

        let root = App::new()
            .init_logger(false)
            .error_indicator("p", "broken")
            .mount(host.clone(), Some(container), |_: &mut RenderContext| {
                element!("bad tag").into_node()
            })
            .unwrap();

        assert!(root.has_failed());
        assert_eq!(host.inner_html(container), "<p>broken</p>");
    }

    #[test]
    fn test_mount_logs_progress() {
        let host = MemoryHost::new();
        let container = host.create_container("root");

        let lines = capture_logs(|| {
            App::new()
                .init_logger(false)
                .mount(host.clone(), Some(container), greeting)
                .unwrap();
        });

        let expected = [
            format!("Root container found: {:?}", container),
            "Rendering app...".to_string(),
            "App rendered successfully".to_string(),
        ];
        let progress: Vec<_> = lines
            .iter()
            .filter(|line| !line.starts_with("Rendered "))
            .cloned()
            .collect();
        assert_eq!(progress, expected);
    }

    #[test]
    fn test_missing_container_is_logged() {
        let host = MemoryHost::new();
        let lines = capture_logs(|| {
            let root = App::new().init_logger(false).start(host.clone(), None, greeting);
            assert!(root.is_none());
        });
        assert_eq!(lines, ["No root element found"]);
    }

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.error_indicator_tag, "h1");
        assert_eq!(config.error_indicator_text, "Error rendering app - check console");
        assert_eq!(config.max_rerenders, 25);
        assert!(config.init_logger);
    }
}
