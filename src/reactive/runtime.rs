use std::rc::Weak;

/// Something that can run a render pass in response to a state change.
pub(crate) trait Schedule {
    fn schedule(&self);
}

/// Link from a state handle back to the root that renders it.
///
/// Holds a weak reference so handles captured by event listeners do not keep
/// a root alive after it has been dropped.
#[derive(Clone, Default)]
pub(crate) struct RenderTrigger {
    target: Option<Weak<dyn Schedule>>,
}

impl RenderTrigger {
    pub(crate) fn new(target: Weak<dyn Schedule>) -> Self {
        Self {
            target: Some(target),
        }
    }

    /// Ask the root to render. Returns `false` if there is no live root.
    pub(crate) fn notify(&self) -> bool {
        match self.target.as_ref().and_then(Weak::upgrade) {
            Some(target) => {
                target.schedule();
                true
            }
            None => false,
        }
    }
}
