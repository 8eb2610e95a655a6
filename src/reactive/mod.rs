//! Component state.
//!
//! State values live in a [`StateStore`] owned by each mounted root. Components
//! reach them in one of two ways:
//!
//! - **Hooks**: [`RenderContext::use_state`] addresses slots by the order of
//!   calls within a render pass.
//! - **Handles**: [`StateScope::create_state`] returns a [`State`] that names
//!   its slot directly and can be stored in a component value.
//!
//! Writing a new value through a [`Setter`] or [`State`] performs a full render
//! pass of the owning root before the write returns.

pub mod hooks;
pub(crate) mod runtime;
pub mod state;
pub mod store;

pub use hooks::RenderContext;
pub(crate) use runtime::{RenderTrigger, Schedule};
pub use state::{Setter, State, StateScope};
pub use store::{SlotId, StateStore};
