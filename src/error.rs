use thiserror::Error;

use crate::reactive::SlotId;

/// Failures reported by a [`Host`](crate::host::Host) primitive.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HostError {
    #[error("invalid tag name: {0:?}")]
    InvalidTagName(String),
    #[error("invalid attribute name: {0:?}")]
    InvalidAttributeName(String),
    #[error("node handle is stale or was never created")]
    StaleNode,
    #[error("operation requires an element but the node is a text node")]
    NotAnElement,
    #[error("a node cannot be appended inside itself or its descendants")]
    HierarchyRequest,
}

/// Failures reported by the [`StateStore`](crate::reactive::StateStore).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StateError {
    #[error("state slot {0:?} was removed")]
    StaleSlot(SlotId),
    #[error("state slot {slot:?} does not hold a value of type {expected}")]
    TypeMismatch {
        slot: SlotId,
        expected: &'static str,
    },
}

/// Failures raised while materializing a tree description.
#[derive(Error, Debug)]
pub enum RenderError {
    #[error(transparent)]
    Host(#[from] HostError),
    #[error("attribute {0:?} holds an event handler but is not an `on*` event name")]
    DetachedHandler(String),
    #[error("child lists may only be nested one level deep")]
    NestedList,
    #[error("state kept changing after {0} consecutive re-renders")]
    TooManyRerenders(usize),
}

/// Failures raised while mounting a component.
#[derive(Error, Debug)]
pub enum MountError {
    #[error("no root container was found")]
    MissingContainer,
}
