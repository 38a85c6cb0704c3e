//! simkit DOM - headless host for the accessibility core
//!
//! Arena-backed document model, event dispatch and deterministic
//! schedulers. The core never talks to a browser directly: it receives a
//! [`Host`] bundle and drives everything through the capability traits
//! defined here.
//!
//! Features:
//! - Element lookup by id, attributes, values, text content
//! - Focus tracking and sequential (Tab) focus navigation
//! - Bubbling key/input/change events with unsubscribe handles
//! - Manually advanced clock for timers and animation frames
//! - Number parsing and printing shared by range inputs and bindings

mod document;
mod events;
mod host;
mod node;
mod number;
mod scheduler;

pub use document::Document;
pub use events::{listener, DomEvent, EventKind, EventSource, ListenTarget, Listener, ListenerId, Modifiers};
pub use host::{Dom, ElementLookup, Host};
pub use node::{ElementData, Node};
pub use number::{format_number, parse_float, range_bounds};
pub use scheduler::{
    Clock, FrameCallback, FrameHandle, FrameScheduler, ManualScheduler, TimerCallback,
    TimerHandle, TimerScheduler,
};

/// Node identifier (index into arena)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) u32);

impl NodeId {
    /// Sentinel for "no node"
    pub const NONE: NodeId = NodeId(u32::MAX);

    /// Check if this is a real node id
    #[inline]
    pub fn is_valid(&self) -> bool {
        *self != Self::NONE
    }

    #[inline]
    pub(crate) fn index(&self) -> usize {
        self.0 as usize
    }
}

/// DOM error
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DomError {
    #[error("Unknown node {0:?}")]
    UnknownNode(NodeId),

    #[error("Node {0:?} is not attached to the document")]
    Detached(NodeId),

    #[error("Node {0:?} cannot be inserted into its own subtree")]
    HierarchyRequest(NodeId),
}
