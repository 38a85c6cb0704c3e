//! Host capabilities
//!
//! Traits the accessibility core consumes, and the [`Host`] bundle that
//! injects one implementation of each.

use std::rc::Rc;

use crate::{Document, DomError, EventSource, FrameScheduler, ManualScheduler, NodeId, TimerScheduler};

/// Resolve a stable identifier to a live element
pub trait ElementLookup {
    /// Find a connected element by its `id` attribute
    fn element_by_id(&self, id: &str) -> Option<NodeId>;
}

/// Element access and mutation
pub trait Dom: ElementLookup {
    /// The `<body>` element
    fn body(&self) -> NodeId;

    /// Create a detached element
    fn create_element(&self, tag: &str) -> NodeId;

    /// Append `child` to `parent`, detaching it from any previous parent
    fn append_child(&self, parent: NodeId, child: NodeId) -> Result<(), DomError>;

    /// Detach a node from its parent
    fn remove(&self, node: NodeId);

    /// Check if a node is attached to the document
    fn is_connected(&self, node: NodeId) -> bool;

    fn tag_name(&self, node: NodeId) -> Option<String>;

    fn attribute(&self, node: NodeId, name: &str) -> Option<String>;

    fn set_attribute(&self, node: NodeId, name: &str, value: &str);

    fn text_content(&self, node: NodeId) -> String;

    fn set_text_content(&self, node: NodeId, text: &str);

    /// Current form control value
    fn value(&self, node: NodeId) -> String;

    fn set_value(&self, node: NodeId, value: &str);

    /// Whether the node is inside a content-editable region
    fn is_content_editable(&self, node: NodeId) -> bool;

    /// Whether the node takes part in sequential focus navigation
    fn is_focusable(&self, node: NodeId) -> bool;

    /// Focusable descendants of `container` in document order
    fn focusable_descendants(&self, container: NodeId) -> Vec<NodeId>;

    /// Currently focused element (body when nothing else holds focus)
    fn active_element(&self) -> Option<NodeId>;

    /// Move focus to `node`
    fn focus(&self, node: NodeId) -> Result<(), DomError>;
}

/// Injected environment for the accessibility core
#[derive(Clone)]
pub struct Host {
    pub dom: Rc<dyn Dom>,
    pub events: Rc<dyn EventSource>,
    pub timers: Rc<dyn TimerScheduler>,
    pub frames: Rc<dyn FrameScheduler>,
}

impl Host {
    pub fn new(
        dom: Rc<dyn Dom>,
        events: Rc<dyn EventSource>,
        timers: Rc<dyn TimerScheduler>,
        frames: Rc<dyn FrameScheduler>,
    ) -> Self {
        Self { dom, events, timers, frames }
    }

    /// Wire an in-memory document and a manual scheduler together
    pub fn headless(document: Rc<Document>, scheduler: Rc<ManualScheduler>) -> Self {
        Self {
            dom: document.clone(),
            events: document,
            timers: scheduler.clone(),
            frames: scheduler,
        }
    }
}

impl std::fmt::Debug for Host {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Host").finish_non_exhaustive()
    }
}
