//! DOM Events
//!
//! Keyboard and form events plus the subscription surface.

use std::rc::Rc;

use crate::NodeId;

/// Event types observed by the core
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// Key pressed
    KeyDown,
    /// Continuous value edit (slider drag, typing)
    Input,
    /// Committed value change
    Change,
}

/// Held modifier keys
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Modifiers {
    pub ctrl: bool,
    pub alt: bool,
    pub shift: bool,
    pub meta: bool,
}

impl Modifiers {
    pub const NONE: Modifiers = Modifiers { ctrl: false, alt: false, shift: false, meta: false };

    pub fn ctrl(mut self) -> Self { self.ctrl = true; self }
    pub fn alt(mut self) -> Self { self.alt = true; self }
    pub fn shift(mut self) -> Self { self.shift = true; self }
    pub fn meta(mut self) -> Self { self.meta = true; self }
}

/// DOM event
#[derive(Debug, Clone)]
pub struct DomEvent {
    pub kind: EventKind,
    pub target: NodeId,
    /// Node whose listeners are running; None for document listeners
    pub current_target: Option<NodeId>,
    /// Key name for key events (`"a"`, `"Tab"`, `" "`), empty otherwise
    pub key: String,
    pub modifiers: Modifiers,
    /// Control value carried by input/change events
    pub value: Option<String>,
    default_prevented: bool,
    propagation_stopped: bool,
}

impl DomEvent {
    /// Create a key-down event
    pub fn key_down(target: NodeId, key: &str, modifiers: Modifiers) -> Self {
        Self {
            kind: EventKind::KeyDown,
            target,
            current_target: None,
            key: key.to_string(),
            modifiers,
            value: None,
            default_prevented: false,
            propagation_stopped: false,
        }
    }

    /// Create an input event
    pub fn input(target: NodeId, value: &str) -> Self {
        Self {
            kind: EventKind::Input,
            value: Some(value.to_string()),
            ..Self::key_down(target, "", Modifiers::NONE)
        }
    }

    /// Create a change event
    pub fn change(target: NodeId, value: &str) -> Self {
        Self {
            kind: EventKind::Change,
            value: Some(value.to_string()),
            ..Self::key_down(target, "", Modifiers::NONE)
        }
    }

    /// Suppress the default action
    pub fn prevent_default(&mut self) {
        self.default_prevented = true;
    }

    pub fn is_default_prevented(&self) -> bool {
        self.default_prevented
    }

    /// Stop bubbling after the current node
    pub fn stop_propagation(&mut self) {
        self.propagation_stopped = true;
    }

    pub fn is_propagation_stopped(&self) -> bool {
        self.propagation_stopped
    }
}

/// Where a listener is attached
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListenTarget {
    /// Document-wide, runs after the bubble path
    Document,
    /// A node; also sees events bubbling from its descendants
    Node(NodeId),
}

/// Unsubscribe handle returned by [`EventSource::add_listener`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(pub u64);

/// Event listener callback
pub type Listener = Rc<dyn Fn(&mut DomEvent)>;

/// Wrap a closure as a [`Listener`]
pub fn listener(f: impl Fn(&mut DomEvent) + 'static) -> Listener {
    Rc::new(f)
}

/// Event subscription surface
pub trait EventSource {
    /// Subscribe to `kind` events at `target`
    fn add_listener(&self, target: ListenTarget, kind: EventKind, listener: Listener) -> ListenerId;

    /// Unsubscribe; returns false if the id was not registered
    fn remove_listener(&self, id: ListenerId) -> bool;
}
