//! Document - in-memory DOM with focus and event dispatch
//!
//! Interior mutability throughout so listeners may re-enter the document
//! while an event is being dispatched.

use std::cell::{Cell, RefCell};

use crate::events::{DomEvent, EventKind, EventSource, ListenTarget, Listener, ListenerId, Modifiers};
#[cfg(test)]
use crate::events::listener;
use crate::host::{Dom, ElementLookup};
use crate::node::{ElementData, Node};
use crate::number::{format_number, range_bounds};
use crate::{DomError, NodeId};

struct RegisteredListener {
    id: ListenerId,
    target: ListenTarget,
    kind: EventKind,
    listener: Listener,
}

/// HTML document
pub struct Document {
    nodes: RefCell<Vec<Node>>,
    html_element: NodeId,
    head_element: NodeId,
    body_element: NodeId,
    active: Cell<NodeId>,
    listeners: RefCell<Vec<RegisteredListener>>,
    next_listener: Cell<u64>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// Create a document with `html > head, body`
    pub fn new() -> Self {
        let doc = Self {
            nodes: RefCell::new(Vec::new()),
            html_element: NodeId(0),
            head_element: NodeId(1),
            body_element: NodeId(2),
            active: Cell::new(NodeId::NONE),
            listeners: RefCell::new(Vec::new()),
            next_listener: Cell::new(1),
        };

        let html = doc.create_element("html");
        let head = doc.create_element("head");
        let body = doc.create_element("body");
        // Fresh arena: these ids always exist
        let _ = doc.append_child(html, head);
        let _ = doc.append_child(html, body);

        doc
    }

    /// The `<html>` element
    pub fn document_element(&self) -> NodeId {
        self.html_element
    }

    /// The `<head>` element
    pub fn head(&self) -> NodeId {
        self.head_element
    }

    /// Create an element with attributes and append it to `parent`
    pub fn append_element(&self, parent: NodeId, tag: &str, attrs: &[(&str, &str)]) -> NodeId {
        let node = self.create_element(tag);
        for (name, value) in attrs {
            self.set_attribute(node, name, value);
        }
        if let Err(err) = self.append_child(parent, node) {
            tracing::warn!(%err, tag, "append_element on unknown parent");
        }
        node
    }

    /// Children of a node in document order
    pub fn children(&self, node: NodeId) -> Vec<NodeId> {
        self.nodes
            .borrow()
            .get(node.index())
            .map(|n| n.children.clone())
            .unwrap_or_default()
    }

    /// Number of nodes ever created
    pub fn len(&self) -> usize {
        self.nodes.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.borrow().is_empty()
    }

    /// Number of registered listeners
    pub fn listener_count(&self) -> usize {
        self.listeners.borrow().len()
    }

    /// Clear focus; the body becomes the active element
    pub fn blur(&self) {
        self.active.set(NodeId::NONE);
    }

    // === Event dispatch ===

    /// Dispatch an event along the target's ancestor path, then to
    /// document listeners. Returns the event after all listeners ran.
    pub fn dispatch_event(&self, mut event: DomEvent) -> DomEvent {
        let path = self.ancestor_path(event.target);

        for node in path {
            event.current_target = Some(node);
            self.invoke(ListenTarget::Node(node), &mut event);
            if event.is_propagation_stopped() {
                return event;
            }
        }

        event.current_target = None;
        self.invoke(ListenTarget::Document, &mut event);
        event
    }

    /// Press a key on the focused element
    pub fn key_down(&self, key: &str, modifiers: Modifiers) -> DomEvent {
        let target = self.active_element().unwrap_or(self.body_element);
        self.dispatch_event(DomEvent::key_down(target, key, modifiers))
    }

    /// Press Tab; unless a listener prevents it, move focus sequentially
    pub fn press_tab(&self, shift: bool) -> DomEvent {
        let modifiers = if shift { Modifiers::NONE.shift() } else { Modifiers::NONE };
        let event = self.key_down("Tab", modifiers);
        if !event.is_default_prevented() {
            self.sequential_focus(shift);
        }
        event
    }

    /// Edit a control's value and fire `input`
    pub fn type_input(&self, node: NodeId, value: &str) -> DomEvent {
        self.set_value(node, value);
        let value = self.value(node);
        self.dispatch_event(DomEvent::input(node, &value))
    }

    /// Commit a control's value and fire `change`
    pub fn commit_change(&self, node: NodeId, value: &str) -> DomEvent {
        self.set_value(node, value);
        let value = self.value(node);
        self.dispatch_event(DomEvent::change(node, &value))
    }

    fn invoke(&self, target: ListenTarget, event: &mut DomEvent) {
        let snapshot: Vec<(ListenerId, Listener)> = self
            .listeners
            .borrow()
            .iter()
            .filter(|l| l.target == target && l.kind == event.kind)
            .map(|l| (l.id, l.listener.clone()))
            .collect();

        for (id, listener) in snapshot {
            // Listeners removed by an earlier listener must not run
            let still_registered = self.listeners.borrow().iter().any(|l| l.id == id);
            if still_registered {
                listener(&mut *event);
            }
        }
    }

    fn sequential_focus(&self, backwards: bool) {
        let order = self.focusable_descendants(self.html_element);
        if order.is_empty() {
            return;
        }

        let current = self.active_element().and_then(|a| order.iter().position(|&n| n == a));
        let next = match (current, backwards) {
            (Some(0), true) | (None, true) => order.len() - 1,
            (Some(p), true) => p - 1,
            (Some(p), false) if p + 1 < order.len() => p + 1,
            _ => 0,
        };
        self.active.set(order[next]);
    }

    // === Tree helpers ===

    fn ancestor_path(&self, node: NodeId) -> Vec<NodeId> {
        let nodes = self.nodes.borrow();
        let mut path = Vec::new();
        let mut current = node;
        while let Some(n) = nodes.get(current.index()) {
            path.push(current);
            current = n.parent;
        }
        path
    }

    fn descendants(&self, root: NodeId) -> Vec<NodeId> {
        let nodes = self.nodes.borrow();
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = match nodes.get(root.index()) {
            Some(n) => n.children.iter().rev().copied().collect(),
            None => return out,
        };
        while let Some(id) = stack.pop() {
            out.push(id);
            if let Some(n) = nodes.get(id.index()) {
                stack.extend(n.children.iter().rev().copied());
            }
        }
        out
    }

    fn with_data<R>(&self, node: NodeId, f: impl FnOnce(&ElementData) -> R) -> Option<R> {
        self.nodes.borrow().get(node.index()).map(|n| f(&n.data))
    }

    fn with_data_mut<R>(&self, node: NodeId, f: impl FnOnce(&mut ElementData) -> R) -> Option<R> {
        self.nodes.borrow_mut().get_mut(node.index()).map(|n| f(&mut n.data))
    }
}

/// Range inputs keep their value inside `[min, max]` like a browser does;
/// a missing or unparsable value reads as the midpoint
fn sanitize_range_value(data: &ElementData, raw: &str) -> String {
    let (min, max) = range_bounds(data.attr("min"), data.attr("max"));

    match raw.trim().parse::<f64>() {
        Ok(v) if v.is_finite() && v >= min && v <= max => raw.trim().to_string(),
        Ok(v) if v.is_finite() => format_number(v.clamp(min, max)),
        _ => format_number(min + (max - min) / 2.0),
    }
}

impl ElementLookup for Document {
    fn element_by_id(&self, id: &str) -> Option<NodeId> {
        self.descendants(self.html_element)
            .into_iter()
            .find(|&node| self.with_data(node, |d| d.id() == Some(id)).unwrap_or(false))
    }
}

impl Dom for Document {
    fn body(&self) -> NodeId {
        self.body_element
    }

    fn create_element(&self, tag: &str) -> NodeId {
        let mut nodes = self.nodes.borrow_mut();
        let id = NodeId(nodes.len() as u32);
        nodes.push(Node::element(tag));
        id
    }

    fn append_child(&self, parent: NodeId, child: NodeId) -> Result<(), DomError> {
        let mut nodes = self.nodes.borrow_mut();
        if nodes.get(parent.index()).is_none() {
            return Err(DomError::UnknownNode(parent));
        }
        let mut ancestor = parent;
        while let Some(n) = nodes.get(ancestor.index()) {
            if ancestor == child {
                return Err(DomError::HierarchyRequest(child));
            }
            ancestor = n.parent;
        }
        let old_parent = match nodes.get(child.index()) {
            Some(n) => n.parent,
            None => return Err(DomError::UnknownNode(child)),
        };
        if let Some(old) = nodes.get_mut(old_parent.index()) {
            old.children.retain(|&c| c != child);
        }
        nodes[parent.index()].children.push(child);
        nodes[child.index()].parent = parent;
        Ok(())
    }

    fn remove(&self, node: NodeId) {
        let mut nodes = self.nodes.borrow_mut();
        let parent = match nodes.get_mut(node.index()) {
            Some(n) => std::mem::replace(&mut n.parent, NodeId::NONE),
            None => return,
        };
        if let Some(p) = nodes.get_mut(parent.index()) {
            p.children.retain(|&c| c != node);
        }
    }

    fn is_connected(&self, node: NodeId) -> bool {
        self.ancestor_path(node).last() == Some(&self.html_element)
    }

    fn tag_name(&self, node: NodeId) -> Option<String> {
        self.with_data(node, |d| d.tag.clone())
    }

    fn attribute(&self, node: NodeId, name: &str) -> Option<String> {
        self.with_data(node, |d| d.attr(name).map(str::to_string)).flatten()
    }

    fn set_attribute(&self, node: NodeId, name: &str, value: &str) {
        self.with_data_mut(node, |d| d.set_attr(name, value));
    }

    fn text_content(&self, node: NodeId) -> String {
        self.with_data(node, |d| d.text.clone()).unwrap_or_default()
    }

    fn set_text_content(&self, node: NodeId, text: &str) {
        self.with_data_mut(node, |d| d.text = text.to_string());
    }

    fn value(&self, node: NodeId) -> String {
        self.with_data(node, |d| {
            if d.is_range_input() {
                sanitize_range_value(d, d.current_value())
            } else {
                d.current_value().to_string()
            }
        })
        .unwrap_or_default()
    }

    fn set_value(&self, node: NodeId, value: &str) {
        self.with_data_mut(node, |d| {
            let value = if d.is_range_input() {
                sanitize_range_value(d, value)
            } else {
                value.to_string()
            };
            d.value = Some(value);
        });
    }

    fn is_content_editable(&self, node: NodeId) -> bool {
        for id in self.ancestor_path(node) {
            match self.attribute(id, "contenteditable").as_deref() {
                Some("false") => return false,
                Some(_) => return true,
                None => {}
            }
        }
        false
    }

    fn is_focusable(&self, node: NodeId) -> bool {
        self.with_data(node, |d| d.is_focusable()).unwrap_or(false)
    }

    fn focusable_descendants(&self, container: NodeId) -> Vec<NodeId> {
        self.descendants(container)
            .into_iter()
            .filter(|&node| self.is_focusable(node))
            .collect()
    }

    fn active_element(&self) -> Option<NodeId> {
        let active = self.active.get();
        if active.is_valid() && self.is_connected(active) {
            Some(active)
        } else if self.body_element.index() < self.len() {
            Some(self.body_element)
        } else {
            None
        }
    }

    /// Any connected element accepts programmatic focus here; the
    /// focusable predicate only governs Tab order.
    fn focus(&self, node: NodeId) -> Result<(), DomError> {
        if node.index() >= self.len() {
            return Err(DomError::UnknownNode(node));
        }
        if !self.is_connected(node) {
            return Err(DomError::Detached(node));
        }
        self.active.set(node);
        Ok(())
    }
}

impl EventSource for Document {
    fn add_listener(&self, target: ListenTarget, kind: EventKind, listener: Listener) -> ListenerId {
        let id = ListenerId(self.next_listener.get());
        self.next_listener.set(id.0 + 1);
        self.listeners.borrow_mut().push(RegisteredListener { id, target, kind, listener });
        id
    }

    fn remove_listener(&self, id: ListenerId) -> bool {
        let mut listeners = self.listeners.borrow_mut();
        let before = listeners.len();
        listeners.retain(|l| l.id != id);
        listeners.len() != before
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::rc::Rc;

    #[test]
    fn test_document_structure() {
        let doc = Document::new();
        assert_eq!(doc.len(), 3);
        assert_eq!(doc.children(doc.document_element()), vec![doc.head(), doc.body()]);
        assert!(doc.is_connected(doc.body()));
        assert_eq!(doc.active_element(), Some(doc.body()));
    }

    #[test]
    fn test_element_by_id_ignores_detached() {
        let doc = Document::new();
        let el = doc.append_element(doc.body(), "div", &[("id", "panel")]);
        assert_eq!(doc.element_by_id("panel"), Some(el));

        doc.remove(el);
        assert_eq!(doc.element_by_id("panel"), None);
        assert!(!doc.is_connected(el));
    }

    #[test]
    fn test_range_value_sanitized() {
        let doc = Document::new();
        let range = doc.append_element(
            doc.body(),
            "input",
            &[("type", "range"), ("min", "0"), ("max", "10")],
        );

        doc.set_value(range, "15");
        assert_eq!(doc.value(range), "10");
        doc.set_value(range, "abc");
        assert_eq!(doc.value(range), "5");
        doc.set_value(range, "3");
        assert_eq!(doc.value(range), "3");
    }

    #[test]
    fn test_range_without_value_reads_midpoint() {
        let doc = Document::new();
        let plain = doc.append_element(doc.body(), "input", &[("type", "range")]);
        let bounded = doc.append_element(doc.body(), "input", &[("type", "range"), ("min", "5px"), ("max", "15")]);
        let outside = doc.append_element(doc.body(), "input", &[("type", "range"), ("value", "150")]);

        assert_eq!(doc.value(plain), "50");
        assert_eq!(doc.value(bounded), "10");
        assert_eq!(doc.value(outside), "100");
    }

    #[test]
    fn test_event_bubbles_to_document() {
        let doc = Document::new();
        let form = doc.append_element(doc.body(), "form", &[]);
        let input = doc.append_element(form, "input", &[]);
        let log = Rc::new(RefCell::new(Vec::new()));

        let l = log.clone();
        doc.add_listener(ListenTarget::Document, EventKind::Input, listener(move |_| l.borrow_mut().push("document")));
        let l = log.clone();
        doc.add_listener(ListenTarget::Node(form), EventKind::Input, listener(move |_| l.borrow_mut().push("form")));
        let l = log.clone();
        doc.add_listener(ListenTarget::Node(input), EventKind::Input, listener(move |_| l.borrow_mut().push("input")));

        doc.type_input(input, "x");
        assert_eq!(*log.borrow(), vec!["input", "form", "document"]);
    }

    #[test]
    fn test_stop_propagation() {
        let doc = Document::new();
        let button = doc.append_element(doc.body(), "button", &[]);
        let reached = Rc::new(Cell::new(false));

        doc.add_listener(ListenTarget::Node(button), EventKind::KeyDown, listener(|e| e.stop_propagation()));
        let r = reached.clone();
        doc.add_listener(ListenTarget::Document, EventKind::KeyDown, listener(move |_| r.set(true)));

        doc.focus(button).unwrap();
        doc.key_down("a", Modifiers::NONE);
        assert!(!reached.get());
    }

    #[test]
    fn test_listener_removed_mid_dispatch_does_not_run() {
        let doc = Rc::new(Document::new());
        let second_ran = Rc::new(Cell::new(false));
        let second_id = Rc::new(Cell::new(ListenerId(0)));

        let (d, id) = (doc.clone(), second_id.clone());
        doc.add_listener(ListenTarget::Document, EventKind::KeyDown, listener(move |_| {
            d.remove_listener(id.get());
        }));
        let r = second_ran.clone();
        second_id.set(doc.add_listener(ListenTarget::Document, EventKind::KeyDown, listener(move |_| r.set(true))));

        doc.key_down("x", Modifiers::NONE);
        assert!(!second_ran.get());
        assert_eq!(doc.listener_count(), 1);
    }

    #[test]
    fn test_press_tab_wraps() {
        let doc = Document::new();
        let a = doc.append_element(doc.body(), "button", &[]);
        let b = doc.append_element(doc.body(), "input", &[]);

        doc.press_tab(false);
        assert_eq!(doc.active_element(), Some(a));
        doc.press_tab(false);
        assert_eq!(doc.active_element(), Some(b));
        doc.press_tab(false);
        assert_eq!(doc.active_element(), Some(a));
        doc.press_tab(true);
        assert_eq!(doc.active_element(), Some(b));
    }

    #[test]
    fn test_focus_detached_fails() {
        let doc = Document::new();
        let el = doc.create_element("button");
        assert_eq!(doc.focus(el), Err(DomError::Detached(el)));
        assert_eq!(doc.focus(NodeId(99)), Err(DomError::UnknownNode(NodeId(99))));
    }

    #[test]
    fn test_content_editable_inherited() {
        let doc = Document::new();
        let editor = doc.append_element(doc.body(), "div", &[("contenteditable", "true")]);
        let inner = doc.append_element(editor, "p", &[]);
        let locked = doc.append_element(editor, "span", &[("contenteditable", "false")]);

        assert!(doc.is_content_editable(inner));
        assert!(!doc.is_content_editable(locked));
        assert!(!doc.is_content_editable(doc.body()));
    }
}
