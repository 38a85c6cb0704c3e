//! Focus Trap
//!
//! Keeps Tab traversal inside a container (typically a dialog) while
//! active. Only the wrap points are intercepted: shift+Tab on the first
//! focusable element and Tab on the last. Everything in between is left to
//! the host's default traversal.

use std::cell::RefCell;
use std::rc::Rc;

use simkit_dom::{Dom, DomError, DomEvent, EventKind, Host, ListenTarget, ListenerId, NodeId, listener};

use crate::A11yError;

/// Trap lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TrapState {
    #[default]
    Inactive,
    Active,
}

#[derive(Debug, Default)]
struct TrapInner {
    state: TrapState,
    return_focus: Option<NodeId>,
    order: Vec<NodeId>,
    listener: Option<ListenerId>,
}

/// Focus containment for one container element
pub struct FocusTrap {
    host: Host,
    container: NodeId,
    inner: Rc<RefCell<TrapInner>>,
}

impl std::fmt::Debug for FocusTrap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FocusTrap")
            .field("container", &self.container)
            .field("inner", &self.inner.borrow())
            .finish_non_exhaustive()
    }
}

impl FocusTrap {
    pub fn new(host: Host, container: NodeId) -> Self {
        Self {
            host,
            container,
            inner: Rc::new(RefCell::new(TrapInner::default())),
        }
    }

    /// Trap for the element with `id`
    pub fn by_id(host: Host, id: &str) -> Result<Self, A11yError> {
        let container = host
            .dom
            .element_by_id(id)
            .ok_or_else(|| A11yError::MissingElement(id.to_string()))?;
        Ok(Self::new(host, container))
    }

    /// Remember the focused element, focus the first focusable descendant
    /// and start intercepting Tab at the edges. No-op while active.
    pub fn activate(&self) {
        if self.is_active() {
            return;
        }

        let dom = &self.host.dom;
        let order = dom.focusable_descendants(self.container);
        let return_focus = dom.active_element();

        if let Some(&first) = order.first() {
            if let Err(err) = dom.focus(first) {
                tracing::warn!(%err, "focus trap could not focus its first element");
            }
        } else {
            tracing::debug!(container = ?self.container, "focus trap has no focusable elements");
        }

        let weak_inner = Rc::downgrade(&self.inner);
        let weak_dom = Rc::downgrade(&self.host.dom);
        let container = self.container;
        let id = self.host.events.add_listener(
            ListenTarget::Node(self.container),
            EventKind::KeyDown,
            listener(move |event| {
                if let (Some(inner), Some(dom)) = (weak_inner.upgrade(), weak_dom.upgrade()) {
                    handle_tab(&inner, dom.as_ref(), container, event);
                }
            }),
        );

        let mut inner = self.inner.borrow_mut();
        inner.state = TrapState::Active;
        inner.return_focus = return_focus;
        inner.order = order;
        inner.listener = Some(id);
        tracing::debug!(container = ?self.container, "focus trap activated");
    }

    /// Stop intercepting and return focus to where it was before
    /// activation, if that element is still attached. No-op while inactive.
    pub fn deactivate(&self) {
        let (listener, return_focus) = {
            let mut inner = self.inner.borrow_mut();
            if inner.state == TrapState::Inactive {
                return;
            }
            inner.state = TrapState::Inactive;
            inner.order.clear();
            (inner.listener.take(), inner.return_focus.take())
        };

        if let Some(id) = listener {
            self.host.events.remove_listener(id);
        }
        if let Some(target) = return_focus {
            if let Err(err) = self.restore_focus(target) {
                tracing::debug!(%err, "previous focus not restored");
            }
        }
        tracing::debug!(container = ?self.container, "focus trap deactivated");
    }

    fn restore_focus(&self, target: NodeId) -> Result<(), DomError> {
        if !self.host.dom.is_connected(target) {
            return Err(DomError::Detached(target));
        }
        self.host.dom.focus(target)?;
        Ok(())
    }

    pub fn is_active(&self) -> bool {
        self.state() == TrapState::Active
    }

    pub fn state(&self) -> TrapState {
        self.inner.borrow().state
    }

    /// Focusable descendants as of the last activation or Tab
    pub fn focusable_order(&self) -> Vec<NodeId> {
        self.inner.borrow().order.clone()
    }

    pub fn container(&self) -> NodeId {
        self.container
    }
}

/// Dropping an active trap detaches its listener; focus stays where it is
impl Drop for FocusTrap {
    fn drop(&mut self) {
        let listener = self.inner.borrow_mut().listener.take();
        if let Some(id) = listener {
            self.host.events.remove_listener(id);
            tracing::debug!(container = ?self.container, "active focus trap dropped");
        }
    }
}

fn handle_tab(inner: &RefCell<TrapInner>, dom: &dyn Dom, container: NodeId, event: &mut DomEvent) {
    if event.key != "Tab" {
        return;
    }

    // Contents may change while the dialog is open
    let order = dom.focusable_descendants(container);
    let (first, last) = match (order.first(), order.last()) {
        (Some(&first), Some(&last)) => (first, last),
        _ => {
            inner.borrow_mut().order.clear();
            return;
        }
    };
    inner.borrow_mut().order = order;

    let active = dom.active_element();
    let wrap_to = if event.modifiers.shift && active == Some(first) {
        last
    } else if !event.modifiers.shift && active == Some(last) {
        first
    } else {
        return;
    };

    event.prevent_default();
    if let Err(err) = dom.focus(wrap_to) {
        tracing::warn!(%err, "focus trap could not wrap");
        return;
    }
    tracing::trace!(?wrap_to, "focus wrapped");
}
