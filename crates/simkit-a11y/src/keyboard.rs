//! Keyboard Shortcuts
//!
//! Page-wide shortcut registry with one document key listener per
//! dispatcher. Plain-key shortcuts stand down while the user is typing in
//! a text control so that typing "r" never triggers "reset".

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use serde::{Deserialize, Serialize};
use simkit_dom::{Dom, DomEvent, EventKind, Host, ListenTarget, ListenerId, NodeId, listener};

use crate::combo::KeyCombo;

/// Shortcut callback
pub type ShortcutHandler = Rc<dyn Fn(&DomEvent)>;

/// Modifiers and help text for a registration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShortcutOptions {
    pub ctrl: bool,
    pub alt: bool,
    pub shift: bool,
    pub description: String,
}

impl ShortcutOptions {
    pub fn new() -> Self { Self::default() }
    pub fn ctrl(mut self) -> Self { self.ctrl = true; self }
    pub fn alt(mut self) -> Self { self.alt = true; self }
    pub fn shift(mut self) -> Self { self.shift = true; self }

    pub fn with_description(mut self, description: &str) -> Self {
        self.description = description.to_string();
        self
    }

    fn combo(&self, key: &str) -> KeyCombo {
        KeyCombo::encode(key, self.ctrl, self.alt, self.shift)
    }
}

/// Registered shortcut as listed on help surfaces
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShortcutInfo {
    pub combo: KeyCombo,
    pub description: String,
}

impl ShortcutInfo {
    /// `Ctrl+Shift+S` style label
    pub fn display(&self) -> String {
        self.combo.display()
    }
}

struct ShortcutEntry {
    combo: KeyCombo,
    handler: ShortcutHandler,
    description: String,
}

/// Combo registry in first-registration order
#[derive(Default)]
struct ShortcutRegistry {
    entries: Vec<ShortcutEntry>,
}

impl ShortcutRegistry {
    fn position(&self, combo: &KeyCombo) -> Option<usize> {
        self.entries.iter().position(|e| &e.combo == combo)
    }

    /// Insert or overwrite; returns true when an entry was replaced
    fn insert(&mut self, entry: ShortcutEntry) -> bool {
        match self.position(&entry.combo) {
            Some(idx) => {
                self.entries[idx] = entry;
                true
            }
            None => {
                self.entries.push(entry);
                false
            }
        }
    }

    fn remove(&mut self, combo: &KeyCombo) -> bool {
        match self.position(combo) {
            Some(idx) => {
                self.entries.remove(idx);
                true
            }
            None => false,
        }
    }

    fn handler(&self, combo: &KeyCombo) -> Option<ShortcutHandler> {
        self.position(combo).map(|idx| self.entries[idx].handler.clone())
    }
}

/// Whether `node` accepts free text: any `input`, a `textarea`, or
/// content-editable content
pub fn is_text_entry(dom: &dyn Dom, node: NodeId) -> bool {
    match dom.tag_name(node).as_deref() {
        Some("input") | Some("textarea") => true,
        Some(_) => dom.is_content_editable(node),
        None => false,
    }
}

/// Page-wide keyboard shortcut dispatcher
pub struct KeyboardDispatcher {
    host: Host,
    registry: Rc<RefCell<ShortcutRegistry>>,
    listener: Cell<Option<ListenerId>>,
}

impl KeyboardDispatcher {
    /// Create a dispatcher and install its document key listener
    pub fn new(host: Host) -> Self {
        let registry = Rc::new(RefCell::new(ShortcutRegistry::default()));
        let weak_registry = Rc::downgrade(&registry);
        let weak_dom = Rc::downgrade(&host.dom);

        let id = host.events.add_listener(
            ListenTarget::Document,
            EventKind::KeyDown,
            listener(move |event| {
                if let (Some(registry), Some(dom)) = (weak_registry.upgrade(), weak_dom.upgrade()) {
                    dispatch_with(&registry, dom.as_ref(), event);
                }
            }),
        );
        tracing::debug!(listener = id.0, "keyboard dispatcher installed");

        Self {
            host,
            registry,
            listener: Cell::new(Some(id)),
        }
    }

    /// Register `handler` for `key` with the given modifiers; a previous
    /// registration of the same combo is replaced
    pub fn register(&self, key: &str, handler: impl Fn(&DomEvent) + 'static, options: ShortcutOptions) -> KeyCombo {
        let combo = options.combo(key);
        let replaced = self.registry.borrow_mut().insert(ShortcutEntry {
            combo: combo.clone(),
            handler: Rc::new(handler),
            description: options.description,
        });
        if replaced {
            tracing::debug!(%combo, "shortcut replaced");
        }
        combo
    }

    /// Remove the registration for `key` with the given modifiers
    pub fn unregister(&self, key: &str, options: &ShortcutOptions) -> bool {
        self.registry.borrow_mut().remove(&options.combo(key))
    }

    /// Route a key event to its shortcut. Returns true if a handler ran.
    pub fn dispatch(&self, event: &mut DomEvent) -> bool {
        dispatch_with(&self.registry, self.host.dom.as_ref(), event)
    }

    /// Snapshot of registered combos and their descriptions
    pub fn get_shortcuts(&self) -> Vec<ShortcutInfo> {
        self.registry
            .borrow()
            .entries
            .iter()
            .map(|e| ShortcutInfo {
                combo: e.combo.clone(),
                description: e.description.clone(),
            })
            .collect()
    }

    /// Number of registered shortcuts
    pub fn len(&self) -> usize {
        self.registry.borrow().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registry.borrow().entries.is_empty()
    }

    /// Whether the document listener is still installed
    pub fn is_listening(&self) -> bool {
        self.listener.get().is_some()
    }

    /// Detach the document listener and clear the registry
    pub fn destroy(&self) {
        if let Some(id) = self.listener.take() {
            self.host.events.remove_listener(id);
            tracing::debug!(listener = id.0, "keyboard dispatcher detached");
        }
        self.registry.borrow_mut().entries.clear();
    }
}

impl Drop for KeyboardDispatcher {
    fn drop(&mut self) {
        self.destroy();
    }
}

fn dispatch_with(registry: &RefCell<ShortcutRegistry>, dom: &dyn Dom, event: &mut DomEvent) -> bool {
    if event.kind != EventKind::KeyDown {
        return false;
    }

    let combo = KeyCombo::from_modifiers(&event.key, event.modifiers);
    // Release the registry before running user code
    let Some(handler) = registry.borrow().handler(&combo) else {
        return false;
    };

    if is_text_entry(dom, event.target) && !event.modifiers.ctrl && !event.modifiers.alt {
        tracing::trace!(%combo, "shortcut suppressed in text entry");
        return false;
    }

    event.prevent_default();
    handler(&*event);
    true
}

/// Install the simulation playback bindings: Space toggles, R resets
pub fn register_playback_shortcuts(
    dispatcher: &KeyboardDispatcher,
    toggle: impl Fn() + 'static,
    reset: impl Fn() + 'static,
) {
    let toggle: Rc<dyn Fn()> = Rc::new(toggle);
    let reset: Rc<dyn Fn()> = Rc::new(reset);

    for key in [" ", "Spacebar"] {
        let toggle = toggle.clone();
        dispatcher.register(key, move |_| toggle(), ShortcutOptions::new().with_description("播放/暫停"));
    }

    let r = reset.clone();
    dispatcher.register("r", move |_| r(), ShortcutOptions::new().with_description("重置"));
    dispatcher.register("r", move |_| reset(), ShortcutOptions::new().shift().with_description("重置"));
}
