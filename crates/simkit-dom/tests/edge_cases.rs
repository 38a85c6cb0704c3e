//! Edge case tests for simkit-dom
//!
//! Tree mutation, event dispatch re-entrancy, focus order and the manual
//! scheduler's ordering guarantees.

use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::Duration;

use simkit_dom::{
    Clock, Document, Dom, DomError, DomEvent, ElementLookup, EventKind, EventSource, FrameScheduler, Host,
    ListenTarget, ManualScheduler, Modifiers, NodeId, TimerScheduler, listener,
};

// ============================================================================
// TREE EDGE CASES
// ============================================================================

#[test]
fn test_append_moves_between_parents() {
    let doc = Document::new();
    let first = doc.append_element(doc.body(), "div", &[]);
    let second = doc.append_element(doc.body(), "div", &[]);
    let child = doc.append_element(first, "span", &[("id", "moving")]);

    doc.append_child(second, child).unwrap();

    assert!(doc.children(first).is_empty());
    assert_eq!(doc.children(second), vec![child]);
    assert_eq!(doc.element_by_id("moving"), Some(child));
}

#[test]
fn test_append_into_own_subtree_rejected() {
    let doc = Document::new();
    let outer = doc.append_element(doc.body(), "div", &[]);
    let inner = doc.append_element(outer, "div", &[]);

    assert_eq!(doc.append_child(inner, outer), Err(DomError::HierarchyRequest(outer)));
    assert_eq!(doc.append_child(outer, outer), Err(DomError::HierarchyRequest(outer)));
    assert!(doc.is_connected(inner));
}

#[test]
fn test_unknown_nodes_are_inert() {
    let doc = Document::new();
    let ghost = NodeId::NONE;

    assert_eq!(doc.append_child(doc.body(), ghost), Err(DomError::UnknownNode(ghost)));
    assert_eq!(doc.value(ghost), "");
    assert_eq!(doc.text_content(ghost), "");
    assert_eq!(doc.tag_name(ghost), None);
    assert!(!doc.is_connected(ghost));
    doc.set_text_content(ghost, "ignored");
    doc.remove(ghost);
}

#[test]
fn test_removed_subtree_leaves_lookup() {
    let doc = Document::new();
    let panel = doc.append_element(doc.body(), "section", &[]);
    let field = doc.append_element(panel, "input", &[("id", "nested")]);

    doc.remove(panel);
    assert!(!doc.is_connected(field));
    assert_eq!(doc.element_by_id("nested"), None);

    doc.append_child(doc.body(), panel).unwrap();
    assert_eq!(doc.element_by_id("nested"), Some(field));
}

#[test]
fn test_attribute_names_case_insensitive_on_write() {
    let doc = Document::new();
    let el = doc.create_element("DIV");
    doc.set_attribute(el, "ARIA-LIVE", "polite");

    assert_eq!(doc.tag_name(el).as_deref(), Some("div"));
    assert_eq!(doc.attribute(el, "aria-live").as_deref(), Some("polite"));
}

// ============================================================================
// FORM VALUES
// ============================================================================

#[test]
fn test_value_falls_back_to_attribute() {
    let doc = Document::new();
    let field = doc.append_element(doc.body(), "input", &[("type", "number"), ("value", "7")]);
    assert_eq!(doc.value(field), "7");

    doc.set_value(field, "not a number");
    assert_eq!(doc.value(field), "not a number");
}

#[test]
fn test_range_default_bounds() {
    let doc = Document::new();
    let range = doc.append_element(doc.body(), "input", &[("type", "range")]);

    doc.set_value(range, "250");
    assert_eq!(doc.value(range), "100");
    doc.set_value(range, "-3");
    assert_eq!(doc.value(range), "0");
    doc.set_value(range, "");
    assert_eq!(doc.value(range), "50");
}

#[test]
fn test_range_with_inverted_bounds() {
    let doc = Document::new();
    let range = doc.append_element(doc.body(), "input", &[("type", "range"), ("min", "10"), ("max", "5")]);

    doc.set_value(range, "3");
    assert_eq!(doc.value(range), "10");
}

// ============================================================================
// EVENT DISPATCH
// ============================================================================

#[test]
fn test_listener_added_during_dispatch_waits() {
    let doc = Rc::new(Document::new());
    let calls = Rc::new(Cell::new(0));

    let d = doc.clone();
    let c = calls.clone();
    doc.add_listener(
        ListenTarget::Document,
        EventKind::KeyDown,
        listener(move |_| {
            let c = c.clone();
            d.add_listener(ListenTarget::Document, EventKind::KeyDown, listener(move |_| c.set(c.get() + 1)));
        }),
    );

    doc.key_down("a", Modifiers::NONE);
    assert_eq!(calls.get(), 0);
    doc.key_down("a", Modifiers::NONE);
    assert_eq!(calls.get(), 1);
}

#[test]
fn test_listener_kinds_do_not_mix() {
    let doc = Document::new();
    let field = doc.append_element(doc.body(), "input", &[]);
    let seen = Rc::new(RefCell::new(Vec::new()));

    let s = seen.clone();
    doc.add_listener(ListenTarget::Node(field), EventKind::Change, listener(move |e| s.borrow_mut().push(e.value.clone())));

    doc.type_input(field, "typed");
    doc.commit_change(field, "committed");

    assert_eq!(*seen.borrow(), vec![Some("committed".to_string())]);
}

#[test]
fn test_current_target_tracks_bubbling() {
    let doc = Document::new();
    let outer = doc.append_element(doc.body(), "div", &[]);
    let inner = doc.append_element(outer, "button", &[]);
    let path = Rc::new(RefCell::new(Vec::new()));

    for node in [inner, outer] {
        let p = path.clone();
        doc.add_listener(ListenTarget::Node(node), EventKind::KeyDown, listener(move |e| p.borrow_mut().push(e.current_target)));
    }
    let p = path.clone();
    doc.add_listener(ListenTarget::Document, EventKind::KeyDown, listener(move |e| p.borrow_mut().push(e.current_target)));

    doc.dispatch_event(DomEvent::key_down(inner, "x", Modifiers::NONE));
    assert_eq!(*path.borrow(), vec![Some(inner), Some(outer), None]);
}

#[test]
fn test_remove_unknown_listener() {
    let doc = Document::new();
    let id = doc.add_listener(ListenTarget::Document, EventKind::Input, listener(|_| {}));
    assert!(doc.remove_listener(id));
    assert!(!doc.remove_listener(id));
}

// ============================================================================
// FOCUS
// ============================================================================

#[test]
fn test_focusable_predicate() {
    let doc = Document::new();
    let body = doc.body();
    let cases = [
        (doc.append_element(body, "a", &[("href", "#")]), true),
        (doc.append_element(body, "a", &[]), false),
        (doc.append_element(body, "button", &[]), true),
        (doc.append_element(body, "button", &[("disabled", "")]), false),
        (doc.append_element(body, "input", &[("type", "hidden")]), false),
        (doc.append_element(body, "select", &[]), true),
        (doc.append_element(body, "textarea", &[]), true),
        (doc.append_element(body, "div", &[("tabindex", "0")]), true),
        (doc.append_element(body, "div", &[("tabindex", "-1")]), false),
        (doc.append_element(body, "button", &[("tabindex", "-1")]), false),
        (doc.append_element(body, "span", &[]), false),
    ];

    for (node, expected) in cases {
        assert_eq!(doc.is_focusable(node), expected, "{:?}", doc.tag_name(node));
    }
}

#[test]
fn test_press_tab_without_focusables_keeps_body() {
    let doc = Document::new();
    doc.append_element(doc.body(), "p", &[]);

    doc.press_tab(false);
    assert_eq!(doc.active_element(), Some(doc.body()));
}

#[test]
fn test_prevented_tab_does_not_move_focus() {
    let doc = Document::new();
    let first = doc.append_element(doc.body(), "button", &[]);
    doc.append_element(doc.body(), "button", &[]);
    doc.focus(first).unwrap();
    doc.add_listener(
        ListenTarget::Document,
        EventKind::KeyDown,
        listener(|e| {
            if e.key == "Tab" {
                e.prevent_default();
            }
        }),
    );

    assert!(doc.press_tab(false).is_default_prevented());
    assert_eq!(doc.active_element(), Some(first));
}

#[test]
fn test_detaching_focused_element_falls_back_to_body() {
    let doc = Document::new();
    let button = doc.append_element(doc.body(), "button", &[]);
    doc.focus(button).unwrap();
    doc.remove(button);

    assert_eq!(doc.active_element(), Some(doc.body()));
    doc.blur();
    assert_eq!(doc.active_element(), Some(doc.body()));
}

// ============================================================================
// SCHEDULER
// ============================================================================

#[test]
fn test_timer_armed_in_callback_fires_same_advance() {
    let sched = Rc::new(ManualScheduler::new());
    let fired = Rc::new(RefCell::new(Vec::new()));

    let s = sched.clone();
    let f = fired.clone();
    sched.schedule_after(
        Duration::from_millis(10),
        Box::new(move || {
            f.borrow_mut().push(s.elapsed());
            let f = f.clone();
            let inner = s.clone();
            s.schedule_after(Duration::from_millis(10), Box::new(move || f.borrow_mut().push(inner.elapsed())));
        }),
    );

    assert_eq!(sched.advance_ms(25), 2);
    assert_eq!(*fired.borrow(), vec![Duration::from_millis(10), Duration::from_millis(20)]);
    assert_eq!(sched.elapsed(), Duration::from_millis(25));
}

#[test]
fn test_equal_deadlines_fire_in_schedule_order() {
    let sched = ManualScheduler::new();
    let order = Rc::new(RefCell::new(Vec::new()));

    for n in 0..3 {
        let o = order.clone();
        sched.schedule_after(Duration::from_millis(5), Box::new(move || o.borrow_mut().push(n)));
    }
    sched.advance_ms(5);
    assert_eq!(*order.borrow(), vec![0, 1, 2]);
}

#[test]
fn test_clock_is_monotonic() {
    let sched = ManualScheduler::new();
    let start = sched.now();
    sched.advance(Duration::ZERO);
    assert_eq!(sched.now(), start);
    sched.advance_ms(1);
    assert!(sched.now() > start);
}

#[test]
fn test_frame_cancelled_by_earlier_frame() {
    let sched = Rc::new(ManualScheduler::new());
    let ran = Rc::new(Cell::new(false));

    let victim = Rc::new(Cell::new(None));
    let s = sched.clone();
    let v = victim.clone();
    sched.schedule_frame(Box::new(move || {
        if let Some(handle) = v.get() {
            s.cancel_frame(handle);
        }
    }));
    let r = ran.clone();
    victim.set(Some(sched.schedule_frame(Box::new(move || r.set(true)))));

    assert_eq!(sched.run_frame(), 1);
    assert!(!ran.get());
    assert_eq!(sched.pending_frames(), 0);
}

#[test]
fn test_host_headless_shares_document() {
    let doc = Rc::new(Document::new());
    let sched = Rc::new(ManualScheduler::new());
    let host = Host::headless(doc.clone(), sched.clone());

    let el = host.dom.create_element("div");
    host.dom.append_child(host.dom.body(), el).unwrap();
    host.dom.set_attribute(el, "id", "shared");
    assert_eq!(doc.element_by_id("shared"), Some(el));

    host.frames.schedule_frame(Box::new(|| {}));
    assert_eq!(sched.pending_frames(), 1);
    assert_eq!(host.timers.now(), sched.now());
}
