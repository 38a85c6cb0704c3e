//! Range + Number Binding
//!
//! Keeps a slider and a numeric field showing one value in `[min, max]`.
//! Slider input is trusted as-is; typed numbers are repaired (unparsable
//! or too small becomes `min`, too large becomes `max`) and written back
//! before they propagate. All updates inside one animation frame collapse
//! into a single write of the last proposed value.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use serde::{Deserialize, Serialize};
use simkit_dom::{
    Dom, DomEvent, EventKind, FrameHandle, Host, ListenTarget, ListenerId, NodeId, listener, range_bounds,
};
pub use simkit_dom::{format_number, parse_float};

use crate::A11yError;
use crate::live_region::AnnouncementChannel;
use crate::status::StatusSink;

/// Element ids and announcement wording for a binding
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RangeBindingConfig {
    /// Slider (`input type=range`) id
    pub range_id: String,
    /// Numeric field id
    pub number_id: String,
    /// Parameter name, e.g. "溫度"
    pub label: String,
    /// Unit, e.g. "度"
    pub unit: String,
}

impl RangeBindingConfig {
    pub fn new(range_id: &str, number_id: &str) -> Self {
        Self {
            range_id: range_id.to_string(),
            number_id: number_id.to_string(),
            ..Default::default()
        }
    }

    pub fn with_label(mut self, label: &str) -> Self {
        self.label = label.to_string();
        self
    }

    pub fn with_unit(mut self, unit: &str) -> Self {
        self.unit = unit.to_string();
        self
    }
}

/// Inclusive value bounds
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min: f64,
    pub max: f64,
}

impl Bounds {
    /// A `max` below `min` collapses to `min`
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max: max.max(min) }
    }

    /// Read `min`/`max` from a slider's attributes, exactly as the
    /// slider itself clamps
    pub fn from_range(dom: &dyn Dom, range: NodeId) -> Self {
        let min = dom.attribute(range, "min");
        let max = dom.attribute(range, "max");
        let (min, max) = range_bounds(min.as_deref(), max.as_deref());
        Self { min, max }
    }

    /// Clamp into bounds; NaN maps to `min`
    pub fn clamp(&self, value: f64) -> f64 {
        if value.is_nan() || value < self.min {
            self.min
        } else if value > self.max {
            self.max
        } else {
            value
        }
    }

    /// Parse and clamp user text; unparsable text maps to `min`
    pub fn clamp_input(&self, raw: &str) -> f64 {
        self.clamp(parse_float(raw).unwrap_or(f64::NAN))
    }

    /// Midpoint, the value a range input starts at
    pub fn midpoint(&self) -> f64 {
        self.min + (self.max - self.min) / 2.0
    }
}

/// `"{label}已變更為 {value} {unit}"`, or `"{value} {unit}"` without a label
pub fn announcement_text(label: &str, value: &str, unit: &str) -> String {
    let text = if label.is_empty() {
        format!("{value} {unit}")
    } else {
        format!("{label}已變更為 {value} {unit}")
    };
    text.trim().to_string()
}

#[derive(Debug)]
struct SyncState {
    current_value: f64,
    bounds: Bounds,
    pending_value: Option<f64>,
    pending_frame: Option<FrameHandle>,
    last_announced: Option<f64>,
    bound: bool,
}

struct Shared {
    host: Host,
    range: NodeId,
    number: NodeId,
    label: String,
    unit: String,
    on_change: Option<Box<dyn Fn(f64)>>,
    live_region: Option<Rc<dyn StatusSink>>,
    state: RefCell<SyncState>,
}

impl Shared {
    /// Queue `value` for the next frame, superseding anything queued
    fn propose(self: &Rc<Self>, value: f64) {
        let mut state = self.state.borrow_mut();
        if !state.bound {
            return;
        }

        state.pending_value = Some(value);
        if let Some(handle) = state.pending_frame.take() {
            self.host.frames.cancel_frame(handle);
        }

        let weak: Weak<Self> = Rc::downgrade(self);
        let handle = self.host.frames.schedule_frame(Box::new(move || {
            if let Some(shared) = weak.upgrade() {
                shared.flush();
            }
        }));
        state.pending_frame = Some(handle);
    }

    fn flush(&self) {
        let (value, announce) = {
            let mut state = self.state.borrow_mut();
            state.pending_frame = None;
            let Some(value) = state.pending_value.take() else { return };
            if !state.bound {
                return;
            }

            state.current_value = value;
            let announce = self.live_region.is_some() && state.last_announced != Some(value);
            if announce {
                state.last_announced = Some(value);
            }
            (value, announce)
        };

        let text = format_number(value);
        self.host.dom.set_value(self.range, &text);
        self.host.dom.set_value(self.number, &text);
        tracing::debug!(value, range = ?self.range, "bound controls synced");

        if let Some(on_change) = &self.on_change {
            on_change(value);
        }
        if announce {
            if let Some(sink) = &self.live_region {
                sink.announce_status(&announcement_text(&self.label, &text, &self.unit));
            }
        }
    }

    fn on_range_input(self: &Rc<Self>, event: &DomEvent) {
        let raw = event.value.clone().unwrap_or_else(|| self.host.dom.value(self.range));
        match parse_float(&raw) {
            Some(value) => self.propose(value),
            None => tracing::trace!(raw, "ignoring non-numeric slider input"),
        }
    }

    fn on_number_change(self: &Rc<Self>, event: &DomEvent) {
        let raw = event.value.clone().unwrap_or_else(|| self.host.dom.value(self.number));
        let bounds = self.state.borrow().bounds;
        let value = bounds.clamp_input(&raw);
        self.host.dom.set_value(self.number, &format_number(value));
        if format_number(value) != raw.trim() {
            tracing::trace!(raw, value, "number input repaired");
        }
        self.propose(value);
    }
}

/// Builder for a slider + number binding
pub struct SyncBinder {
    config: RangeBindingConfig,
    on_change: Option<Box<dyn Fn(f64)>>,
    live_region: Option<Rc<dyn StatusSink>>,
}

impl SyncBinder {
    pub fn new(config: RangeBindingConfig) -> Self {
        Self {
            config,
            on_change: None,
            live_region: None,
        }
    }

    /// Called with each applied value
    pub fn on_change(mut self, callback: impl Fn(f64) + 'static) -> Self {
        self.on_change = Some(Box::new(callback));
        self
    }

    /// Announce value changes through `sink`
    pub fn announce_with(mut self, sink: Rc<dyn StatusSink>) -> Self {
        self.live_region = Some(sink);
        self
    }

    /// Bind, failing if either control is missing
    pub fn try_bind(self, host: &Host) -> Result<SyncBinding, A11yError> {
        let dom = host.dom.as_ref();
        let lookup = |id: &str| dom.element_by_id(id).ok_or_else(|| A11yError::MissingElement(id.to_string()));
        let range = lookup(&self.config.range_id)?;
        let number = lookup(&self.config.number_id)?;

        let bounds = Bounds::from_range(dom, range);
        let initial = parse_float(&dom.value(range))
            .filter(|v| v.is_finite())
            .map_or(bounds.midpoint(), |v| bounds.clamp(v));

        let shared = Rc::new(Shared {
            host: host.clone(),
            range,
            number,
            label: self.config.label,
            unit: self.config.unit,
            on_change: self.on_change,
            live_region: self.live_region,
            state: RefCell::new(SyncState {
                current_value: initial,
                bounds,
                pending_value: None,
                pending_frame: None,
                // The slider's starting value counts as already announced
                last_announced: Some(initial),
                bound: true,
            }),
        });

        // Listeners keep the binding alive until unbind, like page script
        let on_range = shared.clone();
        let range_listener = host.events.add_listener(
            ListenTarget::Node(range),
            EventKind::Input,
            listener(move |event| on_range.on_range_input(event)),
        );
        let on_number = shared.clone();
        let number_listener = host.events.add_listener(
            ListenTarget::Node(number),
            EventKind::Change,
            listener(move |event| on_number.on_number_change(event)),
        );

        tracing::debug!(range_id = %self.config.range_id, number_id = %self.config.number_id, ?bounds, "controls bound");
        Ok(SyncBinding {
            shared: Some(shared),
            listeners: vec![range_listener, number_listener],
        })
    }

    /// Bind, degrading to a no-op binding if either control is missing
    pub fn bind(self, host: &Host) -> SyncBinding {
        let ids = (self.config.range_id.clone(), self.config.number_id.clone());
        self.try_bind(host).unwrap_or_else(|err| {
            tracing::warn!(%err, range_id = %ids.0, number_id = %ids.1, "range or number input not found");
            SyncBinding::noop()
        })
    }
}

/// Bind a slider and number field; returns the unbind handle
pub fn bind_range_number(
    host: &Host,
    config: RangeBindingConfig,
    on_change: impl Fn(f64) + 'static,
    live_region: Option<AnnouncementChannel>,
) -> SyncBinding {
    let mut binder = SyncBinder::new(config).on_change(on_change);
    if let Some(channel) = live_region {
        binder = binder.announce_with(Rc::new(channel));
    }
    binder.bind(host)
}

/// Handle for an installed binding.
///
/// Dropping the handle leaves the binding installed; call
/// [`unbind`](Self::unbind) to remove it.
#[must_use = "the binding stays installed until unbind is called"]
pub struct SyncBinding {
    shared: Option<Rc<Shared>>,
    listeners: Vec<ListenerId>,
}

impl SyncBinding {
    /// Binding that does nothing
    pub fn noop() -> Self {
        Self {
            shared: None,
            listeners: Vec::new(),
        }
    }

    /// Remove both listeners and cancel any queued frame
    pub fn unbind(&mut self) {
        let Some(shared) = self.shared.take() else { return };

        for id in self.listeners.drain(..) {
            shared.host.events.remove_listener(id);
        }

        let mut state = shared.state.borrow_mut();
        state.bound = false;
        state.pending_value = None;
        if let Some(handle) = state.pending_frame.take() {
            shared.host.frames.cancel_frame(handle);
        }
        tracing::debug!(range = ?shared.range, "controls unbound");
    }

    pub fn is_bound(&self) -> bool {
        self.shared.is_some()
    }

    /// Last applied value
    pub fn value(&self) -> Option<f64> {
        self.shared.as_ref().map(|s| s.state.borrow().current_value)
    }

    pub fn bounds(&self) -> Option<Bounds> {
        self.shared.as_ref().map(|s| s.state.borrow().bounds)
    }

    /// Whether an update is queued for the next frame
    pub fn has_pending(&self) -> bool {
        self.shared
            .as_ref()
            .is_some_and(|s| s.state.borrow().pending_frame.is_some())
    }
}

impl std::fmt::Debug for SyncBinding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncBinding")
            .field("bound", &self.is_bound())
            .field("listeners", &self.listeners)
            .finish()
    }
}
