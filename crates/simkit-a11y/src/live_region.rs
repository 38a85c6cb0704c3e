//! Live Region Support
//!
//! Throttled announcements through an ARIA live region. The first message
//! in a quiet period is shown immediately; messages arriving inside the
//! throttle window collapse into one trailing update carrying the most
//! recent text.

use std::cell::RefCell;
use std::rc::{Rc, Weak};
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use simkit_dom::{Host, NodeId, TimerHandle};

use crate::A11yError;

/// Live region politeness
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Politeness {
    Off,
    #[default]
    Polite,
    Assertive,
}

impl Politeness {
    /// Value for the `aria-live` attribute
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Off => "off",
            Self::Polite => "polite",
            Self::Assertive => "assertive",
        }
    }
}

/// Live region configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LiveRegionConfig {
    /// Element id; an existing element with this id is reused
    pub id: String,
    /// Politeness level: off, polite, assertive
    pub politeness: Politeness,
    /// Minimum spacing between visible updates
    pub throttle_ms: u64,
}

impl Default for LiveRegionConfig {
    fn default() -> Self {
        Self {
            id: "liveRegion".to_string(),
            politeness: Politeness::Polite,
            throttle_ms: 200,
        }
    }
}

impl LiveRegionConfig {
    /// Create polite live region
    pub fn polite() -> Self {
        Self::default()
    }

    /// Create assertive live region
    pub fn assertive() -> Self {
        Self {
            politeness: Politeness::Assertive,
            ..Default::default()
        }
    }

    pub fn with_id(mut self, id: &str) -> Self {
        self.id = id.to_string();
        self
    }

    pub fn with_throttle_ms(mut self, ms: u64) -> Self {
        self.throttle_ms = ms;
        self
    }

    pub fn throttle(&self) -> Duration {
        Duration::from_millis(self.throttle_ms)
    }
}

#[derive(Debug)]
struct ChannelState {
    region: NodeId,
    min_interval: Duration,
    last_emit: Option<Instant>,
    pending_text: Option<String>,
    timer: Option<TimerHandle>,
    destroyed: bool,
}

impl ChannelState {
    fn emit(&mut self, host: &Host, text: &str, now: Instant) {
        host.dom.set_text_content(self.region, text);
        // Never move backwards, even if a host clock misbehaves
        self.last_emit = Some(self.last_emit.map_or(now, |prev| prev.max(now)));
        self.pending_text = None;
        if let Some(handle) = self.timer.take() {
            host.timers.cancel_timer(handle);
        }
        tracing::debug!(region = ?self.region, text, "live region updated");
    }
}

/// Throttled writer for one live-region element.
///
/// Cloning yields another handle to the same channel.
#[derive(Clone)]
pub struct AnnouncementChannel {
    host: Host,
    state: Rc<RefCell<ChannelState>>,
}

impl std::fmt::Debug for AnnouncementChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnnouncementChannel")
            .field("state", &self.state.borrow())
            .finish_non_exhaustive()
    }
}

impl AnnouncementChannel {
    /// Create the live region, or adopt an existing element with the same id
    pub fn new(host: Host, config: &LiveRegionConfig) -> Self {
        let region = match host.dom.element_by_id(&config.id) {
            Some(existing) => {
                tracing::debug!(id = %config.id, "reusing existing live region");
                existing
            }
            None => create_region(&host, config).unwrap_or_else(|err| {
                tracing::warn!(%err, id = %config.id, "live region could not be attached");
                NodeId::NONE
            }),
        };

        Self {
            host,
            state: Rc::new(RefCell::new(ChannelState {
                region,
                min_interval: config.throttle(),
                last_emit: None,
                pending_text: None,
                timer: None,
                destroyed: false,
            })),
        }
    }

    /// Announce `text`, at most once per throttle window
    pub fn announce(&self, text: impl Into<String>) {
        let text = text.into();
        let now = self.host.timers.now();
        let mut state = self.state.borrow_mut();

        if state.destroyed {
            tracing::trace!(text, "announce on destroyed live region ignored");
            return;
        }

        let elapsed = state.last_emit.map(|t| now.saturating_duration_since(t));
        match elapsed {
            Some(elapsed) if elapsed < state.min_interval => {
                state.pending_text = Some(text);
                if state.timer.is_none() {
                    let delay = state.min_interval - elapsed;
                    let weak = Rc::downgrade(&self.state);
                    let host = self.host.clone();
                    let handle = self
                        .host
                        .timers
                        .schedule_after(delay, Box::new(move || flush_pending(&weak, &host)));
                    state.timer = Some(handle);
                    tracing::trace!(?delay, "live region update deferred");
                }
            }
            _ => state.emit(&self.host, &text, now),
        }
    }

    /// Empty the region and drop any deferred update
    pub fn clear(&self) {
        let mut state = self.state.borrow_mut();
        if state.region.is_valid() {
            self.host.dom.set_text_content(state.region, "");
        }
        state.pending_text = None;
        if let Some(handle) = state.timer.take() {
            self.host.timers.cancel_timer(handle);
        }
    }

    /// Clear, then detach the region from the document
    pub fn destroy(&self) {
        self.clear();
        let mut state = self.state.borrow_mut();
        if !state.destroyed {
            state.destroyed = true;
            self.host.dom.remove(state.region);
            tracing::debug!(region = ?state.region, "live region destroyed");
        }
    }

    /// Live region element
    pub fn region(&self) -> NodeId {
        self.state.borrow().region
    }

    /// Text currently shown to assistive technology
    pub fn current_text(&self) -> String {
        self.host.dom.text_content(self.region())
    }

    /// Whether a trailing update is armed
    pub fn has_pending(&self) -> bool {
        self.state.borrow().timer.is_some()
    }

    pub fn is_destroyed(&self) -> bool {
        self.state.borrow().destroyed
    }
}

fn create_region(host: &Host, config: &LiveRegionConfig) -> Result<NodeId, A11yError> {
    let dom = &host.dom;
    let region = dom.create_element("div");
    dom.set_attribute(region, "id", &config.id);
    dom.set_attribute(region, "aria-live", config.politeness.as_str());
    dom.set_attribute(region, "aria-atomic", "true");
    dom.set_attribute(region, "class", "visually-hidden");
    dom.append_child(dom.body(), region)?;
    Ok(region)
}

fn flush_pending(state: &Weak<RefCell<ChannelState>>, host: &Host) {
    let Some(state) = state.upgrade() else { return };
    let mut state = state.borrow_mut();
    state.timer = None;
    if state.destroyed {
        return;
    }
    if let Some(text) = state.pending_text.take() {
        let now = host.timers.now();
        state.emit(host, &text, now);
    }
}
