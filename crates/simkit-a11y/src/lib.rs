//! simkit Accessibility
//!
//! Interaction-assistance layer for simulation pages.
//!
//! Features:
//! - Throttled ARIA live-region announcements
//! - Canonical key combos and a page-wide shortcut dispatcher
//! - Slider + number field binding with frame-coalesced updates
//! - Focus traps for modal dialogs
//! - Status hook for demos, with a fallback when no live region is wired
//!
//! Every component runs against an injected [`simkit_dom::Host`], so the
//! same code drives a real page or a headless test document.

pub mod combo;
pub mod focus_trap;
pub mod keyboard;
pub mod live_region;
pub mod status;
pub mod sync;

pub use combo::{ComboParts, KeyCombo};
pub use focus_trap::{FocusTrap, TrapState};
pub use keyboard::{
    is_text_entry, register_playback_shortcuts, KeyboardDispatcher, ShortcutHandler, ShortcutInfo,
    ShortcutOptions,
};
pub use live_region::{AnnouncementChannel, LiveRegionConfig, Politeness};
pub use status::{status_sink_or_fallback, FallbackStatus, StatusSink};
pub use sync::{
    announcement_text, bind_range_number, format_number, parse_float, Bounds, RangeBindingConfig,
    SyncBinder, SyncBinding,
};

/// Accessibility error
#[derive(Debug, thiserror::Error)]
pub enum A11yError {
    #[error("Missing element: #{0}")]
    MissingElement(String),

    #[error("DOM error: {0}")]
    Dom(#[from] simkit_dom::DomError),
}
