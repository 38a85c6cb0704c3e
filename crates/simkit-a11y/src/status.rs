//! Status Announcements
//!
//! Hook used by demos to report state changes ("animation started").
//! A live region serves it when one is wired; otherwise the fallback logs
//! the message and writes it into the page's status element.

use std::rc::Rc;

use simkit_dom::Dom;

use crate::live_region::AnnouncementChannel;

/// Accepts status messages for assistive technology
pub trait StatusSink {
    fn announce_status(&self, message: &str);
}

impl StatusSink for AnnouncementChannel {
    fn announce_status(&self, message: &str) {
        self.announce(message);
    }
}

/// Sink used when no live region is available
pub struct FallbackStatus {
    dom: Rc<dyn Dom>,
    region_id: String,
}

impl FallbackStatus {
    pub fn new(dom: Rc<dyn Dom>) -> Self {
        Self {
            dom,
            region_id: "statusRegion".to_string(),
        }
    }

    pub fn with_region_id(mut self, id: &str) -> Self {
        self.region_id = id.to_string();
        self
    }
}

impl StatusSink for FallbackStatus {
    fn announce_status(&self, message: &str) {
        tracing::info!(message, "status announcement");
        if let Some(region) = self.dom.element_by_id(&self.region_id) {
            self.dom.set_text_content(region, message);
        }
    }
}

/// Prefer the live region, fall back to the status element
pub fn status_sink_or_fallback(channel: Option<AnnouncementChannel>, dom: Rc<dyn Dom>) -> Rc<dyn StatusSink> {
    match channel {
        Some(channel) => Rc::new(channel),
        None => Rc::new(FallbackStatus::new(dom)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::live_region::LiveRegionConfig;
    use simkit_dom::{Document, Host, ManualScheduler};

    #[test]
    fn test_fallback_writes_status_region() {
        let doc = Rc::new(Document::new());
        let region = doc.append_element(doc.body(), "p", &[("id", "statusRegion")]);

        let sink = status_sink_or_fallback(None, doc.clone());
        sink.announce_status("動畫已開始");
        assert_eq!(doc.text_content(region), "動畫已開始");
    }

    #[test]
    fn test_fallback_without_region_is_silent() {
        let doc = Rc::new(Document::new());
        let sink = FallbackStatus::new(doc.clone()).with_region_id("missing");
        sink.announce_status("動畫已暫停");
        assert_eq!(doc.len(), 3);
    }

    #[test]
    fn test_channel_preferred() {
        let doc = Rc::new(Document::new());
        let status = doc.append_element(doc.body(), "p", &[("id", "statusRegion")]);
        let host = Host::headless(doc.clone(), Rc::new(ManualScheduler::new()));
        let channel = AnnouncementChannel::new(host, &LiveRegionConfig::default());

        let sink = status_sink_or_fallback(Some(channel.clone()), doc.clone());
        sink.announce_status("已重置為初始狀態");
        assert_eq!(channel.current_text(), "已重置為初始狀態");
        assert_eq!(doc.text_content(status), "");
    }
}
