//! Crawl telemetry events
//!
//! The orchestrator publishes facts about what happened to an explicit
//! channel owned by the caller (UI, admin surface, test harness). There is
//! no module-level log buffer anywhere in the crate.

use crate::crawler::state::PageType;
use serde::Serialize;
use tokio::sync::mpsc;

/// Facts the driver publishes while crawling one source
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CrawlEvent {
    CycleStarted {
        source: String,
    },

    VisitStarted {
        capture_id: u64,
        url: String,
        depth: u32,
    },

    VisitCompleted {
        capture_id: u64,
        url: String,
        page_type: PageType,
        jobs_count: u32,
        links_admitted: usize,
    },

    VisitFailed {
        capture_id: u64,
        url: String,
        error: String,
    },

    RetryScheduled {
        url: String,
        wait_ms: u64,
        attempt: u32,
        reason: String,
    },

    UrlCorrectionApplied {
        source: String,
        url: String,
        attempt: u32,
    },

    HumanHandoffRequested {
        url: String,
        purpose: String,
    },

    HumanHandoffResolved {
        url: String,
        purpose: String,
    },

    CycleFinished {
        source: String,
        reason: String,
        pages_visited: u32,
        jobs_found: u32,
    },
}

/// Channel end the driver publishes events into
pub type EventSink = mpsc::UnboundedSender<CrawlEvent>;

/// Creates an event channel pair for wiring a driver to an observer
pub fn event_channel() -> (EventSink, mpsc::UnboundedReceiver<CrawlEvent>) {
    mpsc::unbounded_channel()
}
