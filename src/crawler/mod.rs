//! Crawl orchestration engine
//!
//! This module contains the core of Jobtrail: the frontier work queue, the
//! crawl state for one source, the pure planner state machine, the bounded
//! retry/escalation policy, the human-handoff gate, and the driver loop
//! that wires them to the external collaborators (fetcher, classifier,
//! extractor, advisor).

mod classifier;
mod collaborators;
mod driver;
mod events;
mod extractor;
mod fetcher;
mod frontier;
mod handoff;
mod parser;
mod planner;
mod state;

pub use classifier::HeuristicClassifier;
pub use collaborators::{
    Advisor, AdvisorDecision, FetchOutcome, JobExtractor, JobPosting, PageClassifier, PageFetcher,
    RawAdvice, RuleAdvisor, VisitSummary,
};
pub use driver::{CycleReport, Driver};
pub use events::{event_channel, CrawlEvent, EventSink};
pub use extractor::HtmlJobExtractor;
pub use fetcher::{build_http_client, HttpFetcher};
pub use frontier::{Frontier, FrontierItem};
pub use handoff::HandoffGate;
pub use parser::{extract_links, extract_title};
pub use planner::{plan, Action};
pub use state::{Adaptation, CrawlLimits, CrawlState, PageType, StopHandle, VisitOutcome};
