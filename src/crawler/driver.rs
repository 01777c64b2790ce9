//! Driver loop: executes planner actions against the collaborators
//!
//! The outer loop repeatedly (a) calls the planner on current state, (b)
//! executes the returned action via the fetcher/classifier/extractor/
//! advisor, (c) folds the outcome back into state, and (d) repeats until
//! the planner returns a terminal action. Actions run strictly one at a
//! time; suspension only happens inside an executed action (a fetch, a
//! retry wait, or a human-handoff gate), never inside planning.

use crate::crawler::collaborators::{
    Advisor, FetchOutcome, JobExtractor, JobPosting, PageClassifier, PageFetcher, VisitSummary,
};
use crate::crawler::events::{CrawlEvent, EventSink};
use crate::crawler::handoff::HandoffGate;
use crate::crawler::parser::extract_links;
use crate::crawler::planner::{plan, Action};
use crate::crawler::state::{CrawlState, PageType, VisitOutcome};
use crate::GateError;
use std::sync::Arc;
use std::time::Duration;

/// Summary of one completed cycle over a source
#[derive(Debug, Clone)]
pub struct CycleReport {
    pub source_name: String,

    /// Why the cycle ended (from the terminal `CycleDone`)
    pub reason: String,

    pub pages_visited: u32,
    pub jobs_found: u32,
    pub postings: Vec<JobPosting>,

    // Observable counters for logging/telemetry
    pub url_correction_attempts: u32,
    pub consecutive_zero_job_visits: u32,
}

/// Executes planner actions for one source at a time
pub struct Driver<F, C, X, A> {
    fetcher: F,
    classifier: C,
    extractor: X,
    advisor: A,
    login_gate: Arc<HandoffGate>,
    captcha_gate: Arc<HandoffGate>,
    events: Option<EventSink>,
    capture_counter: u64,
}

impl<F, C, X, A> Driver<F, C, X, A>
where
    F: PageFetcher,
    C: PageClassifier,
    X: JobExtractor,
    A: Advisor,
{
    pub fn new(fetcher: F, classifier: C, extractor: X, advisor: A) -> Self {
        Self {
            fetcher,
            classifier,
            extractor,
            advisor,
            login_gate: Arc::new(HandoffGate::new("login")),
            captcha_gate: Arc::new(HandoffGate::new("captcha")),
            events: None,
            capture_counter: 0,
        }
    }

    /// Attaches an event sink the driver publishes crawl facts to
    pub fn with_events(mut self, sink: EventSink) -> Self {
        self.events = Some(sink);
        self
    }

    /// Gate an operator surface resolves when a login is completed
    pub fn login_gate(&self) -> Arc<HandoffGate> {
        self.login_gate.clone()
    }

    /// Gate an operator surface resolves when a CAPTCHA is solved
    pub fn captcha_gate(&self) -> Arc<HandoffGate> {
        self.captcha_gate.clone()
    }

    /// Runs one full cycle over a source's crawl state
    pub async fn run_source(&mut self, state: &mut CrawlState) -> CycleReport {
        tracing::info!(source = %state.source_name, url = %state.source_url, "Starting crawl cycle");
        self.publish(CrawlEvent::CycleStarted {
            source: state.source_name.clone(),
        });

        let mut postings: Vec<JobPosting> = Vec::new();
        let mut pages_visited = 0u32;

        let reason = loop {
            match plan(state) {
                Action::VisitUrl { url, depth } => {
                    self.visit(state, &mut postings, &url, depth).await;
                    pages_visited += 1;
                }

                Action::RetryWait {
                    wait_ms,
                    reason,
                    retry_url,
                    retry_depth,
                } => {
                    tracing::info!(
                        url = %retry_url,
                        wait_ms,
                        attempt = state.retry_count,
                        "Retrying after wait: {}",
                        reason
                    );
                    self.publish(CrawlEvent::RetryScheduled {
                        url: retry_url.clone(),
                        wait_ms,
                        attempt: state.retry_count,
                        reason,
                    });

                    tokio::time::sleep(Duration::from_millis(wait_ms)).await;
                    self.visit(state, &mut postings, &retry_url, retry_depth).await;
                    pages_visited += 1;
                }

                Action::ApplyUrlCorrection { url, source_name } => {
                    // The planner gates on the counter; the executor spends it.
                    state.url_correction_attempts += 1;
                    tracing::info!(
                        source = %source_name,
                        url = %url,
                        attempt = state.url_correction_attempts,
                        "Applying URL correction"
                    );
                    self.publish(CrawlEvent::UrlCorrectionApplied {
                        source: source_name,
                        url: url.clone(),
                        attempt: state.url_correction_attempts,
                    });

                    self.visit(state, &mut postings, &url, 0).await;
                    pages_visited += 1;
                }

                Action::TriggerLoginWall { url } => {
                    let gate = self.login_gate.clone();
                    self.handoff(state, &mut postings, gate, &url).await;
                }

                Action::TriggerCaptcha { url } => {
                    let gate = self.captcha_gate.clone();
                    self.handoff(state, &mut postings, gate, &url).await;
                }

                Action::CycleDone { reason } => break reason,
            }
        };

        let jobs_found = postings.len() as u32;
        tracing::info!(
            source = %state.source_name,
            pages_visited,
            jobs_found,
            "Cycle finished: {}",
            reason
        );
        self.publish(CrawlEvent::CycleFinished {
            source: state.source_name.clone(),
            reason: reason.clone(),
            pages_visited,
            jobs_found,
        });

        CycleReport {
            source_name: state.source_name.clone(),
            reason,
            pages_visited,
            jobs_found,
            postings,
            url_correction_attempts: state.url_correction_attempts,
            consecutive_zero_job_visits: state.consecutive_zero_job_visits,
        }
    }

    /// Fetches one page and folds the outcome into state
    async fn visit(
        &mut self,
        state: &mut CrawlState,
        postings: &mut Vec<JobPosting>,
        url: &str,
        depth: u32,
    ) {
        let capture_id = self.next_capture_id();
        tracing::debug!(capture_id, url = %url, depth, "Visiting");
        self.publish(CrawlEvent::VisitStarted {
            capture_id,
            url: url.to_string(),
            depth,
        });

        match self.fetcher.fetch(url).await {
            FetchOutcome::Success { html, final_url } => {
                self.process_capture(state, postings, capture_id, &html, &final_url, depth)
                    .await;
            }

            FetchOutcome::Failed { error } => {
                tracing::warn!(url = %url, "Fetch failed: {}", error);
                self.publish(CrawlEvent::VisitFailed {
                    capture_id,
                    url: url.to_string(),
                    error: error.clone(),
                });

                let summary = VisitSummary {
                    url,
                    page_type: PageType::Error,
                    jobs_count: 0,
                    error: Some(&error),
                    retry_count: state.retry_count,
                    url_correction_attempts: state.url_correction_attempts,
                };
                let decision = self.advisor.advise(&summary).await.normalize();

                state.record_outcome(VisitOutcome {
                    capture_id,
                    page_type: Some(PageType::Error),
                    jobs_count: 0,
                    error: Some(error),
                    adaptation: decision.adaptation,
                    suggested_url: decision.suggested_url,
                    wait_ms: decision.wait_ms,
                    visited_url: Some(url.to_string()),
                    visited_depth: Some(depth),
                });
            }
        }
    }

    /// Classifies, extracts, discovers links, and records the outcome for
    /// freshly captured HTML (from a fetch or a resolved handoff)
    async fn process_capture(
        &mut self,
        state: &mut CrawlState,
        postings: &mut Vec<JobPosting>,
        capture_id: u64,
        html: &str,
        final_url: &str,
        depth: u32,
    ) {
        let page_type = self.classifier.classify(html, final_url);
        let extracted = self.extractor.extract(html, final_url).await;
        let jobs_count = extracted.len() as u32;
        postings.extend(extracted);

        let links = extract_links(html, final_url);
        let links_admitted = state.admit_links(&links, depth);

        if matches!(page_type, PageType::Listing | PageType::CompanyCareers) {
            let seeded = state.seed_pagination(final_url, depth);
            if seeded > 0 {
                tracing::debug!(url = %final_url, seeded, "Seeded pagination");
            }
        }

        tracing::info!(
            capture_id,
            url = %final_url,
            page_type = %page_type,
            jobs_count,
            links_admitted,
            "Visit completed"
        );
        self.publish(CrawlEvent::VisitCompleted {
            capture_id,
            url: final_url.to_string(),
            page_type,
            jobs_count,
            links_admitted,
        });

        let summary = VisitSummary {
            url: final_url,
            page_type,
            jobs_count,
            error: None,
            retry_count: state.retry_count,
            url_correction_attempts: state.url_correction_attempts,
        };
        let decision = self.advisor.advise(&summary).await.normalize();

        state.record_outcome(VisitOutcome {
            capture_id,
            page_type: Some(page_type),
            jobs_count,
            error: None,
            adaptation: decision.adaptation,
            suggested_url: decision.suggested_url,
            wait_ms: decision.wait_ms,
            visited_url: Some(final_url.to_string()),
            visited_depth: Some(depth),
        });
    }

    /// Parks on a handoff gate until a human resolves or cancels
    async fn handoff(
        &mut self,
        state: &mut CrawlState,
        postings: &mut Vec<JobPosting>,
        gate: Arc<HandoffGate>,
        url: &str,
    ) {
        let purpose = gate.purpose();
        tracing::info!(url = %url, purpose, "Waiting for human intervention");
        self.publish(CrawlEvent::HumanHandoffRequested {
            url: url.to_string(),
            purpose: purpose.to_string(),
        });

        match gate.wait_for_human().await {
            Ok(html) => {
                tracing::info!(url = %url, purpose, "Human handoff resolved");
                self.publish(CrawlEvent::HumanHandoffResolved {
                    url: url.to_string(),
                    purpose: purpose.to_string(),
                });

                let capture_id = self.next_capture_id();
                self.process_capture(state, postings, capture_id, &html, url, 0)
                    .await;
            }

            Err(GateError::Cancelled(reason)) => {
                tracing::warn!(url = %url, purpose, "Handoff cancelled: {}", reason);
                state.stop_handle().request_stop();
                state.record_outcome(VisitOutcome {
                    error: Some(reason),
                    ..Default::default()
                });
            }

            Err(e) => {
                tracing::error!(url = %url, purpose, "Handoff failed: {}", e);
                state.record_outcome(VisitOutcome {
                    error: Some(e.to_string()),
                    ..Default::default()
                });
            }
        }
    }

    fn publish(&self, event: CrawlEvent) {
        if let Some(sink) = &self.events {
            // Receiver may be gone; events are best-effort telemetry.
            let _ = sink.send(event);
        }
    }

    fn next_capture_id(&mut self) -> u64 {
        self.capture_counter += 1;
        self.capture_counter
    }
}
