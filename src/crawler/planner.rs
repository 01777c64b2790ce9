//! The planner: a pure decision function over crawl state
//!
//! `plan` inspects one source's `CrawlState` and returns exactly one next
//! action. It performs no I/O, never suspends, and never logs; the only
//! state it touches are the counters and the consumed last-result, per the
//! contract. The driver loop executes the action and folds the outcome back
//! before planning again.

use crate::crawler::state::{Adaptation, CrawlState, PageType};
use crate::url::normalize_url;

/// The single next step for a source's crawl
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Fetch, classify, and extract one page
    VisitUrl { url: String, depth: u32 },

    /// Suspend until a human completes a login
    TriggerLoginWall { url: String },

    /// Suspend until a human solves a CAPTCHA
    TriggerCaptcha { url: String },

    /// Replace a broken source URL and visit the replacement
    ///
    /// The executor increments `url_correction_attempts`; the planner only
    /// gates on the counter.
    ApplyUrlCorrection { url: String, source_name: String },

    /// Wait, then re-visit the same page
    RetryWait {
        wait_ms: u64,
        reason: String,
        retry_url: String,
        retry_depth: u32,
    },

    /// The cycle is over for this source
    CycleDone { reason: String },
}

/// Decides the next action for a source
///
/// Decision order (first matching rule wins), encoding
/// cancellation > advisor-directed recovery > classifier-directed recovery >
/// error correction > normal exploration > termination:
///
/// 1. `stop_requested` always yields `CycleDone`.
/// 2. A pending adaptation is consumed exactly once (the whole last
///    outcome is taken here, implementing its one-consumer lifecycle):
///    - `LoginWallHuman` / `CaptchaHumanSolve` fire only when the
///      classifier agrees on the page type, defending against false
///      positives from text-pattern checks elsewhere;
///    - `TryNewUrl` fires while correction attempts remain;
///    - `RetryExtraction` fires while retries remain and increments
///      `retry_count` as part of planning;
///    - `RetryCycleSoon` and any tag that fails its gate are dropped and
///      evaluation falls through.
/// 3. A blocking page type escalates directly when no adaptation fired.
/// 4. An error page spends a URL-correction attempt if any remain.
/// 5. If the zero-job exhaustion limit is enabled and met, the cycle ends;
///    otherwise pop the highest-priority frontier item, skipping entries
///    whose normalized form was already seen. An accepted pop records the
///    normalized URL as seen and resets `retry_count`.
/// 6. An empty frontier ends the cycle.
pub fn plan(state: &mut CrawlState) -> Action {
    if state.stop_requested() {
        return Action::CycleDone {
            reason: "Stop requested".to_string(),
        };
    }

    if let Some(mut outcome) = state.last_result.take() {
        let page_url = outcome
            .visited_url
            .clone()
            .unwrap_or_else(|| state.source_url.clone());

        if let Some(tag) = outcome.adaptation.take() {
            match tag {
                Adaptation::LoginWallHuman
                    if outcome.page_type == Some(PageType::LoginWall) =>
                {
                    return Action::TriggerLoginWall { url: page_url };
                }
                Adaptation::CaptchaHumanSolve
                    if outcome.page_type == Some(PageType::CaptchaChallenge) =>
                {
                    return Action::TriggerCaptcha { url: page_url };
                }
                Adaptation::TryNewUrl
                    if state.url_correction_attempts
                        < state.limits.max_url_correction_attempts =>
                {
                    return Action::ApplyUrlCorrection {
                        url: outcome
                            .suggested_url
                            .take()
                            .unwrap_or_else(|| state.source_url.clone()),
                        source_name: state.source_name.clone(),
                    };
                }
                Adaptation::RetryExtraction if state.retry_count < state.limits.max_retries => {
                    state.retry_count += 1;
                    return Action::RetryWait {
                        wait_ms: outcome.wait_ms.unwrap_or(state.limits.default_retry_wait_ms),
                        reason: outcome
                            .error
                            .take()
                            .unwrap_or_else(|| "Extraction produced nothing".to_string()),
                        retry_url: page_url,
                        retry_depth: outcome.visited_depth.unwrap_or(0),
                    };
                }
                // RetryCycleSoon means "not fatal, keep going"; a tag that
                // failed its gate is dropped the same way.
                _ => {}
            }
        }

        match outcome.page_type {
            Some(PageType::LoginWall) => {
                return Action::TriggerLoginWall { url: page_url };
            }
            Some(PageType::CaptchaChallenge) => {
                return Action::TriggerCaptcha { url: page_url };
            }
            Some(PageType::Error)
                if state.url_correction_attempts < state.limits.max_url_correction_attempts =>
            {
                return Action::ApplyUrlCorrection {
                    url: outcome
                        .suggested_url
                        .take()
                        .unwrap_or_else(|| state.source_url.clone()),
                    source_name: state.source_name.clone(),
                };
            }
            _ => {}
        }
    }

    if let Some(max) = state.limits.max_consecutive_zero_job_visits {
        if max > 0 && state.consecutive_zero_job_visits >= max {
            return Action::CycleDone {
                reason: format!(
                    "Exhausted: {} consecutive visits yielded no jobs",
                    state.consecutive_zero_job_visits
                ),
            };
        }
    }

    while let Some(item) = state.frontier.pop_highest() {
        let normalized = normalize_url(&item.url);
        if state.url_seen.contains(&normalized) {
            continue;
        }
        state.url_seen.insert(normalized.clone());
        state.retry_count = 0;
        return Action::VisitUrl {
            url: normalized,
            depth: item.depth,
        };
    }

    Action::CycleDone {
        reason: "Frontier empty".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crawler::frontier::FrontierItem;
    use crate::crawler::state::{CrawlLimits, VisitOutcome};

    fn test_state() -> CrawlState {
        CrawlState::new("acme", "https://acme.com/jobs", CrawlLimits::default()).unwrap()
    }

    fn visit_url(action: Action) -> String {
        match action {
            Action::VisitUrl { url, .. } => url,
            other => panic!("expected VisitUrl, got {:?}", other),
        }
    }

    #[test]
    fn test_first_plan_visits_seed() {
        let mut state = test_state();
        let action = plan(&mut state);

        assert_eq!(
            action,
            Action::VisitUrl {
                url: "https://acme.com/jobs".to_string(),
                depth: 0
            }
        );
        assert!(state.url_seen.contains("https://acme.com/jobs"));
    }

    #[test]
    fn test_empty_frontier_ends_cycle() {
        let mut state = test_state();
        plan(&mut state); // consumes the seed

        assert_eq!(
            plan(&mut state),
            Action::CycleDone {
                reason: "Frontier empty".to_string()
            }
        );
    }

    #[test]
    fn test_stop_preempts_everything() {
        let mut state = test_state();
        state.frontier.push(FrontierItem::new("https://acme.com/careers", 1));
        state.record_outcome(VisitOutcome {
            page_type: Some(PageType::CaptchaChallenge),
            adaptation: Some(Adaptation::CaptchaHumanSolve),
            visited_url: Some("https://acme.com/jobs".to_string()),
            ..Default::default()
        });
        state.stop_handle().request_stop();

        assert_eq!(
            plan(&mut state),
            Action::CycleDone {
                reason: "Stop requested".to_string()
            }
        );
    }

    #[test]
    fn test_no_duplicate_visits() {
        let mut state = test_state();
        state.frontier.push(FrontierItem::new("https://acme.com/jobs/", 1));
        state.frontier.push(FrontierItem::new("https://acme.com/jobs#all", 1));
        state.frontier.push(FrontierItem::new("https://acme.com/about", 1));

        let first = visit_url(plan(&mut state));
        let second = visit_url(plan(&mut state));
        assert_ne!(first, second);

        // Only the seed and /about are distinct pages; the rest normalize
        // to the seed and are discarded at pop time.
        assert_eq!(
            plan(&mut state),
            Action::CycleDone {
                reason: "Frontier empty".to_string()
            }
        );
    }

    #[test]
    fn test_priority_order_with_stable_ties() {
        let mut state = test_state();
        plan(&mut state); // drain the seed
        state.frontier.push(FrontierItem::with_priority("https://acme.com/a", 1, 50));
        state.frontier.push(FrontierItem::with_priority("https://acme.com/b", 1, 90));
        state.frontier.push(FrontierItem::with_priority("https://acme.com/c", 1, 70));
        state.frontier.push(FrontierItem::with_priority("https://acme.com/d", 1, 90));

        assert_eq!(visit_url(plan(&mut state)), "https://acme.com/b");
        assert_eq!(visit_url(plan(&mut state)), "https://acme.com/d");
        assert_eq!(visit_url(plan(&mut state)), "https://acme.com/c");
        assert_eq!(visit_url(plan(&mut state)), "https://acme.com/a");
    }

    #[test]
    fn test_retry_extraction_bounded() {
        let mut state = test_state();
        plan(&mut state);

        for attempt in 0..state.limits.max_retries {
            state.record_outcome(VisitOutcome {
                adaptation: Some(Adaptation::RetryExtraction),
                visited_url: Some("https://acme.com/jobs".to_string()),
                visited_depth: Some(0),
                wait_ms: Some(5),
                ..Default::default()
            });
            let action = plan(&mut state);
            assert!(
                matches!(action, Action::RetryWait { .. }),
                "attempt {} should retry, got {:?}",
                attempt,
                action
            );
        }

        // Budget exhausted: the same adaptation now falls through to the
        // (empty) frontier.
        state.record_outcome(VisitOutcome {
            adaptation: Some(Adaptation::RetryExtraction),
            visited_url: Some("https://acme.com/jobs".to_string()),
            visited_depth: Some(0),
            ..Default::default()
        });
        assert_eq!(
            plan(&mut state),
            Action::CycleDone {
                reason: "Frontier empty".to_string()
            }
        );
    }

    #[test]
    fn test_retry_wait_uses_default_when_unspecified() {
        let mut state = test_state();
        plan(&mut state);
        state.record_outcome(VisitOutcome {
            adaptation: Some(Adaptation::RetryExtraction),
            visited_url: Some("https://acme.com/jobs".to_string()),
            visited_depth: Some(0),
            ..Default::default()
        });

        match plan(&mut state) {
            Action::RetryWait {
                wait_ms,
                retry_url,
                retry_depth,
                ..
            } => {
                assert_eq!(wait_ms, state.limits.default_retry_wait_ms);
                assert_eq!(retry_url, "https://acme.com/jobs");
                assert_eq!(retry_depth, 0);
            }
            other => panic!("expected RetryWait, got {:?}", other),
        }
    }

    #[test]
    fn test_retry_count_resets_on_new_pop() {
        let mut state = test_state();
        plan(&mut state);
        state.record_outcome(VisitOutcome {
            adaptation: Some(Adaptation::RetryExtraction),
            visited_url: Some("https://acme.com/jobs".to_string()),
            visited_depth: Some(0),
            ..Default::default()
        });
        plan(&mut state);
        assert_eq!(state.retry_count, 1);

        state.frontier.push(FrontierItem::new("https://acme.com/about", 1));
        state.record_outcome(VisitOutcome {
            visited_url: Some("https://acme.com/jobs".to_string()),
            jobs_count: 3,
            ..Default::default()
        });
        let action = plan(&mut state);
        assert!(matches!(action, Action::VisitUrl { .. }));
        assert_eq!(state.retry_count, 0);
    }

    #[test]
    fn test_login_wall_gating_rejects_false_positive() {
        let mut state = test_state();
        plan(&mut state);
        state.frontier.push(FrontierItem::new("https://acme.com/about", 1));

        // Advisor says login wall but the classifier saw a listing: the tag
        // is discarded and exploration continues.
        state.record_outcome(VisitOutcome {
            page_type: Some(PageType::Listing),
            adaptation: Some(Adaptation::LoginWallHuman),
            visited_url: Some("https://acme.com/jobs".to_string()),
            ..Default::default()
        });

        assert_eq!(visit_url(plan(&mut state)), "https://acme.com/about");
    }

    #[test]
    fn test_login_wall_gating_fires_on_agreement() {
        let mut state = test_state();
        plan(&mut state);
        state.record_outcome(VisitOutcome {
            page_type: Some(PageType::LoginWall),
            adaptation: Some(Adaptation::LoginWallHuman),
            visited_url: Some("https://acme.com/jobs".to_string()),
            ..Default::default()
        });

        assert_eq!(
            plan(&mut state),
            Action::TriggerLoginWall {
                url: "https://acme.com/jobs".to_string()
            }
        );
    }

    #[test]
    fn test_captcha_gating() {
        let mut state = test_state();
        plan(&mut state);
        state.record_outcome(VisitOutcome {
            page_type: Some(PageType::CaptchaChallenge),
            adaptation: Some(Adaptation::CaptchaHumanSolve),
            visited_url: Some("https://acme.com/jobs".to_string()),
            ..Default::default()
        });

        assert_eq!(
            plan(&mut state),
            Action::TriggerCaptcha {
                url: "https://acme.com/jobs".to_string()
            }
        );
    }

    #[test]
    fn test_classifier_triggers_without_adaptation() {
        let mut state = test_state();
        plan(&mut state);
        state.record_outcome(VisitOutcome {
            page_type: Some(PageType::LoginWall),
            visited_url: Some("https://acme.com/jobs".to_string()),
            ..Default::default()
        });

        assert_eq!(
            plan(&mut state),
            Action::TriggerLoginWall {
                url: "https://acme.com/jobs".to_string()
            }
        );
    }

    #[test]
    fn test_try_new_url_uses_suggestion() {
        let mut state = test_state();
        plan(&mut state);
        state.record_outcome(VisitOutcome {
            page_type: Some(PageType::Error),
            adaptation: Some(Adaptation::TryNewUrl),
            suggested_url: Some("https://acme.com/careers".to_string()),
            visited_url: Some("https://acme.com/jobs".to_string()),
            ..Default::default()
        });

        assert_eq!(
            plan(&mut state),
            Action::ApplyUrlCorrection {
                url: "https://acme.com/careers".to_string(),
                source_name: "acme".to_string()
            }
        );
    }

    #[test]
    fn test_try_new_url_falls_back_to_source() {
        let mut state = test_state();
        plan(&mut state);
        state.record_outcome(VisitOutcome {
            adaptation: Some(Adaptation::TryNewUrl),
            visited_url: Some("https://acme.com/jobs".to_string()),
            ..Default::default()
        });

        assert_eq!(
            plan(&mut state),
            Action::ApplyUrlCorrection {
                url: "https://acme.com/jobs".to_string(),
                source_name: "acme".to_string()
            }
        );
    }

    #[test]
    fn test_url_correction_bounded() {
        let mut state = test_state();
        plan(&mut state);
        state.url_correction_attempts = state.limits.max_url_correction_attempts;

        state.record_outcome(VisitOutcome {
            adaptation: Some(Adaptation::TryNewUrl),
            page_type: Some(PageType::Error),
            visited_url: Some("https://acme.com/jobs".to_string()),
            ..Default::default()
        });

        // Neither the adaptation nor the error branch may fire once the
        // budget is spent.
        assert_eq!(
            plan(&mut state),
            Action::CycleDone {
                reason: "Frontier empty".to_string()
            }
        );
    }

    #[test]
    fn test_error_page_without_adaptation_corrects() {
        let mut state = test_state();
        plan(&mut state);
        state.record_outcome(VisitOutcome {
            page_type: Some(PageType::Error),
            visited_url: Some("https://acme.com/jobs".to_string()),
            ..Default::default()
        });

        assert!(matches!(
            plan(&mut state),
            Action::ApplyUrlCorrection { .. }
        ));
    }

    #[test]
    fn test_retry_cycle_soon_falls_through() {
        let mut state = test_state();
        plan(&mut state);
        state.frontier.push(FrontierItem::new("https://acme.com/about", 1));
        state.record_outcome(VisitOutcome {
            adaptation: Some(Adaptation::RetryCycleSoon),
            visited_url: Some("https://acme.com/jobs".to_string()),
            ..Default::default()
        });

        assert_eq!(visit_url(plan(&mut state)), "https://acme.com/about");
    }

    #[test]
    fn test_adaptation_consumed_once() {
        let mut state = test_state();
        plan(&mut state);
        state.record_outcome(VisitOutcome {
            page_type: Some(PageType::Listing),
            adaptation: Some(Adaptation::LoginWallHuman),
            visited_url: Some("https://acme.com/jobs".to_string()),
            ..Default::default()
        });

        plan(&mut state);
        // The whole outcome was consumed; a second plan sees nothing stale.
        assert!(state.last_result.is_none());
    }

    #[test]
    fn test_exhaustion_stop_when_enabled() {
        let mut state = test_state();
        state.frontier.push(FrontierItem::new("https://acme.com/about", 1));
        state.consecutive_zero_job_visits =
            state.limits.max_consecutive_zero_job_visits.unwrap();

        match plan(&mut state) {
            Action::CycleDone { reason } => assert!(reason.starts_with("Exhausted")),
            other => panic!("expected exhaustion stop, got {:?}", other),
        }
    }

    #[test]
    fn test_exhaustion_disabled_keeps_exploring() {
        let mut state = test_state();
        state.limits.max_consecutive_zero_job_visits = None;
        state.consecutive_zero_job_visits = 1000;

        assert!(matches!(plan(&mut state), Action::VisitUrl { .. }));
    }

    #[test]
    fn test_blocking_page_beats_exhaustion() {
        let mut state = test_state();
        plan(&mut state);
        state.consecutive_zero_job_visits =
            state.limits.max_consecutive_zero_job_visits.unwrap() + 5;
        state.record_outcome(VisitOutcome {
            page_type: Some(PageType::CaptchaChallenge),
            visited_url: Some("https://acme.com/jobs".to_string()),
            ..Default::default()
        });

        assert!(matches!(plan(&mut state), Action::TriggerCaptcha { .. }));
    }
}
