//! Heuristic page classifier: the default `PageClassifier`
//!
//! Labels a page from text and DOM markers alone. The checks run in threat
//! order: a CAPTCHA interstitial often embeds the words of the page it is
//! guarding, so blocking markers must win over content markers.

use crate::crawler::collaborators::PageClassifier;
use crate::crawler::state::PageType;
use scraper::{Html, Selector};

const CAPTCHA_MARKERS: &[&str] = &[
    "g-recaptcha",
    "h-captcha",
    "cf-turnstile",
    "cf-challenge",
    "are you a robot",
    "verify you are human",
    "unusual traffic",
];

const LOGIN_MARKERS: &[&str] = &["log in", "login", "sign in", "signin"];

const ERROR_MARKERS: &[&str] = &[
    "page not found",
    "404 not found",
    "this page doesn't exist",
    "something went wrong",
];

const LISTING_MARKERS: &[&str] = &[
    "open positions",
    "open roles",
    "current openings",
    "we're hiring",
    "join our team",
    "browse jobs",
];

const CAREERS_MARKERS: &[&str] = &["careers at", "life at", "why work here", "our culture"];

/// Segments that mark an anchor as pointing at a job page
const JOB_LINK_SEGMENTS: &[&str] = &["/jobs/", "/job/", "/careers/", "/positions/", "/openings/"];

/// Classifies pages with fixed text/DOM heuristics
#[derive(Debug, Default)]
pub struct HeuristicClassifier;

impl PageClassifier for HeuristicClassifier {
    fn classify(&self, html: &str, url: &str) -> PageType {
        let lower = html.to_lowercase();
        let document = Html::parse_document(html);

        if contains_any(&lower, CAPTCHA_MARKERS) {
            return PageType::CaptchaChallenge;
        }

        if has_password_field(&document) && contains_any(&lower, LOGIN_MARKERS) {
            return PageType::LoginWall;
        }

        if contains_any(&lower, ERROR_MARKERS) {
            return PageType::Error;
        }

        let job_links = count_job_links(&document);

        if job_links >= 2 || contains_any(&lower, LISTING_MARKERS) {
            return PageType::Listing;
        }

        if job_links == 1 || is_detail_url(url) {
            return PageType::Detail;
        }

        if contains_any(&lower, CAREERS_MARKERS) {
            return PageType::CompanyCareers;
        }

        PageType::Other
    }
}

fn contains_any(haystack: &str, markers: &[&str]) -> bool {
    markers.iter().any(|m| haystack.contains(m))
}

fn has_password_field(document: &Html) -> bool {
    Selector::parse(r#"input[type="password"]"#)
        .map(|sel| document.select(&sel).next().is_some())
        .unwrap_or(false)
}

fn count_job_links(document: &Html) -> usize {
    let selector = match Selector::parse("a[href]") {
        Ok(s) => s,
        Err(_) => return 0,
    };

    document
        .select(&selector)
        .filter_map(|el| el.value().attr("href"))
        .filter(|href| {
            let lower = href.to_lowercase();
            JOB_LINK_SEGMENTS.iter().any(|seg| lower.contains(seg))
        })
        .count()
}

fn is_detail_url(url: &str) -> bool {
    let lower = url.to_lowercase();
    JOB_LINK_SEGMENTS
        .iter()
        .any(|seg| lower.contains(seg) && !lower.trim_end_matches('/').ends_with(seg.trim_end_matches('/')))
}
