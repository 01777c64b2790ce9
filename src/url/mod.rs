//! URL handling module for Jobtrail
//!
//! This module provides URL normalization, host extraction, link filtering,
//! frontier priority estimation, and pagination seed generation.

mod domain;
mod filter;
mod normalize;
mod pagination;
mod priority;

pub use domain::{domains_related, extract_host};
pub use filter::{filter_links, DiscoveredLink, FilterContext};
pub use normalize::normalize_url;
pub use pagination::generate_pagination_seeds;
pub use priority::{estimate_priority, DEFAULT_PRIORITY};
