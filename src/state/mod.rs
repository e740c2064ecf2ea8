//! Per-run crawl state
//!
//! Tracks which URLs have been visited and when each origin was last hit.

mod domain_state;
mod visited;

pub use domain_state::DomainState;
pub use visited::{VisitedSet, DEFAULT_MAX_TRACKED};
