// Core algorithm exports
pub mod decision;
pub mod filters;
pub mod history;
pub mod matcher;
pub mod pagination;

pub use decision::{Decision, UnknownDecision};
pub use filters::{filter_candidates, matches_candidate_query};
pub use history::{latest_messages, RECENT_MESSAGES_LIMIT};
pub use matcher::{is_mutual, resolve_mutual_matches};
pub use pagination::{PageError, PageInfo, PageRequest, PageWindow, Paginator};
