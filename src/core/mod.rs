// Core domain exports
pub mod catalog;
pub mod filters;
pub mod normalize;
pub mod ranking;
pub mod scoring;
pub mod workflow;

pub use catalog::Catalog;
pub use filters::{paginate, ApplicationFilter, Page, ProjectFilter, DEFAULT_PAGE_SIZE};
pub use normalize::{normalize_tags, tag_set};
pub use ranking::{RankingEngine, RankingOptions, ScoreMode, DEFAULT_TOP_K};
pub use scoring::{clamp_score, compare_results, Scorer, SimpleScorer};
pub use workflow::{check_transition, ApplicationWorkflow, Transition};
