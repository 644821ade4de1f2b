//! Research Match - skill-based project matching for research groups
//!
//! Ranks research projects for students (a cheap coverage prefilter, then an
//! optional semantic rerank of the shortlist) and runs the application
//! workflow around it: submissions, status changes, progress tracking,
//! feedback and document metadata.

pub mod config;
pub mod core;
pub mod error;
pub mod models;
pub mod routes;
pub mod services;

// Re-export commonly used types
pub use crate::core::{ApplicationWorkflow, Catalog, RankingEngine, Scorer, SimpleScorer};
pub use crate::error::ServiceError;
pub use crate::models::{Application, ApplicationStatus, MatchResult, Project, Role, User};
pub use crate::services::{EntityCache, MemoryStore, PostgresStore, SemanticScorer, Store};
