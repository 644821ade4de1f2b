use async_trait::async_trait;
use std::cmp::Ordering;

use crate::core::normalize::tag_set;
use crate::models::{MatchResult, Project, User};

/// Strategy that scores a student against a batch of projects.
///
/// Implementations return exactly one result per input project, in input
/// order, with every score inside `[0, 1]`. Failures for one project must be
/// folded into that project's result (score 0 and a reason) and must not
/// abort the rest of the batch.
#[async_trait]
pub trait Scorer: Send + Sync {
    /// Short label used in logs and responses
    fn name(&self) -> &'static str;

    async fn score(&self, student: &User, projects: &[Project]) -> Vec<MatchResult>;
}

/// Clip a raw score into `[0, 1]`; non-finite values become 0.
#[inline]
pub fn clamp_score(raw: f64) -> f64 {
    if !raw.is_finite() {
        return 0.0;
    }
    raw.clamp(0.0, 1.0)
}

/// Ranking order: score descending, then matched-skill count descending,
/// then project id ascending.
pub fn compare_results(a: &MatchResult, b: &MatchResult) -> Ordering {
    b.score
        .partial_cmp(&a.score)
        .unwrap_or(Ordering::Equal)
        .then_with(|| b.matched_skills.len().cmp(&a.matched_skills.len()))
        .then_with(|| a.project.id.cmp(&b.project.id))
}

/// Deterministic coverage scorer.
///
/// score = |skills ∩ requirements| / |requirements|
///
/// Projects without requirements are scored against their tags instead. A
/// project with neither scores 0. Inputs are re-normalized here, so stored
/// lists that skipped normalization still behave as sets.
#[derive(Debug, Clone, Copy, Default)]
pub struct SimpleScorer;

impl SimpleScorer {
    pub fn new() -> Self {
        Self
    }

    /// Score one project. Pure, no I/O.
    pub fn score_project(&self, student: &User, project: &Project) -> MatchResult {
        let skills = tag_set(&student.skills);
        let (basis, label) = if project.requirements.iter().any(|r| !r.trim().is_empty()) {
            (tag_set(&project.requirements), "requirements")
        } else {
            (tag_set(&project.tags), "tags")
        };

        if basis.is_empty() {
            return MatchResult {
                project: project.clone(),
                score: 0.0,
                reason: Some("project lists no requirements or tags".to_string()),
                matched_skills: Vec::new(),
            };
        }

        let matched: Vec<String> = basis.intersection(&skills).cloned().collect();
        let score = clamp_score(matched.len() as f64 / basis.len() as f64);

        let reason = if matched.is_empty() {
            format!("no overlap with {} {}", basis.len(), label)
        } else {
            format!(
                "matched {} of {} {}: {}",
                matched.len(),
                basis.len(),
                label,
                matched.join(", ")
            )
        };

        MatchResult {
            project: project.clone(),
            score,
            reason: Some(reason),
            matched_skills: matched,
        }
    }

    pub fn score_all(&self, student: &User, projects: &[Project]) -> Vec<MatchResult> {
        projects
            .iter()
            .map(|project| self.score_project(student, project))
            .collect()
    }
}

#[async_trait]
impl Scorer for SimpleScorer {
    fn name(&self) -> &'static str {
        "simple"
    }

    async fn score(&self, student: &User, projects: &[Project]) -> Vec<MatchResult> {
        self.score_all(student, projects)
    }
}
