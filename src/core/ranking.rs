use std::cmp::Ordering;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use crate::core::filters::{paginate, ApplicationFilter, Page};
use crate::core::scoring::{clamp_score, compare_results, Scorer, SimpleScorer};
use crate::error::ServiceError;
use crate::models::{
    ApplicationAnalysis, ApplicationStatus, ApplicationView, MatchResult, Project, User,
};
use crate::services::EntityCache;

/// Shortlist size used when the caller gives none (or a non-positive one)
pub const DEFAULT_TOP_K: usize = 5;

/// Tunables for the ranking engine
#[derive(Debug, Clone, Copy)]
pub struct RankingOptions {
    pub default_top_k: usize,
    /// Force the simple scorer for every listing view, whatever the caller asks
    pub list_force_simple: bool,
    /// Budget for one rank/analyze/listing call
    pub request_timeout: Duration,
}

impl Default for RankingOptions {
    fn default() -> Self {
        Self {
            default_top_k: DEFAULT_TOP_K,
            list_force_simple: false,
            request_timeout: Duration::from_secs(30),
        }
    }
}

/// How a student's own application list is scored
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreMode {
    /// No scoring at all, every score is 0
    Plain,
    /// Simple scorer only
    Fast,
    /// Configured scorer, unless listings are forced to the simple one
    Configured,
}

/// Ranking orchestrator
///
/// # Two-tier ranking
/// 1. Simple prefilter over every live project, sorted
/// 2. Truncate to the top K
/// 3. Rescore only those K with the configured scorer (skipped when `fast`)
///
/// The configured scorer is injected once at startup. The prefilter is always
/// the in-process [`SimpleScorer`], so expensive calls never exceed K per
/// request regardless of catalog size.
pub struct RankingEngine {
    cache: Arc<EntityCache>,
    scorer: Arc<dyn Scorer>,
    prefilter: SimpleScorer,
    options: RankingOptions,
}

impl RankingEngine {
    pub fn new(cache: Arc<EntityCache>, scorer: Arc<dyn Scorer>, options: RankingOptions) -> Self {
        Self {
            cache,
            scorer,
            prefilter: SimpleScorer::new(),
            options,
        }
    }

    /// Name of the injected scorer
    pub fn scorer_name(&self) -> &'static str {
        self.scorer.name()
    }

    /// Run `fut` under the request budget. On expiry the future is dropped;
    /// ranking performs no writes, so nothing partial is left behind.
    async fn with_deadline<T, F>(&self, fut: F) -> Result<T, ServiceError>
    where
        F: Future<Output = Result<T, ServiceError>>,
    {
        match tokio::time::timeout(self.options.request_timeout, fut).await {
            Ok(result) => result,
            Err(_) => {
                tracing::warn!(
                    "Request exceeded its {:?} budget, abandoning in-flight scoring",
                    self.options.request_timeout
                );
                Err(ServiceError::Timeout(self.options.request_timeout))
            }
        }
    }

    async fn load_student(&self, student_id: i64) -> Result<User, ServiceError> {
        match self.cache.get_user(student_id).await? {
            Some(user) if user.is_student() => Ok(user),
            _ => Err(ServiceError::not_found(format!("student {} does not exist", student_id))),
        }
    }

    async fn candidate_projects(&self) -> Result<Vec<Project>, ServiceError> {
        let projects = self.cache.list_projects().await?;
        Ok(projects.iter().filter(|p| !p.archived).cloned().collect())
    }

    fn resolve_top_k(&self, top_k: Option<i64>) -> usize {
        match top_k {
            Some(k) if k > 0 => k as usize,
            _ => self.options.default_top_k.max(1),
        }
    }

    /// Rank all live projects for a student with the two-tier policy
    pub async fn rank(
        &self,
        student_id: i64,
        fast: bool,
        top_k: Option<i64>,
    ) -> Result<Vec<MatchResult>, ServiceError> {
        self.with_deadline(async {
            let student = self.load_student(student_id).await?;
            let projects = self.candidate_projects().await?;

            let results = self.two_tier(&student, &projects, fast, top_k).await;

            tracing::info!(
                "Ranked {} of {} projects for student {} (fast: {}, scorer: {})",
                results.len(),
                projects.len(),
                student_id,
                fast,
                if fast { self.prefilter.name() } else { self.scorer.name() }
            );

            Ok(results)
        })
        .await
    }

    /// Score every live project with the configured scorer. Order is not
    /// guaranteed; callers sort if they need to.
    pub async fn rank_full(&self, student_id: i64) -> Result<Vec<MatchResult>, ServiceError> {
        self.with_deadline(async {
            let student = self.load_student(student_id).await?;
            let projects = self.candidate_projects().await?;
            let mut results = self.scorer.score(&student, &projects).await;
            clamp_all(&mut results);
            Ok(results)
        })
        .await
    }

    /// Stage 1: simple scores for every project, sorted, cut to `k`
    pub fn prefilter(&self, student: &User, projects: &[Project], k: usize) -> Vec<MatchResult> {
        let mut scored = self.prefilter.score_all(student, projects);
        scored.sort_by(compare_results);
        scored.truncate(k);
        scored
    }

    /// Two-tier ranking over an already-loaded candidate set
    pub async fn two_tier(
        &self,
        student: &User,
        projects: &[Project],
        fast: bool,
        top_k: Option<i64>,
    ) -> Vec<MatchResult> {
        let k = self.resolve_top_k(top_k);
        let shortlist = self.prefilter(student, projects, k);

        if fast || shortlist.is_empty() {
            return shortlist;
        }

        // Stage 2: rerank the shortlist only
        let subset: Vec<Project> = shortlist.into_iter().map(|r| r.project).collect();
        let mut detailed = self.scorer.score(student, &subset).await;
        clamp_all(&mut detailed);

        // Stable sort keeps the prefilter order among equal scores
        detailed.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
        detailed
    }

    fn listing_scorer(&self, fast: bool) -> &dyn Scorer {
        if fast || self.options.list_force_simple {
            &self.prefilter
        } else {
            self.scorer.as_ref()
        }
    }

    async fn score_pair(&self, scorer: &dyn Scorer, student: &User, project: &Project) -> (f64, String) {
        scorer
            .score(student, std::slice::from_ref(project))
            .await
            .into_iter()
            .next()
            .map(|r| (clamp_score(r.score), r.reason.unwrap_or_default()))
            .unwrap_or((0.0, String::new()))
    }

    /// Score every application to the teacher's projects, optionally for
    /// a single project only
    pub async fn analyze(
        &self,
        teacher_id: i64,
        project_id: Option<i64>,
        fast: bool,
    ) -> Result<Vec<ApplicationAnalysis>, ServiceError> {
        self.with_deadline(async {
            let scorer = self.listing_scorer(fast);
            let applications = self.cache.store().list_applications().await?;

            let mut out = Vec::new();
            for application in applications {
                if project_id.is_some_and(|pid| pid != application.project_id) {
                    continue;
                }
                let project = match self.cache.get_project(application.project_id).await? {
                    Some(project) if project.teacher_id == teacher_id => project,
                    _ => continue,
                };
                let Some(student) = self.cache.get_user(application.student_id).await? else {
                    continue;
                };

                let (score, reason) = self.score_pair(scorer, &student, &project).await;
                out.push(ApplicationAnalysis {
                    application,
                    student,
                    project,
                    score,
                    reason,
                });
            }

            tracing::debug!(
                "Analyzed {} applications for teacher {} with {} scorer",
                out.len(),
                teacher_id,
                scorer.name()
            );
            Ok(out)
        })
        .await
    }

    /// Admin listing: filter, paginate, then score only the rows on the page
    pub async fn list_application_views(
        &self,
        filter: &ApplicationFilter,
        page: Page,
        fast: bool,
    ) -> Result<Vec<ApplicationView>, ServiceError> {
        self.with_deadline(async {
            let scorer = self.listing_scorer(fast);
            let applications = self.cache.store().list_applications().await?;
            let rows = paginate(applications.into_iter().filter(|a| filter.matches(a)), page);

            let mut views = Vec::with_capacity(rows.len());
            for application in rows {
                let (Some(student), Some(project)) = (
                    self.cache.get_user(application.student_id).await?,
                    self.cache.get_project(application.project_id).await?,
                ) else {
                    continue;
                };
                let (score, _) = self.score_pair(scorer, &student, &project).await;
                views.push(ApplicationView {
                    application,
                    student,
                    project,
                    score,
                });
            }
            Ok(views)
        })
        .await
    }

    /// A student's own applications, optionally filtered by status
    pub async fn student_application_views(
        &self,
        student_id: i64,
        status: Option<ApplicationStatus>,
        page: Page,
        mode: ScoreMode,
    ) -> Result<Vec<ApplicationView>, ServiceError> {
        self.with_deadline(async {
            let student = self.load_student(student_id).await?;
            let applications = self.cache.store().list_applications_by_student(student_id).await?;
            let rows = paginate(
                applications
                    .into_iter()
                    .filter(|a| status.as_ref().map_or(true, |s| &a.status == s)),
                page,
            );

            let mut views = Vec::with_capacity(rows.len());
            for application in rows {
                let Some(project) = self.cache.get_project(application.project_id).await? else {
                    continue;
                };
                let score = match mode {
                    ScoreMode::Plain => 0.0,
                    ScoreMode::Fast => self.score_pair(&self.prefilter, &student, &project).await.0,
                    ScoreMode::Configured => {
                        self.score_pair(self.listing_scorer(false), &student, &project).await.0
                    }
                };
                views.push(ApplicationView {
                    application,
                    student: student.clone(),
                    project,
                    score,
                });
            }
            Ok(views)
        })
        .await
    }
}

fn clamp_all(results: &mut [MatchResult]) {
    for result in results.iter_mut() {
        result.score = clamp_score(result.score);
    }
}
