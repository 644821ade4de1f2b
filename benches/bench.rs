// Criterion benchmarks for Research Match

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use research_match::core::{normalize_tags, RankingEngine, RankingOptions, SimpleScorer};
use research_match::models::{Project, Role, User};
use research_match::services::{EntityCache, MemoryStore, Store};
use std::sync::Arc;
use std::time::Duration;

const VOCABULARY: [&str; 12] = [
    "python", "rust", "ml", "nlp", "statistics", "sql", "graphs", "vision", "go", "r",
    "bioinformatics", "latex",
];

fn create_project(id: usize) -> Project {
    let requirements = (0..1 + id % 4)
        .map(|offset| VOCABULARY[(id + offset * 5) % VOCABULARY.len()].to_string())
        .collect();
    Project {
        id: id as i64,
        teacher_id: 1,
        title: format!("Project {}", id),
        description: "research".to_string(),
        requirements,
        tags: vec![],
        archived: false,
    }
}

fn create_student() -> User {
    User {
        id: 1,
        name: "Student".to_string(),
        email: "student@uni.edu".to_string(),
        role: Role::Student,
        skills: vec!["python".to_string(), "ml".to_string(), "sql".to_string()],
    }
}

fn bench_normalize(c: &mut Criterion) {
    let raw = vec![" Python", "python ", "ML", "", "Sql", "  graphs  ", "ml"];
    c.bench_function("normalize_tags", |b| {
        b.iter(|| normalize_tags(black_box(&raw)));
    });
}

fn bench_simple_scorer(c: &mut Criterion) {
    let scorer = SimpleScorer::new();
    let student = create_student();

    let mut group = c.benchmark_group("simple_scorer");

    for project_count in [10, 100, 1000].iter() {
        let projects: Vec<Project> = (0..*project_count).map(create_project).collect();

        group.bench_with_input(
            BenchmarkId::new("score_all", project_count),
            project_count,
            |b, _| {
                b.iter(|| scorer.score_all(black_box(&student), black_box(&projects)));
            },
        );
    }

    group.finish();
}

fn bench_two_tier_fast(c: &mut Criterion) {
    let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
    let cache = Arc::new(EntityCache::new(store, 100, Duration::from_secs(60)));
    let engine = RankingEngine::new(cache, Arc::new(SimpleScorer::new()), RankingOptions::default());
    let student = create_student();
    let projects: Vec<Project> = (0..1000).map(create_project).collect();

    c.bench_function("prefilter_1000_projects_top5", |b| {
        b.iter(|| black_box(engine.prefilter(&student, &projects, 5)));
    });

    c.bench_function("two_tier_fast_1000_projects", |b| {
        b.iter(|| {
            tokio_test::block_on(engine.two_tier(
                black_box(&student),
                black_box(&projects),
                true,
                Some(5),
            ))
        });
    });
}

criterion_group!(benches, bench_normalize, bench_simple_scorer, bench_two_tier_fast);

criterion_main!(benches);
