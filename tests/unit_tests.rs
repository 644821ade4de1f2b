// Unit tests for Research Match

use research_match::core::{
    check_transition, clamp_score, compare_results, normalize_tags, paginate, Page, SimpleScorer,
    Transition,
};
use research_match::models::{ApplicationStatus, Project, Role, User};
use research_match::services::SemanticScorer;

fn student(skills: &[&str]) -> User {
    User {
        id: 1,
        name: "Student".to_string(),
        email: "student@uni.edu".to_string(),
        role: Role::Student,
        skills: skills.iter().map(|s| s.to_string()).collect(),
    }
}

fn project(id: i64, requirements: &[&str]) -> Project {
    Project {
        id,
        teacher_id: 10,
        title: format!("Project {}", id),
        description: "research".to_string(),
        requirements: requirements.iter().map(|s| s.to_string()).collect(),
        tags: vec![],
        archived: false,
    }
}

#[test]
fn test_scores_stay_in_unit_interval() {
    let scorer = SimpleScorer::new();
    let s = student(&["a", "b", "c", "d"]);
    let projects = [
        project(1, &[]),
        project(2, &["a"]),
        project(3, &["a", "z"]),
        project(4, &["x", "y", "z"]),
        project(5, &["a", "b", "c", "d", "e"]),
    ];

    for result in scorer.score_all(&s, &projects) {
        assert!((0.0..=1.0).contains(&result.score), "score {} out of range", result.score);
    }
}

#[test]
fn test_score_is_coverage_of_requirements() {
    let result = SimpleScorer::new().score_project(&student(&["python", "ml"]), &project(1, &["python", "nlp"]));
    assert_eq!(result.score, 0.5);
}

#[test]
fn test_extra_skills_do_not_change_score() {
    let scorer = SimpleScorer::new();
    let p = project(1, &["python", "nlp"]);
    let narrow = scorer.score_project(&student(&["python"]), &p);
    let broad = scorer.score_project(&student(&["python", "go", "haskell", "sql"]), &p);
    assert_eq!(narrow.score, broad.score);
}

#[test]
fn test_ranking_order_is_deterministic() {
    let scorer = SimpleScorer::new();
    let s = student(&["a"]);
    let mut results = scorer.score_all(&s, &[project(9, &["a"]), project(3, &["a"]), project(5, &["b"])]);
    results.sort_by(compare_results);

    let ids: Vec<i64> = results.iter().map(|r| r.project.id).collect();
    assert_eq!(ids, vec![3, 9, 5]);
}

#[test]
fn test_clamp_handles_garbage() {
    assert_eq!(clamp_score(f64::NEG_INFINITY), 0.0);
    assert_eq!(clamp_score(42.0), 1.0);
}

#[test]
fn test_normalize_is_idempotent() {
    let once = normalize_tags(["B", " a ", "b", ""]);
    let twice = normalize_tags(&once);
    assert_eq!(once, vec!["a", "b"]);
    assert_eq!(once, twice);
}

#[test]
fn test_transition_table() {
    use ApplicationStatus::*;
    assert_eq!(check_transition(&Submitted, &Rejected).unwrap(), Transition::Apply);
    assert_eq!(check_transition(&Rejected, &Approved).unwrap(), Transition::Apply);
    assert_eq!(check_transition(&Approved, &Approved).unwrap(), Transition::NoOp);
    assert!(check_transition(&Approved, &Submitted).is_err());
    assert!(check_transition(&Approved, &Other("waitlist".to_string())).is_err());
}

#[test]
fn test_status_labels_normalize() {
    assert_eq!(" APPROVED ".parse::<ApplicationStatus>().unwrap(), ApplicationStatus::Approved);
    assert_eq!(
        "Interview".parse::<ApplicationStatus>().unwrap(),
        ApplicationStatus::Other("interview".to_string())
    );
    assert!("".parse::<ApplicationStatus>().is_err());
}

#[test]
fn test_pagination_edges() {
    let items: Vec<i32> = (0..10).collect();
    assert_eq!(paginate(items.clone(), Page::new(Some(-1), Some(0), 4)), vec![0, 1, 2, 3]);
    assert_eq!(paginate(items.clone(), Page::new(Some(3), Some(4), 50)), vec![8, 9]);
    assert!(paginate(items, Page::new(Some(4), Some(4), 50)).is_empty());
}

#[test]
fn test_semantic_reply_parsing() {
    assert_eq!(
        SemanticScorer::parse_reply(r#"{"score": 0.7, "reason": "ok"}"#),
        (0.7, "ok".to_string())
    );
    assert_eq!(
        SemanticScorer::parse_reply("not json at all"),
        (0.0, "not json at all".to_string())
    );
}

#[test]
fn test_async_scorer_via_block_on() {
    use research_match::core::Scorer;
    let results = tokio_test::block_on(SimpleScorer::new().score(&student(&["a"]), &[project(1, &["a"])]));
    assert_eq!(results[0].score, 1.0);
}
