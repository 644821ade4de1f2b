use std::collections::BTreeMap;
use std::sync::Arc;

use crate::core::filters::{matches_role, paginate, Page, ProjectFilter};
use crate::core::normalize::normalize_tags;
use crate::error::ServiceError;
use crate::models::{NewProject, NewUser, Project, Role, SystemStats, User};
use crate::services::EntityCache;

fn parse_role(raw: &str) -> Result<Role, ServiceError> {
    raw.parse().map_err(ServiceError::Validation)
}

fn require_text<'a>(value: &'a str, field: &str) -> Result<&'a str, ServiceError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ServiceError::validation(format!("{} is required", field)));
    }
    Ok(trimmed)
}

/// User and project use-cases plus admin statistics.
///
/// Every write goes through the [`EntityCache`] so cached slots and listing
/// snapshots stay coherent with the store.
pub struct Catalog {
    cache: Arc<EntityCache>,
}

impl Catalog {
    pub fn new(cache: Arc<EntityCache>) -> Self {
        Self { cache }
    }

    // ---- users ----

    pub async fn create_user(
        &self,
        name: &str,
        email: &str,
        role: &str,
        skills: &[String],
    ) -> Result<User, ServiceError> {
        let user = NewUser {
            name: require_text(name, "name")?.to_string(),
            email: require_text(email, "email")?.to_lowercase(),
            role: parse_role(role)?,
            skills: normalize_tags(skills),
        };

        let created = self.cache.create_user(user).await?;
        tracing::info!("Created {} {} ({})", created.role, created.id, created.email);
        Ok(created)
    }

    pub async fn get_user(&self, id: i64) -> Result<User, ServiceError> {
        self.cache
            .get_user(id)
            .await?
            .ok_or_else(|| ServiceError::not_found(format!("user {} does not exist", id)))
    }

    pub async fn list_users(&self, role: Option<&str>, page: Page) -> Result<Vec<User>, ServiceError> {
        let role = role
            .filter(|r| !r.trim().is_empty())
            .map(parse_role)
            .transpose()?;
        let users = self.cache.list_users().await?;
        Ok(paginate(
            users.iter().filter(|u| matches_role(u, role)).cloned(),
            page,
        ))
    }

    /// Replace a user's name and skills
    pub async fn update_user(&self, id: i64, name: &str, skills: &[String]) -> Result<User, ServiceError> {
        let mut user = self.get_user(id).await?;
        user.name = require_text(name, "name")?.to_string();
        user.skills = normalize_tags(skills);

        self.cache
            .update_user(&user)
            .await?
            .ok_or_else(|| ServiceError::not_found(format!("user {} does not exist", id)))
    }

    pub async fn update_user_role(&self, id: i64, role: &str) -> Result<User, ServiceError> {
        let role = parse_role(role)?;
        if !self.cache.update_user_role(id, role).await? {
            return Err(ServiceError::not_found(format!("user {} does not exist", id)));
        }
        tracing::info!("User {} is now {}", id, role);
        self.get_user(id).await
    }

    // ---- projects ----

    async fn validated_project(&self, project: NewProject) -> Result<NewProject, ServiceError> {
        if project.teacher_id == 0 {
            return Err(ServiceError::validation("teacher id is required"));
        }
        let owner = self.get_user(project.teacher_id).await?;
        if owner.role == Role::Student {
            return Err(ServiceError::validation(format!(
                "user {} is a student and cannot own projects",
                owner.id
            )));
        }

        Ok(NewProject {
            teacher_id: project.teacher_id,
            title: require_text(&project.title, "title")?.to_string(),
            description: project.description.trim().to_string(),
            requirements: normalize_tags(&project.requirements),
            tags: normalize_tags(&project.tags),
        })
    }

    pub async fn create_project(&self, project: NewProject) -> Result<Project, ServiceError> {
        let project = self.validated_project(project).await?;
        let created = self.cache.create_project(project).await?;
        tracing::info!("Teacher {} created project {}", created.teacher_id, created.id);
        Ok(created)
    }

    /// Replace a project's editable fields. Ownership and the archived flag
    /// are kept; only the owning teacher may edit.
    pub async fn update_project(&self, id: i64, project: NewProject) -> Result<Project, ServiceError> {
        let existing = self.get_project(id).await?;
        if project.teacher_id != existing.teacher_id {
            return Err(ServiceError::validation(format!(
                "project {} belongs to teacher {}",
                id, existing.teacher_id
            )));
        }
        let fields = self.validated_project(project).await?;

        let updated = Project {
            id,
            teacher_id: existing.teacher_id,
            title: fields.title,
            description: fields.description,
            requirements: fields.requirements,
            tags: fields.tags,
            archived: existing.archived,
        };

        self.cache
            .update_project(&updated)
            .await?
            .ok_or_else(|| ServiceError::not_found(format!("project {} does not exist", id)))
    }

    pub async fn get_project(&self, id: i64) -> Result<Project, ServiceError> {
        self.cache
            .get_project(id)
            .await?
            .ok_or_else(|| ServiceError::not_found(format!("project {} does not exist", id)))
    }

    pub async fn list_projects(&self, filter: ProjectFilter, page: Page) -> Result<Vec<Project>, ServiceError> {
        let projects = self.cache.list_projects().await?;
        Ok(paginate(
            projects.iter().filter(|p| filter.matches(p)).cloned(),
            page,
        ))
    }

    pub async fn set_project_archived(&self, id: i64, archived: bool) -> Result<Project, ServiceError> {
        if !self.cache.set_project_archived(id, archived).await? {
            return Err(ServiceError::not_found(format!("project {} does not exist", id)));
        }
        tracing::info!("Project {} archived: {}", id, archived);
        self.get_project(id).await
    }

    pub async fn delete_project(&self, id: i64) -> Result<(), ServiceError> {
        if !self.cache.remove_project(id).await? {
            return Err(ServiceError::not_found(format!("project {} does not exist", id)));
        }
        tracing::info!("Deleted project {}", id);
        Ok(())
    }

    // ---- stats ----

    pub async fn stats(&self) -> Result<SystemStats, ServiceError> {
        let users = self.cache.list_users().await?;
        let projects = self.cache.list_projects().await?;
        let store = self.cache.store();
        let applications = store.list_applications().await?;
        let feedbacks = store.list_feedbacks().await?;

        let mut by_role = BTreeMap::new();
        for user in users.iter() {
            *by_role.entry(user.role.to_string()).or_insert(0) += 1;
        }

        let mut by_status = BTreeMap::new();
        for application in &applications {
            *by_status.entry(application.status.to_string()).or_insert(0) += 1;
        }

        let avg_rating = if feedbacks.is_empty() {
            0.0
        } else {
            feedbacks.iter().map(|f| f.rating as f64).sum::<f64>() / feedbacks.len() as f64
        };

        Ok(SystemStats {
            users: by_role,
            projects: projects.len(),
            applications: applications.len(),
            application_status: by_status,
            avg_rating,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ApplicationStatus, NewFeedback};
    use crate::services::{MemoryStore, Store};
    use std::time::Duration;

    fn catalog() -> Catalog {
        let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
        Catalog::new(Arc::new(EntityCache::new(store, 100, Duration::from_secs(60))))
    }

    fn skills(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    fn project(teacher_id: i64, title: &str) -> NewProject {
        NewProject {
            teacher_id,
            title: title.to_string(),
            description: "  research  ".to_string(),
            requirements: skills(&["Python", "python ", "NLP"]),
            tags: skills(&[" ML"]),
        }
    }

    #[tokio::test]
    async fn test_create_user_normalizes() {
        let catalog = catalog();
        let user = catalog
            .create_user(" Ada ", "Ada@Uni.edu", "Student", &skills(&["Rust", " rust", "", "ML"]))
            .await
            .unwrap();

        assert_eq!(user.name, "Ada");
        assert_eq!(user.email, "ada@uni.edu");
        assert_eq!(user.role, Role::Student);
        assert_eq!(user.skills, vec!["ml", "rust"]);
    }

    #[tokio::test]
    async fn test_create_user_errors() {
        let catalog = catalog();
        assert!(matches!(
            catalog.create_user("Ada", "a@x.io", "wizard", &[]).await,
            Err(ServiceError::Validation(_))
        ));
        assert!(matches!(
            catalog.create_user("  ", "a@x.io", "student", &[]).await,
            Err(ServiceError::Validation(_))
        ));

        catalog.create_user("Ada", "a@x.io", "student", &[]).await.unwrap();
        assert!(matches!(
            catalog.create_user("Eve", "A@X.io", "student", &[]).await,
            Err(ServiceError::Conflict(_))
        ));
    }

    #[tokio::test]
    async fn test_list_users_by_role_and_page() {
        let catalog = catalog();
        for i in 0..5 {
            catalog
                .create_user("S", &format!("s{}@x.io", i), "student", &[])
                .await
                .unwrap();
        }
        catalog.create_user("T", "t@x.io", "teacher", &[]).await.unwrap();

        let teachers = catalog.list_users(Some("teacher"), Page::default()).await.unwrap();
        assert_eq!(teachers.len(), 1);

        let page = catalog
            .list_users(Some("student"), Page { number: 2, size: 2 })
            .await
            .unwrap();
        assert_eq!(page.len(), 2);
        assert!(catalog
            .list_users(None, Page { number: 4, size: 2 })
            .await
            .unwrap()
            .is_empty());
        assert!(matches!(
            catalog.list_users(Some("ghost"), Page::default()).await,
            Err(ServiceError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_role_change_visible_in_listing() {
        let catalog = catalog();
        let user = catalog.create_user("Ada", "a@x.io", "student", &[]).await.unwrap();
        assert_eq!(catalog.list_users(Some("student"), Page::default()).await.unwrap().len(), 1);

        let promoted = catalog.update_user_role(user.id, "teacher").await.unwrap();
        assert_eq!(promoted.role, Role::Teacher);
        assert!(catalog.list_users(Some("student"), Page::default()).await.unwrap().is_empty());
        assert_eq!(catalog.get_user(user.id).await.unwrap().role, Role::Teacher);

        assert!(matches!(
            catalog.update_user_role(999, "admin").await,
            Err(ServiceError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_update_user_replaces_skills() {
        let catalog = catalog();
        let user = catalog.create_user("Ada", "a@x.io", "student", &skills(&["go"])).await.unwrap();
        let updated = catalog
            .update_user(user.id, "Ada L.", &skills(&["Python", "SQL"]))
            .await
            .unwrap();
        assert_eq!(updated.skills, vec!["python", "sql"]);
        assert_eq!(catalog.get_user(user.id).await.unwrap().name, "Ada L.");
    }

    #[tokio::test]
    async fn test_project_lifecycle() {
        let catalog = catalog();
        let teacher = catalog.create_user("Prof", "p@x.io", "teacher", &[]).await.unwrap();

        let created = catalog.create_project(project(teacher.id, "NLP")).await.unwrap();
        assert_eq!(created.requirements, vec!["nlp", "python"]);
        assert_eq!(created.tags, vec!["ml"]);
        assert_eq!(created.description, "research");

        let archived = catalog.set_project_archived(created.id, true).await.unwrap();
        assert!(archived.archived);

        let updated = catalog
            .update_project(created.id, project(teacher.id, "NLP v2"))
            .await
            .unwrap();
        assert_eq!(updated.title, "NLP v2");
        assert!(updated.archived, "update keeps the archived flag");
        assert!(matches!(
            catalog.update_project(created.id, project(teacher.id + 100, "Hijack")).await,
            Err(ServiceError::Validation(_))
        ));

        let live = catalog
            .list_projects(
                ProjectFilter {
                    teacher_id: Some(teacher.id),
                    archived: Some(false),
                },
                Page::default(),
            )
            .await
            .unwrap();
        assert!(live.is_empty());

        catalog.delete_project(created.id).await.unwrap();
        assert!(matches!(catalog.get_project(created.id).await, Err(ServiceError::NotFound(_))));
        assert!(matches!(catalog.delete_project(created.id).await, Err(ServiceError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_project_owner_checks() {
        let catalog = catalog();
        let student = catalog.create_user("Ada", "a@x.io", "student", &[]).await.unwrap();

        assert!(matches!(
            catalog.create_project(project(student.id, "x")).await,
            Err(ServiceError::Validation(_))
        ));
        assert!(matches!(
            catalog.create_project(project(404, "x")).await,
            Err(ServiceError::NotFound(_))
        ));
        assert!(matches!(
            catalog.create_project(project(0, "x")).await,
            Err(ServiceError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_stats() {
        let catalog = catalog();
        let teacher = catalog.create_user("Prof", "p@x.io", "teacher", &[]).await.unwrap();
        let a = catalog.create_user("A", "a@x.io", "student", &[]).await.unwrap();
        let b = catalog.create_user("B", "b@x.io", "student", &[]).await.unwrap();
        let p = catalog.create_project(project(teacher.id, "NLP")).await.unwrap();

        let store = catalog.cache.store();
        let app = store.add_application(a.id, p.id, ApplicationStatus::Approved).await.unwrap();
        store.add_application(b.id, p.id, ApplicationStatus::Submitted).await.unwrap();
        for rating in [3, 5] {
            store
                .add_feedback(NewFeedback {
                    from_user_id: teacher.id,
                    to_user_id: a.id,
                    application_id: app.id,
                    rating,
                    comment: String::new(),
                })
                .await
                .unwrap();
        }

        let stats = catalog.stats().await.unwrap();
        assert_eq!(stats.users.get("student"), Some(&2));
        assert_eq!(stats.users.get("teacher"), Some(&1));
        assert_eq!(stats.projects, 1);
        assert_eq!(stats.applications, 2);
        assert_eq!(stats.application_status.get("approved"), Some(&1));
        assert_eq!(stats.avg_rating, 4.0);
    }

    #[tokio::test]
    async fn test_stats_empty() {
        let stats = catalog().stats().await.unwrap();
        assert_eq!(stats.projects, 0);
        assert_eq!(stats.avg_rating, 0.0);
    }
}
