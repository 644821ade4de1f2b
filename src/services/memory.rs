use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::RwLock;

use super::store::{Store, StoreError};
use crate::models::{
    Application, ApplicationStatus, Document, Feedback, NewFeedback, NewProject, NewUser,
    Project, Role, Tracking, User,
};

#[derive(Default)]
struct Tables {
    next_id: i64,
    users: BTreeMap<i64, User>,
    projects: BTreeMap<i64, Project>,
    applications: BTreeMap<i64, Application>,
    trackings: BTreeMap<i64, Tracking>,
    feedbacks: BTreeMap<i64, Feedback>,
    documents: BTreeMap<i64, Document>,
}

impl Tables {
    fn allocate_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

/// In-process store backed by ordered maps.
///
/// Used for local runs (`store.backend = "memory"`) and tests. Listings come
/// back in id order, matching the Postgres store.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
    entity_reads: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of user/project/application reads served so far
    pub fn entity_reads(&self) -> usize {
        self.entity_reads.load(Ordering::Relaxed)
    }

    fn record_read(&self) {
        self.entity_reads.fetch_add(1, Ordering::Relaxed);
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn add_user(&self, user: NewUser) -> Result<User, StoreError> {
        let mut tables = self.tables.write().await;
        if tables.users.values().any(|u| u.email == user.email) {
            return Err(StoreError::Conflict(format!("email {} already registered", user.email)));
        }
        let id = tables.allocate_id();
        let stored = User {
            id,
            name: user.name,
            email: user.email,
            role: user.role,
            skills: user.skills,
        };
        tables.users.insert(id, stored.clone());
        Ok(stored)
    }

    async fn get_user(&self, id: i64) -> Result<Option<User>, StoreError> {
        self.record_read();
        Ok(self.tables.read().await.users.get(&id).cloned())
    }

    async fn list_users(&self) -> Result<Vec<User>, StoreError> {
        self.record_read();
        Ok(self.tables.read().await.users.values().cloned().collect())
    }

    async fn update_user(&self, user: &User) -> Result<Option<User>, StoreError> {
        let mut tables = self.tables.write().await;
        Ok(tables.users.get_mut(&user.id).map(|existing| {
            existing.name = user.name.clone();
            existing.skills = user.skills.clone();
            existing.clone()
        }))
    }

    async fn update_user_role(&self, id: i64, role: Role) -> Result<bool, StoreError> {
        let mut tables = self.tables.write().await;
        Ok(match tables.users.get_mut(&id) {
            Some(user) => {
                user.role = role;
                true
            }
            None => false,
        })
    }

    async fn add_project(&self, project: NewProject) -> Result<Project, StoreError> {
        let mut tables = self.tables.write().await;
        let id = tables.allocate_id();
        let stored = Project {
            id,
            teacher_id: project.teacher_id,
            title: project.title,
            description: project.description,
            requirements: project.requirements,
            tags: project.tags,
            archived: false,
        };
        tables.projects.insert(id, stored.clone());
        Ok(stored)
    }

    async fn get_project(&self, id: i64) -> Result<Option<Project>, StoreError> {
        self.record_read();
        Ok(self.tables.read().await.projects.get(&id).cloned())
    }

    async fn list_projects(&self) -> Result<Vec<Project>, StoreError> {
        self.record_read();
        Ok(self.tables.read().await.projects.values().cloned().collect())
    }

    async fn update_project(&self, project: &Project) -> Result<Option<Project>, StoreError> {
        let mut tables = self.tables.write().await;
        Ok(tables.projects.get_mut(&project.id).map(|existing| {
            existing.title = project.title.clone();
            existing.description = project.description.clone();
            existing.requirements = project.requirements.clone();
            existing.tags = project.tags.clone();
            existing.clone()
        }))
    }

    async fn set_project_archived(&self, id: i64, archived: bool) -> Result<bool, StoreError> {
        let mut tables = self.tables.write().await;
        Ok(match tables.projects.get_mut(&id) {
            Some(project) => {
                project.archived = archived;
                true
            }
            None => false,
        })
    }

    async fn delete_project(&self, id: i64) -> Result<bool, StoreError> {
        Ok(self.tables.write().await.projects.remove(&id).is_some())
    }

    async fn add_application(
        &self,
        student_id: i64,
        project_id: i64,
        status: ApplicationStatus,
    ) -> Result<Application, StoreError> {
        let mut tables = self.tables.write().await;
        if tables
            .applications
            .values()
            .any(|a| a.student_id == student_id && a.project_id == project_id)
        {
            return Err(StoreError::Conflict(format!(
                "application for student {} and project {} exists",
                student_id, project_id
            )));
        }
        let id = tables.allocate_id();
        let stored = Application {
            id,
            student_id,
            project_id,
            status,
        };
        tables.applications.insert(id, stored.clone());
        Ok(stored)
    }

    async fn get_application(&self, id: i64) -> Result<Option<Application>, StoreError> {
        self.record_read();
        Ok(self.tables.read().await.applications.get(&id).cloned())
    }

    async fn find_application(
        &self,
        student_id: i64,
        project_id: i64,
    ) -> Result<Option<Application>, StoreError> {
        Ok(self
            .tables
            .read()
            .await
            .applications
            .values()
            .find(|a| a.student_id == student_id && a.project_id == project_id)
            .cloned())
    }

    async fn list_applications(&self) -> Result<Vec<Application>, StoreError> {
        Ok(self.tables.read().await.applications.values().cloned().collect())
    }

    async fn list_applications_by_student(
        &self,
        student_id: i64,
    ) -> Result<Vec<Application>, StoreError> {
        Ok(self
            .tables
            .read()
            .await
            .applications
            .values()
            .filter(|a| a.student_id == student_id)
            .cloned()
            .collect())
    }

    async fn update_application_status_if(
        &self,
        id: i64,
        expected: &ApplicationStatus,
        new: &ApplicationStatus,
    ) -> Result<bool, StoreError> {
        let mut tables = self.tables.write().await;
        Ok(match tables.applications.get_mut(&id) {
            Some(app) if &app.status == expected => {
                app.status = new.clone();
                true
            }
            _ => false,
        })
    }

    async fn add_tracking(&self, application_id: i64, progress: String) -> Result<Tracking, StoreError> {
        let mut tables = self.tables.write().await;
        let id = tables.allocate_id();
        let stored = Tracking {
            id,
            application_id,
            progress,
            created_at: chrono::Utc::now(),
        };
        tables.trackings.insert(id, stored.clone());
        Ok(stored)
    }

    async fn list_trackings_by_application(&self, application_id: i64) -> Result<Vec<Tracking>, StoreError> {
        Ok(self
            .tables
            .read()
            .await
            .trackings
            .values()
            .filter(|t| t.application_id == application_id)
            .cloned()
            .collect())
    }

    async fn add_feedback(&self, feedback: NewFeedback) -> Result<Feedback, StoreError> {
        let mut tables = self.tables.write().await;
        let id = tables.allocate_id();
        let stored = Feedback {
            id,
            from_user_id: feedback.from_user_id,
            to_user_id: feedback.to_user_id,
            application_id: feedback.application_id,
            rating: feedback.rating,
            comment: feedback.comment,
        };
        tables.feedbacks.insert(id, stored.clone());
        Ok(stored)
    }

    async fn list_feedbacks(&self) -> Result<Vec<Feedback>, StoreError> {
        Ok(self.tables.read().await.feedbacks.values().cloned().collect())
    }

    async fn add_document(&self, application_id: i64, name: String, path: String) -> Result<Document, StoreError> {
        let mut tables = self.tables.write().await;
        let id = tables.allocate_id();
        let stored = Document {
            id,
            application_id,
            name,
            path,
        };
        tables.documents.insert(id, stored.clone());
        Ok(stored)
    }

    async fn list_documents_by_application(&self, application_id: i64) -> Result<Vec<Document>, StoreError> {
        Ok(self
            .tables
            .read()
            .await
            .documents
            .values()
            .filter(|d| d.application_id == application_id)
            .cloned()
            .collect())
    }

    async fn health_check(&self) -> Result<bool, StoreError> {
        Ok(true)
    }
}
