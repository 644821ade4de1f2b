//! Persistent store contract.
//!
//! One method family per entity kind. Implementations must enforce the
//! (student, project) uniqueness of applications and must make
//! [`Store::update_application_status_if`] atomic; the workflow relies on it
//! instead of locking in-process.

use async_trait::async_trait;
use thiserror::Error;

use crate::models::{
    Application, ApplicationStatus, Document, Feedback, NewFeedback, NewProject, NewUser,
    Project, Role, Tracking, User,
};

/// Errors that can occur when talking to the persistent store
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("SQLx error: {0}")]
    SqlxError(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    MigrateError(#[from] sqlx::migrate::MigrateError),

    #[error("Unique constraint violated: {0}")]
    Conflict(String),

    #[error("Corrupt row: {0}")]
    Corrupt(String),
}

#[async_trait]
pub trait Store: Send + Sync {
    async fn add_user(&self, user: NewUser) -> Result<User, StoreError>;
    async fn get_user(&self, id: i64) -> Result<Option<User>, StoreError>;
    async fn list_users(&self) -> Result<Vec<User>, StoreError>;
    /// Replaces name and skills; returns `None` when the user does not exist.
    async fn update_user(&self, user: &User) -> Result<Option<User>, StoreError>;
    async fn update_user_role(&self, id: i64, role: Role) -> Result<bool, StoreError>;

    async fn add_project(&self, project: NewProject) -> Result<Project, StoreError>;
    async fn get_project(&self, id: i64) -> Result<Option<Project>, StoreError>;
    async fn list_projects(&self) -> Result<Vec<Project>, StoreError>;
    async fn update_project(&self, project: &Project) -> Result<Option<Project>, StoreError>;
    async fn set_project_archived(&self, id: i64, archived: bool) -> Result<bool, StoreError>;
    async fn delete_project(&self, id: i64) -> Result<bool, StoreError>;

    /// Fails with [`StoreError::Conflict`] when the pair already has an application.
    async fn add_application(
        &self,
        student_id: i64,
        project_id: i64,
        status: ApplicationStatus,
    ) -> Result<Application, StoreError>;
    async fn get_application(&self, id: i64) -> Result<Option<Application>, StoreError>;
    async fn find_application(
        &self,
        student_id: i64,
        project_id: i64,
    ) -> Result<Option<Application>, StoreError>;
    async fn list_applications(&self) -> Result<Vec<Application>, StoreError>;
    async fn list_applications_by_student(
        &self,
        student_id: i64,
    ) -> Result<Vec<Application>, StoreError>;
    /// Compare-and-swap on status: writes `new` only while the stored status
    /// equals `expected`. Returns whether the write happened.
    async fn update_application_status_if(
        &self,
        id: i64,
        expected: &ApplicationStatus,
        new: &ApplicationStatus,
    ) -> Result<bool, StoreError>;

    async fn add_tracking(&self, application_id: i64, progress: String) -> Result<Tracking, StoreError>;
    async fn list_trackings_by_application(&self, application_id: i64) -> Result<Vec<Tracking>, StoreError>;

    async fn add_feedback(&self, feedback: NewFeedback) -> Result<Feedback, StoreError>;
    async fn list_feedbacks(&self) -> Result<Vec<Feedback>, StoreError>;

    async fn add_document(&self, application_id: i64, name: String, path: String) -> Result<Document, StoreError>;
    async fn list_documents_by_application(&self, application_id: i64) -> Result<Vec<Document>, StoreError>;

    async fn health_check(&self) -> Result<bool, StoreError>;
}
