use std::sync::Arc;

use crate::error::ServiceError;
use crate::models::{Application, ApplicationStatus, Document, Feedback, NewFeedback, Tracking};
use crate::services::EntityCache;

/// Outcome of a status transition check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Requested status equals the current one
    NoOp,
    /// The write should go ahead
    Apply,
}

/// Pure transition rule.
///
/// `approved` is terminal: re-approving is a no-op, anything else conflicts.
/// Every other status (including `rejected`) may move to any label.
pub fn check_transition(
    current: &ApplicationStatus,
    requested: &ApplicationStatus,
) -> Result<Transition, ServiceError> {
    if current == requested {
        return Ok(Transition::NoOp);
    }
    if current.is_terminal() {
        return Err(ServiceError::conflict(format!(
            "application is already {} and cannot move to {}",
            current, requested
        )));
    }
    Ok(Transition::Apply)
}

/// Application lifecycle: creation, status changes, and the records hung off
/// an application (progress notes, feedback, documents).
pub struct ApplicationWorkflow {
    cache: Arc<EntityCache>,
}

impl ApplicationWorkflow {
    pub fn new(cache: Arc<EntityCache>) -> Self {
        Self { cache }
    }

    async fn require_application(&self, id: i64) -> Result<Application, ServiceError> {
        self.cache
            .get_application(id)
            .await?
            .ok_or_else(|| ServiceError::not_found(format!("application {} does not exist", id)))
    }

    /// Status decisions read the store, since another instance may have
    /// moved the application; the cached slot is refreshed from that read.
    async fn stored_application(&self, id: i64) -> Result<Application, ServiceError> {
        let current = self
            .cache
            .store()
            .get_application(id)
            .await?
            .ok_or_else(|| ServiceError::not_found(format!("application {} does not exist", id)))?;
        self.cache.put_application(current.clone()).await;
        Ok(current)
    }

    pub async fn create_application(
        &self,
        student_id: i64,
        project_id: i64,
    ) -> Result<Application, ServiceError> {
        if student_id == 0 || project_id == 0 {
            return Err(ServiceError::validation("student id and project id are required"));
        }

        match self.cache.get_user(student_id).await? {
            Some(user) if user.is_student() => {}
            _ => return Err(ServiceError::not_found(format!("student {} does not exist", student_id))),
        }
        let project = self
            .cache
            .get_project(project_id)
            .await?
            .ok_or_else(|| ServiceError::not_found(format!("project {} does not exist", project_id)))?;
        if project.archived {
            return Err(ServiceError::validation(format!(
                "project {} is archived and not accepting applications",
                project_id
            )));
        }

        let store = self.cache.store();
        if store.find_application(student_id, project_id).await?.is_some() {
            return Err(ServiceError::conflict(format!(
                "student {} already applied to project {}",
                student_id, project_id
            )));
        }

        // The store's unique index settles races between the check above and here
        let application = store
            .add_application(student_id, project_id, ApplicationStatus::Submitted)
            .await?;

        self.cache.put_application(application.clone()).await;
        tracing::info!(
            "Student {} applied to project {} (application {})",
            student_id,
            project_id,
            application.id
        );
        Ok(application)
    }

    /// Move an application to `status` (a raw label, trimmed and lower-cased)
    pub async fn set_application_status(
        &self,
        application_id: i64,
        status: &str,
    ) -> Result<Application, ServiceError> {
        let requested: ApplicationStatus = status
            .parse()
            .map_err(ServiceError::Validation)?;

        let current = self.stored_application(application_id).await?;
        if check_transition(&current.status, &requested)? == Transition::NoOp {
            return Ok(current);
        }

        let swapped = self
            .cache
            .store()
            .update_application_status_if(application_id, &current.status, &requested)
            .await?;

        if !swapped {
            // Someone else moved it between our read and the swap
            self.cache.invalidate_application(application_id).await;
            tracing::warn!(
                "Status update for application {} lost a race (expected {})",
                application_id,
                current.status
            );
            return Err(ServiceError::conflict(format!(
                "application {} changed concurrently, reload and retry",
                application_id
            )));
        }

        let updated = Application {
            status: requested,
            ..current
        };
        self.cache.put_application(updated.clone()).await;
        tracing::info!("Application {} is now {}", application_id, updated.status);
        Ok(updated)
    }

    pub async fn add_tracking(&self, application_id: i64, progress: &str) -> Result<Tracking, ServiceError> {
        let progress = progress.trim();
        if progress.is_empty() {
            return Err(ServiceError::validation("progress is required"));
        }
        let application = self.stored_application(application_id).await?;
        if application.status != ApplicationStatus::Approved {
            return Err(ServiceError::conflict(format!(
                "progress can only be tracked on approved applications, application {} is {}",
                application_id, application.status
            )));
        }

        let tracking = self
            .cache
            .store()
            .add_tracking(application_id, progress.to_string())
            .await?;
        tracing::debug!("Tracked progress on application {}", application_id);
        Ok(tracking)
    }

    pub async fn list_trackings(&self, application_id: i64) -> Result<Vec<Tracking>, ServiceError> {
        self.require_application(application_id).await?;
        Ok(self.cache.store().list_trackings_by_application(application_id).await?)
    }

    pub async fn add_feedback(&self, feedback: NewFeedback) -> Result<Feedback, ServiceError> {
        if feedback.from_user_id == 0 || feedback.to_user_id == 0 || feedback.application_id == 0 {
            return Err(ServiceError::validation("user ids and application id are required"));
        }
        if !(1..=5).contains(&feedback.rating) {
            return Err(ServiceError::validation(format!(
                "rating must be between 1 and 5, got {}",
                feedback.rating
            )));
        }
        self.require_application(feedback.application_id).await?;

        Ok(self.cache.store().add_feedback(feedback).await?)
    }

    pub async fn add_document(
        &self,
        application_id: i64,
        name: &str,
        path: &str,
    ) -> Result<Document, ServiceError> {
        let (name, path) = (name.trim(), path.trim());
        if name.is_empty() || path.is_empty() {
            return Err(ServiceError::validation("document name and path are required"));
        }
        self.require_application(application_id).await?;

        Ok(self
            .cache
            .store()
            .add_document(application_id, name.to_string(), path.to_string())
            .await?)
    }

    pub async fn list_documents(&self, application_id: i64) -> Result<Vec<Document>, ServiceError> {
        self.require_application(application_id).await?;
        Ok(self.cache.store().list_documents_by_application(application_id).await?)
    }
}
