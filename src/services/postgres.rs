use async_trait::async_trait;
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgPool, Row};
use std::time::Duration;

use super::store::{Store, StoreError};
use crate::models::{
    Application, ApplicationStatus, Document, Feedback, NewFeedback, NewProject, NewUser,
    Project, Role, Tracking, User,
};

/// PostgreSQL implementation of [`Store`]
///
/// Skills, requirements and tags are stored as `TEXT[]`. The
/// `applications (student_id, project_id)` unique index backs the
/// one-application-per-pair rule, and status changes use a conditional
/// `UPDATE ... WHERE status = $expected`.
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Create a new store from a connection string and run migrations
    pub async fn new(
        database_url: &str,
        max_connections: u32,
        min_connections: u32,
        acquire_timeout: Duration,
        idle_timeout: Duration,
    ) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .min_connections(min_connections)
            .acquire_timeout(acquire_timeout)
            .idle_timeout(idle_timeout)
            .test_before_acquire(true)
            .connect(database_url)
            .await?;

        // Run migrations on startup
        sqlx::migrate!("./migrations").run(&pool).await?;

        Ok(Self { pool })
    }

    /// Create a new store from settings
    pub async fn from_settings(
        url: &str,
        max_connections: Option<u32>,
        min_connections: Option<u32>,
        acquire_timeout_secs: Option<u64>,
        idle_timeout_secs: Option<u64>,
    ) -> Result<Self, StoreError> {
        tracing::info!("Connecting to PostgreSQL");

        Self::new(
            url,
            max_connections.unwrap_or(10),
            min_connections.unwrap_or(1),
            Duration::from_secs(acquire_timeout_secs.unwrap_or(5)),
            Duration::from_secs(idle_timeout_secs.unwrap_or(600)),
        )
        .await
    }
}

fn unique_violation(err: sqlx::Error, detail: impl FnOnce() -> String) -> StoreError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => StoreError::Conflict(detail()),
        _ => StoreError::SqlxError(err),
    }
}

fn user_from_row(row: &PgRow) -> Result<User, StoreError> {
    let role: String = row.try_get("role")?;
    Ok(User {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        email: row.try_get("email")?,
        role: role.parse().map_err(StoreError::Corrupt)?,
        skills: row.try_get("skills")?,
    })
}

fn project_from_row(row: &PgRow) -> Result<Project, StoreError> {
    Ok(Project {
        id: row.try_get("id")?,
        teacher_id: row.try_get("teacher_id")?,
        title: row.try_get("title")?,
        description: row.try_get("description")?,
        requirements: row.try_get("requirements")?,
        tags: row.try_get("tags")?,
        archived: row.try_get("archived")?,
    })
}

fn application_from_row(row: &PgRow) -> Result<Application, StoreError> {
    let status: String = row.try_get("status")?;
    Ok(Application {
        id: row.try_get("id")?,
        student_id: row.try_get("student_id")?,
        project_id: row.try_get("project_id")?,
        status: status.parse().map_err(StoreError::Corrupt)?,
    })
}

fn tracking_from_row(row: &PgRow) -> Result<Tracking, StoreError> {
    Ok(Tracking {
        id: row.try_get("id")?,
        application_id: row.try_get("application_id")?,
        progress: row.try_get("progress")?,
        created_at: row.try_get("created_at")?,
    })
}

fn feedback_from_row(row: &PgRow) -> Result<Feedback, StoreError> {
    Ok(Feedback {
        id: row.try_get("id")?,
        from_user_id: row.try_get("from_user_id")?,
        to_user_id: row.try_get("to_user_id")?,
        application_id: row.try_get("application_id")?,
        rating: row.try_get("rating")?,
        comment: row.try_get("comment")?,
    })
}

fn document_from_row(row: &PgRow) -> Result<Document, StoreError> {
    Ok(Document {
        id: row.try_get("id")?,
        application_id: row.try_get("application_id")?,
        name: row.try_get("name")?,
        path: row.try_get("path")?,
    })
}

const USER_COLUMNS: &str = "id, name, email, role, skills";
const PROJECT_COLUMNS: &str = "id, teacher_id, title, description, requirements, tags, archived";
const APPLICATION_COLUMNS: &str = "id, student_id, project_id, status";

#[async_trait]
impl Store for PostgresStore {
    async fn add_user(&self, user: NewUser) -> Result<User, StoreError> {
        let query = format!(
            "INSERT INTO users (name, email, role, skills) VALUES ($1, $2, $3, $4) RETURNING {}",
            USER_COLUMNS
        );
        let email = user.email.clone();
        let row = sqlx::query(&query)
            .bind(&user.name)
            .bind(&user.email)
            .bind(user.role.as_str())
            .bind(&user.skills)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| unique_violation(e, || format!("email {} already registered", email)))?;
        user_from_row(&row)
    }

    async fn get_user(&self, id: i64) -> Result<Option<User>, StoreError> {
        let query = format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS);
        let row = sqlx::query(&query).bind(id).fetch_optional(&self.pool).await?;
        row.as_ref().map(user_from_row).transpose()
    }

    async fn list_users(&self) -> Result<Vec<User>, StoreError> {
        let query = format!("SELECT {} FROM users ORDER BY id", USER_COLUMNS);
        let rows = sqlx::query(&query).fetch_all(&self.pool).await?;
        rows.iter().map(user_from_row).collect()
    }

    async fn update_user(&self, user: &User) -> Result<Option<User>, StoreError> {
        let query = format!(
            "UPDATE users SET name = $2, skills = $3 WHERE id = $1 RETURNING {}",
            USER_COLUMNS
        );
        let row = sqlx::query(&query)
            .bind(user.id)
            .bind(&user.name)
            .bind(&user.skills)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(user_from_row).transpose()
    }

    async fn update_user_role(&self, id: i64, role: Role) -> Result<bool, StoreError> {
        let result = sqlx::query("UPDATE users SET role = $2 WHERE id = $1")
            .bind(id)
            .bind(role.as_str())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn add_project(&self, project: NewProject) -> Result<Project, StoreError> {
        let query = format!(
            r#"
            INSERT INTO projects (teacher_id, title, description, requirements, tags)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {}
            "#,
            PROJECT_COLUMNS
        );
        let row = sqlx::query(&query)
            .bind(project.teacher_id)
            .bind(&project.title)
            .bind(&project.description)
            .bind(&project.requirements)
            .bind(&project.tags)
            .fetch_one(&self.pool)
            .await?;
        project_from_row(&row)
    }

    async fn get_project(&self, id: i64) -> Result<Option<Project>, StoreError> {
        let query = format!("SELECT {} FROM projects WHERE id = $1", PROJECT_COLUMNS);
        let row = sqlx::query(&query).bind(id).fetch_optional(&self.pool).await?;
        row.as_ref().map(project_from_row).transpose()
    }

    async fn list_projects(&self) -> Result<Vec<Project>, StoreError> {
        let query = format!("SELECT {} FROM projects ORDER BY id", PROJECT_COLUMNS);
        let rows = sqlx::query(&query).fetch_all(&self.pool).await?;
        rows.iter().map(project_from_row).collect()
    }

    async fn update_project(&self, project: &Project) -> Result<Option<Project>, StoreError> {
        let query = format!(
            r#"
            UPDATE projects
            SET title = $2, description = $3, requirements = $4, tags = $5
            WHERE id = $1
            RETURNING {}
            "#,
            PROJECT_COLUMNS
        );
        let row = sqlx::query(&query)
            .bind(project.id)
            .bind(&project.title)
            .bind(&project.description)
            .bind(&project.requirements)
            .bind(&project.tags)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(project_from_row).transpose()
    }

    async fn set_project_archived(&self, id: i64, archived: bool) -> Result<bool, StoreError> {
        let result = sqlx::query("UPDATE projects SET archived = $2 WHERE id = $1")
            .bind(id)
            .bind(archived)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_project(&self, id: i64) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM projects WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn add_application(
        &self,
        student_id: i64,
        project_id: i64,
        status: ApplicationStatus,
    ) -> Result<Application, StoreError> {
        let query = format!(
            "INSERT INTO applications (student_id, project_id, status) VALUES ($1, $2, $3) RETURNING {}",
            APPLICATION_COLUMNS
        );
        let row = sqlx::query(&query)
            .bind(student_id)
            .bind(project_id)
            .bind(status.as_str())
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                unique_violation(e, || {
                    format!(
                        "application for student {} and project {} exists",
                        student_id, project_id
                    )
                })
            })?;
        application_from_row(&row)
    }

    async fn get_application(&self, id: i64) -> Result<Option<Application>, StoreError> {
        let query = format!("SELECT {} FROM applications WHERE id = $1", APPLICATION_COLUMNS);
        let row = sqlx::query(&query).bind(id).fetch_optional(&self.pool).await?;
        row.as_ref().map(application_from_row).transpose()
    }

    async fn find_application(
        &self,
        student_id: i64,
        project_id: i64,
    ) -> Result<Option<Application>, StoreError> {
        let query = format!(
            "SELECT {} FROM applications WHERE student_id = $1 AND project_id = $2",
            APPLICATION_COLUMNS
        );
        let row = sqlx::query(&query)
            .bind(student_id)
            .bind(project_id)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(application_from_row).transpose()
    }

    async fn list_applications(&self) -> Result<Vec<Application>, StoreError> {
        let query = format!("SELECT {} FROM applications ORDER BY id", APPLICATION_COLUMNS);
        let rows = sqlx::query(&query).fetch_all(&self.pool).await?;
        rows.iter().map(application_from_row).collect()
    }

    async fn list_applications_by_student(
        &self,
        student_id: i64,
    ) -> Result<Vec<Application>, StoreError> {
        let query = format!(
            "SELECT {} FROM applications WHERE student_id = $1 ORDER BY id",
            APPLICATION_COLUMNS
        );
        let rows = sqlx::query(&query).bind(student_id).fetch_all(&self.pool).await?;
        rows.iter().map(application_from_row).collect()
    }

    async fn update_application_status_if(
        &self,
        id: i64,
        expected: &ApplicationStatus,
        new: &ApplicationStatus,
    ) -> Result<bool, StoreError> {
        let result = sqlx::query("UPDATE applications SET status = $3 WHERE id = $1 AND status = $2")
            .bind(id)
            .bind(expected.as_str())
            .bind(new.as_str())
            .execute(&self.pool)
            .await?;

        tracing::debug!(
            "Conditional status update for application {}: {} -> {} (applied: {})",
            id,
            expected,
            new,
            result.rows_affected() > 0
        );

        Ok(result.rows_affected() > 0)
    }

    async fn add_tracking(&self, application_id: i64, progress: String) -> Result<Tracking, StoreError> {
        let row = sqlx::query(
            r#"
            INSERT INTO trackings (application_id, progress, created_at)
            VALUES ($1, $2, NOW())
            RETURNING id, application_id, progress, created_at
            "#,
        )
        .bind(application_id)
        .bind(&progress)
        .fetch_one(&self.pool)
        .await?;
        tracking_from_row(&row)
    }

    async fn list_trackings_by_application(&self, application_id: i64) -> Result<Vec<Tracking>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT id, application_id, progress, created_at
            FROM trackings
            WHERE application_id = $1
            ORDER BY created_at, id
            "#,
        )
        .bind(application_id)
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(tracking_from_row).collect()
    }

    async fn add_feedback(&self, feedback: NewFeedback) -> Result<Feedback, StoreError> {
        let row = sqlx::query(
            r#"
            INSERT INTO feedbacks (from_user_id, to_user_id, application_id, rating, comment)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, from_user_id, to_user_id, application_id, rating, comment
            "#,
        )
        .bind(feedback.from_user_id)
        .bind(feedback.to_user_id)
        .bind(feedback.application_id)
        .bind(feedback.rating)
        .bind(&feedback.comment)
        .fetch_one(&self.pool)
        .await?;
        feedback_from_row(&row)
    }

    async fn list_feedbacks(&self) -> Result<Vec<Feedback>, StoreError> {
        let rows = sqlx::query(
            "SELECT id, from_user_id, to_user_id, application_id, rating, comment FROM feedbacks ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(feedback_from_row).collect()
    }

    async fn add_document(&self, application_id: i64, name: String, path: String) -> Result<Document, StoreError> {
        let row = sqlx::query(
            r#"
            INSERT INTO documents (application_id, name, path)
            VALUES ($1, $2, $3)
            RETURNING id, application_id, name, path
            "#,
        )
        .bind(application_id)
        .bind(&name)
        .bind(&path)
        .fetch_one(&self.pool)
        .await?;
        document_from_row(&row)
    }

    async fn list_documents_by_application(&self, application_id: i64) -> Result<Vec<Document>, StoreError> {
        let rows = sqlx::query(
            "SELECT id, application_id, name, path FROM documents WHERE application_id = $1 ORDER BY id",
        )
        .bind(application_id)
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(document_from_row).collect()
    }

    /// Health check for the database connection
    async fn health_check(&self) -> Result<bool, StoreError> {
        sqlx::query("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map(|_| true)
            .map_err(Into::into)
    }
}
