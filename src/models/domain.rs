use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Account role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Student,
    Teacher,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Student => "student",
            Role::Teacher => "teacher",
            Role::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "student" => Ok(Role::Student),
            "teacher" => Ok(Role::Teacher),
            "admin" => Ok(Role::Admin),
            other => Err(format!("unknown role `{}`", other)),
        }
    }
}

/// Registered user. Students carry a normalized skill set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub role: Role,
    #[serde(default)]
    pub skills: Vec<String>,
}

impl User {
    pub fn is_student(&self) -> bool {
        self.role == Role::Student
    }
}

/// User fields supplied on creation, before the store assigns an id
#[derive(Debug, Clone, PartialEq)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub role: Role,
    pub skills: Vec<String>,
}

/// Research project offered by a teacher
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub id: i64,
    #[serde(rename = "teacherId")]
    pub teacher_id: i64,
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub requirements: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub archived: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewProject {
    pub teacher_id: i64,
    pub title: String,
    pub description: String,
    pub requirements: Vec<String>,
    pub tags: Vec<String>,
}

/// Workflow status of an application.
///
/// `submitted`, `approved` and `rejected` are the well-known labels; any other
/// non-empty label is carried through as `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ApplicationStatus {
    Submitted,
    Approved,
    Rejected,
    Other(String),
}

impl ApplicationStatus {
    pub fn as_str(&self) -> &str {
        match self {
            ApplicationStatus::Submitted => "submitted",
            ApplicationStatus::Approved => "approved",
            ApplicationStatus::Rejected => "rejected",
            ApplicationStatus::Other(label) => label,
        }
    }

    /// Approval is one-way: nothing may leave this state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, ApplicationStatus::Approved)
    }
}

impl fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ApplicationStatus {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let label = value.trim().to_lowercase();
        match label.as_str() {
            "" => Err("status must not be empty".to_string()),
            "submitted" => Ok(ApplicationStatus::Submitted),
            "approved" => Ok(ApplicationStatus::Approved),
            "rejected" => Ok(ApplicationStatus::Rejected),
            _ => Ok(ApplicationStatus::Other(label)),
        }
    }
}

impl TryFrom<String> for ApplicationStatus {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ApplicationStatus> for String {
    fn from(value: ApplicationStatus) -> Self {
        value.as_str().to_string()
    }
}

/// A student's application to a project. At most one per (student, project).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Application {
    pub id: i64,
    #[serde(rename = "studentId")]
    pub student_id: i64,
    #[serde(rename = "projectId")]
    pub project_id: i64,
    pub status: ApplicationStatus,
}

/// Progress note recorded against an approved application
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tracking {
    pub id: i64,
    #[serde(rename = "applicationId")]
    pub application_id: i64,
    pub progress: String,
    #[serde(rename = "createdAt")]
    pub created_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feedback {
    pub id: i64,
    #[serde(rename = "fromUserId")]
    pub from_user_id: i64,
    #[serde(rename = "toUserId")]
    pub to_user_id: i64,
    #[serde(rename = "applicationId")]
    pub application_id: i64,
    pub rating: i32,
    #[serde(default)]
    pub comment: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewFeedback {
    pub from_user_id: i64,
    pub to_user_id: i64,
    pub application_id: i64,
    pub rating: i32,
    pub comment: String,
}

/// Document metadata attached to an application (bytes live elsewhere)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: i64,
    #[serde(rename = "applicationId")]
    pub application_id: i64,
    pub name: String,
    pub path: String,
}

/// Scored project for a student. Never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchResult {
    pub project: Project,
    pub score: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(rename = "matchedSkills", default, skip_serializing_if = "Vec::is_empty")]
    pub matched_skills: Vec<String>,
}

/// Application joined with its student, project and a computed score
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationView {
    pub application: Application,
    pub student: User,
    pub project: Project,
    pub score: f64,
}

/// Like [`ApplicationView`], plus the scorer's justification
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationAnalysis {
    pub application: Application,
    pub student: User,
    pub project: Project,
    pub score: f64,
    pub reason: String,
}

/// Aggregate counters for the admin dashboard
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SystemStats {
    pub users: std::collections::BTreeMap<String, usize>,
    pub projects: usize,
    pub applications: usize,
    #[serde(rename = "applicationStatus")]
    pub application_status: std::collections::BTreeMap<String, usize>,
    #[serde(rename = "avgRating")]
    pub avg_rating: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_parsing() {
        assert_eq!("Approved".parse::<ApplicationStatus>(), Ok(ApplicationStatus::Approved));
        assert_eq!(" submitted ".parse::<ApplicationStatus>(), Ok(ApplicationStatus::Submitted));
        assert_eq!(
            "interview".parse::<ApplicationStatus>(),
            Ok(ApplicationStatus::Other("interview".to_string()))
        );
        assert!("  ".parse::<ApplicationStatus>().is_err());
    }

    #[test]
    fn test_status_serde_as_string() {
        let app = Application {
            id: 1,
            student_id: 2,
            project_id: 3,
            status: ApplicationStatus::Rejected,
        };
        let json = serde_json::to_value(&app).unwrap();
        assert_eq!(json["status"], "rejected");
        assert_eq!(json["studentId"], 2);

        let back: Application = serde_json::from_value(json).unwrap();
        assert_eq!(back.status, ApplicationStatus::Rejected);
    }

    #[test]
    fn test_role_from_str() {
        assert_eq!("Teacher".parse::<Role>(), Ok(Role::Teacher));
        assert!("guest".parse::<Role>().is_err());
    }
}
