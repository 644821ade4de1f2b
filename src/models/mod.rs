// Model exports
pub mod domain;
pub mod requests;
pub mod responses;

pub use domain::{
    Application, ApplicationAnalysis, ApplicationStatus, ApplicationView, Document, Feedback,
    MatchResult, NewFeedback, NewProject, NewUser, Project, Role, SystemStats, Tracking, User,
};
pub use requests::{
    AnalyzeQuery, ApplicationScopedQuery, ArchiveRequest, CreateApplicationRequest,
    CreateUserRequest, DocumentRequest, FeedbackRequest, ListApplicationsQuery,
    ListProjectsQuery, ListUsersQuery, ProjectRequest, RankQuery, StudentApplicationsQuery,
    TrackingRequest, UpdateRoleRequest, UpdateStatusRequest, UpdateUserRequest,
};
pub use responses::{ErrorResponse, HealthResponse, PageResponse, RankResponse};
