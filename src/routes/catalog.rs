use actix_web::{web, HttpResponse};
use validator::Validate;

use super::AppState;
use crate::core::ProjectFilter;
use crate::error::ServiceError;
use crate::models::{
    ApplicationScopedQuery, ArchiveRequest, CreateUserRequest, DocumentRequest, FeedbackRequest,
    ListProjectsQuery, ListUsersQuery, NewFeedback, NewProject, PageResponse, ProjectRequest,
    TrackingRequest, UpdateRoleRequest, UpdateUserRequest,
};

/// Configure user, project and per-application record routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/users", web::get().to(list_users))
        .route("/users", web::post().to(create_user))
        .route("/users/{id}", web::get().to(get_user))
        .route("/users/{id}", web::put().to(update_user))
        .route("/users/{id}/role", web::put().to(update_role))
        .route("/projects", web::get().to(list_projects))
        .route("/projects", web::post().to(create_project))
        .route("/projects/{id}", web::get().to(get_project))
        .route("/projects/{id}", web::put().to(update_project))
        .route("/projects/{id}", web::delete().to(delete_project))
        .route("/projects/{id}/archive", web::post().to(archive_project))
        .route("/tracking", web::get().to(list_trackings))
        .route("/tracking", web::post().to(add_tracking))
        .route("/feedback", web::post().to(add_feedback))
        .route("/documents", web::get().to(list_documents))
        .route("/documents", web::post().to(add_document))
        .route("/admin/stats", web::get().to(system_stats));
}

// ---- users ----

async fn create_user(
    state: web::Data<AppState>,
    req: web::Json<CreateUserRequest>,
) -> Result<HttpResponse, ServiceError> {
    req.validate()?;
    let user = state
        .catalog
        .create_user(&req.name, &req.email, &req.role, &req.skills)
        .await?;
    Ok(HttpResponse::Created().json(user))
}

async fn get_user(state: web::Data<AppState>, path: web::Path<i64>) -> Result<HttpResponse, ServiceError> {
    let user = state.catalog.get_user(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(user))
}

/// GET /api/v1/users?role=student&page=1&pageSize=20
async fn list_users(
    state: web::Data<AppState>,
    query: web::Query<ListUsersQuery>,
) -> Result<HttpResponse, ServiceError> {
    let page = state.page(query.page, query.page_size);
    let items = state.catalog.list_users(query.role.as_deref(), page).await?;
    Ok(HttpResponse::Ok().json(PageResponse {
        items,
        page: page.number,
        page_size: page.size,
    }))
}

async fn update_user(
    state: web::Data<AppState>,
    path: web::Path<i64>,
    req: web::Json<UpdateUserRequest>,
) -> Result<HttpResponse, ServiceError> {
    req.validate()?;
    let user = state
        .catalog
        .update_user(path.into_inner(), &req.name, &req.skills)
        .await?;
    Ok(HttpResponse::Ok().json(user))
}

async fn update_role(
    state: web::Data<AppState>,
    path: web::Path<i64>,
    req: web::Json<UpdateRoleRequest>,
) -> Result<HttpResponse, ServiceError> {
    let user = state.catalog.update_user_role(path.into_inner(), &req.role).await?;
    Ok(HttpResponse::Ok().json(user))
}

// ---- projects ----

fn new_project(req: ProjectRequest) -> NewProject {
    NewProject {
        teacher_id: req.teacher_id,
        title: req.title,
        description: req.description,
        requirements: req.requirements,
        tags: req.tags,
    }
}

async fn create_project(
    state: web::Data<AppState>,
    req: web::Json<ProjectRequest>,
) -> Result<HttpResponse, ServiceError> {
    req.validate()?;
    let project = state.catalog.create_project(new_project(req.into_inner())).await?;
    Ok(HttpResponse::Created().json(project))
}

async fn get_project(state: web::Data<AppState>, path: web::Path<i64>) -> Result<HttpResponse, ServiceError> {
    let project = state.catalog.get_project(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(project))
}

/// GET /api/v1/projects?teacherId=3&archived=false
async fn list_projects(
    state: web::Data<AppState>,
    query: web::Query<ListProjectsQuery>,
) -> Result<HttpResponse, ServiceError> {
    let filter = ProjectFilter {
        teacher_id: query.teacher_id,
        archived: query.archived,
    };
    let page = state.page(query.page, query.page_size);
    let items = state.catalog.list_projects(filter, page).await?;
    Ok(HttpResponse::Ok().json(PageResponse {
        items,
        page: page.number,
        page_size: page.size,
    }))
}

async fn update_project(
    state: web::Data<AppState>,
    path: web::Path<i64>,
    req: web::Json<ProjectRequest>,
) -> Result<HttpResponse, ServiceError> {
    req.validate()?;
    let project = state
        .catalog
        .update_project(path.into_inner(), new_project(req.into_inner()))
        .await?;
    Ok(HttpResponse::Ok().json(project))
}

async fn delete_project(state: web::Data<AppState>, path: web::Path<i64>) -> Result<HttpResponse, ServiceError> {
    state.catalog.delete_project(path.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}

/// POST /api/v1/projects/{id}/archive, body optional (defaults to archiving)
async fn archive_project(
    state: web::Data<AppState>,
    path: web::Path<i64>,
    req: Option<web::Json<ArchiveRequest>>,
) -> Result<HttpResponse, ServiceError> {
    let archived = req.map_or(true, |r| r.archived);
    let project = state.catalog.set_project_archived(path.into_inner(), archived).await?;
    Ok(HttpResponse::Ok().json(project))
}

// ---- per-application records ----

async fn add_tracking(
    state: web::Data<AppState>,
    req: web::Json<TrackingRequest>,
) -> Result<HttpResponse, ServiceError> {
    req.validate()?;
    let tracking = state.workflow.add_tracking(req.application_id, &req.progress).await?;
    Ok(HttpResponse::Created().json(tracking))
}

/// GET /api/v1/tracking?applicationId=4
async fn list_trackings(
    state: web::Data<AppState>,
    query: web::Query<ApplicationScopedQuery>,
) -> Result<HttpResponse, ServiceError> {
    let trackings = state.workflow.list_trackings(query.application_id).await?;
    Ok(HttpResponse::Ok().json(trackings))
}

async fn add_feedback(
    state: web::Data<AppState>,
    req: web::Json<FeedbackRequest>,
) -> Result<HttpResponse, ServiceError> {
    req.validate()?;
    let req = req.into_inner();
    let feedback = state
        .workflow
        .add_feedback(NewFeedback {
            from_user_id: req.from_user_id,
            to_user_id: req.to_user_id,
            application_id: req.application_id,
            rating: req.rating,
            comment: req.comment,
        })
        .await?;
    Ok(HttpResponse::Created().json(feedback))
}

async fn add_document(
    state: web::Data<AppState>,
    req: web::Json<DocumentRequest>,
) -> Result<HttpResponse, ServiceError> {
    req.validate()?;
    let document = state
        .workflow
        .add_document(req.application_id, &req.name, &req.path)
        .await?;
    Ok(HttpResponse::Created().json(document))
}

/// GET /api/v1/documents?applicationId=4
async fn list_documents(
    state: web::Data<AppState>,
    query: web::Query<ApplicationScopedQuery>,
) -> Result<HttpResponse, ServiceError> {
    let documents = state.workflow.list_documents(query.application_id).await?;
    Ok(HttpResponse::Ok().json(documents))
}

// ---- admin ----

async fn system_stats(state: web::Data<AppState>) -> Result<HttpResponse, ServiceError> {
    let stats = state.catalog.stats().await?;
    tracing::debug!("Entity cache stats: {:?}", state.cache.stats());
    Ok(HttpResponse::Ok().json(stats))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Project, SystemStats, Tracking, User};
    use crate::routes::{configure_routes, test_support};
    use actix_web::{http::StatusCode, test, App};

    #[actix_web::test]
    async fn test_user_and_project_crud() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(test_support::state()))
                .configure(configure_routes),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/api/v1/users")
            .set_json(serde_json::json!({
                "name": "Prof", "email": "prof@uni.edu", "role": "teacher"
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        let teacher: User = test::read_body_json(resp).await;

        let req = test::TestRequest::post()
            .uri("/api/v1/projects")
            .set_json(serde_json::json!({
                "teacherId": teacher.id,
                "title": "Graph mining",
                "description": "community detection",
                "requirements": ["Python", "graphs", "python"]
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        let project: Project = test::read_body_json(resp).await;
        assert_eq!(project.requirements, vec!["graphs", "python"]);

        let req = test::TestRequest::post()
            .uri(&format!("/api/v1/projects/{}/archive", project.id))
            .to_request();
        let archived: Project = test::call_and_read_body_json(&app, req).await;
        assert!(archived.archived);

        let req = test::TestRequest::get()
            .uri("/api/v1/projects?archived=false")
            .to_request();
        let page: PageResponse<Project> = test::call_and_read_body_json(&app, req).await;
        assert!(page.items.is_empty());

        let req = test::TestRequest::delete()
            .uri(&format!("/api/v1/projects/{}", project.id))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NO_CONTENT);

        let req = test::TestRequest::get()
            .uri(&format!("/api/v1/projects/{}", project.id))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);
    }

    #[actix_web::test]
    async fn test_tag_only_project_is_accepted_and_ranked() {
        let state = test_support::state();
        let teacher = state
            .catalog
            .create_user("Prof", "prof@uni.edu", "teacher", &[])
            .await
            .unwrap();
        let student = state
            .catalog
            .create_user("Ada", "ada@uni.edu", "student", &["rust".to_string()])
            .await
            .unwrap();
        let app = test::init_service(
            App::new().app_data(web::Data::new(state)).configure(configure_routes),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/api/v1/projects")
            .set_json(serde_json::json!({
                "teacherId": teacher.id,
                "title": "Kernel hacking",
                "tags": ["Rust", "systems"]
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        let project: Project = test::read_body_json(resp).await;
        assert!(project.requirements.is_empty());
        assert!(project.description.is_empty());

        let req = test::TestRequest::get()
            .uri(&format!("/api/v1/matches?studentId={}&fast=1", student.id))
            .to_request();
        let ranked: crate::models::RankResponse = test::call_and_read_body_json(&app, req).await;
        assert_eq!(ranked.matches.len(), 1);
        assert_eq!(ranked.matches[0].project.id, project.id);
        assert_eq!(ranked.matches[0].score, 0.5);
    }

    #[actix_web::test]
    async fn test_invalid_user_payload_is_400() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(test_support::state()))
                .configure(configure_routes),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/api/v1/users")
            .set_json(serde_json::json!({ "name": "X", "email": "not-an-email", "role": "student" }))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn test_role_change_and_stats() {
        let state = test_support::state();
        let user = state
            .catalog
            .create_user("Ada", "ada@uni.edu", "student", &[])
            .await
            .unwrap();
        let app = test::init_service(
            App::new().app_data(web::Data::new(state)).configure(configure_routes),
        )
        .await;

        let req = test::TestRequest::put()
            .uri(&format!("/api/v1/users/{}/role", user.id))
            .set_json(serde_json::json!({ "role": "admin" }))
            .to_request();
        let updated: User = test::call_and_read_body_json(&app, req).await;
        assert_eq!(updated.role.as_str(), "admin");

        let req = test::TestRequest::get().uri("/api/v1/admin/stats").to_request();
        let stats: SystemStats = test::call_and_read_body_json(&app, req).await;
        assert_eq!(stats.users.get("admin"), Some(&1));
        assert_eq!(stats.applications, 0);
    }

    #[actix_web::test]
    async fn test_tracking_requires_approved_application() {
        let state = test_support::state();
        let teacher = state.catalog.create_user("Prof", "p@uni.edu", "teacher", &[]).await.unwrap();
        let student = state.catalog.create_user("Ada", "a@uni.edu", "student", &[]).await.unwrap();
        let project = state
            .catalog
            .create_project(NewProject {
                teacher_id: teacher.id,
                title: "NLP".to_string(),
                description: "parsing".to_string(),
                requirements: vec!["python".to_string()],
                tags: vec![],
            })
            .await
            .unwrap();
        let application = state.workflow.create_application(student.id, project.id).await.unwrap();
        let workflow = state.workflow.clone();
        let app = test::init_service(
            App::new().app_data(web::Data::new(state)).configure(configure_routes),
        )
        .await;

        let track = serde_json::json!({ "applicationId": application.id, "progress": "kickoff" });
        let req = test::TestRequest::post().uri("/api/v1/tracking").set_json(&track).to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::CONFLICT);

        workflow.set_application_status(application.id, "approved").await.unwrap();
        let req = test::TestRequest::post().uri("/api/v1/tracking").set_json(&track).to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::CREATED);

        let req = test::TestRequest::get()
            .uri(&format!("/api/v1/tracking?applicationId={}", application.id))
            .to_request();
        let trackings: Vec<Tracking> = test::call_and_read_body_json(&app, req).await;
        assert_eq!(trackings.len(), 1);

        let feedback = serde_json::json!({
            "fromUserId": teacher.id,
            "toUserId": student.id,
            "applicationId": application.id,
            "rating": 9
        });
        let req = test::TestRequest::post().uri("/api/v1/feedback").set_json(&feedback).to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);
    }
}
