use actix_web::{web, HttpResponse};

use super::{parse_status_filter, AppState};
use crate::core::{ApplicationFilter, ScoreMode};
use crate::error::ServiceError;
use crate::models::{
    CreateApplicationRequest, ListApplicationsQuery, PageResponse, StudentApplicationsQuery,
    UpdateStatusRequest,
};

/// Configure all application routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/applications", web::post().to(create_application))
        .route("/applications", web::get().to(list_applications))
        .route("/applications/status", web::post().to(update_status))
        .route("/applications/student/{id}", web::get().to(student_applications));
}

/// Submit an application
///
/// POST /api/v1/applications
///
/// Request body:
/// ```json
/// { "studentId": 1, "projectId": 2 }
/// ```
async fn create_application(
    state: web::Data<AppState>,
    req: web::Json<CreateApplicationRequest>,
) -> Result<HttpResponse, ServiceError> {
    let application = state
        .workflow
        .create_application(req.student_id, req.project_id)
        .await?;
    Ok(HttpResponse::Created().json(application))
}

/// Move an application to a new status
///
/// POST /api/v1/applications/status
///
/// Request body:
/// ```json
/// { "applicationId": 4, "status": "approved" }
/// ```
async fn update_status(
    state: web::Data<AppState>,
    req: web::Json<UpdateStatusRequest>,
) -> Result<HttpResponse, ServiceError> {
    let application = state
        .workflow
        .set_application_status(req.application_id, &req.status)
        .await?;
    Ok(HttpResponse::Ok().json(application))
}

/// Admin listing with scores for the rows on the page
///
/// GET /api/v1/applications?projectId=2&status=submitted&page=1&pageSize=20&fast=1
async fn list_applications(
    state: web::Data<AppState>,
    query: web::Query<ListApplicationsQuery>,
) -> Result<HttpResponse, ServiceError> {
    let filter = ApplicationFilter {
        project_id: query.project_id,
        status: parse_status_filter(query.status.as_deref())?,
    };
    let page = state.page(query.page, query.page_size);

    let items = state
        .ranking
        .list_application_views(&filter, page, query.fast)
        .await?;

    Ok(HttpResponse::Ok().json(PageResponse {
        items,
        page: page.number,
        page_size: page.size,
    }))
}

/// A student's own applications
///
/// GET /api/v1/applications/student/{id}?status=approved&scores=0
async fn student_applications(
    state: web::Data<AppState>,
    path: web::Path<i64>,
    query: web::Query<StudentApplicationsQuery>,
) -> Result<HttpResponse, ServiceError> {
    let student_id = path.into_inner();
    let status = parse_status_filter(query.status.as_deref())?;
    let page = state.page(query.page, query.page_size);
    let mode = match (query.scores, query.fast) {
        (false, _) => ScoreMode::Plain,
        (true, true) => ScoreMode::Fast,
        (true, false) => ScoreMode::Configured,
    };

    let items = state
        .ranking
        .student_application_views(student_id, status, page, mode)
        .await?;

    Ok(HttpResponse::Ok().json(PageResponse {
        items,
        page: page.number,
        page_size: page.size,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Application, ApplicationStatus, ApplicationView, NewProject, NewUser, Role};
    use crate::routes::{configure_routes, test_support};
    use actix_web::{http::StatusCode, test, App};

    async fn seeded() -> (AppState, i64, i64) {
        let state = test_support::state();
        let student = state
            .cache
            .create_user(NewUser {
                name: "Ada".to_string(),
                email: "ada@uni.edu".to_string(),
                role: Role::Student,
                skills: vec!["python".to_string()],
            })
            .await
            .unwrap();
        let project = state
            .cache
            .create_project(NewProject {
                teacher_id: 9,
                title: "NLP".to_string(),
                description: "parsing".to_string(),
                requirements: vec!["python".to_string(), "nlp".to_string()],
                tags: vec![],
            })
            .await
            .unwrap();
        (state, student.id, project.id)
    }

    #[actix_web::test]
    async fn test_apply_then_duplicate_is_409() {
        let (state, student_id, project_id) = seeded().await;
        let app = test::init_service(
            App::new().app_data(web::Data::new(state)).configure(configure_routes),
        )
        .await;
        let body = serde_json::json!({ "studentId": student_id, "projectId": project_id });

        let req = test::TestRequest::post().uri("/api/v1/applications").set_json(&body).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        let created: Application = test::read_body_json(resp).await;
        assert_eq!(created.status, ApplicationStatus::Submitted);

        let req = test::TestRequest::post().uri("/api/v1/applications").set_json(&body).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CONFLICT);
    }

    #[actix_web::test]
    async fn test_status_flow_over_http() {
        let (state, student_id, project_id) = seeded().await;
        let application = state.workflow.create_application(student_id, project_id).await.unwrap();
        let app = test::init_service(
            App::new().app_data(web::Data::new(state)).configure(configure_routes),
        )
        .await;

        let approve = serde_json::json!({ "applicationId": application.id, "status": "approved" });
        let req = test::TestRequest::post().uri("/api/v1/applications/status").set_json(&approve).to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);

        let reject = serde_json::json!({ "applicationId": application.id, "status": "rejected" });
        let req = test::TestRequest::post().uri("/api/v1/applications/status").set_json(&reject).to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::CONFLICT);

        let blank = serde_json::json!({ "applicationId": application.id, "status": "" });
        let req = test::TestRequest::post().uri("/api/v1/applications/status").set_json(&blank).to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn test_listings() {
        let (state, student_id, project_id) = seeded().await;
        state.workflow.create_application(student_id, project_id).await.unwrap();
        let app = test::init_service(
            App::new().app_data(web::Data::new(state)).configure(configure_routes),
        )
        .await;

        let req = test::TestRequest::get()
            .uri(&format!("/api/v1/applications?projectId={}&fast=1", project_id))
            .to_request();
        let body: PageResponse<ApplicationView> = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body.items.len(), 1);
        assert_eq!(body.items[0].score, 0.5);
        assert_eq!(body.page_size, 50);

        let req = test::TestRequest::get()
            .uri("/api/v1/applications?page=2&pageSize=1")
            .to_request();
        let body: PageResponse<ApplicationView> = test::call_and_read_body_json(&app, req).await;
        assert!(body.items.is_empty());

        let req = test::TestRequest::get()
            .uri(&format!("/api/v1/applications/student/{}?scores=0", student_id))
            .to_request();
        let body: PageResponse<ApplicationView> = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body.items[0].score, 0.0);
    }
}
