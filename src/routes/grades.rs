use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, web};
use once_cell::sync::Lazy;

use crate::middlewares::{RateLimit, RequireJWT, RequireRole};
use crate::models::grades::requests::{GradeListQuery, GradeSubmissionRequest};
use crate::models::principals::entities::Role;
use crate::services::GradeService;

static GRADE_SERVICE: Lazy<GradeService> = Lazy::new(GradeService::new_lazy);

pub async fn submit_grade(
    req: HttpRequest,
    submission: web::Json<GradeSubmissionRequest>,
) -> ActixResult<HttpResponse> {
    GRADE_SERVICE.submit_grade(&req, submission.into_inner()).await
}

pub async fn list_grades(
    req: HttpRequest,
    query: web::Query<GradeListQuery>,
) -> ActixResult<HttpResponse> {
    GRADE_SERVICE.list_grades(&req, query.into_inner()).await
}

pub fn configure_grades_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1/grades")
            .wrap(RateLimit::grade_submission())
            .wrap(RequireRole::new(Role::Teacher))
            .wrap(RequireJWT)
            .route("", web::post().to(submit_grade))
            .route("", web::get().to(list_grades)),
    );
}
