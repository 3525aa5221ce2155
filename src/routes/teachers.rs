use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, web};
use once_cell::sync::Lazy;

use crate::middlewares::{RequireJWT, RequireRole};
use crate::models::principals::entities::Role;
use crate::services::{ReportService, TeacherService};

static TEACHER_SERVICE: Lazy<TeacherService> = Lazy::new(TeacherService::new_lazy);
static REPORT_SERVICE: Lazy<ReportService> = Lazy::new(ReportService::new_lazy);

pub async fn get_overview(req: HttpRequest) -> ActixResult<HttpResponse> {
    TEACHER_SERVICE.get_overview(&req).await
}

pub async fn get_roster(req: HttpRequest) -> ActixResult<HttpResponse> {
    TEACHER_SERVICE.get_roster(&req).await
}

pub async fn get_student_report(
    req: HttpRequest,
    path: web::Path<i64>,
) -> ActixResult<HttpResponse> {
    REPORT_SERVICE
        .get_student_report(&req, path.into_inner())
        .await
}

pub fn configure_teachers_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1/teachers/me")
            .wrap(RequireRole::new(Role::Teacher))
            .wrap(RequireJWT)
            .route("", web::get().to(get_overview))
            .route("/roster", web::get().to(get_roster))
            .route(
                "/students/{student_id}/report",
                web::get().to(get_student_report),
            ),
    );
}
