use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, web};
use once_cell::sync::Lazy;

use crate::middlewares::{RequireJWT, RequireRole};
use crate::models::principals::entities::Role;
use crate::services::ReportService;

static REPORT_SERVICE: Lazy<ReportService> = Lazy::new(ReportService::new_lazy);

pub async fn get_own_report(req: HttpRequest) -> ActixResult<HttpResponse> {
    REPORT_SERVICE.get_own_report(&req).await
}

pub async fn get_parent_report(req: HttpRequest) -> ActixResult<HttpResponse> {
    REPORT_SERVICE.get_parent_report(&req).await
}

// 学生和家长各自只能看到自己的报告
pub fn configure_reports_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1/students/me")
            .wrap(RequireRole::new(Role::Student))
            .wrap(RequireJWT)
            .route("/report", web::get().to(get_own_report)),
    )
    .service(
        web::scope("/api/v1/parents/me")
            .wrap(RequireRole::new(Role::Parent))
            .wrap(RequireJWT)
            .route("/report", web::get().to(get_parent_report)),
    );
}
