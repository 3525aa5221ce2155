use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use tracing::error;

use super::GradeService;
use crate::middlewares::RequireJWT;
use crate::models::grades::entities::GradeFilter;
use crate::models::{ApiResponse, ErrorCode, PaginationQuery};

/// 教师查看自己名册内学生的成绩，可按科目筛选
pub async fn list_grades(
    service: &GradeService,
    request: &HttpRequest,
    subject_id: Option<i64>,
    pagination: PaginationQuery,
) -> ActixResult<HttpResponse> {
    let Some(teacher) = RequireJWT::extract_teacher(request) else {
        return Ok(HttpResponse::Forbidden().json(ApiResponse::error_empty(
            ErrorCode::Forbidden,
            "Only teachers can list grades",
        )));
    };

    if let Some(subject_id) = subject_id
        && !teacher.teaches_subject(subject_id)
    {
        return Ok(HttpResponse::Forbidden().json(ApiResponse::error_empty(
            ErrorCode::GradeNotAssigned,
            "teacher does not teach this subject",
        )));
    }

    let storage = service.get_storage(request);

    let students = match storage.list_students_in_classes(&teacher.class_ids()).await {
        Ok(students) => students,
        Err(e) => {
            error!("Failed to load roster for {}: {}", teacher.login_id, e);
            return Ok(
                HttpResponse::InternalServerError().json(ApiResponse::error_empty(
                    ErrorCode::InternalServerError,
                    "Failed to load roster",
                )),
            );
        }
    };

    // 未指定科目时只看自己教的科目
    let subject_ids = match subject_id {
        Some(id) => vec![id],
        None => teacher.subjects.iter().map(|s| s.id).collect(),
    };
    let filter = GradeFilter::for_students(students.iter().map(|s| s.id).collect())
        .with_subjects(subject_ids);

    let response = match storage.list_grades_with_pagination(filter, pagination).await {
        Ok(response) => response,
        Err(e) => {
            error!("Failed to list grades for {}: {}", teacher.login_id, e);
            return Ok(
                HttpResponse::InternalServerError().json(ApiResponse::error_empty(
                    ErrorCode::InternalServerError,
                    "Failed to list grades",
                )),
            );
        }
    };

    Ok(HttpResponse::Ok().json(ApiResponse::success(response, "Grades retrieved")))
}
