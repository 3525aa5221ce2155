use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use tracing::error;

use super::TeacherService;
use crate::errors::Result;
use crate::middlewares::RequireJWT;
use crate::models::teachers::entities::Teacher;
use crate::models::teachers::responses::{RosterResponse, TeacherOverviewResponse};
use crate::models::{ApiResponse, ErrorCode};
use crate::services::roster;
use crate::storage::Storage;

fn teacher_only() -> HttpResponse {
    HttpResponse::Forbidden().json(ApiResponse::error_empty(
        ErrorCode::Forbidden,
        "Only teachers can access this resource",
    ))
}

pub async fn handle_overview(request: &HttpRequest) -> ActixResult<HttpResponse> {
    let Some(teacher) = RequireJWT::extract_teacher(request) else {
        return Ok(teacher_only());
    };

    Ok(HttpResponse::Ok().json(ApiResponse::success(
        TeacherOverviewResponse { teacher },
        "Teacher overview retrieved",
    )))
}

/// 录入页面的数据：名册、任教科目、今天的日期
pub async fn build_roster(storage: &dyn Storage, teacher: &Teacher) -> Result<RosterResponse> {
    let students = storage.list_students_in_classes(&teacher.class_ids()).await?;
    let mut subjects = teacher.subjects.clone();
    subjects.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));

    Ok(RosterResponse {
        classes: roster::roster(teacher, &students),
        subjects,
        today: chrono::Local::now().date_naive(),
    })
}

pub async fn handle_roster(
    service: &TeacherService,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let Some(teacher) = RequireJWT::extract_teacher(request) else {
        return Ok(teacher_only());
    };

    let storage = service.get_storage(request);
    match build_roster(storage.as_ref(), &teacher).await {
        Ok(response) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            response,
            "Roster retrieved",
        ))),
        Err(e) => {
            error!("Failed to load roster for {}: {}", teacher.login_id, e);
            Ok(
                HttpResponse::InternalServerError().json(ApiResponse::error_empty(
                    ErrorCode::InternalServerError,
                    "Failed to load roster",
                )),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::principals::requests::{NewStudent, NewTeacher};
    use crate::storage::memory_storage::MemoryStorage;

    #[tokio::test]
    async fn test_roster_lists_only_taught_classes() {
        let storage = MemoryStorage::new();
        let c9a = storage.create_school_class(9, "A").await.expect("class");
        let c9b = storage.create_school_class(9, "B").await.expect("class");
        let math = storage.create_subject("Math", &[c9a.id]).await.expect("math");
        let art = storage.create_subject("Art", &[c9a.id]).await.expect("art");
        let teacher = storage
            .create_teacher(NewTeacher {
                login_id: "t000002".to_string(),
                password_hash: String::new(),
                first_name: "Olga".to_string(),
                last_name: "Smirnova".to_string(),
                subject_ids: vec![math.id, art.id],
                class_ids: vec![c9a.id],
            })
            .await
            .expect("teacher");

        for (login_id, last, class_id) in [
            ("250001", "Petrov", Some(c9a.id)),
            ("250002", "Antonov", Some(c9a.id)),
            ("250003", "Belov", Some(c9b.id)),
            ("250004", "Nobody", None),
        ] {
            storage
                .create_student(NewStudent {
                    login_id: login_id.to_string(),
                    password_hash: String::new(),
                    first_name: "Ivan".to_string(),
                    last_name: last.to_string(),
                    class_id,
                })
                .await
                .expect("student");
        }

        let response = build_roster(&storage, &teacher).await.expect("roster");
        assert_eq!(response.classes.len(), 1);
        assert_eq!(response.classes[0].class_name, "9-A");
        let names: Vec<_> = response.classes[0]
            .students
            .iter()
            .map(|s| s.last_name.as_str())
            .collect();
        assert_eq!(names, ["Antonov", "Petrov"]);

        let subjects: Vec<_> = response.subjects.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(subjects, ["Art", "Math"]);
    }
}
