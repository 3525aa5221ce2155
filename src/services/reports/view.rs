use std::collections::{BTreeSet, HashMap};

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use tracing::{error, info};

use super::ReportService;
use super::aggregate;
use crate::errors::Result;
use crate::middlewares::RequireJWT;
use crate::models::grades::entities::{Grade, GradeFilter};
use crate::models::parents::entities::Parent;
use crate::models::reports::responses::{ParentReport, StudentReport};
use crate::models::students::entities::Student;
use crate::models::subjects::entities::Subject;
use crate::models::{ApiResponse, ErrorCode};
use crate::services::roster;
use crate::storage::Storage;

async fn subject_catalog(storage: &dyn Storage, grades: &[Grade]) -> Result<HashMap<i64, Subject>> {
    let ids: Vec<i64> = grades
        .iter()
        .map(|g| g.subject_id)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    Ok(storage
        .list_subjects_by_ids(&ids)
        .await?
        .into_iter()
        .map(|s| (s.id, s))
        .collect())
}

/// 加载数据并生成学生报告
pub async fn build_student_report(storage: &dyn Storage, student: &Student) -> Result<StudentReport> {
    let grades = storage.list_grades(GradeFilter::for_student(student.id)).await?;
    let subjects = subject_catalog(storage, &grades).await?;
    Ok(aggregate::student_report(student, &grades, &subjects))
}

/// 加载数据并生成家长报告
pub async fn build_parent_report(storage: &dyn Storage, parent: &Parent) -> Result<ParentReport> {
    let children = storage.list_students_by_ids(&parent.children_ids).await?;
    let grades = storage
        .list_grades(GradeFilter::for_students(parent.children_ids.clone()))
        .await?;
    let subjects = subject_catalog(storage, &grades).await?;
    Ok(aggregate::parent_report(parent, &children, &grades, &subjects))
}

fn internal_error(message: &str) -> HttpResponse {
    HttpResponse::InternalServerError().json(ApiResponse::error_empty(
        ErrorCode::InternalServerError,
        message,
    ))
}

pub async fn handle_own_report(
    service: &ReportService,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let Some(student) = RequireJWT::extract_student(request) else {
        return Ok(HttpResponse::Forbidden().json(ApiResponse::error_empty(
            ErrorCode::Forbidden,
            "Only students have an own report",
        )));
    };

    let storage = service.get_storage(request);
    match build_student_report(storage.as_ref(), &student).await {
        Ok(report) => Ok(HttpResponse::Ok().json(ApiResponse::success(report, "Report generated"))),
        Err(e) => {
            error!("Failed to build report for student {}: {}", student.login_id, e);
            Ok(internal_error("Failed to build report"))
        }
    }
}

pub async fn handle_parent_report(
    service: &ReportService,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let Some(parent) = RequireJWT::extract_parent(request) else {
        return Ok(HttpResponse::Forbidden().json(ApiResponse::error_empty(
            ErrorCode::Forbidden,
            "Only parents have a family report",
        )));
    };

    let storage = service.get_storage(request);
    match build_parent_report(storage.as_ref(), &parent).await {
        Ok(report) => Ok(HttpResponse::Ok().json(ApiResponse::success(report, "Report generated"))),
        Err(e) => {
            error!("Failed to build report for parent {}: {}", parent.login_id, e);
            Ok(internal_error("Failed to build report"))
        }
    }
}

pub async fn handle_teacher_student_report(
    service: &ReportService,
    request: &HttpRequest,
    student_id: i64,
) -> ActixResult<HttpResponse> {
    let Some(teacher) = RequireJWT::extract_teacher(request) else {
        return Ok(HttpResponse::Forbidden().json(ApiResponse::error_empty(
            ErrorCode::Forbidden,
            "Only teachers can view student reports",
        )));
    };

    let storage = service.get_storage(request);
    let student = match storage.get_student_by_id(student_id).await {
        Ok(Some(student)) => student,
        Ok(None) => {
            return Ok(HttpResponse::NotFound().json(ApiResponse::error_empty(
                ErrorCode::StudentNotFound,
                "student not found",
            )));
        }
        Err(e) => {
            error!("Failed to load student {}: {}", student_id, e);
            return Ok(internal_error("Failed to load student"));
        }
    };

    if !roster::in_roster(&teacher, &student) {
        info!(
            "Teacher {} denied report for student {} outside roster",
            teacher.login_id, student.login_id
        );
        return Ok(HttpResponse::Forbidden().json(ApiResponse::error_empty(
            ErrorCode::Forbidden,
            "student is not in your classes",
        )));
    }

    match build_student_report(storage.as_ref(), &student).await {
        Ok(report) => Ok(HttpResponse::Ok().json(ApiResponse::success(report, "Report generated"))),
        Err(e) => {
            error!("Failed to build report for student {}: {}", student.login_id, e);
            Ok(internal_error("Failed to build report"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::grades::entities::NewGrade;
    use crate::models::principals::requests::{NewParent, NewStudent};
    use crate::storage::memory_storage::MemoryStorage;
    use chrono::NaiveDate;

    async fn student(storage: &MemoryStorage, login_id: &str, class_id: i64) -> Student {
        storage
            .create_student(NewStudent {
                login_id: login_id.to_string(),
                password_hash: String::new(),
                first_name: "Ivan".to_string(),
                last_name: "Ivanov".to_string(),
                class_id: Some(class_id),
            })
            .await
            .expect("student")
    }

    async fn grade(storage: &MemoryStorage, student_id: i64, subject_id: i64, value: i32, day: u32) {
        storage
            .create_grade(NewGrade {
                student_id,
                subject_id,
                value,
                date: NaiveDate::from_ymd_opt(2025, 9, day).expect("valid date"),
            })
            .await
            .expect("grade");
    }

    #[tokio::test]
    async fn test_student_report_from_storage() {
        let storage = MemoryStorage::new();
        let class = storage.create_school_class(9, "A").await.expect("class");
        let math = storage.create_subject("Math", &[class.id]).await.expect("math");
        let science = storage
            .create_subject("Science", &[class.id])
            .await
            .expect("science");
        let s = student(&storage, "250001", class.id).await;
        let other = student(&storage, "250002", class.id).await;

        grade(&storage, s.id, math.id, 8, 15).await;
        grade(&storage, s.id, math.id, 6, 16).await;
        grade(&storage, s.id, science.id, 10, 15).await;
        grade(&storage, other.id, math.id, 2, 15).await;

        let report = build_student_report(&storage, &s).await.expect("report");
        assert_eq!(report.total_grades, 3);
        assert_eq!(report.overall_average, Some(8.0));
        assert_eq!(report.subjects[0].subject_name, "Math");
        assert_eq!(report.subjects[0].average, 7.0);
    }

    #[tokio::test]
    async fn test_parent_report_from_storage() {
        let storage = MemoryStorage::new();
        let class = storage.create_school_class(5, "B").await.expect("class");
        let math = storage.create_subject("Math", &[class.id]).await.expect("math");
        let child = student(&storage, "250010", class.id).await;
        let stranger = student(&storage, "250011", class.id).await;

        grade(&storage, child.id, math.id, 10, 15).await;
        grade(&storage, child.id, math.id, 9, 16).await;
        grade(&storage, child.id, math.id, 9, 17).await;
        grade(&storage, stranger.id, math.id, 1, 15).await;

        let parent = storage
            .create_parent(NewParent {
                login_id: "P001025".to_string(),
                password_hash: String::new(),
                first_name: "Anna".to_string(),
                last_name: "Ivanova".to_string(),
                children_ids: vec![child.id],
            })
            .await
            .expect("parent");

        let report = build_parent_report(&storage, &parent).await.expect("report");
        assert_eq!(report.children.len(), 1);
        assert_eq!(report.children[0].student.id, child.id);
        assert_eq!(report.children[0].subjects[0].average, 9.33);
    }
}
