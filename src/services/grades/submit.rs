//! 成绩录入流程
//!
//! 解析 → 范围 → 解析引用 → 授权 → 教学日 → 查重 → 写入。
//! 前六步只读，任何一步失败都不会写入台账。

use std::num::IntErrorKind;

use actix_web::http::StatusCode;
use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use chrono::NaiveDate;
use tracing::{error, info, warn};

use super::GradeService;
use crate::middlewares::RequireJWT;
use crate::models::grades::entities::{Grade, MAX_GRADE, MIN_GRADE, NewGrade};
use crate::models::grades::errors::{MissingEntity, SubmissionError, ValidationIssue};
use crate::models::grades::requests::GradeSubmissionRequest;
use crate::models::grades::responses::GradeSubmissionResponse;
use crate::models::students::entities::Student;
use crate::models::subjects::entities::Subject;
use crate::models::teachers::entities::Teacher;
use crate::models::{ApiResponse, ErrorCode};
use crate::services::calendar::CalendarPolicy;
use crate::services::roster;
use crate::storage::Storage;

/// 已写入的成绩及其解析出的学生、科目
#[derive(Debug, Clone)]
pub struct AcceptedGrade {
    pub grade: Grade,
    pub student: Student,
    pub subject: Subject,
}

fn parse_grade(raw: &str) -> Result<i64, ValidationIssue> {
    raw.trim().parse::<i64>().map_err(|e| match e.kind() {
        // 数字本身合法，只是超出范围
        IntErrorKind::PosOverflow | IntErrorKind::NegOverflow => ValidationIssue::GradeOutOfRange,
        _ => ValidationIssue::GradeNotNumeric,
    })
}

/// 只接受补零的 `YYYY-MM-DD`
fn parse_date(raw: &str) -> Result<NaiveDate, ValidationIssue> {
    let raw = raw.trim();
    let well_formed = raw.len() == 10
        && raw.bytes().enumerate().all(|(i, b)| match i {
            4 | 7 => b == b'-',
            _ => b.is_ascii_digit(),
        });
    if !well_formed {
        return Err(ValidationIssue::InvalidDate);
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|_| ValidationIssue::InvalidDate)
}

/// 非数字引用视为不存在
fn parse_reference(raw: &str) -> Option<i64> {
    raw.trim().parse::<i64>().ok()
}

/// 执行一次成绩录入
pub async fn submit_grade(
    storage: &dyn Storage,
    calendar: &CalendarPolicy,
    teacher: &Teacher,
    request: &GradeSubmissionRequest,
) -> Result<AcceptedGrade, SubmissionError> {
    // 1. 解析
    let value = parse_grade(&request.grade).map_err(SubmissionError::Validation)?;
    let date = parse_date(&request.date).map_err(SubmissionError::Validation)?;

    // 2. 范围
    if !(i64::from(MIN_GRADE)..=i64::from(MAX_GRADE)).contains(&value) {
        return Err(SubmissionError::Validation(ValidationIssue::GradeOutOfRange));
    }
    let value = value as i32;

    // 3. 解析引用，学生优先
    let student = match parse_reference(&request.student) {
        Some(id) => storage.get_student_by_id(id).await?,
        None => None,
    }
    .ok_or(SubmissionError::NotFound(MissingEntity::Student))?;

    let subject = match parse_reference(&request.subject) {
        Some(id) => storage.get_subject_by_id(id).await?,
        None => None,
    }
    .ok_or(SubmissionError::NotFound(MissingEntity::Subject))?;

    // 4. 授权
    roster::authorize(teacher, &subject, &student).map_err(SubmissionError::Authorization)?;

    // 5. 教学日
    calendar.check(date).map_err(SubmissionError::Calendar)?;

    // 6. 查重
    if storage.grade_exists(student.id, subject.id, date).await? {
        return Err(SubmissionError::Duplicate);
    }

    // 7. 写入；并发下漏过查重的请求在这里被唯一约束拦下
    let grade = storage
        .create_grade(NewGrade {
            student_id: student.id,
            subject_id: subject.id,
            value,
            date,
        })
        .await?;

    Ok(AcceptedGrade {
        grade,
        student,
        subject,
    })
}

/// 业务错误对应的 HTTP 状态
pub fn status_for(err: &SubmissionError) -> StatusCode {
    match err {
        SubmissionError::Validation(_) => StatusCode::BAD_REQUEST,
        SubmissionError::NotFound(_) => StatusCode::NOT_FOUND,
        SubmissionError::Authorization(_) => StatusCode::FORBIDDEN,
        SubmissionError::Calendar(_) => StatusCode::UNPROCESSABLE_ENTITY,
        SubmissionError::Duplicate => StatusCode::CONFLICT,
        SubmissionError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

pub async fn handle_submit_grade(
    service: &GradeService,
    request: &HttpRequest,
    submission: GradeSubmissionRequest,
) -> ActixResult<HttpResponse> {
    let Some(teacher) = RequireJWT::extract_teacher(request) else {
        return Ok(HttpResponse::Forbidden().json(ApiResponse::error_empty(
            ErrorCode::Forbidden,
            "Only teachers can submit grades",
        )));
    };

    let storage = service.get_storage(request);
    let calendar = service.get_calendar(request);

    match submit_grade(storage.as_ref(), &calendar, &teacher, &submission).await {
        Ok(accepted) => {
            info!(
                "Grade {} accepted: teacher {} student {} subject {} date {}",
                accepted.grade.value,
                teacher.login_id,
                accepted.student.login_id,
                accepted.subject.name,
                accepted.grade.date
            );
            let response = GradeSubmissionResponse {
                student_name: accepted.student.full_name(),
                subject_name: accepted.subject.name,
                grade: accepted.grade,
            };
            Ok(HttpResponse::Created().json(ApiResponse::success(response, "Grade saved")))
        }
        Err(err) => {
            if let SubmissionError::Internal(ref inner) = err {
                error!(
                    "Grade submission by {} failed: {}",
                    teacher.login_id,
                    inner.format_simple()
                );
                return Ok(
                    HttpResponse::InternalServerError().json(ApiResponse::error_empty(
                        err.error_code(),
                        err.client_message(),
                    )),
                );
            }

            warn!(
                "Grade submission by {} rejected (student={}, subject={}, date={}): {}",
                teacher.login_id, submission.student, submission.subject, submission.date, err
            );
            Ok(HttpResponse::build(status_for(&err))
                .json(ApiResponse::error_empty(err.error_code(), err.client_message())))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::GradebookError;
    use crate::models::grades::entities::GradeFilter;
    use crate::models::grades::errors::{AuthorizationDenial, NonInstructionalDay};
    use crate::models::principals::requests::{NewStudent, NewTeacher};
    use crate::storage::memory_storage::MemoryStorage;
    use std::sync::Arc;

    struct School {
        storage: Arc<MemoryStorage>,
        calendar: CalendarPolicy,
        teacher: Teacher,
        student: Student,
        math: Subject,
        science: Subject,
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    // 9-A 开设数学，T 在 9-A 教数学，S 在 9-A；科学课在 9-A 开设但 T 不教
    async fn school() -> School {
        let storage = Arc::new(MemoryStorage::new());
        let c9a = storage.create_school_class(9, "A").await.expect("class");
        let math = storage
            .create_subject("Mathematics", &[c9a.id])
            .await
            .expect("math");
        let science = storage
            .create_subject("Science", &[c9a.id])
            .await
            .expect("science");
        let teacher = storage
            .create_teacher(NewTeacher {
                login_id: "t100001".to_string(),
                password_hash: String::new(),
                first_name: "Olga".to_string(),
                last_name: "Smirnova".to_string(),
                subject_ids: vec![math.id],
                class_ids: vec![c9a.id],
            })
            .await
            .expect("teacher");
        let student = storage
            .create_student(NewStudent {
                login_id: "250001".to_string(),
                password_hash: String::new(),
                first_name: "Ivan".to_string(),
                last_name: "Ivanov".to_string(),
                class_id: Some(c9a.id),
            })
            .await
            .expect("student");

        School {
            storage,
            calendar: CalendarPolicy::new([date(2025, 11, 7)]),
            teacher,
            student,
            math,
            science,
        }
    }

    fn request(student: i64, subject: i64, grade: &str, date: &str) -> GradeSubmissionRequest {
        GradeSubmissionRequest {
            student: student.to_string(),
            subject: subject.to_string(),
            grade: grade.to_string(),
            date: date.to_string(),
        }
    }

    async fn stored(school: &School) -> Vec<Grade> {
        school
            .storage
            .list_grades(GradeFilter::for_student(school.student.id))
            .await
            .expect("list")
    }

    async fn submit(school: &School, req: &GradeSubmissionRequest) -> Result<AcceptedGrade, SubmissionError> {
        submit_grade(
            school.storage.as_ref(),
            &school.calendar,
            &school.teacher,
            req,
        )
        .await
    }

    #[tokio::test]
    async fn test_valid_submission_then_duplicate() {
        let school = school().await;
        let req = request(school.student.id, school.math.id, "8", "2025-09-15");

        let accepted = submit(&school, &req).await.expect("accepted");
        assert_eq!(accepted.grade.value, 8);
        assert_eq!(accepted.grade.date, date(2025, 9, 15));

        let again = request(school.student.id, school.math.id, "5", "2025-09-15");
        let err = submit(&school, &again).await.expect_err("duplicate");
        assert!(matches!(err, SubmissionError::Duplicate));
        assert_eq!(status_for(&err), StatusCode::CONFLICT);

        let grades = stored(&school).await;
        assert_eq!(grades.len(), 1);
        assert_eq!(grades[0].value, 8);
    }

    #[tokio::test]
    async fn test_parse_failures() {
        let school = school().await;
        let (st, su) = (school.student.id, school.math.id);

        for raw in ["eight", "8.5", "", " "] {
            let err = submit(&school, &request(st, su, raw, "2025-09-15"))
                .await
                .expect_err("not numeric");
            assert!(matches!(
                err,
                SubmissionError::Validation(ValidationIssue::GradeNotNumeric)
            ));
        }

        for raw in ["2025-02-30", "15.09.2025", "yesterday", "2025-9-15", "2025-09-5", "+2025-09-15"] {
            let err = submit(&school, &request(st, su, "8", raw))
                .await
                .expect_err("invalid date");
            assert!(matches!(
                err,
                SubmissionError::Validation(ValidationIssue::InvalidDate)
            ));
        }

        // 首尾空白允许
        submit(&school, &request(st, su, " 9 ", "2025-09-16"))
            .await
            .expect("trimmed");
    }

    #[test]
    fn test_date_must_be_zero_padded() {
        assert_eq!(parse_date(" 2025-09-05 "), Ok(date(2025, 9, 5)));
        for raw in ["2025-9-15", "2025-09-5", "2025-9-5", "25-09-15", "2025/09/15", "2025-09-15T00:00"] {
            assert_eq!(parse_date(raw), Err(ValidationIssue::InvalidDate), "{raw}");
        }
    }

    #[tokio::test]
    async fn test_out_of_range_leaves_ledger_unchanged() {
        let school = school().await;
        for raw in ["0", "11", "-3", "99999999999999999999"] {
            let err = submit(
                &school,
                &request(school.student.id, school.math.id, raw, "2025-09-15"),
            )
            .await
            .expect_err("out of range");
            assert!(matches!(
                err,
                SubmissionError::Validation(ValidationIssue::GradeOutOfRange)
            ));
            assert_eq!(status_for(&err), StatusCode::BAD_REQUEST);
        }
        assert!(stored(&school).await.is_empty());

        for raw in ["1", "10"] {
            let day = if raw == "1" { "2025-09-15" } else { "2025-09-16" };
            submit(&school, &request(school.student.id, school.math.id, raw, day))
                .await
                .expect("boundary value");
        }
        assert_eq!(stored(&school).await.len(), 2);
    }

    #[tokio::test]
    async fn test_unknown_references() {
        let school = school().await;

        let err = submit(&school, &request(9999, 9999, "8", "2025-09-15"))
            .await
            .expect_err("student first");
        assert!(matches!(
            err,
            SubmissionError::NotFound(MissingEntity::Student)
        ));

        let err = submit(&school, &request(school.student.id, 9999, "8", "2025-09-15"))
            .await
            .expect_err("subject");
        assert!(matches!(
            err,
            SubmissionError::NotFound(MissingEntity::Subject)
        ));
        assert_eq!(status_for(&err), StatusCode::NOT_FOUND);

        let mut req = request(school.student.id, school.math.id, "8", "2025-09-15");
        req.student = "Ivanov".to_string();
        let err = submit(&school, &req).await.expect_err("non-numeric ref");
        assert!(matches!(
            err,
            SubmissionError::NotFound(MissingEntity::Student)
        ));
    }

    #[tokio::test]
    async fn test_subject_not_taught_is_forbidden() {
        let school = school().await;
        let err = submit(
            &school,
            &request(school.student.id, school.science.id, "8", "2025-09-15"),
        )
        .await
        .expect_err("not assigned");
        assert!(matches!(
            err,
            SubmissionError::Authorization(AuthorizationDenial::NotAssigned)
        ));
        assert_eq!(status_for(&err), StatusCode::FORBIDDEN);
        assert!(stored(&school).await.is_empty());
    }

    #[tokio::test]
    async fn test_subject_not_offered_in_class() {
        let school = school().await;
        let c9b = school
            .storage
            .create_school_class(9, "B")
            .await
            .expect("class");
        let art = school
            .storage
            .create_subject("Art", &[c9b.id])
            .await
            .expect("art");

        let mut teacher = school.teacher.clone();
        teacher.subjects.push(art.clone());

        let err = submit_grade(
            school.storage.as_ref(),
            &school.calendar,
            &teacher,
            &request(school.student.id, art.id, "8", "2025-09-15"),
        )
        .await
        .expect_err("not offered");
        assert!(matches!(
            err,
            SubmissionError::Authorization(AuthorizationDenial::SubjectNotOffered)
        ));
    }

    #[tokio::test]
    async fn test_calendar_rejections() {
        let school = school().await;
        let (st, su) = (school.student.id, school.math.id);

        let err = submit(&school, &request(st, su, "8", "2025-11-07"))
            .await
            .expect_err("holiday");
        assert!(matches!(
            err,
            SubmissionError::Calendar(NonInstructionalDay::Holiday(_))
        ));
        assert_eq!(status_for(&err), StatusCode::UNPROCESSABLE_ENTITY);

        let err = submit(&school, &request(st, su, "8", "2025-11-08"))
            .await
            .expect_err("weekend");
        assert!(matches!(
            err,
            SubmissionError::Calendar(NonInstructionalDay::Weekend(_))
        ));

        assert!(stored(&school).await.is_empty());
    }

    #[tokio::test]
    async fn test_authorization_checked_before_calendar() {
        let school = school().await;
        // 周六 + 不教的科目：先报授权错误
        let err = submit(
            &school,
            &request(school.student.id, school.science.id, "8", "2025-11-08"),
        )
        .await
        .expect_err("rejected");
        assert!(matches!(err, SubmissionError::Authorization(_)));
    }

    #[tokio::test]
    async fn test_storage_duplicate_surfaces_as_duplicate() {
        let err: SubmissionError = GradebookError::duplicate("grades").into();
        assert_eq!(status_for(&err), StatusCode::CONFLICT);
        assert_eq!(err.error_code(), ErrorCode::GradeAlreadyExists);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_submissions_store_exactly_one() {
        let school = Arc::new(school().await);

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let school = school.clone();
                tokio::spawn(async move {
                    let grade = (i % 10 + 1).to_string();
                    let req = request(school.student.id, school.math.id, &grade, "2025-09-17");
                    submit(&school, &req).await
                })
            })
            .collect();

        let mut accepted = 0;
        for handle in handles {
            match handle.await.expect("task") {
                Ok(_) => accepted += 1,
                Err(err) => assert!(matches!(err, SubmissionError::Duplicate)),
            }
        }

        assert_eq!(accepted, 1);
        assert_eq!(stored(&school).await.len(), 1);
    }
}
