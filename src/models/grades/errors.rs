//! 成绩录入的业务错误
//!
//! 五类可由调用方处理的业务错误，外加一个保留诊断信息的内部错误。

use std::fmt;

use chrono::{NaiveDate, Weekday};

use crate::errors::GradebookError;
use crate::models::ErrorCode;

/// 输入格式问题
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationIssue {
    GradeNotNumeric,
    InvalidDate,
    GradeOutOfRange,
}

impl ValidationIssue {
    pub fn message(&self) -> &'static str {
        match self {
            ValidationIssue::GradeNotNumeric => "grade must be numeric",
            ValidationIssue::InvalidDate => "invalid date",
            ValidationIssue::GradeOutOfRange => "grade out of range",
        }
    }
}

/// 无法解析的引用实体
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissingEntity {
    Student,
    Subject,
}

impl fmt::Display for MissingEntity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MissingEntity::Student => write!(f, "student"),
            MissingEntity::Subject => write!(f, "subject"),
        }
    }
}

/// 授权失败的原因，按检查顺序排列
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthorizationDenial {
    /// 教师不教该科目，或不教该学生所在班级
    NotAssigned,
    /// 该科目没有在学生所在班级开设
    SubjectNotOffered,
}

impl AuthorizationDenial {
    pub fn message(&self) -> &'static str {
        match self {
            AuthorizationDenial::NotAssigned => "teacher does not teach this subject/class",
            AuthorizationDenial::SubjectNotOffered => "subject not offered in student's class",
        }
    }
}

/// 非教学日
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NonInstructionalDay {
    Weekend(Weekday),
    Holiday(NaiveDate),
}

impl fmt::Display for NonInstructionalDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NonInstructionalDay::Weekend(day) => write!(f, "{day} is a weekend day"),
            NonInstructionalDay::Holiday(date) => write!(f, "{date} is a holiday"),
        }
    }
}

#[derive(Debug, Clone)]
pub enum SubmissionError {
    Validation(ValidationIssue),
    NotFound(MissingEntity),
    Authorization(AuthorizationDenial),
    Calendar(NonInstructionalDay),
    Duplicate,
    Internal(GradebookError),
}

impl SubmissionError {
    /// 对应的 API 错误码
    pub fn error_code(&self) -> ErrorCode {
        match self {
            SubmissionError::Validation(ValidationIssue::GradeNotNumeric) => {
                ErrorCode::GradeNotNumeric
            }
            SubmissionError::Validation(ValidationIssue::InvalidDate) => ErrorCode::InvalidDate,
            SubmissionError::Validation(ValidationIssue::GradeOutOfRange) => {
                ErrorCode::GradeOutOfRange
            }
            SubmissionError::NotFound(MissingEntity::Student) => ErrorCode::StudentNotFound,
            SubmissionError::NotFound(MissingEntity::Subject) => ErrorCode::SubjectNotFound,
            SubmissionError::Authorization(AuthorizationDenial::NotAssigned) => {
                ErrorCode::GradeNotAssigned
            }
            SubmissionError::Authorization(AuthorizationDenial::SubjectNotOffered) => {
                ErrorCode::SubjectNotOffered
            }
            SubmissionError::Calendar(NonInstructionalDay::Weekend(_)) => {
                ErrorCode::NonInstructionalWeekend
            }
            SubmissionError::Calendar(NonInstructionalDay::Holiday(_)) => {
                ErrorCode::NonInstructionalHoliday
            }
            SubmissionError::Duplicate => ErrorCode::GradeAlreadyExists,
            SubmissionError::Internal(_) => ErrorCode::InternalServerError,
        }
    }

    pub fn is_internal(&self) -> bool {
        matches!(self, SubmissionError::Internal(_))
    }

    /// 响应信封中的提示，内部错误不带存储层细节
    pub fn client_message(&self) -> String {
        match self {
            SubmissionError::Internal(_) => "Failed to save grade".to_string(),
            other => other.to_string(),
        }
    }
}

impl fmt::Display for SubmissionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SubmissionError::Validation(issue) => write!(f, "{}", issue.message()),
            SubmissionError::NotFound(entity) => write!(f, "{entity} not found"),
            SubmissionError::Authorization(denial) => write!(f, "{}", denial.message()),
            SubmissionError::Calendar(day) => write!(f, "not an instructional day: {day}"),
            SubmissionError::Duplicate => {
                write!(f, "a grade for this student and subject already exists for the day")
            }
            SubmissionError::Internal(err) => write!(f, "internal error: {err}"),
        }
    }
}

impl std::error::Error for SubmissionError {}

impl From<GradebookError> for SubmissionError {
    fn from(err: GradebookError) -> Self {
        // 存储层的唯一约束冲突就是并发下的重复录入
        if err.is_duplicate() {
            SubmissionError::Duplicate
        } else {
            SubmissionError::Internal(err)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_messages() {
        assert_eq!(
            SubmissionError::Validation(ValidationIssue::GradeNotNumeric).to_string(),
            "grade must be numeric"
        );
        assert_eq!(
            SubmissionError::Validation(ValidationIssue::InvalidDate).to_string(),
            "invalid date"
        );
        assert_eq!(
            SubmissionError::Validation(ValidationIssue::GradeOutOfRange).to_string(),
            "grade out of range"
        );
    }

    #[test]
    fn test_duplicate_storage_error_maps_to_duplicate() {
        let err: SubmissionError = GradebookError::duplicate("grades").into();
        assert!(matches!(err, SubmissionError::Duplicate));

        let err: SubmissionError = GradebookError::database_operation("disk full").into();
        assert!(err.is_internal());
        assert_eq!(err.error_code(), ErrorCode::InternalServerError);
    }

    #[test]
    fn test_calendar_sub_reasons_are_distinct() {
        let weekend = SubmissionError::Calendar(NonInstructionalDay::Weekend(Weekday::Sat));
        let holiday = SubmissionError::Calendar(NonInstructionalDay::Holiday(
            NaiveDate::from_ymd_opt(2025, 11, 7).expect("valid date"),
        ));
        assert_eq!(weekend.error_code(), ErrorCode::NonInstructionalWeekend);
        assert_eq!(holiday.error_code(), ErrorCode::NonInstructionalHoliday);
        assert!(holiday.to_string().contains("2025-11-07"));
    }

    #[test]
    fn test_client_message_hides_storage_details() {
        let err: SubmissionError =
            GradebookError::database_operation("查询成绩失败: database is locked").into();
        assert_eq!(err.client_message(), "Failed to save grade");
        assert_eq!(
            SubmissionError::Duplicate.client_message(),
            SubmissionError::Duplicate.to_string()
        );
    }
}
