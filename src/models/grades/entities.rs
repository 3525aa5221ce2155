use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// 成绩允许的取值范围（十分制）
pub const MIN_GRADE: i32 = 1;
pub const MAX_GRADE: i32 = 10;

// 成绩记录，创建后不可修改
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "grade.ts")]
pub struct Grade {
    pub id: i64,
    pub student_id: i64,
    pub subject_id: i64,
    pub value: i32,
    pub date: NaiveDate,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// 待写入的成绩
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewGrade {
    pub student_id: i64,
    pub subject_id: i64,
    pub value: i32,
    pub date: NaiveDate,
}

/// 成绩筛选条件，字段为空表示不限
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GradeFilter {
    pub student_ids: Option<Vec<i64>>,
    pub subject_ids: Option<Vec<i64>>,
}

impl GradeFilter {
    pub fn for_student(student_id: i64) -> Self {
        Self {
            student_ids: Some(vec![student_id]),
            subject_ids: None,
        }
    }

    pub fn for_students(student_ids: Vec<i64>) -> Self {
        Self {
            student_ids: Some(student_ids),
            subject_ids: None,
        }
    }

    pub fn with_subject(mut self, subject_id: Option<i64>) -> Self {
        if let Some(id) = subject_id {
            self.subject_ids = Some(vec![id]);
        }
        self
    }

    pub fn with_subjects(mut self, subject_ids: Vec<i64>) -> Self {
        self.subject_ids = Some(subject_ids);
        self
    }

    /// 任一 ID 列表为空时不可能有匹配
    pub fn is_empty(&self) -> bool {
        self.student_ids.as_ref().is_some_and(|ids| ids.is_empty())
            || self.subject_ids.as_ref().is_some_and(|ids| ids.is_empty())
    }

    pub fn matches(&self, grade: &Grade) -> bool {
        let student_ok = self
            .student_ids
            .as_ref()
            .is_none_or(|ids| ids.contains(&grade.student_id));
        let subject_ok = self
            .subject_ids
            .as_ref()
            .is_none_or(|ids| ids.contains(&grade.subject_id));
        student_ok && subject_ok
    }
}
