use serde::Serialize;
use ts_rs::TS;

use super::entities::Grade;
use crate::models::PaginationInfo;

// 成绩录入成功的响应
#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "grade.ts")]
pub struct GradeSubmissionResponse {
    pub grade: Grade,
    pub student_name: String,
    pub subject_name: String,
}

// 成绩列表响应
#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "grade.ts")]
pub struct GradeListResponse {
    pub items: Vec<Grade>,
    pub pagination: PaginationInfo,
}
