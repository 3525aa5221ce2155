use serde::Deserialize;
use ts_rs::TS;

// 成绩录入请求，所有字段均以文本传输
#[derive(Debug, Clone, Deserialize, TS)]
#[ts(export, export_to = "grade.ts")]
pub struct GradeSubmissionRequest {
    pub student: String,
    pub subject: String,
    pub grade: String,
    pub date: String,
}

// 成绩列表查询
#[derive(Debug, Clone, Deserialize, TS)]
#[ts(export, export_to = "grade.ts")]
pub struct GradeListQuery {
    pub subject_id: Option<i64>,
    pub page: Option<i64>,
    pub size: Option<i64>,
}
