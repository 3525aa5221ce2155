use serde::Serialize;
use ts_rs::TS;

use crate::models::students::entities::Student;

// 单科统计
#[derive(Debug, Clone, PartialEq, Serialize, TS)]
#[ts(export, export_to = "report.ts")]
pub struct SubjectStats {
    pub subject_id: i64,
    pub subject_name: String,
    pub count: i64,
    pub average: f64,
}

// 成绩频次
#[derive(Debug, Clone, PartialEq, Eq, Serialize, TS)]
#[ts(export, export_to = "report.ts")]
pub struct GradeFrequency {
    pub value: i32,
    pub count: i64,
}

// 学生成绩报告
#[derive(Debug, Clone, Serialize, TS)]
#[ts(export, export_to = "report.ts")]
pub struct StudentReport {
    pub student: Student,
    pub subjects: Vec<SubjectStats>,
    /// 全部成绩的平均值（不是各科平均值的平均）
    pub overall_average: Option<f64>,
    pub total_grades: i64,
    pub histogram: Vec<GradeFrequency>,
}

// 家长视角的单科平均分（保留两位小数）
#[derive(Debug, Clone, PartialEq, Serialize, TS)]
#[ts(export, export_to = "report.ts")]
pub struct SubjectAverage {
    pub subject_id: i64,
    pub subject_name: String,
    pub average: f64,
}

#[derive(Debug, Clone, Serialize, TS)]
#[ts(export, export_to = "report.ts")]
pub struct ChildReport {
    pub student: Student,
    pub subjects: Vec<SubjectAverage>,
}

#[derive(Debug, Clone, Serialize, TS)]
#[ts(export, export_to = "report.ts")]
pub struct ParentReport {
    pub parent_id: i64,
    pub children: Vec<ChildReport>,
}
