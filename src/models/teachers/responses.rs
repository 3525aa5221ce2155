use chrono::NaiveDate;
use serde::Serialize;
use ts_rs::TS;

use crate::models::school_classes::entities::SchoolClass;
use crate::models::students::entities::Student;
use crate::models::subjects::entities::Subject;
use crate::models::teachers::entities::Teacher;

// 教师概览
#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "teacher.ts")]
pub struct TeacherOverviewResponse {
    pub teacher: Teacher,
}

// 某个班级的学生名单
#[derive(Debug, Clone, Serialize, TS)]
#[ts(export, export_to = "teacher.ts")]
pub struct ClassRoster {
    pub class: SchoolClass,
    pub class_name: String,
    pub students: Vec<Student>,
}

// 录入成绩页面所需的数据
#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "teacher.ts")]
pub struct RosterResponse {
    pub classes: Vec<ClassRoster>,
    pub subjects: Vec<Subject>,
    pub today: NaiveDate,
}
