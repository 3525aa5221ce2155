use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::models::school_classes::entities::SchoolClass;
use crate::models::subjects::entities::Subject;

// 教师及其任教的科目、班级
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "school.ts")]
pub struct Teacher {
    pub id: i64,
    pub login_id: String,
    pub first_name: String,
    pub last_name: String,
    pub subjects: Vec<Subject>,
    pub classes: Vec<SchoolClass>,
}

impl Teacher {
    pub fn teaches_subject(&self, subject_id: i64) -> bool {
        self.subjects.iter().any(|s| s.id == subject_id)
    }

    pub fn teaches_class(&self, class_id: i64) -> bool {
        self.classes.iter().any(|c| c.id == class_id)
    }

    pub fn class_ids(&self) -> Vec<i64> {
        self.classes.iter().map(|c| c.id).collect()
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}
