use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::models::school_classes::entities::SchoolClass;

// 学生，最多属于一个班级
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "school.ts")]
pub struct Student {
    pub id: i64,
    pub login_id: String,
    pub first_name: String,
    pub last_name: String,
    pub class: Option<SchoolClass>,
}

impl Student {
    pub fn class_id(&self) -> Option<i64> {
        self.class.as_ref().map(|c| c.id)
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.last_name, self.first_name)
    }
}
