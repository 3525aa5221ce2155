use serde::{Deserialize, Serialize};
use ts_rs::TS;

// 家长只通过孩子读取成绩
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "school.ts")]
pub struct Parent {
    pub id: i64,
    pub login_id: String,
    pub first_name: String,
    pub last_name: String,
    pub children_ids: Vec<i64>,
}

impl Parent {
    pub fn is_parent_of(&self, student_id: i64) -> bool {
        self.children_ids.contains(&student_id)
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}
