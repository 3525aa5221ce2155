use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use ts_rs::TS;

// 科目及其开设的班级
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "school.ts")]
pub struct Subject {
    pub id: i64,
    pub name: String,
    pub class_ids: BTreeSet<i64>,
}

impl Subject {
    /// 科目是否在该班级开设
    pub fn is_offered_in(&self, class_id: i64) -> bool {
        self.class_ids.contains(&class_id)
    }
}
