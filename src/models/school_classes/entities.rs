use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use ts_rs::TS;

// 班级：年级数字 + 字母，唯一确定一个班
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "school.ts")]
pub struct SchoolClass {
    pub id: i64,
    pub number: i32,
    pub letter: String,
}

impl SchoolClass {
    /// 展示名称，例如 `9-A`
    pub fn name(&self) -> String {
        format!("{}-{}", self.number, self.letter)
    }
}

impl Ord for SchoolClass {
    fn cmp(&self, other: &Self) -> Ordering {
        self.number
            .cmp(&other.number)
            .then_with(|| self.letter.cmp(&other.letter))
            .then_with(|| self.id.cmp(&other.id))
    }
}

impl PartialOrd for SchoolClass {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl std::fmt::Display for SchoolClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}", self.number, self.letter)
    }
}
