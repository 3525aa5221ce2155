//! 教学日历
//!
//! 周六、周日和配置中的节假日不是教学日。节假日可以写在配置文件里，
//! 也可以放在按学年替换的 JSON 文件中（`["2025-11-04", ...]`）。

use std::collections::BTreeSet;
use std::path::Path;

use chrono::{Datelike, NaiveDate, Weekday};
use tracing::info;

use crate::config::CalendarConfig;
use crate::errors::{GradebookError, Result};
use crate::models::grades::errors::NonInstructionalDay;

const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone, Default)]
pub struct CalendarPolicy {
    holidays: BTreeSet<NaiveDate>,
}

impl CalendarPolicy {
    pub fn new(holidays: impl IntoIterator<Item = NaiveDate>) -> Self {
        Self {
            holidays: holidays.into_iter().collect(),
        }
    }

    /// 合并配置里的节假日列表和节假日文件
    pub fn from_config(config: &CalendarConfig) -> Result<Self> {
        let mut holidays = parse_dates(&config.holidays)?;

        if !config.holidays_file.is_empty() {
            holidays.extend(Self::load_file(Path::new(&config.holidays_file))?);
        }

        info!("Calendar loaded with {} holidays", holidays.len());
        Ok(Self { holidays })
    }

    fn load_file(path: &Path) -> Result<BTreeSet<NaiveDate>> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            GradebookError::file_operation(format!(
                "无法读取节假日文件 {}: {e}",
                path.display()
            ))
        })?;
        let raw: Vec<String> = serde_json::from_str(&content)?;
        parse_dates(&raw)
    }

    pub fn holidays(&self) -> impl Iterator<Item = &NaiveDate> {
        self.holidays.iter()
    }

    pub fn is_instructional_day(&self, date: NaiveDate) -> bool {
        self.check(date).is_ok()
    }

    /// 周末优先于节假日判断
    pub fn check(&self, date: NaiveDate) -> std::result::Result<(), NonInstructionalDay> {
        let weekday = date.weekday();
        if matches!(weekday, Weekday::Sat | Weekday::Sun) {
            return Err(NonInstructionalDay::Weekend(weekday));
        }
        if self.holidays.contains(&date) {
            return Err(NonInstructionalDay::Holiday(date));
        }
        Ok(())
    }
}

fn parse_dates(raw: &[String]) -> Result<BTreeSet<NaiveDate>> {
    raw.iter()
        .map(|s| {
            NaiveDate::parse_from_str(s.trim(), DATE_FORMAT)
                .map_err(|e| GradebookError::date_parse(format!("节假日日期无效 '{s}': {e}")))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    #[test]
    fn test_weekends_are_not_instructional() {
        let calendar = CalendarPolicy::default();
        // 2025-11-08 是周六
        assert_eq!(
            calendar.check(date(2025, 11, 8)),
            Err(NonInstructionalDay::Weekend(Weekday::Sat))
        );
        assert_eq!(
            calendar.check(date(2025, 11, 9)),
            Err(NonInstructionalDay::Weekend(Weekday::Sun))
        );
        assert!(calendar.is_instructional_day(date(2025, 11, 10)));
    }

    #[test]
    fn test_holiday_is_rejected() {
        let calendar = CalendarPolicy::new([date(2025, 11, 7)]);
        assert_eq!(
            calendar.check(date(2025, 11, 7)),
            Err(NonInstructionalDay::Holiday(date(2025, 11, 7)))
        );
        assert!(calendar.is_instructional_day(date(2025, 11, 6)));
    }

    #[test]
    fn test_weekend_wins_over_holiday() {
        let calendar = CalendarPolicy::new([date(2025, 11, 8)]);
        assert!(matches!(
            calendar.check(date(2025, 11, 8)),
            Err(NonInstructionalDay::Weekend(_))
        ));
    }

    #[test]
    fn test_from_config_merges_inline_and_file() {
        let path = std::env::temp_dir().join(format!(
            "gradebook-holidays-{}.json",
            std::process::id()
        ));
        std::fs::write(&path, r#"["2025-12-31", "2026-01-02"]"#).expect("write holidays");

        let config = CalendarConfig {
            holidays: vec!["2025-11-04".to_string()],
            holidays_file: path.to_string_lossy().into_owned(),
        };
        let calendar = CalendarPolicy::from_config(&config).expect("calendar");
        let _ = std::fs::remove_file(&path);

        assert_eq!(calendar.holidays().count(), 3);
        assert!(!calendar.is_instructional_day(date(2025, 11, 4)));
        assert!(!calendar.is_instructional_day(date(2026, 1, 2)));
    }

    #[test]
    fn test_bad_holiday_entry_fails_loading() {
        let config = CalendarConfig {
            holidays: vec!["2025-13-01".to_string()],
            holidays_file: String::new(),
        };
        assert!(CalendarPolicy::from_config(&config).is_err());
    }

    #[test]
    fn test_missing_file_fails_loading() {
        let config = CalendarConfig {
            holidays: Vec::new(),
            holidays_file: "/nonexistent/holidays.json".to_string(),
        };
        assert!(CalendarPolicy::from_config(&config).is_err());
    }
}
