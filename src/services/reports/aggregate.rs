//! 成绩统计
//!
//! 纯函数，输入已经按学生筛好的成绩和科目目录。

use std::collections::{BTreeMap, HashMap};

use crate::models::grades::entities::Grade;
use crate::models::parents::entities::Parent;
use crate::models::reports::responses::{
    ChildReport, GradeFrequency, ParentReport, StudentReport, SubjectAverage, SubjectStats,
};
use crate::models::students::entities::Student;
use crate::models::subjects::entities::Subject;

/// 算术平均，空集合返回 None
pub fn mean<'a>(grades: impl IntoIterator<Item = &'a Grade>) -> Option<f64> {
    let (sum, count) = grades
        .into_iter()
        .fold((0i64, 0i64), |(sum, count), g| (sum + i64::from(g.value), count + 1));
    (count > 0).then(|| sum as f64 / count as f64)
}

/// 保留两位小数
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn subject_name(subjects: &HashMap<i64, Subject>, id: i64) -> String {
    subjects
        .get(&id)
        .map(|s| s.name.clone())
        .unwrap_or_else(|| format!("#{id}"))
}

fn group_by_subject<'a>(grades: &[&'a Grade]) -> BTreeMap<i64, Vec<&'a Grade>> {
    let mut grouped: BTreeMap<i64, Vec<&Grade>> = BTreeMap::new();
    for grade in grades {
        grouped.entry(grade.subject_id).or_default().push(*grade);
    }
    grouped
}

/// 单个学生的报告：各科次数与平均分、总平均分、分值频次
pub fn student_report(
    student: &Student,
    grades: &[Grade],
    subjects: &HashMap<i64, Subject>,
) -> StudentReport {
    let own: Vec<&Grade> = grades.iter().filter(|g| g.student_id == student.id).collect();

    let mut stats: Vec<SubjectStats> = group_by_subject(&own)
        .into_iter()
        .map(|(subject_id, list)| SubjectStats {
            subject_id,
            subject_name: subject_name(subjects, subject_id),
            count: list.len() as i64,
            average: mean(list.iter().copied()).unwrap_or_default(),
        })
        .collect();
    stats.sort_by(|a, b| a.subject_name.cmp(&b.subject_name).then(a.subject_id.cmp(&b.subject_id)));

    let mut frequency: BTreeMap<i32, i64> = BTreeMap::new();
    for grade in &own {
        *frequency.entry(grade.value).or_default() += 1;
    }

    StudentReport {
        student: student.clone(),
        subjects: stats,
        // 所有单次成绩的平均，而不是各科平均的平均
        overall_average: mean(own.iter().copied()),
        total_grades: own.len() as i64,
        histogram: frequency
            .into_iter()
            .map(|(value, count)| GradeFrequency { value, count })
            .collect(),
    }
}

/// 家长报告：每个孩子有成绩的科目平均分，保留两位小数
pub fn parent_report(
    parent: &Parent,
    children: &[Student],
    grades: &[Grade],
    subjects: &HashMap<i64, Subject>,
) -> ParentReport {
    let children = children
        .iter()
        .filter(|child| parent.is_parent_of(child.id))
        .map(|child| {
            let own: Vec<&Grade> = grades.iter().filter(|g| g.student_id == child.id).collect();
            let mut averages: Vec<SubjectAverage> = group_by_subject(&own)
                .into_iter()
                .filter_map(|(subject_id, list)| {
                    mean(list.iter().copied()).map(|avg| SubjectAverage {
                        subject_id,
                        subject_name: subject_name(subjects, subject_id),
                        average: round2(avg),
                    })
                })
                .collect();
            averages.sort_by(|a, b| {
                a.subject_name
                    .cmp(&b.subject_name)
                    .then(a.subject_id.cmp(&b.subject_id))
            });
            ChildReport {
                student: child.clone(),
                subjects: averages,
            }
        })
        .collect();

    ParentReport {
        parent_id: parent.id,
        children,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::collections::BTreeSet;

    fn grade(id: i64, student_id: i64, subject_id: i64, value: i32, day: u32) -> Grade {
        Grade {
            id,
            student_id,
            subject_id,
            value,
            date: NaiveDate::from_ymd_opt(2025, 9, day).expect("valid date"),
            created_at: chrono::Utc::now(),
        }
    }

    fn student(id: i64) -> Student {
        Student {
            id,
            login_id: format!("25{id:04}"),
            first_name: "Ivan".to_string(),
            last_name: "Ivanov".to_string(),
            class: None,
        }
    }

    fn subjects() -> HashMap<i64, Subject> {
        [(1, "Math"), (2, "Science"), (3, "History")]
            .into_iter()
            .map(|(id, name)| {
                (
                    id,
                    Subject {
                        id,
                        name: name.to_string(),
                        class_ids: BTreeSet::new(),
                    },
                )
            })
            .collect()
    }

    #[test]
    fn test_student_report_example() {
        // Math: 8, 6；Science: 10
        let grades = vec![
            grade(1, 7, 1, 8, 15),
            grade(2, 7, 1, 6, 16),
            grade(3, 7, 2, 10, 15),
        ];
        let report = student_report(&student(7), &grades, &subjects());

        assert_eq!(report.total_grades, 3);
        assert_eq!(report.subjects.len(), 2);
        assert_eq!(report.subjects[0].subject_name, "Math");
        assert_eq!(report.subjects[0].count, 2);
        assert_eq!(report.subjects[0].average, 7.0);
        assert_eq!(report.subjects[1].average, 10.0);
        assert_eq!(report.overall_average, Some(8.0));
        assert_eq!(
            report.histogram,
            vec![
                GradeFrequency { value: 6, count: 1 },
                GradeFrequency { value: 8, count: 1 },
                GradeFrequency { value: 10, count: 1 },
            ]
        );
    }

    #[test]
    fn test_overall_is_not_mean_of_means() {
        // Math: 10, 10, 10；Science: 4 → 各科平均的平均是 7，整体平均是 8.5
        let grades = vec![
            grade(1, 7, 1, 10, 15),
            grade(2, 7, 1, 10, 16),
            grade(3, 7, 1, 10, 17),
            grade(4, 7, 2, 4, 15),
        ];
        let report = student_report(&student(7), &grades, &subjects());
        assert_eq!(report.overall_average, Some(8.5));
    }

    #[test]
    fn test_empty_student_report() {
        let report = student_report(&student(7), &[], &subjects());
        assert_eq!(report.total_grades, 0);
        assert!(report.subjects.is_empty());
        assert!(report.histogram.is_empty());
        assert_eq!(report.overall_average, None);
    }

    #[test]
    fn test_parent_report_rounds_and_omits_empty_subjects() {
        let parent = Parent {
            id: 1,
            login_id: "P000125".to_string(),
            first_name: "Anna".to_string(),
            last_name: "Ivanova".to_string(),
            children_ids: vec![7, 8],
        };
        let grades = vec![
            grade(1, 7, 1, 10, 15),
            grade(2, 7, 1, 9, 16),
            grade(3, 7, 1, 9, 17),
            grade(4, 8, 2, 5, 15),
        ];
        let report = parent_report(&parent, &[student(7), student(8)], &grades, &subjects());

        assert_eq!(report.children.len(), 2);
        let first = &report.children[0];
        assert_eq!(first.subjects.len(), 1);
        assert_eq!(first.subjects[0].average, 9.33);

        let second = &report.children[1];
        assert_eq!(second.subjects[0].subject_name, "Science");
        assert_eq!(second.subjects[0].average, 5.0);
    }

    #[test]
    fn test_parent_report_skips_other_children() {
        let parent = Parent {
            id: 1,
            login_id: "P000125".to_string(),
            first_name: "Anna".to_string(),
            last_name: "Ivanova".to_string(),
            children_ids: vec![7],
        };
        let report = parent_report(&parent, &[student(7), student(9)], &[], &subjects());
        assert_eq!(report.children.len(), 1);
        assert!(report.children[0].subjects.is_empty());
    }

    #[test]
    fn test_round2() {
        assert_eq!(round2(28.0 / 3.0), 9.33);
        assert_eq!(round2(7.0), 7.0);
        assert_eq!(round2(8.125), 8.13);
    }
}
