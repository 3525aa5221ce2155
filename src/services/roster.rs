//! 名册索引
//!
//! 教师能否给某个学生的某门科目打分，由三条关系共同决定：
//! 教师教这门科目、教师教学生所在班级、科目在该班级开设。

use std::collections::BTreeMap;

use crate::models::grades::errors::AuthorizationDenial;
use crate::models::school_classes::entities::SchoolClass;
use crate::models::students::entities::Student;
use crate::models::subjects::entities::Subject;
use crate::models::teachers::entities::Teacher;
use crate::models::teachers::responses::ClassRoster;

/// 三条关系是否同时成立
pub fn authorized(teacher: &Teacher, subject: &Subject, student: &Student) -> bool {
    authorize(teacher, subject, student).is_ok()
}

/// 按顺序检查，返回第一条不成立的原因
pub fn authorize(
    teacher: &Teacher,
    subject: &Subject,
    student: &Student,
) -> Result<(), AuthorizationDenial> {
    // 没有班级的学生不属于任何教师
    let Some(class_id) = student.class_id() else {
        return Err(AuthorizationDenial::NotAssigned);
    };

    if !teacher.teaches_subject(subject.id) || !teacher.teaches_class(class_id) {
        return Err(AuthorizationDenial::NotAssigned);
    }

    if !subject.is_offered_in(class_id) {
        return Err(AuthorizationDenial::SubjectNotOffered);
    }

    Ok(())
}

/// 学生是否在教师的名册里
pub fn in_roster(teacher: &Teacher, student: &Student) -> bool {
    student
        .class_id()
        .is_some_and(|class_id| teacher.teaches_class(class_id))
}

/// 按班级分组的名册
///
/// 只保留教师任教班级里的学生；班级按年级、字母排序，学生按姓、名、ID 排序。
/// 没有学生的任教班级也会列出。
pub fn roster(teacher: &Teacher, students: &[Student]) -> Vec<ClassRoster> {
    let mut grouped: BTreeMap<SchoolClass, Vec<Student>> = teacher
        .classes
        .iter()
        .map(|class| (class.clone(), Vec::new()))
        .collect();

    for student in students {
        let Some(class) = student.class.as_ref() else {
            continue;
        };
        if let Some(members) = grouped.get_mut(class) {
            members.push(student.clone());
        }
    }

    grouped
        .into_iter()
        .map(|(class, mut students)| {
            students.sort_by(|a, b| {
                (&a.last_name, &a.first_name, a.id).cmp(&(&b.last_name, &b.first_name, b.id))
            });
            ClassRoster {
                class_name: class.name(),
                class,
                students,
            }
        })
        .collect()
}
