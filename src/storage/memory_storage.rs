//! 内存存储，仅用于单元测试
//!
//! 成绩的查重与写入在同一把锁内完成。

use std::collections::{BTreeSet, HashMap};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};

use super::Storage;
use crate::errors::{GradebookError, Result};
use crate::models::{
    PaginationInfo, PaginationQuery,
    grades::{
        entities::{Grade, GradeFilter, NewGrade},
        responses::GradeListResponse,
    },
    parents::entities::Parent,
    principals::{
        entities::{Credential, Role},
        requests::{NewParent, NewStudent, NewTeacher},
    },
    school_classes::entities::SchoolClass,
    students::entities::Student,
    subjects::entities::Subject,
    teachers::entities::Teacher,
};

struct Account<T> {
    entity: T,
    password_hash: String,
}

#[derive(Default)]
struct State {
    next_id: i64,
    classes: HashMap<i64, SchoolClass>,
    subjects: HashMap<i64, Subject>,
    teachers: Vec<Account<TeacherRow>>,
    students: Vec<Account<StudentRow>>,
    parents: Vec<Account<Parent>>,
    grades: Vec<Grade>,
}

struct TeacherRow {
    id: i64,
    login_id: String,
    first_name: String,
    last_name: String,
    subject_ids: BTreeSet<i64>,
    class_ids: BTreeSet<i64>,
}

struct StudentRow {
    id: i64,
    login_id: String,
    first_name: String,
    last_name: String,
    class_id: Option<i64>,
}

impl State {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn student(&self, row: &StudentRow) -> Student {
        Student {
            id: row.id,
            login_id: row.login_id.clone(),
            first_name: row.first_name.clone(),
            last_name: row.last_name.clone(),
            class: row.class_id.and_then(|id| self.classes.get(&id).cloned()),
        }
    }

    fn teacher(&self, row: &TeacherRow) -> Teacher {
        let mut classes: Vec<SchoolClass> = row
            .class_ids
            .iter()
            .filter_map(|id| self.classes.get(id).cloned())
            .collect();
        classes.sort();
        Teacher {
            id: row.id,
            login_id: row.login_id.clone(),
            first_name: row.first_name.clone(),
            last_name: row.last_name.clone(),
            subjects: row
                .subject_ids
                .iter()
                .filter_map(|id| self.subjects.get(id).cloned())
                .collect(),
            classes,
        }
    }
}

#[derive(Default)]
pub struct MemoryStorage {
    state: Mutex<State>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().expect("memory storage lock poisoned")
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn find_credential(&self, role: Role, login_id: &str) -> Result<Option<Credential>> {
        let state = self.state();
        let found = match role {
            Role::Teacher => state
                .teachers
                .iter()
                .find(|a| a.entity.login_id == login_id)
                .map(|a| (a.entity.id, a.password_hash.clone())),
            Role::Student => state
                .students
                .iter()
                .find(|a| a.entity.login_id == login_id)
                .map(|a| (a.entity.id, a.password_hash.clone())),
            Role::Parent => state
                .parents
                .iter()
                .find(|a| a.entity.login_id == login_id)
                .map(|a| (a.entity.id, a.password_hash.clone())),
        };
        Ok(found.map(|(principal_id, password_hash)| Credential {
            role,
            principal_id,
            password_hash,
        }))
    }

    async fn login_id_exists(&self, role: Role, login_id: &str) -> Result<bool> {
        Ok(self.find_credential(role, login_id).await?.is_some())
    }

    async fn get_teacher_by_id(&self, id: i64) -> Result<Option<Teacher>> {
        let state = self.state();
        Ok(state
            .teachers
            .iter()
            .find(|a| a.entity.id == id)
            .map(|a| state.teacher(&a.entity)))
    }

    async fn get_student_by_id(&self, id: i64) -> Result<Option<Student>> {
        let state = self.state();
        Ok(state
            .students
            .iter()
            .find(|a| a.entity.id == id)
            .map(|a| state.student(&a.entity)))
    }

    async fn get_parent_by_id(&self, id: i64) -> Result<Option<Parent>> {
        let state = self.state();
        Ok(state
            .parents
            .iter()
            .find(|a| a.entity.id == id)
            .map(|a| a.entity.clone()))
    }

    async fn count_accounts(&self) -> Result<u64> {
        let state = self.state();
        Ok((state.teachers.len() + state.students.len() + state.parents.len()) as u64)
    }

    async fn get_subject_by_id(&self, id: i64) -> Result<Option<Subject>> {
        Ok(self.state().subjects.get(&id).cloned())
    }

    async fn list_subjects_by_ids(&self, ids: &[i64]) -> Result<Vec<Subject>> {
        let state = self.state();
        let mut subjects: Vec<Subject> = ids
            .iter()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .filter_map(|id| state.subjects.get(id).cloned())
            .collect();
        subjects.sort_by_key(|s| s.id);
        Ok(subjects)
    }

    async fn list_students_in_classes(&self, class_ids: &[i64]) -> Result<Vec<Student>> {
        let state = self.state();
        let mut students: Vec<Student> = state
            .students
            .iter()
            .filter(|a| a.entity.class_id.is_some_and(|id| class_ids.contains(&id)))
            .map(|a| state.student(&a.entity))
            .collect();
        students.sort_by(|a, b| {
            (&a.last_name, &a.first_name, a.id).cmp(&(&b.last_name, &b.first_name, b.id))
        });
        Ok(students)
    }

    async fn list_students_by_ids(&self, ids: &[i64]) -> Result<Vec<Student>> {
        let state = self.state();
        let mut students: Vec<Student> = state
            .students
            .iter()
            .filter(|a| ids.contains(&a.entity.id))
            .map(|a| state.student(&a.entity))
            .collect();
        students.sort_by_key(|s| s.id);
        Ok(students)
    }

    async fn create_school_class(&self, number: i32, letter: &str) -> Result<SchoolClass> {
        let mut state = self.state();
        if state
            .classes
            .values()
            .any(|c| c.number == number && c.letter == letter)
        {
            return Err(GradebookError::duplicate(format!("class {number}-{letter}")));
        }
        let class = SchoolClass {
            id: state.next_id(),
            number,
            letter: letter.to_string(),
        };
        state.classes.insert(class.id, class.clone());
        Ok(class)
    }

    async fn create_subject(&self, name: &str, class_ids: &[i64]) -> Result<Subject> {
        let mut state = self.state();
        let subject = Subject {
            id: state.next_id(),
            name: name.to_string(),
            class_ids: class_ids.iter().copied().collect(),
        };
        state.subjects.insert(subject.id, subject.clone());
        Ok(subject)
    }

    async fn create_teacher(&self, account: NewTeacher) -> Result<Teacher> {
        let mut state = self.state();
        if state
            .teachers
            .iter()
            .any(|a| a.entity.login_id == account.login_id)
        {
            return Err(GradebookError::duplicate(account.login_id));
        }
        let row = TeacherRow {
            id: state.next_id(),
            login_id: account.login_id,
            first_name: account.first_name,
            last_name: account.last_name,
            subject_ids: account.subject_ids.into_iter().collect(),
            class_ids: account.class_ids.into_iter().collect(),
        };
        let teacher = state.teacher(&row);
        state.teachers.push(Account {
            entity: row,
            password_hash: account.password_hash,
        });
        Ok(teacher)
    }

    async fn create_student(&self, account: NewStudent) -> Result<Student> {
        let mut state = self.state();
        if state
            .students
            .iter()
            .any(|a| a.entity.login_id == account.login_id)
        {
            return Err(GradebookError::duplicate(account.login_id));
        }
        let row = StudentRow {
            id: state.next_id(),
            login_id: account.login_id,
            first_name: account.first_name,
            last_name: account.last_name,
            class_id: account.class_id,
        };
        let student = state.student(&row);
        state.students.push(Account {
            entity: row,
            password_hash: account.password_hash,
        });
        Ok(student)
    }

    async fn create_parent(&self, account: NewParent) -> Result<Parent> {
        let mut state = self.state();
        if state
            .parents
            .iter()
            .any(|a| a.entity.login_id == account.login_id)
        {
            return Err(GradebookError::duplicate(account.login_id));
        }
        let parent = Parent {
            id: state.next_id(),
            login_id: account.login_id,
            first_name: account.first_name,
            last_name: account.last_name,
            children_ids: account
                .children_ids
                .into_iter()
                .collect::<BTreeSet<_>>()
                .into_iter()
                .collect(),
        };
        state.parents.push(Account {
            entity: parent.clone(),
            password_hash: account.password_hash,
        });
        Ok(parent)
    }

    async fn grade_exists(
        &self,
        student_id: i64,
        subject_id: i64,
        date: NaiveDate,
    ) -> Result<bool> {
        Ok(self.state().grades.iter().any(|g| {
            g.student_id == student_id && g.subject_id == subject_id && g.date == date
        }))
    }

    async fn create_grade(&self, grade: NewGrade) -> Result<Grade> {
        let mut state = self.state();
        if state.grades.iter().any(|g| {
            g.student_id == grade.student_id
                && g.subject_id == grade.subject_id
                && g.date == grade.date
        }) {
            return Err(GradebookError::duplicate("grades"));
        }
        let stored = Grade {
            id: state.next_id(),
            student_id: grade.student_id,
            subject_id: grade.subject_id,
            value: grade.value,
            date: grade.date,
            created_at: Utc::now(),
        };
        state.grades.push(stored.clone());
        Ok(stored)
    }

    async fn list_grades(&self, filter: GradeFilter) -> Result<Vec<Grade>> {
        let mut grades: Vec<Grade> = self
            .state()
            .grades
            .iter()
            .filter(|g| filter.matches(g))
            .cloned()
            .collect();
        grades.sort_by_key(|g| (g.date, g.id));
        Ok(grades)
    }

    async fn list_grades_with_pagination(
        &self,
        filter: GradeFilter,
        query: PaginationQuery,
    ) -> Result<GradeListResponse> {
        let (page, size) = query.normalized();
        let mut grades = self.list_grades(filter).await?;
        grades.reverse();
        let total = grades.len() as u64;
        let items = grades
            .into_iter()
            .skip(((page - 1) * size) as usize)
            .take(size as usize)
            .collect();
        Ok(GradeListResponse {
            items,
            pagination: PaginationInfo::new(page, size, total),
        })
    }
}
