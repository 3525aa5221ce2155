//! 名册：班级、科目、学生

use std::collections::{BTreeSet, HashMap};

use super::SeaOrmStorage;
use crate::entity::prelude::*;
use crate::entity::{school_classes, students, subject_classes};
use crate::errors::{GradebookError, Result};
use crate::models::{
    school_classes::entities::SchoolClass, students::entities::Student,
    subjects::entities::Subject,
};
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set};
use sea_orm::{ConnectionTrait, TransactionTrait};

impl SeaOrmStorage {
    /// 批量加载班级，按 ID 索引
    pub(super) async fn load_classes_map<C: ConnectionTrait>(
        conn: &C,
        ids: &[i64],
    ) -> Result<HashMap<i64, SchoolClass>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let classes = SchoolClasses::find()
            .filter(school_classes::Column::Id.is_in(ids.to_vec()))
            .all(conn)
            .await
            .map_err(|e| GradebookError::database_operation(format!("查询班级失败: {e}")))?;

        Ok(classes
            .into_iter()
            .map(|m| (m.id, m.into_school_class()))
            .collect())
    }

    /// 批量加载科目及其开设班级
    pub(super) async fn load_subjects<C: ConnectionTrait>(
        conn: &C,
        ids: &[i64],
    ) -> Result<Vec<Subject>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let subjects = Subjects::find()
            .filter(crate::entity::subjects::Column::Id.is_in(ids.to_vec()))
            .order_by_asc(crate::entity::subjects::Column::Id)
            .all(conn)
            .await
            .map_err(|e| GradebookError::database_operation(format!("查询科目失败: {e}")))?;

        let links = SubjectClasses::find()
            .filter(subject_classes::Column::SubjectId.is_in(ids.to_vec()))
            .all(conn)
            .await
            .map_err(|e| GradebookError::database_operation(format!("查询科目班级失败: {e}")))?;

        let mut offered: HashMap<i64, BTreeSet<i64>> = HashMap::new();
        for link in links {
            offered.entry(link.subject_id).or_default().insert(link.class_id);
        }

        Ok(subjects
            .into_iter()
            .map(|m| Subject {
                class_ids: offered.remove(&m.id).unwrap_or_default(),
                id: m.id,
                name: m.name,
            })
            .collect())
    }

    /// 学生模型补上班级后转换为业务实体
    pub(super) async fn assemble_students<C: ConnectionTrait>(
        conn: &C,
        models: Vec<students::Model>,
    ) -> Result<Vec<Student>> {
        let class_ids: Vec<i64> = models
            .iter()
            .filter_map(|m| m.class_id)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let classes = Self::load_classes_map(conn, &class_ids).await?;

        Ok(models
            .into_iter()
            .map(|m| {
                let class = m.class_id.and_then(|id| classes.get(&id).cloned());
                m.into_student(class)
            })
            .collect())
    }

    /// 通过 ID 获取科目
    pub async fn get_subject_by_id_impl(&self, id: i64) -> Result<Option<Subject>> {
        let mut subjects = Self::load_subjects(&self.db, &[id]).await?;
        Ok(subjects.pop())
    }

    /// 批量获取科目
    pub async fn list_subjects_by_ids_impl(&self, ids: &[i64]) -> Result<Vec<Subject>> {
        Self::load_subjects(&self.db, ids).await
    }

    /// 列出属于这些班级的学生（按姓、名排序）
    pub async fn list_students_in_classes_impl(&self, class_ids: &[i64]) -> Result<Vec<Student>> {
        if class_ids.is_empty() {
            return Ok(Vec::new());
        }

        let models = Students::find()
            .filter(students::Column::ClassId.is_in(class_ids.to_vec()))
            .order_by_asc(students::Column::LastName)
            .order_by_asc(students::Column::FirstName)
            .order_by_asc(students::Column::Id)
            .all(&self.db)
            .await
            .map_err(|e| GradebookError::database_operation(format!("查询学生失败: {e}")))?;

        Self::assemble_students(&self.db, models).await
    }

    /// 批量获取学生
    pub async fn list_students_by_ids_impl(&self, ids: &[i64]) -> Result<Vec<Student>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let models = Students::find()
            .filter(students::Column::Id.is_in(ids.to_vec()))
            .order_by_asc(students::Column::Id)
            .all(&self.db)
            .await
            .map_err(|e| GradebookError::database_operation(format!("查询学生失败: {e}")))?;

        Self::assemble_students(&self.db, models).await
    }

    /// 创建班级，同一年级和字母只能有一个
    pub async fn create_school_class_impl(&self, number: i32, letter: &str) -> Result<SchoolClass> {
        let model = SchoolClassActiveModel {
            number_class: Set(number),
            letter_class: Set(letter.to_string()),
            ..Default::default()
        };

        let result = model.insert(&self.db).await.map_err(GradebookError::from)?;

        Ok(result.into_school_class())
    }

    /// 创建科目并登记开设班级
    pub async fn create_subject_impl(&self, name: &str, class_ids: &[i64]) -> Result<Subject> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| GradebookError::database_operation(format!("开启事务失败: {e}")))?;

        let subject = SubjectActiveModel {
            name: Set(name.to_string()),
            ..Default::default()
        }
        .insert(&txn)
        .await
        .map_err(GradebookError::from)?;

        let class_ids: BTreeSet<i64> = class_ids.iter().copied().collect();
        for class_id in &class_ids {
            SubjectClassActiveModel {
                subject_id: Set(subject.id),
                class_id: Set(*class_id),
                ..Default::default()
            }
            .insert(&txn)
            .await
            .map_err(GradebookError::from)?;
        }

        txn.commit()
            .await
            .map_err(|e| GradebookError::database_operation(format!("提交事务失败: {e}")))?;

        Ok(Subject {
            id: subject.id,
            name: subject.name,
            class_ids,
        })
    }
}
