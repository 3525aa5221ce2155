//! 目录：三类账号的凭据、加载与开户

use std::collections::BTreeSet;

use super::SeaOrmStorage;
use crate::entity::prelude::*;
use crate::entity::{parent_students, parents, students, teacher_classes, teacher_subjects, teachers};
use crate::errors::{GradebookError, Result};
use crate::models::{
    parents::entities::Parent,
    principals::{
        entities::{Credential, Role},
        requests::{NewParent, NewStudent, NewTeacher},
    },
    students::entities::Student,
    teachers::entities::Teacher,
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};

impl SeaOrmStorage {
    /// 按角色查找凭据，只查对应的一张表
    pub async fn find_credential_impl(
        &self,
        role: Role,
        login_id: &str,
    ) -> Result<Option<Credential>> {
        let found = match role {
            Role::Teacher => Teachers::find()
                .filter(teachers::Column::LoginId.eq(login_id))
                .one(&self.db)
                .await
                .map(|m| m.map(|m| (m.id, m.password_hash))),
            Role::Student => Students::find()
                .filter(students::Column::LoginId.eq(login_id))
                .one(&self.db)
                .await
                .map(|m| m.map(|m| (m.id, m.password_hash))),
            Role::Parent => Parents::find()
                .filter(parents::Column::LoginId.eq(login_id))
                .one(&self.db)
                .await
                .map(|m| m.map(|m| (m.id, m.password_hash))),
        }
        .map_err(|e| GradebookError::database_operation(format!("查询凭据失败: {e}")))?;

        Ok(found.map(|(principal_id, password_hash)| Credential {
            role,
            principal_id,
            password_hash,
        }))
    }

    pub async fn login_id_exists_impl(&self, role: Role, login_id: &str) -> Result<bool> {
        Ok(self.find_credential_impl(role, login_id).await?.is_some())
    }

    /// 通过 ID 获取教师，连同任教科目和班级
    pub async fn get_teacher_by_id_impl(&self, id: i64) -> Result<Option<Teacher>> {
        let Some(model) = Teachers::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(|e| GradebookError::database_operation(format!("查询教师失败: {e}")))?
        else {
            return Ok(None);
        };

        let teacher = Self::assemble_teacher(&self.db, model).await?;
        Ok(Some(teacher))
    }

    async fn assemble_teacher<C: ConnectionTrait>(
        conn: &C,
        model: teachers::Model,
    ) -> Result<Teacher> {
        let subject_ids: Vec<i64> = TeacherSubjects::find()
            .filter(teacher_subjects::Column::TeacherId.eq(model.id))
            .all(conn)
            .await
            .map_err(|e| GradebookError::database_operation(format!("查询任教科目失败: {e}")))?
            .into_iter()
            .map(|m| m.subject_id)
            .collect();

        let class_ids: Vec<i64> = TeacherClasses::find()
            .filter(teacher_classes::Column::TeacherId.eq(model.id))
            .all(conn)
            .await
            .map_err(|e| GradebookError::database_operation(format!("查询任教班级失败: {e}")))?
            .into_iter()
            .map(|m| m.class_id)
            .collect();

        let subjects = Self::load_subjects(conn, &subject_ids).await?;
        let mut classes: Vec<_> = Self::load_classes_map(conn, &class_ids)
            .await?
            .into_values()
            .collect();
        classes.sort();

        Ok(Teacher {
            id: model.id,
            login_id: model.login_id,
            first_name: model.first_name,
            last_name: model.last_name,
            subjects,
            classes,
        })
    }

    /// 通过 ID 获取学生
    pub async fn get_student_by_id_impl(&self, id: i64) -> Result<Option<Student>> {
        let Some(model) = Students::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(|e| GradebookError::database_operation(format!("查询学生失败: {e}")))?
        else {
            return Ok(None);
        };

        let mut students = Self::assemble_students(&self.db, vec![model]).await?;
        Ok(students.pop())
    }

    /// 通过 ID 获取家长，连同孩子 ID
    pub async fn get_parent_by_id_impl(&self, id: i64) -> Result<Option<Parent>> {
        let Some(model) = Parents::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(|e| GradebookError::database_operation(format!("查询家长失败: {e}")))?
        else {
            return Ok(None);
        };

        let children_ids = ParentStudents::find()
            .filter(parent_students::Column::ParentId.eq(model.id))
            .order_by_asc(parent_students::Column::StudentId)
            .all(&self.db)
            .await
            .map_err(|e| GradebookError::database_operation(format!("查询家长孩子失败: {e}")))?
            .into_iter()
            .map(|m| m.student_id)
            .collect();

        Ok(Some(model.into_parent(children_ids)))
    }

    /// 三类账号总数
    pub async fn count_accounts_impl(&self) -> Result<u64> {
        let map_err = |e: sea_orm::DbErr| {
            GradebookError::database_operation(format!("统计账号数量失败: {e}"))
        };

        let teachers = Teachers::find().count(&self.db).await.map_err(map_err)?;
        let students = Students::find().count(&self.db).await.map_err(map_err)?;
        let parents = Parents::find().count(&self.db).await.map_err(map_err)?;

        Ok(teachers + students + parents)
    }

    /// 创建教师及其任教关系
    pub async fn create_teacher_impl(&self, account: NewTeacher) -> Result<Teacher> {
        let now = chrono::Utc::now().timestamp();

        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| GradebookError::database_operation(format!("开启事务失败: {e}")))?;

        let model = TeacherActiveModel {
            login_id: Set(account.login_id),
            password_hash: Set(account.password_hash),
            first_name: Set(account.first_name),
            last_name: Set(account.last_name),
            created_at: Set(now),
            ..Default::default()
        }
        .insert(&txn)
        .await
        .map_err(GradebookError::from)?;

        let subject_ids: BTreeSet<i64> = account.subject_ids.into_iter().collect();
        for subject_id in subject_ids {
            TeacherSubjectActiveModel {
                teacher_id: Set(model.id),
                subject_id: Set(subject_id),
                ..Default::default()
            }
            .insert(&txn)
            .await
            .map_err(GradebookError::from)?;
        }

        let class_ids: BTreeSet<i64> = account.class_ids.into_iter().collect();
        for class_id in class_ids {
            TeacherClassActiveModel {
                teacher_id: Set(model.id),
                class_id: Set(class_id),
                ..Default::default()
            }
            .insert(&txn)
            .await
            .map_err(GradebookError::from)?;
        }

        let teacher = Self::assemble_teacher(&txn, model).await?;

        txn.commit()
            .await
            .map_err(|e| GradebookError::database_operation(format!("提交事务失败: {e}")))?;

        Ok(teacher)
    }

    /// 创建学生
    pub async fn create_student_impl(&self, account: NewStudent) -> Result<Student> {
        let now = chrono::Utc::now().timestamp();

        let model = StudentActiveModel {
            login_id: Set(account.login_id),
            password_hash: Set(account.password_hash),
            first_name: Set(account.first_name),
            last_name: Set(account.last_name),
            class_id: Set(account.class_id),
            created_at: Set(now),
            ..Default::default()
        }
        .insert(&self.db)
        .await
        .map_err(GradebookError::from)?;

        let mut students = Self::assemble_students(&self.db, vec![model]).await?;
        students
            .pop()
            .ok_or_else(|| GradebookError::database_operation("创建学生后无法读取记录"))
    }

    /// 创建家长及其与孩子的关联
    pub async fn create_parent_impl(&self, account: NewParent) -> Result<Parent> {
        let now = chrono::Utc::now().timestamp();

        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| GradebookError::database_operation(format!("开启事务失败: {e}")))?;

        let model = ParentActiveModel {
            login_id: Set(account.login_id),
            password_hash: Set(account.password_hash),
            first_name: Set(account.first_name),
            last_name: Set(account.last_name),
            created_at: Set(now),
            ..Default::default()
        }
        .insert(&txn)
        .await
        .map_err(GradebookError::from)?;

        let children_ids: Vec<i64> = account
            .children_ids
            .into_iter()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        for student_id in &children_ids {
            ParentStudentActiveModel {
                parent_id: Set(model.id),
                student_id: Set(*student_id),
                ..Default::default()
            }
            .insert(&txn)
            .await
            .map_err(GradebookError::from)?;
        }

        txn.commit()
            .await
            .map_err(|e| GradebookError::database_operation(format!("提交事务失败: {e}")))?;

        Ok(model.into_parent(children_ids))
    }
}
