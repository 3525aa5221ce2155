//! 成绩台账

use super::SeaOrmStorage;
use crate::entity::grades::{Column, Entity as Grades};
use crate::entity::prelude::{GradeActiveModel, GradeModel};
use crate::errors::{GradebookError, Result};
use crate::models::{
    PaginationInfo, PaginationQuery,
    grades::{
        entities::{Grade, GradeFilter, NewGrade},
        responses::GradeListResponse,
    },
};
use chrono::NaiveDate;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DbErr, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, Select, Set,
};
use tracing::debug;

/// 锁竞争时的最大重试次数
const LOCK_RETRIES: usize = 8;

/// SQLite 的 SQLITE_BUSY / SQLITE_LOCKED
fn is_lock_contention(err: &DbErr) -> bool {
    let message = err.to_string().to_lowercase();
    message.contains("database is locked")
        || message.contains("database table is locked")
        || message.contains("(code: 5)")
        || message.contains("(code: 6)")
}

impl SeaOrmStorage {
    async fn grade_exists_on<C: ConnectionTrait>(
        conn: &C,
        student_id: i64,
        subject_id: i64,
        date: NaiveDate,
    ) -> Result<bool> {
        let count = Grades::find()
            .filter(Column::StudentId.eq(student_id))
            .filter(Column::SubjectId.eq(subject_id))
            .filter(Column::Date.eq(date))
            .count(conn)
            .await
            .map_err(|e| GradebookError::database_operation(format!("查询成绩失败: {e}")))?;

        Ok(count > 0)
    }

    pub async fn grade_exists_impl(
        &self,
        student_id: i64,
        subject_id: i64,
        date: NaiveDate,
    ) -> Result<bool> {
        Self::grade_exists_on(&self.db, student_id, subject_id, date).await
    }

    fn duplicate_of(grade: &NewGrade) -> GradebookError {
        GradebookError::duplicate(format!(
            "student {} subject {} date {}",
            grade.student_id, grade.subject_id, grade.date
        ))
    }

    async fn insert_grade(&self, grade: &NewGrade) -> std::result::Result<GradeModel, DbErr> {
        GradeActiveModel {
            student_id: Set(grade.student_id),
            subject_id: Set(grade.subject_id),
            value: Set(grade.value),
            date: Set(grade.date),
            created_at: Set(chrono::Utc::now().timestamp()),
            ..Default::default()
        }
        .insert(&self.db)
        .await
    }

    /// 写入成绩
    ///
    /// 先查重，再用单条 INSERT 写入，由唯一索引裁决并发写入，冲突统一返回 `Duplicate`。
    /// SQLite 的读后写事务在锁竞争时直接报 busy 而不等待，所以这里不包事务；
    /// 仍然遇到锁竞争时重新查重后再试。
    pub async fn create_grade_impl(&self, grade: NewGrade) -> Result<Grade> {
        if Self::grade_exists_on(&self.db, grade.student_id, grade.subject_id, grade.date).await? {
            return Err(Self::duplicate_of(&grade));
        }

        let mut attempts = 0;
        loop {
            match self.insert_grade(&grade).await {
                Ok(model) => return Ok(model.into_grade()),
                Err(e) if is_lock_contention(&e) && attempts < LOCK_RETRIES => {
                    attempts += 1;
                    debug!("成绩写入遇到锁竞争，第 {} 次重试: {}", attempts, e);
                    if Self::grade_exists_on(
                        &self.db,
                        grade.student_id,
                        grade.subject_id,
                        grade.date,
                    )
                    .await?
                    {
                        return Err(Self::duplicate_of(&grade));
                    }
                }
                Err(e) => return Err(GradebookError::from(e)),
            }
        }
    }

    fn filtered(filter: &GradeFilter) -> Select<Grades> {
        let mut condition = Condition::all();
        if let Some(ref ids) = filter.student_ids {
            condition = condition.add(Column::StudentId.is_in(ids.clone()));
        }
        if let Some(ref ids) = filter.subject_ids {
            condition = condition.add(Column::SubjectId.is_in(ids.clone()));
        }
        Grades::find().filter(condition)
    }

    /// 按条件列出成绩，按日期升序
    pub async fn list_grades_impl(&self, filter: GradeFilter) -> Result<Vec<Grade>> {
        if filter.is_empty() {
            return Ok(Vec::new());
        }

        let grades = Self::filtered(&filter)
            .order_by_asc(Column::Date)
            .order_by_asc(Column::Id)
            .all(&self.db)
            .await
            .map_err(|e| GradebookError::database_operation(format!("查询成绩列表失败: {e}")))?;

        Ok(grades.into_iter().map(|m| m.into_grade()).collect())
    }

    /// 分页列出成绩，最新的在前
    pub async fn list_grades_with_pagination_impl(
        &self,
        filter: GradeFilter,
        query: PaginationQuery,
    ) -> Result<GradeListResponse> {
        let (page, size) = query.normalized();

        if filter.is_empty() {
            return Ok(GradeListResponse {
                items: Vec::new(),
                pagination: PaginationInfo::new(page, size, 0),
            });
        }

        let paginator = Self::filtered(&filter)
            .order_by_desc(Column::Date)
            .order_by_desc(Column::Id)
            .paginate(&self.db, size);

        let total = paginator
            .num_items()
            .await
            .map_err(|e| GradebookError::database_operation(format!("查询成绩总数失败: {e}")))?;

        let grades = paginator
            .fetch_page(page - 1)
            .await
            .map_err(|e| GradebookError::database_operation(format!("查询成绩列表失败: {e}")))?;

        Ok(GradeListResponse {
            items: grades.into_iter().map(|m| m.into_grade()).collect(),
            pagination: PaginationInfo::new(page, size, total),
        })
    }
}
