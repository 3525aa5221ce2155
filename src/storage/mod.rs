use std::sync::Arc;

use chrono::NaiveDate;

use crate::models::{
    PaginationQuery,
    grades::{
        entities::{Grade, GradeFilter, NewGrade},
        responses::GradeListResponse,
    },
    parents::entities::Parent,
    principals::{
        entities::{Credential, Principal, Role},
        requests::{NewParent, NewStudent, NewTeacher},
    },
    school_classes::entities::SchoolClass,
    students::entities::Student,
    subjects::entities::Subject,
    teachers::entities::Teacher,
};

use crate::errors::Result;

#[cfg(test)]
pub mod memory_storage;
pub mod sea_orm_storage;

#[async_trait::async_trait]
pub trait Storage: Send + Sync {
    /// 目录服务
    // 按角色和登录 ID 查找凭据
    async fn find_credential(&self, role: Role, login_id: &str) -> Result<Option<Credential>>;
    // 登录 ID 是否已被占用
    async fn login_id_exists(&self, role: Role, login_id: &str) -> Result<bool>;
    // 通过ID获取教师（含任教科目与班级）
    async fn get_teacher_by_id(&self, id: i64) -> Result<Option<Teacher>>;
    // 通过ID获取学生（含班级）
    async fn get_student_by_id(&self, id: i64) -> Result<Option<Student>>;
    // 通过ID获取家长（含孩子ID）
    async fn get_parent_by_id(&self, id: i64) -> Result<Option<Parent>>;
    // 三类账号总数
    async fn count_accounts(&self) -> Result<u64>;

    /// 名册
    // 通过ID获取科目（含开设班级）
    async fn get_subject_by_id(&self, id: i64) -> Result<Option<Subject>>;
    // 批量获取科目
    async fn list_subjects_by_ids(&self, ids: &[i64]) -> Result<Vec<Subject>>;
    // 列出属于这些班级的学生
    async fn list_students_in_classes(&self, class_ids: &[i64]) -> Result<Vec<Student>>;
    // 批量获取学生
    async fn list_students_by_ids(&self, ids: &[i64]) -> Result<Vec<Student>>;

    /// 开户
    async fn create_school_class(&self, number: i32, letter: &str) -> Result<SchoolClass>;
    async fn create_subject(&self, name: &str, class_ids: &[i64]) -> Result<Subject>;
    async fn create_teacher(&self, account: NewTeacher) -> Result<Teacher>;
    async fn create_student(&self, account: NewStudent) -> Result<Student>;
    async fn create_parent(&self, account: NewParent) -> Result<Parent>;

    /// 成绩台账
    // 同一学生、科目、日期是否已有成绩
    async fn grade_exists(&self, student_id: i64, subject_id: i64, date: NaiveDate)
    -> Result<bool>;
    // 写入成绩；重复时返回 Duplicate 错误，不会写入第二条
    async fn create_grade(&self, grade: NewGrade) -> Result<Grade>;
    // 按条件列出成绩（按日期升序）
    async fn list_grades(&self, filter: GradeFilter) -> Result<Vec<Grade>>;
    // 分页列出成绩（按日期倒序）
    async fn list_grades_with_pagination(
        &self,
        filter: GradeFilter,
        query: PaginationQuery,
    ) -> Result<GradeListResponse>;

    // 按角色加载主体
    async fn get_principal(&self, role: Role, id: i64) -> Result<Option<Principal>> {
        Ok(match role {
            Role::Teacher => self.get_teacher_by_id(id).await?.map(Principal::Teacher),
            Role::Student => self.get_student_by_id(id).await?.map(Principal::Student),
            Role::Parent => self.get_parent_by_id(id).await?.map(Principal::Parent),
        })
    }
}

pub async fn create_storage() -> Result<Arc<dyn Storage>> {
    let storage = sea_orm_storage::SeaOrmStorage::new_async().await?;
    Ok(Arc::new(storage))
}
