//! SeaORM 存储实现
//!
//! 统一的数据库存储层，支持 SQLite、PostgreSQL 和 MySQL。

mod directory;
mod grades;
mod roster;

use crate::config::{AppConfig, DatabaseConfig};
use crate::errors::{GradebookError, Result};
use migration::{Migrator, MigratorTrait};
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use std::time::Duration;
use tracing::info;

/// SeaORM 存储实现
#[derive(Clone)]
pub struct SeaOrmStorage {
    pub(crate) db: DatabaseConnection,
}

impl SeaOrmStorage {
    /// 按全局配置创建存储实例
    pub async fn new_async() -> Result<Self> {
        let config = AppConfig::get();
        Self::connect(&config.database).await
    }

    /// 连接数据库并运行迁移
    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        let db_url = Self::build_database_url(&config.url)?;

        // 根据数据库类型选择连接方式
        let db = if db_url.starts_with("sqlite:") {
            Self::connect_sqlite(&db_url, config).await?
        } else {
            Self::connect_generic(&db_url, config).await?
        };

        // 运行迁移
        Migrator::up(&db, None)
            .await
            .map_err(|e| GradebookError::database_operation(format!("数据库迁移失败: {e}")))?;

        info!("SeaORM 存储初始化完成，数据库: {}", db_url);

        Ok(Self { db })
    }

    /// SQLite 专用连接（WAL + pragma 优化）
    async fn connect_sqlite(url: &str, config: &DatabaseConfig) -> Result<DatabaseConnection> {
        use sea_orm::SqlxSqliteConnector;
        use sea_orm::sqlx::sqlite::{
            SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous,
        };
        use std::str::FromStr;

        let opt = SqliteConnectOptions::from_str(url)
            .map_err(|e| GradebookError::database_config(format!("SQLite URL 解析失败: {e}")))?
            .create_if_missing(true)
            .foreign_keys(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .busy_timeout(Duration::from_secs(5))
            .pragma("cache_size", "-64000")
            .pragma("temp_store", "memory");

        let pool = SqlitePoolOptions::new()
            .max_connections(config.pool_size)
            .min_connections(1)
            .test_before_acquire(true)
            .acquire_timeout(Duration::from_secs(config.timeout))
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(opt)
            .await
            .map_err(|e| GradebookError::database_connection(format!("SQLite 连接失败: {e}")))?;

        Ok(SqlxSqliteConnector::from_sqlx_sqlite_pool(pool))
    }

    /// 通用连接（PostgreSQL、MySQL 等）
    async fn connect_generic(url: &str, config: &DatabaseConfig) -> Result<DatabaseConnection> {
        let mut opt = ConnectOptions::new(url);
        opt.max_connections(config.pool_size)
            .min_connections(2)
            .connect_timeout(Duration::from_secs(config.timeout))
            .acquire_timeout(Duration::from_secs(config.timeout))
            .idle_timeout(Duration::from_secs(600))
            .max_lifetime(Duration::from_secs(1800))
            .sqlx_logging(false)
            .sqlx_logging_level(tracing::log::LevelFilter::Debug);

        Database::connect(opt)
            .await
            .map_err(|e| GradebookError::database_connection(format!("无法连接到数据库: {e}")))
    }

    /// 从 URL 自动推断数据库类型并构建连接 URL
    fn build_database_url(url: &str) -> Result<String> {
        if url.starts_with("sqlite:") {
            Ok(url.to_string())
        } else if url == ":memory:" {
            Ok("sqlite::memory:".to_string())
        } else if url.ends_with(".db") || url.ends_with(".sqlite") {
            Ok(format!("sqlite://{url}?mode=rwc"))
        } else if url.starts_with("postgres://")
            || url.starts_with("postgresql://")
            || url.starts_with("mysql://")
            || url.starts_with("mariadb://")
        {
            Ok(url.to_string())
        } else {
            Err(GradebookError::database_config(format!(
                "无法从 URL 推断数据库类型: {url}. 支持: sqlite://, postgres://, mysql://, 或 .db/.sqlite 文件路径"
            )))
        }
    }
}

// Storage trait 实现
use crate::models::{
    PaginationQuery,
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
use crate::storage::Storage;
use async_trait::async_trait;
use chrono::NaiveDate;

#[async_trait]
impl Storage for SeaOrmStorage {
    // 目录模块
    async fn find_credential(&self, role: Role, login_id: &str) -> Result<Option<Credential>> {
        self.find_credential_impl(role, login_id).await
    }

    async fn login_id_exists(&self, role: Role, login_id: &str) -> Result<bool> {
        self.login_id_exists_impl(role, login_id).await
    }

    async fn get_teacher_by_id(&self, id: i64) -> Result<Option<Teacher>> {
        self.get_teacher_by_id_impl(id).await
    }

    async fn get_student_by_id(&self, id: i64) -> Result<Option<Student>> {
        self.get_student_by_id_impl(id).await
    }

    async fn get_parent_by_id(&self, id: i64) -> Result<Option<Parent>> {
        self.get_parent_by_id_impl(id).await
    }

    async fn count_accounts(&self) -> Result<u64> {
        self.count_accounts_impl().await
    }

    async fn create_teacher(&self, account: NewTeacher) -> Result<Teacher> {
        self.create_teacher_impl(account).await
    }

    async fn create_student(&self, account: NewStudent) -> Result<Student> {
        self.create_student_impl(account).await
    }

    async fn create_parent(&self, account: NewParent) -> Result<Parent> {
        self.create_parent_impl(account).await
    }

    // 名册模块
    async fn get_subject_by_id(&self, id: i64) -> Result<Option<Subject>> {
        self.get_subject_by_id_impl(id).await
    }

    async fn list_subjects_by_ids(&self, ids: &[i64]) -> Result<Vec<Subject>> {
        self.list_subjects_by_ids_impl(ids).await
    }

    async fn list_students_in_classes(&self, class_ids: &[i64]) -> Result<Vec<Student>> {
        self.list_students_in_classes_impl(class_ids).await
    }

    async fn list_students_by_ids(&self, ids: &[i64]) -> Result<Vec<Student>> {
        self.list_students_by_ids_impl(ids).await
    }

    async fn create_school_class(&self, number: i32, letter: &str) -> Result<SchoolClass> {
        self.create_school_class_impl(number, letter).await
    }

    async fn create_subject(&self, name: &str, class_ids: &[i64]) -> Result<Subject> {
        self.create_subject_impl(name, class_ids).await
    }

    // 成绩模块
    async fn grade_exists(
        &self,
        student_id: i64,
        subject_id: i64,
        date: NaiveDate,
    ) -> Result<bool> {
        self.grade_exists_impl(student_id, subject_id, date).await
    }

    async fn create_grade(&self, grade: NewGrade) -> Result<Grade> {
        self.create_grade_impl(grade).await
    }

    async fn list_grades(&self, filter: GradeFilter) -> Result<Vec<Grade>> {
        self.list_grades_impl(filter).await
    }

    async fn list_grades_with_pagination(
        &self,
        filter: GradeFilter,
        query: PaginationQuery,
    ) -> Result<GradeListResponse> {
        self.list_grades_with_pagination_impl(filter, query).await
    }
}
