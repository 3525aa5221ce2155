//! 开户
//!
//! 生成登录 ID 和 6 位数字密码，只保存密码哈希；明文只在开户结果里出现一次。

pub mod seed;

use std::sync::Arc;

use chrono::Datelike;
use serde::Serialize;
use tracing::debug;

use crate::config::Argon2Config;
use crate::errors::{GradebookError, Result};
use crate::models::parents::entities::Parent;
use crate::models::principals::entities::Role;
use crate::models::principals::requests::{NewParent, NewStudent, NewTeacher};
use crate::models::school_classes::entities::SchoolClass;
use crate::models::students::entities::Student;
use crate::models::subjects::entities::Subject;
use crate::models::teachers::entities::Teacher;
use crate::storage::Storage;
use crate::utils::id_generator::IdGenerator;
use crate::utils::password::hash_password;
use crate::utils::validate::{validate_class_letter, validate_person_name};

/// 生成未占用 ID 的最大尝试次数
const MAX_ID_ATTEMPTS: usize = 64;

/// 开户结果，带一次性明文密码
#[derive(Debug, Clone, Serialize)]
pub struct Provisioned<T> {
    pub account: T,
    pub login_id: String,
    pub password: String,
}

pub struct AccountProvisioner {
    storage: Arc<dyn Storage>,
    ids: Arc<dyn IdGenerator>,
    argon2: Argon2Config,
    year: i32,
}

impl AccountProvisioner {
    pub fn new(storage: Arc<dyn Storage>, ids: Arc<dyn IdGenerator>, argon2: Argon2Config) -> Self {
        Self {
            storage,
            ids,
            argon2,
            year: chrono::Local::now().year(),
        }
    }

    /// 学生、家长 ID 中嵌入的年份
    pub fn with_year(mut self, year: i32) -> Self {
        self.year = year;
        self
    }

    async fn unused_login_id(&self, role: Role) -> Result<String> {
        for _ in 0..MAX_ID_ATTEMPTS {
            let candidate = match role {
                Role::Teacher => self.ids.next_teacher_id(),
                Role::Student => self.ids.next_student_id(self.year),
                Role::Parent => self.ids.next_parent_id(self.year),
            };
            if !self.storage.login_id_exists(role, &candidate).await? {
                return Ok(candidate);
            }
            debug!("{} login id {} already taken, retrying", role, candidate);
        }
        Err(GradebookError::id_exhausted(format!(
            "no unused {role} login id after {MAX_ID_ATTEMPTS} attempts"
        )))
    }

    /// 登录 ID、明文密码、密码哈希
    async fn credentials(&self, role: Role) -> Result<(String, String, String)> {
        let login_id = self.unused_login_id(role).await?;
        let password = self.ids.next_password();
        let hash = hash_password(&password, &self.argon2)?;
        Ok((login_id, password, hash))
    }

    fn check_names(first_name: &str, last_name: &str) -> Result<()> {
        validate_person_name(first_name)
            .and_then(|_| validate_person_name(last_name))
            .map_err(GradebookError::validation)
    }

    pub async fn create_class(&self, number: i32, letter: &str) -> Result<SchoolClass> {
        if !(1..=12).contains(&number) {
            return Err(GradebookError::validation(format!(
                "class number {number} out of range"
            )));
        }
        validate_class_letter(letter).map_err(GradebookError::validation)?;
        self.storage.create_school_class(number, letter).await
    }

    pub async fn create_subject(&self, name: &str, class_ids: &[i64]) -> Result<Subject> {
        if name.trim().is_empty() {
            return Err(GradebookError::validation("subject name must not be empty"));
        }
        self.storage.create_subject(name.trim(), class_ids).await
    }

    pub async fn provision_teacher(
        &self,
        first_name: &str,
        last_name: &str,
        subject_ids: Vec<i64>,
        class_ids: Vec<i64>,
    ) -> Result<Provisioned<Teacher>> {
        Self::check_names(first_name, last_name)?;
        let (login_id, password, password_hash) = self.credentials(Role::Teacher).await?;

        let account = self
            .storage
            .create_teacher(NewTeacher {
                login_id: login_id.clone(),
                password_hash,
                first_name: first_name.trim().to_string(),
                last_name: last_name.trim().to_string(),
                subject_ids,
                class_ids,
            })
            .await?;

        Ok(Provisioned {
            account,
            login_id,
            password,
        })
    }

    pub async fn provision_student(
        &self,
        first_name: &str,
        last_name: &str,
        class_id: Option<i64>,
    ) -> Result<Provisioned<Student>> {
        Self::check_names(first_name, last_name)?;
        let (login_id, password, password_hash) = self.credentials(Role::Student).await?;

        let account = self
            .storage
            .create_student(NewStudent {
                login_id: login_id.clone(),
                password_hash,
                first_name: first_name.trim().to_string(),
                last_name: last_name.trim().to_string(),
                class_id,
            })
            .await?;

        Ok(Provisioned {
            account,
            login_id,
            password,
        })
    }

    pub async fn provision_parent(
        &self,
        first_name: &str,
        last_name: &str,
        children_ids: Vec<i64>,
    ) -> Result<Provisioned<Parent>> {
        Self::check_names(first_name, last_name)?;
        let (login_id, password, password_hash) = self.credentials(Role::Parent).await?;

        let account = self
            .storage
            .create_parent(NewParent {
                login_id: login_id.clone(),
                password_hash,
                first_name: first_name.trim().to_string(),
                last_name: last_name.trim().to_string(),
                children_ids,
            })
            .await?;

        Ok(Provisioned {
            account,
            login_id,
            password,
        })
    }
}
