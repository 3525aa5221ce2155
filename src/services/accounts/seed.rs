//! 初始数据导入
//!
//! 空库首次启动时从 JSON 文件建立班级、科目和账号。班级用 `9-A` 形式引用，
//! 科目用名称引用，家长的子女用学生条目的 `key` 引用。

use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;
use tracing::{info, warn};

use super::AccountProvisioner;
use crate::errors::{GradebookError, Result};
use crate::models::principals::entities::Role;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SeedFile {
    #[serde(default)]
    pub classes: Vec<SeedClass>,
    #[serde(default)]
    pub subjects: Vec<SeedSubject>,
    #[serde(default)]
    pub teachers: Vec<SeedTeacher>,
    #[serde(default)]
    pub students: Vec<SeedStudent>,
    #[serde(default)]
    pub parents: Vec<SeedParent>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SeedClass {
    pub number: i32,
    pub letter: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SeedSubject {
    pub name: String,
    #[serde(default)]
    pub classes: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SeedTeacher {
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub subjects: Vec<String>,
    #[serde(default)]
    pub classes: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SeedStudent {
    /// 供家长条目引用
    #[serde(default)]
    pub key: Option<String>,
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub class: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SeedParent {
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub children: Vec<String>,
}

/// 导入时发放的一条凭据
#[derive(Debug, Clone)]
pub struct IssuedCredential {
    pub role: Role,
    pub name: String,
    pub login_id: String,
    pub password: String,
}

impl SeedFile {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Ok(serde_json::from_str(&content)?)
    }
}

fn lookup(map: &HashMap<String, i64>, kind: &str, name: &str) -> Result<i64> {
    map.get(name)
        .copied()
        .ok_or_else(|| GradebookError::validation(format!("seed refers to unknown {kind} '{name}'")))
}

fn lookup_all(map: &HashMap<String, i64>, kind: &str, names: &[String]) -> Result<Vec<i64>> {
    names.iter().map(|name| lookup(map, kind, name)).collect()
}

/// 导入种子数据，返回发放的凭据
///
/// 任一引用无法解析即中止；已经写入的记录不回滚。
pub async fn apply_seed(
    accounts: &AccountProvisioner,
    seed: &SeedFile,
) -> Result<Vec<IssuedCredential>> {
    let mut classes = HashMap::new();
    for class in &seed.classes {
        let created = accounts.create_class(class.number, &class.letter).await?;
        classes.insert(created.name(), created.id);
    }

    let mut subjects = HashMap::new();
    for subject in &seed.subjects {
        let class_ids = lookup_all(&classes, "class", &subject.classes)?;
        let created = accounts.create_subject(&subject.name, &class_ids).await?;
        subjects.insert(created.name.clone(), created.id);
    }

    let mut issued = Vec::new();

    for teacher in &seed.teachers {
        let subject_ids = lookup_all(&subjects, "subject", &teacher.subjects)?;
        let class_ids = lookup_all(&classes, "class", &teacher.classes)?;
        let created = accounts
            .provision_teacher(&teacher.first_name, &teacher.last_name, subject_ids, class_ids)
            .await?;
        issued.push(IssuedCredential {
            role: Role::Teacher,
            name: created.account.full_name(),
            login_id: created.login_id,
            password: created.password,
        });
    }

    let mut students = HashMap::new();
    for student in &seed.students {
        let class_id = student
            .class
            .as_deref()
            .map(|name| lookup(&classes, "class", name))
            .transpose()?;
        let created = accounts
            .provision_student(&student.first_name, &student.last_name, class_id)
            .await?;
        if let Some(key) = &student.key {
            students.insert(key.clone(), created.account.id);
        }
        issued.push(IssuedCredential {
            role: Role::Student,
            name: created.account.full_name(),
            login_id: created.login_id,
            password: created.password,
        });
    }

    for parent in &seed.parents {
        let children_ids = lookup_all(&students, "student", &parent.children)?;
        let created = accounts
            .provision_parent(&parent.first_name, &parent.last_name, children_ids)
            .await?;
        issued.push(IssuedCredential {
            role: Role::Parent,
            name: created.account.full_name(),
            login_id: created.login_id,
            password: created.password,
        });
    }

    info!(
        "Seed imported: {} classes, {} subjects, {} accounts",
        classes.len(),
        subjects.len(),
        issued.len()
    );
    Ok(issued)
}

/// 库里还没有任何账号时才导入
pub async fn seed_if_empty(
    accounts: &AccountProvisioner,
    path: impl AsRef<Path>,
) -> Result<Option<Vec<IssuedCredential>>> {
    if accounts.storage.count_accounts().await? > 0 {
        info!("Accounts already present, skipping seed import");
        return Ok(None);
    }

    let seed = SeedFile::load(path.as_ref())?;
    let issued = apply_seed(accounts, &seed).await?;

    // 明文密码只在这里输出一次
    for credential in &issued {
        warn!(
            "Issued {} account for {}: login={} password={}",
            credential.role, credential.name, credential.login_id, credential.password
        );
    }
    Ok(Some(issued))
}
