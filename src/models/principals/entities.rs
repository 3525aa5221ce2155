use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::models::parents::entities::Parent;
use crate::models::students::entities::Student;
use crate::models::teachers::entities::Teacher;

// 账号角色，封闭集合
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, Hash, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "principal.ts")]
pub enum Role {
    Teacher,
    Student,
    Parent,
}

impl Role {
    pub const TEACHER: &'static str = "teacher";
    pub const STUDENT: &'static str = "student";
    pub const PARENT: &'static str = "parent";

    pub fn all_roles() -> &'static [Role] {
        &[Role::Teacher, Role::Student, Role::Parent]
    }
}

impl<'de> Deserialize<'de> for Role {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse::<Role>().map_err(|_| {
            serde::de::Error::custom(format!(
                "invalid role: '{s}'. supported roles: teacher, student, parent"
            ))
        })
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Teacher => write!(f, "{}", Role::TEACHER),
            Role::Student => write!(f, "{}", Role::STUDENT),
            Role::Parent => write!(f, "{}", Role::PARENT),
        }
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            Role::TEACHER => Ok(Role::Teacher),
            Role::STUDENT => Ok(Role::Student),
            Role::PARENT => Ok(Role::Parent),
            _ => Err(format!("Invalid role: {s}")),
        }
    }
}

/// 已认证的主体
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(tag = "role", rename_all = "snake_case")]
#[ts(export, export_to = "principal.ts")]
pub enum Principal {
    Teacher(Teacher),
    Student(Student),
    Parent(Parent),
}

impl Principal {
    pub fn role(&self) -> Role {
        match self {
            Principal::Teacher(_) => Role::Teacher,
            Principal::Student(_) => Role::Student,
            Principal::Parent(_) => Role::Parent,
        }
    }

    pub fn id(&self) -> i64 {
        match self {
            Principal::Teacher(t) => t.id,
            Principal::Student(s) => s.id,
            Principal::Parent(p) => p.id,
        }
    }

    pub fn login_id(&self) -> &str {
        match self {
            Principal::Teacher(t) => &t.login_id,
            Principal::Student(s) => &s.login_id,
            Principal::Parent(p) => &p.login_id,
        }
    }

    pub fn as_teacher(&self) -> Option<&Teacher> {
        match self {
            Principal::Teacher(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_student(&self) -> Option<&Student> {
        match self {
            Principal::Student(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_parent(&self) -> Option<&Parent> {
        match self {
            Principal::Parent(p) => Some(p),
            _ => None,
        }
    }
}

/// 登录凭据：账号主键与密码哈希
#[derive(Debug, Clone)]
pub struct Credential {
    pub role: Role,
    pub principal_id: i64,
    pub password_hash: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_round_trips_through_str() {
        for role in Role::all_roles() {
            assert_eq!(role.to_string().parse::<Role>(), Ok(*role));
        }
        assert!("admin".parse::<Role>().is_err());
    }

    #[test]
    fn test_principal_serializes_with_role_tag() {
        let principal = Principal::Parent(Parent {
            id: 3,
            login_id: "P123425".to_string(),
            first_name: "Anna".to_string(),
            last_name: "Petrova".to_string(),
            children_ids: vec![7],
        });
        let json = serde_json::to_value(&principal).expect("serializable");
        assert_eq!(json["role"], "parent");
        assert_eq!(json["login_id"], "P123425");

        let back: Principal = serde_json::from_value(json).expect("deserializable");
        assert_eq!(back, principal);
    }
}
