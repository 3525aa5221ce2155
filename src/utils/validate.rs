use once_cell::sync::Lazy;
use regex::Regex;

use crate::models::principals::entities::Role;

// 教师：t + 6 位数字
static TEACHER_ID_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^t[0-9]{6}$").expect("Invalid teacher id regex"));

// 学生：2 位入学年份 + 4 位数字
static STUDENT_ID_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9]{6}$").expect("Invalid student id regex"));

// 家长：P + 4 位数字 + 2 位年份
static PARENT_ID_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^P[0-9]{6}$").expect("Invalid parent id regex"));

static PASSWORD_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9]{6}$").expect("Invalid password regex"));

/// 按登录 ID 的形状判断角色，形状不符返回 None
pub fn detect_role(login_id: &str) -> Option<Role> {
    if TEACHER_ID_RE.is_match(login_id) {
        Some(Role::Teacher)
    } else if STUDENT_ID_RE.is_match(login_id) {
        Some(Role::Student)
    } else if PARENT_ID_RE.is_match(login_id) {
        Some(Role::Parent)
    } else {
        None
    }
}

/// 生成的密码总是 6 位数字
pub fn validate_password(password: &str) -> Result<(), &'static str> {
    if !PASSWORD_RE.is_match(password) {
        return Err("Password must be exactly 6 digits");
    }
    Ok(())
}

pub fn validate_person_name(name: &str) -> Result<(), &'static str> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err("Name must not be empty");
    }
    if trimmed.chars().count() > 64 {
        return Err("Name must be at most 64 characters");
    }
    Ok(())
}

/// 班级字母：单个字母
pub fn validate_class_letter(letter: &str) -> Result<(), &'static str> {
    let mut chars = letter.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) if c.is_alphabetic() => Ok(()),
        _ => Err("Class letter must be a single letter"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_role_by_shape() {
        assert_eq!(detect_role("t123456"), Some(Role::Teacher));
        assert_eq!(detect_role("251234"), Some(Role::Student));
        assert_eq!(detect_role("P123425"), Some(Role::Parent));
    }

    #[test]
    fn test_unknown_shapes() {
        assert_eq!(detect_role(""), None);
        assert_eq!(detect_role("T123456"), None);
        assert_eq!(detect_role("p123456"), None);
        assert_eq!(detect_role("t12345"), None);
        assert_eq!(detect_role("1234567"), None);
        assert_eq!(detect_role("admin"), None);
    }

    #[test]
    fn test_password_shape() {
        assert!(validate_password("004211").is_ok());
        assert!(validate_password("12345").is_err());
        assert!(validate_password("abcdef").is_err());
    }

    #[test]
    fn test_class_letter() {
        assert!(validate_class_letter("A").is_ok());
        assert!(validate_class_letter("Б").is_ok());
        assert!(validate_class_letter("AB").is_err());
        assert!(validate_class_letter("1").is_err());
    }
}
