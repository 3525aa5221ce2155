// 开户写入的账号记录，密码已哈希

#[derive(Debug, Clone)]
pub struct NewTeacher {
    pub login_id: String,
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub subject_ids: Vec<i64>,
    pub class_ids: Vec<i64>,
}

#[derive(Debug, Clone)]
pub struct NewStudent {
    pub login_id: String,
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub class_id: Option<i64>,
}

#[derive(Debug, Clone)]
pub struct NewParent {
    pub login_id: String,
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub children_ids: Vec<i64>,
}
