use serde::Deserialize;
use ts_rs::TS;

// 登录请求：生成的登录 ID 与数字密码
#[derive(Debug, Deserialize, TS)]
#[ts(export, export_to = "auth.ts")]
pub struct LoginRequest {
    pub login_id: String,
    pub password: String,
}
