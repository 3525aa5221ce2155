use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use crate::errors::{GradebookError, Result};
use crate::models::principals::entities::Principal;
use crate::models::{
    ApiResponse, ErrorCode,
    auth::{LoginRequest, LoginResponse},
};
use crate::storage::Storage;
use crate::utils::jwt;
use crate::utils::password::verify_password;
use crate::utils::validate::detect_role;

use super::AuthService;

const AUTH_FAILED: &str = "Login ID or password is incorrect";

/// 由登录 ID 与密码解析出主体
///
/// 角色由 ID 的形状决定，只查对应角色的一张表。ID 形状不符、ID 不存在、
/// 密码错误都返回同一个认证错误。
pub async fn resolve_principal(
    storage: &dyn Storage,
    login_id: &str,
    password: &str,
) -> Result<Principal> {
    let login_id = login_id.trim();
    let role = detect_role(login_id).ok_or_else(|| GradebookError::authentication(AUTH_FAILED))?;

    let credential = storage
        .find_credential(role, login_id)
        .await?
        .ok_or_else(|| GradebookError::authentication(AUTH_FAILED))?;

    if !verify_password(password, &credential.password_hash) {
        return Err(GradebookError::authentication(AUTH_FAILED));
    }

    storage
        .get_principal(credential.role, credential.principal_id)
        .await?
        .ok_or_else(|| GradebookError::authentication(AUTH_FAILED))
}

pub async fn handle_login(
    service: &AuthService,
    login_request: LoginRequest,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request);
    let config = service.get_config();

    let principal = match resolve_principal(
        storage.as_ref(),
        &login_request.login_id,
        &login_request.password,
    )
    .await
    {
        Ok(principal) => principal,
        Err(GradebookError::Authentication(_)) => {
            tracing::info!("Failed login attempt for '{}'", login_request.login_id);
            return Ok(HttpResponse::Unauthorized().json(ApiResponse::error_empty(
                ErrorCode::AuthFailed,
                AUTH_FAILED,
            )));
        }
        Err(e) => {
            tracing::error!("Login failed: {}", e);
            return Ok(
                HttpResponse::InternalServerError().json(ApiResponse::error_empty(
                    ErrorCode::InternalServerError,
                    "Login failed",
                )),
            );
        }
    };

    match jwt::JwtUtils::generate_token_pair(principal.id(), principal.role()) {
        Ok(token_pair) => {
            tracing::info!(
                "{} {} logged in successfully",
                principal.role(),
                principal.login_id()
            );

            let response = LoginResponse {
                access_token: token_pair.access_token,
                expires_in: config.jwt.access_token_expiry * 60, // 转换为秒
                principal,
                created_at: chrono::Utc::now(),
            };

            let refresh_cookie =
                jwt::JwtUtils::create_refresh_token_cookie(&token_pair.refresh_token);

            Ok(HttpResponse::Ok()
                .cookie(refresh_cookie)
                .json(ApiResponse::success(response, "Login successful")))
        }
        Err(e) => {
            tracing::error!("Failed to generate JWT token: {}", e);
            Ok(
                HttpResponse::InternalServerError().json(ApiResponse::error_empty(
                    ErrorCode::InternalServerError,
                    "Login failed, unable to generate token",
                )),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::principals::entities::Role;
    use crate::models::principals::requests::{NewParent, NewStudent, NewTeacher};
    use crate::storage::memory_storage::MemoryStorage;
    use crate::utils::password::{cheap_params, hash_password};

    async fn directory() -> MemoryStorage {
        let storage = MemoryStorage::new();
        let hash = hash_password("123456", &cheap_params()).expect("hash");
        storage
            .create_teacher(NewTeacher {
                login_id: "t000001".to_string(),
                password_hash: hash.clone(),
                first_name: "Olga".to_string(),
                last_name: "Smirnova".to_string(),
                subject_ids: vec![],
                class_ids: vec![],
            })
            .await
            .expect("teacher");
        // 学生和家长使用与教师数字部分相同的 ID，检验按角色分表查找
        storage
            .create_student(NewStudent {
                login_id: "000001".to_string(),
                password_hash: hash.clone(),
                first_name: "Ivan".to_string(),
                last_name: "Ivanov".to_string(),
                class_id: None,
            })
            .await
            .expect("student");
        storage
            .create_parent(NewParent {
                login_id: "P000001".to_string(),
                password_hash: hash,
                first_name: "Anna".to_string(),
                last_name: "Ivanova".to_string(),
                children_ids: vec![],
            })
            .await
            .expect("parent");
        storage
    }

    #[tokio::test]
    async fn test_role_follows_identifier_shape() {
        let storage = directory().await;
        for (login_id, role) in [
            ("t000001", Role::Teacher),
            ("000001", Role::Student),
            ("P000001", Role::Parent),
        ] {
            let principal = resolve_principal(&storage, login_id, "123456")
                .await
                .expect("resolved");
            assert_eq!(principal.role(), role);
            assert_eq!(principal.login_id(), login_id);
        }
    }

    #[tokio::test]
    async fn test_failures_are_indistinguishable() {
        let storage = directory().await;
        let attempts = [
            ("t000001", "654321"), // 密码错误
            ("t999999", "123456"), // ID 不存在
            ("admin", "123456"),   // 形状不符
        ];
        for (login_id, password) in attempts {
            let err = resolve_principal(&storage, login_id, password)
                .await
                .expect_err("rejected");
            assert!(matches!(err, GradebookError::Authentication(_)));
            assert_eq!(err.message(), AUTH_FAILED);
        }
    }
}
