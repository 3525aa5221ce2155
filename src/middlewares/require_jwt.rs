/*!
 * JWT 认证中间件
 *
 * 校验 `Authorization: Bearer <token>` 中的 access token，把对应的
 * [`Principal`] 放入请求扩展。令牌到账号的解析结果按令牌缓存。
 *
 * ```rust,ignore
 * web::scope("/api/v1/grades")
 *     .wrap(RequireRole::new(Role::Teacher))
 *     .wrap(RequireJWT)
 *     .route("", web::post().to(submit_grade));
 *
 * async fn submit_grade(req: HttpRequest) -> ActixResult<HttpResponse> {
 *     let Some(teacher) = RequireJWT::extract_teacher(&req) else { ... };
 *     ...
 * }
 * ```
 */

use std::{rc::Rc, sync::Arc};

use actix_service::{Service, Transform};
use actix_web::{
    Error, HttpMessage, HttpRequest,
    body::EitherBody,
    dev::{ServiceRequest, ServiceResponse},
    http::StatusCode,
};
use futures_util::future::{LocalBoxFuture, Ready, ready};
use tracing::{debug, info};

use super::create_error_response;
use crate::cache::{CacheResult, ObjectCache};
use crate::config::AppConfig;
use crate::models::ErrorCode;
use crate::models::parents::entities::Parent;
use crate::models::principals::entities::{Principal, Role};
use crate::models::students::entities::Student;
use crate::models::teachers::entities::Teacher;
use crate::storage::Storage;
use crate::utils::jwt::{ACCESS_TOKEN, JwtUtils};

const BEARER_PREFIX: &str = "Bearer ";
const AUTHORIZATION_HEADER: &str = "Authorization";

#[derive(Clone)]
pub struct RequireJWT;

fn cache_key(token: &str) -> String {
    format!("principal:{token}")
}

fn bearer_token(req: &ServiceRequest) -> Option<&str> {
    req.headers()
        .get(AUTHORIZATION_HEADER)
        .and_then(|h| h.to_str().ok())
        .and_then(|s| s.strip_prefix(BEARER_PREFIX))
}

/// 令牌 → 账号
///
/// 先验签名和有效期，再查缓存，未命中时按 `role` 和 `sub` 回源到存储。
pub(crate) async fn resolve_token(
    secret: &str,
    token: &str,
    storage: &dyn Storage,
    cache: &dyn ObjectCache,
    ttl: u64,
) -> Result<Principal, String> {
    let claims = JwtUtils::decode_token(secret, token, ACCESS_TOKEN).map_err(|err| {
        info!("JWT token validation failed: {}", err);
        "Invalid JWT token".to_string()
    })?;

    let key = cache_key(token);
    if let CacheResult::Found(json) = cache.get_raw(&key).await {
        match serde_json::from_str::<Principal>(&json) {
            Ok(principal) => return Ok(principal),
            Err(_) => {
                info!("Dropping undecodable principal cache entry");
                cache.remove(&key).await;
            }
        }
    }

    let id = claims
        .principal_id()
        .ok_or_else(|| "Invalid subject in JWT".to_string())?;

    let principal = storage
        .get_principal(claims.role, id)
        .await
        .map_err(|e| {
            info!("Failed to load {} {}: {}", claims.role, id, e);
            "Failed to retrieve account".to_string()
        })?
        .ok_or_else(|| "Account not found".to_string())?;

    if let Ok(json) = serde_json::to_string(&principal) {
        cache.insert_raw(key, json, ttl).await;
    }

    Ok(principal)
}

async fn extract_and_validate_jwt(req: &ServiceRequest) -> Result<Principal, String> {
    let token = bearer_token(req)
        .ok_or_else(|| "Missing or invalid Authorization header".to_string())?;

    let cache = req
        .app_data::<actix_web::web::Data<Arc<dyn ObjectCache>>>()
        .expect("Cache not found in app data")
        .get_ref()
        .clone();
    let storage = req
        .app_data::<actix_web::web::Data<Arc<dyn Storage>>>()
        .expect("Storage not found in app data")
        .get_ref()
        .clone();

    let config = AppConfig::get();
    resolve_token(
        &config.jwt.secret,
        token,
        storage.as_ref(),
        cache.as_ref(),
        config.cache.default_ttl,
    )
    .await
}

impl<S, B> Transform<S, ServiceRequest> for RequireJWT
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = RequireJWTMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RequireJWTMiddleware {
            service: Rc::new(service),
        }))
    }
}

pub struct RequireJWTMiddleware<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for RequireJWTMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(
        &self,
        ctx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        self.service.poll_ready(ctx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let srv = self.service.clone();
        Box::pin(async move {
            // 预检请求直接放行
            if req.method() == actix_web::http::Method::OPTIONS {
                return Ok(req.into_response(
                    create_error_response(StatusCode::NO_CONTENT, ErrorCode::Success, "")
                        .map_into_right_body(),
                ));
            }

            match extract_and_validate_jwt(&req).await {
                Ok(principal) => {
                    debug!(
                        "JWT authentication successful for {} {}",
                        principal.role(),
                        principal.login_id()
                    );
                    req.extensions_mut().insert(principal);
                    let res = srv.call(req).await?.map_into_left_body();
                    Ok(res)
                }
                Err(err) => {
                    info!(
                        "JWT authentication failed for request to {}: {}",
                        req.path(),
                        err
                    );
                    Ok(req.into_response(
                        create_error_response(
                            StatusCode::UNAUTHORIZED,
                            ErrorCode::Unauthorized,
                            &format!("Unauthorized: {err}"),
                        )
                        .map_into_right_body(),
                    ))
                }
            }
        })
    }
}

// 处理程序中读取当前账号，须在 RequireJWT 之后使用
impl RequireJWT {
    pub fn extract_principal(req: &HttpRequest) -> Option<Principal> {
        req.extensions().get::<Principal>().cloned()
    }

    pub fn extract_role(req: &HttpRequest) -> Option<Role> {
        req.extensions().get::<Principal>().map(Principal::role)
    }

    pub fn extract_teacher(req: &HttpRequest) -> Option<Teacher> {
        req.extensions()
            .get::<Principal>()
            .and_then(Principal::as_teacher)
            .cloned()
    }

    pub fn extract_student(req: &HttpRequest) -> Option<Student> {
        req.extensions()
            .get::<Principal>()
            .and_then(Principal::as_student)
            .cloned()
    }

    pub fn extract_parent(req: &HttpRequest) -> Option<Parent> {
        req.extensions()
            .get::<Principal>()
            .and_then(Principal::as_parent)
            .cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::object_cache::moka::MokaObjectCache;
    use crate::config::{CacheConfig, MemoryConfig, RedisConfig};
    use crate::models::principals::requests::NewStudent;
    use crate::storage::memory_storage::MemoryStorage;

    const SECRET: &str = "test-secret";

    fn cache() -> MokaObjectCache {
        MokaObjectCache::from_config(&CacheConfig {
            cache_type: "moka".to_string(),
            default_ttl: 60,
            redis: RedisConfig {
                url: String::new(),
                key_prefix: String::new(),
                pool_size: 1,
            },
            memory: MemoryConfig { max_capacity: 16 },
        })
    }

    fn token(id: i64, role: Role, token_type: &str) -> String {
        JwtUtils::encode_token(SECRET, id, role, token_type, chrono::Duration::minutes(5))
            .expect("token")
    }

    async fn student(storage: &MemoryStorage) -> Student {
        storage
            .create_student(NewStudent {
                login_id: "251234".to_string(),
                password_hash: String::new(),
                first_name: "Ivan".to_string(),
                last_name: "Ivanov".to_string(),
                class_id: None,
            })
            .await
            .expect("student")
    }

    #[tokio::test]
    async fn test_token_resolves_and_is_cached() {
        let storage = MemoryStorage::new();
        let cache = cache();
        let student = student(&storage).await;
        let access = token(student.id, Role::Student, ACCESS_TOKEN);

        let principal = resolve_token(SECRET, &access, &storage, &cache, 0)
            .await
            .expect("resolved");
        assert_eq!(principal, Principal::Student(student));
        assert!(matches!(
            cache.get_raw(&cache_key(&access)).await,
            CacheResult::Found(_)
        ));
    }

    #[tokio::test]
    async fn test_role_claim_selects_the_account_table() {
        let storage = MemoryStorage::new();
        let student = student(&storage).await;
        // 同一主键按教师身份解析不到账号
        let access = token(student.id, Role::Teacher, ACCESS_TOKEN);

        let err = resolve_token(SECRET, &access, &storage, &cache(), 0)
            .await
            .expect_err("no such teacher");
        assert_eq!(err, "Account not found");
    }

    #[tokio::test]
    async fn test_refresh_token_and_bad_signature_are_rejected() {
        let storage = MemoryStorage::new();
        let student = student(&storage).await;

        let refresh = token(student.id, Role::Student, crate::utils::jwt::REFRESH_TOKEN);
        assert!(
            resolve_token(SECRET, &refresh, &storage, &cache(), 0)
                .await
                .is_err()
        );

        let access = token(student.id, Role::Student, ACCESS_TOKEN);
        assert!(
            resolve_token("other-secret", &access, &storage, &cache(), 0)
                .await
                .is_err()
        );
    }
}
