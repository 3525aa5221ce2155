/*!
 * 速率限制中间件
 *
 * 固定窗口计数，超过上限返回 429。默认按客户端 IP 计数；
 * 放在 RequireJWT 之内时改为按账号计数。
 *
 * ```rust,ignore
 * web::resource("/login")
 *     .wrap(RateLimit::login())  // 5 次/分钟/IP
 *     .route(web::post().to(login))
 * ```
 */

use actix_service::{Service, Transform};
use actix_web::{
    Error, HttpMessage, HttpResponse,
    body::EitherBody,
    dev::{ServiceRequest, ServiceResponse},
    http::StatusCode,
    http::header::CONTENT_TYPE,
};
use futures_util::future::{LocalBoxFuture, Ready, ready};
use moka::future::Cache;
use once_cell::sync::Lazy;
use std::net::IpAddr;
use std::rc::Rc;
use std::time::Duration;
use tracing::warn;

use crate::models::principals::entities::Principal;
use crate::models::{ApiResponse, ErrorCode};

/// 键: 前缀:身份:窗口序号，值: 窗口内请求数
static RATE_LIMIT_CACHE: Lazy<Cache<String, u32>> = Lazy::new(|| {
    Cache::builder()
        .time_to_live(Duration::from_secs(3600))
        .max_capacity(100_000)
        .build()
});

#[derive(Clone)]
pub struct RateLimit {
    max_requests: u32,
    window_secs: u64,
    key_prefix: String,
}

impl RateLimit {
    pub fn new(max_requests: u32, window_secs: u64) -> Self {
        Self {
            max_requests,
            window_secs: window_secs.max(1),
            key_prefix: String::new(),
        }
    }

    pub fn with_prefix(mut self, prefix: &str) -> Self {
        self.key_prefix = prefix.to_string();
        self
    }

    /// 登录：5 次/分钟/IP
    pub fn login() -> Self {
        Self::new(5, 60).with_prefix("login")
    }

    /// 刷新令牌：10 次/分钟/IP
    pub fn refresh_token() -> Self {
        Self::new(10, 60).with_prefix("refresh")
    }

    /// 成绩录入：60 次/分钟/账号
    pub fn grade_submission() -> Self {
        Self::new(60, 60).with_prefix("grades")
    }

    fn window_index(&self, now_secs: u64) -> u64 {
        now_secs / self.window_secs
    }

    fn cache_key(&self, identity: &str, now_secs: u64) -> String {
        let window = self.window_index(now_secs);
        if self.key_prefix.is_empty() {
            format!("{identity}:{window}")
        } else {
            format!("{}:{identity}:{window}", self.key_prefix)
        }
    }
}

fn is_valid_ip(ip: &str) -> bool {
    ip.parse::<IpAddr>().is_ok()
}

/// 客户端 IP
///
/// 部署在反向代理之后时，代理需要正确设置 X-Forwarded-For / X-Real-IP。
fn extract_client_ip(req: &ServiceRequest) -> String {
    let connection_ip = req
        .connection_info()
        .realip_remote_addr()
        .map(|s| s.to_string());

    if let Some(ref ip) = connection_ip
        && is_valid_ip(ip)
    {
        return ip.clone();
    }

    let forwarded = req
        .headers()
        .get("X-Forwarded-For")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next());
    let real_ip = req.headers().get("X-Real-IP").and_then(|v| v.to_str().ok());

    for candidate in [forwarded, real_ip].into_iter().flatten() {
        let candidate = candidate.trim();
        if is_valid_ip(candidate) {
            return candidate.to_string();
        }
    }

    connection_ip.unwrap_or_else(|| "unknown".to_string())
}

fn identity(req: &ServiceRequest) -> String {
    // 取连接信息需要可变借用扩展，先释放这里的借用
    let account = req
        .extensions()
        .get::<Principal>()
        .map(|principal| format!("{}:{}", principal.role(), principal.id()));
    account.unwrap_or_else(|| format!("ip:{}", extract_client_ip(req)))
}

fn create_rate_limit_response(retry_after: u64) -> HttpResponse {
    HttpResponse::build(StatusCode::TOO_MANY_REQUESTS)
        .insert_header((CONTENT_TYPE, "application/json; charset=utf-8"))
        .insert_header(("Retry-After", retry_after.to_string()))
        .insert_header(("X-RateLimit-Remaining", "0"))
        .json(ApiResponse::<()>::error_empty(
            ErrorCode::RateLimitExceeded,
            "Too many requests, please try again later",
        ))
}

impl<S, B> Transform<S, ServiceRequest> for RateLimit
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = RateLimitMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RateLimitMiddleware {
            service: Rc::new(service),
            limit: self.clone(),
        }))
    }
}

pub struct RateLimitMiddleware<S> {
    service: Rc<S>,
    limit: RateLimit,
}

impl<S, B> Service<ServiceRequest> for RateLimitMiddleware<S>
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
        let limit = self.limit.clone();

        Box::pin(async move {
            let now = chrono::Utc::now().timestamp().max(0) as u64;
            let cache_key = limit.cache_key(&identity(&req), now);

            let current = RATE_LIMIT_CACHE.get(&cache_key).await.unwrap_or(0);
            if current >= limit.max_requests {
                warn!(
                    "Rate limit exceeded for {} ({}/{})",
                    cache_key, current, limit.max_requests
                );
                let retry_after = limit.window_secs - now % limit.window_secs;
                return Ok(req.into_response(
                    create_rate_limit_response(retry_after).map_into_right_body(),
                ));
            }

            RATE_LIMIT_CACHE.insert(cache_key, current + 1).await;

            let res = srv.call(req).await?.map_into_left_body();
            Ok(res)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test::{TestRequest, call_service, init_service};
    use actix_web::{App, web};

    use crate::models::teachers::entities::Teacher;

    #[test]
    fn test_presets() {
        let login = RateLimit::login();
        assert_eq!(login.max_requests, 5);
        assert_eq!(login.window_secs, 60);
        assert_eq!(login.key_prefix, "login");

        assert_eq!(RateLimit::refresh_token().max_requests, 10);
        assert_eq!(RateLimit::new(1, 0).window_secs, 1);
    }

    #[test]
    fn test_key_rolls_over_with_window() {
        let limit = RateLimit::login();
        assert_eq!(limit.cache_key("ip:1.2.3.4", 119), "login:ip:1.2.3.4:1");
        assert_eq!(limit.cache_key("ip:1.2.3.4", 120), "login:ip:1.2.3.4:2");
    }

    #[actix_web::test]
    async fn test_requests_over_limit_are_rejected() {
        let app = init_service(
            App::new().service(
                web::resource("/limited")
                    .wrap(RateLimit::new(2, 3600).with_prefix("test-limited"))
                    .route(web::get().to(|| async { HttpResponse::Ok().finish() })),
            ),
        )
        .await;

        let mut statuses = Vec::new();
        for _ in 0..3 {
            let req = TestRequest::get()
                .uri("/limited")
                .peer_addr("10.1.2.3:5000".parse().expect("addr"))
                .to_request();
            statuses.push(call_service(&app, req).await.status());
        }

        assert_eq!(
            statuses,
            [StatusCode::OK, StatusCode::OK, StatusCode::TOO_MANY_REQUESTS]
        );
    }

    #[actix_web::test]
    async fn test_accounts_and_anonymous_callers_are_counted_apart() {
        let teacher = Principal::Teacher(Teacher {
            id: 7,
            login_id: "100007".to_string(),
            first_name: "Anna".to_string(),
            last_name: "Petrova".to_string(),
            subjects: Vec::new(),
            classes: Vec::new(),
        });
        // 前置中间件代替 RequireJWT，带 X-Account 头的请求注入账号
        let app = init_service(
            App::new().service(
                web::resource("/mixed")
                    .wrap(RateLimit::new(1, 3600).with_prefix("test-mixed"))
                    .wrap_fn(move |req, srv| {
                        if req.headers().contains_key("X-Account") {
                            req.extensions_mut().insert(teacher.clone());
                        }
                        srv.call(req)
                    })
                    .route(web::get().to(|| async { HttpResponse::Ok().finish() })),
            ),
        )
        .await;

        let call = |account: bool| {
            let mut req = TestRequest::get()
                .uri("/mixed")
                .peer_addr("10.9.8.7:5000".parse().expect("addr"));
            if account {
                req = req.insert_header(("X-Account", "1"));
            }
            req.to_request()
        };

        assert_eq!(call_service(&app, call(false)).await.status(), StatusCode::OK);
        assert_eq!(call_service(&app, call(true)).await.status(), StatusCode::OK);
        assert_eq!(
            call_service(&app, call(true)).await.status(),
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(
            call_service(&app, call(false)).await.status(),
            StatusCode::TOO_MANY_REQUESTS
        );
    }
}
