/*!
 * 角色访问控制中间件
 *
 * 必须放在 RequireJWT 之内（即先 `.wrap(RequireRole)` 再 `.wrap(RequireJWT)`），
 * 依赖请求扩展中的 [`Principal`]。
 *
 * ```rust,ignore
 * web::scope("/teachers/me")
 *     .wrap(RequireRole::new(Role::Teacher))
 *     .wrap(RequireJWT)
 * ```
 */

use actix_service::{Service, Transform};
use actix_web::{
    Error, HttpMessage,
    body::EitherBody,
    dev::{ServiceRequest, ServiceResponse},
    http::StatusCode,
};
use futures_util::future::{LocalBoxFuture, Ready, ready};
use std::rc::Rc;
use tracing::info;

use super::create_error_response;
use crate::models::ErrorCode;
use crate::models::principals::entities::{Principal, Role};

#[derive(Clone)]
pub struct RequireRole {
    allowed: Vec<Role>,
}

impl RequireRole {
    pub fn new(role: Role) -> Self {
        Self {
            allowed: vec![role],
        }
    }

    /// 任一角色即可
    pub fn new_any(roles: &[Role]) -> Self {
        Self {
            allowed: roles.to_vec(),
        }
    }

    fn permits(allowed: &[Role], role: Role) -> bool {
        allowed.contains(&role)
    }
}

impl<S, B> Transform<S, ServiceRequest> for RequireRole
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = RequireRoleMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RequireRoleMiddleware {
            service: Rc::new(service),
            allowed: self.allowed.clone(),
        }))
    }
}

pub struct RequireRoleMiddleware<S> {
    service: Rc<S>,
    allowed: Vec<Role>,
}

impl<S, B> Service<ServiceRequest> for RequireRoleMiddleware<S>
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
        let allowed = self.allowed.clone();

        Box::pin(async move {
            let current = req
                .extensions()
                .get::<Principal>()
                .map(|p| (p.role(), p.login_id().to_string()));

            match current {
                Some((role, _)) if RequireRole::permits(&allowed, role) => {
                    let res = srv.call(req).await?.map_into_left_body();
                    Ok(res)
                }
                Some((role, login_id)) => {
                    info!(
                        "Access denied for {} ({}), allowed roles: {:?}",
                        login_id, role, allowed
                    );
                    Ok(req.into_response(
                        create_error_response(
                            StatusCode::FORBIDDEN,
                            ErrorCode::Forbidden,
                            "Access denied",
                        )
                        .map_into_right_body(),
                    ))
                }
                None => {
                    info!("Role check without an authenticated principal, is RequireJWT applied?");
                    Ok(req.into_response(
                        create_error_response(
                            StatusCode::UNAUTHORIZED,
                            ErrorCode::Unauthorized,
                            "Authentication required",
                        )
                        .map_into_right_body(),
                    ))
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test::{TestRequest, call_service, init_service};
    use actix_web::{App, HttpResponse, web};

    use crate::models::students::entities::Student;

    // 测试里用一个前置中间件代替 RequireJWT 注入账号
    async fn call_with(principal: Option<Principal>) -> StatusCode {
        let app = init_service(
            App::new().service(
                web::scope("/t")
                    .wrap(RequireRole::new(Role::Teacher))
                    .wrap_fn(move |req, srv| {
                        if let Some(p) = principal.clone() {
                            req.extensions_mut().insert(p);
                        }
                        srv.call(req)
                    })
                    .route("", web::get().to(|| async { HttpResponse::Ok().finish() })),
            ),
        )
        .await;

        let resp = call_service(&app, TestRequest::get().uri("/t").to_request()).await;
        resp.status()
    }

    #[actix_web::test]
    async fn test_wrong_role_is_forbidden() {
        let student = Principal::Student(Student {
            id: 1,
            login_id: "251234".to_string(),
            first_name: "Ivan".to_string(),
            last_name: "Ivanov".to_string(),
            class: None,
        });
        assert_eq!(call_with(Some(student)).await, StatusCode::FORBIDDEN);
        assert_eq!(call_with(None).await, StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn test_any_of_roles() {
        let allowed = [Role::Student, Role::Parent];
        assert!(RequireRole::permits(&allowed, Role::Parent));
        assert!(!RequireRole::permits(&allowed, Role::Teacher));
    }
}
