use crate::config::AppConfig;
use crate::models::principals::entities::Role;
use actix_web::cookie::{Cookie, SameSite};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

pub const ACCESS_TOKEN: &str = "access";
pub const REFRESH_TOKEN: &str = "refresh";
const REFRESH_COOKIE: &str = "refresh_token";

// JWT Claims 结构体
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,        // 账号主键
    pub role: Role,         // 账号角色，决定 sub 指向哪张表
    pub token_type: String, // "access" 或 "refresh"
    pub exp: usize,         // 过期时间戳
    pub iat: usize,         // 签发时间戳
}

impl Claims {
    pub fn principal_id(&self) -> Option<i64> {
        self.sub.parse().ok()
    }
}

// Token 对
#[derive(Debug, Serialize, Deserialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

pub struct JwtUtils;

impl JwtUtils {
    fn get_secret() -> String {
        AppConfig::get().jwt.secret.clone()
    }

    // 生成 Access Token
    pub fn generate_access_token(
        principal_id: i64,
        role: Role,
    ) -> Result<String, jsonwebtoken::errors::Error> {
        let config = AppConfig::get();
        Self::encode_token(
            &config.jwt.secret,
            principal_id,
            role,
            ACCESS_TOKEN,
            chrono::Duration::minutes(config.jwt.access_token_expiry),
        )
    }

    // 生成 Refresh Token
    pub fn generate_refresh_token(
        principal_id: i64,
        role: Role,
    ) -> Result<String, jsonwebtoken::errors::Error> {
        let config = AppConfig::get();
        Self::encode_token(
            &config.jwt.secret,
            principal_id,
            role,
            REFRESH_TOKEN,
            chrono::Duration::days(config.jwt.refresh_token_expiry),
        )
    }

    pub fn encode_token(
        secret: &str,
        principal_id: i64,
        role: Role,
        token_type: &str,
        expiry_duration: chrono::Duration,
    ) -> Result<String, jsonwebtoken::errors::Error> {
        let now = chrono::Utc::now();
        let expiration = now + expiry_duration;

        let claims = Claims {
            sub: principal_id.to_string(),
            role,
            token_type: token_type.to_string(),
            exp: expiration.timestamp() as usize,
            iat: now.timestamp() as usize,
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(secret.as_ref()),
        )
    }

    pub fn generate_token_pair(
        principal_id: i64,
        role: Role,
    ) -> Result<TokenPair, jsonwebtoken::errors::Error> {
        Ok(TokenPair {
            access_token: Self::generate_access_token(principal_id, role)?,
            refresh_token: Self::generate_refresh_token(principal_id, role)?,
        })
    }

    /// 校验签名、有效期和 token 类型
    pub fn decode_token(
        secret: &str,
        token: &str,
        expected_type: &str,
    ) -> Result<Claims, jsonwebtoken::errors::Error> {
        let claims = decode::<Claims>(
            token,
            &DecodingKey::from_secret(secret.as_ref()),
            &Validation::default(),
        )
        .map(|token_data| token_data.claims)?;

        if claims.token_type != expected_type {
            return Err(jsonwebtoken::errors::Error::from(
                jsonwebtoken::errors::ErrorKind::InvalidToken,
            ));
        }
        Ok(claims)
    }

    // 验证 Access Token
    pub fn verify_access_token(token: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
        Self::decode_token(&Self::get_secret(), token, ACCESS_TOKEN)
    }

    // 验证 Refresh Token
    pub fn verify_refresh_token(token: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
        Self::decode_token(&Self::get_secret(), token, REFRESH_TOKEN)
    }

    // 使用 Refresh Token 生成新的 Access Token
    pub fn refresh_access_token(
        refresh_token: &str,
    ) -> Result<String, jsonwebtoken::errors::Error> {
        let claims = Self::verify_refresh_token(refresh_token)?;
        let principal_id = claims
            .principal_id()
            .ok_or(jsonwebtoken::errors::ErrorKind::InvalidToken)?;
        Self::generate_access_token(principal_id, claims.role)
    }

    /// 创建 Refresh Token Cookie
    pub fn create_refresh_token_cookie(refresh_token: &str) -> Cookie<'static> {
        let config = AppConfig::get();
        Cookie::build(REFRESH_COOKIE, refresh_token.to_string())
            .path("/")
            .max_age(actix_web::cookie::time::Duration::days(
                config.jwt.refresh_token_expiry,
            ))
            .same_site(SameSite::Strict)
            .http_only(true)
            .secure(config.is_production())
            .finish()
    }

    /// 创建空的 Refresh Token Cookie（用于注销）
    pub fn create_empty_refresh_token_cookie() -> Cookie<'static> {
        let config = AppConfig::get();
        Cookie::build(REFRESH_COOKIE, "")
            .path("/")
            .max_age(actix_web::cookie::time::Duration::seconds(0))
            .same_site(SameSite::Strict)
            .http_only(true)
            .secure(config.is_production())
            .finish()
    }

    pub fn extract_refresh_token_from_cookie(req: &actix_web::HttpRequest) -> Option<String> {
        req.cookie(REFRESH_COOKIE)
            .map(|cookie| cookie.value().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret";

    #[test]
    fn test_token_carries_role_and_id() {
        let token = JwtUtils::encode_token(
            SECRET,
            42,
            Role::Teacher,
            ACCESS_TOKEN,
            chrono::Duration::minutes(5),
        )
        .expect("encode");

        let claims = JwtUtils::decode_token(SECRET, &token, ACCESS_TOKEN).expect("decode");
        assert_eq!(claims.role, Role::Teacher);
        assert_eq!(claims.principal_id(), Some(42));
    }

    #[test]
    fn test_token_type_is_enforced() {
        let token = JwtUtils::encode_token(
            SECRET,
            7,
            Role::Parent,
            REFRESH_TOKEN,
            chrono::Duration::days(1),
        )
        .expect("encode");

        assert!(JwtUtils::decode_token(SECRET, &token, ACCESS_TOKEN).is_err());
        assert!(JwtUtils::decode_token("other-secret", &token, REFRESH_TOKEN).is_err());
    }
}
