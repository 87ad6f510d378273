// studyroom-backend/src/utils/jwt.rs

use crate::domain::user_model::UserClaims;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::env;
use thiserror::Error;
use uuid::Uuid;

/// JWT関連のエラー
#[derive(Error, Debug)]
pub enum JwtError {
    #[error("Failed to encode JWT: {0}")]
    EncodingError(#[from] jsonwebtoken::errors::Error),

    #[error("Failed to decode JWT: {0}")]
    DecodingError(String),

    #[error("JWT token has expired")]
    TokenExpired,

    #[error("Missing JWT secret key")]
    MissingSecretKey,

    #[error("Invalid JWT configuration: {0}")]
    ConfigurationError(String),
}

/// アクセストークンのClaims
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AccessTokenClaims {
    /// Subject (user ID)
    pub sub: String,
    /// Issued at
    pub iat: i64,
    /// Expiration time
    pub exp: i64,
    /// Issuer
    pub iss: String,
    /// Audience
    pub aud: String,
    /// JWT ID
    pub jti: String,
    /// User information
    pub user: UserClaims,
}

/// JWT設定
#[derive(Debug, Clone)]
pub struct JwtConfig {
    /// JWT秘密鍵
    pub secret_key: String,
    /// アクセストークンの有効期限（分）
    pub access_token_expiry_minutes: i64,
    /// 発行者
    pub issuer: String,
    /// 対象者
    pub audience: String,
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self {
            secret_key: "your-secret-key".to_string(), // 本番では絶対に変更すること
            access_token_expiry_minutes: 60,
            issuer: "studyroom-backend".to_string(),
            audience: "studyroom-users".to_string(),
        }
    }
}

impl JwtConfig {
    /// 環境変数から設定を読み込み
    pub fn from_env() -> Result<Self, JwtError> {
        let secret_key = env::var("JWT_SECRET_KEY").map_err(|_| JwtError::MissingSecretKey)?;

        let access_token_expiry_minutes = env::var("JWT_ACCESS_TOKEN_EXPIRY_MINUTES")
            .unwrap_or_else(|_| "60".to_string())
            .parse()
            .map_err(|_| JwtError::ConfigurationError("Invalid access token expiry".to_string()))?;

        let issuer = env::var("JWT_ISSUER").unwrap_or_else(|_| "studyroom-backend".to_string());

        let audience =
            env::var("JWT_AUDIENCE").unwrap_or_else(|_| "studyroom-users".to_string());

        Ok(Self {
            secret_key,
            access_token_expiry_minutes,
            issuer,
            audience,
        })
    }

    /// 設定の検証
    pub fn validate(&self) -> Result<(), JwtError> {
        if self.secret_key.len() < 32 {
            return Err(JwtError::ConfigurationError(
                "JWT secret key must be at least 32 characters".to_string(),
            ));
        }

        if self.access_token_expiry_minutes <= 0 {
            return Err(JwtError::ConfigurationError(
                "Access token expiry must be positive".to_string(),
            ));
        }

        Ok(())
    }
}

/// JWTマネージャー
pub struct JwtManager {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    config: JwtConfig,
}

impl JwtManager {
    pub fn new(config: JwtConfig) -> Result<Self, JwtError> {
        config.validate()?;

        Ok(Self {
            encoding_key: EncodingKey::from_secret(config.secret_key.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.secret_key.as_bytes()),
            config,
        })
    }

    pub fn from_env() -> Result<Self, JwtError> {
        Self::new(JwtConfig::from_env()?)
    }

    /// アクセストークンを生成
    pub fn generate_access_token(&self, user: UserClaims) -> Result<String, JwtError> {
        let now = Utc::now();
        let expiry = now + Duration::minutes(self.config.access_token_expiry_minutes);

        let claims = AccessTokenClaims {
            sub: user.user_id.to_string(),
            iat: now.timestamp(),
            exp: expiry.timestamp(),
            iss: self.config.issuer.clone(),
            aud: self.config.audience.clone(),
            jti: Uuid::new_v4().to_string(),
            user,
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(JwtError::EncodingError)
    }

    /// アクセストークンを検証
    pub fn verify_access_token(&self, token: &str) -> Result<AccessTokenClaims, JwtError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[&self.config.issuer]);
        validation.set_audience(&[&self.config.audience]);

        decode::<AccessTokenClaims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => JwtError::TokenExpired,
                _ => JwtError::DecodingError(e.to_string()),
            })
    }

    pub fn access_token_expiry_minutes(&self) -> i64 {
        self.config.access_token_expiry_minutes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::role::RoleName;

    fn create_test_config() -> JwtConfig {
        JwtConfig {
            secret_key: "test-secret-key-with-at-least-32-chars".to_string(),
            access_token_expiry_minutes: 60,
            issuer: "studyroom-backend".to_string(),
            audience: "studyroom-users".to_string(),
        }
    }

    fn create_test_user_claims() -> UserClaims {
        UserClaims {
            user_id: Uuid::new_v4(),
            email: "user@example.com".to_string(),
            role: RoleName::PlatformUser.as_str().to_string(),
            additional_roles: vec![],
        }
    }

    #[test]
    fn test_jwt_generation_and_verification() {
        let manager = JwtManager::new(create_test_config()).unwrap();
        let user = create_test_user_claims();

        let token = manager.generate_access_token(user.clone()).unwrap();
        let claims = manager.verify_access_token(&token).unwrap();

        assert_eq!(claims.user.user_id, user.user_id);
        assert_eq!(claims.user.email, user.email);
        assert_eq!(claims.iss, "studyroom-backend");
    }

    #[test]
    fn test_tampered_token_is_rejected(){
        let manager = JwtManager::new(create_test_config()).unwrap();
        let token = manager
            .generate_access_token(create_test_user_claims())
            .unwrap();

        let mut tampered = token.clone();
        tampered.push('x');
        assert!(manager.verify_access_token(&tampered).is_err());
    }

    #[test]
    fn test_short_secret_key_is_rejected() {
        let config = JwtConfig {
            secret_key: "short".to_string(),
            ..create_test_config()
        };
        assert!(JwtManager::new(config).is_err());
    }
}
