// studyroom-backend/src/utils/capability.rs

use chrono::{DateTime, Duration, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::env;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

/// 共有リンクのパスワード検証済み状態を表すケーパビリティトークン
///
/// `{有効期限unix秒}.{HMAC-SHA256(share_key:有効期限)}` の形式。Cookieの存在では
/// なく値そのものをサーバー側で検証するため、偽造・期限延長はできない。
#[derive(Error, Debug)]
pub enum CapabilityError {
    #[error("Missing capability secret key")]
    MissingSecretKey,

    #[error("Capability secret key too short")]
    WeakSecretKey,
}

pub struct ShareCapabilityManager {
    secret: Vec<u8>,
    validity: Duration,
}

impl ShareCapabilityManager {
    /// パスワード検証Cookieの有効期間（1時間固定）
    pub const VALIDITY_HOURS: i64 = 1;

    pub fn new(secret: &str) -> Result<Self, CapabilityError> {
        if secret.len() < 32 {
            return Err(CapabilityError::WeakSecretKey);
        }

        Ok(Self {
            secret: secret.as_bytes().to_vec(),
            validity: Duration::hours(Self::VALIDITY_HOURS),
        })
    }

    pub fn from_env() -> Result<Self, CapabilityError> {
        let secret =
            env::var("SHARE_CAPABILITY_SECRET").map_err(|_| CapabilityError::MissingSecretKey)?;
        Self::new(&secret)
    }

    /// 共有キーに対するケーパビリティトークンを発行
    pub fn issue(&self, share_key: &str) -> String {
        self.issue_at(share_key, Utc::now())
    }

    fn issue_at(&self, share_key: &str, now: DateTime<Utc>) -> String {
        let expires_at = (now + self.validity).timestamp();
        let mac = self.compute_mac(share_key, expires_at);
        format!("{}.{}", expires_at, hex::encode(mac))
    }

    /// トークンを検証（改竄・期限切れは false）
    pub fn verify(&self, share_key: &str, token: &str) -> bool {
        self.verify_at(share_key, token, Utc::now())
    }

    fn verify_at(&self, share_key: &str, token: &str, now: DateTime<Utc>) -> bool {
        let Some((expires_part, mac_part)) = token.split_once('.') else {
            return false;
        };

        let Ok(expires_at) = expires_part.parse::<i64>() else {
            return false;
        };

        if now.timestamp() > expires_at {
            return false;
        }

        let Ok(presented_mac) = hex::decode(mac_part) else {
            return false;
        };

        let mut mac = HmacSha256::new_from_slice(&self.secret)
            .expect("HMAC accepts keys of any length");
        mac.update(format!("{}:{}", share_key, expires_at).as_bytes());
        mac.verify_slice(&presented_mac).is_ok()
    }

    fn compute_mac(&self, share_key: &str, expires_at: i64) -> Vec<u8> {
        let mut mac = HmacSha256::new_from_slice(&self.secret)
            .expect("HMAC accepts keys of any length");
        mac.update(format!("{}:{}", share_key, expires_at).as_bytes());
        mac.finalize().into_bytes().to_vec()
    }
}

/// 共有キーから決定的にCookie名を導出
pub fn capability_cookie_name(share_key: &str) -> String {
    format!("share_access_{}", share_key)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_manager() -> ShareCapabilityManager {
        ShareCapabilityManager::new("capability-secret-key-for-tests-0123456789").unwrap()
    }

    #[test]
    fn test_issue_and_verify_roundtrip() {
        let manager = test_manager();
        let token = manager.issue("abcDEF123");
        assert!(manager.verify("abcDEF123", &token));
    }

    #[test]
    fn test_token_is_bound_to_share_key() {
        let manager = test_manager();
        let token = manager.issue("share-one");
        assert!(!manager.verify("share-two", &token));
    }

    #[test]
    fn test_expired_token_is_rejected() {
        let manager = test_manager();
        let issued_two_hours_ago = Utc::now() - Duration::hours(2);
        let token = manager.issue_at("abcDEF123", issued_two_hours_ago);
        assert!(!manager.verify("abcDEF123", &token));
    }

    #[test]
    fn test_tampered_expiry_is_rejected() {
        let manager = test_manager();
        let token = manager.issue("abcDEF123");
        let (_, mac) = token.split_once('.').unwrap();

        // 期限を10年先に書き換えてもMACが一致しない
        let forged = format!("{}.{}", (Utc::now() + Duration::days(3650)).timestamp(), mac);
        assert!(!manager.verify("abcDEF123", &forged));
    }

    #[test]
    fn test_garbage_tokens_are_rejected() {
        let manager = test_manager();
        assert!(!manager.verify("abcDEF123", ""));
        assert!(!manager.verify("abcDEF123", "not-a-token"));
        assert!(!manager.verify("abcDEF123", "12345.zzzz"));
    }

    #[test]
    fn test_weak_secret_is_rejected() {
        assert!(ShareCapabilityManager::new("short").is_err());
    }

    #[test]
    fn test_cookie_name_derivation() {
        assert_eq!(
            capability_cookie_name("abcDEF123"),
            "share_access_abcDEF123"
        );
    }
}
