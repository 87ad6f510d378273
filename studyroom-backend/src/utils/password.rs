// studyroom-backend/src/utils/password.rs

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use std::env;
use thiserror::Error;

/// パスワード関連のエラー
#[derive(Error, Debug)]
pub enum PasswordError {
    #[error("Password hashing failed: {0}")]
    HashingError(#[from] argon2::password_hash::Error),

    #[error("Argon2 parameter error: {0}")]
    Argon2Error(#[from] argon2::Error),

    #[error("Weak password: {0}")]
    WeakPassword(String),

    #[error("Password configuration error: {0}")]
    ConfigurationError(String),
}

/// パスワード強度要件
#[derive(Debug, Clone)]
pub struct PasswordPolicy {
    /// 最小文字数
    pub min_length: usize,
    /// 最大文字数
    pub max_length: usize,
    /// 大文字が必要
    pub require_uppercase: bool,
    /// 小文字が必要
    pub require_lowercase: bool,
    /// 数字が必要
    pub require_digit: bool,
    /// 共通パスワードをチェック
    pub check_common_passwords: bool,
}

impl Default for PasswordPolicy {
    fn default() -> Self {
        Self {
            min_length: 8,
            max_length: 128,
            require_uppercase: true,
            require_lowercase: true,
            require_digit: true,
            check_common_passwords: true,
        }
    }
}

impl PasswordPolicy {
    /// 環境変数から設定を読み込み
    pub fn from_env() -> Self {
        let min_length = env::var("PASSWORD_MIN_LENGTH")
            .unwrap_or_else(|_| "8".to_string())
            .parse()
            .unwrap_or(8);

        let max_length = env::var("PASSWORD_MAX_LENGTH")
            .unwrap_or_else(|_| "128".to_string())
            .parse()
            .unwrap_or(128);

        let require_uppercase = env::var("PASSWORD_REQUIRE_UPPERCASE")
            .unwrap_or_else(|_| "true".to_string())
            .parse()
            .unwrap_or(true);

        let require_lowercase = env::var("PASSWORD_REQUIRE_LOWERCASE")
            .unwrap_or_else(|_| "true".to_string())
            .parse()
            .unwrap_or(true);

        let require_digit = env::var("PASSWORD_REQUIRE_DIGIT")
            .unwrap_or_else(|_| "true".to_string())
            .parse()
            .unwrap_or(true);

        let check_common_passwords = env::var("PASSWORD_CHECK_COMMON")
            .unwrap_or_else(|_| "true".to_string())
            .parse()
            .unwrap_or(true);

        Self {
            min_length,
            max_length,
            require_uppercase,
            require_lowercase,
            require_digit,
            check_common_passwords,
        }
    }

    /// パスワードポリシーを検証
    pub fn validate(&self) -> Result<(), PasswordError> {
        if self.min_length < 4 {
            return Err(PasswordError::ConfigurationError(
                "Minimum password length must be at least 4".to_string(),
            ));
        }

        if self.max_length < self.min_length {
            return Err(PasswordError::ConfigurationError(
                "Maximum password length must be greater than minimum".to_string(),
            ));
        }

        Ok(())
    }
}

/// パスワードハッシュマネージャー
pub struct PasswordManager {
    argon2: Argon2<'static>,
    policy: PasswordPolicy,
}

impl PasswordManager {
    /// 新しいPasswordManagerを作成
    pub fn new(policy: PasswordPolicy) -> Result<Self, PasswordError> {
        policy.validate()?;

        Ok(Self {
            argon2: Argon2::default(),
            policy,
        })
    }

    /// デフォルト設定でPasswordManagerを作成
    pub fn new_default() -> Result<Self, PasswordError> {
        Self::new(PasswordPolicy::default())
    }

    /// 環境変数から設定を読み込んでPasswordManagerを作成
    pub fn from_env() -> Result<Self, PasswordError> {
        Self::new(PasswordPolicy::from_env())
    }

    /// パスワードをハッシュ化
    pub fn hash_password(&self, password: &str) -> Result<String, PasswordError> {
        // パスワード強度チェック
        self.validate_password_strength(password)?;

        let salt = SaltString::generate(&mut OsRng);

        let password_hash = self
            .argon2
            .hash_password(password.as_bytes(), &salt)
            .map_err(PasswordError::HashingError)?;

        Ok(password_hash.to_string())
    }

    /// 強度チェックなしでハッシュ化（共有リンクのパスワード用）
    ///
    /// 共有リンクのパスワードは作成者が相手へ口頭やメールで伝える合言葉であり、
    /// アカウントパスワードの強度要件は課さない。
    pub fn hash_share_password(&self, password: &str) -> Result<String, PasswordError> {
        let salt = SaltString::generate(&mut OsRng);

        let password_hash = self
            .argon2
            .hash_password(password.as_bytes(), &salt)
            .map_err(PasswordError::HashingError)?;

        Ok(password_hash.to_string())
    }

    /// パスワードを検証
    pub fn verify_password(&self, password: &str, hash: &str) -> Result<bool, PasswordError> {
        let parsed_hash = PasswordHash::new(hash).map_err(PasswordError::HashingError)?;

        match self
            .argon2
            .verify_password(password.as_bytes(), &parsed_hash)
        {
            Ok(()) => Ok(true),
            Err(argon2::password_hash::Error::Password) => Ok(false),
            Err(e) => Err(PasswordError::HashingError(e)),
        }
    }

    /// パスワード強度をチェック
    pub fn validate_password_strength(&self, password: &str) -> Result<(), PasswordError> {
        let mut errors = Vec::new();

        if password.len() < self.policy.min_length {
            errors.push(format!(
                "Password must be at least {} characters long",
                self.policy.min_length
            ));
        }

        if password.len() > self.policy.max_length {
            errors.push(format!(
                "Password must be no more than {} characters long",
                self.policy.max_length
            ));
        }

        if self.policy.require_uppercase && !password.chars().any(|c| c.is_uppercase()) {
            errors.push("Password must contain at least one uppercase letter".to_string());
        }

        if self.policy.require_lowercase && !password.chars().any(|c| c.is_lowercase()) {
            errors.push("Password must contain at least one lowercase letter".to_string());
        }

        if self.policy.require_digit && !password.chars().any(|c| c.is_ascii_digit()) {
            errors.push("Password must contain at least one digit".to_string());
        }

        if self.policy.check_common_passwords && is_common_password(password) {
            errors.push(
                "This password is too common. Please choose a different password".to_string(),
            );
        }

        if !errors.is_empty() {
            return Err(PasswordError::WeakPassword(errors.join("; ")));
        }

        Ok(())
    }
}

/// 共通パスワードかどうかをチェック
fn is_common_password(password: &str) -> bool {
    const COMMON_PASSWORDS: &[&str] = &[
        "password",
        "123456",
        "123456789",
        "12345678",
        "qwerty",
        "abc123",
        "password123",
        "admin",
        "letmein",
        "welcome",
        "monkey",
        "dragon",
        "111111",
        "iloveyou",
        "sunshine",
        "princess",
    ];

    let lower_password = password.to_lowercase();
    COMMON_PASSWORDS
        .iter()
        .any(|&common| lower_password.contains(common))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_password_hashing_and_verification() {
        let manager = PasswordManager::new_default().unwrap();
        let password = "MyUniqueP@ssw0rd91";

        let hash = manager.hash_password(password).unwrap();
        assert!(!hash.is_empty());

        assert!(manager.verify_password(password, &hash).unwrap());
        assert!(!manager.verify_password("WrongPassword", &hash).unwrap());
    }

    #[test]
    fn test_password_strength_validation() {
        let manager = PasswordManager::new_default().unwrap();

        // 強いパスワード
        assert!(manager
            .validate_password_strength("MyUniqueP@ssw0rd91")
            .is_ok());

        // 弱いパスワード
        assert!(manager.validate_password_strength("123").is_err());
        assert!(manager.validate_password_strength("password").is_err());
        assert!(manager.validate_password_strength("PASSWORD1").is_err());
        assert!(manager.validate_password_strength("12345678").is_err());
    }

    #[test]
    fn test_share_password_skips_strength_check() {
        let manager = PasswordManager::new_default().unwrap();

        // 共有リンク用の合言葉は短くても良い
        let hash = manager.hash_share_password("himitsu").unwrap();
        assert!(manager.verify_password("himitsu", &hash).unwrap());
    }

    #[test]
    fn test_common_password_detection() {
        assert!(is_common_password("password"));
        assert!(is_common_password("Password123"));
        assert!(is_common_password("123456"));
        assert!(!is_common_password("MyUniqueP@ssw0rd"));
    }
}
