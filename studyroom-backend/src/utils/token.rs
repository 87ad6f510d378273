// studyroom-backend/src/utils/token.rs

use rand::Rng;
use sha2::{Digest, Sha256};

/// 推測不可能なランダムトークンを生成（共有キー・認証トークン用）
pub fn generate_secure_token(length: usize) -> String {
    const CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";
    let mut rng = rand::thread_rng();

    (0..length)
        .map(|_| {
            let idx = rng.gen_range(0..CHARSET.len());
            CHARSET[idx] as char
        })
        .collect()
}

/// トークンを保存用にハッシュ化（SHA-256 の16進表現）
///
/// 生のトークン値はDBに置かない。照合は受け取った値を再ハッシュして行う。
pub fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_secure_token() {
        let token = generate_secure_token(32);
        assert_eq!(token.len(), 32);
        assert!(token.chars().all(|c| c.is_ascii_alphanumeric()));

        // 生成されたトークンが異なることを確認
        let token2 = generate_secure_token(32);
        assert_ne!(token, token2);
    }

    #[test]
    fn test_hash_token_is_deterministic() {
        let hash1 = hash_token("some-token");
        let hash2 = hash_token("some-token");
        assert_eq!(hash1, hash2);
        assert_eq!(hash1.len(), 64);
        assert_ne!(hash_token("other-token"), hash1);
    }
}
