// studyroom-backend/src/middleware/rate_limit.rs

use crate::error::{AppError, AppResult};
use async_trait::async_trait;
use std::{
    collections::HashMap,
    sync::Arc,
    time::{Duration, Instant},
};
use tokio::sync::Mutex;

/// レート制限の設定（固定ウィンドウ）
#[derive(Debug, Clone, Copy)]
pub struct RateLimitQuota {
    pub max_requests: u32,
    pub window: Duration,
}

impl RateLimitQuota {
    pub const fn new(max_requests: u32, window: Duration) -> Self {
        Self {
            max_requests,
            window,
        }
    }
}

/// 識別子ごとのウィンドウ状態
#[derive(Debug, Clone, Copy)]
pub struct WindowEntry {
    pub count: u32,
    pub reset_at: Instant,
}

/// レート制限カウンタの保存先
///
/// プロセス内マップを差し替え可能にするための seam。水平スケール時に
/// 共有カウンタ（Redis等）へ置き換える場合も呼び出し側は変わらない。
/// プロセス内実装では実効上限がインスタンス数倍になる点は許容済みの制約。
#[async_trait]
pub trait RateLimitStore: Send + Sync {
    async fn get(&self, key: &str) -> Option<WindowEntry>;
    async fn set(&self, key: &str, entry: WindowEntry);
    async fn delete(&self, key: &str);
    /// 期限切れエントリを削除してメモリ使用量を抑える
    async fn purge_expired(&self, now: Instant);
}

/// プロセス内のHashMap実装
#[derive(Default)]
pub struct InMemoryRateLimitStore {
    entries: Mutex<HashMap<String, WindowEntry>>,
}

impl InMemoryRateLimitStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RateLimitStore for InMemoryRateLimitStore {
    async fn get(&self, key: &str) -> Option<WindowEntry> {
        self.entries.lock().await.get(key).copied()
    }

    async fn set(&self, key: &str, entry: WindowEntry) {
        self.entries.lock().await.insert(key.to_string(), entry);
    }

    async fn delete(&self, key: &str) {
        self.entries.lock().await.remove(key);
    }

    async fn purge_expired(&self, now: Instant) {
        self.entries.lock().await.retain(|_, entry| entry.reset_at > now);
    }
}

/// レート制限の判定結果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitDecision {
    pub allowed: bool,
    pub remaining: u32,
    pub retry_after_secs: u64,
}

/// 固定ウィンドウ方式のレートリミッター
pub struct RateLimiter {
    store: Arc<dyn RateLimitStore>,
}

impl RateLimiter {
    pub fn new(store: Arc<dyn RateLimitStore>) -> Self {
        Self { store }
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(InMemoryRateLimitStore::new()))
    }

    /// 識別子に対するリクエストを1件計上し、許可するかを判定
    pub async fn check(&self, identifier: &str, quota: RateLimitQuota) -> RateLimitDecision {
        self.check_at(identifier, quota, Instant::now()).await
    }

    async fn check_at(
        &self,
        identifier: &str,
        quota: RateLimitQuota,
        now: Instant,
    ) -> RateLimitDecision {
        let current = self.store.get(identifier).await;

        // エントリがない、またはウィンドウが終了していればリセットして許可
        let entry = match current {
            Some(entry) if now < entry.reset_at => entry,
            _ => {
                let entry = WindowEntry {
                    count: 1,
                    reset_at: now + quota.window,
                };
                self.store.set(identifier, entry).await;
                return RateLimitDecision {
                    allowed: true,
                    remaining: quota.max_requests.saturating_sub(1),
                    retry_after_secs: 0,
                };
            }
        };

        if entry.count >= quota.max_requests {
            let retry_after_secs =
                (entry.reset_at - now).as_secs_f64().ceil().max(1.0) as u64;
            return RateLimitDecision {
                allowed: false,
                remaining: 0,
                retry_after_secs,
            };
        }

        let updated = WindowEntry {
            count: entry.count + 1,
            reset_at: entry.reset_at,
        };
        self.store.set(identifier, updated).await;

        RateLimitDecision {
            allowed: true,
            remaining: quota.max_requests.saturating_sub(updated.count),
            retry_after_secs: 0,
        }
    }

    /// 許可されなければ 429 相当のエラーを返すヘルパー
    pub async fn ensure(&self, identifier: &str, quota: RateLimitQuota) -> AppResult<()> {
        let decision = self.check(identifier, quota).await;

        if !decision.allowed {
            return Err(AppError::TooManyRequests {
                message: "Too many requests. Please try again later.".to_string(),
                retry_after_secs: decision.retry_after_secs,
            });
        }

        Ok(())
    }

    /// 期限切れエントリを定期的に掃除するタスクを起動
    pub fn spawn_cleanup_task(&self, interval: Duration) -> tokio::task::JoinHandle<()> {
        let store = self.store.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                ticker.tick().await;
                store.purge_expired(Instant::now()).await;
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quota(max_requests: u32, window_secs: u64) -> RateLimitQuota {
        RateLimitQuota::new(max_requests, Duration::from_secs(window_secs))
    }

    #[tokio::test]
    async fn test_requests_within_limit_are_allowed() {
        let limiter = RateLimiter::in_memory();
        let q = quota(5, 3600);

        for i in 0..5 {
            let decision = limiter.check("user@example.com", q).await;
            assert!(decision.allowed, "request {} should be allowed", i + 1);
        }
    }

    #[tokio::test]
    async fn test_sixth_request_is_denied_with_retry_after() {
        let limiter = RateLimiter::in_memory();
        let q = quota(5, 3600);

        for _ in 0..5 {
            assert!(limiter.check("user@example.com", q).await.allowed);
        }

        let denied = limiter.check("user@example.com", q).await;
        assert!(!denied.allowed);
        assert!(denied.retry_after_secs > 0);
        assert!(denied.retry_after_secs <= 3600);
    }

    #[tokio::test]
    async fn test_window_reset_allows_again() {
        let limiter = RateLimiter::in_memory();
        let q = quota(5, 3600);
        let start = Instant::now();

        for _ in 0..5 {
            assert!(limiter.check_at("id", q, start).await.allowed);
        }
        assert!(!limiter.check_at("id", q, start).await.allowed);

        // ウィンドウ経過をシミュレートするとカウンタがリセットされる
        let after_window = start + Duration::from_secs(3600);
        for _ in 0..5 {
            assert!(limiter.check_at("id", q, after_window).await.allowed);
        }
        assert!(!limiter.check_at("id", q, after_window).await.allowed);
    }

    #[tokio::test]
    async fn test_identifiers_are_independent() {
        let limiter = RateLimiter::in_memory();
        let q = quota(1, 3600);

        assert!(limiter.check("alice@example.com", q).await.allowed);
        assert!(!limiter.check("alice@example.com", q).await.allowed);
        assert!(limiter.check("bob@example.com", q).await.allowed);
    }

    #[tokio::test]
    async fn test_ensure_maps_to_too_many_requests() {
        let limiter = RateLimiter::in_memory();
        let q = quota(1, 3600);

        assert!(limiter.ensure("id", q).await.is_ok());
        match limiter.ensure("id", q).await {
            Err(AppError::TooManyRequests {
                retry_after_secs, ..
            }) => {
                assert!(retry_after_secs > 0);
            }
            other => panic!("expected TooManyRequests, got {:?}", other.map(|_| ())),
        }
    }

    #[tokio::test]
    async fn test_purge_expired_drops_old_entries() {
        let store = Arc::new(InMemoryRateLimitStore::new());
        let limiter = RateLimiter::new(store.clone());
        let q = quota(5, 1);
        let start = Instant::now();

        limiter.check_at("stale", q, start).await;
        store.purge_expired(start + Duration::from_secs(2)).await;

        assert!(store.get("stale").await.is_none());
    }
}
