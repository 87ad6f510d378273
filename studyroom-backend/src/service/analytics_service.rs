// studyroom-backend/src/service/analytics_service.rs

use crate::db::DbPool;
use crate::repository::share_link_repository::ShareLinkRepository;
use crate::repository::view_analytics_repository::{RecordViewDto, ViewAnalyticsRepository};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};
use uuid::Uuid;

/// 閲覧イベントの記録サービス
///
/// 分析の失敗が閲覧体験を阻害してはならない。このサービスの公開メソッドは
/// エラーを返さず、失敗はすべてログに落として握りつぶす。
pub struct AnalyticsService {
    analytics_repo: Arc<ViewAnalyticsRepository>,
    share_link_repo: Arc<ShareLinkRepository>,
    geolocation: GeolocationClient,
}

/// 閲覧イベントの入力
#[derive(Debug, Clone)]
pub struct ViewEvent {
    pub document_id: Uuid,
    pub share_key: Option<String>,
    pub viewer_email: Option<String>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub duration_secs: Option<i32>,
}

impl AnalyticsService {
    pub fn new(db_pool: DbPool) -> Self {
        Self {
            analytics_repo: Arc::new(ViewAnalyticsRepository::new(db_pool.clone())),
            share_link_repo: Arc::new(ShareLinkRepository::new(db_pool)),
            geolocation: GeolocationClient::new(),
        }
    }

    /// 閲覧イベントを記録（ベストエフォート）
    pub async fn record_view(&self, event: ViewEvent) {
        // ジオロケーションもベストエフォート。失敗・タイムアウトは無視
        let location = match &event.ip_address {
            Some(ip) => self.geolocation.lookup(ip).await,
            None => None,
        };

        let dto = RecordViewDto {
            document_id: event.document_id,
            share_key: event.share_key,
            viewer_email: event.viewer_email,
            ip_address: event.ip_address,
            user_agent: event.user_agent,
            country: location.as_ref().map(|l| l.country.clone()),
            city: location.as_ref().and_then(|l| l.city.clone()),
            duration_secs: event.duration_secs,
        };

        if let Err(e) = self.analytics_repo.record(dto).await {
            warn!(error = %e, "Failed to record view analytics");
        }
    }

    /// 共有キー経由のトラッキングイベントを記録（ベストエフォート）
    ///
    /// 共有キーが解決できなくても呼び出し側にはエラーを返さない。
    pub async fn track_share_view(
        &self,
        share_key: &str,
        duration_secs: Option<i32>,
        ip_address: Option<String>,
        user_agent: Option<String>,
    ) {
        let share_link = match self.share_link_repo.find_by_share_key(share_key).await {
            Ok(Some(share_link)) => share_link,
            Ok(None) => {
                debug!(share_key = %share_key, "Track request for unknown share key");
                return;
            }
            Err(e) => {
                warn!(error = %e, "Failed to resolve share key for tracking");
                return;
            }
        };

        self.record_view(ViewEvent {
            document_id: share_link.document_id,
            share_key: Some(share_key.to_string()),
            viewer_email: None,
            ip_address,
            user_agent,
            duration_secs,
        })
        .await;
    }
}

/// IPジオロケーションの結果
#[derive(Debug, Clone)]
pub struct GeoLocation {
    pub country: String,
    pub city: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeoApiResponse {
    status: String,
    country: Option<String>,
    city: Option<String>,
}

/// ip-api.com を使ったベストエフォートのジオロケーション
pub struct GeolocationClient {
    client: reqwest::Client,
}

impl GeolocationClient {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(Duration::from_secs(2))
                .build()
                .unwrap_or_default(),
        }
    }

    /// IPアドレスから国・都市を引く。失敗は None
    pub async fn lookup(&self, ip: &str) -> Option<GeoLocation> {
        if ip.is_empty() || is_private_ip(ip) {
            return None;
        }

        let url = format!("http://ip-api.com/json/{}?fields=status,country,city", ip);

        let response = match self.client.get(&url).send().await {
            Ok(response) => response,
            Err(e) => {
                debug!(error = %e, "Geolocation lookup failed");
                return None;
            }
        };

        let body: GeoApiResponse = match response.json().await {
            Ok(body) => body,
            Err(e) => {
                debug!(error = %e, "Geolocation response parse failed");
                return None;
            }
        };

        if body.status != "success" {
            return None;
        }

        body.country.map(|country| GeoLocation {
            country,
            city: body.city,
        })
    }
}

impl Default for GeolocationClient {
    fn default() -> Self {
        Self::new()
    }
}

/// プライベート・ループバックアドレスの簡易判定
fn is_private_ip(ip: &str) -> bool {
    ip == "127.0.0.1"
        || ip == "::1"
        || ip == "localhost"
        || ip.starts_with("10.")
        || ip.starts_with("192.168.")
        || ip.starts_with("172.16.")
        || ip.starts_with("172.17.")
        || ip.starts_with("172.18.")
        || ip.starts_with("172.19.")
        || ip.starts_with("172.2")
        || ip.starts_with("172.30.")
        || ip.starts_with("172.31.")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_private_ip_detection() {
        assert!(is_private_ip("127.0.0.1"));
        assert!(is_private_ip("10.1.2.3"));
        assert!(is_private_ip("192.168.0.10"));
        assert!(!is_private_ip("203.0.113.9"));
    }

    #[tokio::test]
    async fn test_lookup_skips_private_ips_without_network() {
        let client = GeolocationClient::new();
        assert!(client.lookup("127.0.0.1").await.is_none());
        assert!(client.lookup("").await.is_none());
    }
}
