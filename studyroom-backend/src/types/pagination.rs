// studyroom-backend/src/types/pagination.rs

use serde::{Deserialize, Serialize};

/// ページネーション情報
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaginationMeta {
    pub page: i32,
    pub per_page: i32,
    pub total_pages: i32,
    pub total_count: i64,
    pub has_more: bool,
}

impl PaginationMeta {
    pub fn new(page: i32, per_page: i32, total_count: i64) -> Self {
        let total_pages = ((total_count as f64) / (per_page as f64)).ceil() as i32;

        Self {
            page,
            per_page,
            total_pages,
            total_count,
            has_more: (page as i64) * (per_page as i64) < total_count,
        }
    }
}

/// ページネーションクエリパラメータ
#[derive(Debug, Clone, Deserialize)]
pub struct PaginationQuery {
    pub page: Option<i32>,
    pub limit: Option<i32>,
}

impl PaginationQuery {
    /// デフォルト値を適用してページとlimitを取得（limitは最大100）
    pub fn get_pagination(&self) -> (i32, i32) {
        let page = self.page.unwrap_or(1).max(1);
        let limit = self.limit.unwrap_or(50).clamp(1, 100);
        (page, limit)
    }

    /// オフセットを計算
    pub fn get_offset(&self) -> i32 {
        let (page, limit) = self.get_pagination();
        (page - 1) * limit
    }
}

/// ページネーション付きレスポンス
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaginatedResponse<T> {
    pub items: Vec<T>,
    pub pagination: PaginationMeta,
}

impl<T> PaginatedResponse<T> {
    pub fn new(items: Vec<T>, page: i32, per_page: i32, total_count: i64) -> Self {
        Self {
            items,
            pagination: PaginationMeta::new(page, per_page, total_count),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pagination_meta() {
        let pagination = PaginationMeta::new(2, 10, 25);
        assert_eq!(pagination.page, 2);
        assert_eq!(pagination.per_page, 10);
        assert_eq!(pagination.total_pages, 3);
        assert_eq!(pagination.total_count, 25);
        assert!(pagination.has_more);

        let last_page = PaginationMeta::new(3, 10, 25);
        assert!(!last_page.has_more);
    }

    #[test]
    fn test_pagination_query_defaults() {
        let query = PaginationQuery {
            page: None,
            limit: None,
        };
        assert_eq!(query.get_pagination(), (1, 50));
        assert_eq!(query.get_offset(), 0);
    }

    #[test]
    fn test_pagination_query_clamps_limit() {
        let query = PaginationQuery {
            page: Some(2),
            limit: Some(500),
        };
        assert_eq!(query.get_pagination(), (2, 100));
        assert_eq!(query.get_offset(), 100);

        let negative = PaginationQuery {
            page: Some(-1),
            limit: Some(0),
        };
        assert_eq!(negative.get_pagination(), (1, 1));
    }
}
