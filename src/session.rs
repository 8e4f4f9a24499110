//! セッションスコープの状態。
//!
//! クォータトラッカーとレスポンスキャッシュを呼び出し側が明示的に
//! 所有し、各フェッチ呼び出しに渡す。隠れたグローバル状態は持たない。

use std::sync::Arc;
use std::time::Duration;

use crate::cache::ResponseCache;
use crate::quota::QuotaTracker;

/// 1ユーザーセッション分の可変状態。
///
/// プロセス再起動で消える。永続化も明示的なリセット操作もない。
pub struct SessionContext {
    pub quota: QuotaTracker,
    cache: Arc<ResponseCache>,
}

impl SessionContext {
    pub fn new() -> Self {
        Self {
            quota: QuotaTracker::default(),
            cache: Arc::new(ResponseCache::default()),
        }
    }

    pub fn with_limits(daily_limit: u64, cache_ttl: Duration) -> Self {
        Self {
            quota: QuotaTracker::new(daily_limit),
            cache: Arc::new(ResponseCache::new(cache_ttl)),
        }
    }

    /// キャッシュレイヤーと共有するためのハンドル。
    pub fn cache(&self) -> Arc<ResponseCache> {
        Arc::clone(&self.cache)
    }
}

impl Default for SessionContext {
    fn default() -> Self {
        Self::new()
    }
}
