//! APIクォータ使用量の追跡。

use crate::constants::YOUTUBE_DAILY_QUOTA_LIMIT;

/// YouTube Data API のクォータ使用量を1セッション分だけ追跡する。
///
/// 観測専用のカウンターで、上限を超える `add` も拒否しない。
/// 実際の強制はプラットフォーム側の403レスポンスが担う。
#[derive(Debug, Clone)]
pub struct QuotaTracker {
    used: u64,
    daily_limit: u64,
}

impl QuotaTracker {
    pub fn new(daily_limit: u64) -> Self {
        Self {
            used: 0,
            daily_limit,
        }
    }

    /// 使用ユニットを加算する。`used` はセッション中に減少しない。
    pub fn add(&mut self, units: u64) {
        self.used += units;
    }

    pub fn used(&self) -> u64 {
        self.used
    }

    pub fn daily_limit(&self) -> u64 {
        self.daily_limit
    }

    /// 残りユニット数。`used` が上限を超えても0で止まる。
    pub fn remaining(&self) -> u64 {
        self.daily_limit.saturating_sub(self.used)
    }

    /// 使用率（%）。上限超過時は100を超える値を返す。
    pub fn usage_percent(&self) -> f64 {
        (self.used as f64 / self.daily_limit as f64) * 100.0
    }
}

impl Default for QuotaTracker {
    fn default() -> Self {
        Self::new(YOUTUBE_DAILY_QUOTA_LIMIT)
    }
}
