//! アプリケーション全体で使用する定数。

use std::time::Duration;

// ─── デフォルト値 ──────────────────────────────────
pub const DEFAULT_REGION_CODE: &str = "JP";

// ─── YouTube Data API ──────────────────────────────
pub const YOUTUBE_MAX_RESULTS: u32 = 50;
pub const YOUTUBE_DAILY_QUOTA_LIMIT: u64 = 10_000;
/// id指定系エンドポイントの1リクエストあたり上限件数
pub const YOUTUBE_BATCH_SIZE: usize = 50;
/// search.list のクォータコスト（ユニット/回）
pub const SEARCH_QUOTA_COST: u64 = 100;
/// videos.list / channels.list のクォータコスト（ユニット/回）
pub const LIST_QUOTA_COST: u64 = 1;

// ─── HTTP ──────────────────────────────────────────
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);
pub const SUGGEST_TIMEOUT: Duration = Duration::from_secs(5);

// ─── キャッシュ ────────────────────────────────────
pub const CACHE_TTL: Duration = Duration::from_secs(3600);

// ─── アルファベットスープ法 ────────────────────────
/// サジェストAPIへの連続リクエスト間隔
pub const SOUP_REQUEST_DELAY: Duration = Duration::from_millis(1500);
