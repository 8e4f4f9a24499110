//! 分析パイプラインの統合テスト。
//!
//! ネットワークに出ないよう、`VideoApi` のモック実装で
//! クォータ消費と多段取得の挙動を検証する。

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use buzzscope::api::youtube::{
    ChannelStatistics, FetchError, SearchHit, SearchId, SearchRequest, SearchSnippet,
    TrendingRequest, TrendingVideo, VideoApi, VideoStatistics,
};
use buzzscope::{
    fetch_and_analyze, CachedVideoApi, QuotaTracker, ResponseCache, SessionContext,
};

fn search_hit(video_id: &str, channel_id: &str, title: &str) -> SearchHit {
    SearchHit {
        id: SearchId {
            video_id: video_id.to_string(),
        },
        snippet: SearchSnippet {
            title: title.to_string(),
            channel_id: channel_id.to_string(),
            channel_title: format!("channel {channel_id}"),
            published_at: "2024-05-01T00:00:00Z".to_string(),
            ..Default::default()
        },
    }
}

fn video_stats(view_count: u64) -> VideoStatistics {
    VideoStatistics {
        view_count,
        ..Default::default()
    }
}

fn channel_stats(subscriber_count: u64, hidden: bool) -> ChannelStatistics {
    ChannelStatistics {
        subscriber_count,
        hidden_subscriber_count: hidden,
    }
}

/// 固定レスポンスを返し、呼び出し回数と受け取ったIDを記録するモック。
#[derive(Default)]
struct MockVideoApi {
    hits: Vec<SearchHit>,
    video_stats: HashMap<String, VideoStatistics>,
    channel_stats: HashMap<String, ChannelStatistics>,
    search_calls: AtomicUsize,
    video_stats_calls: AtomicUsize,
    channel_stats_calls: AtomicUsize,
    requested_channel_ids: Mutex<Vec<String>>,
}

#[async_trait]
impl VideoApi for MockVideoApi {
    async fn search(
        &self,
        quota: &mut QuotaTracker,
        _request: &SearchRequest,
    ) -> Result<Vec<SearchHit>, FetchError> {
        self.search_calls.fetch_add(1, Ordering::SeqCst);
        quota.add(100);
        Ok(self.hits.clone())
    }

    async fn video_statistics(
        &self,
        quota: &mut QuotaTracker,
        video_ids: &[String],
    ) -> Result<HashMap<String, VideoStatistics>, FetchError> {
        self.video_stats_calls.fetch_add(1, Ordering::SeqCst);
        // 本物のクライアントと同じく50件バッチごとに1ユニット
        for _ in video_ids.chunks(50) {
            quota.add(1);
        }
        Ok(self.video_stats.clone())
    }

    async fn channel_statistics(
        &self,
        quota: &mut QuotaTracker,
        channel_ids: &[String],
    ) -> Result<HashMap<String, ChannelStatistics>, FetchError> {
        self.channel_stats_calls.fetch_add(1, Ordering::SeqCst);
        self.requested_channel_ids
            .lock()
            .unwrap()
            .extend(channel_ids.iter().cloned());
        for _ in channel_ids.chunks(50) {
            quota.add(1);
        }
        Ok(self.channel_stats.clone())
    }

    async fn most_popular(
        &self,
        quota: &mut QuotaTracker,
        _request: &TrendingRequest,
    ) -> Result<Vec<TrendingVideo>, FetchError> {
        quota.add(1);
        Ok(Vec::new())
    }
}

/// 常にクォータ超過を返すモック。
struct QuotaExhaustedApi;

#[async_trait]
impl VideoApi for QuotaExhaustedApi {
    async fn search(
        &self,
        _quota: &mut QuotaTracker,
        _request: &SearchRequest,
    ) -> Result<Vec<SearchHit>, FetchError> {
        Err(FetchError::QuotaExceeded)
    }

    async fn video_statistics(
        &self,
        _quota: &mut QuotaTracker,
        _video_ids: &[String],
    ) -> Result<HashMap<String, VideoStatistics>, FetchError> {
        Err(FetchError::QuotaExceeded)
    }

    async fn channel_statistics(
        &self,
        _quota: &mut QuotaTracker,
        _channel_ids: &[String],
    ) -> Result<HashMap<String, ChannelStatistics>, FetchError> {
        Err(FetchError::QuotaExceeded)
    }

    async fn most_popular(
        &self,
        _quota: &mut QuotaTracker,
        _request: &TrendingRequest,
    ) -> Result<Vec<TrendingVideo>, FetchError> {
        Err(FetchError::QuotaExceeded)
    }
}

#[tokio::test]
async fn empty_search_charges_only_search_cost() {
    let api = MockVideoApi::default();
    let mut quota = QuotaTracker::default();

    let records = fetch_and_analyze(&api, &mut quota, &SearchRequest::new("存在しない検索語"))
        .await
        .unwrap();

    assert!(records.is_empty());
    assert_eq!(quota.used(), 100);
    // 統計取得は一切呼ばれない
    assert_eq!(api.video_stats_calls.load(Ordering::SeqCst), 0);
    assert_eq!(api.channel_stats_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn pipeline_enriches_records_in_search_order() {
    let mut api = MockVideoApi::default();
    api.hits = vec![
        search_hit("v1", "UC1", "動画1"),
        search_hit("v2", "UC2", "動画2"),
        search_hit("v3", "UC1", "動画3"),
    ];
    api.video_stats.insert("v1".to_string(), video_stats(5000));
    api.video_stats.insert("v2".to_string(), video_stats(5000));
    // v3 は統計欠損 → 0扱い
    api.channel_stats
        .insert("UC1".to_string(), channel_stats(500, false));
    api.channel_stats
        .insert("UC2".to_string(), channel_stats(10000, false));

    let mut quota = QuotaTracker::default();
    let records = fetch_and_analyze(&api, &mut quota, &SearchRequest::new("バズ"))
        .await
        .unwrap();

    // 検索100 + 動画統計1バッチ + チャンネル統計1バッチ
    assert_eq!(quota.used(), 102);

    let ids: Vec<&str> = records.iter().map(|r| r.video_id.as_str()).collect();
    assert_eq!(ids, vec!["v1", "v2", "v3"]);

    assert_eq!(records[0].view_count, 5000);
    assert_eq!(records[0].subscriber_count, 500);
    assert_eq!(records[0].vs_ratio, 10.0);

    assert_eq!(records[1].subscriber_count, 10000);
    assert_eq!(records[1].vs_ratio, 0.5);

    // 統計のない動画はエラーにならずゼロ埋め
    assert_eq!(records[2].view_count, 0);
    assert_eq!(records[2].vs_ratio, 0.0);

    // チャンネルIDは重複排除されて渡る
    let requested = api.requested_channel_ids.lock().unwrap().clone();
    assert_eq!(requested, vec!["UC1", "UC2"]);
}

#[tokio::test]
async fn hidden_subscriber_count_zeroes_every_video_on_channel() {
    let mut api = MockVideoApi::default();
    api.hits = vec![
        search_hit("v1", "UC1", "動画1"),
        search_hit("v2", "UC1", "動画2"),
    ];
    api.video_stats.insert("v1".to_string(), video_stats(100));
    api.video_stats.insert("v2".to_string(), video_stats(200));
    // 非公開フラグ付きだが生の登録者数も載っているケース
    api.channel_stats
        .insert("UC1".to_string(), channel_stats(123456, true));

    let mut quota = QuotaTracker::default();
    let records = fetch_and_analyze(&api, &mut quota, &SearchRequest::new("q"))
        .await
        .unwrap();

    for record in &records {
        assert_eq!(record.subscriber_count, 0);
        assert_eq!(record.vs_ratio, 0.0);
    }
}

#[tokio::test]
async fn quota_exceeded_propagates_untouched() {
    let mut quota = QuotaTracker::default();
    let result = fetch_and_analyze(&QuotaExhaustedApi, &mut quota, &SearchRequest::new("q")).await;

    assert!(matches!(result, Err(FetchError::QuotaExceeded)));
    assert_eq!(quota.used(), 0);
}

#[tokio::test]
async fn cached_api_does_not_recharge_identical_queries() {
    let mut api = MockVideoApi::default();
    api.hits = vec![search_hit("v1", "UC1", "動画1")];

    let session = SessionContext::new();
    let cached = CachedVideoApi::new(api, session.cache());
    let mut quota = QuotaTracker::default();

    let request = SearchRequest::new("同一クエリ");
    let first = cached.search(&mut quota, &request).await.unwrap();
    let second = cached.search(&mut quota, &request).await.unwrap();

    assert_eq!(first.len(), second.len());
    assert_eq!(quota.used(), 100); // 2回目はキャッシュヒットで課金なし

    // 引数が変われば別キーとして再課金される
    let other = SearchRequest::new("別クエリ");
    cached.search(&mut quota, &other).await.unwrap();
    assert_eq!(quota.used(), 200);
}

#[tokio::test]
async fn cached_statistics_share_session_cache() {
    let mut api = MockVideoApi::default();
    api.channel_stats
        .insert("UC1".to_string(), channel_stats(100, false));

    let cache = std::sync::Arc::new(ResponseCache::default());
    let cached = CachedVideoApi::new(api, cache.clone());
    let mut quota = QuotaTracker::default();

    let ids = vec!["UC1".to_string()];
    cached.channel_statistics(&mut quota, &ids).await.unwrap();
    cached.channel_statistics(&mut quota, &ids).await.unwrap();

    assert_eq!(quota.used(), 1);
    assert_eq!(cache.len(), 1);
}
