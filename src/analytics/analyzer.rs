//! 動画分析ロジック（V/S比率計算・フィルタ・ソート）。
//!
//! 検索 → 動画統計 → チャンネル統計 → 比率計算の多段パイプライン。
//! フェッチャーのエラーはラップせずそのまま伝播し、呼び出し側が
//! クォータ超過とその他の失敗を区別できるようにする。

use crate::api::youtube::{dedup_channel_ids, FetchError, SearchHit, SearchRequest, VideoApi};
use crate::quota::QuotaTracker;

/// 統計値で補完済みの動画1件。
///
/// 検索結果から基本情報を構築し、統計到着時に一度だけ
/// view_count / subscriber_count / vs_ratio を埋める。
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VideoRecord {
    pub video_id: String,
    pub title: String,
    pub channel_id: String,
    pub channel_title: String,
    /// ISO-8601 文字列のまま保持する
    pub published_at: String,
    pub thumbnail_url: String,
    pub view_count: u64,
    pub subscriber_count: u64,
    /// 再生数 ÷ 登録者数。登録者0なら0.0（ゼロ除算はエラーにしない）
    pub vs_ratio: f64,
}

impl VideoRecord {
    fn from_search_hit(hit: &SearchHit) -> Self {
        Self {
            video_id: hit.id.video_id.clone(),
            title: hit.snippet.title.clone(),
            channel_id: hit.snippet.channel_id.clone(),
            channel_title: hit.snippet.channel_title.clone(),
            published_at: hit.snippet.published_at.clone(),
            thumbnail_url: hit.snippet.thumbnails.best_url(),
            ..Default::default()
        }
    }
}

/// 登録者数に対する再生数の比率。登録者0は0.0。
pub fn vs_ratio(view_count: u64, subscriber_count: u64) -> f64 {
    if subscriber_count > 0 {
        view_count as f64 / subscriber_count as f64
    } else {
        0.0
    }
}

/// 検索 → 動画詳細 → チャンネル詳細 → V/S比率計算を一括実行する。
///
/// 検索が0件なら統計取得を行わず（検索の100ユニットのみ消費して）
/// 空リストを返す。結果の順序は検索レスポンスのまま
/// （APIレベルで再生数降順）。
pub async fn fetch_and_analyze<A: VideoApi>(
    api: &A,
    quota: &mut QuotaTracker,
    request: &SearchRequest,
) -> Result<Vec<VideoRecord>, FetchError> {
    let hits = api.search(quota, request).await?;
    if hits.is_empty() {
        return Ok(Vec::new());
    }

    let mut records: Vec<VideoRecord> = hits.iter().map(VideoRecord::from_search_hit).collect();
    let video_ids: Vec<String> = hits.iter().map(|hit| hit.id.video_id.clone()).collect();
    let channel_ids = dedup_channel_ids(&hits);

    let video_stats = api.video_statistics(quota, &video_ids).await?;
    let channel_stats = api.channel_statistics(quota, &channel_ids).await?;

    for record in &mut records {
        record.view_count = video_stats
            .get(&record.video_id)
            .map(|stats| stats.view_count)
            .unwrap_or(0);
        record.subscriber_count = channel_stats
            .get(&record.channel_id)
            .map(|stats| stats.effective_subscriber_count())
            .unwrap_or(0);
        record.vs_ratio = vs_ratio(record.view_count, record.subscriber_count);
    }

    Ok(records)
}

/// フィルタ条件。`None` は「そのフィルタを適用しない」。
/// `Some(0)` は境界値での通常のフィルタとして働く。
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct VideoFilter {
    /// 登録者数上限（`<=`）
    pub max_subscribers: Option<u64>,
    /// 再生数下限（`>=`）
    pub min_views: Option<u64>,
    /// V/S比率下限（`>=`）
    pub min_vs_ratio: Option<f64>,
}

/// 動画リストをフィルタリングする。各条件はANDで合成され、
/// 適用順序に依存しない。
pub fn filter_videos(videos: Vec<VideoRecord>, filter: &VideoFilter) -> Vec<VideoRecord> {
    let mut result = videos;
    if let Some(max_subscribers) = filter.max_subscribers {
        result.retain(|v| v.subscriber_count <= max_subscribers);
    }
    if let Some(min_views) = filter.min_views {
        result.retain(|v| v.view_count >= min_views);
    }
    if let Some(min_vs_ratio) = filter.min_vs_ratio {
        result.retain(|v| v.vs_ratio >= min_vs_ratio);
    }
    result
}

/// V/S比率でソートする。安定ソートなので同率は入力順を保つ。
pub fn sort_by_vs_ratio(mut videos: Vec<VideoRecord>, descending: bool) -> Vec<VideoRecord> {
    videos.sort_by(|a, b| {
        let ordering = a
            .vs_ratio
            .partial_cmp(&b.vs_ratio)
            .unwrap_or(std::cmp::Ordering::Equal);
        if descending {
            ordering.reverse()
        } else {
            ordering
        }
    });
    videos
}
