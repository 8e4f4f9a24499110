//! YouTube Data API v3 クライアント。
//!
//! メーター付きの4操作（検索・動画統計・チャンネル統計・急上昇リスト）を
//! 提供する。成功した物理リクエスト1回につき、クォータトラッカーへ
//! 規定コストをちょうど1回加算する。

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use serde::{Deserialize, Deserializer, Serialize};

use crate::constants::{
    DEFAULT_REGION_CODE, LIST_QUOTA_COST, REQUEST_TIMEOUT, SEARCH_QUOTA_COST, YOUTUBE_BATCH_SIZE,
    YOUTUBE_MAX_RESULTS,
};
use crate::quota::QuotaTracker;

const API_BASE_URL: &str = "https://www.googleapis.com/youtube/v3";

#[derive(thiserror::Error, Debug)]
pub enum FetchError {
    #[error("Request failed")]
    Request(#[from] reqwest::Error),
    #[error("APIクォータを超過しました。明日リセットされます。")]
    QuotaExceeded,
    #[error("Failed to parse JSON")]
    Parse(#[from] serde_json::Error),
}

#[derive(Debug, Clone, derive_more::Display)]
pub struct ApiKey(String);

impl ApiKey {
    pub fn new(value: String) -> Self {
        Self(value)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// YouTube 統計値は JSON 文字列で返る（"viewCount": "12345"）。
/// 数値・文字列の両方を受け、欠損や不正値は0に落とす。
fn count_field<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(u64),
        Text(String),
    }

    Ok(match Option::<Raw>::deserialize(deserializer)? {
        Some(Raw::Number(n)) => n,
        Some(Raw::Text(s)) => s.trim().parse().unwrap_or(0),
        None => 0,
    })
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Thumbnail {
    #[serde(default)]
    pub url: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Thumbnails {
    #[serde(default)]
    pub high: Option<Thumbnail>,
    #[serde(default)]
    pub medium: Option<Thumbnail>,
    #[serde(default)]
    pub default: Option<Thumbnail>,
}

impl Thumbnails {
    /// high → medium → default の優先順でURLを返す。どれもなければ空文字。
    pub fn best_url(&self) -> String {
        [&self.high, &self.medium, &self.default]
            .into_iter()
            .flatten()
            .map(|t| t.url.clone())
            .find(|url| !url.is_empty())
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchSnippet {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub channel_id: String,
    #[serde(default)]
    pub channel_title: String,
    #[serde(default)]
    pub published_at: String,
    #[serde(default)]
    pub thumbnails: Thumbnails,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchId {
    #[serde(default)]
    pub video_id: String,
}

/// search.list の1行。APIバウンダリで型付けし、以降の処理に
/// 生のネストしたマップを持ち込まない。
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchHit {
    #[serde(default)]
    pub id: SearchId,
    #[serde(default)]
    pub snippet: SearchSnippet,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoStatistics {
    #[serde(default, deserialize_with = "count_field")]
    pub view_count: u64,
    #[serde(default, deserialize_with = "count_field")]
    pub like_count: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelStatistics {
    #[serde(default, deserialize_with = "count_field")]
    pub subscriber_count: u64,
    #[serde(default)]
    pub hidden_subscriber_count: bool,
}

impl ChannelStatistics {
    /// 登録者数非公開のチャンネルは、生の数値が載っていても0として扱う。
    pub fn effective_subscriber_count(&self) -> u64 {
        if self.hidden_subscriber_count {
            0
        } else {
            self.subscriber_count
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendingSnippet {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub channel_title: String,
    #[serde(default)]
    pub category_id: String,
    #[serde(default)]
    pub published_at: String,
    #[serde(default)]
    pub thumbnails: Thumbnails,
}

/// videos.list (chart=mostPopular) の1行。
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TrendingVideo {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub snippet: TrendingSnippet,
    #[serde(default)]
    pub statistics: VideoStatistics,
}

#[derive(Debug, Deserialize)]
struct ListResponse<T> {
    #[serde(default = "Vec::new")]
    items: Vec<T>,
}

#[derive(Debug, Deserialize)]
struct StatsItem<T> {
    #[serde(default)]
    id: String,
    #[serde(default)]
    statistics: Option<T>,
}

/// search.list のリクエストパラメータ。
#[derive(Debug, Clone)]
pub struct SearchRequest {
    pub query: String,
    pub max_results: u32,
    /// ISO-8601 形式の公開日下限
    pub published_after: Option<String>,
    pub category_id: Option<String>,
    pub region_code: String,
}

impl SearchRequest {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            max_results: YOUTUBE_MAX_RESULTS,
            published_after: None,
            category_id: None,
            region_code: DEFAULT_REGION_CODE.to_string(),
        }
    }

    pub fn with_max_results(mut self, max_results: u32) -> Self {
        self.max_results = max_results;
        self
    }

    pub fn with_published_after(mut self, published_after: Option<String>) -> Self {
        self.published_after = published_after;
        self
    }

    pub fn with_category(mut self, category_id: Option<String>) -> Self {
        self.category_id = category_id;
        self
    }
}

/// videos.list (chart=mostPopular) のリクエストパラメータ。
#[derive(Debug, Clone)]
pub struct TrendingRequest {
    pub region_code: String,
    pub max_results: u32,
    pub category_id: Option<String>,
}

impl Default for TrendingRequest {
    fn default() -> Self {
        Self {
            region_code: DEFAULT_REGION_CODE.to_string(),
            max_results: YOUTUBE_MAX_RESULTS,
            category_id: None,
        }
    }
}

/// メーター付き読み取り操作のシーム。
///
/// 本物のHTTPクライアントのほか、キャッシュレイヤーやテスト用モックが
/// 同じ契約を実装する。各操作は成功した物理リクエストごとに
/// `quota.add` をちょうど1回呼ぶ。
#[async_trait]
pub trait VideoApi: Send + Sync {
    /// キーワード検索（100ユニット/回、最大50件、再生数降順）。
    async fn search(
        &self,
        quota: &mut QuotaTracker,
        request: &SearchRequest,
    ) -> Result<Vec<SearchHit>, FetchError>;

    /// 動画統計のバッチ取得（1ユニット/バッチ、50件ずつ）。
    async fn video_statistics(
        &self,
        quota: &mut QuotaTracker,
        video_ids: &[String],
    ) -> Result<HashMap<String, VideoStatistics>, FetchError>;

    /// チャンネル統計のバッチ取得（1ユニット/バッチ、50件ずつ）。
    async fn channel_statistics(
        &self,
        quota: &mut QuotaTracker,
        channel_ids: &[String],
    ) -> Result<HashMap<String, ChannelStatistics>, FetchError>;

    /// 急上昇（mostPopular）リスト取得（1ユニット/回）。
    async fn most_popular(
        &self,
        quota: &mut QuotaTracker,
        request: &TrendingRequest,
    ) -> Result<Vec<TrendingVideo>, FetchError>;
}

/// reqwest ベースの実装。
pub struct DataApiClient {
    http: reqwest::Client,
    api_key: ApiKey,
}

impl DataApiClient {
    pub fn new(api_key: ApiKey) -> Result<Self, FetchError> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self { http, api_key })
    }

    /// 1回の物理リクエスト。403はクォータ超過として型付けし、
    /// それ以外のHTTP/トランスポートエラーはそのまま伝播する。
    async fn get<T: serde::de::DeserializeOwned>(
        &self,
        resource: &str,
        params: &[(&str, &str)],
    ) -> Result<T, FetchError> {
        let url = format!("{API_BASE_URL}/{resource}");
        let response = self
            .http
            .get(&url)
            .query(params)
            .query(&[("key", self.api_key.as_str())])
            .send()
            .await?;

        if response.status() == reqwest::StatusCode::FORBIDDEN {
            return Err(FetchError::QuotaExceeded);
        }
        let response = response.error_for_status()?;

        let text = response.text().await?;
        let parsed: T = serde_json::from_str(&text)?;
        Ok(parsed)
    }

    async fn statistics_batches<T: serde::de::DeserializeOwned + Default>(
        &self,
        quota: &mut QuotaTracker,
        resource: &str,
        ids: &[String],
    ) -> Result<HashMap<String, T>, FetchError> {
        let mut result = HashMap::new();
        for batch in ids.chunks(YOUTUBE_BATCH_SIZE) {
            let joined = batch.join(",");
            let params = [("part", "statistics"), ("id", joined.as_str())];
            let response: ListResponse<StatsItem<T>> = self.get(resource, &params).await?;
            quota.add(LIST_QUOTA_COST);
            for item in response.items {
                result.insert(item.id, item.statistics.unwrap_or_default());
            }
        }
        Ok(result)
    }
}

#[async_trait]
impl VideoApi for DataApiClient {
    async fn search(
        &self,
        quota: &mut QuotaTracker,
        request: &SearchRequest,
    ) -> Result<Vec<SearchHit>, FetchError> {
        let max_results = request.max_results.min(YOUTUBE_MAX_RESULTS).to_string();
        let mut params = vec![
            ("part", "snippet"),
            ("type", "video"),
            ("order", "viewCount"),
            ("q", request.query.as_str()),
            ("maxResults", max_results.as_str()),
            ("regionCode", request.region_code.as_str()),
        ];
        if let Some(published_after) = &request.published_after {
            params.push(("publishedAfter", published_after.as_str()));
        }
        if let Some(category_id) = &request.category_id {
            params.push(("videoCategoryId", category_id.as_str()));
        }

        let response: ListResponse<SearchHit> = self.get("search", &params).await?;
        quota.add(SEARCH_QUOTA_COST);
        tracing::debug!(
            query = %request.query,
            hits = response.items.len(),
            "検索完了"
        );
        Ok(response.items)
    }

    async fn video_statistics(
        &self,
        quota: &mut QuotaTracker,
        video_ids: &[String],
    ) -> Result<HashMap<String, VideoStatistics>, FetchError> {
        self.statistics_batches(quota, "videos", video_ids).await
    }

    async fn channel_statistics(
        &self,
        quota: &mut QuotaTracker,
        channel_ids: &[String],
    ) -> Result<HashMap<String, ChannelStatistics>, FetchError> {
        self.statistics_batches(quota, "channels", channel_ids).await
    }

    async fn most_popular(
        &self,
        quota: &mut QuotaTracker,
        request: &TrendingRequest,
    ) -> Result<Vec<TrendingVideo>, FetchError> {
        let max_results = request.max_results.min(YOUTUBE_MAX_RESULTS).to_string();
        let mut params = vec![
            ("part", "snippet,statistics"),
            ("chart", "mostPopular"),
            ("regionCode", request.region_code.as_str()),
            ("maxResults", max_results.as_str()),
        ];
        if let Some(category_id) = &request.category_id {
            params.push(("videoCategoryId", category_id.as_str()));
        }

        let response: ListResponse<TrendingVideo> = self.get("videos", &params).await?;
        quota.add(LIST_QUOTA_COST);
        Ok(response.items)
    }
}

/// 順序を保ったままチャンネルIDを重複排除する。
pub fn dedup_channel_ids(hits: &[SearchHit]) -> Vec<String> {
    let mut seen = HashSet::new();
    hits.iter()
        .map(|hit| hit.snippet.channel_id.clone())
        .filter(|id| !id.is_empty() && seen.insert(id.clone()))
        .collect()
}
