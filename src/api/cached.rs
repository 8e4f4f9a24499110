//! メーター付き操作の前段に置くキャッシュレイヤー。
//!
//! キーは操作名と引数タプルの完全一致。ヒット時はクォータを一切
//! 消費しない。キャッシュを挟みたくないテストや呼び出しは
//! 内側のクライアントをそのまま使う。

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::api::youtube::{
    ChannelStatistics, FetchError, SearchHit, SearchRequest, TrendingRequest, TrendingVideo,
    VideoApi, VideoStatistics,
};
use crate::cache::ResponseCache;
use crate::quota::QuotaTracker;

pub struct CachedVideoApi<A> {
    inner: A,
    cache: Arc<ResponseCache>,
}

impl<A: VideoApi> CachedVideoApi<A> {
    pub fn new(inner: A, cache: Arc<ResponseCache>) -> Self {
        Self { inner, cache }
    }

    pub fn into_inner(self) -> A {
        self.inner
    }

    fn lookup<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, FetchError> {
        match self.cache.get(key) {
            Some(value) => Ok(Some(serde_json::from_value(value)?)),
            None => Ok(None),
        }
    }

    fn store<T: Serialize>(&self, key: String, value: &T) -> Result<(), FetchError> {
        self.cache.insert(key, serde_json::to_value(value)?);
        Ok(())
    }
}

fn search_key(request: &SearchRequest) -> String {
    ResponseCache::key(
        "search",
        &[
            request.query.as_str(),
            &request.max_results.to_string(),
            request.published_after.as_deref().unwrap_or(""),
            request.category_id.as_deref().unwrap_or(""),
            request.region_code.as_str(),
        ],
    )
}

fn ids_key(operation: &str, ids: &[String]) -> String {
    let refs: Vec<&str> = ids.iter().map(String::as_str).collect();
    ResponseCache::key(operation, &refs)
}

fn trending_key(request: &TrendingRequest) -> String {
    ResponseCache::key(
        "most_popular",
        &[
            request.region_code.as_str(),
            &request.max_results.to_string(),
            request.category_id.as_deref().unwrap_or(""),
        ],
    )
}

#[async_trait]
impl<A: VideoApi> VideoApi for CachedVideoApi<A> {
    async fn search(
        &self,
        quota: &mut QuotaTracker,
        request: &SearchRequest,
    ) -> Result<Vec<SearchHit>, FetchError> {
        let key = search_key(request);
        if let Some(hits) = self.lookup(&key)? {
            return Ok(hits);
        }
        let hits = self.inner.search(quota, request).await?;
        self.store(key, &hits)?;
        Ok(hits)
    }

    async fn video_statistics(
        &self,
        quota: &mut QuotaTracker,
        video_ids: &[String],
    ) -> Result<HashMap<String, VideoStatistics>, FetchError> {
        let key = ids_key("video_statistics", video_ids);
        if let Some(stats) = self.lookup(&key)? {
            return Ok(stats);
        }
        let stats = self.inner.video_statistics(quota, video_ids).await?;
        self.store(key, &stats)?;
        Ok(stats)
    }

    async fn channel_statistics(
        &self,
        quota: &mut QuotaTracker,
        channel_ids: &[String],
    ) -> Result<HashMap<String, ChannelStatistics>, FetchError> {
        let key = ids_key("channel_statistics", channel_ids);
        if let Some(stats) = self.lookup(&key)? {
            return Ok(stats);
        }
        let stats = self.inner.channel_statistics(quota, channel_ids).await?;
        self.store(key, &stats)?;
        Ok(stats)
    }

    async fn most_popular(
        &self,
        quota: &mut QuotaTracker,
        request: &TrendingRequest,
    ) -> Result<Vec<TrendingVideo>, FetchError> {
        let key = trending_key(request);
        if let Some(videos) = self.lookup(&key)? {
            return Ok(videos);
        }
        let videos = self.inner.most_popular(quota, request).await?;
        self.store(key, &videos)?;
        Ok(videos)
    }
}
