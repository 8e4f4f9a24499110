//! Google Trends クライアント（急上昇RSS + デイリートレンドJSON）。

use tracing::warn;

use crate::api::{Collected, DegradeReason};

const TRENDING_RSS_URL: &str = "https://trends.google.com/trending/rss";
const DAILY_TRENDS_URL: &str = "https://trends.google.com/trends/api/dailytrends";

/// 急上昇キーワード1件（`ht:` 名前空間の付随情報つき）。
#[derive(Debug, Clone, PartialEq)]
pub struct TrendingSearch {
    pub keyword: String,
    /// "20万+" のような概算トラフィックラベル
    pub traffic: String,
    pub picture: String,
    pub news: Vec<NewsItem>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewsItem {
    pub title: String,
    pub source: String,
    pub url: String,
}

/// 日別トレンド（ブラウザ内部JSONエンドポイント由来）。
#[derive(Debug, Clone, PartialEq)]
pub struct TrendDay {
    pub date: String,
    pub formatted_date: String,
    pub searches: Vec<TrendEntry>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TrendEntry {
    pub query: String,
    pub traffic: String,
}

/// 急上昇キーワードを取得する。
///
/// ネットワークエラーは呼び出し側へそのまま伝播する。
/// XML解析失敗のみ警告を出して空に落とす（補助情報源のため）。
pub async fn trending_searches(
    client: &reqwest::Client,
    geo: &str,
) -> Result<Collected<TrendingSearch>, reqwest::Error> {
    let body = client
        .get(TRENDING_RSS_URL)
        .query(&[("geo", geo)])
        .send()
        .await?
        .error_for_status()?
        .bytes()
        .await?;

    Ok(parse_trending_rss(&body))
}

fn parse_trending_rss(body: &[u8]) -> Collected<TrendingSearch> {
    let channel = match rss::Channel::read_from(body) {
        Ok(channel) => channel,
        Err(e) => {
            warn!(error = %e, "Google Trends RSS: XML解析に失敗しました");
            return Collected::degraded(DegradeReason::Parse);
        }
    };

    let mut results = Vec::new();
    for item in channel.items() {
        let keyword = item.title().unwrap_or("").to_string();
        if keyword.is_empty() {
            continue;
        }

        let ht = item.extensions().get("ht");
        let traffic = ht_value(ht, "approx_traffic");
        let picture = ht_value(ht, "picture");

        let news = ht
            .and_then(|m| m.get("news_item"))
            .map(|items| {
                items
                    .iter()
                    .map(|ext| NewsItem {
                        title: child_value(ext, "news_item_title"),
                        source: child_value(ext, "news_item_source"),
                        url: child_value(ext, "news_item_url"),
                    })
                    .collect()
            })
            .unwrap_or_default();

        results.push(TrendingSearch {
            keyword,
            traffic,
            picture,
            news,
        });
    }

    Collected::ok(results)
}

fn ht_value(
    ht: Option<&std::collections::BTreeMap<String, Vec<rss::extension::Extension>>>,
    name: &str,
) -> String {
    ht.and_then(|m| m.get(name))
        .and_then(|v| v.first())
        .and_then(|ext| ext.value())
        .unwrap_or("")
        .to_string()
}

fn child_value(ext: &rss::extension::Extension, name: &str) -> String {
    ext.children()
        .get(name)
        .and_then(|v| v.first())
        .and_then(|child| child.value())
        .unwrap_or("")
        .to_string()
}

/// 日別の急上昇検索を取得する。
///
/// レスポンス先頭にはJSONハイジャック対策のプレフィックス `)]}',`
/// が付くので、最初の `{` まで読み飛ばしてから解析する。
pub async fn daily_trends(
    client: &reqwest::Client,
    geo: &str,
) -> Result<Collected<TrendDay>, reqwest::Error> {
    let text = client
        .get(DAILY_TRENDS_URL)
        .query(&[("hl", "ja"), ("tz", "-540"), ("geo", geo)])
        .send()
        .await?
        .error_for_status()?
        .text()
        .await?;

    Ok(parse_daily_trends(&text))
}

fn parse_daily_trends(text: &str) -> Collected<TrendDay> {
    let Some(start) = text.find('{') else {
        warn!("デイリートレンド: JSON本体が見つかりません");
        return Collected::degraded(DegradeReason::Parse);
    };

    let parsed: RawDailyTrends = match serde_json::from_str(&text[start..]) {
        Ok(parsed) => parsed,
        Err(e) => {
            warn!(error = %e, "デイリートレンド: JSON解析に失敗しました");
            return Collected::degraded(DegradeReason::Parse);
        }
    };

    let days = parsed
        .default
        .trending_searches_days
        .into_iter()
        .map(|day| TrendDay {
            date: day.date,
            formatted_date: day.formatted_date,
            searches: day
                .trending_searches
                .into_iter()
                .map(|search| TrendEntry {
                    query: search.title.query,
                    traffic: search.formatted_traffic,
                })
                .collect(),
        })
        .collect();

    Collected::ok(days)
}

#[derive(Debug, serde::Deserialize)]
struct RawDailyTrends {
    default: RawDefault,
}

#[derive(Debug, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawDefault {
    #[serde(default)]
    trending_searches_days: Vec<RawDay>,
}

#[derive(Debug, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawDay {
    #[serde(default)]
    date: String,
    #[serde(default)]
    formatted_date: String,
    #[serde(default)]
    trending_searches: Vec<RawSearch>,
}

#[derive(Debug, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawSearch {
    #[serde(default)]
    title: RawTitle,
    #[serde(default)]
    formatted_traffic: String,
}

#[derive(Debug, Default, serde::Deserialize)]
struct RawTitle {
    #[serde(default)]
    query: String,
}
