//! Googleサジェスト非公式APIクライアント。
//!
//! 補助情報源なので、失敗はすべて「理由付きの空」に落として
//! 呼び出し側へ例外を漏らさない。

use std::time::Duration;

use tracing::warn;

use crate::api::{Collected, DegradeReason};
use crate::constants::{SOUP_REQUEST_DELAY, SUGGEST_TIMEOUT};

const SUGGEST_URL: &str = "https://suggestqueries.google.com/complete/search";

/// 50音46文字 + 英字26文字 + 数字10文字 = 82サフィックス。
pub fn all_suffixes() -> Vec<String> {
    let kana = "あいうえおかきくけこさしすせそたちつてとなにぬねのはひふへほまみむめもやゆよらりるれろわをん";
    kana.chars()
        .chain('a'..='z')
        .chain('0'..='9')
        .map(|c| c.to_string())
        .collect()
}

/// 単一クエリのサジェストを取得する。
///
/// レスポンスは `["query", ["候補1", ...]]` という2要素配列。
pub async fn fetch_suggestions(client: &reqwest::Client, query: &str) -> Collected<String> {
    let params = [("client", "firefox"), ("ds", "yt"), ("q", query)];
    let response = match client
        .get(SUGGEST_URL)
        .query(&params)
        .timeout(SUGGEST_TIMEOUT)
        .header(reqwest::header::USER_AGENT, "Mozilla/5.0")
        .send()
        .await
        .and_then(|r| r.error_for_status())
    {
        Ok(response) => response,
        Err(e) => {
            warn!(query, error = %e, "サジェスト取得に失敗しました");
            return Collected::degraded(DegradeReason::Network);
        }
    };

    let text = match response.text().await {
        Ok(text) => text,
        Err(e) => {
            warn!(query, error = %e, "サジェストレスポンスの読み取りに失敗しました");
            return Collected::degraded(DegradeReason::Network);
        }
    };

    parse_suggest_response(&text)
}

fn parse_suggest_response(text: &str) -> Collected<String> {
    let value: serde_json::Value = match serde_json::from_str(text) {
        Ok(value) => value,
        Err(_) => {
            warn!("サジェストレスポンスのJSON解析に失敗しました");
            return Collected::degraded(DegradeReason::Parse);
        }
    };

    let Some(suggestions) = value.get(1).and_then(|v| v.as_array()) else {
        warn!("サジェストレスポンスが想定形式ではありません");
        return Collected::degraded(DegradeReason::Parse);
    };

    Collected::ok(
        suggestions
            .iter()
            .filter_map(|s| s.as_str())
            .map(str::to_string)
            .collect(),
    )
}

/// アルファベットスープ法で網羅的にサジェストを取得する。
///
/// サフィックスごとに1リクエストを投げ、エンドポイント保護のため
/// 次のリクエストまで `delay` だけ待つ（最終サフィックス後は待たない）。
/// 進捗は各サフィックス完了後に `(完了数, 総数)` で通知する。
pub async fn fetch_suggestions_with_alphabet_soup<F>(
    client: &reqwest::Client,
    base_query: &str,
    suffixes: Option<&[String]>,
    delay: Duration,
    mut progress: F,
) -> Vec<(String, Vec<String>)>
where
    F: FnMut(usize, usize),
{
    let default_suffixes;
    let suffixes = match suffixes {
        Some(suffixes) => suffixes,
        None => {
            default_suffixes = all_suffixes();
            &default_suffixes
        }
    };

    let total = suffixes.len();
    let mut results = Vec::with_capacity(total);

    for (i, suffix) in suffixes.iter().enumerate() {
        let query = format!("{base_query} {suffix}");
        let collected = fetch_suggestions(client, &query).await;
        results.push((suffix.clone(), collected.items));
        progress(i + 1, total);
        if i + 1 < total {
            tokio::time::sleep(delay).await;
        }
    }

    results
}

/// デフォルトのリクエスト間隔。
pub fn default_soup_delay() -> Duration {
    SOUP_REQUEST_DELAY
}

/// ベースクエリとスープ結果を統合し、大文字小文字を無視して
/// 重複排除する。初出の表記を採用する。
pub fn flatten_unique_suggestions(
    base_suggestions: &[String],
    soup_results: &[(String, Vec<String>)],
) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    let mut unique = Vec::new();

    let all = base_suggestions
        .iter()
        .chain(soup_results.iter().flat_map(|(_, list)| list.iter()));

    for suggestion in all {
        let lower = suggestion.to_lowercase();
        if seen.insert(lower) {
            unique.push(suggestion.clone());
        }
    }

    unique
}
