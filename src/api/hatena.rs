//! はてなブックマーク ホットエントリー取得クライアント。
//!
//! フィードはRSS 1.0（RDF）形式なので、quick-xml でイベント走査する。
//! ブックマーク数は `hatena:bookmarkcount`、タグは `dc:subject` に載る。

use quick_xml::events::Event;
use quick_xml::Reader;
use tracing::warn;

use crate::api::{Collected, DegradeReason};

const BASE_URL: &str = "https://b.hatena.ne.jp/hotentry";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct HotEntry {
    pub title: String,
    pub url: String,
    pub description: String,
    pub bookmarks: u64,
    pub domain: String,
    pub date: String,
    pub subjects: Vec<String>,
    pub image_url: String,
}

/// ホットエントリーをブックマーク数降順で取得する。
///
/// `category` はカテゴリスラッグ（"it", "social" 等）。空文字で総合。
/// 補助情報源なので失敗してもエラーにはせず、ネットワーク障害・
/// 解析失敗とも空に落とす。
pub async fn hot_entries(client: &reqwest::Client, category: &str) -> Collected<HotEntry> {
    let url = if category.is_empty() {
        format!("{BASE_URL}.rss")
    } else {
        format!("{BASE_URL}/{category}.rss")
    };

    let body = async {
        client
            .get(&url)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await
    }
    .await;

    match body {
        Ok(body) => parse_hotentry_feed(&body),
        Err(e) => {
            warn!(error = %e, "はてなブックマークの取得に失敗しました");
            Collected::degraded(DegradeReason::Network)
        }
    }
}

/// RDFフィード本体の解析。ブックマーク数降順に整列して返す。
pub fn parse_hotentry_feed(xml: &str) -> Collected<HotEntry> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut entries: Vec<HotEntry> = Vec::new();
    let mut current: Option<HotEntry> = None;
    let mut field: Option<Vec<u8>> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                let name = e.name().as_ref().to_vec();
                if name == b"item" {
                    current = Some(HotEntry::default());
                } else if current.is_some() {
                    field = Some(name);
                }
            }
            Ok(Event::End(e)) => {
                if e.name().as_ref() == b"item" {
                    if let Some(entry) = current.take() {
                        if !entry.title.trim().is_empty() {
                            entries.push(entry);
                        }
                    }
                }
                field = None;
            }
            Ok(Event::Text(t)) => {
                let text = match t.unescape() {
                    Ok(text) => text.into_owned(),
                    Err(e) => {
                        warn!(error = %e, "はてなブックマークRSS解析エラー");
                        return Collected::degraded(DegradeReason::Parse);
                    }
                };
                apply_field(&mut current, &field, &text);
            }
            Ok(Event::CData(t)) => {
                let text = String::from_utf8_lossy(&t.into_inner()).into_owned();
                apply_field(&mut current, &field, &text);
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => {
                warn!(error = %e, "はてなブックマークRSS解析エラー");
                return Collected::degraded(DegradeReason::Parse);
            }
        }
    }

    entries.sort_by(|a, b| b.bookmarks.cmp(&a.bookmarks));
    Collected::ok(entries)
}

fn apply_field(current: &mut Option<HotEntry>, field: &Option<Vec<u8>>, text: &str) {
    let (Some(entry), Some(field)) = (current.as_mut(), field.as_deref()) else {
        return;
    };

    match field {
        b"title" => entry.title.push_str(text),
        b"link" => {
            entry.url.push_str(text);
            entry.domain = extract_domain(&entry.url);
        }
        b"description" => entry.description.push_str(text),
        b"dc:date" => entry.date.push_str(text),
        b"dc:subject" => entry.subjects.push(text.to_string()),
        b"hatena:bookmarkcount" => entry.bookmarks = text.trim().parse().unwrap_or(0),
        b"hatena:imageurl" => entry.image_url.push_str(text),
        _ => {}
    }
}

/// URLからドメイン名を抽出する。不正なURLは空文字。
fn extract_domain(url: &str) -> String {
    reqwest::Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(str::to_string))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_FEED: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<rdf:RDF xmlns:rdf="http://www.w3.org/1999/02/22-rdf-syntax-ns#"
         xmlns="http://purl.org/rss/1.0/"
         xmlns:dc="http://purl.org/dc/elements/1.1/"
         xmlns:hatena="http://www.hatena.ne.jp/info/xmlns#">
  <channel rdf:about="https://b.hatena.ne.jp/hotentry">
    <title>はてなブックマーク - 人気エントリー</title>
  </channel>
  <item rdf:about="https://example.com/a">
    <title>記事A</title>
    <link>https://example.com/a</link>
    <description>概要A</description>
    <dc:date>2024-05-01T09:00:00+09:00</dc:date>
    <dc:subject>テクノロジー</dc:subject>
    <dc:subject>プログラミング</dc:subject>
    <hatena:bookmarkcount>10</hatena:bookmarkcount>
  </item>
  <item rdf:about="https://blog.example.org/b">
    <title>記事B</title>
    <link>https://blog.example.org/b</link>
    <hatena:bookmarkcount>999</hatena:bookmarkcount>
    <hatena:imageurl>https://cdn.example.org/b.png</hatena:imageurl>
  </item>
  <item rdf:about="https://example.net/c">
    <title>記事C</title>
    <link>https://example.net/c</link>
    <hatena:bookmarkcount>100</hatena:bookmarkcount>
  </item>
  <item rdf:about="https://example.net/d">
    <title>   </title>
    <link>https://example.net/d</link>
    <hatena:bookmarkcount>5000</hatena:bookmarkcount>
  </item>
  <item rdf:about="https://example.net/e">
    <title>記事E</title>
    <link>https://example.net/e</link>
    <hatena:bookmarkcount>garbage</hatena:bookmarkcount>
  </item>
</rdf:RDF>"#;

    #[test]
    fn test_entries_sorted_by_bookmarks_descending() {
        let collected = parse_hotentry_feed(SAMPLE_FEED);
        assert!(!collected.is_degraded());

        let counts: Vec<u64> = collected.items.iter().map(|e| e.bookmarks).collect();
        assert_eq!(counts, vec![999, 100, 10, 0]);
    }

    #[test]
    fn test_blank_title_entries_are_skipped() {
        let collected = parse_hotentry_feed(SAMPLE_FEED);
        assert!(collected.items.iter().all(|e| !e.title.trim().is_empty()));
        // 5000ブクマのエントリはタイトル空白のため落ちる
        assert!(collected.items.iter().all(|e| e.bookmarks != 5000));
    }

    #[test]
    fn test_entry_fields() {
        let collected = parse_hotentry_feed(SAMPLE_FEED);
        let a = collected
            .items
            .iter()
            .find(|e| e.title == "記事A")
            .unwrap();
        assert_eq!(a.url, "https://example.com/a");
        assert_eq!(a.domain, "example.com");
        assert_eq!(a.description, "概要A");
        assert_eq!(a.date, "2024-05-01T09:00:00+09:00");
        assert_eq!(a.subjects, vec!["テクノロジー", "プログラミング"]);

        let b = collected
            .items
            .iter()
            .find(|e| e.title == "記事B")
            .unwrap();
        assert_eq!(b.domain, "blog.example.org");
        assert_eq!(b.image_url, "https://cdn.example.org/b.png");
    }

    #[test]
    fn test_garbage_bookmark_count_defaults_to_zero() {
        let collected = parse_hotentry_feed(SAMPLE_FEED);
        let e = collected
            .items
            .iter()
            .find(|entry| entry.title == "記事E")
            .unwrap();
        assert_eq!(e.bookmarks, 0);
    }

    #[test]
    fn test_network_failure_degrades_to_empty() {
        // 即タイムアウトするクライアントで取得を失敗させる
        tokio_test::block_on(async {
            let client = reqwest::Client::builder()
                .timeout(std::time::Duration::from_millis(1))
                .build()
                .unwrap();
            let collected = hot_entries(&client, "it").await;
            assert!(collected.items.is_empty());
            assert_eq!(collected.degraded, Some(DegradeReason::Network));
        });
    }

    #[test]
    fn test_extract_domain() {
        assert_eq!(extract_domain("https://b.hatena.ne.jp/entry"), "b.hatena.ne.jp");
        assert_eq!(extract_domain("not a url"), "");
        assert_eq!(extract_domain(""), "");
    }
}
