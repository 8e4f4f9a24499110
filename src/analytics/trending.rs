//! 急上昇動画からのトレンドキーワード抽出。

use std::collections::{HashMap, HashSet};

use regex::Regex;

use crate::api::youtube::TrendingVideo;

/// YouTube動画カテゴリ（日本）
pub const CATEGORY_MAP: &[(&str, &str)] = &[
    ("1", "映画とアニメ"),
    ("2", "自動車と乗り物"),
    ("10", "音楽"),
    ("15", "ペットと動物"),
    ("17", "スポーツ"),
    ("19", "旅行とイベント"),
    ("20", "ゲーム"),
    ("22", "ブログ"),
    ("23", "コメディ"),
    ("24", "エンタメ"),
    ("25", "ニュースと政治"),
    ("26", "ハウツーとスタイル"),
    ("27", "教育"),
    ("28", "科学と技術"),
    ("29", "NPOと社会活動"),
];

/// カテゴリIDを日本語ラベルへ変換する。未知IDは "その他(ID)"。
pub fn category_label(category_id: &str) -> String {
    CATEGORY_MAP
        .iter()
        .find(|(id, _)| *id == category_id)
        .map(|(_, label)| label.to_string())
        .unwrap_or_else(|| format!("その他({category_id})"))
}

const STOP_WORDS: &[&str] = &[
    "の", "に", "は", "を", "が", "で", "と", "も", "な", "た", "だ", "て", "し", "する", "から",
    "まで", "よう", "こと", "ない", "いる", "ある", "この", "その", "れる", "られる", "THE",
    "the", "a", "an", "is", "it", "in", "on", "at", "to", "for", "of", "and", "or", "with", "by",
    "from",
];

/// 動画タイトルから頻出キーワードを抽出する。
///
/// 日本語は2文字以上のカタカナ・漢字の連続、英語は2文字以上の
/// アルファベット単語を対象にし、ストップワードを除外する。
/// 結果は頻度降順（同率はキーワード昇順で決定的）。
pub fn extract_keywords_from_titles(
    videos: &[TrendingVideo],
    top_n: usize,
) -> Vec<(String, usize)> {
    // カタカナ・漢字の連続 / 英単語
    let jp_pattern = Regex::new(r"[\u{4e00}-\u{9fff}\u{30a0}-\u{30ff}]{2,}").unwrap();
    let en_pattern = Regex::new(r"[A-Za-z]{2,}").unwrap();
    let stop_words: HashSet<&str> = STOP_WORDS.iter().copied().collect();

    let mut counter: HashMap<String, usize> = HashMap::new();
    for video in videos {
        let title = &video.snippet.title;
        for m in jp_pattern.find_iter(title) {
            let word = m.as_str();
            if !stop_words.contains(word) {
                *counter.entry(word.to_string()).or_insert(0) += 1;
            }
        }
        for m in en_pattern.find_iter(title) {
            let word = m.as_str();
            if !stop_words.contains(word) && !stop_words.contains(word.to_uppercase().as_str()) {
                *counter.entry(word.to_string()).or_insert(0) += 1;
            }
        }
    }

    let mut ranked: Vec<(String, usize)> = counter.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    ranked.truncate(top_n);
    ranked
}

/// 急上昇動画のカテゴリ分布を件数降順で返す。
pub fn category_distribution(videos: &[TrendingVideo]) -> Vec<(String, usize)> {
    let mut counter: HashMap<String, usize> = HashMap::new();
    for video in videos {
        let label = category_label(&video.snippet.category_id);
        *counter.entry(label).or_insert(0) += 1;
    }

    let mut ranked: Vec<(String, usize)> = counter.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    ranked
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::youtube::TrendingSnippet;

    fn video(title: &str, category_id: &str) -> TrendingVideo {
        TrendingVideo {
            snippet: TrendingSnippet {
                title: title.to_string(),
                category_id: category_id.to_string(),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    #[test]
    fn test_category_label() {
        assert_eq!(category_label("10"), "音楽");
        assert_eq!(category_label("20"), "ゲーム");
        assert_eq!(category_label("99"), "その他(99)");
    }

    #[test]
    fn test_extract_keywords_counts_japanese_and_english() {
        let videos = vec![
            video("ゲーム実況 最新アップデート解説", "20"),
            video("ゲーム実況 初見プレイ", "20"),
            video("Rust Tutorial for beginners", "28"),
        ];
        let keywords = extract_keywords_from_titles(&videos, 10);

        let get = |w: &str| keywords.iter().find(|(k, _)| k == w).map(|(_, c)| *c);
        assert_eq!(get("ゲーム実況"), Some(2));
        assert_eq!(get("Rust"), Some(1));
        assert_eq!(get("Tutorial"), Some(1));
        // ストップワードは1文字助詞ではなくリスト照合で除外
        assert_eq!(get("for"), None);
        assert_eq!(get("the"), None);
    }

    #[test]
    fn test_extract_keywords_skips_short_tokens() {
        let videos = vec![video("A ひ 漢", "0")];
        assert!(extract_keywords_from_titles(&videos, 10).is_empty());
    }

    #[test]
    fn test_extract_keywords_top_n_and_order() {
        let videos = vec![
            video("猫動画 猫動画", "15"),
            video("猫動画と犬動画", "15"),
            video("犬動画", "15"),
        ];
        let keywords = extract_keywords_from_titles(&videos, 1);
        assert_eq!(keywords.len(), 1);
        assert_eq!(keywords[0].0, "猫動画");
        assert_eq!(keywords[0].1, 3);
    }

    #[test]
    fn test_category_distribution_descending() {
        let videos = vec![
            video("a", "20"),
            video("b", "20"),
            video("c", "10"),
            video("d", "99"),
        ];
        let distribution = category_distribution(&videos);
        assert_eq!(distribution[0], ("ゲーム".to_string(), 2));
        assert!(distribution.contains(&("音楽".to_string(), 1)));
        assert!(distribution.contains(&("その他(99)".to_string(), 1)));
    }
}
