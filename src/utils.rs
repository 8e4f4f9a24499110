//! ユーティリティ関数。

/// 数値を読みやすい日本語表記に変換する。
///
/// 例: 1234 → "1,234", 15000 → "1.5万", 120000000 → "1.2億"
pub fn format_number(n: u64) -> String {
    if n >= 100_000_000 {
        format!("{:.1}億", n as f64 / 100_000_000.0)
    } else if n >= 10_000 {
        format!("{:.1}万", n as f64 / 10_000.0)
    } else {
        group_thousands(n)
    }
}

fn group_thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// 動画IDからYouTube URLを生成する。
pub fn video_url(video_id: &str) -> String {
    format!("https://www.youtube.com/watch?v={video_id}")
}

/// チャンネルIDからYouTube URLを生成する。
pub fn channel_url(channel_id: &str) -> String {
    format!("https://www.youtube.com/channel/{channel_id}")
}

/// テキストを指定文字数で切り詰める。
pub fn truncate_text(text: &str, max_length: usize) -> String {
    if text.chars().count() <= max_length {
        return text.to_string();
    }
    let mut out: String = text.chars().take(max_length.saturating_sub(1)).collect();
    out.push('…');
    out
}
