//! 外部サービスクライアント群。

pub mod cached; // メーター付きAPIのキャッシュレイヤー
pub mod hatena; // はてなブックマーク ホットエントリー
pub mod suggest; // Googleサジェスト非公式API
pub mod trends; // Google Trends フィード
pub mod youtube; // YouTube Data API v3

/// 非クリティカルなコレクターが空結果になった理由。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DegradeReason {
    /// ネットワーク到達失敗・タイムアウト
    Network,
    /// レスポンスの形式が想定外
    Parse,
}

/// フィード系コレクターの取得結果。
///
/// これらのソースは補助情報なので、パース失敗はエラーではなく
/// 「理由付きの空」として表現する。外部挙動は空リストと同じ。
#[derive(Debug, Clone, PartialEq)]
pub struct Collected<T> {
    pub items: Vec<T>,
    pub degraded: Option<DegradeReason>,
}

impl<T> Collected<T> {
    pub fn ok(items: Vec<T>) -> Self {
        Self {
            items,
            degraded: None,
        }
    }

    pub fn degraded(reason: DegradeReason) -> Self {
        Self {
            items: Vec::new(),
            degraded: Some(reason),
        }
    }

    pub fn is_degraded(&self) -> bool {
        self.degraded.is_some()
    }
}
