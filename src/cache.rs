//! メーター付きAPI呼び出し結果のTTLキャッシュ。
//!
//! キーは「操作名 + 引数タプル」、値はシリアライズ済みレスポンス。
//! キャッシュ方針はフェッチャー本体の契約の外に置き、テストでは
//! キャッシュなしのクライアントをそのまま使えるようにしている。

use std::collections::HashMap;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tracing::debug;

use crate::constants::CACHE_TTL;

struct CacheEntry {
    stored_at: Instant,
    value: serde_json::Value,
}

/// 操作名と引数タプルをキーにした固定TTLのインメモリキャッシュ。
pub struct ResponseCache {
    ttl: Duration,
    entries: Mutex<HashMap<String, CacheEntry>>,
}

impl ResponseCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// 操作名と引数からキャッシュキーを組み立てる。
    pub fn key(operation: &str, args: &[&str]) -> String {
        // 引数区切りにはUnit Separatorを使い、引数内のカンマと衝突させない
        format!("{}\u{1f}{}", operation, args.join("\u{1f}"))
    }

    /// 有効期限内のエントリを返す。期限切れはその場で破棄する。
    pub fn get(&self, key: &str) -> Option<serde_json::Value> {
        let mut entries = self.entries.lock();
        match entries.get(key) {
            Some(entry) if entry.stored_at.elapsed() < self.ttl => {
                debug!(key, "キャッシュヒット");
                Some(entry.value.clone())
            }
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    pub fn insert(&self, key: String, value: serde_json::Value) {
        let mut entries = self.entries.lock();
        entries.insert(
            key,
            CacheEntry {
                stored_at: Instant::now(),
                value,
            },
        );
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

impl Default for ResponseCache {
    fn default() -> Self {
        Self::new(CACHE_TTL)
    }
}
