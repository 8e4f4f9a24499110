//! 動画レコードのCSVエクスポーター。
//!
//! 出力はBOM付きUTF-8。V/S比率は小数2桁へ丸め、公開日は
//! 暦日まで切り詰める（丸めは仕様上の非可逆変換）。

use std::path::Path;

use super::ExportError;
use crate::analytics::analyzer::VideoRecord;
use crate::utils::{channel_url, video_url};

/// Excelで文字化けさせないためのBOM
const UTF8_BOM: &str = "\u{feff}";

const HEADERS: &[&str] = &[
    "タイトル",
    "チャンネル",
    "再生数",
    "登録者数",
    "V/S比率",
    "公開日",
    "動画URL",
    "チャンネルURL",
];

/// CSV形式エクスポーター
pub struct CsvExporter {
    delimiter: char,
    include_headers: bool,
}

impl CsvExporter {
    pub fn new() -> Self {
        Self {
            delimiter: ',',
            include_headers: true,
        }
    }

    pub fn with_delimiter(mut self, delimiter: char) -> Self {
        self.delimiter = delimiter;
        self
    }

    pub fn with_headers(mut self, include_headers: bool) -> Self {
        self.include_headers = include_headers;
        self
    }

    /// CSVフィールドをエスケープ
    fn escape_csv_field(&self, field: &str) -> String {
        if field.contains(self.delimiter)
            || field.contains('"')
            || field.contains('\n')
            || field.contains('\r')
        {
            format!("\"{}\"", field.replace('"', "\"\""))
        } else {
            field.to_string()
        }
    }

    fn record_to_csv_row(&self, record: &VideoRecord) -> String {
        let published_day: String = record.published_at.chars().take(10).collect();
        let fields = vec![
            self.escape_csv_field(&record.title),
            self.escape_csv_field(&record.channel_title),
            record.view_count.to_string(),
            record.subscriber_count.to_string(),
            format!("{:.2}", record.vs_ratio),
            published_day,
            video_url(&record.video_id),
            channel_url(&record.channel_id),
        ];
        fields.join(&self.delimiter.to_string())
    }

    /// レコードリストをBOM付きCSV文字列へ変換する。
    pub fn export(&self, records: &[VideoRecord]) -> String {
        let mut lines = Vec::with_capacity(records.len() + 1);
        if self.include_headers {
            lines.push(HEADERS.join(&self.delimiter.to_string()));
        }
        for record in records {
            lines.push(self.record_to_csv_row(record));
        }
        format!("{UTF8_BOM}{}\n", lines.join("\n"))
    }

    pub fn write_to_file(
        &self,
        records: &[VideoRecord],
        path: impl AsRef<Path>,
    ) -> Result<(), ExportError> {
        std::fs::write(path, self.export(records))?;
        Ok(())
    }

    /// エクスポート済みアーティファクトをデータ行へ戻す。
    /// BOMとヘッダー行は取り除かれる。
    pub fn parse(&self, data: &str) -> Vec<Vec<String>> {
        let mut rows: Vec<Vec<String>> = data
            .trim_start_matches(UTF8_BOM)
            .lines()
            .filter(|line| !line.is_empty())
            .map(|line| self.split_csv_line(line))
            .collect();

        if self.include_headers && !rows.is_empty() {
            rows.remove(0);
        }
        rows
    }

    fn split_csv_line(&self, line: &str) -> Vec<String> {
        let mut fields = Vec::new();
        let mut current = String::new();
        let mut in_quotes = false;
        let mut chars = line.chars().peekable();

        while let Some(c) = chars.next() {
            if in_quotes {
                if c == '"' {
                    if chars.peek() == Some(&'"') {
                        chars.next();
                        current.push('"');
                    } else {
                        in_quotes = false;
                    }
                } else {
                    current.push(c);
                }
            } else if c == '"' {
                in_quotes = true;
            } else if c == self.delimiter {
                fields.push(std::mem::take(&mut current));
            } else {
                current.push(c);
            }
        }
        fields.push(current);
        fields
    }
}

impl Default for CsvExporter {
    fn default() -> Self {
        Self::new()
    }
}
