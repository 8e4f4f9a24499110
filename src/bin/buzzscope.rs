//! buzzscope CLI — YouTube・Webトレンドリサーチツール。
//!
//! 元ダッシュボードのタブ構成をサブコマンドとして提供する薄い
//! プレゼンテーション層。ロジックはすべてライブラリ側にある。

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};

use buzzscope::analytics::export::CsvExporter;
use buzzscope::analytics::trending::{
    category_distribution, category_label, extract_keywords_from_titles,
};
use buzzscope::api::hatena;
use buzzscope::api::suggest;
use buzzscope::api::trends;
use buzzscope::api::youtube::TrendingVideo;
use buzzscope::constants::REQUEST_TIMEOUT;
use buzzscope::utils::{format_number, truncate_text, video_url};
use buzzscope::{
    fetch_and_analyze, filter_videos, sort_by_vs_ratio, ApiKey, CachedVideoApi, DataApiClient,
    FetchError, SearchRequest, SessionContext, TrendingRequest, VideoApi, VideoFilter,
};

#[derive(Parser)]
#[command(
    name = "buzzscope",
    version,
    about = "YouTube・Webのバズ兆候をまとめて調査するツール"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// キーワード検索からV/S比率つきバズ動画分析を実行する
    Buzz {
        /// 検索キーワード
        query: String,
        /// YouTube Data API キー
        #[arg(long, env = "YOUTUBE_API_KEY", hide_env_values = true)]
        api_key: String,
        /// 公開日の下限（過去N日）
        #[arg(long)]
        days: Option<i64>,
        /// 登録者数上限フィルタ
        #[arg(long)]
        max_subscribers: Option<u64>,
        /// 再生数下限フィルタ
        #[arg(long)]
        min_views: Option<u64>,
        /// V/S比率下限フィルタ
        #[arg(long)]
        min_ratio: Option<f64>,
        /// 最大取得件数（上限50）
        #[arg(long, default_value_t = 50)]
        max_results: u32,
        /// CSV出力先
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// 急上昇動画とタイトル頻出キーワードを表示する
    Trending {
        #[arg(long, env = "YOUTUBE_API_KEY", hide_env_values = true)]
        api_key: String,
        /// 地域コード
        #[arg(long, default_value = "JP")]
        region: String,
        /// カテゴリID（省略で全カテゴリ）
        #[arg(long)]
        category: Option<String>,
        /// キーワード抽出件数
        #[arg(long, default_value_t = 30)]
        top_n: usize,
    },
    /// YouTubeサジェストを取得する（--soup で網羅展開）
    Suggest {
        query: String,
        /// アルファベットスープ法で82サフィックスを展開する
        #[arg(long)]
        soup: bool,
        /// スープ展開時のリクエスト間隔（秒）
        #[arg(long, default_value_t = 1.5)]
        delay: f64,
    },
    /// Google Trends の急上昇キーワードを表示する
    Trends {
        /// 地域コード
        #[arg(long, default_value = "JP")]
        geo: String,
        /// RSSの代わりに日別トレンドJSONを参照する
        #[arg(long)]
        daily: bool,
    },
    /// はてなブックマーク ホットエントリーを表示する
    Hotentry {
        /// カテゴリスラッグ（"it", "social" 等）。省略で総合
        #[arg(long, default_value = "")]
        category: String,
        /// 表示件数
        #[arg(long, default_value_t = 30)]
        limit: usize,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    buzzscope::logging::init_logging()?;
    let cli = Cli::parse();

    if let Err(e) = run(cli.command).await {
        if matches!(e.downcast_ref::<FetchError>(), Some(FetchError::QuotaExceeded)) {
            eprintln!("APIクォータを超過しました。明日リセットされるまでお待ちください。");
            std::process::exit(1);
        }
        return Err(e);
    }
    Ok(())
}

async fn run(command: Command) -> anyhow::Result<()> {
    match command {
        Command::Buzz {
            query,
            api_key,
            days,
            max_subscribers,
            min_views,
            min_ratio,
            max_results,
            output,
        } => {
            let mut session = SessionContext::new();
            let client = DataApiClient::new(ApiKey::new(api_key))?;
            let api = CachedVideoApi::new(client, session.cache());

            let published_after = days.map(|days| {
                (chrono::Utc::now() - chrono::Duration::days(days))
                    .format("%Y-%m-%dT%H:%M:%SZ")
                    .to_string()
            });
            let request = SearchRequest::new(query.as_str())
                .with_max_results(max_results)
                .with_published_after(published_after);

            let records = fetch_and_analyze(&api, &mut session.quota, &request).await?;
            let filter = VideoFilter {
                max_subscribers,
                min_views,
                min_vs_ratio: min_ratio,
            };
            let records = sort_by_vs_ratio(filter_videos(records, &filter), true);

            if records.is_empty() {
                println!("条件に合う動画が見つかりませんでした。");
            } else {
                println!("「{query}」のバズ動画分析（{}件）", records.len());
                for (rank, record) in records.iter().enumerate() {
                    println!(
                        "{:>3}. [{:>8.2}] {} / {} ({}回再生, 登録者{})",
                        rank + 1,
                        record.vs_ratio,
                        truncate_text(&record.title, 40),
                        record.channel_title,
                        format_number(record.view_count),
                        format_number(record.subscriber_count),
                    );
                    println!("     {}", video_url(&record.video_id));
                }
            }

            if let Some(path) = output {
                CsvExporter::new()
                    .write_to_file(&records, &path)
                    .with_context(|| format!("CSV出力に失敗しました: {}", path.display()))?;
                println!("CSVを出力しました: {}", path.display());
            }

            print_quota_summary(&session);
        }
        Command::Trending {
            api_key,
            region,
            category,
            top_n,
        } => {
            let mut session = SessionContext::new();
            let client = DataApiClient::new(ApiKey::new(api_key))?;
            let api = CachedVideoApi::new(client, session.cache());

            let request = TrendingRequest {
                region_code: region.clone(),
                category_id: category,
                ..Default::default()
            };
            let videos = api.most_popular(&mut session.quota, &request).await?;

            println!("急上昇動画（{region}）: {}件", videos.len());
            for (rank, video) in videos.iter().enumerate().take(15) {
                print_trending_video(rank + 1, video);
            }

            let keywords = extract_keywords_from_titles(&videos, top_n);
            if !keywords.is_empty() {
                println!("\nタイトル頻出キーワード:");
                for (keyword, count) in &keywords {
                    println!("  {keyword} ({count})");
                }
            }

            let distribution = category_distribution(&videos);
            if !distribution.is_empty() {
                println!("\nカテゴリ分布:");
                for (label, count) in &distribution {
                    println!("  {label}: {count}件");
                }
            }

            print_quota_summary(&session);
        }
        Command::Suggest { query, soup, delay } => {
            let client = collector_client()?;
            let base = suggest::fetch_suggestions(&client, &query).await;

            let all = if soup {
                let soup_results = suggest::fetch_suggestions_with_alphabet_soup(
                    &client,
                    &query,
                    None,
                    Duration::from_secs_f64(delay),
                    |done, total| eprint!("\rサジェスト展開中... {done}/{total}"),
                )
                .await;
                eprintln!();
                suggest::flatten_unique_suggestions(&base.items, &soup_results)
            } else {
                base.items.clone()
            };

            if all.is_empty() {
                println!("サジェストが見つかりませんでした。");
            } else {
                println!("「{query}」のサジェスト（{}件）:", all.len());
                for suggestion in &all {
                    println!("  {suggestion}");
                }
            }
        }
        Command::Trends { geo, daily } => {
            let client = collector_client()?;
            if daily {
                let collected = trends::daily_trends(&client, &geo).await?;
                if collected.items.is_empty() {
                    println!("トレンドを取得できませんでした。");
                }
                for day in &collected.items {
                    println!("{}:", day.formatted_date);
                    for entry in &day.searches {
                        println!("  {} ({})", entry.query, entry.traffic);
                    }
                }
            } else {
                let collected = trends::trending_searches(&client, &geo).await?;
                if collected.items.is_empty() {
                    println!("トレンドを取得できませんでした。");
                }
                for search in &collected.items {
                    println!("{} ({})", search.keyword, search.traffic);
                    for news in &search.news {
                        println!("  - {} [{}]", news.title, news.source);
                    }
                }
            }
        }
        Command::Hotentry { category, limit } => {
            let client = collector_client()?;
            let collected = hatena::hot_entries(&client, &category).await;
            if collected.items.is_empty() {
                println!("ホットエントリーを取得できませんでした。");
            }
            for (rank, entry) in collected.items.iter().enumerate().take(limit) {
                println!(
                    "{:>3}. [{}users] {} ({})",
                    rank + 1,
                    entry.bookmarks,
                    truncate_text(&entry.title, 50),
                    entry.domain,
                );
            }
        }
    }

    Ok(())
}

fn collector_client() -> anyhow::Result<reqwest::Client> {
    Ok(reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build()?)
}

fn print_trending_video(rank: usize, video: &TrendingVideo) {
    println!(
        "{:>3}. {} / {} ({}回再生, {})",
        rank,
        truncate_text(&video.snippet.title, 40),
        video.snippet.channel_title,
        format_number(video.statistics.view_count),
        category_label(&video.snippet.category_id),
    );
}

fn print_quota_summary(session: &SessionContext) {
    println!(
        "\nクォータ使用量: {} / {} ユニット（{:.1}%、残り{}）",
        session.quota.used(),
        session.quota.daily_limit(),
        session.quota.usage_percent(),
        session.quota.remaining(),
    );
}
